pub mod app;
pub mod auth;
pub mod authorization;
pub mod cli;
pub mod config;
pub mod database;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod managers;
pub mod middleware;
pub mod models;
pub mod state;
pub mod telemetry;

#[cfg(test)]
pub mod testing;
