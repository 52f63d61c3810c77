use std::time::Duration;

use anyhow::Context;
use clap::Args;
use tracing::{info, warn};

use crate::app::app;
use crate::auth::JwtKeys;
use crate::config::{config, AppConfig};
use crate::database::{ensure_schema, DatabaseManager};
use crate::is_production;
use crate::models::User;
use crate::state::{AppState, Stores};
use crate::telemetry;

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, help = "Port to listen on (overrides API_PORT)")]
    pub port: Option<u16>,

    #[arg(long, help = "Use in-memory stores even when DATABASE_URL is set")]
    pub in_memory: bool,

    #[arg(long, help = "Register a site administrator with this token subject (repeatable)")]
    pub admin: Vec<String>,

    #[arg(long, help = "Register a regular user with this token subject (repeatable)")]
    pub user: Vec<String>,
}

pub async fn handle(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = config().clone();
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if args.in_memory {
        config.database.in_memory = true;
    }

    info!("Starting Cleanup API in {:?} mode", config.environment);

    let state = build_state(&config).await?;
    register_users(&state, &args).await?;

    let router = app(state.clone(), &config);
    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Cleanup API listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(database) = &state.database {
        database.close().await;
    }
    Ok(())
}

/// Wire stores, keys and telemetry from configuration.
pub async fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let keys = JwtKeys::from_config(&config.security).context("JWT_SECRET must be set")?;
    let telemetry = telemetry::from_config(config.telemetry.enabled);

    let (stores, database) = if config.use_in_memory_stores() {
        if is_production!() {
            warn!("Running in production with in-memory stores; data will not survive a restart");
        }
        info!("Using in-memory stores");
        (Stores::in_memory(), None)
    } else {
        let database = DatabaseManager::connect(&config.database).await?;
        ensure_schema(database.pool()).await?;
        (Stores::postgres(database.pool()), Some(database))
    };

    Ok(AppState::new(
        stores,
        keys,
        telemetry,
        database,
        Duration::from_secs(config.api.request_timeout_secs),
    ))
}

async fn register_users(state: &AppState, args: &ServeArgs) -> anyhow::Result<()> {
    let requested = args
        .admin
        .iter()
        .map(|subject| (subject, true))
        .chain(args.user.iter().map(|subject| (subject, false)));

    for (subject, is_admin) in requested {
        let mut user = User::new(subject.as_str(), subject.as_str(), "");
        user.is_site_admin = is_admin;
        let user = state.stores.users.add(user).await?;
        info!("Registered user {} ({}, admin: {})", subject, user.id, is_admin);
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
