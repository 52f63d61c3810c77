//! Lightweight usage telemetry.
//!
//! `track_event` is fire-and-forget: it never fails and never waits on I/O, so
//! handlers can call it after the real work without affecting the response.

use std::sync::Arc;

pub trait Telemetry: Send + Sync {
    fn track_event(&self, name: &str);
}

/// Emits each event as a tracing record on the `telemetry` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn track_event(&self, name: &str) {
        tracing::info!(target: "telemetry", event = name, "tracked event");
    }
}

/// Drops every event. Used when telemetry is switched off in configuration.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl Telemetry for NoopTelemetry {
    fn track_event(&self, _name: &str) {}
}

pub fn from_config(enabled: bool) -> Arc<dyn Telemetry> {
    if enabled {
        Arc::new(TracingTelemetry)
    } else {
        Arc::new(NoopTelemetry)
    }
}
