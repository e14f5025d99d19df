//! Shared application state, built once at startup.

use std::sync::Arc;

use crate::access::{AccessConfig, AccessGate};
use crate::admin::AdminDirectory;
use crate::config::Config;
use crate::telemetry::Metrics;

pub struct AppStateInner {
    pub config: Config,
    pub gate: AccessGate,
    pub admins: AdminDirectory,
    pub metrics: Metrics,
}

pub type AppState = Arc<AppStateInner>;

/// Must be called inside a Tokio runtime: the gate starts its sweeper here.
pub fn build_state(config: Config) -> AppState {
    let gate = AccessGate::start(AccessConfig::from(&config));
    let admins = AdminDirectory::new(&config);
    Arc::new(AppStateInner {
        config,
        gate,
        admins,
        metrics: Metrics::new(),
    })
}
