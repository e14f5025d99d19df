//! Per-client access control: rate limiting plus administrator overrides.
//! Used by: state, server, handlers.

pub mod client;
pub mod gate;
pub mod limiter;
pub mod registry;
pub mod sweeper;

use std::time::Duration;

pub use gate::{AccessGate, Decision, RegistrySnapshot};
pub use limiter::AccessOutcome;

/// Tunables consumed by the access subsystem. Immutable for the gate's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessConfig {
    /// Accesses allowed per counting window before a block is considered.
    pub access_count_limit: u32,
    /// A window that fills up faster than this triggers an auto-block.
    pub time_limit: Duration,
    /// How long an auto-block lasts.
    pub restore_delay: Duration,
    /// Idle time after which a client record may be swept.
    pub existence: Duration,
    pub sweep_interval: Duration,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            access_count_limit: 5,
            time_limit: Duration::from_secs(3),
            restore_delay: Duration::from_secs(60),
            existence: Duration::from_secs(180),
            sweep_interval: Duration::from_secs(60),
        }
    }
}
