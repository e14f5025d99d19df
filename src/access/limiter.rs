//! Fixed-count window rate limiting over a single client record.
//! Used by: access::gate.

use std::time::Duration;

use tokio::time::Instant;

use crate::access::client::ClientState;
use crate::access::AccessConfig;

/// What a single access did to a client record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOutcome {
    /// The client was already denied; nothing was recorded.
    Denied,
    /// The access was counted.
    Recorded,
    /// The access was counted and filled a window too quickly; the client is
    /// now auto-blocked and must be released after the restore delay.
    Blocked,
}

/// The window closes after `limit + 1` accesses, whatever the wall time.
/// The time limit only decides whether that window was "too fast".
#[derive(Debug, Clone, Copy)]
pub struct RateLimiter {
    limit: u32,
    time_limit: Duration,
}

impl RateLimiter {
    pub fn new(config: &AccessConfig) -> Self {
        Self {
            limit: config.access_count_limit,
            time_limit: config.time_limit,
        }
    }

    pub fn record_access(&self, state: &mut ClientState, now: Instant) -> AccessOutcome {
        if !state.is_permitted() {
            return AccessOutcome::Denied;
        }

        state.access_count += 1;
        state.access_cost_time += now.saturating_duration_since(state.last_access_time);
        state.last_access_time = state.last_access_time.max(now);

        if state.access_count <= self.limit {
            return AccessOutcome::Recorded;
        }

        let outcome = if state.access_cost_time < self.time_limit {
            state.auto_blocked = true;
            AccessOutcome::Blocked
        } else {
            AccessOutcome::Recorded
        };
        state.access_count = 0;
        state.access_cost_time = Duration::ZERO;
        outcome
    }
}
