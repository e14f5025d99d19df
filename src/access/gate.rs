//! The access decision façade used by the request layer.
//! Used by: state, server, handlers::admin, handlers::metrics.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::time::Instant;

use crate::access::limiter::{AccessOutcome, RateLimiter};
use crate::access::registry::ClientRegistry;
use crate::access::sweeper::ExpirySweeper;
use crate::access::AccessConfig;

/// Result of one access attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Whether the client was permitted when the request arrived.
    pub allowed: bool,
    pub outcome: AccessOutcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistrySnapshot {
    pub clients: usize,
    pub auto_blocked: usize,
    pub overridden: usize,
}

pub struct AccessGate {
    registry: Arc<ClientRegistry>,
    limiter: RateLimiter,
    restore_delay: Duration,
    runtime: Handle,
    sweeper: Mutex<Option<ExpirySweeper>>,
}

impl AccessGate {
    /// Builds the gate and starts its sweeper on the current Tokio runtime.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    pub fn start(config: AccessConfig) -> Self {
        Self::start_on(config, Handle::current())
    }

    pub fn start_on(config: AccessConfig, runtime: Handle) -> Self {
        let registry = Arc::new(ClientRegistry::new());
        let sweeper = ExpirySweeper::start(
            Arc::clone(&registry),
            config.sweep_interval,
            config.existence,
            &runtime,
        );
        Self {
            registry,
            limiter: RateLimiter::new(&config),
            restore_delay: config.restore_delay,
            runtime,
            sweeper: Mutex::new(Some(sweeper)),
        }
    }

    pub fn can_access(&self, identity: &str) -> bool {
        self.check(identity).allowed
    }

    /// Records an access for `identity` and reports whether it was permitted
    /// on arrival. A denied client's attempts are not counted.
    pub fn check(&self, identity: &str) -> Decision {
        let entry = self.registry.get_or_create(identity);
        let outcome = self.limiter.record_access(&mut entry.lock(), Instant::now());
        if outcome == AccessOutcome::Blocked {
            self.schedule_restore(identity, entry.generation());
        }
        Decision {
            allowed: outcome != AccessOutcome::Denied,
            outcome,
        }
    }

    /// Administrator switch; independent of rate limiting and never expires.
    ///
    /// A sweep may remove the entry between lookup and update. The flag only
    /// counts once the same generation is still registered afterwards; a
    /// denied entry is never swept, so from then on it sticks.
    pub fn set_override(&self, identity: &str, allowed: bool) {
        loop {
            let entry = self.registry.get_or_create(identity);
            entry.set_override(allowed);
            match self.registry.get(identity) {
                Some(live) if live.generation() == entry.generation() => return,
                _ => tracing::debug!(client = %identity, "override raced a sweep, retrying"),
            }
        }
    }

    pub fn restore_delay(&self) -> Duration {
        self.restore_delay
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        let mut snapshot = RegistrySnapshot::default();
        self.registry.for_each(|entry| {
            let state = entry.snapshot();
            snapshot.clients += 1;
            snapshot.auto_blocked += usize::from(state.auto_blocked);
            snapshot.overridden += usize::from(!state.override_allowed);
        });
        snapshot
    }

    /// Stops the background sweeper. Pending auto-unblocks still fire.
    pub async fn shutdown(&self) {
        let sweeper = self.sweeper.lock().take();
        if let Some(sweeper) = sweeper {
            sweeper.shutdown().await;
        }
    }

    /// Lifts the block only on the entry that was blocked: if the identity was
    /// swept and recreated meanwhile, the generation differs and this is a no-op.
    fn schedule_restore(&self, identity: &str, generation: u64) {
        let registry = Arc::clone(&self.registry);
        let identity: Box<str> = identity.into();
        let delay = self.restore_delay;
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            match registry.get(&identity) {
                Some(entry) if entry.generation() == generation => {
                    entry.lift_auto_block();
                    tracing::debug!(client = %identity, "auto-block lifted");
                }
                _ => tracing::debug!(client = %identity, generation, "stale auto-unblock skipped"),
            }
        });
    }
}
