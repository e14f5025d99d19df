//! Per-client access record guarded by its own lock.
//! Used by: access::registry, access::limiter, access::gate, access::sweeper.

use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use tokio::time::Instant;

/// Mutable fields of a client record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientState {
    pub access_count: u32,
    /// Sum of the gaps between consecutive accesses in the current window.
    pub access_cost_time: Duration,
    pub last_access_time: Instant,
    /// Set by the rate limiter, cleared after the restore delay.
    pub auto_blocked: bool,
    /// Set only by an administrator.
    pub override_allowed: bool,
}

impl ClientState {
    pub fn new(now: Instant) -> Self {
        Self {
            access_count: 0,
            access_cost_time: Duration::ZERO,
            last_access_time: now,
            auto_blocked: false,
            override_allowed: true,
        }
    }

    #[inline]
    pub fn is_permitted(&self) -> bool {
        !self.auto_blocked && self.override_allowed
    }

    pub fn idle_time(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_access_time)
    }
}

/// A registry entry: immutable identity and generation, lock-protected state.
#[derive(Debug)]
pub struct ClientEntry {
    identity: Box<str>,
    generation: u64,
    state: Mutex<ClientState>,
}

impl ClientEntry {
    pub(crate) fn new(identity: &str, generation: u64, now: Instant) -> Self {
        Self {
            identity: identity.into(),
            generation,
            state: Mutex::new(ClientState::new(now)),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Unique per created entry; a recreated identity gets a larger one.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_permitted(&self) -> bool {
        self.state.lock().is_permitted()
    }

    pub fn snapshot(&self) -> ClientState {
        self.state.lock().clone()
    }

    /// Returns the previous override value.
    pub fn set_override(&self, allowed: bool) -> bool {
        std::mem::replace(&mut self.state.lock().override_allowed, allowed)
    }

    pub(crate) fn lift_auto_block(&self) {
        self.state.lock().auto_blocked = false;
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock()
    }
}
