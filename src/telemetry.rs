//! Request and administration counters.
//! Used by: state, server, handlers.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::access::RegistrySnapshot;

#[derive(Default)]
pub struct Metrics {
    pub requests_allowed: AtomicU64,
    pub requests_denied: AtomicU64,
    pub auto_blocks: AtomicU64,
    pub override_changes: AtomicU64,
    pub admin_changes: AtomicU64,
    pub admin_failures: AtomicU64,
    pub uploads: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_allowed(&self) {
        self.requests_allowed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_denied(&self) {
        self.requests_denied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_auto_block(&self) {
        self.auto_blocks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_override_change(&self) {
        self.override_changes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_admin_change(&self) {
        self.admin_changes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_admin_failure(&self) {
        self.admin_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upload(&self) {
        self.uploads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, registry: RegistrySnapshot) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_allowed: self.requests_allowed.load(Ordering::Relaxed),
            requests_denied: self.requests_denied.load(Ordering::Relaxed),
            auto_blocks: self.auto_blocks.load(Ordering::Relaxed),
            override_changes: self.override_changes.load(Ordering::Relaxed),
            admin_changes: self.admin_changes.load(Ordering::Relaxed),
            admin_failures: self.admin_failures.load(Ordering::Relaxed),
            uploads: self.uploads.load(Ordering::Relaxed),
            registry,
        }
    }
}

#[derive(Serialize)]
pub struct MetricsSnapshot {
    pub requests_allowed: u64,
    pub requests_denied: u64,
    pub auto_blocks: u64,
    pub override_changes: u64,
    pub admin_changes: u64,
    pub admin_failures: u64,
    pub uploads: u64,
    pub registry: RegistrySnapshot,
}
