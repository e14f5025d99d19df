//! Concurrent identity -> client record map.
//! Used by: access::gate, access::sweeper.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::time::Instant;

use crate::access::client::ClientEntry;

/// Lookups take the read lock; insert, remove and sweeps take the write lock.
/// Field updates go through each entry's own lock.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<Box<str>, Arc<ClientEntry>>>,
    next_generation: AtomicU64,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, identity: &str) -> Option<Arc<ClientEntry>> {
        self.clients.read().get(identity).cloned()
    }

    /// Returns the entry for `identity`, inserting a fresh one if absent.
    /// The miss path re-checks under the write lock, so at most one entry
    /// per identity is ever live.
    pub fn get_or_create(&self, identity: &str) -> Arc<ClientEntry> {
        if let Some(entry) = self.clients.read().get(identity) {
            return Arc::clone(entry);
        }

        let mut clients = self.clients.write();
        let entry = clients.entry(identity.into()).or_insert_with(|| {
            let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
            Arc::new(ClientEntry::new(identity, generation, Instant::now()))
        });
        Arc::clone(entry)
    }

    pub fn remove(&self, identity: &str) -> Option<Arc<ClientEntry>> {
        self.clients.write().remove(identity)
    }

    /// Visits every entry under the read lock.
    pub fn for_each(&self, mut visitor: impl FnMut(&ClientEntry)) {
        for entry in self.clients.read().values() {
            visitor(entry);
        }
    }

    /// Keeps the entries for which `keep` returns true, holding the write lock
    /// for the whole pass. Returns how many were removed.
    pub fn retain(&self, mut keep: impl FnMut(&ClientEntry) -> bool) -> usize {
        let mut clients = self.clients.write();
        let before = clients.len();
        clients.retain(|_, entry| keep(entry));
        before - clients.len()
    }

    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_returns_same_entry() {
        let registry = ClientRegistry::new();
        let a = registry.get_or_create("10.0.0.5");
        let b = registry.get_or_create("10.0.0.5");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn separate_identities_get_separate_entries() {
        let registry = ClientRegistry::new();
        let a = registry.get_or_create("1.1.1.1");
        let b = registry.get_or_create("2.2.2.2");
        assert!(!Arc::ptr_eq(&a, &b));
        assert_ne!(a.generation(), b.generation());
        assert_eq!(b.identity(), "2.2.2.2");
    }

    #[test]
    fn recreated_identity_gets_newer_generation() {
        let registry = ClientRegistry::new();
        let first = registry.get_or_create("10.0.0.5").generation();
        assert!(registry.remove("10.0.0.5").is_some());
        assert!(registry.get("10.0.0.5").is_none());
        let second = registry.get_or_create("10.0.0.5").generation();
        assert!(second > first);
    }

    #[test]
    fn concurrent_creation_yields_one_entry() {
        let registry = Arc::new(ClientRegistry::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.get_or_create("10.0.0.5"))
            })
            .collect();
        let entries: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(entries.iter().all(|e| Arc::ptr_eq(e, &entries[0])));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn retain_reports_removed_count() {
        let registry = ClientRegistry::new();
        for id in ["a", "b", "c"] {
            registry.get_or_create(id);
        }
        let removed = registry.retain(|e| e.identity() == "b");
        assert_eq!(removed, 2);
        let mut seen = Vec::new();
        registry.for_each(|e| seen.push(e.identity().to_owned()));
        assert_eq!(seen, vec!["b".to_owned()]);
    }
}
