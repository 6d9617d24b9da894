//! Per-entity mutual exclusion
//!
//! Writers of the same `(namespace, id)` are serialized; different ids
//! proceed in parallel. Entries exist only while someone holds or waits on
//! them.

use dashmap::DashMap;
use hydropump_backend::Namespace;
use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};
use std::sync::Arc;

type LockKey = (Namespace, String);

/// Registry of per-id locks
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: DashMap<LockKey, Arc<Mutex<()>>>,
}

impl LockRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the lock for `(namespace, id)` is held
    ///
    /// The lock is released when the returned guard drops.
    pub fn acquire(&self, namespace: Namespace, id: &str) -> IdGuard<'_> {
        let key = (namespace, id.to_string());
        // Clone out of the map so the shard is not held while blocking.
        let mutex = Arc::clone(self.locks.entry(key.clone()).or_default().value());
        let guard = mutex.lock_arc();

        tracing::trace!(%namespace, id, "acquired entity lock");
        IdGuard {
            registry: self,
            key,
            guard: Some(guard),
        }
    }

    /// Number of ids currently locked or awaited
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no id is locked or awaited
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    fn release(&self, key: &LockKey) {
        self.locks
            .remove_if(key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

/// Held lock for one entity id
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct IdGuard<'a> {
    registry: &'a LockRegistry,
    key: LockKey,
    guard: Option<ArcMutexGuard<RawMutex, ()>>,
}

impl std::fmt::Debug for IdGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdGuard")
            .field("namespace", &self.key.0)
            .field("id", &self.key.1)
            .finish()
    }
}

impl Drop for IdGuard<'_> {
    fn drop(&mut self) {
        // Unlock before pruning so the registry's count sees only waiters.
        drop(self.guard.take());
        self.registry.release(&self.key);
    }
}
