//! Per-conversation turn serialization
//!
//! Turns for the same conversation run one at a time; turns for different
//! conversations never wait on each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OwnedMutexGuard;
use tracing::debug;

type LockMap = HashMap<String, Arc<tokio::sync::Mutex<()>>>;

/// Lazily created async mutex per conversation key
#[derive(Debug, Clone, Default)]
pub struct ConversationLocks {
    locks: Arc<Mutex<LockMap>>,
}

impl ConversationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> MutexGuard<'_, LockMap> {
        // The map is only touched in short non-panicking sections
        self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Wait until no other turn holds `key`
    pub async fn acquire(&self, key: &str) -> ConversationGuard {
        let lock = self.map().entry(key.to_string()).or_default().clone();
        let guard = lock.lock_owned().await;

        ConversationGuard {
            key: key.to_string(),
            locks: self.clone(),
            guard: Some(guard),
        }
    }

    /// Drop locks nobody holds or waits on
    pub fn cleanup_idle_entries(&self) {
        let mut locks = self.map();
        // Only the map's own reference left means nobody is waiting
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);

        debug!(remaining_entries = locks.len(), "Cleaned up idle conversation locks");
    }

    /// Keys that currently have a holder or waiters
    pub fn active_count(&self) -> usize {
        self.map().len()
    }
}

/// Held for the duration of one turn
#[derive(Debug)]
pub struct ConversationGuard {
    key: String,
    locks: ConversationLocks,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ConversationGuard {
    fn drop(&mut self) {
        self.guard.take();
        self.locks.cleanup_idle_entries();
    }
}
