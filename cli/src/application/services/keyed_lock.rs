//! Per-key async mutual exclusion.
//!
//! Operations on the same key are serialized; different keys never contend
//! beyond the short map lookup.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::OwnedMutexGuard;

type LockMap = HashMap<String, Arc<tokio::sync::Mutex<()>>>;

#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Arc<Mutex<LockMap>>,
}

impl KeyedLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`. Released when the guard drops.
    ///
    /// A key's entry lives only while someone holds or waits for it.
    pub async fn lock(&self, key: &str) -> KeyGuard {
        let lock = Arc::clone(lock_map(&self.locks).entry(key.to_string()).or_default());
        KeyGuard {
            key: key.to_string(),
            locks: Arc::clone(&self.locks),
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Number of keys currently held or awaited.
    #[must_use]
    pub fn len(&self) -> usize {
        lock_map(&self.locks).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusive access to one key of a [`KeyedLocks`].
#[derive(Debug)]
pub struct KeyGuard {
    key: String,
    locks: Arc<Mutex<LockMap>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = lock_map(&self.locks);
        // Waiters hold their own clone, so a count of one means only the map is left.
        if locks
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.key);
        }
    }
}

fn lock_map(locks: &Mutex<LockMap>) -> MutexGuard<'_, LockMap> {
    locks.lock().unwrap_or_else(PoisonError::into_inner)
}
