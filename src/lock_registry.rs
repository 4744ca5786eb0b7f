//! Per-user lock registry.
//!
//! Hands out one exclusive lock per user id, created lazily on first use.
//! Creation goes through `DashMap::entry().or_insert_with()`, which holds the
//! shard write lock, so concurrent first-acquisitions of an unseen key always
//! share a single mutex.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::core_types::UserId;
use crate::error::{LedgerError, LedgerResult};

/// Guard for one user's lock. Released on drop, on every exit path.
pub type UserLockGuard = OwnedMutexGuard<()>;

/// Thread-safe registry of per-user mutexes.
///
/// Entries live until [`KeyedLockRegistry::prune_idle`] removes them; the
/// ledger never prunes on its own.
#[derive(Default)]
pub struct KeyedLockRegistry {
    locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl KeyedLockRegistry {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Get the lock for `user_id`, creating it if absent.
    fn lock_for(&self, user_id: UserId) -> Arc<Mutex<()>> {
        self.locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Wait until the lock for `user_id` is free and take it.
    pub async fn acquire(&self, user_id: UserId) -> UserLockGuard {
        self.lock_for(user_id).lock_owned().await
    }

    /// Like [`acquire`](Self::acquire) but gives up after `timeout`.
    ///
    /// `None` waits indefinitely.
    ///
    /// # Errors
    /// [`LedgerError::LockTimeout`] if the wait exceeds `timeout`.
    pub async fn acquire_timeout(
        &self,
        user_id: UserId,
        timeout: Option<Duration>,
    ) -> LedgerResult<UserLockGuard> {
        let lock = self.lock_for(user_id);
        match timeout {
            None => Ok(lock.lock_owned().await),
            Some(limit) => tokio::time::timeout(limit, lock.lock_owned())
                .await
                .map_err(|_| LedgerError::LockTimeout { user_id }),
        }
    }

    /// Remove locks that nobody holds or waits on.
    ///
    /// A caller that has cloned the `Arc` (holding or queued) keeps the strong
    /// count above one, and cloning happens under the shard lock `retain`
    /// also takes, so a referenced entry is never dropped.
    ///
    /// Returns the number of entries removed.
    pub fn prune_idle(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before.saturating_sub(self.locks.len())
    }

    /// Number of tracked user ids
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_same_key_shares_lock() {
        let registry = KeyedLockRegistry::new();
        let a = registry.lock_for(7);
        let b = registry.lock_for(7);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_acquire_creates_one_lock() {
        let registry = Arc::new(KeyedLockRegistry::new());

        let mut handles = vec![];
        for _ in 0..32 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move { registry.lock_for(42) }));
        }

        let mut locks = vec![];
        for handle in handles {
            locks.push(handle.await.unwrap());
        }

        assert_eq!(registry.len(), 1);
        assert!(locks.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_mutual_exclusion_same_key() {
        let registry = Arc::new(KeyedLockRegistry::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = vec![];
        for _ in 0..16 {
            let registry = Arc::clone(&registry);
            let inside = Arc::clone(&inside);
            let max_seen = Arc::clone(&max_seen);
            handles.push(tokio::spawn(async move {
                let _guard = registry.acquire(1).await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let registry = KeyedLockRegistry::new();
        let _held = registry.acquire(1).await;

        let other = registry
            .acquire_timeout(2, Some(Duration::from_millis(50)))
            .await;
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn test_acquire_timeout_expires() {
        let registry = KeyedLockRegistry::new();
        let _held = registry.acquire(9).await;

        let err = registry
            .acquire_timeout(9, Some(Duration::from_millis(20)))
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::LockTimeout { user_id: 9 });
    }

    #[tokio::test]
    async fn test_release_on_drop() {
        let registry = KeyedLockRegistry::new();
        {
            let _guard = registry.acquire(3).await;
        }
        let again = registry
            .acquire_timeout(3, Some(Duration::from_millis(20)))
            .await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn test_prune_idle_keeps_held_locks() {
        let registry = KeyedLockRegistry::new();
        let held = registry.acquire(1).await;
        {
            let _idle = registry.acquire(2).await;
        }
        assert_eq!(registry.len(), 2);

        assert_eq!(registry.prune_idle(), 1);
        assert_eq!(registry.len(), 1);

        drop(held);
        assert_eq!(registry.prune_idle(), 1);
        assert!(registry.is_empty());
    }
}
