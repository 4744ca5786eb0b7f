//! Ledger Service - per-user balance mutation engine
//!
//! Composes the lock registry, the bounds validator and the two stores so that
//! "read balance -> validate -> write balance -> append history" is serial per
//! user while different users proceed in parallel.
//!
//! # Existence
//!
//! A user exists iff the history store holds at least one entry for it.
//! Balance-store presence alone does not count. `get_history` does not check
//! existence and returns an empty list for unknown users.
//!
//! # Mutation flow (charge / use)
//!
//! ```text
//! pre-check amount ──▶ acquire user lock ──▶ existence ──▶ read balance
//!                                                              │
//!        release ◀── append history ◀── write balance ◀── check total
//! ```
//!
//! Any rejection before the balance write leaves both stores untouched. The
//! balance write and history append are two independent store calls: if the
//! append fails, the new balance stays and the entry is missing.
//!
//! # Cancellation
//!
//! Dropping a mutation future while it waits for the lock has no effect. Once
//! the lock is taken, the rest of the mutation runs on its own task together
//! with the guard, so a dropped caller (e.g. a disconnected HTTP client) can
//! no longer stop it between the balance write and the history append.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::core_types::{Points, UserId, now_ms};
use crate::error::{LedgerError, LedgerResult};
use crate::lock_registry::{KeyedLockRegistry, UserLockGuard};
use crate::models::{HistoryEntry, TransactionKind, UserBalance};
use crate::policy::PointPolicy;
use crate::store::{BalanceStore, HistoryStore};
use crate::validation::BoundsValidator;

#[derive(Clone)]
pub struct LedgerService {
    balances: Arc<dyn BalanceStore>,
    histories: Arc<dyn HistoryStore>,
    locks: Arc<KeyedLockRegistry>,
    validator: BoundsValidator,
    lock_timeout: Option<Duration>,
}

impl LedgerService {
    /// Create a service that waits indefinitely for user locks
    pub fn new(
        balances: Arc<dyn BalanceStore>,
        histories: Arc<dyn HistoryStore>,
        locks: Arc<KeyedLockRegistry>,
        policy: PointPolicy,
    ) -> Self {
        Self {
            balances,
            histories,
            locks,
            validator: BoundsValidator::new(policy),
            lock_timeout: None,
        }
    }

    /// Bound the wait for a user lock. `None` restores unbounded waiting.
    pub fn with_lock_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn policy(&self) -> &PointPolicy {
        self.validator.policy()
    }

    pub fn locks(&self) -> &Arc<KeyedLockRegistry> {
        &self.locks
    }

    // ============================================================
    // QUERIES
    // ============================================================

    /// Current balance of an existing user.
    ///
    /// Lock-free read: it may observe a balance another mutation is writing.
    pub async fn get_balance(&self, user_id: UserId) -> LedgerResult<UserBalance> {
        self.ensure_exists(user_id).await?;
        Ok(self.balances.get(user_id).await?)
    }

    /// History of `user_id` in insertion order. Unknown users yield an empty list.
    pub async fn get_history(&self, user_id: UserId) -> LedgerResult<Vec<HistoryEntry>> {
        Ok(self.histories.list_by_user(user_id).await?)
    }

    // ============================================================
    // MUTATIONS
    // ============================================================

    /// Add `amount` points.
    ///
    /// # Errors
    /// - `OverCap` if `amount` alone, or the resulting balance, exceeds the cap
    /// - `UserNotFound` if the user has no history
    /// - `LockTimeout` if a lock timeout is configured and expires
    pub async fn charge(&self, user_id: UserId, amount: Points) -> LedgerResult<UserBalance> {
        // Fail fast without contending for the lock
        self.validator.check_cap(amount)?;

        let guard = self
            .locks
            .acquire_timeout(user_id, self.lock_timeout)
            .await?;

        let this = self.clone();
        run_locked(guard, async move { this.charge_locked(user_id, amount).await }).await
    }

    async fn charge_locked(&self, user_id: UserId, amount: Points) -> LedgerResult<UserBalance> {
        self.ensure_exists(user_id).await?;
        let current = self.balances.get(user_id).await?;

        let total = current.balance.saturating_add(amount);
        if let Err(e) = self.validator.check_cap(total) {
            warn!(user_id, amount, current = current.balance, "Charge rejected: {}", e);
            return Err(e);
        }

        self.commit(user_id, total, amount, TransactionKind::Charge)
            .await
    }

    /// Spend `amount` points.
    ///
    /// # Errors
    /// - `Insufficient` if the resulting balance would fall below the floor
    /// - `UserNotFound` if the user has no history
    /// - `LockTimeout` if a lock timeout is configured and expires
    pub async fn use_points(&self, user_id: UserId, amount: Points) -> LedgerResult<UserBalance> {
        // Even a full balance cannot cover this amount
        self.validator
            .check_floor(self.policy().max().saturating_sub(amount))?;

        let guard = self
            .locks
            .acquire_timeout(user_id, self.lock_timeout)
            .await?;

        let this = self.clone();
        run_locked(guard, async move { this.use_locked(user_id, amount).await }).await
    }

    async fn use_locked(&self, user_id: UserId, amount: Points) -> LedgerResult<UserBalance> {
        self.ensure_exists(user_id).await?;
        let current = self.balances.get(user_id).await?;

        let total = current.balance.saturating_sub(amount);
        if let Err(e) = self.validator.check_bounds(total) {
            warn!(user_id, amount, current = current.balance, "Use rejected: {}", e);
            return Err(e);
        }

        self.commit(user_id, total, amount, TransactionKind::Use)
            .await
    }

    /// Open a user with an initial balance.
    ///
    /// Writes the balance and one CHARGE entry of `balance`, which makes the
    /// user exist for every other operation.
    ///
    /// # Errors
    /// - `InvalidArgument` if the user already has history
    /// - `OverCap` / `Insufficient` if `balance` is outside the policy
    pub async fn seed_account(&self, user_id: UserId, balance: Points) -> LedgerResult<UserBalance> {
        self.validator.check_bounds(balance)?;

        let guard = self
            .locks
            .acquire_timeout(user_id, self.lock_timeout)
            .await?;

        let this = self.clone();
        run_locked(guard, async move {
            if this.histories.has_entries(user_id).await? {
                return Err(LedgerError::InvalidArgument(format!(
                    "user {} already exists",
                    user_id
                )));
            }
            this.commit(user_id, balance, balance, TransactionKind::Charge)
                .await
        })
        .await
    }

    // ============================================================
    // INTERNALS
    // ============================================================

    async fn ensure_exists(&self, user_id: UserId) -> LedgerResult<()> {
        if !self.histories.has_entries(user_id).await? {
            return Err(LedgerError::UserNotFound { user_id });
        }
        Ok(())
    }

    /// Write the new balance, then append the history entry.
    ///
    /// Caller must hold the user lock and have validated `total`.
    async fn commit(
        &self,
        user_id: UserId,
        total: Points,
        amount: Points,
        kind: TransactionKind,
    ) -> LedgerResult<UserBalance> {
        let updated = self.balances.set(user_id, total).await?;

        if let Err(e) = self
            .histories
            .append(user_id, amount, kind, now_ms())
            .await
        {
            error!(
                user_id,
                amount,
                %kind,
                balance = total,
                "History append failed after balance write: {}",
                e
            );
            return Err(e.into());
        }

        debug!(user_id, amount, %kind, balance = total, "Balance updated");
        Ok(updated)
    }
}

/// Run `work` to completion on its own task while holding `guard`.
///
/// The guard moves into the task and is released when `work` finishes,
/// whether or not anyone still awaits the result.
async fn run_locked<F>(guard: UserLockGuard, work: F) -> LedgerResult<UserBalance>
where
    F: Future<Output = LedgerResult<UserBalance>> + Send + 'static,
{
    let handle = tokio::spawn(async move {
        let _guard = guard;
        work.await
    });
    match handle.await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => Err(LedgerError::Store(format!("mutation task aborted: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::{InMemoryBalanceStore, InMemoryHistoryStore};
    use async_trait::async_trait;

    struct Harness {
        service: LedgerService,
        balances: Arc<InMemoryBalanceStore>,
        histories: Arc<InMemoryHistoryStore>,
    }

    impl Harness {
        fn new() -> Self {
            let balances = Arc::new(InMemoryBalanceStore::new());
            let histories = Arc::new(InMemoryHistoryStore::new());
            let service = LedgerService::new(
                balances.clone(),
                histories.clone(),
                Arc::new(KeyedLockRegistry::new()),
                PointPolicy::default(),
            );
            Self {
                service,
                balances,
                histories,
            }
        }

        async fn with_user(user_id: UserId, balance: Points) -> Self {
            let harness = Self::new();
            harness.service.seed_account(user_id, balance).await.unwrap();
            harness
        }
    }

    // ========================================================================
    // Existence
    // ========================================================================

    #[tokio::test]
    async fn test_get_balance_unknown_user() {
        let h = Harness::new();
        assert_eq!(
            h.service.get_balance(1).await,
            Err(LedgerError::UserNotFound { user_id: 1 })
        );
    }

    #[tokio::test]
    async fn test_balance_without_history_is_not_existence() {
        let h = Harness::new();
        h.balances.set(1, 500).await.unwrap();

        assert!(matches!(
            h.service.get_balance(1).await,
            Err(LedgerError::UserNotFound { .. })
        ));
        assert!(matches!(
            h.service.charge(1, 10).await,
            Err(LedgerError::UserNotFound { .. })
        ));
        assert!(matches!(
            h.service.use_points(1, 10).await,
            Err(LedgerError::UserNotFound { .. })
        ));
        assert_eq!(h.balances.get(1).await.unwrap().balance, 500);
    }

    #[tokio::test]
    async fn test_get_history_unknown_user_is_empty() {
        let h = Harness::new();
        assert!(h.service.get_history(42).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_entry_alone_establishes_existence() {
        let h = Harness::new();
        h.histories
            .append(3, 100, TransactionKind::Charge, now_ms())
            .await
            .unwrap();

        // Balance store was never written: zero snapshot
        assert_eq!(h.service.get_balance(3).await.unwrap().balance, 0);
        assert_eq!(h.service.charge(3, 100).await.unwrap().balance, 100);
    }

    // ========================================================================
    // Charge
    // ========================================================================

    #[tokio::test]
    async fn test_charge_appends_entry() {
        let h = Harness::with_user(1, 100).await;

        let updated = h.service.charge(1, 50).await.unwrap();
        assert_eq!(updated.user_id, 1);
        assert_eq!(updated.balance, 150);

        let history = h.service.get_history(1).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].kind, TransactionKind::Charge);
        assert_eq!(history[1].amount, 50);
    }

    #[tokio::test]
    async fn test_charge_to_exact_cap() {
        let h = Harness::with_user(1, 999_000).await;
        assert_eq!(h.service.charge(1, 1_000).await.unwrap().balance, 1_000_000);
    }

    #[tokio::test]
    async fn test_charge_over_cap_leaves_stores_unchanged() {
        let h = Harness::with_user(1, 999_000).await;

        let err = h.service.charge(1, 1_001).await.unwrap_err();
        assert_eq!(
            err,
            LedgerError::OverCap {
                value: 1_000_001,
                max: 1_000_000
            }
        );
        assert_eq!(h.service.get_balance(1).await.unwrap().balance, 999_000);
        assert_eq!(h.service.get_history(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_charge_amount_over_cap_fails_before_existence() {
        let h = Harness::new();
        // Pre-check rejects before the existence check would
        assert!(matches!(
            h.service.charge(1, 1_000_001).await,
            Err(LedgerError::OverCap { .. })
        ));
        assert!(h.service.locks().is_empty());
    }

    // ========================================================================
    // Use
    // ========================================================================

    #[tokio::test]
    async fn test_use_to_exact_zero() {
        let h = Harness::with_user(1, 300).await;
        assert_eq!(h.service.use_points(1, 300).await.unwrap().balance, 0);
    }

    #[tokio::test]
    async fn test_use_below_zero_leaves_stores_unchanged() {
        let h = Harness::with_user(1, 300).await;

        let err = h.service.use_points(1, 301).await.unwrap_err();
        assert_eq!(err, LedgerError::Insufficient { value: -1, min: 0 });
        assert_eq!(h.service.get_balance(1).await.unwrap().balance, 300);
        assert_eq!(h.service.get_history(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_use_records_used_amount() {
        let h = Harness::with_user(1, 300).await;
        h.service.use_points(1, 120).await.unwrap();

        let last = h.service.get_history(1).await.unwrap().pop().unwrap();
        assert_eq!(last.kind, TransactionKind::Use);
        assert_eq!(last.amount, 120);
    }

    #[tokio::test]
    async fn test_use_more_than_cap_fails_fast() {
        let h = Harness::with_user(1, 1_000_000).await;
        assert!(matches!(
            h.service.use_points(1, 1_000_001).await,
            Err(LedgerError::Insufficient { .. })
        ));
    }

    #[tokio::test]
    async fn test_charge_then_use_restores_balance() {
        let h = Harness::with_user(1, 400).await;
        h.service.charge(1, 75).await.unwrap();
        let restored = h.service.use_points(1, 75).await.unwrap();
        assert_eq!(restored.balance, 400);

        let history = h.service.get_history(1).await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(
            (history[1].kind, history[1].amount),
            (TransactionKind::Charge, 75)
        );
        assert_eq!((history[2].kind, history[2].amount), (TransactionKind::Use, 75));
    }

    // ========================================================================
    // Seeding
    // ========================================================================

    #[tokio::test]
    async fn test_seed_account_twice_rejected() {
        let h = Harness::with_user(1, 10).await;
        assert!(matches!(
            h.service.seed_account(1, 10).await,
            Err(LedgerError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_seed_account_out_of_bounds() {
        let h = Harness::new();
        assert!(matches!(
            h.service.seed_account(1, 2_000_000).await,
            Err(LedgerError::OverCap { .. })
        ));
        assert!(matches!(
            h.service.seed_account(1, -5).await,
            Err(LedgerError::Insufficient { .. })
        ));
        assert!(h.service.get_history(1).await.unwrap().is_empty());
    }

    // ========================================================================
    // Lock timeout
    // ========================================================================

    #[tokio::test]
    async fn test_lock_timeout_leaves_stores_unchanged() {
        let h = Harness::with_user(1, 100).await;
        let service = h
            .service
            .with_lock_timeout(Some(Duration::from_millis(20)));

        let _held = service.locks().acquire(1).await;
        assert_eq!(
            service.charge(1, 10).await,
            Err(LedgerError::LockTimeout { user_id: 1 })
        );
        assert_eq!(h.balances.get(1).await.unwrap().balance, 100);
        assert_eq!(h.histories.list_by_user(1).await.unwrap().len(), 1);
    }

    // ========================================================================
    // Store failure between balance write and history append
    // ========================================================================

    /// History store whose appends fail once armed
    struct FailingHistory {
        inner: InMemoryHistoryStore,
        fail_append: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl HistoryStore for FailingHistory {
        async fn list_by_user(&self, user_id: UserId) -> Result<Vec<HistoryEntry>, StoreError> {
            self.inner.list_by_user(user_id).await
        }

        async fn append(
            &self,
            user_id: UserId,
            amount: Points,
            kind: TransactionKind,
            occurred_at: i64,
        ) -> Result<HistoryEntry, StoreError> {
            if self.fail_append.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(StoreError::WriteRejected("history offline".into()));
            }
            self.inner.append(user_id, amount, kind, occurred_at).await
        }
    }

    #[tokio::test]
    async fn test_history_failure_keeps_balance_write() {
        let balances = Arc::new(InMemoryBalanceStore::new());
        let histories = Arc::new(FailingHistory {
            inner: InMemoryHistoryStore::new(),
            fail_append: std::sync::atomic::AtomicBool::new(false),
        });
        let service = LedgerService::new(
            balances.clone(),
            histories.clone(),
            Arc::new(KeyedLockRegistry::new()),
            PointPolicy::default(),
        );
        service.seed_account(1, 100).await.unwrap();

        histories
            .fail_append
            .store(true, std::sync::atomic::Ordering::SeqCst);
        let err = service.charge(1, 50).await.unwrap_err();
        assert!(matches!(err, LedgerError::Store(_)));

        // Documented gap: balance written, entry missing
        assert_eq!(balances.get(1).await.unwrap().balance, 150);
        assert_eq!(service.get_history(1).await.unwrap().len(), 1);

        // Lock was released on the error path
        histories
            .fail_append
            .store(false, std::sync::atomic::Ordering::SeqCst);
        assert_eq!(service.charge(1, 1).await.unwrap().balance, 151);
    }
}
