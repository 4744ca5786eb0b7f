//! Store collaborators
//!
//! The ledger layers its locking and bounds logic on top of two keyed stores.
//! Each store is assumed atomic per key; the two are NOT written in one
//! transaction, so a failure between the balance write and the history append
//! leaves the balance updated without its entry.

pub mod memory;

pub use memory::{InMemoryBalanceStore, InMemoryHistoryStore};

use async_trait::async_trait;

use crate::core_types::{Points, TimestampMs, UserId};
use crate::error::StoreError;
use crate::models::{HistoryEntry, TransactionKind, UserBalance};

/// Keyed read / overwrite of the current balance
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Current snapshot; [`UserBalance::empty`] if the id was never written.
    async fn get(&self, user_id: UserId) -> Result<UserBalance, StoreError>;

    /// Overwrite the balance and return the stored snapshot.
    async fn set(&self, user_id: UserId, balance: Points) -> Result<UserBalance, StoreError>;
}

/// Append-only, insertion-ordered history per user
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// All entries of `user_id` in insertion order (possibly empty).
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<HistoryEntry>, StoreError>;

    /// Whether `user_id` has at least one entry.
    ///
    /// The default lists the whole history; stores that can answer without
    /// copying entries should override it.
    async fn has_entries(&self, user_id: UserId) -> Result<bool, StoreError> {
        Ok(!self.list_by_user(user_id).await?.is_empty())
    }

    /// Append one entry and return it with its assigned id.
    async fn append(
        &self,
        user_id: UserId,
        amount: Points,
        kind: TransactionKind,
        occurred_at: TimestampMs,
    ) -> Result<HistoryEntry, StoreError>;
}
