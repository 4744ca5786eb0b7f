//! In-memory stores backed by DashMap.
//!
//! Per-key operations are atomic via the shard lock. An optional simulated
//! latency is applied before each call to widen race windows in tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;

use super::{BalanceStore, HistoryStore};
use crate::core_types::{Points, TimestampMs, UserId, now_ms};
use crate::error::StoreError;
use crate::models::{HistoryEntry, TransactionKind, UserBalance};

async fn simulate_latency(latency: Option<Duration>) {
    if let Some(d) = latency {
        tokio::time::sleep(d).await;
    }
}

// ============================================================
// BALANCE STORE
// ============================================================

#[derive(Default)]
pub struct InMemoryBalanceStore {
    balances: DashMap<UserId, UserBalance>,
    latency: Option<Duration>,
}

impl InMemoryBalanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            balances: DashMap::new(),
            latency: Some(latency),
        }
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

#[async_trait]
impl BalanceStore for InMemoryBalanceStore {
    async fn get(&self, user_id: UserId) -> Result<UserBalance, StoreError> {
        simulate_latency(self.latency).await;
        Ok(self
            .balances
            .get(&user_id)
            .map(|entry| *entry)
            .unwrap_or_else(|| UserBalance::empty(user_id)))
    }

    async fn set(&self, user_id: UserId, balance: Points) -> Result<UserBalance, StoreError> {
        simulate_latency(self.latency).await;
        let snapshot = UserBalance {
            user_id,
            balance,
            updated_at: now_ms(),
        };
        self.balances.insert(user_id, snapshot);
        Ok(snapshot)
    }
}

// ============================================================
// HISTORY STORE
// ============================================================

pub struct InMemoryHistoryStore {
    entries: DashMap<UserId, Vec<HistoryEntry>>,
    next_id: AtomicU64,
    latency: Option<Duration>,
}

impl Default for InMemoryHistoryStore {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
            next_id: AtomicU64::new(1),
            latency: None,
        }
    }
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Total entries across all users
    pub fn total_entries(&self) -> usize {
        self.entries.iter().map(|e| e.value().len()).sum()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<HistoryEntry>, StoreError> {
        simulate_latency(self.latency).await;
        Ok(self
            .entries
            .get(&user_id)
            .map(|list| list.value().clone())
            .unwrap_or_default())
    }

    async fn has_entries(&self, user_id: UserId) -> Result<bool, StoreError> {
        simulate_latency(self.latency).await;
        Ok(self
            .entries
            .get(&user_id)
            .is_some_and(|list| !list.is_empty()))
    }

    async fn append(
        &self,
        user_id: UserId,
        amount: Points,
        kind: TransactionKind,
        occurred_at: TimestampMs,
    ) -> Result<HistoryEntry, StoreError> {
        simulate_latency(self.latency).await;
        // Id assignment and push happen under the same shard lock, so ids
        // within one user's list are strictly increasing.
        let mut list = self.entries.entry(user_id).or_default();
        let entry = HistoryEntry {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            user_id,
            amount,
            kind,
            occurred_at,
        };
        list.push(entry.clone());
        Ok(entry)
    }
}
