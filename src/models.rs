// models.rs - Balance snapshot and history entry types

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::core_types::{Points, TimestampMs, UserId};

/// Kind of balance-affecting event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Charge, // Points added
    Use,    // Points spent
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Charge => write!(f, "CHARGE"),
            TransactionKind::Use => write!(f, "USE"),
        }
    }
}

// ============================================================
// USER BALANCE
// ============================================================

/// Current balance snapshot of one user
///
/// Written only by the ledger under the user's lock; bounds are
/// checked on every write, never on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserBalance {
    #[schema(value_type = u64)]
    pub user_id: UserId,
    #[schema(value_type = i64, example = 1000)]
    pub balance: Points,
    /// Last write time (ms); 0 for a never-written user
    #[schema(value_type = i64)]
    pub updated_at: TimestampMs,
}

impl UserBalance {
    /// Snapshot returned for an id that was never written
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            balance: 0,
            updated_at: 0,
        }
    }
}

// ============================================================
// HISTORY ENTRY
// ============================================================

/// Immutable record of one charge or use.
///
/// `amount` is always the magnitude of the change, not the resulting balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HistoryEntry {
    /// Store-assigned id, increasing in insertion order
    pub id: u64,
    #[schema(value_type = u64)]
    pub user_id: UserId,
    #[schema(value_type = i64)]
    pub amount: Points,
    pub kind: TransactionKind,
    #[schema(value_type = i64)]
    pub occurred_at: TimestampMs,
}
