//! Ledger Error Types
//!
//! Every rejection the core raises is a distinct variant so callers can
//! branch on cause. Rejections never leave a partial write behind.

use thiserror::Error;

use crate::core_types::{Points, UserId};

/// Ledger error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    // === Existence ===
    #[error("User {user_id} has no point history")]
    UserNotFound { user_id: UserId },

    // === Bounds ===
    #[error("Balance {value} would exceed the maximum of {max}")]
    OverCap { value: Points, max: Points },

    #[error("Balance {value} would fall below the minimum of {min}")]
    Insufficient { value: Points, min: Points },

    // === Boundary validation ===
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // === Contention ===
    #[error("Timed out waiting for the lock of user {user_id}")]
    LockTimeout { user_id: UserId },

    // === Collaborators ===
    #[error("Store error: {0}")]
    Store(String),
}

impl LedgerError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::UserNotFound { .. } => "USER_NOT_FOUND",
            LedgerError::OverCap { .. } => "OVER_CAP",
            LedgerError::Insufficient { .. } => "INSUFFICIENT_POINTS",
            LedgerError::InvalidArgument(_) => "INVALID_ARGUMENT",
            LedgerError::LockTimeout { .. } => "LOCK_TIMEOUT",
            LedgerError::Store(_) => "STORE_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            LedgerError::InvalidArgument(_) => 400,
            LedgerError::UserNotFound { .. } => 404,
            LedgerError::OverCap { .. } | LedgerError::Insufficient { .. } => 422,
            LedgerError::Store(_) => 500,
            LedgerError::LockTimeout { .. } => 503,
        }
    }
}

/// Failure reported by a balance or history store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store write rejected: {0}")]
    WriteRejected(String),
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        LedgerError::Store(e.to_string())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
