//! Point Ledger - per-user point balance with append-only history
//!
//! Concurrent charge/use operations with no lost updates and strict bounds
//! (`min <= balance <= max`). Mutations on one user are serialized through a
//! per-user lock; different users never block each other.
//!
//! # Modules
//!
//! - [`core_types`] - Type aliases (UserId, Points, TimestampMs)
//! - [`policy`] - Balance bounds
//! - [`validation`] - Bounds validator
//! - [`lock_registry`] - Per-user lock registry
//! - [`models`] - UserBalance and HistoryEntry
//! - [`error`] - Error taxonomy
//! - [`store`] - Balance/history store traits and in-memory stores
//! - [`ledger`] - LedgerService (get balance, get history, charge, use)
//! - [`gateway`] - HTTP request layer
//! - [`config`] / [`logging`] - Application plumbing

// Core types - must be first!
pub mod core_types;

pub mod error;
pub mod ledger;
pub mod lock_registry;
pub mod models;
pub mod policy;
pub mod store;
pub mod validation;

// Application plumbing
pub mod config;
pub mod gateway;
pub mod logging;

// Convenient re-exports at crate root
pub use core_types::{Points, TimestampMs, UserId};
pub use error::{LedgerError, LedgerResult, StoreError};
pub use ledger::LedgerService;
pub use lock_registry::KeyedLockRegistry;
pub use models::{HistoryEntry, TransactionKind, UserBalance};
pub use policy::PointPolicy;
pub use store::{BalanceStore, HistoryStore, InMemoryBalanceStore, InMemoryHistoryStore};
pub use validation::BoundsValidator;
