//! Core types used throughout the system
//!
//! These are fundamental type aliases used by all modules.
//! They provide semantic meaning and enable future type evolution.

/// User ID - globally unique, immutable after assignment.
///
/// # Usage:
/// - Key of the balance store and the history store
/// - Key of the per-user lock registry
pub type UserId = u64;

/// Point amount or balance.
///
/// Signed so that a prospective balance below the floor can be represented
/// and rejected by the bounds validator instead of wrapping.
pub type Points = i64;

/// Unix timestamp in milliseconds
pub type TimestampMs = i64;

/// Current wall-clock time in milliseconds
#[inline]
pub fn now_ms() -> TimestampMs {
    chrono::Utc::now().timestamp_millis()
}
