//! Bounds validation for prospective balances
//!
//! Pure checks against a [`PointPolicy`]. No I/O, no state beyond the policy.
//! The ledger calls these twice per mutation: once on the raw amount before
//! taking the user lock, and once on the real total after reading the balance
//! inside the lock. Only the second call decides correctness.

use crate::core_types::Points;
use crate::error::{LedgerError, LedgerResult};
use crate::policy::PointPolicy;

/// Stateless validator bound to a policy
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundsValidator {
    policy: PointPolicy,
}

impl BoundsValidator {
    pub fn new(policy: PointPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PointPolicy {
        &self.policy
    }

    /// Reject `value > max` with [`LedgerError::OverCap`]
    #[inline]
    pub fn check_cap(&self, value: Points) -> LedgerResult<()> {
        if value > self.policy.max() {
            return Err(LedgerError::OverCap {
                value,
                max: self.policy.max(),
            });
        }
        Ok(())
    }

    /// Reject `value < min` with [`LedgerError::Insufficient`]
    #[inline]
    pub fn check_floor(&self, value: Points) -> LedgerResult<()> {
        if value < self.policy.min() {
            return Err(LedgerError::Insufficient {
                value,
                min: self.policy.min(),
            });
        }
        Ok(())
    }

    /// Floor first, then cap
    pub fn check_bounds(&self, value: Points) -> LedgerResult<()> {
        self.check_floor(value)?;
        self.check_cap(value)
    }
}
