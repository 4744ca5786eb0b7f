//! Point policy - balance bounds
//!
//! Immutable once constructed. Loaded from the `policy` section of the
//! application config, falling back to the defaults below.

use serde::{Deserialize, Serialize};

use crate::core_types::Points;

/// Default minimum balance
pub const DEFAULT_MIN_POINTS: Points = 0;

/// Default maximum balance (cap)
pub const DEFAULT_MAX_POINTS: Points = 1_000_000;

/// Balance bounds every write must respect: `min <= balance <= max`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointPolicy {
    #[serde(default = "default_min")]
    min: Points,
    #[serde(default = "default_max")]
    max: Points,
}

fn default_min() -> Points {
    DEFAULT_MIN_POINTS
}

fn default_max() -> Points {
    DEFAULT_MAX_POINTS
}

impl PointPolicy {
    /// Create a policy with explicit bounds.
    ///
    /// # Errors
    /// Returns a message if `min > max`, since no balance could satisfy it.
    pub fn new(min: Points, max: Points) -> Result<Self, String> {
        if min > max {
            return Err(format!("policy min ({}) exceeds max ({})", min, max));
        }
        Ok(Self { min, max })
    }

    #[inline(always)]
    pub const fn min(&self) -> Points {
        self.min
    }

    #[inline(always)]
    pub const fn max(&self) -> Points {
        self.max
    }
}

impl Default for PointPolicy {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_POINTS,
            max: DEFAULT_MAX_POINTS,
        }
    }
}
