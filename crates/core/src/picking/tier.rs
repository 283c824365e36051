//! Progress tiers.

use serde::{Deserialize, Serialize};

/// Named progress bucket derived from `(current, target)`.
///
/// | Condition                          | Tier            |
/// |------------------------------------|-----------------|
/// | `current == target`, `target > 0`  | `COMPLETE`      |
/// | `current / target >= 0.75`         | `NEAR_COMPLETE` |
/// | `current / target >= 0.5`          | `HALF_COMPLETE` |
/// | `0 < current / target < 0.5`       | `STARTED`       |
/// | `current == 0`                     | `NOT_STARTED`   |
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PickTier {
    #[default]
    NotStarted,
    Started,
    HalfComplete,
    NearComplete,
    Complete,
}

impl PickTier {
    /// Classify progress. Depends on nothing but its arguments.
    ///
    /// Ratios are compared with integer cross-multiplication so a quantity
    /// like `3 / 4` lands exactly on `NEAR_COMPLETE`.
    #[must_use]
    pub fn classify(current: u32, target: u32) -> Self {
        if target > 0 && current >= target {
            return Self::Complete;
        }
        if current == 0 {
            return Self::NotStarted;
        }
        let current = u64::from(current);
        let target = u64::from(target);
        if current * 4 >= target * 3 {
            Self::NearComplete
        } else if current * 2 >= target {
            Self::HalfComplete
        } else {
            Self::Started
        }
    }

    /// Wire name (`HALF_COMPLETE`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "NOT_STARTED",
            Self::Started => "STARTED",
            Self::HalfComplete => "HALF_COMPLETE",
            Self::NearComplete => "NEAR_COMPLETE",
            Self::Complete => "COMPLETE",
        }
    }
}

impl std::fmt::Display for PickTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
