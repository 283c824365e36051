//! Pick-time estimates.
//!
//! Defaulting happens once, at write time (`estimatedPickMinutes = 10`). On
//! read, a missing value means nobody estimated the order, which is not the
//! same as an estimate of zero minutes.

use serde::{Deserialize, Serialize};

/// Estimated minutes to pick an order, or the explicit absence of one.
///
/// Serializes as a JSON number or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "Option<u32>", into = "Option<u32>")]
pub enum PickEstimate {
    Estimated(u32),
    #[default]
    NotEstimated,
}

impl PickEstimate {
    /// Minutes, if estimated.
    #[must_use]
    pub const fn minutes(self) -> Option<u32> {
        match self {
            Self::Estimated(minutes) => Some(minutes),
            Self::NotEstimated => None,
        }
    }
}

impl From<Option<u32>> for PickEstimate {
    fn from(minutes: Option<u32>) -> Self {
        minutes.map_or(Self::NotEstimated, Self::Estimated)
    }
}

impl From<PickEstimate> for Option<u32> {
    fn from(estimate: PickEstimate) -> Self {
        estimate.minutes()
    }
}
