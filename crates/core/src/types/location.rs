//! Bin locations.
//!
//! Stored records carry the bin either as `location` or as `binLocation`.
//! Inside the crate there is one field; the two names only exist in the JSON
//! adapter in [`crate::order`].

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Text written for a bin that could not be resolved.
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// Physical storage slot for an item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum BinLocation {
    Known(String),
    #[default]
    Unknown,
}

impl BinLocation {
    /// Resolve a raw value. Blank strings and any casing of `"unknown"`
    /// (including the write-time default `"UNKNOWN"`) are unresolved.
    #[must_use]
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(code) if !code.is_empty() && !code.eq_ignore_ascii_case(UNKNOWN_LOCATION) => {
                Self::Known(code.to_owned())
            }
            _ => Self::Unknown,
        }
    }

    /// Whether the bin was resolved to a real slot.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    /// Display text; `"Unknown"` when unresolved.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(code) => code,
            Self::Unknown => UNKNOWN_LOCATION,
        }
    }
}

impl fmt::Display for BinLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for BinLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BinLocation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Self::from_raw(raw.as_deref()))
    }
}
