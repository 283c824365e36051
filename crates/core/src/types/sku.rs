//! Stock-keeping unit codes.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// SKU and barcode format: 12 or 13 ASCII digits (UPC-A / EAN-13).
static SKU_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{12,13}$").expect("Invalid regex"));

/// Errors that can occur when parsing a [`Sku`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SkuError {
    /// The input is not 12-13 ASCII digits.
    #[error("must be a 12-13 digit numeric code (got {0:?})")]
    Format(String),
}

/// A 12-13 digit numeric SKU or barcode.
///
/// ```
/// use arrowhead_core::Sku;
///
/// assert!(Sku::parse("123456789012").is_ok());
/// assert!(Sku::parse("1234567890123").is_ok());
/// assert!(Sku::parse("12345678901").is_err());
/// assert!(Sku::parse("12345678901a").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Sku(String);

impl Sku {
    /// Parse a SKU, rejecting anything outside `^\d{12,13}$`.
    ///
    /// # Errors
    ///
    /// Returns [`SkuError::Format`] when the pattern does not match.
    pub fn parse(s: &str) -> Result<Self, SkuError> {
        if Self::is_valid(s) {
            Ok(Self(s.to_owned()))
        } else {
            Err(SkuError::Format(s.to_owned()))
        }
    }

    /// Returns `true` when `s` has the SKU/barcode shape.
    #[must_use]
    pub fn is_valid(s: &str) -> bool {
        SKU_RE.is_match(s)
    }

    /// Returns the SKU as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
