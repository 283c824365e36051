//! Core types for Arrowhead.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod estimate;
pub mod id;
pub mod location;
pub mod sku;
pub mod status;

pub use email::{Email, EmailError};
pub use estimate::PickEstimate;
pub use id::*;
pub use location::BinLocation;
pub use sku::{Sku, SkuError};
pub use status::*;
