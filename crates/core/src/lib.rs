//! Arrowhead Core - order integrity and picking pipeline.
//!
//! This crate provides the pieces every Arrowhead component agrees on:
//! - `server` - HTTP service for order submission, listing, and picking sessions
//! - `cli` - Offline tools for validating and normalizing order dumps
//!
//! # Architecture
//!
//! The core crate contains only types and pure transformations - no I/O, no
//! timers, no HTTP. Time enters the picking state machine as an explicit
//! `Instant` argument so the async driver in `server` owns every suspension
//! point.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, SKUs, statuses, and estimates
//! - [`order`] - Canonical in-memory `NormalizedOrder` and `OrderItem`
//! - [`validation`] - Accumulate-all-errors payload validation and defaulting
//! - [`normalize`] - Defensive reshaping of stored records into canonical orders
//! - [`picking`] - Per-item quantity controller, tiers, and lifecycle guard
//! - [`summary`] - Dashboard stats and the priority pick queue

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod normalize;
pub mod order;
pub mod picking;
pub mod summary;
pub mod types;
pub mod validation;

pub use normalize::{NormalizationError, NormalizedBatch, Omission};
pub use order::{NormalizedOrder, OrderItem};
pub use picking::{PickEvent, PickList, PickTier};
pub use types::*;
pub use validation::{ValidationRejection, ValidationResult};
