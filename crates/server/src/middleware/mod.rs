//! HTTP middleware and extractors.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, outermost)
//! 2. `TraceLayer` (request span with method, uri, status, latency)
//! 3. Request ID (recorded on the span and echoed in `x-request-id`)
//!
//! The [`validated`] extractors run inside handlers and turn the order
//! submission contract into a typed argument.

pub mod request_id;
pub mod validated;

pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use validated::{ValidatedOrder, ValidatedStatus};
