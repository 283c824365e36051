//! Stateful services behind the HTTP routes.

pub mod picking;

pub use picking::{PickSession, PickSnapshot, PickingService, SessionError};
