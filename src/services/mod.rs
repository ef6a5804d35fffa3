//! Service layer for business logic
//!
//! HTTP handlers and background tasks share these services.

mod capacity;
mod link_service;

pub use capacity::{CapacityGuard, SweepOutcome};
pub use link_service::*;
