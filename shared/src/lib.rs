//! Shared types and domain logic for the Inventory Ledger Platform
//!
//! This crate contains the pure, I/O-free pieces shared between the backend
//! and other components: unit conversion, week buckets, alert
//! classification, and the common domain models.

pub mod models;
pub mod types;
pub mod units;
pub mod validation;

pub use models::*;
pub use types::*;
pub use units::*;
pub use validation::*;
