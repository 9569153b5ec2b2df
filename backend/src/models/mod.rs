//! Database models for the Inventory Ledger Platform
//!
//! Re-exports models from the shared crate; persistence-facing row types
//! live next to the services that own them.

pub use shared::models::*;
