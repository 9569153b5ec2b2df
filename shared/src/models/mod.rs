//! Domain models for the Inventory Ledger Platform

mod alert;
mod plan;
mod product;
mod transaction;

pub use alert::*;
pub use plan::*;
pub use product::*;
pub use transaction::*;
