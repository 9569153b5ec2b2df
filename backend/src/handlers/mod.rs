//! HTTP handlers for the Inventory Ledger Platform

pub mod alert;
pub mod health;
pub mod plan;
pub mod product;
pub mod transaction;

pub use alert::*;
pub use health::*;
pub use plan::*;
pub use product::*;
pub use transaction::*;
