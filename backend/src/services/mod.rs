//! Business logic services for the Inventory Ledger Platform

pub mod alert;
pub mod ledger;
pub mod plan;
pub mod product;

pub use alert::AlertService;
pub use ledger::LedgerService;
pub use plan::WeeklyPlanService;
pub use product::ProductService;
