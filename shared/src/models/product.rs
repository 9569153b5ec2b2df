//! Product registry models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::units::Unit;

/// A product tracked by the inventory ledger.
///
/// `current_stock` is the running balance in the product's unit of record;
/// it is mutated only through committed stock movements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub unit: Unit,
    /// Baseline balance at creation time.
    pub opening_stock: Decimal,
    pub current_stock: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
