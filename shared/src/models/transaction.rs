//! Stock ledger models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    StockIn,
    StockOut,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::StockIn => "stock_in",
            TransactionType::StockOut => "stock_out",
        }
    }
}

/// An immutable ledger entry recording one committed stock movement.
///
/// `previous_stock` and `new_stock` are balance snapshots at commit time;
/// `original_quantity`/`original_unit` preserve what the operator entered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockTransaction {
    pub id: i64,
    pub product_id: i64,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Quantity in the product's unit of record.
    pub quantity: Decimal,
    pub original_quantity: Option<Decimal>,
    pub original_unit: Option<String>,
    pub previous_stock: Decimal,
    pub new_stock: Decimal,
    pub po_number: Option<String>,
    pub so_number: Option<String>,
    pub remarks: Option<String>,
    pub user_id: i64,
    pub transaction_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}
