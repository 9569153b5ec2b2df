//! Weekly stock planning models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Planned consumption for one product over one Monday-to-Sunday week.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyStockPlan {
    pub id: i64,
    pub product_id: i64,
    pub week_start_date: NaiveDate,
    pub week_end_date: NaiveDate,
    pub planned_quantity: Decimal,
    pub unit: String,
    /// Stock level observed when the plan was created.
    pub present_stock: Decimal,
    /// Actual consumption observed in the prior week, derived from the ledger.
    pub previous_week_stock: Decimal,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stock-out history bucketed by product and ISO week.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyConsumption {
    pub product_id: i64,
    pub week_start_date: NaiveDate,
    pub week_end_date: NaiveDate,
    pub out_quantity: Decimal,
}
