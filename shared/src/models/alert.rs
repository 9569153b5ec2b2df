//! Low-stock alert models and classification

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How far current stock has fallen below planned consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Low,
    Critical,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Low => "low",
            AlertLevel::Critical => "critical",
        }
    }
}

/// An alert raised against one weekly plan.
///
/// At most one unresolved alert exists per (product, plan) pair; resolution
/// is monotonic, a resolved alert is never reopened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowStockAlert {
    pub id: i64,
    pub product_id: i64,
    pub weekly_plan_id: i64,
    pub current_quantity: Decimal,
    pub planned_quantity: Decimal,
    pub alert_level: AlertLevel,
    pub resolved: bool,
    pub alert_date: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Classify current stock against a plan, both in the product's unit.
///
/// Returns `None` when stock covers the plan. Stock at or below half of the
/// plan is critical.
pub fn classify_alert_level(current: Decimal, planned: Decimal) -> Option<AlertLevel> {
    if current >= planned {
        return None;
    }
    if current * Decimal::TWO <= planned {
        Some(AlertLevel::Critical)
    } else {
        Some(AlertLevel::Low)
    }
}
