//! Low stock alert engine
//!
//! Compares current stock against the weekly plans of current and upcoming
//! weeks, raising and auto-resolving alerts. Duplicate suppression rides
//! on the partial unique index over open (product, plan) pairs, so every
//! check-then-create is one atomic statement; no lock is held across the
//! whole pass.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use shared::units::{convert, Unit};

use crate::error::{AppError, AppResult};
use crate::models::classify_alert_level;

/// Low stock alert engine
#[derive(Clone)]
pub struct AlertService {
    db: PgPool,
}

/// Low stock alert row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LowStockAlert {
    pub id: i64,
    pub product_id: i64,
    pub weekly_plan_id: i64,
    /// Stock observed at check time, in the product's unit of record.
    pub current_quantity: Decimal,
    /// Planned quantity converted into the product's unit of record.
    pub planned_quantity: Decimal,
    pub alert_level: String,
    pub resolved: bool,
    pub alert_date: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Outcome of one alert check pass
#[derive(Debug, Serialize)]
pub struct AlertCheckOutcome {
    pub new_alerts_count: usize,
    pub alerts: Vec<LowStockAlert>,
}

/// One plan joined with its product's live balance
#[derive(Debug, FromRow)]
struct PlanCheckRow {
    plan_id: i64,
    product_id: i64,
    planned_quantity: Decimal,
    plan_unit: String,
    product_unit: String,
    current_stock: Decimal,
}

const ALERT_COLUMNS: &str = "id, product_id, weekly_plan_id, current_quantity, \
     planned_quantity, alert_level, resolved, alert_date, resolved_at";

impl AlertService {
    /// Create a new AlertService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Check every plan of a current or upcoming week and raise or resolve
    /// alerts accordingly. Safe to run repeatedly: an unchanged shortage
    /// refreshes the open alert instead of duplicating it.
    pub async fn check_and_raise_alerts(&self) -> AppResult<AlertCheckOutcome> {
        let rows = sqlx::query_as::<_, PlanCheckRow>(
            r#"
            SELECT wsp.id AS plan_id,
                   wsp.product_id,
                   wsp.planned_quantity,
                   wsp.unit AS plan_unit,
                   p.unit AS product_unit,
                   p.current_stock
            FROM weekly_stock_plans wsp
            JOIN products p ON p.id = wsp.product_id
            WHERE p.is_active AND wsp.week_end_date >= CURRENT_DATE
            ORDER BY wsp.week_start_date, wsp.product_id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let mut new_alerts = Vec::new();
        for row in rows {
            let planned = match self.planned_in_product_unit(&row) {
                Some(planned) => planned,
                None => continue,
            };

            match classify_alert_level(row.current_stock, planned) {
                Some(level) => {
                    if let Some(alert) = self
                        .raise_or_refresh(&row, planned, level.as_str())
                        .await?
                    {
                        new_alerts.push(alert);
                    }
                }
                None => {
                    // Stock covers the plan again; close any stale open alert.
                    // Resolution is monotonic, a later shortage gets a new alert.
                    sqlx::query(
                        r#"
                        UPDATE low_stock_alerts
                        SET resolved = TRUE, resolved_at = now()
                        WHERE product_id = $1 AND weekly_plan_id = $2 AND NOT resolved
                        "#,
                    )
                    .bind(row.product_id)
                    .bind(row.plan_id)
                    .execute(&self.db)
                    .await?;
                }
            }
        }

        Ok(AlertCheckOutcome {
            new_alerts_count: new_alerts.len(),
            alerts: new_alerts,
        })
    }

    /// Unresolved alerts, newest first
    pub async fn unresolved_alerts(&self) -> AppResult<Vec<LowStockAlert>> {
        let alerts = sqlx::query_as::<_, LowStockAlert>(&format!(
            r#"
            SELECT {ALERT_COLUMNS}
            FROM low_stock_alerts
            WHERE NOT resolved
            ORDER BY alert_date DESC
            "#
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(alerts)
    }

    /// Resolve an alert. Resolving an already-resolved alert is an
    /// idempotent no-op; an unknown id is a miss.
    pub async fn resolve(&self, alert_id: i64) -> AppResult<LowStockAlert> {
        let resolved = sqlx::query_as::<_, LowStockAlert>(&format!(
            r#"
            UPDATE low_stock_alerts
            SET resolved = TRUE, resolved_at = now()
            WHERE id = $1 AND NOT resolved
            RETURNING {ALERT_COLUMNS}
            "#
        ))
        .bind(alert_id)
        .fetch_optional(&self.db)
        .await?;

        if let Some(alert) = resolved {
            return Ok(alert);
        }

        sqlx::query_as::<_, LowStockAlert>(&format!(
            "SELECT {ALERT_COLUMNS} FROM low_stock_alerts WHERE id = $1"
        ))
        .bind(alert_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Alert".to_string()))
    }

    /// Insert a new open alert, or refresh the existing one for the pair.
    /// The insert targets the partial unique index, making the
    /// check-then-create a single atomic statement per (product, plan).
    async fn raise_or_refresh(
        &self,
        row: &PlanCheckRow,
        planned: Decimal,
        level: &str,
    ) -> AppResult<Option<LowStockAlert>> {
        let inserted = sqlx::query_as::<_, LowStockAlert>(&format!(
            r#"
            INSERT INTO low_stock_alerts (
                product_id, weekly_plan_id, current_quantity, planned_quantity, alert_level
            )
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (product_id, weekly_plan_id) WHERE NOT resolved DO NOTHING
            RETURNING {ALERT_COLUMNS}
            "#
        ))
        .bind(row.product_id)
        .bind(row.plan_id)
        .bind(row.current_stock)
        .bind(planned)
        .bind(level)
        .fetch_optional(&self.db)
        .await?;

        if inserted.is_some() {
            return Ok(inserted);
        }

        // An open alert already exists; keep its level and observed stock
        // current (a low alert may escalate to critical while open).
        sqlx::query(
            r#"
            UPDATE low_stock_alerts
            SET alert_level = $1, current_quantity = $2, planned_quantity = $3
            WHERE product_id = $4 AND weekly_plan_id = $5 AND NOT resolved
            "#,
        )
        .bind(level)
        .bind(row.current_stock)
        .bind(planned)
        .bind(row.product_id)
        .bind(row.plan_id)
        .execute(&self.db)
        .await?;

        Ok(None)
    }

    /// Planned quantity in the product's unit of record, or `None` for a
    /// plan with inconvertible units (logged and skipped, never a crash).
    fn planned_in_product_unit(&self, row: &PlanCheckRow) -> Option<Decimal> {
        let plan_unit = match Unit::from_str(&row.plan_unit) {
            Ok(unit) => unit,
            Err(_) => {
                tracing::warn!(
                    plan_id = row.plan_id,
                    unit = %row.plan_unit,
                    "skipping plan with unknown unit"
                );
                return None;
            }
        };
        let product_unit = match Unit::from_str(&row.product_unit) {
            Ok(unit) => unit,
            Err(_) => {
                tracing::warn!(
                    product_id = row.product_id,
                    unit = %row.product_unit,
                    "skipping plan: product has unknown unit"
                );
                return None;
            }
        };
        match convert(row.planned_quantity, plan_unit, product_unit) {
            Ok(planned) => Some(planned),
            Err(_) => {
                tracing::warn!(
                    plan_id = row.plan_id,
                    plan_unit = %plan_unit,
                    product_unit = %product_unit,
                    "skipping plan with unit family mismatch"
                );
                None
            }
        }
    }
}
