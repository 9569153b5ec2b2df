//! Weekly stock plan service and ledger reconciliation
//!
//! Plans forecast consumption per product over a Monday-to-Sunday week.
//! The reconciler side aggregates the stock-out ledger into week buckets;
//! it is a pure read-side computation, recomputed on demand and never
//! cached, so it is always consistent with the latest committed
//! transactions.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use shared::types::WeekBounds;
use shared::units::{convert, Unit};
use shared::validation::validate_quantity;

use crate::error::{is_foreign_key_violation, is_unique_violation, AppError, AppResult};
use crate::services::product::Product;

/// Weekly stock plan service
#[derive(Clone)]
pub struct WeeklyPlanService {
    db: PgPool,
}

/// Weekly stock plan row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WeeklyStockPlan {
    pub id: i64,
    pub product_id: i64,
    pub week_start_date: NaiveDate,
    pub week_end_date: NaiveDate,
    pub planned_quantity: Decimal,
    pub unit: String,
    /// Stock level observed when the plan was created, in the plan's unit.
    pub present_stock: Decimal,
    /// Actual consumption observed in the prior week, in the plan's unit.
    pub previous_week_stock: Decimal,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stock-out history bucketed by product and ISO week
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WeeklyConsumption {
    pub product_id: i64,
    pub week_start_date: NaiveDate,
    pub week_end_date: NaiveDate,
    pub out_quantity: Decimal,
}

/// Input for creating a weekly stock plan
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePlanInput {
    pub product_id: i64,
    pub week_start_date: NaiveDate,
    pub week_end_date: NaiveDate,
    pub planned_quantity: Decimal,
    pub unit: Unit,
}

/// Input for updating a weekly stock plan
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePlanInput {
    pub planned_quantity: Option<Decimal>,
    pub unit: Option<Unit>,
}

const PLAN_COLUMNS: &str = "id, product_id, week_start_date, week_end_date, planned_quantity, \
     unit, present_stock, previous_week_stock, user_id, created_at, updated_at";

impl WeeklyPlanService {
    /// Create a new WeeklyPlanService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create plans ahead of a week; each plan is validated first.
    ///
    /// Creation snapshots the current stock and derives the prior week's
    /// actual consumption from the ledger. A duplicate (product, week)
    /// pair is a conflict.
    pub async fn create_plans(
        &self,
        user_id: i64,
        inputs: Vec<CreatePlanInput>,
    ) -> AppResult<Vec<WeeklyStockPlan>> {
        if inputs.is_empty() {
            return Err(AppError::Validation {
                field: "plans".to_string(),
                message: "At least one plan is required".to_string(),
            });
        }

        // Validate everything before the first insert.
        let mut validated = Vec::with_capacity(inputs.len());
        for input in inputs {
            let week = Self::validate_week(input.week_start_date, input.week_end_date)?;
            validate_quantity(input.planned_quantity).map_err(|message| {
                AppError::Validation {
                    field: "planned_quantity".to_string(),
                    message: message.to_string(),
                }
            })?;
            let product = self.load_product(input.product_id).await?;
            let unit_of_record = product.unit_of_record()?;
            if input.unit.family() != unit_of_record.family() {
                return Err(AppError::UnsupportedUnit {
                    from: input.unit.to_string(),
                    to: product.unit.clone(),
                });
            }
            validated.push((input, week, product, unit_of_record));
        }

        let mut created = Vec::with_capacity(validated.len());
        for (input, week, product, unit_of_record) in validated {
            // Snapshots are stored in the plan's unit for a self-consistent row.
            let present_stock = convert(product.current_stock, unit_of_record, input.unit)
                .map_err(|_| AppError::UnsupportedUnit {
                    from: product.unit.clone(),
                    to: input.unit.to_string(),
                })?;
            let consumed = self
                .previous_week_consumption(product.id, week.previous())
                .await?;
            let previous_week_stock =
                convert(consumed, unit_of_record, input.unit).map_err(|_| {
                    AppError::UnsupportedUnit {
                        from: product.unit.clone(),
                        to: input.unit.to_string(),
                    }
                })?;

            let plan = sqlx::query_as::<_, WeeklyStockPlan>(&format!(
                r#"
                INSERT INTO weekly_stock_plans (
                    product_id, week_start_date, week_end_date, planned_quantity,
                    unit, present_stock, previous_week_stock, user_id
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING {PLAN_COLUMNS}
                "#
            ))
            .bind(product.id)
            .bind(week.start)
            .bind(week.end)
            .bind(input.planned_quantity)
            .bind(input.unit.as_str())
            .bind(present_stock)
            .bind(previous_week_stock)
            .bind(user_id)
            .fetch_one(&self.db)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    AppError::DuplicateEntry(format!(
                        "weekly plan for product {} and week starting {}",
                        product.id, week.start
                    ))
                } else {
                    AppError::DatabaseError(err)
                }
            })?;

            created.push(plan);
        }

        Ok(created)
    }

    /// List all plans, newest week first
    pub async fn list_plans(&self) -> AppResult<Vec<WeeklyStockPlan>> {
        let plans = sqlx::query_as::<_, WeeklyStockPlan>(&format!(
            r#"
            SELECT {PLAN_COLUMNS}
            FROM weekly_stock_plans
            ORDER BY week_start_date DESC, product_id
            "#
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(plans)
    }

    /// Plans whose week covers today
    pub async fn current_week_plans(&self) -> AppResult<Vec<WeeklyStockPlan>> {
        let plans = sqlx::query_as::<_, WeeklyStockPlan>(&format!(
            r#"
            SELECT {PLAN_COLUMNS}
            FROM weekly_stock_plans
            WHERE week_start_date <= CURRENT_DATE AND week_end_date >= CURRENT_DATE
            ORDER BY product_id
            "#
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(plans)
    }

    /// Update a plan's quantity or unit
    pub async fn update_plan(
        &self,
        plan_id: i64,
        input: UpdatePlanInput,
    ) -> AppResult<WeeklyStockPlan> {
        let existing = self.get_plan(plan_id).await?;
        let product = self.load_product(existing.product_id).await?;
        let unit_of_record = product.unit_of_record()?;

        let planned_quantity = input.planned_quantity.unwrap_or(existing.planned_quantity);
        validate_quantity(planned_quantity).map_err(|message| AppError::Validation {
            field: "planned_quantity".to_string(),
            message: message.to_string(),
        })?;

        let unit = match input.unit {
            Some(unit) => unit,
            None => Unit::from_str(&existing.unit).map_err(|_| AppError::Validation {
                field: "unit".to_string(),
                message: format!("Plan has unknown unit {}", existing.unit),
            })?,
        };
        if unit.family() != unit_of_record.family() {
            return Err(AppError::UnsupportedUnit {
                from: unit.to_string(),
                to: product.unit.clone(),
            });
        }

        let plan = sqlx::query_as::<_, WeeklyStockPlan>(&format!(
            r#"
            UPDATE weekly_stock_plans
            SET planned_quantity = $1, unit = $2, updated_at = now()
            WHERE id = $3
            RETURNING {PLAN_COLUMNS}
            "#
        ))
        .bind(planned_quantity)
        .bind(unit.as_str())
        .bind(plan_id)
        .fetch_one(&self.db)
        .await?;

        Ok(plan)
    }

    /// Delete a plan that has no alerts attached
    pub async fn delete_plan(&self, plan_id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM weekly_stock_plans WHERE id = $1")
            .bind(plan_id)
            .execute(&self.db)
            .await
            .map_err(|err| {
                if is_foreign_key_violation(&err) {
                    AppError::Conflict {
                        resource: "weekly_stock_plan".to_string(),
                        message: "Cannot delete plan: low-stock alerts reference it".to_string(),
                    }
                } else {
                    AppError::DatabaseError(err)
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Weekly stock plan".to_string()));
        }

        Ok(())
    }

    /// Sum of committed stock-out quantities for a product within a week,
    /// in the product's unit of record. Inclusive calendar-date bounds.
    pub async fn previous_week_consumption(
        &self,
        product_id: i64,
        week: WeekBounds,
    ) -> AppResult<Decimal> {
        let consumed = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(quantity), 0)
            FROM stock_transactions
            WHERE product_id = $1
              AND type = 'stock_out'
              AND transaction_date BETWEEN $2 AND $3
            "#,
        )
        .bind(product_id)
        .bind(week.start)
        .bind(week.end)
        .fetch_one(&self.db)
        .await?;

        Ok(consumed)
    }

    /// The whole stock-out history bucketed by product and ISO week.
    /// `date_trunc('week', ...)` is Monday-based in PostgreSQL, matching
    /// the plan buckets.
    pub async fn weekly_outflow(&self) -> AppResult<Vec<WeeklyConsumption>> {
        let buckets = sqlx::query_as::<_, WeeklyConsumption>(
            r#"
            SELECT product_id,
                   date_trunc('week', transaction_date)::DATE AS week_start_date,
                   (date_trunc('week', transaction_date)::DATE + 6) AS week_end_date,
                   SUM(quantity) AS out_quantity
            FROM stock_transactions
            WHERE type = 'stock_out'
            GROUP BY product_id, date_trunc('week', transaction_date)
            ORDER BY week_start_date DESC, product_id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(buckets)
    }

    fn validate_week(start: NaiveDate, end: NaiveDate) -> AppResult<WeekBounds> {
        WeekBounds::from_dates(start, end).map_err(|err| AppError::Validation {
            field: "week_start_date".to_string(),
            message: err.to_string(),
        })
    }

    async fn get_plan(&self, plan_id: i64) -> AppResult<WeeklyStockPlan> {
        sqlx::query_as::<_, WeeklyStockPlan>(&format!(
            "SELECT {PLAN_COLUMNS} FROM weekly_stock_plans WHERE id = $1"
        ))
        .bind(plan_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Weekly stock plan".to_string()))
    }

    /// Plans may target products that are currently inactive, so this does
    /// not filter on the active flag.
    async fn load_product(&self, product_id: i64) -> AppResult<Product> {
        sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, unit, opening_stock, current_stock, is_active, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }
}
