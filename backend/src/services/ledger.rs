//! Stock transaction processor
//!
//! Applies stock-in/stock-out movements against the product registry and
//! appends the immutable ledger entry. The read-modify-write on a product
//! balance is serialized by a conditional update (compare-and-swap on the
//! stored balance) retried a bounded number of times, and the balance
//! write and ledger append commit in one database transaction, so
//! concurrent movements on the same product can neither lose an update nor
//! leave a stray ledger row.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use shared::units::{convert, round_quantity, Unit};
use shared::validation::{validate_quantity, validate_reference};

use crate::error::{AppError, AppResult};
use crate::services::product::Product;

/// Default bound on conditional balance update retries.
const DEFAULT_BALANCE_RETRY_LIMIT: u32 = 5;

/// Stock transaction processor
#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
    balance_retry_limit: u32,
}

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "stock_transaction_type", rename_all = "snake_case")]
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

/// Ledger entry record; append-only, never updated or deleted
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockTransaction {
    pub id: i64,
    pub product_id: i64,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
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

/// Input for recording an inbound movement
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StockInInput {
    pub product_id: i64,
    pub quantity: Decimal,
    pub unit: Unit,
    pub po_number: Option<String>,
    pub remarks: Option<String>,
}

/// Input for recording an outbound movement
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StockOutInput {
    pub product_id: i64,
    pub quantity: Decimal,
    pub unit: Unit,
    pub so_number: Option<String>,
    pub remarks: Option<String>,
}

/// One line of a batch movement
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchMovementItem {
    pub product_id: i64,
    pub quantity: Decimal,
    pub unit: Unit,
}

/// Input for a multi-product stock-in sharing one PO number
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchStockInInput {
    pub products: Vec<BatchMovementItem>,
    pub po_number: Option<String>,
    pub remarks: Option<String>,
}

/// Input for a multi-product stock-out sharing one SO number
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchStockOutInput {
    pub products: Vec<BatchMovementItem>,
    pub so_number: Option<String>,
    pub remarks: Option<String>,
}

/// Result of a batch application.
///
/// Movements apply independently; the first failure stops the batch and
/// already-applied movements stay committed.
#[derive(Debug, Serialize)]
pub struct BatchOutcome {
    pub applied: Vec<StockTransaction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<FailedMovement>,
}

/// The first failing movement of a batch
#[derive(Debug, Serialize)]
pub struct FailedMovement {
    pub product_id: i64,
    pub code: String,
    pub message: String,
}

/// Ledger query filters; all optional, dates are inclusive calendar dates
#[derive(Debug, Default, Deserialize)]
pub struct TransactionFilter {
    pub product_id: Option<i64>,
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    #[serde(skip)]
    pub user_id: Option<i64>,
}

/// A validated movement, normalized from the per-operation inputs.
struct Movement {
    product_id: i64,
    transaction_type: TransactionType,
    quantity: Decimal,
    unit: Unit,
    po_number: Option<String>,
    so_number: Option<String>,
    remarks: Option<String>,
}

const TRANSACTION_COLUMNS: &str = "id, product_id, type, quantity, original_quantity, \
     original_unit, previous_stock, new_stock, po_number, so_number, remarks, user_id, \
     transaction_date, created_at";

impl LedgerService {
    /// Create a new LedgerService instance
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            balance_retry_limit: DEFAULT_BALANCE_RETRY_LIMIT,
        }
    }

    /// Override the bound on conditional balance update retries
    pub fn with_retry_limit(mut self, limit: u32) -> Self {
        self.balance_retry_limit = limit.max(1);
        self
    }

    /// Record an inbound movement
    pub async fn apply_stock_in(
        &self,
        user_id: i64,
        input: StockInInput,
    ) -> AppResult<StockTransaction> {
        self.apply_movement(
            user_id,
            Movement {
                product_id: input.product_id,
                transaction_type: TransactionType::StockIn,
                quantity: input.quantity,
                unit: input.unit,
                po_number: input.po_number,
                so_number: None,
                remarks: input.remarks,
            },
        )
        .await
    }

    /// Record an outbound movement
    pub async fn apply_stock_out(
        &self,
        user_id: i64,
        input: StockOutInput,
    ) -> AppResult<StockTransaction> {
        self.apply_movement(
            user_id,
            Movement {
                product_id: input.product_id,
                transaction_type: TransactionType::StockOut,
                quantity: input.quantity,
                unit: input.unit,
                po_number: None,
                so_number: input.so_number,
                remarks: input.remarks,
            },
        )
        .await
    }

    /// Record a multi-product stock-in sharing one PO number
    pub async fn apply_stock_in_batch(
        &self,
        user_id: i64,
        input: BatchStockInInput,
    ) -> AppResult<BatchOutcome> {
        let movements = input
            .products
            .into_iter()
            .map(|item| Movement {
                product_id: item.product_id,
                transaction_type: TransactionType::StockIn,
                quantity: item.quantity,
                unit: item.unit,
                po_number: input.po_number.clone(),
                so_number: None,
                remarks: input.remarks.clone(),
            })
            .collect();
        self.apply_batch(user_id, movements).await
    }

    /// Record a multi-product stock-out sharing one SO number
    pub async fn apply_stock_out_batch(
        &self,
        user_id: i64,
        input: BatchStockOutInput,
    ) -> AppResult<BatchOutcome> {
        let movements = input
            .products
            .into_iter()
            .map(|item| Movement {
                product_id: item.product_id,
                transaction_type: TransactionType::StockOut,
                quantity: item.quantity,
                unit: item.unit,
                po_number: None,
                so_number: input.so_number.clone(),
                remarks: input.remarks.clone(),
            })
            .collect();
        self.apply_batch(user_id, movements).await
    }

    /// Query the ledger
    pub async fn list_transactions(
        &self,
        filter: TransactionFilter,
    ) -> AppResult<Vec<StockTransaction>> {
        let transactions = sqlx::query_as::<_, StockTransaction>(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM stock_transactions
            WHERE ($1::BIGINT IS NULL OR product_id = $1)
              AND ($2::stock_transaction_type IS NULL OR type = $2)
              AND ($3::DATE IS NULL OR transaction_date >= $3)
              AND ($4::DATE IS NULL OR transaction_date <= $4)
              AND ($5::BIGINT IS NULL OR user_id = $5)
            ORDER BY transaction_date DESC, created_at DESC
            "#
        ))
        .bind(filter.product_id)
        .bind(filter.transaction_type)
        .bind(filter.from_date)
        .bind(filter.to_date)
        .bind(filter.user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(transactions)
    }

    /// Apply a batch of movements independently; stop at the first failure.
    async fn apply_batch(&self, user_id: i64, movements: Vec<Movement>) -> AppResult<BatchOutcome> {
        if movements.is_empty() {
            return Err(AppError::Validation {
                field: "products".to_string(),
                message: "Products array is required".to_string(),
            });
        }

        let mut applied = Vec::with_capacity(movements.len());
        let mut failed = None;
        for movement in movements {
            let product_id = movement.product_id;
            match self.apply_movement(user_id, movement).await {
                Ok(transaction) => applied.push(transaction),
                Err(err) => {
                    failed = Some(FailedMovement {
                        product_id,
                        code: err.code().to_string(),
                        message: err.public_message(),
                    });
                    break;
                }
            }
        }

        Ok(BatchOutcome { applied, failed })
    }

    /// Validate and apply one movement.
    ///
    /// Exactly one ledger row and one balance mutation per success; a
    /// failure applies nothing. Retried identical requests are not
    /// deduplicated here; exactly-once delivery is a transport concern.
    async fn apply_movement(&self, user_id: i64, movement: Movement) -> AppResult<StockTransaction> {
        validate_quantity(movement.quantity).map_err(|message| AppError::Validation {
            field: "quantity".to_string(),
            message: message.to_string(),
        })?;
        if let Some(po_number) = movement.po_number.as_deref() {
            validate_reference(po_number).map_err(|message| AppError::Validation {
                field: "po_number".to_string(),
                message: message.to_string(),
            })?;
        }
        if let Some(so_number) = movement.so_number.as_deref() {
            validate_reference(so_number).map_err(|message| AppError::Validation {
                field: "so_number".to_string(),
                message: message.to_string(),
            })?;
        }

        let transaction_date = Utc::now().date_naive();

        for _attempt in 0..self.balance_retry_limit {
            let product = self.load_active_product(movement.product_id).await?;
            let unit_of_record = product.unit_of_record()?;

            let quantity = convert(movement.quantity, movement.unit, unit_of_record).map_err(
                |_| AppError::UnsupportedUnit {
                    from: movement.unit.to_string(),
                    to: product.unit.clone(),
                },
            )?;
            let quantity = round_quantity(quantity);
            if quantity <= Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "quantity".to_string(),
                    message: format!(
                        "Quantity rounds to zero in the product's unit ({})",
                        product.unit
                    ),
                });
            }

            let previous_stock = product.current_stock;
            let new_stock = match movement.transaction_type {
                TransactionType::StockIn => previous_stock + quantity,
                TransactionType::StockOut => previous_stock - quantity,
            };
            if new_stock < Decimal::ZERO {
                return Err(AppError::InsufficientStock {
                    product_id: product.id,
                    requested: quantity,
                    available: previous_stock,
                });
            }

            // Balance write and ledger append commit together or not at all.
            let mut tx = self.db.begin().await?;

            let updated = sqlx::query(
                r#"
                UPDATE products
                SET current_stock = $1, updated_at = now()
                WHERE id = $2 AND current_stock = $3
                "#,
            )
            .bind(new_stock)
            .bind(product.id)
            .bind(previous_stock)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                // A concurrent movement won the race; re-read and retry.
                tx.rollback().await?;
                continue;
            }

            let transaction = sqlx::query_as::<_, StockTransaction>(&format!(
                r#"
                INSERT INTO stock_transactions (
                    product_id, type, quantity, original_quantity, original_unit,
                    previous_stock, new_stock, po_number, so_number, remarks,
                    user_id, transaction_date
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                RETURNING {TRANSACTION_COLUMNS}
                "#
            ))
            .bind(product.id)
            .bind(movement.transaction_type)
            .bind(quantity)
            .bind(movement.quantity)
            .bind(movement.unit.as_str())
            .bind(previous_stock)
            .bind(new_stock)
            .bind(&movement.po_number)
            .bind(&movement.so_number)
            .bind(&movement.remarks)
            .bind(user_id)
            .bind(transaction_date)
            .fetch_one(&mut *tx)
            .await?;

            tx.commit().await?;
            tracing::debug!(
                product_id = product.id,
                movement = movement.transaction_type.as_str(),
                %previous_stock,
                %new_stock,
                "movement committed"
            );
            return Ok(transaction);
        }

        tracing::warn!(
            product_id = movement.product_id,
            retries = self.balance_retry_limit,
            "balance update retries exhausted"
        );
        Err(AppError::ConcurrentUpdate {
            product_id: movement.product_id,
        })
    }

    /// Load a product that can accept movements.
    async fn load_active_product(&self, product_id: i64) -> AppResult<Product> {
        sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, unit, opening_stock, current_stock, is_active, created_at, updated_at
            FROM products
            WHERE id = $1 AND is_active
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }
}
