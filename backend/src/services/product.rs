//! Product registry service
//!
//! Owns the canonical catalog and stock state per product. `current_stock`
//! is mutated exclusively by the stock transaction processor; this service
//! manages catalog attributes and the product lifecycle.

use std::str::FromStr;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use shared::units::{round_quantity, Unit};
use shared::validation::validate_name;

use crate::error::{is_foreign_key_violation, AppError, AppResult};

/// Product registry service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// Product row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub unit: String,
    pub opening_stock: Decimal,
    pub current_stock: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// The product's unit of record.
    ///
    /// The column is constrained to known symbols, so a parse failure is a
    /// data integrity problem, not caller input.
    pub fn unit_of_record(&self) -> AppResult<Unit> {
        Unit::from_str(&self.unit)
            .map_err(|_| AppError::InternalError(anyhow!("product {} has unknown unit {}", self.id, self.unit)))
    }
}

/// Input for creating a product
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateProductInput {
    pub name: String,
    pub unit: Unit,
    pub opening_stock: Option<Decimal>,
}

/// Input for updating a product
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

const PRODUCT_COLUMNS: &str =
    "id, name, unit, opening_stock, current_stock, is_active, created_at, updated_at";

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a product; the opening stock becomes the initial balance.
    pub async fn create_product(&self, input: CreateProductInput) -> AppResult<Product> {
        validate_name(&input.name).map_err(|message| AppError::Validation {
            field: "name".to_string(),
            message: message.to_string(),
        })?;

        let opening_stock = round_quantity(input.opening_stock.unwrap_or(Decimal::ZERO));
        if opening_stock < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "opening_stock".to_string(),
                message: "Opening stock cannot be negative".to_string(),
            });
        }

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (name, unit, opening_stock, current_stock)
            VALUES ($1, $2, $3, $3)
            RETURNING {PRODUCT_COLUMNS}
            "#,
        ))
        .bind(input.name.trim())
        .bind(input.unit.as_str())
        .bind(opening_stock)
        .fetch_one(&self.db)
        .await?;

        Ok(product)
    }

    /// Get a product by id
    pub async fn get_product(&self, product_id: i64) -> AppResult<Product> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// List all products
    pub async fn list_products(&self) -> AppResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name"
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    /// Search active products by name
    pub async fn search_products(&self, query: &str) -> AppResult<Vec<Product>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE is_active AND name ILIKE $1
            ORDER BY name
            "#
        ))
        .bind(format!("%{}%", query.trim()))
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    /// Update catalog attributes of a product.
    ///
    /// The unit of record and the balances are deliberately not updatable
    /// here; the ledger is the only writer of `current_stock`.
    pub async fn update_product(
        &self,
        product_id: i64,
        input: UpdateProductInput,
    ) -> AppResult<Product> {
        let existing = self.get_product(product_id).await?;

        let name = match input.name {
            Some(name) => {
                validate_name(&name).map_err(|message| AppError::Validation {
                    field: "name".to_string(),
                    message: message.to_string(),
                })?;
                name.trim().to_string()
            }
            None => existing.name,
        };
        let is_active = input.is_active.unwrap_or(existing.is_active);

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET name = $1, is_active = $2, updated_at = now()
            WHERE id = $3
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(is_active)
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        Ok(product)
    }

    /// Delete a product without ledger history.
    ///
    /// Products that have transactions are part of the audit trail and can
    /// only be deactivated; the attempt is surfaced as a descriptive
    /// conflict rather than a raw constraint violation.
    pub async fn delete_product(&self, product_id: i64) -> AppResult<()> {
        let transaction_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM stock_transactions WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        if transaction_count > 0 {
            return Err(AppError::Conflict {
                resource: "product".to_string(),
                message: format!(
                    "Cannot delete product: it has {} stock transaction(s). Deactivate it instead.",
                    transaction_count
                ),
            });
        }

        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id)
            .execute(&self.db)
            .await
            .map_err(|err| {
                if is_foreign_key_violation(&err) {
                    AppError::Conflict {
                        resource: "product".to_string(),
                        message: "Cannot delete product: it is referenced by plans or alerts. Deactivate it instead."
                            .to_string(),
                    }
                } else {
                    AppError::DatabaseError(err)
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }

        Ok(())
    }
}
