//! HTTP handlers for stock movement endpoints

use axum::{
    extract::{Query, State},
    Json,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::ledger::{
    BatchOutcome, BatchStockInInput, BatchStockOutInput, LedgerService, StockInInput,
    StockOutInput, StockTransaction, TransactionFilter,
};
use crate::services::plan::{WeeklyConsumption, WeeklyPlanService};
use crate::AppState;

fn ledger_service(state: &AppState) -> LedgerService {
    LedgerService::new(state.db.clone()).with_retry_limit(state.config.ledger.balance_retry_limit)
}

/// Record an inbound movement
pub async fn stock_in(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<StockInInput>,
) -> AppResult<Json<StockTransaction>> {
    current_user.0.require("stock:in")?;
    let transaction = ledger_service(&state)
        .apply_stock_in(current_user.0.user_id, input)
        .await?;
    Ok(Json(transaction))
}

/// Record an outbound movement
pub async fn stock_out(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<StockOutInput>,
) -> AppResult<Json<StockTransaction>> {
    current_user.0.require("stock:out")?;
    let transaction = ledger_service(&state)
        .apply_stock_out(current_user.0.user_id, input)
        .await?;
    Ok(Json(transaction))
}

/// Record a multi-product stock-in sharing one PO number
pub async fn stock_in_batch(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<BatchStockInInput>,
) -> AppResult<Json<BatchOutcome>> {
    current_user.0.require("stock:in")?;
    let outcome = ledger_service(&state)
        .apply_stock_in_batch(current_user.0.user_id, input)
        .await?;
    Ok(Json(outcome))
}

/// Record a multi-product stock-out sharing one SO number
pub async fn stock_out_batch(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<BatchStockOutInput>,
) -> AppResult<Json<BatchOutcome>> {
    current_user.0.require("stock:out")?;
    let outcome = ledger_service(&state)
        .apply_stock_out_batch(current_user.0.user_id, input)
        .await?;
    Ok(Json(outcome))
}

/// Query the ledger with optional filters
pub async fn list_transactions(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filter): Query<TransactionFilter>,
) -> AppResult<Json<Vec<StockTransaction>>> {
    current_user.0.require("transactions:read")?;
    let transactions = ledger_service(&state).list_transactions(filter).await?;
    Ok(Json(transactions))
}

/// The calling user's own movements
pub async fn my_transactions(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<StockTransaction>>> {
    let filter = TransactionFilter {
        user_id: Some(current_user.0.user_id),
        ..TransactionFilter::default()
    };
    let transactions = ledger_service(&state).list_transactions(filter).await?;
    Ok(Json(transactions))
}

/// Stock-out history bucketed by product and ISO week
pub async fn weekly_consumption(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<WeeklyConsumption>>> {
    current_user.0.require("plans:read")?;
    let service = WeeklyPlanService::new(state.db);
    let buckets = service.weekly_outflow().await?;
    Ok(Json(buckets))
}
