//! HTTP handlers for low-stock alert endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::alert::{AlertCheckOutcome, AlertService, LowStockAlert};
use crate::AppState;

/// Unresolved low-stock alerts
pub async fn list_low_stock_alerts(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<LowStockAlert>>> {
    current_user.0.require("alerts:read")?;
    let service = AlertService::new(state.db);
    let alerts = service.unresolved_alerts().await?;
    Ok(Json(alerts))
}

/// Run the low-stock check over current and upcoming weekly plans
pub async fn check_low_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<AlertCheckOutcome>> {
    current_user.0.require("alerts:manage")?;
    let service = AlertService::new(state.db);
    let outcome = service.check_and_raise_alerts().await?;
    Ok(Json(outcome))
}

/// Resolve an alert (idempotent)
pub async fn resolve_alert(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(alert_id): Path<i64>,
) -> AppResult<Json<LowStockAlert>> {
    current_user.0.require("alerts:manage")?;
    let service = AlertService::new(state.db);
    let alert = service.resolve(alert_id).await?;
    Ok(Json(alert))
}
