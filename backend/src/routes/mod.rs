//! Route definitions for the Inventory Ledger Platform

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - product registry
        .nest("/products", product_routes())
        // Protected routes - stock movement ledger
        .nest("/transactions", transaction_routes())
        // Protected routes - weekly stock planning
        .nest("/weekly-stock-plans", plan_routes())
        // Protected routes - low stock alerting
        .nest("/alerts", alert_routes())
}

/// Product registry routes (protected)
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products).post(handlers::create_product))
        .route("/search", get(handlers::search_products))
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stock movement ledger routes (protected)
fn transaction_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_transactions))
        .route("/my", get(handlers::my_transactions))
        .route("/weekly-consumption", get(handlers::weekly_consumption))
        .route("/stock-in", post(handlers::stock_in))
        .route("/stock-in/batch", post(handlers::stock_in_batch))
        .route("/stock-out", post(handlers::stock_out))
        .route("/stock-out/batch", post(handlers::stock_out_batch))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Weekly stock plan routes (protected)
fn plan_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_plans).post(handlers::create_plans))
        .route("/current", get(handlers::current_week_plans))
        .route(
            "/:plan_id",
            put(handlers::update_plan).delete(handlers::delete_plan),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Low stock alert routes (protected)
fn alert_routes() -> Router<AppState> {
    Router::new()
        .route("/low-stock", get(handlers::list_low_stock_alerts))
        .route("/check-low-stock", post(handlers::check_low_stock))
        .route("/low-stock/:alert_id/resolve", put(handlers::resolve_alert))
        .route_layer(middleware::from_fn(auth_middleware))
}
