//! REST API over the warehouse

pub mod charts;
pub mod error;
pub mod products;
pub mod profit_loss;
pub mod reports;
pub mod static_data;

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::reports::ReportCaches;
use crate::server::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub caches: Arc<ReportCaches>,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        AppState {
            pool,
            caches: Arc::new(ReportCaches::new()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/charts/total-revenue", get(charts::total_revenue))
        .route("/api/charts/total-orders", get(charts::total_orders))
        .route("/api/charts/total-customers", get(charts::total_customers))
        .route(
            "/api/charts/average-order-value",
            get(charts::average_order_value),
        )
        .route("/api/charts/revenue-by-month", get(charts::revenue_by_month))
        .route("/api/charts/profit-by-month", get(charts::profit_by_month))
        .route(
            "/api/charts/total-orders-by-month",
            get(charts::total_orders_by_month),
        )
        .route(
            "/api/charts/average-order-value-over-time",
            get(charts::average_order_value_over_time),
        )
        .route(
            "/api/charts/new-vs-returning-customer-sales",
            get(charts::new_vs_returning),
        )
        .route(
            "/api/charts/new-customers-over-time",
            get(charts::new_customers_over_time),
        )
        .route(
            "/api/charts/customers-by-location",
            get(charts::customers_by_location),
        )
        .route(
            "/api/charts/customer-retention-rate",
            get(charts::customer_retention_rate),
        )
        .route(
            "/api/charts/total-sales-by-product",
            get(charts::total_sales_by_product),
        )
        .route(
            "/api/charts/revenue-comparison-by-month",
            get(charts::revenue_comparison),
        )
        .route("/api/charts/month-names", get(charts::month_names))
        .route(
            "/api/profit-loss/summary-table",
            get(profit_loss::summary_table),
        )
        .route("/api/products", get(products::products))
        .route("/api/products/:id/variants", get(products::variants))
        .route(
            "/api/products/:id/cogs-breakdown",
            get(products::cogs_breakdown),
        )
        .route(
            "/api/products/:id/etsy-fee-breakdown",
            get(products::etsy_fee_breakdown),
        )
        .route(
            "/api/products/:id/margin-breakdown",
            get(products::margin_breakdown),
        )
        .route("/api/cache/clear", post(products::clear_cache))
        .route("/api/reports/bank-accounts", get(reports::bank_accounts))
        .route(
            "/api/reports/bank-accounts/count",
            get(reports::bank_accounts_count),
        )
        .route(
            "/api/reports/bank-account-info",
            get(reports::bank_account_info),
        )
        .route(
            "/api/reports/account-statement",
            get(reports::account_statement),
        )
        .route("/api/static/product-catalog", get(static_data::product_catalog))
        .route(
            "/api/static/product-catalog/count",
            get(static_data::product_catalog_count),
        )
        .route(
            "/api/static/bank-transactions",
            get(static_data::bank_transactions),
        )
        .route(
            "/api/static/bank-transactions/count",
            get(static_data::bank_transactions_count),
        )
        .route("/api/health", get(health))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.pool)
        .await
        .map_err(|err| ApiError::Internal(err.into()))?;
    Ok(Json(json!({ "status": "ok" })))
}
