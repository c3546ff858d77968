//! Static data endpoints: catalog and raw bank transaction listings

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::reports::static_data::{self, BankTransactionQuery, CatalogQuery};
use crate::server::error::ApiError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct CatalogParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BankTransactionParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub account_number: Option<String>,
}

fn page_bounds(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    (limit.unwrap_or(100).clamp(1, 5_000), offset.unwrap_or(0).max(0))
}

pub async fn product_catalog(
    State(state): State<AppState>,
    Query(params): Query<CatalogParams>,
) -> Result<Json<Value>, ApiError> {
    let (limit, offset) = page_bounds(params.limit, params.offset);
    let query = CatalogQuery {
        limit,
        offset,
        search: params.search,
        sort_by: params.sort_by,
        sort_order: params.sort_order,
    };
    let (rows, total) = static_data::product_catalog(&state.pool, &query).await?;
    Ok(Json(json!({
        "data": rows,
        "total": total,
        "limit": limit,
        "offset": offset,
    })))
}

pub async fn product_catalog_count(
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let total = static_data::product_catalog_count(&state.pool).await?;
    Ok(Json(json!({ "total": total })))
}

pub async fn bank_transactions(
    State(state): State<AppState>,
    Query(params): Query<BankTransactionParams>,
) -> Result<Json<Value>, ApiError> {
    let (limit, offset) = page_bounds(params.limit, params.offset);
    let query = BankTransactionQuery {
        limit,
        offset,
        search: params.search,
        sort_by: params.sort_by,
        sort_order: params.sort_order,
        account_number: params.account_number,
    };
    let (rows, total) = static_data::bank_transactions(&state.pool, &query).await?;
    Ok(Json(json!({
        "data": rows,
        "total": total,
        "limit": limit,
        "offset": offset,
    })))
}

pub async fn bank_transactions_count(
    State(state): State<AppState>,
    Query(params): Query<BankTransactionParams>,
) -> Result<Json<Value>, ApiError> {
    let total =
        static_data::bank_transactions_count(&state.pool, params.account_number.as_deref()).await?;
    Ok(Json(json!({ "total": total })))
}
