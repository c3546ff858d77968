//! Product cost endpoints, fronted by the TTL caches

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::reports::product_cost;
use crate::server::error::ApiError;
use crate::server::AppState;

pub async fn products(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    if let Some(cached) = state.caches.products.get("products") {
        return Ok(Json(cached));
    }
    let rows = product_cost::products_overview(&state.pool).await?;
    let body = json!({ "data": rows });
    state.caches.products.set("products", body.clone());
    Ok(Json(body))
}

pub async fn variants(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if let Some(cached) = state.caches.variants.get(&product_id) {
        return Ok(Json(cached));
    }
    let rows = product_cost::product_variants(&state.pool, &product_id).await?;
    let body = json!({ "data": rows });
    state.caches.variants.set(&product_id, body.clone());
    Ok(Json(body))
}

pub async fn cogs_breakdown(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if let Some(cached) = state.caches.cogs.get(&product_id) {
        return Ok(Json(cached));
    }
    let rows = product_cost::cogs_breakdown(&state.pool, &product_id).await?;
    let body = json!({ "data": rows });
    state.caches.cogs.set(&product_id, body.clone());
    Ok(Json(body))
}

pub async fn etsy_fee_breakdown(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if let Some(cached) = state.caches.etsy_fee.get(&product_id) {
        return Ok(Json(cached));
    }
    let rows = product_cost::etsy_fee_breakdown(&state.pool, &product_id).await?;
    let body = json!({ "data": rows });
    state.caches.etsy_fee.set(&product_id, body.clone());
    Ok(Json(body))
}

pub async fn margin_breakdown(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if let Some(cached) = state.caches.margin.get(&product_id) {
        return Ok(Json(cached));
    }
    let rows = product_cost::margin_breakdown(&state.pool, &product_id).await?;
    let body = json!({ "data": rows });
    state.caches.margin.set(&product_id, body.clone());
    Ok(Json(body))
}

pub async fn clear_cache(State(state): State<AppState>) -> Json<Value> {
    state.caches.clear_all();
    Json(json!({ "status": "cleared" }))
}
