//! Bank report endpoints
//!
//! These degrade to empty data when a query fails, same as the charts; the
//! statement screens stay usable before the first bank file is loaded.

use axum::extract::{Query, State};
use axum::Json;
use log::error;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::reports::bank;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AccountParams {
    pub account_number: String,
}

#[derive(Debug, Deserialize)]
pub struct StatementParams {
    pub account_number: String,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

fn page_bounds(params: &PageParams) -> (i64, i64) {
    let limit = params.limit.unwrap_or(100).clamp(1, 50_000);
    let offset = params.offset.unwrap_or(0).max(0);
    (limit, offset)
}

pub async fn bank_accounts(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Json<Value> {
    let (limit, offset) = page_bounds(&params);
    match bank::bank_accounts(&state.pool, limit, offset).await {
        Ok(rows) => Json(json!({ "data": rows })),
        Err(err) => {
            error!("bank accounts failed: {err:#}");
            Json(json!({ "data": [] }))
        }
    }
}

pub async fn bank_accounts_count(State(state): State<AppState>) -> Json<Value> {
    match bank::bank_accounts_count(&state.pool).await {
        Ok(total) => Json(json!({ "total": total })),
        Err(err) => {
            error!("bank accounts count failed: {err:#}");
            Json(json!({ "total": 0 }))
        }
    }
}

pub async fn bank_account_info(
    State(state): State<AppState>,
    Query(params): Query<AccountParams>,
) -> Json<Value> {
    match bank::bank_account_info(&state.pool, &params.account_number).await {
        Ok(info) => Json(json!(info)),
        Err(err) => {
            error!("bank account info failed: {err:#}");
            Json(json!(bank::BankAccountInfo::default()))
        }
    }
}

pub async fn account_statement(
    State(state): State<AppState>,
    Query(params): Query<StatementParams>,
) -> Json<Value> {
    let result = bank::account_statement(
        &state.pool,
        &params.account_number,
        params.from_date.as_deref(),
        params.to_date.as_deref(),
    )
    .await;
    match result {
        Ok(rows) => Json(json!({ "data": rows })),
        Err(err) => {
            error!("account statement failed: {err:#}");
            Json(json!({ "data": [] }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_bounds_clamp_out_of_range_values() {
        let params = PageParams {
            limit: Some(0),
            offset: Some(-5),
        };
        assert_eq!(page_bounds(&params), (1, 0));

        let params = PageParams {
            limit: Some(1_000_000),
            offset: None,
        };
        assert_eq!(page_bounds(&params), (50_000, 0));

        let params = PageParams {
            limit: None,
            offset: Some(20),
        };
        assert_eq!(page_bounds(&params), (100, 20));
    }
}
