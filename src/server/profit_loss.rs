//! Profit and loss endpoint

use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::reports::profit_loss::{self, SummaryOptions, ViewMode};
use crate::server::error::ApiError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct SummaryTableParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub view_mode: Option<String>,
    /// Comma-separated expense column names; absent means the default formula.
    pub selected_items: Option<String>,
}

fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("invalid date: {raw}")))
}

pub fn parse_selected_items(raw: Option<&str>) -> Option<Vec<String>> {
    let raw = raw?;
    let items: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

pub async fn summary_table(
    State(state): State<AppState>,
    Query(params): Query<SummaryTableParams>,
) -> Result<Json<Value>, ApiError> {
    let view_mode = match params.view_mode.as_deref() {
        Some(raw) => raw.parse::<ViewMode>().map_err(ApiError::BadRequest)?,
        None => ViewMode::Month,
    };
    let options = SummaryOptions {
        start_date: params.start_date.as_deref().map(parse_date).transpose()?,
        end_date: params.end_date.as_deref().map(parse_date).transpose()?,
        view_mode,
        selected_items: parse_selected_items(params.selected_items.as_deref()),
    };
    let rows = profit_loss::summary_table(&state.pool, &options).await?;
    Ok(Json(json!({ "data": rows })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selected_items_split_on_commas() {
        assert_eq!(
            parse_selected_items(Some("refund_cost, cost_of_goods")),
            Some(vec![
                "refund_cost".to_string(),
                "cost_of_goods".to_string()
            ])
        );
        assert_eq!(parse_selected_items(Some("")), None);
        assert_eq!(parse_selected_items(Some(", ,")), None);
        assert_eq!(parse_selected_items(None), None);
    }
}
