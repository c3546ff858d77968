//! Chart endpoints
//!
//! Every handler returns `{"data": [...]}`. A failed query degrades to an
//! empty data array (logged) so one broken chart never takes the dashboard
//! down; bad parameters are still a 400.

use axum::extract::{Query, State};
use axum::Json;
use chrono::{Datelike, NaiveDate};
use log::error;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::reports::charts;
use crate::reports::filters::{CustomerType, ReportFilter};
use crate::server::error::ApiError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct ChartParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub customer_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ComparisonParams {
    pub month1_year: i32,
    pub month1_month: u32,
    pub month2_year: i32,
    pub month2_month: u32,
}

fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("invalid date: {raw}")))
}

/// Month filters arrive as start = end = first-of-month; expand the end to
/// the last day of that month so the whole month is covered.
pub fn sanitize_dates(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> (Option<NaiveDate>, Option<NaiveDate>) {
    if let (Some(s), Some(e)) = (start, end) {
        if s == e && e.day() == 1 {
            if let Some((_, month_end)) = charts::month_bounds(e.year(), e.month()) {
                return (start, Some(month_end));
            }
        }
    }
    (start, end)
}

fn chart_filter(params: &ChartParams) -> Result<ReportFilter, ApiError> {
    let start = params.start_date.as_deref().map(parse_date).transpose()?;
    let end = params.end_date.as_deref().map(parse_date).transpose()?;
    let customer_type = match params.customer_type.as_deref() {
        Some(raw) => raw
            .parse::<CustomerType>()
            .map_err(ApiError::BadRequest)?,
        None => CustomerType::All,
    };
    let (start, end) = sanitize_dates(start, end);
    Ok(ReportFilter {
        start_date: start,
        end_date: end,
        customer_type,
    })
}

fn data_envelope<T: serde::Serialize>(result: anyhow::Result<T>, chart: &str) -> Json<Value> {
    match result {
        Ok(value) => Json(json!({ "data": value })),
        Err(err) => {
            error!("chart {chart} failed: {err:#}");
            Json(json!({ "data": [] }))
        }
    }
}

pub async fn total_revenue(
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
) -> Result<Json<Value>, ApiError> {
    let filter = chart_filter(&params)?;
    let result = charts::total_revenue(&state.pool, &filter)
        .await
        .map(|v| vec![json!({ "Total Revenue (USD)": v })]);
    Ok(data_envelope(result, "total-revenue"))
}

pub async fn total_orders(
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
) -> Result<Json<Value>, ApiError> {
    let filter = chart_filter(&params)?;
    let result = charts::total_orders(&state.pool, &filter)
        .await
        .map(|v| vec![json!({ "Total Orders": v })]);
    Ok(data_envelope(result, "total-orders"))
}

pub async fn total_customers(
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
) -> Result<Json<Value>, ApiError> {
    let filter = chart_filter(&params)?;
    let result = charts::total_customers(&state.pool, &filter)
        .await
        .map(|v| vec![json!({ "Total Customers": v })]);
    Ok(data_envelope(result, "total-customers"))
}

pub async fn average_order_value(
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
) -> Result<Json<Value>, ApiError> {
    let filter = chart_filter(&params)?;
    let result = charts::average_order_value(&state.pool, &filter)
        .await
        .map(|v| vec![json!({ "AOV (USD)": v })]);
    Ok(data_envelope(result, "average-order-value"))
}

pub async fn revenue_by_month(
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
) -> Result<Json<Value>, ApiError> {
    let filter = chart_filter(&params)?;
    let result = charts::revenue_by_month(&state.pool, &filter).await.map(|rows| {
        rows.into_iter()
            .map(|r| json!({ "Month": r.month, "Revenue (USD)": r.value }))
            .collect::<Vec<_>>()
    });
    Ok(data_envelope(result, "revenue-by-month"))
}

pub async fn profit_by_month(
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
) -> Result<Json<Value>, ApiError> {
    let filter = chart_filter(&params)?;
    let result = charts::profit_by_month(&state.pool, &filter).await.map(|rows| {
        rows.into_iter()
            .map(|r| json!({ "Month": r.month, "Profit (USD)": r.value }))
            .collect::<Vec<_>>()
    });
    Ok(data_envelope(result, "profit-by-month"))
}

pub async fn total_orders_by_month(
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
) -> Result<Json<Value>, ApiError> {
    let filter = chart_filter(&params)?;
    let result = charts::total_orders_by_month(&state.pool, &filter)
        .await
        .map(|rows| {
            rows.into_iter()
                .map(|r| json!({ "Month": r.month, "Orders": r.count }))
                .collect::<Vec<_>>()
        });
    Ok(data_envelope(result, "total-orders-by-month"))
}

pub async fn average_order_value_over_time(
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
) -> Result<Json<Value>, ApiError> {
    let filter = chart_filter(&params)?;
    let result = charts::average_order_value_over_time(&state.pool, &filter)
        .await
        .map(|rows| {
            rows.into_iter()
                .map(|r| json!({ "Date": r.date, "AOV (USD)": r.value }))
                .collect::<Vec<_>>()
        });
    Ok(data_envelope(result, "average-order-value-over-time"))
}

pub async fn new_vs_returning(
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
) -> Result<Json<Value>, ApiError> {
    let filter = chart_filter(&params)?;
    let result = charts::new_vs_returning_customer_sales(&state.pool, &filter)
        .await
        .map(|rows| {
            rows.into_iter()
                .map(|r| json!({ "Customer Type": r.customer_type, "Revenue (USD)": r.revenue }))
                .collect::<Vec<_>>()
        });
    Ok(data_envelope(result, "new-vs-returning-customer-sales"))
}

pub async fn new_customers_over_time(
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
) -> Result<Json<Value>, ApiError> {
    let filter = chart_filter(&params)?;
    let result = charts::new_customers_over_time(&state.pool, &filter)
        .await
        .map(|rows| {
            rows.into_iter()
                .map(|r| json!({ "Date": r.date, "New Customers": r.count }))
                .collect::<Vec<_>>()
        });
    Ok(data_envelope(result, "new-customers-over-time"))
}

pub async fn customers_by_location(
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
) -> Result<Json<Value>, ApiError> {
    let filter = chart_filter(&params)?;
    let result = charts::customers_by_location(&state.pool, &filter)
        .await
        .map(|rows| {
            rows.into_iter()
                .map(|r| {
                    json!({
                        "State": r.state,
                        "Customers": r.customers,
                        "Revenue (USD)": r.revenue,
                    })
                })
                .collect::<Vec<_>>()
        });
    Ok(data_envelope(result, "customers-by-location"))
}

pub async fn customer_retention_rate(
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
) -> Result<Json<Value>, ApiError> {
    let filter = chart_filter(&params)?;
    let result = charts::customer_retention_rate(&state.pool, &filter)
        .await
        .map(|v| vec![json!({ "Retention Rate (%)": v })]);
    Ok(data_envelope(result, "customer-retention-rate"))
}

pub async fn total_sales_by_product(
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
) -> Result<Json<Value>, ApiError> {
    let filter = chart_filter(&params)?;
    let result = charts::total_sales_by_product(&state.pool, &filter)
        .await
        .map(|rows| {
            rows.into_iter()
                .map(|r| json!({ "Product": r.product, "Revenue (USD)": r.revenue }))
                .collect::<Vec<_>>()
        });
    Ok(data_envelope(result, "total-sales-by-product"))
}

pub async fn revenue_comparison(
    State(state): State<AppState>,
    Query(params): Query<ComparisonParams>,
) -> Result<Json<Value>, ApiError> {
    for month in [params.month1_month, params.month2_month] {
        if !(1..=12).contains(&month) {
            return Err(ApiError::BadRequest(format!("invalid month: {month}")));
        }
    }
    let month1 = (params.month1_year, params.month1_month);
    let month2 = (params.month2_year, params.month2_month);

    let daily = charts::revenue_comparison_by_month(&state.pool, month1, month2).await;
    let pct = charts::comparison_percentages(&state.pool, month1, month2).await;

    let body = match (daily, pct) {
        (Ok(rows), Ok(cmp)) => json!({
            "data": rows,
            "comparison": cmp,
            "month1_name": charts::month_name(params.month1_month),
            "month2_name": charts::month_name(params.month2_month),
        }),
        (daily, pct) => {
            if let Err(err) = &daily {
                error!("revenue comparison failed: {err:#}");
            }
            if let Err(err) = &pct {
                error!("revenue comparison percentages failed: {err:#}");
            }
            json!({
                "data": [],
                "comparison": { "orders_pct": null, "revenue_pct": null, "profit_pct": null },
                "month1_name": charts::month_name(params.month1_month),
                "month2_name": charts::month_name(params.month2_month),
            })
        }
    };
    Ok(Json(body))
}

pub async fn month_names() -> Json<Value> {
    let names: serde_json::Map<String, Value> = (1..=12)
        .map(|m| (m.to_string(), json!(charts::month_name(m))))
        .collect();
    Json(Value::Object(names))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> Option<NaiveDate> {
        Some(s.parse().unwrap())
    }

    #[test]
    fn first_of_month_pair_expands_to_month_end() {
        let (start, end) = sanitize_dates(date("2026-01-01"), date("2026-01-01"));
        assert_eq!(start, date("2026-01-01"));
        assert_eq!(end, date("2026-01-31"));

        let (_, end) = sanitize_dates(date("2024-02-01"), date("2024-02-01"));
        assert_eq!(end, date("2024-02-29"));
    }

    #[test]
    fn other_date_pairs_pass_through() {
        let (start, end) = sanitize_dates(date("2026-01-05"), date("2026-01-05"));
        assert_eq!(start, end);
        assert_eq!(end, date("2026-01-05"));

        let (start, end) = sanitize_dates(date("2026-01-01"), date("2026-02-01"));
        assert_eq!(start, date("2026-01-01"));
        assert_eq!(end, date("2026-02-01"));

        assert_eq!(sanitize_dates(None, None), (None, None));
    }

    #[test]
    fn bad_customer_type_is_rejected() {
        let params = ChartParams {
            start_date: None,
            end_date: None,
            customer_type: Some("vip".to_string()),
        };
        assert!(chart_filter(&params).is_err());
    }
}
