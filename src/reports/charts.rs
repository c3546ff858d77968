//! Chart and KPI queries over the star schema
//! Net revenue everywhere is SUM(item_total - discount_amount).

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::reports::filters::ReportFilter;

const NET_REVENUE: &str = "COALESCE(fs.item_total, 0) - COALESCE(fs.discount_amount, 0)";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MonthValueRow {
    pub month: String,
    pub value: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MonthCountRow {
    pub month: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DateValueRow {
    pub date: NaiveDate,
    pub value: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DateCountRow {
    pub date: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CustomerSplitRow {
    pub customer_type: String,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LocationRow {
    pub state: Option<String>,
    pub customers: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductSalesRow {
    pub product: Option<String>,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DailyComparisonRow {
    pub date: NaiveDate,
    pub revenue: Decimal,
    pub month_label: String,
    pub day_of_month: i32,
}

/// Orders / revenue / profit for one month, used by the comparison endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MonthAggregates {
    pub orders_count: i64,
    pub revenue: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ComparisonPercentages {
    pub orders_pct: Option<Decimal>,
    pub revenue_pct: Option<Decimal>,
    pub profit_pct: Option<Decimal>,
}

pub async fn total_revenue(pool: &PgPool, filter: &ReportFilter) -> Result<Decimal> {
    let mut sql = format!(
        "SELECT ROUND(COALESCE(SUM({NET_REVENUE}), 0), 2) \
         FROM fact_sales fs JOIN dim_time dt ON fs.time_key = dt.time_key WHERE 1=1"
    );
    let mut idx = 1;
    sql.push_str(&filter.sql_clause("fs", "dt.full_date", &mut idx));

    let mut query = sqlx::query_scalar::<_, Decimal>(&sql);
    if let Some(d) = filter.start_date {
        query = query.bind(d);
    }
    if let Some(d) = filter.end_date {
        query = query.bind(d);
    }
    query
        .fetch_one(pool)
        .await
        .context("total revenue query failed")
}

pub async fn total_orders(pool: &PgPool, filter: &ReportFilter) -> Result<i64> {
    count_query(
        pool,
        filter,
        "SELECT COUNT(DISTINCT fs.order_key) \
         FROM fact_sales fs JOIN dim_time dt ON fs.time_key = dt.time_key WHERE 1=1",
    )
    .await
    .context("total orders query failed")
}

pub async fn total_customers(pool: &PgPool, filter: &ReportFilter) -> Result<i64> {
    count_query(
        pool,
        filter,
        "SELECT COUNT(DISTINCT fs.customer_key) \
         FROM fact_sales fs JOIN dim_time dt ON fs.time_key = dt.time_key WHERE 1=1",
    )
    .await
    .context("total customers query failed")
}

async fn count_query(pool: &PgPool, filter: &ReportFilter, base: &str) -> Result<i64> {
    let mut sql = base.to_string();
    let mut idx = 1;
    sql.push_str(&filter.sql_clause("fs", "dt.full_date", &mut idx));

    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    if let Some(d) = filter.start_date {
        query = query.bind(d);
    }
    if let Some(d) = filter.end_date {
        query = query.bind(d);
    }
    Ok(query.fetch_one(pool).await?)
}

pub async fn average_order_value(pool: &PgPool, filter: &ReportFilter) -> Result<Option<Decimal>> {
    let mut sql = format!(
        "SELECT ROUND(SUM({NET_REVENUE}) / NULLIF(COUNT(DISTINCT fs.order_key), 0), 2) \
         FROM fact_sales fs JOIN dim_time dt ON fs.time_key = dt.time_key WHERE 1=1"
    );
    let mut idx = 1;
    sql.push_str(&filter.sql_clause("fs", "dt.full_date", &mut idx));

    let mut query = sqlx::query_scalar::<_, Option<Decimal>>(&sql);
    if let Some(d) = filter.start_date {
        query = query.bind(d);
    }
    if let Some(d) = filter.end_date {
        query = query.bind(d);
    }
    query
        .fetch_one(pool)
        .await
        .context("average order value query failed")
}

pub async fn revenue_by_month(pool: &PgPool, filter: &ReportFilter) -> Result<Vec<MonthValueRow>> {
    let mut sql = format!(
        "SELECT dt.year || '-' || LPAD(dt.month::text, 2, '0') AS month, \
         ROUND(COALESCE(SUM({NET_REVENUE}), 0), 2) AS value \
         FROM fact_sales fs JOIN dim_time dt ON fs.time_key = dt.time_key WHERE 1=1"
    );
    let mut idx = 1;
    sql.push_str(&filter.sql_clause("fs", "dt.full_date", &mut idx));
    sql.push_str(" GROUP BY dt.year, dt.month ORDER BY dt.year, dt.month");

    let query = filter.bind_dates(sqlx::query_as::<_, MonthValueRow>(&sql));
    query
        .fetch_all(pool)
        .await
        .context("revenue by month query failed")
}

/// Monthly net amount collected through direct checkout.
pub async fn profit_by_month(pool: &PgPool, filter: &ReportFilter) -> Result<Vec<MonthValueRow>> {
    let mut sql = String::from(
        "SELECT dt.year || '-' || LPAD(dt.month::text, 2, '0') AS month, \
         ROUND(COALESCE(SUM(COALESCE(fp.net_amount, 0)), 0), 2) AS value \
         FROM fact_payments fp JOIN dim_time dt ON fp.payment_date_key = dt.time_key WHERE 1=1",
    );
    let mut idx = 1;
    // Customer-type filtering does not apply to the payments fact.
    let dates_only = ReportFilter::dates(filter.start_date, filter.end_date);
    sql.push_str(&dates_only.sql_clause("fp", "dt.full_date", &mut idx));
    sql.push_str(" GROUP BY dt.year, dt.month ORDER BY dt.year, dt.month");

    let query = dates_only.bind_dates(sqlx::query_as::<_, MonthValueRow>(&sql));
    query
        .fetch_all(pool)
        .await
        .context("profit by month query failed")
}

pub async fn total_orders_by_month(
    pool: &PgPool,
    filter: &ReportFilter,
) -> Result<Vec<MonthCountRow>> {
    let mut sql = String::from(
        "SELECT dt.year || '-' || LPAD(dt.month::text, 2, '0') AS month, \
         COUNT(DISTINCT fs.order_key) AS count \
         FROM fact_sales fs JOIN dim_time dt ON fs.time_key = dt.time_key WHERE 1=1",
    );
    let mut idx = 1;
    sql.push_str(&filter.sql_clause("fs", "dt.full_date", &mut idx));
    sql.push_str(" GROUP BY dt.year, dt.month ORDER BY dt.year, dt.month");

    let query = filter.bind_dates(sqlx::query_as::<_, MonthCountRow>(&sql));
    query
        .fetch_all(pool)
        .await
        .context("orders by month query failed")
}

pub async fn average_order_value_over_time(
    pool: &PgPool,
    filter: &ReportFilter,
) -> Result<Vec<DateValueRow>> {
    let mut sql = format!(
        "SELECT dt.full_date AS date, \
         ROUND(SUM({NET_REVENUE}) / NULLIF(COUNT(DISTINCT fs.order_key), 0), 2) AS value \
         FROM fact_sales fs JOIN dim_time dt ON fs.time_key = dt.time_key WHERE 1=1"
    );
    let mut idx = 1;
    sql.push_str(&filter.sql_clause("fs", "dt.full_date", &mut idx));
    sql.push_str(" GROUP BY dt.full_date ORDER BY dt.full_date");

    let query = filter.bind_dates(sqlx::query_as::<_, DateValueRow>(&sql));
    query
        .fetch_all(pool)
        .await
        .context("aov over time query failed")
}

pub async fn new_vs_returning_customer_sales(
    pool: &PgPool,
    filter: &ReportFilter,
) -> Result<Vec<CustomerSplitRow>> {
    let mut sql = format!(
        "SELECT CASE WHEN customer_orders.order_count = 1 THEN 'New Customers' \
         ELSE 'Returning Customers' END AS customer_type, \
         ROUND(SUM({NET_REVENUE}), 2) AS revenue \
         FROM fact_sales fs \
         JOIN dim_time dt ON fs.time_key = dt.time_key \
         JOIN (SELECT customer_key, COUNT(DISTINCT order_key) AS order_count \
               FROM fact_sales GROUP BY customer_key) customer_orders \
           ON fs.customer_key = customer_orders.customer_key \
         WHERE 1=1"
    );
    let mut idx = 1;
    sql.push_str(&filter.sql_clause("fs", "dt.full_date", &mut idx));
    sql.push_str(&format!(" GROUP BY 1 ORDER BY SUM({NET_REVENUE}) DESC"));

    let query = filter.bind_dates(sqlx::query_as::<_, CustomerSplitRow>(&sql));
    query
        .fetch_all(pool)
        .await
        .context("new vs returning query failed")
}

pub async fn new_customers_over_time(
    pool: &PgPool,
    filter: &ReportFilter,
) -> Result<Vec<DateCountRow>> {
    let mut sql = String::from(
        "SELECT dt.full_date AS date, COUNT(DISTINCT fs.customer_key) AS count \
         FROM fact_sales fs JOIN dim_time dt ON fs.time_key = dt.time_key \
         WHERE fs.customer_key IN (SELECT customer_key FROM fact_sales \
         GROUP BY customer_key HAVING COUNT(DISTINCT order_key) = 1)",
    );
    let mut idx = 1;
    sql.push_str(&filter.sql_clause("fs", "dt.full_date", &mut idx));
    sql.push_str(" GROUP BY 1 ORDER BY 1");

    let query = filter.bind_dates(sqlx::query_as::<_, DateCountRow>(&sql));
    query
        .fetch_all(pool)
        .await
        .context("new customers over time query failed")
}

/// US state rollup, top 12 by customer count.
pub async fn customers_by_location(
    pool: &PgPool,
    filter: &ReportFilter,
) -> Result<Vec<LocationRow>> {
    let mut sql = format!(
        "SELECT dg.state_name AS state, COUNT(DISTINCT fs.customer_key) AS customers, \
         ROUND(COALESCE(SUM({NET_REVENUE}), 0), 2) AS revenue \
         FROM fact_sales fs \
         JOIN dim_geography dg ON fs.geography_key = dg.geography_key \
         JOIN dim_time dt ON fs.time_key = dt.time_key \
         WHERE dg.country_name = 'United States'"
    );
    let mut idx = 1;
    sql.push_str(&filter.sql_clause("fs", "dt.full_date", &mut idx));
    sql.push_str(" GROUP BY 1 ORDER BY COUNT(DISTINCT fs.customer_key) DESC LIMIT 12");

    let query = filter.bind_dates(sqlx::query_as::<_, LocationRow>(&sql));
    query
        .fetch_all(pool)
        .await
        .context("customers by location query failed")
}

/// Share of customers with more than one order, as a percentage.
pub async fn customer_retention_rate(
    pool: &PgPool,
    filter: &ReportFilter,
) -> Result<Option<Decimal>> {
    let mut sql = String::from(
        "SELECT ROUND(COUNT(DISTINCT CASE WHEN co.order_count > 1 THEN fs.customer_key END) \
         * 100.0 / NULLIF(COUNT(DISTINCT fs.customer_key), 0), 2) \
         FROM fact_sales fs \
         JOIN (SELECT customer_key, COUNT(DISTINCT order_key) AS order_count \
               FROM fact_sales GROUP BY 1) co ON fs.customer_key = co.customer_key \
         JOIN dim_time dt ON fs.time_key = dt.time_key WHERE 1=1",
    );
    let mut idx = 1;
    sql.push_str(&filter.sql_clause("fs", "dt.full_date", &mut idx));

    let mut query = sqlx::query_scalar::<_, Option<Decimal>>(&sql);
    if let Some(d) = filter.start_date {
        query = query.bind(d);
    }
    if let Some(d) = filter.end_date {
        query = query.bind(d);
    }
    query
        .fetch_one(pool)
        .await
        .context("retention rate query failed")
}

/// Top 10 current products by net revenue, titles truncated for display.
pub async fn total_sales_by_product(
    pool: &PgPool,
    filter: &ReportFilter,
) -> Result<Vec<ProductSalesRow>> {
    let mut sql = format!(
        "SELECT CASE WHEN LENGTH(dp.product_name) > 30 \
         THEN LEFT(dp.product_name, 27) || '...' ELSE dp.product_name END AS product, \
         ROUND(COALESCE(SUM({NET_REVENUE}), 0), 2) AS revenue \
         FROM fact_sales fs \
         JOIN dim_product dp ON fs.product_key = dp.product_key \
         JOIN dim_time dt ON fs.time_key = dt.time_key \
         WHERE dp.is_current = true"
    );
    let mut idx = 1;
    sql.push_str(&filter.sql_clause("fs", "dt.full_date", &mut idx));
    sql.push_str(&format!(
        " GROUP BY 1 ORDER BY SUM({NET_REVENUE}) DESC LIMIT 10"
    ));

    let query = filter.bind_dates(sqlx::query_as::<_, ProductSalesRow>(&sql));
    query
        .fetch_all(pool)
        .await
        .context("sales by product query failed")
}

pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((start, next.pred_opt()?))
}

pub fn month_name(month: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    if (1..=12).contains(&month) {
        NAMES[(month - 1) as usize]
    } else {
        "Unknown"
    }
}

/// Daily revenue for two months side by side.
pub async fn revenue_comparison_by_month(
    pool: &PgPool,
    month1: (i32, u32),
    month2: (i32, u32),
) -> Result<Vec<DailyComparisonRow>> {
    let (m1_start, m1_end) =
        month_bounds(month1.0, month1.1).context("invalid first comparison month")?;
    let (m2_start, m2_end) =
        month_bounds(month2.0, month2.1).context("invalid second comparison month")?;

    let sql = format!(
        "WITH month1_daily AS ( \
             SELECT dt.full_date AS date, \
                    ROUND(COALESCE(SUM({NET_REVENUE}), 0), 2) AS revenue, \
                    'Month 1' AS month_label, dt.day_of_month \
             FROM fact_sales fs JOIN dim_time dt ON fs.time_key = dt.time_key \
             WHERE dt.full_date >= $1 AND dt.full_date <= $2 \
             GROUP BY dt.full_date, dt.day_of_month \
         ), month2_daily AS ( \
             SELECT dt.full_date AS date, \
                    ROUND(COALESCE(SUM({NET_REVENUE}), 0), 2) AS revenue, \
                    'Month 2' AS month_label, dt.day_of_month \
             FROM fact_sales fs JOIN dim_time dt ON fs.time_key = dt.time_key \
             WHERE dt.full_date >= $3 AND dt.full_date <= $4 \
             GROUP BY dt.full_date, dt.day_of_month \
         ) \
         SELECT date, revenue, month_label, day_of_month FROM month1_daily \
         UNION ALL \
         SELECT date, revenue, month_label, day_of_month FROM month2_daily \
         ORDER BY month_label, day_of_month"
    );

    sqlx::query_as::<_, DailyComparisonRow>(&sql)
        .bind(m1_start)
        .bind(m1_end)
        .bind(m2_start)
        .bind(m2_end)
        .fetch_all(pool)
        .await
        .context("revenue comparison query failed")
}

pub async fn month_aggregates(
    pool: &PgPool,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<MonthAggregates> {
    let orders_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(DISTINCT fs.order_key) FROM fact_sales fs \
         JOIN dim_time dt ON fs.time_key = dt.time_key \
         WHERE dt.full_date >= $1 AND dt.full_date <= $2",
    )
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await
    .context("month order count query failed")?;

    let (revenue, profit) = sqlx::query_as::<_, (Decimal, Decimal)>(
        "SELECT COALESCE(SUM(COALESCE(fp.gross_amount, 0)), 0), \
                COALESCE(SUM(COALESCE(fp.net_amount, 0)), 0) \
         FROM fact_payments fp JOIN dim_time dt ON fp.payment_date_key = dt.time_key \
         WHERE dt.full_date >= $1 AND dt.full_date <= $2",
    )
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await
    .context("month revenue/profit query failed")?;

    Ok(MonthAggregates {
        orders_count,
        revenue,
        profit,
    })
}

pub async fn comparison_percentages(
    pool: &PgPool,
    month1: (i32, u32),
    month2: (i32, u32),
) -> Result<ComparisonPercentages> {
    let (m1_start, m1_end) =
        month_bounds(month1.0, month1.1).context("invalid first comparison month")?;
    let (m2_start, m2_end) =
        month_bounds(month2.0, month2.1).context("invalid second comparison month")?;

    let m1 = month_aggregates(pool, m1_start, m1_end).await?;
    let m2 = month_aggregates(pool, m2_start, m2_end).await?;

    let hundred = Decimal::new(100, 0);
    let ratio = |a: Decimal, b: Decimal| {
        if b.is_zero() {
            None
        } else {
            Some(a / b * hundred)
        }
    };

    Ok(ComparisonPercentages {
        orders_pct: ratio(
            Decimal::from(m1.orders_count),
            Decimal::from(m2.orders_count),
        ),
        revenue_pct: ratio(m1.revenue, m2.revenue),
        profit_pct: ratio(m1.profit, m2.profit),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_bounds_cover_month_ends() {
        assert_eq!(
            month_bounds(2025, 1),
            Some((
                NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
            ))
        );
        assert_eq!(
            month_bounds(2024, 2).map(|(_, e)| e),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(
            month_bounds(2025, 12).map(|(_, e)| e),
            NaiveDate::from_ymd_opt(2025, 12, 31)
        );
        assert_eq!(month_bounds(2025, 13), None);
    }

    #[test]
    fn month_names_are_english() {
        assert_eq!(month_name(1), "January");
        assert_eq!(month_name(12), "December");
        assert_eq!(month_name(0), "Unknown");
    }
}
