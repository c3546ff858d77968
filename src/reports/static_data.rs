//! Period-independent listings: product catalog and raw bank transactions
//!
//! Sort columns are validated against a whitelist; the sort direction only
//! ever becomes ASC or DESC, so neither reaches the SQL as raw input.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CatalogRow {
    pub product_catalog_key: i64,
    pub product_line_id: Option<String>,
    pub product_id: Option<String>,
    pub variant_id: Option<String>,
    pub product_name: Option<String>,
    pub variant_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BankTransactionListRow {
    pub bank_transaction_key: i64,
    pub transaction_date: Option<NaiveDate>,
    pub reference_number: Option<String>,
    pub account_number: Option<String>,
    pub account_name: Option<String>,
    pub transaction_description: Option<String>,
    pub pl_account_number: Option<String>,
    pub parsed_product_line_id: Option<String>,
    pub parsed_product_id: Option<String>,
    pub parsed_variant_id: Option<String>,
    pub product_name: Option<String>,
    pub variant_name: Option<String>,
    pub credit_amount: Decimal,
    pub debit_amount: Decimal,
    pub balance_after_transaction: Option<Decimal>,
}

#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
    pub limit: i64,
    pub offset: i64,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BankTransactionQuery {
    pub limit: i64,
    pub offset: i64,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub account_number: Option<String>,
}

const CATALOG_SEARCH_COLUMNS: &[&str] = &[
    "product_line_id",
    "product_id",
    "variant_id",
    "product_name",
    "variant_name",
];

const CATALOG_SORT_COLUMNS: &[&str] = &[
    "product_catalog_key",
    "product_line_id",
    "product_id",
    "variant_id",
    "product_name",
    "variant_name",
];

fn sort_direction(sort_order: Option<&str>) -> &'static str {
    match sort_order {
        Some(order) if order.eq_ignore_ascii_case("desc") => "DESC",
        _ => "ASC",
    }
}

/// Catalog page plus the total row count for the same filter.
pub async fn product_catalog(
    pool: &PgPool,
    query: &CatalogQuery,
) -> Result<(Vec<CatalogRow>, i64)> {
    let mut where_clause = String::new();
    let search_pattern = query.search.as_ref().map(|s| format!("%{s}%"));
    let mut idx = 1;
    if search_pattern.is_some() {
        let conditions: Vec<String> = CATALOG_SEARCH_COLUMNS
            .iter()
            .map(|col| {
                let c = format!("CAST({col} AS TEXT) ILIKE ${idx}");
                idx += 1;
                c
            })
            .collect();
        where_clause = format!("WHERE {}", conditions.join(" OR "));
    }

    let mut order_clause = String::new();
    if let Some(sort_by) = query.sort_by.as_deref() {
        if CATALOG_SORT_COLUMNS.contains(&sort_by) {
            order_clause = format!(
                "ORDER BY {sort_by} {}",
                sort_direction(query.sort_order.as_deref())
            );
        }
    }

    let sql = format!(
        "SELECT product_catalog_key, product_line_id, product_id, variant_id, \
                product_name, variant_name \
         FROM dim_product_catalog {where_clause} {order_clause} \
         LIMIT ${idx} OFFSET ${next}",
        next = idx + 1,
    );

    let mut data_query = sqlx::query_as::<_, CatalogRow>(&sql);
    if let Some(pattern) = &search_pattern {
        for _ in CATALOG_SEARCH_COLUMNS {
            data_query = data_query.bind(pattern.clone());
        }
    }
    let rows = data_query
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(pool)
        .await
        .context("product catalog query failed")?;

    let count_sql = format!("SELECT COUNT(*) FROM dim_product_catalog {where_clause}");
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(pattern) = &search_pattern {
        for _ in CATALOG_SEARCH_COLUMNS {
            count_query = count_query.bind(pattern.clone());
        }
    }
    let total = count_query
        .fetch_one(pool)
        .await
        .context("product catalog count query failed")?;

    Ok((rows, total))
}

pub async fn product_catalog_count(pool: &PgPool) -> Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM dim_product_catalog")
        .fetch_one(pool)
        .await
        .context("product catalog count query failed")
}

fn bank_transaction_order(sort_by: Option<&str>, sort_order: Option<&str>) -> String {
    let direction = sort_direction(sort_order);
    match sort_by {
        Some("transaction_date") => format!("ORDER BY dt.full_date {direction}"),
        Some("account_number") => format!("ORDER BY dba.account_number {direction}"),
        Some(
            col @ ("reference_number" | "credit_amount" | "debit_amount"
            | "balance_after_transaction" | "transaction_description" | "pl_account_number"),
        ) => format!("ORDER BY fbt.{col} {direction}"),
        // Newest first by default.
        _ => "ORDER BY dt.full_date DESC, fbt.bank_transaction_key DESC".to_string(),
    }
}

/// Bank transaction page with account and catalog context joined in. The
/// catalog is matched by key when the loader resolved one, otherwise by the
/// full parsed line/product/variant triple.
pub async fn bank_transactions(
    pool: &PgPool,
    query: &BankTransactionQuery,
) -> Result<(Vec<BankTransactionListRow>, i64)> {
    let mut conditions = Vec::new();
    let mut idx = 1;
    if query.account_number.is_some() {
        conditions.push(format!("dba.account_number = ${idx}"));
        idx += 1;
    }
    let search_pattern = query.search.as_ref().map(|s| format!("%{s}%"));
    if search_pattern.is_some() {
        let search_columns = [
            "fbt.transaction_description",
            "fbt.reference_number",
            "dba.account_number",
        ];
        let search: Vec<String> = search_columns
            .iter()
            .map(|col| {
                let c = format!("CAST({col} AS TEXT) ILIKE ${idx}");
                idx += 1;
                c
            })
            .collect();
        conditions.push(format!("({})", search.join(" OR ")));
    }
    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let joins = "FROM fact_bank_transactions fbt \
         LEFT JOIN dim_time dt ON fbt.transaction_date_key = dt.time_key \
         LEFT JOIN dim_bank_account dba ON fbt.bank_account_key = dba.bank_account_key \
         LEFT JOIN dim_product_catalog dpc ON fbt.product_catalog_key = dpc.product_catalog_key \
         LEFT JOIN dim_product_catalog dpc2 ON \
             fbt.parsed_product_line_id IS NOT NULL \
             AND fbt.parsed_product_id IS NOT NULL \
             AND fbt.parsed_variant_id IS NOT NULL \
             AND fbt.parsed_product_line_id = dpc2.product_line_id \
             AND fbt.parsed_product_id = dpc2.product_id \
             AND fbt.parsed_variant_id = dpc2.variant_id";

    let sql = format!(
        "SELECT fbt.bank_transaction_key, \
                dt.full_date AS transaction_date, \
                fbt.reference_number, \
                dba.account_number, \
                dba.account_name, \
                fbt.transaction_description, \
                fbt.pl_account_number, \
                fbt.parsed_product_line_id, \
                fbt.parsed_product_id, \
                fbt.parsed_variant_id, \
                COALESCE(dpc.product_name, dpc2.product_name) AS product_name, \
                COALESCE(dpc.variant_name, dpc2.variant_name) AS variant_name, \
                COALESCE(fbt.credit_amount, 0) AS credit_amount, \
                COALESCE(fbt.debit_amount, 0) AS debit_amount, \
                fbt.balance_after_transaction \
         {joins} {where_clause} {order_clause} \
         LIMIT ${idx} OFFSET ${next}",
        order_clause = bank_transaction_order(query.sort_by.as_deref(), query.sort_order.as_deref()),
        next = idx + 1,
    );

    let mut data_query = sqlx::query_as::<_, BankTransactionListRow>(&sql);
    if let Some(account) = &query.account_number {
        data_query = data_query.bind(account.clone());
    }
    if let Some(pattern) = &search_pattern {
        for _ in 0..3 {
            data_query = data_query.bind(pattern.clone());
        }
    }
    let rows = data_query
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(pool)
        .await
        .context("bank transactions query failed")?;

    let count_sql = format!("SELECT COUNT(*) {joins} {where_clause}");
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(account) = &query.account_number {
        count_query = count_query.bind(account.clone());
    }
    if let Some(pattern) = &search_pattern {
        for _ in 0..3 {
            count_query = count_query.bind(pattern.clone());
        }
    }
    let total = count_query
        .fetch_one(pool)
        .await
        .context("bank transactions count query failed")?;

    Ok((rows, total))
}

pub async fn bank_transactions_count(
    pool: &PgPool,
    account_number: Option<&str>,
) -> Result<i64> {
    let total = match account_number {
        Some(account) => {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM fact_bank_transactions fbt \
                 JOIN dim_bank_account dba ON fbt.bank_account_key = dba.bank_account_key \
                 WHERE dba.account_number = $1",
            )
            .bind(account)
            .fetch_one(pool)
            .await
        }
        None => {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM fact_bank_transactions")
                .fetch_one(pool)
                .await
        }
    };
    total.context("bank transactions count query failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_direction_defaults_to_asc() {
        assert_eq!(sort_direction(None), "ASC");
        assert_eq!(sort_direction(Some("asc")), "ASC");
        assert_eq!(sort_direction(Some("DESC")), "DESC");
        assert_eq!(sort_direction(Some("sideways")), "ASC");
    }

    #[test]
    fn unknown_sort_column_falls_back_to_newest_first() {
        let clause = bank_transaction_order(Some("1; DROP TABLE"), Some("desc"));
        assert_eq!(
            clause,
            "ORDER BY dt.full_date DESC, fbt.bank_transaction_key DESC"
        );
    }

    #[test]
    fn date_sort_goes_through_dim_time() {
        assert_eq!(
            bank_transaction_order(Some("transaction_date"), Some("asc")),
            "ORDER BY dt.full_date ASC"
        );
        assert_eq!(
            bank_transaction_order(Some("credit_amount"), Some("desc")),
            "ORDER BY fbt.credit_amount DESC"
        );
    }
}
