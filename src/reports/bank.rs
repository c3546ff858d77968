//! Bank account listings and statements
//!
//! Statement rows keep the Vietnamese column captions the exported reports
//! use, so the JSON lines up with the printed bank statement.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BankAccountSummaryRow {
    #[sqlx(rename = "Account Number")]
    #[serde(rename = "Account Number")]
    pub account_number: Option<String>,
    #[sqlx(rename = "Account Name")]
    #[serde(rename = "Account Name")]
    pub account_name: Option<String>,
    #[sqlx(rename = "CIF Number")]
    #[serde(rename = "CIF Number")]
    pub cif_number: Option<String>,
    #[sqlx(rename = "Customer Address")]
    #[serde(rename = "Customer Address")]
    pub customer_address: Option<String>,
    #[sqlx(rename = "Opening Date")]
    #[serde(rename = "Opening Date")]
    pub opening_date: Option<String>,
    #[sqlx(rename = "Currency")]
    #[serde(rename = "Currency")]
    pub currency: Option<String>,
    #[sqlx(rename = "Total Transactions")]
    #[serde(rename = "Total Transactions")]
    pub total_transactions: i64,
    #[sqlx(rename = "Total Credit (VND)")]
    #[serde(rename = "Total Credit (VND)")]
    pub total_credit: Option<Decimal>,
    #[sqlx(rename = "Total Debit (VND)")]
    #[serde(rename = "Total Debit (VND)")]
    pub total_debit: Option<Decimal>,
    #[sqlx(rename = "Current Balance (VND)")]
    #[serde(rename = "Current Balance (VND)")]
    pub current_balance: Option<Decimal>,
    #[sqlx(rename = "First Transaction Date")]
    #[serde(rename = "First Transaction Date")]
    pub first_transaction_date: Option<String>,
    #[sqlx(rename = "Last Transaction Date")]
    #[serde(rename = "Last Transaction Date")]
    pub last_transaction_date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BankAccountInfo {
    pub account_name: String,
    pub account_number: String,
    pub cif_number: String,
    pub customer_address: String,
    pub opening_date: String,
    pub currency_code: String,
}

impl Default for BankAccountInfo {
    fn default() -> Self {
        BankAccountInfo {
            account_name: "N/A".to_string(),
            account_number: "N/A".to_string(),
            cif_number: "N/A".to_string(),
            customer_address: "N/A".to_string(),
            opening_date: "N/A".to_string(),
            currency_code: "VND".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StatementRow {
    #[sqlx(rename = "Ngày GD")]
    #[serde(rename = "Ngày GD")]
    pub transaction_date: Option<String>,
    #[sqlx(rename = "Mã giao dịch")]
    #[serde(rename = "Mã giao dịch")]
    pub reference_number: Option<String>,
    #[sqlx(rename = "Số tài khoản truy vấn")]
    #[serde(rename = "Số tài khoản truy vấn")]
    pub account_number: Option<String>,
    #[sqlx(rename = "Tên tài khoản truy vấn")]
    #[serde(rename = "Tên tài khoản truy vấn")]
    pub account_name: Option<String>,
    #[sqlx(rename = "Ngày mở tài khoản")]
    #[serde(rename = "Ngày mở tài khoản")]
    pub opening_date: Option<String>,
    #[sqlx(rename = "Phát sinh có")]
    #[serde(rename = "Phát sinh có")]
    pub credit_amount: Decimal,
    #[sqlx(rename = "Phát sinh nợ")]
    #[serde(rename = "Phát sinh nợ")]
    pub debit_amount: Decimal,
    #[sqlx(rename = "Số dư")]
    #[serde(rename = "Số dư")]
    pub balance: Option<Decimal>,
    #[sqlx(rename = "Diễn giải")]
    #[serde(rename = "Diễn giải")]
    pub description: Option<String>,
}

/// Accepts only a plain YYYY-MM-DD string; anything else is ignored rather
/// than rejected, matching how the statement filters have always behaved.
pub fn parse_statement_date(raw: Option<&str>) -> Option<NaiveDate> {
    let s = raw?.trim();
    if s.len() != 10 || s.matches('-').count() != 2 {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Accounts ordered by total credit, empty account numbers excluded.
pub async fn bank_accounts(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<Vec<BankAccountSummaryRow>> {
    sqlx::query_as::<_, BankAccountSummaryRow>(
        r#"WITH bank_account_stats AS (
               SELECT fbt.bank_account_key,
                      COUNT(*) AS transaction_count,
                      SUM(COALESCE(fbt.credit_amount, 0)) AS total_credit,
                      SUM(COALESCE(fbt.debit_amount, 0)) AS total_debit,
                      MIN(dt.full_date) AS first_transaction_date,
                      MAX(dt.full_date) AS last_transaction_date,
                      MAX(fbt.balance_after_transaction) AS current_balance
               FROM fact_bank_transactions fbt
               JOIN dim_time dt ON fbt.transaction_date_key = dt.time_key
               GROUP BY fbt.bank_account_key
           )
           SELECT dba.account_number AS "Account Number",
                  dba.account_name AS "Account Name",
                  dba.cif_number AS "CIF Number",
                  dba.customer_address AS "Customer Address",
                  dba.opening_date::text AS "Opening Date",
                  dba.currency_code AS "Currency",
                  bas.transaction_count AS "Total Transactions",
                  ROUND(bas.total_credit::numeric, 2) AS "Total Credit (VND)",
                  ROUND(bas.total_debit::numeric, 2) AS "Total Debit (VND)",
                  ROUND(bas.current_balance::numeric, 2) AS "Current Balance (VND)",
                  bas.first_transaction_date::text AS "First Transaction Date",
                  bas.last_transaction_date::text AS "Last Transaction Date"
           FROM bank_account_stats bas
           JOIN dim_bank_account dba ON bas.bank_account_key = dba.bank_account_key
           WHERE dba.account_number IS NOT NULL AND dba.account_number <> ''
           ORDER BY bas.total_credit DESC
           LIMIT $1 OFFSET $2"#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .context("bank accounts query failed")
}

pub async fn bank_accounts_count(pool: &PgPool) -> Result<i64> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(DISTINCT dba.bank_account_key) FROM dim_bank_account dba \
         WHERE dba.account_number IS NOT NULL AND dba.account_number <> ''",
    )
    .fetch_one(pool)
    .await
    .context("bank accounts count query failed")
}

/// Account header block, with N/A placeholders when the account is unknown.
pub async fn bank_account_info(pool: &PgPool, account_number: &str) -> Result<BankAccountInfo> {
    let row = sqlx::query_as::<_, (Option<String>, Option<String>, Option<String>, Option<String>, Option<NaiveDate>, Option<String>)>(
        "SELECT dba.account_number, dba.account_name, dba.cif_number, dba.customer_address, \
                dba.opening_date, dba.currency_code \
         FROM dim_bank_account dba WHERE dba.account_number = $1",
    )
    .bind(account_number)
    .fetch_optional(pool)
    .await
    .context("bank account info query failed")?;

    let fallback = BankAccountInfo::default();
    Ok(match row {
        Some((number, name, cif, address, opening, currency)) => BankAccountInfo {
            account_name: name.unwrap_or_else(|| fallback.account_name.clone()),
            account_number: number.unwrap_or_else(|| fallback.account_number.clone()),
            cif_number: cif.unwrap_or_else(|| fallback.cif_number.clone()),
            customer_address: address.unwrap_or_else(|| fallback.customer_address.clone()),
            opening_date: opening
                .map(|d| d.to_string())
                .unwrap_or_else(|| fallback.opening_date.clone()),
            currency_code: currency.unwrap_or_else(|| fallback.currency_code.clone()),
        },
        None => fallback,
    })
}

pub async fn account_statement(
    pool: &PgPool,
    account_number: &str,
    from_date: Option<&str>,
    to_date: Option<&str>,
) -> Result<Vec<StatementRow>> {
    let mut sql = String::from(
        r#"SELECT t.full_date::text AS "Ngày GD",
                  fbt.reference_number AS "Mã giao dịch",
                  dba.account_number AS "Số tài khoản truy vấn",
                  dba.account_name AS "Tên tài khoản truy vấn",
                  dba.opening_date::text AS "Ngày mở tài khoản",
                  COALESCE(fbt.credit_amount, 0) AS "Phát sinh có",
                  COALESCE(fbt.debit_amount, 0) AS "Phát sinh nợ",
                  fbt.balance_after_transaction AS "Số dư",
                  fbt.transaction_description AS "Diễn giải"
           FROM fact_bank_transactions fbt
           JOIN dim_time t ON fbt.transaction_date_key = t.time_key
           JOIN dim_bank_account dba ON fbt.bank_account_key = dba.bank_account_key
           WHERE dba.account_number = $1"#,
    );

    let from = parse_statement_date(from_date);
    let to = parse_statement_date(to_date);
    let mut idx = 2;
    if from.is_some() {
        sql.push_str(&format!(" AND t.full_date >= ${idx}"));
        idx += 1;
    }
    if to.is_some() {
        sql.push_str(&format!(" AND t.full_date <= ${idx}"));
    }
    sql.push_str(" ORDER BY t.full_date, fbt.bank_transaction_key");

    let mut query = sqlx::query_as::<_, StatementRow>(&sql).bind(account_number);
    if let Some(d) = from {
        query = query.bind(d);
    }
    if let Some(d) = to {
        query = query.bind(d);
    }
    query
        .fetch_all(pool)
        .await
        .context("account statement query failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_dates_must_be_iso() {
        assert_eq!(
            parse_statement_date(Some("2025-03-01")),
            NaiveDate::from_ymd_opt(2025, 3, 1)
        );
        assert_eq!(
            parse_statement_date(Some(" 2025-03-01 ")),
            NaiveDate::from_ymd_opt(2025, 3, 1)
        );
        assert_eq!(parse_statement_date(Some("01/03/2025")), None);
        assert_eq!(parse_statement_date(Some("2025-3-1")), None);
        assert_eq!(parse_statement_date(Some("")), None);
        assert_eq!(parse_statement_date(None), None);
    }

    #[test]
    fn unknown_account_info_defaults() {
        let info = BankAccountInfo::default();
        assert_eq!(info.account_name, "N/A");
        assert_eq!(info.currency_code, "VND");
    }
}
