//! Profit and loss summary table
//!
//! Three aggregate queries (Etsy statement buckets, COGS accounts, operating
//! accounts) merged per period, then transposed into line-item rows with a
//! Full Year column.

use std::collections::BTreeMap;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::warn;
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};
use sqlx::{FromRow, PgPool};

use crate::reports::filters::ReportFilter;

/// Expense columns subtracted from revenue when the caller does not pick
/// their own set.
pub const DEFAULT_EXPENSE_ITEMS: [&str; 10] = [
    "refund_cost",
    "cost_of_goods",
    "total_etsy_fees",
    "general_production_cost",
    "staff_cost",
    "material_packaging_cost",
    "platform_tool_cost",
    "tool_cost",
    "management_staff_cost",
    "marketing_staff_cost",
];

pub fn expense_item_label(item: &str) -> &str {
    match item {
        "refund_cost" => "Refund Cost",
        "cost_of_goods" => "Cost of Goods",
        "total_etsy_fees" => "Etsy Fees",
        "general_production_cost" => "General production cost",
        "staff_cost" => "Selling staff cost",
        "material_packaging_cost" => "Materials & packaging (selling)",
        "platform_tool_cost" => "Platform tools cost (selling)",
        "tool_cost" => "Tools cost (selling)",
        "management_staff_cost" => "Admin staff cost",
        "marketing_staff_cost" => "Marketing & channel management",
        other => other,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Month,
    Year,
    MonthYear,
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "month" | "" => Ok(ViewMode::Month),
            "year" => Ok(ViewMode::Year),
            "month_year" => Ok(ViewMode::MonthYear),
            other => Err(format!("unknown view mode: {other}")),
        }
    }
}

impl ViewMode {
    /// Always selects all three key columns so the row shape stays fixed;
    /// the unused ones come back NULL.
    fn key_select(&self) -> &'static str {
        match self {
            ViewMode::Year => "dt.year AS year, NULL::int AS month, NULL::text AS month_name",
            ViewMode::MonthYear => "dt.year AS year, dt.month AS month, dt.month_name AS month_name",
            ViewMode::Month => "NULL::int AS year, dt.month AS month, dt.month_name AS month_name",
        }
    }

    fn key_group_order(&self) -> &'static str {
        match self {
            ViewMode::Year => "GROUP BY dt.year ORDER BY dt.year",
            ViewMode::MonthYear => {
                "GROUP BY dt.year, dt.month, dt.month_name ORDER BY dt.year, dt.month"
            }
            ViewMode::Month => "GROUP BY dt.month, dt.month_name ORDER BY dt.month",
        }
    }
}

pub type PeriodKey = (Option<i32>, Option<i32>);

#[derive(Debug, Clone, Default)]
pub struct PeriodBucket {
    pub month_name: Option<String>,
    pub revenue: Decimal,
    pub refund_cost: Decimal,
    pub transaction_fee: Decimal,
    pub processing_fee: Decimal,
    pub regulatory_fee: Decimal,
    pub listing_fee: Decimal,
    pub marketing_fee: Decimal,
    pub vat_auto_renew_sold: Decimal,
    pub vat_shipping_transaction: Decimal,
    pub vat_processing_fee: Decimal,
    pub vat_transaction_credit: Decimal,
    pub vat_listing_credit: Decimal,
    pub vat_listing: Decimal,
    pub vat_etsy_plus_subscription: Decimal,
    pub cost_of_goods: Decimal,
    pub material_cost: Decimal,
    pub concept_design_cost: Decimal,
    pub chart_hook_spin_cost: Decimal,
    pub spinning_cost: Decimal,
    pub photo_spin_cost: Decimal,
    pub pattern_translation_cost: Decimal,
    pub general_production_cost: Decimal,
    pub staff_cost: Decimal,
    pub material_packaging_cost: Decimal,
    pub platform_tool_cost: Decimal,
    pub tool_cost: Decimal,
    pub management_staff_cost: Decimal,
    pub marketing_staff_cost: Decimal,
}

impl PeriodBucket {
    pub fn total_vat_fees(&self) -> Decimal {
        self.vat_auto_renew_sold
            + self.vat_shipping_transaction
            + self.vat_processing_fee
            + self.vat_transaction_credit
            + self.vat_listing_credit
            + self.vat_listing
            + self.vat_etsy_plus_subscription
    }

    pub fn total_etsy_fees(&self) -> Decimal {
        self.transaction_fee
            + self.processing_fee
            + self.regulatory_fee
            + self.listing_fee
            + self.marketing_fee
            + self.total_vat_fees()
    }

    pub fn value(&self, item: &str) -> Option<Decimal> {
        let v = match item {
            "revenue" => self.revenue,
            "refund_cost" => self.refund_cost,
            "transaction_fee" => self.transaction_fee,
            "processing_fee" => self.processing_fee,
            "regulatory_fee" => self.regulatory_fee,
            "listing_fee" => self.listing_fee,
            "marketing_fee" => self.marketing_fee,
            "vat_auto_renew_sold" => self.vat_auto_renew_sold,
            "vat_shipping_transaction" => self.vat_shipping_transaction,
            "vat_processing_fee" => self.vat_processing_fee,
            "vat_transaction_credit" => self.vat_transaction_credit,
            "vat_listing_credit" => self.vat_listing_credit,
            "vat_listing" => self.vat_listing,
            "vat_etsy_plus_subscription" => self.vat_etsy_plus_subscription,
            "total_vat_fees" => self.total_vat_fees(),
            "total_etsy_fees" => self.total_etsy_fees(),
            "cost_of_goods" => self.cost_of_goods,
            "material_cost" => self.material_cost,
            "concept_design_cost" => self.concept_design_cost,
            "chart_hook_spin_cost" => self.chart_hook_spin_cost,
            "spinning_cost" => self.spinning_cost,
            "photo_spin_cost" => self.photo_spin_cost,
            "pattern_translation_cost" => self.pattern_translation_cost,
            "general_production_cost" => self.general_production_cost,
            "staff_cost" => self.staff_cost,
            "material_packaging_cost" => self.material_packaging_cost,
            "platform_tool_cost" => self.platform_tool_cost,
            "tool_cost" => self.tool_cost,
            "management_staff_cost" => self.management_staff_cost,
            "marketing_staff_cost" => self.marketing_staff_cost,
            _ => return None,
        };
        Some(v)
    }

    pub fn net_profit(&self, expense_items: &[String]) -> Decimal {
        let mut profit = self.revenue;
        for item in expense_items {
            match self.value(item) {
                Some(v) => profit -= v,
                None => warn!("unknown expense item '{item}' skipped in net profit"),
            }
        }
        profit
    }
}

#[derive(Debug, FromRow)]
struct StatementAggRow {
    year: Option<i32>,
    month: Option<i32>,
    month_name: Option<String>,
    revenue: Decimal,
    refund_cost: Decimal,
    transaction_fee: Decimal,
    processing_fee: Decimal,
    regulatory_fee: Decimal,
    listing_fee: Decimal,
    marketing_fee: Decimal,
    vat_auto_renew_sold: Decimal,
    vat_shipping_transaction: Decimal,
    vat_processing_fee: Decimal,
    vat_transaction_credit: Decimal,
    vat_listing_credit: Decimal,
    vat_listing: Decimal,
    vat_etsy_plus_subscription: Decimal,
}

#[derive(Debug, FromRow)]
struct CogsAggRow {
    year: Option<i32>,
    month: Option<i32>,
    month_name: Option<String>,
    material_cost: Decimal,
    concept_design_cost: Decimal,
    chart_hook_spin_cost: Decimal,
    spinning_cost: Decimal,
    photo_spin_cost: Decimal,
    pattern_translation_cost: Decimal,
    cost_of_goods: Decimal,
}

#[derive(Debug, FromRow)]
struct OperatingAggRow {
    year: Option<i32>,
    month: Option<i32>,
    month_name: Option<String>,
    general_production_cost: Decimal,
    staff_cost: Decimal,
    material_packaging_cost: Decimal,
    platform_tool_cost: Decimal,
    tool_cost: Decimal,
    management_staff_cost: Decimal,
    marketing_staff_cost: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct SummaryOptions {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub view_mode: ViewMode,
    /// None means the default formula.
    pub selected_items: Option<Vec<String>>,
}

fn statement_sql(mode: ViewMode, date_clause: &str) -> String {
    let fee_bucket = |title_pattern: &str| {
        format!(
            "COALESCE(SUM(CASE WHEN fft.transaction_type = 'Fee' \
             AND fft.transaction_title ILIKE '%{title_pattern}%' \
             THEN ABS(fft.fees_and_taxes) ELSE 0 END), 0)"
        )
    };
    let vat_bucket = |title_pattern: &str| {
        format!(
            "COALESCE(SUM(CASE WHEN fft.transaction_type = 'VAT' \
             AND fft.transaction_title ILIKE '%{title_pattern}%' \
             THEN ABS(fft.fees_and_taxes) ELSE 0 END), 0)"
        )
    };
    format!(
        "SELECT {keys}, \
         COALESCE(SUM(CASE WHEN fft.transaction_type = 'Sale' THEN fft.amount ELSE 0 END), 0) AS revenue, \
         COALESCE(SUM(CASE WHEN fft.transaction_type = 'Refund' THEN ABS(fft.amount) ELSE 0 END), 0) AS refund_cost, \
         {transaction_fee} AS transaction_fee, \
         {processing_fee} AS processing_fee, \
         {regulatory_fee} AS regulatory_fee, \
         {listing_fee} AS listing_fee, \
         COALESCE(SUM(CASE WHEN fft.transaction_type = 'Marketing' THEN ABS(fft.fees_and_taxes) ELSE 0 END), 0) AS marketing_fee, \
         {vat_auto_renew} AS vat_auto_renew_sold, \
         {vat_shipping} AS vat_shipping_transaction, \
         {vat_processing} AS vat_processing_fee, \
         {vat_txn_credit} AS vat_transaction_credit, \
         {vat_listing_credit} AS vat_listing_credit, \
         {vat_listing} AS vat_listing, \
         {vat_plus} AS vat_etsy_plus_subscription \
         FROM fact_financial_transactions fft \
         JOIN dim_time dt ON fft.transaction_date_key = dt.time_key \
         WHERE 1=1{date_clause} {group_order}",
        keys = mode.key_select(),
        transaction_fee = fee_bucket("Transaction fee"),
        processing_fee = fee_bucket("Processing fee"),
        regulatory_fee = fee_bucket("Regulatory Operating fee"),
        listing_fee = fee_bucket("Listing fee"),
        vat_auto_renew = vat_bucket("auto-renew sold"),
        vat_shipping = vat_bucket("shipping_transaction"),
        vat_processing = vat_bucket("Processing Fee"),
        vat_txn_credit = vat_bucket("transaction credit"),
        vat_listing_credit = vat_bucket("listing credit"),
        vat_listing = vat_bucket("listing"),
        vat_plus = vat_bucket("Etsy Plus subscription"),
        group_order = mode.key_group_order(),
    )
}

fn account_bucket(account: &str) -> String {
    format!(
        "COALESCE(SUM(CASE WHEN fbt.pl_account_number = '{account}' \
         THEN fbt.debit_amount ELSE 0 END), 0)"
    )
}

fn cogs_sql(mode: ViewMode, date_clause: &str) -> String {
    format!(
        "SELECT {keys}, \
         {a6211} AS material_cost, \
         {a6221} AS concept_design_cost, \
         {a6222} AS chart_hook_spin_cost, \
         {a6223} AS spinning_cost, \
         {a6224} AS photo_spin_cost, \
         {a6225} AS pattern_translation_cost, \
         COALESCE(SUM(fbt.debit_amount), 0) AS cost_of_goods \
         FROM fact_bank_transactions fbt \
         JOIN dim_time dt ON fbt.transaction_date_key = dt.time_key \
         WHERE 1=1{date_clause} \
         AND fbt.pl_account_number IN ('6211', '6221', '6222', '6223', '6224', '6225') \
         {group_order}",
        keys = mode.key_select(),
        a6211 = account_bucket("6211"),
        a6221 = account_bucket("6221"),
        a6222 = account_bucket("6222"),
        a6223 = account_bucket("6223"),
        a6224 = account_bucket("6224"),
        a6225 = account_bucket("6225"),
        group_order = mode.key_group_order(),
    )
}

fn operating_sql(mode: ViewMode, date_clause: &str) -> String {
    format!(
        "SELECT {keys}, \
         {a6273} AS general_production_cost, \
         {a6411} AS staff_cost, \
         {a6412} AS material_packaging_cost, \
         {a6413} AS platform_tool_cost, \
         {a6414} AS tool_cost, \
         {a6421} AS management_staff_cost, \
         {a6428} AS marketing_staff_cost \
         FROM fact_bank_transactions fbt \
         JOIN dim_time dt ON fbt.transaction_date_key = dt.time_key \
         WHERE 1=1{date_clause} \
         AND fbt.pl_account_number IN ('6273', '6411', '6412', '6413', '6414', '6421', '6428') \
         {group_order}",
        keys = mode.key_select(),
        a6273 = account_bucket("6273"),
        a6411 = account_bucket("6411"),
        a6412 = account_bucket("6412"),
        a6413 = account_bucket("6413"),
        a6414 = account_bucket("6414"),
        a6421 = account_bucket("6421"),
        a6428 = account_bucket("6428"),
        group_order = mode.key_group_order(),
    )
}

/// Queries the three fact aggregates and merges them per period.
pub async fn load_buckets(
    pool: &PgPool,
    options: &SummaryOptions,
) -> Result<BTreeMap<PeriodKey, PeriodBucket>> {
    let filter = ReportFilter::dates(options.start_date, options.end_date);
    let mut idx = 1;
    let date_clause = filter.sql_clause("fft", "dt.full_date", &mut idx);
    let mode = options.view_mode;

    let statement_rows = filter
        .bind_dates(sqlx::query_as::<_, StatementAggRow>(&statement_sql(
            mode,
            &date_clause,
        )))
        .fetch_all(pool)
        .await
        .context("statement aggregate query failed")?;
    let cogs_rows = filter
        .bind_dates(sqlx::query_as::<_, CogsAggRow>(&cogs_sql(mode, &date_clause)))
        .fetch_all(pool)
        .await
        .context("cogs aggregate query failed")?;
    let operating_rows = filter
        .bind_dates(sqlx::query_as::<_, OperatingAggRow>(&operating_sql(
            mode,
            &date_clause,
        )))
        .fetch_all(pool)
        .await
        .context("operating cost aggregate query failed")?;

    let mut buckets: BTreeMap<PeriodKey, PeriodBucket> = BTreeMap::new();
    for row in statement_rows {
        let bucket = buckets.entry((row.year, row.month)).or_default();
        bucket.month_name = row.month_name;
        bucket.revenue = row.revenue;
        bucket.refund_cost = row.refund_cost;
        bucket.transaction_fee = row.transaction_fee;
        bucket.processing_fee = row.processing_fee;
        bucket.regulatory_fee = row.regulatory_fee;
        bucket.listing_fee = row.listing_fee;
        bucket.marketing_fee = row.marketing_fee;
        bucket.vat_auto_renew_sold = row.vat_auto_renew_sold;
        bucket.vat_shipping_transaction = row.vat_shipping_transaction;
        bucket.vat_processing_fee = row.vat_processing_fee;
        bucket.vat_transaction_credit = row.vat_transaction_credit;
        bucket.vat_listing_credit = row.vat_listing_credit;
        bucket.vat_listing = row.vat_listing;
        bucket.vat_etsy_plus_subscription = row.vat_etsy_plus_subscription;
    }
    for row in cogs_rows {
        let bucket = buckets.entry((row.year, row.month)).or_default();
        if bucket.month_name.is_none() {
            bucket.month_name = row.month_name;
        }
        bucket.material_cost = row.material_cost;
        bucket.concept_design_cost = row.concept_design_cost;
        bucket.chart_hook_spin_cost = row.chart_hook_spin_cost;
        bucket.spinning_cost = row.spinning_cost;
        bucket.photo_spin_cost = row.photo_spin_cost;
        bucket.pattern_translation_cost = row.pattern_translation_cost;
        bucket.cost_of_goods = row.cost_of_goods;
    }
    for row in operating_rows {
        let bucket = buckets.entry((row.year, row.month)).or_default();
        if bucket.month_name.is_none() {
            bucket.month_name = row.month_name;
        }
        bucket.general_production_cost = row.general_production_cost;
        bucket.staff_cost = row.staff_cost;
        bucket.material_packaging_cost = row.material_packaging_cost;
        bucket.platform_tool_cost = row.platform_tool_cost;
        bucket.tool_cost = row.tool_cost;
        bucket.management_staff_cost = row.management_staff_cost;
        bucket.marketing_staff_cost = row.marketing_staff_cost;
    }
    Ok(buckets)
}

fn column_key(mode: ViewMode, key: &PeriodKey, bucket: &PeriodBucket) -> String {
    let month_name = bucket.month_name.as_deref().unwrap_or("Unknown");
    match mode {
        ViewMode::Year => key.0.map(|y| y.to_string()).unwrap_or_default(),
        ViewMode::MonthYear => format!("{} {month_name}", key.0.unwrap_or_default()),
        ViewMode::Month => month_name.to_string(),
    }
}

/// Line items in display order. None means a section header row.
fn line_items() -> Vec<(&'static str, Option<&'static str>)> {
    vec![
        ("Revenue (Sales)", None),
        ("Revenue", Some("revenue")),
        ("", None),
        ("Refund Cost", Some("refund_cost")),
        ("COGS (Cost of Goods Sold)", None),
        ("Cost of Goods", Some("cost_of_goods")),
        ("  - Material cost (Yarn)", Some("material_cost")),
        ("  - Concept design cost", Some("concept_design_cost")),
        ("  - Chart + hook + spinning", Some("chart_hook_spin_cost")),
        ("  - Spinning cost", Some("spinning_cost")),
        ("  - Photo + video cost", Some("photo_spin_cost")),
        ("  - Pattern & translation", Some("pattern_translation_cost")),
        ("Operating Expenses", None),
        ("Etsy Fees", Some("total_etsy_fees")),
        ("  - Transaction Fee", Some("transaction_fee")),
        ("  - Processing Fee", Some("processing_fee")),
        ("  - Regulatory Operating Fee", Some("regulatory_fee")),
        ("  - Listing Fee", Some("listing_fee")),
        ("  - Marketing", Some("marketing_fee")),
        ("  - VAT", Some("total_vat_fees")),
        ("    --- auto-renew sold", Some("vat_auto_renew_sold")),
        ("    --- shipping_transaction", Some("vat_shipping_transaction")),
        ("    --- Processing Fee", Some("vat_processing_fee")),
        ("    --- transaction credit", Some("vat_transaction_credit")),
        ("    --- listing credit", Some("vat_listing_credit")),
        ("    --- listing", Some("vat_listing")),
        ("    --- Etsy Plus subscription", Some("vat_etsy_plus_subscription")),
        ("General production cost", Some("general_production_cost")),
        ("Selling staff cost", Some("staff_cost")),
        ("Materials & packaging (selling)", Some("material_packaging_cost")),
        ("Platform tools cost (selling)", Some("platform_tool_cost")),
        ("Tools cost (selling)", Some("tool_cost")),
        ("Admin staff cost", Some("management_staff_cost")),
        ("Marketing & channel management", Some("marketing_staff_cost")),
        ("Net Income (Profit)", None),
        ("Profit", Some("net_profit")),
    ]
}

/// Transposes the period buckets into line-item rows. Header rows carry null
/// values; data rows are rounded to two decimals and include a Full Year sum.
pub fn build_table(
    buckets: &BTreeMap<PeriodKey, PeriodBucket>,
    mode: ViewMode,
    selected_items: Option<&[String]>,
) -> Vec<Value> {
    let expense_items: Vec<String> = match selected_items {
        Some(items) => items.to_vec(),
        None => DEFAULT_EXPENSE_ITEMS.iter().map(|s| s.to_string()).collect(),
    };

    let columns: Vec<(String, &PeriodBucket)> = buckets
        .iter()
        .map(|(key, bucket)| (column_key(mode, key, bucket), bucket))
        .collect();

    let item_value = |bucket: &PeriodBucket, column: &str| -> Decimal {
        if column == "net_profit" {
            bucket.net_profit(&expense_items)
        } else {
            bucket.value(column).unwrap_or_default()
        }
    };

    let mut rows = Vec::new();
    for (label, column_name) in line_items() {
        let mut row = Map::new();
        row.insert("Line Item".to_string(), json!(label));
        match column_name {
            None => {
                for (col_key, _) in &columns {
                    row.insert(col_key.clone(), Value::Null);
                }
                row.insert("Full Year".to_string(), Value::Null);
            }
            Some(column) => {
                let mut total = Decimal::ZERO;
                for (col_key, bucket) in &columns {
                    let v = item_value(bucket, column);
                    total += v;
                    row.insert(col_key.clone(), json!(v.round_dp(2)));
                }
                row.insert("Full Year".to_string(), json!(total.round_dp(2)));
            }
        }
        rows.push(Value::Object(row));
    }
    rows
}

pub async fn summary_table(pool: &PgPool, options: &SummaryOptions) -> Result<Vec<Value>> {
    let buckets = load_buckets(pool, options).await?;
    Ok(build_table(
        &buckets,
        options.view_mode,
        options.selected_items.as_deref(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bucket() -> PeriodBucket {
        PeriodBucket {
            month_name: Some("January".to_string()),
            revenue: Decimal::new(100_000, 2),
            refund_cost: Decimal::new(5_000, 2),
            transaction_fee: Decimal::new(1_000, 2),
            processing_fee: Decimal::new(2_000, 2),
            vat_listing: Decimal::new(300, 2),
            cost_of_goods: Decimal::new(20_000, 2),
            ..Default::default()
        }
    }

    #[test]
    fn vat_and_etsy_totals_roll_up() {
        let bucket = sample_bucket();
        assert_eq!(bucket.total_vat_fees(), Decimal::new(300, 2));
        assert_eq!(
            bucket.total_etsy_fees(),
            Decimal::new(1_000 + 2_000 + 300, 2)
        );
    }

    #[test]
    fn net_profit_subtracts_selected_items_only() {
        let bucket = sample_bucket();
        let items = vec!["refund_cost".to_string(), "cost_of_goods".to_string()];
        assert_eq!(
            bucket.net_profit(&items),
            Decimal::new(100_000 - 5_000 - 20_000, 2)
        );
        // Unknown items are skipped, not treated as zero revenue.
        let items = vec!["no_such_item".to_string()];
        assert_eq!(bucket.net_profit(&items), bucket.revenue);
    }

    #[test]
    fn default_formula_covers_all_major_expenses() {
        let bucket = sample_bucket();
        let items: Vec<String> = DEFAULT_EXPENSE_ITEMS.iter().map(|s| s.to_string()).collect();
        let expected = bucket.revenue
            - bucket.refund_cost
            - bucket.cost_of_goods
            - bucket.total_etsy_fees();
        assert_eq!(bucket.net_profit(&items), expected);
    }

    #[test]
    fn table_has_header_rows_and_full_year() {
        let mut buckets = BTreeMap::new();
        buckets.insert((None, Some(1)), sample_bucket());
        let mut february = sample_bucket();
        february.month_name = Some("February".to_string());
        february.revenue = Decimal::new(50_000, 2);
        buckets.insert((None, Some(2)), february);

        let rows = build_table(&buckets, ViewMode::Month, None);
        assert_eq!(rows.len(), line_items().len());

        let revenue_row = rows
            .iter()
            .find(|r| r["Line Item"] == "Revenue")
            .unwrap();
        assert_eq!(revenue_row["January"], json!(1000.0));
        assert_eq!(revenue_row["February"], json!(500.0));
        assert_eq!(revenue_row["Full Year"], json!(1500.0));

        let header_row = rows
            .iter()
            .find(|r| r["Line Item"] == "Operating Expenses")
            .unwrap();
        assert!(header_row["January"].is_null());
        assert!(header_row["Full Year"].is_null());
    }

    #[test]
    fn column_keys_follow_view_mode() {
        let bucket = sample_bucket();
        assert_eq!(
            column_key(ViewMode::Month, &(None, Some(1)), &bucket),
            "January"
        );
        assert_eq!(
            column_key(ViewMode::Year, &(Some(2025), None), &bucket),
            "2025"
        );
        assert_eq!(
            column_key(ViewMode::MonthYear, &(Some(2025), Some(1)), &bucket),
            "2025 January"
        );
    }

    #[test]
    fn view_mode_parses() {
        assert_eq!("month".parse::<ViewMode>().unwrap(), ViewMode::Month);
        assert_eq!("year".parse::<ViewMode>().unwrap(), ViewMode::Year);
        assert_eq!(
            "month_year".parse::<ViewMode>().unwrap(),
            ViewMode::MonthYear
        );
        assert!("week".parse::<ViewMode>().is_err());
    }

    #[test]
    fn statement_sql_buckets_by_type_and_title() {
        let sql = statement_sql(ViewMode::Month, " AND dt.full_date >= $1");
        assert!(sql.contains("transaction_type = 'Sale'"));
        assert!(sql.contains("ILIKE '%Regulatory Operating fee%'"));
        assert!(sql.contains("ILIKE '%Etsy Plus subscription%'"));
        assert!(sql.contains("GROUP BY dt.month, dt.month_name"));
    }

    #[test]
    fn cost_queries_restrict_account_whitelists() {
        let cogs = cogs_sql(ViewMode::Year, "");
        assert!(cogs.contains("IN ('6211', '6221', '6222', '6223', '6224', '6225')"));
        let operating = operating_sql(ViewMode::Year, "");
        assert!(operating.contains("IN ('6273', '6411', '6412', '6413', '6414', '6421', '6428')"));
    }
}
