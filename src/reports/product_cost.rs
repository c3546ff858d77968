//! Per-product cost and profitability queries
//!
//! Refunds and Etsy fees land at order level; they are allocated down to
//! products by each product's share of the order's sales.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

/// Fee rows counted as Etsy fees, shared by the allocation queries.
const ETSY_FEE_FILTER: &str = "( \
    (transaction_type = 'Fee' AND transaction_title ILIKE ANY(ARRAY[ \
        '%Transaction fee%', '%Processing fee%', '%Regulatory Operating fee%', '%Listing fee%'])) \
    OR transaction_type = 'Marketing' \
    OR (transaction_type = 'VAT' AND transaction_title ILIKE ANY(ARRAY[ \
        '%auto-renew sold%', '%shipping_transaction%', '%Processing Fee%', \
        '%transaction credit%', '%listing credit%', '%listing%', '%Etsy Plus subscription%'])))";

pub fn cogs_account_label(account: &str) -> &str {
    match account {
        "6211" => "Material cost (Yarn)",
        "6221" => "Concept design cost",
        "6222" => "Chart + hook + spinning",
        "6223" => "Spinning cost",
        "6224" => "Photo + video cost",
        "6225" => "Pattern & translation",
        "6273" => "Production overhead",
        "6411" => "Selling staff cost",
        "6412" => "Materials & packaging (selling)",
        "6413" => "Platform tools cost (selling)",
        "6414" => "Tools cost (selling)",
        "6421" => "Admin staff cost",
        "6428" => "Marketing & channel management",
        other => other,
    }
}

/// Order-level amount split by the product's share of order sales.
/// Zero when the order has no sales at all.
pub fn allocate_pro_rata(order_amount: Decimal, product_sales: Decimal, order_sales: Decimal) -> Decimal {
    if order_sales > Decimal::ZERO {
        order_amount * product_sales / order_sales
    } else {
        Decimal::ZERO
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductCostRow {
    pub product_line_id: Option<String>,
    pub product_name: Option<String>,
    pub product_id: Option<String>,
    pub variant_name: Option<String>,
    pub sales: Decimal,
    pub order_ids: String,
    pub refund: Decimal,
    pub unit: i32,
    pub cogs: Decimal,
    pub etsy_fee: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct VariantRow {
    pub variant: Option<String>,
    pub sales: Decimal,
    pub unit: i32,
    pub refund: Decimal,
    pub cogs: Decimal,
    pub etsy_fee: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CogsBreakdownRow {
    pub pl_account_number: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabeledCogsRow {
    pub account: String,
    pub label: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FeeBreakdownRow {
    pub fee_type: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MarginRow {
    pub order_id: Option<String>,
    pub sales: Decimal,
    pub sales_percent: Decimal,
    pub refund: Decimal,
    pub cogs: Decimal,
    pub etsy_fee: Decimal,
    pub profit: Decimal,
    pub margin_percent: Decimal,
}

/// Catalog overview with sales, allocated refunds/fees, COGS and profit,
/// one row per catalog variant.
pub async fn products_overview(pool: &PgPool) -> Result<Vec<ProductCostRow>> {
    let sql = format!(
        "WITH sales_agg AS ( \
             SELECT fs.sku AS product_id, \
                    SUM(COALESCE(fs.price, 0)) AS sales, \
                    COUNT(*) AS unit, \
                    STRING_AGG(DISTINCT fs.order_id::text, ', ') AS order_ids \
             FROM fact_sales fs WHERE fs.sku IS NOT NULL GROUP BY fs.sku \
         ), order_sales AS ( \
             SELECT order_id, SUM(COALESCE(price, 0)) AS total_order_sales \
             FROM fact_sales WHERE sku IS NOT NULL GROUP BY order_id \
         ), product_order_sales AS ( \
             SELECT fs.order_id, fs.sku AS product_id, \
                    SUM(COALESCE(fs.price, 0)) AS product_sales_in_order \
             FROM fact_sales fs WHERE fs.sku IS NOT NULL GROUP BY fs.order_id, fs.sku \
         ), order_refunds AS ( \
             SELECT order_id, SUM(ABS(COALESCE(amount, 0))) AS refund_amount \
             FROM fact_financial_transactions \
             WHERE transaction_type = 'Refund' GROUP BY order_id \
         ), refund_allocated AS ( \
             SELECT pos.product_id, \
                    SUM(COALESCE(orf.refund_amount, 0) * CASE \
                        WHEN os.total_order_sales > 0 \
                        THEN pos.product_sales_in_order / os.total_order_sales \
                        ELSE 0 END) AS refund \
             FROM product_order_sales pos \
             LEFT JOIN order_sales os ON os.order_id = pos.order_id \
             LEFT JOIN order_refunds orf ON orf.order_id = pos.order_id \
             GROUP BY pos.product_id \
         ), order_fees AS ( \
             SELECT order_id, SUM(ABS(COALESCE(fees_and_taxes, 0))) AS fee_amount \
             FROM fact_financial_transactions \
             WHERE fees_and_taxes IS NOT NULL AND {fee_filter} \
             GROUP BY order_id \
         ), fee_allocated AS ( \
             SELECT pos.product_id, \
                    SUM(COALESCE(ofe.fee_amount, 0) * CASE \
                        WHEN os.total_order_sales > 0 \
                        THEN pos.product_sales_in_order / os.total_order_sales \
                        ELSE 0 END) AS etsy_fee \
             FROM product_order_sales pos \
             LEFT JOIN order_sales os ON os.order_id = pos.order_id \
             LEFT JOIN order_fees ofe ON ofe.order_id = pos.order_id \
             GROUP BY pos.product_id \
         ), cogs_agg AS ( \
             SELECT fbt.parsed_product_id AS product_id, \
                    fbt.parsed_variant_id AS variant_id, \
                    SUM(COALESCE(fbt.debit_amount, 0)) AS cogs \
             FROM fact_bank_transactions fbt \
             WHERE fbt.pl_account_number IN ('6211','6221','6222','6223','6224','6225') \
               AND fbt.debit_amount IS NOT NULL \
               AND fbt.parsed_product_id IS NOT NULL \
             GROUP BY fbt.parsed_product_id, fbt.parsed_variant_id \
         ) \
         SELECT pc.product_line_id, pc.product_name, pc.product_id, pc.variant_name, \
                COALESCE(sa.sales, 0) AS sales, \
                COALESCE(sa.order_ids, '') AS order_ids, \
                COALESCE(ra.refund, 0) AS refund, \
                COALESCE(sa.unit, 0)::int AS unit, \
                COALESCE(ca.cogs, 0) AS cogs, \
                COALESCE(fa.etsy_fee, 0) AS etsy_fee, \
                COALESCE(sa.sales, 0) - COALESCE(ra.refund, 0) \
                  - COALESCE(ca.cogs, 0) - COALESCE(fa.etsy_fee, 0) AS profit \
         FROM dim_product_catalog pc \
         LEFT JOIN sales_agg sa ON sa.product_id = pc.product_id \
         LEFT JOIN refund_allocated ra ON ra.product_id = pc.product_id \
         LEFT JOIN fee_allocated fa ON fa.product_id = pc.product_id \
         LEFT JOIN cogs_agg ca ON ca.product_id = pc.product_id \
           AND ca.variant_id = pc.variant_id \
         WHERE pc.product_id IS NOT NULL AND pc.variant_name IS NOT NULL \
         ORDER BY pc.product_line_id, pc.product_name, pc.product_id, pc.variant_name",
        fee_filter = ETSY_FEE_FILTER,
    );

    sqlx::query_as::<_, ProductCostRow>(&sql)
        .fetch_all(pool)
        .await
        .context("products overview query failed")
}

pub async fn product_variants(pool: &PgPool, product_id: &str) -> Result<Vec<VariantRow>> {
    let sql = format!(
        "WITH sales_agg AS ( \
             SELECT fs.sku AS product_id, SUM(COALESCE(fs.price, 0)) AS sales, COUNT(*) AS unit \
             FROM fact_sales fs WHERE fs.sku = $1 GROUP BY fs.sku \
         ), order_sales AS ( \
             SELECT order_id, SUM(COALESCE(price, 0)) AS total_order_sales \
             FROM fact_sales WHERE sku = $1 GROUP BY order_id \
         ), product_order_sales AS ( \
             SELECT fs.order_id, fs.sku AS product_id, \
                    SUM(COALESCE(fs.price, 0)) AS product_sales_in_order \
             FROM fact_sales fs WHERE fs.sku = $1 GROUP BY fs.order_id, fs.sku \
         ), order_refunds AS ( \
             SELECT order_id, SUM(ABS(COALESCE(amount, 0))) AS refund_amount \
             FROM fact_financial_transactions \
             WHERE transaction_type = 'Refund' \
               AND order_id IN (SELECT DISTINCT order_id FROM fact_sales WHERE sku = $1) \
             GROUP BY order_id \
         ), refund_allocated AS ( \
             SELECT pos.product_id, \
                    SUM(COALESCE(orf.refund_amount, 0) * CASE \
                        WHEN os.total_order_sales > 0 \
                        THEN pos.product_sales_in_order / os.total_order_sales \
                        ELSE 0 END) AS refund \
             FROM product_order_sales pos \
             LEFT JOIN order_sales os ON os.order_id = pos.order_id \
             LEFT JOIN order_refunds orf ON orf.order_id = pos.order_id \
             GROUP BY pos.product_id \
         ), order_fees AS ( \
             SELECT order_id, SUM(ABS(COALESCE(fees_and_taxes, 0))) AS fee_amount \
             FROM fact_financial_transactions \
             WHERE fees_and_taxes IS NOT NULL \
               AND order_id IN (SELECT DISTINCT order_id FROM fact_sales WHERE sku = $1) \
               AND {fee_filter} \
             GROUP BY order_id \
         ), fee_allocated AS ( \
             SELECT pos.product_id, \
                    SUM(COALESCE(ofe.fee_amount, 0) * CASE \
                        WHEN os.total_order_sales > 0 \
                        THEN pos.product_sales_in_order / os.total_order_sales \
                        ELSE 0 END) AS etsy_fee \
             FROM product_order_sales pos \
             LEFT JOIN order_sales os ON os.order_id = pos.order_id \
             LEFT JOIN order_fees ofe ON ofe.order_id = pos.order_id \
             GROUP BY pos.product_id \
         ), cogs_agg AS ( \
             SELECT fbt.parsed_variant_id AS variant_id, \
                    SUM(COALESCE(fbt.debit_amount, 0)) AS cogs \
             FROM fact_bank_transactions fbt \
             WHERE fbt.parsed_product_id = $1 \
               AND fbt.pl_account_number IN ('6211','6221','6222','6223','6224','6225') \
               AND fbt.debit_amount IS NOT NULL \
             GROUP BY fbt.parsed_variant_id \
         ) \
         SELECT DISTINCT pc.variant_name AS variant, \
                COALESCE(sa.sales, 0) AS sales, \
                COALESCE(sa.unit, 0)::int AS unit, \
                COALESCE(ra.refund, 0) AS refund, \
                COALESCE(ca.cogs, 0) AS cogs, \
                COALESCE(fa.etsy_fee, 0) AS etsy_fee \
         FROM dim_product_catalog pc \
         LEFT JOIN sales_agg sa ON sa.product_id = pc.product_id \
         LEFT JOIN refund_allocated ra ON ra.product_id = pc.product_id \
         LEFT JOIN fee_allocated fa ON fa.product_id = pc.product_id \
         LEFT JOIN cogs_agg ca ON ca.variant_id = pc.variant_id \
         WHERE pc.product_id = $1 AND pc.variant_name IS NOT NULL \
         ORDER BY pc.variant_name",
        fee_filter = ETSY_FEE_FILTER,
    );

    sqlx::query_as::<_, VariantRow>(&sql)
        .bind(product_id)
        .fetch_all(pool)
        .await
        .context("product variants query failed")
}

pub async fn cogs_breakdown(pool: &PgPool, product_id: &str) -> Result<Vec<LabeledCogsRow>> {
    let rows = sqlx::query_as::<_, CogsBreakdownRow>(
        "SELECT fbt.pl_account_number, SUM(fbt.debit_amount) AS amount \
         FROM fact_bank_transactions fbt \
         WHERE fbt.parsed_product_id = $1 \
           AND fbt.pl_account_number IN ( \
               '6211','6221','6222','6223','6224','6225', \
               '6273', '6411','6412','6413','6414', '6421','6428') \
           AND fbt.debit_amount IS NOT NULL \
         GROUP BY fbt.pl_account_number \
         ORDER BY fbt.pl_account_number",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await
    .context("cogs breakdown query failed")?;

    Ok(rows
        .into_iter()
        .map(|row| LabeledCogsRow {
            label: cogs_account_label(&row.pl_account_number).to_string(),
            account: row.pl_account_number,
            amount: row.amount,
        })
        .collect())
}

pub async fn etsy_fee_breakdown(pool: &PgPool, product_id: &str) -> Result<Vec<FeeBreakdownRow>> {
    let sql = format!(
        "WITH order_sales AS ( \
             SELECT order_id, SUM(COALESCE(price, 0)) AS total_order_sales \
             FROM fact_sales WHERE sku = $1 GROUP BY order_id \
         ), product_order_sales AS ( \
             SELECT fs.order_id, fs.sku AS product_id, \
                    SUM(COALESCE(fs.price, 0)) AS product_sales_in_order \
             FROM fact_sales fs WHERE fs.sku = $1 GROUP BY fs.order_id, fs.sku \
         ), fees_with_type AS ( \
             SELECT fft.order_id, fft.fees_and_taxes, \
                    CASE \
                        WHEN fft.transaction_type = 'Fee' AND fft.transaction_title ILIKE '%Transaction fee%' THEN 'Transaction Fee' \
                        WHEN fft.transaction_type = 'Fee' AND fft.transaction_title ILIKE '%Processing fee%' THEN 'Processing Fee' \
                        WHEN fft.transaction_type = 'Fee' AND fft.transaction_title ILIKE '%Regulatory Operating fee%' THEN 'Regulatory Operating Fee' \
                        WHEN fft.transaction_type = 'Fee' AND fft.transaction_title ILIKE '%Listing fee%' THEN 'Listing Fee' \
                        WHEN fft.transaction_type = 'Marketing' THEN 'Marketing' \
                        WHEN fft.transaction_type = 'VAT' AND fft.transaction_title ILIKE '%auto-renew sold%' THEN 'VAT - auto-renew sold' \
                        WHEN fft.transaction_type = 'VAT' AND fft.transaction_title ILIKE '%shipping_transaction%' THEN 'VAT - shipping_transaction' \
                        WHEN fft.transaction_type = 'VAT' AND fft.transaction_title ILIKE '%Processing Fee%' THEN 'VAT - Processing Fee' \
                        WHEN fft.transaction_type = 'VAT' AND fft.transaction_title ILIKE '%transaction credit%' THEN 'VAT - transaction credit' \
                        WHEN fft.transaction_type = 'VAT' AND fft.transaction_title ILIKE '%listing credit%' THEN 'VAT - listing credit' \
                        WHEN fft.transaction_type = 'VAT' AND fft.transaction_title ILIKE '%listing%' THEN 'VAT - listing' \
                        WHEN fft.transaction_type = 'VAT' AND fft.transaction_title ILIKE '%Etsy Plus subscription%' THEN 'VAT - Etsy Plus subscription' \
                        WHEN fft.transaction_type = 'VAT' THEN 'VAT - Other' \
                        ELSE NULL \
                    END AS fee_type \
             FROM fact_financial_transactions fft \
             WHERE fft.fees_and_taxes IS NOT NULL \
               AND fft.order_id IN (SELECT DISTINCT order_id FROM fact_sales WHERE sku = $1) \
               AND {fee_filter} \
         ), order_fees_by_type AS ( \
             SELECT order_id, fee_type, SUM(ABS(COALESCE(fees_and_taxes, 0))) AS fee_amount \
             FROM fees_with_type WHERE fee_type IS NOT NULL GROUP BY order_id, fee_type \
         ), fee_allocated_by_type AS ( \
             SELECT pos.product_id, oft.fee_type, \
                    SUM(COALESCE(oft.fee_amount, 0) * CASE \
                        WHEN os.total_order_sales > 0 \
                        THEN pos.product_sales_in_order / os.total_order_sales \
                        ELSE 0 END) AS amount \
             FROM product_order_sales pos \
             LEFT JOIN order_sales os ON os.order_id = pos.order_id \
             LEFT JOIN order_fees_by_type oft ON oft.order_id = pos.order_id \
             WHERE oft.fee_type IS NOT NULL \
             GROUP BY pos.product_id, oft.fee_type \
         ) \
         SELECT fee_type, SUM(amount) AS amount \
         FROM fee_allocated_by_type \
         GROUP BY fee_type \
         HAVING SUM(amount) > 0 \
         ORDER BY CASE fee_type \
             WHEN 'Transaction Fee' THEN 1 \
             WHEN 'Processing Fee' THEN 2 \
             WHEN 'Regulatory Operating Fee' THEN 3 \
             WHEN 'Listing Fee' THEN 4 \
             WHEN 'Marketing' THEN 5 \
             WHEN 'VAT - auto-renew sold' THEN 6 \
             WHEN 'VAT - shipping_transaction' THEN 7 \
             WHEN 'VAT - Processing Fee' THEN 8 \
             WHEN 'VAT - transaction credit' THEN 9 \
             WHEN 'VAT - listing credit' THEN 10 \
             WHEN 'VAT - listing' THEN 11 \
             WHEN 'VAT - Etsy Plus subscription' THEN 12 \
             WHEN 'VAT - Other' THEN 13 \
             ELSE 99 END",
        fee_filter = ETSY_FEE_FILTER,
    );

    sqlx::query_as::<_, FeeBreakdownRow>(&sql)
        .bind(product_id)
        .fetch_all(pool)
        .await
        .context("etsy fee breakdown query failed")
}

/// Per-order margin for one product: the product's slice of each order's
/// sales, refunds and fees, with COGS joined by parsed product id.
pub async fn margin_breakdown(pool: &PgPool, product_id: &str) -> Result<Vec<MarginRow>> {
    let sql = format!(
        "WITH order_sales AS ( \
             SELECT order_id, SUM(COALESCE(price, 0)) AS total_order_sales \
             FROM fact_sales WHERE sku = $1 GROUP BY order_id \
         ), product_order_sales AS ( \
             SELECT fs.order_id, fs.sku AS product_id, \
                    SUM(COALESCE(fs.price, 0)) AS product_sales_in_order \
             FROM fact_sales fs WHERE fs.sku = $1 GROUP BY fs.order_id, fs.sku \
         ), order_refunds AS ( \
             SELECT order_id, SUM(ABS(COALESCE(amount, 0))) AS refund_amount \
             FROM fact_financial_transactions \
             WHERE transaction_type = 'Refund' \
               AND order_id IN (SELECT DISTINCT order_id FROM fact_sales WHERE sku = $1) \
             GROUP BY order_id \
         ), order_fees AS ( \
             SELECT order_id, SUM(ABS(COALESCE(fees_and_taxes, 0))) AS fee_amount \
             FROM fact_financial_transactions \
             WHERE fees_and_taxes IS NOT NULL \
               AND order_id IN (SELECT DISTINCT order_id FROM fact_sales WHERE sku = $1) \
               AND {fee_filter} \
             GROUP BY order_id \
         ), product_cogs_by_order AS ( \
             SELECT fs.order_id, SUM(COALESCE(fbt.debit_amount, 0)) AS cogs_amount \
             FROM fact_sales fs \
             JOIN fact_bank_transactions fbt ON fbt.parsed_product_id = fs.sku \
             WHERE fs.sku = $1 \
               AND fbt.pl_account_number IN ('6211','6221','6222','6223','6224','6225') \
               AND fbt.debit_amount IS NOT NULL \
             GROUP BY fs.order_id \
         ), order_margins AS ( \
             SELECT pos.order_id, \
                    pos.product_sales_in_order AS sales, \
                    CASE WHEN os.total_order_sales > 0 \
                         THEN (pos.product_sales_in_order / os.total_order_sales) * 100 \
                         ELSE 0 END AS sales_percent, \
                    COALESCE(orf.refund_amount * CASE \
                        WHEN os.total_order_sales > 0 \
                        THEN pos.product_sales_in_order / os.total_order_sales \
                        ELSE 0 END, 0) AS refund, \
                    COALESCE(pco.cogs_amount, 0) AS cogs, \
                    COALESCE(ofe.fee_amount * CASE \
                        WHEN os.total_order_sales > 0 \
                        THEN pos.product_sales_in_order / os.total_order_sales \
                        ELSE 0 END, 0) AS etsy_fee \
             FROM product_order_sales pos \
             LEFT JOIN order_sales os ON os.order_id = pos.order_id \
             LEFT JOIN order_refunds orf ON orf.order_id = pos.order_id \
             LEFT JOIN order_fees ofe ON ofe.order_id = pos.order_id \
             LEFT JOIN product_cogs_by_order pco ON pco.order_id = pos.order_id \
         ) \
         SELECT order_id::text AS order_id, sales, sales_percent, refund, cogs, etsy_fee, \
                sales - refund - cogs - etsy_fee AS profit, \
                CASE WHEN sales > 0 \
                     THEN ((sales - refund - cogs - etsy_fee) / sales) * 100 \
                     ELSE 0 END AS margin_percent \
         FROM order_margins \
         ORDER BY order_id",
        fee_filter = ETSY_FEE_FILTER,
    );

    sqlx::query_as::<_, MarginRow>(&sql)
        .bind(product_id)
        .fetch_all(pool)
        .await
        .context("margin breakdown query failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn pro_rata_shares_sum_to_order_amount() {
        let order_amount = dec("30");
        let order_sales = dec("100");
        let a = allocate_pro_rata(order_amount, dec("25"), order_sales);
        let b = allocate_pro_rata(order_amount, dec("75"), order_sales);
        assert_eq!(a, dec("7.5"));
        assert_eq!(b, dec("22.5"));
        assert_eq!(a + b, order_amount);
    }

    #[test]
    fn pro_rata_zero_order_sales_allocates_nothing() {
        assert_eq!(
            allocate_pro_rata(dec("30"), dec("0"), dec("0")),
            Decimal::ZERO
        );
    }

    #[test]
    fn cogs_labels_cover_all_pl_accounts() {
        for account in crate::etl::clean::ALLOWED_PL_ACCOUNTS {
            assert_ne!(cogs_account_label(account), *account, "{account}");
        }
        assert_eq!(cogs_account_label("9999"), "9999");
    }

    #[test]
    fn fee_filter_covers_each_fee_family() {
        assert!(ETSY_FEE_FILTER.contains("'Fee'"));
        assert!(ETSY_FEE_FILTER.contains("'Marketing'"));
        assert!(ETSY_FEE_FILTER.contains("'VAT'"));
        assert!(ETSY_FEE_FILTER.contains("%Regulatory Operating fee%"));
    }
}
