//! Star-schema row types shared by the ETL builders and the repository

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Dimensions
// ---------------------------------------------------------------------------

/// One calendar day. `time_key` is the YYYYMMDD integer every fact joins on.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DimTimeRow {
    pub time_key: i32,
    pub full_date: NaiveDate,
    pub year: i32,
    pub quarter: i32,
    pub month: i32,
    pub week_of_year: i32,
    pub day_of_month: i32,
    pub day_of_week: i32,
    pub day_of_year: i32,
    pub month_name: String,
    pub day_name: String,
    pub quarter_name: String,
    pub is_weekend: bool,
    pub is_peak_season: bool,
    pub selling_season: String,
}

/// Products merged from listings and sold order items (SCD type 2).
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct DimProductRow {
    pub product_key: i64,
    pub product_name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub sku: Option<String>,
    pub tags: Option<String>,
    pub materials: Option<String>,
    pub is_current: bool,
    pub effective_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
}

/// Buyers keyed by username, falling back to the shipping full name (SCD2).
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct DimCustomerRow {
    pub customer_key: i64,
    pub customer_id: String,
    pub buyer_username: Option<String>,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub order_count: i32,
    pub total_spent: Option<Decimal>,
    pub first_order_date: Option<NaiveDate>,
    pub last_order_date: Option<NaiveDate>,
    pub is_current: bool,
    pub effective_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct DimGeographyRow {
    pub geography_key: i64,
    pub country_name: Option<String>,
    pub state_name: Option<String>,
    pub city_name: Option<String>,
    pub zipcode: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct DimOrderRow {
    pub order_key: i64,
    pub order_id: String,
    pub order_date: Option<NaiveDate>,
    pub order_type: Option<String>,
    pub payment_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct DimPaymentRow {
    pub payment_key: i64,
    pub payment_method: Option<String>,
    pub payment_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct DimBankAccountRow {
    pub bank_account_key: i64,
    pub account_number: Option<String>,
    pub account_name: Option<String>,
    pub cif_number: Option<String>,
    pub customer_address: Option<String>,
    pub opening_date: Option<NaiveDate>,
    pub currency_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct DimProductCatalogRow {
    pub product_catalog_key: i64,
    pub product_line_id: Option<String>,
    pub product_name: Option<String>,
    pub product_id: Option<String>,
    pub variant_id: Option<String>,
    pub variant_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Facts
// ---------------------------------------------------------------------------

/// One sold order item. Surrogate foreign keys stay NULL when the natural id
/// never showed up in the corresponding dimension input.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct FactSalesRow {
    pub time_key: Option<i32>,
    pub product_key: Option<i64>,
    pub order_key: Option<i64>,
    pub customer_key: Option<i64>,
    pub geography_key: Option<i64>,
    pub payment_key: Option<i64>,
    pub order_id: Option<String>,
    pub listing_id: Option<String>,
    pub transaction_id: Option<String>,
    pub item_name: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub item_total: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    pub order_shipping: Option<Decimal>,
    pub shipping_discount: Option<Decimal>,
    pub order_sales_tax: Option<Decimal>,
    pub sku: Option<String>,
}

/// One Etsy statement line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct FactFinancialTransactionRow {
    pub transaction_date_key: Option<i32>,
    pub customer_key: Option<i64>,
    pub order_key: Option<i64>,
    pub transaction_type: Option<String>,
    pub transaction_title: Option<String>,
    pub info: Option<String>,
    pub order_id: Option<String>,
    pub transaction_id: Option<String>,
    pub currency: Option<String>,
    pub amount: Option<Decimal>,
    pub fees_and_taxes: Option<Decimal>,
    pub net_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct FactDepositRow {
    pub deposit_date_key: Option<i32>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub status: Option<String>,
    pub bank_account_ending: Option<String>,
}

/// One direct-checkout payment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct FactPaymentRow {
    pub payment_date_key: Option<i32>,
    pub customer_key: Option<i64>,
    pub order_key: Option<i64>,
    pub payment_id: Option<String>,
    pub order_id: Option<String>,
    pub gross_amount: Option<Decimal>,
    pub fees: Option<Decimal>,
    pub net_amount: Option<Decimal>,
    pub posted_gross: Option<Decimal>,
    pub posted_fees: Option<Decimal>,
    pub posted_net: Option<Decimal>,
    pub adjusted_gross: Option<Decimal>,
    pub adjusted_fees: Option<Decimal>,
    pub adjusted_net: Option<Decimal>,
    pub exchange_rate: Option<Decimal>,
    pub vat_amount: Option<Decimal>,
    pub refund_amount: Option<Decimal>,
    pub payment_type: Option<String>,
    pub order_type: Option<String>,
}

/// One bank-statement movement with the parsed product reference attached.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct FactBankTransactionRow {
    pub transaction_date_key: Option<i32>,
    pub bank_account_key: Option<i64>,
    pub product_catalog_key: Option<i64>,
    pub reference_number: Option<String>,
    pub transaction_description: Option<String>,
    pub credit_amount: Option<Decimal>,
    pub debit_amount: Option<Decimal>,
    pub balance_after_transaction: Option<Decimal>,
    pub currency_code: Option<String>,
    pub pl_account_number: Option<String>,
    pub parsed_product_line_id: Option<String>,
    pub parsed_product_id: Option<String>,
    pub parsed_variant_id: Option<String>,
}
