//! Cleaned row types, one struct per raw Etsy export file

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What a statement `Info` reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdKind {
    Order,
    Listing,
    Transaction,
}

/// One line of the Etsy statement export (etsy_statement_*.csv).
#[derive(Debug, Clone, Default)]
pub struct StatementRow {
    pub date: Option<NaiveDate>,
    pub transaction_type: Option<String>,
    pub title: Option<String>,
    pub info: Option<String>,
    pub currency: Option<String>,
    pub amount: Option<Decimal>,
    pub fees_and_taxes: Option<Decimal>,
    pub net: Option<Decimal>,
    pub extracted_id: Option<String>,
    pub id_kind: Option<IdKind>,
}

/// One row of EtsyDeposits*.csv.
#[derive(Debug, Clone, Default)]
pub struct DepositRow {
    pub date: Option<NaiveDate>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub status: Option<String>,
    pub bank_account: Option<String>,
}

/// One row of EtsyDirectCheckoutPayments*.csv.
#[derive(Debug, Clone, Default)]
pub struct DirectCheckoutRow {
    pub payment_id: Option<String>,
    pub buyer_username: Option<String>,
    pub buyer_name: Option<String>,
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
    pub currency: Option<String>,
    pub exchange_rate: Option<Decimal>,
    pub vat_amount: Option<Decimal>,
    pub refund_amount: Option<Decimal>,
    pub order_date: Option<NaiveDate>,
    pub order_type: Option<String>,
    pub payment_type: Option<String>,
    pub status: Option<String>,
}

/// One row of EtsyListingsDownload.csv.
#[derive(Debug, Clone, Default)]
pub struct ListingRow {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub currency_code: Option<String>,
    pub quantity: Option<i32>,
    pub tags: Option<String>,
    pub materials: Option<String>,
    pub sku: Option<String>,
}

/// One row of EtsySoldOrders*.csv.
#[derive(Debug, Clone, Default)]
pub struct SoldOrderRow {
    pub order_id: Option<String>,
    pub sale_date: Option<NaiveDate>,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub ship_country: Option<String>,
    pub ship_state: Option<String>,
    pub ship_city: Option<String>,
    pub ship_zipcode: Option<String>,
    pub order_type: Option<String>,
    pub payment_method: Option<String>,
    pub order_value: Option<Decimal>,
}

/// One row of EtsySoldOrderItems*.csv.
#[derive(Debug, Clone, Default)]
pub struct SoldOrderItemRow {
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
    pub sale_date: Option<NaiveDate>,
    pub date_paid: Option<NaiveDate>,
    pub date_shipped: Option<NaiveDate>,
    pub sku: Option<String>,
    pub variations: Option<String>,
    pub ship_country: Option<String>,
    pub ship_state: Option<String>,
    pub ship_city: Option<String>,
    pub ship_zipcode: Option<String>,
    pub payment_type: Option<String>,
    pub order_type: Option<String>,
}

/// One row of a bank statement export, with the description already parsed.
#[derive(Debug, Clone, Default)]
pub struct BankTransactionRow {
    pub transaction_date: Option<NaiveDate>,
    pub reference_number: Option<String>,
    pub account_number: Option<String>,
    pub account_name: Option<String>,
    pub customer_address: Option<String>,
    pub cif_number: Option<String>,
    pub opening_date: Option<NaiveDate>,
    pub currency_code: Option<String>,
    pub credit_amount: Option<Decimal>,
    pub debit_amount: Option<Decimal>,
    pub balance_after_transaction: Option<Decimal>,
    pub transaction_description: Option<String>,
    pub pl_account_number: Option<String>,
    pub parsed_product_line_id: Option<String>,
    pub parsed_product_id: Option<String>,
    pub parsed_variant_id: Option<String>,
}

/// One row of the static product catalog.
#[derive(Debug, Clone, Default)]
pub struct ProductCatalogRow {
    pub product_line_id: Option<String>,
    pub product_name: Option<String>,
    pub product_id: Option<String>,
    pub variant_id: Option<String>,
    pub variant_name: Option<String>,
}
