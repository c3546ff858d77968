//! Cleaning rules for the raw Etsy and bank exports
//! Money strings lose separators and currency symbols, VND statement amounts
//! convert to USD at the configured rate, dates parse per source format, and
//! bank descriptions yield product and P&L account references.

use std::sync::OnceLock;

use chrono::NaiveDate;
use log::warn;
use regex::Regex;
use rust_decimal::Decimal;

use crate::etl::loader::RawTable;
use crate::etl::records::*;

/// P&L accounts accepted from bank descriptions. Anything else is noise.
pub const ALLOWED_PL_ACCOUNTS: &[&str] = &[
    "6211", "6221", "6222", "6223", "6224", "6225", "6273", "6411", "6412", "6413", "6414", "6421",
    "6428",
];

fn money_symbol_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[₫đ$€£]").unwrap())
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-?\d+(\.\d+)?").unwrap())
}

/// Parse a currency-ish string. Handles "₫1,234.5", "-₫5", "(3.20)".
pub fn clean_money(value: &str) -> Option<Decimal> {
    let s = value.trim();
    if s.is_empty() || s == "--" || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("none") {
        return None;
    }
    let s = s.replace(',', "");
    let s = money_symbol_re().replace_all(&s, "");
    let s = s.replace('(', "-").replace(')', "");
    let s = s.trim();
    if let Ok(d) = s.parse::<Decimal>() {
        return Some(d);
    }
    number_re()
        .find(s)
        .and_then(|m| m.as_str().parse::<Decimal>().ok())
}

/// Parse a date trying each format in order.
pub fn parse_date(value: &str, formats: &[&str]) -> Option<NaiveDate> {
    let s = value.trim();
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Integer YYYYMMDD key for dim_time joins.
pub fn time_key(date: NaiveDate) -> i32 {
    use chrono::Datelike;
    date.year() * 10_000 + date.month() as i32 * 100 + date.day() as i32
}

/// Best-effort id extraction from the statement Info column.
pub fn extract_statement_id(info: &str) -> Option<(String, IdKind)> {
    static ORDER: OnceLock<Regex> = OnceLock::new();
    static LISTING: OnceLock<Regex> = OnceLock::new();
    static TRANSACTION: OnceLock<Regex> = OnceLock::new();
    let order = ORDER.get_or_init(|| {
        Regex::new(r"(?i)(order|order id|#)\s*[:#]?\s*(\d+)").unwrap()
    });
    let listing = LISTING.get_or_init(|| {
        Regex::new(r"(?i)(listing|listing id)\s*[:#]?\s*(\d+)").unwrap()
    });
    let transaction = TRANSACTION.get_or_init(|| {
        Regex::new(r"(?i)(transaction|transaction id)\s*[:#]?\s*(\d+)").unwrap()
    });

    if let Some(caps) = order.captures(info) {
        return Some((caps[2].to_string(), IdKind::Order));
    }
    if let Some(caps) = listing.captures(info) {
        return Some((caps[2].to_string(), IdKind::Listing));
    }
    if let Some(caps) = transaction.captures(info) {
        return Some((caps[2].to_string(), IdKind::Transaction));
    }
    None
}

/// Product references parsed out of a bank transaction description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDescription {
    pub pl_account_number: Option<String>,
    pub product_line_id: Option<String>,
    pub product_id: Option<String>,
    pub variant_id: Option<String>,
}

/// Pattern: `{line}_{product}_{variant}[ NNNN]`, e.g.
/// "DEF_MG01107417_03 6221 Ck mua yarn". The trailing 4-digit code is only
/// kept when it is a whitelisted P&L account.
pub fn parse_bank_description(description: &str) -> ParsedDescription {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?i)([A-Z0-9]+)_([A-Z0-9]+)_([A-Z0-9]+)(?:\s+(\d{4}))?").unwrap()
    });

    let mut parsed = ParsedDescription::default();
    let Some(caps) = re.captures(description) else {
        return parsed;
    };
    parsed.product_line_id = Some(caps[1].to_uppercase());
    parsed.product_id = Some(caps[2].to_uppercase());
    parsed.variant_id = Some(caps[3].to_string());
    if let Some(account) = caps.get(4) {
        if ALLOWED_PL_ACCOUNTS.contains(&account.as_str()) {
            parsed.pl_account_number = Some(account.as_str().to_string());
        }
    }
    parsed
}

fn convert_vnd(amount: Option<Decimal>, is_vnd: bool, rate: Decimal) -> Option<Decimal> {
    match amount {
        Some(a) if is_vnd && !rate.is_zero() => Some((a / rate).round_dp(2)),
        other => other,
    }
}

fn owned(v: Option<&str>) -> Option<String> {
    v.map(|s| s.to_string())
}

// ---------------------------------------------------------------------------
// Per-dataset cleaners
// ---------------------------------------------------------------------------

pub fn clean_statement(table: &RawTable, exchange_rate: Decimal) -> Vec<StatementRow> {
    let date_col = table.column("Date");
    let type_col = table.column("Type");
    let title_col = table.column("Title");
    let info_col = table.column("Info");
    let currency_col = table.column("Currency");
    let amount_col = table.column("Amount");
    let fees_col = table.column("Fees & Taxes");
    let net_col = table.column("Net");

    table
        .rows()
        .iter()
        .map(|row| {
            let currency = owned(table.value(row, currency_col));
            let is_vnd = currency
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case("VND"));
            let info = owned(table.value(row, info_col));
            let (extracted_id, id_kind) = info
                .as_deref()
                .and_then(extract_statement_id)
                .map(|(id, kind)| (Some(id), Some(kind)))
                .unwrap_or((None, None));
            StatementRow {
                date: table
                    .value(row, date_col)
                    .and_then(|v| parse_date(v, &["%B %d, %Y"])),
                transaction_type: owned(table.value(row, type_col)),
                title: owned(table.value(row, title_col)),
                info,
                currency: if is_vnd { Some("USD".to_string()) } else { currency },
                amount: convert_vnd(
                    table.value(row, amount_col).and_then(clean_money),
                    is_vnd,
                    exchange_rate,
                ),
                fees_and_taxes: convert_vnd(
                    table.value(row, fees_col).and_then(clean_money),
                    is_vnd,
                    exchange_rate,
                ),
                net: convert_vnd(
                    table.value(row, net_col).and_then(clean_money),
                    is_vnd,
                    exchange_rate,
                ),
                extracted_id,
                id_kind,
            }
        })
        .collect()
}

pub fn clean_deposits(table: &RawTable, exchange_rate: Decimal) -> Vec<DepositRow> {
    let date_col = table.column("Date");
    let amount_col = table.column("Amount");
    let currency_col = table.column("Currency");
    let status_col = table.column("Status");
    let bank_col = table.column("Bank Account Ending Digits");

    table
        .rows()
        .iter()
        .map(|row| {
            let currency = owned(table.value(row, currency_col));
            let is_vnd = currency
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case("VND"));
            DepositRow {
                date: table
                    .value(row, date_col)
                    .and_then(|v| parse_date(v, &["%B %d, %Y"])),
                amount: convert_vnd(
                    table.value(row, amount_col).and_then(clean_money),
                    is_vnd,
                    exchange_rate,
                ),
                currency: if is_vnd { Some("USD".to_string()) } else { currency },
                status: owned(table.value(row, status_col)),
                bank_account: owned(table.value(row, bank_col)),
            }
        })
        .collect()
}

pub fn clean_direct_checkout(table: &RawTable) -> Vec<DirectCheckoutRow> {
    let money = |row: &[String], idx: Option<usize>| table.value(row, idx).and_then(clean_money);
    let payment_id_col = table.column("Payment ID");
    let username_col = table.column("Buyer Username");
    let buyer_name_col = table.column("Buyer Name");
    let order_id_col = table.column("Order ID");
    let gross_col = table.column("Gross Amount");
    let fees_col = table.column("Fees");
    let net_col = table.column("Net Amount");
    let posted_gross_col = table.column("Posted Gross");
    let posted_fees_col = table.column("Posted Fees");
    let posted_net_col = table.column("Posted Net");
    let adj_gross_col = table.column("Adjusted Gross");
    let adj_fees_col = table.column("Adjusted Fees");
    let adj_net_col = table.column("Adjusted Net");
    let currency_col = table.column("Currency");
    let rate_col = table.column("Exchange Rate");
    let vat_col = table.column("VAT Amount");
    let refund_col = table.column("Refund Amount");
    let order_date_col = table.column("Order Date");
    let buyer_col = table.column("Buyer");
    let order_type_col = table.column("Order Type");
    let payment_type_col = table.column("Payment Type");
    let status_col = table.column("Status");

    table
        .rows()
        .iter()
        .map(|row| DirectCheckoutRow {
            payment_id: owned(table.value(row, payment_id_col)),
            buyer_username: owned(table.value(row, username_col)),
            buyer_name: owned(table.value(row, buyer_name_col))
                .or_else(|| owned(table.value(row, buyer_col))),
            order_id: owned(table.value(row, order_id_col)),
            gross_amount: money(row, gross_col),
            fees: money(row, fees_col),
            net_amount: money(row, net_col),
            posted_gross: money(row, posted_gross_col),
            posted_fees: money(row, posted_fees_col),
            posted_net: money(row, posted_net_col),
            adjusted_gross: money(row, adj_gross_col),
            adjusted_fees: money(row, adj_fees_col),
            adjusted_net: money(row, adj_net_col),
            currency: owned(table.value(row, currency_col)),
            exchange_rate: money(row, rate_col),
            vat_amount: money(row, vat_col),
            refund_amount: money(row, refund_col),
            order_date: table
                .value(row, order_date_col)
                .and_then(|v| parse_date(v, &["%m/%d/%Y", "%m/%d/%y"])),
            order_type: owned(table.value(row, order_type_col)),
            payment_type: owned(table.value(row, payment_type_col)),
            status: owned(table.value(row, status_col)),
        })
        .collect()
}

pub fn clean_listing(table: &RawTable) -> Vec<ListingRow> {
    let title_col = table.column("TITLE");
    let description_col = table.column("DESCRIPTION");
    let price_col = table.column("PRICE");
    let currency_col = table.column("CURRENCY_CODE");
    let quantity_col = table.column("QUANTITY");
    let tags_col = table.column("TAGS");
    let materials_col = table.column("MATERIALS");
    let sku_col = table.column("SKU");

    table
        .rows()
        .iter()
        .map(|row| ListingRow {
            title: owned(table.value(row, title_col)),
            description: owned(table.value(row, description_col)),
            price: table.value(row, price_col).and_then(clean_money),
            currency_code: owned(table.value(row, currency_col)),
            quantity: table
                .value(row, quantity_col)
                .and_then(|v| v.parse::<f64>().ok())
                .map(|v| v as i32),
            tags: owned(table.value(row, tags_col)),
            materials: owned(table.value(row, materials_col)),
            sku: owned(table.value(row, sku_col)),
        })
        .collect()
}

pub fn clean_sold_orders(table: &RawTable) -> Vec<SoldOrderRow> {
    let sale_date_col = table.column("Sale Date");
    let order_id_col = table.column("Order ID");
    let full_name_col = table.column("Full Name");
    let first_name_col = table.column("First Name");
    let last_name_col = table.column("Last Name");
    let country_col = table.column("Ship Country");
    let state_col = table.column("Ship State");
    let city_col = table.column("Ship City");
    let zip_col = table.column("Ship Zipcode");
    let order_type_col = table.column("Order Type");
    let payment_method_col = table.column("Payment Method");
    let order_value_col = table.column("Order Value");

    table
        .rows()
        .iter()
        .map(|row| SoldOrderRow {
            order_id: owned(table.value(row, order_id_col)),
            sale_date: table
                .value(row, sale_date_col)
                .and_then(|v| parse_date(v, &["%m/%d/%y", "%m/%d/%Y"])),
            full_name: owned(table.value(row, full_name_col)),
            first_name: owned(table.value(row, first_name_col)),
            last_name: owned(table.value(row, last_name_col)),
            ship_country: owned(table.value(row, country_col)),
            ship_state: owned(table.value(row, state_col)),
            ship_city: owned(table.value(row, city_col)),
            ship_zipcode: owned(table.value(row, zip_col)),
            order_type: owned(table.value(row, order_type_col)),
            payment_method: owned(table.value(row, payment_method_col)),
            order_value: table.value(row, order_value_col).and_then(clean_money),
        })
        .collect()
}

pub fn clean_sold_order_items(table: &RawTable) -> Vec<SoldOrderItemRow> {
    let money = |row: &[String], idx: Option<usize>| table.value(row, idx).and_then(clean_money);
    let order_id_col = table.column("Order ID");
    let listing_id_col = table.column("Listing ID");
    let transaction_id_col = table.column("Transaction ID");
    let item_name_col = table.column("Item Name");
    let price_col = table.column("Price");
    let quantity_col = table.column("Quantity");
    let item_total_col = table.column("Item Total");
    let discount_col = table.column("Discount Amount");
    let shipping_col = table.column("Order Shipping");
    let shipping_discount_col = table.column("Shipping Discount");
    let sales_tax_col = table.column("Order Sales Tax");
    let sale_date_col = table.column("Sale Date");
    let date_paid_col = table.column("Date Paid");
    let date_shipped_col = table.column("Date Shipped");
    let sku_col = table.column("SKU");
    let variations_col = table.column("Variations");
    let country_col = table.column("Ship Country");
    let state_col = table.column("Ship State");
    let city_col = table.column("Ship City");
    let zip_col = table.column("Ship Zipcode");
    let payment_type_col = table.column("Payment Type");
    let order_type_col = table.column("Order Type");

    table
        .rows()
        .iter()
        .map(|row| SoldOrderItemRow {
            order_id: owned(table.value(row, order_id_col)),
            listing_id: table
                .value(row, listing_id_col)
                .map(normalize_numeric_id),
            transaction_id: owned(table.value(row, transaction_id_col)),
            item_name: owned(table.value(row, item_name_col)),
            price: money(row, price_col),
            quantity: table
                .value(row, quantity_col)
                .and_then(|v| v.parse::<f64>().ok())
                .map(|v| v as i32),
            item_total: money(row, item_total_col),
            discount_amount: money(row, discount_col),
            order_shipping: money(row, shipping_col),
            shipping_discount: money(row, shipping_discount_col),
            order_sales_tax: money(row, sales_tax_col),
            sale_date: table
                .value(row, sale_date_col)
                .and_then(|v| parse_date(v, &["%m/%d/%y", "%m/%d/%Y"])),
            date_paid: table
                .value(row, date_paid_col)
                .and_then(|v| parse_date(v, &["%m/%d/%Y", "%m/%d/%y"])),
            date_shipped: table
                .value(row, date_shipped_col)
                .and_then(|v| parse_date(v, &["%m/%d/%Y", "%m/%d/%y"])),
            sku: owned(table.value(row, sku_col)),
            variations: owned(table.value(row, variations_col)),
            ship_country: owned(table.value(row, country_col)),
            ship_state: owned(table.value(row, state_col)),
            ship_city: owned(table.value(row, city_col)),
            ship_zipcode: owned(table.value(row, zip_col)),
            payment_type: owned(table.value(row, payment_type_col)),
            order_type: owned(table.value(row, order_type_col)),
        })
        .collect()
}

/// Exports sometimes carry listing ids as "123456789.0"; strip the float tail.
fn normalize_numeric_id(value: &str) -> String {
    match value.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 => format!("{}", v as i64),
        _ => value.to_string(),
    }
}

pub fn clean_bank_transactions(table: &RawTable) -> Vec<BankTransactionRow> {
    // Bilingual headers: match on the English part in parentheses.
    let date_col = table.column_containing("transaction date");
    let reference_col = table.column_containing("reference");
    let account_number_col = table.column_containing("account number");
    let account_name_col = table.column_containing("account name");
    let address_col = table.column_containing("address");
    let cif_col = table.column_containing("cif");
    let opening_date_col = table.column_containing("opening date");
    let currency_col = table.column_containing("currency");
    let credit_col = table.column_containing("credit");
    let debit_col = table.column_containing("debit");
    let balance_col = table.column_containing("balance");
    let description_col = table.column_containing("description");

    if description_col.is_none() {
        warn!("bank transactions: no description column, product parsing disabled");
    }

    table
        .rows()
        .iter()
        .map(|row| {
            let description = owned(table.value(row, description_col));
            let parsed = description
                .as_deref()
                .map(parse_bank_description)
                .unwrap_or_default();
            BankTransactionRow {
                transaction_date: table
                    .value(row, date_col)
                    .and_then(|v| parse_date(v, &["%d/%m/%Y"])),
                reference_number: owned(table.value(row, reference_col)),
                account_number: owned(table.value(row, account_number_col)),
                account_name: owned(table.value(row, account_name_col)),
                customer_address: owned(table.value(row, address_col)),
                cif_number: owned(table.value(row, cif_col)),
                opening_date: table
                    .value(row, opening_date_col)
                    .and_then(|v| parse_date(v, &["%d/%m/%Y"])),
                currency_code: owned(table.value(row, currency_col)),
                credit_amount: table.value(row, credit_col).and_then(clean_money),
                debit_amount: table.value(row, debit_col).and_then(clean_money),
                balance_after_transaction: table.value(row, balance_col).and_then(clean_money),
                transaction_description: description,
                pl_account_number: parsed.pl_account_number,
                parsed_product_line_id: parsed.product_line_id,
                parsed_product_id: parsed.product_id,
                parsed_variant_id: parsed.variant_id,
            }
        })
        .collect()
}

pub fn clean_product_catalog(table: &RawTable) -> Vec<ProductCatalogRow> {
    let line_id_col = table.column("Product line ID");
    let product_name_col = table.column("Product");
    let product_id_col = table.column("Product ID");
    let variant_id_col = table.column("Variant ID");
    let variant_name_col = table.column("Variants");

    table
        .rows()
        .iter()
        .map(|row| ProductCatalogRow {
            product_line_id: owned(table.value(row, line_id_col)),
            product_name: owned(table.value(row, product_name_col)),
            product_id: owned(table.value(row, product_id_col)),
            variant_id: owned(table.value(row, variant_id_col)),
            variant_name: owned(table.value(row, variant_name_col)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn clean_money_handles_vnd_symbols_and_signs() {
        assert_eq!(clean_money("₫1,234"), Some(dec("1234")));
        assert_eq!(clean_money("-₫5"), Some(dec("-5")));
        assert_eq!(clean_money("đ12.50"), Some(dec("12.50")));
        assert_eq!(clean_money("(3.20)"), Some(dec("-3.20")));
        assert_eq!(clean_money("12.34"), Some(dec("12.34")));
        assert_eq!(clean_money("--"), None);
        assert_eq!(clean_money(""), None);
    }

    #[test]
    fn statement_dates_use_long_month_format() {
        assert_eq!(
            parse_date("January 5, 2025", &["%B %d, %Y"]),
            NaiveDate::from_ymd_opt(2025, 1, 5)
        );
        assert_eq!(parse_date("not a date", &["%B %d, %Y"]), None);
    }

    #[test]
    fn time_key_is_yyyymmdd() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(time_key(d), 20250307);
    }

    #[test]
    fn statement_id_extraction_prefers_order() {
        assert_eq!(
            extract_statement_id("Order #3544212345"),
            Some(("3544212345".to_string(), IdKind::Order))
        );
        assert_eq!(
            extract_statement_id("Listing: 987654"),
            Some(("987654".to_string(), IdKind::Listing))
        );
        assert_eq!(
            extract_statement_id("transaction 555000"),
            Some(("555000".to_string(), IdKind::Transaction))
        );
        assert_eq!(extract_statement_id("Etsy Plus subscription"), None);
    }

    #[test]
    fn description_parser_extracts_product_and_account() {
        let parsed = parse_bank_description("DEF_MG01107417_03 6221 Ck mua yarn");
        assert_eq!(parsed.product_line_id.as_deref(), Some("DEF"));
        assert_eq!(parsed.product_id.as_deref(), Some("MG01107417"));
        assert_eq!(parsed.variant_id.as_deref(), Some("03"));
        assert_eq!(parsed.pl_account_number.as_deref(), Some("6221"));
    }

    #[test]
    fn description_parser_drops_non_whitelisted_account() {
        let parsed = parse_bank_description("ABC_X1_02 9999 something");
        assert_eq!(parsed.product_id.as_deref(), Some("X1"));
        assert_eq!(parsed.pl_account_number, None);
    }

    #[test]
    fn description_parser_handles_bare_pattern_and_noise() {
        let parsed = parse_bank_description("1_1_1");
        assert_eq!(parsed.product_line_id.as_deref(), Some("1"));
        assert_eq!(parsed.pl_account_number, None);

        let none = parse_bank_description("salary transfer");
        assert_eq!(none, ParsedDescription::default());
    }

    #[test]
    fn vnd_statement_amounts_convert_to_usd() {
        use crate::etl::loader::RawTable;
        let table = RawTable::from_parts(
            vec![
                "Date".into(),
                "Type".into(),
                "Title".into(),
                "Info".into(),
                "Currency".into(),
                "Amount".into(),
                "Fees & Taxes".into(),
                "Net".into(),
            ],
            vec![vec![
                "January 5, 2025".into(),
                "Sale".into(),
                "Order".into(),
                "Order #101".into(),
                "VND".into(),
                "₫247,086.55".into(),
                "--".into(),
                "₫247,086.55".into(),
            ]],
        );
        let rows = clean_statement(&table, dec("24708.655"));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].currency.as_deref(), Some("USD"));
        assert_eq!(rows[0].amount, Some(dec("10.00")));
        assert_eq!(rows[0].fees_and_taxes, None);
        assert_eq!(rows[0].extracted_id.as_deref(), Some("101"));
        assert_eq!(rows[0].id_kind, Some(IdKind::Order));
    }

    #[test]
    fn listing_id_float_tail_is_stripped() {
        assert_eq!(normalize_numeric_id("123456789.0"), "123456789");
        assert_eq!(normalize_numeric_id("123456789"), "123456789");
        assert_eq!(normalize_numeric_id("SKU-1"), "SKU-1");
    }
}
