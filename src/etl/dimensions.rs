//! Dimension builders
//! Surrogate keys are assigned sequentially per table; the natural-id lookup
//! maps are collected in [`MasterKeys`] so fact builders resolve foreign keys
//! without touching the database.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::etl::records::*;
use crate::warehouse::types::*;

/// Natural id -> surrogate key maps shared between dimension and fact builders.
#[derive(Debug, Default)]
pub struct MasterKeys {
    pub products_by_name: HashMap<String, i64>,
    pub products_by_sku: HashMap<String, i64>,
    pub customers: HashMap<String, i64>,
    pub geographies: HashMap<String, i64>,
    pub orders: HashMap<String, i64>,
    pub payments: HashMap<String, i64>,
    pub bank_accounts: HashMap<String, i64>,
    pub product_catalog: HashMap<String, i64>,
    /// order_id -> customer natural id, learned from direct checkout buyers.
    pub order_buyers: HashMap<String, String>,
}

/// Lowercase, whitespace-collapsed form used to match listings to order items.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Composite natural id for a geography row.
pub fn geography_id(
    country: Option<&str>,
    state: Option<&str>,
    city: Option<&str>,
    zipcode: Option<&str>,
) -> String {
    [country, state, city, zipcode]
        .map(|v| v.unwrap_or("").trim().to_lowercase())
        .join("|")
}

/// Composite natural id for a product catalog entry, `LINE_PRODUCT_VARIANT`.
pub fn catalog_id(line: Option<&str>, product: Option<&str>, variant: Option<&str>) -> String {
    [line, product, variant]
        .map(|v| v.unwrap_or("").trim().to_uppercase())
        .join("_")
}

fn selling_season(month: u32) -> &'static str {
    match month {
        11 | 12 => "Holiday",
        1 | 2 => "Post-Holiday",
        3..=5 => "Spring",
        6..=8 => "Summer",
        _ => "Autumn",
    }
}

/// One row per day, inclusive of both endpoints.
pub fn build_dim_time(start: NaiveDate, end: NaiveDate) -> Vec<DimTimeRow> {
    let mut rows = Vec::new();
    let mut date = start;
    while date <= end {
        let month = date.month();
        let quarter = (month as i32 - 1) / 3 + 1;
        let weekday = date.weekday();
        rows.push(DimTimeRow {
            time_key: super::clean::time_key(date),
            full_date: date,
            year: date.year(),
            quarter,
            month: month as i32,
            week_of_year: date.iso_week().week() as i32,
            day_of_month: date.day() as i32,
            day_of_week: weekday.number_from_monday() as i32,
            day_of_year: date.ordinal() as i32,
            month_name: date.format("%B").to_string(),
            day_name: date.format("%A").to_string(),
            quarter_name: format!("Q{quarter}"),
            is_weekend: weekday.number_from_monday() >= 6,
            is_peak_season: matches!(month, 11 | 12 | 1 | 2),
            selling_season: selling_season(month).to_string(),
        });
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }
    rows
}

/// Full outer join of listings and deduplicated order items on normalized
/// product name. Listings win on conflicting attributes.
pub fn build_dim_product(
    listings: Option<&[ListingRow]>,
    items: Option<&[SoldOrderItemRow]>,
    build_date: NaiveDate,
    keys: &mut MasterKeys,
) -> Vec<DimProductRow> {
    let mut rows: Vec<DimProductRow> = Vec::new();
    let mut by_name: BTreeMap<String, usize> = BTreeMap::new();

    for listing in listings.unwrap_or_default() {
        let Some(title) = listing.title.as_deref() else {
            continue;
        };
        let name = normalize_name(title);
        if by_name.contains_key(&name) {
            continue;
        }
        by_name.insert(name, rows.len());
        rows.push(DimProductRow {
            product_key: rows.len() as i64 + 1,
            product_name: listing.title.clone(),
            description: listing.description.clone(),
            price: listing.price,
            quantity: listing.quantity,
            sku: listing.sku.clone(),
            tags: listing.tags.clone(),
            materials: listing.materials.clone(),
            is_current: true,
            effective_date: Some(build_date),
            expiry_date: None,
        });
    }

    for item in items.unwrap_or_default() {
        let Some(item_name) = item.item_name.as_deref() else {
            continue;
        };
        let name = normalize_name(item_name);
        if let Some(&idx) = by_name.get(&name) {
            // Order items backfill the sku when the listing export lacks one.
            if rows[idx].sku.is_none() {
                rows[idx].sku = item.sku.clone();
            }
            continue;
        }
        by_name.insert(name, rows.len());
        rows.push(DimProductRow {
            product_key: rows.len() as i64 + 1,
            product_name: item.item_name.clone(),
            price: item.price,
            sku: item.sku.clone(),
            is_current: true,
            effective_date: Some(build_date),
            ..Default::default()
        });
    }

    for (name, idx) in &by_name {
        keys.products_by_name.insert(name.clone(), rows[*idx].product_key);
    }
    for row in &rows {
        if let Some(sku) = row.sku.as_deref() {
            keys.products_by_sku
                .entry(sku.to_string())
                .or_insert(row.product_key);
        }
    }
    rows
}

/// Customers from sold orders plus direct checkout. The natural id is the
/// buyer username when direct checkout links one to the order, otherwise the
/// shipping full name.
pub fn build_dim_customer(
    sold_orders: Option<&[SoldOrderRow]>,
    direct_checkout: Option<&[DirectCheckoutRow]>,
    build_date: NaiveDate,
    keys: &mut MasterKeys,
) -> Vec<DimCustomerRow> {
    for payment in direct_checkout.unwrap_or_default() {
        if let (Some(order_id), Some(username)) =
            (payment.order_id.as_deref(), payment.buyer_username.as_deref())
        {
            keys.order_buyers
                .insert(order_id.to_string(), username.to_string());
        }
    }

    struct Accum {
        row: DimCustomerRow,
        orders: BTreeSet<String>,
    }
    let mut by_id: BTreeMap<String, Accum> = BTreeMap::new();

    for order in sold_orders.unwrap_or_default() {
        let username = order
            .order_id
            .as_deref()
            .and_then(|id| keys.order_buyers.get(id))
            .cloned();
        let natural_id = match username.clone().or_else(|| order.full_name.clone()) {
            Some(id) => id,
            None => continue,
        };
        let entry = by_id.entry(natural_id.clone()).or_insert_with(|| Accum {
            row: DimCustomerRow {
                customer_id: natural_id.clone(),
                buyer_username: username.clone(),
                is_current: true,
                effective_date: Some(build_date),
                ..Default::default()
            },
            orders: BTreeSet::new(),
        });
        if entry.row.buyer_username.is_none() {
            entry.row.buyer_username = username;
        }
        if entry.row.full_name.is_none() {
            entry.row.full_name = order.full_name.clone();
            entry.row.first_name = order.first_name.clone();
            entry.row.last_name = order.last_name.clone();
        }
        if let Some(order_id) = order.order_id.as_deref() {
            entry.orders.insert(order_id.to_string());
        }
        if let Some(value) = order.order_value {
            entry.row.total_spent =
                Some(entry.row.total_spent.unwrap_or(Decimal::ZERO) + value);
        }
        if let Some(date) = order.sale_date {
            entry.row.first_order_date = Some(match entry.row.first_order_date {
                Some(d) if d <= date => d,
                _ => date,
            });
            entry.row.last_order_date = Some(match entry.row.last_order_date {
                Some(d) if d >= date => d,
                _ => date,
            });
        }
    }

    // Direct-checkout buyers with no matching sold order still get a row.
    for payment in direct_checkout.unwrap_or_default() {
        let Some(username) = payment.buyer_username.as_deref() else {
            continue;
        };
        by_id
            .entry(username.to_string())
            .or_insert_with(|| Accum {
                row: DimCustomerRow {
                    customer_id: username.to_string(),
                    buyer_username: Some(username.to_string()),
                    full_name: payment.buyer_name.clone(),
                    is_current: true,
                    effective_date: Some(build_date),
                    ..Default::default()
                },
                orders: BTreeSet::new(),
            });
    }

    let mut rows = Vec::with_capacity(by_id.len());
    for (idx, (_, mut accum)) in by_id.into_iter().enumerate() {
        accum.row.customer_key = idx as i64 + 1;
        accum.row.order_count = accum.orders.len() as i32;
        keys.customers
            .insert(accum.row.customer_id.clone(), accum.row.customer_key);
        rows.push(accum.row);
    }
    rows
}

pub fn build_dim_geography(
    sold_orders: Option<&[SoldOrderRow]>,
    items: Option<&[SoldOrderItemRow]>,
    keys: &mut MasterKeys,
) -> Vec<DimGeographyRow> {
    let mut distinct: BTreeMap<String, DimGeographyRow> = BTreeMap::new();
    let mut record = |country: &Option<String>,
                      state: &Option<String>,
                      city: &Option<String>,
                      zip: &Option<String>| {
        if country.is_none() && state.is_none() && city.is_none() && zip.is_none() {
            return;
        }
        let id = geography_id(
            country.as_deref(),
            state.as_deref(),
            city.as_deref(),
            zip.as_deref(),
        );
        distinct.entry(id).or_insert_with(|| DimGeographyRow {
            country_name: country.clone(),
            state_name: state.clone(),
            city_name: city.clone(),
            zipcode: zip.clone(),
            ..Default::default()
        });
    };
    for order in sold_orders.unwrap_or_default() {
        record(
            &order.ship_country,
            &order.ship_state,
            &order.ship_city,
            &order.ship_zipcode,
        );
    }
    for item in items.unwrap_or_default() {
        record(
            &item.ship_country,
            &item.ship_state,
            &item.ship_city,
            &item.ship_zipcode,
        );
    }

    let mut rows = Vec::with_capacity(distinct.len());
    for (idx, (id, mut row)) in distinct.into_iter().enumerate() {
        row.geography_key = idx as i64 + 1;
        keys.geographies.insert(id, row.geography_key);
        rows.push(row);
    }
    rows
}

/// One row per order id. Sold orders are authoritative; direct checkout fills
/// orders that only appear as payments.
pub fn build_dim_order(
    sold_orders: Option<&[SoldOrderRow]>,
    direct_checkout: Option<&[DirectCheckoutRow]>,
    keys: &mut MasterKeys,
) -> Vec<DimOrderRow> {
    let mut by_id: BTreeMap<String, DimOrderRow> = BTreeMap::new();
    for order in sold_orders.unwrap_or_default() {
        let Some(order_id) = order.order_id.as_deref() else {
            continue;
        };
        by_id
            .entry(order_id.to_string())
            .or_insert_with(|| DimOrderRow {
                order_id: order_id.to_string(),
                order_date: order.sale_date,
                order_type: order.order_type.clone(),
                payment_type: order.payment_method.clone(),
                ..Default::default()
            });
    }
    for payment in direct_checkout.unwrap_or_default() {
        let Some(order_id) = payment.order_id.as_deref() else {
            continue;
        };
        by_id
            .entry(order_id.to_string())
            .or_insert_with(|| DimOrderRow {
                order_id: order_id.to_string(),
                order_date: payment.order_date,
                order_type: payment.order_type.clone(),
                payment_type: payment.payment_type.clone(),
                ..Default::default()
            });
    }

    let mut rows = Vec::with_capacity(by_id.len());
    for (idx, (id, mut row)) in by_id.into_iter().enumerate() {
        row.order_key = idx as i64 + 1;
        keys.orders.insert(id, row.order_key);
        rows.push(row);
    }
    rows
}

/// Distinct payment labels observed anywhere in the inputs.
pub fn build_dim_payment(
    sold_orders: Option<&[SoldOrderRow]>,
    items: Option<&[SoldOrderItemRow]>,
    direct_checkout: Option<&[DirectCheckoutRow]>,
    keys: &mut MasterKeys,
) -> Vec<DimPaymentRow> {
    let mut methods: BTreeMap<String, Option<String>> = BTreeMap::new();
    for order in sold_orders.unwrap_or_default() {
        if let Some(method) = order.payment_method.as_deref() {
            methods.entry(method.to_string()).or_insert(None);
        }
    }
    for item in items.unwrap_or_default() {
        if let Some(payment_type) = item.payment_type.as_deref() {
            methods
                .entry(payment_type.to_string())
                .or_insert_with(|| Some(payment_type.to_string()));
        }
    }
    for payment in direct_checkout.unwrap_or_default() {
        if let Some(payment_type) = payment.payment_type.as_deref() {
            methods
                .entry(payment_type.to_string())
                .or_insert_with(|| Some(payment_type.to_string()));
        }
    }

    let mut rows = Vec::with_capacity(methods.len());
    for (idx, (method, payment_type)) in methods.into_iter().enumerate() {
        let key = idx as i64 + 1;
        keys.payments.insert(method.clone(), key);
        rows.push(DimPaymentRow {
            payment_key: key,
            payment_method: Some(method),
            payment_type,
        });
    }
    rows
}

/// Accounts observed in the bank statement, first non-empty attribute wins.
pub fn build_dim_bank_account(
    transactions: Option<&[BankTransactionRow]>,
    keys: &mut MasterKeys,
) -> Vec<DimBankAccountRow> {
    let mut by_number: BTreeMap<String, DimBankAccountRow> = BTreeMap::new();
    for tx in transactions.unwrap_or_default() {
        let Some(number) = tx.account_number.as_deref().filter(|n| !n.is_empty()) else {
            continue;
        };
        let row = by_number
            .entry(number.to_string())
            .or_insert_with(|| DimBankAccountRow {
                account_number: Some(number.to_string()),
                ..Default::default()
            });
        if row.account_name.is_none() {
            row.account_name = tx.account_name.clone();
        }
        if row.cif_number.is_none() {
            row.cif_number = tx.cif_number.clone();
        }
        if row.customer_address.is_none() {
            row.customer_address = tx.customer_address.clone();
        }
        if row.opening_date.is_none() {
            row.opening_date = tx.opening_date;
        }
        if row.currency_code.is_none() {
            row.currency_code = tx.currency_code.clone();
        }
    }

    let mut rows = Vec::with_capacity(by_number.len());
    for (idx, (number, mut row)) in by_number.into_iter().enumerate() {
        row.bank_account_key = idx as i64 + 1;
        if row.currency_code.is_none() {
            row.currency_code = Some("VND".to_string());
        }
        keys.bank_accounts.insert(number, row.bank_account_key);
        rows.push(row);
    }
    rows
}

/// Catalog rows from the static export when present, otherwise derived from
/// the product references parsed out of bank descriptions.
pub fn build_dim_product_catalog(
    catalog: Option<&[ProductCatalogRow]>,
    transactions: Option<&[BankTransactionRow]>,
    keys: &mut MasterKeys,
) -> Vec<DimProductCatalogRow> {
    let mut by_id: BTreeMap<String, DimProductCatalogRow> = BTreeMap::new();

    for entry in catalog.unwrap_or_default() {
        let id = catalog_id(
            entry.product_line_id.as_deref(),
            entry.product_id.as_deref(),
            entry.variant_id.as_deref(),
        );
        by_id.entry(id).or_insert_with(|| DimProductCatalogRow {
            product_line_id: entry.product_line_id.clone(),
            product_name: entry.product_name.clone(),
            product_id: entry.product_id.clone(),
            variant_id: entry.variant_id.clone(),
            variant_name: entry.variant_name.clone(),
            ..Default::default()
        });
    }

    if by_id.is_empty() {
        for tx in transactions.unwrap_or_default() {
            let (Some(line), Some(product), Some(variant)) = (
                tx.parsed_product_line_id.as_deref(),
                tx.parsed_product_id.as_deref(),
                tx.parsed_variant_id.as_deref(),
            ) else {
                continue;
            };
            let id = catalog_id(Some(line), Some(product), Some(variant));
            by_id.entry(id).or_insert_with(|| DimProductCatalogRow {
                product_line_id: Some(line.to_string()),
                product_id: Some(product.to_string()),
                variant_id: Some(variant.to_string()),
                ..Default::default()
            });
        }
    }

    let mut rows = Vec::with_capacity(by_id.len());
    for (idx, (id, mut row)) in by_id.into_iter().enumerate() {
        row.product_catalog_key = idx as i64 + 1;
        keys.product_catalog.insert(id, row.product_catalog_key);
        rows.push(row);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn time_dimension_covers_leap_february() {
        let rows = build_dim_time(date(2024, 2, 27), date(2024, 3, 1));
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[2].time_key, 20240229);
        assert_eq!(rows[2].day_of_year, 60);
        assert!(rows[2].is_peak_season);
        assert_eq!(rows[3].selling_season, "Spring");
        assert!(!rows[3].is_peak_season);
    }

    #[test]
    fn time_dimension_week_fields() {
        let rows = build_dim_time(date(2025, 1, 4), date(2025, 1, 5));
        // 2025-01-04 is a Saturday.
        assert_eq!(rows[0].day_of_week, 6);
        assert!(rows[0].is_weekend);
        assert_eq!(rows[0].day_name, "Saturday");
        assert_eq!(rows[0].quarter_name, "Q1");
        assert!(rows[1].is_weekend);
    }

    #[test]
    fn product_dimension_joins_listings_and_items_by_name() {
        let listings = vec![ListingRow {
            title: Some("Wool Hat".to_string()),
            sku: Some("HAT-01".to_string()),
            ..Default::default()
        }];
        let items = vec![
            SoldOrderItemRow {
                item_name: Some("wool  hat".to_string()),
                ..Default::default()
            },
            SoldOrderItemRow {
                item_name: Some("Scarf".to_string()),
                sku: Some("SCARF-01".to_string()),
                ..Default::default()
            },
        ];
        let mut keys = MasterKeys::default();
        let rows = build_dim_product(Some(&listings), Some(&items), date(2025, 1, 1), &mut keys);
        assert_eq!(rows.len(), 2);
        assert_eq!(
            keys.products_by_name.get("wool hat"),
            Some(&rows[0].product_key)
        );
        assert!(keys.products_by_name.contains_key("scarf"));
        assert_eq!(
            keys.products_by_sku.get("HAT-01"),
            Some(&rows[0].product_key)
        );
        assert!(rows.iter().all(|r| r.is_current));
    }

    #[test]
    fn customer_dimension_counts_orders_and_prefers_username() {
        let orders = vec![
            SoldOrderRow {
                order_id: Some("1".to_string()),
                full_name: Some("Jane Roe".to_string()),
                sale_date: Some(date(2025, 1, 3)),
                order_value: Some("10".parse().unwrap()),
                ..Default::default()
            },
            SoldOrderRow {
                order_id: Some("2".to_string()),
                full_name: Some("Jane Roe".to_string()),
                sale_date: Some(date(2025, 2, 1)),
                order_value: Some("5".parse().unwrap()),
                ..Default::default()
            },
        ];
        let payments = vec![DirectCheckoutRow {
            order_id: Some("1".to_string()),
            buyer_username: Some("janeroe".to_string()),
            ..Default::default()
        }];
        let mut keys = MasterKeys::default();
        let rows = build_dim_customer(Some(&orders), Some(&payments), date(2025, 3, 1), &mut keys);
        // Order 1 resolves to the username, order 2 falls back to the name.
        assert_eq!(rows.len(), 2);
        let jane = rows.iter().find(|r| r.customer_id == "janeroe").unwrap();
        assert_eq!(jane.order_count, 1);
        assert_eq!(jane.first_order_date, Some(date(2025, 1, 3)));
        assert_eq!(keys.order_buyers.get("1").map(String::as_str), Some("janeroe"));
    }

    #[test]
    fn geography_dimension_deduplicates() {
        let orders = vec![
            SoldOrderRow {
                ship_country: Some("United States".to_string()),
                ship_city: Some("Austin".to_string()),
                ..Default::default()
            },
            SoldOrderRow {
                ship_country: Some("United States".to_string()),
                ship_city: Some("Austin".to_string()),
                ..Default::default()
            },
            SoldOrderRow::default(),
        ];
        let mut keys = MasterKeys::default();
        let rows = build_dim_geography(Some(&orders), None, &mut keys);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].country_name.as_deref(), Some("United States"));
    }

    #[test]
    fn bank_account_dimension_defaults_currency_to_vnd() {
        let txs = vec![
            BankTransactionRow {
                account_number: Some("007".to_string()),
                account_name: Some("SHOP LLC".to_string()),
                ..Default::default()
            },
            BankTransactionRow {
                account_number: Some("007".to_string()),
                cif_number: Some("123".to_string()),
                ..Default::default()
            },
        ];
        let mut keys = MasterKeys::default();
        let rows = build_dim_bank_account(Some(&txs), &mut keys);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].account_name.as_deref(), Some("SHOP LLC"));
        assert_eq!(rows[0].cif_number.as_deref(), Some("123"));
        assert_eq!(rows[0].currency_code.as_deref(), Some("VND"));
        assert_eq!(keys.bank_accounts.get("007"), Some(&rows[0].bank_account_key));
    }

    #[test]
    fn catalog_derived_from_bank_descriptions_when_no_export() {
        let txs = vec![BankTransactionRow {
            parsed_product_line_id: Some("DEF".to_string()),
            parsed_product_id: Some("MG01".to_string()),
            parsed_variant_id: Some("03".to_string()),
            ..Default::default()
        }];
        let mut keys = MasterKeys::default();
        let rows = build_dim_product_catalog(None, Some(&txs), &mut keys);
        assert_eq!(rows.len(), 1);
        assert!(keys.product_catalog.contains_key("DEF_MG01_03"));
    }
}
