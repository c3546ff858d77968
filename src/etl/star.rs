//! Star-schema assembly from cleaned datasets

use chrono::{NaiveDate, Utc};
use log::info;

use crate::etl::{dimensions, facts, Datasets};
use crate::warehouse::types::*;

/// Calendar range covered by dim_time.
const TIME_RANGE_START: (i32, u32, u32) = (2020, 1, 1);
const TIME_RANGE_END: (i32, u32, u32) = (2030, 12, 31);

/// The fully built schema, ready for loading.
#[derive(Debug, Default)]
pub struct StarSchema {
    pub dim_time: Vec<DimTimeRow>,
    pub dim_product: Vec<DimProductRow>,
    pub dim_customer: Vec<DimCustomerRow>,
    pub dim_geography: Vec<DimGeographyRow>,
    pub dim_order: Vec<DimOrderRow>,
    pub dim_payment: Vec<DimPaymentRow>,
    pub dim_bank_account: Vec<DimBankAccountRow>,
    pub dim_product_catalog: Vec<DimProductCatalogRow>,
    pub fact_sales: Vec<FactSalesRow>,
    pub fact_financial_transactions: Vec<FactFinancialTransactionRow>,
    pub fact_deposits: Vec<FactDepositRow>,
    pub fact_payments: Vec<FactPaymentRow>,
    pub fact_bank_transactions: Vec<FactBankTransactionRow>,
}

pub struct StarSchemaBuilder {
    build_date: NaiveDate,
}

impl Default for StarSchemaBuilder {
    fn default() -> Self {
        StarSchemaBuilder {
            build_date: Utc::now().date_naive(),
        }
    }
}

impl StarSchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_build_date(build_date: NaiveDate) -> Self {
        StarSchemaBuilder { build_date }
    }

    /// Dimensions first so every fact builder can resolve its foreign keys.
    /// Builders whose inputs are absent are skipped and leave empty tables.
    pub fn build(&self, datasets: &Datasets) -> StarSchema {
        let mut keys = dimensions::MasterKeys::default();
        let mut schema = StarSchema::default();

        let (sy, sm, sd) = TIME_RANGE_START;
        let (ey, em, ed) = TIME_RANGE_END;
        if let (Some(start), Some(end)) = (
            NaiveDate::from_ymd_opt(sy, sm, sd),
            NaiveDate::from_ymd_opt(ey, em, ed),
        ) {
            schema.dim_time = dimensions::build_dim_time(start, end);
        }

        schema.dim_geography = dimensions::build_dim_geography(
            datasets.sold_orders.as_deref(),
            datasets.sold_order_items.as_deref(),
            &mut keys,
        );
        schema.dim_product = dimensions::build_dim_product(
            datasets.listing.as_deref(),
            datasets.sold_order_items.as_deref(),
            self.build_date,
            &mut keys,
        );
        schema.dim_customer = dimensions::build_dim_customer(
            datasets.sold_orders.as_deref(),
            datasets.direct_checkout.as_deref(),
            self.build_date,
            &mut keys,
        );
        schema.dim_payment = dimensions::build_dim_payment(
            datasets.sold_orders.as_deref(),
            datasets.sold_order_items.as_deref(),
            datasets.direct_checkout.as_deref(),
            &mut keys,
        );
        schema.dim_order = dimensions::build_dim_order(
            datasets.sold_orders.as_deref(),
            datasets.direct_checkout.as_deref(),
            &mut keys,
        );
        schema.dim_bank_account =
            dimensions::build_dim_bank_account(datasets.bank_transactions.as_deref(), &mut keys);
        schema.dim_product_catalog = dimensions::build_dim_product_catalog(
            datasets.product_catalog.as_deref(),
            datasets.bank_transactions.as_deref(),
            &mut keys,
        );

        if let Some(items) = datasets.sold_order_items.as_deref() {
            schema.fact_sales = facts::build_fact_sales(items, &keys);
        }
        if let Some(statement) = datasets.statement.as_deref() {
            schema.fact_financial_transactions =
                facts::build_fact_financial_transactions(statement, &keys);
        }
        if let Some(deposits) = datasets.deposits.as_deref() {
            schema.fact_deposits = facts::build_fact_deposits(deposits);
        }
        if let Some(payments) = datasets.direct_checkout.as_deref() {
            schema.fact_payments = facts::build_fact_payments(payments, &keys);
        }
        if let Some(txs) = datasets.bank_transactions.as_deref() {
            schema.fact_bank_transactions = facts::build_fact_bank_transactions(txs, &keys);
        }

        for (table, count) in schema.table_counts() {
            info!("built {table}: {count} rows");
        }
        schema
    }
}

impl StarSchema {
    pub fn table_counts(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("dim_time", self.dim_time.len()),
            ("dim_product", self.dim_product.len()),
            ("dim_customer", self.dim_customer.len()),
            ("dim_geography", self.dim_geography.len()),
            ("dim_order", self.dim_order.len()),
            ("dim_payment", self.dim_payment.len()),
            ("dim_bank_account", self.dim_bank_account.len()),
            ("dim_product_catalog", self.dim_product_catalog.len()),
            ("fact_sales", self.fact_sales.len()),
            (
                "fact_financial_transactions",
                self.fact_financial_transactions.len(),
            ),
            ("fact_deposits", self.fact_deposits.len()),
            ("fact_payments", self.fact_payments.len()),
            ("fact_bank_transactions", self.fact_bank_transactions.len()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::etl::records::*;

    #[test]
    fn empty_datasets_still_produce_the_calendar() {
        let schema = StarSchemaBuilder::new().build(&Datasets::default());
        assert!(!schema.dim_time.is_empty());
        assert_eq!(schema.dim_time[0].time_key, 20200101);
        assert!(schema.fact_sales.is_empty());
        assert!(schema.dim_customer.is_empty());
    }

    #[test]
    fn sales_facts_link_through_the_shared_key_maps() {
        let mut datasets = Datasets::default();
        datasets.sold_orders = Some(vec![SoldOrderRow {
            order_id: Some("100".to_string()),
            full_name: Some("Jane Roe".to_string()),
            sale_date: NaiveDate::from_ymd_opt(2025, 1, 5),
            ship_country: Some("France".to_string()),
            ..Default::default()
        }]);
        datasets.sold_order_items = Some(vec![SoldOrderItemRow {
            order_id: Some("100".to_string()),
            item_name: Some("Wool Hat".to_string()),
            sale_date: NaiveDate::from_ymd_opt(2025, 1, 5),
            ship_country: Some("France".to_string()),
            ..Default::default()
        }]);
        let date = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let schema = StarSchemaBuilder::with_build_date(date).build(&datasets);

        assert_eq!(schema.dim_order.len(), 1);
        assert_eq!(schema.dim_product.len(), 1);
        assert_eq!(schema.fact_sales.len(), 1);
        let fact = &schema.fact_sales[0];
        assert_eq!(fact.order_key, Some(schema.dim_order[0].order_key));
        assert_eq!(fact.product_key, Some(schema.dim_product[0].product_key));
        assert_eq!(
            fact.geography_key,
            Some(schema.dim_geography[0].geography_key)
        );
        assert_eq!(fact.time_key, Some(20250105));
    }

    #[test]
    fn bank_only_dataset_builds_accounts_and_catalog() {
        let mut datasets = Datasets::default();
        datasets.bank_transactions = Some(vec![BankTransactionRow {
            account_number: Some("007".to_string()),
            transaction_date: NaiveDate::from_ymd_opt(2025, 3, 2),
            parsed_product_line_id: Some("DEF".to_string()),
            parsed_product_id: Some("MG01".to_string()),
            parsed_variant_id: Some("03".to_string()),
            pl_account_number: Some("6221".to_string()),
            ..Default::default()
        }]);
        let schema = StarSchemaBuilder::new().build(&datasets);
        assert_eq!(schema.dim_bank_account.len(), 1);
        assert_eq!(schema.dim_product_catalog.len(), 1);
        let fact = &schema.fact_bank_transactions[0];
        assert_eq!(
            fact.bank_account_key,
            Some(schema.dim_bank_account[0].bank_account_key)
        );
        assert_eq!(
            fact.product_catalog_key,
            Some(schema.dim_product_catalog[0].product_catalog_key)
        );
    }
}
