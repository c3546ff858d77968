//! Fact builders
//! Foreign keys come from the [`MasterKeys`] maps the dimension builders
//! filled in; a natural id nobody has seen stays a NULL key.

use crate::etl::clean::time_key;
use crate::etl::dimensions::{catalog_id, geography_id, normalize_name, MasterKeys};
use crate::etl::records::*;
use crate::warehouse::types::*;

pub fn build_fact_sales(items: &[SoldOrderItemRow], keys: &MasterKeys) -> Vec<FactSalesRow> {
    items
        .iter()
        .map(|item| {
            let product_key = item
                .item_name
                .as_deref()
                .and_then(|n| keys.products_by_name.get(&normalize_name(n)))
                .or_else(|| {
                    item.sku
                        .as_deref()
                        .and_then(|sku| keys.products_by_sku.get(sku))
                })
                .copied();
            let order_key = item
                .order_id
                .as_deref()
                .and_then(|id| keys.orders.get(id))
                .copied();
            let customer_key = item
                .order_id
                .as_deref()
                .and_then(|id| keys.order_buyers.get(id))
                .and_then(|buyer| keys.customers.get(buyer))
                .copied();
            let geography_key = keys
                .geographies
                .get(&geography_id(
                    item.ship_country.as_deref(),
                    item.ship_state.as_deref(),
                    item.ship_city.as_deref(),
                    item.ship_zipcode.as_deref(),
                ))
                .copied();
            let payment_key = item
                .payment_type
                .as_deref()
                .and_then(|p| keys.payments.get(p))
                .copied();
            FactSalesRow {
                time_key: item.sale_date.map(time_key),
                product_key,
                order_key,
                customer_key,
                geography_key,
                payment_key,
                order_id: item.order_id.clone(),
                listing_id: item.listing_id.clone(),
                transaction_id: item.transaction_id.clone(),
                item_name: item.item_name.clone(),
                price: item.price,
                quantity: item.quantity,
                item_total: item.item_total,
                discount_amount: item.discount_amount,
                order_shipping: item.order_shipping,
                shipping_discount: item.shipping_discount,
                order_sales_tax: item.order_sales_tax,
                sku: item.sku.clone(),
            }
        })
        .collect()
}

pub fn build_fact_financial_transactions(
    statement: &[StatementRow],
    keys: &MasterKeys,
) -> Vec<FactFinancialTransactionRow> {
    statement
        .iter()
        .map(|line| {
            let (order_id, transaction_id) = match (line.id_kind, line.extracted_id.as_deref()) {
                (Some(IdKind::Order), Some(id)) => (Some(id.to_string()), None),
                (Some(IdKind::Transaction), Some(id)) => (None, Some(id.to_string())),
                _ => (None, None),
            };
            let order_key = order_id
                .as_deref()
                .and_then(|id| keys.orders.get(id))
                .copied();
            let customer_key = order_id
                .as_deref()
                .and_then(|id| keys.order_buyers.get(id))
                .and_then(|buyer| keys.customers.get(buyer))
                .copied();
            FactFinancialTransactionRow {
                transaction_date_key: line.date.map(time_key),
                customer_key,
                order_key,
                transaction_type: line.transaction_type.clone(),
                transaction_title: line.title.clone(),
                info: line.info.clone(),
                order_id,
                transaction_id,
                currency: line.currency.clone(),
                amount: line.amount,
                fees_and_taxes: line.fees_and_taxes,
                net_amount: line.net,
            }
        })
        .collect()
}

pub fn build_fact_deposits(deposits: &[DepositRow]) -> Vec<FactDepositRow> {
    deposits
        .iter()
        .map(|deposit| FactDepositRow {
            deposit_date_key: deposit.date.map(time_key),
            amount: deposit.amount,
            currency: deposit.currency.clone(),
            status: deposit.status.clone(),
            bank_account_ending: deposit.bank_account.clone(),
        })
        .collect()
}

pub fn build_fact_payments(
    direct_checkout: &[DirectCheckoutRow],
    keys: &MasterKeys,
) -> Vec<FactPaymentRow> {
    direct_checkout
        .iter()
        .map(|payment| {
            let customer_key = payment
                .buyer_username
                .as_deref()
                .and_then(|u| keys.customers.get(u))
                .copied();
            let order_key = payment
                .order_id
                .as_deref()
                .and_then(|id| keys.orders.get(id))
                .copied();
            FactPaymentRow {
                payment_date_key: payment.order_date.map(time_key),
                customer_key,
                order_key,
                payment_id: payment.payment_id.clone(),
                order_id: payment.order_id.clone(),
                gross_amount: payment.gross_amount,
                fees: payment.fees,
                net_amount: payment.net_amount,
                posted_gross: payment.posted_gross,
                posted_fees: payment.posted_fees,
                posted_net: payment.posted_net,
                adjusted_gross: payment.adjusted_gross,
                adjusted_fees: payment.adjusted_fees,
                adjusted_net: payment.adjusted_net,
                exchange_rate: payment.exchange_rate,
                vat_amount: payment.vat_amount,
                refund_amount: payment.refund_amount,
                payment_type: payment.payment_type.clone(),
                order_type: payment.order_type.clone(),
            }
        })
        .collect()
}

pub fn build_fact_bank_transactions(
    transactions: &[BankTransactionRow],
    keys: &MasterKeys,
) -> Vec<FactBankTransactionRow> {
    transactions
        .iter()
        .map(|tx| {
            let bank_account_key = tx
                .account_number
                .as_deref()
                .and_then(|n| keys.bank_accounts.get(n))
                .copied();
            let product_catalog_key = match (
                tx.parsed_product_line_id.as_deref(),
                tx.parsed_product_id.as_deref(),
                tx.parsed_variant_id.as_deref(),
            ) {
                (Some(line), Some(product), Some(variant)) => keys
                    .product_catalog
                    .get(&catalog_id(Some(line), Some(product), Some(variant)))
                    .copied(),
                _ => None,
            };
            FactBankTransactionRow {
                transaction_date_key: tx.transaction_date.map(time_key),
                bank_account_key,
                product_catalog_key,
                reference_number: tx.reference_number.clone(),
                transaction_description: tx.transaction_description.clone(),
                credit_amount: tx.credit_amount,
                debit_amount: tx.debit_amount,
                balance_after_transaction: tx.balance_after_transaction,
                currency_code: tx.currency_code.clone(),
                pl_account_number: tx.pl_account_number.clone(),
                parsed_product_line_id: tx.parsed_product_line_id.clone(),
                parsed_product_id: tx.parsed_product_id.clone(),
                parsed_variant_id: tx.parsed_variant_id.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn keys_with_fixtures() -> MasterKeys {
        let mut keys = MasterKeys::default();
        keys.products_by_name.insert("wool hat".to_string(), 7);
        keys.orders.insert("100".to_string(), 3);
        keys.order_buyers
            .insert("100".to_string(), "janeroe".to_string());
        keys.customers.insert("janeroe".to_string(), 11);
        keys.bank_accounts.insert("007".to_string(), 2);
        keys.product_catalog.insert("DEF_MG01_03".to_string(), 5);
        keys
    }

    #[test]
    fn sales_fact_resolves_known_keys_and_nulls_unknown() {
        let keys = keys_with_fixtures();
        let items = vec![
            SoldOrderItemRow {
                order_id: Some("100".to_string()),
                item_name: Some("Wool  Hat".to_string()),
                sale_date: NaiveDate::from_ymd_opt(2025, 1, 5),
                ..Default::default()
            },
            SoldOrderItemRow {
                order_id: Some("999".to_string()),
                item_name: Some("Unknown Thing".to_string()),
                ..Default::default()
            },
        ];
        let facts = build_fact_sales(&items, &keys);
        assert_eq!(facts[0].product_key, Some(7));
        assert_eq!(facts[0].order_key, Some(3));
        assert_eq!(facts[0].customer_key, Some(11));
        assert_eq!(facts[0].time_key, Some(20250105));
        assert_eq!(facts[1].product_key, None);
        assert_eq!(facts[1].order_key, None);
        assert_eq!(facts[1].time_key, None);
    }

    #[test]
    fn statement_id_kind_splits_order_and_transaction() {
        let keys = keys_with_fixtures();
        let statement = vec![
            StatementRow {
                extracted_id: Some("100".to_string()),
                id_kind: Some(IdKind::Order),
                ..Default::default()
            },
            StatementRow {
                extracted_id: Some("555".to_string()),
                id_kind: Some(IdKind::Transaction),
                ..Default::default()
            },
        ];
        let facts = build_fact_financial_transactions(&statement, &keys);
        assert_eq!(facts[0].order_id.as_deref(), Some("100"));
        assert_eq!(facts[0].order_key, Some(3));
        assert_eq!(facts[0].customer_key, Some(11));
        assert_eq!(facts[0].transaction_id, None);
        assert_eq!(facts[1].order_id, None);
        assert_eq!(facts[1].transaction_id.as_deref(), Some("555"));
        assert_eq!(facts[1].order_key, None);
    }

    #[test]
    fn bank_fact_links_account_and_catalog() {
        let keys = keys_with_fixtures();
        let txs = vec![BankTransactionRow {
            account_number: Some("007".to_string()),
            parsed_product_line_id: Some("DEF".to_string()),
            parsed_product_id: Some("MG01".to_string()),
            parsed_variant_id: Some("03".to_string()),
            transaction_date: NaiveDate::from_ymd_opt(2025, 2, 1),
            ..Default::default()
        }];
        let facts = build_fact_bank_transactions(&txs, &keys);
        assert_eq!(facts[0].bank_account_key, Some(2));
        assert_eq!(facts[0].product_catalog_key, Some(5));
        assert_eq!(facts[0].transaction_date_key, Some(20250201));
    }
}
