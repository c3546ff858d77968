//! CSV import pipeline: load raw exports, clean them, build the star schema

pub mod clean;
pub mod dimensions;
pub mod facts;
pub mod loader;
pub mod records;
pub mod star;

pub use loader::{CsvLoader, RawTable};
pub use star::{StarSchema, StarSchemaBuilder};

use records::*;

/// Everything one period folder can contribute. Any dataset may be absent;
/// downstream builders skip what is missing.
#[derive(Debug, Default)]
pub struct Datasets {
    pub listing: Option<Vec<ListingRow>>,
    pub sold_orders: Option<Vec<SoldOrderRow>>,
    pub sold_order_items: Option<Vec<SoldOrderItemRow>>,
    pub statement: Option<Vec<StatementRow>>,
    pub deposits: Option<Vec<DepositRow>>,
    pub direct_checkout: Option<Vec<DirectCheckoutRow>>,
    pub bank_transactions: Option<Vec<BankTransactionRow>>,
    pub product_catalog: Option<Vec<ProductCatalogRow>>,
}

impl Datasets {
    /// Merge another period's datasets into this one, concatenating rows.
    pub fn extend(&mut self, other: Datasets) {
        fn merge<T>(target: &mut Option<Vec<T>>, source: Option<Vec<T>>) {
            match (target.as_mut(), source) {
                (Some(t), Some(mut s)) => t.append(&mut s),
                (None, Some(s)) => *target = Some(s),
                _ => {}
            }
        }
        merge(&mut self.listing, other.listing);
        merge(&mut self.sold_orders, other.sold_orders);
        merge(&mut self.sold_order_items, other.sold_order_items);
        merge(&mut self.statement, other.statement);
        merge(&mut self.deposits, other.deposits);
        merge(&mut self.direct_checkout, other.direct_checkout);
        merge(&mut self.bank_transactions, other.bank_transactions);
        merge(&mut self.product_catalog, other.product_catalog);
    }
}
