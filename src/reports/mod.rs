//! Report queries over the warehouse

pub mod bank;
pub mod cache;
pub mod charts;
pub mod filters;
pub mod product_cost;
pub mod profit_loss;
pub mod static_data;

pub use cache::ReportCaches;
pub use filters::{CustomerType, ReportFilter};
