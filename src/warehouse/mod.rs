//! PostgreSQL persistence for the star schema

pub mod repository;
pub mod schema;
pub mod types;

pub use repository::{WarehouseError, WarehouseRepository};
