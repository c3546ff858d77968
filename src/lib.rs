//! Etsy seller analytics warehouse and dashboard API
//!
//! Monthly CSV exports (Etsy statements, orders, deposits, bank statements)
//! are cleaned and assembled into a star schema in PostgreSQL, then served
//! to the dashboard through a REST API.

pub mod config;
pub mod etl;
pub mod reports;
pub mod server;
pub mod warehouse;
