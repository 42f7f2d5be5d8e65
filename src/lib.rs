//! Batch sync of WooCommerce orders and line items into Postgres.

pub mod config;
pub mod database_ops;
pub mod logging;
pub mod normalization;
pub mod orchestrator;
pub mod woocommerce;

pub mod util {
    pub mod env;
}
