use anyhow::{bail, Result};

use crate::orchestrator::DEFAULT_PER_PAGE;
use crate::util::env::{db_url, env_parse, env_req, preflight_check};

/// WooCommerce rejects `per_page` above this.
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Clone)]
pub struct SyncConfig {
    pub orders_url: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub per_page: u32,
    pub timeout_secs: u64,
    pub database_url: String,
    pub max_connections: u32,
}

impl std::fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncConfig")
            .field("orders_url", &self.orders_url)
            .field("per_page", &self.per_page)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_connections", &self.max_connections)
            .finish_non_exhaustive()
    }
}

pub fn validate_per_page(per_page: u32) -> Result<u32> {
    if per_page == 0 || per_page > MAX_PER_PAGE {
        bail!("page size must be between 1 and {MAX_PER_PAGE}, got {per_page}");
    }
    Ok(per_page)
}

impl SyncConfig {
    pub fn from_env() -> Result<Self> {
        preflight_check(
            "wc-order-sync",
            &["WC_ORDERS_URL", "WC_CONSUMER_KEY", "WC_CONSUMER_SECRET"],
            &[
                "WC_ORDERS_URL",
                "WC_CONSUMER_KEY",
                "WC_CONSUMER_SECRET",
                "WC_PER_PAGE",
                "WC_TIMEOUT_SECS",
                "DATABASE_URL",
                "DB_MAX_CONNS",
            ],
        )?;

        Ok(Self {
            orders_url: env_req("WC_ORDERS_URL")?,
            consumer_key: env_req("WC_CONSUMER_KEY")?,
            consumer_secret: env_req("WC_CONSUMER_SECRET")?,
            per_page: env_parse("WC_PER_PAGE", DEFAULT_PER_PAGE),
            timeout_secs: env_parse("WC_TIMEOUT_SECS", 30u64),
            database_url: db_url()?,
            max_connections: env_parse("DB_MAX_CONNS", 5u32),
        })
    }

    /// Apply command-line overrides on top of the environment, then validate
    /// the effective page size.
    pub fn with_overrides(mut self, per_page: Option<u32>, max_conns: Option<u32>) -> Result<Self> {
        if let Some(n) = per_page {
            self.per_page = n;
        }
        if let Some(n) = max_conns {
            self.max_connections = n.max(1);
        }
        self.per_page = validate_per_page(self.per_page)?;
        Ok(self)
    }
}
