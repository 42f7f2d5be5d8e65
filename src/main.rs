use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use wc_order_sync::config::SyncConfig;
use wc_order_sync::database_ops::{db::Db, PgOrderStore};
use wc_order_sync::logging::init_tracing;
use wc_order_sync::orchestrator::SyncEngine;
use wc_order_sync::util::env as env_util;
use wc_order_sync::woocommerce::WooCommerceProvider;

#[derive(Parser, Debug)]
#[command(
    name = "wc-order-sync",
    version,
    about = "Copy WooCommerce orders and line items into Postgres"
)]
struct Cli {
    /// Orders per page (1-100); overrides WC_PER_PAGE
    #[arg(long)]
    per_page: Option<u32>,
    /// Pool size; overrides DB_MAX_CONNS
    #[arg(long)]
    max_conns: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    env_util::init_env();
    init_tracing("info,sqlx=warn")?;

    let config = SyncConfig::from_env()?.with_overrides(cli.per_page, cli.max_conns)?;
    info!(?config, "starting order sync");

    let provider = WooCommerceProvider::new(
        &config.orders_url,
        &config.consumer_key,
        &config.consumer_secret,
        Some(config.timeout_secs),
    )
    .context("build WooCommerce client")?;
    let db = Db::connect(&config.database_url, config.max_connections)
        .await
        .context("Db::connect failed")?;

    let engine = SyncEngine::new(provider, PgOrderStore::new(&db), config.per_page);
    let report = engine.run().await;
    report.log();

    db.pool.close().await;
    Ok(())
}
