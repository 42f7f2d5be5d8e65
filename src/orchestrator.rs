//! Page-by-page reconciliation of the remote order collection into the store.
//!
//! The run is a small state machine:
//!
//! ```text
//! Fetching --non-empty 2xx--> ProcessingPage --last order done--> Fetching
//! Fetching --empty page | non-2xx--> Done
//! Fetching --transport/decode error--> Failed
//! ```
//!
//! Persistence errors never change state; they are counted per order/item and
//! the run moves on.
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::database_ops::{OrderSession, OrderStore, StoreError};
use crate::normalization::{normalize_page, Order, OrderItem};
use crate::woocommerce::{OrderSource, RawOrder, RemotePage};

pub const DEFAULT_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Inserted,
    Updated,
    Skipped,
}

impl ReconcileOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::Updated => "updated",
            Self::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoneReason {
    /// An empty page came back.
    Exhausted,
    /// The source answered with a non-2xx status.
    HttpStatus(u16),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Done(DoneReason),
    Failed(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl OutcomeCounts {
    fn record(&mut self, result: &Result<ReconcileOutcome, StoreError>) {
        match result {
            Ok(ReconcileOutcome::Inserted) => self.inserted += 1,
            Ok(ReconcileOutcome::Updated) => self.updated += 1,
            Ok(ReconcileOutcome::Skipped) => self.skipped += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// End-of-run summary.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub outcome: RunOutcome,
    /// Fetch calls made, including the terminating one.
    pub pages_fetched: u32,
    pub orders: OutcomeCounts,
    pub items: OutcomeCounts,
    pub elapsed: Duration,
}

impl SyncReport {
    pub fn log(&self) {
        let elapsed_ms = self.elapsed.as_millis() as u64;
        match &self.outcome {
            RunOutcome::Done(reason) => info!(
                ?reason,
                pages = self.pages_fetched,
                orders_inserted = self.orders.inserted,
                orders_updated = self.orders.updated,
                orders_skipped = self.orders.skipped,
                orders_failed = self.orders.failed,
                items_inserted = self.items.inserted,
                items_skipped = self.items.skipped,
                items_failed = self.items.failed,
                elapsed_ms,
                "order sync finished"
            ),
            RunOutcome::Failed(message) => error!(
                error = %message,
                pages = self.pages_fetched,
                orders_inserted = self.orders.inserted,
                orders_updated = self.orders.updated,
                orders_skipped = self.orders.skipped,
                orders_failed = self.orders.failed,
                items_inserted = self.items.inserted,
                items_skipped = self.items.skipped,
                items_failed = self.items.failed,
                elapsed_ms,
                "order sync aborted"
            ),
        }
    }
}

enum SyncState {
    Fetching { page: u32 },
    ProcessingPage { page: u32, orders: Vec<RawOrder> },
    Done(DoneReason),
    Failed(String),
}

/// Insert a new order, rewrite it when its status changed, otherwise leave it.
pub async fn reconcile_order<S: OrderStore>(
    store: &S,
    order: &Order,
) -> Result<ReconcileOutcome, StoreError> {
    let mut session = store.session().await?;
    match session.order_exists_with_status(&order.order_id).await? {
        None => {
            session.upsert_order(order, false).await?;
            Ok(ReconcileOutcome::Inserted)
        }
        Some(status) if status == order.order_status => Ok(ReconcileOutcome::Skipped),
        Some(_) => match session.upsert_order(order, true).await? {
            0 => Ok(ReconcileOutcome::Skipped),
            _ => Ok(ReconcileOutcome::Updated),
        },
    }
}

/// Insert an item the first time its dedup key is seen; never update it.
pub async fn reconcile_item<S: OrderStore>(
    store: &S,
    item: &OrderItem,
) -> Result<ReconcileOutcome, StoreError> {
    let mut session = store.session().await?;
    let exists = session
        .item_exists(&item.order_id, &item.product_name, &item.variation_details)
        .await?;
    if exists {
        return Ok(ReconcileOutcome::Skipped);
    }
    session.insert_item(item).await?;
    Ok(ReconcileOutcome::Inserted)
}

pub struct SyncEngine<Src, St> {
    source: Src,
    store: St,
    per_page: u32,
}

impl<Src, St> SyncEngine<Src, St>
where
    Src: OrderSource,
    St: OrderStore,
{
    pub fn new(source: Src, store: St, per_page: u32) -> Self {
        Self {
            source,
            store,
            per_page,
        }
    }

    /// Walk the collection from page 1 until it is exhausted or the source fails.
    pub async fn run(&self) -> SyncReport {
        let started = Instant::now();
        let mut pages_fetched = 0u32;
        let mut orders = OutcomeCounts::default();
        let mut items = OutcomeCounts::default();

        let mut state = SyncState::Fetching { page: 1 };
        let outcome = loop {
            state = match state {
                SyncState::Fetching { page } => {
                    pages_fetched += 1;
                    self.fetch(page).await
                }
                SyncState::ProcessingPage { page, orders: raw } => {
                    self.process_page(page, raw, &mut orders, &mut items).await;
                    SyncState::Fetching { page: page + 1 }
                }
                SyncState::Done(reason) => break RunOutcome::Done(reason),
                SyncState::Failed(message) => break RunOutcome::Failed(message),
            };
        };

        SyncReport {
            outcome,
            pages_fetched,
            orders,
            items,
            elapsed: started.elapsed(),
        }
    }

    async fn fetch(&self, page: u32) -> SyncState {
        match self.source.fetch_page(page, self.per_page).await {
            Ok(RemotePage::Orders(raw)) if raw.is_empty() => {
                info!(page, "no more orders; pagination exhausted");
                SyncState::Done(DoneReason::Exhausted)
            }
            Ok(RemotePage::Orders(raw)) => {
                info!(page, orders = raw.len(), "fetched orders page");
                SyncState::ProcessingPage { page, orders: raw }
            }
            Ok(RemotePage::Rejected {
                status,
                reason,
                body,
            }) => {
                warn!(page, status, %reason, %body, "orders request rejected; stopping");
                SyncState::Done(DoneReason::HttpStatus(status))
            }
            Err(e) => {
                error!(page, error = %e, "orders fetch failed; stopping");
                SyncState::Failed(e.to_string())
            }
        }
    }

    async fn process_page(
        &self,
        page: u32,
        raw: Vec<RawOrder>,
        order_counts: &mut OutcomeCounts,
        item_counts: &mut OutcomeCounts,
    ) {
        for (order, items) in normalize_page(raw) {
            let result = reconcile_order(&self.store, &order).await;
            match &result {
                Ok(outcome) => debug!(
                    page,
                    order_id = %order.order_id,
                    outcome = outcome.as_str(),
                    "order reconciled"
                ),
                Err(e) => error!(page, order_id = %order.order_id, error = %e, "order write failed"),
            }
            order_counts.record(&result);

            for item in &items {
                let result = reconcile_item(&self.store, item).await;
                match &result {
                    Ok(outcome) => debug!(
                        order_id = %item.order_id,
                        product = %item.product_name,
                        outcome = outcome.as_str(),
                        "order item reconciled"
                    ),
                    Err(e) => error!(
                        order_id = %item.order_id,
                        product = %item.product_name,
                        error = %e,
                        "order item write failed"
                    ),
                }
                item_counts.record(&result);
            }
        }
    }
}
