use thiserror::Error;

use crate::normalization::{Order, OrderItem};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to acquire store connection: {0}")]
    Acquire(#[source] sqlx::Error),
    #[error("store statement failed: {0}")]
    Statement(#[from] sqlx::Error),
}

/// Hands out scoped sessions; one session backs a single reconciliation call
/// and releases its connection when dropped.
#[async_trait::async_trait]
pub trait OrderStore: Send + Sync {
    type Session: OrderSession;

    async fn session(&self) -> Result<Self::Session, StoreError>;
}

#[async_trait::async_trait]
pub trait OrderSession: Send {
    /// Persisted status for `order_id`, or `None` when no row exists.
    async fn order_exists_with_status(
        &mut self,
        order_id: &str,
    ) -> Result<Option<String>, StoreError>;

    /// Insert when `exists` is false; otherwise overwrite every non-key column,
    /// but only if the stored status differs from `order.order_status`.
    /// Returns the number of rows written.
    async fn upsert_order(&mut self, order: &Order, exists: bool) -> Result<u64, StoreError>;

    async fn item_exists(
        &mut self,
        order_id: &str,
        product_name: &str,
        variation_details: &str,
    ) -> Result<bool, StoreError>;

    async fn insert_item(&mut self, item: &OrderItem) -> Result<(), StoreError>;
}
