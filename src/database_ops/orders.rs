use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};
use tracing::instrument;

use super::db::Db;
use super::store::{OrderSession, OrderStore, StoreError};
use crate::normalization::{Order, OrderItem};

const SELECT_ORDER_STATUS: &str = "SELECT order_status FROM orders WHERE order_id = $1";

const INSERT_ORDER: &str = r#"
    INSERT INTO orders (
        order_id, customer_name, customer_email, customer_phone,
        billing_address, shipping_address, order_status, order_total,
        shipping_method, shipping_total
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
"#;

// The status guard lives in the statement itself so a matching status never
// rewrites the row, whatever the caller decided beforehand.
const UPDATE_ORDER_IF_STATUS_CHANGED: &str = r#"
    UPDATE orders SET
        customer_name = $2,
        customer_email = $3,
        customer_phone = $4,
        billing_address = $5,
        shipping_address = $6,
        order_status = $7,
        order_total = $8,
        shipping_method = $9,
        shipping_total = $10
    WHERE order_id = $1 AND order_status <> $7
"#;

const ITEM_EXISTS: &str = r#"
    SELECT EXISTS (
        SELECT 1 FROM order_items
        WHERE order_id = $1 AND product_name = $2 AND variation_details = $3
    )
"#;

const INSERT_ITEM: &str = r#"
    INSERT INTO order_items (
        order_id, product_name, quantity, price, total_price,
        variation_details, product_attributes
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7)
"#;

/// Postgres-backed order store over the shared pool.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(db: &Db) -> Self {
        Self {
            pool: db.pool.clone(),
        }
    }
}

/// A pooled connection checked out for one reconciliation call.
pub struct PgOrderSession {
    conn: PoolConnection<Postgres>,
}

#[async_trait::async_trait]
impl OrderStore for PgOrderStore {
    type Session = PgOrderSession;

    async fn session(&self) -> Result<PgOrderSession, StoreError> {
        let conn = self.pool.acquire().await.map_err(StoreError::Acquire)?;
        Ok(PgOrderSession { conn })
    }
}

#[async_trait::async_trait]
impl OrderSession for PgOrderSession {
    #[instrument(skip(self))]
    async fn order_exists_with_status(
        &mut self,
        order_id: &str,
    ) -> Result<Option<String>, StoreError> {
        let status = sqlx::query_scalar::<_, String>(SELECT_ORDER_STATUS)
            .bind(order_id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(status)
    }

    #[instrument(skip(self, order), fields(order_id = %order.order_id))]
    async fn upsert_order(&mut self, order: &Order, exists: bool) -> Result<u64, StoreError> {
        let sql = if exists {
            UPDATE_ORDER_IF_STATUS_CHANGED
        } else {
            INSERT_ORDER
        };
        let result = sqlx::query(sql)
            .bind(&order.order_id)
            .bind(&order.customer_name)
            .bind(&order.customer_email)
            .bind(&order.customer_phone)
            .bind(&order.billing_address)
            .bind(&order.shipping_address)
            .bind(&order.order_status)
            .bind(&order.order_total)
            .bind(&order.shipping_method)
            .bind(&order.shipping_total)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn item_exists(
        &mut self,
        order_id: &str,
        product_name: &str,
        variation_details: &str,
    ) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(ITEM_EXISTS)
            .bind(order_id)
            .bind(product_name)
            .bind(variation_details)
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(exists)
    }

    #[instrument(skip(self, item), fields(order_id = %item.order_id, product = %item.product_name))]
    async fn insert_item(&mut self, item: &OrderItem) -> Result<(), StoreError> {
        sqlx::query(INSERT_ITEM)
            .bind(&item.order_id)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(&item.price)
            .bind(&item.total_price)
            .bind(&item.variation_details)
            .bind(&item.product_attributes)
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }
}
