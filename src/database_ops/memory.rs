//! In-process `OrderStore` with the same write rules as the Postgres tables:
//! primary key on orders, unique dedup key and foreign key on items, and the
//! status-guarded update.
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use super::store::{OrderSession, OrderStore, StoreError};
use crate::normalization::{Order, OrderItem};

#[derive(Debug, Default)]
pub struct MemoryState {
    pub orders: BTreeMap<String, Order>,
    pub items: Vec<OrderItem>,
    pub order_inserts: usize,
    pub order_updates: usize,
    pub item_inserts: usize,
    pub sessions_opened: usize,
    pub sessions_open: usize,
    failing_orders: HashSet<String>,
    failing_items: HashSet<String>,
    racing_statuses: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryOrderStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every order write for `order_id` fail with a statement error.
    pub fn fail_order_writes(&self, order_id: &str) {
        self.with(|s| s.failing_orders.insert(order_id.to_string()));
    }

    /// Make every item insert for `product_name` fail with a statement error.
    pub fn fail_item_writes(&self, product_name: &str) {
        self.with(|s| s.failing_items.insert(product_name.to_string()));
    }

    /// After the next status read of `order_id`, overwrite its stored status
    /// with `status`, as a concurrent writer would.
    pub fn race_status(&self, order_id: &str, status: &str) {
        self.with(|s| {
            s.racing_statuses
                .insert(order_id.to_string(), status.to_string())
        });
    }

    pub fn seed_order(&self, order: Order) {
        self.with(|s| s.orders.insert(order.order_id.clone(), order));
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut MemoryState) -> R) -> R {
        let mut guard = self.state.lock().unwrap();
        f(&mut guard)
    }
}

pub struct MemorySession {
    state: Arc<Mutex<MemoryState>>,
}

impl MemorySession {
    fn with<R>(&self, f: impl FnOnce(&mut MemoryState) -> R) -> R {
        let mut guard = self.state.lock().unwrap();
        f(&mut guard)
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.state.lock() {
            guard.sessions_open -= 1;
        }
    }
}

fn statement_error(msg: String) -> StoreError {
    StoreError::Statement(sqlx::Error::Protocol(msg))
}

#[async_trait::async_trait]
impl OrderStore for MemoryOrderStore {
    type Session = MemorySession;

    async fn session(&self) -> Result<MemorySession, StoreError> {
        self.with(|s| {
            s.sessions_opened += 1;
            s.sessions_open += 1;
        });
        Ok(MemorySession {
            state: Arc::clone(&self.state),
        })
    }
}

#[async_trait::async_trait]
impl OrderSession for MemorySession {
    async fn order_exists_with_status(
        &mut self,
        order_id: &str,
    ) -> Result<Option<String>, StoreError> {
        Ok(self.with(|s| {
            let seen = s.orders.get(order_id).map(|o| o.order_status.clone());
            if let Some(status) = s.racing_statuses.remove(order_id) {
                if let Some(row) = s.orders.get_mut(order_id) {
                    row.order_status = status;
                }
            }
            seen
        }))
    }

    async fn upsert_order(&mut self, order: &Order, exists: bool) -> Result<u64, StoreError> {
        self.with(|s| {
            if s.failing_orders.contains(&order.order_id) {
                return Err(statement_error(format!("order {} rejected", order.order_id)));
            }
            if !exists {
                if s.orders.contains_key(&order.order_id) {
                    return Err(statement_error(format!(
                        "duplicate key orders.order_id={}",
                        order.order_id
                    )));
                }
                s.orders.insert(order.order_id.clone(), order.clone());
                s.order_inserts += 1;
                return Ok(1);
            }
            match s.orders.get_mut(&order.order_id) {
                Some(row) if row.order_status != order.order_status => {
                    *row = order.clone();
                    s.order_updates += 1;
                    Ok(1)
                }
                _ => Ok(0),
            }
        })
    }

    async fn item_exists(
        &mut self,
        order_id: &str,
        product_name: &str,
        variation_details: &str,
    ) -> Result<bool, StoreError> {
        Ok(self.with(|s| {
            s.items.iter().any(|i| {
                i.order_id == order_id
                    && i.product_name == product_name
                    && i.variation_details == variation_details
            })
        }))
    }

    async fn insert_item(&mut self, item: &OrderItem) -> Result<(), StoreError> {
        self.with(|s| {
            if s.failing_items.contains(&item.product_name) {
                return Err(statement_error(format!("item {} rejected", item.product_name)));
            }
            if !s.orders.contains_key(&item.order_id) {
                return Err(statement_error(format!(
                    "foreign key violation: order {} missing",
                    item.order_id
                )));
            }
            let duplicate = s.items.iter().any(|i| {
                i.order_id == item.order_id
                    && i.product_name == item.product_name
                    && i.variation_details == item.variation_details
            });
            if duplicate {
                return Err(statement_error("duplicate order item key".to_string()));
            }
            s.items.push(item.clone());
            s.item_inserts += 1;
            Ok(())
        })
    }
}
