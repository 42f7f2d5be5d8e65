pub mod db;
#[cfg(test)]
pub mod memory;
pub mod orders;
pub mod store;

pub use orders::PgOrderStore;
pub use store::{OrderSession, OrderStore, StoreError};
