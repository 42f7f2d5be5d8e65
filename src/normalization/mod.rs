pub mod order;

pub use order::{normalize_order, normalize_page, Order, OrderItem};
