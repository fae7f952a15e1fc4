//! `clinerp-sales` — orders and the order state machine.

pub mod order;

pub use order::{Order, OrderId, OrderItem, OrderStatus};
