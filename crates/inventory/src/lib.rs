//! `clinerp-inventory` — stock movements and the issue/receive rules.

pub mod movement;

pub use movement::{MovementDirection, StockMovement, StockRef, issue, receive, reconciles};
