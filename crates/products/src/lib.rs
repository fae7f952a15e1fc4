//! `clinerp-products` — product catalog.

pub mod product;

pub use product::{Product, ProductId};
