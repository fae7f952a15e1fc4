//! `clinerp-infra` — storage and the service layer.
//!
//! The store is an in-memory database with explicit tenant-scoped accessors;
//! the services orchestrate every core operation (scope check, decide, apply,
//! audit) inside one store transaction.

pub mod store;
pub mod services;

mod integration_tests;

pub use services::Services;
pub use store::{Store, StoreState};
