//! Service layer: every core operation enters through [`Services`].
//!
//! The shape of an operation is always the same: derive the caller's scope,
//! open one store transaction, validate everything against the locked state
//! (decide), perform the writes (apply, infallible), then emit an audit
//! event. Audit emission happens after the transaction and never affects its
//! outcome.

pub mod accounts;
pub mod inventory;
pub mod invoices;
pub mod journal;
pub mod orders;
pub mod parties;
pub mod payments;
pub mod purchasing;
pub mod statements;
pub mod tenants;

use std::sync::Arc;

use clinerp_audit::{AuditEvent, AuditSink, NullAuditSink};

use crate::Store;

pub use orders::NewOrderItem;
pub use purchasing::NewPurchaseLine;

/// Service facade over the store and the audit sink.
#[derive(Clone)]
pub struct Services {
    store: Arc<Store>,
    audit: Arc<dyn AuditSink>,
}

impl Services {
    pub fn new(store: Arc<Store>, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, audit }
    }

    /// Fresh in-memory services with audit disabled. Tests that assert on
    /// audit events pass an [`clinerp_audit::InMemoryAuditSink`] instead.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(Store::new()), Arc::new(NullAuditSink))
    }

    pub fn with_audit(audit: Arc<dyn AuditSink>) -> Self {
        Self::new(Arc::new(Store::new()), audit)
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Fire-and-forget: the sink's fate never affects the business result.
    pub(crate) fn emit(&self, event: AuditEvent) {
        self.audit.record(event);
    }
}
