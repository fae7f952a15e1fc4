use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use clinerp_core::{TenantId, UserId};

/// One audit record: who did what to which subject, in which tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Stable action name, e.g. "payment.recorded".
    pub action: String,
    pub subject_type: String,
    pub subject_id: String,
    pub properties: JsonValue,
    pub tenant_id: Option<TenantId>,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        action: impl Into<String>,
        subject_type: impl Into<String>,
        subject_id: impl ToString,
        tenant_id: Option<TenantId>,
        actor: UserId,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            action: action.into(),
            subject_type: subject_type.into(),
            subject_id: subject_id.to_string(),
            properties: JsonValue::Null,
            tenant_id,
            actor,
            occurred_at,
        }
    }

    pub fn with_properties(mut self, properties: JsonValue) -> Self {
        self.properties = properties;
        self
    }
}

/// Audit sink (mechanics only, transport-agnostic).
///
/// Implementations swallow their own errors; callers treat `record` as a
/// no-fail operation and never gate commits on it.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

impl<S> AuditSink for Arc<S>
where
    S: AuditSink + ?Sized,
{
    fn record(&self, event: AuditEvent) {
        (**self).record(event)
    }
}

/// In-memory sink for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    inner: Mutex<Vec<AuditEvent>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<AuditEvent> {
        match self.inner.lock() {
            Ok(events) => events.clone(),
            Err(_) => Vec::new(),
        }
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        // Lossy on a poisoned lock; audit is best-effort.
        if let Ok(mut events) = self.inner.lock() {
            events.push(event);
        }
    }
}

/// Sink that mirrors audit events into the tracing pipeline.
#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        tracing::info!(
            target: "audit",
            action = %event.action,
            subject_type = %event.subject_type,
            subject_id = %event.subject_id,
            actor = %event.actor,
            "audit event"
        );
    }
}

/// Sink that drops everything.
#[derive(Debug, Default)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _event: AuditEvent) {}
}
