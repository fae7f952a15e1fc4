//! `clinerp-audit` — fire-and-forget audit sink.
//!
//! The core emits an [`AuditEvent`] after every successful business
//! operation. Delivery is best-effort and out-of-band: `record` is
//! infallible by contract, and a failing sink must never roll back the
//! business transaction that produced the event.

pub mod sink;

pub use sink::{AuditEvent, AuditSink, InMemoryAuditSink, NullAuditSink, TracingAuditSink};
