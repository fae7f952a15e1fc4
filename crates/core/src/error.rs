//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic business/domain failures. Infrastructure
/// concerns belong elsewhere. Every variant is detected before any write, so a
/// returned error implies nothing was persisted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed or missing input, reported with the offending field.
    #[error("validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    /// A business rule was violated given the current state
    /// (duplicate invoice, exceeds-remaining, unbalanced entry, ...).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The tenant is missing required setup (e.g. chart-of-accounts entries).
    /// An operator/setup problem, not a user mistake.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The referenced entity is absent — or outside the caller's tenant
    /// scope, which is deliberately indistinguishable from absent.
    #[error("not found")]
    NotFound,

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
