use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use clinerp_core::{DomainError, DomainResult, Entity, TenantId};

/// Length of the onboarding trial window.
pub const TRIAL_PERIOD_DAYS: i64 = 14;

/// Tenant status lifecycle. Tenants are never deleted, only suspended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    Trial,
    Active,
    Suspended,
}

/// A tenant (company). Owns every tenant-scoped entity in the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    id: TenantId,
    name: String,
    slug: String,
    status: TenantStatus,
    trial_ends_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl Tenant {
    /// Create a tenant at onboarding, starting its trial window.
    pub fn onboard(
        id: TenantId,
        name: impl Into<String>,
        slug: impl Into<String>,
        at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        let slug = slug.into();

        if name.trim().is_empty() {
            return Err(DomainError::validation("name", "must not be empty"));
        }
        validate_slug(&slug)?;

        Ok(Self {
            id,
            name,
            slug,
            status: TenantStatus::Trial,
            trial_ends_at: at + Duration::days(TRIAL_PERIOD_DAYS),
            created_at: at,
        })
    }

    pub fn id_typed(&self) -> TenantId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn status(&self) -> TenantStatus {
        self.status
    }

    pub fn trial_ends_at(&self) -> DateTime<Utc> {
        self.trial_ends_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn in_trial(&self, now: DateTime<Utc>) -> bool {
        self.status == TenantStatus::Trial && now < self.trial_ends_at
    }

    pub fn activate(&self) -> DomainResult<Tenant> {
        if self.status == TenantStatus::Active {
            return Err(DomainError::conflict("tenant is already active"));
        }
        let mut tenant = self.clone();
        tenant.status = TenantStatus::Active;
        Ok(tenant)
    }

    pub fn suspend(&self) -> DomainResult<Tenant> {
        if self.status == TenantStatus::Suspended {
            return Err(DomainError::conflict("tenant is already suspended"));
        }
        let mut tenant = self.clone();
        tenant.status = TenantStatus::Suspended;
        Ok(tenant)
    }
}

impl Entity for Tenant {
    type Id = TenantId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn validate_slug(slug: &str) -> DomainResult<()> {
    let valid = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(DomainError::validation(
            "slug",
            "must be non-empty lowercase ascii letters, digits or hyphens",
        ))
    }
}
