use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clinerp_core::{DomainError, DomainResult, Entity, EntityId, TenantId};

/// Party identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyId(pub EntityId);

impl PartyId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PartyId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Party kind: customer or supplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyKind {
    Customer,
    Supplier,
}

/// Party status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyStatus {
    Active,
    Suspended,
}

/// Contact information for a party.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// A party the tenant does business with (customer or supplier).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    id: PartyId,
    tenant_id: TenantId,
    kind: PartyKind,
    name: String,
    contact: ContactInfo,
    status: PartyStatus,
    created_at: DateTime<Utc>,
}

impl Party {
    pub fn new(
        id: PartyId,
        tenant_id: TenantId,
        kind: PartyKind,
        name: impl Into<String>,
        contact: ContactInfo,
        at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name", "must not be empty"));
        }

        Ok(Self {
            id,
            tenant_id,
            kind,
            name,
            contact,
            status: PartyStatus::Active,
            created_at: at,
        })
    }

    pub fn id_typed(&self) -> PartyId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn kind(&self) -> PartyKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    pub fn status(&self) -> PartyStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_customer(&self) -> bool {
        self.kind == PartyKind::Customer
    }

    pub fn is_supplier(&self) -> bool {
        self.kind == PartyKind::Supplier
    }
}

impl Entity for Party {
    type Id = PartyId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_an_active_party() {
        let party = Party::new(
            PartyId::new(EntityId::new()),
            TenantId::new(),
            PartyKind::Customer,
            "Jamie Rivers",
            ContactInfo::default(),
            Utc::now(),
        )
        .unwrap();
        assert!(party.is_customer());
        assert_eq!(party.status(), PartyStatus::Active);
    }

    #[test]
    fn rejects_blank_names() {
        let err = Party::new(
            PartyId::new(EntityId::new()),
            TenantId::new(),
            PartyKind::Supplier,
            "   ",
            ContactInfo::default(),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
    }
}
