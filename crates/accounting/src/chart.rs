use serde::{Deserialize, Serialize};

use clinerp_core::{DomainError, DomainResult, Entity, EntityId, TenantId};

/// Account identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub EntityId);

impl AccountId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for AccountId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// High-level account kind (determines normal balance side).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

/// Account codes seeded for every tenant at onboarding.
pub mod codes {
    pub const CASH: &str = "1000";
    pub const ACCOUNTS_RECEIVABLE: &str = "1100";
    pub const CUSTOMER_CREDIT: &str = "2100";
    pub const SALES_REVENUE: &str = "4000";
}

/// One node of a tenant's account tree.
///
/// Codes are unique per tenant; a child's tenant must equal its parent's
/// tenant (checked in [`Account::ensure_child_of`] and again where the parent
/// row is looked up).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    tenant_id: TenantId,
    code: String,
    name: String,
    kind: AccountKind,
    parent_id: Option<AccountId>,
}

impl Account {
    pub fn new(
        id: AccountId,
        tenant_id: TenantId,
        code: impl Into<String>,
        name: impl Into<String>,
        kind: AccountKind,
        parent_id: Option<AccountId>,
    ) -> DomainResult<Self> {
        let code = code.into();
        let name = name.into();

        if code.trim().is_empty() {
            return Err(DomainError::validation("code", "must not be empty"));
        }
        if name.trim().is_empty() {
            return Err(DomainError::validation("name", "must not be empty"));
        }

        Ok(Self {
            id,
            tenant_id,
            code,
            name,
            kind,
            parent_id,
        })
    }

    pub fn id_typed(&self) -> AccountId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AccountKind {
        self.kind
    }

    pub fn parent_id(&self) -> Option<AccountId> {
        self.parent_id
    }

    /// A child account may only hang under a parent of the same tenant.
    pub fn ensure_child_of(&self, parent: &Account) -> DomainResult<()> {
        if self.tenant_id != parent.tenant_id {
            return Err(DomainError::conflict("cross-tenant reference"));
        }
        Ok(())
    }
}

impl Entity for Account {
    type Id = AccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// The default chart seeded at tenant creation.
pub fn default_chart(tenant_id: TenantId) -> Vec<Account> {
    let defaults = [
        (codes::CASH, "Cash/Bank", AccountKind::Asset),
        (
            codes::ACCOUNTS_RECEIVABLE,
            "Accounts Receivable",
            AccountKind::Asset,
        ),
        (
            codes::CUSTOMER_CREDIT,
            "Customer Credit",
            AccountKind::Liability,
        ),
        (codes::SALES_REVENUE, "Sales Revenue", AccountKind::Revenue),
    ];

    defaults
        .into_iter()
        .map(|(code, name, kind)| Account {
            id: AccountId::new(EntityId::new()),
            tenant_id,
            code: code.to_string(),
            name: name.to_string(),
            kind,
            parent_id: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_chart_seeds_the_four_standard_accounts() {
        let tenant_id = TenantId::new();
        let chart = default_chart(tenant_id);
        let codes: Vec<&str> = chart.iter().map(|a| a.code()).collect();
        assert_eq!(codes, vec!["1000", "1100", "2100", "4000"]);
        assert!(chart.iter().all(|a| a.tenant_id() == tenant_id));
        assert!(chart.iter().all(|a| a.parent_id().is_none()));
    }

    #[test]
    fn cross_tenant_parent_is_rejected() {
        let child = Account::new(
            AccountId::new(EntityId::new()),
            TenantId::new(),
            "1010",
            "Petty Cash",
            AccountKind::Asset,
            None,
        )
        .unwrap();
        let foreign_parent = Account::new(
            AccountId::new(EntityId::new()),
            TenantId::new(),
            "1000",
            "Cash/Bank",
            AccountKind::Asset,
            None,
        )
        .unwrap();

        let err = child.ensure_child_of(&foreign_parent).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(msg) if msg.contains("cross-tenant")));
    }

    #[test]
    fn blank_codes_are_invalid() {
        let err = Account::new(
            AccountId::new(EntityId::new()),
            TenantId::new(),
            "",
            "Cash",
            AccountKind::Asset,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
    }
}
