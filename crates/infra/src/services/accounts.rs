//! Chart of accounts management.

use chrono::Utc;

use clinerp_accounting::{Account, AccountId, AccountKind};
use clinerp_audit::AuditEvent;
use clinerp_auth::{Actor, TenantScope, stamp_tenant};
use clinerp_core::{DomainError, DomainResult, EntityId, TenantId};

use super::Services;
use crate::StoreState;

impl Services {
    /// Create an account in the caller's tenant (or, for super-admins, in the
    /// explicitly named tenant).
    pub fn create_account(
        &self,
        actor: &Actor,
        tenant_id: Option<TenantId>,
        code: &str,
        name: &str,
        kind: AccountKind,
        parent_id: Option<AccountId>,
    ) -> DomainResult<Account> {
        let tenant_id = stamp_tenant(actor, tenant_id)?;
        let now = Utc::now();

        let account = self.store().write(|state| {
            if state.account_by_code(tenant_id, code).is_some() {
                return Err(DomainError::conflict(format!(
                    "account code {code} already exists"
                )));
            }

            let account = Account::new(
                AccountId::new(EntityId::new()),
                tenant_id,
                code,
                name,
                kind,
                parent_id,
            )?;

            if let Some(parent_id) = parent_id {
                // Integrity check on the write side: a parent in another
                // tenant is reported as such, not masked as absent.
                let parent = state
                    .account_any_tenant(parent_id)
                    .ok_or_else(DomainError::not_found)?;
                account.ensure_child_of(parent)?;
            }

            state.upsert_account(account.clone());
            Ok(account)
        })?;

        self.emit(AuditEvent::new(
            "account.created",
            "account",
            account.id_typed(),
            Some(tenant_id),
            actor.user_id,
            now,
        ));
        Ok(account)
    }

    pub fn chart(&self, actor: &Actor) -> DomainResult<Vec<Account>> {
        let scope = TenantScope::for_actor(actor);
        self.store()
            .read(|state| Ok(state.accounts_of(scope).into_iter().cloned().collect()))
    }

    pub fn account_by_code(&self, actor: &Actor, code: &str) -> DomainResult<Account> {
        let tenant_id = stamp_tenant(actor, None)?;
        self.store().read(|state| {
            state
                .account_by_code(tenant_id, code)
                .cloned()
                .ok_or_else(DomainError::not_found)
        })
    }
}

/// Resolve a chart account the operation cannot do without. Absence is an
/// operator/setup problem, reported distinctly from business conflicts.
pub(crate) fn required_account(
    state: &StoreState,
    tenant_id: TenantId,
    code: &str,
) -> DomainResult<AccountId> {
    state
        .account_by_code(tenant_id, code)
        .map(|a| a.id_typed())
        .ok_or_else(|| {
            DomainError::configuration(format!("chart of accounts is missing account {code}"))
        })
}
