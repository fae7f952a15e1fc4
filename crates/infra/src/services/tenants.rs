//! Tenant onboarding and lifecycle.

use chrono::Utc;

use clinerp_accounting::default_chart;
use clinerp_audit::AuditEvent;
use clinerp_auth::{Actor, TenantScope};
use clinerp_core::{DomainError, DomainResult, TenantId};
use clinerp_tenancy::Tenant;

use super::Services;

impl Services {
    /// Create a tenant and seed its default chart of accounts, atomically.
    pub fn onboard_tenant(&self, actor: &Actor, name: &str, slug: &str) -> DomainResult<Tenant> {
        if !actor.super_admin {
            return Err(DomainError::conflict("only super-admins can onboard tenants"));
        }
        let now = Utc::now();

        let tenant = self.store().write(|state| {
            if state.tenant_slug_taken(slug) {
                return Err(DomainError::conflict("slug is already taken"));
            }
            let tenant = Tenant::onboard(TenantId::new(), name, slug, now)?;

            for account in default_chart(tenant.id_typed()) {
                state.upsert_account(account);
            }
            state.upsert_tenant(tenant.clone());
            Ok(tenant)
        })?;

        tracing::info!(tenant_id = %tenant.id_typed(), slug, "tenant onboarded");
        self.emit(AuditEvent::new(
            "tenant.onboarded",
            "tenant",
            tenant.id_typed(),
            Some(tenant.id_typed()),
            actor.user_id,
            now,
        ));
        Ok(tenant)
    }

    pub fn tenant(&self, actor: &Actor, id: TenantId) -> DomainResult<Tenant> {
        let scope = TenantScope::for_actor(actor);
        self.store().read(|state| {
            state
                .tenant(scope, id)
                .cloned()
                .ok_or_else(DomainError::not_found)
        })
    }

    pub fn activate_tenant(&self, actor: &Actor, id: TenantId) -> DomainResult<Tenant> {
        self.transition_tenant(actor, id, "tenant.activated", Tenant::activate)
    }

    /// Tenants are never deleted; suspension is the terminal lever.
    pub fn suspend_tenant(&self, actor: &Actor, id: TenantId) -> DomainResult<Tenant> {
        self.transition_tenant(actor, id, "tenant.suspended", Tenant::suspend)
    }

    fn transition_tenant(
        &self,
        actor: &Actor,
        id: TenantId,
        action: &str,
        transition: impl FnOnce(&Tenant) -> DomainResult<Tenant>,
    ) -> DomainResult<Tenant> {
        if !actor.super_admin {
            return Err(DomainError::conflict(
                "only super-admins can change tenant status",
            ));
        }
        let scope = TenantScope::for_actor(actor);
        let now = Utc::now();

        let tenant = self.store().write(|state| {
            let tenant = state.tenant(scope, id).ok_or_else(DomainError::not_found)?;
            let updated = transition(tenant)?;
            state.upsert_tenant(updated.clone());
            Ok(updated)
        })?;

        self.emit(AuditEvent::new(
            action,
            "tenant",
            id,
            Some(id),
            actor.user_id,
            now,
        ));
        Ok(tenant)
    }
}
