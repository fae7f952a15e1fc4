//! Tenant scope guard.
//!
//! Every read/write against a tenant-scoped table is restricted to the
//! caller's tenant. The scope is an explicit parameter on every store
//! accessor, not a hidden hook: callers derive it once per operation via
//! [`TenantScope::for_actor`] and pass it down.

use clinerp_core::{DomainError, DomainResult, TenantId};

use crate::Actor;

/// Visibility of tenant-scoped rows for one caller.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TenantScope {
    /// Super-admin: no tenant filter.
    All,
    /// Regular member: rows of exactly this tenant.
    Tenant(TenantId),
    /// Caller without any tenant: scoped reads return nothing —
    /// never "all tenants".
    Nothing,
}

impl TenantScope {
    pub fn for_actor(actor: &Actor) -> Self {
        if actor.super_admin {
            TenantScope::All
        } else {
            match actor.tenant_id {
                Some(tenant_id) => TenantScope::Tenant(tenant_id),
                None => TenantScope::Nothing,
            }
        }
    }

    /// Whether a row owned by `tenant_id` is visible under this scope.
    pub fn permits(&self, tenant_id: TenantId) -> bool {
        match self {
            TenantScope::All => true,
            TenantScope::Tenant(own) => *own == tenant_id,
            TenantScope::Nothing => false,
        }
    }
}

/// Resolve the tenant id stamped onto a newly created row.
///
/// Auto-populates from the caller's identity unless the caller is a
/// super-admin or the value was explicitly set. A mismatched explicit tenant
/// is rejected here, before anything is written.
pub fn stamp_tenant(actor: &Actor, explicit: Option<TenantId>) -> DomainResult<TenantId> {
    match explicit {
        Some(tenant_id) => {
            if actor.super_admin || actor.tenant_id == Some(tenant_id) {
                Ok(tenant_id)
            } else {
                Err(DomainError::conflict("cross-tenant reference"))
            }
        }
        None => actor.tenant_id.ok_or_else(|| {
            DomainError::validation("tenant_id", "no tenant to stamp onto the new record")
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinerp_core::UserId;

    fn tenant() -> TenantId {
        TenantId::new()
    }

    #[test]
    fn member_scope_permits_only_own_tenant() {
        let own = tenant();
        let scope = TenantScope::for_actor(&Actor::member(UserId::new(), own));
        assert!(scope.permits(own));
        assert!(!scope.permits(tenant()));
    }

    #[test]
    fn super_admin_scope_permits_everything() {
        let scope = TenantScope::for_actor(&Actor::super_admin(UserId::new()));
        assert!(scope.permits(tenant()));
    }

    #[test]
    fn detached_scope_permits_nothing() {
        let scope = TenantScope::for_actor(&Actor::detached(UserId::new()));
        assert!(!scope.permits(tenant()));
    }

    #[test]
    fn stamp_defaults_to_the_actor_tenant() {
        let own = tenant();
        let actor = Actor::member(UserId::new(), own);
        assert_eq!(stamp_tenant(&actor, None).unwrap(), own);
    }

    #[test]
    fn stamp_rejects_mismatched_explicit_tenant() {
        let actor = Actor::member(UserId::new(), tenant());
        let err = stamp_tenant(&actor, Some(tenant())).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(msg) if msg.contains("cross-tenant")));
    }

    #[test]
    fn super_admin_may_stamp_any_tenant_but_must_name_one() {
        let actor = Actor::super_admin(UserId::new());
        let target = tenant();
        assert_eq!(stamp_tenant(&actor, Some(target)).unwrap(), target);
        assert!(matches!(
            stamp_tenant(&actor, None).unwrap_err(),
            DomainError::Validation { .. }
        ));
    }

    #[test]
    fn detached_caller_cannot_create_scoped_rows() {
        let actor = Actor::detached(UserId::new());
        assert!(stamp_tenant(&actor, None).is_err());
        assert!(stamp_tenant(&actor, Some(tenant())).is_err());
    }
}
