use serde::{Deserialize, Serialize};

use clinerp_core::{TenantId, UserId};

/// The authenticated caller of a core operation.
///
/// Construction is decoupled from storage and transport: the API layer derives
/// an `Actor` from its token claims and threads it explicitly into every
/// service call. The core never reads ambient identity state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    /// The tenant the caller belongs to. `None` for super-admins operating
    /// across tenants and for callers whose membership was revoked.
    pub tenant_id: Option<TenantId>,
    /// Super-admins bypass tenant scoping entirely.
    pub super_admin: bool,
}

impl Actor {
    /// A regular member of one tenant.
    pub fn member(user_id: UserId, tenant_id: TenantId) -> Self {
        Self {
            user_id,
            tenant_id: Some(tenant_id),
            super_admin: false,
        }
    }

    /// A super-admin, unscoped.
    pub fn super_admin(user_id: UserId) -> Self {
        Self {
            user_id,
            tenant_id: None,
            super_admin: true,
        }
    }

    /// An authenticated caller with no tenant membership. Scoped reads for
    /// such a caller come back empty.
    pub fn detached(user_id: UserId) -> Self {
        Self {
            user_id,
            tenant_id: None,
            super_admin: false,
        }
    }
}
