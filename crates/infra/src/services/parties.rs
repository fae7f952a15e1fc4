//! Customer/supplier directory.

use chrono::Utc;

use clinerp_audit::AuditEvent;
use clinerp_auth::{Actor, TenantScope, stamp_tenant};
use clinerp_core::{DomainError, DomainResult, EntityId};
use clinerp_parties::{ContactInfo, Party, PartyId, PartyKind};

use super::Services;
use crate::StoreState;

impl Services {
    pub fn create_party(
        &self,
        actor: &Actor,
        kind: PartyKind,
        name: &str,
        contact: ContactInfo,
    ) -> DomainResult<Party> {
        let tenant_id = stamp_tenant(actor, None)?;
        let now = Utc::now();

        let party = self.store().write(|state| {
            let party = Party::new(
                PartyId::new(EntityId::new()),
                tenant_id,
                kind,
                name,
                contact,
                now,
            )?;
            state.upsert_party(party.clone());
            Ok(party)
        })?;

        self.emit(AuditEvent::new(
            "party.created",
            "party",
            party.id_typed(),
            Some(tenant_id),
            actor.user_id,
            now,
        ));
        Ok(party)
    }

    pub fn party(&self, actor: &Actor, id: PartyId) -> DomainResult<Party> {
        let scope = TenantScope::for_actor(actor);
        self.store().read(|state| {
            state
                .party(scope, id)
                .cloned()
                .ok_or_else(DomainError::not_found)
        })
    }
}

pub(crate) fn required_customer(
    state: &StoreState,
    scope: TenantScope,
    id: PartyId,
) -> DomainResult<Party> {
    let party = state
        .party(scope, id)
        .cloned()
        .ok_or_else(DomainError::not_found)?;
    if !party.is_customer() {
        return Err(DomainError::validation(
            "customer_id",
            "party is not a customer",
        ));
    }
    Ok(party)
}

pub(crate) fn required_supplier(
    state: &StoreState,
    scope: TenantScope,
    id: PartyId,
) -> DomainResult<Party> {
    let party = state
        .party(scope, id)
        .cloned()
        .ok_or_else(DomainError::not_found)?;
    if !party.is_supplier() {
        return Err(DomainError::validation(
            "supplier_id",
            "party is not a supplier",
        ));
    }
    Ok(party)
}
