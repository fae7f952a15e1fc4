//! Statement generation — the pure read side.

use chrono::NaiveDate;

use clinerp_accounting::{Statement, statement};
use clinerp_auth::{Actor, TenantScope};
use clinerp_core::{DomainError, DomainResult, Money};
use clinerp_parties::PartyId;

use super::{Services, parties};

impl Services {
    /// Customer statement over an optional date range. No locks are held
    /// beyond the read, and nothing is written — safe to call repeatedly and
    /// from replicas.
    pub fn customer_statement(
        &self,
        actor: &Actor,
        customer_id: PartyId,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> DomainResult<Statement> {
        let scope = TenantScope::for_actor(actor);
        self.store().read(|state| {
            let party = parties::required_customer(state, scope, customer_id)?;
            let entries = state.customer_entries(party.tenant_id(), customer_id);
            Ok(statement(&entries, from, to))
        })
    }

    /// Supplier statement over an optional date range.
    pub fn supplier_statement(
        &self,
        actor: &Actor,
        supplier_id: PartyId,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> DomainResult<Statement> {
        let scope = TenantScope::for_actor(actor);
        self.store().read(|state| {
            let party = parties::required_supplier(state, scope, supplier_id)?;
            let entries = state.supplier_entries(party.tenant_id(), supplier_id);
            Ok(statement(&entries, from, to))
        })
    }

    /// A party's current balance: the closing balance of its full statement.
    pub fn party_balance(&self, actor: &Actor, party_id: PartyId) -> DomainResult<Money> {
        let scope = TenantScope::for_actor(actor);
        self.store().read(|state| {
            let party = state
                .party(scope, party_id)
                .ok_or_else(DomainError::not_found)?;
            let entries = if party.is_customer() {
                state.customer_entries(party.tenant_id(), party_id)
            } else {
                state.supplier_entries(party.tenant_id(), party_id)
            };
            Ok(statement(&entries, None, None).closing_balance)
        })
    }
}
