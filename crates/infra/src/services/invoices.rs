//! Invoices outside the order flow: appointment completion and cancellation.

use chrono::Utc;

use clinerp_accounting::{
    JournalEntry, JournalEntryId, JournalLine, LedgerEntryKind, NewLedgerEntry, SourceRef, codes,
};
use clinerp_audit::AuditEvent;
use clinerp_auth::{Actor, TenantScope, stamp_tenant};
use clinerp_core::{DomainError, DomainResult, EntityId, Money};
use clinerp_invoicing::{Invoice, InvoiceId, InvoiceSource, net_paid, remaining};
use clinerp_parties::PartyId;

use super::{Services, accounts, parties};

impl Services {
    /// Invoice a completed appointment.
    ///
    /// Idempotent: if the appointment already has an invoice, that invoice is
    /// returned and nothing else happens. Otherwise the invoice is created
    /// and, for a positive amount, Dr Accounts-Receivable / Cr Sales is
    /// posted along with the customer ledger debit. A tenant whose chart is
    /// missing those accounts gets a configuration error, never a silent
    /// skip.
    pub fn complete_appointment(
        &self,
        actor: &Actor,
        appointment_id: EntityId,
        customer_id: PartyId,
        amount: Money,
    ) -> DomainResult<Invoice> {
        let tenant_id = stamp_tenant(actor, None)?;
        let scope = TenantScope::for_actor(actor);
        let now = Utc::now();

        let (invoice, reused) = self.store().write(|state| {
            if let Some(existing) = state.invoice_for_appointment(tenant_id, appointment_id) {
                return Ok((existing.clone(), true));
            }
            parties::required_customer(state, scope, customer_id)?;

            let invoice = Invoice::issue(
                InvoiceId::new(EntityId::new()),
                tenant_id,
                InvoiceSource::Appointment(appointment_id),
                customer_id,
                Vec::new(),
                amount,
                now,
            )?;

            let mut postings = None;
            if amount.is_positive() {
                let ar = accounts::required_account(state, tenant_id, codes::ACCOUNTS_RECEIVABLE)?;
                let sales = accounts::required_account(state, tenant_id, codes::SALES_REVENUE)?;
                let journal = JournalEntry::post(
                    JournalEntryId::new(EntityId::new()),
                    tenant_id,
                    now.date_naive(),
                    format!("AR for invoice {}", invoice.number()),
                    Some(SourceRef::Invoice(invoice.id_typed().0)),
                    vec![JournalLine::debit(ar, amount), JournalLine::credit(sales, amount)],
                    actor.user_id,
                    now,
                )?;
                let ledger = NewLedgerEntry::debit(
                    customer_id,
                    now.date_naive(),
                    LedgerEntryKind::Invoice,
                    amount,
                    format!("Invoice {}", invoice.number()),
                    SourceRef::Invoice(invoice.id_typed().0),
                );
                postings = Some((journal, ledger));
            }

            state.upsert_invoice(invoice.clone());
            state.link_appointment_invoice(tenant_id, appointment_id, invoice.id_typed());
            if let Some((journal, ledger)) = postings {
                state.append_journal(journal);
                state.append_customer_entry(tenant_id, ledger);
            }
            Ok((invoice, false))
        })?;

        if !reused {
            tracing::info!(invoice = %invoice.number(), amount = %amount, "appointment invoiced");
            self.emit(
                AuditEvent::new(
                    "invoice.issued",
                    "invoice",
                    invoice.id_typed(),
                    Some(tenant_id),
                    actor.user_id,
                    now,
                )
                .with_properties(serde_json::json!({ "amount": amount.to_string() })),
            );
        }
        Ok(invoice)
    }

    /// Cancel an invoice while nothing has been paid net of refunds.
    pub fn cancel_invoice(&self, actor: &Actor, invoice_id: InvoiceId) -> DomainResult<Invoice> {
        let scope = TenantScope::for_actor(actor);
        let now = Utc::now();

        let invoice = self.store().write(|state| {
            let invoice = state
                .invoice(scope, invoice_id)
                .cloned()
                .ok_or_else(DomainError::not_found)?;
            let payments = state.payments_for_invoice(invoice.tenant_id(), invoice_id);
            let cancelled = invoice.cancel(net_paid(&payments))?;
            state.upsert_invoice(cancelled.clone());
            Ok(cancelled)
        })?;

        self.emit(AuditEvent::new(
            "invoice.cancelled",
            "invoice",
            invoice_id,
            Some(invoice.tenant_id()),
            actor.user_id,
            now,
        ));
        Ok(invoice)
    }

    pub fn invoice(&self, actor: &Actor, id: InvoiceId) -> DomainResult<Invoice> {
        let scope = TenantScope::for_actor(actor);
        self.store().read(|state| {
            state
                .invoice(scope, id)
                .cloned()
                .ok_or_else(DomainError::not_found)
        })
    }

    /// What is still due on the invoice, computed from the live payment and
    /// refund state.
    pub fn invoice_remaining(&self, actor: &Actor, id: InvoiceId) -> DomainResult<Money> {
        let scope = TenantScope::for_actor(actor);
        self.store().read(|state| {
            let invoice = state.invoice(scope, id).ok_or_else(DomainError::not_found)?;
            let payments = state.payments_for_invoice(invoice.tenant_id(), id);
            Ok(remaining(invoice.total(), net_paid(&payments)))
        })
    }
}
