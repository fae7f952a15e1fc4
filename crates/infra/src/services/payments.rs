//! Payment/refund ledger.

use chrono::Utc;

use clinerp_accounting::{
    JournalEntry, JournalEntryId, JournalLine, LedgerEntryKind, NewLedgerEntry, SourceRef, codes,
};
use clinerp_audit::AuditEvent;
use clinerp_auth::{Actor, TenantScope};
use clinerp_core::{DomainError, DomainResult, EntityId, Money};
use clinerp_invoicing::{
    InvoiceId, Payment, PaymentId, PaymentMethod, derive_status, net_paid, remaining,
};

use super::{Services, accounts};

impl Services {
    /// Record a payment against an invoice.
    ///
    /// Four writes, one transaction: the payment row, the customer ledger
    /// credit, the Dr Cash / Cr Accounts-Receivable journal entry, and the
    /// re-derived invoice status. The remaining-due check runs against the
    /// live state under the same lock, so concurrent payments cannot
    /// overshoot the total.
    pub fn record_payment(
        &self,
        actor: &Actor,
        invoice_id: InvoiceId,
        amount: Money,
        method: PaymentMethod,
    ) -> DomainResult<Payment> {
        let scope = TenantScope::for_actor(actor);
        let now = Utc::now();

        let payment = self.store().write(|state| {
            let invoice = state
                .invoice(scope, invoice_id)
                .cloned()
                .ok_or_else(DomainError::not_found)?;
            if invoice.is_cancelled() {
                return Err(DomainError::conflict("invoice is cancelled"));
            }
            let tenant_id = invoice.tenant_id();

            let payments = state.payments_for_invoice(tenant_id, invoice_id);
            let net = net_paid(&payments);
            let due = remaining(invoice.total(), net);
            if amount > due {
                return Err(DomainError::conflict(format!(
                    "payment exceeds remaining due, remaining={due}"
                )));
            }

            let payment = Payment::new(
                PaymentId::new(EntityId::new()),
                tenant_id,
                invoice_id,
                amount,
                method,
                now,
                actor.user_id,
            )?;

            let cash = accounts::required_account(state, tenant_id, codes::CASH)?;
            let ar = accounts::required_account(state, tenant_id, codes::ACCOUNTS_RECEIVABLE)?;
            let journal = JournalEntry::post(
                JournalEntryId::new(EntityId::new()),
                tenant_id,
                now.date_naive(),
                format!("Payment for invoice {}", invoice.number()),
                Some(SourceRef::Payment(payment.id_typed().0)),
                vec![JournalLine::debit(cash, amount), JournalLine::credit(ar, amount)],
                actor.user_id,
                now,
            )?;
            let ledger = NewLedgerEntry::credit(
                invoice.customer_id(),
                now.date_naive(),
                LedgerEntryKind::Payment,
                amount,
                format!("Payment for invoice {}", invoice.number()),
                SourceRef::Payment(payment.id_typed().0),
            );

            let new_net = net.checked_add(payment.applied_amount())?;
            let updated_invoice = invoice.with_status(derive_status(invoice.total(), new_net));

            state.upsert_payment(payment.clone());
            state.append_customer_entry(tenant_id, ledger);
            state.append_journal(journal);
            state.upsert_invoice(updated_invoice);
            Ok(payment)
        })?;

        tracing::info!(
            invoice_id = %invoice_id,
            amount = %amount,
            "payment recorded"
        );
        self.emit(
            AuditEvent::new(
                "payment.recorded",
                "payment",
                payment.id_typed(),
                Some(payment.tenant_id()),
                actor.user_id,
                now,
            )
            .with_properties(serde_json::json!({
                "invoice_id": invoice_id.to_string(),
                "amount": amount.to_string(),
            })),
        );
        Ok(payment)
    }

    /// Refund part or all of a payment.
    ///
    /// The refund cap (Σrefunds ≤ payment amount) is checked against the row
    /// inside the exclusive transaction, so concurrent refund requests
    /// serialize and can never jointly exceed the cap. Posts the reversing
    /// Dr Accounts-Receivable / Cr Cash entry and re-derives the invoice
    /// status.
    pub fn refund_payment(
        &self,
        actor: &Actor,
        payment_id: PaymentId,
        amount: Money,
    ) -> DomainResult<Payment> {
        let scope = TenantScope::for_actor(actor);
        let now = Utc::now();

        let refunded = self.store().write(|state| {
            let payment = state
                .payment(scope, payment_id)
                .cloned()
                .ok_or_else(DomainError::not_found)?;
            let refunded = payment.refund(amount, now, actor.user_id)?;
            let tenant_id = payment.tenant_id();

            let invoice = state
                .invoice(TenantScope::Tenant(tenant_id), payment.invoice_id())
                .cloned()
                .ok_or_else(DomainError::not_found)?;

            let ar = accounts::required_account(state, tenant_id, codes::ACCOUNTS_RECEIVABLE)?;
            let cash = accounts::required_account(state, tenant_id, codes::CASH)?;
            let journal = JournalEntry::post(
                JournalEntryId::new(EntityId::new()),
                tenant_id,
                now.date_naive(),
                format!("Refund on invoice {}", invoice.number()),
                Some(SourceRef::Refund(payment_id.0)),
                vec![JournalLine::debit(ar, amount), JournalLine::credit(cash, amount)],
                actor.user_id,
                now,
            )?;
            let ledger = NewLedgerEntry::debit(
                invoice.customer_id(),
                now.date_naive(),
                LedgerEntryKind::Refund,
                amount,
                format!("Refund on invoice {}", invoice.number()),
                SourceRef::Refund(payment_id.0),
            );

            // Re-derive the status from the payment set as it will be after
            // this refund.
            let mut payments = state.payments_for_invoice(tenant_id, payment.invoice_id());
            for p in payments.iter_mut() {
                if p.id_typed() == payment_id {
                    *p = refunded.clone();
                }
            }
            let updated_invoice =
                invoice.with_status(derive_status(invoice.total(), net_paid(&payments)));

            state.upsert_payment(refunded.clone());
            state.append_customer_entry(tenant_id, ledger);
            state.append_journal(journal);
            state.upsert_invoice(updated_invoice);
            Ok(refunded)
        })?;

        tracing::info!(payment_id = %payment_id, amount = %amount, "payment refunded");
        self.emit(
            AuditEvent::new(
                "payment.refunded",
                "payment",
                payment_id,
                Some(refunded.tenant_id()),
                actor.user_id,
                now,
            )
            .with_properties(serde_json::json!({ "amount": amount.to_string() })),
        );
        Ok(refunded)
    }

    pub fn payment(&self, actor: &Actor, id: PaymentId) -> DomainResult<Payment> {
        let scope = TenantScope::for_actor(actor);
        self.store().read(|state| {
            state
                .payment(scope, id)
                .cloned()
                .ok_or_else(DomainError::not_found)
        })
    }

    pub fn invoice_payments(
        &self,
        actor: &Actor,
        invoice_id: InvoiceId,
    ) -> DomainResult<Vec<Payment>> {
        let scope = TenantScope::for_actor(actor);
        self.store().read(|state| {
            let invoice = state
                .invoice(scope, invoice_id)
                .ok_or_else(DomainError::not_found)?;
            Ok(state.payments_for_invoice(invoice.tenant_id(), invoice_id))
        })
    }
}
