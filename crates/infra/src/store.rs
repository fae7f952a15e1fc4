//! In-memory store.
//!
//! Tables are keyed by `(TenantId, <entity id>)`; every accessor takes an
//! explicit [`TenantScope`] — scoping is a parameter, never a hidden hook.
//! The journal and the two sub-ledgers are append-only vectors per tenant;
//! the store assigns sub-ledger sequence numbers monotonically at append,
//! which is what makes statement ordering deterministic.
//!
//! Concurrency: one `RwLock` guards the whole state. Mutating service
//! operations run inside [`Store::write`], so every check-then-act sequence
//! (stock checks, refund caps, duplicate confirms) is serialized — the
//! in-memory equivalent of taking all needed row locks up front. Combined
//! with the decide-then-apply discipline in the services (all fallible
//! validation before the first mutation), a failed invariant aborts with
//! zero partial writes observable to anyone.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

use clinerp_accounting::{
    Account, AccountId, JournalEntry, JournalEntryId, NewLedgerEntry, PartyLedgerEntry,
};
use clinerp_auth::TenantScope;
use clinerp_core::{DomainError, DomainResult, EntityId, TenantId};
use clinerp_inventory::StockMovement;
use clinerp_invoicing::{Invoice, InvoiceId, Payment, PaymentId};
use clinerp_parties::{Party, PartyId};
use clinerp_products::{Product, ProductId};
use clinerp_purchasing::{PurchaseOrder, PurchaseOrderId, SupplierPayment, SupplierPaymentId};
use clinerp_sales::{Order, OrderId};
use clinerp_tenancy::Tenant;

fn scoped_get<'a, K, V>(
    map: &'a HashMap<(TenantId, K), V>,
    scope: TenantScope,
    key: K,
) -> Option<&'a V>
where
    K: Copy + Eq + Hash,
{
    match scope {
        TenantScope::Tenant(tenant_id) => map.get(&(tenant_id, key)),
        TenantScope::All => map.iter().find(|((_, k), _)| *k == key).map(|(_, v)| v),
        TenantScope::Nothing => None,
    }
}

/// All tables. Only reachable through [`Store::read`]/[`Store::write`].
#[derive(Debug, Default)]
pub struct StoreState {
    tenants: HashMap<TenantId, Tenant>,
    parties: HashMap<(TenantId, PartyId), Party>,
    accounts: HashMap<(TenantId, AccountId), Account>,
    products: HashMap<(TenantId, ProductId), Product>,
    stock_movements: HashMap<TenantId, Vec<StockMovement>>,
    orders: HashMap<(TenantId, OrderId), Order>,
    invoices: HashMap<(TenantId, InvoiceId), Invoice>,
    /// Unique constraint: at most one invoice per order.
    order_invoices: HashMap<(TenantId, OrderId), InvoiceId>,
    /// Idempotency index: appointment completion reuses its invoice.
    appointment_invoices: HashMap<(TenantId, EntityId), InvoiceId>,
    payments: HashMap<(TenantId, PaymentId), Payment>,
    journal: HashMap<TenantId, Vec<JournalEntry>>,
    customer_ledger: HashMap<TenantId, Vec<PartyLedgerEntry>>,
    supplier_ledger: HashMap<TenantId, Vec<PartyLedgerEntry>>,
    ledger_seq: HashMap<TenantId, u64>,
    purchase_orders: HashMap<(TenantId, PurchaseOrderId), PurchaseOrder>,
    supplier_payments: HashMap<(TenantId, SupplierPaymentId), SupplierPayment>,
}

impl StoreState {
    // ── tenants ────────────────────────────────────────────────────────────

    pub fn tenant(&self, scope: TenantScope, id: TenantId) -> Option<&Tenant> {
        if scope.permits(id) {
            self.tenants.get(&id)
        } else {
            None
        }
    }

    pub fn tenant_slug_taken(&self, slug: &str) -> bool {
        self.tenants.values().any(|t| t.slug() == slug)
    }

    pub fn upsert_tenant(&mut self, tenant: Tenant) {
        self.tenants.insert(tenant.id_typed(), tenant);
    }

    // ── parties ────────────────────────────────────────────────────────────

    pub fn party(&self, scope: TenantScope, id: PartyId) -> Option<&Party> {
        scoped_get(&self.parties, scope, id)
    }

    pub fn upsert_party(&mut self, party: Party) {
        self.parties
            .insert((party.tenant_id(), party.id_typed()), party);
    }

    // ── chart of accounts ──────────────────────────────────────────────────

    pub fn account(&self, scope: TenantScope, id: AccountId) -> Option<&Account> {
        scoped_get(&self.accounts, scope, id)
    }

    /// Unscoped lookup by id across tenants, for write-side integrity checks
    /// that must distinguish "absent" from "cross-tenant".
    pub fn account_any_tenant(&self, id: AccountId) -> Option<&Account> {
        scoped_get(&self.accounts, TenantScope::All, id)
    }

    pub fn account_by_code(&self, tenant_id: TenantId, code: &str) -> Option<&Account> {
        self.accounts
            .iter()
            .filter(|((t, _), _)| *t == tenant_id)
            .map(|(_, a)| a)
            .find(|a| a.code() == code)
    }

    pub fn accounts_of(&self, scope: TenantScope) -> Vec<&Account> {
        let mut accounts: Vec<&Account> = self
            .accounts
            .iter()
            .filter(|((t, _), _)| scope.permits(*t))
            .map(|(_, a)| a)
            .collect();
        accounts.sort_by(|a, b| a.code().cmp(b.code()));
        accounts
    }

    pub fn upsert_account(&mut self, account: Account) {
        self.accounts
            .insert((account.tenant_id(), account.id_typed()), account);
    }

    // ── products & stock movements ─────────────────────────────────────────

    pub fn product(&self, scope: TenantScope, id: ProductId) -> Option<&Product> {
        scoped_get(&self.products, scope, id)
    }

    pub fn product_sku_taken(&self, tenant_id: TenantId, sku: &str) -> bool {
        self.products
            .iter()
            .any(|((t, _), p)| *t == tenant_id && p.sku() == sku)
    }

    pub fn upsert_product(&mut self, product: Product) {
        self.products
            .insert((product.tenant_id(), product.id_typed()), product);
    }

    pub fn push_movement(&mut self, movement: StockMovement) {
        self.stock_movements
            .entry(movement.tenant_id)
            .or_default()
            .push(movement);
    }

    pub fn movements_for_product(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Vec<StockMovement> {
        self.stock_movements
            .get(&tenant_id)
            .map(|ms| {
                ms.iter()
                    .filter(|m| m.product_id == product_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    // ── orders & invoices ──────────────────────────────────────────────────

    pub fn order(&self, scope: TenantScope, id: OrderId) -> Option<&Order> {
        scoped_get(&self.orders, scope, id)
    }

    pub fn upsert_order(&mut self, order: Order) {
        self.orders
            .insert((order.tenant_id(), order.id_typed()), order);
    }

    pub fn invoice(&self, scope: TenantScope, id: InvoiceId) -> Option<&Invoice> {
        scoped_get(&self.invoices, scope, id)
    }

    pub fn invoice_for_order(&self, tenant_id: TenantId, order_id: OrderId) -> Option<&Invoice> {
        let invoice_id = self.order_invoices.get(&(tenant_id, order_id))?;
        self.invoices.get(&(tenant_id, *invoice_id))
    }

    pub fn invoice_for_appointment(
        &self,
        tenant_id: TenantId,
        appointment_id: EntityId,
    ) -> Option<&Invoice> {
        let invoice_id = self.appointment_invoices.get(&(tenant_id, appointment_id))?;
        self.invoices.get(&(tenant_id, *invoice_id))
    }

    pub fn upsert_invoice(&mut self, invoice: Invoice) {
        self.invoices
            .insert((invoice.tenant_id(), invoice.id_typed()), invoice);
    }

    pub fn link_order_invoice(&mut self, tenant_id: TenantId, order_id: OrderId, id: InvoiceId) {
        self.order_invoices.insert((tenant_id, order_id), id);
    }

    pub fn link_appointment_invoice(
        &mut self,
        tenant_id: TenantId,
        appointment_id: EntityId,
        id: InvoiceId,
    ) {
        self.appointment_invoices
            .insert((tenant_id, appointment_id), id);
    }

    // ── payments ───────────────────────────────────────────────────────────

    pub fn payment(&self, scope: TenantScope, id: PaymentId) -> Option<&Payment> {
        scoped_get(&self.payments, scope, id)
    }

    pub fn payments_for_invoice(&self, tenant_id: TenantId, invoice_id: InvoiceId) -> Vec<Payment> {
        let mut payments: Vec<Payment> = self
            .payments
            .iter()
            .filter(|((t, _), p)| *t == tenant_id && p.invoice_id() == invoice_id)
            .map(|(_, p)| p.clone())
            .collect();
        payments.sort_by_key(|p| p.paid_at());
        payments
    }

    pub fn upsert_payment(&mut self, payment: Payment) {
        self.payments
            .insert((payment.tenant_id(), payment.id_typed()), payment);
    }

    // ── journal ────────────────────────────────────────────────────────────

    pub fn journal_of(&self, scope: TenantScope) -> Vec<&JournalEntry> {
        self.journal
            .iter()
            .filter(|(t, _)| scope.permits(**t))
            .flat_map(|(_, entries)| entries.iter())
            .collect()
    }

    pub fn journal_entry(&self, scope: TenantScope, id: JournalEntryId) -> Option<&JournalEntry> {
        self.journal
            .iter()
            .filter(|(t, _)| scope.permits(**t))
            .flat_map(|(_, entries)| entries.iter())
            .find(|e| e.id_typed() == id)
    }

    /// Append-only; there is no update or delete path.
    pub fn append_journal(&mut self, entry: JournalEntry) {
        self.journal
            .entry(entry.tenant_id())
            .or_default()
            .push(entry);
    }

    // ── sub-ledgers ────────────────────────────────────────────────────────

    fn next_ledger_seq(&mut self, tenant_id: TenantId) -> u64 {
        let seq = self.ledger_seq.entry(tenant_id).or_insert(0);
        *seq += 1;
        *seq
    }

    fn sealed(&mut self, tenant_id: TenantId, entry: NewLedgerEntry) -> PartyLedgerEntry {
        PartyLedgerEntry {
            seq: self.next_ledger_seq(tenant_id),
            tenant_id,
            party_id: entry.party_id,
            entry_date: entry.entry_date,
            kind: entry.kind,
            debit: entry.debit,
            credit: entry.credit,
            description: entry.description,
            source: entry.source,
        }
    }

    pub fn append_customer_entry(
        &mut self,
        tenant_id: TenantId,
        entry: NewLedgerEntry,
    ) -> PartyLedgerEntry {
        let sealed = self.sealed(tenant_id, entry);
        self.customer_ledger
            .entry(tenant_id)
            .or_default()
            .push(sealed.clone());
        sealed
    }

    pub fn append_supplier_entry(
        &mut self,
        tenant_id: TenantId,
        entry: NewLedgerEntry,
    ) -> PartyLedgerEntry {
        let sealed = self.sealed(tenant_id, entry);
        self.supplier_ledger
            .entry(tenant_id)
            .or_default()
            .push(sealed.clone());
        sealed
    }

    pub fn customer_entries(&self, tenant_id: TenantId, party_id: PartyId) -> Vec<PartyLedgerEntry> {
        self.customer_ledger
            .get(&tenant_id)
            .map(|es| {
                es.iter()
                    .filter(|e| e.party_id == party_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn supplier_entries(&self, tenant_id: TenantId, party_id: PartyId) -> Vec<PartyLedgerEntry> {
        self.supplier_ledger
            .get(&tenant_id)
            .map(|es| {
                es.iter()
                    .filter(|e| e.party_id == party_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    // ── purchasing ─────────────────────────────────────────────────────────

    pub fn purchase_order(&self, scope: TenantScope, id: PurchaseOrderId) -> Option<&PurchaseOrder> {
        scoped_get(&self.purchase_orders, scope, id)
    }

    pub fn upsert_purchase_order(&mut self, order: PurchaseOrder) {
        self.purchase_orders
            .insert((order.tenant_id(), order.id_typed()), order);
    }

    pub fn supplier_payments_for(
        &self,
        tenant_id: TenantId,
        purchase_order_id: PurchaseOrderId,
    ) -> Vec<SupplierPayment> {
        let mut payments: Vec<SupplierPayment> = self
            .supplier_payments
            .iter()
            .filter(|((t, _), p)| *t == tenant_id && p.purchase_order_id() == purchase_order_id)
            .map(|(_, p)| p.clone())
            .collect();
        payments.sort_by_key(|p| p.paid_at());
        payments
    }

    pub fn upsert_supplier_payment(&mut self, payment: SupplierPayment) {
        self.supplier_payments
            .insert((payment.tenant_id(), payment.id_typed()), payment);
    }
}

/// The store: one lock around the whole state.
#[derive(Debug, Default)]
pub struct Store {
    state: RwLock<StoreState>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a read-only transaction.
    pub fn read<R>(&self, f: impl FnOnce(&StoreState) -> DomainResult<R>) -> DomainResult<R> {
        let state = self
            .state
            .read()
            .map_err(|_| DomainError::conflict("store lock poisoned"))?;
        f(&state)
    }

    /// Run a mutating transaction under the exclusive lock.
    ///
    /// Callers keep all fallible validation ahead of the first mutation
    /// (decide-then-apply); the lock makes the whole closure atomic with
    /// respect to every other transaction.
    pub fn write<R>(&self, f: impl FnOnce(&mut StoreState) -> DomainResult<R>) -> DomainResult<R> {
        let mut state = self
            .state
            .write()
            .map_err(|_| DomainError::conflict("store lock poisoned"))?;
        f(&mut state)
    }
}
