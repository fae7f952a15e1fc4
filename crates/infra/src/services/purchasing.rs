//! Purchasing: purchase orders and supplier payments.

use std::collections::HashMap;

use chrono::Utc;

use clinerp_accounting::{LedgerEntryKind, NewLedgerEntry, SourceRef};
use clinerp_audit::AuditEvent;
use clinerp_auth::{Actor, TenantScope, stamp_tenant};
use clinerp_core::{DomainError, DomainResult, EntityId, Money};
use clinerp_inventory::{StockMovement, StockRef, receive};
use clinerp_invoicing::PaymentMethod;
use clinerp_parties::PartyId;
use clinerp_products::{Product, ProductId};
use clinerp_purchasing::{
    PurchaseLine, PurchaseOrder, PurchaseOrderId, SupplierPayment, SupplierPaymentId,
};

use super::{Services, parties};

/// Requested purchase order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewPurchaseLine {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_cost: Money,
}

impl Services {
    pub fn create_purchase_order(
        &self,
        actor: &Actor,
        supplier_id: PartyId,
        lines: Vec<NewPurchaseLine>,
    ) -> DomainResult<PurchaseOrder> {
        let tenant_id = stamp_tenant(actor, None)?;
        let scope = TenantScope::for_actor(actor);
        let now = Utc::now();

        let order = self.store().write(|state| {
            parties::required_supplier(state, scope, supplier_id)?;
            for line in &lines {
                if state.product(scope, line.product_id).is_none() {
                    return Err(DomainError::not_found());
                }
            }

            let order = PurchaseOrder::new(
                PurchaseOrderId::new(EntityId::new()),
                tenant_id,
                supplier_id,
                lines
                    .iter()
                    .map(|l| PurchaseLine {
                        product_id: l.product_id,
                        quantity: l.quantity,
                        unit_cost: l.unit_cost,
                    })
                    .collect(),
                actor.user_id,
                now,
            )?;
            state.upsert_purchase_order(order.clone());
            Ok(order)
        })?;

        self.emit(AuditEvent::new(
            "purchase_order.created",
            "purchase_order",
            order.id_typed(),
            Some(tenant_id),
            actor.user_id,
            now,
        ));
        Ok(order)
    }

    /// `draft → ordered`.
    pub fn place_purchase_order(
        &self,
        actor: &Actor,
        id: PurchaseOrderId,
    ) -> DomainResult<PurchaseOrder> {
        self.transition_purchase_order(actor, id, "purchase_order.placed", PurchaseOrder::mark_ordered)
    }

    pub fn cancel_purchase_order(
        &self,
        actor: &Actor,
        id: PurchaseOrderId,
    ) -> DomainResult<PurchaseOrder> {
        self.transition_purchase_order(actor, id, "purchase_order.cancelled", PurchaseOrder::cancel)
    }

    /// Receive an ordered purchase order: increment stock per line (one "in"
    /// movement each) and credit the supplier ledger with the order total.
    pub fn receive_purchase_order(
        &self,
        actor: &Actor,
        id: PurchaseOrderId,
    ) -> DomainResult<PurchaseOrder> {
        let scope = TenantScope::for_actor(actor);
        let now = Utc::now();

        let order = self.store().write(|state| {
            let order = state
                .purchase_order(scope, id)
                .cloned()
                .ok_or_else(DomainError::not_found)?;
            let received = order.receive()?;
            let tenant_id = received.tenant_id();

            let mut touched: HashMap<ProductId, Product> = HashMap::new();
            let mut movements: Vec<StockMovement> = Vec::new();
            for line in received.lines() {
                let current = match touched.get(&line.product_id) {
                    Some(product) => product.clone(),
                    None => state
                        .product(scope, line.product_id)
                        .cloned()
                        .ok_or_else(DomainError::not_found)?,
                };
                let (updated, movement) =
                    receive(&current, line.quantity, StockRef::PurchaseOrder(id.0), now)?;
                touched.insert(line.product_id, updated);
                movements.push(movement);
            }

            let ledger = NewLedgerEntry::credit(
                received.supplier_id(),
                now.date_naive(),
                LedgerEntryKind::PurchaseOrder,
                received.total(),
                format!("Received {}", received.number()),
                SourceRef::PurchaseOrder(id.0),
            );

            for product in touched.into_values() {
                state.upsert_product(product);
            }
            for movement in movements {
                state.push_movement(movement);
            }
            state.append_supplier_entry(tenant_id, ledger);
            state.upsert_purchase_order(received.clone());
            Ok(received)
        })?;

        tracing::info!(purchase_order = %order.number(), "purchase order received");
        self.emit(AuditEvent::new(
            "purchase_order.received",
            "purchase_order",
            id,
            Some(order.tenant_id()),
            actor.user_id,
            now,
        ));
        Ok(order)
    }

    /// Record a supplier payment against a purchase order. Capped at the
    /// uncovered remainder; flips the order to `paid` once covered.
    pub fn pay_supplier(
        &self,
        actor: &Actor,
        id: PurchaseOrderId,
        amount: Money,
        method: PaymentMethod,
    ) -> DomainResult<SupplierPayment> {
        let scope = TenantScope::for_actor(actor);
        let now = Utc::now();

        let payment = self.store().write(|state| {
            let order = state
                .purchase_order(scope, id)
                .cloned()
                .ok_or_else(DomainError::not_found)?;
            if !order.accepts_payment() {
                return Err(DomainError::conflict(
                    "purchase order does not accept payments",
                ));
            }
            let tenant_id = order.tenant_id();

            let paid: Money = state
                .supplier_payments_for(tenant_id, id)
                .iter()
                .fold(Money::ZERO, |acc, p| acc.saturating_add(p.amount()));
            let due = order.total().saturating_sub(paid);
            if amount > due {
                return Err(DomainError::conflict(format!(
                    "payment exceeds remaining due, remaining={due}"
                )));
            }

            let payment = SupplierPayment::new(
                SupplierPaymentId::new(EntityId::new()),
                tenant_id,
                id,
                amount,
                method,
                now,
                actor.user_id,
            )?;
            let ledger = NewLedgerEntry::debit(
                order.supplier_id(),
                now.date_naive(),
                LedgerEntryKind::SupplierPayment,
                amount,
                format!("Payment on {}", order.number()),
                SourceRef::SupplierPayment(payment.id_typed().0),
            );
            let updated_order = order.with_paid_total(paid.checked_add(amount)?);

            state.upsert_supplier_payment(payment.clone());
            state.append_supplier_entry(tenant_id, ledger);
            state.upsert_purchase_order(updated_order);
            Ok(payment)
        })?;

        tracing::info!(purchase_order_id = %id, amount = %amount, "supplier payment recorded");
        self.emit(
            AuditEvent::new(
                "supplier_payment.recorded",
                "supplier_payment",
                payment.id_typed(),
                Some(payment.tenant_id()),
                actor.user_id,
                now,
            )
            .with_properties(serde_json::json!({ "amount": amount.to_string() })),
        );
        Ok(payment)
    }

    pub fn purchase_order(&self, actor: &Actor, id: PurchaseOrderId) -> DomainResult<PurchaseOrder> {
        let scope = TenantScope::for_actor(actor);
        self.store().read(|state| {
            state
                .purchase_order(scope, id)
                .cloned()
                .ok_or_else(DomainError::not_found)
        })
    }

    fn transition_purchase_order(
        &self,
        actor: &Actor,
        id: PurchaseOrderId,
        action: &str,
        transition: impl FnOnce(&PurchaseOrder) -> DomainResult<PurchaseOrder>,
    ) -> DomainResult<PurchaseOrder> {
        let scope = TenantScope::for_actor(actor);
        let now = Utc::now();

        let order = self.store().write(|state| {
            let order = state
                .purchase_order(scope, id)
                .ok_or_else(DomainError::not_found)?;
            let updated = transition(order)?;
            state.upsert_purchase_order(updated.clone());
            Ok(updated)
        })?;

        self.emit(AuditEvent::new(
            action,
            "purchase_order",
            id,
            Some(order.tenant_id()),
            actor.user_id,
            now,
        ));
        Ok(order)
    }
}
