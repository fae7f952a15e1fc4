//! Order→invoice workflow.

use std::collections::HashMap;

use chrono::Utc;

use clinerp_accounting::{LedgerEntryKind, NewLedgerEntry, SourceRef};
use clinerp_audit::AuditEvent;
use clinerp_auth::{Actor, TenantScope, stamp_tenant};
use clinerp_core::{DomainError, DomainResult, EntityId};
use clinerp_inventory::{StockMovement, StockRef, issue, receive};
use clinerp_invoicing::{Invoice, InvoiceId, InvoiceItem, InvoiceSource};
use clinerp_parties::PartyId;
use clinerp_products::{Product, ProductId};
use clinerp_sales::{Order, OrderId, OrderItem};

use super::{Services, parties};
use crate::StoreState;

/// Requested order line. The unit price is *not* part of the request — it is
/// read from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl Services {
    /// Create a pending order: per item, check-then-decrement stock and log
    /// an "out" movement, all inside one transaction — two concurrent orders
    /// can never both pass the stock check on stale data.
    pub fn create_order(
        &self,
        actor: &Actor,
        customer_id: PartyId,
        items: Vec<NewOrderItem>,
    ) -> DomainResult<Order> {
        let tenant_id = stamp_tenant(actor, None)?;
        let scope = TenantScope::for_actor(actor);
        let now = Utc::now();

        let order = self.store().write(|state| {
            parties::required_customer(state, scope, customer_id)?;
            let order_id = OrderId::new(EntityId::new());

            let mut touched: HashMap<ProductId, Product> = HashMap::new();
            let mut movements: Vec<StockMovement> = Vec::new();
            let mut order_items: Vec<OrderItem> = Vec::new();

            for item in &items {
                let current = match touched.get(&item.product_id) {
                    Some(product) => product.clone(),
                    None => state
                        .product(scope, item.product_id)
                        .cloned()
                        .ok_or_else(DomainError::not_found)?,
                };
                let unit_price = current.unit_price();
                let (updated, movement) =
                    issue(&current, item.quantity, StockRef::Order(order_id.0), now)?;

                order_items.push(OrderItem {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    unit_price,
                });
                touched.insert(item.product_id, updated);
                movements.push(movement);
            }

            let order = Order::new(order_id, tenant_id, customer_id, order_items, actor.user_id, now)?;

            for product in touched.into_values() {
                state.upsert_product(product);
            }
            for movement in movements {
                state.push_movement(movement);
            }
            state.upsert_order(order.clone());
            Ok(order)
        })?;

        tracing::info!(order_id = %order.id_typed(), total = %order.total(), "order created");
        self.emit(
            AuditEvent::new(
                "order.created",
                "order",
                order.id_typed(),
                Some(tenant_id),
                actor.user_id,
                now,
            )
            .with_properties(serde_json::json!({ "total": order.total().to_string() })),
        );
        Ok(order)
    }

    /// Confirm a pending order: issue its invoice, copy the items, debit the
    /// customer ledger. Stock was already taken at creation; no journal entry
    /// is posted here — accounting entries follow the payments.
    pub fn confirm_order(&self, actor: &Actor, order_id: OrderId) -> DomainResult<Invoice> {
        let scope = TenantScope::for_actor(actor);
        let now = Utc::now();

        let invoice = self.store().write(|state| {
            let order = state
                .order(scope, order_id)
                .cloned()
                .ok_or_else(DomainError::not_found)?;
            if state.invoice_for_order(order.tenant_id(), order_id).is_some() {
                return Err(DomainError::conflict("invoice already exists for order"));
            }

            let confirmed = order.confirm()?;
            let invoice = Invoice::issue(
                InvoiceId::new(EntityId::new()),
                confirmed.tenant_id(),
                InvoiceSource::Order(order_id),
                confirmed.customer_id(),
                confirmed.items().iter().map(InvoiceItem::from).collect(),
                confirmed.total(),
                now,
            )?;
            let ledger_entry = NewLedgerEntry::debit(
                confirmed.customer_id(),
                now.date_naive(),
                LedgerEntryKind::Invoice,
                invoice.total(),
                format!("Invoice {}", invoice.number()),
                SourceRef::Invoice(invoice.id_typed().0),
            );

            state.upsert_order(confirmed);
            state.upsert_invoice(invoice.clone());
            state.link_order_invoice(invoice.tenant_id(), order_id, invoice.id_typed());
            state.append_customer_entry(invoice.tenant_id(), ledger_entry);
            Ok(invoice)
        })?;

        tracing::info!(
            order_id = %order_id,
            invoice = %invoice.number(),
            total = %invoice.total(),
            "order confirmed"
        );
        self.emit(
            AuditEvent::new(
                "order.confirmed",
                "order",
                order_id,
                Some(invoice.tenant_id()),
                actor.user_id,
                now,
            )
            .with_properties(serde_json::json!({
                "invoice_id": invoice.id_typed().to_string(),
                "total": invoice.total().to_string(),
            })),
        );
        Ok(invoice)
    }

    /// Cancel a pending order and restore its stock, logging "in" movements.
    /// The status guard rejects a second cancellation — stock is restored
    /// exactly once.
    pub fn cancel_order(&self, actor: &Actor, order_id: OrderId) -> DomainResult<Order> {
        let scope = TenantScope::for_actor(actor);
        let now = Utc::now();

        let order = self.store().write(|state| {
            let order = state
                .order(scope, order_id)
                .cloned()
                .ok_or_else(DomainError::not_found)?;
            let cancelled = order.cancel()?;

            let (touched, movements) =
                restock(state, scope, order.items(), StockRef::Order(order_id.0))?;

            for product in touched.into_values() {
                state.upsert_product(product);
            }
            for movement in movements {
                state.push_movement(movement);
            }
            state.upsert_order(cancelled.clone());
            Ok(cancelled)
        })?;

        tracing::info!(order_id = %order_id, "order cancelled");
        self.emit(AuditEvent::new(
            "order.cancelled",
            "order",
            order_id,
            Some(order.tenant_id()),
            actor.user_id,
            now,
        ));
        Ok(order)
    }

    pub fn order(&self, actor: &Actor, id: OrderId) -> DomainResult<Order> {
        let scope = TenantScope::for_actor(actor);
        self.store().read(|state| {
            state
                .order(scope, id)
                .cloned()
                .ok_or_else(DomainError::not_found)
        })
    }

    pub fn invoice_for_order(&self, actor: &Actor, order_id: OrderId) -> DomainResult<Invoice> {
        let scope = TenantScope::for_actor(actor);
        self.store().read(|state| {
            let order = state.order(scope, order_id).ok_or_else(DomainError::not_found)?;
            state
                .invoice_for_order(order.tenant_id(), order_id)
                .cloned()
                .ok_or_else(DomainError::not_found)
        })
    }
}

/// Decide-phase helper: receive each item's quantity back into stock against
/// working copies, without touching the state.
fn restock(
    state: &StoreState,
    scope: TenantScope,
    items: &[OrderItem],
    reference: StockRef,
) -> DomainResult<(HashMap<ProductId, Product>, Vec<StockMovement>)> {
    let now = Utc::now();
    let mut touched: HashMap<ProductId, Product> = HashMap::new();
    let mut movements = Vec::new();

    for item in items {
        let current = match touched.get(&item.product_id) {
            Some(product) => product.clone(),
            None => state
                .product(scope, item.product_id)
                .cloned()
                .ok_or_else(DomainError::not_found)?,
        };
        let (updated, movement) = receive(&current, item.quantity, reference, now)?;
        touched.insert(item.product_id, updated);
        movements.push(movement);
    }

    Ok((touched, movements))
}
