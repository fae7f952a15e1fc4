//! Product catalog and the inventory ledger.

use chrono::Utc;

use clinerp_audit::AuditEvent;
use clinerp_auth::{Actor, TenantScope, stamp_tenant};
use clinerp_core::{DomainError, DomainResult, EntityId, Money};
use clinerp_inventory::{StockMovement, StockRef, issue, receive, reconciles};
use clinerp_products::{Product, ProductId};

use super::Services;

impl Services {
    pub fn create_product(
        &self,
        actor: &Actor,
        sku: &str,
        name: &str,
        unit_price: Money,
    ) -> DomainResult<Product> {
        let tenant_id = stamp_tenant(actor, None)?;
        let now = Utc::now();

        let product = self.store().write(|state| {
            if state.product_sku_taken(tenant_id, sku) {
                return Err(DomainError::conflict(format!("sku {sku} already exists")));
            }
            let product = Product::new(
                ProductId::new(EntityId::new()),
                tenant_id,
                sku,
                name,
                unit_price,
                now,
            )?;
            state.upsert_product(product.clone());
            Ok(product)
        })?;

        self.emit(AuditEvent::new(
            "product.created",
            "product",
            product.id_typed(),
            Some(tenant_id),
            actor.user_id,
            now,
        ));
        Ok(product)
    }

    /// Increment stock, paired with an "in" movement.
    pub fn receive_stock(
        &self,
        actor: &Actor,
        product_id: ProductId,
        quantity: i64,
        reference: StockRef,
    ) -> DomainResult<StockMovement> {
        self.move_stock(actor, product_id, quantity, reference, "stock.received", receive)
    }

    /// Decrement stock under the transaction lock, paired with an "out"
    /// movement. Issuing more than on-hand fails; the count never goes
    /// negative.
    pub fn issue_stock(
        &self,
        actor: &Actor,
        product_id: ProductId,
        quantity: i64,
        reference: StockRef,
    ) -> DomainResult<StockMovement> {
        self.move_stock(actor, product_id, quantity, reference, "stock.issued", issue)
    }

    fn move_stock(
        &self,
        actor: &Actor,
        product_id: ProductId,
        quantity: i64,
        reference: StockRef,
        action: &str,
        apply: impl FnOnce(
            &Product,
            i64,
            StockRef,
            chrono::DateTime<Utc>,
        ) -> DomainResult<(Product, StockMovement)>,
    ) -> DomainResult<StockMovement> {
        let scope = TenantScope::for_actor(actor);
        let now = Utc::now();

        let movement = self.store().write(|state| {
            let product = state
                .product(scope, product_id)
                .cloned()
                .ok_or_else(DomainError::not_found)?;
            let (updated, movement) = apply(&product, quantity, reference, now)?;

            state.upsert_product(updated);
            state.push_movement(movement.clone());
            Ok(movement)
        })?;

        self.emit(AuditEvent::new(
            action,
            "product",
            product_id,
            Some(movement.tenant_id),
            actor.user_id,
            now,
        ));
        Ok(movement)
    }

    pub fn product(&self, actor: &Actor, id: ProductId) -> DomainResult<Product> {
        let scope = TenantScope::for_actor(actor);
        self.store().read(|state| {
            state
                .product(scope, id)
                .cloned()
                .ok_or_else(DomainError::not_found)
        })
    }

    pub fn stock_movements(
        &self,
        actor: &Actor,
        product_id: ProductId,
    ) -> DomainResult<Vec<StockMovement>> {
        let scope = TenantScope::for_actor(actor);
        self.store().read(|state| {
            let product = state
                .product(scope, product_id)
                .ok_or_else(DomainError::not_found)?;
            Ok(state.movements_for_product(product.tenant_id(), product_id))
        })
    }

    /// Σmovements(in) − Σmovements(out) against the current on-hand count.
    pub fn stock_reconciles(&self, actor: &Actor, product_id: ProductId) -> DomainResult<bool> {
        let scope = TenantScope::for_actor(actor);
        self.store().read(|state| {
            let product = state
                .product(scope, product_id)
                .ok_or_else(DomainError::not_found)?;
            let movements = state.movements_for_product(product.tenant_id(), product_id);
            Ok(reconciles(product, &movements))
        })
    }
}
