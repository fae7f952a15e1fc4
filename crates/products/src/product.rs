use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clinerp_core::{DomainError, DomainResult, Entity, EntityId, Money, TenantId};

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub EntityId);

impl ProductId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A catalog product.
///
/// `stock_quantity` is the authoritative on-hand count. It only ever changes
/// through the inventory issue/receive functions, which pair every change with
/// a stock movement row; products are created with zero stock and opening
/// stock arrives through a receive movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    tenant_id: TenantId,
    sku: String,
    name: String,
    unit_price: Money,
    stock_quantity: i64,
    created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(
        id: ProductId,
        tenant_id: TenantId,
        sku: impl Into<String>,
        name: impl Into<String>,
        unit_price: Money,
        at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let sku = sku.into();
        let name = name.into();

        if sku.trim().is_empty() {
            return Err(DomainError::validation("sku", "must not be empty"));
        }
        if name.trim().is_empty() {
            return Err(DomainError::validation("name", "must not be empty"));
        }
        if unit_price.is_negative() {
            return Err(DomainError::validation("unit_price", "must not be negative"));
        }

        Ok(Self {
            id,
            tenant_id,
            sku,
            name,
            unit_price,
            stock_quantity: 0,
            created_at: at,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn stock_quantity(&self) -> i64 {
        self.stock_quantity
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Copy of this product with the stock delta applied.
    ///
    /// Stock never goes negative; a delta that would take it below zero is
    /// rejected, not clamped. Callers are the inventory issue/receive
    /// functions, which pair the returned product with a movement row.
    pub fn adjusted(&self, delta: i64) -> DomainResult<Product> {
        let stock_quantity = self
            .stock_quantity
            .checked_add(delta)
            .ok_or_else(|| DomainError::conflict("stock quantity overflow"))?;
        if stock_quantity < 0 {
            return Err(DomainError::conflict(format!(
                "insufficient stock: on hand {}, requested {}",
                self.stock_quantity, -delta
            )));
        }

        let mut product = self.clone();
        product.stock_quantity = stock_quantity;
        Ok(product)
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
