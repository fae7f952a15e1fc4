use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clinerp_core::{DomainError, DomainResult, Entity, EntityId, Money, TenantId, UserId};
use clinerp_parties::PartyId;
use clinerp_products::ProductId;

/// Order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub EntityId);

impl OrderId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Order status lifecycle.
///
/// `pending → confirmed` and `pending → cancelled`; both end states are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Cancelled,
}

/// Order line: product, quantity, unit price.
///
/// The unit price is read from the catalog at creation time, never taken from
/// the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Money,
}

impl OrderItem {
    pub fn line_total(&self) -> DomainResult<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

/// A customer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    tenant_id: TenantId,
    customer_id: PartyId,
    status: OrderStatus,
    items: Vec<OrderItem>,
    /// Derived from the items, never user-supplied.
    total: Money,
    created_by: UserId,
    created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        id: OrderId,
        tenant_id: TenantId,
        customer_id: PartyId,
        items: Vec<OrderItem>,
        created_by: UserId,
        at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        for item in &items {
            if item.quantity <= 0 {
                return Err(DomainError::validation("quantity", "must be positive"));
            }
            if item.unit_price.is_negative() {
                return Err(DomainError::validation("unit_price", "must not be negative"));
            }
        }

        let mut order = Self {
            id,
            tenant_id,
            customer_id,
            status: OrderStatus::Pending,
            items,
            total: Money::ZERO,
            created_by,
            created_at: at,
        };
        order.total = order.total_from_items()?;
        Ok(order)
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn customer_id(&self) -> PartyId {
        self.customer_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Recompute the total strictly from the items. Confirmation never trusts
    /// the stored total.
    pub fn total_from_items(&self) -> DomainResult<Money> {
        let mut total = Money::ZERO;
        for item in &self.items {
            total = total.checked_add(item.line_total()?)?;
        }
        Ok(total)
    }

    /// `pending → confirmed`, with the total re-derived from the items.
    pub fn confirm(&self) -> DomainResult<Order> {
        match self.status {
            OrderStatus::Confirmed => {
                return Err(DomainError::conflict("order is already confirmed"));
            }
            OrderStatus::Cancelled => {
                return Err(DomainError::conflict("cannot confirm a cancelled order"));
            }
            OrderStatus::Pending => {}
        }
        if self.items.is_empty() {
            return Err(DomainError::validation(
                "items",
                "cannot confirm an order without items",
            ));
        }

        let mut order = self.clone();
        order.total = self.total_from_items()?;
        order.status = OrderStatus::Confirmed;
        Ok(order)
    }

    /// `pending → cancelled`. Cancelling twice is rejected, not silently
    /// repeated — callers restore stock exactly once.
    pub fn cancel(&self) -> DomainResult<Order> {
        match self.status {
            OrderStatus::Cancelled => {
                return Err(DomainError::conflict("order is already cancelled"));
            }
            OrderStatus::Confirmed => {
                return Err(DomainError::conflict("cannot cancel a confirmed order"));
            }
            OrderStatus::Pending => {}
        }

        let mut order = self.clone();
        order.status = OrderStatus::Cancelled;
        Ok(order)
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
