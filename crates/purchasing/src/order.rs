use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clinerp_core::{DomainError, DomainResult, Entity, EntityId, Money, TenantId, UserId};
use clinerp_invoicing::PaymentMethod;
use clinerp_parties::PartyId;
use clinerp_products::ProductId;

/// Purchase order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseOrderId(pub EntityId);

impl PurchaseOrderId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PurchaseOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Supplier payment identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupplierPaymentId(pub EntityId);

impl SupplierPaymentId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for SupplierPaymentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Purchase order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseOrderStatus {
    Draft,
    Ordered,
    Received,
    Paid,
    Cancelled,
}

/// Purchase order line: product, quantity, unit cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLine {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_cost: Money,
}

impl PurchaseLine {
    pub fn line_total(&self) -> DomainResult<Money> {
        self.unit_cost.checked_mul(self.quantity)
    }
}

/// A purchase order — the mirror of the sales side.
///
/// Receiving increments stock (one movement per line); paying records
/// supplier payments and flips the status to `paid` once they cover the
/// total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    id: PurchaseOrderId,
    tenant_id: TenantId,
    number: String,
    supplier_id: PartyId,
    status: PurchaseOrderStatus,
    lines: Vec<PurchaseLine>,
    /// Derived from the lines, never user-supplied.
    total: Money,
    created_by: UserId,
    created_at: DateTime<Utc>,
}

impl PurchaseOrder {
    pub fn new(
        id: PurchaseOrderId,
        tenant_id: TenantId,
        supplier_id: PartyId,
        lines: Vec<PurchaseLine>,
        created_by: UserId,
        at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        for line in &lines {
            if line.quantity <= 0 {
                return Err(DomainError::validation("quantity", "must be positive"));
            }
            if line.unit_cost.is_negative() {
                return Err(DomainError::validation("unit_cost", "must not be negative"));
            }
        }

        let uuid = id.0.as_uuid().simple().to_string();
        let mut order = Self {
            id,
            tenant_id,
            number: format!("PO-{}-{}", at.format("%Y%m%d%H%M%S"), &uuid[..8]),
            supplier_id,
            status: PurchaseOrderStatus::Draft,
            lines,
            total: Money::ZERO,
            created_by,
            created_at: at,
        };
        order.total = order.total_from_lines()?;
        Ok(order)
    }

    pub fn id_typed(&self) -> PurchaseOrderId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn supplier_id(&self) -> PartyId {
        self.supplier_id
    }

    pub fn status(&self) -> PurchaseOrderStatus {
        self.status
    }

    pub fn lines(&self) -> &[PurchaseLine] {
        &self.lines
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

    pub fn total_from_lines(&self) -> DomainResult<Money> {
        let mut total = Money::ZERO;
        for line in &self.lines {
            total = total.checked_add(line.line_total()?)?;
        }
        Ok(total)
    }

    /// `draft → ordered`.
    pub fn mark_ordered(&self) -> DomainResult<PurchaseOrder> {
        if self.status != PurchaseOrderStatus::Draft {
            return Err(DomainError::conflict("only draft purchase orders can be ordered"));
        }
        if self.lines.is_empty() {
            return Err(DomainError::validation(
                "lines",
                "cannot order a purchase order without lines",
            ));
        }

        let mut order = self.clone();
        order.status = PurchaseOrderStatus::Ordered;
        Ok(order)
    }

    /// `ordered → received`. The caller increments stock per line alongside.
    pub fn receive(&self) -> DomainResult<PurchaseOrder> {
        if self.status != PurchaseOrderStatus::Ordered {
            return Err(DomainError::conflict(
                "only ordered purchase orders can be received",
            ));
        }

        let mut order = self.clone();
        order.status = PurchaseOrderStatus::Received;
        Ok(order)
    }

    /// `draft|ordered → cancelled`. Received or paid orders stay.
    pub fn cancel(&self) -> DomainResult<PurchaseOrder> {
        match self.status {
            PurchaseOrderStatus::Cancelled => {
                Err(DomainError::conflict("purchase order is already cancelled"))
            }
            PurchaseOrderStatus::Received | PurchaseOrderStatus::Paid => Err(
                DomainError::conflict("cannot cancel a received purchase order"),
            ),
            PurchaseOrderStatus::Draft | PurchaseOrderStatus::Ordered => {
                let mut order = self.clone();
                order.status = PurchaseOrderStatus::Cancelled;
                Ok(order)
            }
        }
    }

    /// Whether a payment may currently be recorded against this order.
    pub fn accepts_payment(&self) -> bool {
        matches!(
            self.status,
            PurchaseOrderStatus::Ordered | PurchaseOrderStatus::Received
        )
    }

    /// Apply the freshly computed covered total after a payment; flips to
    /// `paid` once payments cover the total.
    pub fn with_paid_total(&self, paid_total: Money) -> PurchaseOrder {
        let mut order = self.clone();
        if paid_total >= self.total && self.accepts_payment() {
            order.status = PurchaseOrderStatus::Paid;
        }
        order
    }
}

impl Entity for PurchaseOrder {
    type Id = PurchaseOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A payment made to a supplier against a purchase order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierPayment {
    id: SupplierPaymentId,
    tenant_id: TenantId,
    purchase_order_id: PurchaseOrderId,
    amount: Money,
    method: PaymentMethod,
    paid_at: DateTime<Utc>,
    received_by: UserId,
}

impl SupplierPayment {
    pub fn new(
        id: SupplierPaymentId,
        tenant_id: TenantId,
        purchase_order_id: PurchaseOrderId,
        amount: Money,
        method: PaymentMethod,
        paid_at: DateTime<Utc>,
        received_by: UserId,
    ) -> DomainResult<Self> {
        if !amount.is_positive() {
            return Err(DomainError::validation("amount", "must be positive"));
        }

        Ok(Self {
            id,
            tenant_id,
            purchase_order_id,
            amount,
            method,
            paid_at,
            received_by,
        })
    }

    pub fn id_typed(&self) -> SupplierPaymentId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn purchase_order_id(&self) -> PurchaseOrderId {
        self.purchase_order_id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn paid_at(&self) -> DateTime<Utc> {
        self.paid_at
    }

    pub fn received_by(&self) -> UserId {
        self.received_by
    }
}

impl Entity for SupplierPayment {
    type Id = SupplierPaymentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
