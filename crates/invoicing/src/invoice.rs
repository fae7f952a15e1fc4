use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clinerp_core::{DomainError, DomainResult, Entity, EntityId, Money, TenantId};
use clinerp_parties::PartyId;
use clinerp_products::ProductId;
use clinerp_sales::{OrderId, OrderItem};

/// Invoice identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub EntityId);

impl InvoiceId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Invoice status, derived from payments and refunds after every money
/// movement (see [`crate::status`]). `Cancelled` is set explicitly and is
/// sticky — derivation never resurrects a cancelled invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Unpaid,
    PartiallyPaid,
    Paid,
    Cancelled,
}

/// The business object an invoice bills for — exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum InvoiceSource {
    Order(OrderId),
    Appointment(EntityId),
    TreatmentPlan(EntityId),
}

/// Externally visible invoice number: a timestamp+id composite, unique per
/// tenant, not sequential and not gap-free.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceNumber(String);

impl InvoiceNumber {
    pub fn generate(issued_at: DateTime<Utc>, id: InvoiceId) -> Self {
        let uuid = id.0.as_uuid().simple().to_string();
        Self(format!(
            "INV-{}-{}",
            issued_at.format("%Y%m%d%H%M%S"),
            &uuid[..8]
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Invoice line, copied from the source order line at issue time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Money,
}

impl From<&OrderItem> for InvoiceItem {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
        }
    }
}

/// An invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    id: InvoiceId,
    tenant_id: TenantId,
    number: InvoiceNumber,
    source: InvoiceSource,
    customer_id: PartyId,
    items: Vec<InvoiceItem>,
    total: Money,
    status: InvoiceStatus,
    issued_at: DateTime<Utc>,
}

impl Invoice {
    /// Issue an invoice. Status starts at `unpaid`; the number is generated
    /// from the issue time and id.
    pub fn issue(
        id: InvoiceId,
        tenant_id: TenantId,
        source: InvoiceSource,
        customer_id: PartyId,
        items: Vec<InvoiceItem>,
        total: Money,
        issued_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if total.is_negative() {
            return Err(DomainError::validation("total", "must not be negative"));
        }

        Ok(Self {
            id,
            tenant_id,
            number: InvoiceNumber::generate(issued_at, id),
            source,
            customer_id,
            items,
            total,
            status: InvoiceStatus::Unpaid,
            issued_at,
        })
    }

    pub fn id_typed(&self) -> InvoiceId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn number(&self) -> &InvoiceNumber {
        &self.number
    }

    pub fn source(&self) -> InvoiceSource {
        self.source
    }

    pub fn customer_id(&self) -> PartyId {
        self.customer_id
    }

    pub fn items(&self) -> &[InvoiceItem] {
        &self.items
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == InvoiceStatus::Cancelled
    }

    /// Copy of this invoice with the freshly derived status applied.
    /// Cancellation is sticky.
    pub fn with_status(&self, status: InvoiceStatus) -> Invoice {
        let mut invoice = self.clone();
        if !self.is_cancelled() {
            invoice.status = status;
        }
        invoice
    }

    /// Mark the invoice cancelled. Only allowed while nothing has been paid
    /// net of refunds; the caller computes `net_paid` from the live payment
    /// state.
    pub fn cancel(&self, net_paid: Money) -> DomainResult<Invoice> {
        if self.is_cancelled() {
            return Err(DomainError::conflict("invoice is already cancelled"));
        }
        if net_paid.is_positive() {
            return Err(DomainError::conflict(
                "cannot cancel an invoice with payments applied",
            ));
        }

        let mut invoice = self.clone();
        invoice.status = InvoiceStatus::Cancelled;
        Ok(invoice)
    }
}

impl Entity for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
