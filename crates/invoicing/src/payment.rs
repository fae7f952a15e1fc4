use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clinerp_core::{DomainError, DomainResult, Entity, EntityId, Money, TenantId, UserId};

use crate::InvoiceId;

/// Payment identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(pub EntityId);

impl PaymentId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PaymentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    Insurance,
}

/// A refund issued against one payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRefund {
    pub amount: Money,
    pub refunded_at: DateTime<Utc>,
    pub created_by: UserId,
}

/// A payment received against an invoice. Owns its refunds.
///
/// Invariant: Σ(refunds) ≤ amount — a refund may never exceed what remains
/// unrefunded on this payment, no matter how it is split up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    id: PaymentId,
    tenant_id: TenantId,
    invoice_id: InvoiceId,
    amount: Money,
    /// Portion counted against the invoice balance. Currently always the full
    /// amount; kept separate so partial application stays representable.
    applied_amount: Money,
    method: PaymentMethod,
    paid_at: DateTime<Utc>,
    received_by: UserId,
    refunds: Vec<PaymentRefund>,
}

impl Payment {
    pub fn new(
        id: PaymentId,
        tenant_id: TenantId,
        invoice_id: InvoiceId,
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
            invoice_id,
            amount,
            applied_amount: amount,
            method,
            paid_at,
            received_by,
            refunds: Vec::new(),
        })
    }

    pub fn id_typed(&self) -> PaymentId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn invoice_id(&self) -> InvoiceId {
        self.invoice_id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn applied_amount(&self) -> Money {
        self.applied_amount
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

    pub fn refunds(&self) -> &[PaymentRefund] {
        &self.refunds
    }

    pub fn refunded_total(&self) -> Money {
        self.refunds
            .iter()
            .fold(Money::ZERO, |acc, r| acc.saturating_add(r.amount))
    }

    /// What may still be refunded on this payment.
    pub fn refundable(&self) -> Money {
        self.amount.saturating_sub(self.refunded_total())
    }

    /// Record a refund. Partial refunds accumulate against the same cap; the
    /// rejection message reports the remaining refundable amount so the caller
    /// can correct and resubmit.
    pub fn refund(
        &self,
        amount: Money,
        at: DateTime<Utc>,
        created_by: UserId,
    ) -> DomainResult<Payment> {
        if !amount.is_positive() {
            return Err(DomainError::validation("amount", "must be positive"));
        }
        let refundable = self.refundable();
        if amount > refundable {
            return Err(DomainError::conflict(format!(
                "refund exceeds paid amount, remaining={refundable}"
            )));
        }

        let mut payment = self.clone();
        payment.refunds.push(PaymentRefund {
            amount,
            refunded_at: at,
            created_by,
        });
        Ok(payment)
    }
}

impl Entity for Payment {
    type Id = PaymentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_payment(amount_cents: i64) -> Payment {
        Payment::new(
            PaymentId::new(EntityId::new()),
            TenantId::new(),
            InvoiceId::new(EntityId::new()),
            Money::from_cents(amount_cents),
            PaymentMethod::Cash,
            Utc::now(),
            UserId::new(),
        )
        .unwrap()
    }

    #[test]
    fn applied_amount_defaults_to_the_full_amount() {
        let payment = test_payment(1500);
        assert_eq!(payment.applied_amount(), Money::from_cents(1500));
        assert_eq!(payment.refundable(), Money::from_cents(1500));
    }

    #[test]
    fn partial_refunds_accumulate_against_the_cap() {
        let payment = test_payment(1500);
        let payment = payment
            .refund(Money::from_cents(500), Utc::now(), UserId::new())
            .unwrap();
        assert_eq!(payment.refundable(), Money::from_cents(1000));

        let err = payment
            .refund(Money::from_cents(2000), Utc::now(), UserId::new())
            .unwrap_err();
        assert!(
            matches!(err, DomainError::Conflict(ref msg) if msg.contains("remaining=10.00")),
            "{err:?}"
        );

        // Exactly the remainder is still fine.
        let payment = payment
            .refund(Money::from_cents(1000), Utc::now(), UserId::new())
            .unwrap();
        assert_eq!(payment.refundable(), Money::ZERO);
        assert!(
            payment
                .refund(Money::from_cents(1), Utc::now(), UserId::new())
                .is_err()
        );
    }

    #[test]
    fn zero_amounts_are_invalid() {
        assert!(
            Payment::new(
                PaymentId::new(EntityId::new()),
                TenantId::new(),
                InvoiceId::new(EntityId::new()),
                Money::ZERO,
                PaymentMethod::Card,
                Utc::now(),
                UserId::new(),
            )
            .is_err()
        );
        assert!(
            test_payment(100)
                .refund(Money::ZERO, Utc::now(), UserId::new())
                .is_err()
        );
    }

    proptest! {
        /// Property: under any sequence of refund attempts, the refunded
        /// total never exceeds the payment amount.
        #[test]
        fn refunds_never_exceed_the_payment(
            amount in 1i64..100_000,
            attempts in prop::collection::vec(1i64..50_000, 0..20)
        ) {
            let mut payment = test_payment(amount);
            for attempt in attempts {
                if let Ok(updated) =
                    payment.refund(Money::from_cents(attempt), Utc::now(), UserId::new())
                {
                    payment = updated;
                }
                prop_assert!(payment.refunded_total() <= payment.amount());
            }
        }
    }
}
