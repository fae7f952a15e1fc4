//! Invoice status derivation.
//!
//! Pure functions over the live payment state. The status stored on an
//! invoice is always the output of [`derive_status`] recomputed after every
//! payment or refund — never incremented in place — so recomputing from the
//! same rows is idempotent by construction.

use clinerp_core::Money;

use crate::{InvoiceStatus, Payment};

/// Payments applied minus refunds, across the invoice's payments.
pub fn net_paid(payments: &[Payment]) -> Money {
    payments.iter().fold(Money::ZERO, |acc, p| {
        acc.saturating_add(p.applied_amount())
            .saturating_sub(p.refunded_total())
    })
}

/// Invoice total minus net paid, floored at zero.
pub fn remaining(total: Money, net_paid: Money) -> Money {
    total.saturating_sub(net_paid).clamped_non_negative()
}

/// Three-way classification: unpaid if nothing is effectively paid, paid once
/// net payments cover the total, partially paid in between.
pub fn derive_status(total: Money, net_paid: Money) -> InvoiceStatus {
    if !net_paid.is_positive() {
        InvoiceStatus::Unpaid
    } else if net_paid < total {
        InvoiceStatus::PartiallyPaid
    } else {
        InvoiceStatus::Paid
    }
}
