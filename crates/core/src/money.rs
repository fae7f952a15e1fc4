//! Fixed-point money: integer cents, two decimal places.
//!
//! All money fields in the system use this type. Keeping amounts in the
//! smallest currency unit makes every balance check exact — there is no
//! floating-point representation anywhere for rounding to drift through.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// An amount in the smallest currency unit (e.g. cents).
///
/// Signed: sub-ledger folds produce negative running balances for parties in
/// credit. Individual postings (prices, payments, refunds) are non-negative;
/// constructors on the entities enforce that.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Whole currency units, no fractional part.
    pub const fn from_units(units: i64) -> Self {
        Self(units * 100)
    }

    pub const fn cents(&self) -> i64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Money) -> DomainResult<Money> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or_else(|| DomainError::conflict("amount overflow"))
    }

    pub fn checked_sub(self, other: Money) -> DomainResult<Money> {
        self.0
            .checked_sub(other.0)
            .map(Money)
            .ok_or_else(|| DomainError::conflict("amount overflow"))
    }

    /// Line total: unit amount times quantity.
    pub fn checked_mul(self, quantity: i64) -> DomainResult<Money> {
        self.0
            .checked_mul(quantity)
            .map(Money)
            .ok_or_else(|| DomainError::conflict("amount overflow"))
    }

    pub fn saturating_add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0))
    }

    /// Floors at zero: remaining-due style amounts never go negative.
    pub fn clamped_non_negative(self) -> Money {
        if self.0 < 0 { Money::ZERO } else { self }
    }
}

impl ValueObject for Money {}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_with_two_decimals() {
        assert_eq!(Money::from_cents(3500).to_string(), "35.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-1250).to_string(), "-12.50");
    }

    #[test]
    fn from_units_scales_to_cents() {
        assert_eq!(Money::from_units(10), Money::from_cents(1000));
    }

    #[test]
    fn checked_arithmetic_detects_overflow() {
        let max = Money::from_cents(i64::MAX);
        assert!(max.checked_add(Money::from_cents(1)).is_err());
        assert!(max.checked_mul(2).is_err());
        assert_eq!(
            Money::from_cents(1000).checked_mul(3).unwrap(),
            Money::from_cents(3000)
        );
    }

    #[test]
    fn clamping_floors_at_zero() {
        assert_eq!(Money::from_cents(-1).clamped_non_negative(), Money::ZERO);
        assert_eq!(
            Money::from_cents(7).clamped_non_negative(),
            Money::from_cents(7)
        );
    }
}
