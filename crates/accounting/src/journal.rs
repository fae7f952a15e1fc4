use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use clinerp_core::{DomainError, DomainResult, Entity, EntityId, Money, TenantId, UserId};

use crate::AccountId;

/// Journal entry identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JournalEntryId(pub EntityId);

impl JournalEntryId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for JournalEntryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Reference to the business object an entry or ledger row traces to.
///
/// A tagged union resolved explicitly at read time — the id is opaque here;
/// the referenced table follows from the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum SourceRef {
    Invoice(EntityId),
    Payment(EntityId),
    Refund(EntityId),
    PurchaseOrder(EntityId),
    SupplierPayment(EntityId),
    /// The journal entry this entry reverses.
    Reversal(EntityId),
}

/// One side of a journal entry.
///
/// Exactly one of the pair is non-zero in every entry this system posts;
/// construction only requires that a line is not dead weight (both zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    pub account_id: AccountId,
    pub debit: Money,
    pub credit: Money,
}

impl JournalLine {
    pub fn debit(account_id: AccountId, amount: Money) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Money::ZERO,
        }
    }

    pub fn credit(account_id: AccountId, amount: Money) -> Self {
        Self {
            account_id,
            debit: Money::ZERO,
            credit: amount,
        }
    }
}

/// A balanced double-entry journal entry.
///
/// Immutable once constructed: there is no update or delete path anywhere.
/// Corrections are posted as reversing entries via [`JournalEntry::reversed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    id: JournalEntryId,
    tenant_id: TenantId,
    entry_date: NaiveDate,
    description: String,
    source: Option<SourceRef>,
    lines: Vec<JournalLine>,
    created_by: UserId,
    created_at: DateTime<Utc>,
}

impl JournalEntry {
    /// Construct a balanced entry. Unbalanced input never yields a value, so
    /// an unbalanced entry cannot exist, let alone be persisted.
    #[allow(clippy::too_many_arguments)]
    pub fn post(
        id: JournalEntryId,
        tenant_id: TenantId,
        entry_date: NaiveDate,
        description: impl Into<String>,
        source: Option<SourceRef>,
        lines: Vec<JournalLine>,
        created_by: UserId,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if lines.len() < 2 {
            return Err(DomainError::validation(
                "lines",
                "journal entry needs at least two lines",
            ));
        }

        let mut debit_total: i128 = 0;
        let mut credit_total: i128 = 0;
        for line in &lines {
            if line.debit.is_negative() || line.credit.is_negative() {
                return Err(DomainError::validation(
                    "lines",
                    "line amounts must not be negative",
                ));
            }
            if line.debit.is_zero() && line.credit.is_zero() {
                return Err(DomainError::validation(
                    "lines",
                    "line must debit or credit an account",
                ));
            }
            debit_total += line.debit.cents() as i128;
            credit_total += line.credit.cents() as i128;
        }

        if debit_total != credit_total {
            return Err(DomainError::conflict(format!(
                "unbalanced journal entry: debits {}, credits {}",
                Money::from_cents(debit_total as i64),
                Money::from_cents(credit_total as i64),
            )));
        }

        Ok(Self {
            id,
            tenant_id,
            entry_date,
            description: description.into(),
            source,
            lines,
            created_by,
            created_at,
        })
    }

    pub fn id_typed(&self) -> JournalEntryId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn entry_date(&self) -> NaiveDate {
        self.entry_date
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn source(&self) -> Option<SourceRef> {
        self.source
    }

    pub fn lines(&self) -> &[JournalLine] {
        &self.lines
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn debit_total(&self) -> Money {
        self.lines
            .iter()
            .fold(Money::ZERO, |acc, l| acc.saturating_add(l.debit))
    }

    pub fn credit_total(&self) -> Money {
        self.lines
            .iter()
            .fold(Money::ZERO, |acc, l| acc.saturating_add(l.credit))
    }

    /// The compensating entry: same accounts, sides swapped, traced back to
    /// this entry. A balanced entry stays balanced under the swap, so this is
    /// infallible.
    pub fn reversed(
        &self,
        id: JournalEntryId,
        at: DateTime<Utc>,
        created_by: UserId,
    ) -> JournalEntry {
        let lines = self
            .lines
            .iter()
            .map(|l| JournalLine {
                account_id: l.account_id,
                debit: l.credit,
                credit: l.debit,
            })
            .collect();

        JournalEntry {
            id,
            tenant_id: self.tenant_id,
            entry_date: at.date_naive(),
            description: format!("Reversal of {}", self.id),
            source: Some(SourceRef::Reversal(self.id.0)),
            lines,
            created_by,
            created_at: at,
        }
    }
}

impl Entity for JournalEntry {
    type Id = JournalEntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
