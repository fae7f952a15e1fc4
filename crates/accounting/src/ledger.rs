//! Customer/supplier sub-ledgers.
//!
//! Append-only rows feeding the running-balance statements, independent of
//! the journal (sub-ledger vs general ledger). Rows are never updated or
//! deleted; a party's balance is computed by folding its entries ordered by
//! `(entry_date, seq)`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use clinerp_core::{Money, TenantId};
use clinerp_parties::PartyId;

use crate::SourceRef;

/// What a sub-ledger row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryKind {
    Invoice,
    Payment,
    Refund,
    PurchaseOrder,
    SupplierPayment,
    Adjustment,
}

/// A sub-ledger row ready to be appended (no sequence number yet).
///
/// The store assigns `seq` during append, exactly once, monotonically per
/// tenant — mirroring how id tie-breaks keep statements reproducible when
/// several rows share an entry date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLedgerEntry {
    pub party_id: PartyId,
    pub entry_date: NaiveDate,
    pub kind: LedgerEntryKind,
    pub debit: Money,
    pub credit: Money,
    pub description: String,
    pub source: SourceRef,
}

impl NewLedgerEntry {
    pub fn debit(
        party_id: PartyId,
        entry_date: NaiveDate,
        kind: LedgerEntryKind,
        amount: Money,
        description: impl Into<String>,
        source: SourceRef,
    ) -> Self {
        Self {
            party_id,
            entry_date,
            kind,
            debit: amount,
            credit: Money::ZERO,
            description: description.into(),
            source,
        }
    }

    pub fn credit(
        party_id: PartyId,
        entry_date: NaiveDate,
        kind: LedgerEntryKind,
        amount: Money,
        description: impl Into<String>,
        source: SourceRef,
    ) -> Self {
        Self {
            party_id,
            entry_date,
            kind,
            debit: Money::ZERO,
            credit: amount,
            description: description.into(),
            source,
        }
    }
}

/// An appended sub-ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyLedgerEntry {
    /// Store-assigned, monotonically increasing per tenant. The tie-break
    /// that makes running balances deterministic within one entry date.
    pub seq: u64,
    pub tenant_id: TenantId,
    pub party_id: PartyId,
    pub entry_date: NaiveDate,
    pub kind: LedgerEntryKind,
    pub debit: Money,
    pub credit: Money,
    pub description: String,
    pub source: SourceRef,
}

impl PartyLedgerEntry {
    /// Contribution of this row to the running balance (debit − credit).
    pub fn signed_amount(&self) -> Money {
        self.debit.saturating_sub(self.credit)
    }
}
