//! Statement generator: running balances over a party's sub-ledger.
//!
//! A pure function over ledger data — no locks, no side effects, safe to call
//! repeatedly and from replicas.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use clinerp_core::Money;

use crate::PartyLedgerEntry;

/// One statement row: the ledger entry plus a snapshot of the running
/// balance after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementRow {
    pub entry: PartyLedgerEntry,
    pub running_balance: Money,
}

/// A party statement over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    /// Σ(debit − credit) of all entries dated before the range.
    pub opening_balance: Money,
    pub rows: Vec<StatementRow>,
    /// Running total after the last row.
    pub closing_balance: Money,
}

/// Compute a statement from one party's ledger entries.
///
/// Entries are ordered by `(entry_date, seq)` — the tie-break is mandatory
/// for deterministic running balances when multiple entries share a date.
/// `from`/`to` bound the reported rows inclusively; entries before `from`
/// fold into the opening balance, entries after `to` are ignored.
pub fn statement(
    entries: &[PartyLedgerEntry],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Statement {
    let mut ordered: Vec<&PartyLedgerEntry> = entries.iter().collect();
    ordered.sort_by_key(|e| (e.entry_date, e.seq));

    let mut opening_balance = Money::ZERO;
    let mut rows = Vec::new();
    let mut running = Money::ZERO;

    for entry in ordered {
        if from.is_some_and(|from| entry.entry_date < from) {
            opening_balance = opening_balance.saturating_add(entry.signed_amount());
            continue;
        }
        if to.is_some_and(|to| entry.entry_date > to) {
            continue;
        }

        running = running.saturating_add(entry.signed_amount());
        rows.push(StatementRow {
            entry: entry.clone(),
            running_balance: opening_balance.saturating_add(running),
        });
    }

    Statement {
        opening_balance,
        closing_balance: opening_balance.saturating_add(running),
        rows,
    }
}
