//! `clinerp-accounting` — chart of accounts, journal engine, sub-ledgers,
//! statements.
//!
//! The journal is append-only double-entry bookkeeping: entries are balanced
//! at construction and immutable afterwards; corrections happen through
//! reversing entries, never mutation. The customer/supplier sub-ledgers feed
//! the running-balance statement generator.

pub mod chart;
pub mod journal;
pub mod ledger;
pub mod statement;

pub use chart::{Account, AccountId, AccountKind, codes, default_chart};
pub use journal::{JournalEntry, JournalEntryId, JournalLine, SourceRef};
pub use ledger::{LedgerEntryKind, NewLedgerEntry, PartyLedgerEntry};
pub use statement::{Statement, StatementRow, statement};
