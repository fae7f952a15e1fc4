use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::Utc;

use clinerp_accounting::{
    AccountId, JournalEntry, JournalEntryId, JournalLine, LedgerEntryKind, PartyLedgerEntry,
    SourceRef, statement,
};
use clinerp_core::{EntityId, Money, TenantId, UserId};
use clinerp_parties::PartyId;

fn bench_journal_posting(c: &mut Criterion) {
    let tenant_id = TenantId::new();
    let user_id = UserId::new();
    let cash = AccountId::new(EntityId::new());
    let ar = AccountId::new(EntityId::new());
    let today = Utc::now().date_naive();
    let now = Utc::now();

    c.bench_function("journal_post_two_lines", |b| {
        b.iter(|| {
            JournalEntry::post(
                JournalEntryId::new(EntityId::new()),
                tenant_id,
                today,
                black_box("Payment for invoice INV-0001"),
                Some(SourceRef::Payment(EntityId::new())),
                vec![
                    JournalLine::debit(cash, Money::from_cents(black_box(2000))),
                    JournalLine::credit(ar, Money::from_cents(black_box(2000))),
                ],
                user_id,
                now,
            )
            .unwrap()
        })
    });
}

fn ledger_entries(tenant_id: TenantId, party_id: PartyId, count: u64) -> Vec<PartyLedgerEntry> {
    let today = Utc::now().date_naive();
    (0..count)
        .map(|i| PartyLedgerEntry {
            seq: i + 1,
            tenant_id,
            party_id,
            entry_date: today + chrono::Duration::days((i % 90) as i64),
            kind: if i % 2 == 0 {
                LedgerEntryKind::Invoice
            } else {
                LedgerEntryKind::Payment
            },
            debit: if i % 2 == 0 {
                Money::from_cents(3500)
            } else {
                Money::ZERO
            },
            credit: if i % 2 == 0 {
                Money::ZERO
            } else {
                Money::from_cents(2000)
            },
            description: format!("entry {i}"),
            source: SourceRef::Invoice(EntityId::new()),
        })
        .collect()
}

fn bench_statement_fold(c: &mut Criterion) {
    let tenant_id = TenantId::new();
    let party_id = PartyId::new(EntityId::new());

    let mut group = c.benchmark_group("statement_fold");
    for size in [100u64, 1_000, 10_000] {
        let entries = ledger_entries(tenant_id, party_id, size);
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &entries, |b, entries| {
            b.iter(|| statement(black_box(entries), None, None))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_journal_posting, bench_statement_fold);
criterion_main!(benches);
