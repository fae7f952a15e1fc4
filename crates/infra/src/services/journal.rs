//! Journal engine operations: post and reverse.

use chrono::{NaiveDate, Utc};

use clinerp_accounting::{JournalEntry, JournalEntryId, JournalLine, SourceRef};
use clinerp_audit::AuditEvent;
use clinerp_auth::{Actor, TenantScope, stamp_tenant};
use clinerp_core::{DomainError, DomainResult, EntityId};

use super::Services;

impl Services {
    /// Post a balanced journal entry. All-or-nothing: any invalid line or an
    /// unbalanced total fails the whole operation before anything is written.
    pub fn post_journal_entry(
        &self,
        actor: &Actor,
        source: Option<SourceRef>,
        description: &str,
        lines: Vec<JournalLine>,
        date: Option<NaiveDate>,
    ) -> DomainResult<JournalEntry> {
        let tenant_id = stamp_tenant(actor, None)?;
        let scope = TenantScope::for_actor(actor);
        let now = Utc::now();

        let entry = self.store().write(|state| {
            for line in &lines {
                if state.account(scope, line.account_id).is_none() {
                    return Err(DomainError::not_found());
                }
            }

            let entry = JournalEntry::post(
                JournalEntryId::new(EntityId::new()),
                tenant_id,
                date.unwrap_or_else(|| now.date_naive()),
                description,
                source,
                lines,
                actor.user_id,
                now,
            )?;
            state.append_journal(entry.clone());
            Ok(entry)
        })?;

        tracing::debug!(entry_id = %entry.id_typed(), "journal entry posted");
        self.emit(AuditEvent::new(
            "journal.posted",
            "journal_entry",
            entry.id_typed(),
            Some(tenant_id),
            actor.user_id,
            now,
        ));
        Ok(entry)
    }

    /// Post the compensating entry for an earlier posting. The original is
    /// untouched — the journal has no update path, corrections only append.
    pub fn reverse_journal_entry(
        &self,
        actor: &Actor,
        entry_id: JournalEntryId,
    ) -> DomainResult<JournalEntry> {
        let scope = TenantScope::for_actor(actor);
        let now = Utc::now();

        let reversal = self.store().write(|state| {
            let original = state
                .journal_entry(scope, entry_id)
                .ok_or_else(DomainError::not_found)?;
            let reversal =
                original.reversed(JournalEntryId::new(EntityId::new()), now, actor.user_id);
            state.append_journal(reversal.clone());
            Ok(reversal)
        })?;

        self.emit(AuditEvent::new(
            "journal.reversed",
            "journal_entry",
            entry_id,
            Some(reversal.tenant_id()),
            actor.user_id,
            now,
        ));
        Ok(reversal)
    }

    pub fn journal_entries(&self, actor: &Actor) -> DomainResult<Vec<JournalEntry>> {
        let scope = TenantScope::for_actor(actor);
        self.store()
            .read(|state| Ok(state.journal_of(scope).into_iter().cloned().collect()))
    }
}
