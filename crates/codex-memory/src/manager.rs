//! Memory manager: the only writer of memory entries and summaries.
//!
//! Owns an injected [`MemoryStore`] so each orchestrator (and each test)
//! gets an isolated set of sessions.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use codex_core::SessionId;

use crate::error::Result;
use crate::store::{InMemoryStore, MemoryStore};
use crate::summary::fold_entry;
use crate::types::{
    ConversationSummary, MemoryEntry, MemoryType, NewMemory, MAX_IMPORTANCE, MIN_IMPORTANCE,
};

/// Maximum number of entries returned by a single retrieval.
pub const RETRIEVE_LIMIT: usize = 10;

/// Entries above this importance survive retention cleanup regardless of age.
pub const PROTECTED_IMPORTANCE: u8 = 8;

/// Result of a retention cleanup cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanupReport {
    /// Number of memory entries deleted.
    pub entries_removed: usize,
    /// Number of summaries deleted because their session had no entries left.
    pub summaries_removed: usize,
}

pub struct MemoryManager {
    store: Arc<dyn MemoryStore>,
}

impl MemoryManager {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }

    /// Manager over a fresh process-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()))
    }

    // =========================================================================
    // Storing
    // =========================================================================

    /// Store a memory and fold it into the session summary.
    pub fn store(&self, session: &SessionId, memory: NewMemory) -> Result<MemoryEntry> {
        self.store_at(session, memory, Utc::now())
    }

    /// Store with an explicit creation time.
    pub fn store_at(
        &self,
        session: &SessionId,
        memory: NewMemory,
        created_at: DateTime<Utc>,
    ) -> Result<MemoryEntry> {
        let entry = MemoryEntry {
            id: Uuid::new_v4(),
            session_id: session.clone(),
            memory_type: memory.memory_type,
            content: memory.content,
            context: memory.context,
            importance: memory.importance.clamp(MIN_IMPORTANCE, MAX_IMPORTANCE),
            timestamp: created_at,
            last_accessed: created_at,
            access_count: 0,
            tags: memory.tags,
        };

        self.store.append(entry.clone())?;
        self.store
            .update_summary(session, created_at, &mut |summary| {
                fold_entry(summary, &entry, created_at)
            })?;

        debug!(
            session = %session,
            memory_type = %entry.memory_type,
            importance = entry.importance,
            tags = entry.tags.len(),
            "Memory stored"
        );
        Ok(entry)
    }

    // =========================================================================
    // Retrieval
    // =========================================================================

    /// Most relevant memories of a session.
    ///
    /// `query` matches a case-insensitive content substring or an exact tag.
    /// Results are ordered by [`MemoryEntry::relevance`] and capped at
    /// [`RETRIEVE_LIMIT`]; every returned entry is touched.
    pub fn retrieve(
        &self,
        session: &SessionId,
        query: Option<&str>,
        memory_type: Option<MemoryType>,
    ) -> Result<Vec<MemoryEntry>> {
        self.retrieve_at(session, query, memory_type, Utc::now())
    }

    pub fn retrieve_at(
        &self,
        session: &SessionId,
        query: Option<&str>,
        memory_type: Option<MemoryType>,
        now: DateTime<Utc>,
    ) -> Result<Vec<MemoryEntry>> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());

        let mut scored: Vec<(f64, MemoryEntry)> = self
            .store
            .entries(session)?
            .into_iter()
            .filter(|e| memory_type.map_or(true, |t| e.memory_type == t))
            .filter(|e| query.map_or(true, |q| e.matches_query(q)))
            .map(|e| (e.relevance(now), e))
            .collect();

        scored.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then_with(|| b.1.timestamp.cmp(&a.1.timestamp))
        });
        scored.truncate(RETRIEVE_LIMIT);

        let ids: Vec<Uuid> = scored.iter().map(|(_, e)| e.id).collect();
        if !ids.is_empty() {
            self.store.touch(session, &ids, now)?;
        }

        Ok(scored
            .into_iter()
            .map(|(_, mut e)| {
                e.last_accessed = now;
                e.access_count = e.access_count.saturating_add(1);
                e
            })
            .collect())
    }

    // =========================================================================
    // Summary
    // =========================================================================

    pub fn summary(&self, session: &SessionId) -> Result<Option<ConversationSummary>> {
        self.store.summary(session)
    }

    /// Current lead score, zero for unknown sessions.
    pub fn lead_score(&self, session: &SessionId) -> Result<u32> {
        Ok(self
            .store
            .summary(session)?
            .map_or(0, |s| s.user_profile.lead_score))
    }

    /// Raise the lead score. Deltas are unsigned so the score never drops.
    pub fn add_lead_score(&self, session: &SessionId, delta: u32) -> Result<u32> {
        let now = Utc::now();
        let summary = self.store.update_summary(session, now, &mut |s| {
            s.user_profile.lead_score = s.user_profile.lead_score.saturating_add(delta);
            s.last_interaction = now;
        })?;
        Ok(summary.user_profile.lead_score)
    }

    pub fn set_next_actions(&self, session: &SessionId, actions: Vec<String>) -> Result<()> {
        let now = Utc::now();
        self.store.update_summary(session, now, &mut |s| {
            s.next_actions = actions.clone();
        })?;
        Ok(())
    }

    /// Sessions that currently have a summary.
    pub fn sessions(&self) -> Result<Vec<SessionId>> {
        self.store.summarized_sessions()
    }

    // =========================================================================
    // Retention
    // =========================================================================

    /// Purge entries older than `max_age` unless their importance is above
    /// [`PROTECTED_IMPORTANCE`]. Sessions left without entries lose their
    /// summary.
    pub fn cleanup_old_memories(&self, max_age: Duration) -> Result<CleanupReport> {
        self.cleanup_at(max_age, Utc::now())
    }

    pub fn cleanup_at(&self, max_age: Duration, now: DateTime<Utc>) -> Result<CleanupReport> {
        let cutoff = now - max_age;
        let entries_removed = self
            .store
            .retain(&|e| e.timestamp >= cutoff || e.importance > PROTECTED_IMPORTANCE)?;

        let mut summaries_removed = 0;
        for session in self.store.summarized_sessions()? {
            if self.store.entry_count(&session)? == 0 && self.store.remove_summary(&session)? {
                summaries_removed += 1;
            }
        }

        let report = CleanupReport {
            entries_removed,
            summaries_removed,
        };
        if entries_removed > 0 || summaries_removed > 0 {
            info!(
                entries_removed,
                summaries_removed, "Memory cleanup completed"
            );
        }
        Ok(report)
    }

    /// Drop every entry and the summary of one session, lead score included.
    /// Returns the number of entries removed.
    pub fn forget_session(&self, session: &SessionId) -> Result<usize> {
        let removed = self.store.retain(&|e| e.session_id != *session)?;
        let had_summary = self.store.remove_summary(session)?;
        if removed > 0 || had_summary {
            debug!(session = %session, entries_removed = removed, "Session memory forgotten");
        }
        Ok(removed)
    }
}
