//! Storage backends for memory entries and summaries.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use codex_core::SessionId;

use crate::error::Result;
use crate::types::{ConversationSummary, MemoryEntry};

/// Backend holding memory entries and one summary per session.
///
/// The manager is the only writer. Implementations must make each method
/// atomic with respect to concurrent callers.
pub trait MemoryStore: Send + Sync {
    /// Append a new entry to its session.
    fn append(&self, entry: MemoryEntry) -> Result<()>;

    /// All entries of a session, in insertion order.
    fn entries(&self, session: &SessionId) -> Result<Vec<MemoryEntry>>;

    /// Mark entries as accessed: `last_accessed = at`, `access_count += 1`.
    fn touch(&self, session: &SessionId, ids: &[Uuid], at: DateTime<Utc>) -> Result<()>;

    /// Keep only entries for which `keep` returns true. Returns the number
    /// removed. Sessions left without entries disappear from the entry map.
    fn retain(&self, keep: &dyn Fn(&MemoryEntry) -> bool) -> Result<usize>;

    fn entry_count(&self, session: &SessionId) -> Result<usize>;

    fn summary(&self, session: &SessionId) -> Result<Option<ConversationSummary>>;

    /// Apply `update` to the session's summary, creating it first if absent,
    /// and return the updated copy.
    fn update_summary(
        &self,
        session: &SessionId,
        now: DateTime<Utc>,
        update: &mut dyn FnMut(&mut ConversationSummary),
    ) -> Result<ConversationSummary>;

    /// Returns whether a summary existed.
    fn remove_summary(&self, session: &SessionId) -> Result<bool>;

    /// Sessions that currently hold a summary.
    fn summarized_sessions(&self) -> Result<Vec<SessionId>>;
}

// =============================================================================
// InMemoryStore
// =============================================================================

/// Process-memory backend. Nothing survives a restart.
#[derive(Default)]
pub struct InMemoryStore {
    entries: Mutex<HashMap<SessionId, Vec<MemoryEntry>>>,
    summaries: Mutex<HashMap<SessionId, ConversationSummary>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries_lock(&self) -> MutexGuard<'_, HashMap<SessionId, Vec<MemoryEntry>>> {
        // Critical sections never leave the map half-updated.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn summaries_lock(&self) -> MutexGuard<'_, HashMap<SessionId, ConversationSummary>> {
        self.summaries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl MemoryStore for InMemoryStore {
    fn append(&self, entry: MemoryEntry) -> Result<()> {
        self.entries_lock()
            .entry(entry.session_id.clone())
            .or_default()
            .push(entry);
        Ok(())
    }

    fn entries(&self, session: &SessionId) -> Result<Vec<MemoryEntry>> {
        Ok(self
            .entries_lock()
            .get(session)
            .cloned()
            .unwrap_or_default())
    }

    fn touch(&self, session: &SessionId, ids: &[Uuid], at: DateTime<Utc>) -> Result<()> {
        let mut entries = self.entries_lock();
        if let Some(list) = entries.get_mut(session) {
            for entry in list.iter_mut().filter(|e| ids.contains(&e.id)) {
                entry.last_accessed = at;
                entry.access_count = entry.access_count.saturating_add(1);
            }
        }
        Ok(())
    }

    fn retain(&self, keep: &dyn Fn(&MemoryEntry) -> bool) -> Result<usize> {
        let mut entries = self.entries_lock();
        let mut removed = 0;
        for list in entries.values_mut() {
            let before = list.len();
            list.retain(|e| keep(e));
            removed += before - list.len();
        }
        entries.retain(|_, list| !list.is_empty());
        Ok(removed)
    }

    fn entry_count(&self, session: &SessionId) -> Result<usize> {
        Ok(self.entries_lock().get(session).map_or(0, |l| l.len()))
    }

    fn summary(&self, session: &SessionId) -> Result<Option<ConversationSummary>> {
        Ok(self.summaries_lock().get(session).cloned())
    }

    fn update_summary(
        &self,
        session: &SessionId,
        now: DateTime<Utc>,
        update: &mut dyn FnMut(&mut ConversationSummary),
    ) -> Result<ConversationSummary> {
        let mut summaries = self.summaries_lock();
        let summary = summaries
            .entry(session.clone())
            .or_insert_with(|| ConversationSummary::new(session.clone(), now));
        update(summary);
        Ok(summary.clone())
    }

    fn remove_summary(&self, session: &SessionId) -> Result<bool> {
        Ok(self.summaries_lock().remove(session).is_some())
    }

    fn summarized_sessions(&self) -> Result<Vec<SessionId>> {
        let mut sessions: Vec<SessionId> = self.summaries_lock().keys().cloned().collect();
        sessions.sort();
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MemoryType;
    use std::collections::{BTreeSet, HashMap};
    use std::sync::Arc;

    fn entry(session: &str, importance: u8) -> MemoryEntry {
        let now = Utc::now();
        MemoryEntry {
            id: Uuid::new_v4(),
            session_id: SessionId::from(session),
            memory_type: MemoryType::Episodic,
            content: format!("entry with importance {}", importance),
            context: HashMap::new(),
            importance,
            timestamp: now,
            last_accessed: now,
            access_count: 0,
            tags: BTreeSet::new(),
        }
    }

    #[test]
    fn test_append_and_entries_are_per_session() {
        let store = InMemoryStore::new();
        store.append(entry("a", 1)).unwrap();
        store.append(entry("a", 2)).unwrap();
        store.append(entry("b", 3)).unwrap();

        let a = store.entries(&SessionId::from("a")).unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].importance, 1);
        assert_eq!(store.entry_count(&SessionId::from("b")).unwrap(), 1);
        assert!(store.entries(&SessionId::from("c")).unwrap().is_empty());
    }

    #[test]
    fn test_touch_updates_only_listed_ids() {
        let store = InMemoryStore::new();
        let e1 = entry("a", 1);
        let e2 = entry("a", 2);
        let id1 = e1.id;
        store.append(e1).unwrap();
        store.append(e2).unwrap();

        let later = Utc::now() + chrono::Duration::minutes(5);
        store.touch(&SessionId::from("a"), &[id1], later).unwrap();

        let entries = store.entries(&SessionId::from("a")).unwrap();
        assert_eq!(entries[0].access_count, 1);
        assert_eq!(entries[0].last_accessed, later);
        assert_eq!(entries[1].access_count, 0);
    }

    #[test]
    fn test_retain_drops_empty_sessions() {
        let store = InMemoryStore::new();
        store.append(entry("a", 1)).unwrap();
        store.append(entry("a", 9)).unwrap();
        store.append(entry("b", 2)).unwrap();

        let removed = store.retain(&|e| e.importance > 5).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.entry_count(&SessionId::from("a")).unwrap(), 1);
        assert_eq!(store.entry_count(&SessionId::from("b")).unwrap(), 0);
    }

    #[test]
    fn test_update_summary_creates_then_mutates() {
        let store = InMemoryStore::new();
        let session = SessionId::from("a");
        let now = Utc::now();

        let s = store
            .update_summary(&session, now, &mut |s| s.user_profile.lead_score += 5)
            .unwrap();
        assert_eq!(s.user_profile.lead_score, 5);

        let s = store
            .update_summary(&session, now, &mut |s| s.user_profile.lead_score += 10)
            .unwrap();
        assert_eq!(s.user_profile.lead_score, 15);
        assert_eq!(store.summarized_sessions().unwrap(), vec![session.clone()]);

        assert!(store.remove_summary(&session).unwrap());
        assert!(!store.remove_summary(&session).unwrap());
        assert!(store.summary(&session).unwrap().is_none());
    }

    #[test]
    fn test_store_survives_poisoned_lock() {
        let store = Arc::new(InMemoryStore::new());
        let s2 = Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = s2.entries.lock().unwrap();
            panic!("poison the entry map");
        })
        .join();

        assert!(store.entries.is_poisoned());
        store.append(entry("a", 4)).unwrap();
        assert_eq!(store.entry_count(&SessionId::from("a")).unwrap(), 1);
    }
}
