//! Bounded local lead list used when remote delivery is unavailable.
//!
//! Records live in memory under the [`LOCAL_LEADS_KEY`] key and can be
//! mirrored to a JSON file so they survive a restart. Mirror failures are
//! logged and counted, never returned.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use codex_core::LeadData;

/// Key of the lead list, also the top-level field of the mirror file.
pub const LOCAL_LEADS_KEY: &str = "codex_leads";

/// Default number of leads kept before the oldest is evicted.
pub const DEFAULT_CAPACITY: usize = 50;

/// A lead persisted locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLead {
    pub id: String,
    pub stored_at: DateTime<Utc>,
    pub stored_locally: bool,
    #[serde(flatten)]
    pub lead: LeadData,
}

#[derive(Serialize, Deserialize)]
struct MirrorFile {
    codex_leads: Vec<StoredLead>,
}

pub struct LocalLeadStore {
    capacity: usize,
    records: Mutex<VecDeque<StoredLead>>,
    file: Option<PathBuf>,
    write_failures: AtomicU64,
}

impl LocalLeadStore {
    /// In-memory store without a file mirror.
    pub fn in_memory(capacity: usize) -> Self {
        Self {
            capacity,
            records: Mutex::new(VecDeque::new()),
            file: None,
            write_failures: AtomicU64::new(0),
        }
    }

    /// Store mirrored to `path`. Existing records in the file are loaded;
    /// an unreadable file starts the store empty.
    pub fn with_file(path: impl Into<PathBuf>, capacity: usize) -> Self {
        let path = path.into();
        let mut records = match read_mirror(&path) {
            Ok(records) => records,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable lead store file");
                VecDeque::new()
            }
        };
        while records.len() > capacity {
            records.pop_front();
        }
        Self {
            capacity,
            records: Mutex::new(records),
            file: Some(path),
            write_failures: AtomicU64::new(0),
        }
    }

    /// Append a lead, evicting the oldest beyond capacity.
    ///
    /// Returns `None` only when the store has zero capacity.
    pub fn append(&self, lead: &LeadData) -> Option<StoredLead> {
        if self.capacity == 0 {
            return None;
        }

        let record = StoredLead {
            id: Uuid::new_v4().to_string(),
            stored_at: Utc::now(),
            stored_locally: true,
            lead: lead.clone(),
        };

        let snapshot = {
            let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
            records.push_back(record.clone());
            while records.len() > self.capacity {
                records.pop_front();
            }
            self.file.as_ref().map(|_| records.iter().cloned().collect::<Vec<_>>())
        };

        if let (Some(path), Some(snapshot)) = (&self.file, snapshot) {
            if let Err(e) = write_mirror(path, snapshot) {
                self.write_failures.fetch_add(1, Ordering::Relaxed);
                warn!(path = %path.display(), error = %e, "Failed to mirror lead store to file");
            }
        }

        debug!(id = %record.id, session = %lead.session_id, "Lead stored locally");
        Some(record)
    }

    /// Oldest first.
    pub fn list(&self) -> Vec<StoredLead> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }
}

fn read_mirror(path: &Path) -> Result<VecDeque<StoredLead>, String> {
    if !path.exists() {
        return Ok(VecDeque::new());
    }
    let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let file: MirrorFile = serde_json::from_str(&content).map_err(|e| e.to_string())?;
    Ok(file.codex_leads.into())
}

fn write_mirror(path: &Path, records: Vec<StoredLead>) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    let content = serde_json::to_vec_pretty(&MirrorFile {
        codex_leads: records,
    })
    .map_err(|e| e.to_string())?;
    std::fs::write(path, content).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::tests::sample_lead;

    fn lead(session: &str) -> LeadData {
        let mut l = sample_lead();
        l.session_id = session.into();
        l
    }

    #[test]
    fn test_append_marks_record_local() {
        let store = LocalLeadStore::in_memory(DEFAULT_CAPACITY);
        let record = store.append(&lead("a")).unwrap();
        assert!(record.stored_locally);
        assert!(Uuid::parse_str(&record.id).is_ok());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let store = LocalLeadStore::in_memory(3);
        for i in 0..5 {
            store.append(&lead(&format!("s{}", i))).unwrap();
        }
        let sessions: Vec<String> = store
            .list()
            .into_iter()
            .map(|r| r.lead.session_id.0)
            .collect();
        assert_eq!(sessions, vec!["s2", "s3", "s4"]);
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let store = LocalLeadStore::in_memory(0);
        assert!(store.append(&lead("a")).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_file_mirror_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads").join("leads.json");

        let store = LocalLeadStore::with_file(&path, 10);
        store.append(&lead("a")).unwrap();
        store.append(&lead("b")).unwrap();
        assert_eq!(store.write_failures(), 0);

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[LOCAL_LEADS_KEY].as_array().unwrap().len(), 2);
        assert_eq!(raw[LOCAL_LEADS_KEY][0]["stored_locally"], true);
        assert_eq!(raw[LOCAL_LEADS_KEY][0]["session_id"], "a");

        let reopened = LocalLeadStore::with_file(&path, 10);
        assert_eq!(reopened.len(), 2);
    }

    #[test]
    fn test_mirror_failure_is_counted_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes every write fail.
        let path = dir.path().join("leads.json");
        std::fs::create_dir(&path).unwrap();

        let store = LocalLeadStore::with_file(&path, 10);
        assert!(store.append(&lead("a")).is_some());
        assert_eq!(store.len(), 1);
        assert_eq!(store.write_failures(), 1);
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.json");
        std::fs::write(&path, "not json").unwrap();
        let store = LocalLeadStore::with_file(&path, 10);
        assert!(store.is_empty());
    }
}
