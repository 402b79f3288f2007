//! Per-session conversation state and the registry holding it.
//!
//! Each session sits behind its own `tokio::sync::Mutex`, held for a whole
//! turn, so utterances of one session are processed one at a time while
//! different sessions proceed concurrently.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex as AsyncMutex;

use codex_core::{
    ContactInfo, Entity, EntityType, Intent, LeadData, ProjectDetails, SessionId, Stage,
};
use codex_memory::{ConversationSummary, MemoryEntry, MemoryType};
use codex_nlu::Analysis;

use crate::scoring::ScoreFlags;
use crate::types::{
    recalled_fact, KnownFacts, SessionInfo, BUDGET_FACT, EMAIL_FACT, PHONE_FACT, TIMELINE_FACT,
};

/// Number of recent utterances kept for the lead summary.
pub const TRANSCRIPT_LIMIT: usize = 5;

#[derive(Debug, Clone)]
pub struct SessionState {
    pub session_id: SessionId,
    pub stage: Stage,
    pub flags: ScoreFlags,
    pub facts: KnownFacts,
    pub intent_history: VecDeque<Intent>,
    pub transcript: VecDeque<String>,
    pub turns: u32,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    /// Set once, when the lead is first handed to the dispatcher.
    pub notified_at: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn new(session_id: SessionId, now: DateTime<Utc>) -> Self {
        Self {
            session_id,
            stage: Stage::Greeting,
            flags: ScoreFlags::default(),
            facts: KnownFacts::default(),
            intent_history: VecDeque::new(),
            transcript: VecDeque::new(),
            turns: 0,
            created_at: now,
            last_activity: now,
            notified_at: None,
        }
    }

    /// Record an analyzed utterance: intent history, transcript and facts.
    pub fn record_turn(
        &mut self,
        utterance: &str,
        analysis: &Analysis,
        history_limit: usize,
        now: DateTime<Utc>,
    ) {
        self.turns += 1;
        self.last_activity = now;

        self.intent_history.push_back(analysis.intent.clone());
        while self.intent_history.len() > history_limit.max(1) {
            self.intent_history.pop_front();
        }

        self.transcript.push_back(utterance.to_string());
        while self.transcript.len() > TRANSCRIPT_LIMIT {
            self.transcript.pop_front();
        }

        self.absorb_entities(&analysis.entities);
        if let Some(email) = &analysis.contact.email {
            self.facts.email = Some(email.clone());
        }
        if let Some(phone) = &analysis.contact.phone {
            self.facts.phone = Some(phone.clone());
        }
    }

    fn absorb_entities(&mut self, entities: &[Entity]) {
        for entity in entities {
            let value = entity.value.clone();
            match entity.kind {
                EntityType::Budget => self.facts.budget = Some(value),
                EntityType::Timeline => self.facts.timeline = Some(value),
                EntityType::Project => self.facts.project = Some(value),
                EntityType::Person => self.facts.name = Some(value),
                EntityType::Company => self.facts.company = Some(value),
                EntityType::Technology => push_unique(&mut self.facts.technologies, value),
                EntityType::Service => push_unique(&mut self.facts.services, value),
            }
        }
    }

    /// Snapshot handed to the notification dispatcher.
    ///
    /// `recalled` are semantic memories of the session; they fill contact
    /// and project facts this state has not seen and are listed in the
    /// conversation summary.
    pub fn lead_data(
        &self,
        score: u32,
        summary: Option<&ConversationSummary>,
        recalled: &[MemoryEntry],
        now: DateTime<Utc>,
    ) -> LeadData {
        let fact = |own: &Option<String>, label: &str| {
            own.clone()
                .or_else(|| recalled_fact(recalled, label).map(str::to_string))
        };

        let urgency = self
            .intent_history
            .iter()
            .map(|i| i.urgency)
            .max_by_key(|u| *u as u8)
            .unwrap_or_default();

        LeadData {
            session_id: self.session_id.clone(),
            timestamp: now,
            contact_info: ContactInfo {
                name: self.facts.name.clone(),
                email: fact(&self.facts.email, EMAIL_FACT),
                phone: fact(&self.facts.phone, PHONE_FACT),
                company: self.facts.company.clone(),
            },
            project_details: ProjectDetails {
                project_type: summary
                    .and_then(|s| s.user_profile.project_type.clone())
                    .or_else(|| self.facts.project.clone()),
                technologies: self.facts.technologies.clone(),
                services: self.facts.services.clone(),
                budget: fact(&self.facts.budget, BUDGET_FACT),
                timeline: fact(&self.facts.timeline, TIMELINE_FACT),
                urgency,
            },
            conversation_summary: self.describe(summary, recalled),
            score,
            ready_for_proposal: self.stage >= Stage::Proposal,
        }
    }

    fn describe(&self, summary: Option<&ConversationSummary>, recalled: &[MemoryEntry]) -> String {
        let mut parts = vec![format!("{} turns, stage {}", self.turns, self.stage)];
        if let Some(summary) = summary {
            if !summary.user_profile.interests.is_empty() {
                parts.push(format!(
                    "interests: {}",
                    summary.user_profile.interests.join(", ")
                ));
            }
            parts.push(format!("sentiment {}", summary.sentiment));
        }
        let mut facts: Vec<&str> = Vec::new();
        for entry in recalled.iter().filter(|e| e.memory_type == MemoryType::Semantic) {
            if !facts.contains(&entry.content.as_str()) {
                facts.push(&entry.content);
            }
        }
        if !facts.is_empty() {
            parts.push(format!("remembered: {}", facts.join(", ")));
        }
        if !self.transcript.is_empty() {
            let quoted: Vec<String> = self.transcript.iter().map(|t| format!("\"{}\"", t)).collect();
            parts.push(format!("recent messages: {}", quoted.join(" / ")));
        }
        parts.join("; ")
    }

    pub fn info(&self, score: u32) -> SessionInfo {
        SessionInfo {
            session_id: self.session_id.clone(),
            stage: self.stage,
            score,
            turns: self.turns,
            last_activity: self.last_activity,
            notified: self.notified_at.is_some(),
        }
    }
}

fn push_unique(values: &mut Vec<String>, value: String) {
    if !values.iter().any(|v| v.eq_ignore_ascii_case(&value)) {
        values.push(value);
    }
}

pub type SessionHandle = Arc<AsyncMutex<SessionState>>;

/// All live sessions, plus the notification time of every session that was
/// handed to the dispatcher. That record outlives idle expiry, so a session
/// id that comes back is never notified twice. The outer map lock is only
/// held to look up or insert a handle, never across an await.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionId, SessionHandle>>,
    notified: Mutex<HashMap<SessionId, DateTime<Utc>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&self, session_id: &SessionId, now: DateTime<Utc>) -> SessionHandle {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions
            .entry(session_id.clone())
            .or_insert_with(|| {
                let mut state = SessionState::new(session_id.clone(), now);
                state.notified_at = self.notified_at(session_id);
                Arc::new(AsyncMutex::new(state))
            })
            .clone()
    }

    pub fn get(&self, session_id: &SessionId) -> Option<SessionHandle> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(session_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handles sorted by session id.
    pub fn handles(&self) -> Vec<SessionHandle> {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries: Vec<(&SessionId, &SessionHandle)> = sessions.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter().map(|(_, h)| h.clone()).collect()
    }

    /// Record that a session was handed to the dispatcher.
    pub fn mark_notified(&self, session_id: &SessionId, at: DateTime<Utc>) {
        self.notified
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(session_id.clone())
            .or_insert(at);
    }

    pub fn notified_at(&self, session_id: &SessionId) -> Option<DateTime<Utc>> {
        self.notified
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(session_id)
            .copied()
    }

    /// Drop sessions idle for longer than `idle`. Sessions in the middle of
    /// a turn, or whose handle is held elsewhere, are kept. `on_expire` runs
    /// for each dropped state while the registry is still locked, so no new
    /// turn for that id can start until it returns. Returns the removed ids.
    pub fn expire_idle<F>(
        &self,
        idle: Duration,
        now: DateTime<Utc>,
        mut on_expire: F,
    ) -> Vec<SessionId>
    where
        F: FnMut(&SessionState),
    {
        let cutoff = now - idle;
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let mut removed = Vec::new();
        sessions.retain(|id, handle| {
            if Arc::strong_count(handle) > 1 {
                return true;
            }
            let Ok(state) = handle.try_lock() else {
                return true;
            };
            if state.last_activity >= cutoff {
                return true;
            }
            if let Some(at) = state.notified_at {
                self.mark_notified(id, at);
            }
            on_expire(&state);
            removed.push(id.clone());
            false
        });
        removed.sort();
        removed
    }
}
