//! Conversation orchestrator: the single entry point for visitor utterances.
//!
//! One turn runs analysis, memory recall and storage, knowledge lookup, the
//! engine pipeline, the optional enhancer and, the first time a session
//! qualifies, the notification dispatcher. The session's lock is held for the whole turn.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use serde_json::json;
use tracing::{debug, info, warn};

use codex_core::{
    CodexConfig, ConversationConfig, EntityType, IntentType, SessionId, Stage, Urgency,
};
use codex_knowledge::{retrieve_with_timeout, KnowledgeBase, KnowledgeRetriever, ScoredDocument};
use codex_memory::{ConversationSummary, MemoryEntry, MemoryManager, MemoryType, NewMemory};
use codex_nlu::{Analysis, Analyzer};
use codex_notify::Dispatcher;

use crate::engine::{ConversationEngine, EnginePipeline};
use crate::enhancer::{HttpEnhancer, ReplyEnhancer};
use crate::error::ChatError;
use crate::fallback::RuleBasedEngine;
use crate::qualification::QualificationEngine;
use crate::response::{quick_replies, ResponseGenerator};
use crate::session::{SessionRegistry, SessionState};
use crate::stage::{next_actions, validate_transition};
use crate::types::{
    fact_content, EngineOrigin, EngineResponse, SessionInfo, SessionSnapshot, TurnContext,
    TurnResponse, BUDGET_FACT, EMAIL_FACT, PHONE_FACT, TIMELINE_FACT,
};

/// Reply to an empty message.
pub const CLARIFICATION_PROMPT: &str =
    "Sorry, I didn't catch that. Could you tell me what you're looking for?";

/// Documents consulted per turn.
pub const KNOWLEDGE_LIMIT: usize = 3;

pub struct Orchestrator {
    config: ConversationConfig,
    analyzer: Analyzer,
    memory: Arc<MemoryManager>,
    knowledge: Arc<dyn KnowledgeRetriever>,
    pipeline: EnginePipeline,
    enhancer: Option<Arc<dyn ReplyEnhancer>>,
    dispatcher: Option<Arc<Dispatcher>>,
    sessions: SessionRegistry,
}

impl Orchestrator {
    /// Orchestrator with the standard pipeline (qualification, then
    /// rule-based) and no dispatcher or enhancer.
    pub fn new(
        config: ConversationConfig,
        memory: Arc<MemoryManager>,
        knowledge: Arc<dyn KnowledgeRetriever>,
    ) -> Self {
        let generator = Arc::new(ResponseGenerator::new(config.template_seed));
        let engines: Vec<Arc<dyn ConversationEngine>> = vec![
            Arc::new(QualificationEngine::new(generator)),
            Arc::new(RuleBasedEngine::new()),
        ];
        Self {
            config,
            analyzer: Analyzer::new(),
            memory,
            knowledge,
            pipeline: EnginePipeline::new(engines),
            enhancer: None,
            dispatcher: None,
            sessions: SessionRegistry::new(),
        }
    }

    /// Wire every component from configuration.
    pub fn from_config(config: &CodexConfig) -> Result<Self, ChatError> {
        let memory = Arc::new(MemoryManager::in_memory());
        let knowledge: Arc<dyn KnowledgeRetriever> =
            Arc::new(KnowledgeBase::from_config(&config.knowledge));
        let dispatcher = Dispatcher::from_config(&config.notification)
            .map_err(|e| ChatError::Notification(e.to_string()))?;

        let mut orchestrator = Self::new(config.conversation.clone(), memory, knowledge)
            .with_dispatcher(Arc::new(dispatcher));
        if let Some(enhancer) = HttpEnhancer::from_config(&config.ai)? {
            info!("AI enhancer enabled");
            orchestrator = orchestrator.with_enhancer(Arc::new(enhancer));
        }
        Ok(orchestrator)
    }

    pub fn with_dispatcher(mut self, dispatcher: Arc<Dispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn with_enhancer(mut self, enhancer: Arc<dyn ReplyEnhancer>) -> Self {
        self.enhancer = Some(enhancer);
        self
    }

    pub fn with_pipeline(mut self, pipeline: EnginePipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn memory(&self) -> &Arc<MemoryManager> {
        &self.memory
    }

    pub fn dispatcher(&self) -> Option<&Arc<Dispatcher>> {
        self.dispatcher.as_ref()
    }

    pub fn config(&self) -> &ConversationConfig {
        &self.config
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    // =========================================================================
    // Turn processing
    // =========================================================================

    /// Process one visitor utterance. Never fails: internal errors degrade
    /// to simpler replies.
    pub async fn process_utterance(&self, session_id: &SessionId, text: &str) -> TurnResponse {
        let text = text.trim();
        if text.is_empty() {
            return self.clarification(session_id).await;
        }
        let text = truncate_chars(text, self.config.max_message_length);

        let now = Utc::now();
        let handle = self.sessions.get_or_create(session_id, now);
        let mut state = handle.lock().await;

        let analysis = self.analyzer.analyze_at(&text, now);
        state.record_turn(&text, &analysis, self.config.intent_history_limit, now);
        let recalled = self.recall(session_id, None);
        self.remember_utterance(session_id, &text, &analysis);

        let summary = self.summary_of(session_id);
        let score = summary.as_ref().map_or(0, |s| s.user_profile.lead_score);
        let documents = self.lookup_knowledge(&text, &analysis).await;

        let intent = analysis.intent.clone();
        let entities = analysis.entities.clone();
        let ctx = TurnContext {
            session_id: session_id.clone(),
            utterance: text.clone(),
            analysis,
            stage: state.stage,
            score,
            flags: state.flags,
            summary,
            documents,
            recalled,
            known: state.facts.clone(),
            qualification_threshold: self.config.qualification_threshold,
        };
        let mut response = self.pipeline.run(&ctx).await;

        self.apply_stage(&mut state, &response);
        state.flags = response.flags;
        let score = self.apply_score(session_id, score, response.score_delta);

        if let Some(enhancer) = &self.enhancer {
            match enhancer.enhance(&response.message, state.stage, &text).await {
                Ok(message) => {
                    response.message = message;
                    response.origin = EngineOrigin::Enhanced;
                }
                Err(e) => {
                    warn!(session = %session_id, error = %e, "Enhancer failed, keeping draft reply")
                }
            }
        }

        let notified = if response.should_notify && state.notified_at.is_none() {
            state.notified_at = Some(now);
            self.sessions.mark_notified(session_id, now);
            self.notify(&state, score).await;
            true
        } else {
            false
        };

        debug!(
            session = %session_id,
            intent = %intent.kind,
            stage = %state.stage,
            score,
            origin = %response.origin,
            notified,
            "Turn processed"
        );

        TurnResponse {
            session_id: session_id.clone(),
            message: response.message,
            quick_replies: response.quick_replies,
            stage: state.stage,
            score,
            intent: Some(intent),
            entities,
            notified,
            origin: response.origin,
        }
    }

    async fn clarification(&self, session_id: &SessionId) -> TurnResponse {
        let stage = match self.sessions.get(session_id) {
            Some(handle) => handle.lock().await.stage,
            None => Stage::Greeting,
        };
        TurnResponse {
            session_id: session_id.clone(),
            message: CLARIFICATION_PROMPT.to_string(),
            quick_replies: quick_replies(stage),
            stage,
            score: self.score_of(session_id),
            intent: None,
            entities: Vec::new(),
            notified: false,
            origin: EngineOrigin::RuleBased,
        }
    }

    /// Episodic memory of the utterance plus semantic memories for facts
    /// worth keeping on their own.
    fn remember_utterance(&self, session_id: &SessionId, text: &str, analysis: &Analysis) {
        let intent = &analysis.intent;
        let mut importance = episodic_importance(intent.kind);
        if intent.urgency == Urgency::High {
            importance += 1;
        }

        let mut memories = vec![NewMemory::episodic(text)
            .importance(importance)
            .tags(analysis.entities.iter().map(|e| e.tag()))
            .context("intent", json!(intent.kind))
            .context("confidence", json!(intent.confidence))
            .context("urgency", json!(intent.urgency))];

        for entity in &analysis.entities {
            let (label, importance) = match entity.kind {
                EntityType::Budget => (BUDGET_FACT, 8),
                EntityType::Timeline => (TIMELINE_FACT, 7),
                _ => continue,
            };
            memories.push(
                NewMemory::semantic(fact_content(label, &entity.value))
                    .importance(importance)
                    .tag(entity.tag()),
            );
        }
        if let Some(email) = &analysis.contact.email {
            memories.push(
                NewMemory::semantic(fact_content(EMAIL_FACT, email))
                    .importance(9)
                    .tag("contact:email")
                    .context("email", json!(email)),
            );
        }
        if let Some(phone) = &analysis.contact.phone {
            memories.push(
                NewMemory::semantic(fact_content(PHONE_FACT, phone))
                    .importance(9)
                    .tag("contact:phone")
                    .context("phone", json!(phone)),
            );
        }

        for memory in memories {
            if let Err(e) = self.memory.store(session_id, memory) {
                warn!(session = %session_id, error = %e, "Failed to store memory");
            }
        }
    }

    /// Memories of earlier turns, most relevant first. Retrieval marks them
    /// as accessed.
    fn recall(&self, session_id: &SessionId, memory_type: Option<MemoryType>) -> Vec<MemoryEntry> {
        match self.memory.retrieve(session_id, None, memory_type) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(session = %session_id, error = %e, "Failed to recall memories");
                Vec::new()
            }
        }
    }

    async fn lookup_knowledge(&self, text: &str, analysis: &Analysis) -> Vec<ScoredDocument> {
        if !matches!(
            analysis.intent.kind,
            IntentType::Question | IntentType::Request | IntentType::Interest | IntentType::Objection
        ) {
            return Vec::new();
        }
        let timeout = StdDuration::from_millis(self.config.knowledge_timeout_ms);
        match retrieve_with_timeout(self.knowledge.as_ref(), text, KNOWLEDGE_LIMIT, timeout).await
        {
            Ok(documents) => documents,
            Err(e) => {
                warn!(error = %e, "Knowledge lookup failed, replying without it");
                Vec::new()
            }
        }
    }

    fn apply_stage(&self, state: &mut SessionState, response: &EngineResponse) {
        let from = state.stage;
        let to = response.next_stage;
        if let Err(e) = validate_transition(from, to) {
            warn!(session = %state.session_id, error = %e, "Ignoring backward stage move");
            return;
        }
        if from == to {
            return;
        }

        state.stage = to;
        info!(session = %state.session_id, from = %from, to = %to, "Stage advanced");

        let memory = NewMemory::procedural(format!("Stage advanced from {} to {}", from, to))
            .importance(6)
            .tag(format!("stage:{}", to));
        if let Err(e) = self.memory.store(&state.session_id, memory) {
            warn!(session = %state.session_id, error = %e, "Failed to store stage memory");
        }
        if let Err(e) = self.memory.set_next_actions(&state.session_id, next_actions(to)) {
            warn!(session = %state.session_id, error = %e, "Failed to update next actions");
        }
    }

    fn apply_score(&self, session_id: &SessionId, score: u32, delta: u32) -> u32 {
        if delta == 0 {
            return self.score_of(session_id).max(score);
        }
        match self.memory.add_lead_score(session_id, delta) {
            Ok(total) => total,
            Err(e) => {
                warn!(session = %session_id, error = %e, "Failed to record lead score");
                score.saturating_add(delta)
            }
        }
    }

    async fn notify(&self, state: &SessionState, score: u32) {
        let Some(dispatcher) = &self.dispatcher else {
            info!(session = %state.session_id, score, "Lead qualified, no dispatcher configured");
            return;
        };
        let summary = self.summary_of(&state.session_id);
        let facts = self.recall(&state.session_id, Some(MemoryType::Semantic));
        let lead = state.lead_data(score, summary.as_ref(), &facts, Utc::now());
        let report = dispatcher.notify(&lead).await;
        info!(
            session = %state.session_id,
            score,
            delivered = report.delivered(),
            "Qualified lead dispatched"
        );
    }

    fn summary_of(&self, session_id: &SessionId) -> Option<ConversationSummary> {
        match self.memory.summary(session_id) {
            Ok(summary) => summary,
            Err(e) => {
                warn!(session = %session_id, error = %e, "Failed to read conversation summary");
                None
            }
        }
    }

    fn score_of(&self, session_id: &SessionId) -> u32 {
        self.summary_of(session_id)
            .map_or(0, |s| s.user_profile.lead_score)
    }

    // =========================================================================
    // Inspection and housekeeping
    // =========================================================================

    pub async fn session_snapshot(&self, session_id: &SessionId) -> Option<SessionSnapshot> {
        let handle = self.sessions.get(session_id)?;
        let state = handle.lock().await;
        let summary = self.summary_of(session_id);
        Some(SessionSnapshot {
            session_id: state.session_id.clone(),
            stage: state.stage,
            score: summary.as_ref().map_or(0, |s| s.user_profile.lead_score),
            turns: state.turns,
            created_at: state.created_at,
            last_activity: state.last_activity,
            notified_at: state.notified_at,
            flags: state.flags,
            facts: state.facts.clone(),
            intent_history: state.intent_history.iter().cloned().collect(),
            summary,
        })
    }

    /// Every live session, sorted by id.
    pub async fn list_sessions(&self) -> Vec<SessionInfo> {
        let mut sessions = Vec::new();
        for handle in self.sessions.handles() {
            let state = handle.lock().await;
            sessions.push(state.info(self.score_of(&state.session_id)));
        }
        sessions
    }

    /// Forget sessions idle longer than `idle`: their orchestrator state,
    /// memories and lead score. A returning session id starts over at the
    /// greeting stage but keeps its notification record.
    pub fn expire_idle_sessions(&self, idle: Duration) -> usize {
        let removed = self.sessions.expire_idle(idle, Utc::now(), |state| {
            if let Err(e) = self.memory.forget_session(&state.session_id) {
                warn!(session = %state.session_id, error = %e, "Failed to forget session memory");
            }
        });
        if !removed.is_empty() {
            info!(count = removed.len(), "Expired idle sessions");
        }
        removed.len()
    }
}

/// Base importance of the episodic memory for an utterance.
pub fn episodic_importance(kind: IntentType) -> u8 {
    match kind {
        IntentType::Booking => 9,
        IntentType::Interest => 8,
        IntentType::Request => 7,
        IntentType::Objection => 6,
        IntentType::Question => 5,
        IntentType::Greeting | IntentType::Goodbye => 3,
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
