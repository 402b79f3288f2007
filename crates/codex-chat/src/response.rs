//! Template-based reply generation.
//!
//! Templates are keyed by (stage, intent) with a per-stage fallback. One
//! template is picked uniformly at random and its placeholders are filled
//! from the turn's entities, the conversation summary, recalled memories and
//! facts remembered from earlier turns. A sentence from the best knowledge document is
//! appended when one was retrieved.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

use codex_core::{Entity, EntityType, IntentType, Stage};
use codex_knowledge::{contextual_sentence, ScoredDocument};
use codex_memory::{ConversationSummary, MemoryEntry, MemoryType};

use crate::types::{recalled_fact, KnownFacts, BUDGET_FACT, TIMELINE_FACT};

// =============================================================================
// Placeholders
// =============================================================================

/// Values substituted into a template. Missing values render as neutral
/// phrases so a reply never shows a raw `{placeholder}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placeholders {
    pub technology: Option<String>,
    pub project: Option<String>,
    pub service: Option<String>,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub previous_topic: Option<String>,
    pub name: Option<String>,
}

impl Placeholders {
    /// Current entities win over the summary and recalled memories, which
    /// win over older facts.
    pub fn resolve(
        entities: &[Entity],
        summary: Option<&ConversationSummary>,
        recalled: &[MemoryEntry],
        known: &KnownFacts,
    ) -> Self {
        let current = |kind: EntityType| {
            entities
                .iter()
                .find(|e| e.kind == kind)
                .map(|e| e.value.clone())
        };
        let remembered = |kind: &str| {
            summary
                .and_then(|s| s.latest_topic_of(kind))
                .map(|v| v.to_string())
        };

        Self {
            technology: current(EntityType::Technology)
                .or_else(|| remembered("technology"))
                .or_else(|| known.technologies.last().cloned()),
            project: current(EntityType::Project)
                .or_else(|| remembered("project"))
                .or_else(|| known.project.clone()),
            service: current(EntityType::Service)
                .or_else(|| remembered("service"))
                .or_else(|| known.services.last().cloned()),
            budget: current(EntityType::Budget)
                .or_else(|| recalled_fact(recalled, BUDGET_FACT).map(str::to_string))
                .or_else(|| known.budget.clone()),
            timeline: current(EntityType::Timeline)
                .or_else(|| recalled_fact(recalled, TIMELINE_FACT).map(str::to_string))
                .or_else(|| known.timeline.clone()),
            previous_topic: summary
                .and_then(|s| s.latest_topic())
                .or_else(|| recalled_topic(recalled))
                .map(|t| t.split_once(':').map_or(t, |(_, v)| v).to_string()),
            name: current(EntityType::Person).or_else(|| known.name.clone()),
        }
    }

    pub fn render(&self, template: &str) -> String {
        let pairs: [(&str, &Option<String>, &str); 7] = [
            ("{technology}", &self.technology, "the right technology"),
            ("{project}", &self.project, "your project"),
            ("{service}", &self.service, "our services"),
            ("{budget}", &self.budget, "your budget"),
            ("{timeline}", &self.timeline, "your timeline"),
            ("{previousTopic}", &self.previous_topic, "what you mentioned earlier"),
            ("{name}", &self.name, "there"),
        ];
        let mut out = template.to_string();
        for (key, value, neutral) in pairs {
            if out.contains(key) {
                out = out.replace(key, value.as_deref().unwrap_or(neutral));
            }
        }
        out
    }
}

/// First tag of the newest recalled utterance that carried one.
fn recalled_topic(recalled: &[MemoryEntry]) -> Option<&str> {
    recalled
        .iter()
        .filter(|e| e.memory_type == MemoryType::Episodic)
        .filter_map(|e| e.tags.iter().next().map(|t| (e.timestamp, t.as_str())))
        .max_by_key(|(timestamp, _)| *timestamp)
        .map(|(_, tag)| tag)
}

// =============================================================================
// Template tables
// =============================================================================

fn keyed_templates(stage: Stage, intent: IntentType) -> &'static [&'static str] {
    use IntentType as I;
    use Stage as S;
    match (stage, intent) {
        (S::Greeting, I::Greeting) => &[
            "Hi {name}! I'm the studio assistant. Are you planning a new website, an app or something else?",
            "Hello {name}! Tell me a little about the project you have in mind and I'll point you in the right direction.",
            "Hey {name}, welcome! What would you like to build?",
        ],
        (_, I::Goodbye) => &[
            "Thanks for stopping by, {name}! Come back any time to pick up where we left off.",
            "Great talking with you. Whenever you're ready to move forward on {project}, we're here.",
        ],
        (_, I::Objection) => &[
            "That's a fair concern. We can phase {project} so the first release fits {budget} and grows from there.",
            "I understand. Many clients start with a smaller scope and expand once they see results. Would that work for you?",
            "Totally reasonable. What matters most to you, keeping costs down or launching fast?",
        ],
        (S::Discovery, I::Question) => &[
            "Good question. To give you a useful answer, what kind of project are you working on?",
            "Happy to explain. Is this for a new {project} or an existing one?",
        ],
        (S::Discovery, I::Request) => &[
            "We'd love to help with {project}. Do you already have a budget range in mind?",
            "That's right up our street. What timeline are you working towards?",
        ],
        (S::Qualification, I::Question) => &[
            "Sure. Since you mentioned {previousTopic}, is there a deadline we should plan around?",
            "Good question. Roughly what budget have you set aside for {project}?",
        ],
        (S::Analysis, I::Interest) | (S::Analysis, I::Request) => &[
            "Based on what you've told me, {project} with {technology} is a great fit for us. Shall I outline an approach?",
            "Thanks, that helps. For {project} on {timeline}, I'd suggest starting with a short discovery phase.",
        ],
        (S::Proposal, I::Interest) | (S::Proposal, I::Question) => &[
            "We can put together a tailored proposal for {project} within {budget}. Where should we send it?",
            "Great! I'll prepare a proposal covering scope, timeline and cost. What's the best email to reach you?",
        ],
        (S::Conversion, I::Booking) | (S::Conversion, I::Interest) => &[
            "Let's get a call on the calendar. What day works best for you this week?",
            "Excellent! I can book a free consultation with our project lead. Which time suits you?",
        ],
        (S::Complete, _) => &[
            "You're all set, {name}! Our team will be in touch shortly to confirm the details.",
            "Thanks {name}, everything is booked. Expect a message from our project lead soon.",
        ],
        _ => &[],
    }
}

fn stage_templates(stage: Stage) -> &'static [&'static str] {
    match stage {
        Stage::Greeting => &[
            "Hi {name}! How can I help you today?",
            "Welcome! Are you looking for a website, an app or help with something else?",
        ],
        Stage::Discovery => &[
            "Tell me more about {project}. What are you hoping it will achieve?",
            "Interesting! What's the main goal of {project}?",
            "Got it. Who is {project} for, and what should they be able to do?",
        ],
        Stage::Qualification => &[
            "Thanks! To scope {project} properly, what budget range are you considering?",
            "Noted. When would you ideally like {project} to launch?",
        ],
        Stage::Analysis => &[
            "Based on what you've shared about {project}, we'd recommend {technology}. Want me to walk you through it?",
            "We've done similar work with {service}. Would a rough estimate for {project} be helpful?",
        ],
        Stage::Proposal => &[
            "I think we're a good fit for {project}. Would you like a detailed proposal?",
            "We can prepare a proposal around {budget} and {timeline}. Shall I go ahead?",
        ],
        Stage::Conversion => &[
            "The next step is a short call with our project lead. Would you like to book one?",
            "Ready to get started? I can schedule a consultation for you.",
        ],
        Stage::Complete => &["Thanks {name}! Our team will be in touch shortly."],
    }
}

/// Suggested replies shown under a message. Never empty.
pub fn quick_replies(stage: Stage) -> Vec<String> {
    let replies: &[&str] = match stage {
        Stage::Greeting => &["I need a website", "I need a mobile app", "Tell me about pricing"],
        Stage::Discovery => &["E-commerce store", "Company website", "Custom web app"],
        Stage::Qualification => &["Under $10k", "$10k - $50k", "Over $50k"],
        Stage::Analysis => &["Tell me more", "How long would it take?", "What's the cost?"],
        Stage::Proposal => &["Send me a proposal", "I have questions", "Book a call"],
        Stage::Conversion => &["Book a call", "Email me instead", "Not yet"],
        Stage::Complete => &["Thanks!", "I have another question"],
    };
    replies.iter().map(|r| r.to_string()).collect()
}

// =============================================================================
// ResponseGenerator
// =============================================================================

pub struct ResponseGenerator {
    rng: Mutex<StdRng>,
}

impl Default for ResponseGenerator {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ResponseGenerator {
    /// A fixed seed makes template choice reproducible.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// Raw templates for (stage, intent), falling back to the stage's own.
    pub fn templates(stage: Stage, intent: IntentType) -> &'static [&'static str] {
        let keyed = keyed_templates(stage, intent);
        if keyed.is_empty() {
            stage_templates(stage)
        } else {
            keyed
        }
    }

    /// Every reply [`ResponseGenerator::generate`] could return, before any
    /// knowledge sentence is appended.
    pub fn candidates(
        &self,
        stage: Stage,
        intent: IntentType,
        placeholders: &Placeholders,
    ) -> Vec<String> {
        Self::templates(stage, intent)
            .iter()
            .map(|t| placeholders.render(t))
            .collect()
    }

    /// One reply, or `None` when no template exists for the stage.
    pub fn generate(
        &self,
        stage: Stage,
        intent: IntentType,
        placeholders: &Placeholders,
        documents: &[ScoredDocument],
    ) -> Option<String> {
        let template = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            *Self::templates(stage, intent).choose(&mut *rng)?
        };
        let mut message = placeholders.render(template);
        if let Some(sentence) = contextual_sentence(documents) {
            message.push(' ');
            message.push_str(&sentence);
        }
        Some(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use codex_core::SessionId;
    use codex_knowledge::KnowledgeBase;

    fn entity(kind: EntityType, value: &str) -> Entity {
        Entity {
            kind,
            value: value.to_string(),
            confidence: 0.8,
        }
    }

    // ---- placeholders ----

    #[test]
    fn test_render_uses_neutral_phrases() {
        let rendered = Placeholders::default().render("Hi {name}, about {project} on {timeline}");
        assert_eq!(rendered, "Hi there, about your project on your timeline");
    }

    #[test]
    fn test_resolve_prefers_current_entities() {
        let mut summary = ConversationSummary::new(SessionId::from("s"), Utc::now());
        summary.key_topics = vec!["technology:vue".to_string(), "project:blog".to_string()];
        let known = KnownFacts {
            budget: Some("$8k".to_string()),
            ..KnownFacts::default()
        };

        let p = Placeholders::resolve(
            &[entity(EntityType::Technology, "React")],
            Some(&summary),
            &[],
            &known,
        );
        assert_eq!(p.technology.as_deref(), Some("React"));
        assert_eq!(p.project.as_deref(), Some("blog"));
        assert_eq!(p.budget.as_deref(), Some("$8k"));
        assert_eq!(p.previous_topic.as_deref(), Some("blog"));
        assert_eq!(p.name, None);
    }

    #[test]
    fn test_resolve_falls_back_to_recalled_memories() {
        let id = SessionId::from("s");
        let memory = codex_memory::MemoryManager::in_memory();
        memory
            .store(&id, codex_memory::NewMemory::semantic("Budget: $15,000"))
            .unwrap();
        memory
            .store(&id, codex_memory::NewMemory::semantic("Timeline: 3 months"))
            .unwrap();
        memory
            .store(
                &id,
                codex_memory::NewMemory::episodic("we run a shop").tag("service:ecommerce"),
            )
            .unwrap();
        let recalled = memory.retrieve(&id, None, None).unwrap();
        let known = KnownFacts {
            budget: Some("$1".to_string()),
            ..KnownFacts::default()
        };

        let p = Placeholders::resolve(&[], None, &recalled, &known);
        assert_eq!(p.budget.as_deref(), Some("$15,000"));
        assert_eq!(p.timeline.as_deref(), Some("3 months"));
        assert_eq!(p.previous_topic.as_deref(), Some("ecommerce"));
    }

    // ---- templates ----

    #[test]
    fn test_every_stage_has_templates_and_quick_replies() {
        for stage in Stage::ALL {
            for intent in IntentType::ALL {
                assert!(
                    !ResponseGenerator::templates(stage, intent).is_empty(),
                    "{} / {}",
                    stage,
                    intent
                );
            }
            assert!(!quick_replies(stage).is_empty());
        }
    }

    #[test]
    fn test_generate_returns_a_candidate() {
        let generator = ResponseGenerator::new(Some(7));
        let p = Placeholders {
            project: Some("online store".to_string()),
            ..Placeholders::default()
        };
        let candidates = generator.candidates(Stage::Discovery, IntentType::Request, &p);
        for _ in 0..20 {
            let reply = generator
                .generate(Stage::Discovery, IntentType::Request, &p, &[])
                .unwrap();
            assert!(candidates.contains(&reply), "{}", reply);
        }
    }

    #[test]
    fn test_seeded_generators_agree() {
        let a = ResponseGenerator::new(Some(42));
        let b = ResponseGenerator::new(Some(42));
        let p = Placeholders::default();
        for _ in 0..10 {
            assert_eq!(
                a.generate(Stage::Discovery, IntentType::Question, &p, &[]),
                b.generate(Stage::Discovery, IntentType::Question, &p, &[])
            );
        }
    }

    #[test]
    fn test_generate_appends_knowledge_sentence() {
        let docs = KnowledgeBase::builtin().search("pricing", None);
        assert!(!docs.is_empty());
        let generator = ResponseGenerator::new(Some(1));
        let p = Placeholders::default();
        let reply = generator
            .generate(Stage::Analysis, IntentType::Interest, &p, &docs)
            .unwrap();
        let sentence = contextual_sentence(&docs).unwrap();
        assert!(reply.ends_with(&sentence));
        let base = reply.trim_end_matches(&sentence).trim_end();
        assert!(generator
            .candidates(Stage::Analysis, IntentType::Interest, &p)
            .iter()
            .any(|c| c == base));
    }
}
