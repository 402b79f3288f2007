//! Single entry point combining intent, entity, sentiment and signal
//! extraction for one utterance.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use codex_core::{Entity, Intent};

use crate::entity::EntityExtractor;
use crate::intent::{IntentCandidate, IntentClassifier};
use crate::sentiment;
use crate::signals::{self, ContactHints};

/// Everything the NLU layer knows about one utterance.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub intent: Intent,
    pub entities: Vec<Entity>,
    pub decision_authority: bool,
    pub contact: ContactHints,
}

/// Stateless rule-based analyzer. Cheap to share behind an `Arc`.
#[derive(Default)]
pub struct Analyzer {
    classifier: IntentClassifier,
    extractor: EntityExtractor,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyze an utterance. Never fails; unrecognized input yields a
    /// question intent at base confidence and no entities.
    pub fn analyze(&self, text: &str) -> Analysis {
        self.analyze_at(text, Utc::now())
    }

    /// Same as [`Analyzer::analyze`] with an explicit intent timestamp.
    pub fn analyze_at(&self, text: &str, now: DateTime<Utc>) -> Analysis {
        let (kind, confidence) = self.classifier.classify(text);
        let intent = Intent {
            kind,
            confidence,
            sentiment: sentiment::sentiment(text),
            urgency: sentiment::urgency(text),
            timestamp: now,
        };
        let entities = self.extractor.extract(text);

        debug!(
            intent = %intent.kind,
            confidence = intent.confidence,
            entities = entities.len(),
            "Utterance analyzed"
        );

        Analysis {
            intent,
            entities,
            decision_authority: signals::has_decision_authority(text),
            contact: signals::extract_contact(text),
        }
    }

    /// Full ranked list of intent candidates for diagnostics.
    pub fn rank_intents(&self, text: &str) -> Vec<IntentCandidate> {
        self.classifier.rank(text)
    }
}
