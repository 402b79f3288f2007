//! Rule-based natural language understanding for visitor utterances.

pub mod analyzer;
pub mod entity;
pub mod intent;
pub mod sentiment;
pub mod signals;

pub use analyzer::{Analysis, Analyzer};
pub use entity::EntityExtractor;
pub use intent::{IntentCandidate, IntentClassifier};
pub use signals::ContactHints;
