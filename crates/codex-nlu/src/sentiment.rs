//! Lexicon-based sentiment and urgency scoring.

use std::sync::OnceLock;

use regex::Regex;

use codex_core::{Sentiment, Urgency};

const POSITIVE_WORDS: &[&str] = &[
    "good",
    "great",
    "awesome",
    "amazing",
    "excellent",
    "perfect",
    "love",
    "like",
    "nice",
    "happy",
    "excited",
    "fantastic",
    "wonderful",
    "impressive",
    "thanks",
    "thank",
    "helpful",
    "cool",
    "brilliant",
    "yes",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad",
    "terrible",
    "awful",
    "hate",
    "expensive",
    "slow",
    "problem",
    "issue",
    "worried",
    "concerned",
    "disappointed",
    "frustrated",
    "confusing",
    "difficult",
    "poor",
    "annoying",
    "no",
    "not",
    "never",
    "unfortunately",
];

fn word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[a-z]+").expect("Invalid word regex"))
}

fn high_urgency_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:urgent\w*|asap|a\.s\.a\.p|immediately|right\s+away|as\s+soon\s+as\s+possible|emergency)",
        )
        .expect("Invalid urgency regex")
    })
}

fn low_urgency_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:whenever|flexible|no\s+rush|no\s+hurry|eventually|someday|at\s+some\s+point|in\s+no\s+hurry)\b",
        )
        .expect("Invalid low-urgency regex")
    })
}

/// Positive and negative word counts for a text.
pub fn polarity_counts(text: &str) -> (usize, usize) {
    let lowered = text.to_lowercase();
    let mut positive = 0;
    let mut negative = 0;
    for word in word_regex().find_iter(&lowered).map(|m| m.as_str()) {
        if POSITIVE_WORDS.contains(&word) {
            positive += 1;
        } else if NEGATIVE_WORDS.contains(&word) {
            negative += 1;
        }
    }
    (positive, negative)
}

/// Majority of positive vs negative lexicon hits; a tie is neutral.
pub fn sentiment(text: &str) -> Sentiment {
    let (positive, negative) = polarity_counts(text);
    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

/// High when an urgency keyword occurs (even alongside a low one), low on
/// relaxed phrasing, medium otherwise.
pub fn urgency(text: &str) -> Urgency {
    if high_urgency_regex().is_match(text) {
        Urgency::High
    } else if low_urgency_regex().is_match(text) {
        Urgency::Low
    } else {
        Urgency::Medium
    }
}
