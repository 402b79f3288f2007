//! Qualification signals beyond intent: buying authority and contact hints.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Contact details volunteered in an utterance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContactHints {
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ContactHints {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.phone.is_none()
    }
}

fn authority_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:(?:i'?m|i\s+am)\s+(?:the\s+|a\s+)?(?:owner|founder|co-?founder|ceo|cto|coo|president|director|managing\s+director|decision[-\s]?maker|head\s+of\s+\w+)|i\s+(?:make|own)\s+(?:all\s+)?the\s+decisions?|i\s+(?:can|will)\s+(?:approve|sign\s+off)|it'?s\s+my\s+(?:company|business|startup|call)|i\s+run\s+(?:a|the|my|our)\s+(?:\w+\s+)?(?:company|business|startup|agency|shop))",
        )
        .expect("Invalid authority regex")
    })
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("Invalid email regex")
    })
}

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\+?\(?\d{1,4}\)?[\s.-]?\d{2,4}[\s.-]?\d{3,4}[\s.-]?\d{0,4}")
            .expect("Invalid phone regex")
    })
}

/// Whether the speaker claims to be able to commit to a purchase.
pub fn has_decision_authority(text: &str) -> bool {
    authority_regex().is_match(text)
}

/// First email address and phone number found in the text.
///
/// Phone candidates need at least seven digits so budgets and years are not
/// mistaken for numbers.
pub fn extract_contact(text: &str) -> ContactHints {
    let email = email_regex().find(text).map(|m| m.as_str().to_string());
    let phone = phone_regex()
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .find(|candidate| candidate.chars().filter(|c| c.is_ascii_digit()).count() >= 7)
        .map(|s| s.to_string());
    ContactHints { email, phone }
}
