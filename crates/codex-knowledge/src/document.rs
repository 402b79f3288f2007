//! Knowledge documents and their categories.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Topic area a document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Services,
    Technologies,
    Process,
    Pricing,
    Portfolio,
    Company,
    Faq,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Services => write!(f, "services"),
            Category::Technologies => write!(f, "technologies"),
            Category::Process => write!(f, "process"),
            Category::Pricing => write!(f, "pricing"),
            Category::Portfolio => write!(f, "portfolio"),
            Category::Company => write!(f, "company"),
            Category::Faq => write!(f, "faq"),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "services" => Ok(Category::Services),
            "technologies" => Ok(Category::Technologies),
            "process" => Ok(Category::Process),
            "pricing" => Ok(Category::Pricing),
            "portfolio" => Ok(Category::Portfolio),
            "company" => Ok(Category::Company),
            "faq" => Ok(Category::Faq),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

/// A static piece of knowledge the assistant can cite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub category: Category,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub summary: String,
    pub content: String,
}

/// A search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: u32,
}
