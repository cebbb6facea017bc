//! Structured conversation insights: topics, decisions, questions, action items.

mod extractor;
mod parser;

pub use extractor::InsightExtractor;
pub use parser::parse_insights;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Action item priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}

/// A task or commitment surfaced from the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionItem {
    /// What needs to be done.
    pub text: String,
    /// Priority, defaulting to medium when the oracle gives none.
    pub priority: Priority,
    /// Who should do it ("you" when unattributed).
    pub assigned_to: String,
    /// When the item was extracted.
    pub created_at: DateTime<Utc>,
    /// Whether the item has been completed. Toggled by callers, never by
    /// the extraction pipeline.
    pub completed: bool,
}

impl ActionItem {
    /// Create a pending action item stamped with the current time.
    pub fn new(text: String, priority: Priority, assigned_to: String) -> Self {
        Self {
            text,
            priority,
            assigned_to,
            created_at: Utc::now(),
            completed: false,
        }
    }
}

/// Everything the extractor currently knows about the conversation.
///
/// Replaced wholesale on each successful extraction, never merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationInsights {
    /// Main discussion points.
    pub key_topics: Vec<String>,
    /// Decisions or conclusions reached.
    pub decisions_made: Vec<String>,
    /// Unanswered questions needing follow-up.
    pub questions_raised: Vec<String>,
    /// Tasks and commitments.
    pub action_items: Vec<ActionItem>,
}

impl ConversationInsights {
    /// True when no section has any content.
    pub fn is_empty(&self) -> bool {
        self.key_topics.is_empty()
            && self.decisions_made.is_empty()
            && self.questions_raised.is_empty()
            && self.action_items.is_empty()
    }
}
