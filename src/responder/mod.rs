//! The response orchestrator.
//!
//! One background task watches the transcript feed and drives each
//! conversational turn end-to-end: research, response generation, publish,
//! insight extraction, rate limit. Everything readers see goes through
//! [`PublishedState`] snapshots; readers never join the loop.

mod engine;

pub use engine::Responder;

use crate::insights::ConversationInsights;
use crate::research::Source;
use serde::Serialize;
use std::collections::VecDeque;

/// Response shown before any cycle has completed.
pub const INITIAL_RESPONSE: &str =
    "I'm ready to help you answer questions. Just speak naturally.";

/// The externally visible result of the most recent successful cycle.
///
/// Replaced as a unit after a cycle completes with a non-empty response; a
/// failed cycle leaves every field untouched.
#[derive(Debug, Clone, Serialize)]
pub struct PublishedState {
    /// The spoken-ready answer.
    pub response: String,
    /// Sources backing the answer.
    pub sources: Vec<Source>,
    /// Recent transcript snapshots, oldest first, at most ten.
    pub conversation_context: VecDeque<String>,
    /// Insights from the most recent extraction.
    pub insights: ConversationInsights,
}

impl Default for PublishedState {
    fn default() -> Self {
        Self {
            response: INITIAL_RESPONSE.to_string(),
            sources: Vec::new(),
            conversation_context: VecDeque::new(),
            insights: ConversationInsights::default(),
        }
    }
}
