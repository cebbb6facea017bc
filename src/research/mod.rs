//! Research pipeline: query extraction, source retrieval, activity tracking.
//!
//! "Search" here is a delegated call to the text-generation oracle that
//! returns researched prose. The [`ResearchProvider`] trait keeps that
//! substitutable: a real search backend can slot in without touching the
//! tracker or the responder.

mod provider;
mod tracker;

pub use provider::{OracleResearchProvider, ResearchProvider};
pub use tracker::ResearchTracker;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a source came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// A real web result (reserved for future search backends).
    Web,
    /// Prose synthesized by the research oracle.
    AiResearch,
}

/// A single research source backing a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    /// Display title.
    pub title: String,
    /// Source URL (synthetic `search:` URLs for oracle research).
    pub url: String,
    /// Snippet of the source content.
    pub snippet: String,
    /// Kind of source.
    pub source_type: SourceType,
    /// When this source was retrieved.
    pub retrieved_at: DateTime<Utc>,
}

impl Source {
    /// Create a source stamped with the current time.
    pub fn new(title: String, url: String, snippet: String, source_type: SourceType) -> Self {
        Self {
            title,
            url,
            snippet,
            source_type,
            retrieved_at: Utc::now(),
        }
    }
}

/// One completed search: the query and everything it returned.
///
/// Records are append-only; once written they are never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRecord {
    /// The query that was searched.
    pub query: String,
    /// Results, in retrieval order.
    pub results: Vec<Source>,
    /// When the search completed.
    pub searched_at: DateTime<Utc>,
}

/// The unit handed from the research phase to response generation.
#[derive(Debug, Clone, Default)]
pub struct ResearchOutcome {
    /// Queries that were extracted, in extraction order.
    pub queries: Vec<String>,
    /// All sources across all queries, in query order.
    pub sources: Vec<Source>,
    /// Whether any research happened this cycle.
    pub has_research: bool,
}

/// Point-in-time view of research activity, safe to render from any thread.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResearchActivity {
    /// Queries currently awaiting an oracle reply.
    pub active_searches: Vec<String>,
    /// The last few completed queries, oldest first.
    pub recent_searches: Vec<String>,
    /// Total result count across the whole search history.
    pub total_sources: usize,
}
