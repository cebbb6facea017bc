//! Search-state tracking across concurrent readers.

use super::{ResearchActivity, ResearchOutcome, ResearchProvider, SearchRecord, Source};
use crate::config::{Prompts, ResearchSettings};
use crate::oracle::{GenerateOptions, Oracle};
use chrono::Utc;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use tracing::{instrument, warn};

/// Hard cap on queries extracted per cycle.
const MAX_QUERIES: usize = 3;

/// How many completed queries the activity snapshot reports.
const RECENT_SEARCHES: usize = 5;

type Observer = Box<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct TrackerState {
    history: Vec<SearchRecord>,
    active: Vec<String>,
}

/// Tracks in-flight and historical research.
///
/// One mutex guards the active set and the history; it is held only for the
/// duration of each bookkeeping operation, never across an oracle call, so
/// status readers on other threads are never blocked by a slow search.
///
/// Observers are invoked inside the same critical section as the state
/// change they report. They must not call back into the tracker.
pub struct ResearchTracker {
    oracle: Arc<dyn Oracle>,
    provider: Arc<dyn ResearchProvider>,
    prompts: Prompts,
    query_options: GenerateOptions,
    state: Mutex<TrackerState>,
    observers: Mutex<Vec<Observer>>,
}

impl ResearchTracker {
    /// Create a tracker.
    ///
    /// The oracle handles query extraction; the provider handles the
    /// searches themselves.
    pub fn new(
        oracle: Arc<dyn Oracle>,
        provider: Arc<dyn ResearchProvider>,
        prompts: Prompts,
        settings: &ResearchSettings,
    ) -> Self {
        Self {
            oracle,
            provider,
            prompts,
            query_options: GenerateOptions {
                temperature: settings.query_temperature,
                max_tokens: settings.query_max_tokens,
            },
            state: Mutex::new(TrackerState::default()),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Extract up to three search queries for the current conversation.
    ///
    /// An oracle reply of `NONE` (or nothing) means no research is needed.
    /// Oracle failures degrade to an empty list.
    pub async fn extract_queries(&self, transcript: &str, context: &str) -> Vec<String> {
        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), transcript.to_string());
        vars.insert("context".to_string(), context.to_string());
        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.research.query_extraction, &vars);

        match self.oracle.generate(&prompt, &self.query_options).await {
            Ok(reply) => parse_queries(&reply),
            Err(e) => {
                warn!("Query extraction failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Run one search, tracking it in the active set for its whole duration.
    ///
    /// The query leaves the active set whether the provider succeeds or
    /// fails; a failed search returns no sources.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search(&self, query: &str) -> Vec<Source> {
        self.mark_active(query);

        match self.provider.fetch(query).await {
            Ok(results) => {
                self.record_results(query, results.clone());
                results
            }
            Err(e) => {
                warn!("Search failed for '{}': {}", query, e);
                self.drop_active(query);
                Vec::new()
            }
        }
    }

    /// The full research flow: extract queries, then search each in order.
    ///
    /// A zero-query turn performs no oracle calls beyond the extraction call.
    pub async fn research(&self, transcript: &str, context: &str) -> ResearchOutcome {
        let queries = self.extract_queries(transcript, context).await;

        if queries.is_empty() {
            return ResearchOutcome::default();
        }

        let mut sources = Vec::new();
        for query in &queries {
            sources.extend(self.search(query).await);
        }

        ResearchOutcome {
            queries,
            sources,
            has_research: true,
        }
    }

    /// Consistent snapshot of current activity for status displays.
    pub fn snapshot_activity(&self) -> ResearchActivity {
        let state = self.state.lock().unwrap();
        let recent_start = state.history.len().saturating_sub(RECENT_SEARCHES);

        ResearchActivity {
            active_searches: state.active.clone(),
            recent_searches: state.history[recent_start..]
                .iter()
                .map(|record| record.query.clone())
                .collect(),
            total_sources: state.history.iter().map(|record| record.results.len()).sum(),
        }
    }

    /// All sources from the session, chronological.
    pub fn all_sources(&self) -> Vec<Source> {
        let state = self.state.lock().unwrap();
        state
            .history
            .iter()
            .flat_map(|record| record.results.iter().cloned())
            .collect()
    }

    /// Register a callback invoked after every state change.
    pub fn register_observer(&self, observer: impl Fn() + Send + Sync + 'static) {
        self.observers.lock().unwrap().push(Box::new(observer));
    }

    /// Drop all history and in-flight bookkeeping.
    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap();
        state.history.clear();
        state.active.clear();
        self.notify_observers();
    }

    fn mark_active(&self, query: &str) {
        let mut state = self.state.lock().unwrap();
        state.active.push(query.to_string());
        self.notify_observers();
    }

    fn record_results(&self, query: &str, results: Vec<Source>) {
        let mut state = self.state.lock().unwrap();
        state.history.push(SearchRecord {
            query: query.to_string(),
            results,
            searched_at: Utc::now(),
        });
        if let Some(pos) = state.active.iter().position(|q| q == query) {
            state.active.remove(pos);
        }
        self.notify_observers();
    }

    fn drop_active(&self, query: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(pos) = state.active.iter().position(|q| q == query) {
            state.active.remove(pos);
        }
        self.notify_observers();
    }

    /// Invoke every observer, containing panics so one bad callback cannot
    /// halt the rest.
    fn notify_observers(&self) {
        let observers = self.observers.lock().unwrap();
        for observer in observers.iter() {
            if std::panic::catch_unwind(AssertUnwindSafe(|| observer())).is_err() {
                warn!("Research observer panicked");
            }
        }
    }
}

/// Parse the query-extraction reply into a bounded query list.
fn parse_queries(reply: &str) -> Vec<String> {
    let reply = reply.trim();
    if reply.is_empty() || reply == "NONE" {
        return Vec::new();
    }

    reply
        .lines()
        .map(|line| line.trim().trim_start_matches(['-', '*']).trim_start())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .take(MAX_QUERIES)
        .collect()
}
