//! The orchestrator loop.

use super::PublishedState;
use crate::config::{Prompts, Settings};
use crate::insights::{ConversationInsights, InsightExtractor};
use crate::oracle::{GenerateOptions, Oracle};
use crate::research::{
    OracleResearchProvider, ResearchActivity, ResearchOutcome, ResearchTracker, Source,
};
use crate::transcript::TranscriptFeed;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Maximum transcript snapshots kept as conversation context.
const CONTEXT_LIMIT: usize = 10;

/// How many context entries feed the research prompt.
const CONTEXT_PROMPT_ENTRIES: usize = 3;

/// Drives the conversational turn: research, response, publish, insights.
///
/// The loop runs on one background task and is the only writer of the
/// published state. Readers on other threads take snapshots through the
/// accessors and are never blocked by an in-flight oracle call.
pub struct Responder {
    feed: Arc<TranscriptFeed>,
    oracle: Arc<dyn Oracle>,
    tracker: Option<Arc<ResearchTracker>>,
    extractor: InsightExtractor,
    prompts: Prompts,
    options: GenerateOptions,
    interval: Mutex<Duration>,
    poll_interval: Duration,
    published: RwLock<PublishedState>,
    queries: Mutex<Vec<String>>,
    /// Bumped by `clear_context`; publishes from cycles that started under
    /// an older epoch are discarded instead of resurrecting cleared state.
    epoch: AtomicU64,
}

impl Responder {
    /// Create a responder wired per the settings.
    pub fn new(
        feed: Arc<TranscriptFeed>,
        oracle: Arc<dyn Oracle>,
        settings: &Settings,
        prompts: Prompts,
    ) -> Self {
        let tracker = settings.responder.enable_research.then(|| {
            let provider = Arc::new(OracleResearchProvider::new(
                oracle.clone(),
                prompts.clone(),
                &settings.research,
            ));
            Arc::new(ResearchTracker::new(
                oracle.clone(),
                provider,
                prompts.clone(),
                &settings.research,
            ))
        });

        let extractor = InsightExtractor::new(oracle.clone(), prompts.clone(), &settings.insights);

        Self::with_components(feed, oracle, tracker, extractor, settings, prompts)
    }

    /// Create a responder with explicit research and insight components.
    pub fn with_components(
        feed: Arc<TranscriptFeed>,
        oracle: Arc<dyn Oracle>,
        tracker: Option<Arc<ResearchTracker>>,
        extractor: InsightExtractor,
        settings: &Settings,
        prompts: Prompts,
    ) -> Self {
        Self {
            feed,
            oracle,
            tracker,
            extractor,
            prompts,
            options: GenerateOptions {
                temperature: settings.responder.temperature,
                max_tokens: settings.responder.max_tokens,
            },
            interval: Mutex::new(Duration::from_secs_f64(
                settings.responder.interval_seconds.max(0.0),
            )),
            poll_interval: Duration::from_millis(settings.responder.poll_interval_ms),
            published: RwLock::new(PublishedState::default()),
            queries: Mutex::new(Vec::new()),
            epoch: AtomicU64::new(0),
        }
    }

    /// Run the response loop until the owning task is torn down.
    pub async fn run(self: Arc<Self>) {
        info!("Responder loop started");

        loop {
            // Bounded wait so the loop re-checks periodically even if the
            // producer never signals. A signal raised mid-cycle is stored
            // and consumed by the next wait, exactly once.
            if tokio::time::timeout(self.poll_interval, self.feed.changed())
                .await
                .is_err()
            {
                continue;
            }

            let started = Instant::now();
            let epoch = self.epoch.load(Ordering::SeqCst);
            let transcript = self.feed.transcript();

            self.run_cycle(&transcript, epoch).await;

            let interval = *self.interval.lock().unwrap();
            tokio::time::sleep(remaining_sleep(interval, started.elapsed())).await;
        }
    }

    /// One conversational turn.
    #[instrument(skip(self, transcript), fields(len = transcript.len()))]
    async fn run_cycle(&self, transcript: &str, epoch: u64) {
        let mut research = ResearchOutcome::default();
        if let Some(tracker) = &self.tracker {
            let context = self.recent_context(CONTEXT_PROMPT_ENTRIES);
            research = tracker.research(transcript, &context).await;
            *self.queries.lock().unwrap() = research.queries.clone();
        }

        let response = self.generate_response(transcript, &research).await;
        if response.is_empty() {
            debug!("Cycle produced no response; keeping published state");
            return;
        }

        {
            let mut published = self.published.write().unwrap();
            if self.epoch.load(Ordering::SeqCst) != epoch {
                debug!("Discarding publish from a cycle older than the last clear");
                return;
            }
            published.response = response;
            published.sources = research.sources;
            published.conversation_context.push_back(transcript.to_string());
            while published.conversation_context.len() > CONTEXT_LIMIT {
                published.conversation_context.pop_front();
            }
        }

        // Extraction runs after publishing so a slow or failing insight
        // call never delays or rolls back the response.
        let insights = self.extractor.extract(transcript).await;
        let mut published = self.published.write().unwrap();
        if self.epoch.load(Ordering::SeqCst) == epoch {
            published.insights = insights;
        }
    }

    /// Generate the spoken-ready answer, degrading to empty on failure.
    async fn generate_response(&self, transcript: &str, research: &ResearchOutcome) -> String {
        let prompt = self.build_prompt(transcript, research);

        match self.oracle.generate(&prompt, &self.options).await {
            Ok(reply) => extract_bracketed(&reply).to_string(),
            Err(e) => {
                warn!("Response generation failed: {}", e);
                String::new()
            }
        }
    }

    fn build_prompt(&self, transcript: &str, research: &ResearchOutcome) -> String {
        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), transcript.to_string());

        if research.has_research {
            vars.insert("queries".to_string(), research.queries.join(", "));
            vars.insert("findings".to_string(), format_findings(&research.sources));
            self.prompts
                .render_with_custom(&self.prompts.response.research, &vars)
        } else {
            self.prompts
                .render_with_custom(&self.prompts.response.plain, &vars)
        }
    }

    /// Last few context entries, joined for the research prompt.
    fn recent_context(&self, entries: usize) -> String {
        let published = self.published.read().unwrap();
        let context = &published.conversation_context;
        let start = context.len().saturating_sub(entries);
        context
            .iter()
            .skip(start)
            .cloned()
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Snapshot of the published state.
    pub fn published_state(&self) -> PublishedState {
        self.published.read().unwrap().clone()
    }

    /// Insights from the most recent successful extraction.
    pub fn insights(&self) -> ConversationInsights {
        self.extractor.current()
    }

    /// Queries from the most recent research phase, success or not.
    pub fn research_queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    /// Research activity snapshot; empty when research is disabled.
    pub fn research_activity(&self) -> ResearchActivity {
        self.tracker
            .as_ref()
            .map(|tracker| tracker.snapshot_activity())
            .unwrap_or_default()
    }

    /// All sources gathered this session; empty when research is disabled.
    pub fn all_sources(&self) -> Vec<Source> {
        self.tracker
            .as_ref()
            .map(|tracker| tracker.all_sources())
            .unwrap_or_default()
    }

    /// Adjust the minimum seconds between cycles. Applies to the next
    /// computed sleep, not the one already in progress.
    pub fn set_response_interval(&self, seconds: f64) {
        *self.interval.lock().unwrap() = Duration::from_secs_f64(seconds.max(0.0));
    }

    /// Register a callback invoked on every research state change.
    pub fn register_research_observer(&self, observer: impl Fn() + Send + Sync + 'static) {
        if let Some(tracker) = &self.tracker {
            tracker.register_observer(observer);
        }
    }

    /// Drop conversation context, published sources and queries, research
    /// history, and insights. The published response itself is retained.
    ///
    /// Safe to call while a cycle is in flight: the epoch bump makes that
    /// cycle discard its publish instead of resurrecting cleared state.
    pub fn clear_context(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);

        {
            let mut published = self.published.write().unwrap();
            published.sources.clear();
            published.conversation_context.clear();
            published.insights = ConversationInsights::default();
        }
        self.queries.lock().unwrap().clear();

        if let Some(tracker) = &self.tracker {
            tracker.clear();
        }
        self.extractor.clear();

        info!("Conversation context cleared");
    }
}

/// Time left to sleep after a cycle; never negative.
fn remaining_sleep(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}

/// Extract the answer between the first `[` and the `]` that follows it.
/// Replies without a bracket pair are used as-is.
fn extract_bracketed(reply: &str) -> &str {
    if let Some(start) = reply.find('[') {
        if let Some(len) = reply[start + 1..].find(']') {
            return &reply[start + 1..start + 1 + len];
        }
    }
    reply
}

/// Format sources for the research-augmented prompt.
fn format_findings(sources: &[Source]) -> String {
    sources
        .iter()
        .enumerate()
        .map(|(i, source)| format!("[Source {}] {}\n{}", i + 1, source.title, source.snippet))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::super::INITIAL_RESPONSE;
    use super::*;
    use crate::oracle::testing::ScriptedOracle;

    const INSIGHTS_REPLY: &str =
        "ACTION ITEMS:\n- NONE\nKEY TOPICS:\n- testing\nDECISIONS:\n- NONE\nQUESTIONS:\n- NONE";

    fn responder(replies: &[&str], enable_research: bool) -> (Arc<Responder>, Arc<ScriptedOracle>) {
        let mut settings = Settings::default();
        settings.responder.enable_research = enable_research;

        let oracle = Arc::new(ScriptedOracle::new(replies));
        let responder = Responder::new(
            Arc::new(TranscriptFeed::new()),
            oracle.clone(),
            &settings,
            Prompts::default(),
        );
        (Arc::new(responder), oracle)
    }

    #[test]
    fn test_extract_bracketed() {
        assert_eq!(extract_bracketed("Sure. [The answer] Done."), "The answer");
        assert_eq!(
            extract_bracketed("Here is your answer without brackets"),
            "Here is your answer without brackets"
        );
        assert_eq!(extract_bracketed("open [ but never closed"), "open [ but never closed");
        assert_eq!(extract_bracketed("[first] and [second]"), "first");
        assert_eq!(extract_bracketed("[]"), "");
    }

    #[test]
    fn test_remaining_sleep_floor() {
        let interval = Duration::from_secs(2);
        assert_eq!(
            remaining_sleep(interval, Duration::from_millis(500)),
            Duration::from_millis(1500)
        );
        assert_eq!(remaining_sleep(interval, Duration::from_secs(5)), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_cycle_publishes_bracketed_response() {
        let (responder, _) = responder(&["Sure. [Here is the answer] extra"], false);

        responder.run_cycle("Speaker: what's up?", 0).await;

        let state = responder.published_state();
        assert_eq!(state.response, "Here is the answer");
        assert!(state.sources.is_empty());
        assert_eq!(state.conversation_context.len(), 1);
        assert_eq!(state.conversation_context[0], "Speaker: what's up?");
    }

    #[tokio::test]
    async fn test_bracketless_reply_published_verbatim() {
        let (responder, _) = responder(&["Here is your answer without brackets"], false);

        responder.run_cycle("Speaker: hm?", 0).await;

        assert_eq!(
            responder.published_state().response,
            "Here is your answer without brackets"
        );
    }

    #[tokio::test]
    async fn test_failed_generation_keeps_published_state() {
        let (responder, oracle) = responder(&[], false);

        responder.run_cycle("Speaker: anyone there?", 0).await;

        let state = responder.published_state();
        assert_eq!(state.response, INITIAL_RESPONSE);
        assert!(state.conversation_context.is_empty());
        assert_eq!(oracle.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_brackets_treated_as_no_update() {
        let (responder, _) = responder(&["[]"], false);

        responder.run_cycle("Speaker: hm?", 0).await;

        assert_eq!(responder.published_state().response, INITIAL_RESPONSE);
        assert!(responder.published_state().conversation_context.is_empty());
    }

    #[tokio::test]
    async fn test_context_bounded_to_ten_oldest_evicted() {
        let replies: Vec<String> = (0..12).map(|i| format!("[answer {}]", i)).collect();
        let refs: Vec<&str> = replies.iter().map(String::as_str).collect();
        let (responder, _) = responder(&refs, false);

        for i in 0..12 {
            responder.run_cycle(&format!("turn {}", i), 0).await;
        }

        let state = responder.published_state();
        assert_eq!(state.conversation_context.len(), 10);
        assert_eq!(state.conversation_context[0], "turn 2");
        assert_eq!(state.conversation_context[9], "turn 11");
        assert_eq!(state.response, "answer 11");
    }

    #[tokio::test]
    async fn test_no_research_uses_plain_template() {
        let (responder, oracle) = responder(&["NONE", "[just chatting]"], true);

        responder.run_cycle("just chatting, nothing factual", 0).await;

        let state = responder.published_state();
        assert_eq!(state.response, "just chatting");
        assert!(state.sources.is_empty());
        assert!(responder.research_queries().is_empty());

        let prompts = oracle.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("identify what topics need real-time research"));
        assert!(!prompts[1].contains("RESEARCH FINDINGS"));
    }

    #[tokio::test]
    async fn test_research_flow_publishes_sources() {
        let (responder, oracle) = responder(
            &[
                "rust 1.80 release date",
                "Rust 1.80 was released on July 25, 2024.",
                "Citing research. [It came out on July 25, 2024]",
            ],
            true,
        );

        responder.run_cycle("Speaker: when did Rust 1.80 ship?", 0).await;

        let state = responder.published_state();
        assert_eq!(state.response, "It came out on July 25, 2024");
        assert_eq!(state.sources.len(), 1);
        assert_eq!(state.sources[0].title, "Research: rust 1.80 release date");
        assert_eq!(responder.research_queries(), vec!["rust 1.80 release date"]);
        assert_eq!(responder.research_activity().total_sources, 1);
        assert_eq!(responder.all_sources().len(), 1);

        let prompts = oracle.prompts();
        assert!(prompts[2].contains("RESEARCH FINDINGS"));
        assert!(prompts[2].contains("Research: rust 1.80 release date"));
    }

    #[tokio::test]
    async fn test_insights_extracted_after_publish() {
        let transcript =
            "Speaker: the beta ships next week and we should test it thoroughly before then.";
        let (responder, _) = responder(&["[on it]", INSIGHTS_REPLY], false);

        responder.run_cycle(transcript, 0).await;

        assert_eq!(responder.insights().key_topics, vec!["testing"]);
        assert_eq!(responder.published_state().insights.key_topics, vec!["testing"]);
    }

    #[tokio::test]
    async fn test_stale_cycle_discarded_after_clear() {
        let (responder, _) = responder(&["[late answer]"], false);

        // The cycle captured epoch 0; a clear lands before it publishes.
        responder.clear_context();
        responder.run_cycle("Speaker: stale question", 0).await;

        let state = responder.published_state();
        assert_eq!(state.response, INITIAL_RESPONSE);
        assert!(state.conversation_context.is_empty());
    }

    #[tokio::test]
    async fn test_clear_context_empties_everything_but_response() {
        let (responder, _) = responder(
            &[
                "some query",
                "Researched prose about the query.",
                "[researched answer]",
            ],
            true,
        );

        responder.run_cycle("Speaker: tell me about the query", 0).await;
        assert!(!responder.published_state().sources.is_empty());

        responder.clear_context();

        let state = responder.published_state();
        assert_eq!(state.response, "researched answer");
        assert!(state.sources.is_empty());
        assert!(state.conversation_context.is_empty());
        assert!(state.insights.is_empty());
        assert!(responder.research_queries().is_empty());
        assert_eq!(responder.research_activity().total_sources, 0);
    }

    #[tokio::test]
    async fn test_run_loop_reacts_to_feed_changes() {
        let transcript =
            "Speaker: could you walk me through the deployment checklist one more time please?";
        let mut settings = Settings::default();
        settings.responder.enable_research = false;
        settings.responder.interval_seconds = 0.0;
        settings.responder.poll_interval_ms = 20;

        let feed = Arc::new(TranscriptFeed::new());
        let oracle = Arc::new(ScriptedOracle::new(&["[live answer]", INSIGHTS_REPLY]));
        let responder = Arc::new(Responder::new(
            feed.clone(),
            oracle,
            &settings,
            Prompts::default(),
        ));

        let handle = tokio::spawn(responder.clone().run());
        feed.replace(transcript.to_string());

        // The response publishes first and insights land right after, so
        // wait for both before tearing the loop down.
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            let state = responder.published_state();
            if state.response == "live answer" && !state.insights.is_empty() {
                break;
            }
            assert!(Instant::now() < deadline, "responder never published");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(responder.insights().key_topics, vec!["testing"]);
        handle.abort();
    }

    #[tokio::test]
    async fn test_recent_context_takes_last_three() {
        let replies: Vec<String> = (0..5).map(|i| format!("[a{}]", i)).collect();
        let refs: Vec<&str> = replies.iter().map(String::as_str).collect();
        let (responder, _) = responder(&refs, false);

        for i in 0..5 {
            responder.run_cycle(&format!("turn {}", i), 0).await;
        }

        assert_eq!(responder.recent_context(3), "turn 2\nturn 3\nturn 4");
    }

    #[tokio::test]
    async fn test_set_response_interval_clamps_negative() {
        let (responder, _) = responder(&[], false);
        responder.set_response_interval(-3.0);
        assert_eq!(*responder.interval.lock().unwrap(), Duration::ZERO);
    }
}
