//! Insight extraction with an at-most-once-per-transcript policy.

use super::{parse_insights, ConversationInsights};
use crate::config::{InsightSettings, Prompts};
use crate::oracle::{GenerateOptions, Oracle};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, instrument, warn};

/// Transcripts shorter than this are not worth analyzing.
const MIN_TRANSCRIPT_LEN: usize = 50;

#[derive(Default)]
struct ExtractorState {
    insights: ConversationInsights,
    last_analyzed: String,
}

/// Extracts structured insights from the conversation transcript.
///
/// Each distinct transcript value is analyzed at most once: the transcript
/// is recorded as analyzed *before* the oracle call, so a transient failure
/// is not retried until the transcript changes again. The tradeoff is
/// deliberate — a hiccup costs one missed extraction, not a retry storm on
/// every cycle.
pub struct InsightExtractor {
    oracle: Arc<dyn Oracle>,
    prompts: Prompts,
    options: GenerateOptions,
    state: Mutex<ExtractorState>,
}

impl InsightExtractor {
    /// Create an extractor.
    pub fn new(oracle: Arc<dyn Oracle>, prompts: Prompts, settings: &InsightSettings) -> Self {
        Self {
            oracle,
            prompts,
            options: GenerateOptions {
                temperature: settings.temperature,
                max_tokens: settings.max_tokens,
            },
            state: Mutex::new(ExtractorState::default()),
        }
    }

    /// Analyze the transcript, returning the current insights.
    ///
    /// Short or already-analyzed transcripts return the held insights
    /// without an oracle call; oracle and parse failures keep them too.
    #[instrument(skip(self, transcript), fields(len = transcript.len()))]
    pub async fn extract(&self, transcript: &str) -> ConversationInsights {
        {
            let mut state = self.state.lock().unwrap();
            if transcript.len() < MIN_TRANSCRIPT_LEN || transcript == state.last_analyzed {
                return state.insights.clone();
            }
            state.last_analyzed = transcript.to_string();
        }

        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), transcript.to_string());
        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.insights.extraction, &vars);

        let reply = match self.oracle.generate(&prompt, &self.options).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Insight extraction failed: {}", e);
                return self.current();
            }
        };

        match parse_insights(&reply) {
            Ok(insights) => {
                debug!(
                    topics = insights.key_topics.len(),
                    actions = insights.action_items.len(),
                    "Extracted insights"
                );
                let mut state = self.state.lock().unwrap();
                state.insights = insights.clone();
                insights
            }
            Err(e) => {
                warn!("Could not parse insight reply: {}", e);
                self.current()
            }
        }
    }

    /// The insights from the most recent successful extraction.
    pub fn current(&self) -> ConversationInsights {
        self.state.lock().unwrap().insights.clone()
    }

    /// Forget everything, including the last-analyzed marker.
    pub fn clear(&self) {
        *self.state.lock().unwrap() = ExtractorState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::testing::ScriptedOracle;

    const TRANSCRIPT: &str =
        "Speaker: we should ship the beta next week. You: agreed, I'll tell the team.";

    const REPLY: &str = "ACTION ITEMS:\n- [Priority: high] Tell the team about the beta\nKEY TOPICS:\n- Beta launch\nDECISIONS:\n- Ship next week\nQUESTIONS:\n- NONE";

    fn extractor(oracle: Arc<dyn Oracle>) -> InsightExtractor {
        InsightExtractor::new(oracle, Prompts::default(), &InsightSettings::default())
    }

    #[tokio::test]
    async fn test_extract_parses_reply() {
        let oracle = Arc::new(ScriptedOracle::new(&[REPLY]));
        let extractor = extractor(oracle);

        let insights = extractor.extract(TRANSCRIPT).await;

        assert_eq!(insights.key_topics, vec!["Beta launch"]);
        assert_eq!(insights.decisions_made, vec!["Ship next week"]);
        assert_eq!(insights.action_items.len(), 1);
        assert!(insights.questions_raised.is_empty());
    }

    #[tokio::test]
    async fn test_same_transcript_analyzed_at_most_once() {
        let oracle = Arc::new(ScriptedOracle::new(&[REPLY]));
        let extractor = extractor(oracle.clone());

        let first = extractor.extract(TRANSCRIPT).await;
        let second = extractor.extract(TRANSCRIPT).await;

        assert_eq!(oracle.calls(), 1);
        assert_eq!(first.key_topics, second.key_topics);
        assert_eq!(first.action_items.len(), second.action_items.len());
    }

    #[tokio::test]
    async fn test_short_transcript_never_calls_oracle() {
        let oracle = Arc::new(ScriptedOracle::new(&[REPLY]));
        let extractor = extractor(oracle.clone());

        let insights = extractor.extract("short chat").await;

        assert_eq!(oracle.calls(), 0);
        assert!(insights.is_empty());
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_insights() {
        let oracle = Arc::new(ScriptedOracle::new(&[REPLY]));
        let extractor = extractor(oracle);

        let first = extractor.extract(TRANSCRIPT).await;
        assert!(!first.is_empty());

        // Script exhausted: the next distinct transcript fails the oracle call.
        let longer = format!("{} Speaker: one more thing, can you check the budget?", TRANSCRIPT);
        let second = extractor.extract(&longer).await;

        assert_eq!(second.key_topics, first.key_topics);
    }

    #[tokio::test]
    async fn test_failed_transcript_not_retried_until_changed() {
        // Empty script: every oracle call errors, and calls are counted.
        let oracle = Arc::new(ScriptedOracle::new(&[]));
        let extractor = extractor(oracle.clone());

        let _ = extractor.extract(TRANSCRIPT).await;
        let _ = extractor.extract(TRANSCRIPT).await;

        // The second call never reaches the oracle: the transcript was
        // already marked analyzed when the first attempt failed.
        assert_eq!(oracle.calls(), 1);
        assert!(extractor.current().is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_reply_keeps_previous_insights() {
        let oracle = Arc::new(ScriptedOracle::new(&[REPLY, "no sections here at all"]));
        let extractor = extractor(oracle);

        let first = extractor.extract(TRANSCRIPT).await;
        let longer = format!("{} Speaker: also, lunch?", TRANSCRIPT);
        let second = extractor.extract(&longer).await;

        assert_eq!(second.key_topics, first.key_topics);
    }

    #[tokio::test]
    async fn test_clear_resets_marker_and_insights() {
        let oracle = Arc::new(ScriptedOracle::new(&[REPLY, REPLY]));
        let extractor = extractor(oracle.clone());

        extractor.extract(TRANSCRIPT).await;
        extractor.clear();
        assert!(extractor.current().is_empty());

        // Same transcript analyzes again after clear.
        extractor.extract(TRANSCRIPT).await;
        assert_eq!(oracle.calls(), 2);
    }
}
