//! Research providers.

use super::{Source, SourceType};
use crate::config::{Prompts, ResearchSettings};
use crate::error::Result;
use crate::oracle::{GenerateOptions, Oracle};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Maximum snippet length before truncation.
const SNIPPET_MAX_CHARS: usize = 300;

/// Trait for research backends.
///
/// Exactly one implementation exists today ([`OracleResearchProvider`]); the
/// seam is here so a real search API can replace it without touching the
/// tracker or the responder.
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    /// Fetch sources for a query.
    async fn fetch(&self, query: &str) -> Result<Vec<Source>>;
}

/// Research provider that asks the oracle to synthesize researched prose.
pub struct OracleResearchProvider {
    oracle: Arc<dyn Oracle>,
    prompts: Prompts,
    options: GenerateOptions,
}

impl OracleResearchProvider {
    /// Create a provider from settings.
    pub fn new(oracle: Arc<dyn Oracle>, prompts: Prompts, settings: &ResearchSettings) -> Self {
        Self {
            oracle,
            prompts,
            options: GenerateOptions {
                temperature: settings.synthesis_temperature,
                max_tokens: settings.synthesis_max_tokens,
            },
        }
    }
}

#[async_trait]
impl ResearchProvider for OracleResearchProvider {
    #[instrument(skip(self), fields(query = %query))]
    async fn fetch(&self, query: &str) -> Result<Vec<Source>> {
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), query.to_string());
        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.research.synthesis, &vars);

        let content = self.oracle.generate(&prompt, &self.options).await?;

        debug!("Synthesized {} characters of research", content.len());

        let source = Source::new(
            format!("Research: {}", query),
            format!("search:{}", query.replace(' ', "+")),
            truncate_snippet(&content, SNIPPET_MAX_CHARS),
            SourceType::AiResearch,
        );

        Ok(vec![source])
    }
}

/// Truncate text to `max_chars` characters, appending an ellipsis marker
/// only when something was cut.
fn truncate_snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
