//! OpenAI-backed oracle implementation.

use super::{GenerateOptions, Oracle};
use crate::config::OracleSettings;
use crate::error::{Result, SvarError};
use async_openai::types::{
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Default timeout for oracle requests (2 minutes).
///
/// A hung oracle call stalls the whole response loop, so every request
/// carries a hard deadline; a timeout surfaces as an ordinary oracle failure.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// OpenAI chat-completion oracle.
pub struct OpenAiOracle {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiOracle {
    /// Create an oracle from settings.
    pub fn new(settings: &OracleSettings) -> Self {
        let timeout = Duration::from_secs(settings.timeout_seconds);
        Self::with_config(&settings.model, timeout)
    }

    /// Create an oracle with an explicit model and request timeout.
    pub fn with_config(model: &str, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client: Client::with_config(OpenAIConfig::default()).with_http_client(http_client),
            model: model.to_string(),
        }
    }
}

impl Default for OpenAiOracle {
    fn default() -> Self {
        Self::with_config("gpt-4o-mini", Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

#[async_trait]
impl Oracle for OpenAiOracle {
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt.to_string())
            .build()
            .map_err(|e| SvarError::Oracle(e.to_string()))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![message.into()])
            .temperature(options.temperature)
            .max_tokens(options.max_tokens)
            .build()
            .map_err(|e| SvarError::Oracle(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| SvarError::Oracle(format!("Generation request failed: {}", e)))?;

        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| SvarError::Oracle("Empty response from model".to_string()))?
            .clone();

        debug!("Generated {} characters", text.len());
        Ok(text)
    }
}
