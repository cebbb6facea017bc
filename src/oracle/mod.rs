//! Text-generation oracle abstraction.
//!
//! Every component that needs generated text (response generation, query
//! extraction, research synthesis, insight extraction) goes through the
//! [`Oracle`] trait. The oracle is constructed once at startup and injected
//! by reference, which keeps process-wide state out of the library and makes
//! the whole pipeline testable with scripted doubles.

mod openai;

pub use openai::OpenAiOracle;

use crate::error::Result;
use async_trait::async_trait;

/// Per-call generation parameters.
#[derive(Debug, Clone, Copy)]
pub struct GenerateOptions {
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: 0.6,
            max_tokens: 500,
        }
    }
}

/// Trait for text-generation backends.
///
/// The oracle is treated as an opaque, possibly-slow, possibly-failing
/// request/response function. Callers are expected to recover from failures
/// locally; no error from `generate` is ever fatal to the pipeline.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Generate text for a prompt.
    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String>;
}
