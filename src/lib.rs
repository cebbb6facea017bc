//! Svar - Real-time Conversation Copilot
//!
//! Svar watches a continuously growing conversation transcript and, on a
//! bounded cadence, publishes three derived artifacts: a spoken-ready answer
//! to the latest exchange, the research sources backing that answer, and
//! structured conversation insights (topics, decisions, open questions,
//! action items).
//!
//! The name "Svar" comes from the Norwegian/Scandinavian word for "answer."
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt templates
//! - `oracle` - Text-generation backend abstraction
//! - `transcript` - Shared transcript state and change signaling
//! - `research` - Query extraction, source retrieval, activity tracking
//! - `insights` - Structured insight extraction and parsing
//! - `responder` - The orchestrator loop and published state
//!
//! Audio capture, speech-to-text, rendering, and network transport are
//! external concerns: producers write into a [`transcript::TranscriptFeed`],
//! and readers take snapshots from the [`responder::Responder`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use svar::config::{Prompts, Settings};
//! use svar::oracle::{OpenAiOracle, Oracle};
//! use svar::responder::Responder;
//! use svar::transcript::TranscriptFeed;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let oracle: Arc<dyn Oracle> = Arc::new(OpenAiOracle::new(&settings.oracle));
//!     let feed = Arc::new(TranscriptFeed::new());
//!     let responder = Arc::new(Responder::new(
//!         feed.clone(),
//!         oracle,
//!         &settings,
//!         Prompts::default(),
//!     ));
//!
//!     tokio::spawn(responder.clone().run());
//!
//!     feed.append("Speaker: what's the capital of Norway?");
//!     // ... read responder.published_state() from your UI or API layer.
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod insights;
pub mod oracle;
pub mod research;
pub mod responder;
pub mod transcript;

pub use error::{Result, SvarError};
