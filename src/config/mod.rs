//! Configuration module for Svar.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{InsightPrompts, Prompts, ResearchPrompts, ResponsePrompts};
pub use settings::{
    GeneralSettings, InsightSettings, OracleSettings, PromptSettings, ResearchSettings,
    ResponderSettings, Settings,
};
