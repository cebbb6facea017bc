//! Configuration settings for Svar.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub oracle: OracleSettings,
    pub responder: ResponderSettings,
    pub research: ResearchSettings,
    pub insights: InsightSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Oracle (text-generation backend) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleSettings {
    /// Model used for all generation calls.
    pub model: String,
    /// Per-request timeout in seconds. A timed-out call is treated as an
    /// ordinary oracle failure by every consumer.
    pub timeout_seconds: u64,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            timeout_seconds: 120,
        }
    }
}

/// Response loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponderSettings {
    /// Minimum seconds between response cycles.
    pub interval_seconds: f64,
    /// Whether to research topics before answering.
    pub enable_research: bool,
    /// How long the loop waits on the change signal before re-checking, in
    /// milliseconds.
    pub poll_interval_ms: u64,
    /// Sampling temperature for response generation.
    pub temperature: f32,
    /// Token budget for response generation.
    pub max_tokens: u32,
}

impl Default for ResponderSettings {
    fn default() -> Self {
        Self {
            interval_seconds: 2.0,
            enable_research: true,
            poll_interval_ms: 300,
            temperature: 0.6,
            max_tokens: 500,
        }
    }
}

/// Research settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchSettings {
    /// Sampling temperature for query extraction.
    pub query_temperature: f32,
    /// Token budget for query extraction.
    pub query_max_tokens: u32,
    /// Sampling temperature for research synthesis.
    pub synthesis_temperature: f32,
    /// Token budget for research synthesis.
    pub synthesis_max_tokens: u32,
}

impl Default for ResearchSettings {
    fn default() -> Self {
        Self {
            query_temperature: 0.3,
            query_max_tokens: 150,
            synthesis_temperature: 0.2,
            synthesis_max_tokens: 400,
        }
    }
}

/// Insight extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightSettings {
    /// Sampling temperature for insight extraction.
    pub temperature: f32,
    /// Token budget for insight extraction.
    pub max_tokens: u32,
}

impl Default for InsightSettings {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 500,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SvarError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("svar")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.oracle.model, "gpt-4o-mini");
        assert_eq!(settings.responder.interval_seconds, 2.0);
        assert!(settings.responder.enable_research);
    }

    #[test]
    fn test_settings_roundtrip() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.responder.poll_interval_ms, settings.responder.poll_interval_ms);
    }

    #[test]
    fn test_partial_config() {
        let parsed: Settings = toml::from_str("[responder]\nenable_research = false\n").unwrap();
        assert!(!parsed.responder.enable_research);
        assert_eq!(parsed.oracle.model, "gpt-4o-mini");
    }
}
