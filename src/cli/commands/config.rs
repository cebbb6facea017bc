//! Config command - show configuration and its location.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: &Settings) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let content = toml::to_string_pretty(settings)?;
            println!("{}", content);
        }
        ConfigAction::Path => {
            let path = Settings::default_config_path();
            Output::kv("config", &path.display().to_string());
            if !path.exists() {
                Output::info("File does not exist yet; defaults are in effect. Run 'svar init' to create it.");
            }
        }
    }
    Ok(())
}
