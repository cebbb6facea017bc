//! Init command - first-run setup.

use crate::cli::Output;
use crate::config::Settings;
use console::style;

/// Run the init command for first-time setup.
pub fn run_init(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Svar Setup");
    println!();

    // API key check
    if std::env::var("OPENAI_API_KEY").is_err() {
        Output::warning("OPENAI_API_KEY environment variable is not set.");
        println!();
        println!("  Svar requires an OpenAI API key for response generation and research.");
        println!(
            "  Get your API key from: {}",
            style("https://platform.openai.com/api-keys").underlined()
        );
        println!();
        println!("  Set it in your shell configuration (~/.bashrc, ~/.zshrc, etc.):");
        println!("  {}", style("export OPENAI_API_KEY='sk-...'").green());
        println!();
    } else {
        Output::success("OpenAI API key is configured!");
    }

    // Config file
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        Output::info(&format!("Config file exists: {}", config_path.display()));
    } else {
        settings.save_to(&config_path)?;
        Output::success(&format!("Created config file: {}", config_path.display()));
    }

    println!();
    println!("{}", style("Setup complete!").bold().green());
    println!();
    println!("Next steps:");
    println!(
        "  {} Follow a live transcript",
        style("svar run <transcript-file>").cyan()
    );
    println!("  {} Review configuration", style("svar config show").cyan());

    Ok(())
}
