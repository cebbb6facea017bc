//! CLI module for Svar.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Svar - Real-time conversation copilot
///
/// Watches a live conversation transcript and continuously publishes a
/// spoken-ready answer, the research behind it, and conversation insights.
/// The name "Svar" comes from the Norwegian/Scandinavian word for "answer."
#[derive(Parser, Debug)]
#[command(name = "svar")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Svar and verify configuration
    Init,

    /// Follow a transcript file and respond to it live
    Run {
        /// Path to the transcript file to follow
        transcript: String,

        /// Minimum seconds between response cycles
        #[arg(short, long)]
        interval: Option<f64>,

        /// Disable the research phase
        #[arg(long)]
        no_research: bool,

        /// Emit published snapshots as JSON lines instead of styled text
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
