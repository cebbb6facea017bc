//! Run command - follow a transcript file and respond to it live.

use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::oracle::{OpenAiOracle, Oracle};
use crate::responder::Responder;
use crate::transcript::TranscriptFeed;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Follow a transcript file, drive the responder, and print published state.
pub async fn run_run(
    transcript_path: &str,
    interval: Option<f64>,
    no_research: bool,
    json: bool,
    mut settings: Settings,
) -> anyhow::Result<()> {
    if no_research {
        settings.responder.enable_research = false;
    }

    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;

    let oracle: Arc<dyn Oracle> = Arc::new(OpenAiOracle::new(&settings.oracle));
    let feed = Arc::new(TranscriptFeed::new());
    let responder = Arc::new(Responder::new(feed.clone(), oracle, &settings, prompts));

    if let Some(seconds) = interval {
        responder.set_response_interval(seconds);
    }

    responder.register_research_observer(|| debug!("Research activity changed"));

    let loop_task = tokio::spawn(responder.clone().run());

    if !json {
        Output::info(&format!("Following {}", transcript_path));
        Output::info("Press Ctrl-C to stop.");
    }

    let path = PathBuf::from(transcript_path);
    let poll = Duration::from_millis(settings.responder.poll_interval_ms);
    let mut last_transcript = String::new();
    let mut last_response = String::new();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = tokio::time::sleep(poll) => {}
        }

        // Tail the file by comparison; the feed raises the change signal
        // only when the content actually differs.
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => {
                if text != last_transcript {
                    last_transcript = text.clone();
                    feed.replace(text);
                }
            }
            Err(e) => debug!("Could not read transcript file: {}", e),
        }

        let state = responder.published_state();
        if state.response != last_response {
            last_response = state.response.clone();

            if json {
                println!("{}", serde_json::to_string(&state)?);
            } else {
                Output::response(&state.response);
                for (i, source) in state.sources.iter().enumerate() {
                    Output::source(i + 1, source);
                }
                Output::research_activity(&responder.research_activity());
                if !state.insights.is_empty() {
                    Output::insights(&state.insights);
                }
            }
        }
    }

    loop_task.abort();
    if !json {
        Output::success("Stopped.");
    }
    Ok(())
}
