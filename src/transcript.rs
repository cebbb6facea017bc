//! Shared transcript state and change signaling.
//!
//! The transcript is an append-only text blob owned by whatever produces it
//! (an STT layer, a file tail, a test). The responder only ever reads it and
//! reacts to the change signal. [`tokio::sync::Notify`] gives the signal
//! single-slot semantics: signals raised while the responder is mid-cycle
//! coalesce into one stored permit, and each wait consumes exactly one
//! permit, so a change is neither lost nor processed twice.

use std::sync::RwLock;
use tokio::sync::Notify;

/// Shared transcript with a change-notification signal.
#[derive(Default)]
pub struct TranscriptFeed {
    transcript: RwLock<String>,
    changed: Notify,
}

impl TranscriptFeed {
    /// Create an empty feed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current transcript text.
    pub fn transcript(&self) -> String {
        self.transcript.read().unwrap().clone()
    }

    /// Replace the transcript and raise the change signal if the text differs.
    pub fn replace(&self, text: String) {
        {
            let mut transcript = self.transcript.write().unwrap();
            if *transcript == text {
                return;
            }
            *transcript = text;
        }
        self.changed.notify_one();
    }

    /// Append text to the transcript and raise the change signal.
    pub fn append(&self, text: &str) {
        {
            let mut transcript = self.transcript.write().unwrap();
            if !transcript.is_empty() && !transcript.ends_with('\n') {
                transcript.push('\n');
            }
            transcript.push_str(text);
        }
        self.changed.notify_one();
    }

    /// Clear the transcript without raising the change signal.
    pub fn clear(&self) {
        self.transcript.write().unwrap().clear();
    }

    /// Wait until the change signal is raised, consuming one stored permit.
    pub async fn changed(&self) {
        self.changed.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_replace_signals_change() {
        let feed = TranscriptFeed::new();
        feed.replace("hello there".to_string());

        tokio::time::timeout(Duration::from_millis(50), feed.changed())
            .await
            .expect("change signal should already be set");
        assert_eq!(feed.transcript(), "hello there");
    }

    #[tokio::test]
    async fn test_identical_replace_does_not_signal() {
        let feed = TranscriptFeed::new();
        feed.replace("same".to_string());
        feed.changed().await;

        feed.replace("same".to_string());
        let waited = tokio::time::timeout(Duration::from_millis(50), feed.changed()).await;
        assert!(waited.is_err(), "no new signal expected for unchanged text");
    }

    #[tokio::test]
    async fn test_signals_coalesce_into_one_permit() {
        let feed = TranscriptFeed::new();
        feed.replace("one".to_string());
        feed.replace("two".to_string());
        feed.replace("three".to_string());

        feed.changed().await;
        let waited = tokio::time::timeout(Duration::from_millis(50), feed.changed()).await;
        assert!(waited.is_err(), "multiple sets consume as a single permit");
    }

    #[tokio::test]
    async fn test_append_adds_newline_between_lines() {
        let feed = TranscriptFeed::new();
        feed.append("Speaker: hello");
        feed.append("You: hi");
        assert_eq!(feed.transcript(), "Speaker: hello\nYou: hi");
    }

    #[tokio::test]
    async fn test_clear_empties_without_signaling() {
        let feed = TranscriptFeed::new();
        feed.replace("something".to_string());
        feed.changed().await;

        feed.clear();
        assert_eq!(feed.transcript(), "");
        let waited = tokio::time::timeout(Duration::from_millis(50), feed.changed()).await;
        assert!(waited.is_err(), "clear must not raise the change signal");
    }
}
