//! CLI output formatting utilities.

use crate::insights::{ActionItem, ConversationInsights, Priority};
use crate::research::{ResearchActivity, Source};
use console::style;

/// How many key topics the summary shows.
const TOPIC_DISPLAY_LIMIT: usize = 5;

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print the published response.
    pub fn response(text: &str) {
        println!("\n{} {}", style("RESPONSE").green().bold(), style(">").green());
        println!("  {}", text);
    }

    /// Print a numbered source line.
    pub fn source(index: usize, source: &Source) {
        println!(
            "  [{}] {} {}",
            index,
            style(&source.title).bold(),
            style(&source.url).dim()
        );
        println!("      {}", snippet_preview(&source.snippet, 150));
    }

    /// Print the research activity panel.
    pub fn research_activity(activity: &ResearchActivity) {
        if !activity.active_searches.is_empty() {
            println!("{}", style("Currently researching:").cyan());
            for query in &activity.active_searches {
                println!("  -> {}", query);
            }
        }
        if !activity.recent_searches.is_empty() {
            println!("{}", style("Recent searches:").cyan());
            for query in &activity.recent_searches {
                println!("  * {}", query);
            }
        }
    }

    /// Print the full insights summary.
    pub fn insights(insights: &ConversationInsights) {
        println!("\n{}", style("CONVERSATION INSIGHTS").bold().underlined());
        print!("{}", insights_summary(insights));
    }
}

/// Render insights as the four-section text summary.
pub fn insights_summary(insights: &ConversationInsights) -> String {
    let mut summary = String::new();

    summary.push_str("Key topics:\n");
    push_list(
        &mut summary,
        insights.key_topics.iter().take(TOPIC_DISPLAY_LIMIT),
    );

    summary.push_str("Decisions made:\n");
    push_list(&mut summary, insights.decisions_made.iter());

    summary.push_str("Open questions:\n");
    push_list(&mut summary, insights.questions_raised.iter());

    summary.push_str("Action items:\n");
    if insights.action_items.is_empty() {
        summary.push_str("  (none yet)\n");
    } else {
        for item in &insights.action_items {
            summary.push_str(&format!("  {}\n", action_item_line(item)));
        }
    }

    summary
}

fn push_list<'a>(summary: &mut String, items: impl Iterator<Item = &'a String>) {
    let mut any = false;
    for item in items {
        summary.push_str(&format!("  * {}\n", item));
        any = true;
    }
    if !any {
        summary.push_str("  (none yet)\n");
    }
}

/// One-line rendering of an action item.
fn action_item_line(item: &ActionItem) -> String {
    let status = if item.completed { "[x]" } else { "[ ]" };
    let priority = match item.priority {
        Priority::High => "!",
        Priority::Medium => "-",
        Priority::Low => ".",
    };
    format!("{} {} {} ({})", status, priority, item.text, item.assigned_to)
}

/// Truncate a snippet for terminal display.
fn snippet_preview(snippet: &str, max_len: usize) -> String {
    let flattened = snippet.replace('\n', " ");
    match flattened.char_indices().nth(max_len) {
        Some((idx, _)) => format!("{}...", &flattened[..idx]),
        None => flattened,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insights_summary_empty_sections() {
        let summary = insights_summary(&ConversationInsights::default());
        assert!(summary.contains("Key topics:\n  (none yet)"));
        assert!(summary.contains("Action items:\n  (none yet)"));
    }

    #[test]
    fn test_insights_summary_caps_topics_at_five() {
        let insights = ConversationInsights {
            key_topics: (0..8).map(|i| format!("topic {}", i)).collect(),
            ..Default::default()
        };
        let summary = insights_summary(&insights);
        assert!(summary.contains("topic 4"));
        assert!(!summary.contains("topic 5"));
    }

    #[test]
    fn test_action_item_line() {
        let item = ActionItem::new(
            "Send the report".to_string(),
            Priority::High,
            "Alice".to_string(),
        );
        assert_eq!(action_item_line(&item), "[ ] ! Send the report (Alice)");
    }

    #[test]
    fn test_snippet_preview_truncates() {
        let long = "x".repeat(200);
        let preview = snippet_preview(&long, 150);
        assert_eq!(preview.chars().count(), 153);
        assert!(preview.ends_with("..."));
    }
}
