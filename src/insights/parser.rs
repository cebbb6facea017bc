//! Line-oriented parser for the insight-extraction reply.
//!
//! The oracle is instructed to answer with four labeled sections, each a
//! bulleted list with `NONE` marking an empty section. The parser is a small
//! state machine: an exact section header switches the current section, and
//! dash-prefixed lines accumulate into it. Everything else is ignored.

use super::{ActionItem, ConversationInsights, Priority};
use crate::error::{Result, SvarError};
use regex::Regex;
use std::sync::LazyLock;

static PRIORITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[Priority:\s*(high|medium|low)\]").expect("valid priority pattern")
});

static BRACKET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]").expect("valid bracket pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    ActionItems,
    KeyTopics,
    Decisions,
    Questions,
}

fn section_for(line: &str) -> Option<Section> {
    match line {
        "ACTION ITEMS:" => Some(Section::ActionItems),
        "KEY TOPICS:" => Some(Section::KeyTopics),
        "DECISIONS:" => Some(Section::Decisions),
        "QUESTIONS:" => Some(Section::Questions),
        _ => None,
    }
}

/// Parse an insight reply into structured insights.
///
/// Returns a parse error when the reply contains none of the expected
/// section headers; callers keep their previous insights in that case.
pub fn parse_insights(text: &str) -> Result<ConversationInsights> {
    let mut insights = ConversationInsights::default();
    let mut current: Option<Section> = None;
    let mut saw_header = false;

    for line in text.lines() {
        let line = line.trim();

        if let Some(section) = section_for(line) {
            current = Some(section);
            saw_header = true;
            continue;
        }

        let Some(section) = current else { continue };
        if !line.starts_with('-') {
            continue;
        }

        let item = line.trim_start_matches(['-', ' ']);
        if item.is_empty() || item.eq_ignore_ascii_case("NONE") {
            continue;
        }

        match section {
            Section::ActionItems => {
                if let Some(action) = parse_action_item(item) {
                    insights.action_items.push(action);
                }
            }
            Section::KeyTopics => insights.key_topics.push(item.to_string()),
            Section::Decisions => insights.decisions_made.push(item.to_string()),
            Section::Questions => insights.questions_raised.push(item.to_string()),
        }
    }

    if !saw_header {
        return Err(SvarError::Parse(
            "insight reply contains no recognizable sections".to_string(),
        ));
    }

    Ok(insights)
}

/// Parse a single action-item line.
///
/// Priority comes from a `[Priority: ...]` tag anywhere in the item; the
/// assignee is the first bracketed group that is not the priority tag. All
/// bracketed groups are stripped from the final text, and an item with
/// nothing left is dropped.
fn parse_action_item(item: &str) -> Option<ActionItem> {
    let priority = PRIORITY_RE
        .captures(item)
        .and_then(|caps| caps[1].parse::<Priority>().ok())
        .unwrap_or_default();

    let assigned_to = BRACKET_RE
        .captures_iter(item)
        .map(|caps| caps[1].to_string())
        .find(|group| !group.to_lowercase().contains("priority"))
        .unwrap_or_else(|| "you".to_string());

    let text = BRACKET_RE.replace_all(item, "").trim().to_string();
    if text.is_empty() {
        return None;
    }

    Some(ActionItem::new(text, priority, assigned_to))
}
