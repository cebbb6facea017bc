//! Prompt templates for Svar.
//!
//! Prompts can be customized by placing TOML files in the custom prompts
//! directory. Behavioral constants embedded in the defaults (the `NONE`
//! sentinel, the section labels, the square-bracket answer convention) are
//! load-bearing: the parsers on the other side expect them.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub response: ResponsePrompts,
    pub research: ResearchPrompts,
    pub insights: InsightPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for response generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponsePrompts {
    /// Plain conversational template, used when no research is available.
    pub plain: String,
    /// Research-augmented template, used when the cycle produced sources.
    pub research: String,
}

impl Default for ResponsePrompts {
    fn default() -> Self {
        Self {
            plain: r#"You are an assistant helping the user (microphone) answer questions being asked by the speaker. Your goal is to provide natural, conversational responses that the user can read aloud regardless of how technical the question might be.

Here is the conversation transcript:
{{transcript}}

Please provide a helpful response that the user can read verbatim to answer the speaker's question. Your response should:
1. Sound natural and conversational
2. Be appropriately detailed but concise enough to be spoken
3. Address the question directly even if the transcription is imperfect
4. Maintain context from previous exchanges for any follow-up questions

Give your response in square brackets. DO NOT ask for clarification or suggest that the user ask for repetition. Simply provide the best possible answer based on available information."#.to_string(),

            research: r#"You are an assistant helping the user (microphone) answer questions being asked by the speaker. You have access to real-time research to provide accurate, well-informed responses.

Here is the conversation transcript:
{{transcript}}

Researched topics: {{queries}}

RESEARCH FINDINGS:
{{findings}}

Using the research findings above, provide a helpful, ACCURATE response that the user can read verbatim. Your response should:
1. Sound natural and conversational
2. Be factually accurate and cite the research when relevant (e.g., "According to recent information...")
3. Be concise enough to be spoken aloud
4. Address the question directly with authoritative information
5. Maintain context from previous exchanges

IMPORTANT: Base your answer on the research findings provided. If the research doesn't fully answer the question, acknowledge this naturally.

Give your response in square brackets. Provide the best possible answer based on the research and conversation context."#.to_string(),
        }
    }
}

/// Prompts for research (query extraction and synthesis).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchPrompts {
    /// Instruction for extracting search queries from the conversation.
    pub query_extraction: String,
    /// Instruction for synthesizing researched prose for a single query.
    pub synthesis: String,
}

impl Default for ResearchPrompts {
    fn default() -> Self {
        Self {
            query_extraction: r#"Analyze this conversation and identify what topics need real-time research to provide an accurate, helpful response.

Conversation:
{{transcript}}

Previous context:
{{context}}

Extract 0-3 specific search queries that would help answer questions or provide accurate information.
Only suggest searches for:
- Factual claims that need verification
- Technical topics that need current/accurate information
- Specific questions about products, companies, or recent events
- Complex topics that benefit from authoritative sources

Return ONLY the search queries, one per line. If no research is needed, return "NONE".
Be specific and focused. Examples:
- "latest Python 3.12 features"
- "GPT-4 API pricing 2024"
- "difference between REST and GraphQL""#.to_string(),

            synthesis: r#"Research the following topic and provide authoritative information with sources:

Query: {{query}}

Provide a comprehensive answer based on reliable sources. Include:
1. Key facts and findings
2. Important context
3. Recent developments (if applicable)

Format your response as factual information that could be cited."#.to_string(),
        }
    }
}

/// Prompts for insight extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightPrompts {
    pub extraction: String,
}

impl Default for InsightPrompts {
    fn default() -> Self {
        Self {
            extraction: r#"Analyze this conversation transcript and extract structured insights:

{{transcript}}

Provide:
1. ACTION ITEMS: Tasks, TODOs, or commitments mentioned (who should do what)
2. KEY TOPICS: Main discussion points (3-5 topics)
3. DECISIONS: Any decisions or conclusions reached
4. QUESTIONS: Unanswered questions or topics needing follow-up

Format your response as:

ACTION ITEMS:
- [Priority: high/medium/low] [Person] Action description
- ...

KEY TOPICS:
- Topic 1
- Topic 2
...

DECISIONS:
- Decision 1
- Decision 2
...

QUESTIONS:
- Question 1
- Question 2
...

Only include items that are clearly present. Use "NONE" for empty sections."#.to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let response_path = custom_path.join("response.toml");
            if response_path.exists() {
                let content = std::fs::read_to_string(&response_path)?;
                prompts.response = toml::from_str(&content)?;
            }

            let research_path = custom_path.join("research.toml");
            if research_path.exists() {
                let content = std::fs::read_to_string(&research_path)?;
                prompts.research = toml::from_str(&content)?;
            }

            let insights_path = custom_path.join("insights.toml");
            if insights_path.exists() {
                let content = std::fs::read_to_string(&insights_path)?;
                prompts.insights = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
