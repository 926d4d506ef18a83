//! Prompts and the analysis-topic catalog.
//!
//! Every string sent to the completion endpoint is built here, so prompt
//! changes never touch the sequencing in [`crate::enrich`] and unit tests can
//! inspect prompts without a network.
//!
//! The catalog is data: [`DEFAULT_TOPICS`] is an ordered list of
//! `(label, instruction)` records consumed by one generic loop. Callers can
//! substitute their own catalog through
//! [`crate::config::AnalysisConfigBuilder::topics`].

use serde::{Deserialize, Serialize};

/// Key of the mandatory first report entry.
pub const COMPANY_NAME_KEY: &str = "Company Name";

/// Directive appended to every topic prompt.
pub const MARKDOWN_DIRECTIVE: &str = "Write output as markdown.";

/// One entry of the analysis catalog.
///
/// `label` doubles as the section key in the report and must be unique
/// within a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisTopic {
    pub label: String,
    pub instruction: String,
}

impl AnalysisTopic {
    pub fn new(label: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            instruction: instruction.into(),
        }
    }
}

/// The fixed 11-topic catalog, in report order.
pub const DEFAULT_TOPICS: [(&str, &str); 11] = [
    (
        "Executive Summary",
        "Give a 3-5 line summary for a VC on this company.",
    ),
    (
        "Team",
        "Summarize team/founders. If LinkedIn/track record is available, add it or infer plausible founder profiles.",
    ),
    (
        "Product",
        "Describe product/technology and USP. Make it investor-focused.",
    ),
    (
        "Market",
        "Estimate market size, main competitors, TAM/SAM/SOM if possible.",
    ),
    (
        "Traction & Metrics",
        "Extract key metrics, growth stats, and highlight any recent news. Infer plausible stats if missing.",
    ),
    (
        "Funding & Financials",
        "Current round, past funding, cap table signals. Guess if not stated.",
    ),
    (
        "Competitive Landscape Map",
        "Create a Mermaid markdown chart that shows this company and at least 3 main competitors, indicating placement on a feature or market axis. Guess if insufficient data.",
    ),
    (
        "Sentiment & Hype",
        "Analyze the language for hype and sentiment. Point out risky or exaggerated claims from an investor perspective.",
    ),
    (
        "AI Investment Signal Score",
        "Give a score (1-10) for Product, Team, Market, and Investment Fit. Justify each briefly as if you were an AI analyst for an early-stage fund.",
    ),
    (
        "Risks & Unique Strengths",
        "List any red flags and unique strengths. If not mentioned, infer possible ones.",
    ),
    (
        "Missing Info & Diligence Questions",
        "What important due diligence questions are left open? What data gaps should an investor clarify? Provide 3+ questions.",
    ),
];

/// Owned copy of [`DEFAULT_TOPICS`].
pub fn default_topics() -> Vec<AnalysisTopic> {
    DEFAULT_TOPICS
        .iter()
        .map(|(label, instruction)| AnalysisTopic::new(*label, *instruction))
        .collect()
}

/// Return at most the first `max_chars` characters of `text`.
///
/// Cuts on a char boundary, so multi-byte text never panics.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Build the company-name extraction prompt from the head of the deck text.
pub fn company_name_prompt(raw_text: &str, max_chars: usize) -> String {
    format!(
        "Extract the full company name from this pitch deck. If absent, guess best. Output only the name:\n\n{}",
        truncate_chars(raw_text, max_chars)
    )
}

/// Pick the company name out of the model's answer.
///
/// Takes the first line only, trimmed. Models like to pad their answer with
/// an explanation on the following lines. The line is not validated further.
pub fn parse_company_name(response: &str) -> String {
    response
        .trim()
        .lines()
        .next()
        .unwrap_or("")
        .trim()
        .to_string()
}

/// Build the combined context block shared by every topic prompt.
///
/// Sections always appear in this order: deck text, web profile, recent news.
pub fn combined_context(deck_text: &str, web_profile: &str, news_snippet: &str) -> String {
    format!(
        "**Pitch Deck Text:**\n{deck_text}\n\n\
         **Web Profile Info (DuckDuckGo summary):**\n{web_profile}\n\n\
         **Recent News (DuckDuckGo):**\n{news_snippet}"
    )
}

/// Build the prompt for one topic.
pub fn topic_prompt(instruction: &str, context: &str) -> String {
    format!("{instruction}\n\nContext:\n{context}\n\n{MARKDOWN_DIRECTIVE}")
}
