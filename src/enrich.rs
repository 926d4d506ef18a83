//! Enrichment orchestrator: raw deck text → [`EnrichedReport`].
//!
//! ## Sequence
//!
//! ```text
//! deck text
//!  │
//!  ├─ 1. Name      first N chars → completion → first line = company name
//!  ├─ 2. Context   web profile + recent news (soft-fail) → EnrichmentContext
//!  ├─ 3. Topics    one completion per catalog topic, same shared context
//!  └─ 4. Assemble  "Company Name" first, then topics in catalog order
//! ```
//!
//! Any completion error in steps 1 or 3 aborts the run and is returned
//! unmodified; there is no partial report. Web lookups can't fail (see
//! [`crate::pipeline::web`]).
//!
//! With `concurrency > 1` the topic pass runs through a bounded
//! `buffer_unordered` pool keyed by catalog index and is reassembled by
//! index, never by completion order.

use crate::config::AnalysisConfig;
use crate::error::CompletionError;
use crate::pipeline::extract::DeckData;
use crate::pipeline::llm::CompletionClient;
use crate::pipeline::postprocess;
use crate::pipeline::web::{IntelligenceSource, Snippet};
use crate::prompts::{
    combined_context, company_name_prompt, parse_company_name, topic_prompt, AnalysisTopic,
};
use crate::report::EnrichedReport;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Everything every topic prompt reads. Built once per run, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentContext {
    company_name: String,
    deck_text: String,
    web_profile: Snippet,
    news_snippet: Snippet,
    combined: String,
}

impl EnrichmentContext {
    pub fn new(
        company_name: impl Into<String>,
        deck_text: impl Into<String>,
        web_profile: Snippet,
        news_snippet: Snippet,
    ) -> Self {
        let company_name = company_name.into();
        let deck_text = deck_text.into();
        let combined = combined_context(&deck_text, web_profile.as_str(), news_snippet.as_str());
        Self {
            company_name,
            deck_text,
            web_profile,
            news_snippet,
            combined,
        }
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn deck_text(&self) -> &str {
        &self.deck_text
    }

    pub fn web_profile(&self) -> &Snippet {
        &self.web_profile
    }

    pub fn news_snippet(&self) -> &Snippet {
        &self.news_snippet
    }

    /// Deck text, web profile and news under their labels, in that order.
    pub fn combined(&self) -> &str {
        &self.combined
    }
}

/// Ask the model for the company name.
///
/// Only the first `config.name_context_chars` characters of the deck are
/// sent. The first line of the answer is taken as-is; it is a heuristic,
/// not a validated name.
pub async fn extract_company_name(
    client: &dyn CompletionClient,
    raw_text: &str,
    config: &AnalysisConfig,
) -> Result<String, CompletionError> {
    let prompt = company_name_prompt(raw_text, config.name_context_chars);
    let response = client.complete(&prompt).await?;
    Ok(parse_company_name(&response))
}

/// Look the company up on the web and freeze the shared context.
///
/// The two lookups run one after the other.
pub async fn gather_context(
    intel: &dyn IntelligenceSource,
    company_name: &str,
    deck_text: &str,
    snippet_limit: usize,
) -> EnrichmentContext {
    let web_profile = intel.fetch_profile(company_name, snippet_limit).await;
    let news_snippet = intel.fetch_news(company_name, snippet_limit).await;
    debug!(
        "Context for '{}': profile {} chars, news {} chars",
        company_name,
        web_profile.as_str().len(),
        news_snippet.as_str().len()
    );
    EnrichmentContext::new(company_name, deck_text, web_profile, news_snippet)
}

/// Run the full enrichment for one deck.
///
/// # Errors
/// The first [`CompletionError`] from the name or any topic completion,
/// unmodified. An empty topic answer is reported as
/// [`CompletionError::ProtocolViolation`].
pub async fn enrich(
    deck: &DeckData,
    client: &dyn CompletionClient,
    intel: &dyn IntelligenceSource,
    config: &AnalysisConfig,
) -> Result<EnrichedReport, CompletionError> {
    let start = Instant::now();

    // ── Step 1: Company name ─────────────────────────────────────────────
    let company_name = extract_company_name(client, &deck.raw_text, config).await?;
    info!("Company identified as '{}'", company_name);

    // ── Step 2: External context ─────────────────────────────────────────
    let context = gather_context(intel, &company_name, &deck.raw_text, config.snippet_limit).await;

    // ── Step 3: Topic pass ───────────────────────────────────────────────
    let total = config.topics.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_enrichment_start(&company_name, total);
    }

    let sections = if config.concurrency <= 1 {
        topic_pass_sequential(client, &context, config).await?
    } else {
        topic_pass_concurrent(client, &context, config).await?
    };

    // ── Step 4: Assemble ─────────────────────────────────────────────────
    let mut report = EnrichedReport::with_company_name(company_name);
    for (topic, content) in config.topics.iter().zip(sections) {
        report.push_section(topic.label.clone(), content);
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_enrichment_complete(total);
    }
    info!(
        "Enrichment complete: {} sections in {}ms",
        report.len(),
        start.elapsed().as_millis()
    );

    Ok(report)
}

/// Topics one after another; section `i` belongs to `config.topics[i]`.
async fn topic_pass_sequential(
    client: &dyn CompletionClient,
    context: &EnrichmentContext,
    config: &AnalysisConfig,
) -> Result<Vec<String>, CompletionError> {
    let mut sections = Vec::with_capacity(config.topics.len());
    for (idx, topic) in config.topics.iter().enumerate() {
        sections.push(run_topic(client, idx, topic, context, config).await?);
    }
    Ok(sections)
}

/// Up to `config.concurrency` topics in flight, reassembled by catalog index.
async fn topic_pass_concurrent(
    client: &dyn CompletionClient,
    context: &EnrichmentContext,
    config: &AnalysisConfig,
) -> Result<Vec<String>, CompletionError> {
    let mut indexed: Vec<(usize, String)> = stream::iter(config.topics.iter().enumerate())
        .map(|(idx, topic)| async move {
            run_topic(client, idx, topic, context, config)
                .await
                .map(|content| (idx, content))
        })
        .buffer_unordered(config.concurrency)
        .try_collect()
        .await?;

    indexed.sort_by_key(|(idx, _)| *idx);
    Ok(indexed.into_iter().map(|(_, content)| content).collect())
}

/// One topic: prompt, complete, trim (or clean), report progress.
async fn run_topic(
    client: &dyn CompletionClient,
    idx: usize,
    topic: &AnalysisTopic,
    context: &EnrichmentContext,
    config: &AnalysisConfig,
) -> Result<String, CompletionError> {
    let total = config.topics.len();
    let start = Instant::now();
    if let Some(ref cb) = config.progress_callback {
        cb.on_topic_start(idx, total, &topic.label);
    }

    let prompt = topic_prompt(&topic.instruction, context.combined());
    let outcome = client.complete(&prompt).await.and_then(|raw| {
        let content = if config.clean_sections {
            postprocess::clean_section(&raw)
        } else {
            raw.trim().to_string()
        };
        if content.is_empty() {
            Err(CompletionError::ProtocolViolation {
                detail: format!("empty completion for topic '{}'", topic.label),
            })
        } else {
            Ok(content)
        }
    });

    match outcome {
        Ok(content) => {
            debug!(
                "Topic {}/{} '{}': {} chars in {:?}",
                idx + 1,
                total,
                topic.label,
                content.len(),
                start.elapsed()
            );
            if let Some(ref cb) = config.progress_callback {
                cb.on_topic_complete(idx, total, &topic.label, content.len());
            }
            Ok(content)
        }
        Err(e) => {
            warn!("Topic {}/{} '{}' failed: {}", idx + 1, total, topic.label, e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_topic_error(idx, total, &topic.label, &e.to_string());
            }
            Err(e)
        }
    }
}
