//! Top-level entry points: deck path in, enriched report out.
//!
//! [`analyze`] wires the production collaborators (OpenRouter, DuckDuckGo)
//! together; [`analyze_with`] takes them as trait objects so callers and
//! tests can substitute their own.

use crate::config::AnalysisConfig;
use crate::enrich;
use crate::error::InsightsError;
use crate::pipeline::extract::{self, DeckData};
use crate::pipeline::input;
use crate::pipeline::llm::{CompletionClient, OpenRouterClient};
use crate::pipeline::web::{DuckDuckGoGatherer, IntelligenceSource};
use crate::report::{self, EnrichedReport};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Validate a deck path and extract its raw text.
///
/// Does not need an API key or network access.
pub async fn extract_deck(input_path: impl AsRef<Path>) -> Result<DeckData, InsightsError> {
    let resolved = input::resolve_input(input_path)?;
    extract::extract_text(&resolved).await
}

/// Analyse a pitch deck with OpenRouter and DuckDuckGo.
///
/// The input is validated before the credential is checked, so a bad path is
/// reported as such even without `OPENROUTER_API_KEY`.
///
/// # Errors
/// - Input errors ([`InsightsError::is_input_error`]) and extraction failures
/// - [`InsightsError::Completion`] wrapping the first completion failure,
///   including a missing credential
pub async fn analyze(
    input_path: impl AsRef<Path>,
    config: &AnalysisConfig,
) -> Result<EnrichedReport, InsightsError> {
    let resolved = input::resolve_input(input_path)?;
    let client = OpenRouterClient::from_env(config)?;
    let intel = DuckDuckGoGatherer::new(config);

    let deck = extract::extract_text(&resolved).await?;
    run(&deck, &client, &intel, config).await
}

/// Analyse a pitch deck with caller-supplied collaborators.
pub async fn analyze_with(
    input_path: impl AsRef<Path>,
    client: &dyn CompletionClient,
    intel: &dyn IntelligenceSource,
    config: &AnalysisConfig,
) -> Result<EnrichedReport, InsightsError> {
    let deck = extract_deck(input_path).await?;
    run(&deck, client, intel, config).await
}

/// Analyse a pitch deck and write the markdown report to `output_path`.
///
/// Nothing is written when the analysis fails.
pub async fn analyze_to_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &AnalysisConfig,
) -> Result<EnrichedReport, InsightsError> {
    let report = analyze(input_path, config).await?;
    report::write_report(&report, output_path.as_ref()).await?;
    info!("Report written to {}", output_path.as_ref().display());
    Ok(report)
}

/// Synchronous wrapper around [`analyze`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_sync(
    input_path: impl AsRef<Path>,
    config: &AnalysisConfig,
) -> Result<EnrichedReport, InsightsError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| InsightsError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(analyze(input_path, config))
}

async fn run(
    deck: &DeckData,
    client: &dyn CompletionClient,
    intel: &dyn IntelligenceSource,
    config: &AnalysisConfig,
) -> Result<EnrichedReport, InsightsError> {
    let start = Instant::now();
    info!(
        "Analysing {:?} deck ({} chars of text)",
        deck.source,
        deck.raw_text.chars().count()
    );
    let report = enrich::enrich(deck, client, intel, config).await?;
    info!("Analysis finished in {}ms", start.elapsed().as_millis());
    Ok(report)
}
