//! # pitchdeck-insights
//!
//! Turn a pitch deck (PDF or PPTX) into a multi-section investment-analysis
//! report using an LLM and a couple of web lookups.
//!
//! ## Pipeline Overview
//!
//! ```text
//! deck
//!  │
//!  ├─ 1. Input    validate path, extension and magic bytes
//!  ├─ 2. Extract  raw text via pdfium (PDF) or zip + quick-xml (PPTX)
//!  ├─ 3. Name     one completion over the first 3000 chars → company name
//!  ├─ 4. Context  DuckDuckGo profile + news headlines (best effort)
//!  ├─ 5. Topics   one completion per catalog topic (11 by default)
//!  └─ 6. Output   ordered report → markdown file / JSON
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pitchdeck_insights::{analyze, AnalysisConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential read from OPENROUTER_API_KEY
//!     let config = AnalysisConfig::default();
//!     let report = analyze("deck.pdf", &config).await?;
//!     println!("{}", report.to_markdown());
//!     Ok(())
//! }
//! ```
//!
//! ## Bring your own collaborators
//!
//! [`enrich()`] and [`analyze_with`] take a [`CompletionClient`] and an
//! [`IntelligenceSource`] as trait objects. Use [`NoIntelligence`] to skip
//! the web lookups entirely.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pitchdeck` binary (clap + anyhow + indicatif + tracing-subscriber + dotenvy) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pitchdeck-insights = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod enrich;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod report;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze, analyze_sync, analyze_to_file, analyze_with, extract_deck};
pub use config::{resolve_api_key, AnalysisConfig, AnalysisConfigBuilder, FileConfig};
pub use enrich::{enrich, EnrichmentContext};
pub use error::{CompletionError, InsightsError};
pub use pipeline::extract::{DeckData, DeckSource};
pub use pipeline::llm::{CompletionClient, OpenRouterClient};
pub use pipeline::web::{DuckDuckGoGatherer, IntelligenceSource, NoIntelligence, Snippet};
pub use progress::{EnrichmentProgressCallback, NoopProgressCallback, ProgressCallback};
pub use prompts::{default_topics, AnalysisTopic, COMPANY_NAME_KEY};
pub use report::{output_filename, render_markdown, write_report, EnrichedReport, ReportSection};
