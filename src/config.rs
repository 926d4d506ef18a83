//! Configuration types for pitch-deck analysis.
//!
//! All analysis behaviour is controlled through [`AnalysisConfig`], built via
//! its [`AnalysisConfigBuilder`]. The optional on-disk `config.yaml` is
//! modelled separately as [`FileConfig`] and merged by the CLI.
//!
//! The API credential is not a config field: it is resolved by
//! [`resolve_api_key`] and handed to
//! [`crate::pipeline::llm::OpenRouterClient::new`], so tests can supply a fake
//! key without touching the process environment.

use crate::error::InsightsError;
use crate::progress::ProgressCallback;
use crate::prompts::{default_topics, AnalysisTopic, COMPANY_NAME_KEY};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Environment variable holding the OpenRouter bearer token.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Default chat model identifier.
pub const DEFAULT_MODEL: &str = "deepseek/deepseek-chat";

/// Default OpenRouter API base.
pub const DEFAULT_API_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default search surface (HTML-rendering endpoint).
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// Resolve the completion API credential from the process environment.
///
/// An empty value counts as absent.
pub fn resolve_api_key() -> Option<String> {
    std::env::var(API_KEY_ENV)
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}

/// Configuration for one enrichment run.
///
/// # Example
/// ```rust
/// use pitchdeck_insights::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .model("openai/gpt-4o-mini")
///     .concurrency(4)
///     .build()
///     .unwrap();
/// assert_eq!(config.topics.len(), 11);
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// Chat model identifier sent with every completion request.
    pub model: String,

    /// Base URL of the chat-completion API; `/chat/completions` is appended.
    pub api_base_url: String,

    /// Per-completion timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// How many leading characters of the deck text the name prompt sees. Default: 3000.
    ///
    /// The cover and intro slides almost always carry the name; the rest of
    /// the deck only dilutes the signal and costs tokens.
    pub name_context_chars: usize,

    /// Maximum search-result titles kept per snippet. Default: 2.
    pub snippet_limit: usize,

    /// Search surface queried for the web profile and news snippets.
    pub search_endpoint: String,

    /// User-Agent header sent to the search surface.
    pub user_agent: String,

    /// Optional timeout for search requests. Default: none (HTTP client default).
    pub search_timeout_secs: Option<u64>,

    /// Number of topic completions in flight at once. Default: 1 (sequential).
    ///
    /// Topics only read the shared context, so they can overlap. The report
    /// keeps catalog order whatever the completion order.
    pub concurrency: usize,

    /// Run the section cleanup rules on every topic answer instead of only
    /// trimming it. Default: false.
    pub clean_sections: bool,

    /// Ordered topic catalog. Default: the 11 built-in topics.
    pub topics: Vec<AnalysisTopic>,

    /// Receives per-topic progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_timeout_secs: 60,
            name_context_chars: 3000,
            snippet_limit: 2,
            search_endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            search_timeout_secs: None,
            concurrency: 1,
            clean_sections: false,
            topics: default_topics(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("model", &self.model)
            .field("api_base_url", &self.api_base_url)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("name_context_chars", &self.name_context_chars)
            .field("snippet_limit", &self.snippet_limit)
            .field("search_endpoint", &self.search_endpoint)
            .field("search_timeout_secs", &self.search_timeout_secs)
            .field("concurrency", &self.concurrency)
            .field("clean_sections", &self.clean_sections)
            .field("topics", &self.topics.len())
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn EnrichmentProgressCallback>"),
            )
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AnalysisConfig`].
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn name_context_chars(mut self, n: usize) -> Self {
        self.config.name_context_chars = n;
        self
    }

    pub fn snippet_limit(mut self, n: usize) -> Self {
        self.config.snippet_limit = n;
        self
    }

    pub fn search_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.search_endpoint = url.into();
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn search_timeout_secs(mut self, secs: u64) -> Self {
        self.config.search_timeout_secs = Some(secs);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn clean_sections(mut self, v: bool) -> Self {
        self.config.clean_sections = v;
        self
    }

    pub fn topics(mut self, topics: Vec<AnalysisTopic>) -> Self {
        self.config.topics = topics;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, InsightsError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(InsightsError::InvalidConfig("Model must not be empty".into()));
        }
        if c.concurrency == 0 {
            return Err(InsightsError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if c.name_context_chars == 0 {
            return Err(InsightsError::InvalidConfig(
                "Name context window must be ≥ 1 character".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(InsightsError::InvalidConfig("API timeout must be ≥ 1s".into()));
        }
        if c.topics.is_empty() {
            return Err(InsightsError::InvalidConfig("Topic catalog is empty".into()));
        }
        let mut seen = HashSet::new();
        for topic in &c.topics {
            if topic.label == COMPANY_NAME_KEY {
                return Err(InsightsError::InvalidConfig(format!(
                    "Topic label '{COMPANY_NAME_KEY}' is reserved"
                )));
            }
            if !seen.insert(topic.label.as_str()) {
                return Err(InsightsError::InvalidConfig(format!(
                    "Duplicate topic label '{}'",
                    topic.label
                )));
            }
        }
        Ok(self.config)
    }
}

// ── config.yaml ──────────────────────────────────────────────────────────

/// Optional on-disk settings (`config.yaml`).
///
/// ```yaml
/// llm_model: deepseek/deepseek-chat
/// output_file: output.md
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    /// Chat model identifier.
    #[serde(default)]
    pub llm_model: Option<String>,

    /// Output file template; only its extension is used for generated names.
    #[serde(default)]
    pub output_file: Option<String>,
}

impl FileConfig {
    /// Parse a YAML document. An empty document yields the defaults.
    pub fn from_yaml(src: &str) -> Result<Self, InsightsError> {
        if src.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(src)
            .map_err(|e| InsightsError::InvalidConfig(format!("config.yaml: {e}")))
    }

    /// Load `path`.
    ///
    /// When `required` is false a missing file yields the defaults; any other
    /// read or parse failure is still an error.
    pub fn load(path: &Path, required: bool) -> Result<Self, InsightsError> {
        match std::fs::read_to_string(path) {
            Ok(src) => Self::from_yaml(&src),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
                Ok(Self::default())
            }
            Err(e) => Err(InsightsError::InvalidConfig(format!(
                "cannot read {}: {e}",
                path.display()
            ))),
        }
    }
}
