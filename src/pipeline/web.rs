//! External intelligence: best-effort web snippets about a company.
//!
//! Two lookups per run, a general profile and recent news, each one GET
//! against the DuckDuckGo HTML endpoint. The result titles (`a.result__a`)
//! are the snippet.
//!
//! Nothing here can fail the enrichment. Transport errors, non-2xx statuses
//! and unreadable bodies all degrade to [`Snippet::empty`], and that is
//! encoded in the signature: the lookups return a [`Snippet`], not a
//! `Result`.

use crate::config::AnalysisConfig;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::header::USER_AGENT;
use scraper::{Html, Selector};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Query suffix for the general profile lookup.
pub const PROFILE_SUFFIX: &str = "company";

/// Query suffix for the recent-news lookup.
pub const NEWS_SUFFIX: &str = "company news";

static RESULT_TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("a.result__a").unwrap());

/// Plain-text search snippet; possibly empty, never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snippet(String);

impl Snippet {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The snippet used whenever a lookup fails.
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Snippet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of external context for a company name.
#[async_trait]
pub trait IntelligenceSource: Send + Sync {
    /// Up to `limit` general-profile result titles, newline-joined.
    async fn fetch_profile(&self, company_name: &str, limit: usize) -> Snippet;

    /// Up to `limit` news result titles, newline-joined.
    async fn fetch_news(&self, company_name: &str, limit: usize) -> Snippet;
}

/// A source that never has anything to say. Useful offline.
pub struct NoIntelligence;

#[async_trait]
impl IntelligenceSource for NoIntelligence {
    async fn fetch_profile(&self, _company_name: &str, _limit: usize) -> Snippet {
        Snippet::empty()
    }

    async fn fetch_news(&self, _company_name: &str, _limit: usize) -> Snippet {
        Snippet::empty()
    }
}

/// Scrapes result titles from the DuckDuckGo HTML endpoint.
pub struct DuckDuckGoGatherer {
    http: reqwest::Client,
    endpoint: String,
    user_agent: String,
}

impl DuckDuckGoGatherer {
    /// Build a gatherer from the search settings in `config`.
    ///
    /// Falls back to a default client if the configured one cannot be built;
    /// a broken gatherer still must not stop the analysis.
    pub fn new(config: &AnalysisConfig) -> Self {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.search_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().unwrap_or_else(|e| {
            warn!("Search client setup failed ({e}); using defaults");
            reqwest::Client::new()
        });

        Self {
            http,
            endpoint: config.search_endpoint.clone(),
            user_agent: config.user_agent.clone(),
        }
    }

    async fn search(&self, query: &str, limit: usize) -> Snippet {
        let response = match self
            .http
            .get(&self.endpoint)
            .query(&[("q", query)])
            .header(USER_AGENT, self.user_agent.as_str())
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("Search '{}' failed: {}", query, e);
                return Snippet::empty();
            }
        };

        if !response.status().is_success() {
            warn!("Search '{}' returned HTTP {}", query, response.status());
            return Snippet::empty();
        }

        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                warn!("Search '{}' body unreadable: {}", query, e);
                return Snippet::empty();
            }
        };

        let snippet = extract_result_titles(&body, limit);
        debug!("Search '{}': {} chars of snippet", query, snippet.as_str().len());
        snippet
    }
}

#[async_trait]
impl IntelligenceSource for DuckDuckGoGatherer {
    async fn fetch_profile(&self, company_name: &str, limit: usize) -> Snippet {
        self.search(&search_query(company_name, PROFILE_SUFFIX), limit)
            .await
    }

    async fn fetch_news(&self, company_name: &str, limit: usize) -> Snippet {
        self.search(&search_query(company_name, NEWS_SUFFIX), limit).await
    }
}

/// `"<company> <suffix>"`.
pub fn search_query(company_name: &str, suffix: &str) -> String {
    format!("{company_name} {suffix}")
}

/// Collect the text of the first `limit` result-title anchors.
///
/// Whitespace inside a title is collapsed; titles with no text are dropped.
pub fn extract_result_titles(html: &str, limit: usize) -> Snippet {
    let document = Html::parse_document(html);
    let titles: Vec<String> = document
        .select(&RESULT_TITLE)
        .map(|a| a.text().collect::<String>())
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
        .take(limit)
        .collect();
    Snippet::new(titles.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_PAGE: &str = r#"<html><body>
        <div class="result"><h2><a class="result__a" href="/l/?u=1">Acme Corp — <b>Flying</b> Taxis</a></h2>
            <a class="result__snippet">ignored snippet</a></div>
        <div class="result"><h2><a class="result__a" href="/l/?u=2">Acme raises seed</a></h2></div>
        <div class="result"><h2><a class="result__a" href="/l/?u=3">Third result</a></h2></div>
    </body></html>"#;

    #[test]
    fn titles_are_limited_and_joined() {
        let s = extract_result_titles(RESULTS_PAGE, 2);
        assert_eq!(s.as_str(), "Acme Corp — Flying Taxis\nAcme raises seed");
    }

    #[test]
    fn limit_larger_than_results() {
        let s = extract_result_titles(RESULTS_PAGE, 10);
        assert_eq!(s.as_str().lines().count(), 3);
    }

    #[test]
    fn blank_titles_do_not_count_toward_limit() {
        let html = r#"<html><body>
            <a class="result__a" href="/l/?u=0"> <img src="x.png"> </a>
            <a class="result__a" href="/l/?u=1">First</a>
            <a class="result__a" href="/l/?u=2">Second</a>
        </body></html>"#;
        assert_eq!(extract_result_titles(html, 2).as_str(), "First
Second");
    }

    #[test]
    fn no_results_is_empty() {
        assert!(extract_result_titles("<html><body>No results.</body></html>", 2).is_empty());
        assert!(extract_result_titles("", 2).is_empty());
        assert!(extract_result_titles(RESULTS_PAGE, 0).is_empty());
    }

    #[test]
    fn query_suffixes() {
        assert_eq!(search_query("Acme Corp", PROFILE_SUFFIX), "Acme Corp company");
        assert_eq!(search_query("Acme Corp", NEWS_SUFFIX), "Acme Corp company news");
    }

    #[tokio::test]
    async fn no_intelligence_is_always_empty() {
        let src = NoIntelligence;
        assert!(src.fetch_profile("Acme", 2).await.is_empty());
        assert!(src.fetch_news("Acme", 2).await.is_empty());
    }
}
