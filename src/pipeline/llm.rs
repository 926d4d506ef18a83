//! Completion client: one free-text prompt in, the generated text out.
//!
//! [`CompletionClient`] is the seam the orchestrator depends on; tests swap
//! in a scripted implementation. [`OpenRouterClient`] is the production
//! transport against an OpenAI-style `/chat/completions` endpoint.
//!
//! The client is stateless and never retries. Every failure is classified
//! into a [`CompletionError`] variant so callers can decide what is worth
//! re-invoking:
//!
//! | Failure | Variant |
//! |---------|---------|
//! | no credential at construction | `MissingCredential` |
//! | timeout / DNS / connection reset | `Transport` |
//! | non-2xx status | `UpstreamRejected` (body logged at `error`) |
//! | 2xx with an unexpected envelope | `ProtocolViolation` |

use crate::config::{resolve_api_key, AnalysisConfig};
use crate::error::CompletionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// Sends a single prompt to a language model.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Return the generated text for `prompt`.
    ///
    /// The prompt is sent as-is; truncation is the caller's job.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Chat-completion client for OpenRouter (or any compatible endpoint).
pub struct OpenRouterClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
    timeout_secs: u64,
}

impl std::fmt::Debug for OpenRouterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterClient")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl OpenRouterClient {
    /// Create a client from an already-resolved credential.
    ///
    /// Fails fast with [`CompletionError::MissingCredential`] when `api_key`
    /// is `None` or blank.
    pub fn new(api_key: Option<String>, config: &AnalysisConfig) -> Result<Self, CompletionError> {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(CompletionError::MissingCredential)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| CompletionError::Transport {
                detail: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            api_key,
            model: config.model.clone(),
            endpoint: format!("{}/chat/completions", config.api_base_url.trim_end_matches('/')),
            timeout_secs: config.api_timeout_secs,
        })
    }

    /// Create a client with the credential from [`resolve_api_key`].
    pub fn from_env(config: &AnalysisConfig) -> Result<Self, CompletionError> {
        Self::new(resolve_api_key(), config)
    }

    /// Model identifier sent with every request.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn transport_error(&self, e: reqwest::Error) -> CompletionError {
        let detail = if e.is_timeout() {
            format!("timed out after {}s", self.timeout_secs)
        } else {
            e.to_string()
        };
        CompletionError::Transport { detail }
    }
}

#[async_trait]
impl CompletionClient for OpenRouterClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let start = Instant::now();
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<body unreadable: {e}>"));
            error!(
                status = status.as_u16(),
                model = %self.model,
                "OpenRouter error details: {}",
                text
            );
            return Err(CompletionError::UpstreamRejected {
                status: status.as_u16(),
                body: text,
            });
        }

        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        let content = parse_envelope(&text)?;
        debug!(
            "Completion: {} prompt chars → {} response chars in {:?}",
            prompt.len(),
            content.len(),
            start.elapsed()
        );
        Ok(content)
    }
}

/// Extract `choices[0].message.content` from a response body.
pub(crate) fn parse_envelope(body: &str) -> Result<String, CompletionError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| CompletionError::ProtocolViolation {
            detail: e.to_string(),
        })?;

    parsed
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| CompletionError::ProtocolViolation {
            detail: "response has no choices".into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_first_choice_content() {
        let body = r#"{"choices":[{"message":{"content":"X"}},{"message":{"content":"Y"}}]}"#;
        assert_eq!(parse_envelope(body).unwrap(), "X");
    }

    #[test]
    fn envelope_keeps_content_verbatim() {
        let body = r#"{"id":"gen-1","choices":[{"message":{"role":"assistant","content":"  padded \n"}}]}"#;
        assert_eq!(parse_envelope(body).unwrap(), "  padded \n");
    }

    #[test]
    fn envelope_missing_keys_is_protocol_violation() {
        for body in [
            r#"{}"#,
            r#"{"choices":[]}"#,
            r#"{"choices":[{"text":"legacy"}]}"#,
            r#"{"choices":[{"message":{}}]}"#,
            r#"not json at all"#,
        ] {
            let err = parse_envelope(body).unwrap_err();
            assert!(
                matches!(err, CompletionError::ProtocolViolation { .. }),
                "{body}: {err:?}"
            );
        }
    }

    #[test]
    fn missing_credential_fails_fast() {
        let config = AnalysisConfig::default();
        assert_eq!(
            OpenRouterClient::new(None, &config).unwrap_err(),
            CompletionError::MissingCredential
        );
        assert_eq!(
            OpenRouterClient::new(Some("   ".into()), &config).unwrap_err(),
            CompletionError::MissingCredential
        );
    }

    #[test]
    fn endpoint_joins_base_url() {
        let config = AnalysisConfig::builder()
            .api_base_url("http://127.0.0.1:9/v1/")
            .model("test/model")
            .build()
            .unwrap();
        let client = OpenRouterClient::new(Some("sk-test".into()), &config).unwrap();
        assert_eq!(client.endpoint, "http://127.0.0.1:9/v1/chat/completions");
        assert_eq!(client.model(), "test/model");
    }

    #[test]
    fn request_body_shape() {
        let body = ChatRequest {
            model: "m",
            messages: [ChatMessage {
                role: "user",
                content: "hi",
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"model": "m", "messages": [{"role": "user", "content": "hi"}]})
        );
    }
}
