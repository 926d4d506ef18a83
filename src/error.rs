//! Error types for the pitchdeck-insights library.
//!
//! Two error types reflect two different audiences:
//!
//! * [`CompletionError`] — **Classified**: everything that can go wrong while
//!   talking to the completion endpoint. The variants are kept distinct so a
//!   caller can tell a dropped connection (worth retrying) from a rejected
//!   request (fix the key, the model name or the billing) from a malformed
//!   reply. The enrichment pass returns it unmodified.
//!
//! * [`InsightsError`] — **Fatal**: the analysis cannot proceed at all (bad
//!   input file, unsupported format, missing credential, unwritable output).
//!   Returned as `Err(InsightsError)` from the top-level `analyze*` functions.
//!
//! Web-search failures never appear here: they degrade to an empty
//! [`crate::pipeline::web::Snippet`] instead.

use std::path::PathBuf;
use thiserror::Error;

/// Classified failure of a single completion request.
///
/// No retry logic lives behind this type. Callers that want resilience use
/// [`CompletionError::is_retryable`] to decide what to re-invoke.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompletionError {
    /// No API credential was available when the client was constructed.
    #[error("OpenRouter API key is not set.\nExport OPENROUTER_API_KEY or add it to a .env file.")]
    MissingCredential,

    /// The endpoint could not be reached (timeout, DNS, connection reset).
    #[error("Completion request failed in transport: {detail}")]
    Transport { detail: String },

    /// The endpoint answered with a non-success HTTP status.
    #[error("Completion endpoint rejected the request (HTTP {status}): {body}")]
    UpstreamRejected { status: u16, body: String },

    /// The endpoint answered 2xx but the envelope was not the expected shape.
    #[error("Malformed completion response: {detail}")]
    ProtocolViolation { detail: String },
}

impl CompletionError {
    /// Whether re-issuing the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CompletionError::Transport { .. })
    }
}

/// All fatal errors returned by the pitchdeck-insights library.
#[derive(Debug, Error)]
pub enum InsightsError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Deck file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file extension is not one of `.pdf`, `.ppt`, `.pptx`.
    #[error("Unsupported file format '{extension}' for '{path}'\nSupported: .pdf, .ppt, .pptx")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// The file carries a `.pdf` extension but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// The file is a pre-2007 binary PowerPoint, which has no XML parts to read.
    #[error("'{path}' is a legacy binary PowerPoint file.\nRe-save it as .pptx and try again.")]
    LegacyPowerPoint { path: PathBuf },

    /// The deck could be opened but its structure is broken.
    #[error("Deck '{path}' is corrupt: {detail}")]
    CorruptDeck { path: PathBuf, detail: String },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Text extraction from PDF needs the pdfium shared library.\n\
  • Install it system-wide (libpdfium.so / libpdfium.dylib / pdfium.dll), or\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// A completion request failed; the run was aborted with no partial report.
    #[error(transparent)]
    Completion(#[from] CompletionError),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output report file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation or config file parsing failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl InsightsError {
    /// Whether the error was raised before enrichment started because of the
    /// input file itself. The CLI reports these and stops without a backtrace.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            InsightsError::FileNotFound { .. }
                | InsightsError::PermissionDenied { .. }
                | InsightsError::UnsupportedFormat { .. }
                | InsightsError::NotAPdf { .. }
                | InsightsError::LegacyPowerPoint { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_rejected_display() {
        let e = CompletionError::UpstreamRejected {
            status: 402,
            body: "{\"error\":\"insufficient credits\"}".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("402"), "got: {msg}");
        assert!(msg.contains("insufficient credits"), "got: {msg}");
    }

    #[test]
    fn only_transport_is_retryable() {
        assert!(CompletionError::Transport {
            detail: "connection reset".into()
        }
        .is_retryable());
        assert!(!CompletionError::MissingCredential.is_retryable());
        assert!(!CompletionError::UpstreamRejected {
            status: 400,
            body: String::new()
        }
        .is_retryable());
        assert!(!CompletionError::ProtocolViolation {
            detail: "no choices".into()
        }
        .is_retryable());
    }

    #[test]
    fn completion_error_passes_through_unmodified() {
        let inner = CompletionError::ProtocolViolation {
            detail: "missing 'choices'".into(),
        };
        let outer: InsightsError = inner.clone().into();
        assert_eq!(outer.to_string(), inner.to_string());
        match outer {
            InsightsError::Completion(e) => assert_eq!(e, inner),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn unsupported_format_display() {
        let e = InsightsError::UnsupportedFormat {
            path: PathBuf::from("deck.key"),
            extension: "key".into(),
        };
        assert!(e.to_string().contains(".pptx"));
        assert!(e.is_input_error());
    }

    #[test]
    fn config_error_is_not_input_error() {
        assert!(!InsightsError::InvalidConfig("bad".into()).is_input_error());
    }
}
