//! Progress-callback trait for per-topic enrichment events.
//!
//! Inject an [`Arc<dyn EnrichmentProgressCallback>`] via
//! [`crate::config::AnalysisConfigBuilder::progress_callback`] to receive
//! events as the topic pass moves through the catalog. Each topic is one
//! blocking round-trip of several seconds, so the 11 steps are worth showing.
//!
//! The trait is `Send + Sync` because with `concurrency > 1` topics are
//! completed out of order from different tasks.
//!
//! # Example
//!
//! ```rust
//! use pitchdeck_insights::{AnalysisConfig, EnrichmentProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl EnrichmentProgressCallback for CountingCallback {
//!     fn on_topic_complete(&self, _index: usize, total: usize, label: &str, _len: usize) {
//!         let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("{done}/{total} {label}");
//!     }
//! }
//!
//! let config = AnalysisConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { completed: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the orchestrator as it works through the topic catalog.
///
/// All methods have default no-op implementations. `index` is the 0-based
/// catalog position of the topic.
pub trait EnrichmentProgressCallback: Send + Sync {
    /// Called once the company name is known, before the first topic.
    fn on_enrichment_start(&self, company_name: &str, total_topics: usize) {
        let _ = (company_name, total_topics);
    }

    /// Called just before the completion request for a topic is sent.
    fn on_topic_start(&self, index: usize, total_topics: usize, label: &str) {
        let _ = (index, total_topics, label);
    }

    /// Called when a topic section has been stored.
    ///
    /// `content_len` is the byte length of the stored section.
    fn on_topic_complete(&self, index: usize, total_topics: usize, label: &str, content_len: usize) {
        let _ = (index, total_topics, label, content_len);
    }

    /// Called when a topic failed. The run aborts right after.
    fn on_topic_error(&self, index: usize, total_topics: usize, label: &str, error: &str) {
        let _ = (index, total_topics, label, error);
    }

    /// Called once after every topic succeeded.
    fn on_enrichment_complete(&self, total_topics: usize) {
        let _ = total_topics;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl EnrichmentProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalysisConfig`].
pub type ProgressCallback = Arc<dyn EnrichmentProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        total: AtomicUsize,
    }

    impl EnrichmentProgressCallback for TrackingCallback {
        fn on_enrichment_start(&self, _company_name: &str, total_topics: usize) {
            self.total.store(total_topics, Ordering::SeqCst);
        }

        fn on_topic_start(&self, _index: usize, _total: usize, _label: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_topic_complete(&self, _index: usize, _total: usize, _label: &str, _len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_topic_error(&self, _index: usize, _total: usize, _label: &str, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_enrichment_start("Acme", 11);
        cb.on_topic_start(0, 11, "Team");
        cb.on_topic_complete(0, 11, "Team", 42);
        cb.on_topic_error(1, 11, "Market", "HTTP 500");
        cb.on_enrichment_complete(11);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_enrichment_start("Acme", 3);
        tracker.on_topic_start(0, 3, "A");
        tracker.on_topic_complete(0, 3, "A", 10);
        tracker.on_topic_start(1, 3, "B");
        tracker.on_topic_error(1, 3, "B", "timeout");

        assert_eq!(tracker.total.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
    }
}
