//! Pipeline stages around the enrichment core.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ (enrich: llm + web) ──▶ postprocess
//! (path)    (pdfium/zip)  (OpenRouter, DDG)      (cleanup)
//! ```
//!
//! 1. [`input`]   — validate the deck path, extension and magic bytes
//! 2. [`extract`] — pull raw text; runs in `spawn_blocking` because pdfium
//!    and zip reads are blocking
//! 3. [`llm`]     — the completion client; one prompt in, one answer out
//! 4. [`web`]     — best-effort company lookups that never fail
//! 5. [`postprocess`] — opt-in deterministic cleanup of each generated section

pub mod extract;
pub mod input;
pub mod llm;
pub mod postprocess;
pub mod web;
