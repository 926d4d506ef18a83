//! Text extraction: turn a validated deck into [`DeckData`].
//!
//! * **PDF** — pdfium reads the text layer page by page. Empty pages are
//!   skipped; every kept page is followed by a newline.
//! * **PPTX** — the file is a zip of XML parts. Every shape text body on every
//!   slide (in slide-number order) contributes its paragraphs joined by
//!   newlines, followed by a newline.
//!
//! Both backends are blocking, so [`extract_text`] runs them on the
//! `spawn_blocking` pool.

use crate::error::InsightsError;
use crate::pipeline::input::ResolvedInput;
use once_cell::sync::Lazy;
use pdfium_render::prelude::*;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};
use zip::ZipArchive;

/// Which kind of document the text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeckSource {
    Pdf,
    Ppt,
}

/// Raw text of a deck, produced once by extraction and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckData {
    pub source: DeckSource,
    /// Full extracted text; may be empty.
    pub raw_text: String,
}

impl DeckData {
    pub fn new(source: DeckSource, raw_text: impl Into<String>) -> Self {
        Self {
            source,
            raw_text: raw_text.into(),
        }
    }
}

/// Extract the text of a resolved deck.
pub async fn extract_text(input: &ResolvedInput) -> Result<DeckData, InsightsError> {
    let path = input.path.clone();
    let source = input.source;

    let raw_text = tokio::task::spawn_blocking(move || match source {
        DeckSource::Pdf => extract_pdf_blocking(&path),
        DeckSource::Ppt => extract_pptx_blocking(&path),
    })
    .await
    .map_err(|e| InsightsError::Internal(format!("Extraction task panicked: {}", e)))??;

    info!(
        "Extracted {} chars from {:?} deck {}",
        raw_text.chars().count(),
        source,
        input.path.display()
    );
    Ok(DeckData { source, raw_text })
}

// ── PDF ──────────────────────────────────────────────────────────────────

/// Bind pdfium from `PDFIUM_LIB_PATH`, the working directory, or the system.
fn bind_pdfium() -> Result<Pdfium, InsightsError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(&path),
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| InsightsError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

fn extract_pdf_blocking(pdf_path: &Path) -> Result<String, InsightsError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium.load_pdf_from_file(pdf_path, None).map_err(|e| {
        let detail = format!("{:?}", e);
        if detail.contains("Password") || detail.contains("password") {
            InsightsError::CorruptDeck {
                path: pdf_path.to_path_buf(),
                detail: "PDF is encrypted".into(),
            }
        } else {
            InsightsError::CorruptDeck {
                path: pdf_path.to_path_buf(),
                detail,
            }
        }
    })?;

    let mut text = String::new();
    for (idx, page) in document.pages().iter().enumerate() {
        let page_text = page
            .text()
            .map_err(|e| InsightsError::CorruptDeck {
                path: pdf_path.to_path_buf(),
                detail: format!("page {}: {:?}", idx + 1, e),
            })?
            .all();

        debug!("Page {}: {} chars", idx + 1, page_text.len());
        if !page_text.is_empty() {
            text.push_str(&page_text);
            text.push('\n');
        }
    }

    Ok(text)
}

// ── PPTX ─────────────────────────────────────────────────────────────────

static RE_SLIDE_PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").unwrap());

fn extract_pptx_blocking(path: &Path) -> Result<String, InsightsError> {
    let corrupt = |detail: String| InsightsError::CorruptDeck {
        path: path.to_path_buf(),
        detail,
    };

    let file = std::fs::File::open(path).map_err(|e| corrupt(e.to_string()))?;
    let mut archive = ZipArchive::new(file).map_err(|e| corrupt(e.to_string()))?;

    let slides = slide_parts(archive.file_names());
    debug!("PPTX has {} slides", slides.len());

    let mut text = String::new();
    for part in slides {
        let mut xml = String::new();
        archive
            .by_name(&part)
            .map_err(|e| corrupt(format!("missing {part}: {e}")))?
            .read_to_string(&mut xml)
            .map_err(|e| corrupt(format!("unreadable {part}: {e}")))?;

        for shape_text in slide_shape_texts(&xml).map_err(|e| corrupt(format!("{part}: {e}")))? {
            text.push_str(&shape_text);
            text.push('\n');
        }
    }

    Ok(text)
}

/// Slide part names sorted by slide number.
fn slide_parts<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut slides: Vec<(u32, String)> = names
        .filter_map(|name| {
            let caps = RE_SLIDE_PART.captures(name)?;
            let number = caps[1].parse().ok()?;
            Some((number, name.to_string()))
        })
        .collect();
    slides.sort_by_key(|(n, _)| *n);
    slides.into_iter().map(|(_, name)| name).collect()
}

/// Text of every shape (`p:txBody`) on one slide, paragraphs joined by `\n`.
///
/// Table cells use `a:txBody` and are not shapes with text, so they are skipped.
fn slide_shape_texts(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut shapes = Vec::new();
    let mut paragraphs: Option<Vec<String>> = None;
    let mut in_run_text = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"p:txBody" => paragraphs = Some(Vec::new()),
                b"a:p" => {
                    if let Some(ps) = paragraphs.as_mut() {
                        ps.push(String::new());
                    }
                }
                b"a:t" => in_run_text = paragraphs.is_some(),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"a:p" => {
                    if let Some(ps) = paragraphs.as_mut() {
                        ps.push(String::new());
                    }
                }
                b"a:br" => {
                    if let Some(p) = paragraphs.as_mut().and_then(|ps| ps.last_mut()) {
                        p.push('\n');
                    }
                }
                _ => {}
            },
            Event::Text(t) if in_run_text => {
                let run = t.unescape()?;
                if let Some(p) = paragraphs.as_mut().and_then(|ps| ps.last_mut()) {
                    p.push_str(&run);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"a:t" => in_run_text = false,
                b"p:txBody" => {
                    if let Some(ps) = paragraphs.take() {
                        shapes.push(ps.join("\n"));
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(shapes)
}
