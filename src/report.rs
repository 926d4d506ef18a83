//! The enriched report and its markdown writer.
//!
//! [`EnrichedReport`] is an ordered mapping from section key to markdown:
//! `Company Name` first, then one entry per catalog topic in catalog order.
//! Only the orchestrator builds one; everyone else reads it.

use crate::error::InsightsError;
use crate::prompts::COMPANY_NAME_KEY;
use chrono::{DateTime, Local};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::path::Path;

/// One `key → content` entry of a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSection {
    pub key: String,
    pub content: String,
}

/// Ordered, key-unique analysis report.
///
/// Serialises as a JSON object whose key order matches the report order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedReport {
    sections: Vec<ReportSection>,
}

impl EnrichedReport {
    /// Start a report whose first entry is the company name.
    pub(crate) fn with_company_name(company_name: impl Into<String>) -> Self {
        Self {
            sections: vec![ReportSection {
                key: COMPANY_NAME_KEY.to_string(),
                content: company_name.into(),
            }],
        }
    }

    /// Append a section. Keys are unique by construction (validated catalog).
    pub(crate) fn push_section(&mut self, key: impl Into<String>, content: impl Into<String>) {
        let key = key.into();
        debug_assert!(self.get(&key).is_none(), "duplicate report key '{key}'");
        self.sections.push(ReportSection {
            key,
            content: content.into(),
        });
    }

    pub fn company_name(&self) -> &str {
        &self.sections[0].content
    }

    /// Content stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.content.as_str())
    }

    /// Section keys in report order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.key.as_str())
    }

    pub fn sections(&self) -> &[ReportSection] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Render as markdown; see [`render_markdown`].
    pub fn to_markdown(&self) -> String {
        render_markdown(self)
    }
}

impl<'a> IntoIterator for &'a EnrichedReport {
    type Item = &'a ReportSection;
    type IntoIter = std::slice::Iter<'a, ReportSection>;

    fn into_iter(self) -> Self::IntoIter {
        self.sections.iter()
    }
}

impl Serialize for EnrichedReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len()))?;
        for s in &self.sections {
            map.serialize_entry(&s.key, &s.content)?;
        }
        map.end()
    }
}

// ── Report Writer ────────────────────────────────────────────────────────

/// Render every section as a top-level heading followed by its content.
pub fn render_markdown(report: &EnrichedReport) -> String {
    let mut out = String::new();
    for section in report {
        out.push_str("# ");
        out.push_str(&section.key);
        out.push_str("\n\n");
        out.push_str(section.content.trim());
        out.push_str("\n\n");
    }
    out
}

/// Write the markdown rendering of `report` to `path`.
///
/// Uses atomic write (temp file + rename) so a crash never leaves a
/// half-written report behind.
pub async fn write_report(report: &EnrichedReport, path: impl AsRef<Path>) -> Result<(), InsightsError> {
    let path = path.as_ref();
    let write_err = |source: std::io::Error| InsightsError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, render_markdown(report))
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

/// Report filename for `input`: `<stem>_<YYYYmmdd_HHMMSS><ext>`.
///
/// The extension is taken from `configured_output` (e.g. `output.md` from
/// `config.yaml`) and defaults to `.md`.
pub fn output_filename(input: &Path, configured_output: Option<&str>) -> String {
    output_filename_at(input, configured_output, Local::now())
}

/// [`output_filename`] with an explicit clock.
pub fn output_filename_at(
    input: &Path,
    configured_output: Option<&str>,
    now: DateTime<Local>,
) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());

    let ext = configured_output
        .and_then(|o| Path::new(o).extension())
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_else(|| ".md".to_string());

    format!("{}_{}{}", stem, now.format("%Y%m%d_%H%M%S"), ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> EnrichedReport {
        let mut r = EnrichedReport::with_company_name("Acme Corp");
        r.push_section("Executive Summary", "  Flying taxis.\n");
        r.push_section("Team", "Jane Doe");
        r
    }

    #[test]
    fn order_and_lookup() {
        let r = sample();
        assert_eq!(
            r.keys().collect::<Vec<_>>(),
            vec![COMPANY_NAME_KEY, "Executive Summary", "Team"]
        );
        assert_eq!(r.company_name(), "Acme Corp");
        assert_eq!(r.get("Team"), Some("Jane Doe"));
        assert_eq!(r.get("Market"), None);
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn markdown_layout() {
        assert_eq!(
            sample().to_markdown(),
            "# Company Name\n\nAcme Corp\n\n# Executive Summary\n\nFlying taxis.\n\n# Team\n\nJane Doe\n\n"
        );
    }

    #[test]
    fn json_keeps_order() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(
            json,
            r#"{"Company Name":"Acme Corp","Executive Summary":"  Flying taxis.\n","Team":"Jane Doe"}"#
        );
    }

    #[test]
    fn filename_uses_stem_timestamp_and_extension() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            output_filename_at(Path::new("/decks/Acme Deck.pdf"), None, now),
            "Acme Deck_20240309_140507.md"
        );
        assert_eq!(
            output_filename_at(Path::new("deck.pptx"), Some("output.txt"), now),
            "deck_20240309_140507.txt"
        );
        assert_eq!(
            output_filename_at(Path::new("deck.pptx"), Some("output"), now),
            "deck_20240309_140507.md"
        );
    }

    #[tokio::test]
    async fn write_report_creates_parent_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/acme.md");
        write_report(&sample(), &path).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, sample().to_markdown());
        assert!(!dir.path().join("reports/acme.md.tmp").exists());
    }
}
