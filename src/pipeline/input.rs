//! Input resolution: validate a user-supplied deck path before any work starts.
//!
//! The format is chosen from the extension (`.pdf`, `.ppt`, `.pptx`, case
//! insensitive) and then confirmed against the first bytes of the file so a
//! mislabelled file yields a meaningful error rather than a pdfium or zip
//! failure deep inside extraction.

use crate::error::InsightsError;
use crate::pipeline::extract::DeckSource;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

const PDF_MAGIC: &[u8; 4] = b"%PDF";
const ZIP_MAGIC: &[u8; 4] = b"PK\x03\x04";
/// OLE2 compound document header, used by pre-2007 `.ppt`.
const OLE_MAGIC: &[u8; 4] = &[0xD0, 0xCF, 0x11, 0xE0];

/// A validated deck on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInput {
    pub path: PathBuf,
    pub source: DeckSource,
}

/// Map a path's extension to a deck source.
pub fn detect_source(path: &Path) -> Result<DeckSource, InsightsError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => Ok(DeckSource::Pdf),
        "ppt" | "pptx" => Ok(DeckSource::Ppt),
        _ => Err(InsightsError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: if extension.is_empty() {
                "(none)".into()
            } else {
                format!(".{extension}")
            },
        }),
    }
}

/// Resolve a local deck path, validating existence, extension and magic bytes.
pub fn resolve_input(path_str: impl AsRef<Path>) -> Result<ResolvedInput, InsightsError> {
    let path = path_str.as_ref().to_path_buf();

    if !path.is_file() {
        return Err(InsightsError::FileNotFound { path });
    }

    let source = detect_source(&path)?;

    let mut magic = [0u8; 4];
    match std::fs::File::open(&path) {
        Ok(mut f) => {
            // Files shorter than the magic keep it zeroed and fail the checks below.
            if f.read_exact(&mut magic).is_err() {
                magic = [0u8; 4];
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(InsightsError::PermissionDenied { path });
        }
        Err(_) => return Err(InsightsError::FileNotFound { path }),
    }

    match source {
        DeckSource::Pdf if &magic != PDF_MAGIC => {
            return Err(InsightsError::NotAPdf { path, magic });
        }
        DeckSource::Ppt if &magic == OLE_MAGIC => {
            return Err(InsightsError::LegacyPowerPoint { path });
        }
        DeckSource::Ppt if &magic != ZIP_MAGIC => {
            return Err(InsightsError::CorruptDeck {
                path,
                detail: format!("not a PPTX container (first bytes {magic:?})"),
            });
        }
        _ => {}
    }

    debug!("Resolved {:?} deck: {}", source, path.display());
    Ok(ResolvedInput { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, bytes: &[u8]) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        std::fs::File::create(&path).unwrap().write_all(bytes).unwrap();
        (dir, path)
    }

    #[test]
    fn extension_detection() {
        assert_eq!(detect_source(Path::new("a.pdf")).unwrap(), DeckSource::Pdf);
        assert_eq!(detect_source(Path::new("a.PDF")).unwrap(), DeckSource::Pdf);
        assert_eq!(detect_source(Path::new("a.ppt")).unwrap(), DeckSource::Ppt);
        assert_eq!(detect_source(Path::new("a.PptX")).unwrap(), DeckSource::Ppt);
        assert!(matches!(
            detect_source(Path::new("a.key")),
            Err(InsightsError::UnsupportedFormat { .. })
        ));
        assert!(matches!(
            detect_source(Path::new("deck")),
            Err(InsightsError::UnsupportedFormat { extension, .. }) if extension == "(none)"
        ));
    }

    #[test]
    fn missing_file() {
        let err = resolve_input("/definitely/not/here.pdf").unwrap_err();
        assert!(matches!(err, InsightsError::FileNotFound { .. }));
    }

    #[test]
    fn unsupported_extension_on_existing_file() {
        let (_dir, path) = write_temp("deck.docx", b"PK\x03\x04rest");
        assert!(matches!(
            resolve_input(&path).unwrap_err(),
            InsightsError::UnsupportedFormat { .. }
        ));
    }

    #[test]
    fn pdf_magic_checked() {
        let (_dir, path) = write_temp("deck.pdf", b"hello world");
        assert!(matches!(
            resolve_input(&path).unwrap_err(),
            InsightsError::NotAPdf { .. }
        ));

        let (_dir, path) = write_temp("deck.pdf", b"%PDF-1.7\n");
        let resolved = resolve_input(&path).unwrap();
        assert_eq!(resolved.source, DeckSource::Pdf);
    }

    #[test]
    fn short_files_fail_magic_checks() {
        let (_dir, path) = write_temp("deck.pdf", b"%PD");
        assert!(matches!(
            resolve_input(&path).unwrap_err(),
            InsightsError::NotAPdf { magic, .. } if magic == [0u8; 4]
        ));

        let (_dir, path) = write_temp("deck.pptx", b"PK");
        assert!(matches!(
            resolve_input(&path).unwrap_err(),
            InsightsError::CorruptDeck { .. }
        ));
    }

    #[test]
    fn legacy_ppt_detected() {
        let (_dir, path) = write_temp("deck.ppt", &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1]);
        assert!(matches!(
            resolve_input(&path).unwrap_err(),
            InsightsError::LegacyPowerPoint { .. }
        ));
    }

    #[test]
    fn pptx_needs_zip_container() {
        let (_dir, path) = write_temp("deck.pptx", b"plain text");
        assert!(matches!(
            resolve_input(&path).unwrap_err(),
            InsightsError::CorruptDeck { .. }
        ));
    }
}
