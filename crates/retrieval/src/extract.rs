//! Document text extraction seam.
//!
//! Extraction is an external collaborator: the retrieval core only depends
//! on the contract that a document yields an ordered sequence of
//! `(page_number, text)` pairs. The built-in extractor handles plain-text
//! files; richer formats (PDF and friends) plug in behind the same trait.

use docqa_core::{AppError, AppResult};
use std::path::Path;

/// Trait for document text extraction.
pub trait DocumentExtractor: Send + Sync {
    /// Whether this extractor can handle the given file.
    fn supports(&self, path: &Path) -> bool;

    /// Extract the document's text as ordered `(page_number, text)` pairs
    /// with 1-based page numbers. Pages without text are included with an
    /// empty string so page numbering stays faithful to the document.
    ///
    /// Fails with `ExtractionFailed` on unreadable input.
    fn extract(&self, path: &Path) -> AppResult<Vec<(u32, String)>>;
}

/// Extractor for plain-text documents (`.txt`, `.md`).
///
/// Form feed characters (`\x0C`) act as page breaks, mirroring how paged
/// formats report their content; most files have none and come back as a
/// single page.
#[derive(Debug, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentExtractor for PlainTextExtractor {
    fn supports(&self, path: &Path) -> bool {
        matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("txt") | Some("md")
        )
    }

    fn extract(&self, path: &Path) -> AppResult<Vec<(u32, String)>> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::ExtractionFailed(format!("Failed to read {:?}: {}", path, e))
        })?;

        let pages = content
            .split('\u{0C}')
            .enumerate()
            .map(|(i, text)| (i as u32 + 1, text.to_string()))
            .collect();

        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_supports_text_extensions() {
        let extractor = PlainTextExtractor::new();
        assert!(extractor.supports(Path::new("manual.txt")));
        assert!(extractor.supports(Path::new("notes.md")));
        assert!(!extractor.supports(Path::new("scan.pdf")));
        assert!(!extractor.supports(Path::new("README")));
    }

    #[test]
    fn test_extract_single_page() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("doc.txt");
        std::fs::write(&path, "hello world").unwrap();

        let pages = PlainTextExtractor::new().extract(&path).unwrap();
        assert_eq!(pages, vec![(1, "hello world".to_string())]);
    }

    #[test]
    fn test_extract_form_feed_pages() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("doc.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "page one\u{0C}page two\u{0C}").unwrap();

        let pages = PlainTextExtractor::new().extract(&path).unwrap();
        assert_eq!(
            pages,
            vec![
                (1, "page one".to_string()),
                (2, "page two".to_string()),
                (3, String::new()),
            ]
        );
    }

    #[test]
    fn test_extract_missing_file() {
        let result = PlainTextExtractor::new().extract(Path::new("/nonexistent/doc.txt"));
        assert!(matches!(result, Err(AppError::ExtractionFailed(_))));
    }
}
