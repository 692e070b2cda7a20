//! `pdftotext`-backed sentence extractor.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use super::sentences::split_sentences;
use super::{ExtractionConfig, ExtractionError, SentenceExtractor};
use crate::models::Sentence;

const TOOL_HINT: &str = "pdftotext (install poppler-utils)";

/// Handle command output, extracting stdout on success or returning appropriate error.
pub(crate) fn handle_cmd_output(
    result: std::io::Result<std::process::Output>,
    tool_name: &str,
    error_prefix: &str,
) -> Result<String, ExtractionError> {
    match result {
        Ok(output) => {
            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ExtractionError::ExtractionFailed(format!(
                    "{}: {}",
                    error_prefix,
                    stderr.trim()
                )))
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractionError::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(ExtractionError::Io(e)),
    }
}

/// Locate the `pdftotext` binary: explicit path first, then PATH.
pub(crate) fn find_pdftotext(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        let path = PathBuf::from(shellexpand::tilde(path).as_ref());
        if path.exists() {
            return Some(path);
        }
    }
    which::which("pdftotext").ok()
}

/// Split `pdftotext` output into pages on form feeds.
///
/// `pdftotext` terminates every page with `\x0c`, so a trailing empty piece
/// is not a page.
pub fn split_pages(text: &str) -> Vec<&str> {
    let mut pages: Vec<&str> = text.split('\x0c').collect();
    if text.ends_with('\x0c') {
        pages.pop();
    }
    pages
}

/// Extracts sentences with poppler's `pdftotext` in reading order.
pub struct PdfTextExtractor {
    config: ExtractionConfig,
    binary: PathBuf,
}

impl Default for PdfTextExtractor {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

impl PdfTextExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        let binary = find_pdftotext(config.pdftotext_path.as_deref())
            .unwrap_or_else(|| PathBuf::from("pdftotext"));
        Self { config, binary }
    }

    /// Check if `pdftotext` is installed.
    pub fn is_available(&self) -> bool {
        find_pdftotext(self.config.pdftotext_path.as_deref()).is_some()
    }

    /// Run pdftotext over the whole document, one string per page.
    pub fn page_texts(&self, file_path: &Path) -> Result<Vec<String>, ExtractionError> {
        let output = Command::new(&self.binary)
            .args(["-enc", "UTF-8"])
            .arg(file_path)
            .arg("-") // Output to stdout
            .output();

        let text = handle_cmd_output(output, TOOL_HINT, "pdftotext failed")?;
        Ok(split_pages(&text).into_iter().map(String::from).collect())
    }
}

impl SentenceExtractor for PdfTextExtractor {
    fn extract(&self, path: &Path) -> Result<Vec<Sentence>, ExtractionError> {
        let pages = self.page_texts(path)?;
        let mut sentences = Vec::new();
        for (page_index, page_text) in pages.iter().enumerate() {
            let before = sentences.len();
            sentences.extend(
                split_sentences(page_text, &self.config)
                    .into_iter()
                    .map(|text| Sentence::new(page_index, text)),
            );
            debug!(
                "Page {}: {} sentences kept",
                page_index + 1,
                sentences.len() - before
            );
        }
        Ok(sentences)
    }
}
