//! Sentence extraction from PDFs.
//!
//! Text is pulled per page with poppler's `pdftotext`, split into sentences,
//! and filtered so captions, tables, and layout debris never reach the
//! classifier.

mod pdftotext;
mod sentences;

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Sentence;

pub(crate) use pdftotext::{find_pdftotext, handle_cmd_output};
pub use pdftotext::{split_pages, PdfTextExtractor};
pub use sentences::{clean_text, is_valid_sentence, normalize_whitespace, split_sentences};

/// Errors that can occur during sentence extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Produces the ordered `(page_index, sentence)` stream for a document.
pub trait SentenceExtractor {
    /// Page indices are zero-based and non-decreasing.
    fn extract(&self, path: &Path) -> Result<Vec<Sentence>, ExtractionError>;
}

/// Sentence filter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Minimum length of a cleaned sentence, in characters
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,
    /// Minimum share of alphabetic characters in a cleaned sentence
    #[serde(default = "default_min_alpha_ratio")]
    pub min_alpha_ratio: f32,
    /// Case-insensitive prefixes that mark captions
    #[serde(default = "default_skip_prefixes")]
    pub skip_prefixes: Vec<String>,
    /// Explicit path to `pdftotext` (searched on PATH otherwise)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdftotext_path: Option<String>,
}

fn default_min_chars() -> usize {
    30
}

fn default_min_alpha_ratio() -> f32 {
    0.7
}

fn default_skip_prefixes() -> Vec<String> {
    ["figure", "table", "fig."]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_chars: default_min_chars(),
            min_alpha_ratio: default_min_alpha_ratio(),
            skip_prefixes: default_skip_prefixes(),
            pdftotext_path: None,
        }
    }
}
