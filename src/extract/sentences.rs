//! Sentence segmentation, citation cleanup, and the fragment filter.

use std::sync::LazyLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use super::ExtractionConfig;

/// Author-year citations: `(Smith et al., 2020)`.
static AUTHOR_YEAR_CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^)]*,\s*\d{4}\)").unwrap());

/// Numeric citations: `[3]`, `[1, 4, 7]`.
static NUMERIC_CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\[\d+(?:,\s*\d+)*\]").unwrap());

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Collapse runs of whitespace (including line breaks) to single spaces.
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Strip citations and normalize whitespace.
pub fn clean_text(text: &str) -> String {
    let text = AUTHOR_YEAR_CITATION.replace_all(text, "");
    let text = NUMERIC_CITATION.replace_all(&text, "");
    normalize_whitespace(&text)
}

/// Whether a cleaned sentence is prose rather than a caption or layout debris.
pub fn is_valid_sentence(cleaned: &str, config: &ExtractionConfig) -> bool {
    let total = cleaned.chars().count();
    if total == 0 || total < config.min_chars {
        return false;
    }

    let alphabetic = cleaned.chars().filter(|c| c.is_alphabetic()).count();
    if (alphabetic as f32) / (total as f32) < config.min_alpha_ratio {
        return false;
    }

    let lower = cleaned.trim().to_lowercase();
    !config
        .skip_prefixes
        .iter()
        .any(|prefix| lower.starts_with(&prefix.to_lowercase()))
}

/// Split one page of text into kept sentences, in reading order.
///
/// Line breaks inside the page are joined first so that wrapped lines do not
/// end sentences. The returned text is the whitespace-normalized sentence with
/// citations intact, as it appears on the page.
pub fn split_sentences(page_text: &str, config: &ExtractionConfig) -> Vec<String> {
    let joined = normalize_whitespace(page_text);
    joined
        .unicode_sentences()
        .map(normalize_whitespace)
        .filter(|raw| is_valid_sentence(&clean_text(raw), config))
        .collect()
}
