//! Annotation records and the reconciled per-sentence output.

use serde::{Deserialize, Serialize};

use crate::labels::{normalize_category, NONE_CATEGORY};

/// Justification used when a model returns an empty one.
pub const MISSING_JUSTIFICATION: &str = "No justification provided.";

/// Justification of the record the reconciler pads a short batch with.
pub const MISMATCH_JUSTIFICATION: &str = "Result count mismatch.";

/// Classification of a single sentence.
///
/// `category` and `justification` are always populated. Failure paths produce
/// a `"none"` record whose justification carries the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub category: String,
    pub justification: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Vec<String>>,
}

impl Annotation {
    /// Create a record, normalizing the category and filling an empty justification.
    pub fn new(category: &str, justification: impl Into<String>) -> Self {
        let justification = justification.into();
        let justification = if justification.trim().is_empty() {
            MISSING_JUSTIFICATION.to_string()
        } else {
            justification
        };
        let category = normalize_category(category);
        Self {
            category: if category.is_empty() {
                NONE_CATEGORY.to_string()
            } else {
                category
            },
            justification,
            confidence: None,
            evidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_evidence(mut self, evidence: Vec<String>) -> Self {
        self.evidence = Some(evidence);
        self
    }

    /// Fallback record carrying an error description.
    pub fn error(message: impl std::fmt::Display) -> Self {
        Self::new(NONE_CATEGORY, format!("Error: {}", message))
    }

    /// Fallback record used to pad a batch whose output came back short.
    pub fn mismatch() -> Self {
        Self::new(NONE_CATEGORY, MISMATCH_JUSTIFICATION)
    }

    /// `n` copies of an error fallback.
    pub fn error_batch(n: usize, message: impl std::fmt::Display) -> Vec<Self> {
        let record = Self::error(message);
        vec![record; n]
    }

    pub fn is_none(&self) -> bool {
        self.category == NONE_CATEGORY
    }
}

/// One sentence with its page and classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledEntry {
    pub page_index: usize,
    pub text: String,
    pub annotation: Annotation,
}

/// Ordered reconciled output, one entry per input sentence.
pub type ReconciledOutput = Vec<ReconciledEntry>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_justification_is_filled() {
        let ann = Annotation::new("method", "  ");
        assert_eq!(ann.justification, MISSING_JUSTIFICATION);
    }

    #[test]
    fn test_category_normalized() {
        let ann = Annotation::new("Future Work", "next steps");
        assert_eq!(ann.category, "future_work");
        let ann = Annotation::new("", "nothing");
        assert!(ann.is_none());
    }

    #[test]
    fn test_error_record() {
        let ann = Annotation::error("boom");
        assert!(ann.is_none());
        assert_eq!(ann.justification, "Error: boom");
    }

    #[test]
    fn test_optional_fields_skipped() {
        let json = serde_json::to_value(Annotation::new("results", "metrics")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"category": "results", "justification": "metrics"})
        );
    }
}
