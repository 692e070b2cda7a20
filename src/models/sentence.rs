//! Sentence units produced by extraction.

use serde::{Deserialize, Serialize};

/// One extracted, cleaned sentence plus the zero-based page it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub page_index: usize,
    pub text: String,
}

impl Sentence {
    pub fn new(page_index: usize, text: impl Into<String>) -> Self {
        Self {
            page_index,
            text: text.into(),
        }
    }
}
