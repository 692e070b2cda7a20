//! Data models for papermark.

mod annotation;
mod sentence;

pub use annotation::{
    Annotation, ReconciledEntry, ReconciledOutput, MISMATCH_JUSTIFICATION, MISSING_JUSTIFICATION,
};
pub use sentence::Sentence;
