//! papermark - sentence classification and highlighting for research papers.
//!
//! Sentences are extracted from a PDF, labeled by a pluggable classification
//! strategy in reconciled batches, and written back as colored highlight
//! annotations.

pub mod config;
pub mod extract;
pub mod highlight;
pub mod labels;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod strategy;
