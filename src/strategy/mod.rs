//! Classification strategies: trait-based abstraction over the model that labels sentences.
//!
//! Each backend (contextual-batch LLM, per-sentence zero-shot) implements the
//! `ClassificationStrategy` trait. The `BatchReconciler` drives any of them
//! identically.

mod llm_batch;
mod response;
mod zero_shot;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Annotation;

pub use llm_batch::{build_batch_prompt, LlmBatchStrategy};
pub use response::{parse_batch_response, ResponseError};
pub use zero_shot::ZeroShotStrategy;

/// A backend that can classify an ordered batch of sentences.
///
/// A well-behaved strategy returns exactly one record per input, in input
/// order, and turns its own failures into fallback records. `Err` is reserved
/// for failures the strategy could not contain; the reconciler replaces the
/// whole batch when it sees one.
#[async_trait]
pub trait ClassificationStrategy: Send + Sync {
    /// Short identifier used in logs and exported results.
    fn strategy_id(&self) -> &str;

    /// Human-readable name for CLI progress output.
    fn display_name(&self) -> &str;

    /// Whether the backing model service is ready.
    async fn is_available(&self) -> bool {
        true
    }

    /// Human-readable reason when `is_available` returns false.
    fn availability_hint(&self) -> String {
        String::new()
    }

    /// Classify `texts`, returning one record per input in the same order.
    async fn classify_batch(&self, texts: &[String]) -> Result<Vec<Annotation>, StrategyError>;

    /// Release the warm model session. Called once after the last batch.
    async fn release(&self) {}
}

/// Errors a strategy could not convert into fallback records.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("Classification failed: {0}")]
    Failed(String),
}
