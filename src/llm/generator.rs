//! Capability traits the classification strategies are written against.

use async_trait::async_trait;

use super::LlmError;

/// Text generation backend used by the contextual-batch strategy.
///
/// Implementations hold one warm model session and are called strictly one
/// request at a time.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Maximum prompt + completion length in tokens.
    fn context_window(&self) -> usize;

    /// Number of tokens `text` occupies in the model's context.
    fn count_tokens(&self, text: &str) -> usize;

    /// Generate a completion of at most `max_new_tokens` tokens.
    async fn generate(&self, prompt: &str, max_new_tokens: usize) -> Result<String, LlmError>;

    /// Whether the model service is reachable.
    async fn is_available(&self) -> bool {
        true
    }

    /// Human-readable reason when `is_available` returns false.
    fn availability_hint(&self) -> String {
        String::new()
    }

    /// Drop the warm model session.
    async fn unload(&self) -> Result<(), LlmError> {
        Ok(())
    }
}

/// Zero-shot scoring backend used by the per-sentence strategy.
#[async_trait]
pub trait HypothesisScorer: Send + Sync {
    /// Score how well `premise` supports each hypothesis.
    ///
    /// Returns one score per hypothesis, in the same order.
    async fn score(&self, premise: &str, hypotheses: &[String]) -> Result<Vec<f32>, LlmError>;

    async fn is_available(&self) -> bool {
        true
    }

    fn availability_hint(&self) -> String {
        String::new()
    }
}
