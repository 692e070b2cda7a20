//! Model integration for sentence classification.
//!
//! A generative model (via Ollama or an OpenAI-compatible API) labels whole
//! batches in one call; an embedding model scores zero-shot hypotheses.

mod client;
mod embeddings;
mod generator;

use thiserror::Error;

pub use client::{
    estimate_tokens, LlmClient, LlmConfig, LlmProvider, ZeroShotConfig, DEFAULT_BATCH_PROMPT,
};
pub use embeddings::EmbeddingClient;
pub use generator::{HypothesisScorer, TextGenerator};

/// Errors that can occur during model calls.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Failed to connect to the model service
    #[error("Connection error: {0}")]
    Connection(String),
    /// API returned an error
    #[error("API error: {0}")]
    Api(String),
    /// Failed to parse the service response
    #[error("Parse error: {0}")]
    Parse(String),
    /// Model not available on the server
    #[error("Model not found: {0}")]
    ModelNotFound(String),
    /// OpenAI-compatible provider without a key
    #[error("API key not configured")]
    MissingApiKey,
}
