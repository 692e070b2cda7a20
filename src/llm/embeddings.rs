//! Embedding client used as a zero-shot hypothesis scorer.
//!
//! The premise and every hypothesis are embedded; cosine similarities are
//! turned into a probability distribution with a temperature softmax.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use super::client::{LlmProvider, ZeroShotConfig};
use super::generator::HypothesisScorer;
use super::LlmError;

/// Embedding-backed zero-shot scorer.
pub struct EmbeddingClient {
    config: ZeroShotConfig,
    client: Client,
    /// Hypothesis embeddings, computed once per hypothesis list.
    hypothesis_cache: Mutex<Option<(Vec<String>, Vec<Vec<f32>>)>>,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// Ollama `/api/embed` response.
#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// OpenAI `/v1/embeddings` response.
#[derive(Debug, Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedding>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbedding {
    index: usize,
    embedding: Vec<f32>,
}

impl EmbeddingClient {
    pub fn new(config: ZeroShotConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            hypothesis_cache: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &ZeroShotConfig {
        &self.config
    }

    /// Check that the embedding endpoint answers a trivial request.
    pub async fn is_available(&self) -> bool {
        self.embed(&["ping".to_string()]).await.is_ok()
    }

    /// Embed a list of texts, preserving order.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbedRequest {
            model: &self.config.model,
            input: texts,
        };

        let (url, builder) = match self.config.provider {
            LlmProvider::Ollama => {
                let url = format!("{}/api/embed", self.config.endpoint);
                let builder = self.client.post(&url);
                (url, builder)
            }
            LlmProvider::OpenAI => {
                let key = self
                    .config
                    .api_key
                    .as_deref()
                    .ok_or(LlmError::MissingApiKey)?;
                let url = format!("{}/v1/embeddings", self.config.endpoint);
                let builder = self.client.post(&url).bearer_auth(key);
                (url, builder)
            }
        };

        debug!("Embedding {} texts via {}", texts.len(), url);
        let resp = builder
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }

        let vectors = match self.config.provider {
            LlmProvider::Ollama => {
                let parsed: OllamaEmbedResponse = resp
                    .json()
                    .await
                    .map_err(|e| LlmError::Parse(e.to_string()))?;
                parsed.embeddings
            }
            LlmProvider::OpenAI => {
                let mut parsed: OpenAiEmbedResponse = resp
                    .json()
                    .await
                    .map_err(|e| LlmError::Parse(e.to_string()))?;
                parsed.data.sort_by_key(|d| d.index);
                parsed.data.into_iter().map(|d| d.embedding).collect()
            }
        };

        if vectors.len() != texts.len() {
            return Err(LlmError::Parse(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }

    async fn hypothesis_embeddings(&self, hypotheses: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let mut cache = self.hypothesis_cache.lock().await;
        if let Some((ref cached_for, ref vectors)) = *cache {
            if cached_for.as_slice() == hypotheses {
                return Ok(vectors.clone());
            }
        }
        let vectors = self.embed(hypotheses).await?;
        *cache = Some((hypotheses.to_vec(), vectors.clone()));
        Ok(vectors)
    }
}

#[async_trait]
impl HypothesisScorer for EmbeddingClient {
    async fn score(&self, premise: &str, hypotheses: &[String]) -> Result<Vec<f32>, LlmError> {
        let hypothesis_vectors = self.hypothesis_embeddings(hypotheses).await?;
        let premise_vector = self
            .embed(&[premise.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Parse("Empty embedding response".to_string()))?;

        let similarities: Vec<f32> = hypothesis_vectors
            .iter()
            .map(|h| cosine_similarity(&premise_vector, h))
            .collect();

        Ok(softmax(&similarities, self.config.softmax_temperature))
    }

    async fn is_available(&self) -> bool {
        EmbeddingClient::is_available(self).await
    }

    fn availability_hint(&self) -> String {
        self.config.availability_hint()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().min(b.len());
    if len == 0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).take(len).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().take(len).map(|v| v * v).sum::<f32>().sqrt();
    let norm_b = b.iter().take(len).map(|v| v * v).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn softmax(values: &[f32], temperature: f32) -> Vec<f32> {
    if values.is_empty() {
        return Vec::new();
    }
    let t = if temperature > 0.0 { temperature } else { 1.0 };
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = values.iter().map(|v| ((v - max) / t).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
