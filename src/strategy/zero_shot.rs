//! Per-sentence zero-shot strategy.
//!
//! Each sentence is scored independently against one hypothesis per label
//! ("This sentence is about {label}."), and the best-scoring label wins.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::labels::{normalize_category, Taxonomy};
use crate::llm::{EmbeddingClient, HypothesisScorer, LlmError, ZeroShotConfig};
use crate::models::Annotation;

use super::{ClassificationStrategy, StrategyError};

/// Strategy that labels sentences one at a time with a hypothesis scorer.
pub struct ZeroShotStrategy<S = EmbeddingClient> {
    scorer: S,
    labels: Vec<String>,
    hypotheses: Vec<String>,
}

impl ZeroShotStrategy<EmbeddingClient> {
    pub fn from_config(config: &ZeroShotConfig, taxonomy: &Taxonomy) -> Result<Self, LlmError> {
        let client = EmbeddingClient::new(config.clone())?;
        Ok(Self::new(client, taxonomy, &config.hypothesis_template))
    }

    pub fn zero_shot_config(&self) -> &ZeroShotConfig {
        self.scorer.config()
    }
}

impl<S: HypothesisScorer> ZeroShotStrategy<S> {
    /// `template` must contain `{}`, replaced by each label.
    pub fn new(scorer: S, taxonomy: &Taxonomy, template: &str) -> Self {
        let labels = taxonomy.zero_shot_labels();
        let hypotheses = labels.iter().map(|l| template.replace("{}", l)).collect();
        Self {
            scorer,
            labels,
            hypotheses,
        }
    }

    /// Candidate labels in scoring order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    async fn classify_one(&self, text: &str) -> Result<Annotation, LlmError> {
        let scores = self.scorer.score(text, &self.hypotheses).await?;
        if scores.len() != self.labels.len() {
            return Err(LlmError::Parse(format!(
                "Expected {} scores, got {}",
                self.labels.len(),
                scores.len()
            )));
        }

        // First label wins ties
        let (best, score) = scores
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |acc, (i, s)| {
                if s > acc.1 {
                    (i, s)
                } else {
                    acc
                }
            });
        let label = &self.labels[best];

        Ok(Annotation::new(
            &normalize_category(label),
            format!(
                "Zero-shot classified as '{}' with {:.2} confidence.",
                label, score
            ),
        )
        .with_confidence(score)
        .with_evidence(vec![text.to_string()]))
    }
}

#[async_trait]
impl<S: HypothesisScorer> ClassificationStrategy for ZeroShotStrategy<S> {
    fn strategy_id(&self) -> &str {
        "zero_shot"
    }

    fn display_name(&self) -> &str {
        "Zero-Shot Classification"
    }

    async fn is_available(&self) -> bool {
        self.scorer.is_available().await
    }

    fn availability_hint(&self) -> String {
        self.scorer.availability_hint()
    }

    async fn classify_batch(&self, texts: &[String]) -> Result<Vec<Annotation>, StrategyError> {
        let mut records = Vec::with_capacity(texts.len());
        for text in texts {
            match self.classify_one(text).await {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!("Zero-shot scoring failed: {}", e);
                    records.push(Annotation::error(e));
                }
            }
        }
        debug!("Zero-shot classified {} sentences", records.len());
        Ok(records)
    }
}
