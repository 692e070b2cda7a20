//! Contextual-batch strategy: one generative call labels a whole batch.
//!
//! Sending the batch as a single numbered prompt lets the model use the
//! surrounding sentences as context. Any failure (prompt too long, model
//! error, unparseable answer) degrades the whole batch to `"none"` records
//! carrying the reason.

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use crate::labels::{Taxonomy, NONE_CATEGORY};
use crate::llm::{LlmClient, LlmConfig, LlmError, TextGenerator, DEFAULT_BATCH_PROMPT};
use crate::models::Annotation;

use super::response::parse_batch_response;
use super::{ClassificationStrategy, StrategyError};

/// Characters of raw model output quoted in a parse-failure justification.
const RAW_SNIPPET_CHARS: usize = 200;

/// Strategy that classifies a batch of sentences in one LLM call.
pub struct LlmBatchStrategy<G = LlmClient> {
    generator: G,
    taxonomy: Taxonomy,
    prompt_template: String,
    tokens_per_item: usize,
    output_buffer_tokens: usize,
}

impl LlmBatchStrategy<LlmClient> {
    /// Build the strategy and its HTTP client from configuration.
    pub fn from_config(config: &LlmConfig, taxonomy: Taxonomy) -> Result<Self, LlmError> {
        let client = LlmClient::new(config.clone())?;
        let mut strategy = Self::new(client, taxonomy)
            .with_budget(config.tokens_per_item, config.output_buffer_tokens);
        if let Some(ref template) = config.batch_prompt {
            strategy = strategy.with_prompt_template(template);
        }
        Ok(strategy)
    }

    /// Get the underlying LLM config (for display in CLI).
    pub fn llm_config(&self) -> &LlmConfig {
        self.generator.config()
    }
}

impl<G: TextGenerator> LlmBatchStrategy<G> {
    pub fn new(generator: G, taxonomy: Taxonomy) -> Self {
        Self {
            generator,
            taxonomy,
            prompt_template: DEFAULT_BATCH_PROMPT.to_string(),
            tokens_per_item: 80,
            output_buffer_tokens: 256,
        }
    }

    /// Set the completion allowance per sentence and the constant buffer.
    pub fn with_budget(mut self, tokens_per_item: usize, output_buffer_tokens: usize) -> Self {
        self.tokens_per_item = tokens_per_item;
        self.output_buffer_tokens = output_buffer_tokens;
        self
    }

    pub fn with_prompt_template(mut self, template: &str) -> Self {
        self.prompt_template = template.to_string();
        self
    }

    /// Completion tokens requested for a prompt of `prompt_tokens` covering `n` sentences.
    ///
    /// Returns `None` when the context window leaves no room for generation.
    fn completion_budget(&self, prompt_tokens: usize, n: usize) -> Option<usize> {
        let expected_output = n * self.tokens_per_item + self.output_buffer_tokens;
        let max_total = (prompt_tokens + expected_output).min(self.generator.context_window());
        if max_total <= prompt_tokens {
            None
        } else {
            Some(max_total - prompt_tokens)
        }
    }
}

/// Render the numbered batch prompt.
pub fn build_batch_prompt(template: &str, taxonomy: &Taxonomy, texts: &[String]) -> String {
    let mut categories: Vec<String> = taxonomy
        .categories
        .iter()
        .map(|c| format!("- \"{}\" {}", c.key, c.description))
        .collect();
    categories.push(format!(
        "- \"{}\" → {}",
        NONE_CATEGORY, taxonomy.none_description
    ));

    let sentences = texts
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. \"{}\"", i + 1, s))
        .collect::<Vec<_>>()
        .join("\n");

    let example = taxonomy
        .categories
        .iter()
        .take(2)
        .map(|c| {
            format!(
                "  {}",
                json!({
                    "category": c.key,
                    "justification": format!("Discusses {}.", c.description),
                })
            )
        })
        .collect::<Vec<_>>()
        .join(",\n");

    template
        .replace("{num_sentences}", &texts.len().to_string())
        .replace("{categories}", &categories.join("\n"))
        .replace("{example}", &format!("[\n{}\n]", example))
        .replace("{sentences}", &sentences)
}

fn snippet(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl<G: TextGenerator> ClassificationStrategy for LlmBatchStrategy<G> {
    fn strategy_id(&self) -> &str {
        "llm_batch"
    }

    fn display_name(&self) -> &str {
        "LLM Batch Classification"
    }

    async fn is_available(&self) -> bool {
        self.generator.is_available().await
    }

    fn availability_hint(&self) -> String {
        self.generator.availability_hint()
    }

    async fn classify_batch(&self, texts: &[String]) -> Result<Vec<Annotation>, StrategyError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let n = texts.len();

        let prompt = build_batch_prompt(&self.prompt_template, &self.taxonomy, texts);
        let prompt_tokens = self.generator.count_tokens(&prompt);

        let Some(max_new_tokens) = self.completion_budget(prompt_tokens, n) else {
            warn!(
                "Batch of {} sentences does not fit the context window ({} prompt tokens)",
                n, prompt_tokens
            );
            return Ok(Annotation::error_batch(
                n,
                format!("Input too long ({} tokens) for model.", prompt_tokens),
            ));
        };

        debug!(
            "Classifying {} sentences ({} prompt tokens, {} new tokens)",
            n, prompt_tokens, max_new_tokens
        );

        let answer = match self.generator.generate(&prompt, max_new_tokens).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!("LLM call failed: {}", e);
                return Ok(Annotation::error_batch(n, e));
            }
        };

        match parse_batch_response(&answer, n) {
            Ok(records) => Ok(records),
            Err(e) => {
                warn!("LLM response parsing failed: {}", e);
                Ok(Annotation::error_batch(
                    n,
                    format!(
                        "Parse error: {}. Raw output: {}...",
                        e,
                        snippet(&answer, RAW_SNIPPET_CHARS)
                    ),
                ))
            }
        }
    }

    async fn release(&self) {
        if let Err(e) = self.generator.unload().await {
            debug!("Model unload failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedWindow(usize);

    #[async_trait]
    impl TextGenerator for FixedWindow {
        fn context_window(&self) -> usize {
            self.0
        }

        fn count_tokens(&self, text: &str) -> usize {
            text.len()
        }

        async fn generate(&self, _prompt: &str, _max: usize) -> Result<String, LlmError> {
            Ok(String::new())
        }
    }

    #[test]
    fn test_prompt_numbers_and_quotes_sentences() {
        let texts = vec!["First claim.".to_string(), "Second claim.".to_string()];
        let prompt = build_batch_prompt(DEFAULT_BATCH_PROMPT, &Taxonomy::default(), &texts);
        assert!(prompt.contains("Analyze the following 2 sentences:"));
        assert!(prompt.contains("1. \"First claim.\"\n2. \"Second claim.\""));
        assert!(prompt.contains("- \"limitation\" shortcomings, weaknesses, challenges"));
        assert!(prompt.contains("- \"none\" → irrelevant or general statements"));
        assert!(prompt.contains("\"category\":\"innovation\""));
        assert!(!prompt.contains("{example}"));
    }

    #[test]
    fn test_budget_capped_by_window() {
        let strategy = LlmBatchStrategy::new(FixedWindow(4096), Taxonomy::default());
        // 4 * 80 + 256 = 576 fits
        assert_eq!(strategy.completion_budget(1000, 4), Some(576));
        // capped: 4096 - 3800
        assert_eq!(strategy.completion_budget(3800, 4), Some(296));
        assert_eq!(strategy.completion_budget(4096, 4), None);
        assert_eq!(strategy.completion_budget(5000, 1), None);
    }

    #[test]
    fn test_snippet_is_char_safe() {
        assert_eq!(snippet("héllo", 2), "hé");
        assert_eq!(snippet("abc", 10), "abc");
    }
}
