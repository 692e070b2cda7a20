//! HTTP client for the generative model behind batch classification.
//!
//! Supports the Ollama API for local inference and any OpenAI-compatible
//! chat completions endpoint (OpenAI, Groq, Together.ai).

mod config;
mod prompts;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use config::{LlmConfig, LlmProvider, ZeroShotConfig};
pub use prompts::DEFAULT_BATCH_PROMPT;

use super::generator::TextGenerator;
use super::LlmError;

/// LLM client for sentence classification.
pub struct LlmClient {
    config: LlmConfig,
    client: Client,
}

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<&'a str>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<u32>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: usize,
    num_ctx: usize,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
    error: Option<ChatError>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatError {
    message: String,
}

impl LlmClient {
    /// Create a new LLM client with the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Get the config.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Check if the LLM service is reachable.
    pub async fn is_available(&self) -> bool {
        let request = match self.config.provider {
            LlmProvider::Ollama => self
                .client
                .get(format!("{}/api/tags", self.config.endpoint)),
            LlmProvider::OpenAI => {
                let Some(ref key) = self.config.api_key else {
                    return false;
                };
                self.client
                    .get(format!("{}/v1/models", self.config.endpoint))
                    .bearer_auth(key)
            }
        };
        match request.send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Ask the server to drop the loaded model (Ollama only).
    pub async fn unload(&self) -> Result<(), LlmError> {
        if self.config.provider != LlmProvider::Ollama {
            return Ok(());
        }
        let request = OllamaRequest {
            model: &self.config.model,
            prompt: None,
            stream: false,
            options: None,
            keep_alive: Some(0),
        };
        let url = format!("{}/api/generate", self.config.endpoint);
        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(LlmError::Api(format!("HTTP {}", resp.status())));
        }
        debug!("Unloaded model {}", self.config.model);
        Ok(())
    }

    async fn call_ollama(&self, prompt: &str, max_new_tokens: usize) -> Result<String, LlmError> {
        let request = OllamaRequest {
            model: &self.config.model,
            prompt: Some(prompt),
            stream: false,
            options: Some(OllamaOptions {
                temperature: self.config.temperature,
                num_predict: max_new_tokens,
                num_ctx: self.config.context_window,
            }),
            keep_alive: None,
        };

        let url = format!("{}/api/generate", self.config.endpoint);
        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::NOT_FOUND && body.contains("not found") {
                return Err(LlmError::ModelNotFound(self.config.model.clone()));
            }
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }

        let ollama_resp: OllamaResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        Ok(ollama_resp.response)
    }

    async fn call_openai(&self, prompt: &str, max_new_tokens: usize) -> Result<String, LlmError> {
        let api_key = self.config.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: max_new_tokens,
            temperature: self.config.temperature,
        };

        let url = format!("{}/v1/chat/completions", self.config.endpoint);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }

        let chat: ChatResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        if let Some(err) = chat.error {
            return Err(LlmError::Api(err.message));
        }

        chat.choices
            .and_then(|choices| choices.into_iter().next())
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::Parse("Response has no choices".to_string()))
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    fn context_window(&self) -> usize {
        self.config.context_window
    }

    fn count_tokens(&self, text: &str) -> usize {
        estimate_tokens(text, self.config.chars_per_token)
    }

    async fn generate(&self, prompt: &str, max_new_tokens: usize) -> Result<String, LlmError> {
        debug!(
            "Generating with {} (max {} new tokens)",
            self.config.model, max_new_tokens
        );
        match self.config.provider {
            LlmProvider::Ollama => self.call_ollama(prompt, max_new_tokens).await,
            LlmProvider::OpenAI => self.call_openai(prompt, max_new_tokens).await,
        }
    }

    async fn is_available(&self) -> bool {
        LlmClient::is_available(self).await
    }

    fn availability_hint(&self) -> String {
        self.config.availability_hint()
    }

    async fn unload(&self) -> Result<(), LlmError> {
        LlmClient::unload(self).await
    }
}

/// Estimate a token count from character length.
///
/// Neither Ollama nor OpenAI-compatible servers expose their tokenizer, so
/// prompt length is approximated. Non-positive ratios fall back to 4.
pub fn estimate_tokens(text: &str, chars_per_token: f32) -> usize {
    let ratio = if chars_per_token > 0.0 {
        chars_per_token
    } else {
        4.0
    };
    (text.chars().count() as f32 / ratio).ceil() as usize
}
