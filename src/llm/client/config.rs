//! Model client configuration.
//!
//! Env vars for the generative model: LLM_PROVIDER, LLM_ENDPOINT, LLM_API_KEY,
//! LLM_MODEL, LLM_TEMPERATURE, LLM_CONTEXT_WINDOW (plus GROQ_API_KEY /
//! OPENAI_API_KEY auto-detection). The zero-shot scorer reads ZERO_SHOT_MODEL
//! and ZERO_SHOT_ENDPOINT.

use serde::{Deserialize, Serialize};

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Ollama API (local, default)
    #[default]
    Ollama,
    /// OpenAI-compatible API (OpenAI, Groq, Together.ai, etc.)
    #[serde(alias = "groq", alias = "together")]
    OpenAI,
}

impl LlmProvider {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "openai" | "groq" | "together" => Some(Self::OpenAI),
            _ => None,
        }
    }

    /// Endpoint used for a named provider when none is given explicitly.
    fn default_endpoint_for(name: &str) -> Option<&'static str> {
        match name {
            "groq" => Some("https://api.groq.com/openai"),
            "openai" => Some("https://api.openai.com"),
            "together" => Some("https://api.together.xyz"),
            _ => None,
        }
    }
}

/// Configuration for the contextual-batch generative model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider (ollama or openai)
    #[serde(default)]
    pub provider: LlmProvider,
    /// API endpoint (provider-specific defaults apply)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// API key for OpenAI-compatible providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model used for batch classification
    #[serde(default = "default_model")]
    pub model: String,
    /// Temperature for generation (0.0 = greedy)
    #[serde(default)]
    pub temperature: f32,
    /// Model context window in tokens (prompt + completion)
    #[serde(default = "default_context_window")]
    pub context_window: usize,
    /// Completion tokens reserved per sentence in a batch
    #[serde(default = "default_tokens_per_item")]
    pub tokens_per_item: usize,
    /// Completion tokens reserved on top of the per-sentence allowance
    #[serde(default = "default_output_buffer_tokens")]
    pub output_buffer_tokens: usize,
    /// Characters per token used to estimate prompt length
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: f32,
    /// Sentences per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Custom batch prompt ({num_sentences}, {categories}, {sentences}, {example} placeholders)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_prompt: Option<String>,
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "phi3:mini".to_string()
}

fn default_context_window() -> usize {
    4096
}

fn default_tokens_per_item() -> usize {
    80
}

fn default_output_buffer_tokens() -> usize {
    256
}

fn default_chars_per_token() -> f32 {
    4.0
}

fn default_batch_size() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self::base_default().with_env_overrides()
    }
}

impl LlmConfig {
    /// Base default without env overrides.
    pub fn base_default() -> Self {
        Self {
            provider: LlmProvider::default(),
            endpoint: default_endpoint(),
            api_key: None,
            model: default_model(),
            temperature: 0.0,
            context_window: default_context_window(),
            tokens_per_item: default_tokens_per_item(),
            output_buffer_tokens: default_output_buffer_tokens(),
            chars_per_token: default_chars_per_token(),
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
            batch_prompt: None,
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Priority: LLM_PROVIDER wins over auto-detection from API keys.
    /// If LLM_PROVIDER=openai, uses OPENAI_API_KEY even if GROQ_API_KEY is set.
    pub fn with_env_overrides(mut self) -> Self {
        let explicit_provider = std::env::var("LLM_PROVIDER").ok();
        if let Some(ref val) = explicit_provider {
            if let Some(provider) = LlmProvider::from_str(val) {
                self.provider = provider;
            }
        }

        let explicit_endpoint = std::env::var("LLM_ENDPOINT").ok();
        if let Some(ref endpoint) = explicit_endpoint {
            self.endpoint = endpoint.clone();
        }

        if let Ok(val) = std::env::var("LLM_API_KEY") {
            self.api_key = Some(val);
        }

        if let Some(ref provider_str) = explicit_provider {
            let provider_lower = provider_str.to_lowercase();

            if explicit_endpoint.is_none() {
                if let Some(endpoint) = LlmProvider::default_endpoint_for(&provider_lower) {
                    self.endpoint = endpoint.to_string();
                }
            }

            if self.api_key.is_none() {
                match provider_lower.as_str() {
                    "groq" => self.api_key = std::env::var("GROQ_API_KEY").ok(),
                    "openai" => self.api_key = std::env::var("OPENAI_API_KEY").ok(),
                    _ => {}
                }
            }
        } else if self.api_key.is_none() {
            // No explicit provider - auto-detect from available keys
            for (var, name) in [("GROQ_API_KEY", "groq"), ("OPENAI_API_KEY", "openai")] {
                if let Ok(key) = std::env::var(var) {
                    self.api_key = Some(key);
                    self.provider = LlmProvider::OpenAI;
                    if explicit_endpoint.is_none() {
                        if let Some(endpoint) = LlmProvider::default_endpoint_for(name) {
                            self.endpoint = endpoint.to_string();
                        }
                    }
                    break;
                }
            }
        }

        if let Ok(val) = std::env::var("LLM_MODEL") {
            self.model = val;
        }
        if let Ok(val) = std::env::var("LLM_TEMPERATURE") {
            if let Ok(t) = val.parse() {
                self.temperature = t;
            }
        }
        if let Ok(val) = std::env::var("LLM_CONTEXT_WINDOW") {
            if let Ok(n) = val.parse() {
                self.context_window = n;
            }
        }
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Human-readable reason shown when the service is unreachable.
    pub fn availability_hint(&self) -> String {
        match self.provider {
            LlmProvider::Ollama => format!(
                "Ollama not available at {}. Make sure Ollama is running: ollama serve",
                self.endpoint
            ),
            LlmProvider::OpenAI => {
                if self.api_key.is_none() {
                    "API key not set. Set OPENAI_API_KEY, GROQ_API_KEY or LLM_API_KEY".to_string()
                } else {
                    format!("OpenAI-compatible API not available at {}", self.endpoint)
                }
            }
        }
    }
}

/// Configuration for the per-sentence zero-shot classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZeroShotConfig {
    /// Embedding provider (ollama or openai)
    #[serde(default)]
    pub provider: LlmProvider,
    /// API endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// API key for OpenAI-compatible providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Embedding model
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Hypothesis template; `{}` is replaced by the label
    #[serde(default = "default_hypothesis_template")]
    pub hypothesis_template: String,
    /// Softmax temperature applied to cosine similarities
    #[serde(default = "default_softmax_temperature")]
    pub softmax_temperature: f32,
    /// Sentences per batch
    #[serde(default = "default_zero_shot_batch_size")]
    pub batch_size: usize,
    /// HTTP request timeout in seconds
    #[serde(default = "default_zero_shot_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_hypothesis_template() -> String {
    "This sentence is about {}.".to_string()
}

fn default_softmax_temperature() -> f32 {
    0.05
}

fn default_zero_shot_batch_size() -> usize {
    32
}

fn default_zero_shot_timeout_secs() -> u64 {
    60
}

impl Default for ZeroShotConfig {
    fn default() -> Self {
        Self::base_default().with_env_overrides()
    }
}

impl ZeroShotConfig {
    pub fn base_default() -> Self {
        Self {
            provider: LlmProvider::default(),
            endpoint: default_endpoint(),
            api_key: None,
            model: default_embedding_model(),
            hypothesis_template: default_hypothesis_template(),
            softmax_temperature: default_softmax_temperature(),
            batch_size: default_zero_shot_batch_size(),
            timeout_secs: default_zero_shot_timeout_secs(),
        }
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("ZERO_SHOT_MODEL") {
            self.model = val;
        }
        if let Ok(val) = std::env::var("ZERO_SHOT_ENDPOINT") {
            self.endpoint = val;
        }
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn availability_hint(&self) -> String {
        match self.provider {
            LlmProvider::Ollama => format!(
                "Embedding model '{}' not available at {}. Try: ollama pull {}",
                self.model, self.endpoint, self.model
            ),
            LlmProvider::OpenAI => format!(
                "OpenAI-compatible embeddings not available at {}",
                self.endpoint
            ),
        }
    }
}
