//! Request/response types and client settings.

use serde::{Deserialize, Serialize};

/// Expected shape of the model's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Free prose (story text).
    Text,
    /// A single JSON object (detection and consequence payloads).
    Json,
}

/// A request to the LLM.
#[derive(Debug, Clone, Serialize)]
pub struct LlmRequest {
    /// System prompt (narrator persona, output rules).
    pub system: String,
    /// User prompt (player input, context, world summary).
    pub user: String,
    /// Expected output shape.
    pub format: ResponseFormat,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Temperature (0.0 = deterministic, 1.0 = creative).
    pub temperature: f32,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl LlmRequest {
    /// A prose request with narrator-friendly sampling.
    #[must_use]
    pub fn prose(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            format: ResponseFormat::Text,
            max_tokens: 400,
            temperature: 0.8,
            timeout_ms: 30_000,
        }
    }

    /// A JSON request with low temperature.
    #[must_use]
    pub fn structured(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            format: ResponseFormat::Json,
            max_tokens: 800,
            temperature: 0.3,
            timeout_ms: 30_000,
        }
    }

    /// Set the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set sampling parameters.
    #[must_use]
    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }
}

/// A response from the LLM.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmResponse {
    /// The generated text.
    pub text: String,
    /// How many tokens were generated.
    pub tokens_generated: u32,
    /// Latency in milliseconds.
    pub latency_ms: u64,
    /// Which model was used.
    pub model: String,
}

/// Backend kind as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Ollama running locally.
    #[default]
    Ollama,
    /// OpenAI-compatible chat completions API.
    #[serde(alias = "openai")]
    OpenAiCompatible,
    /// No backend; every call fails and the engine falls back.
    None,
}

/// `[llm]` configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Backend kind.
    #[serde(default)]
    pub provider: ProviderKind,
    /// Base URL of the backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API key (OpenAI-compatible only).
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,
    /// Retries after the first attempt.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Directory of TOML prompt overrides.
    #[serde(default)]
    pub prompt_dir: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            base_url: default_base_url(),
            api_key: None,
            model: default_model(),
            max_retries: default_retries(),
            timeout_ms: default_timeout_ms(),
            prompt_dir: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_retries() -> u32 {
    2
}

fn default_timeout_ms() -> u64 {
    30_000
}
