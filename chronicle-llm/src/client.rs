//! LLM Client: one interface over Ollama and OpenAI-compatible backends.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{LlmError, Result};
use crate::types::{LlmRequest, LlmResponse, LlmSettings, ProviderKind, ResponseFormat};

/// Provider backend for LLM inference.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    /// Ollama running locally.
    Ollama {
        /// e.g. `http://localhost:11434`.
        base_url: String,
    },
    /// OpenAI-compatible chat completions API.
    OpenAiCompatible {
        /// e.g. `https://api.openai.com`.
        base_url: String,
        /// Bearer token.
        api_key: String,
    },
    /// No backend; every call fails so the caller falls back.
    None,
}

impl LlmProvider {
    /// Build the provider described by `settings`. An OpenAI-compatible
    /// backend without an API key degrades to [`LlmProvider::None`].
    #[must_use]
    pub fn from_settings(settings: &LlmSettings) -> Self {
        let base_url = settings.base_url.trim_end_matches('/').to_string();
        match settings.provider {
            ProviderKind::Ollama => Self::Ollama { base_url },
            ProviderKind::OpenAiCompatible => match settings.api_key.as_deref().filter(|k| !k.is_empty()) {
                Some(key) => Self::OpenAiCompatible {
                    base_url,
                    api_key: key.to_string(),
                },
                None => {
                    warn!("OpenAI-compatible provider configured without an api_key; AI calls disabled");
                    Self::None
                }
            },
            ProviderKind::None => Self::None,
        }
    }
}

/// A fully prepared HTTP call.
#[derive(Debug)]
struct Call<'a> {
    url: String,
    body: Value,
    bearer: Option<&'a str>,
}

/// The LLM client used by the oracle.
#[derive(Debug, Clone)]
pub struct LlmClient {
    provider: LlmProvider,
    http: Client,
    model: String,
    max_retries: u32,
}

impl LlmClient {
    /// Create a new LLM client.
    #[must_use]
    pub fn new(provider: LlmProvider, model: impl Into<String>, max_retries: u32) -> Self {
        Self {
            provider,
            http: Client::new(),
            model: model.into(),
            max_retries,
        }
    }

    /// Create a client from the `[llm]` configuration section.
    #[must_use]
    pub fn from_settings(settings: &LlmSettings) -> Self {
        Self::new(LlmProvider::from_settings(settings), settings.model.clone(), settings.max_retries)
    }

    /// Create a client with no backend (all calls fail).
    #[must_use]
    pub fn none() -> Self {
        Self::new(LlmProvider::None, String::new(), 0)
    }

    /// Check if the client has a backend configured.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !matches!(self.provider, LlmProvider::None)
    }

    /// Model name sent with each request.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate a completion, retrying transient failures.
    ///
    /// # Errors
    ///
    /// [`LlmError::Unavailable`] without a backend, the first
    /// non-retryable error, or [`LlmError::RetriesExhausted`].
    pub async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let call = self.prepare(request)?;

        let mut last_error = String::new();
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                debug!(attempt = attempt + 1, of = self.max_retries + 1, "retrying LLM call");
            }

            let start = Instant::now();
            match self.send(&call, request.timeout_ms).await {
                Ok(json) => {
                    let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                    let (text, tokens) = self.extract(&json);
                    debug!(latency_ms, tokens, "LLM call succeeded");
                    return Ok(LlmResponse {
                        text,
                        tokens_generated: tokens,
                        latency_ms,
                        model: self.model.clone(),
                    });
                }
                Err(err) if err.is_retryable() => {
                    warn!(error = %err, attempt = attempt + 1, "LLM call failed");
                    last_error = err.to_string();
                }
                Err(err) => return Err(err),
            }
        }

        Err(LlmError::RetriesExhausted {
            attempts: self.max_retries + 1,
            last_error,
        })
    }

    fn prepare(&self, request: &LlmRequest) -> Result<Call<'_>> {
        match &self.provider {
            LlmProvider::None => Err(LlmError::Unavailable("no LLM provider configured".into())),
            LlmProvider::Ollama { base_url } => {
                let mut body = json!({
                    "model": self.model,
                    "system": request.system,
                    "prompt": request.user,
                    "stream": false,
                    "options": {
                        "temperature": request.temperature,
                        "num_predict": request.max_tokens,
                    }
                });
                if request.format == ResponseFormat::Json {
                    body["format"] = json!("json");
                }
                Ok(Call {
                    url: format!("{base_url}/api/generate"),
                    body,
                    bearer: None,
                })
            }
            LlmProvider::OpenAiCompatible { base_url, api_key } => {
                let mut body = json!({
                    "model": self.model,
                    "messages": [
                        { "role": "system", "content": request.system },
                        { "role": "user", "content": request.user },
                    ],
                    "max_tokens": request.max_tokens,
                    "temperature": request.temperature,
                });
                if request.format == ResponseFormat::Json {
                    body["response_format"] = json!({ "type": "json_object" });
                }
                Ok(Call {
                    url: format!("{base_url}/v1/chat/completions"),
                    body,
                    bearer: Some(api_key.as_str()),
                })
            }
        }
    }

    async fn send(&self, call: &Call<'_>, timeout_ms: u64) -> Result<Value> {
        let mut builder = self
            .http
            .post(&call.url)
            .json(&call.body)
            .timeout(Duration::from_millis(timeout_ms));
        if let Some(token) = call.bearer {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(timeout_ms)
            } else {
                LlmError::from(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body: String = response.text().await.unwrap_or_default().chars().take(500).collect();
            return Err(LlmError::Http {
                status: status.as_u16(),
                body,
            });
        }
        response.json::<Value>().await.map_err(|e| LlmError::Decode(e.to_string()))
    }

    fn extract(&self, json: &Value) -> (String, u32) {
        let (text, tokens) = match self.provider {
            LlmProvider::OpenAiCompatible { .. } => (
                &json["choices"][0]["message"]["content"],
                &json["usage"]["completion_tokens"],
            ),
            LlmProvider::Ollama { .. } | LlmProvider::None => (&json["response"], &json["eval_count"]),
        };
        let tokens = tokens.as_u64().map_or(0, |n| u32::try_from(n).unwrap_or(u32::MAX));
        (text.as_str().unwrap_or_default().to_string(), tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn openai() -> LlmClient {
        LlmClient::new(
            LlmProvider::OpenAiCompatible {
                base_url: "https://example.invalid".into(),
                api_key: "sk-test".into(),
            },
            "gpt-test",
            1,
        )
    }

    #[tokio::test]
    async fn none_provider_is_unavailable() {
        let client = LlmClient::none();
        assert!(!client.is_available());
        let err = client
            .generate(&LlmRequest::prose("system", "user"))
            .await
            .expect_err("no backend");
        assert!(matches!(err, LlmError::Unavailable(_)));
    }

    #[test]
    fn ollama_json_requests_set_format() {
        let client = LlmClient::new(
            LlmProvider::Ollama {
                base_url: "http://localhost:11434".into(),
            },
            "llama3",
            0,
        );
        let call = client
            .prepare(&LlmRequest::structured("sys", "usr"))
            .expect("prepared");
        assert_eq!(call.url, "http://localhost:11434/api/generate");
        assert_eq!(call.body["format"], "json");
        assert_eq!(call.body["system"], "sys");
        assert!(call.bearer.is_none());

        let prose = client.prepare(&LlmRequest::prose("sys", "usr")).expect("prepared");
        assert!(prose.body.get("format").is_none());
    }

    #[test]
    fn openai_requests_carry_bearer_and_json_mode() {
        let client = openai();
        let call = client
            .prepare(&LlmRequest::structured("sys", "usr"))
            .expect("prepared");
        assert_eq!(call.url, "https://example.invalid/v1/chat/completions");
        assert_eq!(call.bearer, Some("sk-test"));
        assert_eq!(call.body["response_format"]["type"], "json_object");
        assert_eq!(call.body["messages"][1]["content"], "usr");
    }

    #[test]
    fn extracts_text_per_provider() {
        let (text, tokens) = openai().extract(&json!({
            "choices": [{ "message": { "content": "The gate creaks." } }],
            "usage": { "completion_tokens": 4 }
        }));
        assert_eq!(text, "The gate creaks.");
        assert_eq!(tokens, 4);

        let ollama = LlmClient::new(LlmProvider::Ollama { base_url: String::new() }, "m", 0);
        let (text, tokens) = ollama.extract(&json!({ "response": "Rain.", "eval_count": 2 }));
        assert_eq!((text.as_str(), tokens), ("Rain.", 2));
    }

    #[test]
    fn openai_without_key_is_disabled() {
        let settings = LlmSettings {
            provider: ProviderKind::OpenAiCompatible,
            api_key: None,
            ..LlmSettings::default()
        };
        assert!(matches!(LlmProvider::from_settings(&settings), LlmProvider::None));
    }
}
