//! Errors from the AI collaborator layer.
//!
//! None of these reach the player: the engine turns any of them into a
//! fallback narrative and an empty payload.

use thiserror::Error;

/// Errors that can occur while talking to the AI collaborator.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The backend answered with a non-success status.
    #[error("LLM backend returned HTTP {status}: {body}")]
    Http {
        /// Status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The request never produced a response.
    #[error("LLM transport error: {0}")]
    Transport(String),

    /// Request timed out.
    #[error("LLM request timed out after {0}ms")]
    Timeout(u64),

    /// No provider is reachable or configured.
    #[error("LLM provider unavailable: {0}")]
    Unavailable(String),

    /// The response envelope could not be decoded.
    #[error("Failed to decode LLM response: {0}")]
    Decode(String),

    /// All retry attempts exhausted.
    #[error("All LLM retry attempts exhausted after {attempts} tries: {last_error}")]
    RetriesExhausted {
        /// Attempts made, including the first.
        attempts: u32,
        /// Error from the final attempt.
        last_error: String,
    },

    /// A prompt template could not be loaded or is missing.
    #[error("prompt template error: {0}")]
    Prompt(String),
}

impl LlmError {
    /// Whether another attempt could plausibly succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Unavailable(_) | Self::Decode(_) | Self::RetriesExhausted { .. } | Self::Prompt(_) => false,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            LlmError::Unavailable(err.to_string())
        } else if err.is_decode() {
            LlmError::Decode(err.to_string())
        } else {
            LlmError::Transport(err.to_string())
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, LlmError>;
