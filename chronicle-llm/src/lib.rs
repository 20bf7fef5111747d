//! # chronicle-llm: AI Collaborator Layer for Chronicle
//!
//! Everything generative sits behind the [`WorldOracle`] trait:
//!   - **narrate**: story text for the player's input
//!   - **detect**: new entities, relationships and world deltas as a
//!     [`DetectionPayload`](chronicle_core::DetectionPayload)
//!   - **analyze_consequences**: the same shape plus player standing effects
//!
//! [`LlmOracle`] implements it over Ollama or any OpenAI-compatible API.
//! Model output is parsed leniently: fenced or chatty JSON is accepted and
//! anything unusable becomes an empty payload, never an error.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod error;
pub mod oracle;
pub mod parse;
pub mod prompt;
pub mod types;

pub use client::{LlmClient, LlmProvider};
pub use error::LlmError;
pub use oracle::{LlmOracle, WorldOracle};
pub use prompt::PromptSet;
pub use types::{LlmRequest, LlmResponse, LlmSettings, ProviderKind};
