//! # chronicle-engine: Turn Orchestration for Chronicle
//!
//! Wires the game-agnostic world model (`chronicle-core`) to the AI
//! collaborator (`chronicle-llm`):
//!
//! ```text
//!   player input ──► WorldOracle::narrate ──► story text
//!                └─► WorldOracle::detect  ──► CreationPipeline ──► WorldModel
//!   player choice ─► WorldOracle::analyze_consequences ──┘
//! ```
//!
//! ## Modules
//!
//! - `config`: layered `chronicle.toml` + `CHRONICLE__*` configuration
//! - `engine`: [`GameEngine`]: turns, choices, save/load
//! - `summary`: the world summary sent with every oracle call
//! - `telemetry`: tracing subscriber setup

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod engine;
pub mod error;
pub mod summary;
pub mod telemetry;

pub use config::EngineConfig;
pub use engine::{GameEngine, TurnOutcome};
pub use error::EngineError;
