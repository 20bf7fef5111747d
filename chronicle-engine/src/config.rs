//! Layered engine configuration.
//!
//! Sources, later ones winning:
//!
//! 1. built-in defaults
//! 2. `chronicle.toml` (optional)
//! 3. `CHRONICLE__<SECTION>__<KEY>` environment variables,
//!    e.g. `CHRONICLE__LLM__MODEL=mistral` or `CHRONICLE__LIMITS__MAX_RUMORS=30`

use std::path::{Path, PathBuf};

use chronicle_core::ChronicleConfig;
use chronicle_llm::LlmSettings;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "CHRONICLE";

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "chronicle.toml";

/// Everything the engine needs: the world model sections, `[llm]` and
/// `[session]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// `[general]`, `[limits]` and `[history]`.
    #[serde(flatten)]
    pub world: ChronicleConfig,
    /// AI backend.
    #[serde(default)]
    pub llm: LlmSettings,
    /// Play-session behaviour.
    #[serde(default)]
    pub session: SessionConfig,
}

/// `[session]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory for save files.
    #[serde(default = "default_save_dir")]
    pub save_dir: PathBuf,
    /// Story text shown when the AI collaborator cannot be reached.
    #[serde(default = "default_fallback_narrative")]
    pub fallback_narrative: String,
    /// Recent passages passed back to the oracle as context.
    #[serde(default = "default_context_passages")]
    pub context_passages: usize,
    /// Time-of-day slots that pass per turn.
    #[serde(default = "default_steps_per_turn")]
    pub time_steps_per_turn: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            save_dir: default_save_dir(),
            fallback_narrative: default_fallback_narrative(),
            context_passages: default_context_passages(),
            time_steps_per_turn: default_steps_per_turn(),
        }
    }
}

fn default_save_dir() -> PathBuf {
    PathBuf::from("saves")
}

fn default_fallback_narrative() -> String {
    "The world holds its breath for a moment. Nothing seems to change, and the way forward is yours to choose."
        .to_string()
}

fn default_context_passages() -> usize {
    6
}

fn default_steps_per_turn() -> u32 {
    1
}

impl EngineConfig {
    /// Assemble configuration from defaults, an optional TOML file and the
    /// environment. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`](crate::EngineError::Config) if a source
    /// is malformed or a value has the wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Parse a TOML string, ignoring the environment.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`](crate::EngineError::Config) on invalid
    /// TOML.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(toml_str, FileFormat::Toml))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
