//! Configuration for the Chronicle world model.
//!
//! Maps directly to `chronicle.toml`. Every field has a default so a missing
//! file or a partial section is always valid.

use serde::{Deserialize, Serialize};

/// Top-level Chronicle configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChronicleConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Capacity constants consulted by the validation engine.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Retention windows for audit logs.
    #[serde(default)]
    pub history: HistoryConfig,
}

impl ChronicleConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `ChronicleError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::ChronicleError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text.
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Capacity and bound constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum NPCs whose `location` may reference a single location.
    #[serde(default = "default_20")]
    pub max_npcs_per_location: usize,
    /// Maximum factions that may claim the same territory.
    #[serde(default = "default_3")]
    pub max_factions_per_territory: usize,
    /// Minimum strength for an ally edge to be considered a trusted alliance.
    #[serde(default = "default_60")]
    pub min_trust_for_alliance: u32,
    /// Maximum items a single holder may own.
    #[serde(default = "default_50")]
    pub max_inventory_items: usize,
    /// Maximum concurrently active world events.
    #[serde(default = "default_10")]
    pub max_active_events: usize,
    /// Maximum rumors retained in the information feed.
    #[serde(default = "default_15")]
    pub max_rumors: usize,
    /// Maximum news items retained in the information feed.
    #[serde(default = "default_20")]
    pub max_news: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_npcs_per_location: 20,
            max_factions_per_territory: 3,
            min_trust_for_alliance: 60,
            max_inventory_items: 50,
            max_active_events: 10,
            max_rumors: 15,
            max_news: 20,
        }
    }
}

/// Audit-log retention windows (most-recent N entries are kept).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Global relationship ledger.
    #[serde(default = "default_1000")]
    pub relationship_history_limit: usize,
    /// Per-edge history.
    #[serde(default = "default_50")]
    pub edge_history_limit: usize,
    /// Per-entity player standing history.
    #[serde(default = "default_50")]
    pub standing_history_limit: usize,
    /// World parameter change log.
    #[serde(default = "default_1000")]
    pub parameter_history_limit: usize,
    /// Per-kind creation audit log. `None` keeps everything.
    #[serde(default)]
    pub creation_history_limit: Option<usize>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            relationship_history_limit: 1000,
            edge_history_limit: 50,
            standing_history_limit: 50,
            parameter_history_limit: 1000,
            creation_history_limit: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_log_level() -> String { "info".to_string() }
fn default_3() -> usize { 3 }
fn default_10() -> usize { 10 }
fn default_15() -> usize { 15 }
fn default_20() -> usize { 20 }
fn default_50() -> usize { 50 }
fn default_60() -> u32 { 60 }
fn default_1000() -> usize { 1000 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = ChronicleConfig::from_toml("").expect("empty config parses");
        assert_eq!(config.limits.max_npcs_per_location, 20);
        assert_eq!(config.limits.max_rumors, 15);
        assert_eq!(config.history.relationship_history_limit, 1000);
        assert!(config.history.creation_history_limit.is_none());
    }

    #[test]
    fn partial_section_overrides_only_named_fields() {
        let config = ChronicleConfig::from_toml(
            "[limits]\nmax_npcs_per_location = 2\n\n[history]\ncreation_history_limit = 100\n",
        )
        .expect("parses");
        assert_eq!(config.limits.max_npcs_per_location, 2);
        assert_eq!(config.limits.max_factions_per_territory, 3);
        assert_eq!(config.history.creation_history_limit, Some(100));
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = ChronicleConfig::from_toml("[limits\n").expect_err("should fail");
        assert!(matches!(err, crate::ChronicleError::Config(_)));
    }
}
