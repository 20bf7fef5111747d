//! Core type definitions shared across the world model.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ChronicleError;

/// Wall-clock timestamp used for every audit record.
pub type Timestamp = DateTime<Utc>;

/// Free-form metadata attached to entity records.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Identifier reserved for the player in relationship endpoints and item ownership.
pub const PLAYER_ID: &str = "player";

// ---------------------------------------------------------------------------
// Entity kinds
// ---------------------------------------------------------------------------

/// The five addressable kinds of world entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Non-player character.
    Npc,
    /// Political or social group.
    Faction,
    /// Place in the world.
    Location,
    /// Physical object.
    Item,
    /// Something happening in the world.
    Event,
}

impl EntityKind {
    /// Every kind, in the order the creation pipeline admits them.
    pub const ALL: [Self; 5] = [
        Self::Location,
        Self::Faction,
        Self::Npc,
        Self::Item,
        Self::Event,
    ];

    /// Plural collection name used in snapshots and payloads.
    #[must_use]
    pub fn plural(self) -> &'static str {
        match self {
            Self::Npc => "npcs",
            Self::Faction => "factions",
            Self::Location => "locations",
            Self::Item => "items",
            Self::Event => "events",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Npc => "npc",
            Self::Faction => "faction",
            Self::Location => "location",
            Self::Item => "item",
            Self::Event => "event",
        };
        f.write_str(name)
    }
}

impl FromStr for EntityKind {
    type Err = ChronicleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "npc" | "npcs" | "character" | "characters" => Ok(Self::Npc),
            "faction" | "factions" => Ok(Self::Faction),
            "location" | "locations" => Ok(Self::Location),
            "item" | "items" => Ok(Self::Item),
            "event" | "events" => Ok(Self::Event),
            _ => Err(ChronicleError::UnknownEntityKind(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Clamp a score to the conventional [0, 100] range.
#[must_use]
pub fn clamp_score(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Append `entry` to a chronological log, dropping the oldest entries
/// beyond `limit`.
pub fn push_bounded<T>(log: &mut Vec<T>, entry: T, limit: usize) {
    log.push(entry);
    if log.len() > limit {
        let excess = log.len() - limit;
        log.drain(..excess);
    }
}

/// Derive an id from a display name: lowercase ASCII alphanumerics joined by
/// single underscores. `"Old Tom's Inn"` becomes `"old_tom_s_inn"`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    slug
}
