//! Snapshot export/import: the whole world, the player and session metadata
//! as one JSON document.
//!
//! Import checks the document's shape before building anything, so a
//! rejected document leaves no partial state behind.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::config::ChronicleConfig;
use crate::error::{ChronicleError, Result};
use crate::model::WorldModel;
use crate::relationship::{RelationshipExport, RelationshipGraph};
use crate::store::{CreationHistory, EntityStore, EntityTables};
use crate::types::Timestamp;
use crate::world::{WorldState, WorldStateExport};

/// Format version written into every snapshot.
pub const SNAPSHOT_VERSION: &str = "1.0";

/// Top-level keys a snapshot must contain.
pub const REQUIRED_SECTIONS: [&str; 4] = ["player", "entities", "worldState", "meta"];

/// The player character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    /// Character name.
    pub name: String,
    /// Free-text background.
    #[serde(default)]
    pub background: String,
    /// Id of the current location.
    #[serde(default)]
    pub location: Option<String>,
    /// Health in [0, 100].
    #[serde(default = "default_health")]
    pub health: f32,
    /// Coin carried.
    #[serde(default)]
    pub gold: u32,
    /// Character traits.
    #[serde(default)]
    pub traits: Vec<String>,
}

fn default_health() -> f32 {
    100.0
}

impl PlayerProfile {
    /// A healthy, penniless character.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            background: String::new(),
            location: None,
            health: 100.0,
            gold: 0,
            traits: Vec::new(),
        }
    }
}

impl Default for PlayerProfile {
    fn default() -> Self {
        Self::new("Traveller")
    }
}

/// Session bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMeta {
    /// Snapshot format version.
    pub version: String,
    /// Unique id of the play session.
    pub session_id: String,
    /// Choices made so far.
    #[serde(default)]
    pub choice_count: u64,
    /// When the session was last saved.
    #[serde(default)]
    pub last_save: Option<Timestamp>,
}

impl Default for SessionMeta {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionMeta {
    /// A new session with a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: SNAPSHOT_VERSION.to_string(),
            session_id: Uuid::new_v4().to_string(),
            choice_count: 0,
            last_save: None,
        }
    }
}

/// A complete saved game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// The player character.
    pub player: PlayerProfile,
    /// Entities keyed by kind, then id.
    pub entities: EntityTables,
    /// Edges, ledger and player standings.
    #[serde(default)]
    pub relationships: RelationshipExport,
    /// Parameters, clock, events, information and history.
    pub world_state: WorldStateExport,
    /// Session bookkeeping.
    pub meta: SessionMeta,
    /// Per-kind creation audit log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_history: Option<CreationHistory>,
}

impl Snapshot {
    /// Capture the current state. `meta.last_save` is stamped with now.
    #[must_use]
    pub fn capture(model: &WorldModel, player: &PlayerProfile, meta: &SessionMeta) -> Self {
        let mut meta = meta.clone();
        meta.last_save = Some(Utc::now());
        Self {
            player: player.clone(),
            entities: model.entities.tables(),
            relationships: model.relationships.export(),
            world_state: model.world.export(),
            meta,
            creation_history: Some(model.entities.full_creation_history()),
        }
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ChronicleError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a snapshot document.
    ///
    /// # Errors
    ///
    /// Returns [`ChronicleError::InvalidSnapshot`] if the document is not
    /// an object, lacks a required section, or a section does not decode.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| ChronicleError::InvalidSnapshot(e.to_string()))?;
        Self::from_value(value)
    }

    /// As [`from_json`](Self::from_json), from an already-parsed value.
    ///
    /// # Errors
    ///
    /// See [`from_json`](Self::from_json).
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let Some(root) = value.as_object() else {
            return Err(ChronicleError::InvalidSnapshot("document is not a JSON object".into()));
        };
        let missing: Vec<&str> = REQUIRED_SECTIONS
            .into_iter()
            .filter(|key| !root.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(ChronicleError::InvalidSnapshot(format!(
                "missing section(s): {}",
                missing.join(", ")
            )));
        }
        serde_json::from_value(value).map_err(|e| ChronicleError::InvalidSnapshot(e.to_string()))
    }

    /// Rebuild the world, player and session. Limits and retention come from
    /// `config`, not from the snapshot.
    #[must_use]
    pub fn restore(self, config: ChronicleConfig) -> (WorldModel, PlayerProfile, SessionMeta) {
        let entities = EntityStore::from_parts(
            self.entities,
            self.creation_history.unwrap_or_default(),
            config.history.creation_history_limit,
        );
        let relationships = RelationshipGraph::from_export(self.relationships, &config.history);
        let world = WorldState::from_export(self.world_state, &config);
        info!(
            session = %self.meta.session_id,
            entities = entities.total_count(),
            edges = relationships.edge_count(),
            "snapshot restored"
        );
        let model = WorldModel {
            entities,
            relationships,
            world,
            config,
        };
        (model, self.player, self.meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Npc, LocationType, Location};
    use crate::relationship::{RelationshipInput, RelationshipType};
    use crate::world::WorldParameter;

    fn populated() -> WorldModel {
        let mut model = WorldModel::default();
        model
            .entities
            .create("anchor", Location::new("Rusty Anchor", LocationType::Tavern))
            .expect("location");
        model.entities.create("tom", Npc::new("Tom", "innkeeper").at("anchor")).expect("npc");
        model.entities.create("mira", Npc::new("Mira", "healer")).expect("npc");
        model
            .relationships
            .set_relationship("tom", "mira", RelationshipInput::new(RelationshipType::Friend, 70.0, "old friends"))
            .expect("edge");
        model.relationships.update_player_standing("tom", 12.0, "tipped well");
        model.world.adjust(WorldParameter::Tension, 15.0, "bandits");
        model.world.add_news("The bridge is out");
        model
    }

    #[test]
    fn round_trip_reproduces_state() {
        let model = populated();
        let meta = SessionMeta::new();
        let json = Snapshot::capture(&model, &PlayerProfile::new("Ayla"), &meta)
            .to_json()
            .expect("encode");

        let (restored, player, restored_meta) = Snapshot::from_json(&json).expect("decode").restore(ChronicleConfig::default());
        assert_eq!(player.name, "Ayla");
        assert_eq!(restored_meta.session_id, meta.session_id);
        assert!(restored_meta.last_save.is_some());
        assert_eq!(restored.entities.tables(), model.entities.tables());
        assert_eq!(restored.relationships.export(), model.relationships.export());
        assert_eq!(restored.world.export(), model.world.export());
    }

    #[test]
    fn edges_are_keyed_by_endpoints() {
        let snapshot = Snapshot::capture(&populated(), &PlayerProfile::default(), &SessionMeta::new());
        let json: serde_json::Value = serde_json::to_value(&snapshot).expect("encode");
        assert!(json["relationships"]["edges"]["tom->mira"].is_object());
        assert!(json["relationships"]["playerStandings"]["tom"].is_object());
        assert!(json["worldState"]["parameters"]["tension"].is_number());
        assert!(json["entities"]["npcs"]["tom"].is_object());
    }

    #[test]
    fn missing_meta_is_rejected() {
        let snapshot = Snapshot::capture(&populated(), &PlayerProfile::default(), &SessionMeta::new());
        let mut json = serde_json::to_value(&snapshot).expect("encode");
        json.as_object_mut().expect("object").remove("meta");

        let err = Snapshot::from_value(json).expect_err("must reject");
        assert!(matches!(err, ChronicleError::InvalidSnapshot(ref msg) if msg.contains("meta")));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(Snapshot::from_json("[1, 2, 3]"), Err(ChronicleError::InvalidSnapshot(_))));
        assert!(matches!(Snapshot::from_json("{not json"), Err(ChronicleError::InvalidSnapshot(_))));
    }
}
