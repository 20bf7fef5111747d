//! Non-player characters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{default_full, default_score, default_true, Entity, EntityData, EntityRecord};
use crate::store::EntityStore;
use crate::types::{clamp_score, EntityKind};

/// How an NPC feels about the player. Each axis is independently bounded
/// to [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affinity {
    /// Willingness to rely on the player.
    #[serde(default = "default_score")]
    pub trust: f32,
    /// How threatening the player seems.
    #[serde(default)]
    pub fear: f32,
    /// Regard for the player's competence or station.
    #[serde(default = "default_score")]
    pub respect: f32,
    /// Personal warmth toward the player.
    #[serde(default)]
    pub love: f32,
}

impl Default for Affinity {
    fn default() -> Self {
        Self {
            trust: 50.0,
            fear: 0.0,
            respect: 50.0,
            love: 0.0,
        }
    }
}

impl Affinity {
    /// Clamp every axis to [0, 100].
    pub fn clamp(&mut self) {
        self.trust = clamp_score(self.trust);
        self.fear = clamp_score(self.fear);
        self.respect = clamp_score(self.respect);
        self.love = clamp_score(self.love);
    }
}

/// A non-player character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Npc {
    /// Display name.
    pub name: String,
    /// Trade or role, e.g. "blacksmith".
    #[serde(default)]
    pub occupation: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Id of the location the NPC is found at.
    #[serde(default)]
    pub location: Option<String>,
    /// Id of the faction the NPC belongs to.
    #[serde(default)]
    pub faction: Option<String>,
    /// Personality tags.
    #[serde(default)]
    pub personality: Vec<String>,
    /// Feelings toward the player.
    #[serde(flatten)]
    pub affinity: Affinity,
    /// Whether the NPC is alive.
    #[serde(default = "default_true")]
    pub alive: bool,
    /// Whether the player has met this NPC.
    #[serde(default)]
    pub met_player: bool,
    /// Health in [0, 100].
    #[serde(default = "default_full")]
    pub health: f32,
}

impl Npc {
    /// Create a living NPC with default affinity and full health.
    #[must_use]
    pub fn new(name: impl Into<String>, occupation: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            occupation: occupation.into(),
            description: String::new(),
            location: None,
            faction: None,
            personality: Vec::new(),
            affinity: Affinity::default(),
            alive: true,
            met_player: false,
            health: 100.0,
        }
    }

    /// Place the NPC at a location.
    #[must_use]
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Enrol the NPC in a faction.
    #[must_use]
    pub fn in_faction(mut self, faction: impl Into<String>) -> Self {
        self.faction = Some(faction.into());
        self
    }
}

/// Partial update for an [`Npc`]. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct NpcPatch {
    /// New display name.
    pub name: Option<String>,
    /// New occupation.
    pub occupation: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New location; `Some(None)` clears it.
    #[serde(default, with = "double_option")]
    pub location: Option<Option<String>>,
    /// New faction; `Some(None)` clears it.
    #[serde(default, with = "double_option")]
    pub faction: Option<Option<String>>,
    /// Replacement personality tags.
    pub personality: Option<Vec<String>>,
    /// New trust value.
    pub trust: Option<f32>,
    /// New fear value.
    pub fear: Option<f32>,
    /// New respect value.
    pub respect: Option<f32>,
    /// New love value.
    pub love: Option<f32>,
    /// New alive flag.
    pub alive: Option<bool>,
    /// New met-player flag.
    pub met_player: Option<bool>,
    /// New health value.
    pub health: Option<f32>,
}

impl EntityData for Npc {
    const KIND: EntityKind = EntityKind::Npc;
    type Patch = NpcPatch;

    fn name(&self) -> &str {
        &self.name
    }

    fn apply_patch(&mut self, patch: NpcPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(occupation) = patch.occupation {
            self.occupation = occupation;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(faction) = patch.faction {
            self.faction = faction;
        }
        if let Some(personality) = patch.personality {
            self.personality = personality;
        }
        if let Some(trust) = patch.trust {
            self.affinity.trust = trust;
        }
        if let Some(fear) = patch.fear {
            self.affinity.fear = fear;
        }
        if let Some(respect) = patch.respect {
            self.affinity.respect = respect;
        }
        if let Some(love) = patch.love {
            self.affinity.love = love;
        }
        if let Some(alive) = patch.alive {
            self.alive = alive;
        }
        if let Some(met) = patch.met_player {
            self.met_player = met;
        }
        if let Some(health) = patch.health {
            self.health = health;
        }
    }

    fn normalize(&mut self) {
        self.affinity.clamp();
        self.health = clamp_score(self.health);
        if self.health <= 0.0 {
            self.alive = false;
        }
    }

    fn into_entity(record: EntityRecord<Self>) -> Entity {
        Entity::Npc(record)
    }

    fn collection(store: &EntityStore) -> &BTreeMap<String, EntityRecord<Self>> {
        &store.npcs
    }

    fn collection_mut(store: &mut EntityStore) -> &mut BTreeMap<String, EntityRecord<Self>> {
        &mut store.npcs
    }
}

/// Distinguishes "field absent" from "field explicitly null" in patches.
pub(crate) mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}
