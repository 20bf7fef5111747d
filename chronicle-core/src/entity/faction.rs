//! Factions: guilds, houses, cults and other organised groups.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::npc::double_option;
use super::{default_score, Entity, EntityData, EntityRecord};
use crate::store::EntityStore;
use crate::types::{clamp_score, EntityKind};

/// An organised group with territory and diplomatic ties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Faction {
    /// Display name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Id of the NPC leading the faction.
    #[serde(default)]
    pub leader: Option<String>,
    /// Political reach in [0, 100].
    #[serde(default = "default_score")]
    pub influence: f32,
    /// Material resources in [0, 100].
    #[serde(default = "default_score")]
    pub wealth: f32,
    /// Armed strength in [0, 100].
    #[serde(default = "default_score")]
    pub military_power: f32,
    /// Ids of locations the faction controls.
    #[serde(default)]
    pub territory: Vec<String>,
    /// Ids of allied factions.
    #[serde(default)]
    pub allies: Vec<String>,
    /// Ids of enemy factions.
    #[serde(default)]
    pub enemies: Vec<String>,
    /// Stated goals.
    #[serde(default)]
    pub goals: Vec<String>,
}

impl Faction {
    /// Create a faction with middling power and no ties.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            leader: None,
            influence: 50.0,
            wealth: 50.0,
            military_power: 50.0,
            territory: Vec::new(),
            allies: Vec::new(),
            enemies: Vec::new(),
            goals: Vec::new(),
        }
    }

    /// Claim a territory.
    #[must_use]
    pub fn claiming(mut self, location: impl Into<String>) -> Self {
        self.territory.push(location.into());
        self
    }

    /// Whether this faction claims `location`.
    #[must_use]
    pub fn controls(&self, location: &str) -> bool {
        self.territory.iter().any(|t| t == location)
    }
}

/// Partial update for a [`Faction`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct FactionPatch {
    /// New display name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New leader; `Some(None)` clears it.
    #[serde(default, with = "double_option")]
    pub leader: Option<Option<String>>,
    /// New influence.
    pub influence: Option<f32>,
    /// New wealth.
    pub wealth: Option<f32>,
    /// New military power.
    pub military_power: Option<f32>,
    /// Replacement territory list.
    pub territory: Option<Vec<String>>,
    /// Replacement ally list.
    pub allies: Option<Vec<String>>,
    /// Replacement enemy list.
    pub enemies: Option<Vec<String>>,
    /// Replacement goals.
    pub goals: Option<Vec<String>>,
}

impl EntityData for Faction {
    const KIND: EntityKind = EntityKind::Faction;
    type Patch = FactionPatch;

    fn name(&self) -> &str {
        &self.name
    }

    fn apply_patch(&mut self, patch: FactionPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(leader) = patch.leader {
            self.leader = leader;
        }
        if let Some(influence) = patch.influence {
            self.influence = influence;
        }
        if let Some(wealth) = patch.wealth {
            self.wealth = wealth;
        }
        if let Some(power) = patch.military_power {
            self.military_power = power;
        }
        if let Some(territory) = patch.territory {
            self.territory = territory;
        }
        if let Some(allies) = patch.allies {
            self.allies = allies;
        }
        if let Some(enemies) = patch.enemies {
            self.enemies = enemies;
        }
        if let Some(goals) = patch.goals {
            self.goals = goals;
        }
    }

    fn normalize(&mut self) {
        self.influence = clamp_score(self.influence);
        self.wealth = clamp_score(self.wealth);
        self.military_power = clamp_score(self.military_power);
    }

    fn into_entity(record: EntityRecord<Self>) -> Entity {
        Entity::Faction(record)
    }

    fn collection(store: &EntityStore) -> &BTreeMap<String, EntityRecord<Self>> {
        &store.factions
    }

    fn collection_mut(store: &mut EntityStore) -> &mut BTreeMap<String, EntityRecord<Self>> {
        &mut store.factions
    }
}
