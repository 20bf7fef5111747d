//! Locations and the population bands expected for each location type.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::npc::double_option;
use super::{default_score, normalize_label, Entity, EntityData, EntityRecord};
use crate::store::EntityStore;
use crate::types::{clamp_score, EntityKind};

/// Broad category of a location.
///
/// Parsed leniently from free text; anything unrecognised becomes
/// [`LocationType::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LocationType {
    /// Small rural settlement.
    Village,
    /// Mid-sized settlement.
    Town,
    /// Large settlement.
    City,
    /// Seat of a realm.
    Capital,
    /// Fortification or keep.
    Castle,
    /// Inn or tavern.
    Tavern,
    /// Shop or market stall.
    Shop,
    /// Temple, shrine or church.
    Temple,
    /// Dungeon, cave or mine.
    Dungeon,
    /// Forest, road or open country.
    Wilderness,
    /// Abandoned ruins.
    Ruins,
    /// Unclassified.
    #[default]
    Other,
}

impl LocationType {
    /// Population band considered plausible for this type.
    #[must_use]
    pub fn population_range(self) -> RangeInclusive<u32> {
        match self {
            Self::Village => 20..=1_000,
            Self::Town => 500..=10_000,
            Self::City => 5_000..=200_000,
            Self::Capital => 20_000..=1_000_000,
            Self::Castle => 10..=2_000,
            Self::Tavern => 0..=100,
            Self::Shop => 0..=30,
            Self::Temple => 0..=300,
            Self::Dungeon => 0..=200,
            Self::Wilderness => 0..=100,
            Self::Ruins => 0..=50,
            Self::Other => 0..=u32::MAX,
        }
    }

    /// Whether this type is a settlement that hosts many trades.
    #[must_use]
    pub fn is_settlement(self) -> bool {
        matches!(self, Self::Village | Self::Town | Self::City | Self::Capital)
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Village => "village",
            Self::Town => "town",
            Self::City => "city",
            Self::Capital => "capital",
            Self::Castle => "castle",
            Self::Tavern => "tavern",
            Self::Shop => "shop",
            Self::Temple => "temple",
            Self::Dungeon => "dungeon",
            Self::Wilderness => "wilderness",
            Self::Ruins => "ruins",
            Self::Other => "other",
        }
    }
}

impl From<String> for LocationType {
    fn from(raw: String) -> Self {
        match normalize_label(&raw).as_str() {
            "village" | "hamlet" => Self::Village,
            "town" => Self::Town,
            "city" => Self::City,
            "capital" | "capital_city" => Self::Capital,
            "castle" | "fort" | "fortress" | "keep" => Self::Castle,
            "tavern" | "inn" | "pub" => Self::Tavern,
            "shop" | "store" | "market" | "smithy" | "forge" => Self::Shop,
            "temple" | "shrine" | "church" | "monastery" => Self::Temple,
            "dungeon" | "cave" | "mine" | "crypt" => Self::Dungeon,
            "wilderness" | "forest" | "road" | "mountain" | "plains" | "swamp" => Self::Wilderness,
            "ruins" | "ruin" => Self::Ruins,
            _ => Self::Other,
        }
    }
}

impl From<LocationType> for String {
    fn from(value: LocationType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A place in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Display name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Broad category.
    #[serde(default)]
    pub location_type: LocationType,
    /// Safety in [0, 100].
    #[serde(default = "default_score")]
    pub safety: f32,
    /// Resident population.
    #[serde(default)]
    pub population: u32,
    /// Ids of directly reachable locations.
    #[serde(default)]
    pub connections: Vec<String>,
    /// Id of the faction in control.
    #[serde(default)]
    pub controlling_faction: Option<String>,
}

impl Location {
    /// Create an unconnected location of the given type.
    #[must_use]
    pub fn new(name: impl Into<String>, location_type: LocationType) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            location_type,
            safety: 50.0,
            population: 0,
            connections: Vec::new(),
            controlling_faction: None,
        }
    }

    /// Set the population.
    #[must_use]
    pub fn with_population(mut self, population: u32) -> Self {
        self.population = population;
        self
    }

    /// Connect to another location id.
    #[must_use]
    pub fn connected_to(mut self, other: impl Into<String>) -> Self {
        self.connections.push(other.into());
        self
    }
}

/// Partial update for a [`Location`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct LocationPatch {
    /// New display name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New type.
    pub location_type: Option<LocationType>,
    /// New safety.
    pub safety: Option<f32>,
    /// New population.
    pub population: Option<u32>,
    /// Replacement connection list.
    pub connections: Option<Vec<String>>,
    /// New controlling faction; `Some(None)` clears it.
    #[serde(default, with = "double_option")]
    pub controlling_faction: Option<Option<String>>,
}

impl EntityData for Location {
    const KIND: EntityKind = EntityKind::Location;
    type Patch = LocationPatch;

    fn name(&self) -> &str {
        &self.name
    }

    fn apply_patch(&mut self, patch: LocationPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(location_type) = patch.location_type {
            self.location_type = location_type;
        }
        if let Some(safety) = patch.safety {
            self.safety = safety;
        }
        if let Some(population) = patch.population {
            self.population = population;
        }
        if let Some(connections) = patch.connections {
            self.connections = connections;
        }
        if let Some(faction) = patch.controlling_faction {
            self.controlling_faction = faction;
        }
    }

    fn normalize(&mut self) {
        self.safety = clamp_score(self.safety);
    }

    fn into_entity(record: EntityRecord<Self>) -> Entity {
        Entity::Location(record)
    }

    fn collection(store: &EntityStore) -> &BTreeMap<String, EntityRecord<Self>> {
        &store.locations
    }

    fn collection_mut(store: &mut EntityStore) -> &mut BTreeMap<String, EntityRecord<Self>> {
        &mut store.locations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_type_parses_aliases() {
        assert_eq!(LocationType::from("Inn".to_string()), LocationType::Tavern);
        assert_eq!(LocationType::from("capital city".to_string()), LocationType::Capital);
        assert_eq!(LocationType::from("floating island".to_string()), LocationType::Other);
    }

    #[test]
    fn location_type_serializes_lowercase() {
        let json = serde_json::to_value(LocationType::Temple).expect("serialize");
        assert_eq!(json, "temple");
    }

    #[test]
    fn population_bands() {
        assert!(LocationType::Village.population_range().contains(&300));
        assert!(!LocationType::Village.population_range().contains(&50_000));
        assert!(LocationType::Other.population_range().contains(&u32::MAX));
    }
}
