//! Proposals produced by the AI collaborator and consumed by the creation
//! pipeline.
//!
//! The typed structs deserialize strictly. [`DetectionPayload::from_value_lenient`]
//! is the tolerant entry point for model output: it keeps every proposal
//! that parses and reports the ones that don't.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::entity::{Event, Faction, Item, Location, Npc};
use crate::world::WorldParameter;

/// A proposed entity. `id` is optional; the pipeline derives one from the
/// display name when it is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityProposal<T> {
    /// Requested id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Attributes.
    #[serde(flatten)]
    pub data: T,
}

impl<T> EntityProposal<T> {
    /// Propose `data` under an explicit id.
    pub fn with_id(id: impl Into<String>, data: T) -> Self {
        Self {
            id: Some(id.into()),
            data,
        }
    }

    /// Propose `data` and let the pipeline derive the id.
    pub fn unnamed(data: T) -> Self {
        Self { id: None, data }
    }
}

/// Proposed entities grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProposedEntities {
    /// Proposed NPCs.
    #[serde(default)]
    pub npcs: Vec<EntityProposal<Npc>>,
    /// Proposed factions.
    #[serde(default)]
    pub factions: Vec<EntityProposal<Faction>>,
    /// Proposed locations.
    #[serde(default)]
    pub locations: Vec<EntityProposal<Location>>,
    /// Proposed items.
    #[serde(default)]
    pub items: Vec<EntityProposal<Item>>,
    /// Proposed events.
    #[serde(default)]
    pub events: Vec<EntityProposal<Event>>,
}

impl ProposedEntities {
    /// Number of proposals across all kinds.
    #[must_use]
    pub fn total(&self) -> usize {
        self.npcs.len() + self.factions.len() + self.locations.len() + self.items.len() + self.events.len()
    }
}

/// A proposed relationship. Endpoints may be ids or display names; the type
/// is a raw label parsed at admission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipProposal {
    /// Source endpoint.
    pub entity1: String,
    /// Target endpoint.
    pub entity2: String,
    /// Relationship type label.
    #[serde(rename = "type")]
    pub kind: String,
    /// Strength; clamped at commit.
    #[serde(default = "default_strength")]
    pub strength: f32,
    /// Why the relationship exists.
    #[serde(default)]
    pub reason: String,
}

fn default_strength() -> f32 {
    50.0
}

/// Parameter deltas and feed items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldUpdates {
    /// Delta for tension.
    #[serde(default, alias = "tension_change")]
    pub tension: Option<f32>,
    /// Delta for political stability.
    #[serde(default, alias = "political_stability")]
    pub political_stability: Option<f32>,
    /// Delta for the economy.
    #[serde(default, alias = "economic_state")]
    pub economic_state: Option<f32>,
    /// Delta for magical activity.
    #[serde(default, alias = "magical_activity")]
    pub magical_activity: Option<f32>,
    /// New rumors, oldest first.
    #[serde(default)]
    pub rumors: Vec<String>,
    /// New news items, oldest first.
    #[serde(default)]
    pub news: Vec<String>,
}

impl WorldUpdates {
    /// The parameter deltas actually present.
    #[must_use]
    pub fn deltas(&self) -> Vec<(WorldParameter, f32)> {
        [
            (WorldParameter::Tension, self.tension),
            (WorldParameter::PoliticalStability, self.political_stability),
            (WorldParameter::EconomicState, self.economic_state),
            (WorldParameter::MagicalActivity, self.magical_activity),
        ]
        .into_iter()
        .filter_map(|(parameter, delta)| delta.map(|d| (parameter, d)))
        .collect()
    }

    /// Whether there is nothing to apply.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deltas().is_empty() && self.rumors.is_empty() && self.news.is_empty()
    }
}

/// A change to the player's standing with one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerEffect {
    /// Entity id or display name.
    pub entity: String,
    /// Signed standing delta.
    pub change: f32,
    /// Why it changed.
    #[serde(default)]
    pub reason: String,
}

/// Everything one AI response proposes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionPayload {
    /// Proposed entities.
    #[serde(default)]
    pub entities: ProposedEntities,
    /// Proposed relationships.
    #[serde(default)]
    pub relationships: Vec<RelationshipProposal>,
    /// Parameter deltas and feed items.
    #[serde(default, alias = "world_updates")]
    pub world_updates: WorldUpdates,
    /// Player standing changes.
    #[serde(default, alias = "player_effects")]
    pub player_effects: Vec<PlayerEffect>,
}

/// Consequence analysis has the same shape as detection, with
/// `player_effects` normally populated.
pub type ConsequencePayload = DetectionPayload;

impl DetectionPayload {
    /// Whether the payload proposes nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.total() == 0
            && self.relationships.is_empty()
            && self.world_updates.is_empty()
            && self.player_effects.is_empty()
    }

    /// Build a payload from loosely structured JSON. Anything that does not
    /// fit is skipped and described in the returned list; a non-object
    /// yields an empty payload.
    #[must_use]
    pub fn from_value_lenient(value: &serde_json::Value) -> (Self, Vec<String>) {
        let mut problems = Vec::new();
        let Some(root) = value.as_object() else {
            problems.push("payload is not a JSON object".to_string());
            return (Self::default(), problems);
        };

        let entities = root.get("entities");
        let section = |name: &str| entities.and_then(|e| e.get(name));
        let proposed = ProposedEntities {
            npcs: parse_list(section("npcs"), "npcs", &mut problems),
            factions: parse_list(section("factions"), "factions", &mut problems),
            locations: parse_list(section("locations"), "locations", &mut problems),
            items: parse_list(section("items"), "items", &mut problems),
            events: parse_list(section("events"), "events", &mut problems),
        };

        let relationships = parse_list(root.get("relationships"), "relationships", &mut problems);
        let player_effects = parse_list(
            root.get("playerEffects").or_else(|| root.get("player_effects")),
            "playerEffects",
            &mut problems,
        );

        let world_updates = match root.get("worldUpdates").or_else(|| root.get("world_updates")) {
            None | Some(serde_json::Value::Null) => WorldUpdates::default(),
            Some(raw) => serde_json::from_value(raw.clone()).unwrap_or_else(|err| {
                problems.push(format!("worldUpdates: {err}"));
                WorldUpdates::default()
            }),
        };

        let payload = Self {
            entities: proposed,
            relationships,
            world_updates,
            player_effects,
        };
        (payload, problems)
    }
}

fn parse_list<T: DeserializeOwned>(raw: Option<&serde_json::Value>, label: &str, problems: &mut Vec<String>) -> Vec<T> {
    let items = match raw {
        None | Some(serde_json::Value::Null) => return Vec::new(),
        Some(serde_json::Value::Array(items)) => items,
        Some(_) => {
            problems.push(format!("{label}: expected a list"));
            return Vec::new();
        }
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item.clone()) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                problems.push(format!("{label}[{index}]: {err}"));
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strict_parse_of_full_payload() {
        let payload: DetectionPayload = serde_json::from_value(json!({
            "entities": {
                "npcs": [{ "id": "tom", "name": "Old Tom", "occupation": "innkeeper" }],
                "locations": [{ "name": "The Rusty Anchor", "locationType": "inn" }]
            },
            "relationships": [{ "entity1": "tom", "entity2": "The Rusty Anchor", "type": "employee" }],
            "worldUpdates": { "tension": 5, "rumors": ["Smugglers in the cellar"] }
        }))
        .expect("payload parses");

        assert_eq!(payload.entities.total(), 2);
        assert_eq!(payload.entities.npcs[0].id.as_deref(), Some("tom"));
        assert!(payload.entities.locations[0].id.is_none());
        assert!((payload.relationships[0].strength - 50.0).abs() < f32::EPSILON);
        assert_eq!(payload.world_updates.deltas(), vec![(WorldParameter::Tension, 5.0)]);
        assert!(!payload.is_empty());
    }

    #[test]
    fn lenient_parse_skips_bad_items() {
        let (payload, problems) = DetectionPayload::from_value_lenient(&json!({
            "entities": {
                "npcs": [{ "name": "Mira" }, { "occupation": "nameless" }],
                "items": "not a list"
            },
            "world_updates": { "economic_state": -10 },
            "player_effects": [{ "entity": "mira", "change": 5 }]
        }));

        assert_eq!(payload.entities.npcs.len(), 1);
        assert_eq!(payload.world_updates.deltas(), vec![(WorldParameter::EconomicState, -10.0)]);
        assert_eq!(payload.player_effects.len(), 1);
        assert_eq!(problems.len(), 2);
    }

    #[test]
    fn non_object_is_empty_payload() {
        let (payload, problems) = DetectionPayload::from_value_lenient(&json!("I could not decide"));
        assert!(payload.is_empty());
        assert_eq!(problems.len(), 1);
    }
}
