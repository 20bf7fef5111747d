//! Entity type definitions and the kind-erased [`Entity`] sum type.
//!
//! Each of the five entity kinds lives in its own module and implements
//! [`EntityData`], which ties the attribute struct to its kind, its typed
//! patch, and its collection inside the [`EntityStore`].

pub mod event;
pub mod faction;
pub mod item;
pub mod location;
pub mod npc;

pub use event::{Event, EventPatch, EventScope, EventStatus};
pub use faction::{Faction, FactionPatch};
pub use item::{Item, ItemPatch, Rarity};
pub use location::{Location, LocationPatch, LocationType};
pub use npc::{Affinity, Npc, NpcPatch};

use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::store::EntityStore;
use crate::types::{EntityKind, Metadata, Timestamp};

/// Attribute payload of one entity kind.
///
/// The kind is a compile-time property of the type, so the store never has
/// to check a kind string for typed calls.
pub trait EntityData:
    Debug + Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// The kind this payload belongs to.
    const KIND: EntityKind;

    /// Typed partial update. Deserialising one with unknown fields fails.
    type Patch: Debug + Default + DeserializeOwned;

    /// Human-readable display name.
    fn name(&self) -> &str;

    /// Apply a partial update in place.
    fn apply_patch(&mut self, patch: Self::Patch);

    /// Re-establish bounded fields after construction or patching.
    fn normalize(&mut self) {}

    /// Wrap a typed record into the kind-erased [`Entity`].
    fn into_entity(record: EntityRecord<Self>) -> Entity;

    /// The store collection holding records of this kind.
    fn collection(store: &EntityStore) -> &BTreeMap<String, EntityRecord<Self>>;

    /// Mutable access to the store collection holding records of this kind.
    fn collection_mut(store: &mut EntityStore) -> &mut BTreeMap<String, EntityRecord<Self>>;
}

/// A stored entity: identity, lifecycle timestamps, metadata and the
/// kind-specific attributes flattened alongside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord<T> {
    /// Caller-supplied id, unique within its kind.
    pub id: String,
    /// When the record was created.
    pub created: Timestamp,
    /// When the record was last mutated.
    pub last_modified: Timestamp,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: Metadata,
    /// Kind-specific attributes.
    #[serde(flatten)]
    pub data: T,
}

impl<T: EntityData> EntityRecord<T> {
    /// Create a fresh record stamped at `now`.
    #[must_use]
    pub fn new(id: impl Into<String>, mut data: T, now: Timestamp) -> Self {
        data.normalize();
        Self {
            id: id.into(),
            created: now,
            last_modified: now,
            metadata: Metadata::new(),
            data,
        }
    }

    /// Kind of this record.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        T::KIND
    }
}

/// Kind-erased entity, used wherever a caller addresses entities by a
/// runtime [`EntityKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    /// A non-player character.
    Npc(EntityRecord<Npc>),
    /// A faction.
    Faction(EntityRecord<Faction>),
    /// A location.
    Location(EntityRecord<Location>),
    /// An item.
    Item(EntityRecord<Item>),
    /// A world event.
    Event(EntityRecord<Event>),
}

impl Entity {
    /// Kind of the wrapped record.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Npc(_) => EntityKind::Npc,
            Self::Faction(_) => EntityKind::Faction,
            Self::Location(_) => EntityKind::Location,
            Self::Item(_) => EntityKind::Item,
            Self::Event(_) => EntityKind::Event,
        }
    }

    /// Id of the wrapped record.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Npc(r) => &r.id,
            Self::Faction(r) => &r.id,
            Self::Location(r) => &r.id,
            Self::Item(r) => &r.id,
            Self::Event(r) => &r.id,
        }
    }

    /// Display name of the wrapped record.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Npc(r) => r.data.name(),
            Self::Faction(r) => r.data.name(),
            Self::Location(r) => r.data.name(),
            Self::Item(r) => r.data.name(),
            Self::Event(r) => r.data.name(),
        }
    }

    /// Last mutation time of the wrapped record.
    #[must_use]
    pub fn last_modified(&self) -> Timestamp {
        match self {
            Self::Npc(r) => r.last_modified,
            Self::Faction(r) => r.last_modified,
            Self::Location(r) => r.last_modified,
            Self::Item(r) => r.last_modified,
            Self::Event(r) => r.last_modified,
        }
    }
}

/// Kind-tagged attribute payload, for callers that build entities of a
/// kind chosen at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityPayload {
    /// NPC attributes.
    Npc(Npc),
    /// Faction attributes.
    Faction(Faction),
    /// Location attributes.
    Location(Location),
    /// Item attributes.
    Item(Item),
    /// Event attributes.
    Event(Event),
}

impl EntityPayload {
    /// Kind of the wrapped payload.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Npc(_) => EntityKind::Npc,
            Self::Faction(_) => EntityKind::Faction,
            Self::Location(_) => EntityKind::Location,
            Self::Item(_) => EntityKind::Item,
            Self::Event(_) => EntityKind::Event,
        }
    }

    /// Deserialize the attributes of `kind` from an untyped JSON value.
    ///
    /// # Errors
    /// Returns `ChronicleError::Serialization` if the value does not match
    /// the kind's schema.
    pub fn from_value(kind: EntityKind, value: serde_json::Value) -> crate::Result<Self> {
        Ok(match kind {
            EntityKind::Npc => Self::Npc(serde_json::from_value(value)?),
            EntityKind::Faction => Self::Faction(serde_json::from_value(value)?),
            EntityKind::Location => Self::Location(serde_json::from_value(value)?),
            EntityKind::Item => Self::Item(serde_json::from_value(value)?),
            EntityKind::Event => Self::Event(serde_json::from_value(value)?),
        })
    }
}

// ---------------------------------------------------------------------------
// Lenient enum parsing shared by attribute enums
// ---------------------------------------------------------------------------

/// Normalise a free-text enum label: lowercase with spaces and dashes
/// folded to underscores.
pub(crate) fn normalize_label(raw: &str) -> String {
    raw.trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn default_score() -> f32 {
    50.0
}

pub(crate) fn default_full() -> f32 {
    100.0
}
