//! Entity Store: canonical records for every NPC, faction, location, item
//! and event, plus a per-kind creation audit log.
//!
//! Typed operations (`create`, `get`, `update`, `list`) take the kind from
//! the [`EntityData`] type parameter. Kind-erased operations (`get_entity`,
//! `delete`, `list_all`) take an [`EntityKind`] and dispatch exhaustively.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entity::{Entity, EntityData, EntityPayload, EntityRecord, Event, Faction, Item, Location, Npc};
use crate::error::{ChronicleError, Result};
use crate::types::{push_bounded, EntityKind, Metadata, Timestamp};

/// Run `$body` with `$t` bound to the attribute type of `$kind`.
macro_rules! for_kind {
    ($kind:expr, $t:ident => $body:expr) => {
        match $kind {
            EntityKind::Npc => {
                type $t = Npc;
                $body
            }
            EntityKind::Faction => {
                type $t = Faction;
                $body
            }
            EntityKind::Location => {
                type $t = Location;
                $body
            }
            EntityKind::Item => {
                type $t = Item;
                $body
            }
            EntityKind::Event => {
                type $t = Event;
                $body
            }
        }
    };
}

/// One entry of the creation audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreationRecord {
    /// Id of the created entity.
    pub id: String,
    /// When it was created.
    pub timestamp: Timestamp,
    /// Attributes as supplied at creation.
    pub data: serde_json::Value,
}

/// Per-kind creation audit log.
pub type CreationHistory = BTreeMap<EntityKind, Vec<CreationRecord>>;

/// The five entity collections, keyed by kind then id. This is the
/// `entities` section of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityTables {
    /// NPC records by id.
    #[serde(default)]
    pub npcs: BTreeMap<String, EntityRecord<Npc>>,
    /// Faction records by id.
    #[serde(default)]
    pub factions: BTreeMap<String, EntityRecord<Faction>>,
    /// Location records by id.
    #[serde(default)]
    pub locations: BTreeMap<String, EntityRecord<Location>>,
    /// Item records by id.
    #[serde(default)]
    pub items: BTreeMap<String, EntityRecord<Item>>,
    /// Event records by id.
    #[serde(default)]
    pub events: BTreeMap<String, EntityRecord<Event>>,
}

/// Owner of every entity record.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    pub(crate) npcs: BTreeMap<String, EntityRecord<Npc>>,
    pub(crate) factions: BTreeMap<String, EntityRecord<Faction>>,
    pub(crate) locations: BTreeMap<String, EntityRecord<Location>>,
    pub(crate) items: BTreeMap<String, EntityRecord<Item>>,
    pub(crate) events: BTreeMap<String, EntityRecord<Event>>,
    creation_history: CreationHistory,
    creation_history_limit: Option<usize>,
}

impl EntityStore {
    /// Create an empty store with an unbounded creation log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that keeps at most `limit` creation records
    /// per kind.
    #[must_use]
    pub fn with_creation_limit(limit: Option<usize>) -> Self {
        Self {
            creation_history_limit: limit,
            ..Self::default()
        }
    }

    // ------------------------------------------------------------------
    // Typed operations
    // ------------------------------------------------------------------

    /// Create a new entity of kind `T::KIND`.
    ///
    /// # Errors
    ///
    /// Returns [`ChronicleError::DuplicateEntity`] if the id already exists
    /// for this kind. The existing record is left untouched.
    pub fn create<T: EntityData>(&mut self, id: impl Into<String>, data: T) -> Result<&EntityRecord<T>> {
        let id = id.into();
        if T::collection(self).contains_key(&id) {
            return Err(ChronicleError::DuplicateEntity { kind: T::KIND, id });
        }

        let now = Utc::now();
        let record = EntityRecord::new(id.clone(), data, now);
        let audit = CreationRecord {
            id: id.clone(),
            timestamp: now,
            data: serde_json::to_value(&record.data)?,
        };

        let log = self.creation_history.entry(T::KIND).or_default();
        match self.creation_history_limit {
            Some(limit) => push_bounded(log, audit, limit),
            None => log.push(audit),
        }

        debug!(kind = %T::KIND, id = %id, "entity created");
        let stored = T::collection_mut(self).entry(id).or_insert(record);
        Ok(&*stored)
    }

    /// Look up an entity of kind `T::KIND`.
    #[must_use]
    pub fn get<T: EntityData>(&self, id: &str) -> Option<&EntityRecord<T>> {
        T::collection(self).get(id)
    }

    /// Apply a typed partial update and refresh `last_modified`.
    ///
    /// # Errors
    ///
    /// Returns [`ChronicleError::NotFound`] if no such entity exists.
    pub fn update<T: EntityData>(&mut self, id: &str, patch: T::Patch) -> Result<&EntityRecord<T>> {
        let record = T::collection_mut(self)
            .get_mut(id)
            .ok_or_else(|| ChronicleError::NotFound(format!("{} '{id}'", T::KIND)))?;

        record.data.apply_patch(patch);
        record.data.normalize();
        record.last_modified = Utc::now();

        debug!(kind = %T::KIND, id = %id, "entity updated");
        Ok(&*record)
    }

    /// Merge keys into an entity's metadata map and refresh `last_modified`.
    ///
    /// # Errors
    ///
    /// Returns [`ChronicleError::NotFound`] if no such entity exists.
    pub fn merge_metadata<T: EntityData>(&mut self, id: &str, metadata: Metadata) -> Result<&EntityRecord<T>> {
        let record = T::collection_mut(self)
            .get_mut(id)
            .ok_or_else(|| ChronicleError::NotFound(format!("{} '{id}'", T::KIND)))?;
        record.metadata.extend(metadata);
        record.last_modified = Utc::now();
        Ok(&*record)
    }

    /// Iterate over every record of kind `T::KIND`, ordered by id.
    pub fn list<T: EntityData>(&self) -> impl Iterator<Item = &EntityRecord<T>> {
        T::collection(self).values()
    }

    // ------------------------------------------------------------------
    // Kind-erased operations
    // ------------------------------------------------------------------

    /// Create an entity from a kind-tagged payload.
    ///
    /// # Errors
    ///
    /// Returns [`ChronicleError::DuplicateEntity`] if the id already exists
    /// for the payload's kind.
    pub fn create_payload(&mut self, id: impl Into<String>, payload: EntityPayload) -> Result<Entity> {
        Ok(match payload {
            EntityPayload::Npc(data) => Entity::Npc(self.create(id, data)?.clone()),
            EntityPayload::Faction(data) => Entity::Faction(self.create(id, data)?.clone()),
            EntityPayload::Location(data) => Entity::Location(self.create(id, data)?.clone()),
            EntityPayload::Item(data) => Entity::Item(self.create(id, data)?.clone()),
            EntityPayload::Event(data) => Entity::Event(self.create(id, data)?.clone()),
        })
    }

    /// Create an entity from a kind name and untyped attributes, as found
    /// at save-file and AI boundaries.
    ///
    /// # Errors
    ///
    /// Returns [`ChronicleError::UnknownEntityKind`] for an unrecognised
    /// kind, [`ChronicleError::Serialization`] if the attributes do not fit
    /// the kind, or [`ChronicleError::DuplicateEntity`].
    pub fn create_dynamic(&mut self, kind: &str, id: impl Into<String>, data: serde_json::Value) -> Result<Entity> {
        let kind: EntityKind = kind.parse()?;
        let payload = EntityPayload::from_value(kind, data)?;
        self.create_payload(id, payload)
    }

    /// Look up an entity by kind and id.
    #[must_use]
    pub fn get_entity(&self, kind: EntityKind, id: &str) -> Option<Entity> {
        for_kind!(kind, T => self.get::<T>(id).cloned().map(T::into_entity))
    }

    /// Whether an entity of `kind` with `id` exists.
    #[must_use]
    pub fn contains(&self, kind: EntityKind, id: &str) -> bool {
        for_kind!(kind, T => T::collection(self).contains_key(id))
    }

    /// The first kind (in admission order) holding an entity with `id`.
    #[must_use]
    pub fn kind_of(&self, id: &str) -> Option<EntityKind> {
        EntityKind::ALL.into_iter().find(|kind| self.contains(*kind, id))
    }

    /// Whether any kind holds an entity with `id`.
    #[must_use]
    pub fn contains_any(&self, id: &str) -> bool {
        self.kind_of(id).is_some()
    }

    /// Hard-delete an entity. Returns `false` if it did not exist.
    pub fn delete(&mut self, kind: EntityKind, id: &str) -> bool {
        let removed = for_kind!(kind, T => T::collection_mut(self).remove(id).is_some());
        if removed {
            debug!(kind = %kind, id = %id, "entity deleted");
        }
        removed
    }

    /// Every entity of `kind`, ordered by id.
    #[must_use]
    pub fn list_all(&self, kind: EntityKind) -> Vec<Entity> {
        for_kind!(kind, T => self.list::<T>().cloned().map(T::into_entity).collect())
    }

    /// Number of entities of `kind`.
    #[must_use]
    pub fn count(&self, kind: EntityKind) -> usize {
        for_kind!(kind, T => T::collection(self).len())
    }

    /// Number of entities across all kinds.
    #[must_use]
    pub fn total_count(&self) -> usize {
        EntityKind::ALL.into_iter().map(|kind| self.count(kind)).sum()
    }

    /// Find the id of an entity of `kind` by display name, ignoring case.
    #[must_use]
    pub fn find_by_name(&self, kind: EntityKind, name: &str) -> Option<String> {
        let needle = name.trim().to_lowercase();
        for_kind!(kind, T => self
            .list::<T>()
            .find(|r| r.data.name().to_lowercase() == needle)
            .map(|r| r.id.clone()))
    }

    /// Resolve a reference to an entity of `kind`, by id first, then by
    /// display name.
    #[must_use]
    pub fn resolve_as(&self, kind: EntityKind, reference: &str) -> Option<String> {
        let reference = reference.trim();
        if self.contains(kind, reference) {
            return Some(reference.to_string());
        }
        self.find_by_name(kind, reference)
    }

    /// Resolve a reference that may be either an id or a display name.
    #[must_use]
    pub fn resolve_reference(&self, reference: &str) -> Option<(EntityKind, String)> {
        if let Some(kind) = self.kind_of(reference) {
            return Some((kind, reference.to_string()));
        }
        EntityKind::ALL
            .into_iter()
            .find_map(|kind| self.find_by_name(kind, reference).map(|id| (kind, id)))
    }

    /// Creation audit records for `kind`, oldest first.
    #[must_use]
    pub fn creation_history(&self, kind: EntityKind) -> &[CreationRecord] {
        self.creation_history.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Snapshot support
    // ------------------------------------------------------------------

    /// Copy out the five collections.
    #[must_use]
    pub fn tables(&self) -> EntityTables {
        EntityTables {
            npcs: self.npcs.clone(),
            factions: self.factions.clone(),
            locations: self.locations.clone(),
            items: self.items.clone(),
            events: self.events.clone(),
        }
    }

    /// Copy out the creation audit log.
    #[must_use]
    pub fn full_creation_history(&self) -> CreationHistory {
        self.creation_history.clone()
    }

    /// Rebuild a store from exported collections and audit log.
    #[must_use]
    pub fn from_parts(tables: EntityTables, history: CreationHistory, creation_history_limit: Option<usize>) -> Self {
        Self {
            npcs: tables.npcs,
            factions: tables.factions,
            locations: tables.locations,
            items: tables.items,
            events: tables.events,
            creation_history: history,
            creation_history_limit,
        }
    }
}
