//! World events: festivals, wars, plagues, heists.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::npc::double_option;
use super::{normalize_label, Entity, EntityData, EntityRecord};
use crate::store::EntityStore;
use crate::types::EntityKind;

/// How far an event's effects reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventScope {
    /// A single location.
    #[default]
    Local,
    /// Several locations.
    Regional,
    /// The whole world.
    Global,
}

impl From<String> for EventScope {
    fn from(raw: String) -> Self {
        match normalize_label(&raw).as_str() {
            "regional" | "region" => Self::Regional,
            "global" | "world" | "worldwide" => Self::Global,
            _ => Self::Local,
        }
    }
}

impl From<EventScope> for String {
    fn from(value: EventScope) -> Self {
        value.to_string()
    }
}

impl fmt::Display for EventScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Local => "local",
            Self::Regional => "regional",
            Self::Global => "global",
        })
    }
}

/// Lifecycle state of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventStatus {
    /// Under way.
    #[default]
    Active,
    /// Will start on a later day.
    Scheduled,
    /// Finished successfully.
    Completed,
    /// Finished unsuccessfully.
    Failed,
}

impl From<String> for EventStatus {
    fn from(raw: String) -> Self {
        match normalize_label(&raw).as_str() {
            "scheduled" | "upcoming" | "planned" => Self::Scheduled,
            "completed" | "complete" | "resolved" => Self::Completed,
            "failed" | "cancelled" => Self::Failed,
            _ => Self::Active,
        }
    }
}

impl From<EventStatus> for String {
    fn from(value: EventStatus) -> Self {
        value.to_string()
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Active => "active",
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Failed => "failed",
        })
    }
}

/// Something happening in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Display name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Reach of the event.
    #[serde(default)]
    pub scope: EventScope,
    /// Expected length in days.
    #[serde(default = "default_duration")]
    pub duration: u32,
    /// Lifecycle state.
    #[serde(default)]
    pub status: EventStatus,
    /// Ids of entities taking part.
    #[serde(default)]
    pub participants: Vec<String>,
    /// Id of the location it happens at.
    #[serde(default)]
    pub location: Option<String>,
    /// Absolute world day the event starts, when scheduled.
    #[serde(default)]
    pub start_day: Option<u32>,
}

fn default_duration() -> u32 {
    1
}

impl Event {
    /// Create an active, local, one-day event.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            scope: EventScope::Local,
            duration: 1,
            status: EventStatus::Active,
            participants: Vec::new(),
            location: None,
            start_day: None,
        }
    }
}

/// Partial update for an [`Event`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct EventPatch {
    /// New display name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New scope.
    pub scope: Option<EventScope>,
    /// New duration.
    pub duration: Option<u32>,
    /// New status.
    pub status: Option<EventStatus>,
    /// Replacement participant list.
    pub participants: Option<Vec<String>>,
    /// New location; `Some(None)` clears it.
    #[serde(default, with = "double_option")]
    pub location: Option<Option<String>>,
}

impl EntityData for Event {
    const KIND: EntityKind = EntityKind::Event;
    type Patch = EventPatch;

    fn name(&self) -> &str {
        &self.name
    }

    fn apply_patch(&mut self, patch: EventPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(scope) = patch.scope {
            self.scope = scope;
        }
        if let Some(duration) = patch.duration {
            self.duration = duration;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(participants) = patch.participants {
            self.participants = participants;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
    }

    fn into_entity(record: EntityRecord<Self>) -> Entity {
        Entity::Event(record)
    }

    fn collection(store: &EntityStore) -> &BTreeMap<String, EntityRecord<Self>> {
        &store.events
    }

    fn collection_mut(store: &mut EntityStore) -> &mut BTreeMap<String, EntityRecord<Self>> {
        &mut store.events
    }
}
