//! World event list, partitioned by lifecycle.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::entity::{Event, EventScope, EventStatus};
use crate::error::{ChronicleError, Result};
use crate::types::{EntityKind, Timestamp};

/// An event as tracked by the world clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldEvent {
    /// Id, shared with the event entity when there is one.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Reach of the event.
    #[serde(default)]
    pub scope: EventScope,
    /// Absolute day the event starts.
    pub start_day: u32,
    /// Expected length in days.
    pub duration: u32,
    /// When the event was added.
    pub added: Timestamp,
    /// When it completed or failed.
    #[serde(default)]
    pub ended: Option<Timestamp>,
}

impl WorldEvent {
    /// Track an event entity. Events without a start day start `today`.
    #[must_use]
    pub fn from_entity(id: impl Into<String>, event: &Event, today: u32) -> Self {
        Self {
            id: id.into(),
            name: event.name.clone(),
            description: event.description.clone(),
            scope: event.scope,
            start_day: event.start_day.unwrap_or(today),
            duration: event.duration,
            added: Utc::now(),
            ended: None,
        }
    }
}

/// Which partition an event landed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPartition {
    /// Under way.
    Current,
    /// Finished successfully.
    Completed,
    /// Finished unsuccessfully.
    Failed,
    /// Waiting for its start day.
    Scheduled,
}

impl From<EventPartition> for EventStatus {
    fn from(partition: EventPartition) -> Self {
        match partition {
            EventPartition::Current => Self::Active,
            EventPartition::Completed => Self::Completed,
            EventPartition::Failed => Self::Failed,
            EventPartition::Scheduled => Self::Scheduled,
        }
    }
}

/// Every tracked event, by partition. Each partition is in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldEvents {
    /// Under way.
    #[serde(default)]
    pub current: Vec<WorldEvent>,
    /// Finished successfully.
    #[serde(default)]
    pub completed: Vec<WorldEvent>,
    /// Finished unsuccessfully.
    #[serde(default)]
    pub failed: Vec<WorldEvent>,
    /// Waiting for their start day.
    #[serde(default)]
    pub scheduled: Vec<WorldEvent>,
}

impl WorldEvents {
    /// Add an event, scheduling it when `start_day` is after `today`.
    ///
    /// # Errors
    ///
    /// Returns [`ChronicleError::DuplicateEntity`] if an event with the same
    /// id is already tracked in any partition.
    pub fn add(&mut self, event: WorldEvent, today: u32) -> Result<EventPartition> {
        if self.find(&event.id).is_some() {
            return Err(ChronicleError::DuplicateEntity {
                kind: EntityKind::Event,
                id: event.id,
            });
        }
        if event.start_day > today {
            self.scheduled.push(event);
            Ok(EventPartition::Scheduled)
        } else {
            self.current.push(event);
            Ok(EventPartition::Current)
        }
    }

    /// Move a current or scheduled event to completed (or failed) and stamp
    /// its end time.
    ///
    /// # Errors
    ///
    /// Returns [`ChronicleError::NotFound`] if no current or scheduled event
    /// has this id.
    pub fn complete(&mut self, id: &str, success: bool) -> Result<&WorldEvent> {
        let mut event = take_by_id(&mut self.current, id)
            .or_else(|| take_by_id(&mut self.scheduled, id))
            .ok_or_else(|| ChronicleError::NotFound(format!("active event '{id}'")))?;
        event.ended = Some(Utc::now());

        let target = if success { &mut self.completed } else { &mut self.failed };
        target.push(event);
        target
            .last()
            .ok_or_else(|| ChronicleError::NotFound(format!("event '{id}'")))
    }

    /// Move scheduled events whose start day has arrived to current.
    /// Returns the ids activated.
    pub fn activate_due(&mut self, today: u32) -> Vec<String> {
        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.scheduled)
            .into_iter()
            .partition(|event| event.start_day <= today);
        self.scheduled = waiting;
        let ids = due.iter().map(|event| event.id.clone()).collect();
        self.current.extend(due);
        ids
    }

    /// Find an event in any partition.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<(EventPartition, &WorldEvent)> {
        [
            (EventPartition::Current, &self.current),
            (EventPartition::Scheduled, &self.scheduled),
            (EventPartition::Completed, &self.completed),
            (EventPartition::Failed, &self.failed),
        ]
        .into_iter()
        .find_map(|(partition, list)| list.iter().find(|event| event.id == id).map(|event| (partition, event)))
    }

    /// Number of events under way.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.current.len()
    }
}

fn take_by_id(list: &mut Vec<WorldEvent>, id: &str) -> Option<WorldEvent> {
    let index = list.iter().position(|event| event.id == id)?;
    Some(list.remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn festival(id: &str, start_day: u32) -> WorldEvent {
        let mut event = Event::new("Harvest Festival");
        event.start_day = Some(start_day);
        WorldEvent::from_entity(id, &event, 1)
    }

    #[test]
    fn future_events_are_scheduled() {
        let mut events = WorldEvents::default();
        assert_eq!(events.add(festival("now", 1), 1).expect("add"), EventPartition::Current);
        assert_eq!(events.add(festival("later", 5), 1).expect("add"), EventPartition::Scheduled);
        assert_eq!(events.active_count(), 1);

        assert!(events.activate_due(4).is_empty());
        assert_eq!(events.activate_due(5), vec!["later".to_string()]);
        assert_eq!(events.active_count(), 2);
    }

    #[test]
    fn complete_moves_and_stamps() {
        let mut events = WorldEvents::default();
        events.add(festival("a", 1), 1).expect("add");
        events.add(festival("b", 1), 1).expect("add");

        let done = events.complete("a", true).expect("complete");
        assert!(done.ended.is_some());
        events.complete("b", false).expect("fail");

        assert_eq!(events.active_count(), 0);
        assert_eq!(events.completed.len(), 1);
        assert_eq!(events.failed.len(), 1);
        assert!(matches!(events.find("b"), Some((EventPartition::Failed, _))));
    }

    #[test]
    fn complete_unknown_is_not_found() {
        let mut events = WorldEvents::default();
        let err = events.complete("ghost", true).expect_err("missing");
        assert!(matches!(err, ChronicleError::NotFound(_)));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut events = WorldEvents::default();
        events.add(festival("a", 1), 1).expect("add");
        let err = events.add(festival("a", 3), 1).expect_err("duplicate");
        assert!(matches!(err, ChronicleError::DuplicateEntity { .. }));
    }
}
