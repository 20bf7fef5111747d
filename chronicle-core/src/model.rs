//! The three stores bundled as one world, and the read-only view handed to
//! validation.

use rand::Rng;
use tracing::warn;

use crate::config::ChronicleConfig;
use crate::entity::{Event, EventPatch, EventStatus};
use crate::error::Result;
use crate::relationship::RelationshipGraph;
use crate::store::EntityStore;
use crate::types::EntityKind;
use crate::world::{TimeAdvance, WorldState};

/// Entity store, relationship graph and world state for one world.
///
/// No internal locking. Hosts that share a model across threads wrap it in
/// `Arc<parking_lot::RwLock<WorldModel>>`.
#[derive(Debug, Clone, Default)]
pub struct WorldModel {
    /// Every entity record.
    pub entities: EntityStore,
    /// Entity-to-entity edges and player standings.
    pub relationships: RelationshipGraph,
    /// Global parameters, clock, events and information feed.
    pub world: WorldState,
    /// Configuration the stores were built with.
    pub config: ChronicleConfig,
}

impl WorldModel {
    /// An empty world built from `config`.
    #[must_use]
    pub fn new(config: ChronicleConfig) -> Self {
        Self {
            entities: EntityStore::with_creation_limit(config.history.creation_history_limit),
            relationships: RelationshipGraph::new(&config.history),
            world: WorldState::new(&config),
            config,
        }
    }

    /// Borrow the stores read-only.
    #[must_use]
    pub fn view(&self) -> StateView<'_> {
        StateView {
            entities: &self.entities,
            relationships: &self.relationships,
            world: &self.world,
        }
    }

    /// Delete an entity and every edge touching it. Returns `false` if the
    /// entity did not exist.
    pub fn delete_entity(&mut self, kind: EntityKind, id: &str) -> bool {
        let removed = self.entities.delete(kind, id);
        if removed && !self.entities.contains_any(id) {
            self.relationships.remove_entity_edges(id);
        }
        removed
    }

    // ------------------------------------------------------------------
    // Event lifecycle
    // ------------------------------------------------------------------

    /// Finish a tracked event. The event entity with the same id, if any,
    /// takes the matching status.
    ///
    /// # Errors
    ///
    /// Returns [`ChronicleError::NotFound`](crate::ChronicleError::NotFound)
    /// if the event is not current or scheduled.
    pub fn complete_event(&mut self, id: &str, success: bool) -> Result<EventStatus> {
        self.world.complete_event(id, success)?;
        let status = if success { EventStatus::Completed } else { EventStatus::Failed };
        self.sync_event_status(id, status)?;
        Ok(status)
    }

    /// Advance the world clock; scheduled events that start are marked
    /// active on their entities too.
    pub fn advance_time(&mut self, steps: u32) -> TimeAdvance {
        self.advance_time_with(steps, &mut rand::thread_rng())
    }

    /// As [`advance_time`](Self::advance_time), with a caller-supplied RNG
    /// for the weather roll.
    pub fn advance_time_with<R: Rng + ?Sized>(&mut self, steps: u32, rng: &mut R) -> TimeAdvance {
        let advance = self.world.advance_time_with(steps, rng);
        for id in &advance.activated {
            if let Err(err) = self.sync_event_status(id, EventStatus::Active) {
                warn!(id = %id, error = %err, "event entity not updated");
            }
        }
        advance
    }

    /// Patch the status of event entity `id` when it differs. World events
    /// without an entity are left alone.
    pub(crate) fn sync_event_status(&mut self, id: &str, status: EventStatus) -> Result<()> {
        let stale = self
            .entities
            .get::<Event>(id)
            .is_some_and(|record| record.data.status != status);
        if stale {
            let patch = EventPatch {
                status: Some(status),
                ..EventPatch::default()
            };
            self.entities.update::<Event>(id, patch)?;
        }
        Ok(())
    }
}

/// Read-only borrow of the three stores.
#[derive(Debug, Clone, Copy)]
pub struct StateView<'a> {
    /// Entity records.
    pub entities: &'a EntityStore,
    /// Relationship graph.
    pub relationships: &'a RelationshipGraph,
    /// World state.
    pub world: &'a WorldState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Faction, Npc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use crate::relationship::{RelationshipInput, RelationshipType};

    #[test]
    fn deleting_an_entity_drops_its_edges() {
        let mut model = WorldModel::default();
        model.entities.create("tom", Npc::new("Tom", "innkeeper")).expect("npc");
        model.entities.create("mira", Npc::new("Mira", "healer")).expect("npc");
        model
            .relationships
            .set_relationship("tom", "mira", RelationshipInput::new(RelationshipType::Friend, 60.0, "neighbours"))
            .expect("edge");

        assert!(model.delete_entity(EntityKind::Npc, "tom"));
        assert_eq!(model.relationships.edge_count(), 0);
        assert!(!model.delete_entity(EntityKind::Npc, "tom"));
    }

    #[test]
    fn shared_id_keeps_edges_while_another_kind_holds_it() {
        let mut model = WorldModel::default();
        model.entities.create("ash", Npc::new("Ash", "farmer")).expect("npc");
        model.entities.create("ash", Faction::new("House Ash")).expect("faction");
        model.entities.create("mira", Npc::new("Mira", "healer")).expect("npc");
        model
            .relationships
            .set_relationship("ash", "mira", RelationshipInput::new(RelationshipType::Ally, 60.0, "pact"))
            .expect("edge");

        assert!(model.delete_entity(EntityKind::Npc, "ash"));
        assert_eq!(model.relationships.edge_count(), 1);
    }

    #[test]
    fn event_entities_follow_the_world_lifecycle() {
        let mut model = WorldModel::default();
        let today = model.world.today();
        let mut eclipse = Event::new("Eclipse");
        eclipse.status = EventStatus::Scheduled;
        eclipse.start_day = Some(today + 1);
        for (id, event) in [("fair", Event::new("Fair")), ("eclipse", eclipse)] {
            model.entities.create(id, event.clone()).expect("event");
            model
                .world
                .add_event(crate::world::WorldEvent::from_entity(id, &event, today))
                .expect("tracked");
        }

        assert_eq!(model.complete_event("fair", true).expect("complete"), EventStatus::Completed);
        let advance = model.advance_time_with(6, &mut StdRng::seed_from_u64(3));
        assert_eq!(advance.activated, vec!["eclipse".to_string()]);

        let status = |id: &str| model.entities.get::<Event>(id).map(|r| r.data.status);
        assert_eq!(status("fair"), Some(EventStatus::Completed));
        assert_eq!(status("eclipse"), Some(EventStatus::Active));
        assert!(model.complete_event("fair", false).is_err());
    }

    #[test]
    fn world_only_events_complete_without_an_entity() {
        let mut model = WorldModel::default();
        let today = model.world.today();
        model
            .world
            .add_event(crate::world::WorldEvent::from_entity("storm", &Event::new("Storm"), today))
            .expect("tracked");
        assert_eq!(model.complete_event("storm", false).expect("fail"), EventStatus::Failed);
        assert_eq!(model.world.events().failed.len(), 1);
    }
}
