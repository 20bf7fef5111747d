//! Creation Pipeline: admits a [`DetectionPayload`] into the world model as
//! one serialized batch.
//!
//! The pipeline is either Idle or Processing. The state and the FIFO of
//! waiting payloads live behind one mutex, so a submission arriving while a
//! batch is in flight is queued and answered with a [`Ticket`]. The thread
//! that started processing drains the queue in arrival order before the
//! pipeline returns to Idle. Each batch holds the world write lock for its
//! whole duration and validates every proposal against the state committed
//! so far, including entities created earlier in the same batch.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::entity::{EntityData, Event, EventStatus, Faction, Item, Location, Npc};
use crate::error::Result;
use crate::model::{StateView, WorldModel};
use crate::payload::{DetectionPayload, EntityProposal, PlayerEffect, RelationshipProposal, WorldUpdates};
use crate::relationship::{RelationshipInput, RelationshipType};
use crate::store::EntityStore;
use crate::types::{slugify, EntityKind, PLAYER_ID};
use crate::validation::{ValidationReport, Validator};
use crate::world::{ParameterChange, WorldEvent};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Handle for one submitted payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ticket(pub u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An entity committed by a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedEntity {
    /// Kind created.
    pub kind: EntityKind,
    /// Id it was stored under.
    pub id: String,
}

/// A proposal the batch rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedCreation {
    /// Kind proposed.
    pub kind: EntityKind,
    /// Id proposed or derived.
    pub id: String,
    /// Why it was rejected.
    pub reason: String,
}

/// A relationship the batch committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedRelationship {
    /// Resolved source id.
    pub source: String,
    /// Resolved target id.
    pub target: String,
    /// Parsed type.
    pub kind: RelationshipType,
}

/// A relationship proposal the batch skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedRelationship {
    /// Source as proposed.
    pub entity1: String,
    /// Target as proposed.
    pub entity2: String,
    /// Why it was skipped.
    pub reason: String,
}

/// Outcome of one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Ticket the batch was submitted under.
    pub ticket: Ticket,
    /// Entities committed, in admission order.
    pub created: Vec<CreatedEntity>,
    /// Entity proposals rejected.
    pub failed: Vec<FailedCreation>,
    /// Relationships committed.
    pub relationships: Vec<CommittedRelationship>,
    /// Relationship proposals skipped.
    pub failed_relationships: Vec<FailedRelationship>,
    /// Parameter writes applied.
    pub parameter_changes: Vec<ParameterChange>,
    /// Rumors and news items added.
    pub feed_items: usize,
    /// Player standing changes applied.
    pub player_effects: usize,
    /// Human-readable notes, including every rejection.
    pub warnings: Vec<String>,
}

impl BatchReport {
    fn new(ticket: Ticket) -> Self {
        Self {
            ticket,
            created: Vec::new(),
            failed: Vec::new(),
            relationships: Vec::new(),
            failed_relationships: Vec::new(),
            parameter_changes: Vec::new(),
            feed_items: 0,
            player_effects: 0,
            warnings: Vec::new(),
        }
    }

    /// Ids created of `kind`.
    #[must_use]
    pub fn created_of(&self, kind: EntityKind) -> Vec<&str> {
        self.created
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.id.as_str())
            .collect()
    }
}

/// Answer to [`CreationPipeline::process_entity_creation`].
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// The payload was processed on this call.
    Completed(BatchReport),
    /// A batch was in flight; the payload is queued. Collect its report
    /// with [`CreationPipeline::take_report`].
    Queued(Ticket),
}

/// Whether a batch is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Nothing in flight.
    Idle,
    /// A thread is committing batches.
    Processing,
}

// ---------------------------------------------------------------------------
// Per-kind admission hooks
// ---------------------------------------------------------------------------

/// An entity kind the pipeline can admit.
pub trait Admissible: EntityData {
    /// Run the kind's creation rule.
    fn check(&self, validator: &Validator, view: StateView<'_>) -> ValidationReport;

    /// Rewrite cross-references given as display names into ids, so the
    /// rule and the stored record see the same reference.
    fn resolve_references(&mut self, _entities: &EntityStore) {}

    /// Follow-up after the record is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the follow-up cannot be applied; the entity
    /// itself stays committed.
    fn on_admitted(_model: &mut WorldModel, _id: &str) -> Result<()> {
        Ok(())
    }
}

impl Admissible for Npc {
    fn check(&self, validator: &Validator, view: StateView<'_>) -> ValidationReport {
        validator.validate_npc_creation(self, view)
    }

    fn resolve_references(&mut self, entities: &EntityStore) {
        if let Some(location) = self.location.as_mut() {
            resolve_ref(entities, EntityKind::Location, location);
        }
    }
}

impl Admissible for Faction {
    fn check(&self, validator: &Validator, view: StateView<'_>) -> ValidationReport {
        validator.validate_faction_creation(self, view)
    }

    fn resolve_references(&mut self, entities: &EntityStore) {
        if let Some(leader) = self.leader.as_mut() {
            resolve_ref(entities, EntityKind::Npc, leader);
        }
        for territory in &mut self.territory {
            resolve_ref(entities, EntityKind::Location, territory);
        }
        for other in self.allies.iter_mut().chain(self.enemies.iter_mut()) {
            resolve_ref(entities, EntityKind::Faction, other);
        }
    }
}

impl Admissible for Location {
    fn check(&self, validator: &Validator, view: StateView<'_>) -> ValidationReport {
        validator.validate_location_creation(self, view)
    }

    fn resolve_references(&mut self, entities: &EntityStore) {
        for connection in &mut self.connections {
            resolve_ref(entities, EntityKind::Location, connection);
        }
        if let Some(faction) = self.controlling_faction.as_mut() {
            resolve_ref(entities, EntityKind::Faction, faction);
        }
    }
}

impl Admissible for Item {
    fn check(&self, validator: &Validator, view: StateView<'_>) -> ValidationReport {
        validator.validate_item_creation(self, view)
    }

    fn resolve_references(&mut self, entities: &EntityStore) {
        if let Some(location) = self.location.as_mut() {
            resolve_ref(entities, EntityKind::Location, location);
        }
        if let Some(owner) = self.owner.as_mut() {
            resolve_any(entities, owner);
        }
    }
}

impl Admissible for Event {
    fn check(&self, validator: &Validator, view: StateView<'_>) -> ValidationReport {
        validator.validate_event_creation(self, view)
    }

    fn resolve_references(&mut self, entities: &EntityStore) {
        if let Some(location) = self.location.as_mut() {
            resolve_ref(entities, EntityKind::Location, location);
        }
        for participant in &mut self.participants {
            resolve_any(entities, participant);
        }
    }

    /// Active and scheduled events are also tracked by the world clock.
    fn on_admitted(model: &mut WorldModel, id: &str) -> Result<()> {
        let Some(record) = model.entities.get::<Event>(id) else {
            return Ok(());
        };
        if !matches!(record.data.status, EventStatus::Active | EventStatus::Scheduled) {
            return Ok(());
        }
        let tracked = WorldEvent::from_entity(id, &record.data, model.world.today());
        let partition = model.world.add_event(tracked)?;
        model.sync_event_status(id, EventStatus::from(partition))
    }
}

/// Replace `reference` with the id of the `kind` entity it names. Unknown
/// references are kept for the rules to report.
fn resolve_ref(entities: &EntityStore, kind: EntityKind, reference: &mut String) {
    if let Some(id) = entities.resolve_as(kind, reference) {
        if id != *reference {
            debug!(%kind, from = %reference, to = %id, "reference resolved by name");
            *reference = id;
        }
    }
}

/// As [`resolve_ref`], for references that may point at any kind or the
/// player.
fn resolve_any(entities: &EntityStore, reference: &mut String) {
    if reference.trim().eq_ignore_ascii_case(PLAYER_ID) {
        return;
    }
    if let Some((kind, id)) = entities.resolve_reference(reference.trim()) {
        if id != *reference {
            debug!(%kind, from = %reference, to = %id, "reference resolved by name");
            *reference = id;
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Reports of queued batches kept for [`CreationPipeline::take_report`]
/// before the oldest are dropped.
pub const UNCLAIMED_REPORT_LIMIT: usize = 64;

#[derive(Debug)]
struct PipelineQueue {
    state: PipelineState,
    pending: VecDeque<(Ticket, DetectionPayload)>,
    completed: BTreeMap<Ticket, BatchReport>,
    report_limit: usize,
    next_ticket: u64,
}

impl PipelineQueue {
    fn issue(&mut self) -> Ticket {
        self.next_ticket += 1;
        Ticket(self.next_ticket)
    }

    /// Tickets are issued in order, so the first key is the oldest report.
    fn store_report(&mut self, ticket: Ticket, report: BatchReport) {
        self.completed.insert(ticket, report);
        while self.completed.len() > self.report_limit {
            if let Some((dropped, _)) = self.completed.pop_first() {
                warn!(ticket = %dropped, "unclaimed batch report dropped");
            }
        }
    }
}

/// Releases the Processing state if a batch panics. On the normal path
/// `drain` returns to Idle itself.
struct ProcessingGuard<'a> {
    queue: &'a Mutex<PipelineQueue>,
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.queue.lock().state = PipelineState::Idle;
        }
    }
}

/// Validated, serialized admission of AI proposals into a shared world.
pub struct CreationPipeline {
    model: Arc<RwLock<WorldModel>>,
    validator: Validator,
    queue: Mutex<PipelineQueue>,
}

impl fmt::Debug for CreationPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreationPipeline")
            .field("validator", &self.validator)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl CreationPipeline {
    /// Create a pipeline writing into `model`, with limits taken from the
    /// model's configuration.
    #[must_use]
    pub fn new(model: Arc<RwLock<WorldModel>>) -> Self {
        let validator = Validator::new(model.read().config.limits.clone());
        Self::with_validator(model, validator)
    }

    /// Create a pipeline with an explicit validator.
    #[must_use]
    pub fn with_validator(model: Arc<RwLock<WorldModel>>, validator: Validator) -> Self {
        Self {
            model,
            validator,
            queue: Mutex::new(PipelineQueue {
                state: PipelineState::Idle,
                pending: VecDeque::new(),
                completed: BTreeMap::new(),
                report_limit: UNCLAIMED_REPORT_LIMIT,
                next_ticket: 0,
            }),
        }
    }

    /// Keep at most `limit` unclaimed reports (at least one).
    #[must_use]
    pub fn with_report_limit(self, limit: usize) -> Self {
        self.queue.lock().report_limit = limit.max(1);
        self
    }

    /// Reports waiting to be taken.
    #[must_use]
    pub fn unclaimed_reports(&self) -> usize {
        self.queue.lock().completed.len()
    }

    /// The shared world this pipeline writes into.
    #[must_use]
    pub fn model(&self) -> &Arc<RwLock<WorldModel>> {
        &self.model
    }

    /// The validator in use.
    #[must_use]
    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Whether a batch is in flight.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.queue.lock().state
    }

    /// Number of payloads waiting behind the in-flight batch.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.lock().pending.len()
    }

    /// Submit a payload.
    ///
    /// When Idle, this call processes the payload, then every payload
    /// queued meanwhile, and returns the payload's own report. When a batch
    /// is already in flight, the payload is queued and its ticket returned.
    pub fn process_entity_creation(&self, payload: DetectionPayload) -> Submission {
        let ticket = {
            let mut queue = self.queue.lock();
            let ticket = queue.issue();
            queue.pending.push_back((ticket, payload));
            if queue.state == PipelineState::Processing {
                debug!(%ticket, pending = queue.pending.len(), "batch queued");
                return Submission::Queued(ticket);
            }
            queue.state = PipelineState::Processing;
            ticket
        };

        let guard = ProcessingGuard { queue: &self.queue };
        let own = self.drain(ticket);
        drop(guard);

        match own {
            Some(report) => Submission::Completed(report),
            None => Submission::Queued(ticket),
        }
    }

    /// Collect the report of a finished batch. Each report can be taken
    /// once.
    #[must_use]
    pub fn take_report(&self, ticket: Ticket) -> Option<BatchReport> {
        self.queue.lock().completed.remove(&ticket)
    }

    /// Process queued payloads until the queue is empty and return the
    /// report for `own`; the others wait for [`take_report`](Self::take_report).
    /// Returning to Idle happens under the same lock as the final empty
    /// check.
    fn drain(&self, own: Ticket) -> Option<BatchReport> {
        let mut own_report = None;
        loop {
            let next = {
                let mut queue = self.queue.lock();
                let next = queue.pending.pop_front();
                if next.is_none() {
                    queue.state = PipelineState::Idle;
                }
                next
            };
            let Some((ticket, payload)) = next else {
                break;
            };
            let report = self.run_batch(ticket, payload);
            if ticket == own {
                own_report = Some(report);
            } else {
                self.queue.lock().store_report(ticket, report);
            }
        }
        own_report
    }

    fn run_batch(&self, ticket: Ticket, payload: DetectionPayload) -> BatchReport {
        let mut model = self.model.write();
        let mut report = BatchReport::new(ticket);
        let DetectionPayload {
            entities,
            relationships,
            world_updates,
            player_effects,
        } = payload;

        info!(%ticket, proposals = entities.total(), relationships = relationships.len(), "batch started");

        self.admit_all(&mut model, entities.locations, &mut report);
        self.admit_all(&mut model, entities.factions, &mut report);
        self.admit_all(&mut model, entities.npcs, &mut report);
        self.admit_all(&mut model, entities.items, &mut report);
        self.admit_all(&mut model, entities.events, &mut report);

        for proposal in relationships {
            self.commit_relationship(&mut model, proposal, &mut report);
        }
        apply_world_updates(&mut model, world_updates, &mut report);
        for effect in player_effects {
            apply_player_effect(&mut model, effect, &mut report);
        }

        info!(
            %ticket,
            created = report.created.len(),
            failed = report.failed.len(),
            relationships = report.relationships.len(),
            "batch finished"
        );
        report
    }

    fn admit_all<T: Admissible>(&self, model: &mut WorldModel, proposals: Vec<EntityProposal<T>>, report: &mut BatchReport) {
        for proposal in proposals {
            self.admit(model, proposal, report);
        }
    }

    fn admit<T: Admissible>(&self, model: &mut WorldModel, proposal: EntityProposal<T>, report: &mut BatchReport) {
        let kind = T::KIND;
        let EntityProposal { id, mut data } = proposal;
        data.resolve_references(&model.entities);
        let id = id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| slugify(data.name()));
        if id.is_empty() {
            reject(report, kind, id, "proposal has neither an id nor a usable name".to_string());
            return;
        }

        let verdict = data.check(&self.validator, model.view());
        report
            .warnings
            .extend(verdict.warnings.iter().map(|w| format!("{kind} '{id}': {w}")));
        if !verdict.valid {
            reject(report, kind, id, verdict.reasons.join("; "));
            return;
        }

        if let Err(err) = model.entities.create(id.clone(), data) {
            reject(report, kind, id, err.to_string());
            return;
        }
        if let Err(err) = T::on_admitted(model, &id) {
            report.warnings.push(format!("{kind} '{id}' created, but: {err}"));
        }
        debug!(%kind, id = %id, "proposal admitted");
        report.created.push(CreatedEntity { kind, id });
    }

    fn commit_relationship(&self, model: &mut WorldModel, proposal: RelationshipProposal, report: &mut BatchReport) {
        let source = resolve_endpoint(model, &proposal.entity1);
        let target = resolve_endpoint(model, &proposal.entity2);
        let (Some(source), Some(target)) = (source, target) else {
            skip_relationship(report, proposal, "an endpoint does not exist".to_string());
            return;
        };

        let verdict = self
            .validator
            .validate_relationship(&source, &target, &proposal.kind, proposal.strength, model.view());
        report.warnings.extend(verdict.warnings.iter().cloned());
        if !verdict.valid {
            let reason = verdict.reasons.join("; ");
            skip_relationship(report, proposal, reason);
            return;
        }

        let result = proposal.kind.parse::<RelationshipType>().and_then(|kind| {
            let input = RelationshipInput::new(kind, proposal.strength, proposal.reason.clone());
            model.relationships.set_relationship(&source, &target, input).map(|edge| edge.kind)
        });
        match result {
            Ok(kind) => report.relationships.push(CommittedRelationship { source, target, kind }),
            Err(err) => skip_relationship(report, proposal, err.to_string()),
        }
    }
}

fn reject(report: &mut BatchReport, kind: EntityKind, id: String, reason: String) {
    warn!(%kind, id = %id, reason = %reason, "proposal rejected");
    report.warnings.push(format!("Could not create {kind} '{id}': {reason}"));
    report.failed.push(FailedCreation { kind, id, reason });
}

fn skip_relationship(report: &mut BatchReport, proposal: RelationshipProposal, reason: String) {
    warn!(entity1 = %proposal.entity1, entity2 = %proposal.entity2, reason = %reason, "relationship skipped");
    report.warnings.push(format!(
        "Could not relate '{}' to '{}': {reason}",
        proposal.entity1, proposal.entity2
    ));
    report.failed_relationships.push(FailedRelationship {
        entity1: proposal.entity1,
        entity2: proposal.entity2,
        reason,
    });
}

/// Resolve an id or display name; `"player"` always resolves.
fn resolve_endpoint(model: &WorldModel, reference: &str) -> Option<String> {
    if reference.trim().eq_ignore_ascii_case(PLAYER_ID) {
        return Some(PLAYER_ID.to_string());
    }
    model.entities.resolve_reference(reference.trim()).map(|(_, id)| id)
}

fn apply_world_updates(model: &mut WorldModel, updates: WorldUpdates, report: &mut BatchReport) {
    for (parameter, delta) in updates.deltas() {
        let change = model.world.adjust(parameter, delta, "story consequence");
        report.parameter_changes.push(change);
    }
    for rumor in updates.rumors {
        model.world.add_rumor(rumor);
        report.feed_items += 1;
    }
    for news in updates.news {
        model.world.add_news(news);
        report.feed_items += 1;
    }
}

fn apply_player_effect(model: &mut WorldModel, effect: PlayerEffect, report: &mut BatchReport) {
    match resolve_endpoint(model, &effect.entity) {
        Some(id) if id != PLAYER_ID => {
            model.relationships.update_player_standing(&id, effect.change, effect.reason);
            report.player_effects += 1;
        }
        _ => {
            warn!(entity = %effect.entity, "player effect targets unknown entity");
            report
                .warnings
                .push(format!("Player effect skipped: '{}' does not exist", effect.entity));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::LocationType;

    fn pipeline() -> CreationPipeline {
        CreationPipeline::new(Arc::new(RwLock::new(WorldModel::default())))
    }

    fn completed(submission: Submission) -> BatchReport {
        match submission {
            Submission::Completed(report) => report,
            Submission::Queued(ticket) => panic!("expected completion, got queued {ticket}"),
        }
    }

    #[test]
    fn derives_ids_and_respects_kind_order() {
        let pipeline = pipeline();
        let mut payload = DetectionPayload::default();
        payload
            .entities
            .npcs
            .push(EntityProposal::unnamed(Npc::new("Old Tom", "innkeeper").at("rusty_anchor")));
        payload
            .entities
            .locations
            .push(EntityProposal::unnamed(Location::new("Rusty Anchor", LocationType::Tavern)));

        let report = completed(pipeline.process_entity_creation(payload));
        assert_eq!(report.created_of(EntityKind::Location), vec!["rusty_anchor"]);
        assert_eq!(report.created_of(EntityKind::Npc), vec!["old_tom"]);
        assert_eq!(report.created[0].kind, EntityKind::Location);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn duplicate_in_store_lands_in_failed() {
        let pipeline = pipeline();
        pipeline
            .model()
            .write()
            .entities
            .create("tom", Npc::new("Tom", "cook"))
            .expect("seed");

        let mut payload = DetectionPayload::default();
        payload.entities.npcs.push(EntityProposal::with_id("tom", Npc::new("Tom", "cook")));
        let report = completed(pipeline.process_entity_creation(payload));
        assert!(report.created.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].reason.contains("Duplicate"));
    }

    #[test]
    fn relationships_resolve_names_created_in_same_batch() {
        let pipeline = pipeline();
        let mut payload = DetectionPayload::default();
        payload.entities.npcs.push(EntityProposal::unnamed(Npc::new("Mira", "healer")));
        payload.entities.npcs.push(EntityProposal::unnamed(Npc::new("Tom", "innkeeper")));
        payload.relationships.push(RelationshipProposal {
            entity1: "Mira".into(),
            entity2: "tom".into(),
            kind: "friendship".into(),
            strength: 75.0,
            reason: "childhood friends".into(),
        });
        payload.relationships.push(RelationshipProposal {
            entity1: "Mira".into(),
            entity2: "Nobody".into(),
            kind: "friend".into(),
            strength: 75.0,
            reason: String::new(),
        });

        let report = completed(pipeline.process_entity_creation(payload));
        assert_eq!(report.relationships.len(), 1);
        assert_eq!(report.relationships[0].kind, RelationshipType::Friend);
        assert_eq!(report.failed_relationships.len(), 1);
        assert!(pipeline.model().read().relationships.get_relationship("mira", "tom").is_some());
    }

    #[test]
    fn world_updates_and_player_effects_apply_last() {
        let pipeline = pipeline();
        let mut payload = DetectionPayload::default();
        payload.entities.npcs.push(EntityProposal::with_id("tom", Npc::new("Tom", "innkeeper")));
        payload.world_updates.tension = Some(-50.0);
        payload.world_updates.rumors.push("The king is ill".into());
        payload.player_effects.push(PlayerEffect {
            entity: "tom".into(),
            change: 10.0,
            reason: "paid for the round".into(),
        });

        let report = completed(pipeline.process_entity_creation(payload));
        assert_eq!(report.parameter_changes.len(), 1);
        assert!(report.parameter_changes[0].new_value.abs() < f32::EPSILON);
        assert_eq!(report.feed_items, 1);
        assert_eq!(report.player_effects, 1);

        let model = pipeline.model().read();
        assert!((model.relationships.get_player_standing("tom") - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn active_events_are_tracked_by_the_world() {
        let pipeline = pipeline();
        let mut payload = DetectionPayload::default();
        payload.entities.events.push(EntityProposal::unnamed(Event::new("Harvest Fair")));
        let mut later = Event::new("Winter Solstice");
        later.start_day = Some(90);
        payload.entities.events.push(EntityProposal::unnamed(later));

        completed(pipeline.process_entity_creation(payload));
        let model = pipeline.model().read();
        assert_eq!(model.world.events().active_count(), 1);
        assert_eq!(model.world.events().scheduled.len(), 1);
        assert_eq!(
            model.entities.get::<Event>("winter_solstice").map(|r| r.data.status),
            Some(EventStatus::Scheduled)
        );
    }

    #[test]
    fn returns_to_idle_after_batch() {
        let pipeline = pipeline();
        completed(pipeline.process_entity_creation(DetectionPayload::default()));
        assert_eq!(pipeline.state(), PipelineState::Idle);
        assert_eq!(pipeline.pending(), 0);
    }
}
