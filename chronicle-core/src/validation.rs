//! Validation Engine: structural rules for proposed entities and
//! relationships, and the whole-graph integrity scan.
//!
//! Every check is a pure function of the proposal and a [`StateView`].
//! Rejections (`reasons`) block a creation; warnings never do.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::LimitsConfig;
use crate::entity::{Event, EventStatus, Faction, Item, Location, LocationType, Npc};
use crate::error::{ChronicleError, Result};
use crate::model::StateView;
use crate::relationship::RelationshipType;
use crate::types::{EntityKind, PLAYER_ID};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Verdict on one proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Whether the proposal may be committed.
    pub valid: bool,
    /// Why it was rejected. Empty when valid.
    pub reasons: Vec<String>,
    /// Non-blocking observations.
    pub warnings: Vec<String>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::ok()
    }
}

impl ValidationReport {
    /// A passing report with no warnings.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            valid: true,
            reasons: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Record a blocking reason.
    pub fn reject(&mut self, reason: impl Into<String>) {
        self.valid = false;
        self.reasons.push(reason.into());
    }

    /// Record a non-blocking warning.
    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Convert to a `Result`, yielding the warnings on success.
    ///
    /// # Errors
    ///
    /// Returns [`ChronicleError::ValidationRejected`] with every reason
    /// joined when the report is not valid.
    pub fn into_result(self) -> Result<Vec<String>> {
        if self.valid {
            Ok(self.warnings)
        } else {
            Err(ChronicleError::ValidationRejected {
                reason: self.reasons.join("; "),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Per-kind rules
// ---------------------------------------------------------------------------

/// Applies creation rules using the configured capacity limits.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a validator with the given limits.
    #[must_use]
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// The limits in force.
    #[must_use]
    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    /// Rules for a proposed NPC.
    #[must_use]
    pub fn validate_npc_creation(&self, npc: &Npc, view: StateView<'_>) -> ValidationReport {
        let mut report = ValidationReport::ok();

        if let Some(location_id) = npc.location.as_deref() {
            let residents = view
                .entities
                .list::<Npc>()
                .filter(|r| r.data.location.as_deref() == Some(location_id))
                .count();
            if residents >= self.limits.max_npcs_per_location {
                report.reject(format!(
                    "location '{location_id}' already holds {residents} NPCs (max {})",
                    self.limits.max_npcs_per_location
                ));
            }

            match view.entities.get::<Location>(location_id) {
                Some(location) => {
                    let kind = location.data.location_type;
                    if occupation_fits(&npc.occupation, kind) == Some(false) {
                        report.warn(format!(
                            "occupation '{}' is unusual for a {kind} ('{location_id}')",
                            npc.occupation
                        ));
                    }
                }
                None => report.warn(format!("location '{location_id}' does not exist")),
            }
        }

        if view.entities.find_by_name(EntityKind::Npc, &npc.name).is_some() {
            report.warn(format!("an NPC named '{}' already exists", npc.name));
        }

        report
    }

    /// Rules for a proposed faction.
    #[must_use]
    pub fn validate_faction_creation(&self, faction: &Faction, view: StateView<'_>) -> ValidationReport {
        let mut report = ValidationReport::ok();

        for territory in &faction.territory {
            let mut holders: BTreeSet<&str> = view
                .entities
                .list::<Faction>()
                .filter(|r| r.data.controls(territory))
                .map(|r| r.id.as_str())
                .collect();
            if let Some(controller) = view
                .entities
                .get::<Location>(territory)
                .and_then(|r| r.data.controlling_faction.as_deref())
            {
                holders.insert(controller);
            }
            let claimants = holders.len();
            if claimants >= self.limits.max_factions_per_territory {
                report.reject(format!(
                    "territory '{territory}' already has {claimants} controlling factions (max {})",
                    self.limits.max_factions_per_territory
                ));
            }
        }

        let allies: BTreeSet<&str> = faction.allies.iter().map(String::as_str).collect();
        let overlap: Vec<&str> = faction
            .enemies
            .iter()
            .map(String::as_str)
            .filter(|enemy| allies.contains(enemy))
            .collect();
        if !overlap.is_empty() {
            report.reject(format!("factions listed as both ally and enemy: {}", overlap.join(", ")));
        }

        if let Some(leader) = faction.leader.as_deref().filter(|id| view.entities.get::<Npc>(id).is_none()) {
            report.warn(format!("leader '{leader}' is not a known NPC"));
        }

        report
    }

    /// Rules for a proposed location.
    #[must_use]
    pub fn validate_location_creation(&self, location: &Location, view: StateView<'_>) -> ValidationReport {
        let mut report = ValidationReport::ok();

        for connection in &location.connections {
            if view.entities.get::<Location>(connection).is_none() {
                report.warn(format!("connection '{connection}' is not a known location"));
            }
        }

        let range = location.location_type.population_range();
        if !range.contains(&location.population) {
            report.warn(format!(
                "population {} is outside {}..={} expected for a {}",
                location.population,
                range.start(),
                range.end(),
                location.location_type
            ));
        }

        report
    }

    /// Rules for a proposed item.
    #[must_use]
    pub fn validate_item_creation(&self, item: &Item, view: StateView<'_>) -> ValidationReport {
        let mut report = ValidationReport::ok();

        if item.value.is_nan() || item.value < 0.0 {
            report.reject(format!("value {} must not be negative", item.value));
        }
        if item.weight.is_nan() || item.weight < 0.0 {
            report.reject(format!("weight {} must not be negative", item.weight));
        }
        if !(0.0..=100.0).contains(&item.durability) {
            report.reject(format!("durability {} is outside 0..=100", item.durability));
        }

        if let Some(owner) = item.owner.as_deref() {
            let held = view
                .entities
                .list::<Item>()
                .filter(|r| r.data.owner.as_deref() == Some(owner))
                .count();
            if held >= self.limits.max_inventory_items {
                report.reject(format!(
                    "'{owner}' already holds {held} items (max {})",
                    self.limits.max_inventory_items
                ));
            }
        }

        let band = item.rarity.value_band();
        if item.value >= 0.0 && !band.contains(&item.value) {
            report.warn(format!("value {} is unusual for a {} item", item.value, item.rarity));
        }

        report
    }

    /// Rules for a proposed event.
    #[must_use]
    pub fn validate_event_creation(&self, event: &Event, view: StateView<'_>) -> ValidationReport {
        let mut report = ValidationReport::ok();

        let today = view.world.today();
        // Same partition rule as `WorldEvents::add`: a scheduled event whose
        // start day has passed lands in `current`.
        let starts_now = matches!(event.status, EventStatus::Active | EventStatus::Scheduled)
            && event.start_day.is_none_or(|day| day <= today);
        let active = view.world.events().active_count();
        if starts_now && active >= self.limits.max_active_events {
            report.reject(format!(
                "{active} events are already active (max {})",
                self.limits.max_active_events
            ));
        }

        report
    }

    /// Rules for a proposed relationship. `kind` is the raw type label.
    #[must_use]
    pub fn validate_relationship(
        &self,
        source: &str,
        target: &str,
        kind: &str,
        strength: f32,
        view: StateView<'_>,
    ) -> ValidationReport {
        let mut report = ValidationReport::ok();

        if source == target {
            report.reject(format!("'{source}' cannot have a relationship with itself"));
        }
        for endpoint in [source, target] {
            if endpoint != PLAYER_ID && !view.entities.contains_any(endpoint) {
                report.reject(format!("'{endpoint}' does not exist"));
            }
        }
        #[allow(clippy::cast_precision_loss)]
        let min_trust = self.limits.min_trust_for_alliance as f32;
        match kind.parse::<RelationshipType>() {
            Ok(RelationshipType::Ally) if strength < min_trust => {
                report.warn(format!(
                    "alliance between '{source}' and '{target}' is weak ({strength} < {})",
                    self.limits.min_trust_for_alliance
                ));
            }
            Ok(_) => {}
            Err(err) => report.reject(err.to_string()),
        }

        report
    }
}

/// Whether `occupation` suits a location of `kind`. `None` when the
/// occupation is not in the table or the location is unclassified.
fn occupation_fits(occupation: &str, kind: LocationType) -> Option<bool> {
    if kind == LocationType::Other {
        return None;
    }
    let occupation = occupation.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| occupation.contains(w));

    let fits = if has(&["innkeeper", "barkeep", "bartender", "tavern keeper"]) {
        kind == LocationType::Tavern
    } else if has(&["priest", "cleric", "acolyte", "monk"]) {
        kind == LocationType::Temple || kind.is_settlement()
    } else if has(&["shopkeeper", "merchant", "trader"]) {
        kind == LocationType::Shop || kind.is_settlement()
    } else if has(&["guard", "soldier", "knight"]) {
        kind == LocationType::Castle || kind.is_settlement()
    } else if has(&["farmer", "hunter"]) {
        matches!(kind, LocationType::Village | LocationType::Wilderness)
    } else if has(&["miner"]) {
        matches!(kind, LocationType::Dungeon | LocationType::Wilderness | LocationType::Village)
    } else {
        return None;
    };
    Some(fits)
}

// ---------------------------------------------------------------------------
// Integrity scan
// ---------------------------------------------------------------------------

/// Category of an integrity finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// An NPC's location does not exist.
    OrphanedNpcLocation,
    /// A faction's leader is not a known NPC.
    OrphanedFactionLeader,
    /// A faction claims a location that does not exist.
    OrphanedTerritory,
    /// A location connects to a location that does not exist.
    OrphanedConnection,
    /// A relationship endpoint does not exist.
    OrphanedRelationship,
    /// A world parameter lies outside its bounds.
    ParameterOutOfBounds,
}

/// One integrity finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityIssue {
    /// Category.
    pub kind: IssueKind,
    /// Id of the entity (or parameter name) carrying the bad reference.
    pub subject: String,
    /// Human-readable description.
    pub message: String,
}

/// Aggregate counts gathered during the scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityStats {
    /// NPC count.
    pub npcs: usize,
    /// Faction count.
    pub factions: usize,
    /// Location count.
    pub locations: usize,
    /// Item count.
    pub items: usize,
    /// Event entity count.
    pub events: usize,
    /// Directed edge count.
    pub relationships: usize,
    /// World events under way.
    pub active_events: usize,
    /// Number of dangling references found.
    pub orphaned_references: usize,
    /// Number of parameters outside bounds.
    pub parameters_out_of_bounds: usize,
}

/// Result of [`validate_integrity`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrityReport {
    /// Every finding.
    pub issues: Vec<IntegrityIssue>,
    /// Aggregate statistics.
    pub stats: IntegrityStats,
}

impl IntegrityReport {
    /// Whether the scan found nothing.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Convert to a `Result`, yielding the statistics when clean.
    ///
    /// # Errors
    ///
    /// Returns [`ChronicleError::IntegrityViolation`] carrying the issue
    /// count and the first message.
    pub fn into_result(self) -> Result<IntegrityStats> {
        match self.issues.first() {
            None => Ok(self.stats),
            Some(first) => Err(ChronicleError::IntegrityViolation {
                count: self.issues.len(),
                first: first.message.clone(),
            }),
        }
    }

    fn push(&mut self, kind: IssueKind, subject: &str, message: String) {
        self.issues.push(IntegrityIssue {
            kind,
            subject: subject.to_string(),
            message,
        });
    }
}

/// Scan the whole world for dangling references and out-of-bounds
/// parameters. Reports only; never corrects.
#[must_use]
pub fn validate_integrity(view: StateView<'_>) -> IntegrityReport {
    let entities = view.entities;
    let mut report = IntegrityReport::default();

    for npc in entities.list::<Npc>() {
        if let Some(location) = npc
            .data
            .location
            .as_deref()
            .filter(|id| !entities.contains(EntityKind::Location, id))
        {
            report.push(
                IssueKind::OrphanedNpcLocation,
                &npc.id,
                format!("NPC '{}' is at unknown location '{location}'", npc.id),
            );
        }
    }

    for faction in entities.list::<Faction>() {
        if let Some(leader) = faction
            .data
            .leader
            .as_deref()
            .filter(|id| !entities.contains(EntityKind::Npc, id))
        {
            report.push(
                IssueKind::OrphanedFactionLeader,
                &faction.id,
                format!("faction '{}' is led by unknown NPC '{leader}'", faction.id),
            );
        }
        for territory in &faction.data.territory {
            if !entities.contains(EntityKind::Location, territory) {
                report.push(
                    IssueKind::OrphanedTerritory,
                    &faction.id,
                    format!("faction '{}' claims unknown location '{territory}'", faction.id),
                );
            }
        }
    }

    for location in entities.list::<Location>() {
        for connection in &location.data.connections {
            if !entities.contains(EntityKind::Location, connection) {
                report.push(
                    IssueKind::OrphanedConnection,
                    &location.id,
                    format!("location '{}' connects to unknown location '{connection}'", location.id),
                );
            }
        }
    }

    for edge in view.relationships.edges() {
        for endpoint in [&edge.source, &edge.target] {
            if endpoint != PLAYER_ID && !entities.contains_any(endpoint) {
                report.push(
                    IssueKind::OrphanedRelationship,
                    endpoint,
                    format!("relationship '{}' -> '{}' references unknown '{endpoint}'", edge.source, edge.target),
                );
            }
        }
    }

    let orphaned = report.issues.len();

    for (parameter, value) in view.world.parameters().out_of_bounds() {
        let (min, max) = parameter.bounds();
        report.push(
            IssueKind::ParameterOutOfBounds,
            parameter.as_str(),
            format!("{parameter} is {value}, outside {min}..={max}"),
        );
    }

    report.stats = IntegrityStats {
        npcs: entities.count(EntityKind::Npc),
        factions: entities.count(EntityKind::Faction),
        locations: entities.count(EntityKind::Location),
        items: entities.count(EntityKind::Item),
        events: entities.count(EntityKind::Event),
        relationships: view.relationships.edge_count(),
        active_events: view.world.events().active_count(),
        orphaned_references: orphaned,
        parameters_out_of_bounds: report.issues.len() - orphaned,
    };
    report
}
