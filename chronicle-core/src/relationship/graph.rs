//! Edge storage, the global ledger and player standings.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    EdgeChange, LedgerAction, LedgerEntry, PlayerStanding, Relationship, RelationshipInput, RelationshipPatch,
    StandingChange,
};
use crate::config::HistoryConfig;
use crate::error::{ChronicleError, Result};
use crate::types::{clamp_score, push_bounded};

/// Separator between source and target in exported edge keys.
const EDGE_KEY_SEPARATOR: &str = "->";

/// Serialised form of the graph, the `relationships` section of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipExport {
    /// Player standing keyed by entity id.
    #[serde(default)]
    pub player_standings: BTreeMap<String, PlayerStanding>,
    /// Edges keyed `"source->target"`.
    #[serde(default)]
    pub edges: BTreeMap<String, Relationship>,
    /// Global ledger, oldest first.
    #[serde(default)]
    pub history: Vec<LedgerEntry>,
}

/// Directed relationship graph plus player standings.
#[derive(Debug, Clone)]
pub struct RelationshipGraph {
    /// source → target → edge.
    edges: BTreeMap<String, BTreeMap<String, Relationship>>,
    ledger: Vec<LedgerEntry>,
    standings: BTreeMap<String, PlayerStanding>,
    limits: HistoryConfig,
}

impl Default for RelationshipGraph {
    fn default() -> Self {
        Self::new(&HistoryConfig::default())
    }
}

impl RelationshipGraph {
    /// Create an empty graph using the given retention windows.
    #[must_use]
    pub fn new(limits: &HistoryConfig) -> Self {
        Self {
            edges: BTreeMap::new(),
            ledger: Vec::new(),
            standings: BTreeMap::new(),
            limits: limits.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Edges
    // ------------------------------------------------------------------

    /// Create or overwrite the edge `source → target`.
    ///
    /// An existing edge keeps its establishment time and history; the new
    /// values are appended to that history.
    ///
    /// # Errors
    ///
    /// Returns [`ChronicleError::SelfRelationship`] when `source == target`.
    pub fn set_relationship(&mut self, source: &str, target: &str, input: RelationshipInput) -> Result<&Relationship> {
        if source == target {
            return Err(ChronicleError::SelfRelationship(source.to_string()));
        }

        let now = Utc::now();
        let strength = clamp_score(input.strength);
        let previous = self.get_relationship(source, target).map(|edge| edge.strength);
        let action = if previous.is_some() { LedgerAction::Updated } else { LedgerAction::Established };

        self.record(LedgerEntry {
            action,
            source: source.to_string(),
            target: target.to_string(),
            kind: input.kind,
            strength,
            previous_strength: previous,
            reason: input.reason.clone(),
            timestamp: now,
        });

        let change = EdgeChange {
            timestamp: now,
            kind: input.kind,
            strength,
            reason: input.reason.clone(),
        };
        let edge_limit = self.limits.edge_history_limit;
        let edge = self
            .edges
            .entry(source.to_string())
            .or_default()
            .entry(target.to_string())
            .or_insert_with(|| Relationship {
                source: source.to_string(),
                target: target.to_string(),
                kind: input.kind,
                strength,
                reason: String::new(),
                established: input.established.unwrap_or(now),
                last_modified: now,
                history: Vec::new(),
            });

        edge.kind = input.kind;
        edge.strength = strength;
        edge.reason = input.reason;
        edge.last_modified = now;
        push_bounded(&mut edge.history, change, edge_limit);

        debug!(source, target, kind = %edge.kind, strength, ?action, "relationship set");
        Ok(&*edge)
    }

    /// Merge `patch` into the existing edge `source → target`.
    ///
    /// # Errors
    ///
    /// Returns [`ChronicleError::NotFound`] if the edge does not exist.
    pub fn update_relationship(&mut self, source: &str, target: &str, patch: RelationshipPatch) -> Result<&Relationship> {
        let now = Utc::now();
        let edge_limit = self.limits.edge_history_limit;
        let edge = self
            .edges
            .get_mut(source)
            .and_then(|targets| targets.get_mut(target))
            .ok_or_else(|| ChronicleError::NotFound(format!("relationship '{source}' -> '{target}'")))?;

        let previous = edge.strength;
        if let Some(kind) = patch.kind {
            edge.kind = kind;
        }
        if let Some(strength) = patch.strength {
            edge.strength = clamp_score(strength);
        }
        if let Some(reason) = patch.reason {
            edge.reason = reason;
        }
        edge.last_modified = now;
        push_bounded(
            &mut edge.history,
            EdgeChange {
                timestamp: now,
                kind: edge.kind,
                strength: edge.strength,
                reason: edge.reason.clone(),
            },
            edge_limit,
        );

        let entry = LedgerEntry {
            action: LedgerAction::Updated,
            source: source.to_string(),
            target: target.to_string(),
            kind: edge.kind,
            strength: edge.strength,
            previous_strength: Some(previous),
            reason: edge.reason.clone(),
            timestamp: now,
        };
        self.record(entry);

        debug!(source, target, "relationship updated");
        self.get_relationship(source, target)
            .ok_or_else(|| ChronicleError::NotFound(format!("relationship '{source}' -> '{target}'")))
    }

    /// The directed edge `source → target`, if any.
    #[must_use]
    pub fn get_relationship(&self, source: &str, target: &str) -> Option<&Relationship> {
        self.edges.get(source)?.get(target)
    }

    /// Either direction between `a` and `b`, preferring `a → b`.
    #[must_use]
    pub fn between(&self, a: &str, b: &str) -> Option<&Relationship> {
        self.get_relationship(a, b).or_else(|| self.get_relationship(b, a))
    }

    /// Every edge where `id` is the source or the target. Outgoing edges
    /// come first.
    #[must_use]
    pub fn get_entity_relationships(&self, id: &str) -> Vec<&Relationship> {
        let outgoing = self.edges.get(id).into_iter().flat_map(BTreeMap::values);
        let incoming = self
            .edges
            .iter()
            .filter(|(source, _)| source.as_str() != id)
            .filter_map(|(_, targets)| targets.get(id));
        outgoing.chain(incoming).collect()
    }

    /// Remove the edges between `a` and `b` in both directions. Returns how
    /// many edges were removed (0, 1 or 2).
    pub fn remove_relationship(&mut self, a: &str, b: &str) -> usize {
        let removed = [self.take_edge(a, b), self.take_edge(b, a)];
        let count = removed.iter().flatten().count();
        for edge in removed.into_iter().flatten() {
            self.record_removal(edge);
        }
        if count > 0 {
            debug!(a, b, count, "relationship removed");
        }
        count
    }

    /// Remove every edge touching `id`. Returns how many edges were removed.
    pub fn remove_entity_edges(&mut self, id: &str) -> usize {
        let counterparts: Vec<String> = self
            .get_entity_relationships(id)
            .into_iter()
            .map(|edge| edge.counterpart(id).to_string())
            .collect();
        let mut removed = 0;
        for other in counterparts {
            removed += self.remove_relationship(id, &other);
        }
        removed
    }

    /// Ledger entries involving `id`, optionally restricted to those whose
    /// other endpoint is `other`. Oldest first.
    #[must_use]
    pub fn get_relationship_history(&self, id: &str, other: Option<&str>) -> Vec<&LedgerEntry> {
        self.ledger
            .iter()
            .filter(|entry| entry.involves(id))
            .filter(|entry| other.is_none_or(|other| entry.involves(other)))
            .collect()
    }

    /// Every edge, ordered by source then target.
    pub fn edges(&self) -> impl Iterator<Item = &Relationship> {
        self.edges.values().flat_map(BTreeMap::values)
    }

    /// Number of directed edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeMap::len).sum()
    }

    /// The global ledger, oldest first.
    #[must_use]
    pub fn ledger(&self) -> &[LedgerEntry] {
        &self.ledger
    }

    // ------------------------------------------------------------------
    // Player standing
    // ------------------------------------------------------------------

    /// Set the player's standing with `id` to an absolute value.
    pub fn set_player_standing(&mut self, id: &str, value: f32, reason: impl Into<String>) -> &PlayerStanding {
        let current = self.get_player_standing(id);
        self.apply_standing(id, value - current, reason.into())
    }

    /// Adjust the player's standing with `id` by `delta`, creating a zero
    /// standing on first touch. Returns the new value.
    pub fn update_player_standing(&mut self, id: &str, delta: f32, reason: impl Into<String>) -> f32 {
        self.apply_standing(id, delta, reason.into()).value
    }

    /// The player's standing with `id`, or 0 if never touched.
    #[must_use]
    pub fn get_player_standing(&self, id: &str) -> f32 {
        self.standings.get(id).map_or(0.0, |standing| standing.value)
    }

    /// Full standing record, including history.
    #[must_use]
    pub fn player_standing(&self, id: &str) -> Option<&PlayerStanding> {
        self.standings.get(id)
    }

    /// Every standing record keyed by entity id.
    #[must_use]
    pub fn player_standings(&self) -> &BTreeMap<String, PlayerStanding> {
        &self.standings
    }

    // ------------------------------------------------------------------
    // Snapshot support
    // ------------------------------------------------------------------

    /// Export edges, ledger and standings.
    #[must_use]
    pub fn export(&self) -> RelationshipExport {
        RelationshipExport {
            player_standings: self.standings.clone(),
            edges: self
                .edges()
                .map(|edge| (format!("{}{EDGE_KEY_SEPARATOR}{}", edge.source, edge.target), edge.clone()))
                .collect(),
            history: self.ledger.clone(),
        }
    }

    /// Rebuild a graph from an export. Edge endpoints are taken from the
    /// edge records themselves, not from the map keys.
    #[must_use]
    pub fn from_export(export: RelationshipExport, limits: &HistoryConfig) -> Self {
        let mut graph = Self::new(limits);
        for edge in export.edges.into_values() {
            graph
                .edges
                .entry(edge.source.clone())
                .or_default()
                .insert(edge.target.clone(), edge);
        }
        graph.ledger = export.history;
        graph.standings = export.player_standings;
        graph
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn record(&mut self, entry: LedgerEntry) {
        push_bounded(&mut self.ledger, entry, self.limits.relationship_history_limit);
    }

    fn record_removal(&mut self, edge: Relationship) {
        self.record(LedgerEntry {
            action: LedgerAction::Removed,
            previous_strength: Some(edge.strength),
            strength: 0.0,
            source: edge.source,
            target: edge.target,
            kind: edge.kind,
            reason: edge.reason,
            timestamp: Utc::now(),
        });
    }

    fn take_edge(&mut self, source: &str, target: &str) -> Option<Relationship> {
        let targets = self.edges.get_mut(source)?;
        let edge = targets.remove(target);
        if targets.is_empty() {
            self.edges.remove(source);
        }
        edge
    }

    fn apply_standing(&mut self, id: &str, delta: f32, reason: String) -> &PlayerStanding {
        let now = Utc::now();
        let limit = self.limits.standing_history_limit;
        let standing = self.standings.entry(id.to_string()).or_default();
        let previous_value = standing.value;
        standing.value += delta;
        standing.last_change = Some(now);
        push_bounded(
            &mut standing.history,
            StandingChange {
                amount: delta,
                reason,
                timestamp: now,
                previous_value,
            },
            limit,
        );
        debug!(id, delta, value = standing.value, "player standing changed");
        &*standing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relationship::RelationshipType;

    fn ally(strength: f32) -> RelationshipInput {
        RelationshipInput::new(RelationshipType::Ally, strength, "sworn oath")
    }

    #[test]
    fn self_edges_are_rejected() {
        let mut graph = RelationshipGraph::default();
        let err = graph.set_relationship("tom", "tom", ally(50.0)).expect_err("self edge");
        assert!(matches!(err, ChronicleError::SelfRelationship(_)));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn strength_is_clamped() {
        let mut graph = RelationshipGraph::default();
        let high = graph.set_relationship("a", "b", ally(500.0)).expect("set").strength;
        assert!((high - 100.0).abs() < f32::EPSILON);
        let low = graph.set_relationship("a", "b", ally(-20.0)).expect("set").strength;
        assert!(low.abs() < f32::EPSILON);
    }

    #[test]
    fn edges_are_directed() {
        let mut graph = RelationshipGraph::default();
        graph.set_relationship("a", "b", ally(70.0)).expect("set");
        assert!(graph.get_relationship("a", "b").is_some());
        assert!(graph.get_relationship("b", "a").is_none());
    }

    #[test]
    fn overwrite_keeps_history_and_logs_update() {
        let mut graph = RelationshipGraph::default();
        let first = graph.set_relationship("a", "b", ally(40.0)).expect("set").established;
        let edge = graph
            .set_relationship("a", "b", RelationshipInput::new(RelationshipType::Rival, 10.0, "betrayal"))
            .expect("overwrite");

        assert_eq!(edge.kind, RelationshipType::Rival);
        assert_eq!(edge.established, first);
        assert_eq!(edge.history.len(), 2);

        let ledger = graph.get_relationship_history("a", Some("b"));
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger[0].action, LedgerAction::Established);
        assert_eq!(ledger[1].action, LedgerAction::Updated);
        assert_eq!(ledger[1].previous_strength, Some(40.0));
    }

    #[test]
    fn update_requires_existing_edge() {
        let mut graph = RelationshipGraph::default();
        let err = graph
            .update_relationship("a", "b", RelationshipPatch::default())
            .expect_err("no edge");
        assert!(matches!(err, ChronicleError::NotFound(_)));

        graph.set_relationship("a", "b", ally(40.0)).expect("set");
        let patch = RelationshipPatch {
            strength: Some(65.0),
            ..RelationshipPatch::default()
        };
        let edge = graph.update_relationship("a", "b", patch).expect("update");
        assert!((edge.strength - 65.0).abs() < f32::EPSILON);
        assert_eq!(edge.kind, RelationshipType::Ally);
        assert_eq!(edge.history.len(), 2);
    }

    #[test]
    fn removal_is_bidirectional_and_tolerant() {
        let mut graph = RelationshipGraph::default();
        graph.set_relationship("a", "b", ally(40.0)).expect("set");
        graph.set_relationship("b", "a", ally(60.0)).expect("set");

        assert_eq!(graph.remove_relationship("a", "b"), 2);
        assert!(graph.get_relationship("a", "b").is_none());
        assert!(graph.get_relationship("b", "a").is_none());
        assert_eq!(graph.remove_relationship("a", "b"), 0);
    }

    #[test]
    fn entity_relationships_include_both_directions() {
        let mut graph = RelationshipGraph::default();
        graph.set_relationship("a", "b", ally(40.0)).expect("set");
        graph.set_relationship("c", "a", ally(60.0)).expect("set");
        graph.set_relationship("b", "c", ally(60.0)).expect("set");

        assert_eq!(graph.get_entity_relationships("a").len(), 2);
        assert_eq!(graph.remove_entity_edges("a"), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn ledger_is_bounded() {
        let limits = HistoryConfig {
            relationship_history_limit: 5,
            edge_history_limit: 3,
            ..HistoryConfig::default()
        };
        let mut graph = RelationshipGraph::new(&limits);
        for i in 0..20_u8 {
            graph.set_relationship("a", "b", ally(f32::from(i))).expect("set");
        }
        assert_eq!(graph.ledger().len(), 5);
        assert!(graph.ledger().windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(graph.get_relationship("a", "b").map(|e| e.history.len()), Some(3));
    }

    #[test]
    fn standing_starts_at_zero_and_logs_changes() {
        let mut graph = RelationshipGraph::default();
        assert!(graph.get_player_standing("tom").abs() < f32::EPSILON);

        assert!((graph.update_player_standing("tom", 15.0, "paid debt") - 15.0).abs() < f32::EPSILON);
        assert!((graph.update_player_standing("tom", -5.0, "rude") - 10.0).abs() < f32::EPSILON);

        let standing = graph.player_standing("tom").expect("record exists");
        assert_eq!(standing.history.len(), 2);
        assert!((standing.history[1].previous_value - 15.0).abs() < f32::EPSILON);
        assert!((standing.history[1].amount + 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn set_standing_records_the_difference() {
        let mut graph = RelationshipGraph::default();
        graph.update_player_standing("guild", 20.0, "job done");
        let standing = graph.set_player_standing("guild", -30.0, "caught stealing");
        assert!((standing.value + 30.0).abs() < f32::EPSILON);
        assert!((standing.history[1].amount + 50.0).abs() < f32::EPSILON);
    }

    #[test]
    fn export_keys_edges_by_endpoints() {
        let mut graph = RelationshipGraph::default();
        graph.set_relationship("a", "b", ally(40.0)).expect("set");
        graph.update_player_standing("a", 5.0, "greeting");

        let export = graph.export();
        assert!(export.edges.contains_key("a->b"));

        let restored = RelationshipGraph::from_export(export.clone(), &HistoryConfig::default());
        assert_eq!(restored.export(), export);
    }
}
