//! Read-only analytics over the relationship graph.
//!
//! Nothing here is cached; every call recomputes from the current edges.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Disposition, RelationshipGraph, RelationshipType};

/// A counterpart and the strength of the edge to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// Id of the other entity.
    pub id: String,
    /// Edge strength.
    pub strength: f32,
}

/// Summary of one entity's position in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkAnalysis {
    /// Entity analysed.
    pub entity: String,
    /// Edges touching the entity, in either direction.
    pub direct_connections: usize,
    /// Edge count per relationship type.
    pub by_type: BTreeMap<RelationshipType, usize>,
    /// Mean strength over all touching edges, 0 when there are none.
    pub average_strength: f32,
    /// Strongest friendly connection.
    pub most_trusted: Option<Connection>,
    /// Strongest hostile connection.
    pub most_feared: Option<Connection>,
    /// `2 × friendly − hostile + neutral`.
    pub influence_score: i64,
}

impl RelationshipGraph {
    /// Strength of the relationship between `a` and `b`.
    ///
    /// Uses the direct edge `a → b`, else `b → a`. Without a direct edge,
    /// averages `s(a,c) × s(c,b) / 100` over every intermediary `c`
    /// connected to both (each hop in either direction). Returns 0 when no
    /// such path exists. Longer paths are not considered.
    #[must_use]
    pub fn calculate_relationship_strength(&self, a: &str, b: &str) -> f32 {
        if let Some(edge) = self.between(a, b) {
            return edge.strength;
        }

        let mut neighbours: BTreeMap<&str, f32> = BTreeMap::new();
        for edge in self.get_entity_relationships(a) {
            let other = edge.counterpart(a);
            if other != b {
                neighbours.entry(other).or_insert(edge.strength);
            }
        }

        let paths: Vec<f32> = neighbours
            .into_iter()
            .filter_map(|(via, first)| self.between(via, b).map(|second| first * second.strength / 100.0))
            .collect();

        if paths.is_empty() {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let count = paths.len() as f32;
            paths.iter().sum::<f32>() / count
        }
    }

    /// Summarise the edges touching `id`.
    #[must_use]
    pub fn analyze_relationship_network(&self, id: &str) -> NetworkAnalysis {
        let edges = self.get_entity_relationships(id);

        let mut by_type = BTreeMap::new();
        let (mut friendly, mut hostile, mut neutral) = (0_i64, 0_i64, 0_i64);
        let mut most_trusted: Option<Connection> = None;
        let mut most_feared: Option<Connection> = None;

        for edge in &edges {
            *by_type.entry(edge.kind).or_insert(0) += 1;
            let slot = match edge.kind.disposition() {
                Disposition::Friendly => {
                    friendly += 1;
                    &mut most_trusted
                }
                Disposition::Hostile => {
                    hostile += 1;
                    &mut most_feared
                }
                Disposition::Neutral => {
                    neutral += 1;
                    continue;
                }
            };
            if slot.as_ref().is_none_or(|best| edge.strength > best.strength) {
                *slot = Some(Connection {
                    id: edge.counterpart(id).to_string(),
                    strength: edge.strength,
                });
            }
        }

        let average_strength = if edges.is_empty() {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let count = edges.len() as f32;
            edges.iter().map(|edge| edge.strength).sum::<f32>() / count
        };

        NetworkAnalysis {
            entity: id.to_string(),
            direct_connections: edges.len(),
            by_type,
            average_strength,
            most_trusted,
            most_feared,
            influence_score: 2 * friendly - hostile + neutral,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relationship::RelationshipInput;

    fn link(graph: &mut RelationshipGraph, a: &str, b: &str, kind: RelationshipType, strength: f32) {
        graph
            .set_relationship(a, b, RelationshipInput::new(kind, strength, "test"))
            .expect("set relationship");
    }

    #[test]
    fn direct_edge_wins_in_either_direction() {
        let mut graph = RelationshipGraph::default();
        link(&mut graph, "b", "a", RelationshipType::Friend, 35.0);
        assert!((graph.calculate_relationship_strength("a", "b") - 35.0).abs() < f32::EPSILON);
    }

    #[test]
    fn two_hop_through_common_neighbour() {
        let mut graph = RelationshipGraph::default();
        link(&mut graph, "a", "c", RelationshipType::Friend, 80.0);
        link(&mut graph, "b", "c", RelationshipType::Friend, 60.0);
        assert!((graph.calculate_relationship_strength("a", "b") - 48.0).abs() < 1e-4);
    }

    #[test]
    fn two_hop_averages_all_paths() {
        let mut graph = RelationshipGraph::default();
        link(&mut graph, "a", "c", RelationshipType::Friend, 80.0);
        link(&mut graph, "c", "b", RelationshipType::Friend, 60.0);
        link(&mut graph, "a", "d", RelationshipType::Trade, 50.0);
        link(&mut graph, "d", "b", RelationshipType::Trade, 40.0);
        // (48 + 20) / 2
        assert!((graph.calculate_relationship_strength("a", "b") - 34.0).abs() < 1e-4);
    }

    #[test]
    fn no_path_is_zero_and_three_hops_are_ignored() {
        let mut graph = RelationshipGraph::default();
        link(&mut graph, "a", "c", RelationshipType::Friend, 80.0);
        link(&mut graph, "c", "d", RelationshipType::Friend, 80.0);
        link(&mut graph, "d", "b", RelationshipType::Friend, 80.0);
        assert!(graph.calculate_relationship_strength("a", "b").abs() < f32::EPSILON);
        assert!(graph.calculate_relationship_strength("x", "y").abs() < f32::EPSILON);
    }

    #[test]
    fn network_analysis_counts_and_influence() {
        let mut graph = RelationshipGraph::default();
        link(&mut graph, "tom", "mira", RelationshipType::Friend, 70.0);
        link(&mut graph, "tom", "guard", RelationshipType::Ally, 90.0);
        link(&mut graph, "bandit", "tom", RelationshipType::Enemy, 85.0);
        link(&mut graph, "tom", "smith", RelationshipType::Trade, 40.0);

        let analysis = graph.analyze_relationship_network("tom");
        assert_eq!(analysis.direct_connections, 4);
        assert_eq!(analysis.by_type.get(&RelationshipType::Friend), Some(&1));
        assert!((analysis.average_strength - 71.25).abs() < 1e-4);
        assert_eq!(analysis.most_trusted.map(|c| c.id), Some("guard".to_string()));
        assert_eq!(analysis.most_feared.map(|c| c.id), Some("bandit".to_string()));
        assert_eq!(analysis.influence_score, 2 * 2 - 1 + 1);
    }

    #[test]
    fn isolated_entity_has_empty_analysis() {
        let graph = RelationshipGraph::default();
        let analysis = graph.analyze_relationship_network("hermit");
        assert_eq!(analysis.direct_connections, 0);
        assert!(analysis.average_strength.abs() < f32::EPSILON);
        assert!(analysis.most_trusted.is_none());
        assert_eq!(analysis.influence_score, 0);
    }
}
