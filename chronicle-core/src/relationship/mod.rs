//! Relationship Graph: directed, typed, strength-weighted edges between
//! entities, plus the player's standing with each entity.
//!
//! Edges are not symmetric: an edge A→B says nothing about B→A. Strength is
//! clamped to [0, 100] on every write, and every write is recorded twice:
//! in the edge's own bounded history and in a global bounded ledger.

pub mod analysis;
pub mod graph;

pub use analysis::{Connection, NetworkAnalysis};
pub use graph::{RelationshipExport, RelationshipGraph};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entity::normalize_label;
use crate::error::ChronicleError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Relationship types
// ---------------------------------------------------------------------------

/// Recognised kinds of entity-to-entity relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    /// Formal or practical alliance.
    Ally,
    /// Personal friendship.
    Friend,
    /// Blood or marriage.
    Family,
    /// Romantic attachment.
    Romantic,
    /// Teaches the target.
    Mentor,
    /// Learns from the target.
    Student,
    /// Employs the target.
    Employer,
    /// Works for the target.
    Employee,
    /// Belongs to the target (usually a faction).
    Member,
    /// Leads the target (usually a faction).
    Leader,
    /// Trades with the target.
    Trade,
    /// Known, without strong feeling.
    Neutral,
    /// Competes with the target.
    Rival,
    /// Open hostility.
    Enemy,
}

/// Coarse emotional direction of a relationship type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Counts as an ally in network analysis.
    Friendly,
    /// Counts as an enemy in network analysis.
    Hostile,
    /// Everything else.
    Neutral,
}

impl RelationshipType {
    /// Every recognised type.
    pub const ALL: [Self; 14] = [
        Self::Ally,
        Self::Friend,
        Self::Family,
        Self::Romantic,
        Self::Mentor,
        Self::Student,
        Self::Employer,
        Self::Employee,
        Self::Member,
        Self::Leader,
        Self::Trade,
        Self::Neutral,
        Self::Rival,
        Self::Enemy,
    ];

    /// Coarse disposition used by network analytics.
    #[must_use]
    pub fn disposition(self) -> Disposition {
        match self {
            Self::Ally | Self::Friend | Self::Family | Self::Romantic | Self::Mentor | Self::Student => {
                Disposition::Friendly
            }
            Self::Rival | Self::Enemy => Disposition::Hostile,
            Self::Employer | Self::Employee | Self::Member | Self::Leader | Self::Trade | Self::Neutral => {
                Disposition::Neutral
            }
        }
    }

    /// Canonical lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ally => "ally",
            Self::Friend => "friend",
            Self::Family => "family",
            Self::Romantic => "romantic",
            Self::Mentor => "mentor",
            Self::Student => "student",
            Self::Employer => "employer",
            Self::Employee => "employee",
            Self::Member => "member",
            Self::Leader => "leader",
            Self::Trade => "trade",
            Self::Neutral => "neutral",
            Self::Rival => "rival",
            Self::Enemy => "enemy",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipType {
    type Err = ChronicleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = normalize_label(s);
        let parsed = match label.as_str() {
            "ally" | "allied" | "alliance" | "allies" => Self::Ally,
            "friend" | "friends" | "friendship" | "friendly" => Self::Friend,
            "family" | "sibling" | "parent" | "child" | "kin" => Self::Family,
            "romantic" | "romance" | "lover" | "spouse" => Self::Romantic,
            "mentor" | "teacher" => Self::Mentor,
            "student" | "apprentice" => Self::Student,
            "employer" | "master" => Self::Employer,
            "employee" | "servant" | "works_for" => Self::Employee,
            "member" | "member_of" => Self::Member,
            "leader" | "leads" => Self::Leader,
            "trade" | "business" | "trading_partner" => Self::Trade,
            "neutral" | "acquaintance" => Self::Neutral,
            "rival" | "rivalry" | "competitor" => Self::Rival,
            "enemy" | "enemies" | "hostile" | "nemesis" => Self::Enemy,
            _ => return Err(ChronicleError::UnknownRelationshipType(s.to_string())),
        };
        Ok(parsed)
    }
}

// ---------------------------------------------------------------------------
// Edges and their history
// ---------------------------------------------------------------------------

/// One entry in an edge's own history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeChange {
    /// When the change happened.
    pub timestamp: Timestamp,
    /// Type after the change.
    #[serde(rename = "type")]
    pub kind: RelationshipType,
    /// Strength after the change.
    pub strength: f32,
    /// Why it changed.
    pub reason: String,
}

/// A directed relationship from `source` to `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    /// Entity the relationship points from.
    pub source: String,
    /// Entity the relationship points to.
    pub target: String,
    /// Relationship type.
    #[serde(rename = "type")]
    pub kind: RelationshipType,
    /// Strength in [0, 100].
    pub strength: f32,
    /// Most recent reason.
    pub reason: String,
    /// When the edge first appeared.
    pub established: Timestamp,
    /// When the edge last changed.
    pub last_modified: Timestamp,
    /// Bounded, chronological change history.
    #[serde(default)]
    pub history: Vec<EdgeChange>,
}

impl Relationship {
    /// The endpoint that is not `id`.
    #[must_use]
    pub fn counterpart(&self, id: &str) -> &str {
        if self.source == id { &self.target } else { &self.source }
    }
}

/// Arguments for [`RelationshipGraph::set_relationship`].
#[derive(Debug, Clone)]
pub struct RelationshipInput {
    /// Relationship type.
    pub kind: RelationshipType,
    /// Requested strength; clamped to [0, 100].
    pub strength: f32,
    /// Why the relationship exists.
    pub reason: String,
    /// Explicit establishment time for new edges; defaults to now.
    pub established: Option<Timestamp>,
}

impl RelationshipInput {
    /// Build an input established now.
    #[must_use]
    pub fn new(kind: RelationshipType, strength: f32, reason: impl Into<String>) -> Self {
        Self {
            kind,
            strength,
            reason: reason.into(),
            established: None,
        }
    }
}

/// Partial update for an existing edge.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationshipPatch {
    /// New type.
    #[serde(rename = "type")]
    pub kind: Option<RelationshipType>,
    /// New strength; clamped to [0, 100].
    pub strength: Option<f32>,
    /// New reason.
    pub reason: Option<String>,
}

/// What a ledger entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerAction {
    /// A new edge was created.
    Established,
    /// An existing edge changed.
    Updated,
    /// An edge was removed.
    Removed,
}

/// One entry in the global relationship ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// What happened.
    pub action: LedgerAction,
    /// Edge source.
    pub source: String,
    /// Edge target.
    pub target: String,
    /// Type after the change.
    #[serde(rename = "type")]
    pub kind: RelationshipType,
    /// Strength after the change.
    pub strength: f32,
    /// Strength before the change, for updates and removals.
    pub previous_strength: Option<f32>,
    /// Why it changed.
    pub reason: String,
    /// When it changed.
    pub timestamp: Timestamp,
}

impl LedgerEntry {
    /// Whether this entry involves `id` at either end.
    #[must_use]
    pub fn involves(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }
}

// ---------------------------------------------------------------------------
// Player standing
// ---------------------------------------------------------------------------

/// One adjustment to the player's standing with an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingChange {
    /// Signed adjustment.
    pub amount: f32,
    /// Why it changed.
    pub reason: String,
    /// When it changed.
    pub timestamp: Timestamp,
    /// Value before the adjustment.
    pub previous_value: f32,
}

/// The player's standing with one entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStanding {
    /// Signed standing, conventionally in [-100, 100].
    pub value: f32,
    /// Bounded, chronological adjustment history.
    #[serde(default)]
    pub history: Vec<StandingChange>,
    /// When the standing last changed.
    pub last_change: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases_and_rejects_unknown() {
        assert_eq!("Allied".parse::<RelationshipType>().ok(), Some(RelationshipType::Ally));
        assert_eq!("works for".parse::<RelationshipType>().ok(), Some(RelationshipType::Employee));
        assert!(matches!(
            "frenemy".parse::<RelationshipType>(),
            Err(ChronicleError::UnknownRelationshipType(_))
        ));
    }

    #[test]
    fn canonical_names_round_trip() {
        for kind in RelationshipType::ALL {
            assert_eq!(kind.as_str().parse::<RelationshipType>().ok(), Some(kind));
        }
    }

    #[test]
    fn dispositions() {
        assert_eq!(RelationshipType::Friend.disposition(), Disposition::Friendly);
        assert_eq!(RelationshipType::Rival.disposition(), Disposition::Hostile);
        assert_eq!(RelationshipType::Trade.disposition(), Disposition::Neutral);
    }
}
