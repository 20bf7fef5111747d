//! Error types for the Chronicle core library.

use thiserror::Error;

use crate::types::EntityKind;

/// Top-level error type for all Chronicle world-model operations.
#[derive(Error, Debug)]
pub enum ChronicleError {
    /// An entity with this id already exists for the given kind.
    #[error("Duplicate entity: {kind} '{id}' already exists")]
    DuplicateEntity {
        /// Kind of the existing entity.
        kind: EntityKind,
        /// The conflicting id.
        id: String,
    },

    /// A string did not name one of the five entity kinds.
    #[error("Unknown entity kind: '{0}'")]
    UnknownEntityKind(String),

    /// An entity or relationship was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A parameter name did not resolve to a known world parameter.
    #[error("Unknown world parameter: '{0}'")]
    UnknownParameter(String),

    /// A value was outside its declared bounds.
    #[error("Value out of range for {name}: {value} (allowed: {min}..={max})")]
    OutOfRange {
        /// What the value was for.
        name: String,
        /// The rejected value.
        value: f32,
        /// Lower bound.
        min: f32,
        /// Upper bound.
        max: f32,
    },

    /// A capacity or consistency rule rejected a proposed creation.
    #[error("Validation rejected: {reason}")]
    ValidationRejected {
        /// Why the proposal was rejected.
        reason: String,
    },

    /// An integrity scan found orphaned references or out-of-bounds values.
    #[error("Integrity violation ({count} issue(s)): {first}")]
    IntegrityViolation {
        /// Number of issues found.
        count: usize,
        /// Description of the first issue.
        first: String,
    },

    /// A relationship was requested from an entity to itself.
    #[error("An entity cannot have a relationship with itself: '{0}'")]
    SelfRelationship(String),

    /// A relationship type string was not recognised.
    #[error("Unknown relationship type: '{0}'")]
    UnknownRelationshipType(String),

    /// A snapshot document was structurally invalid.
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ChronicleError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, ChronicleError>;
