//! # Chronicle Core Library
//!
//! Game-agnostic world model for AI-driven interactive fiction.
//!
//! A [`WorldModel`] bundles three stores:
//!
//! - **Entity Store**: NPCs, factions, locations, items and events, with a
//!   per-kind creation audit log ([`store`])
//! - **Relationship Graph**: directed, typed, strength-weighted edges plus
//!   the player's standing with each entity ([`relationship`])
//! - **World State**: bounded global parameters, the clock, the event list
//!   and the rumor/news feed ([`world`])
//!
//! AI proposals enter through the [`CreationPipeline`], which validates each
//! one against the committed state ([`validation`]) and serializes batches.
//! The whole model round-trips through a JSON [`Snapshot`].
//!
//! ## Guarantees
//!
//! - Ids are unique within a kind; creates never overwrite.
//! - Edge strengths and world parameters are clamped on every write.
//! - Every audit log is bounded and chronological.
//! - A rejected proposal never aborts the rest of its batch.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod entity;
pub mod error;
pub mod model;
pub mod payload;
pub mod pipeline;
pub mod relationship;
pub mod snapshot;
pub mod store;
pub mod types;
pub mod validation;
pub mod world;

pub use config::ChronicleConfig;
pub use entity::{Entity, EntityData, EntityRecord};
pub use error::{ChronicleError, Result};
pub use model::{StateView, WorldModel};
pub use payload::{ConsequencePayload, DetectionPayload};
pub use pipeline::{BatchReport, CreationPipeline, Submission, Ticket};
pub use relationship::{RelationshipGraph, RelationshipType};
pub use snapshot::{PlayerProfile, SessionMeta, Snapshot};
pub use store::EntityStore;
pub use types::*;
pub use world::{WorldParameter, WorldState};
