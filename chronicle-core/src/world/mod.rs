//! World Parameter Store: bounded global parameters with an audit log, the
//! world clock, the event list and the rumor/news feed.
//!
//! Every parameter write clamps to the parameter's bounds and records
//! exactly one [`ParameterChange`], even when clamping makes it a no-op.

pub mod analysis;
pub mod events;
pub mod information;
pub mod parameters;
pub mod temporal;

pub use analysis::WorldAnalysis;
pub use events::{EventPartition, WorldEvent, WorldEvents};
pub use information::{FeedItem, Information};
pub use parameters::{ParameterChange, Parameters, WorldParameter};
pub use temporal::{Season, TimeOfDay, Weather, WorldClock};

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ChronicleConfig;
use crate::error::{ChronicleError, Result};
use crate::types::push_bounded;

/// Serialised form of the world state, the `worldState` section of a
/// snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldStateExport {
    /// Parameter values.
    #[serde(default)]
    pub parameters: Parameters,
    /// Calendar position.
    #[serde(default)]
    pub temporal: WorldClock,
    /// Tracked events.
    #[serde(default)]
    pub events: WorldEvents,
    /// Rumors and news.
    #[serde(default)]
    pub information: Information,
    /// Parameter change log, oldest first.
    #[serde(default)]
    pub history: Vec<ParameterChange>,
}

/// Outcome of [`WorldState::advance_time`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeAdvance {
    /// Days that rolled over.
    pub days_elapsed: u32,
    /// Scheduled events that became current.
    pub activated: Vec<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct WorldLimits {
    pub(crate) parameter_history_limit: usize,
    pub(crate) max_rumors: usize,
    pub(crate) max_news: usize,
    pub(crate) max_active_events: usize,
}

impl WorldLimits {
    fn from_config(config: &ChronicleConfig) -> Self {
        Self {
            parameter_history_limit: config.history.parameter_history_limit,
            max_rumors: config.limits.max_rumors,
            max_news: config.limits.max_news,
            max_active_events: config.limits.max_active_events,
        }
    }
}

/// Global world state.
#[derive(Debug, Clone)]
pub struct WorldState {
    parameters: Parameters,
    clock: WorldClock,
    events: WorldEvents,
    information: Information,
    history: Vec<ParameterChange>,
    pub(crate) limits: WorldLimits,
}

impl Default for WorldState {
    fn default() -> Self {
        Self::new(&ChronicleConfig::default())
    }
}

impl WorldState {
    /// A fresh world with default parameters, starting on day 1.
    #[must_use]
    pub fn new(config: &ChronicleConfig) -> Self {
        Self {
            parameters: Parameters::default(),
            clock: WorldClock::default(),
            events: WorldEvents::default(),
            information: Information::default(),
            history: Vec::new(),
            limits: WorldLimits::from_config(config),
        }
    }

    // ------------------------------------------------------------------
    // Parameters
    // ------------------------------------------------------------------

    /// Current value of `parameter`.
    #[must_use]
    pub fn parameter(&self, parameter: WorldParameter) -> f32 {
        self.parameters.get(parameter)
    }

    /// Every parameter value.
    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Apply `delta` to the parameter named `name`, clamping the result.
    ///
    /// # Errors
    ///
    /// Returns [`ChronicleError::UnknownParameter`] if `name` does not
    /// resolve to a parameter.
    pub fn update_global_parameter(&mut self, name: &str, delta: f32, reason: &str) -> Result<ParameterChange> {
        let parameter: WorldParameter = name.parse()?;
        Ok(self.adjust(parameter, delta, reason))
    }

    /// Apply `delta` to `parameter`, clamping the result.
    pub fn adjust(&mut self, parameter: WorldParameter, delta: f32, reason: &str) -> ParameterChange {
        let old_value = self.parameters.get(parameter);
        let new_value = parameter.clamp(old_value + delta);
        self.commit(parameter, old_value, new_value, delta, reason)
    }

    /// Set the parameter named `name` to an absolute value.
    ///
    /// # Errors
    ///
    /// Returns [`ChronicleError::UnknownParameter`] for an unknown name and
    /// [`ChronicleError::OutOfRange`] if `value` lies outside the bounds.
    pub fn set_global_parameter(&mut self, name: &str, value: f32, reason: &str) -> Result<ParameterChange> {
        let parameter: WorldParameter = name.parse()?;
        let (min, max) = parameter.bounds();
        if value.is_nan() || value < min || value > max {
            return Err(ChronicleError::OutOfRange {
                name: parameter.to_string(),
                value,
                min,
                max,
            });
        }
        let old_value = self.parameters.get(parameter);
        Ok(self.commit(parameter, old_value, value, value - old_value, reason))
    }

    /// The parameter change log, oldest first.
    #[must_use]
    pub fn parameter_history(&self) -> &[ParameterChange] {
        &self.history
    }

    fn commit(&mut self, parameter: WorldParameter, old_value: f32, new_value: f32, change: f32, reason: &str) -> ParameterChange {
        *self.parameters.get_mut(parameter) = new_value;
        let record = ParameterChange {
            parameter,
            old_value,
            new_value,
            change,
            reason: reason.to_string(),
            timestamp: Utc::now(),
        };
        push_bounded(&mut self.history, record.clone(), self.limits.parameter_history_limit);
        debug!(%parameter, old_value, new_value, change, reason, "world parameter changed");
        record
    }

    // ------------------------------------------------------------------
    // Clock
    // ------------------------------------------------------------------

    /// Calendar position.
    #[must_use]
    pub fn clock(&self) -> &WorldClock {
        &self.clock
    }

    /// Absolute day number.
    #[must_use]
    pub fn today(&self) -> u32 {
        self.clock.absolute_day
    }

    /// Advance the clock `steps` time-of-day slots, activating scheduled
    /// events whose start day has arrived.
    pub fn advance_time(&mut self, steps: u32) -> TimeAdvance {
        self.advance_time_with(steps, &mut rand::thread_rng())
    }

    /// As [`advance_time`](Self::advance_time), with a caller-supplied RNG
    /// for the weather roll.
    pub fn advance_time_with<R: Rng + ?Sized>(&mut self, steps: u32, rng: &mut R) -> TimeAdvance {
        let days_elapsed = self.clock.advance(steps, rng);
        let activated = self.events.activate_due(self.clock.absolute_day);
        if days_elapsed > 0 || !activated.is_empty() {
            info!(days_elapsed, activated = activated.len(), clock = %self.clock, "time advanced");
        }
        TimeAdvance { days_elapsed, activated }
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Tracked events.
    #[must_use]
    pub fn events(&self) -> &WorldEvents {
        &self.events
    }

    /// Track an event; it is scheduled if it starts after today.
    ///
    /// # Errors
    ///
    /// Returns [`ChronicleError::DuplicateEntity`] if the id is already
    /// tracked.
    pub fn add_event(&mut self, event: WorldEvent) -> Result<EventPartition> {
        let id = event.id.clone();
        let partition = self.events.add(event, self.clock.absolute_day)?;
        debug!(id = %id, ?partition, "world event added");
        Ok(partition)
    }

    /// Finish a current or scheduled event.
    ///
    /// # Errors
    ///
    /// Returns [`ChronicleError::NotFound`] if the event is not current or
    /// scheduled.
    pub fn complete_event(&mut self, id: &str, success: bool) -> Result<&WorldEvent> {
        let event = self.events.complete(id, success)?;
        debug!(id, success, "world event finished");
        Ok(event)
    }

    // ------------------------------------------------------------------
    // Information feed
    // ------------------------------------------------------------------

    /// Prepend a rumor; the oldest beyond the cap are dropped.
    pub fn add_rumor(&mut self, text: impl Into<String>) {
        let day = self.clock.absolute_day;
        self.information.add_rumor(text, day, self.limits.max_rumors);
    }

    /// Prepend a news item; the oldest beyond the cap are dropped.
    pub fn add_news(&mut self, text: impl Into<String>) {
        let day = self.clock.absolute_day;
        self.information.add_news(text, day, self.limits.max_news);
    }

    /// Rumors and news.
    #[must_use]
    pub fn information(&self) -> &Information {
        &self.information
    }

    // ------------------------------------------------------------------
    // Snapshot support
    // ------------------------------------------------------------------

    /// Export everything.
    #[must_use]
    pub fn export(&self) -> WorldStateExport {
        WorldStateExport {
            parameters: self.parameters,
            temporal: self.clock,
            events: self.events.clone(),
            information: self.information.clone(),
            history: self.history.clone(),
        }
    }

    /// Rebuild from an export. Values are restored as stored; out-of-bound
    /// parameters are reported by the integrity scan, not corrected.
    #[must_use]
    pub fn from_export(export: WorldStateExport, config: &ChronicleConfig) -> Self {
        Self {
            parameters: export.parameters,
            clock: export.temporal,
            events: export.events,
            information: export.information,
            history: export.history,
            limits: WorldLimits::from_config(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Event;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn world() -> WorldState {
        WorldState::new(&ChronicleConfig::default())
    }

    #[test]
    fn tension_walkthrough() {
        let mut world = world();
        let change = world.update_global_parameter("tension", -50.0, "peace treaty").expect("update");
        assert!((change.old_value - 30.0).abs() < f32::EPSILON);
        assert!(change.new_value.abs() < f32::EPSILON);
        assert!((change.change + 50.0).abs() < f32::EPSILON);

        let change = world.update_global_parameter("Tension", 200.0, "assassination").expect("update");
        assert!((change.new_value - 100.0).abs() < f32::EPSILON);
        assert_eq!(world.parameter_history().len(), 2);
    }

    #[test]
    fn clamped_no_op_is_still_recorded() {
        let mut world = world();
        world.update_global_parameter("magic", 1000.0, "surge").expect("update");
        world.update_global_parameter("magic", 1000.0, "surge").expect("update");
        assert!((world.parameter(WorldParameter::MagicalActivity) - 100.0).abs() < f32::EPSILON);
        assert_eq!(world.parameter_history().len(), 2);
        assert!((world.parameter_history()[1].old_value - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn unknown_parameter_changes_nothing() {
        let mut world = world();
        let err = world.update_global_parameter("morale", 5.0, "?").expect_err("unknown");
        assert!(matches!(err, ChronicleError::UnknownParameter(_)));
        assert!(world.parameter_history().is_empty());
    }

    #[test]
    fn strict_set_rejects_out_of_range() {
        let mut world = world();
        let err = world.set_global_parameter("economy", 150.0, "windfall").expect_err("out of range");
        assert!(matches!(err, ChronicleError::OutOfRange { .. }));

        let change = world.set_global_parameter("economy", 80.0, "windfall").expect("in range");
        assert!((change.change - 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn parameter_history_is_bounded() {
        let mut config = ChronicleConfig::default();
        config.history.parameter_history_limit = 3;
        let mut world = WorldState::new(&config);
        for _ in 0..10 {
            world.adjust(WorldParameter::Tension, 1.0, "drift");
        }
        assert_eq!(world.parameter_history().len(), 3);
        assert!((world.parameter_history()[2].new_value - 40.0).abs() < f32::EPSILON);
    }

    #[test]
    fn advancing_time_activates_scheduled_events() {
        let mut world = world();
        let mut event = Event::new("Eclipse");
        event.start_day = Some(2);
        let partition = world
            .add_event(WorldEvent::from_entity("eclipse", &event, world.today()))
            .expect("add");
        assert_eq!(partition, EventPartition::Scheduled);

        let mut rng = StdRng::seed_from_u64(11);
        let advance = world.advance_time_with(6, &mut rng);
        assert_eq!(advance.days_elapsed, 1);
        assert_eq!(advance.activated, vec!["eclipse".to_string()]);
        assert_eq!(world.events().active_count(), 1);
    }

    #[test]
    fn feed_uses_configured_caps() {
        let mut world = world();
        for i in 0..30 {
            world.add_rumor(format!("rumor {i}"));
            world.add_news(format!("news {i}"));
        }
        assert_eq!(world.information().rumors.len(), 15);
        assert_eq!(world.information().news.len(), 20);
    }

    #[test]
    fn export_round_trips() {
        let mut world = world();
        world.adjust(WorldParameter::EconomicState, -12.5, "drought");
        world.add_rumor("The old mill is haunted");
        let export = world.export();
        let restored = WorldState::from_export(export.clone(), &ChronicleConfig::default());
        assert_eq!(restored.export(), export);
    }
}
