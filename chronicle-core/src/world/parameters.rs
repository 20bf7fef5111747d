//! Bounded global parameters and their change records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChronicleError;
use crate::types::Timestamp;

/// Lower bound shared by every parameter.
pub const PARAMETER_MIN: f32 = 0.0;
/// Upper bound shared by every parameter.
pub const PARAMETER_MAX: f32 = 100.0;

/// A named global world condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorldParameter {
    /// Likelihood of open conflict.
    Tension,
    /// Strength of governing institutions.
    PoliticalStability,
    /// General prosperity.
    EconomicState,
    /// Ambient magical energy.
    MagicalActivity,
}

impl WorldParameter {
    /// Every parameter.
    pub const ALL: [Self; 4] = [
        Self::Tension,
        Self::PoliticalStability,
        Self::EconomicState,
        Self::MagicalActivity,
    ];

    /// Value a fresh world starts with.
    #[must_use]
    pub fn default_value(self) -> f32 {
        match self {
            Self::Tension => 30.0,
            Self::PoliticalStability => 70.0,
            Self::EconomicState => 60.0,
            Self::MagicalActivity => 40.0,
        }
    }

    /// Inclusive `(min, max)` bounds.
    #[must_use]
    pub fn bounds(self) -> (f32, f32) {
        (PARAMETER_MIN, PARAMETER_MAX)
    }

    /// Clamp `value` into this parameter's bounds. NaN maps to the minimum.
    #[must_use]
    pub fn clamp(self, value: f32) -> f32 {
        let (min, max) = self.bounds();
        if value.is_nan() { min } else { value.clamp(min, max) }
    }

    /// Canonical camelCase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tension => "tension",
            Self::PoliticalStability => "politicalStability",
            Self::EconomicState => "economicState",
            Self::MagicalActivity => "magicalActivity",
        }
    }
}

impl fmt::Display for WorldParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorldParameter {
    type Err = ChronicleError;

    /// Accepts any casing and separators (`political_stability`,
    /// `Political Stability`, `politicalStability`) plus short aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "tension" | "tensions" | "conflict" => Ok(Self::Tension),
            "politicalstability" | "stability" | "political" => Ok(Self::PoliticalStability),
            "economicstate" | "economy" | "economic" | "wealth" => Ok(Self::EconomicState),
            "magicalactivity" | "magic" | "magical" | "arcane" => Ok(Self::MagicalActivity),
            _ => Err(ChronicleError::UnknownParameter(s.to_string())),
        }
    }
}

/// Current values of every parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameters {
    /// See [`WorldParameter::Tension`].
    pub tension: f32,
    /// See [`WorldParameter::PoliticalStability`].
    pub political_stability: f32,
    /// See [`WorldParameter::EconomicState`].
    pub economic_state: f32,
    /// See [`WorldParameter::MagicalActivity`].
    pub magical_activity: f32,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            tension: WorldParameter::Tension.default_value(),
            political_stability: WorldParameter::PoliticalStability.default_value(),
            economic_state: WorldParameter::EconomicState.default_value(),
            magical_activity: WorldParameter::MagicalActivity.default_value(),
        }
    }
}

impl Parameters {
    /// Current value of `parameter`.
    #[must_use]
    pub fn get(&self, parameter: WorldParameter) -> f32 {
        match parameter {
            WorldParameter::Tension => self.tension,
            WorldParameter::PoliticalStability => self.political_stability,
            WorldParameter::EconomicState => self.economic_state,
            WorldParameter::MagicalActivity => self.magical_activity,
        }
    }

    pub(crate) fn get_mut(&mut self, parameter: WorldParameter) -> &mut f32 {
        match parameter {
            WorldParameter::Tension => &mut self.tension,
            WorldParameter::PoliticalStability => &mut self.political_stability,
            WorldParameter::EconomicState => &mut self.economic_state,
            WorldParameter::MagicalActivity => &mut self.magical_activity,
        }
    }

    /// Parameters whose stored value lies outside their bounds.
    pub fn out_of_bounds(&self) -> impl Iterator<Item = (WorldParameter, f32)> + '_ {
        WorldParameter::ALL.into_iter().filter_map(|parameter| {
            let value = self.get(parameter);
            let (min, max) = parameter.bounds();
            (value.is_nan() || value < min || value > max).then_some((parameter, value))
        })
    }
}

/// One committed parameter write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterChange {
    /// Parameter written.
    pub parameter: WorldParameter,
    /// Value before the write.
    pub old_value: f32,
    /// Value after the write, clamped.
    pub new_value: f32,
    /// Delta as requested, before clamping.
    pub change: f32,
    /// Why it changed.
    pub reason: String,
    /// When it changed.
    pub timestamp: Timestamp,
}
