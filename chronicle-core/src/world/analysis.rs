//! Qualitative reading of the world parameters.

use serde::{Deserialize, Serialize};

use super::WorldState;
use super::temporal::Season;

/// Advisory description of the current world state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldAnalysis {
    /// Label for tension.
    pub tension: String,
    /// Label for political stability.
    pub stability: String,
    /// Label for the economy.
    pub economy: String,
    /// Label for magical activity.
    pub magic: String,
    /// Current season.
    pub season: Season,
    /// Events under way.
    pub active_events: usize,
    /// Things that could go wrong.
    pub concerns: Vec<String>,
    /// Things worth pursuing.
    pub opportunities: Vec<String>,
}

fn tension_label(value: f32) -> &'static str {
    match value {
        v if v < 20.0 => "peaceful",
        v if v < 40.0 => "calm",
        v if v < 60.0 => "tense",
        v if v < 80.0 => "volatile",
        _ => "on the brink of war",
    }
}

fn stability_label(value: f32) -> &'static str {
    match value {
        v if v < 30.0 => "unstable",
        v if v < 60.0 => "uncertain",
        v if v < 80.0 => "stable",
        _ => "entrenched",
    }
}

fn economy_label(value: f32) -> &'static str {
    match value {
        v if v < 30.0 => "depressed",
        v if v < 50.0 => "struggling",
        v if v < 70.0 => "steady",
        _ => "prosperous",
    }
}

fn magic_label(value: f32) -> &'static str {
    match value {
        v if v < 20.0 => "dormant",
        v if v < 50.0 => "stirring",
        v if v < 80.0 => "active",
        _ => "surging",
    }
}

impl WorldState {
    /// Classify the parameters into labels, concerns and opportunities.
    /// Reads only.
    #[must_use]
    pub fn analyze_world_state(&self) -> WorldAnalysis {
        let p = self.parameters();
        let mut concerns = Vec::new();
        let mut opportunities = Vec::new();

        if p.tension >= 70.0 {
            concerns.push("Open conflict could erupt at any moment".to_string());
        }
        if p.political_stability < 30.0 {
            concerns.push("Authorities are losing their grip on order".to_string());
        }
        if p.economic_state < 30.0 {
            concerns.push("Poverty is driving people to desperate measures".to_string());
        }
        if p.magical_activity >= 80.0 {
            concerns.push("Wild magic threatens the unwary".to_string());
        }
        if self.events().active_count() >= self.limits.max_active_events {
            concerns.push("Too much is happening at once for anyone to keep track".to_string());
        }

        if p.economic_state >= 70.0 {
            opportunities.push("Trade is booming and merchants are hiring".to_string());
        }
        if p.political_stability >= 70.0 && p.tension < 30.0 {
            opportunities.push("Peace favours diplomacy and new alliances".to_string());
        }
        if p.tension >= 60.0 {
            opportunities.push("Mercenary work is plentiful".to_string());
        }
        if p.magical_activity >= 60.0 {
            opportunities.push("Arcane discoveries are within reach".to_string());
        }

        WorldAnalysis {
            tension: tension_label(p.tension).to_string(),
            stability: stability_label(p.political_stability).to_string(),
            economy: economy_label(p.economic_state).to_string(),
            magic: magic_label(p.magical_activity).to_string(),
            season: self.clock().season,
            active_events: self.events().active_count(),
            concerns,
            opportunities,
        }
    }
}
