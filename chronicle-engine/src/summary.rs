//! World summary text handed to the oracle with every call.

use std::fmt::Write as _;

use chronicle_core::entity::{Faction, Location, Npc};
use chronicle_core::{PlayerProfile, WorldModel};

/// How many of each kind the summary lists before eliding.
const LIST_LIMIT: usize = 12;

/// Qualitative band for a player standing value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandingLevel {
    /// 60 and above.
    Revered,
    /// 25 to 60.
    Friendly,
    /// 5 to 25.
    Warm,
    /// Between -5 and 5.
    Neutral,
    /// -25 to -5.
    Cool,
    /// -60 to -25.
    Hostile,
    /// Below -60.
    Hated,
}

impl StandingLevel {
    /// Classify a standing value.
    #[must_use]
    pub fn from_value(value: f32) -> Self {
        if value >= 60.0 {
            Self::Revered
        } else if value >= 25.0 {
            Self::Friendly
        } else if value >= 5.0 {
            Self::Warm
        } else if value > -5.0 {
            Self::Neutral
        } else if value > -25.0 {
            Self::Cool
        } else if value > -60.0 {
            Self::Hostile
        } else {
            Self::Hated
        }
    }

    /// Phrase for prompt context.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Revered => "reveres the player",
            Self::Friendly => "is friendly toward the player",
            Self::Warm => "is warming to the player",
            Self::Neutral => "is indifferent to the player",
            Self::Cool => "is wary of the player",
            Self::Hostile => "is hostile toward the player",
            Self::Hated => "hates the player",
        }
    }
}

/// Render the model as compact plain text for prompts.
#[must_use]
pub fn world_summary(model: &WorldModel, player: &PlayerProfile) -> String {
    let world = &model.world;
    let analysis = world.analyze_world_state();
    let mut out = String::new();

    let _ = writeln!(out, "Time: {}", world.clock());
    let _ = writeln!(
        out,
        "Mood: {} (tension), {} (politics), {} (economy), {} (magic)",
        analysis.tension, analysis.stability, analysis.economy, analysis.magic
    );
    let _ = writeln!(
        out,
        "Player: {} at {}, health {:.0}, {} gold",
        player.name,
        player.location.as_deref().unwrap_or("an unknown place"),
        player.health,
        player.gold
    );

    let locations: Vec<String> = model
        .entities
        .list::<Location>()
        .map(|r| format!("{} ({}, {})", r.id, r.data.name, r.data.location_type))
        .collect();
    push_list(&mut out, "Locations", &locations);

    let npcs: Vec<String> = model
        .entities
        .list::<Npc>()
        .map(|r| {
            let mut line = format!("{} ({}, {}", r.id, r.data.name, r.data.occupation);
            if let Some(location) = &r.data.location {
                let _ = write!(line, ", at {location}");
            }
            let standing = model.relationships.get_player_standing(&r.id);
            if standing.abs() >= 5.0 {
                let _ = write!(line, ", {}", StandingLevel::from_value(standing).description());
            }
            line.push(')');
            line
        })
        .collect();
    push_list(&mut out, "NPCs", &npcs);

    let factions: Vec<String> = model
        .entities
        .list::<Faction>()
        .map(|r| format!("{} ({})", r.id, r.data.name))
        .collect();
    push_list(&mut out, "Factions", &factions);

    let events: Vec<String> = world.events().current.iter().map(|e| e.name.clone()).collect();
    push_list(&mut out, "Active events", &events);

    let rumors: Vec<String> = world.information().rumors.iter().take(3).map(|r| r.text.clone()).collect();
    push_list(&mut out, "Rumors", &rumors);

    for concern in &analysis.concerns {
        let _ = writeln!(out, "Concern: {concern}");
    }
    out
}

fn push_list(out: &mut String, label: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let shown = items.iter().take(LIST_LIMIT).cloned().collect::<Vec<_>>().join("; ");
    if items.len() > LIST_LIMIT {
        let _ = writeln!(out, "{label}: {shown}; and {} more", items.len() - LIST_LIMIT);
    } else {
        let _ = writeln!(out, "{label}: {shown}");
    }
}
