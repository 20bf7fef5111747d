//! Prompt templates for the three oracle calls.
//!
//! Built-in templates are compiled in. A directory of TOML files can
//! override any of them without a rebuild.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use tracing::debug;

use crate::error::{LlmError, Result};

/// Narrator persona for story text.
pub const NARRATION_SYSTEM: &str = r"You are the narrator of an interactive fantasy story.
Write in second person, present tense. Stay consistent with the world state you are given.

RULES:
- Never contradict established facts about characters, places or factions.
- Keep each passage to two or three short paragraphs.
- End with the situation open so the player can act.
- Do not offer numbered choices and do not mention game mechanics.";

/// Story text request.
pub const NARRATION_USER: &str = r"Current world:
{world_summary}

Story so far:
{narrative_context}

The player: {player_input}

Continue the story.";

/// Entity and relationship detection persona.
pub const DETECTION_SYSTEM: &str = r"You extract structured world facts from interactive fiction.
Only report entities that are new to the world summary. Use snake_case ids.
Your response must be a single JSON object and nothing else.";

/// Detection request, including the expected shape.
pub const DETECTION_USER: &str = r#"Current world:
{world_summary}

Recent story:
{narrative_context}

Player input: {player_input}

List new NPCs, factions, locations, items and events this passage introduces, the
relationships between them, and any shift in the world's mood. Return JSON:
{{"entities": {{"npcs": [{{"id": "...", "name": "...", "occupation": "...", "location": "<location id or null>"}}],
  "factions": [{{"id": "...", "name": "...", "territory": ["<location id>"]}}],
  "locations": [{{"id": "...", "name": "...", "locationType": "village|town|city|tavern|...", "population": 0}}],
  "items": [{{"id": "...", "name": "...", "value": 0, "weight": 0, "rarity": "common"}}],
  "events": [{{"id": "...", "name": "...", "scope": "local|regional|global", "duration": 1}}]}},
 "relationships": [{{"entity1": "<id>", "entity2": "<id>", "type": "ally|friend|enemy|rival|member|leader|...", "strength": 0-100, "reason": "..."}}],
 "worldUpdates": {{"tension": <delta>, "politicalStability": <delta>, "economicState": <delta>, "magicalActivity": <delta>, "rumors": ["..."], "news": ["..."]}}}}"#;

/// Consequence analysis persona.
pub const CONSEQUENCE_SYSTEM: &str = r"You judge the consequences of a player's choice in an interactive fantasy story.
Be proportionate: most choices shift things slightly, few change the world.
Your response must be a single JSON object and nothing else.";

/// Consequence request.
pub const CONSEQUENCE_USER: &str = r#"Current world:
{world_summary}

Situation: {player_input}
The player chose: {choice_text}

Report what this choice changes. Return JSON with the same shape as entity detection
("entities", "relationships", "worldUpdates") plus:
"playerEffects": [{{"entity": "<id>", "change": <-100..100>, "reason": "..."}}]"#;

/// Simple template interpolation for prompts.
///
/// Replaces `{key}` with the corresponding value and `{{`/`}}` with literal
/// braces. Unknown keys are left as they are.
#[must_use]
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result.replace("{{", "{").replace("}}", "}")
}

// ---------------------------------------------------------------------------
// PromptSet: built-in templates with TOML overrides
// ---------------------------------------------------------------------------

/// Identifies a prompt by the oracle call it serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    /// Story text.
    Narration,
    /// Entity/relationship detection.
    Detection,
    /// Consequences of a choice.
    Consequence,
}

impl PromptId {
    /// All prompt ids.
    pub const ALL: [Self; 3] = [Self::Narration, Self::Detection, Self::Consequence];

    /// TOML filename for this prompt.
    #[must_use]
    pub fn filename(self) -> &'static str {
        match self {
            Self::Narration => "narration.toml",
            Self::Detection => "detection.toml",
            Self::Consequence => "consequence.toml",
        }
    }
}

impl fmt::Display for PromptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Narration => "narration",
            Self::Detection => "detection",
            Self::Consequence => "consequence",
        };
        f.write_str(name)
    }
}

impl FromStr for PromptId {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "narration" => Ok(Self::Narration),
            "detection" => Ok(Self::Detection),
            "consequence" => Ok(Self::Consequence),
            _ => Err(LlmError::Prompt(format!("unknown prompt id: '{s}'"))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PromptFile {
    prompt: PromptTemplate,
}

/// A loaded, ready-to-render prompt template.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptTemplate {
    /// Version label.
    pub version: String,
    /// Maximum output tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// System prompt with `{key}` placeholders.
    pub system: String,
    /// User prompt with `{key}` placeholders.
    pub user: String,
}

impl PromptTemplate {
    fn builtin(max_tokens: u32, temperature: f32, system: &str, user: &str) -> Self {
        Self {
            version: "builtin".into(),
            max_tokens,
            temperature,
            system: system.into(),
            user: user.into(),
        }
    }

    /// Render `(system, user)` with `vars`.
    #[must_use]
    pub fn render(&self, vars: &[(&str, &str)]) -> (String, String) {
        (render_template(&self.system, vars), render_template(&self.user, vars))
    }
}

/// The templates the oracle renders from.
#[derive(Debug, Clone)]
pub struct PromptSet {
    templates: HashMap<PromptId, PromptTemplate>,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PromptSet {
    /// The compiled-in templates.
    #[must_use]
    pub fn builtin() -> Self {
        let templates = HashMap::from([
            (
                PromptId::Narration,
                PromptTemplate::builtin(400, 0.8, NARRATION_SYSTEM, NARRATION_USER),
            ),
            (
                PromptId::Detection,
                PromptTemplate::builtin(800, 0.2, DETECTION_SYSTEM, DETECTION_USER),
            ),
            (
                PromptId::Consequence,
                PromptTemplate::builtin(600, 0.3, CONSEQUENCE_SYSTEM, CONSEQUENCE_USER),
            ),
        ]);
        Self { templates }
    }

    /// Built-in templates overridden by any `<id>.toml` files in `dir`.
    ///
    /// # Errors
    ///
    /// [`LlmError::Prompt`] if `dir` does not exist or a file is present but
    /// unreadable or malformed.
    pub fn from_directory(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(LlmError::Prompt(format!("prompt directory not found: {}", dir.display())));
        }

        let mut set = Self::builtin();
        for id in PromptId::ALL {
            let path: PathBuf = dir.join(id.filename());
            if !path.exists() {
                continue;
            }
            let content = std::fs::read_to_string(&path)
                .map_err(|e| LlmError::Prompt(format!("failed to read {}: {e}", path.display())))?;
            let parsed: PromptFile = toml::from_str(&content)
                .map_err(|e| LlmError::Prompt(format!("failed to parse {}: {e}", path.display())))?;
            debug!(prompt = %id, version = %parsed.prompt.version, "prompt override loaded");
            set.templates.insert(id, parsed.prompt);
        }
        Ok(set)
    }

    /// Get a template by id.
    #[must_use]
    pub fn get(&self, id: PromptId) -> Option<&PromptTemplate> {
        self.templates.get(&id)
    }

    /// Render `(system, user)` for `id`.
    ///
    /// # Errors
    ///
    /// [`LlmError::Prompt`] if the template is not loaded.
    pub fn render(&self, id: PromptId, vars: &[(&str, &str)]) -> Result<(String, String)> {
        self.get(id)
            .map(|tpl| tpl.render(vars))
            .ok_or_else(|| LlmError::Prompt(format!("prompt template '{id}' not loaded")))
    }
}
