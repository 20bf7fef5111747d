//! Turn orchestration.
//!
//! A turn asks the oracle for story text and a detection payload, feeds the
//! payload through the creation pipeline and advances the clock. A choice
//! asks for consequences instead. Oracle failures never abort a turn: the
//! player gets the configured fallback narrative and the world is left as
//! it was.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chronicle_core::entity::EventStatus;
use chronicle_core::pipeline::{BatchReport, CreationPipeline, Submission};
use chronicle_core::validation::{validate_integrity, IntegrityReport};
use chronicle_core::{DetectionPayload, PlayerProfile, SessionMeta, Snapshot, WorldModel};
use chronicle_llm::{LlmClient, LlmOracle, PromptSet, WorldOracle};
use parking_lot::RwLock;
use tracing::{info, instrument, warn};

use crate::config::{EngineConfig, SessionConfig};
use crate::error::{EngineError, Result};
use crate::summary::world_summary;

/// What one turn or choice produced.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Story text shown to the player.
    pub narrative: String,
    /// Whether `narrative` is the fallback text.
    pub fallback: bool,
    /// Pipeline report, when the payload proposed anything.
    pub report: Option<BatchReport>,
    /// Days that passed on the world clock.
    pub days_elapsed: u32,
}

impl TurnOutcome {
    /// Rejection and advisory messages from the batch.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        self.report.as_ref().map(|r| r.warnings.as_slice()).unwrap_or_default()
    }
}

/// One play session over a shared world model.
pub struct GameEngine {
    model: Arc<RwLock<WorldModel>>,
    pipeline: CreationPipeline,
    oracle: Arc<dyn WorldOracle>,
    player: PlayerProfile,
    meta: SessionMeta,
    recent: VecDeque<String>,
    config: EngineConfig,
}

impl std::fmt::Debug for GameEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameEngine")
            .field("player", &self.player.name)
            .field("session", &self.meta.session_id)
            .field("choices", &self.meta.choice_count)
            .finish_non_exhaustive()
    }
}

impl GameEngine {
    /// Start a new session with an empty world.
    #[must_use]
    pub fn new(config: EngineConfig, oracle: Arc<dyn WorldOracle>, player: PlayerProfile) -> Self {
        let model = Arc::new(RwLock::new(WorldModel::new(config.world.clone())));
        Self {
            pipeline: CreationPipeline::new(Arc::clone(&model)),
            model,
            oracle,
            player,
            meta: SessionMeta::new(),
            recent: VecDeque::new(),
            config,
        }
    }

    /// Start a new session with the LLM oracle described by `config.llm`.
    ///
    /// # Errors
    ///
    /// [`EngineError::Llm`] if `llm.prompt_dir` is set but cannot be loaded.
    pub fn from_config(config: EngineConfig, player: PlayerProfile) -> Result<Self> {
        let prompts = match &config.llm.prompt_dir {
            Some(dir) => PromptSet::from_directory(dir)?,
            None => PromptSet::builtin(),
        };
        let oracle = LlmOracle::new(LlmClient::from_settings(&config.llm))
            .with_prompts(prompts)
            .with_timeout(config.llm.timeout_ms);
        Ok(Self::new(config, Arc::new(oracle), player))
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// The shared world model.
    #[must_use]
    pub fn model(&self) -> &Arc<RwLock<WorldModel>> {
        &self.model
    }

    /// The player character.
    #[must_use]
    pub fn player(&self) -> &PlayerProfile {
        &self.player
    }

    /// Mutable access to the player character.
    pub fn player_mut(&mut self) -> &mut PlayerProfile {
        &mut self.player
    }

    /// Session bookkeeping.
    #[must_use]
    pub fn meta(&self) -> &SessionMeta {
        &self.meta
    }

    fn session(&self) -> &SessionConfig {
        &self.config.session
    }

    /// Current world summary, as sent to the oracle.
    #[must_use]
    pub fn world_summary(&self) -> String {
        world_summary(&self.model.read(), &self.player)
    }

    /// Advisory scan for dangling references.
    #[must_use]
    pub fn integrity_report(&self) -> IntegrityReport {
        validate_integrity(self.model.read().view())
    }

    // ------------------------------------------------------------------
    // Turns
    // ------------------------------------------------------------------

    /// Play one turn of free-form input.
    #[instrument(skip(self), fields(session = %self.meta.session_id))]
    pub async fn take_turn(&mut self, input: &str) -> TurnOutcome {
        let summary = self.world_summary();
        let context = self.context();

        let (narrative, fallback) = match self.oracle.narrate(input, &context, &summary).await {
            Ok(text) if !text.trim().is_empty() => (text, false),
            Ok(_) => {
                warn!("oracle returned empty narration; using fallback");
                (self.session().fallback_narrative.clone(), true)
            }
            Err(err) => {
                warn!(error = %err, "narration failed; using fallback");
                (self.session().fallback_narrative.clone(), true)
            }
        };

        let payload = if fallback {
            DetectionPayload::default()
        } else {
            let passage = format!("{context}\n{narrative}");
            match self.oracle.detect(input, &passage, &summary).await {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(error = %err, "detection failed; world left unchanged");
                    DetectionPayload::default()
                }
            }
        };

        let report = self.submit(payload);
        if !fallback {
            self.remember(&narrative);
        }
        let days_elapsed = self.advance_clock();
        TurnOutcome {
            narrative,
            fallback,
            report,
            days_elapsed,
        }
    }

    /// Act on a choice. The consequence payload may carry player standing
    /// effects; the choice is counted even when the oracle fails.
    #[instrument(skip(self), fields(session = %self.meta.session_id))]
    pub async fn make_choice(&mut self, choice_text: &str) -> TurnOutcome {
        let summary = self.world_summary();
        let situation = self.recent.back().cloned().unwrap_or_default();
        self.meta.choice_count += 1;

        let (payload, narrative, fallback) =
            match self.oracle.analyze_consequences(&situation, choice_text, &summary).await {
                Ok(payload) => (payload, format!("You chose: {choice_text}"), false),
                Err(err) => {
                    warn!(error = %err, "consequence analysis failed; world left unchanged");
                    (DetectionPayload::default(), self.session().fallback_narrative.clone(), true)
                }
            };

        let report = self.submit(payload);
        let days_elapsed = self.advance_clock();
        TurnOutcome {
            narrative,
            fallback,
            report,
            days_elapsed,
        }
    }

    fn submit(&self, payload: DetectionPayload) -> Option<BatchReport> {
        if payload.is_empty() {
            return None;
        }
        match self.pipeline.process_entity_creation(payload) {
            Submission::Completed(report) => Some(report),
            Submission::Queued(ticket) => {
                info!(%ticket, "batch queued behind another writer");
                None
            }
        }
    }

    fn context(&self) -> String {
        self.recent.iter().cloned().collect::<Vec<_>>().join("\n\n")
    }

    fn remember(&mut self, passage: &str) {
        self.recent.push_back(passage.to_string());
        while self.recent.len() > self.session().context_passages {
            self.recent.pop_front();
        }
    }

    fn advance_clock(&self) -> u32 {
        let steps = self.session().time_steps_per_turn;
        self.model.write().advance_time(steps).days_elapsed
    }

    /// Finish a tracked world event; its entity, if any, is updated too.
    ///
    /// # Errors
    ///
    /// [`EngineError::Core`] wrapping `NotFound` if the event is not
    /// current or scheduled.
    pub fn complete_event(&self, id: &str, success: bool) -> Result<EventStatus> {
        Ok(self.model.write().complete_event(id, success)?)
    }

    // ------------------------------------------------------------------
    // Save / load
    // ------------------------------------------------------------------

    /// Capture the session as a snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.model.read(), &self.player, &self.meta)
    }

    /// Write the session to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// [`EngineError::Io`] if the file cannot be written.
    pub async fn save(&mut self, path: &Path) -> Result<()> {
        let snapshot = self.snapshot();
        let json = snapshot.to_json()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|source| EngineError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        tokio::fs::write(path, json).await.map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.meta.last_save = snapshot.meta.last_save;
        info!(path = %path.display(), "session saved");
        Ok(())
    }

    /// Save into `session.save_dir` as `<slot>.json`.
    ///
    /// # Errors
    ///
    /// See [`save`](Self::save).
    pub async fn save_slot(&mut self, slot: &str) -> Result<PathBuf> {
        let path = self.slot_path(slot);
        self.save(&path).await?;
        Ok(path)
    }

    /// Replace the session with the one saved at `path`. Nothing changes
    /// if the file is unreadable or not a valid snapshot.
    ///
    /// # Errors
    ///
    /// [`EngineError::Io`] or [`EngineError::Core`] wrapping
    /// `InvalidSnapshot`.
    pub async fn load(&mut self, path: &Path) -> Result<()> {
        let json = tokio::fs::read_to_string(path).await.map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot = Snapshot::from_json(&json)?;
        let (model, player, meta) = snapshot.restore(self.config.world.clone());

        *self.model.write() = model;
        self.player = player;
        self.meta = meta;
        self.recent.clear();
        info!(path = %path.display(), session = %self.meta.session_id, "session loaded");
        Ok(())
    }

    /// Load `<slot>.json` from `session.save_dir`.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub async fn load_slot(&mut self, slot: &str) -> Result<()> {
        let path = self.slot_path(slot);
        self.load(&path).await
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        let name = chronicle_core::slugify(slot);
        let name = if name.is_empty() { "autosave".to_string() } else { name };
        self.session().save_dir.join(format!("{name}.json"))
    }
}
