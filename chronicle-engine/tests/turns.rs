//! Engine Tests: turns, choices, fallback and save/load.
//!
//! A scripted oracle stands in for the LLM so every turn is deterministic.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use chronicle_core::entity::{Event, EventStatus, Npc};
use chronicle_core::{ConsequencePayload, DetectionPayload, EntityKind, PlayerProfile};
use chronicle_engine::{EngineConfig, EngineError, GameEngine};
use chronicle_llm::error::Result as LlmResult;
use chronicle_llm::{LlmClient, LlmError, LlmOracle, WorldOracle};

/// Replays queued responses; an exhausted queue behaves like an outage.
#[derive(Default)]
struct ScriptedOracle {
    narrations: Mutex<VecDeque<String>>,
    detections: Mutex<VecDeque<DetectionPayload>>,
    consequences: Mutex<VecDeque<ConsequencePayload>>,
    seen_summaries: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    fn narrate_then(self, text: &str) -> Self {
        self.narrations.lock().push_back(text.to_string());
        self
    }

    fn detect_then(self, value: serde_json::Value) -> Self {
        let (payload, problems) = DetectionPayload::from_value_lenient(&value);
        assert!(problems.is_empty(), "{problems:?}");
        self.detections.lock().push_back(payload);
        self
    }

    fn consequence_then(self, value: serde_json::Value) -> Self {
        let (payload, _) = DetectionPayload::from_value_lenient(&value);
        self.consequences.lock().push_back(payload);
        self
    }
}

fn outage() -> LlmError {
    LlmError::Unavailable("script exhausted".into())
}

#[async_trait]
impl WorldOracle for ScriptedOracle {
    async fn narrate(&self, _input: &str, _context: &str, summary: &str) -> LlmResult<String> {
        self.seen_summaries.lock().push(summary.to_string());
        self.narrations.lock().pop_front().ok_or_else(outage)
    }

    async fn detect(&self, _input: &str, _context: &str, _summary: &str) -> LlmResult<DetectionPayload> {
        self.detections.lock().pop_front().ok_or_else(outage)
    }

    async fn analyze_consequences(&self, _input: &str, _choice: &str, _summary: &str) -> LlmResult<ConsequencePayload> {
        self.consequences.lock().pop_front().ok_or_else(outage)
    }
}

fn engine_with(oracle: ScriptedOracle) -> (GameEngine, Arc<ScriptedOracle>) {
    let oracle = Arc::new(oracle);
    let engine = GameEngine::new(EngineConfig::default(), oracle.clone(), PlayerProfile::new("Ayla"));
    (engine, oracle)
}

fn tavern_scene() -> serde_json::Value {
    json!({
        "entities": {
            "locations": [{ "id": "anchor", "name": "Rusty Anchor", "locationType": "tavern", "population": 12 }],
            "npcs": [{ "id": "tom", "name": "Old Tom", "occupation": "innkeeper", "location": "anchor" }]
        },
        "relationships": [{ "entity1": "tom", "entity2": "player", "type": "neutral", "strength": 40 }],
        "worldUpdates": { "rumors": ["Smugglers use the old pier"] }
    })
}

// ---------------------------------------------------------------------------
// Turns
// ---------------------------------------------------------------------------

#[tokio::test]
async fn turn_commits_detected_entities() {
    let oracle = ScriptedOracle::default()
        .narrate_then("Smoke curls from the hearth of the Rusty Anchor.")
        .detect_then(tavern_scene());
    let (mut engine, oracle) = engine_with(oracle);

    let outcome = engine.take_turn("I step inside").await;
    assert!(!outcome.fallback);
    let report = outcome.report.expect("payload was submitted");
    assert_eq!(report.created.len(), 2);
    assert_eq!(report.relationships.len(), 1);
    assert_eq!(report.feed_items, 1);

    let model = engine.model().read();
    assert!(model.entities.get::<Npc>("tom").is_some());
    assert_eq!(model.world.information().rumors.len(), 1);
    drop(model);

    assert!(engine.world_summary().contains("tom (Old Tom, innkeeper, at anchor"));
    assert!(oracle.seen_summaries.lock()[0].contains("Player: Ayla"));
}

#[tokio::test]
async fn oracle_outage_falls_back_and_leaves_world_unchanged() {
    let (mut engine, _) = engine_with(ScriptedOracle::default());
    let before = engine.snapshot();

    let outcome = engine.take_turn("Hello?").await;
    assert!(outcome.fallback);
    assert_eq!(outcome.narrative, EngineConfig::default().session.fallback_narrative);
    assert!(outcome.report.is_none());

    let model = engine.model().read();
    assert_eq!(model.entities.total_count(), 0);
    assert_eq!(model.relationships.edge_count(), 0);
    assert_eq!(model.world.parameters(), &before.world_state.parameters);
}

#[tokio::test]
async fn detection_failure_keeps_narrative() {
    let oracle = ScriptedOracle::default().narrate_then("The road is quiet.");
    let (mut engine, _) = engine_with(oracle);

    let outcome = engine.take_turn("I walk on").await;
    assert!(!outcome.fallback);
    assert_eq!(outcome.narrative, "The road is quiet.");
    assert!(outcome.report.is_none());
}

#[tokio::test]
async fn rejected_proposals_surface_as_warnings() {
    let oracle = ScriptedOracle::default()
        .narrate_then("Two Toms argue over the same stool.")
        .detect_then(tavern_scene())
        .narrate_then("Another Tom appears.")
        .detect_then(json!({ "entities": { "npcs": [{ "id": "tom", "name": "Other Tom" }] } }));
    let (mut engine, _) = engine_with(oracle);

    engine.take_turn("I look around").await;
    let outcome = engine.take_turn("I look again").await;
    assert!(outcome.warnings().iter().any(|w| w.contains("tom")));
    assert_eq!(engine.model().read().entities.count(EntityKind::Npc), 1);
}

// ---------------------------------------------------------------------------
// Choices
// ---------------------------------------------------------------------------

#[tokio::test]
async fn choice_applies_player_effects_and_counts() {
    let oracle = ScriptedOracle::default()
        .narrate_then("Tom eyes your purse.")
        .detect_then(tavern_scene())
        .consequence_then(json!({
            "worldUpdates": { "economicState": 2 },
            "playerEffects": [{ "entity": "Old Tom", "change": 15, "reason": "paid for a round" }]
        }));
    let (mut engine, _) = engine_with(oracle);

    engine.take_turn("I sit at the bar").await;
    let outcome = engine.make_choice("Buy a round for the house").await;
    assert!(!outcome.fallback);
    assert_eq!(engine.meta().choice_count, 1);

    let model = engine.model().read();
    assert!((model.relationships.get_player_standing("tom") - 15.0).abs() < f32::EPSILON);
    assert!((model.world.parameters().economic_state - 62.0).abs() < f32::EPSILON);
}

#[tokio::test]
async fn failed_choice_still_counts() {
    let (mut engine, _) = engine_with(ScriptedOracle::default());
    let outcome = engine.make_choice("Run").await;
    assert!(outcome.fallback);
    assert_eq!(engine.meta().choice_count, 1);
}

#[tokio::test]
async fn offline_llm_oracle_degrades_gracefully() {
    let oracle = Arc::new(LlmOracle::new(LlmClient::none()));
    let mut engine = GameEngine::new(EngineConfig::default(), oracle, PlayerProfile::default());
    let outcome = engine.take_turn("Is anyone there?").await;
    assert!(outcome.fallback);
}

#[tokio::test]
async fn scheduled_events_start_on_the_engine_clock() {
    let mut config = EngineConfig::default();
    config.session.time_steps_per_turn = 6;
    let oracle = ScriptedOracle::default()
        .narrate_then("Astronomers whisper about tomorrow's sky.")
        .detect_then(json!({
            "entities": { "events": [
                { "id": "fair", "name": "Spring Fair" },
                { "id": "eclipse", "name": "Eclipse", "status": "scheduled", "startDay": 2 }
            ] }
        }));
    let mut engine = GameEngine::new(config, Arc::new(oracle), PlayerProfile::new("Ayla"));

    let outcome = engine.take_turn("I look up").await;
    assert_eq!(outcome.days_elapsed, 1);
    assert_eq!(engine.complete_event("fair", true).expect("complete"), EventStatus::Completed);

    let model = engine.model().read();
    let status = |id: &str| model.entities.get::<Event>(id).map(|r| r.data.status);
    assert_eq!(status("eclipse"), Some(EventStatus::Active));
    assert_eq!(status("fair"), Some(EventStatus::Completed));
    assert_eq!(model.world.events().active_count(), 1);
}

// ---------------------------------------------------------------------------
// Save / load
// ---------------------------------------------------------------------------

#[tokio::test]
async fn save_and_load_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = EngineConfig::default();
    config.session.save_dir = dir.path().join("saves");

    let oracle = Arc::new(
        ScriptedOracle::default()
            .narrate_then("The tavern is warm.")
            .detect_then(tavern_scene())
            .consequence_then(json!({ "playerEffects": [{ "entity": "tom", "change": -10 }] })),
    );
    let mut engine = GameEngine::new(config.clone(), oracle, PlayerProfile::new("Ayla"));
    engine.take_turn("I order stew").await;
    engine.make_choice("Complain about the stew").await;

    let path = engine.save_slot("Chapter One").await.expect("save");
    assert!(path.ends_with("chapter_one.json"));
    assert!(engine.meta().last_save.is_some());
    let saved = engine.snapshot();

    let mut fresh = GameEngine::new(config, Arc::new(ScriptedOracle::default()), PlayerProfile::default());
    fresh.load_slot("Chapter One").await.expect("load");

    assert_eq!(fresh.player().name, "Ayla");
    assert_eq!(fresh.meta().session_id, engine.meta().session_id);
    assert_eq!(fresh.meta().choice_count, 1);
    let model = fresh.model().read();
    assert_eq!(model.entities.tables(), saved.entities);
    assert!((model.relationships.get_player_standing("tom") + 10.0).abs() < f32::EPSILON);
    drop(model);
    assert!(fresh.integrity_report().is_clean());
}

#[tokio::test]
async fn invalid_save_is_rejected_without_changes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.json");
    std::fs::write(&path, r#"{"player": {"name": "X"}, "entities": {}}"#).expect("write");

    let oracle = ScriptedOracle::default()
        .narrate_then("Quiet.")
        .detect_then(tavern_scene());
    let (mut engine, _) = engine_with(oracle);
    engine.take_turn("wait").await;

    let err = engine.load(&path).await.expect_err("must reject");
    assert!(matches!(err, EngineError::Core(_)));
    assert_eq!(engine.player().name, "Ayla");
    assert_eq!(engine.model().read().entities.total_count(), 2);

    let missing = engine.load(&dir.path().join("absent.json")).await;
    assert!(matches!(missing, Err(EngineError::Io { .. })));
}
