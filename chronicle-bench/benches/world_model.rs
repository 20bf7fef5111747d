//! Chronicle Benchmark Suite
//!
//! Performance targets:
//!   batch_admission_50_npcs .......... < 2ms
//!   relationship_strength_two_hop .... < 50μs
//!   network_analysis_dense_hub ....... < 200μs
//!   world_analysis ................... < 5μs
//!   snapshot_capture_200_entities .... < 5ms

use std::sync::Arc;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use parking_lot::RwLock;

use chronicle_core::entity::{Faction, Location, LocationType, Npc};
use chronicle_core::payload::EntityProposal;
use chronicle_core::relationship::{RelationshipInput, RelationshipType};
use chronicle_core::{CreationPipeline, DetectionPayload, PlayerProfile, SessionMeta, Snapshot, WorldModel};

const LOCATIONS: usize = 10;

fn location_id(i: usize) -> String {
    format!("district_{}", i % LOCATIONS)
}

fn settlement_payload(npcs: usize) -> DetectionPayload {
    let mut payload = DetectionPayload::default();
    for i in 0..LOCATIONS {
        payload.entities.locations.push(EntityProposal::with_id(
            location_id(i),
            Location::new(format!("District {i}"), LocationType::Town).with_population(2_000),
        ));
    }
    for i in 0..npcs {
        payload.entities.npcs.push(EntityProposal::with_id(
            format!("npc_{i}"),
            Npc::new(format!("Citizen {i}"), "merchant").at(location_id(i)),
        ));
    }
    payload
}

/// A model with `npcs` NPCs where everyone knows `npc_0` and each NPC also
/// knows its neighbour.
fn populated_model(npcs: usize) -> WorldModel {
    let model = Arc::new(RwLock::new(WorldModel::default()));
    let pipeline = CreationPipeline::new(Arc::clone(&model));
    let _ = pipeline.process_entity_creation(settlement_payload(npcs));

    let mut model = model.write();
    model
        .entities
        .create("guild", Faction::new("Merchants' Guild"))
        .expect("faction");
    for i in 1..npcs {
        let id = format!("npc_{i}");
        let friend = RelationshipInput::new(RelationshipType::Friend, 40.0 + (i % 50) as f32, "regular");
        model.relationships.set_relationship(&id, "npc_0", friend).expect("hub edge");
        let trade = RelationshipInput::new(RelationshipType::Trade, 55.0, "suppliers");
        let next = format!("npc_{}", (i + 1) % npcs);
        if next != id {
            model.relationships.set_relationship(&id, &next, trade).expect("ring edge");
        }
    }
    std::mem::take(&mut *model)
}

/// Benchmark: admit a fresh batch of 10 locations and 50 NPCs.
fn bench_batch_admission(c: &mut Criterion) {
    c.bench_function("batch_admission_50_npcs", |b| {
        b.iter_batched(
            || {
                let model = Arc::new(RwLock::new(WorldModel::default()));
                (CreationPipeline::new(model), settlement_payload(50))
            },
            |(pipeline, payload)| black_box(pipeline.process_entity_creation(payload)),
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark: two-hop strength between NPCs sharing the hub.
fn bench_two_hop_strength(c: &mut Criterion) {
    let model = populated_model(200);
    c.bench_function("relationship_strength_two_hop", |b| {
        b.iter(|| {
            black_box(
                model
                    .relationships
                    .calculate_relationship_strength(black_box("npc_17"), black_box("npc_140")),
            )
        });
    });
}

/// Benchmark: network analysis of the hub NPC.
fn bench_network_analysis(c: &mut Criterion) {
    let model = populated_model(200);
    c.bench_function("network_analysis_dense_hub", |b| {
        b.iter(|| black_box(model.relationships.analyze_relationship_network(black_box("npc_0"))));
    });
}

/// Benchmark: qualitative world analysis.
fn bench_world_analysis(c: &mut Criterion) {
    let model = WorldModel::default();
    c.bench_function("world_analysis", |b| {
        b.iter(|| black_box(model.world.analyze_world_state()));
    });
}

/// Benchmark: capture and serialise a session.
fn bench_snapshot(c: &mut Criterion) {
    let model = populated_model(200);
    let player = PlayerProfile::new("Bench");
    let meta = SessionMeta::new();
    c.bench_function("snapshot_capture_200_entities", |b| {
        b.iter(|| {
            let snapshot = Snapshot::capture(black_box(&model), &player, &meta);
            black_box(snapshot.to_json().expect("serialize"))
        });
    });
}

criterion_group!(
    benches,
    bench_batch_admission,
    bench_two_hop_strength,
    bench_network_analysis,
    bench_world_analysis,
    bench_snapshot,
);
criterion_main!(benches);
