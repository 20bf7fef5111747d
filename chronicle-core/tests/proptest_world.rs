//! Property-Based Tests for Chronicle Core
//!
//! Uses `proptest` to check that bounded values stay bounded and audit logs
//! stay capped and chronological under arbitrary input.

use proptest::prelude::*;

use chronicle_core::config::{ChronicleConfig, HistoryConfig};
use chronicle_core::relationship::{RelationshipGraph, RelationshipInput, RelationshipType};
use chronicle_core::world::{WorldParameter, WorldState};

fn arb_parameter() -> impl Strategy<Value = WorldParameter> {
    prop_oneof![
        Just(WorldParameter::Tension),
        Just(WorldParameter::PoliticalStability),
        Just(WorldParameter::EconomicState),
        Just(WorldParameter::MagicalActivity),
    ]
}

fn arb_relationship_type() -> impl Strategy<Value = RelationshipType> {
    (0..RelationshipType::ALL.len()).prop_map(|i| RelationshipType::ALL[i])
}

// ---------------------------------------------------------------------------
// Property: edge strength is always in [0, 100]
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn edge_strength_always_clamped(strength in -10_000.0..10_000.0f32, kind in arb_relationship_type()) {
        let mut graph = RelationshipGraph::default();
        let edge = graph
            .set_relationship("a", "b", RelationshipInput::new(kind, strength, "prop"))
            .expect("distinct endpoints");
        prop_assert!((0.0..=100.0).contains(&edge.strength));
    }
}

// ---------------------------------------------------------------------------
// Property: parameters stay in bounds under any sequence of deltas
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn parameters_stay_bounded(
        deltas in proptest::collection::vec((arb_parameter(), -1_000.0..1_000.0f32), 0..60)
    ) {
        let mut world = WorldState::new(&ChronicleConfig::default());
        for (parameter, delta) in &deltas {
            let change = world.adjust(*parameter, *delta, "prop");
            prop_assert!((0.0..=100.0).contains(&change.new_value));
        }
        prop_assert_eq!(world.parameters().out_of_bounds().count(), 0);
        prop_assert_eq!(world.parameter_history().len(), deltas.len());
    }

    #[test]
    fn saturating_delta_is_idempotent(parameter in arb_parameter(), magnitude in 100.0..5_000.0f32, up in any::<bool>()) {
        let delta = if up { magnitude } else { -magnitude };
        let mut once = WorldState::new(&ChronicleConfig::default());
        once.adjust(parameter, delta, "once");
        let mut twice = WorldState::new(&ChronicleConfig::default());
        twice.adjust(parameter, delta, "first");
        twice.adjust(parameter, delta, "second");
        prop_assert!((once.parameter(parameter) - twice.parameter(parameter)).abs() < f32::EPSILON);
    }
}

// ---------------------------------------------------------------------------
// Property: audit logs are capped and chronological
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn ledger_and_standing_history_capped(
        writes in proptest::collection::vec(0.0..100.0f32, 1..80),
        ledger_cap in 1usize..20,
        standing_cap in 1usize..20,
    ) {
        let limits = HistoryConfig {
            relationship_history_limit: ledger_cap,
            standing_history_limit: standing_cap,
            ..HistoryConfig::default()
        };
        let mut graph = RelationshipGraph::new(&limits);
        for strength in &writes {
            graph
                .set_relationship("a", "b", RelationshipInput::new(RelationshipType::Trade, *strength, "deal"))
                .expect("distinct endpoints");
            graph.update_player_standing("a", *strength - 50.0, "deal");
        }

        prop_assert!(graph.ledger().len() <= ledger_cap);
        prop_assert!(graph.ledger().windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

        let standing = graph.player_standing("a").expect("touched");
        prop_assert!(standing.history.len() <= standing_cap);
        prop_assert!(standing.history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }
}
