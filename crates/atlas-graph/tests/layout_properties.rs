//! Property tests for reconciliation, column packing, radial spacing and
//! the force pin invariant.

use std::collections::{BTreeMap, BTreeSet};
use std::f32::consts::TAU;

use atlas_graph::{
    build_documentation_map, build_unified_chart, compute_layout, pack_two_columns, reconcile,
    ColumnGroup, DeterministicLayout, ForceConfig, ForceSimulation, LayoutAlgorithm,
    LayoutConfig, PersistedLayout,
};
use atlas_types::{
    Category, Dataset, Evidence, FilterSet, LayoutBlob, LayoutSource, Model, Position, Provider,
    ReconcileStats, Technique,
};
use proptest::prelude::*;

// -- Strategy helpers --

fn arb_live_ids() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set((0u8..24).prop_map(|n| format!("node-{n}")), 0..16)
}

/// Any f32, NaN and infinities included
fn arb_coord() -> impl Strategy<Value = f32> {
    prop_oneof![
        4 => -5000.0f32..5000.0,
        1 => Just(f32::NAN),
        1 => Just(f32::INFINITY),
        1 => Just(f32::NEG_INFINITY),
    ]
}

fn arb_blob() -> impl Strategy<Value = LayoutBlob> {
    prop::collection::btree_map(
        (0u8..32).prop_map(|n| format!("node-{n}")),
        (arb_coord(), arb_coord()).prop_map(|(x, y)| Position::new(x, y)),
        0..24,
    )
    .prop_map(|positions| LayoutBlob {
        positions,
        ..Default::default()
    })
}

fn arb_persisted() -> impl Strategy<Value = PersistedLayout> {
    prop_oneof![
        arb_blob().prop_map(PersistedLayout::Saved),
        arb_blob().prop_map(PersistedLayout::Attached),
        Just(PersistedLayout::Absent),
    ]
}

/// A deterministic fallback covering exactly `live`
fn fallback_for(live: &BTreeSet<String>) -> DeterministicLayout {
    let mut layout = DeterministicLayout::new("radial");
    for (i, id) in live.iter().enumerate() {
        layout
            .positions
            .insert(id.clone(), Position::new(i as f32 * 10.0, -(i as f32) * 3.5));
    }
    layout
}

proptest! {
    #[test]
    fn reconcile_positions_every_live_node(
        live in arb_live_ids(),
        persisted in arb_persisted(),
    ) {
        let fallback = fallback_for(&live);
        let result = reconcile(&live, &persisted, &fallback);

        let keys: BTreeSet<String> = result.positions.keys().cloned().collect();
        prop_assert_eq!(&keys, &live);
        for pos in result.positions.values() {
            prop_assert!(pos.is_finite(), "non-finite output {:?}", pos);
        }
    }

    #[test]
    fn reconcile_conserves_live_count(
        live in arb_live_ids(),
        blob in arb_blob(),
    ) {
        let fallback = fallback_for(&live);
        let result = reconcile(&live, &PersistedLayout::Saved(blob), &fallback);
        prop_assert_eq!(result.source, LayoutSource::Saved);
        prop_assert_eq!(result.stats.applied + result.stats.new_nodes, live.len());
    }

    #[test]
    fn reconcile_absent_is_the_fallback(live in arb_live_ids()) {
        let fallback = fallback_for(&live);
        let result = reconcile(&live, &PersistedLayout::Absent, &fallback);

        prop_assert_eq!(&result.positions, &fallback.positions);
        prop_assert_eq!(result.source, LayoutSource::Default);
        prop_assert_eq!(
            result.stats,
            ReconcileStats { applied: 0, stale: 0, new_nodes: live.len() }
        );
    }

    #[test]
    fn reconcile_counts_and_drops_stale_entries(
        live in arb_live_ids(),
        stale in prop::collection::btree_set("[a-z]{3,8}", 0..10),
        blob in arb_blob(),
    ) {
        let mut blob = blob;
        // Only entries outside the live set are stale
        blob.positions.retain(|id, _| live.contains(id));
        for id in &stale {
            blob.positions.insert(format!("gone-{id}"), Position::new(1.0, 2.0));
        }

        let fallback = fallback_for(&live);
        let result = reconcile(&live, &PersistedLayout::Saved(blob), &fallback);

        prop_assert_eq!(result.stats.stale, stale.len());
        for id in &stale {
            let gone = format!("gone-{id}");
            prop_assert!(!result.positions.contains_key(&gone));
        }
    }

    #[test]
    fn two_column_imbalance_is_bounded_by_largest_group(
        heights in prop::collection::vec(1.0f32..500.0, 0..30),
    ) {
        let groups: Vec<ColumnGroup> = heights
            .iter()
            .enumerate()
            .map(|(i, h)| ColumnGroup::new(format!("group {i:02}"), *h))
            .collect();
        let packing = pack_two_columns(&groups);

        let largest = heights.iter().copied().fold(0.0f32, f32::max);
        prop_assert!(packing.imbalance() <= largest + 1e-3);
        prop_assert_eq!(packing.left.len() + packing.right.len(), groups.len());
    }

    #[test]
    fn radial_providers_are_evenly_spaced(count in 1usize..12) {
        let dataset = Dataset {
            providers: (0..count)
                .map(|i| Provider { id: format!("p{i:02}"), name: format!("Provider {i:02}") })
                .collect(),
            ..Default::default()
        };
        let graph = build_documentation_map(&dataset);
        let layout = compute_layout(&graph, LayoutAlgorithm::Radial, &LayoutConfig::default());

        let angles: Vec<f32> = (0..count)
            .map(|i| layout.angles[&format!("provider:p{i:02}")])
            .collect();
        let slice = TAU / count as f32;
        for pair in angles.windows(2) {
            prop_assert!(((pair[1] - pair[0]) - slice).abs() < 1e-4);
        }
    }
}

#[test]
fn test_lpt_bound_with_dominating_group() {
    let mut groups = vec![ColumnGroup::new("huge", 1000.0)];
    for i in 0..6 {
        groups.push(ColumnGroup::new(format!("small {i}"), 20.0));
    }
    let packing = pack_two_columns(&groups);

    // The dominating group sits alone; everything else lands opposite
    assert_eq!(packing.left_height, 1000.0);
    assert_eq!(packing.right_height, 120.0);
    assert!(packing.imbalance() <= 1000.0);
}

#[test]
fn test_single_child_shares_parent_angle() {
    let dataset = Dataset {
        providers: vec![
            Provider { id: "a".into(), name: "Alpha".into() },
            Provider { id: "b".into(), name: "Beta".into() },
            Provider { id: "c".into(), name: "Gamma".into() },
        ],
        models: vec![Model { id: "b1".into(), name: "B1".into(), provider_id: "b".into() }],
        ..Default::default()
    };
    let graph = build_documentation_map(&dataset);
    let layout = compute_layout(&graph, LayoutAlgorithm::Radial, &LayoutConfig::default());

    let parent = layout.angles["provider:b"];
    let child = layout.angles["model:b1"];
    assert!((parent - child).abs() < 1e-6);
}

fn chart_dataset() -> Dataset {
    Dataset {
        providers: vec![
            Provider { id: "a".into(), name: "Alpha".into() },
            Provider { id: "b".into(), name: "Beta".into() },
        ],
        categories: vec![
            Category { id: "align".into(), name: "Alignment".into() },
            Category { id: "eval".into(), name: "Evaluation".into() },
        ],
        techniques: vec![
            Technique { id: "rlhf".into(), name: "RLHF".into(), category_id: "align".into() },
            Technique { id: "cai".into(), name: "Constitutional AI".into(), category_id: "align".into() },
            Technique { id: "red".into(), name: "Red Teaming".into(), category_id: "eval".into() },
        ],
        evidence: vec![Evidence {
            id: "card".into(),
            title: "Card".into(),
            provider_id: "a".into(),
            model_ids: vec![],
            technique_ids: vec!["rlhf".into(), "red".into()],
            url: None,
        }],
        ..Default::default()
    }
}

#[test]
fn test_stop_pins_every_node() {
    let mut graph = build_unified_chart(&chart_dataset(), &FilterSet::default());
    let layout = compute_layout(&graph, LayoutAlgorithm::Balanced, &LayoutConfig::default());
    graph.apply_positions(&layout.positions);

    let selection: BTreeSet<String> = ["provider-a".to_string()].into();
    let mut sim = ForceSimulation::start(&mut graph, &selection, ForceConfig::default());
    for _ in 0..25 {
        sim.tick(&mut graph);
    }
    sim.stop(&mut graph);

    for node in graph.nodes() {
        assert_eq!(node.fx, Some(node.position.x), "{} fx", node.id);
        assert_eq!(node.fy, Some(node.position.y), "{} fy", node.id);
    }
}

#[test]
fn test_unselected_nodes_do_not_move() {
    let mut graph = build_unified_chart(&chart_dataset(), &FilterSet::default());
    let layout = compute_layout(&graph, LayoutAlgorithm::Balanced, &LayoutConfig::default());
    graph.apply_positions(&layout.positions);
    let before: BTreeMap<String, Position> = graph.positions();

    let selection: BTreeSet<String> = ["technique-align-rlhf".to_string()].into();
    let mut sim = ForceSimulation::start(&mut graph, &selection, ForceConfig::default());
    sim.run_to_convergence(&mut graph);
    sim.stop(&mut graph);

    for (id, pos) in graph.positions() {
        if id != "technique-align-rlhf" {
            assert_eq!(pos, before[&id], "{} moved", id);
        }
    }
}
