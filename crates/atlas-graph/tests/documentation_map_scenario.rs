//! Documentation map end to end: build, radial layout, reconcile against an
//! empty saved layout.

use atlas_graph::{
    build_documentation_map, compute_layout, reconcile, LayoutAlgorithm, LayoutConfig, NodeKind,
    PersistedLayout,
};
use atlas_types::{Dataset, Evidence, LayoutBlob, LayoutSource, Model, Provider};

fn scenario() -> Dataset {
    Dataset {
        providers: vec![
            Provider { id: "a".into(), name: "Provider A".into() },
            Provider { id: "b".into(), name: "Provider B".into() },
            Provider { id: "c".into(), name: "Provider C".into() },
        ],
        models: vec![
            Model { id: "a-documented".into(), name: "A Documented".into(), provider_id: "a".into() },
            Model { id: "a-orphan".into(), name: "A Orphan".into(), provider_id: "a".into() },
        ],
        evidence: vec![Evidence {
            id: "a-card".into(),
            title: "A System Card".into(),
            provider_id: "a".into(),
            model_ids: vec!["a-documented".into()],
            technique_ids: vec![],
            url: None,
        }],
        ..Default::default()
    }
}

#[test]
fn test_childless_provider_is_still_drawn() {
    let graph = build_documentation_map(&scenario());

    assert_eq!(graph.nodes_of_kind(NodeKind::Provider).count(), 3);
    assert!(graph.contains("provider:b"));
    assert!(graph.contains("provider:c"));
    assert_eq!(graph.degree("provider:b"), 0);
}

#[test]
fn test_orphan_model_is_flagged_not_dropped() {
    let graph = build_documentation_map(&scenario());

    let orphan = graph.get_node("model:a-orphan").unwrap();
    assert!(orphan.is_orphan);
    assert!(!graph.get_node("model:a-documented").unwrap().is_orphan);
    // 3 providers + 2 models + the one evidence record documenting a model
    assert_eq!(graph.len(), 6);
}

#[test]
fn test_empty_saved_layout_falls_back_for_every_node() {
    let graph = build_documentation_map(&scenario());
    let fallback = compute_layout(&graph, LayoutAlgorithm::Radial, &LayoutConfig::default());
    let live = graph.node_ids();

    let result = reconcile(&live, &PersistedLayout::Saved(LayoutBlob::default()), &fallback);

    assert_eq!(result.source, LayoutSource::Saved);
    assert_eq!(result.stats.applied, 0);
    assert_eq!(result.stats.stale, 0);
    assert_eq!(result.stats.new_nodes, live.len());
    assert_eq!(result.positions, fallback.positions);
    assert_eq!(result.layout_name, "radial");
}
