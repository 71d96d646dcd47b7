//! Session lifecycle against the bundled sample dataset

use std::path::Path;

use atlas_graph::LayoutAlgorithm;
use atlas_types::{Dataset, DiagramKind, FilterSet, LayoutSource, Position};
use egui::{vec2, Pos2};
use safety_atlas::{AtlasConfig, DiagramSession, FileStorage, LayoutStore};

fn sample_dataset() -> Dataset {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/sample_dataset.json");
    let text = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&text).unwrap()
}

fn config(dir: &Path) -> AtlasConfig {
    AtlasConfig {
        store_dir: dir.to_path_buf(),
        ..AtlasConfig::default()
    }
}

fn open(kind: DiagramKind, dataset: Dataset, store: &LayoutStore, dir: &Path) -> DiagramSession {
    DiagramSession::open(kind, dataset, FilterSet::default(), &config(dir), store, 0.0)
}

#[test]
fn test_unified_chart_starts_from_bundled_layout() {
    let dir = tempfile::tempdir().unwrap();
    let store = LayoutStore::new(FileStorage::new(dir.path()));
    let session = open(DiagramKind::UnifiedChart, sample_dataset(), &store, dir.path());

    assert_eq!(session.source(), LayoutSource::Attached);
    let stats = session.stats();
    assert_eq!(stats.applied + stats.new_nodes, session.graph().len());
    assert_eq!(stats.stale, 0);
    assert_eq!(
        session.graph().get_node("provider-openai").unwrap().position,
        Pos2::new(600.0, 570.0)
    );
}

#[test]
fn test_documentation_map_has_no_bundled_layout() {
    let dir = tempfile::tempdir().unwrap();
    let store = LayoutStore::new(FileStorage::new(dir.path()));
    let session = open(DiagramKind::DocumentationMap, sample_dataset(), &store, dir.path());

    assert_eq!(session.source(), LayoutSource::Default);
    assert_eq!(session.algorithm(), LayoutAlgorithm::Radial);
    assert_eq!(session.stats().new_nodes, session.graph().len());
}

#[test]
fn test_drag_save_reopen_restores_position() {
    let dir = tempfile::tempdir().unwrap();
    let store = LayoutStore::new(FileStorage::new(dir.path()));
    let mut session = open(DiagramKind::DocumentationMap, sample_dataset(), &store, dir.path());

    let start = session.graph().get_node("provider:meta").unwrap().position;
    let screen = session.view().world_to_screen(start);
    assert_eq!(session.drag_start(screen).as_deref(), Some("provider:meta"));
    session.drag_move(screen + vec2(10.0, 0.0));
    session.drag_end(screen + vec2(40.0, 15.0));
    assert!(session.save(&store, 0.0));

    let reopened = open(DiagramKind::DocumentationMap, sample_dataset(), &store, dir.path());
    assert_eq!(reopened.source(), LayoutSource::Saved);
    assert_eq!(reopened.stats().applied, reopened.graph().len());
    let restored = reopened.graph().get_node("provider:meta").unwrap().position;
    assert!((restored - (start + vec2(40.0, 15.0))).length() < 1e-3);
}

#[test]
fn test_removed_dataset_entries_count_as_stale() {
    let dir = tempfile::tempdir().unwrap();
    let store = LayoutStore::new(FileStorage::new(dir.path()));
    let mut session = open(DiagramKind::DocumentationMap, sample_dataset(), &store, dir.path());
    assert!(session.save(&store, 0.0));

    let mut shrunk = sample_dataset();
    shrunk.models.retain(|m| m.id != "o1");
    shrunk.evidence.retain(|e| e.id != "o1-system-card");

    let reopened = open(DiagramKind::DocumentationMap, shrunk, &store, dir.path());
    assert_eq!(reopened.stats().stale, 2);
    assert!(!reopened.graph().contains("model:o1"));
    assert_eq!(reopened.stats().new_nodes, 0);
}

#[test]
fn test_rejected_import_keeps_current_layout() {
    let dir = tempfile::tempdir().unwrap();
    let store = LayoutStore::new(FileStorage::new(dir.path()));
    let mut session = open(DiagramKind::UnifiedChart, sample_dataset(), &store, dir.path());
    let before = session.current_blob();

    let missing_positions = r#"{"labelAnchors": {}, "layoutName": "balanced"}"#;
    assert!(!session.import_json(missing_positions, 1.0));
    assert!(session.status(1.0).unwrap().is_error());

    let non_numeric_first = r#"{"positions": {"category-alignment": {"x": "left", "y": 0}}}"#;
    assert!(!session.import_json(non_numeric_first, 2.0));

    assert_eq!(session.current_blob(), before);
    assert!(!session.is_dirty());
}

#[test]
fn test_export_then_import_into_fresh_session() {
    let dir = tempfile::tempdir().unwrap();
    let store = LayoutStore::new(FileStorage::new(dir.path().join("store")));
    let mut session = open(DiagramKind::UnifiedChart, sample_dataset(), &store, dir.path());
    session.sequential_layout();

    let at = chrono::Utc::now();
    let path = session.export_to_dir(&dir.path().join("exports"), at, 0.0).unwrap();

    let mut other = open(DiagramKind::UnifiedChart, sample_dataset(), &store, dir.path());
    assert_eq!(other.layout_name(), "balanced");
    assert!(other.import_file(&path, 0.0));
    assert_eq!(other.layout_name(), "sequential");
    assert_eq!(other.current_blob().positions, session.current_blob().positions);
    assert!(other.is_dirty());
}

#[test]
fn test_force_on_selection_then_reset() {
    let dir = tempfile::tempdir().unwrap();
    let store = LayoutStore::new(FileStorage::new(dir.path()));
    let mut session = open(DiagramKind::UnifiedChart, sample_dataset(), &store, dir.path());
    let pinned_before = session.graph().positions()["category-security"];

    session.select(["provider-openai".to_string(), "not-a-node".to_string()]);
    assert_eq!(session.selection().len(), 1);
    session.start_force();
    session.run_force_to_convergence(0.0);
    assert!(!session.is_force_running());
    assert_eq!(session.graph().positions()["category-security"], pinned_before);
    assert!(session
        .graph()
        .nodes()
        .iter()
        .all(|n| n.fx == Some(n.position.x) && n.fy == Some(n.position.y)));

    session.reset_layout();
    assert!(session.selection().is_empty());
    assert_eq!(session.layout_name(), "balanced");
    let provider = session.graph().positions()["provider-anthropic"];
    assert!(Position::is_finite(&provider));
}

#[test]
fn test_filter_change_keeps_hand_placed_nodes() {
    let dir = tempfile::tempdir().unwrap();
    let store = LayoutStore::new(FileStorage::new(dir.path()));
    let mut session = open(DiagramKind::UnifiedChart, sample_dataset(), &store, dir.path());
    let kept = session.graph().positions()["provider-anthropic"];

    let filters = FilterSet {
        providers: ["anthropic".to_string()].into(),
        ..Default::default()
    };
    assert!(session.apply_filters(filters));
    assert!(!session.graph().contains("provider-openai"));
    assert_eq!(session.graph().positions()["provider-anthropic"], kept);

    assert!(session.apply_filters(FilterSet::default()));
    assert!(session.graph().contains("provider-openai"));
    assert_eq!(session.graph().positions()["provider-anthropic"], kept);
}
