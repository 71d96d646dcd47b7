//! Layout reconciliation
//!
//! Merges three inputs into the positions a diagram actually renders with:
//!
//! ```text
//!   live node ids ──┐
//!   persisted blob ─┼──► reconcile ──► positions + label anchors + stats
//!   fallback layout ┘
//! ```
//!
//! Every live node ends up with a finite position. Persisted entries for ids
//! that are no longer live are counted as stale and dropped; live ids with no
//! usable persisted entry take the fallback position.

use super::layout::DeterministicLayout;
use super::types::{EdgeKind, Graph};
use atlas_types::{LabelAnchor, LayoutBlob, LayoutSource, Position, ReconcileStats};
use std::collections::{BTreeMap, BTreeSet};

/// A persisted layout as handed over by the store
#[derive(Debug, Clone, PartialEq)]
pub enum PersistedLayout {
    /// From the device-local store
    Saved(LayoutBlob),
    /// From the bundled default asset
    Attached(LayoutBlob),
    /// Nothing usable
    Absent,
}

impl PersistedLayout {
    pub fn blob(&self) -> Option<&LayoutBlob> {
        match self {
            PersistedLayout::Saved(blob) | PersistedLayout::Attached(blob) => Some(blob),
            PersistedLayout::Absent => None,
        }
    }

    pub fn source(&self) -> LayoutSource {
        match self {
            PersistedLayout::Saved(_) => LayoutSource::Saved,
            PersistedLayout::Attached(_) => LayoutSource::Attached,
            PersistedLayout::Absent => LayoutSource::Default,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, PersistedLayout::Absent)
    }
}

/// Final positions plus provenance
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub positions: BTreeMap<String, Position>,
    pub label_anchors: BTreeMap<String, LabelAnchor>,
    pub layout_name: String,
    pub source: LayoutSource,
    pub stats: ReconcileStats,
}

/// Merge live ids, a persisted layout and the deterministic fallback
///
/// The fallback must cover every live id (`compute_layout` guarantees
/// this). A live id missing from both gets the origin rather than being
/// left unpositioned.
pub fn reconcile(
    live_ids: &BTreeSet<String>,
    persisted: &PersistedLayout,
    fallback: &DeterministicLayout,
) -> Reconciliation {
    let Some(blob) = persisted.blob() else {
        let mut positions = BTreeMap::new();
        let mut label_anchors = BTreeMap::new();
        for id in live_ids {
            positions.insert(id.clone(), fallback_position(fallback, id));
            if let Some(anchor) = fallback.anchor(id) {
                label_anchors.insert(id.clone(), anchor);
            }
        }
        return Reconciliation {
            positions,
            label_anchors,
            layout_name: fallback.name.clone(),
            source: LayoutSource::Default,
            stats: ReconcileStats {
                applied: 0,
                stale: 0,
                new_nodes: live_ids.len(),
            },
        };
    };

    let mut stats = ReconcileStats {
        stale: blob
            .positions
            .keys()
            .filter(|id| !live_ids.contains(*id))
            .count(),
        ..Default::default()
    };

    let mut positions = BTreeMap::new();
    let mut label_anchors = BTreeMap::new();
    for id in live_ids {
        let restored = blob.positions.get(id).copied().filter(Position::is_finite);
        let pos = match restored {
            Some(pos) => {
                stats.applied += 1;
                pos
            }
            None => {
                stats.new_nodes += 1;
                fallback_position(fallback, id)
            }
        };
        positions.insert(id.clone(), pos);

        if let Some(anchor) = blob
            .label_anchors
            .get(id)
            .copied()
            .or_else(|| fallback.anchor(id))
        {
            label_anchors.insert(id.clone(), anchor);
        }
    }

    let source = persisted.source();
    tracing::info!(
        "Layout reconciled from {}: {} applied, {} stale, {} new",
        source.as_str(),
        stats.applied,
        stats.stale,
        stats.new_nodes
    );

    Reconciliation {
        positions,
        label_anchors,
        layout_name: blob
            .layout_name
            .clone()
            .unwrap_or_else(|| fallback.name.clone()),
        source,
        stats,
    }
}

fn fallback_position(fallback: &DeterministicLayout, id: &str) -> Position {
    match fallback.position(id).filter(Position::is_finite) {
        Some(pos) => pos,
        None => {
            tracing::warn!("No fallback position for live node {}, using origin", id);
            Position::default()
        }
    }
}

// =============================================================================
// EDGE RESOLUTION
// =============================================================================

/// An edge whose endpoints both exist, with their final coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEdge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    pub from: Position,
    pub to: Position,
    pub evidence: Vec<String>,
}

/// Resolve edges against the live node table, dropping half-resolved ones
///
/// Run after positions are final.
pub fn resolve_edges(graph: &Graph) -> Vec<ResolvedEdge> {
    let mut dropped = 0;
    let resolved: Vec<ResolvedEdge> = graph
        .edges()
        .iter()
        .filter_map(|edge| {
            let endpoints = graph.get_node(&edge.source).zip(graph.get_node(&edge.target));
            if endpoints.is_none() {
                dropped += 1;
            }
            let (source, target) = endpoints?;
            Some(ResolvedEdge {
                source: edge.source.clone(),
                target: edge.target.clone(),
                kind: edge.kind,
                from: source.transport_position(),
                to: target.transport_position(),
                evidence: edge.evidence.clone(),
            })
        })
        .collect();

    if dropped > 0 {
        tracing::warn!("Dropped {} edges with missing endpoints", dropped);
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::{GraphEdge, GraphNode, NodeKind};
    use atlas_types::DiagramKind;

    fn ids(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn fallback(list: &[&str]) -> DeterministicLayout {
        let mut layout = DeterministicLayout::new("balanced");
        for (i, id) in list.iter().enumerate() {
            layout.place(id, egui::Pos2::new(i as f32 * 10.0, 5.0), LabelAnchor::Start);
        }
        layout
    }

    #[test]
    fn test_absent_uses_fallback_wholesale() {
        let live = ids(&["a", "b"]);
        let fb = fallback(&["a", "b"]);
        let result = reconcile(&live, &PersistedLayout::Absent, &fb);

        assert_eq!(result.positions, fb.positions);
        assert_eq!(result.label_anchors, fb.label_anchors);
        assert_eq!(result.source, LayoutSource::Default);
        assert_eq!(result.layout_name, "balanced");
        assert_eq!(
            result.stats,
            ReconcileStats {
                applied: 0,
                stale: 0,
                new_nodes: 2
            }
        );
    }

    #[test]
    fn test_saved_blob_partitions_entries() {
        let live = ids(&["a", "b", "c"]);
        let fb = fallback(&["a", "b", "c"]);

        let mut blob = LayoutBlob::default();
        blob.positions.insert("a".into(), Position::new(-3.5, 7.25));
        blob.positions.insert("b".into(), Position::new(f32::NAN, 1.0));
        blob.positions.insert("gone".into(), Position::new(1.0, 1.0));
        blob.label_anchors.insert("a".into(), LabelAnchor::Middle);
        blob.label_anchors.insert("gone".into(), LabelAnchor::End);
        blob.layout_name = Some("sequential".into());

        let result = reconcile(&live, &PersistedLayout::Saved(blob), &fb);

        assert_eq!(result.source, LayoutSource::Saved);
        assert_eq!(result.positions["a"], Position::new(-3.5, 7.25));
        assert_eq!(result.positions["b"], fb.positions["b"]);
        assert_eq!(result.positions["c"], fb.positions["c"]);
        assert!(!result.positions.contains_key("gone"));
        assert!(!result.label_anchors.contains_key("gone"));
        assert_eq!(result.label_anchors["a"], LabelAnchor::Middle);
        assert_eq!(result.label_anchors["b"], LabelAnchor::Start);
        assert_eq!(result.layout_name, "sequential");
        assert_eq!(
            result.stats,
            ReconcileStats {
                applied: 1,
                stale: 1,
                new_nodes: 2
            }
        );
    }

    #[test]
    fn test_attached_blob_keeps_fallback_name_when_unnamed() {
        let live = ids(&["a"]);
        let fb = fallback(&["a"]);
        let mut blob = LayoutBlob::default();
        blob.positions.insert("a".into(), Position::new(1.0, 2.0));

        let result = reconcile(&live, &PersistedLayout::Attached(blob), &fb);
        assert_eq!(result.source, LayoutSource::Attached);
        assert_eq!(result.layout_name, "balanced");
        assert_eq!(result.stats.applied, 1);
    }

    #[test]
    fn test_empty_saved_blob_places_everything_fresh() {
        let live = ids(&["a", "b"]);
        let fb = fallback(&["a", "b"]);
        let result = reconcile(&live, &PersistedLayout::Saved(LayoutBlob::default()), &fb);
        assert_eq!(result.stats.new_nodes, 2);
        assert_eq!(result.stats.applied, 0);
        assert_eq!(result.source, LayoutSource::Saved);
    }

    #[test]
    fn test_resolve_edges_drops_missing_endpoints() {
        let mut graph = Graph::new(DiagramKind::DocumentationMap);
        graph.add_node(GraphNode::new("provider:a", NodeKind::Provider, "A"));
        graph.add_node(GraphNode::new("model:m", NodeKind::Model, "M"));
        graph.add_edge(GraphEdge::new("provider:a", "model:m", EdgeKind::Owns));
        graph.add_edge(GraphEdge::new("evidence:ghost", "model:m", EdgeKind::Documents));

        let edges = resolve_edges(&graph);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source, "provider:a");
        assert_eq!(edges[0].kind, EdgeKind::Owns);
    }
}
