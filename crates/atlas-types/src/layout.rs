//! Persisted layout contracts
//!
//! A layout blob is written as one atomic JSON document under a fixed key
//! per diagram:
//!
//! ```json
//! {
//!   "positions": { "<nodeId>": { "x": 10.0, "y": -4.5 } },
//!   "labelAnchors": { "<nodeId>": "start" },
//!   "layoutName": "balanced"
//! }
//! ```
//!
//! The blob carries no schema version. Shape checking lives in the decoder
//! (`atlas_graph::graph::decode`), not here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// POSITIONS
// ============================================================================

/// A node position in world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Both coordinates are finite numbers
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f32, f32)> for Position {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// Which side of the node a label's text hangs from
///
/// Values mirror SVG `text-anchor`: `start` puts text to the right of the
/// node, `end` to the left, `middle` centers it (above or below).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LabelAnchor {
    #[default]
    Start,
    End,
    Middle,
}

impl LabelAnchor {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelAnchor::Start => "start",
            LabelAnchor::End => "end",
            LabelAnchor::Middle => "middle",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "start" => Some(LabelAnchor::Start),
            "end" => Some(LabelAnchor::End),
            "middle" => Some(LabelAnchor::Middle),
            _ => None,
        }
    }
}

// ============================================================================
// LAYOUT BLOB
// ============================================================================

/// The persisted layout envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LayoutBlob {
    pub positions: BTreeMap<String, Position>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub label_anchors: BTreeMap<String, LabelAnchor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_name: Option<String>,
}

impl LayoutBlob {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

// ============================================================================
// DIAGRAMS
// ============================================================================

/// The two node-link diagrams that persist layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiagramKind {
    /// Provider -> model <- evidence, radial
    DocumentationMap,
    /// Provider / category / technique, column layouts
    #[default]
    UnifiedChart,
}

impl DiagramKind {
    /// Fixed storage key for this diagram's layout blob
    pub fn storage_key(&self) -> &'static str {
        match self {
            DiagramKind::DocumentationMap => "documentation-map-layout",
            DiagramKind::UnifiedChart => "unified-chart-layout",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "docmap" | "documentation" | "documentation_map" | "documentation-map" => {
                Some(DiagramKind::DocumentationMap)
            }
            "unified" | "unified_chart" | "unified-chart" => Some(DiagramKind::UnifiedChart),
            _ => None,
        }
    }

    pub fn all() -> &'static [DiagramKind] {
        &[DiagramKind::DocumentationMap, DiagramKind::UnifiedChart]
    }
}

// ============================================================================
// RECONCILIATION OUTCOME
// ============================================================================

/// Where the final layout came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutSource {
    /// Device-local store had a usable blob
    Saved,
    /// The bundled default asset was used
    Attached,
    /// No persisted layout at all; deterministic placement only
    Default,
}

impl LayoutSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutSource::Saved => "saved",
            LayoutSource::Attached => "attached",
            LayoutSource::Default => "default",
        }
    }
}

/// Counters produced by reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileStats {
    /// Live nodes restored from the persisted blob
    pub applied: usize,
    /// Persisted entries whose id is not in the live graph
    pub stale: usize,
    /// Live nodes placed from the deterministic fallback
    pub new_nodes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_uses_camel_case_envelope() {
        let mut blob = LayoutBlob::default();
        blob.positions.insert("a".into(), Position::new(1.5, -2.0));
        blob.label_anchors.insert("a".into(), LabelAnchor::End);
        blob.layout_name = Some("balanced".into());

        let json = serde_json::to_value(&blob).unwrap();
        assert_eq!(json["positions"]["a"]["x"], 1.5);
        assert_eq!(json["labelAnchors"]["a"], "end");
        assert_eq!(json["layoutName"], "balanced");
    }

    #[test]
    fn test_blob_omits_empty_optional_fields() {
        let blob = LayoutBlob::default();
        let json = serde_json::to_string(&blob).unwrap();
        assert_eq!(json, r#"{"positions":{}}"#);
    }

    #[test]
    fn test_label_anchor_parse() {
        assert_eq!(LabelAnchor::parse("middle"), Some(LabelAnchor::Middle));
        assert_eq!(LabelAnchor::parse("left"), None);
        assert_eq!(LabelAnchor::End.as_str(), "end");
    }

    #[test]
    fn test_storage_keys_are_distinct() {
        assert_ne!(
            DiagramKind::DocumentationMap.storage_key(),
            DiagramKind::UnifiedChart.storage_key()
        );
        assert_eq!(DiagramKind::parse("docmap"), Some(DiagramKind::DocumentationMap));
        assert_eq!(DiagramKind::parse("Unified"), Some(DiagramKind::UnifiedChart));
        assert_eq!(DiagramKind::parse("heatmap"), None);
    }

    #[test]
    fn test_position_finiteness() {
        assert!(Position::new(0.0, -1.0).is_finite());
        assert!(!Position::new(f32::NAN, 0.0).is_finite());
        assert!(!Position::new(0.0, f32::INFINITY).is_finite());
    }
}
