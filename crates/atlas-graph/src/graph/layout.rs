//! Deterministic layout dispatch
//!
//! Every algorithm here is a pure function of the graph and `LayoutConfig`.
//! None of them consult persisted positions; their output is the fallback the
//! reconciler uses for nodes with no usable persisted entry.

use super::types::Graph;
use super::{columns, radial};
use atlas_types::{DiagramKind, LabelAnchor, Position};
use egui::{Pos2, Vec2};
use std::collections::BTreeMap;
use std::f32::consts::{FRAC_PI_2, TAU};

// =============================================================================
// CONFIG
// =============================================================================

/// Canvas size (world units)
pub const CANVAS_WIDTH: f32 = 1200.0;
pub const CANVAS_HEIGHT: f32 = 900.0;

/// Radial tiers (provider < model < evidence)
const PROVIDER_RADIUS: f32 = 140.0;
const MODEL_RADIUS: f32 = 280.0;
const EVIDENCE_RADIUS: f32 = 400.0;

/// Column spacing
const CATEGORY_HEADER: f32 = 30.0;
const TECHNIQUE_SPACING: f32 = 22.0;
const GROUP_GAP: f32 = 18.0;

/// Layout configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub width: f32,
    pub height: f32,
    /// Minimum distance between content and the canvas edge
    pub margin: f32,

    // Radial
    pub provider_radius: f32,
    pub model_radius: f32,
    pub evidence_radius: f32,
    /// Share of a provider's angular slice used by its models
    pub model_arc_fraction: f32,
    /// Share of a provider's angular slice used by its evidence
    pub evidence_arc_fraction: f32,
    /// |cos(angle)| below this gets a centered label
    pub anchor_threshold: f32,

    // Balanced columns
    pub category_header: f32,
    pub technique_spacing: f32,
    pub group_gap: f32,
    /// Horizontal offset of techniques from their category, toward the midline
    pub technique_indent: f32,
    pub left_column_x: f32,
    pub right_column_x: f32,
    pub provider_spacing: f32,

    // Sequential columns (fractions of width)
    pub sequential_category_x: f32,
    pub sequential_technique_x: f32,
    pub sequential_provider_x: f32,
    /// Preferred vertical spacing; shrinks when a column would overflow
    pub sequential_spacing: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
            margin: 40.0,
            provider_radius: PROVIDER_RADIUS,
            model_radius: MODEL_RADIUS,
            evidence_radius: EVIDENCE_RADIUS,
            model_arc_fraction: 0.7,
            evidence_arc_fraction: 0.8,
            anchor_threshold: 0.1,
            category_header: CATEGORY_HEADER,
            technique_spacing: TECHNIQUE_SPACING,
            group_gap: GROUP_GAP,
            technique_indent: 24.0,
            left_column_x: 0.22,
            right_column_x: 0.78,
            provider_spacing: 40.0,
            sequential_category_x: 0.15,
            sequential_technique_x: 0.5,
            sequential_provider_x: 0.85,
            sequential_spacing: 26.0,
        }
    }
}

impl LayoutConfig {
    /// Default config on a different canvas. Radii scale with the smaller
    /// dimension so the rings keep fitting.
    pub fn with_canvas(width: f32, height: f32) -> Self {
        let base = Self::default();
        let scale = (width.min(height) / CANVAS_HEIGHT).max(0.1);
        Self {
            width,
            height,
            provider_radius: base.provider_radius * scale,
            model_radius: base.model_radius * scale,
            evidence_radius: base.evidence_radius * scale,
            ..base
        }
    }

    pub fn center(&self) -> Pos2 {
        Pos2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Usable vertical extent between the margins
    pub fn usable_height(&self) -> f32 {
        (self.height - 2.0 * self.margin).max(0.0)
    }
}

// =============================================================================
// ALGORITHMS
// =============================================================================

/// Deterministic layout algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutAlgorithm {
    /// Concentric provider / model / evidence rings
    Radial,
    /// LPT-packed two-column category groups
    Balanced,
    /// Fixed category / technique / provider columns
    Sequential,
}

impl LayoutAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutAlgorithm::Radial => "radial",
            LayoutAlgorithm::Balanced => "balanced",
            LayoutAlgorithm::Sequential => "sequential",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "radial" => Some(LayoutAlgorithm::Radial),
            "balanced" | "lpt" => Some(LayoutAlgorithm::Balanced),
            "sequential" => Some(LayoutAlgorithm::Sequential),
            _ => None,
        }
    }

    /// The algorithm each diagram opens with
    pub fn default_for(kind: DiagramKind) -> Self {
        match kind {
            DiagramKind::DocumentationMap => LayoutAlgorithm::Radial,
            DiagramKind::UnifiedChart => LayoutAlgorithm::Balanced,
        }
    }
}

// =============================================================================
// RESULT
// =============================================================================

/// Output of a deterministic layout pass
///
/// Label anchors are part of the layout: which side a label hangs from
/// depends on where the node landed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeterministicLayout {
    pub name: String,
    pub positions: BTreeMap<String, Position>,
    pub label_anchors: BTreeMap<String, LabelAnchor>,
    /// Polar angles (radial layout only)
    pub angles: BTreeMap<String, f32>,
}

impl DeterministicLayout {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Record a node's position and label anchor
    pub fn place(&mut self, id: &str, pos: Pos2, anchor: LabelAnchor) {
        self.positions
            .insert(id.to_string(), Position::new(pos.x, pos.y));
        self.label_anchors.insert(id.to_string(), anchor);
    }

    pub fn position(&self, id: &str) -> Option<Position> {
        self.positions.get(id).copied()
    }

    pub fn anchor(&self, id: &str) -> Option<LabelAnchor> {
        self.label_anchors.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Compute a full deterministic layout for the graph
///
/// Nodes the chosen algorithm has no rule for (a technique without a
/// category, or model nodes under a column layout) are spread on a ring so
/// that every live node ends up with a finite position.
pub fn compute_layout(
    graph: &Graph,
    algorithm: LayoutAlgorithm,
    config: &LayoutConfig,
) -> DeterministicLayout {
    let mut layout = match algorithm {
        LayoutAlgorithm::Radial => radial::radial_layout(graph, config),
        LayoutAlgorithm::Balanced => columns::balanced_layout(graph, config),
        LayoutAlgorithm::Sequential => columns::sequential_layout(graph, config),
    };

    let filled = fill_missing(graph, &mut layout, config);

    tracing::debug!(
        "{} layout: {} nodes placed ({} on fallback ring)",
        algorithm.as_str(),
        layout.len(),
        filled
    );
    layout
}

/// Place every node the algorithm skipped (or placed at a non-finite point)
/// evenly on a ring inside the canvas. Returns how many were placed.
fn fill_missing(graph: &Graph, layout: &mut DeterministicLayout, config: &LayoutConfig) -> usize {
    let missing: Vec<&str> = graph
        .nodes()
        .iter()
        .filter(|n| layout.position(&n.id).map_or(true, |p| !p.is_finite()))
        .map(|n| n.id.as_str())
        .collect();

    if missing.is_empty() {
        return 0;
    }

    let center = config.center();
    let radius = (config.width.min(config.height) / 2.0 - config.margin).max(0.0);
    let step = TAU / missing.len() as f32;
    for (i, id) in missing.iter().enumerate() {
        let angle = -FRAC_PI_2 + i as f32 * step;
        let pos = center + Vec2::angled(angle) * radius;
        layout.place(
            id,
            pos,
            radial::anchor_for_angle(angle, config.anchor_threshold),
        );
    }
    missing.len()
}
