//! Radial layout for the documentation map
//!
//! Providers sit on the inner ring at equal angular spacing, starting at
//! 12 o'clock and going clockwise (screen y points down). Each provider's
//! models and evidence fan out on the outer rings across a sub-arc of the
//! provider's slice, centered on the provider's angle.
//!
//! ```text
//!                 provider (r = 140)
//!                     │
//!        model  model │ model        (r = 280, 70% of slice)
//!      ev   ev   ev   │   ev   ev    (r = 400, 80% of slice)
//! ```

use super::layout::{DeterministicLayout, LayoutAlgorithm, LayoutConfig};
use super::types::{Graph, GraphNode, NodeKind};
use atlas_types::LabelAnchor;
use egui::{Pos2, Vec2};
use std::collections::{BTreeMap, HashMap};
use std::f32::consts::{FRAC_PI_2, TAU};

/// Compute the radial layout
pub fn radial_layout(graph: &Graph, config: &LayoutConfig) -> DeterministicLayout {
    let mut layout = DeterministicLayout::new(LayoutAlgorithm::Radial.as_str());
    let center = config.center();

    let mut providers: Vec<&GraphNode> = graph.nodes_of_kind(NodeKind::Provider).collect();
    sort_by_label(&mut providers);

    let slice = provider_slice(providers.len());
    let mut provider_angles: HashMap<&str, f32> = HashMap::new();
    for (i, provider) in providers.iter().enumerate() {
        let angle = provider_angle(i, providers.len());
        provider_angles.insert(provider.id.as_str(), angle);
        place_polar(&mut layout, &provider.id, center, config.provider_radius, angle, config);
    }

    place_ring(
        graph,
        &mut layout,
        NodeKind::Model,
        config.model_radius,
        config.model_arc_fraction * slice,
        &provider_angles,
        config,
    );
    place_ring(
        graph,
        &mut layout,
        NodeKind::Evidence,
        config.evidence_radius,
        config.evidence_arc_fraction * slice,
        &provider_angles,
        config,
    );

    layout
}

/// Angular slice owned by each of `count` providers
pub fn provider_slice(count: usize) -> f32 {
    if count == 0 {
        TAU
    } else {
        TAU / count as f32
    }
}

/// Angle of the i-th provider (sorted order) out of `count`
pub fn provider_angle(index: usize, count: usize) -> f32 {
    -FRAC_PI_2 + index as f32 * provider_slice(count)
}

/// Angle of the i-th of `count` children spread over `span` around `parent`
///
/// A lone child sits exactly on the parent's angle.
pub fn child_angle(parent: f32, span: f32, index: usize, count: usize) -> f32 {
    if count <= 1 {
        return parent;
    }
    let step = span / (count - 1) as f32;
    parent - span / 2.0 + index as f32 * step
}

/// Label side from a polar angle: right half hangs text to the right,
/// left half to the left, near-vertical centers it
pub fn anchor_for_angle(angle: f32, threshold: f32) -> LabelAnchor {
    let cos = angle.cos();
    if cos > threshold {
        LabelAnchor::Start
    } else if cos < -threshold {
        LabelAnchor::End
    } else {
        LabelAnchor::Middle
    }
}

fn place_ring(
    graph: &Graph,
    layout: &mut DeterministicLayout,
    kind: NodeKind,
    radius: f32,
    span: f32,
    provider_angles: &HashMap<&str, f32>,
    config: &LayoutConfig,
) {
    let center = config.center();

    // BTreeMap keeps parent iteration order stable
    let mut by_parent: BTreeMap<&str, Vec<&GraphNode>> = BTreeMap::new();
    let mut unparented: Vec<&GraphNode> = Vec::new();
    for node in graph.nodes_of_kind(kind) {
        match node.parent.as_deref() {
            Some(parent) if provider_angles.contains_key(parent) => {
                by_parent.entry(parent).or_default().push(node);
            }
            _ => unparented.push(node),
        }
    }

    for (parent, mut children) in by_parent {
        sort_by_label(&mut children);
        let parent_angle = provider_angles[parent];
        let count = children.len();
        for (j, child) in children.iter().enumerate() {
            let angle = child_angle(parent_angle, span, j, count);
            place_polar(layout, &child.id, center, radius, angle, config);
        }
    }

    if !unparented.is_empty() {
        sort_by_label(&mut unparented);
        let count = unparented.len();
        for (j, node) in unparented.iter().enumerate() {
            place_polar(layout, &node.id, center, radius, provider_angle(j, count), config);
        }
    }
}

fn place_polar(
    layout: &mut DeterministicLayout,
    id: &str,
    center: Pos2,
    radius: f32,
    angle: f32,
    config: &LayoutConfig,
) {
    let pos = center + Vec2::angled(angle) * radius;
    layout.place(id, pos, anchor_for_angle(angle, config.anchor_threshold));
    layout.angles.insert(id.to_string(), angle);
}

fn sort_by_label(nodes: &mut [&GraphNode]) {
    nodes.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.id.cmp(&b.id)));
}
