//! Column layouts for the unified chart
//!
//! # Balanced
//!
//! Category groups (header + all techniques) are packed into two columns
//! with longest-processing-time-first: biggest group first, always into the
//! shorter column. Packing order only balances heights; each column is then
//! re-sorted alphabetically and centered vertically. Providers take the
//! midline.
//!
//! ```text
//!   Category A          Provider 1          Category C
//!        tech ·                              · tech
//!        tech ·         Provider 2           · tech
//!   Category B                              Category D
//!        tech ·         Provider 3           · tech
//! ```
//!
//! # Sequential
//!
//! Three fixed columns (category | technique | provider). Spacing shrinks
//! when a column would not fit between the margins.

use super::layout::{DeterministicLayout, LayoutAlgorithm, LayoutConfig};
use super::types::{Graph, GraphNode, NodeKind};
use atlas_types::LabelAnchor;
use egui::Pos2;
use std::collections::{BTreeMap, HashSet};

// =============================================================================
// LPT PACKING
// =============================================================================

/// A unit of vertical space to pack
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnGroup {
    pub label: String,
    pub height: f32,
}

impl ColumnGroup {
    pub fn new(label: impl Into<String>, height: f32) -> Self {
        Self {
            label: label.into(),
            height,
        }
    }
}

/// Result of packing groups into two columns (indices into the input)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnPacking {
    pub left: Vec<usize>,
    pub right: Vec<usize>,
    pub left_height: f32,
    pub right_height: f32,
}

impl ColumnPacking {
    pub fn imbalance(&self) -> f32 {
        (self.left_height - self.right_height).abs()
    }
}

/// Two-column LPT packing
///
/// Groups are taken in descending height (ties by label) and each goes to the
/// column with less accumulated height, the left one on ties. Each column's
/// indices are returned in alphabetical order. The final imbalance never
/// exceeds the tallest group.
pub fn pack_two_columns(groups: &[ColumnGroup]) -> ColumnPacking {
    let mut order: Vec<usize> = (0..groups.len()).collect();
    order.sort_by(|&a, &b| {
        groups[b]
            .height
            .total_cmp(&groups[a].height)
            .then_with(|| groups[a].label.cmp(&groups[b].label))
    });

    let mut packing = ColumnPacking::default();
    for idx in order {
        let height = groups[idx].height;
        if packing.left_height <= packing.right_height {
            packing.left.push(idx);
            packing.left_height += height;
        } else {
            packing.right.push(idx);
            packing.right_height += height;
        }
    }

    let alphabetical =
        |a: &usize, b: &usize| groups[*a].label.cmp(&groups[*b].label).then_with(|| a.cmp(b));
    packing.left.sort_by(alphabetical);
    packing.right.sort_by(alphabetical);
    packing
}

// =============================================================================
// BALANCED
// =============================================================================

struct CategoryGroup<'a> {
    category: &'a GraphNode,
    techniques: Vec<&'a GraphNode>,
}

/// Categories with their techniques, each list in label order
fn category_groups(graph: &Graph) -> Vec<CategoryGroup<'_>> {
    let mut techniques: BTreeMap<&str, Vec<&GraphNode>> = BTreeMap::new();
    for technique in graph.nodes_of_kind(NodeKind::Technique) {
        if let Some(parent) = technique.parent.as_deref() {
            techniques.entry(parent).or_default().push(technique);
        }
    }

    graph
        .nodes_of_kind(NodeKind::Category)
        .map(|category| {
            let mut members = techniques.remove(category.id.as_str()).unwrap_or_default();
            sort_by_label(&mut members);
            CategoryGroup {
                category,
                techniques: members,
            }
        })
        .collect()
}

/// Compute the balanced two-column layout
pub fn balanced_layout(graph: &Graph, config: &LayoutConfig) -> DeterministicLayout {
    let mut layout = DeterministicLayout::new(LayoutAlgorithm::Balanced.as_str());

    let groups = category_groups(graph);
    let heights: Vec<ColumnGroup> = groups
        .iter()
        .map(|g| {
            ColumnGroup::new(
                &g.category.label,
                config.category_header
                    + g.techniques.len() as f32 * config.technique_spacing
                    + config.group_gap,
            )
        })
        .collect();
    let packing = pack_two_columns(&heights);

    let columns = [
        (&packing.left, packing.left_height, config.left_column_x, 1.0, LabelAnchor::End),
        (&packing.right, packing.right_height, config.right_column_x, -1.0, LabelAnchor::Start),
    ];
    for (members, column_height, x_fraction, indent_sign, anchor) in columns {
        let x = config.width * x_fraction;
        // The trailing gap is not content
        let content = (column_height - config.group_gap).max(0.0);
        let mut y = ((config.height - content) / 2.0).max(config.margin);

        for &idx in members.iter() {
            let group = &groups[idx];
            layout.place(&group.category.id, Pos2::new(x, y), anchor);

            let technique_x = x + indent_sign * config.technique_indent;
            for (j, technique) in group.techniques.iter().enumerate() {
                let ty = y + config.category_header + j as f32 * config.technique_spacing;
                layout.place(&technique.id, Pos2::new(technique_x, ty), anchor);
            }
            y += heights[idx].height;
        }
    }

    place_provider_column(graph, &mut layout, config);

    tracing::debug!(
        "Balanced packing: left {:.0} / right {:.0} ({} groups)",
        packing.left_height,
        packing.right_height,
        groups.len()
    );
    layout
}

fn place_provider_column(graph: &Graph, layout: &mut DeterministicLayout, config: &LayoutConfig) {
    let mut providers: Vec<&GraphNode> = graph.nodes_of_kind(NodeKind::Provider).collect();
    sort_by_label(&mut providers);

    let spacing = fit_spacing(providers.len(), config.provider_spacing, config.usable_height());
    let x = config.width / 2.0;
    for (i, y) in column_ys(providers.len(), spacing, config.height).enumerate() {
        layout.place(&providers[i].id, Pos2::new(x, y), LabelAnchor::Middle);
    }
}

// =============================================================================
// SEQUENTIAL
// =============================================================================

/// Compute the sequential three-column layout
///
/// Techniques are ordered by category (in category label order) and then by
/// label, so each category's techniques stay contiguous.
pub fn sequential_layout(graph: &Graph, config: &LayoutConfig) -> DeterministicLayout {
    let mut layout = DeterministicLayout::new(LayoutAlgorithm::Sequential.as_str());

    let groups = {
        let mut groups = category_groups(graph);
        groups.sort_by(|a, b| {
            a.category
                .label
                .cmp(&b.category.label)
                .then_with(|| a.category.id.cmp(&b.category.id))
        });
        groups
    };

    let categories: Vec<&GraphNode> = groups.iter().map(|g| g.category).collect();
    let mut techniques: Vec<&GraphNode> = groups
        .iter()
        .flat_map(|g| g.techniques.iter().copied())
        .collect();

    // Techniques whose category is not in the graph still get a slot
    let grouped: HashSet<&str> = techniques.iter().map(|t| t.id.as_str()).collect();
    let mut loose: Vec<&GraphNode> = graph
        .nodes_of_kind(NodeKind::Technique)
        .filter(|t| !grouped.contains(t.id.as_str()))
        .collect();
    sort_by_label(&mut loose);
    techniques.extend(loose);

    let mut providers: Vec<&GraphNode> = graph.nodes_of_kind(NodeKind::Provider).collect();
    sort_by_label(&mut providers);

    let columns = [
        (&categories, config.sequential_category_x, LabelAnchor::End),
        (&techniques, config.sequential_technique_x, LabelAnchor::Middle),
        (&providers, config.sequential_provider_x, LabelAnchor::Start),
    ];
    for (nodes, x_fraction, anchor) in columns {
        let spacing = fit_spacing(nodes.len(), config.sequential_spacing, config.usable_height());
        let x = config.width * x_fraction;
        for (node, y) in nodes.iter().zip(column_ys(nodes.len(), spacing, config.height)) {
            layout.place(&node.id, Pos2::new(x, y), anchor);
        }
    }

    layout
}

// =============================================================================
// HELPERS
// =============================================================================

/// Spacing for `count` evenly spaced items: the preferred value, shrunk so
/// the whole run fits in `available`
pub fn fit_spacing(count: usize, preferred: f32, available: f32) -> f32 {
    if count <= 1 {
        return preferred;
    }
    preferred.min(available / (count - 1) as f32)
}

/// Vertically centered y coordinates for `count` items
fn column_ys(count: usize, spacing: f32, height: f32) -> impl Iterator<Item = f32> {
    let extent = count.saturating_sub(1) as f32 * spacing;
    let top = height / 2.0 - extent / 2.0;
    (0..count).map(move |i| top + i as f32 * spacing)
}

fn sort_by_label(nodes: &mut [&GraphNode]) {
    nodes.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.id.cmp(&b.id)));
}
