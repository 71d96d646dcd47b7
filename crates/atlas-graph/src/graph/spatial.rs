//! Spatial index over node positions (world coordinates)
//!
//! R-tree (via `rstar`) backing pointer hit tests, marquee selection and the
//! neighbourhood queries of the force simulation's charge and collision
//! passes. Rebuilt from the graph whenever positions change; a few hundred
//! nodes bulk-load in well under a frame.

use super::types::{Graph, NodeKind};
use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// Index entry for one graph node
#[derive(Debug, Clone)]
pub struct SpatialNode {
    pub id: String,
    /// Index of the node in `Graph::nodes()`
    pub slot: usize,
    pub kind: NodeKind,
    pub center: [f32; 2],
    pub radius: f32,
    bounds: AABB<[f32; 2]>,
}

impl SpatialNode {
    pub fn new(id: impl Into<String>, slot: usize, kind: NodeKind, center: [f32; 2], radius: f32) -> Self {
        let bounds = AABB::from_corners(
            [center[0] - radius, center[1] - radius],
            [center[0] + radius, center[1] + radius],
        );
        Self {
            id: id.into(),
            slot,
            kind,
            center,
            radius,
            bounds,
        }
    }

    /// Distance from a point to the node's rim (0 inside)
    fn distance_to_edge(&self, point: [f32; 2]) -> f32 {
        let dx = point[0] - self.center[0];
        let dy = point[1] - self.center[1];
        ((dx * dx + dy * dy).sqrt() - self.radius).max(0.0)
    }
}

impl RTreeObject for SpatialNode {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.bounds
    }
}

impl PointDistance for SpatialNode {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let d = self.distance_to_edge(*point);
        d * d
    }

    fn contains_point(&self, point: &[f32; 2]) -> bool {
        let dx = point[0] - self.center[0];
        let dy = point[1] - self.center[1];
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

/// R-tree over the graph's nodes
#[derive(Clone, Default)]
pub struct SpatialIndex {
    tree: RTree<SpatialNode>,
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("count", &self.tree.size())
            .finish_non_exhaustive()
    }
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: impl IntoIterator<Item = SpatialNode>) -> Self {
        Self {
            tree: RTree::bulk_load(nodes.into_iter().collect()),
        }
    }

    /// Index every node at its current position, sized by `radius_of`
    pub fn from_graph(graph: &Graph, radius_of: impl Fn(NodeKind) -> f32) -> Self {
        Self::from_nodes(graph.nodes().iter().enumerate().map(|(slot, node)| {
            SpatialNode::new(
                &node.id,
                slot,
                node.kind,
                [node.position.x, node.position.y],
                radius_of(node.kind),
            )
        }))
    }

    /// Closest node whose rim is within `threshold` of the point
    pub fn hit_test(&self, point: [f32; 2], threshold: f32) -> Option<&SpatialNode> {
        let search = AABB::from_corners(
            [point[0] - threshold, point[1] - threshold],
            [point[0] + threshold, point[1] + threshold],
        );
        self.tree
            .locate_in_envelope_intersecting(&search)
            .map(|node| (node, node.distance_to_edge(point)))
            .filter(|(_, d)| *d <= threshold)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(node, _)| node)
    }

    /// Nodes whose center lies inside the rectangle (corners in any order)
    pub fn query_rect(&self, a: [f32; 2], b: [f32; 2]) -> Vec<&SpatialNode> {
        let min = [a[0].min(b[0]), a[1].min(b[1])];
        let max = [a[0].max(b[0]), a[1].max(b[1])];
        let search = AABB::from_corners(min, max);
        self.tree
            .locate_in_envelope_intersecting(&search)
            .filter(|n| {
                n.center[0] >= min[0]
                    && n.center[0] <= max[0]
                    && n.center[1] >= min[1]
                    && n.center[1] <= max[1]
            })
            .collect()
    }

    /// Nodes whose center lies within `radius` of the point
    pub fn query_radius(&self, center: [f32; 2], radius: f32) -> Vec<&SpatialNode> {
        let search = AABB::from_corners(
            [center[0] - radius, center[1] - radius],
            [center[0] + radius, center[1] + radius],
        );
        let r2 = radius * radius;
        self.tree
            .locate_in_envelope_intersecting(&search)
            .filter(|n| {
                let dx = n.center[0] - center[0];
                let dy = n.center[1] - center[1];
                dx * dx + dy * dy <= r2
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, slot: usize, x: f32, y: f32) -> SpatialNode {
        SpatialNode::new(id, slot, NodeKind::Technique, [x, y], 5.0)
    }

    #[test]
    fn test_empty_index() {
        let index = SpatialIndex::new();
        assert!(index.is_empty());
        assert!(index.hit_test([0.0, 0.0], 10.0).is_none());
        assert!(index.query_rect([0.0, 0.0], [10.0, 10.0]).is_empty());
    }

    #[test]
    fn test_hit_test_prefers_closest() {
        let index = SpatialIndex::from_nodes(vec![
            node("a", 0, 0.0, 0.0),
            node("b", 1, 50.0, 0.0),
            node("c", 2, 100.0, 0.0),
        ]);
        let hit = index.hit_test([48.0, 0.0], 15.0).unwrap();
        assert_eq!(hit.id, "b");
        assert_eq!(hit.slot, 1);
        assert!(index.hit_test([25.0, 40.0], 5.0).is_none());
    }

    #[test]
    fn test_rect_query_uses_centers_and_any_corner_order() {
        let index = SpatialIndex::from_nodes(vec![
            node("a", 0, 10.0, 10.0),
            node("b", 1, 50.0, 10.0),
            node("c", 2, 10.0, 50.0),
            // Bounds overlap the rect but the center does not
            node("edge", 3, 33.0, 10.0),
        ]);
        let mut ids: Vec<_> = index
            .query_rect([30.0, 30.0], [0.0, 0.0])
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn test_radius_query() {
        let index = SpatialIndex::from_nodes(vec![
            node("a", 0, 0.0, 0.0),
            node("b", 1, 20.0, 0.0),
            node("c", 2, 100.0, 0.0),
        ]);
        assert_eq!(index.query_radius([10.0, 0.0], 15.0).len(), 2);
        assert_eq!(index.query_radius([100.0, 0.0], 1.0).len(), 1);
    }

    #[test]
    fn test_from_graph_records_slots() {
        use crate::graph::types::GraphNode;
        use atlas_types::DiagramKind;
        use egui::Pos2;

        let mut graph = Graph::new(DiagramKind::UnifiedChart);
        graph.add_node(GraphNode::new("p", NodeKind::Provider, "P").with_position(Pos2::new(0.0, 0.0)));
        graph.add_node(GraphNode::new("t", NodeKind::Technique, "T").with_position(Pos2::new(40.0, 0.0)));

        let index = SpatialIndex::from_graph(&graph, |kind| match kind {
            NodeKind::Provider => 20.0,
            _ => 5.0,
        });
        assert_eq!(index.len(), 2);
        let hit = index.hit_test([18.0, 0.0], 1.0).unwrap();
        assert_eq!(hit.id, "p");
        assert_eq!(hit.slot, 0);
    }
}
