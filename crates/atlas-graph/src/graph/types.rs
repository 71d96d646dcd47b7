//! Graph types shared by the builders, layouts and the force simulation
//!
//! A `Graph` is rebuilt from scratch every time the dataset or filters
//! change. Identity across rebuilds is carried only by the node id string.

use atlas_types::{DiagramKind, Position};
use egui::{Pos2, Vec2};
use std::collections::{BTreeMap, BTreeSet, HashMap};

// =============================================================================
// NODES
// =============================================================================

/// Node classes across both diagrams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Provider,
    Model,
    Evidence,
    Category,
    Technique,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Provider => "provider",
            NodeKind::Model => "model",
            NodeKind::Evidence => "evidence",
            NodeKind::Category => "category",
            NodeKind::Technique => "technique",
        }
    }

    /// Drawn radius in world units (pointer hit area)
    pub fn radius(&self) -> f32 {
        match self {
            NodeKind::Provider => 12.0,
            NodeKind::Category => 10.0,
            NodeKind::Model => 8.0,
            NodeKind::Technique | NodeKind::Evidence => 6.0,
        }
    }
}

/// A node in a diagram graph
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    /// Content-derived id, e.g. `provider:acme` or `technique-alignment-rlhf`
    pub id: String,

    pub kind: NodeKind,

    /// Display label
    pub label: String,

    /// Grouping parent used by deterministic layouts
    /// (provider for models/evidence, category for techniques)
    pub parent: Option<String>,

    /// Current position, owned by whichever layout stage ran last
    pub position: Pos2,

    /// Model with no documenting evidence, or evidence with no links.
    /// Set once by the builder.
    pub is_orphan: bool,

    /// Pinned x (simulation-owned)
    pub fx: Option<f32>,

    /// Pinned y (simulation-owned)
    pub fy: Option<f32>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, kind: NodeKind, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            parent: None,
            position: Pos2::ZERO,
            is_orphan: false,
            fx: None,
            fy: None,
        }
    }

    /// Builder: set grouping parent
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Builder: mark as orphan
    pub fn with_orphan(mut self, is_orphan: bool) -> Self {
        self.is_orphan = is_orphan;
        self
    }

    /// Builder: set position
    pub fn with_position(mut self, pos: Pos2) -> Self {
        self.position = pos;
        self
    }

    pub fn is_pinned(&self) -> bool {
        self.fx.is_some() && self.fy.is_some()
    }

    /// Hold the node at its current coordinates
    pub fn pin_in_place(&mut self) {
        self.fx = Some(self.position.x);
        self.fy = Some(self.position.y);
    }

    /// Let the simulation move the node
    pub fn release(&mut self) {
        self.fx = None;
        self.fy = None;
    }

    /// Move the node, carrying the pin along if it has one
    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
        if self.is_pinned() {
            self.pin_in_place();
        }
    }

    pub fn set_position(&mut self, pos: Pos2) {
        self.position = pos;
        if self.is_pinned() {
            self.pin_in_place();
        }
    }

    pub fn transport_position(&self) -> Position {
        Position::new(self.position.x, self.position.y)
    }
}

// =============================================================================
// EDGES
// =============================================================================

/// Edge semantics; direction is fixed per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// provider -> model
    Owns,
    /// evidence -> model
    Documents,
    /// category -> technique
    CategoryTechnique,
    /// provider -> technique
    ProviderTechnique,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Owns => "owns",
            EdgeKind::Documents => "documents",
            EdgeKind::CategoryTechnique => "category-technique",
            EdgeKind::ProviderTechnique => "provider-technique",
        }
    }
}

/// A directed edge between two node ids
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    /// Evidence ids backing a provider-technique edge (tooltip content only)
    pub evidence: Vec<String>,
}

impl GraphEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
            evidence: Vec::new(),
        }
    }

    /// Builder: attach backing evidence ids
    pub fn with_evidence(mut self, evidence: Vec<String>) -> Self {
        self.evidence = evidence;
        self
    }
}

// =============================================================================
// GRAPH
// =============================================================================

/// A diagram snapshot: nodes, edges and an id lookup
#[derive(Debug, Clone)]
pub struct Graph {
    pub kind: DiagramKind,
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    node_index: HashMap<String, usize>,
}

impl Graph {
    pub fn new(kind: DiagramKind) -> Self {
        Self {
            kind,
            nodes: Vec::new(),
            edges: Vec::new(),
            node_index: HashMap::new(),
        }
    }

    /// Add a node. Returns false (and keeps the first) on a duplicate id.
    pub fn add_node(&mut self, node: GraphNode) -> bool {
        if self.node_index.contains_key(&node.id) {
            tracing::debug!("Duplicate node id {} ignored", node.id);
            return false;
        }
        self.node_index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    /// Add an edge. Endpoints are not checked here; `resolve_edges` drops
    /// edges whose endpoints are missing.
    pub fn add_edge(&mut self, edge: GraphEdge) {
        self.edges.push(edge);
    }

    pub fn get_node(&self, id: &str) -> Option<&GraphNode> {
        self.node_index.get(id).map(|&idx| &self.nodes[idx])
    }

    pub fn get_node_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
        self.node_index
            .get(id)
            .copied()
            .map(|idx| &mut self.nodes[idx])
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.node_index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [GraphNode] {
        &mut self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The live node id set
    pub fn node_ids(&self) -> BTreeSet<String> {
        self.nodes.iter().map(|n| n.id.clone()).collect()
    }

    /// Nodes of one kind, in insertion order
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }

    /// Snapshot of current coordinates, read at call time
    pub fn positions(&self) -> BTreeMap<String, Position> {
        self.nodes
            .iter()
            .map(|n| (n.id.clone(), n.transport_position()))
            .collect()
    }

    /// Overwrite positions for ids present in both the map and the graph.
    /// Returns how many nodes were moved.
    pub fn apply_positions(&mut self, positions: &BTreeMap<String, Position>) -> usize {
        let mut applied = 0;
        for node in &mut self.nodes {
            if let Some(pos) = positions.get(&node.id) {
                node.set_position(Pos2::new(pos.x, pos.y));
                applied += 1;
            }
        }
        applied
    }

    /// Number of edges that touch a node
    pub fn degree(&self, id: &str) -> usize {
        self.edges
            .iter()
            .filter(|e| e.source == id || e.target == id)
            .count()
    }
}
