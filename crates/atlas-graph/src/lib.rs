//! Safety Atlas Graph Core
//!
//! This crate contains ONLY the layout core - no storage, no app shell.
//! Persistence and session lifecycle live in the `safety-atlas` crate which
//! owns I/O.

pub mod graph;

pub use graph::{
    build_documentation_map,
    build_unified_chart,
    compute_layout,
    decode_layout,
    encode_layout,
    pack_two_columns,
    reconcile,
    resolve_edges,
    validate_import,
    // Layout
    DeterministicLayout,
    ColumnGroup,
    // Decoding
    DecodedLayout,
    EdgeKind,
    // Simulation
    ForceConfig,
    ForceSimulation,
    // Core graph types
    Graph,
    GraphEdge,
    GraphNode,
    // Interaction
    Interaction,
    InteractionMode,
    InvalidLayout,
    LayoutAlgorithm,
    LayoutConfig,
    NodeKind,
    PersistedLayout,
    // Reconciliation
    Reconciliation,
    ResolvedEdge,
    SpatialIndex,
    SpatialNode,
    ViewTransform,
};
