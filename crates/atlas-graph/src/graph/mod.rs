//! Diagram Layout Module
//!
//! Builds node-link graphs from the dataset, places them deterministically,
//! merges the result with a persisted layout, and runs the on-demand force
//! pass.
//!
//! # Architecture
//!
//! ```text
//! Dataset (+ FilterSet)
//!        │
//!        ▼
//! builder (build_documentation_map / build_unified_chart)
//!        │
//!        ▼
//! Graph ──► layout (radial / balanced / sequential) ──► DeterministicLayout
//!        │                                                   │
//!        │            PersistedLayout (decode) ──────────────┤
//!        │                                                   ▼
//!        │                                         reconcile ──► Reconciliation
//!        ▼
//! Interaction (drag / marquee / ForceSimulation)
//!        │
//!        └──► SpatialIndex + ViewTransform (hit testing in world space)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let mut graph = build_unified_chart(&dataset, &filters);
//! let fallback = compute_layout(&graph, LayoutAlgorithm::Balanced, &LayoutConfig::default());
//! let result = reconcile(&graph.node_ids(), &persisted, &fallback);
//! graph.apply_positions(&result.positions);
//! ```

pub mod builder;
pub mod columns;
pub mod decode;
pub mod force_sim;
pub mod interaction;
pub mod layout;
pub mod radial;
pub mod reconcile;
pub mod spatial;
pub mod types;
pub mod viewport;

pub use builder::{build_documentation_map, build_unified_chart};
pub use columns::{pack_two_columns, ColumnGroup, ColumnPacking};
pub use decode::{decode_layout, encode_layout, validate_import, DecodedLayout, InvalidLayout};
pub use force_sim::{ForceConfig, ForceSimulation};
pub use interaction::{DragState, Interaction, InteractionMode, MarqueeState};
pub use layout::{compute_layout, DeterministicLayout, LayoutAlgorithm, LayoutConfig};
pub use reconcile::{reconcile, resolve_edges, PersistedLayout, Reconciliation, ResolvedEdge};
pub use spatial::{SpatialIndex, SpatialNode};
pub use types::*;
pub use viewport::ViewTransform;
