//! Safety Atlas - layout persistence for the evidence diagrams
//!
//! Two diagrams (the documentation map and the unified chart) are laid out
//! deterministically, hand-tuned by dragging or a selective force pass, and
//! persisted per device. On the next open the saved layout is reconciled
//! against whatever the dataset now contains.
//!
//! ## Flow
//! Dataset -> Graph -> Deterministic layout -> Store load -> Reconcile ->
//! Interaction -> Save
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use safety_atlas::{AtlasConfig, DiagramSession, FileStorage, LayoutStore};
//! use safety_atlas::atlas_types::{Dataset, DiagramKind, FilterSet};
//!
//! let config = AtlasConfig::from_env().unwrap();
//! let store = LayoutStore::new(FileStorage::new(&config.store_dir));
//! let mut session = DiagramSession::open(
//!     DiagramKind::UnifiedChart,
//!     Dataset::default(),
//!     FilterSet::default(),
//!     &config,
//!     &store,
//!     0.0,
//! );
//! session.auto_layout();
//! assert!(session.save(&store, 0.0));
//! ```

// Error types for storage, import, export and configuration
pub mod error;

// Environment configuration
pub mod config;

// Device-local layout storage
pub mod store;

// Export / import files
pub mod export;

// Status line (transient messages)
pub mod status;

// Per-diagram session: the interaction context
pub mod session;

pub use config::AtlasConfig;
pub use error::{ConfigError, ExportError, ImportError, StoreError};
pub use session::DiagramSession;
pub use status::{StatusKind, StatusLine, StatusMessage};
pub use store::{FileStorage, LayoutStorage, LayoutStore, LoadOutcome, MemoryStorage};

pub use atlas_graph;
pub use atlas_types;
