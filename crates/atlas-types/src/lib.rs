//! Shared Data Contracts for the Safety Atlas
//!
//! This crate is the single source of truth for every type that crosses a
//! persistence or file boundary.
//!
//! ## Boundaries
//!
//! ```text
//! ┌──────────────────┐         ┌──────────────────┐
//! │  Dataset JSON    │ ──────► │  atlas-graph     │
//! └──────────────────┘         │  (pure layout)   │
//!                              └────────┬─────────┘
//! ┌──────────────────┐  JSON            │
//! │  Layout store /  │ ◄────────────────┘
//! │  export files    │
//! └──────────────────┘
//! ```
//!
//! ## Rules
//!
//! 1. Pure data - no behavior beyond small helpers, no geometry crate
//! 2. Positions travel as `(f32, f32)` pairs, not geometry types
//! 3. String IDs everywhere

pub mod dataset;
pub mod layout;

pub use dataset::*;
pub use layout::*;
