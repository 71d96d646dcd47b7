//! Interaction state machine
//!
//! ```text
//!            drag_start            drag_end
//!   Idle ───────────────► Dragging ─────────► Idle
//!     │    marquee_start              marquee_end
//!     ├───────────────► MarqueeSelecting ──────► Idle
//!     │    start_force        stop_force / converged
//!     └───────────────► ForceRunning ──────────► Idle
//! ```
//!
//! Modes are mutually exclusive. Starting a drag or marquee while the force
//! simulation runs stops it first; starting the force while it already runs
//! stops and restarts it. Pointer input is in screen coordinates and goes
//! through the `ViewTransform` before touching world positions.

use super::force_sim::{ForceConfig, ForceSimulation};
use super::spatial::SpatialIndex;
use super::types::Graph;
use super::viewport::ViewTransform;
use egui::Pos2;
use std::collections::BTreeSet;

/// An in-progress drag
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    /// Node under the pointer at drag start
    pub anchor: String,
    /// Nodes moving with the pointer (the whole selection if the anchor is in it)
    pub moving: Vec<String>,
    /// Last pointer position in world coordinates
    pub last_world: Pos2,
}

/// An in-progress rectangle selection (screen coordinates)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarqueeState {
    pub start: Pos2,
    pub current: Pos2,
    /// Union with the existing selection instead of replacing it
    pub additive: bool,
}

/// What the pointer (or the physics) is currently doing
#[derive(Debug, Clone, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    Dragging(DragState),
    MarqueeSelecting(MarqueeState),
    ForceRunning(ForceSimulation),
}

impl InteractionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionMode::Idle => "idle",
            InteractionMode::Dragging(_) => "dragging",
            InteractionMode::MarqueeSelecting(_) => "marquee",
            InteractionMode::ForceRunning(_) => "force",
        }
    }
}

/// Per-diagram interaction context: mode, selection, view and dirty flag
#[derive(Debug, Clone)]
pub struct Interaction {
    mode: InteractionMode,
    selection: BTreeSet<String>,
    pub view: ViewTransform,
    dirty: bool,
    /// Pointer slack around a node, in screen pixels
    pub hit_threshold: f32,
}

impl Default for Interaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Interaction {
    pub fn new() -> Self {
        Self {
            mode: InteractionMode::Idle,
            selection: BTreeSet::new(),
            view: ViewTransform::default(),
            dirty: false,
            hit_threshold: 4.0,
        }
    }

    pub fn mode(&self) -> &InteractionMode {
        &self.mode
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.mode, InteractionMode::Idle)
    }

    pub fn is_force_running(&self) -> bool {
        matches!(self.mode, InteractionMode::ForceRunning(_))
    }

    // =========================================================================
    // SELECTION / DIRTY
    // =========================================================================

    pub fn selection(&self) -> &BTreeSet<String> {
        &self.selection
    }

    pub fn set_selection(&mut self, ids: impl IntoIterator<Item = String>) {
        self.selection = ids.into_iter().collect();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Drop selected ids that are no longer in the graph
    pub fn retain_live(&mut self, graph: &Graph) {
        self.selection.retain(|id| graph.contains(id));
    }

    /// Positions changed since the last save
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    // =========================================================================
    // DRAG
    // =========================================================================

    /// Begin dragging the node under the pointer. Returns its id, or None if
    /// the pointer missed or a marquee is in progress.
    pub fn drag_start(&mut self, graph: &mut Graph, screen: Pos2) -> Option<String> {
        if matches!(self.mode, InteractionMode::MarqueeSelecting(_)) {
            return None;
        }
        self.stop_force(graph);

        let world = self.view.screen_to_world(screen);
        let index = SpatialIndex::from_graph(graph, |kind| kind.radius());
        let threshold = self.hit_threshold / self.view.zoom;
        let anchor = index.hit_test([world.x, world.y], threshold)?.id.clone();

        let moving: Vec<String> = if self.selection.contains(&anchor) {
            self.selection
                .iter()
                .filter(|id| graph.contains(id))
                .cloned()
                .collect()
        } else {
            vec![anchor.clone()]
        };

        tracing::debug!("Drag start on {} ({} nodes moving)", anchor, moving.len());
        self.mode = InteractionMode::Dragging(DragState {
            anchor: anchor.clone(),
            moving,
            last_world: world,
        });
        Some(anchor)
    }

    /// Move the dragged nodes with the pointer. Returns true if anything moved.
    pub fn drag_move(&mut self, graph: &mut Graph, screen: Pos2) -> bool {
        let InteractionMode::Dragging(drag) = &mut self.mode else {
            return false;
        };
        let world = self.view.screen_to_world(screen);
        let delta = world - drag.last_world;
        drag.last_world = world;
        if delta == egui::Vec2::ZERO {
            return false;
        }
        for id in &drag.moving {
            if let Some(node) = graph.get_node_mut(id) {
                node.translate(delta);
            }
        }
        self.dirty = true;
        true
    }

    /// Commit the drag at the release point. Does not save.
    pub fn drag_end(&mut self, graph: &mut Graph, screen: Pos2) -> bool {
        if !matches!(self.mode, InteractionMode::Dragging(_)) {
            return false;
        }
        self.drag_move(graph, screen);
        self.mode = InteractionMode::Idle;
        true
    }

    // =========================================================================
    // MARQUEE
    // =========================================================================

    pub fn marquee_start(&mut self, graph: &mut Graph, screen: Pos2, additive: bool) -> bool {
        if matches!(self.mode, InteractionMode::Dragging(_)) {
            return false;
        }
        self.stop_force(graph);
        self.mode = InteractionMode::MarqueeSelecting(MarqueeState {
            start: screen,
            current: screen,
            additive,
        });
        true
    }

    pub fn marquee_move(&mut self, screen: Pos2) {
        if let InteractionMode::MarqueeSelecting(marquee) = &mut self.mode {
            marquee.current = screen;
        }
    }

    /// Finish the marquee and update the selection. Returns the new selection
    /// size, or None if no marquee was active.
    pub fn marquee_end(&mut self, graph: &Graph) -> Option<usize> {
        let InteractionMode::MarqueeSelecting(marquee) = &self.mode else {
            return None;
        };
        let marquee = *marquee;
        self.mode = InteractionMode::Idle;

        let rect = self.view.screen_rect_to_world(marquee.start, marquee.current);
        let index = SpatialIndex::from_graph(graph, |kind| kind.radius());
        let hits: BTreeSet<String> = index
            .query_rect([rect.min.x, rect.min.y], [rect.max.x, rect.max.y])
            .into_iter()
            .map(|n| n.id.clone())
            .collect();

        if marquee.additive {
            self.selection.extend(hits);
        } else {
            self.selection = hits;
        }
        Some(self.selection.len())
    }

    // =========================================================================
    // FORCE
    // =========================================================================

    /// Start the selective force pass. A running pass is stopped and
    /// restarted; an active drag or marquee is abandoned.
    pub fn start_force(&mut self, graph: &mut Graph, config: ForceConfig) {
        self.stop_force(graph);
        self.mode = InteractionMode::ForceRunning(ForceSimulation::start(
            graph,
            &self.selection,
            config,
        ));
        self.dirty = true;
    }

    /// Stop the force pass if one is running (re-pinning every node).
    /// Returns whether one was running.
    pub fn stop_force(&mut self, graph: &mut Graph) -> bool {
        match std::mem::take(&mut self.mode) {
            InteractionMode::ForceRunning(mut sim) => {
                sim.stop(graph);
                true
            }
            other => {
                self.mode = other;
                false
            }
        }
    }

    /// Flip the force pass. Returns whether it is running afterwards.
    pub fn toggle_force(&mut self, graph: &mut Graph, config: ForceConfig) -> bool {
        if self.stop_force(graph) {
            false
        } else {
            self.start_force(graph, config);
            true
        }
    }

    /// Advance the force pass one frame. Returns whether it is still running.
    pub fn tick(&mut self, graph: &mut Graph) -> bool {
        let InteractionMode::ForceRunning(sim) = &mut self.mode else {
            return false;
        };
        let running = sim.tick(graph);
        self.dirty = true;
        if !running {
            self.mode = InteractionMode::Idle;
        }
        running
    }

    /// Abandon whatever is in progress and return to idle
    pub fn cancel(&mut self, graph: &mut Graph) {
        self.stop_force(graph);
        self.mode = InteractionMode::Idle;
    }
}
