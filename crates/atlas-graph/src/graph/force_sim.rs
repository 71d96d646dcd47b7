//! Selective Force Simulation
//!
//! An on-demand physics pass layered on top of deterministic or hand-placed
//! positions. Only the released nodes move; everything else is pinned at its
//! current coordinates and acts as a fixed anchor.
//!
//! Features:
//! - Release the selection, or the whole graph when nothing is selected
//! - Link springs only for edges touching a released node
//! - Kind-dependent link distance/strength, charge and collision radius
//! - Pinned nodes exert no charge
//! - Alpha cooling; convergence (or `stop`) re-pins every node
//!
//! # Usage
//! ```ignore
//! let mut sim = ForceSimulation::start(&mut graph, &selection, ForceConfig::default());
//!
//! // Each animation frame:
//! if !sim.tick(&mut graph) {
//!     // converged; every node is pinned again
//! }
//! ```
//!
//! The simulation holds node slots, not ids, so the graph must not be
//! rebuilt while it runs. A size mismatch stops it.

use super::spatial::SpatialIndex;
use super::types::{EdgeKind, Graph, NodeKind};
use egui::{Pos2, Vec2};
use std::collections::{BTreeSet, HashMap};

// =============================================================================
// CONFIG
// =============================================================================

/// Alpha decay that takes alpha from 1.0 to `alpha_min` in ~300 ticks
pub const DEFAULT_ALPHA_DECAY: f32 = 0.0228;

/// Configuration for the force simulation
#[derive(Debug, Clone, PartialEq)]
pub struct ForceConfig {
    /// Starting "temperature"
    pub alpha: f32,
    /// Convergence threshold
    pub alpha_min: f32,
    pub alpha_decay: f32,
    pub alpha_target: f32,
    /// Fraction of velocity lost per tick
    pub velocity_decay: f32,
    /// Charge is ignored beyond this distance
    pub charge_distance_max: f32,
    /// Distance floor for charge (prevents blow-ups on near-coincident nodes)
    pub charge_distance_min: f32,
    pub collision_strength: f32,
    /// Hard cap on ticks for headless runs
    pub max_ticks: usize,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            alpha_min: 0.001,
            alpha_decay: DEFAULT_ALPHA_DECAY,
            alpha_target: 0.0,
            velocity_decay: 0.4,
            charge_distance_max: 400.0,
            charge_distance_min: 1.0,
            collision_strength: 0.7,
            max_ticks: 1000,
        }
    }
}

impl ForceConfig {
    /// Target length of a link
    ///
    /// Provider associations may stretch; category/technique stays tight.
    pub fn link_distance(&self, kind: EdgeKind) -> f32 {
        match kind {
            EdgeKind::ProviderTechnique => 160.0,
            EdgeKind::CategoryTechnique => 60.0,
            EdgeKind::Owns => 80.0,
            EdgeKind::Documents => 100.0,
        }
    }

    pub fn link_strength(&self, kind: EdgeKind) -> f32 {
        match kind {
            EdgeKind::ProviderTechnique => 0.05,
            EdgeKind::CategoryTechnique => 0.6,
            EdgeKind::Owns => 0.5,
            EdgeKind::Documents => 0.3,
        }
    }

    /// Many-body strength (negative repels)
    pub fn charge(&self, kind: NodeKind) -> f32 {
        match kind {
            NodeKind::Provider => -300.0,
            NodeKind::Category => -200.0,
            NodeKind::Model | NodeKind::Technique => -120.0,
            NodeKind::Evidence => -80.0,
        }
    }

    pub fn collision_radius(&self, kind: NodeKind) -> f32 {
        match kind {
            NodeKind::Provider => 28.0,
            NodeKind::Category => 22.0,
            NodeKind::Model => 16.0,
            NodeKind::Technique => 14.0,
            NodeKind::Evidence => 10.0,
        }
    }

    fn max_collision_radius(&self) -> f32 {
        28.0
    }
}

// =============================================================================
// SIMULATION
// =============================================================================

#[derive(Debug, Clone)]
struct SimLink {
    source: usize,
    target: usize,
    distance: f32,
    strength: f32,
    /// Share of the correction applied to the target
    bias: f32,
}

/// A running (or stopped) selective force pass over one graph
#[derive(Debug, Clone)]
pub struct ForceSimulation {
    pub config: ForceConfig,
    alpha: f32,
    running: bool,
    released: BTreeSet<String>,
    links: Vec<SimLink>,
    velocities: Vec<Vec2>,
    ticks: usize,
    jiggle_state: u32,
}

impl ForceSimulation {
    /// Release the selection (or every node if the selection is empty, or
    /// names no live node) and pin the rest where they stand
    pub fn start(graph: &mut Graph, selection: &BTreeSet<String>, config: ForceConfig) -> Self {
        let live_selection: BTreeSet<String> = selection
            .iter()
            .filter(|id| graph.contains(id))
            .cloned()
            .collect();
        let release_all = live_selection.is_empty();

        let mut released = BTreeSet::new();
        for node in graph.nodes_mut() {
            if release_all || live_selection.contains(&node.id) {
                node.release();
                released.insert(node.id.clone());
            } else {
                node.pin_in_place();
            }
        }

        let links = build_links(graph, &released, &config);

        tracing::info!(
            "Force simulation started: {} released, {} pinned, {} active links",
            released.len(),
            graph.len() - released.len(),
            links.len()
        );

        Self {
            alpha: config.alpha,
            config,
            running: !graph.is_empty(),
            released,
            links,
            velocities: vec![Vec2::ZERO; graph.len()],
            ticks: 0,
            jiggle_state: 0x9E37_79B9,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Ids the simulation is allowed to move
    pub fn released(&self) -> &BTreeSet<String> {
        &self.released
    }

    /// Number of links fed to the spring force
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Advance one step. Returns false once the simulation is stopped.
    pub fn tick(&mut self, graph: &mut Graph) -> bool {
        if !self.running {
            return false;
        }
        if graph.len() != self.velocities.len() {
            tracing::warn!("Graph changed under a running force simulation, stopping");
            self.stop(graph);
            return false;
        }

        self.alpha += (self.config.alpha_target - self.alpha) * self.config.alpha_decay;

        let positions: Vec<Pos2> = graph.nodes().iter().map(|n| n.position).collect();
        let pinned: Vec<bool> = graph.nodes().iter().map(|n| n.is_pinned()).collect();
        let kinds: Vec<NodeKind> = graph.nodes().iter().map(|n| n.kind).collect();

        self.apply_links(&positions, &pinned);
        self.apply_charge_and_collision(graph, &positions, &pinned, &kinds);

        let retain = 1.0 - self.config.velocity_decay;
        for (i, node) in graph.nodes_mut().iter_mut().enumerate() {
            if pinned[i] {
                if let (Some(fx), Some(fy)) = (node.fx, node.fy) {
                    node.position = Pos2::new(fx, fy);
                }
                self.velocities[i] = Vec2::ZERO;
                continue;
            }
            let mut v = self.velocities[i] * retain;
            if !v.x.is_finite() || !v.y.is_finite() {
                v = Vec2::ZERO;
            }
            self.velocities[i] = v;
            node.position += v;
        }

        self.ticks += 1;
        if self.alpha < self.config.alpha_min || self.ticks >= self.config.max_ticks {
            tracing::debug!("Force simulation converged after {} ticks", self.ticks);
            self.stop(graph);
            return false;
        }
        true
    }

    /// Tick until convergence. Returns the number of ticks run.
    pub fn run_to_convergence(&mut self, graph: &mut Graph) -> usize {
        while self.tick(graph) {}
        self.ticks
    }

    /// Stop and re-pin every node at its final coordinates. Calling it again
    /// is harmless.
    pub fn stop(&mut self, graph: &mut Graph) {
        let was_running = self.running;
        self.running = false;
        for node in graph.nodes_mut() {
            node.pin_in_place();
        }
        self.velocities.iter_mut().for_each(|v| *v = Vec2::ZERO);
        if was_running {
            tracing::info!("Force simulation stopped after {} ticks", self.ticks);
        }
    }

    // =========================================================================
    // FORCES
    // =========================================================================

    fn apply_links(&mut self, positions: &[Pos2], pinned: &[bool]) {
        for i in 0..self.links.len() {
            let link = self.links[i].clone();
            let (s, t) = (link.source, link.target);

            let mut delta = (positions[t] + self.velocities[t]) - (positions[s] + self.velocities[s]);
            if delta.x == 0.0 {
                delta.x = self.jiggle();
            }
            if delta.y == 0.0 {
                delta.y = self.jiggle();
            }
            let len = delta.length();
            let scale = (len - link.distance) / len * self.alpha * link.strength;
            let correction = delta * scale;

            // A pinned endpoint does not absorb any of the correction
            let (to_target, to_source) = match (pinned[s], pinned[t]) {
                (false, false) => (link.bias, 1.0 - link.bias),
                (true, false) => (1.0, 0.0),
                (false, true) => (0.0, 1.0),
                (true, true) => (0.0, 0.0),
            };
            self.velocities[t] -= correction * to_target;
            self.velocities[s] += correction * to_source;
        }
    }

    fn apply_charge_and_collision(
        &mut self,
        graph: &Graph,
        positions: &[Pos2],
        pinned: &[bool],
        kinds: &[NodeKind],
    ) {
        let config = self.config.clone();
        let index = SpatialIndex::from_graph(graph, |kind| config.collision_radius(kind));
        let min2 = config.charge_distance_min * config.charge_distance_min;

        for i in 0..positions.len() {
            if pinned[i] {
                continue;
            }
            let here = [positions[i].x, positions[i].y];

            // Charge from free neighbours within range
            for other in index.query_radius(here, config.charge_distance_max) {
                let j = other.slot;
                if j == i || pinned[j] {
                    continue;
                }
                let mut delta = positions[j] - positions[i];
                if delta.x == 0.0 {
                    delta.x = self.jiggle();
                }
                if delta.y == 0.0 {
                    delta.y = self.jiggle();
                }
                let l2 = delta.length_sq().max(min2);
                self.velocities[i] += delta * (config.charge(kinds[j]) * self.alpha / l2);
            }

            // Collision: push i out of anything it overlaps
            let ri = config.collision_radius(kinds[i]);
            for other in index.query_radius(here, ri + config.max_collision_radius()) {
                let j = other.slot;
                if j == i {
                    continue;
                }
                let rj = config.collision_radius(kinds[j]);
                let reach = ri + rj;
                let mut delta = positions[i] - positions[j];
                if delta.x == 0.0 {
                    delta.x = self.jiggle();
                }
                if delta.y == 0.0 {
                    delta.y = self.jiggle();
                }
                let len = delta.length();
                if len >= reach {
                    continue;
                }
                // Split the push by radius when both are free
                let share = if pinned[j] {
                    1.0
                } else {
                    rj * rj / (ri * ri + rj * rj)
                };
                let push = (reach - len) / len * config.collision_strength * share;
                self.velocities[i] += delta * push;
            }
        }
    }

    /// Tiny deterministic offset for coincident nodes
    fn jiggle(&mut self) -> f32 {
        self.jiggle_state = self
            .jiggle_state
            .wrapping_mul(1_664_525)
            .wrapping_add(1_013_904_223);
        ((self.jiggle_state >> 8) as f32 / (1u32 << 24) as f32 - 0.5) * 1e-6
    }
}

/// Links with at least one released endpoint, with d3-style degree bias
fn build_links(graph: &Graph, released: &BTreeSet<String>, config: &ForceConfig) -> Vec<SimLink> {
    let active: Vec<(usize, usize, EdgeKind)> = graph
        .edges()
        .iter()
        .filter(|e| released.contains(&e.source) || released.contains(&e.target))
        .filter_map(|e| Some((graph.index_of(&e.source)?, graph.index_of(&e.target)?, e.kind)))
        .filter(|(s, t, _)| s != t)
        .collect();

    let mut degree: HashMap<usize, usize> = HashMap::new();
    for (s, t, _) in &active {
        *degree.entry(*s).or_default() += 1;
        *degree.entry(*t).or_default() += 1;
    }

    active
        .into_iter()
        .map(|(source, target, kind)| {
            let ds = degree[&source] as f32;
            let dt = degree[&target] as f32;
            SimLink {
                source,
                target,
                distance: config.link_distance(kind),
                strength: config.link_strength(kind),
                bias: ds / (ds + dt),
            }
        })
        .collect()
}
