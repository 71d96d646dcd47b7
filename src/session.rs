//! DiagramSession - one open diagram and everything it owns
//!
//! ```text
//! open ──► build graph ──► deterministic layout ──► store.load ──► reconcile
//!                                                                    │
//!          ┌─────────────────────────────────────────────────────────┘
//!          ▼
//!   graph positions  ◄── drag / marquee / force / relayout / import
//!          │
//!          └──► save (positions read at call time) ──► LayoutStore
//! ```
//!
//! The session is the explicit context the interaction handlers thread
//! through: selection, running simulation and dirty flag live here, never in
//! globals. Storage and import failures become status messages; nothing
//! fallible escapes.

use crate::config::AtlasConfig;
use crate::export::{read_import, write_export};
use crate::status::{StatusLine, StatusMessage};
use crate::store::LayoutStore;
use atlas_graph::{
    build_documentation_map, build_unified_chart, compute_layout, encode_layout, reconcile,
    resolve_edges, validate_import, DeterministicLayout, ForceConfig, Graph, Interaction,
    InteractionMode, LayoutAlgorithm, LayoutConfig, PersistedLayout, Reconciliation, ResolvedEdge,
    ViewTransform,
};
use atlas_types::{
    Dataset, DiagramKind, FilterSet, LabelAnchor, LayoutBlob, LayoutSource, ReconcileStats,
};
use chrono::{DateTime, Utc};
use egui::Pos2;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// An open diagram
#[derive(Debug)]
pub struct DiagramSession {
    kind: DiagramKind,
    dataset: Dataset,
    filters: FilterSet,
    layout_config: LayoutConfig,
    force_config: ForceConfig,
    graph: Graph,
    algorithm: LayoutAlgorithm,
    layout_name: String,
    label_anchors: BTreeMap<String, LabelAnchor>,
    interaction: Interaction,
    source: LayoutSource,
    stats: ReconcileStats,
    status: StatusLine,
}

impl DiagramSession {
    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Build the graph and restore the best available layout. `now` is the
    /// caller's clock, used for any status posted while opening.
    pub fn open(
        kind: DiagramKind,
        dataset: Dataset,
        filters: FilterSet,
        config: &AtlasConfig,
        store: &LayoutStore,
        now: f64,
    ) -> Self {
        let layout_config = config.layout_config();
        let graph = build_graph(kind, &dataset, &filters);
        let loaded = store.load(kind);

        // New nodes are placed by the algorithm the persisted layout was made with
        let algorithm = loaded
            .layout
            .blob()
            .and_then(|blob| blob.layout_name.as_deref())
            .and_then(LayoutAlgorithm::parse)
            .unwrap_or_else(|| LayoutAlgorithm::default_for(kind));
        let fallback = compute_layout(&graph, algorithm, &layout_config);
        let result = reconcile(&graph.node_ids(), &loaded.layout, &fallback);

        let mut session = Self {
            kind,
            dataset,
            filters,
            layout_config,
            force_config: ForceConfig::default(),
            graph,
            algorithm,
            layout_name: String::new(),
            label_anchors: BTreeMap::new(),
            interaction: Interaction::new(),
            source: result.source,
            stats: result.stats,
            status: StatusLine::new(config.status_ttl_secs),
        };
        session.apply_reconciliation(&result);

        if let Some(e) = &loaded.read_error {
            session
                .status
                .error(format!("Could not read saved layout: {}", e), now);
        } else if result.stats.stale > 0 {
            session.status.info(
                format!(
                    "Layout restored; {} stale entries removed",
                    result.stats.stale
                ),
                now,
            );
        }
        tracing::info!(
            "Opened {} ({} nodes, {} edges, layout from {})",
            kind.storage_key(),
            session.graph.len(),
            session.graph.edges().len(),
            session.source.as_str()
        );
        session
    }

    /// Rebuild the unified chart under new filters. Surviving nodes keep
    /// their current positions; new ones get deterministic placement.
    pub fn apply_filters(&mut self, filters: FilterSet) -> bool {
        if self.kind != DiagramKind::UnifiedChart {
            return false;
        }
        self.interaction.cancel(&mut self.graph);

        let live = LayoutBlob {
            positions: self.graph.positions(),
            label_anchors: self.label_anchors.clone(),
            layout_name: Some(self.layout_name.clone()),
        };
        self.filters = filters;
        self.graph = build_graph(self.kind, &self.dataset, &self.filters);

        let fallback = compute_layout(&self.graph, self.algorithm, &self.layout_config);
        let result = reconcile(&self.graph.node_ids(), &PersistedLayout::Saved(live), &fallback);
        self.apply_reconciliation(&result);
        self.interaction.retain_live(&self.graph);

        tracing::debug!(
            "Filters applied: {} kept, {} new, {} gone",
            result.stats.applied,
            result.stats.new_nodes,
            result.stats.stale
        );
        true
    }

    fn apply_reconciliation(&mut self, result: &Reconciliation) {
        self.graph.apply_positions(&result.positions);
        self.label_anchors = result.label_anchors.clone();
        self.layout_name = result.layout_name.clone();
        if let Some(algorithm) = LayoutAlgorithm::parse(&self.layout_name) {
            self.algorithm = algorithm;
        }
    }

    // =========================================================================
    // DETERMINISTIC RELAYOUT
    // =========================================================================

    /// The diagram's own default arrangement (radial or balanced)
    pub fn auto_layout(&mut self) {
        self.relayout(LayoutAlgorithm::default_for(self.kind));
    }

    pub fn balanced_layout(&mut self) {
        self.relayout(LayoutAlgorithm::Balanced);
    }

    pub fn sequential_layout(&mut self) {
        self.relayout(LayoutAlgorithm::Sequential);
    }

    /// Back to the deterministic default, dropping the selection
    pub fn reset_layout(&mut self) {
        self.interaction.clear_selection();
        self.relayout(LayoutAlgorithm::default_for(self.kind));
    }

    /// Overwrite every position and anchor. Any running simulation is
    /// stopped first.
    pub fn relayout(&mut self, algorithm: LayoutAlgorithm) {
        self.interaction.cancel(&mut self.graph);

        let layout = compute_layout(&self.graph, algorithm, &self.layout_config);
        self.graph.apply_positions(&layout.positions);
        self.label_anchors = layout.label_anchors;
        self.layout_name = layout.name;
        self.algorithm = algorithm;
        self.interaction.mark_dirty();
        tracing::info!("Applied {} layout to {}", algorithm.as_str(), self.kind.storage_key());
    }

    // =========================================================================
    // FORCE
    // =========================================================================

    pub fn start_force(&mut self) {
        self.interaction
            .start_force(&mut self.graph, self.force_config.clone());
    }

    pub fn stop_force(&mut self) -> bool {
        self.interaction.stop_force(&mut self.graph)
    }

    pub fn toggle_force(&mut self) -> bool {
        self.interaction
            .toggle_force(&mut self.graph, self.force_config.clone())
    }

    /// Animation-frame callback. Returns whether the simulation is still
    /// running.
    pub fn tick(&mut self, now: f64) -> bool {
        if !self.interaction.is_force_running() {
            return false;
        }
        let running = self.interaction.tick(&mut self.graph);
        if !running {
            self.status.info("Force layout settled", now);
        }
        running
    }

    /// Tick until the simulation converges or stops. Returns ticks run.
    pub fn run_force_to_convergence(&mut self, now: f64) -> usize {
        let mut ticks = 0;
        while self.tick(now) {
            ticks += 1;
        }
        ticks
    }

    pub fn set_force_config(&mut self, config: ForceConfig) {
        self.force_config = config;
    }

    // =========================================================================
    // POINTER
    // =========================================================================

    pub fn drag_start(&mut self, screen: Pos2) -> Option<String> {
        self.interaction.drag_start(&mut self.graph, screen)
    }

    pub fn drag_move(&mut self, screen: Pos2) -> bool {
        self.interaction.drag_move(&mut self.graph, screen)
    }

    pub fn drag_end(&mut self, screen: Pos2) -> bool {
        self.interaction.drag_end(&mut self.graph, screen)
    }

    pub fn marquee_start(&mut self, screen: Pos2, additive: bool) -> bool {
        self.interaction
            .marquee_start(&mut self.graph, screen, additive)
    }

    pub fn marquee_move(&mut self, screen: Pos2) {
        self.interaction.marquee_move(screen);
    }

    pub fn marquee_end(&mut self) -> Option<usize> {
        self.interaction.marquee_end(&self.graph)
    }

    /// Select live ids directly; unknown ids are ignored
    pub fn select(&mut self, ids: impl IntoIterator<Item = String>) {
        let live: Vec<String> = ids
            .into_iter()
            .filter(|id| self.graph.contains(id))
            .collect();
        self.interaction.set_selection(live);
    }

    pub fn clear_selection(&mut self) {
        self.interaction.clear_selection();
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    /// Snapshot of the layout as it stands right now
    pub fn current_blob(&self) -> LayoutBlob {
        LayoutBlob {
            positions: self.graph.positions(),
            label_anchors: self
                .label_anchors
                .iter()
                .filter(|(id, _)| self.graph.contains(id))
                .map(|(id, anchor)| (id.clone(), *anchor))
                .collect(),
            layout_name: Some(self.layout_name.clone()),
        }
    }

    /// Persist the current positions. Returns whether it succeeded; the
    /// outcome is also posted to the status line.
    pub fn save(&mut self, store: &LayoutStore, now: f64) -> bool {
        let blob = self.current_blob();
        match store.save(self.kind, &blob) {
            Ok(()) => {
                self.interaction.mark_clean();
                self.source = LayoutSource::Saved;
                self.status
                    .success(format!("Layout saved ({} nodes)", blob.len()), now);
                true
            }
            Err(e) => {
                tracing::warn!("Saving {} failed: {}", self.kind.storage_key(), e);
                self.status.error(format!("Could not save layout: {}", e), now);
                false
            }
        }
    }

    /// Current layout as pretty JSON
    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        encode_layout(&self.current_blob())
    }

    /// Write a timestamped export file into `dir`
    pub fn export_to_dir(&mut self, dir: &Path, at: DateTime<Utc>, now: f64) -> Option<PathBuf> {
        match write_export(dir, self.kind, &self.current_blob(), at) {
            Ok(path) => {
                self.status
                    .success(format!("Exported to {}", path.display()), now);
                Some(path)
            }
            Err(e) => {
                tracing::warn!("Export failed: {}", e);
                self.status.error(format!("Export failed: {}", e), now);
                None
            }
        }
    }

    /// Apply an imported layout. An invalid document is rejected and the
    /// current layout is left exactly as it was.
    pub fn import_json(&mut self, text: &str, now: f64) -> bool {
        match validate_import(text) {
            Ok(blob) => {
                self.apply_import(blob, now);
                true
            }
            Err(e) => {
                tracing::warn!("Rejected layout import: {}", e);
                self.status.error(format!("Import rejected: {}", e), now);
                false
            }
        }
    }

    pub fn import_file(&mut self, path: &Path, now: f64) -> bool {
        match read_import(path) {
            Ok(blob) => {
                self.apply_import(blob, now);
                true
            }
            Err(e) => {
                tracing::warn!("Rejected layout import from {}: {}", path.display(), e);
                self.status.error(format!("Import rejected: {}", e), now);
                false
            }
        }
    }

    /// Imported positions win; nodes the file does not mention stay put
    fn apply_import(&mut self, blob: LayoutBlob, now: f64) {
        self.interaction.cancel(&mut self.graph);

        let current = DeterministicLayout {
            name: self.layout_name.clone(),
            positions: self.graph.positions(),
            label_anchors: self.label_anchors.clone(),
            angles: BTreeMap::new(),
        };
        let result = reconcile(&self.graph.node_ids(), &PersistedLayout::Saved(blob), &current);
        self.graph.apply_positions(&result.positions);
        self.label_anchors = result.label_anchors;
        self.layout_name = result.layout_name;
        if let Some(algorithm) = LayoutAlgorithm::parse(&self.layout_name) {
            self.algorithm = algorithm;
        }
        self.interaction.mark_dirty();

        self.status.success(
            format!(
                "Imported layout: {} applied, {} stale",
                result.stats.applied, result.stats.stale
            ),
            now,
        );
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn kind(&self) -> DiagramKind {
        self.kind
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn algorithm(&self) -> LayoutAlgorithm {
        self.algorithm
    }

    pub fn layout_name(&self) -> &str {
        &self.layout_name
    }

    pub fn label_anchors(&self) -> &BTreeMap<String, LabelAnchor> {
        &self.label_anchors
    }

    /// Where the layout came from at open (or `Saved` after a save)
    pub fn source(&self) -> LayoutSource {
        self.source
    }

    /// Reconciliation counters from open
    pub fn stats(&self) -> ReconcileStats {
        self.stats
    }

    pub fn is_dirty(&self) -> bool {
        self.interaction.is_dirty()
    }

    pub fn selection(&self) -> &BTreeSet<String> {
        self.interaction.selection()
    }

    pub fn mode(&self) -> &InteractionMode {
        self.interaction.mode()
    }

    pub fn is_force_running(&self) -> bool {
        self.interaction.is_force_running()
    }

    pub fn view(&self) -> &ViewTransform {
        &self.interaction.view
    }

    /// Current status message, None once its TTL has passed
    pub fn status(&self, now: f64) -> Option<&StatusMessage> {
        self.status.current(now)
    }

    /// Edges with both endpoints live, positioned for drawing
    pub fn render_edges(&self) -> Vec<ResolvedEdge> {
        resolve_edges(&self.graph)
    }
}

fn build_graph(kind: DiagramKind, dataset: &Dataset, filters: &FilterSet) -> Graph {
    match kind {
        DiagramKind::DocumentationMap => build_documentation_map(dataset),
        DiagramKind::UnifiedChart => build_unified_chart(dataset, filters),
    }
}
