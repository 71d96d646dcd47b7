//! Atlas layout CLI
//!
//! Headless access to the layout pipeline: compute, restore, force-settle,
//! export and import diagram layouts without the web front end.
//!
//! Usage:
//!   cargo run --bin atlas -- layout --diagram unified
//!   cargo run --bin atlas -- force --diagram docmap --select model:gpt-4o --save
//!   cargo run --bin atlas -- export --diagram unified --out-dir /tmp
//!   cargo run --bin atlas -- export --diagram docmap --stdout
//!   cargo run --bin atlas -- import --diagram unified --file layout.json
//!
//! Environment:
//!   ATLAS_STORE_DIR, ATLAS_CANVAS_WIDTH, ATLAS_CANVAS_HEIGHT (see config)
//!   RUST_LOG controls log output (default "info")

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use safety_atlas::atlas_graph::{ForceConfig, LayoutAlgorithm};
use safety_atlas::atlas_types::{Dataset, DiagramKind, FilterSet};
use safety_atlas::{AtlasConfig, DiagramSession, FileStorage, LayoutStore};

const DEFAULT_DATASET: &str = "data/sample_dataset.json";

#[derive(Parser)]
#[command(name = "atlas")]
#[command(version = "0.1.0")]
#[command(about = "Compute, persist and reconcile evidence diagram layouts")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command
#[derive(Args, Debug)]
struct Common {
    /// Diagram: unified (unified chart) or docmap (documentation map)
    #[arg(long, short = 'd', default_value = "unified")]
    diagram: String,

    /// Normalized dataset JSON
    #[arg(long, default_value = DEFAULT_DATASET)]
    dataset: PathBuf,

    /// Layout store directory (overrides ATLAS_STORE_DIR)
    #[arg(long)]
    store_dir: Option<PathBuf>,

    /// Provider filter (unified chart, repeatable)
    #[arg(long = "provider")]
    providers: Vec<String>,

    /// Category filter (unified chart, repeatable)
    #[arg(long = "category")]
    categories: Vec<String>,

    /// Technique filter (unified chart, repeatable)
    #[arg(long = "technique")]
    techniques: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Restore the layout and print the reconciled positions
    Layout {
        #[command(flatten)]
        common: Common,

        /// Re-run a deterministic layout: radial, balanced, sequential
        #[arg(long, short = 'a')]
        algorithm: Option<String>,
    },

    /// Restore (optionally re-lay out) and persist
    Save {
        #[command(flatten)]
        common: Common,

        #[arg(long, short = 'a')]
        algorithm: Option<String>,
    },

    /// Run the force simulation until it settles
    Force {
        #[command(flatten)]
        common: Common,

        /// Node ids to release (repeatable; all nodes if omitted)
        #[arg(long = "select")]
        select: Vec<String>,

        /// Tick cap
        #[arg(long, default_value_t = 1000)]
        max_ticks: usize,

        /// Persist the settled layout
        #[arg(long)]
        save: bool,
    },

    /// Write the current layout to a timestamped file
    Export {
        #[command(flatten)]
        common: Common,

        /// Target directory (overrides ATLAS_EXPORT_DIR)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Print the layout JSON instead of writing a file
        #[arg(long, conflicts_with = "out_dir")]
        stdout: bool,
    },

    /// Validate a layout file, apply it and persist
    Import {
        #[command(flatten)]
        common: Common,

        #[arg(long, short = 'f')]
        file: PathBuf,
    },

    /// Re-apply the default deterministic layout and persist
    Reset {
        #[command(flatten)]
        common: Common,
    },

    /// Forget the saved layout for a diagram
    Clear {
        #[command(flatten)]
        common: Common,
    },
}

// =============================================================================
// MAIN
// =============================================================================

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let clock = Instant::now();

    match cli.command {
        Commands::Layout { common, algorithm } => {
            let (mut session, _store) = open(&common, &clock)?;
            if let Some(algorithm) = algorithm {
                session.relayout(parse_algorithm(&algorithm)?);
            }
            print_layout(&session)
        }
        Commands::Save { common, algorithm } => {
            let (mut session, store) = open(&common, &clock)?;
            if let Some(algorithm) = algorithm {
                session.relayout(parse_algorithm(&algorithm)?);
            }
            persist(&mut session, &store, &clock)?;
            print_layout(&session)
        }
        Commands::Force {
            common,
            select,
            max_ticks,
            save,
        } => {
            let (mut session, store) = open(&common, &clock)?;
            let unknown: Vec<&String> = select
                .iter()
                .filter(|id| !session.graph().contains(id))
                .collect();
            if !unknown.is_empty() {
                tracing::warn!("Ignoring unknown node ids: {:?}", unknown);
            }
            session.select(select.iter().cloned());
            session.set_force_config(ForceConfig {
                max_ticks,
                ..ForceConfig::default()
            });
            session.start_force();
            let ticks = session.run_force_to_convergence(clock.elapsed().as_secs_f64());
            tracing::info!("Force layout settled after {} ticks", ticks);
            if save {
                persist(&mut session, &store, &clock)?;
            }
            print_layout(&session)
        }
        Commands::Export {
            common,
            out_dir,
            stdout,
        } => {
            let config = load_config(&common)?;
            let (mut session, _store) = open(&common, &clock)?;
            if stdout {
                println!("{}", session.export_json()?);
                return Ok(());
            }
            let dir = out_dir.unwrap_or(config.export_dir);
            let path = session
                .export_to_dir(&dir, Utc::now(), clock.elapsed().as_secs_f64())
                .ok_or_else(|| status_error(&session, &clock, "export failed"))?;
            println!("{}", path.display());
            Ok(())
        }
        Commands::Import { common, file } => {
            let (mut session, store) = open(&common, &clock)?;
            if !session.import_file(&file, clock.elapsed().as_secs_f64()) {
                return Err(status_error(&session, &clock, "import rejected"));
            }
            persist(&mut session, &store, &clock)?;
            print_layout(&session)
        }
        Commands::Reset { common } => {
            let (mut session, store) = open(&common, &clock)?;
            session.reset_layout();
            persist(&mut session, &store, &clock)?;
            print_layout(&session)
        }
        Commands::Clear { common } => {
            let config = load_config(&common)?;
            let kind = parse_diagram(&common.diagram)?;
            let store = LayoutStore::new(FileStorage::new(&config.store_dir));
            store
                .clear(kind)
                .with_context(|| format!("clearing {}", kind.storage_key()))?;
            println!("cleared {}", kind.storage_key());
            Ok(())
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn load_config(common: &Common) -> Result<AtlasConfig> {
    let mut config = AtlasConfig::from_env()?;
    if let Some(dir) = &common.store_dir {
        config.store_dir = dir.clone();
    }
    Ok(config)
}

fn open(common: &Common, clock: &Instant) -> Result<(DiagramSession, LayoutStore)> {
    let config = load_config(common)?;
    let kind = parse_diagram(&common.diagram)?;
    let dataset = load_dataset(&common.dataset)?;
    let filters = FilterSet {
        providers: common.providers.iter().cloned().collect(),
        categories: common.categories.iter().cloned().collect(),
        techniques: common.techniques.iter().cloned().collect(),
    };
    if kind == DiagramKind::DocumentationMap && !filters.is_empty() {
        tracing::warn!("Filters only apply to the unified chart; ignoring");
    }

    let store = LayoutStore::new(FileStorage::new(&config.store_dir));
    let now = clock.elapsed().as_secs_f64();
    let session = DiagramSession::open(kind, dataset, filters, &config, &store, now);
    if let Some(message) = session.status(now) {
        if message.is_error() {
            tracing::warn!("{}", message.text);
        } else {
            tracing::info!("{}", message.text);
        }
    }
    Ok((session, store))
}

fn load_dataset(path: &Path) -> Result<Dataset> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading dataset {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing dataset {}", path.display()))
}

fn parse_diagram(s: &str) -> Result<DiagramKind> {
    DiagramKind::parse(s).ok_or_else(|| anyhow!("unknown diagram '{}'", s))
}

fn parse_algorithm(s: &str) -> Result<LayoutAlgorithm> {
    LayoutAlgorithm::parse(s).ok_or_else(|| anyhow!("unknown layout algorithm '{}'", s))
}

fn persist(session: &mut DiagramSession, store: &LayoutStore, clock: &Instant) -> Result<()> {
    if !session.save(store, clock.elapsed().as_secs_f64()) {
        return Err(status_error(session, clock, "save failed"));
    }
    Ok(())
}

fn status_error(session: &DiagramSession, clock: &Instant, fallback: &str) -> anyhow::Error {
    match session.status(clock.elapsed().as_secs_f64()) {
        Some(message) => anyhow!("{}", message.text),
        None => anyhow!("{}", fallback),
    }
}

fn print_layout(session: &DiagramSession) -> Result<()> {
    let output = serde_json::json!({
        "diagram": session.kind().storage_key(),
        "source": session.source(),
        "stats": session.stats(),
        "layoutName": session.layout_name(),
        "nodes": session.graph().len(),
        "edges": session.render_edges().len(),
        "dirty": session.is_dirty(),
        "positions": session.graph().positions(),
        "labelAnchors": session.label_anchors(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
