mod app;
mod util;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::Parser;
use disease_network::engine::{EngineConfig, FilterProperty, FilterValue, Session};
use disease_network::export::{full_graph, payload_3d, pruned_graph, write_json};
use disease_network::network::load_graph;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::LaunchConfig;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Graph document (`{ nodes, links }` JSON).
    graph: PathBuf,

    /// Brat corpus with `<doc>.txt` and `<doc>.ann` files.
    #[arg(long)]
    docs_dir: Option<PathBuf>,

    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    min_component_size: u64,

    /// Quiet window before a burst of filter changes is recomputed.
    #[arg(long, default_value_t = 250)]
    debounce_ms: u64,

    /// Disable one filter value, e.g. `doc=PMC4236`. Repeatable.
    #[arg(long = "disable", value_name = "PROPERTY=VALUE", value_parser = parse_disable)]
    disabled: Vec<(FilterProperty, FilterValue)>,

    /// Write the pruned graph and exit.
    #[arg(long)]
    export: Option<PathBuf>,

    /// Write the full base graph and exit.
    #[arg(long)]
    export_full: Option<PathBuf>,

    /// Write the 3D payload and exit.
    #[arg(long)]
    export_3d: Option<PathBuf>,

    /// Directory for exports triggered from the window.
    #[arg(long, default_value = ".")]
    export_dir: PathBuf,
}

fn parse_disable(raw: &str) -> Result<(FilterProperty, FilterValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected PROPERTY=VALUE, got `{raw}`"))?;
    let property = FilterProperty::from_key(key).ok_or_else(|| {
        let keys = FilterProperty::ALL.map(FilterProperty::key).join(", ");
        format!("unknown filter `{key}`, expected one of: {keys}")
    })?;
    let value = property
        .parse_value(value)
        .ok_or_else(|| format!("`{value}` is not a valid {property} value"))?;
    Ok((property, value))
}

impl Args {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            min_component_size: self.min_component_size as usize,
            quiet_window: Duration::from_millis(self.debounce_ms),
            ..EngineConfig::default()
        }
    }

    fn is_headless(&self) -> bool {
        self.export.is_some() || self.export_full.is_some() || self.export_3d.is_some()
    }
}

fn run_headless(args: &Args) -> Result<()> {
    let model = Arc::new(load_graph(&args.graph)?);
    let mut session = Session::new(Arc::clone(&model), args.engine_config())
        .context("failed to start filtering session")?;

    for (property, value) in &args.disabled {
        if !session.set_filter(*property, value, false, Instant::now())? {
            info!(%property, %value, "value already disabled");
        }
    }
    session.flush()?;

    let pruned = session.pruned();
    info!(
        nodes = pruned.nodes.len(),
        edges = pruned.edges.len(),
        "pruned graph ready"
    );

    if let Some(path) = &args.export {
        write_json(path, &pruned_graph(&model, pruned))?;
    }
    if let Some(path) = &args.export_full {
        write_json(path, &full_graph(&model))?;
    }
    if let Some(path) = &args.export_3d {
        let payload = payload_3d(pruned, |node| {
            let (x, y) = util::stable_pair(&node.id);
            [x, y]
        });
        write_json(path, &payload)?;
    }

    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if args.is_headless() {
        return run_headless(&args);
    }

    let launch = LaunchConfig {
        graph_path: args.graph.clone(),
        docs_dir: args.docs_dir.clone(),
        engine: args.engine_config(),
        disabled: args.disabled.clone(),
        export_dir: args.export_dir.clone(),
    };
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    if let Err(error) = eframe::run_native(
        "disease-network",
        options,
        Box::new(move |cc| Ok(Box::new(app::DiseaseNetworkApp::new(cc, launch)))),
    ) {
        bail!("failed to start the viewer: {error}");
    }
    Ok(())
}
