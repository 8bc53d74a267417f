use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::graph::GraphModel;
use super::parse::parse_graph_document;

pub fn load_graph(path: &Path) -> Result<GraphModel> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read graph document {}", path.display()))?;
    let model = parse_graph_document(&raw)
        .with_context(|| format!("failed to parse graph document {}", path.display()))?;

    info!(
        path = %path.display(),
        nodes = model.node_count(),
        edges = model.edge_count(),
        instances = model.instance_count(),
        "loaded disease network"
    );

    Ok(model)
}
