use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::engine::{PrunedGraph, PrunedNode};
use crate::network::{EntityGroup, GraphModel, Instance, Regulation};

const LOW: f32 = 0.05;
const HIGH: f32 = 0.95;

#[derive(Debug, Serialize)]
pub struct GraphDocument<'a> {
    pub nodes: Vec<NodeRecord<'a>>,
    pub links: Vec<LinkRecord<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub entity_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cui: Option<&'a str>,
    pub instances: &'a [Instance],
}

#[derive(Debug, Serialize)]
pub struct LinkRecord<'a> {
    pub id: &'a str,
    pub source: &'a str,
    pub target: &'a str,
    pub instances: &'a [Instance],
}

pub fn full_graph(model: &GraphModel) -> GraphDocument<'_> {
    let nodes = model
        .nodes()
        .iter()
        .map(|node| NodeRecord {
            id: &node.id,
            name: &node.name,
            entity_type: &node.entity_type,
            url: node.url.as_deref(),
            cui: node.cui.as_deref(),
            instances: &node.instances,
        })
        .collect();

    let links = model
        .edges()
        .iter()
        .map(|edge| LinkRecord {
            id: &edge.id,
            source: &model.nodes()[edge.source].id,
            target: &model.nodes()[edge.target].id,
            instances: &edge.instances,
        })
        .collect();

    GraphDocument { nodes, links }
}

#[derive(Debug, Serialize)]
pub struct PrunedDocument<'a> {
    pub nodes: Vec<PrunedNodeRecord<'a>>,
    pub links: Vec<PrunedLinkRecord<'a>>,
    #[serde(rename = "maxInstances")]
    pub max_instances: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrunedNodeRecord<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub entity_type: &'a str,
    pub filtered_instances: Vec<&'a Instance>,
    pub display_type: &'a str,
    pub display_doc: &'a str,
    pub degree: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrunedLinkRecord<'a> {
    pub id: &'a str,
    pub source: &'a str,
    pub target: &'a str,
    pub filtered_instances: Vec<&'a Instance>,
    pub display_regulation: Regulation,
    pub display_type: &'a str,
    pub display_doc: &'a str,
    pub label: String,
    pub width: f64,
}

pub fn pruned_graph<'a>(model: &'a GraphModel, pruned: &'a PrunedGraph) -> PrunedDocument<'a> {
    let nodes = pruned
        .nodes
        .iter()
        .map(|node| PrunedNodeRecord {
            id: &node.id,
            name: &node.name,
            entity_type: &node.entity_type,
            filtered_instances: pruned.filtered_node_instances(model, node),
            display_type: &node.display_type,
            display_doc: &node.display_doc,
            degree: node.degree,
        })
        .collect();

    let links = pruned
        .edges
        .iter()
        .map(|edge| PrunedLinkRecord {
            id: &edge.id,
            source: &model.nodes()[edge.source].id,
            target: &model.nodes()[edge.target].id,
            filtered_instances: pruned.filtered_edge_instances(model, edge),
            display_regulation: edge.display_regulation,
            display_type: &edge.display_type,
            display_doc: &edge.display_doc,
            label: edge.label(),
            width: edge.width,
        })
        .collect();

    PrunedDocument {
        nodes,
        links,
        max_instances: pruned.max_instances,
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct Payload3d {
    pub nodes: Vec<Node3d>,
    pub edges: Vec<Edge3d>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct Node3d {
    pub id: String,
    pub degree: usize,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct Edge3d {
    pub source: usize,
    pub target: usize,
    pub size: usize,
    #[serde(rename = "type")]
    pub kind: String,
}

fn normalize(value: f32, min: f32, max: f32) -> f32 {
    if max - min <= f32::EPSILON {
        return (LOW + HIGH) / 2.0;
    }
    LOW + (value - min) / (max - min) * (HIGH - LOW)
}

fn layer_height(group: EntityGroup) -> f32 {
    let top = (EntityGroup::ALL.len() - 1) as f32;
    normalize(group.layer() as f32, 0.0, top)
}

/// Flat payload for the 3D view. `position` supplies each node's 2D canvas
/// position; both axes are rescaled into `[0.05, 0.95]`.
pub fn payload_3d(pruned: &PrunedGraph, position: impl Fn(&PrunedNode) -> [f32; 2]) -> Payload3d {
    let positions = pruned.nodes.iter().map(&position).collect::<Vec<_>>();
    let bounds = |axis: usize| {
        positions.iter().fold((f32::MAX, f32::MIN), |(min, max), point| {
            (min.min(point[axis]), max.max(point[axis]))
        })
    };
    let (min_x, max_x) = bounds(0);
    let (min_y, max_y) = bounds(1);

    let nodes = pruned
        .nodes
        .iter()
        .zip(&positions)
        .map(|(node, point)| Node3d {
            id: node.id.clone(),
            degree: node.degree,
            kind: node.entity_type.clone(),
            name: node.name.clone(),
            x: normalize(point[0], min_x, max_x),
            y: normalize(point[1], min_y, max_y),
            z: layer_height(EntityGroup::of(&node.entity_type)),
        })
        .collect();

    let slot_of = |index: usize| pruned.nodes.iter().position(|node| node.index == index);
    let edges = pruned
        .edges
        .iter()
        .filter_map(|edge| {
            Some(Edge3d {
                source: slot_of(edge.source)?,
                target: slot_of(edge.target)?,
                size: edge.instance_count(),
                kind: edge.display_type.clone(),
            })
        })
        .collect();

    Payload3d { nodes, edges }
}

pub fn write_json<T: Serialize>(path: &Path, document: &T) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create export file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, document)
        .with_context(|| format!("failed to serialize export {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("failed to write export {}", path.display()))?;

    info!(path = %path.display(), "wrote export");
    Ok(())
}
