use std::collections::{BTreeSet, HashMap};

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use super::graph::{Edge, GraphModel, Instance, ModelError, Node, Regulation};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("graph document is not valid JSON")]
    Json(#[from] serde_json::Error),
    #[error("graph document must be a JSON object with `nodes` and `links` arrays")]
    Shape,
    #[error("node {index} is not a JSON object")]
    NodeShape { index: usize },
    #[error("invalid instances on {element}")]
    Instances {
        element: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Clone, Debug, Deserialize)]
struct RawLink {
    source: Value,
    target: Value,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    instances: Option<Vec<Instance>>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    regulation: Option<Regulation>,
}

fn key_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn first_str<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
}

fn resolve_endpoint(value: &Value, index_by_id: &HashMap<String, usize>, node_count: usize) -> Option<usize> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .map(|index| index as usize)
            .filter(|index| *index < node_count),
        Value::String(id) => index_by_id.get(id).copied(),
        Value::Object(object) => object
            .get("id")
            .and_then(|id| resolve_endpoint(id, index_by_id, node_count)),
        _ => None,
    }
}

fn parse_node(index: usize, value: &Value) -> Result<(Node, bool), ParseError> {
    let object = value.as_object().ok_or(ParseError::NodeShape { index })?;

    let id = object
        .get("id")
        .and_then(key_text)
        .unwrap_or_else(|| index.to_string());
    let name = first_str(object, &["name", "label", "mention"])
        .map(str::to_owned)
        .unwrap_or_else(|| id.clone());
    let entity_type = first_str(object, &["entityType", "entity_type_nominal", "entity_type", "type"])
        .unwrap_or_default()
        .to_owned();

    let mut node = Node::new(id, name, entity_type);
    node.url = first_str(object, &["url"])
        .filter(|url| !url.is_empty())
        .map(str::to_owned);
    node.cui = first_str(object, &["cui"])
        .filter(|cui| !cui.is_empty() && *cui != "cui_less")
        .map(str::to_owned);

    let explicit = match object.get("instances") {
        Some(instances) => Vec::<Instance>::deserialize(instances).map_err(|source| {
            ParseError::Instances {
                element: format!("node `{}`", node.id),
                source,
            }
        })?,
        None => Vec::new(),
    };
    let synthesize = explicit.is_empty();
    node.instances = explicit;

    if synthesize {
        let doc = first_str(object, &["doc", "PMID"]).unwrap_or_default();
        node.instances
            .push(Instance::new(node.entity_type.clone(), Regulation::Neutral, doc));
    }

    Ok((node, synthesize))
}

fn link_instances(link: RawLink) -> Vec<Instance> {
    match link.instances {
        Some(instances) => instances,
        None => link
            .label
            .map(|label| vec![Instance::new(label, link.regulation.unwrap_or_default(), "")])
            .unwrap_or_default(),
    }
}

/// Parses the `{ nodes, links }` graph document into a [`GraphModel`].
///
/// Links whose endpoints cannot be resolved are skipped. Nodes without explicit
/// instances receive one instance per distinct document mentioned by their
/// incident edges, so document filters narrow nodes as well as edges.
pub fn parse_graph_document(raw: &str) -> Result<GraphModel, ParseError> {
    let parsed: Value = serde_json::from_str(raw)?;
    let object = parsed.as_object().ok_or(ParseError::Shape)?;

    let raw_nodes = match object.get("nodes") {
        Some(Value::Array(nodes)) => nodes.as_slice(),
        Some(_) => return Err(ParseError::Shape),
        None => &[],
    };
    let raw_links = match object.get("links").or_else(|| object.get("edges")) {
        Some(Value::Array(links)) => links.as_slice(),
        Some(_) => return Err(ParseError::Shape),
        None => &[],
    };

    let mut nodes = Vec::with_capacity(raw_nodes.len());
    let mut synthesized = Vec::with_capacity(raw_nodes.len());
    for (index, value) in raw_nodes.iter().enumerate() {
        let (node, synthesize) = parse_node(index, value)?;
        nodes.push(node);
        synthesized.push(synthesize);
    }

    let index_by_id = nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (node.id.clone(), index))
        .collect::<HashMap<_, _>>();

    let mut edges = Vec::with_capacity(raw_links.len());
    for (index, value) in raw_links.iter().enumerate() {
        let link = RawLink::deserialize(value).map_err(|source| ParseError::Instances {
            element: format!("link {index}"),
            source,
        })?;

        let endpoints = (
            resolve_endpoint(&link.source, &index_by_id, nodes.len()),
            resolve_endpoint(&link.target, &index_by_id, nodes.len()),
        );
        let (Some(source), Some(target)) = endpoints else {
            warn!(link = index, "skipping link with unresolved endpoint");
            continue;
        };

        let id = link
            .id
            .as_ref()
            .and_then(key_text)
            .unwrap_or_else(|| format!("e{index}"));
        edges.push(Edge::new(id, source, target, link_instances(link)));
    }

    let mut docs_by_node: Vec<BTreeSet<&str>> = vec![BTreeSet::new(); nodes.len()];
    for edge in &edges {
        for instance in &edge.instances {
            docs_by_node[edge.source].insert(instance.doc.as_str());
            docs_by_node[edge.target].insert(instance.doc.as_str());
        }
    }
    let node_docs = docs_by_node
        .into_iter()
        .map(|docs| docs.into_iter().map(str::to_owned).collect::<Vec<_>>())
        .collect::<Vec<_>>();

    for ((node, synthesize), docs) in nodes.iter_mut().zip(synthesized).zip(node_docs) {
        if !synthesize || docs.is_empty() {
            continue;
        }

        node.instances = docs
            .into_iter()
            .map(|doc| Instance::new(node.entity_type.clone(), Regulation::Neutral, doc))
            .collect();
    }

    Ok(GraphModel::new(nodes, edges)?)
}
