use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "i8", into = "i8")]
pub enum Regulation {
    Unspecified,
    Negative,
    #[default]
    Neutral,
    Positive,
    Mixed,
}

#[derive(Debug, thiserror::Error)]
#[error("regulation code {0} is outside -2..=2")]
pub struct InvalidRegulation(pub i8);

impl Regulation {
    pub const ALL: [Regulation; 5] = [
        Self::Unspecified,
        Self::Negative,
        Self::Neutral,
        Self::Positive,
        Self::Mixed,
    ];

    pub fn code(self) -> i8 {
        match self {
            Self::Unspecified => -2,
            Self::Negative => -1,
            Self::Neutral => 0,
            Self::Positive => 1,
            Self::Mixed => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
            Self::Positive => "positive",
            Self::Mixed => "mixed",
        }
    }

    /// Glyph appended to edge labels; empty for polarity-free relations.
    pub fn marker(self) -> &'static str {
        match self {
            Self::Negative => "⊖",
            Self::Positive => "⊕",
            Self::Mixed => "⊙",
            Self::Neutral | Self::Unspecified => "",
        }
    }
}

impl TryFrom<i8> for Regulation {
    type Error = InvalidRegulation;

    fn try_from(code: i8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|regulation| regulation.code() == code)
            .ok_or(InvalidRegulation(code))
    }
}

impl From<Regulation> for i8 {
    fn from(regulation: Regulation) -> Self {
        regulation.code()
    }
}

/// One observed occurrence backing a node or an edge. Never mutated after load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub regulation: Regulation,
    #[serde(default)]
    pub doc: String,
    #[serde(default, rename = "bratIds", alias = "brat_ids")]
    pub brat_ids: Vec<String>,
}

impl Instance {
    pub fn new(kind: impl Into<String>, regulation: Regulation, doc: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            regulation,
            doc: doc.into(),
            brat_ids: Vec::new(),
        }
    }

    pub fn with_brat_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.brat_ids = ids.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityGroup {
    Phenotype,
    Organ,
    Cell,
    Organelle,
    Molecule,
    Unknown,
}

impl EntityGroup {
    pub const ALL: [EntityGroup; 6] = [
        Self::Phenotype,
        Self::Organ,
        Self::Cell,
        Self::Organelle,
        Self::Molecule,
        Self::Unknown,
    ];

    pub fn of(entity_type: &str) -> Self {
        match entity_type {
            "Disorder" | "Measurement" | "Entity_Property" => Self::Phenotype,
            "Anatomical_entity" => Self::Organ,
            "Cell" => Self::Cell,
            "Cell_component" => Self::Organelle,
            "GGPs"
            | "Organic_compound_other"
            | "Inorganic_compound"
            | "Pharmacological_substance"
            | "Amino_acid_monomer"
            | "MENTION" => Self::Molecule,
            _ => Self::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Phenotype => "Phenotype",
            Self::Organ => "Organ",
            Self::Cell => "Cell",
            Self::Organelle => "Organelle",
            Self::Molecule => "Molecule",
            Self::Unknown => "Unknown",
        }
    }

    pub fn layer(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub entity_type: String,
    pub url: Option<String>,
    pub cui: Option<String>,
    pub instances: Vec<Instance>,
}

impl Node {
    pub fn new(id: impl Into<String>, name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            entity_type: entity_type.into(),
            url: None,
            cui: None,
            instances: Vec::new(),
        }
    }

    pub fn with_instances(mut self, instances: Vec<Instance>) -> Self {
        self.instances = instances;
        self
    }

    pub fn group(&self) -> EntityGroup {
        EntityGroup::of(&self.entity_type)
    }
}

/// Directed relation between two nodes, referenced by index into [`GraphModel::nodes`].
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub id: String,
    pub source: usize,
    pub target: usize,
    pub instances: Vec<Instance>,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: usize, target: usize, instances: Vec<Instance>) -> Self {
        Self {
            id: id.into(),
            source,
            target,
            instances,
        }
    }

    pub fn opposite(&self, node: usize) -> usize {
        if self.source == node {
            self.target
        } else {
            self.source
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("duplicate node id `{0}`")]
    DuplicateNode(String),
    #[error("edge `{edge}` references node index {node}, but only {node_count} nodes exist")]
    DanglingEdge {
        edge: String,
        node: usize,
        node_count: usize,
    },
}

#[derive(Clone, Debug)]
pub struct GraphModel {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index_by_id: HashMap<String, usize>,
    incident: Vec<Vec<usize>>,
}

impl GraphModel {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, ModelError> {
        let mut index_by_id = HashMap::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            if index_by_id.insert(node.id.clone(), index).is_some() {
                return Err(ModelError::DuplicateNode(node.id.clone()));
            }
        }

        let mut incident = vec![Vec::new(); nodes.len()];
        for (index, edge) in edges.iter().enumerate() {
            for endpoint in [edge.source, edge.target] {
                if endpoint >= nodes.len() {
                    return Err(ModelError::DanglingEdge {
                        edge: edge.id.clone(),
                        node: endpoint,
                        node_count: nodes.len(),
                    });
                }
            }

            incident[edge.source].push(index);
            if edge.target != edge.source {
                incident[edge.target].push(index);
            }
        }

        Ok(Self {
            nodes,
            edges,
            index_by_id,
            incident,
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn incident_edges(&self, node: usize) -> &[usize] {
        self.incident.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn instance_count(&self) -> usize {
        self.nodes
            .iter()
            .map(|node| node.instances.len())
            .chain(self.edges.iter().map(|edge| edge.instances.len()))
            .sum()
    }
}
