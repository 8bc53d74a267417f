use std::collections::HashMap;
use std::hash::Hash;

use crate::network::{GraphModel, Instance, Regulation};

use super::error::EngineError;
use super::filter::{ElementKind, FilterBank};

/// Most frequent value of `values`; on equal counts the earliest-seen value keeps the lead.
pub fn majority_vote<T, I>(values: I) -> Option<T>
where
    I: IntoIterator<Item = T>,
    T: Eq + Hash + Clone,
{
    let mut tally: Vec<(T, usize)> = Vec::new();
    let mut slots: HashMap<T, usize> = HashMap::new();
    for value in values {
        match slots.get(&value) {
            Some(&slot) => tally[slot].1 += 1,
            None => {
                slots.insert(value.clone(), tally.len());
                tally.push((value, 1));
            }
        }
    }

    let mut leader: Option<(T, usize)> = None;
    for (value, count) in tally {
        if leader.as_ref().is_none_or(|(_, best)| count > *best) {
            leader = Some((value, count));
        }
    }
    leader.map(|(value, _)| value)
}

fn vote_text<'a>(instances: &[&'a Instance], field: impl Fn(&'a Instance) -> &'a str) -> String {
    majority_vote(instances.iter().map(|instance| field(*instance)))
        .unwrap_or_default()
        .to_owned()
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeAggregate {
    filtered_instances: Vec<usize>,
    display_type: String,
    display_doc: String,
}

impl NodeAggregate {
    pub fn derive(instances: &[Instance], filtered_instances: Vec<usize>) -> Self {
        let filtered = filtered_instances
            .iter()
            .map(|&slot| &instances[slot])
            .collect::<Vec<_>>();

        Self {
            display_type: vote_text(&filtered, |instance| instance.kind.as_str()),
            display_doc: vote_text(&filtered, |instance| instance.doc.as_str()),
            filtered_instances,
        }
    }

    pub fn filtered_instances(&self) -> &[usize] {
        &self.filtered_instances
    }

    pub fn is_empty(&self) -> bool {
        self.filtered_instances.is_empty()
    }

    pub fn display_type(&self) -> &str {
        &self.display_type
    }

    pub fn display_doc(&self) -> &str {
        &self.display_doc
    }

    pub(crate) fn into_parts(self) -> (Vec<usize>, String, String) {
        (self.filtered_instances, self.display_type, self.display_doc)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgeAggregate {
    filtered_instances: Vec<usize>,
    display_regulation: Regulation,
    display_type: String,
    display_doc: String,
}

impl EdgeAggregate {
    pub fn derive(instances: &[Instance], filtered_instances: Vec<usize>) -> Self {
        let filtered = filtered_instances
            .iter()
            .map(|&slot| &instances[slot])
            .collect::<Vec<_>>();

        Self {
            display_regulation: majority_vote(filtered.iter().map(|instance| instance.regulation))
                .unwrap_or(Regulation::Neutral),
            display_type: vote_text(&filtered, |instance| instance.kind.as_str()),
            display_doc: vote_text(&filtered, |instance| instance.doc.as_str()),
            filtered_instances,
        }
    }

    pub fn filtered_instances(&self) -> &[usize] {
        &self.filtered_instances
    }

    pub fn instance_count(&self) -> usize {
        self.filtered_instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filtered_instances.is_empty()
    }

    pub fn display_regulation(&self) -> Regulation {
        self.display_regulation
    }

    pub fn display_type(&self) -> &str {
        &self.display_type
    }

    pub fn display_doc(&self) -> &str {
        &self.display_doc
    }

    pub(crate) fn into_parts(self) -> (Vec<usize>, Regulation, String, String) {
        (
            self.filtered_instances,
            self.display_regulation,
            self.display_type,
            self.display_doc,
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Aggregation {
    pub nodes: Vec<NodeAggregate>,
    pub edges: Vec<EdgeAggregate>,
    pub max_instances: usize,
}

pub fn aggregate(model: &GraphModel, filters: &FilterBank) -> Result<Aggregation, EngineError> {
    let mut nodes = Vec::with_capacity(model.node_count());
    for node in model.nodes() {
        let filtered = filters.apply_all(ElementKind::Node, &node.instances)?;
        nodes.push(NodeAggregate::derive(&node.instances, filtered));
    }

    let mut edges = Vec::with_capacity(model.edge_count());
    let mut max_instances = 0usize;
    for edge in model.edges() {
        let filtered = filters.apply_all(ElementKind::Edge, &edge.instances)?;
        let aggregate = EdgeAggregate::derive(&edge.instances, filtered);
        max_instances = max_instances.max(aggregate.instance_count());
        edges.push(aggregate);
    }

    Ok(Aggregation {
        nodes,
        edges,
        max_instances,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge_with(regulations: &[Regulation]) -> EdgeAggregate {
        let instances = regulations
            .iter()
            .map(|&regulation| Instance::new("rel", regulation, "d1"))
            .collect::<Vec<_>>();
        EdgeAggregate::derive(&instances, (0..instances.len()).collect())
    }

    #[test]
    fn plurality_wins() {
        let edge = edge_with(&[Regulation::Positive, Regulation::Positive, Regulation::Negative]);
        assert_eq!(edge.display_regulation(), Regulation::Positive);

        let edge = edge_with(&[Regulation::Negative, Regulation::Positive, Regulation::Positive]);
        assert_eq!(edge.display_regulation(), Regulation::Positive);
    }

    #[test]
    fn ties_keep_the_first_seen_value() {
        let edge = edge_with(&[Regulation::Positive, Regulation::Negative]);
        assert_eq!(edge.display_regulation(), Regulation::Positive);

        assert_eq!(majority_vote(["b", "a", "a", "b"]), Some("b"));
        assert_eq!(majority_vote(["c", "a", "b"]), Some("c"));
    }

    #[test]
    fn empty_selection_yields_sentinels() {
        let instances = vec![Instance::new("rel", Regulation::Positive, "d1")];
        let edge = EdgeAggregate::derive(&instances, Vec::new());
        assert!(edge.is_empty());
        assert_eq!(edge.display_regulation(), Regulation::Neutral);
        assert_eq!(edge.display_type(), "");
        assert_eq!(edge.display_doc(), "");

        let node = NodeAggregate::derive(&instances, Vec::new());
        assert_eq!(node.display_type(), "");
        assert_eq!(node.display_doc(), "");
        assert_eq!(majority_vote(Vec::<u8>::new()), None);
    }

    #[test]
    fn votes_only_over_filtered_instances() {
        let instances = vec![
            Instance::new("down", Regulation::Negative, "d2"),
            Instance::new("down", Regulation::Negative, "d2"),
            Instance::new("up", Regulation::Positive, "d1"),
        ];
        let edge = EdgeAggregate::derive(&instances, vec![2]);
        assert_eq!(edge.display_type(), "up");
        assert_eq!(edge.display_doc(), "d1");
        assert_eq!(edge.display_regulation(), Regulation::Positive);
    }
}
