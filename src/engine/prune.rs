use std::collections::VecDeque;

use crate::network::GraphModel;

use super::aggregate::Aggregation;
use super::error::EngineError;
use super::working::WorkingGraph;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub empty_edges: Vec<usize>,
    pub empty_or_isolated_nodes: Vec<usize>,
    pub undersized_nodes: Vec<usize>,
    pub undersized_edges: Vec<usize>,
    pub components_kept: usize,
}

impl PruneReport {
    pub fn removed_node_count(&self) -> usize {
        self.empty_or_isolated_nodes.len() + self.undersized_nodes.len()
    }

    pub fn removed_edge_count(&self) -> usize {
        self.empty_edges.len() + self.undersized_edges.len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComponentPruner {
    min_size: usize,
}

impl ComponentPruner {
    pub fn new(min_size: usize) -> Result<Self, EngineError> {
        if min_size == 0 {
            return Err(EngineError::InvalidComponentSize(min_size));
        }
        Ok(Self { min_size })
    }

    /// Removes, in order: edges with no filtered instances or with an empty
    /// endpoint; nodes left empty or without edges; components below `min_size`.
    pub fn prune(
        &self,
        model: &GraphModel,
        working: &mut WorkingGraph,
        aggregation: &Aggregation,
    ) -> PruneReport {
        let mut report = PruneReport::default();

        let live_edges = working.edges().collect::<Vec<_>>();
        for edge_index in live_edges {
            let edge = &model.edges()[edge_index];
            let empty = aggregation.edges[edge_index].is_empty()
                || aggregation.nodes[edge.source].is_empty()
                || aggregation.nodes[edge.target].is_empty();
            if empty && working.remove_edge(edge_index) {
                report.empty_edges.push(edge_index);
            }
        }

        let live_nodes = working.nodes().collect::<Vec<_>>();
        for node in live_nodes {
            let empty = aggregation.nodes[node].is_empty() || working.degree(model, node) == 0;
            if empty && working.remove_node(node) {
                report.empty_or_isolated_nodes.push(node);
            }
        }

        let components = connected_components(model, working);
        for component in components {
            if component.len() >= self.min_size {
                report.components_kept += 1;
                continue;
            }

            for node in component {
                for &edge in model.incident_edges(node) {
                    if working.remove_edge(edge) {
                        report.undersized_edges.push(edge);
                    }
                }
                if working.remove_node(node) {
                    report.undersized_nodes.push(node);
                }
            }
        }

        report
    }
}

pub fn connected_components(model: &GraphModel, working: &WorkingGraph) -> Vec<Vec<usize>> {
    let mut visited = vec![false; model.node_count()];
    let mut components = Vec::new();

    for start in working.nodes() {
        if visited[start] {
            continue;
        }

        visited[start] = true;
        let mut queue = VecDeque::from([start]);
        let mut component = Vec::new();

        while let Some(node) = queue.pop_front() {
            component.push(node);
            for &edge_index in model.incident_edges(node) {
                if !working.has_edge(edge_index) {
                    continue;
                }

                let next = model.edges()[edge_index].opposite(node);
                if working.has_node(next) && !visited[next] {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }

        components.push(component);
    }

    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::aggregate::aggregate;
    use crate::engine::filter::FilterBank;
    use crate::network::{Edge, Instance, Node, Regulation};

    fn node(id: &str) -> Node {
        Node::new(id, id.to_uppercase(), "Cell")
            .with_instances(vec![Instance::new("Cell", Regulation::Neutral, "d1")])
    }

    fn edge(id: &str, source: usize, target: usize) -> Edge {
        Edge::new(
            id,
            source,
            target,
            vec![Instance::new("up", Regulation::Positive, "d1")],
        )
    }

    fn two_triangles() -> GraphModel {
        GraphModel::new(
            ["a", "b", "c", "x", "y", "z"].into_iter().map(node).collect(),
            vec![
                edge("ab", 0, 1),
                edge("bc", 1, 2),
                edge("ca", 2, 0),
                edge("xy", 3, 4),
                edge("yz", 4, 5),
                edge("zx", 5, 3),
            ],
        )
        .unwrap()
    }

    fn prune(model: &GraphModel, min_size: usize) -> (WorkingGraph, PruneReport) {
        let aggregation = aggregate(model, &FilterBank::from_model(model)).unwrap();
        let mut working = WorkingGraph::new(model);
        let report = ComponentPruner::new(min_size)
            .unwrap()
            .prune(model, &mut working, &aggregation);
        (working, report)
    }

    #[test]
    fn undersized_components_are_removed_entirely() {
        let model = two_triangles();
        let (working, report) = prune(&model, 4);

        assert_eq!(working.node_count(), 0);
        assert_eq!(working.edge_count(), 0);
        assert_eq!(report.undersized_nodes.len(), 6);
        assert_eq!(report.undersized_edges.len(), 6);
        assert_eq!(report.components_kept, 0);
    }

    #[test]
    fn components_at_threshold_survive() {
        let model = two_triangles();
        let (working, report) = prune(&model, 3);

        assert_eq!(working.node_count(), 6);
        assert_eq!(report.components_kept, 2);
        assert_eq!(connected_components(&model, &working).len(), 2);
    }

    #[test]
    fn min_size_one_is_a_no_op() {
        let model = two_triangles();
        let (working, report) = prune(&model, 1);

        assert!(working.is_pristine());
        assert_eq!(report, PruneReport {
            components_kept: 2,
            ..PruneReport::default()
        });
    }

    #[test]
    fn edges_to_emptied_nodes_go_first_then_isolated_nodes() {
        let mut nodes = vec![node("a"), node("b"), node("c")];
        nodes[2].instances.clear();
        let model = GraphModel::new(nodes, vec![edge("ab", 0, 1), edge("bc", 1, 2)]).unwrap();
        let (working, report) = prune(&model, 1);

        assert_eq!(report.empty_edges, vec![1]);
        assert_eq!(report.empty_or_isolated_nodes, vec![2]);
        assert_eq!(working.nodes().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn zero_size_threshold_is_rejected() {
        assert_eq!(
            ComponentPruner::new(0),
            Err(EngineError::InvalidComponentSize(0))
        );
    }
}
