use crate::network::GraphModel;

/// Mutable view over the base graph: which elements are currently present.
///
/// Removals are recorded so [`WorkingGraph::restore`] can reinsert exactly what
/// the last pass took out, letting every pass start from the full base graph.
#[derive(Clone, Debug)]
pub struct WorkingGraph {
    node_alive: Vec<bool>,
    edge_alive: Vec<bool>,
    removed_nodes: Vec<usize>,
    removed_edges: Vec<usize>,
}

impl WorkingGraph {
    pub fn new(model: &GraphModel) -> Self {
        Self {
            node_alive: vec![true; model.node_count()],
            edge_alive: vec![true; model.edge_count()],
            removed_nodes: Vec::new(),
            removed_edges: Vec::new(),
        }
    }

    pub fn has_node(&self, node: usize) -> bool {
        self.node_alive.get(node).copied().unwrap_or(false)
    }

    pub fn has_edge(&self, edge: usize) -> bool {
        self.edge_alive.get(edge).copied().unwrap_or(false)
    }

    pub fn remove_node(&mut self, node: usize) -> bool {
        match self.node_alive.get_mut(node) {
            Some(alive) if *alive => {
                *alive = false;
                self.removed_nodes.push(node);
                true
            }
            _ => false,
        }
    }

    pub fn remove_edge(&mut self, edge: usize) -> bool {
        match self.edge_alive.get_mut(edge) {
            Some(alive) if *alive => {
                *alive = false;
                self.removed_edges.push(edge);
                true
            }
            _ => false,
        }
    }

    pub fn restore(&mut self) {
        for node in self.removed_nodes.drain(..) {
            self.node_alive[node] = true;
        }
        for edge in self.removed_edges.drain(..) {
            self.edge_alive[edge] = true;
        }
        debug_assert!(self.is_pristine());
    }

    pub fn is_pristine(&self) -> bool {
        self.node_alive.iter().all(|alive| *alive) && self.edge_alive.iter().all(|alive| *alive)
    }

    pub fn removed_nodes(&self) -> &[usize] {
        &self.removed_nodes
    }

    pub fn removed_edges(&self) -> &[usize] {
        &self.removed_edges
    }

    pub fn degree(&self, model: &GraphModel, node: usize) -> usize {
        model
            .incident_edges(node)
            .iter()
            .filter(|&&edge| self.has_edge(edge))
            .count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = usize> + '_ {
        self.node_alive
            .iter()
            .enumerate()
            .filter_map(|(index, alive)| alive.then_some(index))
    }

    pub fn edges(&self) -> impl Iterator<Item = usize> + '_ {
        self.edge_alive
            .iter()
            .enumerate()
            .filter_map(|(index, alive)| alive.then_some(index))
    }

    pub fn node_count(&self) -> usize {
        self.nodes().count()
    }

    pub fn edge_count(&self) -> usize {
        self.edges().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{Edge, Node};

    fn path() -> GraphModel {
        GraphModel::new(
            vec![
                Node::new("a", "A", "Cell"),
                Node::new("b", "B", "Cell"),
                Node::new("c", "C", "Cell"),
            ],
            vec![Edge::new("ab", 0, 1, Vec::new()), Edge::new("bc", 1, 2, Vec::new())],
        )
        .unwrap()
    }

    #[test]
    fn restore_reinserts_every_removal() {
        let model = path();
        let mut working = WorkingGraph::new(&model);

        assert!(working.remove_edge(0));
        assert!(!working.remove_edge(0));
        assert!(working.remove_node(0));
        assert_eq!(working.degree(&model, 1), 1);
        assert_eq!(working.nodes().collect::<Vec<_>>(), vec![1, 2]);

        working.restore();
        assert!(working.is_pristine());
        assert!(working.removed_nodes().is_empty());
        assert_eq!(working.degree(&model, 1), 2);
    }
}
