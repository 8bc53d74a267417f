use std::collections::HashSet;

use crate::engine::PrunedGraph;

/// Opacity applied to everything outside the active neighbourhood.
pub const DIMMED_OPACITY: f32 = 0.1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InteractionState {
    #[default]
    Idle,
    Hovering(usize),
    Focused(usize),
}

impl InteractionState {
    /// A focused node stays authoritative while the pointer moves over others.
    pub fn hover(self, node: Option<usize>) -> Self {
        match (self, node) {
            (Self::Focused(_), _) => self,
            (_, Some(node)) => Self::Hovering(node),
            (_, None) => Self::Idle,
        }
    }

    pub fn mouse_down(self, node: usize) -> Self {
        Self::Focused(node)
    }

    pub fn mouse_up(self) -> Self {
        Self::Idle
    }

    pub fn exit_highlight(self) -> Self {
        Self::Idle
    }

    pub fn active_node(self) -> Option<usize> {
        match self {
            Self::Idle => None,
            Self::Hovering(node) | Self::Focused(node) => Some(node),
        }
    }

    pub fn emphasis(self, pruned: &PrunedGraph) -> Option<Emphasis> {
        let active = self.active_node()?;
        if !pruned.nodes.iter().any(|node| node.index == active) {
            return None;
        }

        let mut emphasis = Emphasis {
            nodes: HashSet::from([active]),
            edges: HashSet::new(),
        };
        for edge in &pruned.edges {
            if edge.source == active || edge.target == active {
                emphasis.edges.insert(edge.index);
                emphasis.nodes.insert(edge.source);
                emphasis.nodes.insert(edge.target);
            }
        }
        Some(emphasis)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Emphasis {
    pub nodes: HashSet<usize>,
    pub edges: HashSet<usize>,
}

impl Emphasis {
    pub fn node_opacity(&self, node: usize) -> f32 {
        if self.nodes.contains(&node) {
            1.0
        } else {
            DIMMED_OPACITY
        }
    }

    pub fn edge_opacity(&self, edge: usize) -> f32 {
        if self.edges.contains(&edge) {
            1.0
        } else {
            DIMMED_OPACITY
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{FilterBank, recompute};
    use crate::network::{Edge, GraphModel, Instance, Node, Regulation};

    fn star() -> PrunedGraph {
        let node = |id: &str| {
            Node::new(id, id, "Cell")
                .with_instances(vec![Instance::new("Cell", Regulation::Neutral, "d1")])
        };
        let edge = |id: &str, source, target| {
            Edge::new(id, source, target, vec![Instance::new("up", Regulation::Positive, "d1")])
        };
        let model = GraphModel::new(
            vec![node("hub"), node("a"), node("b"), node("far")],
            vec![edge("ha", 0, 1), edge("hb", 0, 2), edge("bf", 2, 3)],
        )
        .unwrap();
        recompute(&model, &FilterBank::from_model(&model), 1).unwrap()
    }

    #[test]
    fn focus_wins_over_hover_until_mouse_up() {
        let state = InteractionState::Idle.hover(Some(1));
        assert_eq!(state, InteractionState::Hovering(1));

        let state = state.mouse_down(2).hover(Some(3));
        assert_eq!(state, InteractionState::Focused(2));
        assert_eq!(state.hover(None), InteractionState::Focused(2));

        assert_eq!(state.mouse_up(), InteractionState::Idle);
        assert_eq!(InteractionState::Hovering(1).hover(None), InteractionState::Idle);
    }

    #[test]
    fn emphasis_covers_the_active_neighbourhood() {
        let pruned = star();
        let emphasis = InteractionState::Hovering(0).emphasis(&pruned).unwrap();

        assert_eq!(emphasis.nodes, HashSet::from([0, 1, 2]));
        assert_eq!(emphasis.edges, HashSet::from([0, 1]));
        assert_eq!(emphasis.node_opacity(3), DIMMED_OPACITY);
        assert_eq!(emphasis.edge_opacity(2), DIMMED_OPACITY);
        assert_eq!(emphasis.node_opacity(2), 1.0);
    }

    #[test]
    fn idle_or_missing_node_restores_default_styling() {
        let pruned = star();
        assert_eq!(InteractionState::Idle.emphasis(&pruned), None);
        assert_eq!(InteractionState::Focused(42).emphasis(&pruned), None);
        assert_eq!(
            InteractionState::Focused(1).exit_highlight().emphasis(&pruned),
            None
        );
    }
}
