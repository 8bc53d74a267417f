use std::collections::HashMap;

use disease_network::engine::PrunedNode;
use disease_network::network::EntityGroup;
use eframe::egui::{Vec2, vec2};

use crate::util::stable_pair;

use super::super::render_utils::node_radius;
use super::super::{RenderEdge, RenderGraph, RenderNode, ViewModel, ViewScratch};

const LAYER_SPACING: f32 = 140.0;

fn initial_position(node: &PrunedNode, node_count: usize) -> Vec2 {
    let (jx, jy) = stable_pair(&node.id);
    let spread = 90.0 * (node_count.max(1) as f32).sqrt();
    let band = EntityGroup::of(&node.entity_type).layer() as f32
        - (EntityGroup::ALL.len() - 1) as f32 / 2.0;

    vec2(jx * spread, band * LAYER_SPACING + jy * LAYER_SPACING * 0.4)
}

impl ViewModel {
    pub(in crate::app) fn rebuild_render_graph(&mut self) {
        self.render_graph_revision = self.session.revision();
        self.search_match_cache = None;

        let pruned = self.session.pruned();
        if pruned.is_empty() {
            self.graph_cache = None;
            return;
        }

        let mut prior_positions = self
            .graph_cache
            .take()
            .map(|cache| {
                cache
                    .nodes
                    .into_iter()
                    .map(|node| (node.id, node.world_pos))
                    .collect::<HashMap<_, _>>()
            })
            .unwrap_or_default();

        let nodes = pruned
            .nodes
            .iter()
            .map(|node| RenderNode {
                base_index: node.index,
                id: node.id.clone(),
                name: node.name.clone(),
                group: EntityGroup::of(&node.entity_type),
                world_pos: prior_positions
                    .remove(&node.id)
                    .unwrap_or_else(|| initial_position(node, pruned.nodes.len())),
                radius: node_radius(node.degree),
            })
            .collect::<Vec<_>>();

        let index_by_base = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.base_index, index))
            .collect::<HashMap<_, _>>();

        let edges = pruned
            .edges
            .iter()
            .filter_map(|edge| {
                Some(RenderEdge {
                    base_index: edge.index,
                    source: *index_by_base.get(&edge.source)?,
                    target: *index_by_base.get(&edge.target)?,
                    width: edge.width as f32,
                    regulation: edge.display_regulation,
                    label: edge.label(),
                })
            })
            .collect();

        self.graph_cache = Some(RenderGraph {
            nodes,
            edges,
            index_by_base,
            view_scratch: ViewScratch {
                screen_positions: Vec::new(),
                screen_radii: Vec::new(),
                visible_indices: Vec::new(),
            },
        });
    }

    pub(in crate::app) fn node_position(&self, node: &PrunedNode) -> Vec2 {
        self.graph_cache
            .as_ref()
            .and_then(|cache| {
                let index = *cache.index_by_base.get(&node.index)?;
                Some(cache.nodes[index].world_pos)
            })
            .unwrap_or_else(|| initial_position(node, self.session.pruned().nodes.len()))
    }
}
