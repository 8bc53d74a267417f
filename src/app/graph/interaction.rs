use eframe::egui::{self, Key, Pos2, Rect, Ui};

use super::super::render_utils::{circle_visible, distance_to_segment, screen_to_world};
use super::super::{RenderGraph, Selection, ViewModel};

const EDGE_PICK_DISTANCE: f32 = 5.0;

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.05, 6.0);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        let background_drag =
            response.dragged_by(egui::PointerButton::Primary) && self.dragging.is_none();
        if background_drag
            || response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }

    pub(in crate::app) fn visible_indices_into(
        rect: Rect,
        screen_positions: &[Pos2],
        screen_radii: &[f32],
        visible: &mut Vec<usize>,
    ) {
        visible.clear();
        visible.extend(
            (0..screen_positions.len())
                .filter(|&index| circle_visible(rect, screen_positions[index], screen_radii[index])),
        );
    }

    pub(in crate::app) fn hovered_index(ui: &Ui, cache: &RenderGraph) -> Option<usize> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        let scratch = &cache.view_scratch;
        scratch
            .visible_indices
            .iter()
            .filter_map(|&index| {
                let distance = scratch.screen_positions[index].distance(pointer);
                (distance <= scratch.screen_radii[index]).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    pub(in crate::app) fn hovered_edge(ui: &Ui, cache: &RenderGraph, zoom: f32) -> Option<usize> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        let positions = &cache.view_scratch.screen_positions;
        cache
            .edges
            .iter()
            .enumerate()
            .filter_map(|(index, edge)| {
                let distance =
                    distance_to_segment(pointer, positions[edge.source], positions[edge.target]);
                let reach = EDGE_PICK_DISTANCE.max(edge.width * zoom.sqrt() * 0.5);
                (distance <= reach).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    pub(in crate::app) fn handle_graph_pointer(
        &mut self,
        ui: &Ui,
        response: &egui::Response,
        hovered_node: Option<usize>,
        hovered_edge: Option<usize>,
    ) {
        let Some(cache) = self.graph_cache.as_mut() else {
            self.interaction = self.interaction.exit_highlight();
            return;
        };

        let hovered_base = hovered_node.map(|index| cache.nodes[index].base_index);
        self.interaction = self.interaction.hover(hovered_base);

        let (pressed, released, escape) = ui.input(|input| {
            (
                input.pointer.primary_pressed(),
                input.pointer.primary_released(),
                input.key_pressed(Key::Escape),
            )
        });

        if pressed
            && response.hovered()
            && let (Some(index), Some(base)) = (hovered_node, hovered_base)
        {
            self.interaction = self.interaction.mouse_down(base);
            self.dragging = Some(index);
        }

        if let Some(index) = self.dragging
            && response.dragged_by(egui::PointerButton::Primary)
            && let Some(node) = cache.nodes.get_mut(index)
        {
            node.world_pos += response.drag_delta() / self.zoom;
        }

        if released {
            self.interaction = self.interaction.mouse_up();
            self.dragging = None;
        }
        if escape {
            self.interaction = self.interaction.exit_highlight();
            self.set_selected(None);
        }

        if response.clicked_by(egui::PointerButton::Primary) {
            let selection = match (hovered_base, hovered_edge) {
                (Some(base), _) => Some(Selection::Node(base)),
                (None, Some(edge)) => self
                    .graph_cache
                    .as_ref()
                    .and_then(|cache| cache.edges.get(edge))
                    .map(|edge| Selection::Edge(edge.base_index)),
                (None, None) => None,
            };
            self.set_selected(selection);
        }
    }
}
