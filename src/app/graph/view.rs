use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Sense, Stroke, Ui, Vec2, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::util::short_label;

use super::super::render_utils::{
    blend_color, draw_background, edge_visible, fade, group_color, regulation_color,
    world_to_screen,
};
use super::super::{RenderGraph, SearchMatchCache, Selection, ViewModel};

impl ViewModel {
    fn update_screen_space(rect: egui::Rect, pan: Vec2, zoom: f32, cache: &mut RenderGraph) {
        let scratch = &mut cache.view_scratch;
        scratch.screen_positions.clear();
        scratch.screen_radii.clear();
        for render_node in &cache.nodes {
            scratch
                .screen_positions
                .push(world_to_screen(rect, pan, zoom, render_node.world_pos));
            scratch
                .screen_radii
                .push((render_node.radius * zoom.powf(0.40)).clamp(2.5, 46.0));
        }
    }

    fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let query = self.search.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }

        let fresh = self.search_match_cache.as_ref().filter(|cached| {
            cached.graph_revision == self.render_graph_revision && cached.query == query
        });
        if let Some(cached) = fresh {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default().ignore_case();
        let matches: Arc<HashSet<usize>> = Arc::new(
            self.graph_cache
                .as_ref()?
                .nodes
                .iter()
                .enumerate()
                .filter(|(_, node)| {
                    node.id.to_lowercase().starts_with(&query)
                        || matcher.fuzzy_match(&node.name, &query).is_some()
                })
                .map(|(index, _)| index)
                .collect(),
        );

        self.search_match_cache = Some(SearchMatchCache {
            query,
            graph_revision: self.render_graph_revision,
            matches: Arc::clone(&matches),
        });
        Some(matches)
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        if self.render_graph_revision != self.session.revision() {
            self.rebuild_render_graph();
        }

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.pan, self.zoom);
        self.handle_graph_zoom(ui, rect, &response);

        let search_matches = self.cached_search_matches();
        let (pan, zoom) = (self.pan, self.zoom);

        let Some(cache) = self.graph_cache.as_mut() else {
            self.handle_graph_pointer(ui, &response, None, None);
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No elements survive the current filters.",
                FontId::proportional(15.0),
                Color32::from_gray(170),
            );
            return;
        };

        Self::update_screen_space(rect, pan, zoom, cache);
        Self::visible_indices_into(
            rect,
            &cache.view_scratch.screen_positions,
            &cache.view_scratch.screen_radii,
            &mut cache.view_scratch.visible_indices,
        );

        let hovered_node = Self::hovered_index(ui, cache);
        let hovered_edge = if hovered_node.is_none() {
            Self::hovered_edge(ui, cache, zoom)
        } else {
            None
        };
        if hovered_node.is_some() || hovered_edge.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        self.handle_graph_pointer(ui, &response, hovered_node, hovered_edge);
        self.handle_graph_pan(&response);
        if response.dragged() {
            ui.ctx().request_repaint();
        }

        let (pan, zoom) = (self.pan, self.zoom);
        let emphasis = self.interaction.emphasis(self.session.pruned());
        let selected = self.selected;
        let Some(cache) = self.graph_cache.as_mut() else {
            return;
        };
        Self::update_screen_space(rect, pan, zoom, cache);
        Self::visible_indices_into(
            rect,
            &cache.view_scratch.screen_positions,
            &cache.view_scratch.screen_radii,
            &mut cache.view_scratch.visible_indices,
        );

        let zoom_sqrt = zoom.sqrt();
        let show_edge_labels = zoom > 1.25;
        for (index, edge) in cache.edges.iter().enumerate() {
            let start = cache.view_scratch.screen_positions[edge.source];
            let end = cache.view_scratch.screen_positions[edge.target];
            if !edge_visible(rect, start, end, edge.width) {
                continue;
            }

            let opacity = emphasis
                .as_ref()
                .map_or(1.0, |emphasis| emphasis.edge_opacity(edge.base_index));
            let is_selected = selected == Some(Selection::Edge(edge.base_index));
            let is_hovered = hovered_edge == Some(index);

            let base = regulation_color(edge.regulation);
            let color = if is_selected {
                blend_color(base, Color32::from_rgb(245, 206, 93), 0.6)
            } else if is_hovered {
                blend_color(base, Color32::WHITE, 0.35)
            } else {
                base
            };
            let width = (edge.width * 0.5 * zoom_sqrt).clamp(0.6, 9.0);
            painter.line_segment([start, end], Stroke::new(width, fade(color, opacity)));

            let direction = (end - start).normalized();
            let target_radius = cache.view_scratch.screen_radii[edge.target];
            let tip = end - direction * target_radius;
            let wing = direction.rot90() * (width + 2.5);
            let back = tip - direction * (width + 6.0);
            painter.add(egui::Shape::convex_polygon(
                vec![tip, back + wing, back - wing],
                fade(color, opacity),
                Stroke::NONE,
            ));

            let emphasized = emphasis
                .as_ref()
                .is_some_and(|emphasis| emphasis.edges.contains(&edge.base_index));
            if show_edge_labels || emphasized || is_hovered || is_selected {
                painter.text(
                    start + (end - start) * 0.5,
                    Align2::CENTER_BOTTOM,
                    &edge.label,
                    FontId::proportional(11.0),
                    fade(Color32::from_gray(215), opacity),
                );
            }
        }

        let search_active = search_matches
            .as_ref()
            .is_some_and(|matches| !matches.is_empty());
        for &index in &cache.view_scratch.visible_indices {
            let render_node = &cache.nodes[index];
            let position = cache.view_scratch.screen_positions[index];
            let radius = cache.view_scratch.screen_radii[index];

            let is_selected = selected == Some(Selection::Node(render_node.base_index));
            let is_hovered = hovered_node == Some(index);
            let is_match = search_matches
                .as_ref()
                .is_some_and(|matches| matches.contains(&index));
            let opacity = emphasis
                .as_ref()
                .map_or(1.0, |emphasis| emphasis.node_opacity(render_node.base_index));

            let base_color = group_color(render_node.group);
            let color = if is_selected {
                blend_color(base_color, Color32::from_rgb(245, 206, 93), 0.7)
            } else if is_hovered {
                blend_color(base_color, Color32::WHITE, 0.3)
            } else if is_match {
                blend_color(base_color, Color32::from_rgb(103, 196, 255), 0.68)
            } else if search_active {
                fade(base_color, 0.45)
            } else {
                base_color
            };

            painter.circle_filled(position, radius, fade(color, opacity));
            painter.circle_stroke(
                position,
                radius,
                Stroke::new(
                    if is_selected { 2.2 } else { 1.0 },
                    fade(Color32::from_rgba_unmultiplied(15, 15, 15, 190), opacity),
                ),
            );

            let should_draw_label = is_selected
                || is_hovered
                || is_match
                || radius > 14.0
                || zoom > 1.1
                || emphasis
                    .as_ref()
                    .is_some_and(|emphasis| emphasis.nodes.contains(&render_node.base_index));
            if should_draw_label {
                painter.text(
                    position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    short_label(&render_node.name, 32),
                    FontId::proportional(12.0),
                    fade(Color32::from_gray(238), opacity),
                );
            }
        }

        let hover_text = hovered_node
            .map(|index| {
                let node = &cache.nodes[index];
                format!("{}  |  {}  |  {}", node.name, node.group.label(), node.id)
            })
            .or_else(|| hovered_edge.map(|index| cache.edges[index].label.clone()));
        if let Some(text) = hover_text {
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                text,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }
    }
}
