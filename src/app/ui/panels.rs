use std::path::{Path, PathBuf};
use std::time::Instant;

use disease_network::documents::DocumentViewer;
use disease_network::engine::Session;
use disease_network::interaction::InteractionState;
use eframe::egui::{self, Align, Context, Layout, Vec2};
use tracing::error;

use super::super::{Selection, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(session: Session, documents: DocumentViewer, export_dir: PathBuf) -> Self {
        Self {
            session,
            documents,
            interaction: InteractionState::Idle,
            export_dir,
            search: String::new(),
            selected: None,
            pan: Vec2::ZERO,
            zoom: 1.0,
            dragging: None,
            render_graph_revision: u64::MAX,
            graph_cache: None,
            search_match_cache: None,
            viewer_request: None,
            status: None,
        }
    }

    fn poll_session(&mut self, ctx: &Context) {
        let now = Instant::now();
        match self.session.poll(now) {
            Ok(true) => {
                self.status = None;
                self.drop_stale_selection();
            }
            Ok(false) => {}
            Err(error) => {
                error!(%error, "recompute failed; keeping the previous graph");
                self.status = Some(error.to_string());
            }
        }

        if let Some(wait) = self.session.time_until_due(now) {
            ctx.request_repaint_after(wait);
        }
    }

    fn drop_stale_selection(&mut self) {
        let pruned = self.session.pruned();
        let still_present = match self.selected {
            Some(Selection::Node(index)) => pruned.nodes.iter().any(|node| node.index == index),
            Some(Selection::Edge(index)) => pruned.edges.iter().any(|edge| edge.index == index),
            None => true,
        };
        if !still_present {
            self.set_selected(None);
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        graph_path: &Path,
        reload_requested: &mut bool,
    ) {
        self.poll_session(ctx);
        if self.render_graph_revision != self.session.revision() {
            self.rebuild_render_graph();
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("disease-network");
                    ui.separator();
                    ui.label(format!("graph: {}", graph_path.display()));
                    ui.label(format!("nodes: {}", self.session.model().node_count()));
                    ui.label(format!("edges: {}", self.session.model().edge_count()));
                    if ui.button("Reload graph").clicked() {
                        *reload_requested = true;
                    }
                    let apply = ui.add_enabled(self.session.is_pending(), egui::Button::new("Apply now"));
                    if apply.clicked() {
                        match self.session.flush() {
                            Ok(_) => self.drop_stale_selection(),
                            Err(error) => self.status = Some(error.to_string()),
                        }
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.visible_graph_text());
                        if let Some(status) = &self.status {
                            ui.colored_label(egui::Color32::from_rgb(230, 110, 100), status);
                        }
                        if self.session.is_pending() {
                            ui.spinner();
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(330.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(380.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui));
    }

    fn visible_graph_text(&self) -> String {
        let pruned = self.session.pruned();
        let scale = pruned
            .scale_mode
            .map(|mode| mode.label())
            .unwrap_or("none");
        format!(
            "kept {} nodes / {} edges  |  width scale: {scale}  |  pass {}",
            pruned.nodes.len(),
            pruned.edges.len(),
            self.session.revision()
        )
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<Selection>) {
        if self.selected == selected {
            return;
        }

        self.selected = selected;
        self.viewer_request = None;
    }
}
