use std::collections::BTreeMap;

use disease_network::network::{EntityGroup, Instance};
use eframe::egui::{self, RichText, Ui};

use super::super::render_utils::regulation_color;
use super::super::{Selection, ViewModel};

fn group_by_doc(instances: &[Instance]) -> BTreeMap<&str, Vec<&Instance>> {
    let mut by_doc: BTreeMap<&str, Vec<&Instance>> = BTreeMap::new();
    for instance in instances {
        by_doc.entry(instance.doc.as_str()).or_default().push(instance);
    }
    by_doc
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let instances = match self.selected {
            Some(Selection::Node(index)) => self.draw_node_summary(ui, index),
            Some(Selection::Edge(index)) => self.draw_edge_summary(ui, index),
            None => {
                ui.label("Click a node or an edge in the graph.");
                return;
            }
        };
        let Some(instances) = instances else {
            ui.label("The selection was pruned by the current filters.");
            return;
        };

        ui.separator();
        ui.label(RichText::new(format!("Filtered instances ({})", instances.len())).strong());
        if !self.documents.is_available() {
            ui.small("No document corpus configured; document links are disabled.");
        }

        let mut requested = None;
        egui::ScrollArea::vertical()
            .id_salt("instances_scroll")
            .max_height(300.0)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for (doc, instances) in group_by_doc(&instances) {
                    let title = if doc.is_empty() { "(no document)" } else { doc };
                    egui::CollapsingHeader::new(format!("{title}  ×{}", instances.len()))
                        .id_salt(("doc", doc))
                        .default_open(true)
                        .show(ui, |ui| {
                            for instance in instances {
                                let text = format!(
                                    "{}  {}",
                                    instance.kind,
                                    instance.regulation.marker()
                                );
                                let row = RichText::new(text).color(regulation_color(instance.regulation));
                                let linkable = self.documents.is_available() && !doc.is_empty();
                                if linkable {
                                    if ui.link(row).on_hover_text("Show in document").clicked() {
                                        requested = Some((doc.to_owned(), instance.brat_ids.clone()));
                                    }
                                } else {
                                    ui.label(row);
                                }
                            }
                        });
                }
            });

        if let Some((doc, ids)) = requested {
            self.viewer_request = self.documents.request(&doc, &ids);
        }

        if let Some(request) = &self.viewer_request {
            ui.separator();
            ui.label(RichText::new(format!("Document {}", request.doc)).strong());
            if request.highlights.is_empty() {
                ui.label("No annotation spans match this instance.");
            }
            for highlight in &request.highlights {
                ui.label(
                    RichText::new(format!("{} {}: {}", highlight.id, highlight.kind, highlight.text))
                        .strong(),
                );
                ui.label(highlight.snippet.as_str());
                ui.add_space(4.0);
            }
        }
    }

    fn draw_node_summary(&self, ui: &mut Ui, index: usize) -> Option<Vec<Instance>> {
        let pruned = self.session.pruned();
        let node = pruned.nodes.iter().find(|node| node.index == index)?;
        let base = &self.session.model().nodes()[index];

        ui.label(RichText::new(&node.name).strong());
        ui.small(node.id.as_str());
        ui.add_space(6.0);
        ui.label(format!(
            "Entity type: {} ({})",
            node.entity_type,
            EntityGroup::of(&node.entity_type).label()
        ));
        ui.label(format!("Displayed type: {}", node.display_type));
        ui.label(format!("Main document: {}", node.display_doc));
        ui.label(format!("Degree: {}", node.degree));
        if let Some(cui) = &base.cui {
            ui.label(format!("CUI: {cui}"));
        }
        if let Some(url) = &base.url {
            ui.hyperlink_to("Look up concept", url);
        }

        Some(
            pruned
                .filtered_node_instances(self.session.model(), node)
                .into_iter()
                .cloned()
                .collect(),
        )
    }

    fn draw_edge_summary(&self, ui: &mut Ui, index: usize) -> Option<Vec<Instance>> {
        let pruned = self.session.pruned();
        let edge = pruned.edges.iter().find(|edge| edge.index == index)?;
        let nodes = self.session.model().nodes();

        ui.label(RichText::new(edge.label()).strong());
        ui.small(edge.id.as_str());
        ui.add_space(6.0);
        ui.label(format!(
            "{} → {}",
            nodes[edge.source].name, nodes[edge.target].name
        ));
        ui.label(
            RichText::new(format!("Regulation: {}", edge.display_regulation.label()))
                .color(regulation_color(edge.display_regulation)),
        );
        ui.label(format!("Main document: {}", edge.display_doc));
        ui.label(format!(
            "Instances: {}  |  width {:.1}",
            edge.instance_count(),
            edge.width
        ));

        Some(
            pruned
                .filtered_edge_instances(self.session.model(), edge)
                .into_iter()
                .cloned()
                .collect(),
        )
    }
}
