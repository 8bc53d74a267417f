use std::time::Instant;

use disease_network::engine::{FilterProperty, FilterValue};
use disease_network::export::{full_graph, payload_3d, pruned_graph, write_json};
use eframe::egui::{self, Key, Response, RichText, Ui};
use tracing::error;

use super::super::ViewModel;
use super::super::render_utils::regulation_color;

const ARROW_STEPS_PER_SEC: f32 = 8.0;
const ARROW_RAMP_PER_SEC: f32 = 6.0;
const ARROW_MAX_BOOST: f32 = 30.0;

#[derive(Clone, Copy, Default)]
struct ArrowHold {
    held_secs: f32,
    direction: i8,
    carry: f32,
}

impl ArrowHold {
    fn advance(&mut self, direction: i8, dt: f32) -> isize {
        if direction == 0 {
            *self = Self::default();
            return 0;
        }
        if direction != self.direction {
            *self = Self {
                direction,
                ..Self::default()
            };
        }

        self.held_secs += dt;
        let boost = (1.0 + self.held_secs * ARROW_RAMP_PER_SEC).powi(2).min(ARROW_MAX_BOOST);
        self.carry += f32::from(direction) * ARROW_STEPS_PER_SEC * boost * dt;

        let steps = self.carry.trunc();
        self.carry -= steps;
        steps as isize
    }
}

fn accelerate_with_arrows(ui: &Ui, response: &Response, value: &mut usize, range: (usize, usize)) -> bool {
    let id = response.id.with("arrow_hold");
    let mut hold = ui
        .ctx()
        .data(|data| data.get_temp::<ArrowHold>(id))
        .unwrap_or_default();

    let (dt, direction) = if response.has_focus() {
        ui.input(|input| {
            let up = input.key_down(Key::ArrowRight) || input.key_down(Key::ArrowUp);
            let down = input.key_down(Key::ArrowLeft) || input.key_down(Key::ArrowDown);
            (input.stable_dt.min(0.1), i8::from(up) - i8::from(down))
        })
    } else {
        (0.0, 0)
    };

    let steps = hold.advance(direction, dt);
    ui.ctx().data_mut(|data| data.insert_temp(id, hold));
    if direction != 0 {
        ui.ctx().request_repaint();
    }

    let (min, max) = range;
    let next = (*value as isize + steps).clamp(min as isize, max as isize) as usize;
    let changed = next != *value;
    *value = next;
    changed
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Filters");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search entities")
            .on_hover_text("Fuzzy-highlight matching nodes without changing the pruned graph.");
        ui.text_edit_singleline(&mut self.search);

        ui.separator();

        let mut min_size = self.session.min_component_size();
        let max_size = self.session.model().node_count().max(2);
        let min_size_slider = ui
            .add(egui::Slider::new(&mut min_size, 1..=max_size).text("Min component size"))
            .on_hover_text("Hide connected components with fewer nodes than this.");
        if min_size_slider.hovered() {
            min_size_slider.request_focus();
        }
        let mut slider_changed = min_size_slider.changed();
        slider_changed |= accelerate_with_arrows(ui, &min_size_slider, &mut min_size, (1, max_size));
        if slider_changed
            && let Err(error) = self.session.set_min_component_size(min_size, Instant::now())
        {
            self.status = Some(error.to_string());
        }

        ui.separator();

        let mut toggles: Vec<(FilterProperty, FilterValue, bool)> = Vec::new();
        let mut bulk: Vec<(FilterProperty, bool)> = Vec::new();

        egui::ScrollArea::vertical()
            .id_salt("filter_scroll")
            .max_height((ui.available_height() - 120.0).max(120.0))
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for filter in self.session.filters().filters() {
                    let property = filter.property();
                    let header = format!(
                        "{} ({}/{})",
                        property.label(),
                        filter.enabled_count(),
                        filter.len()
                    );
                    egui::CollapsingHeader::new(header)
                        .id_salt(property.key())
                        .default_open(property != FilterProperty::Document)
                        .show(ui, |ui| {
                            ui.horizontal(|ui| {
                                if ui.small_button("all").clicked() {
                                    bulk.push((property, true));
                                }
                                if ui.small_button("none").clicked() {
                                    bulk.push((property, false));
                                }
                            });

                            for entry in filter.entries() {
                                let mut enabled = entry.enabled;
                                let text = format!("{}  ({})", entry.value, entry.live_count);
                                let label = match &entry.value {
                                    FilterValue::Regulation(regulation) => RichText::new(text)
                                        .color(regulation_color(*regulation)),
                                    FilterValue::Text(_) => RichText::new(text),
                                };
                                if ui.checkbox(&mut enabled, label).changed() {
                                    toggles.push((property, entry.value.clone(), enabled));
                                }
                            }
                        });
                }
            });

        let now = Instant::now();
        for (property, enabled) in bulk {
            self.session.set_all(property, enabled, now);
        }
        for (property, value, enabled) in toggles {
            if let Err(error) = self.session.set_filter(property, &value, enabled, now) {
                error!(%error, "filter toggle rejected");
                self.status = Some(error.to_string());
            }
        }

        ui.separator();
        ui.label(RichText::new("Export").strong());
        ui.small(format!("into {}", self.export_dir.display()));
        ui.horizontal_wrapped(|ui| {
            if ui.button("Pruned graph").clicked() {
                self.export("pruned-graph.json", ExportKind::Pruned);
            }
            if ui.button("Full graph").clicked() {
                self.export("full-graph.json", ExportKind::Full);
            }
            if ui.button("3D payload").clicked() {
                self.export("network-3d.json", ExportKind::ThreeD);
            }
        });
    }

    fn export(&mut self, file_name: &str, kind: ExportKind) {
        let path = self.export_dir.join(file_name);
        let model = self.session.model();
        let pruned = self.session.pruned();

        let result = match kind {
            ExportKind::Pruned => write_json(&path, &pruned_graph(model, pruned)),
            ExportKind::Full => write_json(&path, &full_graph(model)),
            ExportKind::ThreeD => {
                let payload = payload_3d(pruned, |node| {
                    let position = self.node_position(node);
                    [position.x, position.y]
                });
                write_json(&path, &payload)
            }
        };

        self.status = match result {
            Ok(()) => Some(format!("wrote {}", path.display())),
            Err(error) => {
                error!("export failed: {error:#}");
                Some(format!("{error:#}"))
            }
        };
    }
}

#[derive(Clone, Copy)]
enum ExportKind {
    Pruned,
    Full,
    ThreeD,
}
