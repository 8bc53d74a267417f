use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use disease_network::documents::{DocumentViewer, ViewerRequest};
use disease_network::engine::{EngineConfig, FilterProperty, FilterValue, Session};
use disease_network::interaction::InteractionState;
use disease_network::network::{EntityGroup, Regulation, load_graph};
use eframe::egui::{self, Context, Pos2, Vec2};
use tracing::error;

mod graph;
mod render_utils;
mod ui;

#[derive(Clone, Debug)]
pub struct LaunchConfig {
    pub graph_path: PathBuf,
    pub docs_dir: Option<PathBuf>,
    pub engine: EngineConfig,
    pub disabled: Vec<(FilterProperty, FilterValue)>,
    pub export_dir: PathBuf,
}

pub struct DiseaseNetworkApp {
    launch: LaunchConfig,
    state: AppState,
}

type LoadResult = Result<Loaded, String>;

struct Loaded {
    session: Session,
    documents: DocumentViewer,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Selection {
    Node(usize),
    Edge(usize),
}

struct ViewModel {
    session: Session,
    documents: DocumentViewer,
    interaction: InteractionState,
    export_dir: PathBuf,
    search: String,
    selected: Option<Selection>,
    pan: Vec2,
    zoom: f32,
    dragging: Option<usize>,
    render_graph_revision: u64,
    graph_cache: Option<RenderGraph>,
    search_match_cache: Option<SearchMatchCache>,
    viewer_request: Option<ViewerRequest>,
    status: Option<String>,
}

struct SearchMatchCache {
    query: String,
    graph_revision: u64,
    matches: Arc<HashSet<usize>>,
}

struct RenderGraph {
    nodes: Vec<RenderNode>,
    edges: Vec<RenderEdge>,
    index_by_base: HashMap<usize, usize>,
    view_scratch: ViewScratch,
}

struct ViewScratch {
    screen_positions: Vec<Pos2>,
    screen_radii: Vec<f32>,
    visible_indices: Vec<usize>,
}

struct RenderNode {
    base_index: usize,
    id: String,
    name: String,
    group: EntityGroup,
    world_pos: Vec2,
    radius: f32,
}

struct RenderEdge {
    base_index: usize,
    source: usize,
    target: usize,
    width: f32,
    regulation: Regulation,
    label: String,
}

impl DiseaseNetworkApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, launch: LaunchConfig) -> Self {
        let state = Self::start_load(launch.clone());
        Self { launch, state }
    }

    fn spawn_load(launch: LaunchConfig) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = Self::load(&launch).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn load(launch: &LaunchConfig) -> anyhow::Result<Loaded> {
        let model = Arc::new(load_graph(&launch.graph_path)?);
        let mut session = Session::new(model, launch.engine)?;
        let now = Instant::now();
        for (property, value) in &launch.disabled {
            session.set_filter(*property, value, false, now)?;
        }
        session.flush()?;

        Ok(Loaded {
            session,
            documents: DocumentViewer::with_directory(launch.docs_dir.clone()),
        })
    }

    fn start_load(launch: LaunchConfig) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(launch),
        }
    }
}

impl eframe::App for DiseaseNetworkApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(match result {
                        Ok(loaded) => AppState::Ready(Box::new(ViewModel::new(
                            loaded.session,
                            loaded.documents,
                            self.launch.export_dir.clone(),
                        ))),
                        Err(message) => {
                            error!(%message, "failed to load disease network");
                            AppState::Error(message)
                        }
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading disease network...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint();
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load disease network");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.launch.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                model.show(ctx, &self.launch.graph_path, &mut reload_requested);
                if reload_requested {
                    transition = Some(Self::start_load(self.launch.clone()));
                }
            }
        }

        if let Some(next_state) = transition {
            self.state = next_state;
        }
    }
}
