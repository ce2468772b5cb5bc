use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use anyhow::Context as _;
use eframe::egui::{self, Context, Pos2, Vec2};
use tracing::{error, info};

use paper_map::config::MapConfig;
use paper_map::map::MapEnv;
use paper_map::paper::{PaperGraph, load_papers};

mod graph;
mod ui;

/// Where the papers come from and how the session starts.
#[derive(Clone, Debug)]
pub struct LoadRequest {
    pub papers_path: PathBuf,
    pub categories: Vec<String>,
    pub config: MapConfig,
    pub initial_papers: usize,
}

pub struct PaperMapApp {
    request: LoadRequest,
    state: AppState,
    reload_rx: Option<Receiver<Result<PaperGraph, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<PaperGraph, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    env: MapEnv,
    papers_label: String,
    search: String,
    search_cache: Option<SearchCache>,
    selected: Option<usize>,
    status: String,
    pointer: PointerState,
    admit_cooldown: u32,
    canvas_size: Vec2,
}

struct SearchCache {
    query: String,
    num_included: usize,
    hits: Vec<usize>,
}

/// Primary button state on the map canvas, in canvas coordinates.
#[derive(Clone, Copy, Debug, Default)]
struct PointerState {
    held: bool,
    dragged: bool,
    last: Pos2,
    paper: Option<usize>,
}

impl PaperMapApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, request: LoadRequest) -> Self {
        let state = Self::start_load(&request);
        Self {
            request,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(request: &LoadRequest) -> Receiver<Result<PaperGraph, String>> {
        let (tx, rx) = mpsc::channel();
        let papers_path = request.papers_path.clone();
        let categories = request.categories.clone();

        thread::spawn(move || {
            let result = load_papers(&papers_path, &categories)
                .and_then(|records| {
                    PaperGraph::build(records).context("failed to build the paper graph")
                })
                .map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(request: &LoadRequest) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(request),
        }
    }

    fn finish_load(&self, result: Result<PaperGraph, String>) -> AppState {
        match result {
            Ok(graph) => AppState::Ready(Box::new(ViewModel::new(graph, &self.request))),
            Err(message) => {
                error!("loading papers failed: {message}");
                AppState::Error(message)
            }
        }
    }
}

impl eframe::App for PaperMapApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => transition = Some(result),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading papers...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                let mut retry = false;
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load papers");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
                if retry {
                    info!("retrying load of {}", self.request.papers_path.display());
                    self.state = Self::start_load(&self.request);
                }
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    info!("reloading {}", self.request.papers_path.display());
                    self.reload_rx = Some(Self::spawn_load(&self.request));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => transition = Some(result),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(Err("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if let Some(result) = transition {
            self.reload_rx = None;
            self.state = self.finish_load(result);
        }
    }
}
