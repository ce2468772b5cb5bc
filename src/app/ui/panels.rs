use eframe::egui::{self, Align, Context, Layout, Vec2};
use tracing::info;

use paper_map::map::MapEnv;
use paper_map::paper::PaperGraph;

use super::super::{LoadRequest, PointerState, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(graph: PaperGraph, request: &LoadRequest) -> Self {
        let mut env = MapEnv::new(graph, request.config.clone());
        let admitted = env.inc_num_papers(request.initial_papers);
        let stats = env.recompute_analytics(true);
        info!(
            admitted,
            colours = stats.num_colours,
            largest = stats.largest_size,
            "map ready"
        );

        Self {
            env,
            papers_label: request.papers_path.display().to_string(),
            search: String::new(),
            search_cache: None,
            selected: None,
            status: String::from("click a paper to describe it"),
            pointer: PointerState::default(),
            admit_cooldown: 0,
            canvas_size: Vec2::ZERO,
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("paper-map");
                    ui.separator();
                    ui.label(format!("papers: {}", self.papers_label));
                    ui.label(format!("total: {}", self.env.graph().len()));
                    ui.label(format!("references: {}", self.env.graph().num_refs()));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload papers"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!("included: {}", self.env.graph().num_included()));
                    });
                });
            });

        egui::TopBottomPanel::bottom("status_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(self.status.as_str());
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_map(ui));
    }
}
