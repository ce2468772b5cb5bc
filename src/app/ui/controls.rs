use eframe::egui::{self, Ui};

use super::super::graph::KeyAction;
use super::super::{SearchCache, ViewModel};

const SEARCH_RESULT_ROWS: usize = 12;

impl ViewModel {
    /// Fuzzy matches for the search box, recomputed when the query or the
    /// included set changes.
    pub(in crate::app) fn search_hits(&mut self) -> &[usize] {
        let query = self.search.trim();
        let num_included = self.env.graph().num_included();
        let stale = self
            .search_cache
            .as_ref()
            .is_none_or(|cache| cache.query != query || cache.num_included != num_included);

        if stale {
            let hits = self.env.find_papers(query, SEARCH_RESULT_ROWS);
            self.search_cache = Some(SearchCache {
                query: query.to_owned(),
                num_included,
                hits,
            });
        }

        self.search_cache
            .as_ref()
            .map(|cache| cache.hits.as_slice())
            .unwrap_or_default()
    }

    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Map Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search (title or authors)")
            .on_hover_text("Fuzzy-highlight matching papers already on the map.");
        ui.text_edit_singleline(&mut self.search)
            .on_hover_text("Type to highlight matching papers, then click one to centre it.");

        let mut focus = None;
        let hits = self.search_hits().to_vec();
        if !hits.is_empty() {
            egui::ScrollArea::vertical()
                .id_salt("search_hits")
                .max_height(200.0)
                .show(ui, |ui| {
                    for index in hits {
                        let Some(paper) = self.env.graph().papers().get(index) else {
                            continue;
                        };
                        let label = format!("{} -- {}", paper.id, paper.title);
                        let selected = self.selected == Some(index);
                        if ui.selectable_label(selected, label).clicked() {
                            focus = Some(index);
                        }
                    }
                });
        }
        if let Some(index) = focus {
            self.focus_paper(index);
        }

        ui.separator();

        let mut draw_links = self.env.draws_links();
        if ui
            .checkbox(&mut draw_links, "Draw links")
            .on_hover_text("Show citation links between included papers. [l]")
            .changed()
        {
            self.env.toggle_draw_links();
        }

        let mut draw_grid = self.env.draws_grid();
        if ui
            .checkbox(&mut draw_grid, "Draw quadtree")
            .on_hover_text("Overlay the spatial partition used by the layout. [g]")
            .changed()
        {
            self.env.toggle_draw_grid();
        }

        let mut use_tred = self.env.uses_transitive_reduction();
        if ui
            .checkbox(&mut use_tred, "Transitive reduction")
            .on_hover_text("Hide and ignore links implied by longer citation chains. [t]")
            .changed()
        {
            self.env.toggle_transitive_reduction();
        }

        ui.separator();

        let ctx = ui.ctx().clone();
        ui.horizontal(|ui| {
            let label = if self.env.is_running() {
                "Pause"
            } else {
                "Resume"
            };
            if ui.button(label).on_hover_text("[space]").clicked() {
                self.apply_key_action(&ctx, KeyAction::ToggleRunning);
            }
            if ui
                .button("Report")
                .on_hover_text("Recount components and log the size histogram. [i]")
                .clicked()
            {
                self.apply_key_action(&ctx, KeyAction::Report);
            }
        });

        ui.label("Admit papers");
        ui.horizontal_wrapped(|ui| {
            for n in [1, 10, 100, 1_000, 10_000] {
                if ui.button(format!("+{n}")).clicked() {
                    self.apply_key_action(&ctx, KeyAction::Admit(n));
                }
            }
        });

        ui.label("Jolt");
        ui.horizontal(|ui| {
            if ui.button("Gentle").on_hover_text("[j]").clicked() {
                self.apply_key_action(&ctx, KeyAction::Jolt(0.5));
            }
            if ui.button("Hard").on_hover_text("[k]").clicked() {
                self.apply_key_action(&ctx, KeyAction::Jolt(2.5));
            }
        });

        ui.separator();

        ui.label(format!("Anti-gravity: {:.4}", self.env.anti_gravity()));
        ui.horizontal(|ui| {
            if ui.button("x0.9").on_hover_text("[1]").clicked() {
                self.apply_key_action(&ctx, KeyAction::ScaleAntiGravity(0.9));
            }
            if ui.button("x1.1").on_hover_text("[2]").clicked() {
                self.apply_key_action(&ctx, KeyAction::ScaleAntiGravity(1.1));
            }
        });

        ui.label(format!("Link strength: {:.4}", self.env.link_strength()));
        ui.horizontal(|ui| {
            if ui.button("x0.9").on_hover_text("[3]").clicked() {
                self.apply_key_action(&ctx, KeyAction::ScaleLinkStrength(0.9));
            }
            if ui.button("x1.1").on_hover_text("[4]").clicked() {
                self.apply_key_action(&ctx, KeyAction::ScaleLinkStrength(1.1));
            }
        });

        ui.separator();

        let stats = self.env.components();
        ui.label(format!(
            "{} components, largest {} papers",
            stats.num_colours, stats.largest_size
        ));
        if let Some(index) = self.selected
            && let Ok(info) = self.env.paper_info(index)
        {
            ui.add_space(6.0);
            ui.strong(format!("paper {} ({})", info.id, info.category));
            ui.label(info.title);
            ui.label(info.authors);
            ui.label(format!(
                "{} refs, {} cites ({} on the map), component of {}",
                info.num_refs, info.num_cites, info.num_included_cites, info.component_size
            ));
        }
    }
}
