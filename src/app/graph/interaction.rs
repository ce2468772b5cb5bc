use eframe::egui::{self, Context, Key, Rect, Ui, ViewportCommand, pos2};
use tracing::{info, warn};

use super::super::{PointerState, ViewModel};

/// Pointer travel, in pixels, before a press becomes a drag.
const DRAG_THRESHOLD: f32 = 4.0;
const ITERATIONS_PER_FRAME: usize = 2;
const AUTO_ADMIT_BATCH: usize = 100;
const AUTO_ADMIT_COOLDOWN_FRAMES: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) enum KeyAction {
    ToggleRunning,
    Admit(usize),
    Jolt(f32),
    ToggleGrid,
    ToggleLinks,
    ScaleAntiGravity(f32),
    ScaleLinkStrength(f32),
    ToggleTransitiveReduction,
    Zoom(f32),
    Report,
    Quit,
}

const KEY_BINDINGS: &[(Key, KeyAction)] = &[
    (Key::Space, KeyAction::ToggleRunning),
    (Key::A, KeyAction::Admit(1)),
    (Key::B, KeyAction::Admit(10)),
    (Key::C, KeyAction::Admit(100)),
    (Key::D, KeyAction::Admit(1_000)),
    (Key::E, KeyAction::Admit(10_000)),
    (Key::J, KeyAction::Jolt(0.5)),
    (Key::K, KeyAction::Jolt(2.5)),
    (Key::G, KeyAction::ToggleGrid),
    (Key::L, KeyAction::ToggleLinks),
    (Key::Num1, KeyAction::ScaleAntiGravity(0.9)),
    (Key::Num2, KeyAction::ScaleAntiGravity(1.1)),
    (Key::Num3, KeyAction::ScaleLinkStrength(0.9)),
    (Key::Num4, KeyAction::ScaleLinkStrength(1.1)),
    (Key::T, KeyAction::ToggleTransitiveReduction),
    (Key::Plus, KeyAction::Zoom(1.2)),
    (Key::Equals, KeyAction::Zoom(1.2)),
    (Key::Minus, KeyAction::Zoom(0.8)),
    (Key::I, KeyAction::Report),
    (Key::Q, KeyAction::Quit),
];

fn key_action(key: Key) -> Option<KeyAction> {
    KEY_BINDINGS
        .iter()
        .find(|(bound, _)| *bound == key)
        .map(|(_, action)| *action)
}

impl ViewModel {
    pub(in crate::app) fn handle_map_keys(&mut self, ctx: &Context) {
        if ctx.wants_keyboard_input() {
            return;
        }

        let actions = ctx.input(|input| {
            KEY_BINDINGS
                .iter()
                .filter(|(key, _)| input.key_pressed(*key))
                .map(|(key, _)| *key)
                .collect::<Vec<_>>()
        });
        for key in actions {
            if let Some(action) = key_action(key) {
                self.apply_key_action(ctx, action);
            }
        }
    }

    pub(in crate::app) fn apply_key_action(&mut self, ctx: &Context, action: KeyAction) {
        match action {
            KeyAction::ToggleRunning => self.env.toggle_running(),
            KeyAction::Admit(n) => {
                let admitted = self.env.inc_num_papers(n);
                self.status = format!("admitted {admitted} papers");
            }
            KeyAction::Jolt(factor) => self.env.jolt(factor),
            KeyAction::ToggleGrid => self.env.toggle_draw_grid(),
            KeyAction::ToggleLinks => self.env.toggle_draw_links(),
            KeyAction::ScaleAntiGravity(factor) => {
                self.env.adjust_anti_gravity(factor);
                self.status = format!("anti-gravity {:.4}", self.env.anti_gravity());
            }
            KeyAction::ScaleLinkStrength(factor) => {
                self.env.adjust_link_strength(factor);
                self.status = format!("link strength {:.4}", self.env.link_strength());
            }
            KeyAction::ToggleTransitiveReduction => self.env.toggle_transitive_reduction(),
            KeyAction::Zoom(factor) => {
                let centre = self.canvas_size * 0.5;
                self.env.zoom(centre.x, centre.y, factor);
            }
            KeyAction::Report => {
                let stats = self.env.recompute_analytics(true);
                self.status = format!(
                    "{} colours, largest component {} papers",
                    stats.num_colours, stats.largest_size
                );
            }
            KeyAction::Quit => {
                info!("quit requested");
                ctx.send_viewport_cmd(ViewportCommand::Close);
            }
        }
        ctx.request_repaint();
    }

    /// Scroll-wheel zoom about the pointer.
    pub(in crate::app) fn handle_map_zoom(
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
        let focus = pointer - rect.min;
        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.env.zoom(focus.x, focus.y, zoom_factor);
    }

    pub(in crate::app) fn handle_map_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            let delta = response.drag_delta();
            self.env.scroll(delta.x, delta.y);
        }
    }

    /// Primary button: a press that travels past the threshold drags the
    /// paper under it, or scrolls the map when it started on empty space. A
    /// press released in place selects the paper.
    pub(in crate::app) fn handle_map_pointer(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        let (pressed, down, released, position) = ui.input(|input| {
            (
                input.pointer.primary_pressed(),
                input.pointer.primary_down(),
                input.pointer.primary_released(),
                input.pointer.interact_pos(),
            )
        });
        let Some(position) = position else {
            return;
        };
        let local = pos2(position.x - rect.min.x, position.y - rect.min.y);

        if pressed && response.hovered() {
            self.pointer = PointerState {
                held: true,
                dragged: false,
                last: local,
                paper: self.env.get_node_at(local.x, local.y),
            };
            return;
        }
        if !self.pointer.held {
            return;
        }

        if down {
            if !self.pointer.dragged {
                if local.distance(self.pointer.last) > DRAG_THRESHOLD {
                    self.pointer.dragged = true;
                    if let Some(paper) = self.pointer.paper
                        && let Err(error) = self.env.begin_drag(paper)
                    {
                        warn!("cannot drag paper {paper}: {error}");
                        self.pointer.paper = None;
                    }
                }
                return;
            }

            if self.pointer.paper.is_some() {
                self.env.drag_to(local.x, local.y);
            } else {
                let delta = local - self.pointer.last;
                self.env.scroll(delta.x, delta.y);
            }
            self.pointer.last = local;
            return;
        }

        if released {
            if self.pointer.dragged {
                if self.pointer.paper.is_some() {
                    self.env.end_drag();
                }
            } else if let Some(paper) = self.pointer.paper {
                self.select_paper(paper);
            }
        }
        self.pointer = PointerState::default();
    }

    /// Runs the layout for this frame and feeds in more papers whenever it
    /// has settled.
    pub(in crate::app) fn step_engine(&mut self, ctx: &Context) {
        self.admit_cooldown = self.admit_cooldown.saturating_sub(1);
        if !self.env.is_running() {
            return;
        }

        let mut active = true;
        for _ in 0..ITERATIONS_PER_FRAME {
            if self.env.iterate() {
                continue;
            }

            active = false;
            if self.admit_cooldown == 0 && self.env.inc_num_papers(AUTO_ADMIT_BATCH) > 0 {
                self.admit_cooldown = AUTO_ADMIT_COOLDOWN_FRAMES;
                active = true;
            }
            break;
        }

        if active || self.admit_cooldown > 0 {
            ctx.request_repaint();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn every_key_has_one_action() {
        let keys = KEY_BINDINGS
            .iter()
            .map(|(key, _)| *key)
            .collect::<HashSet<_>>();
        assert_eq!(keys.len(), KEY_BINDINGS.len());
    }

    #[test]
    fn admission_keys_grow_by_decades() {
        let batches = [Key::A, Key::B, Key::C, Key::D, Key::E].map(key_action);
        assert_eq!(
            batches,
            [1, 10, 100, 1_000, 10_000].map(|n| Some(KeyAction::Admit(n)))
        );
        assert_eq!(key_action(Key::Equals), key_action(Key::Plus));
        assert_eq!(key_action(Key::Z), None);
    }
}
