use std::collections::HashSet;

use eframe::egui::{
    Align2, Color32, CursorIcon, FontId, Painter, Pos2, Rect, Sense, Stroke, Ui, vec2,
};

use paper_map::map::{DrawFrame, Primitive};

use super::super::ViewModel;

const BACKGROUND: Color32 = Color32::from_rgb(19, 23, 29);
const LINK_COLOR: Color32 = Color32::from_rgba_premultiplied(92, 104, 120, 120);
const FAKE_LINK_COLOR: Color32 = Color32::from_rgba_premultiplied(66, 38, 60, 90);
const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
const SEARCH_HIT_COLOR: Color32 = Color32::from_rgb(106, 198, 255);

fn paint_cell(painter: &Painter, rect: Rect, depth: usize, leaf: bool) {
    let alpha = if leaf { 110 } else { 55 };
    let line_width: f32 = (1.4_f32 - (depth as f32 * 0.09_f32)).clamp(0.45_f32, 1.4_f32);
    let stroke = Stroke::new(
        line_width,
        Color32::from_rgba_unmultiplied(106, 198, 255, alpha),
    );

    painter.line_segment([rect.left_top(), rect.right_top()], stroke);
    painter.line_segment([rect.right_top(), rect.right_bottom()], stroke);
    painter.line_segment([rect.right_bottom(), rect.left_bottom()], stroke);
    painter.line_segment([rect.left_bottom(), rect.left_top()], stroke);
}

impl ViewModel {
    pub(in crate::app) fn draw_map(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, BACKGROUND);
        self.canvas_size = rect.size();

        self.handle_map_keys(ui.ctx());
        self.handle_map_zoom(ui, rect, &response);
        self.handle_map_pan(&response);
        self.handle_map_pointer(ui, rect, &response);
        self.step_engine(ui.ctx());

        let frame = self.env.draw(rect.width(), rect.height());
        let search_hits = self.search_hits().iter().copied().collect::<HashSet<_>>();
        self.paint_frame(&painter, rect, &frame, &search_hits);

        if response.hovered()
            && let Some(pointer) = ui.input(|input| input.pointer.hover_pos())
            && self
                .env
                .get_node_at(pointer.x - rect.min.x, pointer.y - rect.min.y)
                .is_some()
        {
            ui.ctx().set_cursor_icon(CursorIcon::PointingHand);
        }
    }

    fn paint_frame(
        &self,
        painter: &Painter,
        rect: Rect,
        frame: &DrawFrame,
        search_hits: &HashSet<usize>,
    ) {
        let origin = rect.min.to_vec2();
        let place = |point: Pos2| point + origin;

        for primitive in &frame.primitives {
            match primitive {
                Primitive::Cell {
                    rect: cell,
                    depth,
                    leaf,
                } => paint_cell(painter, cell.translate(origin), *depth, *leaf),
                Primitive::Link { from, to } => {
                    painter.line_segment([place(*from), place(*to)], Stroke::new(1.0, LINK_COLOR));
                }
                Primitive::FakeLink { from, to } => {
                    painter.line_segment(
                        [place(*from), place(*to)],
                        Stroke::new(1.0, FAKE_LINK_COLOR),
                    );
                }
                Primitive::Disc {
                    centre,
                    radius,
                    colour,
                    index,
                } => {
                    let position = place(*centre);
                    painter.circle_filled(position, *radius, *colour);

                    if self.selected == Some(*index) {
                        painter.circle_stroke(
                            position,
                            radius + 4.0,
                            Stroke::new(1.8, SELECTED_COLOR),
                        );
                    } else if search_hits.contains(index) {
                        painter.circle_stroke(
                            position,
                            radius + 3.0,
                            Stroke::new(1.4, SEARCH_HIT_COLOR),
                        );
                    }
                    if *radius > 5.0 {
                        painter.circle_stroke(
                            position,
                            *radius,
                            Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190)),
                        );
                    }
                }
            }
        }

        let mut text_pos = rect.left_top() + vec2(10.0, 10.0);
        for line in &frame.lines {
            painter.text(
                text_pos,
                Align2::LEFT_TOP,
                line,
                FontId::monospace(12.0),
                Color32::from_gray(230),
            );
            text_pos.y += 16.0;
        }
    }

    pub(in crate::app) fn select_paper(&mut self, paper: usize) {
        match self.env.paper_info(paper) {
            Ok(info) => {
                self.status = info.to_string();
                self.selected = Some(paper);
            }
            Err(error) => {
                self.status = error.to_string();
                self.selected = None;
            }
        }
    }

    /// Selects a paper and scrolls the map so it sits in the middle of the
    /// canvas.
    pub(in crate::app) fn focus_paper(&mut self, paper: usize) {
        self.select_paper(paper);
        let Some(pos) = self.env.graph().papers().get(paper).map(|paper| paper.pos) else {
            return;
        };
        let on_screen = self.env.world_to_screen(pos);
        let centre = (self.canvas_size * 0.5).to_pos2();
        let delta = centre - on_screen;
        self.env.scroll(delta.x, delta.y);
    }
}
