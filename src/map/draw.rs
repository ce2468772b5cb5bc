use eframe::egui::{Color32, Pos2, Rect, vec2};

use super::MapEnv;
use super::hit::MIN_SCREEN_RADIUS;
use super::physics::{link_retained, quadtree_cells};
use super::render_utils::{circle_visible, edge_visible, paper_color};

/// One thing to paint, already in screen coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    /// A square of the spatial partition.
    Cell { rect: Rect, depth: usize, leaf: bool },
    Link { from: Pos2, to: Pos2 },
    /// A layout-only link between components.
    FakeLink { from: Pos2, to: Pos2 },
    Disc {
        centre: Pos2,
        radius: f32,
        colour: Color32,
        index: usize,
    },
}

/// Everything visible in a `width` x `height` viewport, back to front, plus
/// text diagnostics.
#[derive(Clone, Debug, Default)]
pub struct DrawFrame {
    pub primitives: Vec<Primitive>,
    pub lines: Vec<String>,
}

impl MapEnv {
    /// Culls the map to the viewport. The first call centres the world
    /// origin in the viewport. While paused it also settles pending
    /// admissions, which `iterate` would otherwise do.
    pub fn draw(&mut self, width: f32, height: f32) -> DrawFrame {
        self.settle_while_paused();
        if !self.view_centred {
            self.view.offset = vec2(width * 0.5, height * 0.5);
            self.view_centred = true;
        }

        let rect = Rect::from_min_size(Pos2::ZERO, vec2(width, height));
        let mut frame = DrawFrame::default();
        if self.draw_grid {
            self.push_grid(rect, &mut frame);
        }
        if self.draw_links {
            self.push_links(rect, &mut frame);
        }
        self.push_discs(rect, &mut frame);
        self.push_lines(&mut frame);
        frame
    }

    fn push_grid(&mut self, rect: Rect, frame: &mut DrawFrame) {
        quadtree_cells(&self.graph, &mut self.grid_positions, &mut self.grid_cells);
        for cell in &self.grid_cells {
            let half = vec2(cell.half_extent, cell.half_extent);
            let cell_rect = Rect::from_min_max(
                self.view.world_to_screen(cell.center - half),
                self.view.world_to_screen(cell.center + half),
            );
            if cell_rect.intersects(rect) {
                frame.primitives.push(Primitive::Cell {
                    rect: cell_rect,
                    depth: cell.depth,
                    leaf: cell.is_leaf,
                });
            }
        }
    }

    fn push_links(&self, rect: Rect, frame: &mut DrawFrame) {
        let papers = self.graph.papers();
        for paper in papers.iter().filter(|paper| paper.included) {
            let from = self.view.world_to_screen(paper.pos);

            for (reference, &mark) in paper.refs.iter().zip(&paper.tred.refs_marks) {
                let target = &papers[reference.target];
                if !target.included
                    || target.index == paper.index
                    || !link_retained(self.use_tred, mark)
                {
                    continue;
                }
                let to = self.view.world_to_screen(target.pos);
                if edge_visible(rect, from, to, 1.0) {
                    frame.primitives.push(Primitive::Link { from, to });
                }
            }

            for &other in &paper.fake_links {
                let target = &papers[other];
                if !target.included {
                    continue;
                }
                let to = self.view.world_to_screen(target.pos);
                if edge_visible(rect, from, to, 1.0) {
                    frame.primitives.push(Primitive::FakeLink { from, to });
                }
            }
        }
    }

    fn push_discs(&self, rect: Rect, frame: &mut DrawFrame) {
        let largest = self.components.largest_colour;
        for paper in self.graph.papers().iter().filter(|paper| paper.included) {
            let centre = self.view.world_to_screen(paper.pos);
            let radius = self.view.screen_length(paper.radius).max(MIN_SCREEN_RADIUS);
            if !circle_visible(rect, centre, radius) {
                continue;
            }

            let minor = paper.colour != 0 && paper.colour != largest;
            let colour = paper_color(paper.main_category(), paper.age, minor);
            frame.primitives.push(Primitive::Disc {
                centre,
                radius,
                colour,
                index: paper.index,
            });
        }
    }

    fn push_lines(&self, frame: &mut DrawFrame) {
        let stats = &self.components;
        frame.lines.push(format!(
            "included papers: {} of {} ({} waiting)",
            self.graph.num_included(),
            self.graph.len(),
            self.admission.remaining()
        ));
        frame.lines.push(format!(
            "{} colours, largest component {} papers",
            stats.num_colours, stats.largest_size
        ));
        frame.lines.push(format!(
            "anti-gravity {:.4}, link strength {:.4}",
            self.anti_gravity, self.link_strength
        ));
        frame.lines.push(match (self.use_tred, self.transitive_reduction()) {
            (false, _) => "transitive reduction off".to_owned(),
            (true, Some(reduction)) => format!(
                "transitive reduction on: {} links kept, {} removed",
                reduction.edges.len(),
                reduction.removed
            ),
            (true, None) => "transitive reduction on: pending".to_owned(),
        });
        frame.lines.push(format!(
            "zoom {:.3}, {}{}",
            self.view.scale,
            if self.running { "running" } else { "paused" },
            if self.last_moving { ", moving" } else { "" }
        ));
    }
}
