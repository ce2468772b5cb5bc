mod forces;
mod quadtree;

use eframe::egui::Vec2;

use crate::paper::{PaperGraph, TredMark};
use forces::{CloseRepulsion, accumulate_close_repulsion, anti_gravity_pull, link_spring};
pub use quadtree::QuadtreeCell;
use quadtree::{QuadNode, collect_quadtree_cells};

const NOT_ACTIVE: u32 = u32::MAX;
const FORCE_SCALE: f32 = 0.055;
const VELOCITY_DAMPING: f32 = 0.86;
const SPRING_DAMPING: f32 = 0.22;
const MAX_FORCE: f32 = 240.0;
const MAX_SPEED: f32 = 24.0;
const MIN_SLEEP_SPEED: f32 = 0.02;
const MIN_SLEEP_FORCE: f32 = 0.08;

/// Force constants for one step, snapshotted from the session.
#[derive(Clone, Copy, Debug)]
pub struct ForceParams {
    pub close_repulsion_a: f32,
    pub close_repulsion_b: f32,
    pub close_repulsion_c: f32,
    pub close_repulsion_d: f32,
    pub anti_gravity: f32,
    pub anti_gravity_falloff_rsq: f32,
    pub link_strength: f32,
    pub fake_link_strength: f32,
    pub use_ref_freq: f32,
    pub use_tred: bool,
}

/// Buffers reused between steps so a step allocates nothing once warm.
#[derive(Default)]
pub struct PhysicsScratch {
    active: Vec<usize>,
    slot_of: Vec<u32>,
    positions: Vec<Vec2>,
    radii: Vec<f32>,
    forces: Vec<Vec2>,
    centroid_sums: Vec<Vec2>,
    centroid_masses: Vec<f32>,
}

impl PhysicsScratch {
    fn gather(&mut self, graph: &PaperGraph) -> f32 {
        self.active.clear();
        self.positions.clear();
        self.radii.clear();
        self.slot_of.clear();
        self.slot_of.resize(graph.len(), NOT_ACTIVE);

        let mut max_radius = 0.0_f32;
        for paper in graph.papers().iter().filter(|paper| paper.included) {
            self.slot_of[paper.index] = self.active.len() as u32;
            self.active.push(paper.index);
            self.positions.push(paper.pos);
            self.radii.push(paper.radius);
            max_radius = max_radius.max(paper.radius);
        }

        self.forces.clear();
        self.forces.resize(self.active.len(), Vec2::ZERO);
        max_radius
    }

    fn slot(&self, index: usize) -> Option<usize> {
        match self.slot_of.get(index) {
            Some(&slot) if slot != NOT_ACTIVE => Some(slot as usize),
            _ => None,
        }
    }
}

/// Partition cells over the included papers, for the grid overlay.
pub fn quadtree_cells(graph: &PaperGraph, positions: &mut Vec<Vec2>, cells: &mut Vec<QuadtreeCell>) {
    positions.clear();
    positions.extend(
        graph
            .papers()
            .iter()
            .filter(|paper| paper.included)
            .map(|paper| paper.pos),
    );

    cells.clear();
    let Some(quadtree) = QuadNode::build(positions) else {
        return;
    };

    collect_quadtree_cells(&quadtree, 0, cells);
}

/// Whether a reference acts as a spring this step.
pub(crate) fn link_retained(use_tred: bool, mark: TredMark) -> bool {
    !use_tred || mark != TredMark::Redundant
}

/// One damped integration step over the included papers. The dragged paper
/// keeps its position and has its velocity cleared. Returns whether any
/// paper is still moving.
pub fn step_layout(
    graph: &mut PaperGraph,
    params: &ForceParams,
    dragged: Option<usize>,
    scratch: &mut PhysicsScratch,
) -> bool {
    let max_radius = scratch.gather(graph);
    let active_count = scratch.active.len();
    if active_count == 0 {
        return false;
    }

    accumulate_repulsion(scratch, params, max_radius);
    accumulate_anti_gravity(graph, scratch, params);
    accumulate_links(graph, scratch, params);
    integrate(graph, scratch, dragged)
}

fn accumulate_repulsion(scratch: &mut PhysicsScratch, params: &ForceParams, max_radius: f32) {
    let max_range = (max_radius * 2.0) * params.close_repulsion_c;
    if max_range <= 0.0 || params.close_repulsion_a < 0.0 {
        return;
    }
    let Some(quadtree) = QuadNode::build(&scratch.positions) else {
        return;
    };

    accumulate_close_repulsion(
        &quadtree,
        &quadtree,
        true,
        &scratch.positions,
        &scratch.radii,
        CloseRepulsion {
            strength: params.close_repulsion_a,
            softening: params.close_repulsion_b.max(0.01),
            range_factor: params.close_repulsion_c,
            overlap_strength: params.close_repulsion_d,
            max_range_sq: max_range * max_range,
        },
        &mut scratch.forces,
    );
}

/// Papers coloured `c > 0` are pulled towards the mass-weighted centroid of
/// component `c`; papers admitted since the last recompute (colour 0) towards
/// the centroid of everything included.
fn accumulate_anti_gravity(graph: &PaperGraph, scratch: &mut PhysicsScratch, params: &ForceParams) {
    if params.anti_gravity == 0.0 {
        return;
    }

    let buckets = scratch
        .active
        .iter()
        .map(|&index| graph.papers()[index].colour as usize)
        .max()
        .unwrap_or(0)
        + 1;
    scratch.centroid_sums.clear();
    scratch.centroid_sums.resize(buckets, Vec2::ZERO);
    scratch.centroid_masses.clear();
    scratch.centroid_masses.resize(buckets, 0.0);

    for &index in &scratch.active {
        let paper = &graph.papers()[index];
        let weight = paper.mass.max(0.05);
        scratch.centroid_sums[0] += paper.pos * weight;
        scratch.centroid_masses[0] += weight;
        if paper.colour != 0 {
            scratch.centroid_sums[paper.colour as usize] += paper.pos * weight;
            scratch.centroid_masses[paper.colour as usize] += weight;
        }
    }

    for (slot, &index) in scratch.active.iter().enumerate() {
        let paper = &graph.papers()[index];
        let bucket = paper.colour as usize;
        let centroid = scratch.centroid_sums[bucket] / scratch.centroid_masses[bucket];
        scratch.forces[slot] += anti_gravity_pull(
            centroid - paper.pos,
            params.anti_gravity,
            params.anti_gravity_falloff_rsq,
        ) * paper.mass.max(1.0);
    }
}

fn accumulate_links(graph: &PaperGraph, scratch: &mut PhysicsScratch, params: &ForceParams) {
    let papers = graph.papers();
    for (from_slot, &from) in scratch.active.iter().enumerate() {
        let source = &papers[from];

        for (reference, &mark) in source.refs.iter().zip(&source.tred.refs_marks) {
            if reference.target == from || !link_retained(params.use_tred, mark) {
                continue;
            }
            let Some(to_slot) = scratch.slot(reference.target) else {
                continue;
            };

            let frequency_boost =
                1.0 + params.use_ref_freq * f32::from(reference.ref_freq.saturating_sub(1));
            let stiffness = params.link_strength * reference.other_weight * frequency_boost;
            let target = &papers[reference.target];
            let correction = link_spring(
                source.pos - target.pos,
                source.velocity - target.velocity,
                source.radius + target.radius,
                stiffness,
                SPRING_DAMPING,
            );
            scratch.forces[from_slot] -= correction;
            scratch.forces[to_slot] += correction;
        }

        for &other in &source.fake_links {
            let Some(to_slot) = scratch.slot(other) else {
                continue;
            };
            let target = &papers[other];
            let correction = link_spring(
                source.pos - target.pos,
                source.velocity - target.velocity,
                source.radius + target.radius,
                params.link_strength * params.fake_link_strength,
                SPRING_DAMPING,
            );
            scratch.forces[from_slot] -= correction;
            scratch.forces[to_slot] += correction;
        }
    }
}

fn integrate(graph: &mut PaperGraph, scratch: &PhysicsScratch, dragged: Option<usize>) -> bool {
    let max_force_sq = MAX_FORCE * MAX_FORCE;
    let max_speed_sq = MAX_SPEED * MAX_SPEED;
    let min_sleep_speed_sq = MIN_SLEEP_SPEED * MIN_SLEEP_SPEED;
    let min_sleep_force_sq = MIN_SLEEP_FORCE * MIN_SLEEP_FORCE;
    let mut any_motion = false;

    for (slot, &index) in scratch.active.iter().enumerate() {
        let paper = &mut graph.papers[index];
        if Some(index) == dragged {
            paper.velocity = Vec2::ZERO;
            continue;
        }

        let mut force = scratch.forces[slot];
        let force_sq = force.length_sq();
        if force_sq > max_force_sq {
            force *= MAX_FORCE / force_sq.sqrt();
        }

        let inertia = paper.mass.max(1.0);
        let mut velocity = (paper.velocity + force * (FORCE_SCALE / inertia)) * VELOCITY_DAMPING;
        let mut speed_sq = velocity.length_sq();
        if speed_sq > max_speed_sq {
            velocity *= MAX_SPEED / speed_sq.sqrt();
            speed_sq = max_speed_sq;
        }

        if speed_sq < min_sleep_speed_sq && force_sq < min_sleep_force_sq {
            velocity = Vec2::ZERO;
            speed_sq = 0.0;
        }

        paper.velocity = velocity;
        paper.pos += velocity;
        if speed_sq > 0.000_001 {
            any_motion = true;
        }
    }

    any_motion
}
