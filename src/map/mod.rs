mod admission;
mod draw;
mod hit;
mod links;
mod physics;
mod query;
mod render_utils;
mod view;

use eframe::egui::{Pos2, Vec2, pos2, vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::config::MapConfig;
use crate::error::{MapError, Result};
use crate::paper::{ComponentStats, PaperGraph, TransitiveReduction, TredJob};
use admission::Admission;
pub use draw::{DrawFrame, Primitive};
use links::rebuild_fake_links;
use physics::{ForceParams, PhysicsScratch, QuadtreeCell, step_layout};
pub use query::PaperInfo;
pub use view::ViewTransform;

/// Displacement of a unit jolt, in multiples of a paper's radius.
const JOLT_SCALE: f32 = 4.0;
/// Condensation edges the transitive reduction may walk per step.
const TRED_STEP_BUDGET: usize = 200_000;

struct TredCache {
    revision: u64,
    reduction: TransitiveReduction,
}

struct TredProgress {
    revision: u64,
    job: TredJob,
}

/// One interactive session over a loaded paper graph: the growing included
/// set, the layout, the force constants and the view.
pub struct MapEnv {
    graph: PaperGraph,
    config: MapConfig,
    anti_gravity: f32,
    link_strength: f32,
    close_repulsion: f32,
    view: ViewTransform,
    view_centred: bool,
    draw_grid: bool,
    draw_links: bool,
    use_tred: bool,
    running: bool,
    dragged: Option<usize>,
    admission: Admission,
    /// Bumped whenever the included set grows.
    included_revision: u64,
    components: ComponentStats,
    tred: Option<TredCache>,
    tred_progress: Option<TredProgress>,
    /// Papers admitted since the last finished reduction.
    tred_changed: Vec<usize>,
    rng: StdRng,
    physics_scratch: PhysicsScratch,
    grid_positions: Vec<Vec2>,
    grid_cells: Vec<QuadtreeCell>,
    last_moving: bool,
}

impl MapEnv {
    pub fn new(graph: PaperGraph, config: MapConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.admission_seed);
        let admission = Admission::new(&graph, config.ids_time_ordered, &mut rng);
        info!(
            papers = graph.len(),
            refs = graph.num_refs(),
            time_ordered = config.ids_time_ordered,
            "map session ready"
        );

        Self {
            anti_gravity: config.anti_gravity,
            link_strength: config.link_strength,
            close_repulsion: config.initial_close_repulsion,
            graph,
            config,
            view: ViewTransform::default(),
            view_centred: false,
            draw_grid: false,
            draw_links: true,
            use_tred: true,
            running: true,
            dragged: None,
            admission,
            included_revision: 0,
            components: ComponentStats::default(),
            tred: None,
            tred_progress: None,
            tred_changed: Vec::new(),
            rng,
            physics_scratch: PhysicsScratch::default(),
            grid_positions: Vec::new(),
            grid_cells: Vec::new(),
            last_moving: false,
        }
    }

    /// Advances the layout by one step. Returns `true` while papers are
    /// still moving or growing, while an admission recompute is pending, or
    /// while the transitive reduction is catching up.
    pub fn iterate(&mut self) -> bool {
        self.settle_admissions();
        let reducing = self.use_tred && self.refresh_transitive_reduction();

        let params = self.force_params();
        let moving = step_layout(
            &mut self.graph,
            &params,
            self.dragged,
            &mut self.physics_scratch,
        );
        let growing = self.grow_papers();
        self.last_moving = moving;

        moving || growing || reducing || self.admission.pending()
    }

    fn force_params(&self) -> ForceParams {
        ForceParams {
            close_repulsion_a: self.config.close_repulsion_a * self.close_repulsion,
            close_repulsion_b: self.config.close_repulsion_b,
            close_repulsion_c: self.config.close_repulsion_c,
            close_repulsion_d: self.config.close_repulsion_d * self.close_repulsion,
            anti_gravity: self.anti_gravity,
            anti_gravity_falloff_rsq: self.config.anti_gravity_falloff_rsq,
            link_strength: self.link_strength,
            fake_link_strength: self.config.fake_link_strength,
            use_ref_freq: self.config.use_ref_freq,
            use_tred: self.use_tred,
        }
    }

    /// Works the reduction towards the current included set, one budgeted
    /// slice per call. Until it catches up the previous marks stay in place:
    /// growing the included set only adds paths, so an edge found redundant
    /// stays so. Returns whether work remains.
    fn refresh_transitive_reduction(&mut self) -> bool {
        if self.admission.pending() {
            return false;
        }
        let revision = self.included_revision;
        if self
            .tred
            .as_ref()
            .is_some_and(|cache| cache.revision == revision)
        {
            return false;
        }

        if self
            .tred_progress
            .as_ref()
            .is_none_or(|progress| progress.revision != revision)
        {
            let job = self.graph.start_transitive_reduction(&self.tred_changed);
            self.tred_progress = Some(TredProgress { revision, job });
        }
        let Some(progress) = self.tred_progress.as_mut() else {
            return false;
        };
        if !progress.job.advance(&mut self.graph, TRED_STEP_BUDGET) {
            return true;
        }

        self.tred_progress = None;
        self.tred_changed.clear();
        let reduction = self.graph.reduction_from_marks();
        debug!(
            kept = reduction.edges.len(),
            removed = reduction.removed,
            "refreshed transitive reduction"
        );
        self.tred = Some(TredCache {
            revision,
            reduction,
        });
        false
    }

    /// Citation counts, colours and component links for the current included
    /// set.
    pub fn recompute_analytics(&mut self, verbose: bool) -> &ComponentStats {
        self.admission.settled();
        self.graph.recompute_included_citation_counts();
        self.components = self.graph.recompute_colours(verbose);
        if self.config.connect_components {
            rebuild_fake_links(&mut self.graph, &self.components);
        } else {
            for paper in &mut self.graph.papers {
                paper.fake_links.clear();
            }
        }
        &self.components
    }

    pub fn zoom(&mut self, focus_x: f32, focus_y: f32, factor: f32) {
        if !self.view.zoom(pos2(focus_x, focus_y), factor) {
            warn!(factor, "ignoring zoom by a non-positive factor");
        }
    }

    pub fn scroll(&mut self, dx: f32, dy: f32) {
        self.view.scroll(vec2(dx, dy));
    }

    /// Shakes every included paper by a random offset proportional to its
    /// size and `factor`. Membership, colours and edges are untouched.
    pub fn jolt(&mut self, factor: f32) {
        if !factor.is_finite() {
            warn!(factor, "ignoring jolt by a non-finite factor");
            return;
        }

        let mut moved = 0usize;
        for paper in self.graph.papers.iter_mut().filter(|paper| paper.included) {
            if Some(paper.index) == self.dragged {
                continue;
            }
            let reach = paper.radius.max(admission::RADIUS_UNIT) * JOLT_SCALE * factor;
            paper.pos += vec2(
                self.rng.gen_range(-1.0..=1.0),
                self.rng.gen_range(-1.0..=1.0),
            ) * reach;
            moved += 1;
        }
        debug!(moved, factor, "jolted layout");
    }

    pub fn adjust_anti_gravity(&mut self, factor: f32) {
        if let Some(value) = scaled(self.anti_gravity, factor, "anti-gravity") {
            self.anti_gravity = value;
            info!("anti-gravity strength now {value:.4}");
        }
    }

    pub fn adjust_link_strength(&mut self, factor: f32) {
        if let Some(value) = scaled(self.link_strength, factor, "link strength") {
            self.link_strength = value;
            info!("link strength now {value:.4}");
        }
    }

    pub fn toggle_draw_grid(&mut self) {
        self.draw_grid = !self.draw_grid;
    }

    pub fn toggle_draw_links(&mut self) {
        self.draw_links = !self.draw_links;
    }

    pub fn toggle_transitive_reduction(&mut self) {
        self.use_tred = !self.use_tred;
        if self.use_tred {
            info!("transitive reduction turned on");
        } else {
            info!("transitive reduction turned off");
        }
    }

    pub fn toggle_running(&mut self) {
        self.running = !self.running;
        if self.running {
            info!("update running");
        } else {
            info!("update not running");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn screen_to_world(&self, x: f32, y: f32) -> Vec2 {
        self.view.screen_to_world(pos2(x, y))
    }

    pub fn world_to_screen(&self, world: Vec2) -> Pos2 {
        self.view.world_to_screen(world)
    }

    /// Starts overriding the position of an included paper.
    pub fn begin_drag(&mut self, index: usize) -> Result<()> {
        let paper = self.graph.paper(index)?;
        if !paper.included {
            return Err(MapError::NotIncluded { index });
        }
        self.dragged = Some(index);
        Ok(())
    }

    /// Moves the dragged paper under the screen point.
    pub fn drag_to(&mut self, x: f32, y: f32) {
        let Some(index) = self.dragged else {
            return;
        };
        let world = self.view.screen_to_world(pos2(x, y));
        let paper = &mut self.graph.papers[index];
        paper.pos = world;
        paper.velocity = Vec2::ZERO;
    }

    pub fn end_drag(&mut self) {
        self.dragged = None;
    }

    pub fn dragged(&self) -> Option<usize> {
        self.dragged
    }

    pub fn graph(&self) -> &PaperGraph {
        &self.graph
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn components(&self) -> &ComponentStats {
        &self.components
    }

    pub fn view(&self) -> ViewTransform {
        self.view
    }

    pub fn anti_gravity(&self) -> f32 {
        self.anti_gravity
    }

    pub fn link_strength(&self) -> f32 {
        self.link_strength
    }

    pub fn draws_grid(&self) -> bool {
        self.draw_grid
    }

    pub fn draws_links(&self) -> bool {
        self.draw_links
    }

    pub fn uses_transitive_reduction(&self) -> bool {
        self.use_tred
    }

    /// Reduction for the current included set, if one has been computed.
    pub fn transitive_reduction(&self) -> Option<&TransitiveReduction> {
        self.tred
            .as_ref()
            .filter(|cache| cache.revision == self.included_revision)
            .map(|cache| &cache.reduction)
    }
}

fn scaled(current: f32, factor: f32, what: &str) -> Option<f32> {
    if !factor.is_finite() || factor <= 0.0 {
        warn!(factor, "ignoring {what} adjustment by a non-positive factor");
        return None;
    }
    Some(current * factor)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::MapEnv;
    use crate::config::MapConfig;
    use crate::paper::test_support::graph_from_refs;

    pub(crate) fn env_from_refs(entries: &[(u32, &[u32])]) -> MapEnv {
        MapEnv::new(graph_from_refs(entries), MapConfig::default())
    }

    /// Ten papers in two citation chains plus two loners.
    pub(crate) fn small_env() -> MapEnv {
        env_from_refs(&[
            (1, &[]),
            (2, &[1]),
            (3, &[2, 1]),
            (4, &[3]),
            (5, &[]),
            (6, &[5]),
            (7, &[6, 5]),
            (8, &[]),
            (9, &[4]),
            (10, &[]),
        ])
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::time::{Duration, Instant};

    use super::test_support::small_env;
    use super::*;
    use crate::paper::test_support::record;

    fn snapshot(env: &MapEnv) -> (Vec<bool>, Vec<u32>, Vec<Vec<usize>>) {
        let papers = env.graph().papers();
        (
            papers.iter().map(|paper| paper.included).collect(),
            papers.iter().map(|paper| paper.colour).collect(),
            papers
                .iter()
                .map(|paper| paper.refs.iter().map(|reference| reference.target).collect())
                .collect(),
        )
    }

    #[test]
    fn jolt_moves_papers_but_keeps_topology() {
        let mut env = small_env();
        env.inc_num_papers(8);
        env.recompute_analytics(false);
        for _ in 0..5 {
            env.iterate();
        }

        let before = snapshot(&env);
        let positions = env
            .graph()
            .papers()
            .iter()
            .map(|paper| paper.pos)
            .collect::<Vec<_>>();
        env.jolt(2.5);

        assert_eq!(snapshot(&env), before);
        let moved = env
            .graph()
            .papers()
            .iter()
            .zip(&positions)
            .filter(|(paper, before)| paper.pos != **before)
            .count();
        assert_eq!(moved, 8);
    }

    #[test]
    fn adjustments_multiply_and_ignore_bad_factors() {
        let mut env = small_env();
        let gravity = env.anti_gravity();
        env.adjust_anti_gravity(1.1);
        env.adjust_anti_gravity(0.0);
        env.adjust_anti_gravity(f32::NAN);
        assert!((env.anti_gravity() - gravity * 1.1).abs() < 1e-6);

        let links = env.link_strength();
        env.adjust_link_strength(0.9);
        env.adjust_link_strength(-1.0);
        assert!((env.link_strength() - links * 0.9).abs() < 1e-6);
    }

    #[test]
    fn toggles_flip_flags() {
        let mut env = small_env();
        assert!(!env.draws_grid());
        assert!(env.draws_links());
        assert!(env.uses_transitive_reduction());
        assert!(env.is_running());

        env.toggle_draw_grid();
        env.toggle_draw_links();
        env.toggle_transitive_reduction();
        env.toggle_running();
        assert!(env.draws_grid());
        assert!(!env.draws_links());
        assert!(!env.uses_transitive_reduction());
        assert!(!env.is_running());
    }

    #[test]
    fn zoom_and_scroll_round_trip_through_the_session() {
        let mut env = small_env();
        env.zoom(200.0, 100.0, 1.2);
        env.scroll(15.0, -30.0);
        env.zoom(10.0, 10.0, 0.8);
        env.zoom(10.0, 10.0, 0.0);

        let world = vec2(42.0, -17.5);
        let screen = env.world_to_screen(world);
        let back = env.screen_to_world(screen.x, screen.y);
        assert!((back - world).length() < 1e-3);
        assert!((env.view().scale - 0.96).abs() < 1e-5);
    }

    #[test]
    fn drag_overrides_the_integrator() {
        let mut env = small_env();
        env.inc_num_papers(10);
        let index = env.graph().lookup_by_id(3).unwrap();

        env.begin_drag(index).unwrap();
        for step in 0..20 {
            env.drag_to(100.0 + step as f32, 50.0);
            env.iterate();
            let expected = env.screen_to_world(100.0 + step as f32, 50.0);
            assert_eq!(env.graph().papers()[index].pos, expected);
        }
        env.end_drag();
        assert_eq!(env.dragged(), None);
    }

    #[test]
    fn dragging_an_excluded_paper_fails() {
        let mut env = small_env();
        env.inc_num_papers(2);
        let excluded = env.graph().lookup_by_id(10).unwrap();

        assert_eq!(
            env.begin_drag(excluded),
            Err(MapError::NotIncluded { index: excluded })
        );
        assert_eq!(
            env.begin_drag(99),
            Err(MapError::UnknownIndex { index: 99 })
        );
        assert_eq!(env.dragged(), None);
    }

    #[test]
    fn reduction_is_cached_until_the_included_set_grows() {
        let mut env = small_env();
        env.inc_num_papers(4);
        env.recompute_analytics(false);
        while env.admission.pending() {
            env.iterate();
        }
        env.iterate();

        let first = env.transitive_reduction().cloned().unwrap();
        let kept = first.edges.iter().copied().collect::<BTreeSet<_>>();
        let one = env.graph().lookup_by_id(1).unwrap();
        let three = env.graph().lookup_by_id(3).unwrap();
        assert!(!kept.contains(&(three, one)));
        assert_eq!(first.removed, 1);

        env.iterate();
        assert_eq!(env.transitive_reduction(), Some(&first));

        env.inc_num_papers(1);
        assert!(env.transitive_reduction().is_none());
    }

    /// Each paper cites up to six random older ones, oldest first.
    fn citation_dag(papers: u32, seed: u64) -> PaperGraph {
        let mut rng = StdRng::seed_from_u64(seed);
        let records = (1..=papers)
            .map(|id| {
                let refs = (0..rng.gen_range(0..=6))
                    .filter(|_| id > 1)
                    .map(|_| rng.gen_range(1..id))
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect::<Vec<_>>();
                record(id, &refs)
            })
            .collect::<Vec<_>>();
        PaperGraph::build(records).unwrap()
    }

    #[test]
    fn one_admission_reduces_only_what_it_touches() {
        let papers = 2_000;
        let mut env = MapEnv::new(citation_dag(papers, 7), MapConfig::default());
        env.inc_num_papers(papers as usize - 1);
        env.recompute_analytics(false);
        while env.refresh_transitive_reduction() {}
        assert!(env.transitive_reduction().is_some());

        env.inc_num_papers(1);
        env.recompute_analytics(false);
        let queued = env
            .graph
            .clone()
            .start_transitive_reduction(&env.tred_changed)
            .remaining();
        assert_eq!(queued, 1);

        let started = Instant::now();
        env.iterate();
        let elapsed = started.elapsed();

        let reduction = env.transitive_reduction().cloned().unwrap();
        assert_eq!(reduction, env.graph.clone().compute_transitive_reduction());
        assert!(env.tred_changed.is_empty());
        assert!(elapsed < Duration::from_secs(2), "one step took {elapsed:?}");
    }

    #[test]
    fn large_reductions_are_spread_over_steps() {
        let papers = 2_000;
        let mut env = MapEnv::new(citation_dag(papers, 11), MapConfig::default());
        env.inc_num_papers(papers as usize);
        env.recompute_analytics(false);

        let mut steps = 0;
        while env.refresh_transitive_reduction() {
            steps += 1;
            assert!(env.transitive_reduction().is_none());
        }
        assert!(steps > 0);
        let reduction = env.transitive_reduction().cloned().unwrap();
        assert_eq!(reduction, env.graph.clone().compute_transitive_reduction());
    }
}
