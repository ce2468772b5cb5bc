use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use super::MapEnv;
use crate::paper::{Paper, PaperGraph};

/// Radius of an uncited, fully grown paper, in world units.
pub(super) const RADIUS_UNIT: f32 = 4.0;
/// Age gained per layout step; papers reach full size after 50 steps.
pub(super) const AGE_STEP: f32 = 0.02;
/// Fraction of full size a newborn paper is drawn and collides at.
const NEWBORN_SCALE: f32 = 0.1;

/// The fixed order in which papers join the map, and how far it has got.
pub(super) struct Admission {
    order: Vec<usize>,
    cursor: usize,
    /// Steps left before the analytics catch up with recent admissions.
    settle_countdown: Option<u32>,
}

impl Admission {
    /// Oldest first when ids are time ordered, otherwise a seeded shuffle.
    pub(super) fn new(graph: &PaperGraph, time_ordered: bool, rng: &mut StdRng) -> Self {
        let mut order = (0..graph.len()).collect::<Vec<_>>();
        if !time_ordered {
            order.shuffle(rng);
        }
        Self {
            order,
            cursor: 0,
            settle_countdown: None,
        }
    }

    pub(super) fn pending(&self) -> bool {
        self.settle_countdown.is_some()
    }

    pub(super) fn settled(&mut self) {
        self.settle_countdown = None;
    }

    pub(super) fn remaining(&self) -> usize {
        self.order.len() - self.cursor
    }
}

impl MapEnv {
    /// Admits up to `n` more papers in admission order and returns how many
    /// joined. Colours and citation counts catch up once admissions have
    /// been quiet for the configured number of steps.
    pub fn inc_num_papers(&mut self, n: usize) -> usize {
        let mut admitted = 0usize;
        while admitted < n && self.admission.cursor < self.admission.order.len() {
            let index = self.admission.order[self.admission.cursor];
            self.admission.cursor += 1;
            if self.graph.papers[index].included {
                continue;
            }
            self.admit(index);
            admitted += 1;
        }

        if admitted > 0 {
            self.included_revision += 1;
            self.admission.settle_countdown = Some(self.config.recompute_settle_steps);
            debug!(
                admitted,
                cursor = self.admission.cursor,
                remaining = self.admission.remaining(),
                "admitted papers"
            );
        }
        admitted
    }

    /// Places a paper next to an included neighbour when it has one, else
    /// somewhere in a disc that grows with the map.
    fn admit(&mut self, index: usize) {
        let neighbour = {
            let paper = &self.graph.papers[index];
            paper
                .refs
                .iter()
                .map(|reference| reference.target)
                .chain(paper.cites.iter().copied())
                .find(|&other| other != index && self.graph.papers[other].included)
        };

        let angle = self.rng.gen_range(0.0..TAU);
        let direction = vec2(angle.cos(), angle.sin());
        let pos = match neighbour {
            Some(other) => {
                let anchor = &self.graph.papers[other];
                let gap =
                    anchor.radius.max(RADIUS_UNIT) + self.rng.gen_range(1.0..3.0) * RADIUS_UNIT;
                anchor.pos + direction * gap
            }
            None => {
                let spread = (self.admission.cursor as f32).sqrt() * RADIUS_UNIT * 6.0;
                direction * self.rng.gen_range(0.0..=spread)
            }
        };

        self.tred_changed.push(index);
        let paper = &mut self.graph.papers[index];
        paper.included = true;
        paper.pos = pos;
        paper.velocity = Vec2::ZERO;
        paper.age = 0.0;
        paper.colour = 0;
        paper.num_with_my_colour = 0;
        size_paper(paper);
    }

    /// Counts down the quiet period after admissions and recomputes the
    /// analytics when it runs out.
    pub(super) fn settle_admissions(&mut self) {
        let Some(steps) = self.admission.settle_countdown else {
            return;
        };
        let steps = steps.saturating_sub(1);
        if steps > 0 {
            self.admission.settle_countdown = Some(steps);
            return;
        }

        self.finish_settling();
    }

    /// Nothing counts the quiet period down while the layout is paused, so
    /// admissions made then are settled at once.
    pub(super) fn settle_while_paused(&mut self) {
        if !self.running && self.admission.pending() {
            self.finish_settling();
        }
    }

    fn finish_settling(&mut self) {
        self.recompute_analytics(false);
        info!(
            included = self.graph.num_included(),
            colours = self.components.num_colours,
            largest = self.components.largest_size,
            "admissions settled"
        );
    }

    /// Ages recently admitted papers and refreshes every included paper's
    /// radius and mass. Returns whether any paper is still growing.
    pub(super) fn grow_papers(&mut self) -> bool {
        let mut growing = false;
        for paper in self.graph.papers.iter_mut().filter(|paper| paper.included) {
            if paper.age < 1.0 {
                paper.age = (paper.age + AGE_STEP).min(1.0);
                growing = true;
            }
            size_paper(paper);
        }
        growing
    }
}

fn size_paper(paper: &mut Paper) {
    let weight = 1.0 + paper.num_included_cites as f32;
    let scale = paper.age.max(NEWBORN_SCALE);
    paper.radius = RADIUS_UNIT * weight.sqrt() * scale;
    paper.mass = weight * scale;
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::config::MapConfig;
    use crate::map::test_support::{env_from_refs, small_env};
    use crate::paper::test_support::graph_from_refs;

    fn included_ids(env: &MapEnv) -> BTreeSet<u32> {
        env.graph()
            .papers()
            .iter()
            .filter(|paper| paper.included)
            .map(|paper| paper.id)
            .collect()
    }

    #[test]
    fn time_ordered_admission_takes_the_oldest_first() {
        let mut env = small_env();
        assert_eq!(env.inc_num_papers(3), 3);
        assert_eq!(included_ids(&env), BTreeSet::from([1, 2, 3]));
    }

    #[test]
    fn admission_is_monotonic_and_stops_at_the_end() {
        let mut env = small_env();
        let mut previous = 0;
        for batch in [0, 1, 4, 2, 7] {
            env.inc_num_papers(batch);
            let now = env.graph().num_included();
            assert!(now >= previous);
            previous = now;
        }
        assert_eq!(previous, 10);
        assert_eq!(env.inc_num_papers(5), 0);
    }

    #[test]
    fn final_membership_ignores_batch_sizes() {
        let config = MapConfig {
            ids_time_ordered: false,
            ..MapConfig::default()
        };
        let entries: &[(u32, &[u32])] = &[
            (11, &[]),
            (12, &[11]),
            (13, &[]),
            (14, &[12, 13]),
            (15, &[]),
            (16, &[15]),
            (17, &[]),
            (18, &[17, 11]),
        ];

        let mut single = MapEnv::new(graph_from_refs(entries), config.clone());
        for _ in 0..5 {
            single.inc_num_papers(1);
        }
        let mut batched = MapEnv::new(graph_from_refs(entries), config);
        batched.inc_num_papers(2);
        batched.inc_num_papers(3);

        assert_eq!(included_ids(&single), included_ids(&batched));
        assert_eq!(included_ids(&single).len(), 5);
    }

    #[test]
    fn recompute_waits_for_admissions_to_settle() {
        let mut env = small_env();
        let settle = env.config().recompute_settle_steps;
        env.inc_num_papers(4);

        for _ in 1..settle {
            assert!(env.iterate());
            assert_eq!(env.components().num_colours, 0);
        }
        env.iterate();
        assert_eq!(env.components().num_colours, 1);
        assert_eq!(env.components().largest_size, 4);

        let one = env.graph().lookup_by_id(1).unwrap();
        assert_eq!(env.graph().papers()[one].num_included_cites, 2);
    }

    #[test]
    fn further_admissions_restart_the_countdown() {
        let mut env = small_env();
        let settle = env.config().recompute_settle_steps;
        env.inc_num_papers(2);
        for _ in 1..settle {
            env.iterate();
        }
        env.inc_num_papers(2);
        env.iterate();
        assert_eq!(env.components().num_colours, 0);
        for _ in 1..settle {
            env.iterate();
        }
        assert_eq!(env.components().largest_size, 4);
    }

    #[test]
    fn paused_admissions_settle_when_drawn() {
        let mut env = small_env();
        env.toggle_running();
        env.inc_num_papers(4);
        assert_eq!(env.components().num_colours, 0);

        env.draw(800.0, 600.0);
        assert!(!env.admission.pending());
        assert_eq!(env.components().largest_size, 4);
        assert!(
            env.graph()
                .papers()
                .iter()
                .filter(|paper| paper.included)
                .all(|paper| paper.colour != 0)
        );

        let mut running = small_env();
        running.inc_num_papers(4);
        running.draw(800.0, 600.0);
        assert!(running.admission.pending());
    }

    #[test]
    fn new_papers_grow_in() {
        let mut env = env_from_refs(&[(1, &[]), (2, &[1])]);
        env.inc_num_papers(2);
        env.iterate();
        let young = env.graph().papers()[1].radius;
        assert!(young < RADIUS_UNIT);

        for _ in 0..60 {
            env.iterate();
        }
        let paper = &env.graph().papers()[1];
        assert_eq!(paper.age, 1.0);
        assert!(paper.radius > young);
        assert!((paper.radius - RADIUS_UNIT).abs() < 1e-5);
    }

    #[test]
    fn papers_spawn_next_to_included_neighbours() {
        let mut env = env_from_refs(&[(1, &[]), (2, &[1])]);
        env.inc_num_papers(1);
        env.graph.papers[0].pos = vec2(5_000.0, 5_000.0);
        env.inc_num_papers(1);

        let gap = (env.graph().papers()[1].pos - env.graph().papers()[0].pos).length();
        assert!(gap <= RADIUS_UNIT * 4.0 + 1e-3);
        assert!(gap >= RADIUS_UNIT);
    }
}
