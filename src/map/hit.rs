use eframe::egui::pos2;

use super::MapEnv;

/// Smallest clickable disc, in pixels, however far the view is zoomed out.
pub(super) const MIN_SCREEN_RADIUS: f32 = 3.0;

impl MapEnv {
    /// The included paper whose drawn disc contains the screen point. When
    /// discs overlap the one whose centre is nearest wins.
    pub fn get_node_at(&self, x: f32, y: f32) -> Option<usize> {
        let point = pos2(x, y);

        self.graph
            .papers()
            .iter()
            .filter(|paper| paper.included)
            .filter_map(|paper| {
                let centre = self.view.world_to_screen(paper.pos);
                let radius = self.view.screen_length(paper.radius).max(MIN_SCREEN_RADIUS);
                let distance_sq = centre.distance_sq(point);
                (distance_sq <= radius * radius).then_some((paper.index, distance_sq))
            })
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use crate::map::MapEnv;
    use crate::map::test_support::env_from_refs;

    fn placed_env() -> MapEnv {
        let mut env = env_from_refs(&[(1, &[]), (2, &[1]), (3, &[]), (4, &[])]);
        env.inc_num_papers(3);
        let layout = [
            (vec2(0.0, 0.0), 10.0),
            (vec2(12.0, 0.0), 10.0),
            (vec2(200.0, 0.0), 1.0),
        ];
        for (paper, (pos, radius)) in env.graph.papers.iter_mut().zip(layout) {
            paper.pos = pos;
            paper.radius = radius;
        }
        env.graph.papers[3].pos = vec2(400.0, 0.0);
        env.graph.papers[3].radius = 50.0;
        env
    }

    #[test]
    fn finds_the_nearest_containing_disc() {
        let env = placed_env();
        assert_eq!(env.get_node_at(2.0, 0.0), Some(0));
        assert_eq!(env.get_node_at(8.0, 1.0), Some(1));
        assert_eq!(env.get_node_at(0.0, 11.0), None);
    }

    #[test]
    fn tiny_papers_stay_clickable() {
        let mut env = placed_env();
        assert_eq!(env.get_node_at(202.5, 0.0), Some(2));

        env.zoom(0.0, 0.0, 0.01);
        let screen = env.world_to_screen(vec2(200.0, 0.0));
        assert_eq!(env.get_node_at(screen.x + 2.0, screen.y), Some(2));
    }

    #[test]
    fn excluded_papers_are_never_hit() {
        let env = placed_env();
        assert_eq!(env.get_node_at(400.0, 0.0), None);
    }

    #[test]
    fn hit_test_follows_the_view() {
        let mut env = placed_env();
        env.scroll(100.0, 50.0);
        env.zoom(100.0, 50.0, 2.0);
        assert_eq!(env.get_node_at(0.0, 0.0), None);
        assert_eq!(env.get_node_at(100.0 + 5.0, 50.0), Some(0));
        assert_eq!(env.get_node_at(100.0 + 24.0, 50.0), Some(1));
    }
}
