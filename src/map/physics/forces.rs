use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadNode;

/// Short-range repulsion between papers whose discs are close.
#[derive(Clone, Copy, Debug)]
pub(super) struct CloseRepulsion {
    pub(super) strength: f32,
    pub(super) softening: f32,
    /// Interaction range as a multiple of the summed radii.
    pub(super) range_factor: f32,
    pub(super) overlap_strength: f32,
    pub(super) max_range_sq: f32,
}

fn pair_direction(from: usize, to: usize, delta: Vec2, distance: f32) -> Vec2 {
    if distance > 0.0001 {
        delta / distance
    } else {
        let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
        vec2(angle.cos(), angle.sin())
    }
}

fn repel_pair(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    params: CloseRepulsion,
    forces: &mut [Vec2],
) {
    let delta = positions[from] - positions[to];
    let distance_sq = delta.length_sq();
    let touching = radii[from] + radii[to];
    let range = touching * params.range_factor;
    if distance_sq >= range * range {
        return;
    }

    let distance = distance_sq.sqrt();
    let direction = pair_direction(from, to, delta, distance);
    let mut push = params.strength / (distance_sq + params.softening);
    if distance < touching {
        push += (touching - distance) * params.overlap_strength;
    }

    forces[from] += direction * push;
    forces[to] -= direction * push;
}

/// Walks the tree against itself, visiting each pair of leaves whose boxes
/// are within the largest possible interaction range exactly once.
pub(super) fn accumulate_close_repulsion(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    positions: &[Vec2],
    radii: &[f32],
    params: CloseRepulsion,
    forces: &mut [Vec2],
) {
    if node_a.bounds.distance_sq_to(node_b.bounds) > params.max_range_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (i, &from) in node_a.indices.iter().enumerate() {
                for &to in &node_a.indices[i + 1..] {
                    repel_pair(from, to, positions, radii, params, forces);
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    repel_pair(from, to, positions, radii, params, forces);
                }
            }
        }
        return;
    }

    if same_node {
        for first in 0..4 {
            let Some(child_a) = node_a.children[first].as_ref() else {
                continue;
            };

            accumulate_close_repulsion(child_a, child_a, true, positions, radii, params, forces);

            for second in (first + 1)..4 {
                let Some(child_b) = node_a.children[second].as_ref() else {
                    continue;
                };
                accumulate_close_repulsion(
                    child_a, child_b, false, positions, radii, params, forces,
                );
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in node_a.children.iter().flatten() {
            accumulate_close_repulsion(child, node_b, false, positions, radii, params, forces);
        }
    } else {
        for child in node_b.children.iter().flatten() {
            accumulate_close_repulsion(node_a, child, false, positions, radii, params, forces);
        }
    }
}

/// Pull towards a component centroid `delta` away. Linear in distance inside
/// `sqrt(falloff_rsq)`, inverse square beyond it; continuous at the boundary.
pub(super) fn anti_gravity_pull(delta: Vec2, strength: f32, falloff_rsq: f32) -> Vec2 {
    let distance_sq = delta.length_sq();
    if distance_sq <= 1.0e-8 {
        return Vec2::ZERO;
    }

    let distance = distance_sq.sqrt();
    let falloff_rsq = falloff_rsq.max(1.0);
    let magnitude = if distance_sq <= falloff_rsq {
        strength * distance / falloff_rsq.sqrt()
    } else {
        strength * falloff_rsq / distance_sq
    };
    (delta / distance) * magnitude
}

/// Damped spring with the given rest length. The returned correction is
/// subtracted from the source's force and added to the target's.
pub(super) fn link_spring(
    delta: Vec2,
    relative_velocity: Vec2,
    rest_length: f32,
    stiffness: f32,
    damping: f32,
) -> Vec2 {
    let distance_sq = delta.length_sq();
    if distance_sq <= 0.0001 * 0.0001 {
        return Vec2::ZERO;
    }
    let distance = distance_sq.sqrt();
    let direction = delta / distance;

    let spring = (distance - rest_length) * stiffness;
    let damping_force = relative_velocity.dot(direction) * damping;
    direction * (spring + damping_force)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: CloseRepulsion = CloseRepulsion {
        strength: 4_000.0,
        softening: 40.0,
        range_factor: 3.0,
        overlap_strength: 1.2,
        max_range_sq: 60.0 * 60.0,
    };

    fn brute_force(positions: &[Vec2], radii: &[f32]) -> Vec<Vec2> {
        let mut forces = vec![Vec2::ZERO; positions.len()];
        for from in 0..positions.len() {
            for to in (from + 1)..positions.len() {
                repel_pair(from, to, positions, radii, PARAMS, &mut forces);
            }
        }
        forces
    }

    #[test]
    fn anti_gravity_is_continuous_at_the_falloff_radius() {
        let falloff_rsq = 400.0;
        let inside = anti_gravity_pull(vec2(19.999, 0.0), 0.5, falloff_rsq);
        let outside = anti_gravity_pull(vec2(20.001, 0.0), 0.5, falloff_rsq);
        assert!((inside.x - outside.x).abs() < 1e-3);
        assert!((inside.x - 0.5).abs() < 1e-3);
    }

    #[test]
    fn anti_gravity_falls_off_with_the_inverse_square() {
        let near = anti_gravity_pull(vec2(0.0, 40.0), 1.0, 100.0);
        let far = anti_gravity_pull(vec2(0.0, 80.0), 1.0, 100.0);
        assert!((near.y / far.y - 4.0).abs() < 1e-3);

        let half = anti_gravity_pull(vec2(5.0, 0.0), 1.0, 100.0);
        assert!((half.x - 0.5).abs() < 1e-6);
        assert_eq!(anti_gravity_pull(Vec2::ZERO, 1.0, 100.0), Vec2::ZERO);
    }

    #[test]
    fn spring_pulls_stretched_links_together() {
        let correction = link_spring(vec2(50.0, 0.0), Vec2::ZERO, 10.0, 0.1, 0.2);
        assert!((correction.x - 4.0).abs() < 1e-5);

        let compressed = link_spring(vec2(5.0, 0.0), Vec2::ZERO, 10.0, 0.1, 0.2);
        assert!(compressed.x < 0.0);
    }

    #[test]
    fn tree_pass_matches_all_pairs() {
        let positions = (0..300)
            .map(|i| {
                let angle = i as f32 * 2.399_963;
                vec2(angle.cos(), angle.sin()) * (i as f32).sqrt() * 6.0
            })
            .collect::<Vec<_>>();
        let radii = (0..300).map(|i| 2.0 + (i % 5) as f32).collect::<Vec<_>>();

        let tree = QuadNode::build(&positions).unwrap();
        let mut forces = vec![Vec2::ZERO; positions.len()];
        accumulate_close_repulsion(&tree, &tree, true, &positions, &radii, PARAMS, &mut forces);

        let exact_forces = brute_force(&positions, &radii);
        for (index, (tree_force, exact)) in forces.iter().zip(exact_forces).enumerate() {
            assert!(
                (*tree_force - exact).length() <= 1e-2 * (1.0 + exact.length()),
                "paper {index}: {tree_force:?} != {exact:?}"
            );
        }
    }

    #[test]
    fn coincident_papers_are_pushed_apart() {
        let positions = vec![vec2(1.0, 1.0), vec2(1.0, 1.0)];
        let radii = vec![4.0, 4.0];
        let forces = brute_force(&positions, &radii);
        assert!(forces[0].length() > 0.0);
        assert!((forces[0] + forces[1]).length() < 1e-4);
    }
}
