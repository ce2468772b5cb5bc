use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Initial configuration of a map session.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    /// Admit papers oldest first (ids encode publication order).
    pub ids_time_ordered: bool,
    /// Multiplier on the short-range repulsion for the whole session.
    pub initial_close_repulsion: f32,
    /// How strongly repeated references pull harder; 0 ignores frequency.
    pub use_ref_freq: f32,
    /// Short-range repulsion strength.
    pub close_repulsion_a: f32,
    /// Softening added to the squared distance in the repulsion term.
    pub close_repulsion_b: f32,
    /// Interaction range as a multiple of the two radii.
    pub close_repulsion_c: f32,
    /// Extra push per unit of overlap between discs.
    pub close_repulsion_d: f32,
    pub link_strength: f32,
    pub anti_gravity: f32,
    /// Squared radius beyond which the anti-gravity pull falls off.
    pub anti_gravity_falloff_rsq: f32,
    pub fake_link_strength: f32,
    pub connect_components: bool,
    /// Quiet iterations after the last admission before colours and counts
    /// are recomputed.
    pub recompute_settle_steps: u32,
    pub admission_seed: u64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            ids_time_ordered: true,
            initial_close_repulsion: 1.0,
            use_ref_freq: 0.0,
            close_repulsion_a: 4_000.0,
            close_repulsion_b: 40.0,
            close_repulsion_c: 3.0,
            close_repulsion_d: 1.2,
            link_strength: 0.02,
            anti_gravity: 0.6,
            anti_gravity_falloff_rsq: 250_000.0,
            fake_link_strength: 0.25,
            connect_components: true,
            recompute_settle_steps: 10,
            admission_seed: 0x5eed,
        }
    }
}

impl MapConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid map config in {}", path.display()))
    }
}
