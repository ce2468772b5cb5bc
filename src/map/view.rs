use eframe::egui::{Pos2, Vec2};

/// Pan and zoom between world space and screen pixels:
/// `screen = world * scale + offset`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub offset: Vec2,
    pub scale: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn world_to_screen(&self, world: Vec2) -> Pos2 {
        (world * self.scale + self.offset).to_pos2()
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Vec2 {
        (screen.to_vec2() - self.offset) / self.scale
    }

    /// Pixels spanned by a world distance, such as a paper's radius.
    pub fn screen_length(&self, world_length: f32) -> f32 {
        world_length * self.scale
    }

    /// Scales about `focus` so the world point under it stays put. Factors
    /// that are not finite and positive are rejected.
    pub fn zoom(&mut self, focus: Pos2, factor: f32) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }

        let world_focus = self.screen_to_world(focus);
        self.scale *= factor;
        self.offset = focus.to_vec2() - world_focus * self.scale;
        true
    }

    pub fn scroll(&mut self, delta: Vec2) {
        self.offset += delta;
    }
}
