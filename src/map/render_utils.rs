use eframe::egui::{Color32, Pos2, Rect};

/// Newborn papers start out this colour and fade to their category's.
const NEWBORN_TINT: Color32 = Color32::WHITE;
/// Brightness kept by papers outside the largest component.
const MINOR_COMPONENT_BRIGHTNESS: f32 = 0.55;

fn mix_channel(from: u8, to: u8, amount: f32) -> u8 {
    (f32::from(from) + (f32::from(to) - f32::from(from)) * amount).round() as u8
}

/// Linear mix of two colours; `amount` 0 gives `base`, 1 gives `overlay`.
pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let [r, g, b, a] = base.to_srgba_unmultiplied();
    let [or, og, ob, oa] = overlay.to_srgba_unmultiplied();
    Color32::from_rgba_unmultiplied(
        mix_channel(r, or, amount),
        mix_channel(g, og, amount),
        mix_channel(b, ob, amount),
        mix_channel(a, oa, amount),
    )
}

/// Darkens towards black, keeping alpha.
pub(super) fn dim_color(color: Color32, brightness: f32) -> Color32 {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    let black = Color32::from_rgba_unmultiplied(0, 0, 0, a);
    blend_color(
        Color32::from_rgba_unmultiplied(r, g, b, a),
        black,
        1.0 - brightness,
    )
}

/// Fill colour for a paper's main category code.
pub(super) fn category_color(code: u8) -> Color32 {
    match code {
        1 => Color32::from_rgb(70, 140, 230),
        2 => Color32::from_rgb(225, 95, 80),
        3 => Color32::from_rgb(90, 190, 120),
        4 => Color32::from_rgb(225, 180, 60),
        5 => Color32::from_rgb(170, 120, 210),
        _ => Color32::from_rgb(150, 150, 150),
    }
}

/// Disc colour of a paper: its category, washed towards white while it is
/// young and dimmed when it sits outside the largest component.
pub(super) fn paper_color(category: u8, age: f32, minor_component: bool) -> Color32 {
    let color = blend_color(category_color(category), NEWBORN_TINT, 1.0 - age);
    if minor_component {
        dim_color(color, MINOR_COMPONENT_BRIGHTNESS)
    } else {
        color
    }
}

pub(super) fn circle_visible(rect: Rect, centre: Pos2, radius: f32) -> bool {
    rect.expand(radius).contains(centre)
}

/// Whether the segment, thickened by `padding`, can touch the screen.
pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    if !Rect::from_two_pos(start, end).expand(padding).intersects(rect) {
        return false;
    }
    if rect.contains(start) || rect.contains(end) {
        return true;
    }

    let corners = [
        rect.left_top(),
        rect.right_top(),
        rect.right_bottom(),
        rect.left_bottom(),
    ];
    (0..corners.len()).any(|side| {
        segments_intersect(start, end, corners[side], corners[(side + 1) % corners.len()])
    })
}

/// Sign of the turn `a -> b -> c`.
fn orientation(a: Pos2, b: Pos2, c: Pos2) -> f32 {
    (b - a).x * (c - a).y - (b - a).y * (c - a).x
}

fn segments_intersect(a1: Pos2, a2: Pos2, b1: Pos2, b2: Pos2) -> bool {
    if !Rect::from_two_pos(a1, a2).intersects(Rect::from_two_pos(b1, b2)) {
        return false;
    }

    let straddles = |p: f32, q: f32| (p <= 0.0 && q >= 0.0) || (p >= 0.0 && q <= 0.0);
    straddles(orientation(a1, a2, b1), orientation(a1, a2, b2))
        && straddles(orientation(b1, b2, a1), orientation(b1, b2, a2))
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;

    fn screen() -> Rect {
        Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0))
    }

    #[test]
    fn edges_crossing_the_screen_are_visible() {
        let rect = screen();
        assert!(edge_visible(rect, pos2(-100.0, 300.0), pos2(900.0, 300.0), 1.0));
        assert!(edge_visible(rect, pos2(10.0, 10.0), pos2(-50.0, -50.0), 1.0));
        assert!(!edge_visible(rect, pos2(-100.0, -100.0), pos2(-10.0, 700.0), 1.0));
        // Bounding boxes overlap the screen but the segment misses the corner.
        assert!(!edge_visible(rect, pos2(-50.0, 40.0), pos2(40.0, -50.0), 0.0));
    }

    #[test]
    fn discs_are_culled_by_their_extent() {
        let rect = screen();
        assert!(circle_visible(rect, pos2(-5.0, 300.0), 10.0));
        assert!(!circle_visible(rect, pos2(-15.0, 300.0), 10.0));
        assert!(!circle_visible(rect, pos2(400.0, 615.0), 10.0));
    }

    #[test]
    fn blending_and_dimming_stay_in_range() {
        let white = Color32::WHITE;
        let blue = category_color(1);
        assert_eq!(blend_color(blue, white, 0.0), blue);
        assert_eq!(blend_color(blue, white, 2.0), white);
        assert_eq!(dim_color(white, 0.0), Color32::BLACK);
        assert_eq!(dim_color(blue, 1.0), blue);
    }

    #[test]
    fn papers_fade_in_and_minor_components_dim() {
        assert_eq!(paper_color(2, 0.0, false), Color32::WHITE);
        assert_eq!(paper_color(2, 1.0, false), category_color(2));

        let major = paper_color(3, 1.0, false);
        let minor = paper_color(3, 1.0, true);
        assert!(minor.r() < major.r() && minor.g() < major.g() && minor.b() < major.b());
        assert_eq!(minor.a(), major.a());
    }
}
