//! Card framing: drop shadow, diagonal gradient and the twinkling star field.

use eframe::egui::{epaint::Shadow, Color32, Mesh, Painter, Pos2, Rect, Vec2};

/// Gradient stops at 0%, 50% and 100% along the 135° diagonal.
pub const GRADIENT: [Color32; 3] = [
    Color32::from_rgb(0x0F, 0x20, 0x27),
    Color32::from_rgb(0x20, 0x3A, 0x43),
    Color32::from_rgb(0x2C, 0x53, 0x64),
];

pub const CORNER_RADIUS: f32 = 16.0;
/// Star tile size in points
const STAR_SPACING: f32 = 50.0;
/// Seconds per twinkle cycle
const TWINKLE_PERIOD: f64 = 4.0;

/// Card height for a window width: 300 / 400 / 500 at 900 and 1200 breakpoints.
pub fn card_height(window_width: f32) -> f32 {
    if window_width >= 1200.0 {
        500.0
    } else if window_width >= 900.0 {
        400.0
    } else {
        300.0
    }
}

/// Star layer opacity at `time` seconds: 0.2 at the cycle edges, 0.3 midway.
pub fn twinkle_opacity(time: f64) -> f32 {
    let phase = (time / TWINKLE_PERIOD).fract();
    (0.25 - 0.05 * (std::f64::consts::TAU * phase).cos()) as f32
}

pub fn shadow(dark_mode: bool) -> Shadow {
    Shadow {
        offset: Vec2::new(0.0, 8.0),
        blur: 32.0,
        spread: 0.0,
        color: Color32::from_black_alpha(if dark_mode { 128 } else { 77 }),
    }
}

/// Paint everything that sits under the card.
pub fn paint(painter: &Painter, rect: Rect, dark_mode: bool, time: f64) {
    painter.add(shadow(dark_mode).as_shape(rect, CORNER_RADIUS));
    painter.add(gradient_mesh(rect, CORNER_RADIUS, &GRADIENT));
    paint_stars(&painter.with_clip_rect(rect.shrink(CORNER_RADIUS * 0.3)), rect, twinkle_opacity(time));
}

fn lerp_color(a: Color32, b: Color32, t: f32) -> Color32 {
    let l = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    Color32::from_rgb(l(a.r(), b.r()), l(a.g(), b.g()), l(a.b(), b.b()))
}

fn gradient_at(stops: &[Color32; 3], t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        lerp_color(stops[0], stops[1], t * 2.0)
    } else {
        lerp_color(stops[1], stops[2], (t - 0.5) * 2.0)
    }
}

/// Rounded rect filled with a top-left to bottom-right gradient, as a fan.
pub fn gradient_mesh(rect: Rect, radius: f32, stops: &[Color32; 3]) -> Mesh {
    let r = radius.min(rect.width() * 0.5).min(rect.height() * 0.5).max(0.0);
    let diag = rect.max - rect.min;
    let diag_len2 = diag.length_sq().max(1.0);
    let color_at = |p: Pos2| gradient_at(stops, (p - rect.min).dot(diag) / diag_len2);

    const ARC_SEGMENTS: usize = 8;
    let corners = [
        (Pos2::new(rect.right() - r, rect.top() + r), -90.0f32),
        (Pos2::new(rect.right() - r, rect.bottom() - r), 0.0),
        (Pos2::new(rect.left() + r, rect.bottom() - r), 90.0),
        (Pos2::new(rect.left() + r, rect.top() + r), 180.0),
    ];

    let mut mesh = Mesh::default();
    let center = rect.center();
    mesh.colored_vertex(center, color_at(center));
    for (c, start) in corners {
        for s in 0..=ARC_SEGMENTS {
            let a = (start + 90.0 * s as f32 / ARC_SEGMENTS as f32).to_radians();
            let p = c + Vec2::new(a.cos(), a.sin()) * r;
            mesh.colored_vertex(p, color_at(p));
        }
    }
    let ring = (mesh.vertices.len() - 1) as u32;
    for i in 0..ring {
        mesh.add_triangle(0, 1 + i, 1 + (i + 1) % ring);
    }
    mesh
}

fn paint_stars(painter: &Painter, rect: Rect, opacity: f32) {
    let core = Color32::from_white_alpha((opacity * 255.0) as u8);
    let halo = Color32::from_white_alpha((opacity * 0.2 * 255.0) as u8);
    let mut y = rect.top() + STAR_SPACING * 0.5;
    while y < rect.bottom() {
        let mut x = rect.left() + STAR_SPACING * 0.5;
        while x < rect.right() {
            let p = Pos2::new(x, y);
            painter.circle_filled(p, 4.0, halo);
            painter.circle_filled(p, 2.0, core);
            x += STAR_SPACING;
        }
        y += STAR_SPACING;
    }
}
