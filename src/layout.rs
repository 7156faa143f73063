//! Node layout: golden-ratio spiral on a sphere plus random node identity.
//!
//! Positions are deterministic for a given count; color and label text come
//! from an explicit random source so a seeded generator reproduces a card.

use egui::Color32;
use glam::Vec3;
use rand::Rng;

/// Golden ratio φ = (1 + √5) / 2
pub const GOLDEN_RATIO: f64 = 1.618_033_988_749_895;

/// Evenly distribute `count` points over a sphere of `radius`.
///
/// Point `i` sits at height `y = 1 - 2i/(count-1)` with azimuth `2πi/φ`.
/// A single point is placed on the equator.
pub fn sphere_points(count: usize, radius: f32) -> Vec<Vec3> {
    let mut points = Vec::with_capacity(count);
    let r = radius as f64;
    for i in 0..count {
        let y = if count > 1 {
            1.0 - (i as f64 / (count - 1) as f64) * 2.0
        } else {
            0.0
        };
        let radius_at_y = (1.0 - y * y).max(0.0).sqrt();
        let theta = std::f64::consts::TAU * i as f64 / GOLDEN_RATIO;

        let x = theta.cos() * radius_at_y;
        let z = theta.sin() * radius_at_y;
        points.push(Vec3::new((x * r) as f32, (y * r) as f32, (z * r) as f32));
    }
    points
}

/// Marker color in HSL, kept as the integers it was drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerColor {
    /// Degrees in [0, 360)
    pub hue: u16,
    /// Percent in [10, 50)
    pub saturation: u8,
    /// Percent in [40, 80)
    pub lightness: u8,
}

impl MarkerColor {
    /// Draw a random bright color.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            hue: rng.gen_range(0..360),
            saturation: rng.gen_range(10..50),
            lightness: rng.gen_range(40..80),
        }
    }

    pub fn to_color32(self) -> Color32 {
        let [r, g, b] = hsl_to_rgb(
            self.hue as f32,
            self.saturation as f32 / 100.0,
            self.lightness as f32 / 100.0,
        );
        Color32::from_rgb(r, g, b)
    }
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [u8; 3] {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = (h.rem_euclid(360.0)) / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let to_u8 = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    [to_u8(r1), to_u8(g1), to_u8(b1)]
}

/// Word pools label text is composed from.
#[derive(Debug, Clone)]
pub struct NamePools {
    pub descriptors: Vec<&'static str>,
    pub roles: Vec<&'static str>,
}

impl Default for NamePools {
    fn default() -> Self {
        Self {
            descriptors: vec![
                "敏捷", "创新", "专业", "高效", "严谨", "灵活", "资深", "全能", "精益", "远见",
            ],
            roles: vec![
                "产品官", "PM", "需求师", "设计家", "迭代官", "规划师", "决策者", "引路人", "布道者",
                "领航员",
            ],
        }
    }
}

impl NamePools {
    /// One descriptor followed directly by one role noun.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let descriptor = pick_one(&self.descriptors, rng);
        let role = pick_one(&self.roles, rng);
        format!("{}{}", descriptor, role)
    }
}

fn pick_one<'a, R: Rng + ?Sized>(pool: &[&'a str], rng: &mut R) -> &'a str {
    if pool.is_empty() {
        ""
    } else {
        pool[rng.gen_range(0..pool.len())]
    }
}

/// Randomized identity of a node, independent of where it sits.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub color: MarkerColor,
    pub label_text: String,
}

/// Draw a node identity from the default pools.
pub fn generate_node<R: Rng + ?Sized>(rng: &mut R) -> NodeSpec {
    generate_node_from(&NamePools::default(), rng)
}

pub fn generate_node_from<R: Rng + ?Sized>(pools: &NamePools, rng: &mut R) -> NodeSpec {
    let color = MarkerColor::random(rng);
    let label_text = pools.pick(rng);
    NodeSpec { color, label_text }
}

/// A laid-out node: fixed position on the shell plus its identity.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedNode {
    /// Position in the sphere's local frame
    pub position: Vec3,
    pub spec: NodeSpec,
}

/// Lay out `count` nodes, drawing each identity from `rng` in index order.
pub fn place_nodes<R: Rng + ?Sized>(
    count: usize,
    radius: f32,
    pools: &NamePools,
    rng: &mut R,
) -> Vec<PlacedNode> {
    sphere_points(count, radius)
        .into_iter()
        .map(|position| PlacedNode {
            position,
            spec: generate_node_from(pools, rng),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::f64::consts::TAU;

    #[test]
    fn test_points_lie_on_shell() {
        let pts = sphere_points(88, 5.0);
        assert_eq!(pts.len(), 88);
        for p in &pts {
            assert!((p.length() - 5.0).abs() < 1e-4, "length {}", p.length());
        }
    }

    #[test]
    fn test_heights_evenly_spaced() {
        let pts = sphere_points(88, 5.0);
        assert!((pts[0].y - 5.0).abs() < 1e-5);
        assert!((pts[87].y + 5.0).abs() < 1e-5);
        let step = 10.0 / 87.0;
        for w in pts.windows(2) {
            assert!(((w[0].y - w[1].y) - step).abs() < 1e-4);
        }
    }

    #[test]
    fn test_azimuth_follows_golden_spiral() {
        let pts = sphere_points(88, 5.0);
        let expected = (TAU / GOLDEN_RATIO).rem_euclid(TAU);
        // Poles have no azimuth
        for i in 1..86 {
            let a0 = (pts[i].z as f64).atan2(pts[i].x as f64);
            let a1 = (pts[i + 1].z as f64).atan2(pts[i + 1].x as f64);
            let diff = (a1 - a0).rem_euclid(TAU);
            assert!((diff - expected).abs() < 1e-3, "i={} diff={}", i, diff);
        }
    }

    #[test]
    fn test_no_coincident_points() {
        let pts = sphere_points(88, 5.0);
        for i in 0..pts.len() {
            for j in (i + 1)..pts.len() {
                assert!(pts[i].distance(pts[j]) > 0.1, "{} and {} coincide", i, j);
            }
        }
    }

    #[test]
    fn test_degenerate_counts() {
        assert!(sphere_points(0, 5.0).is_empty());
        let one = sphere_points(1, 5.0);
        assert_eq!(one.len(), 1);
        assert!((one[0] - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_color_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let c = MarkerColor::random(&mut rng);
            assert!(c.hue < 360);
            assert!((10..50).contains(&c.saturation));
            assert!((40..80).contains(&c.lightness));
        }
    }

    #[test]
    fn test_hsl_conversion() {
        let red = MarkerColor { hue: 0, saturation: 50, lightness: 50 }.to_color32();
        assert_eq!(red, Color32::from_rgb(191, 64, 64));
        let grey = MarkerColor { hue: 200, saturation: 0, lightness: 40 }.to_color32();
        assert_eq!(grey, Color32::from_rgb(102, 102, 102));
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let pools = NamePools::default();
        let a = place_nodes(88, 5.0, &pools, &mut StdRng::seed_from_u64(42));
        let b = place_nodes(88, 5.0, &pools, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
        let c = place_nodes(88, 5.0, &pools, &mut StdRng::seed_from_u64(43));
        assert_ne!(a, c);
    }

    #[test]
    fn test_label_is_descriptor_then_role() {
        let pools = NamePools::default();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let spec = generate_node(&mut rng);
            let descriptor = pools
                .descriptors
                .iter()
                .find(|d| spec.label_text.starts_with(*d))
                .expect("label starts with a descriptor");
            let rest = &spec.label_text[descriptor.len()..];
            assert!(pools.roles.iter().any(|r| *r == rest), "unexpected role {:?}", rest);
        }
    }
}
