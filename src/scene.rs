//! Scene: camera, central sphere, markers and label billboards.
//!
//! Geometry lives in world space and is projected on the CPU; the result is
//! a list of `egui::Shape`s painted back to front.

use egui::{pos2, Color32, Mesh, Pos2, Rect, Shape, TextureId, Vec2 as EVec2};
use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

use crate::config::{CameraConfig, CardConfig};

// ── Camera ──

/// Perspective camera looking at the origin from +Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in radians
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(cfg: &CameraConfig, viewport: Vec2) -> Self {
        let viewport = clamp_viewport(viewport);
        Self {
            position: Vec3::new(0.0, 0.0, cfg.distance),
            target: Vec3::ZERO,
            fov_y: cfg.fov_deg.to_radians(),
            aspect: viewport.x / viewport.y,
            near: cfg.near,
            far: cfg.far,
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Project a world point. `None` when it is behind the camera.
    pub fn project(&self, world: Vec3) -> Option<Projected> {
        let clip = self.view_projection() * world.extend(1.0);
        if clip.w <= self.near * 0.5 {
            return None;
        }
        Some(Projected {
            ndc: Vec2::new(clip.x / clip.w, clip.y / clip.w),
            depth: clip.w,
        })
    }

    /// Ray from the eye through a normalized device coordinate.
    pub fn ray_through(&self, ndc: Vec2) -> Ray {
        let inv = self.view_projection().inverse();
        let unproject = |z: f32| {
            let p = inv * Vec4::new(ndc.x, ndc.y, z, 1.0);
            p.truncate() / p.w
        };
        let near = unproject(-1.0);
        let far = unproject(1.0);
        Ray {
            origin: near,
            dir: (far - near).normalize_or_zero(),
        }
    }

    /// Screen pixels covered by one world unit at view depth `depth`.
    pub fn pixels_per_unit(&self, depth: f32, viewport_height: f32) -> f32 {
        (viewport_height * 0.5) / (depth.max(self.near) * (self.fov_y * 0.5).tan())
    }
}

/// A projected point: NDC position and view-space distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub ndc: Vec2,
    pub depth: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction
    pub dir: Vec3,
}

impl Ray {
    /// Distance to the first intersection with a sphere in front of the origin.
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let b = oc.dot(self.dir);
        let c = oc.length_squared() - radius * radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let sq = disc.sqrt();
        let t0 = -b - sq;
        let t1 = -b + sq;
        if t0 >= 0.0 {
            Some(t0)
        } else if t1 >= 0.0 {
            Some(t1)
        } else {
            None
        }
    }
}

/// Mount regions smaller than a point are treated as 1×1.
pub fn clamp_viewport(size: Vec2) -> Vec2 {
    let fix = |v: f32| if v.is_finite() { v.max(1.0) } else { 1.0 };
    Vec2::new(fix(size.x), fix(size.y))
}

/// Pointer position inside `rect` to normalized device coordinates (+Y up).
pub fn ndc_from_screen(rect: Rect, pos: Pos2) -> Vec2 {
    let w = rect.width().max(1.0);
    let h = rect.height().max(1.0);
    Vec2::new(
        (pos.x - rect.left()) / w * 2.0 - 1.0,
        -((pos.y - rect.top()) / h) * 2.0 + 1.0,
    )
}

pub fn screen_from_ndc(rect: Rect, ndc: Vec2) -> Pos2 {
    pos2(
        rect.left() + (ndc.x + 1.0) * 0.5 * rect.width(),
        rect.top() + (1.0 - ndc.y) * 0.5 * rect.height(),
    )
}

// ── Lighting ──

/// Ambient plus one directional light, used for marker shading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub ambient: f32,
    pub directional: f32,
    /// Light position; it shines toward the origin
    pub position: Vec3,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: 0.5,
            directional: 1.0,
            position: Vec3::new(5.0, 5.0, 5.0),
        }
    }
}

impl Lighting {
    pub fn intensity(&self, normal: Vec3) -> f32 {
        let to_light = self.position.normalize_or_zero();
        (self.ambient + self.directional * normal.dot(to_light).max(0.0)).min(1.0)
    }

    pub fn shade(&self, base: Color32, normal: Vec3) -> Color32 {
        let k = self.intensity(normal);
        let scale = |c: u8| (c as f32 * k).round().clamp(0.0, 255.0) as u8;
        Color32::from_rgb(scale(base.r()), scale(base.g()), scale(base.b()))
    }
}

// ── Central sphere ──

/// Latitude/longitude sphere tessellation.
#[derive(Debug, Clone)]
pub struct SphereMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<[u32; 3]>,
}

impl SphereMesh {
    pub fn new(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let ws = width_segments.max(3);
        let hs = height_segments.max(2);
        let mut positions = Vec::with_capacity(((ws + 1) * (hs + 1)) as usize);
        let mut normals = Vec::with_capacity(positions.capacity());

        for iy in 0..=hs {
            let v = iy as f32 / hs as f32;
            let theta = v * std::f32::consts::PI;
            for ix in 0..=ws {
                let u = ix as f32 / ws as f32;
                let phi = u * std::f32::consts::TAU;
                let n = Vec3::new(
                    -phi.cos() * theta.sin(),
                    theta.cos(),
                    phi.sin() * theta.sin(),
                );
                normals.push(n);
                positions.push(n * radius);
            }
        }

        let row = ws + 1;
        let mut indices = Vec::with_capacity((ws * hs * 2) as usize);
        for iy in 0..hs {
            for ix in 0..ws {
                let a = iy * row + ix + 1;
                let b = iy * row + ix;
                let c = (iy + 1) * row + ix;
                let d = (iy + 1) * row + ix + 1;
                if iy != 0 {
                    indices.push([a, b, d]);
                }
                if iy != hs - 1 {
                    indices.push([b, c, d]);
                }
            }
        }

        Self {
            positions,
            normals,
            indices,
        }
    }
}

pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

// ── Scene ──

/// A node marker in the sphere's local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub local: Vec3,
    pub color: Color32,
}

/// Label billboard data needed for painting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub texture: Option<TextureId>,
    /// World height for a world width of 1
    pub hw_ratio: f32,
    pub u_range: (f32, f32),
}

/// Everything drawn inside the card.
#[derive(Debug, Clone)]
pub struct Scene {
    pub camera: Camera,
    pub viewport: Vec2,
    /// Orientation of the central sphere; markers inherit it
    pub orientation: Quat,
    pub sphere: SphereMesh,
    pub sphere_color: Color32,
    pub sphere_opacity: f32,
    pub markers: Vec<Marker>,
    pub marker_radius: f32,
    pub label_lift: f32,
    pub lighting: Lighting,
}

impl Scene {
    pub fn new(cfg: &CardConfig, viewport: Vec2, markers: Vec<Marker>) -> Self {
        let viewport = clamp_viewport(viewport);
        Self {
            camera: Camera::new(&cfg.camera, viewport),
            viewport,
            orientation: Quat::IDENTITY,
            sphere: SphereMesh::new(cfg.sphere_radius, 16, 16),
            sphere_color: Color32::BLACK,
            sphere_opacity: cfg.sphere_opacity,
            markers,
            marker_radius: cfg.marker_radius,
            label_lift: cfg.label_lift,
            lighting: Lighting::default(),
        }
    }

    /// World position of marker `i` under the current orientation.
    pub fn marker_world(&self, i: usize) -> Option<Vec3> {
        self.markers.get(i).map(|m| self.orientation * m.local)
    }

    /// Where label `i` is anchored: just above its marker, never rotated.
    pub fn label_anchor(&self, i: usize) -> Option<Vec3> {
        self.marker_world(i).map(|p| p + Vec3::Y * self.label_lift)
    }

    /// Index of the nearest marker under `ndc`, if any.
    pub fn hit_test(&self, ndc: Vec2) -> Option<usize> {
        let ray = self.camera.ray_through(ndc);
        let mut best: Option<(usize, f32)> = None;
        for i in 0..self.markers.len() {
            let Some(center) = self.marker_world(i) else {
                continue;
            };
            if let Some(t) = ray.intersect_sphere(center, self.marker_radius) {
                if best.map_or(true, |(_, bt)| t < bt) {
                    best = Some((i, t));
                }
            }
        }
        best.map(|(i, _)| i)
    }

    /// Build the paint list for `rect`, farthest first.
    pub fn shapes(&self, rect: Rect, sprites: &[Sprite]) -> Vec<Shape> {
        enum Item {
            Sphere,
            Marker(usize),
            Label(usize),
        }

        let mut items: Vec<(f32, Item)> = Vec::with_capacity(self.markers.len() * 2 + 1);
        items.push((self.camera.position.distance(self.camera.target), Item::Sphere));
        for i in 0..self.markers.len() {
            if let Some(p) = self.marker_world(i).and_then(|w| self.camera.project(w)) {
                items.push((p.depth, Item::Marker(i)));
            }
            if sprites.get(i).and_then(|s| s.texture).is_some() {
                if let Some(p) = self.label_anchor(i).and_then(|w| self.camera.project(w)) {
                    items.push((p.depth, Item::Label(i)));
                }
            }
        }
        items.sort_by(|a, b| b.0.total_cmp(&a.0));

        let mut shapes = Vec::with_capacity(items.len());
        for (_, item) in items {
            let shape = match item {
                Item::Sphere => self.sphere_shape(rect),
                Item::Marker(i) => self.marker_shape(rect, i),
                Item::Label(i) => sprites.get(i).and_then(|s| self.sprite_shape(rect, i, s)),
            };
            shapes.extend(shape);
        }
        shapes
    }

    fn sphere_shape(&self, rect: Rect) -> Option<Shape> {
        let view = self.camera.view();
        let mut mesh = Mesh::default();
        let mut visible = Vec::with_capacity(self.sphere.positions.len());

        for (p, n) in self.sphere.positions.iter().zip(&self.sphere.normals) {
            let world = self.orientation * *p;
            let n_view = view.transform_vector3(self.orientation * *n).normalize_or_zero();
            let alpha = self.sphere_opacity * smoothstep(0.5, 1.0, n_view.z);
            let pos = self
                .camera
                .project(world)
                .map(|pr| screen_from_ndc(rect, pr.ndc));
            let color = Color32::from_rgba_unmultiplied(
                self.sphere_color.r(),
                self.sphere_color.g(),
                self.sphere_color.b(),
                (alpha * 255.0).round() as u8,
            );
            visible.push(pos.is_some() && alpha > 0.0);
            mesh.colored_vertex(pos.unwrap_or(Pos2::ZERO), color);
        }

        for [a, b, c] in &self.sphere.indices {
            // Fully transparent triangles are back-facing or at the rim
            if visible[*a as usize] || visible[*b as usize] || visible[*c as usize] {
                mesh.add_triangle(*a, *b, *c);
            }
        }
        if mesh.indices.is_empty() {
            None
        } else {
            Some(Shape::mesh(mesh))
        }
    }

    fn marker_shape(&self, rect: Rect, i: usize) -> Option<Shape> {
        let world = self.marker_world(i)?;
        let p = self.camera.project(world)?;
        let radius = self.marker_radius * self.camera.pixels_per_unit(p.depth, rect.height());
        let facing = (self.camera.position - world).normalize_or_zero();
        let color = self.lighting.shade(self.markers[i].color, facing);
        Some(Shape::circle_filled(screen_from_ndc(rect, p.ndc), radius, color))
    }

    fn sprite_shape(&self, rect: Rect, i: usize, sprite: &Sprite) -> Option<Shape> {
        let texture = sprite.texture?;
        let anchor = self.label_anchor(i)?;
        let p = self.camera.project(anchor)?;
        let ppu = self.camera.pixels_per_unit(p.depth, rect.height());
        let size = EVec2::new(ppu, sprite.hw_ratio * ppu);
        let quad = Rect::from_center_size(screen_from_ndc(rect, p.ndc), size);
        let (u0, u1) = sprite.u_range;
        let uv = Rect::from_min_max(pos2(u0, 0.0), pos2(u1, 1.0));

        let mut mesh = Mesh::with_texture(texture);
        mesh.add_rect_with_uv(quad, uv, Color32::WHITE);
        Some(Shape::mesh(mesh))
    }
}
