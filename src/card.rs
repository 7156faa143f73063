//! The dynamic card: a spinning sphere of labeled nodes.
//!
//! `DynamicCard::mount` builds the scene against a `Surface`, acquiring the
//! frame callback, listeners, gesture suppression and label textures in that
//! order. Input events and frame ticks mutate the spin state; `teardown`
//! hands everything back.

use glam::Vec2;
use log::{debug, info, warn};
use rand::Rng;

use crate::config::CardConfig;
use crate::error::CardError;
use crate::input::{InputEvent, InputKind};
use crate::interaction::{self, InteractionState, Phase};
use crate::label::{create_labels, LabelFont, LabelRaster, Marquee};
use crate::layout::{place_nodes, NamePools};
use crate::scene::{ndc_from_screen, Marker, Scene, Sprite};
use crate::surface::{FrameKey, Release, Surface, Teardown, TextureKey};

/// The node under a click or tap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeHit {
    pub index: usize,
    pub text: String,
}

/// Callback fired with every hit node.
pub type SelectHandler = Box<dyn FnMut(&NodeHit)>;

/// Per-node label state.
#[derive(Debug, Clone)]
struct LabelSlot {
    text: String,
    texture: Option<TextureKey>,
    marquee: Marquee,
    hw_ratio: f32,
}

pub struct DynamicCard {
    config: CardConfig,
    scene: Scene,
    state: InteractionState,
    labels: Vec<LabelSlot>,
    frame: FrameKey,
    teardown: Teardown,
    on_select: Option<SelectHandler>,
    frames: u64,
}

impl std::fmt::Debug for DynamicCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicCard")
            .field("nodes", &self.labels.len())
            .field("frame", &self.frame)
            .field("frames", &self.frames)
            .field("mounted", &self.is_mounted())
            .finish()
    }
}

/// Widget-scoped listeners; move and release are window-scoped.
const LISTENERS: [InputKind; 7] = [
    InputKind::Down,
    InputKind::Click,
    InputKind::TouchStart,
    InputKind::TouchMove,
    InputKind::TouchEnd,
    InputKind::Move,
    InputKind::Up,
];

impl DynamicCard {
    /// Build a card into `surface`.
    ///
    /// Returns `Ok(None)` without touching the surface when the region has no
    /// area. Label failures never abort the mount: the node keeps its marker
    /// and gets a placeholder or no label.
    pub fn mount<R: Rng + ?Sized>(
        surface: &mut dyn Surface,
        config: CardConfig,
        rng: &mut R,
        font: &dyn LabelFont,
    ) -> Result<Option<Self>, CardError> {
        Self::mount_with_pools(surface, config, &NamePools::default(), rng, font)
    }

    pub fn mount_with_pools<R: Rng + ?Sized>(
        surface: &mut dyn Surface,
        config: CardConfig,
        pools: &NamePools,
        rng: &mut R,
        font: &dyn LabelFont,
    ) -> Result<Option<Self>, CardError> {
        config.validate()?;

        let size = surface.size();
        if !(size.x > 0.0 && size.y > 0.0) {
            warn!(
                "{}",
                CardError::EmptyRegion {
                    width: size.x,
                    height: size.y
                }
            );
            return Ok(None);
        }

        // Identities come off the RNG in index order before any parallel work
        let nodes = place_nodes(config.node_count, config.layout_radius, pools, rng);
        let texts: Vec<String> = nodes.iter().map(|n| n.spec.label_text.clone()).collect();
        let style = config.label.scaled(surface.pixels_per_point());
        let rasters = create_labels(&texts, &style, font);

        let mut teardown = Teardown::new();

        let frame = surface.request_frame();
        teardown.push(Release::Frame(frame));

        for kind in LISTENERS {
            let key = surface.listen(kind.scope(), kind);
            teardown.push(Release::Listener(key));
        }

        surface.set_gesture_suppression(true);
        teardown.push(Release::GestureSuppression);

        let mut labels = Vec::with_capacity(nodes.len());
        for (i, (text, raster)) in texts.into_iter().zip(rasters).enumerate() {
            let raster = raster.unwrap_or_else(|e| {
                warn!("Label {} ({:?}): {}; using placeholder", i, text, CardError::from(e));
                LabelRaster::placeholder(&style)
            });
            let name = format!("dynamic-card/label-{}", i);
            let texture = match surface.upload_texture(&name, raster.to_color_image(), raster.wrap) {
                Ok(key) => {
                    teardown.push(Release::Texture(key));
                    Some(key)
                }
                Err(e) => {
                    warn!("Label {} skipped: {}", i, e);
                    None
                }
            };
            labels.push(LabelSlot {
                text,
                texture,
                marquee: Marquee::for_raster(&raster),
                hw_ratio: raster.hw_ratio,
            });
        }

        let markers = nodes
            .iter()
            .map(|n| Marker {
                local: n.position,
                color: n.spec.color.to_color32(),
            })
            .collect();
        let scene = Scene::new(&config, Vec2::new(size.x, size.y), markers);

        info!(
            "Mounted dynamic card: {} nodes in {:.0}x{:.0} region ({} textures)",
            labels.len(),
            size.x,
            size.y,
            labels.iter().filter(|l| l.texture.is_some()).count()
        );

        Ok(Some(Self {
            state: InteractionState::new(&config.motion),
            config,
            scene,
            labels,
            frame,
            teardown,
            on_select: None,
            frames: 0,
        }))
    }

    /// Install the node-selected callback.
    pub fn on_select(mut self, handler: impl FnMut(&NodeHit) + 'static) -> Self {
        self.on_select = Some(Box::new(handler));
        self
    }

    pub fn set_on_select(&mut self, handler: Option<SelectHandler>) {
        self.on_select = handler;
    }

    pub fn is_mounted(&self) -> bool {
        !self.teardown.is_done()
    }

    pub fn node_count(&self) -> usize {
        self.labels.len()
    }

    pub fn label_text(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(|l| l.text.as_str())
    }

    pub fn frame_key(&self) -> FrameKey {
        self.frame
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase(&self.config.motion)
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn config(&self) -> &CardConfig {
        &self.config
    }

    /// Feed one translated event. `rect` is where the card is painted.
    ///
    /// Returns the hit node for clicks and tap releases.
    pub fn handle_input(&mut self, event: &InputEvent, rect: egui::Rect) -> Option<NodeHit> {
        if !self.is_mounted() {
            return None;
        }
        let pos = Vec2::new(event.pos.x, event.pos.y);
        let motion = &self.config.motion;

        match event.kind {
            InputKind::Down | InputKind::TouchStart => {
                self.state = interaction::begin_drag(self.state, pos, event.pointer_kind());
                None
            }
            InputKind::Move | InputKind::TouchMove => {
                self.state = interaction::apply_drag(self.state, pos, motion);
                None
            }
            InputKind::Up => {
                self.state = interaction::end_drag(self.state, motion);
                None
            }
            InputKind::TouchEnd => {
                self.state = interaction::end_drag(self.state, motion);
                self.select_at(event.pos, rect)
            }
            InputKind::Click => self.select_at(event.pos, rect),
        }
    }

    /// Hit-test a screen position and report the node, if any.
    pub fn select_at(&mut self, pos: egui::Pos2, rect: egui::Rect) -> Option<NodeHit> {
        let ndc = ndc_from_screen(rect, pos);
        let index = self.scene.hit_test(ndc)?;
        let hit = NodeHit {
            index,
            text: self.labels.get(index)?.text.clone(),
        };
        debug!("Node {} hit: {:?}", hit.index, hit.text);
        if let Some(handler) = self.on_select.as_mut() {
            handler(&hit);
        }
        Some(hit)
    }

    /// Advance one frame: integrate spin, commit it to the scene and scroll
    /// marquee labels.
    pub fn frame(&mut self) {
        if !self.is_mounted() {
            return;
        }
        self.state = interaction::step(self.state, &self.config.motion);
        self.scene.orientation = self.state.orientation;
        for label in &mut self.labels {
            label.marquee.advance(self.config.text_speed);
        }
        self.frames += 1;
    }

    /// Shapes for the current frame, back to front.
    pub fn paint(&self, surface: &dyn Surface, rect: egui::Rect) -> Vec<egui::Shape> {
        if !self.is_mounted() {
            return Vec::new();
        }
        let sprites: Vec<Sprite> = self
            .labels
            .iter()
            .map(|l| Sprite {
                texture: l.texture.and_then(|k| surface.texture_id(k)),
                hw_ratio: l.hw_ratio,
                u_range: l.marquee.u_range(),
            })
            .collect();
        self.scene.shapes(rect, &sprites)
    }

    /// Release everything acquired at mount. Safe to call more than once.
    pub fn teardown(&mut self, surface: &mut dyn Surface) {
        let released = self.teardown.run(surface);
        if released > 0 {
            self.on_select = None;
            info!(
                "Dynamic card torn down: {} resources released after {} frames",
                released, self.frames
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MotionConfig;
    use crate::label::tests::FixedFont;
    use crate::label::WrapMode;
    use crate::surface::tests::{Call, CountingSurface};
    use crate::surface::{ListenerScope, SurfaceStats};
    use egui::{pos2, vec2, Pos2, Rect};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn rect() -> Rect {
        Rect::from_min_size(Pos2::ZERO, vec2(400.0, 400.0))
    }

    fn mount(surface: &mut CountingSurface, config: CardConfig, seed: u64) -> DynamicCard {
        DynamicCard::mount(surface, config, &mut StdRng::seed_from_u64(seed), &FixedFont)
            .unwrap()
            .expect("non-empty region mounts")
    }

    #[test]
    fn test_mount_builds_every_node() {
        let mut surface = CountingSurface::new(400.0, 400.0);
        let card = mount(&mut surface, CardConfig::default(), 1);
        assert_eq!(card.node_count(), 88);
        assert_eq!(card.scene().markers.len(), 88);
        let stats = surface.stats();
        assert_eq!(stats.textures, 88);
        assert_eq!(stats.listeners, 7);
        assert_eq!(stats.frames, 1);
        assert!(stats.gesture_suppressed);
    }

    #[test]
    fn test_acquisition_order() {
        let mut surface = CountingSurface::new(400.0, 400.0);
        let _card = mount(&mut surface, CardConfig::default().with_node_count(2), 1);
        assert_eq!(surface.calls[0], Call::RequestFrame);
        assert!(matches!(surface.calls[1], Call::Listen(ListenerScope::Widget, InputKind::Down)));
        assert_eq!(surface.calls[6], Call::Listen(ListenerScope::Window, InputKind::Move));
        assert_eq!(surface.calls[7], Call::Listen(ListenerScope::Window, InputKind::Up));
        assert_eq!(surface.calls[8], Call::Suppress(true));
        assert_eq!(surface.calls[9], Call::Upload("dynamic-card/label-0".into()));
        assert_eq!(surface.calls.len(), 11);
    }

    #[test]
    fn test_remount_returns_to_baseline() {
        let mut surface = CountingSurface::new(400.0, 400.0);
        let baseline = surface.stats();
        assert_eq!(baseline, SurfaceStats::default());
        for seed in 0..5 {
            let mut card = mount(&mut surface, CardConfig::default(), seed);
            assert!(!surface.stats().is_empty());
            card.frame();
            card.teardown(&mut surface);
            assert_eq!(surface.stats(), baseline, "leak after mount #{}", seed);
            assert!(!card.is_mounted());
        }
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let mut surface = CountingSurface::new(400.0, 400.0);
        let mut card = mount(&mut surface, CardConfig::default().with_node_count(3), 1);
        card.teardown(&mut surface);
        let calls = surface.calls.len();
        card.teardown(&mut surface);
        assert_eq!(surface.calls.len(), calls);
        // A torn-down card no longer advances or paints
        card.frame();
        assert_eq!(card.frames(), 0);
        assert!(card.paint(&surface, rect()).is_empty());
    }

    #[test]
    fn test_teardown_stops_frame_before_freeing() {
        let mut surface = CountingSurface::new(400.0, 400.0);
        let mut card = mount(&mut surface, CardConfig::default().with_node_count(2), 1);
        surface.calls.clear();
        card.teardown(&mut surface);
        assert_eq!(surface.calls[0], Call::CancelFrame(card.frame_key()));
        assert!(matches!(surface.calls.last(), Some(Call::Free(_))));
        assert!(!surface.frame_scheduled());
    }

    #[test]
    fn test_zero_region_is_noop() {
        for (w, h) in [(0.0, 300.0), (300.0, 0.0), (0.0, 0.0), (f32::NAN, 10.0)] {
            let mut surface = CountingSurface::new(w, h);
            let card = DynamicCard::mount(
                &mut surface,
                CardConfig::default(),
                &mut StdRng::seed_from_u64(1),
                &FixedFont,
            )
            .unwrap();
            assert!(card.is_none());
            assert!(surface.calls.is_empty());
        }
    }

    #[test]
    fn test_invalid_config_is_error() {
        let mut surface = CountingSurface::new(400.0, 400.0);
        let mut cfg = CardConfig::default();
        cfg.marker_radius = -1.0;
        let res = DynamicCard::mount(&mut surface, cfg, &mut StdRng::seed_from_u64(1), &FixedFont);
        assert!(matches!(res, Err(CardError::InvalidConfig { field: "marker_radius", .. })));
        assert!(surface.calls.is_empty());
    }

    #[test]
    fn test_failed_upload_skips_label_only() {
        let mut surface = CountingSurface::new(400.0, 400.0);
        surface.fail_uploads_matching = Some("label-1".into());
        let mut card = mount(&mut surface, CardConfig::default().with_node_count(3), 1);
        assert_eq!(card.node_count(), 3);
        assert_eq!(surface.stats().textures, 2);
        assert_eq!(card.scene().markers.len(), 3);
        card.teardown(&mut surface);
        assert_eq!(surface.stats(), SurfaceStats::default());
    }

    #[test]
    fn test_failed_raster_gets_placeholder() {
        let mut surface = CountingSurface::new(400.0, 400.0);
        let huge: &'static str = Box::leak("x".repeat(1000).into_boxed_str());
        let pools = NamePools {
            descriptors: vec![huge],
            roles: vec!["PM"],
        };
        let mut card = DynamicCard::mount_with_pools(
            &mut surface,
            CardConfig::default().with_node_count(3),
            &pools,
            &mut StdRng::seed_from_u64(1),
            &FixedFont,
        )
        .unwrap()
        .expect("mount survives label failures");

        assert_eq!(card.node_count(), 3);
        assert_eq!(card.scene().markers.len(), 3);
        assert_eq!(surface.stats().textures, 3);
        for (i, label) in card.labels.iter().enumerate() {
            assert!(label.texture.is_some(), "label {} has no texture", i);
            assert!(!label.marquee.scrolling);
            assert_eq!(surface.wrap_of(label.texture.unwrap()), Some(WrapMode::Clamp));
        }
        assert_eq!(card.label_text(0).map(str::len), Some(1002));
        // Placeholder quads are still painted: sphere + 3 markers + 3 labels
        assert_eq!(card.paint(&surface, rect()).len(), 7);

        card.teardown(&mut surface);
        assert_eq!(surface.stats(), SurfaceStats::default());
    }

    #[test]
    fn test_wrap_modes_follow_marquee() {
        let mut surface = CountingSurface::new(400.0, 400.0);
        let pools = NamePools {
            descriptors: vec!["An exceedingly long descriptor"],
            roles: vec!["PM"],
        };
        let short = NamePools {
            descriptors: vec![],
            roles: vec!["PM"],
        };
        let mut rng = StdRng::seed_from_u64(1);
        let cfg = CardConfig::default().with_node_count(1);
        let long_card = DynamicCard::mount_with_pools(&mut surface, cfg.clone(), &pools, &mut rng, &FixedFont)
            .unwrap()
            .unwrap();
        let short_card = DynamicCard::mount_with_pools(&mut surface, cfg, &short, &mut rng, &FixedFont)
            .unwrap()
            .unwrap();
        let long_key = long_card.labels[0].texture.unwrap();
        let short_key = short_card.labels[0].texture.unwrap();
        assert_eq!(surface.wrap_of(long_key), Some(WrapMode::Repeat));
        assert_eq!(surface.wrap_of(short_key), Some(WrapMode::Clamp));
        assert!(long_card.labels[0].marquee.scrolling);
        assert!(!short_card.labels[0].marquee.scrolling);
    }

    #[test]
    fn test_marquee_advances_per_frame() {
        let mut surface = CountingSurface::new(400.0, 400.0);
        let pools = NamePools {
            descriptors: vec!["An exceedingly long descriptor"],
            roles: vec!["PM"],
        };
        let mut card = DynamicCard::mount_with_pools(
            &mut surface,
            CardConfig::default().with_node_count(1),
            &pools,
            &mut StdRng::seed_from_u64(1),
            &FixedFont,
        )
        .unwrap()
        .unwrap();
        for _ in 0..10 {
            card.frame();
        }
        assert!((card.labels[0].marquee.offset - 0.02).abs() < 1e-5);
    }

    #[test]
    fn test_seeded_mount_is_reproducible() {
        let mut a_surface = CountingSurface::new(400.0, 400.0);
        let mut b_surface = CountingSurface::new(400.0, 400.0);
        let a = mount(&mut a_surface, CardConfig::default(), 9);
        let b = mount(&mut b_surface, CardConfig::default(), 9);
        for i in 0..a.node_count() {
            assert_eq!(a.label_text(i), b.label_text(i));
            assert_eq!(a.scene().markers[i], b.scene().markers[i]);
        }
    }

    #[test]
    fn test_drag_release_keeps_momentum() {
        let mut surface = CountingSurface::new(400.0, 400.0);
        let mut card = mount(&mut surface, CardConfig::default().with_node_count(4), 1);
        let motion = MotionConfig::default();

        card.handle_input(&InputEvent::new(InputKind::Down, pos2(200.0, 200.0)), rect());
        card.handle_input(&InputEvent::new(InputKind::Move, pos2(230.0, 240.0)), rect());
        assert_eq!(card.phase(), Phase::Dragging);
        card.handle_input(&InputEvent::new(InputKind::Up, pos2(230.0, 240.0)), rect());

        // Last delta (30, 40): axis (40, 30, 0)/50, speed 50 * 0.01
        let axis = card.state().axis;
        assert!((axis - glam::Vec3::new(0.8, 0.6, 0.0)).length() < 1e-5);
        assert!((card.state().speed() - 0.5).abs() < 1e-5);
        assert_eq!(card.phase(), Phase::Settling);

        card.frame();
        assert!((card.state().speed() - 0.5 * motion.decay).abs() < 1e-5);
        assert_eq!(card.scene().orientation, card.state().orientation);
    }

    #[test]
    fn test_scene_commits_only_on_frame() {
        let mut surface = CountingSurface::new(400.0, 400.0);
        let mut card = mount(&mut surface, CardConfig::default().with_node_count(4), 1);
        let before = card.scene().orientation;
        card.handle_input(&InputEvent::new(InputKind::Down, pos2(200.0, 200.0)), rect());
        card.handle_input(&InputEvent::new(InputKind::Move, pos2(260.0, 200.0)), rect());
        assert_eq!(card.scene().orientation, before);
        card.frame();
        assert_eq!(card.scene().orientation, card.state().orientation);
        assert_ne!(card.scene().orientation, before);
    }

    #[test]
    fn test_click_reports_hit_node() {
        let mut surface = CountingSurface::new(400.0, 400.0);
        let selected: Rc<RefCell<Vec<NodeHit>>> = Rc::default();
        let sink = selected.clone();
        // A single node sits on the equator at +X; face it toward the camera
        let mut card = mount(&mut surface, CardConfig::default().with_node_count(1), 3)
            .on_select(move |hit| sink.borrow_mut().push(hit.clone()));
        card.scene.orientation = glam::Quat::from_rotation_y(-std::f32::consts::FRAC_PI_2);

        let center = rect().center();
        let hit = card.handle_input(&InputEvent::new(InputKind::Click, center), rect());
        let expected = NodeHit {
            index: 0,
            text: card.label_text(0).unwrap().to_string(),
        };
        assert_eq!(hit, Some(expected.clone()));
        assert_eq!(*selected.borrow(), vec![expected]);

        let miss = card.handle_input(&InputEvent::new(InputKind::Click, pos2(5.0, 5.0)), rect());
        assert_eq!(miss, None);
        assert_eq!(selected.borrow().len(), 1);
    }

    #[test]
    fn test_tap_release_hit_tests() {
        let mut surface = CountingSurface::new(400.0, 400.0);
        let mut card = mount(&mut surface, CardConfig::default().with_node_count(1), 3);
        card.scene.orientation = glam::Quat::from_rotation_y(-std::f32::consts::FRAC_PI_2);
        let center = rect().center();
        card.handle_input(&InputEvent::new(InputKind::TouchStart, center), rect());
        let hit = card.handle_input(&InputEvent::new(InputKind::TouchEnd, center), rect());
        assert_eq!(hit.map(|h| h.index), Some(0));
        assert!(!card.state().is_dragging());
    }

    #[test]
    fn test_paint_emits_sphere_markers_and_labels() {
        let mut surface = CountingSurface::new(400.0, 400.0);
        let card = mount(&mut surface, CardConfig::default().with_node_count(5), 2);
        let shapes = card.paint(&surface, rect());
        // sphere overlay + 5 markers + 5 labels
        assert_eq!(shapes.len(), 11);
    }
}
