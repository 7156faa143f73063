//! egui hosting: the production `Surface` and the widget wrapper.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use egui::{ColorImage, TextureHandle, TextureId, TextureOptions, TextureWrapMode, Vec2};
use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::card::{DynamicCard, NodeHit};
use crate::config::CardConfig;
use crate::error::CardError;
use crate::input::{GestureFilter, InputKind, InputRouter};
use crate::interaction::Phase;
use crate::label::{LabelFont, WrapMode};
use crate::surface::{
    FrameKey, ListenerKey, ListenerRegistry, ListenerScope, Surface, SurfaceStats, TextureKey,
};

/// `Surface` backed by an `egui::Context`.
///
/// Textures live as `TextureHandle`s and are freed when dropped from the map.
/// The frame callback is a flag the widget polls each egui frame, kept alive
/// with `request_repaint`.
pub struct EguiSurface {
    ctx: egui::Context,
    size: Vec2,
    textures: HashMap<TextureKey, TextureHandle>,
    listeners: ListenerRegistry,
    frame: Option<FrameKey>,
    gesture_suppressed: bool,
    next: u64,
}

impl EguiSurface {
    pub fn new(ctx: &egui::Context, size: Vec2) -> Self {
        Self {
            ctx: ctx.clone(),
            size,
            textures: HashMap::new(),
            listeners: ListenerRegistry::default(),
            frame: None,
            gesture_suppressed: false,
            next: 0,
        }
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    pub fn frame_pending(&self) -> bool {
        self.frame.is_some()
    }

    pub fn gesture_suppressed(&self) -> bool {
        self.gesture_suppressed
    }

    fn next_key(&mut self) -> u64 {
        self.next += 1;
        self.next
    }
}

impl Surface for EguiSurface {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn pixels_per_point(&self) -> f32 {
        self.ctx.pixels_per_point()
    }

    fn upload_texture(
        &mut self,
        name: &str,
        image: ColorImage,
        wrap: WrapMode,
    ) -> Result<TextureKey, CardError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(CardError::Texture(format!("{}: empty image", name)));
        }
        let max = self.ctx.input(|i| i.max_texture_side);
        if image.width() > max || image.height() > max {
            return Err(CardError::Texture(format!(
                "{}: {}x{} exceeds max texture side {}",
                name,
                image.width(),
                image.height(),
                max
            )));
        }
        let options = TextureOptions {
            wrap_mode: match wrap {
                WrapMode::Clamp => TextureWrapMode::ClampToEdge,
                WrapMode::Repeat => TextureWrapMode::Repeat,
            },
            ..TextureOptions::LINEAR
        };
        let handle = self.ctx.load_texture(name, image, options);
        let key = TextureKey(self.next_key());
        self.textures.insert(key, handle);
        Ok(key)
    }

    fn free_texture(&mut self, key: TextureKey) {
        self.textures.remove(&key);
    }

    fn texture_id(&self, key: TextureKey) -> Option<TextureId> {
        self.textures.get(&key).map(TextureHandle::id)
    }

    fn listen(&mut self, scope: ListenerScope, kind: InputKind) -> ListenerKey {
        self.listeners.add(scope, kind)
    }

    fn unlisten(&mut self, key: ListenerKey) {
        self.listeners.remove(key);
    }

    fn request_frame(&mut self) -> FrameKey {
        let key = FrameKey(self.next_key());
        self.frame = Some(key);
        self.ctx.request_repaint();
        key
    }

    fn cancel_frame(&mut self, key: FrameKey) {
        if self.frame == Some(key) {
            self.frame = None;
        }
    }

    fn set_gesture_suppression(&mut self, suppress: bool) {
        self.gesture_suppressed = suppress;
    }

    fn stats(&self) -> SurfaceStats {
        SurfaceStats {
            textures: self.textures.len(),
            listeners: self.listeners.len(),
            frames: usize::from(self.frame.is_some()),
            gesture_suppressed: self.gesture_suppressed,
        }
    }
}

// ── Widget ──

struct Mounted {
    surface: EguiSurface,
    card: DynamicCard,
}

/// What one `CardWidget::show` produced.
pub struct CardOutput {
    pub response: egui::Response,
    /// Nodes clicked or tapped this frame, in order
    pub selected: Vec<NodeHit>,
}

/// Dynamic card as an egui widget.
///
/// Mounts on the first `show` with a non-empty size and keeps that size for
/// its lifetime: later `show` calls allocate the mount size whatever they
/// ask for. Tears down on `unmount` or drop.
///
/// Gesture suppression needs the frame's raw input, so hosts forward
/// `eframe::App::raw_input_hook` to [`CardWidget::suppress_gestures`].
pub struct CardWidget {
    config: CardConfig,
    seed: Option<u64>,
    font: Arc<dyn LabelFont>,
    mounted: Option<Mounted>,
    router: InputRouter,
    gestures: GestureFilter,
    /// Where the card was painted last frame
    last_rect: Option<egui::Rect>,
    selections: Rc<RefCell<Vec<NodeHit>>>,
    /// Size that last produced an empty mount; retried only on change
    empty_size: Option<Vec2>,
    error: Option<CardError>,
}

impl CardWidget {
    pub fn new(config: CardConfig, font: Arc<dyn LabelFont>) -> Self {
        Self {
            config,
            seed: None,
            font,
            mounted: None,
            router: InputRouter::new(),
            gestures: GestureFilter::new(),
            last_rect: None,
            selections: Rc::default(),
            empty_size: None,
            error: None,
        }
    }

    /// Seed node identities for a reproducible card.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn error(&self) -> Option<&CardError> {
        self.error.as_ref()
    }

    /// Live resources held for the card, all zero when unmounted.
    pub fn stats(&self) -> SurfaceStats {
        self.mounted
            .as_ref()
            .map(|m| m.surface.stats())
            .unwrap_or_default()
    }

    pub fn phase(&self) -> Option<Phase> {
        self.mounted.as_ref().map(|m| m.card.phase())
    }

    pub fn node_count(&self) -> usize {
        self.mounted.as_ref().map_or(0, |m| m.card.node_count())
    }

    /// Size fixed at mount.
    pub fn mounted_size(&self) -> Option<Vec2> {
        self.mounted.as_ref().map(|m| m.surface.size())
    }

    pub fn last_rect(&self) -> Option<egui::Rect> {
        self.last_rect
    }

    /// Strip zoom gestures aimed at the card from a frame's raw input.
    ///
    /// egui turns pinch and ctrl-scroll into `zoom_delta` before any widget
    /// runs, so this has to see the input first. Uses the rect the card was
    /// painted at last frame; a no-op while unmounted.
    pub fn suppress_gestures(&mut self, raw: &mut egui::RawInput) {
        let suppressed = self
            .mounted
            .as_ref()
            .is_some_and(|m| m.surface.gesture_suppressed());
        if let (true, Some(area)) = (suppressed, self.last_rect) {
            self.gestures.filter(&mut raw.events, area);
        }
    }

    /// Release the card. The next `show` mounts a fresh one.
    pub fn unmount(&mut self) {
        if let Some(mut m) = self.mounted.take() {
            m.card.teardown(&mut m.surface);
            let left = m.surface.stats();
            if !left.is_empty() {
                error!("Card resources left after teardown: {:?}", left);
            }
        }
        self.router = InputRouter::new();
        self.gestures = GestureFilter::new();
        self.last_rect = None;
        self.selections.borrow_mut().clear();
        self.empty_size = None;
        self.error = None;
    }

    fn try_mount(&mut self, ctx: &egui::Context, size: Vec2) {
        if self.empty_size == Some(size) {
            return;
        }
        let mut surface = EguiSurface::new(ctx, size);
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        match DynamicCard::mount(&mut surface, self.config.clone(), &mut rng, self.font.as_ref()) {
            Ok(Some(card)) => {
                let sink = Rc::clone(&self.selections);
                let card = card.on_select(move |hit| sink.borrow_mut().push(hit.clone()));
                self.empty_size = None;
                self.mounted = Some(Mounted { surface, card });
            }
            Ok(None) => {
                info!("Card mount deferred: region {:?} is empty", size);
                self.empty_size = Some(size);
            }
            Err(e) => {
                error!("Card mount failed: {}", e);
                self.error = Some(e);
            }
        }
    }

    /// Allocate the card, run one frame and paint.
    ///
    /// `size` is used until the card mounts; afterwards the mount size wins.
    pub fn show(&mut self, ui: &mut egui::Ui, size: Vec2) -> CardOutput {
        if self.mounted.is_none() && self.error.is_none() {
            self.try_mount(ui.ctx(), size);
        }
        let size = self.mounted_size().unwrap_or(size);
        let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click_and_drag());

        if let Some(err) = &self.error {
            ui.painter_at(rect).text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                err.to_string(),
                egui::FontId::proportional(12.0),
                ui.visuals().error_fg_color,
            );
        }

        let Some(m) = self.mounted.as_mut() else {
            return CardOutput {
                response,
                selected: Vec::new(),
            };
        };
        self.last_rect = Some(rect);

        let events = ui.input(|i| i.events.clone());
        for event in self.router.translate(&events, rect, m.surface.listeners()) {
            m.card.handle_input(&event, rect);
        }

        if m.surface.frame_pending() {
            m.card.frame();
            ui.ctx().request_repaint();
        }

        ui.painter_at(rect).extend(m.card.paint(&m.surface, rect));

        let selected = std::mem::take(&mut *self.selections.borrow_mut());
        CardOutput { response, selected }
    }
}

impl Drop for CardWidget {
    fn drop(&mut self) {
        self.unmount();
    }
}
