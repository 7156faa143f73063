//! Host boundary of the card.
//!
//! A `Surface` owns everything the card borrows from its host: GPU textures,
//! input listener registrations, the per-frame callback and gesture
//! suppression. The card records each acquisition on a `Teardown` stack so a
//! single call releases everything.

use std::collections::HashMap;

use egui::{ColorImage, TextureId, Vec2};

use crate::error::CardError;
use crate::input::InputKind;
use crate::label::WrapMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureKey(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerKey(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameKey(pub u64);

/// Where a listener captures events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerScope {
    /// Events positioned inside the widget rect
    Widget,
    /// Events anywhere in the window
    Window,
}

/// Live resource counts held by a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceStats {
    pub textures: usize,
    pub listeners: usize,
    pub frames: usize,
    pub gesture_suppressed: bool,
}

impl SurfaceStats {
    pub fn is_empty(&self) -> bool {
        self.textures == 0 && self.listeners == 0 && self.frames == 0 && !self.gesture_suppressed
    }
}

/// Resources and services the host provides to a mounted card.
pub trait Surface {
    /// Mount region size in points.
    fn size(&self) -> Vec2;

    fn pixels_per_point(&self) -> f32;

    fn upload_texture(
        &mut self,
        name: &str,
        image: ColorImage,
        wrap: WrapMode,
    ) -> Result<TextureKey, CardError>;

    fn free_texture(&mut self, key: TextureKey);

    /// Paintable id of an uploaded texture.
    fn texture_id(&self, key: TextureKey) -> Option<TextureId>;

    fn listen(&mut self, scope: ListenerScope, kind: InputKind) -> ListenerKey;

    fn unlisten(&mut self, key: ListenerKey);

    /// Schedule the perpetual frame callback.
    fn request_frame(&mut self) -> FrameKey;

    /// Stop re-scheduling the frame callback.
    fn cancel_frame(&mut self, key: FrameKey);

    fn set_gesture_suppression(&mut self, suppress: bool);

    fn stats(&self) -> SurfaceStats;
}

// ── Listener registry ──

/// Listener bookkeeping shared by surface implementations.
#[derive(Debug, Default, Clone)]
pub struct ListenerRegistry {
    next: u64,
    entries: HashMap<ListenerKey, (ListenerScope, InputKind)>,
}

impl ListenerRegistry {
    pub fn add(&mut self, scope: ListenerScope, kind: InputKind) -> ListenerKey {
        self.next += 1;
        let key = ListenerKey(self.next);
        self.entries.insert(key, (scope, kind));
        key
    }

    /// Returns false when `key` was not registered.
    pub fn remove(&mut self, key: ListenerKey) -> bool {
        self.entries.remove(&key).is_some()
    }

    /// Whether an event of `kind` arriving at `scope` reaches a listener.
    ///
    /// Events inside the widget reach listeners of either scope; events
    /// outside it reach window listeners only.
    pub fn is_listening(&self, scope: ListenerScope, kind: InputKind) -> bool {
        self.entries.values().any(|&(s, k)| {
            k == kind
                && match scope {
                    ListenerScope::Widget => true,
                    ListenerScope::Window => s == ListenerScope::Window,
                }
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Teardown ──

/// One recorded acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    Frame(FrameKey),
    Listener(ListenerKey),
    GestureSuppression,
    Texture(TextureKey),
}

impl Release {
    /// Teardown stage: frame callbacks stop before listeners go, and
    /// listeners go before GPU memory is freed.
    fn stage(&self) -> u8 {
        match self {
            Release::Frame(_) => 0,
            Release::Listener(_) | Release::GestureSuppression => 1,
            Release::Texture(_) => 2,
        }
    }

    fn apply(self, surface: &mut dyn Surface) {
        match self {
            Release::Frame(key) => surface.cancel_frame(key),
            Release::Listener(key) => surface.unlisten(key),
            Release::GestureSuppression => surface.set_gesture_suppression(false),
            Release::Texture(key) => surface.free_texture(key),
        }
    }
}

/// Disposer stack for everything a card acquired.
#[derive(Debug, Default)]
pub struct Teardown {
    stack: Vec<Release>,
    done: bool,
}

impl Teardown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, release: Release) {
        self.stack.push(release);
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Release order: reverse acquisition within each stage.
    pub fn plan(&self) -> Vec<Release> {
        let mut order: Vec<Release> = self.stack.iter().rev().copied().collect();
        order.sort_by_key(Release::stage);
        order
    }

    /// Release everything. Returns how many releases ran; zero on repeat calls.
    pub fn run(&mut self, surface: &mut dyn Surface) -> usize {
        if self.done {
            return 0;
        }
        self.done = true;
        let order = self.plan();
        self.stack.clear();
        let count = order.len();
        for release in order {
            release.apply(surface);
        }
        count
    }
}
