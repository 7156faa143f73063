//! Input translation: raw egui events to card events.
//!
//! Mouse press, click and touch events only reach the card when they land
//! inside its rect. Mouse move and release are window-scoped so a drag keeps
//! tracking after the pointer leaves the widget. A touch sequence that starts
//! inside the widget keeps reporting until it ends, like a DOM touch target.
//!
//! Platforms that synthesize pointer events from touches would otherwise
//! double-drive the drag, so pointer events are dropped while a touch is down.
//!
//! `GestureFilter` works one step earlier, on a frame's raw input: egui folds
//! zoom and multi-touch into its input state before any widget runs.

use egui::{Event, PointerButton, Pos2, Rect, TouchDeviceId, TouchId, TouchPhase};

use crate::interaction::PointerKind;
use crate::surface::{ListenerRegistry, ListenerScope};

/// Event types a card can listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    Down,
    Move,
    Up,
    Click,
    TouchStart,
    TouchMove,
    TouchEnd,
}

impl InputKind {
    pub const ALL: [InputKind; 7] = [
        InputKind::Down,
        InputKind::Move,
        InputKind::Up,
        InputKind::Click,
        InputKind::TouchStart,
        InputKind::TouchMove,
        InputKind::TouchEnd,
    ];

    pub fn pointer_kind(self) -> PointerKind {
        match self {
            InputKind::TouchStart | InputKind::TouchMove | InputKind::TouchEnd => PointerKind::Touch,
            _ => PointerKind::Mouse,
        }
    }

    /// Scope a listener must be registered at to receive this kind.
    pub fn scope(self) -> ListenerScope {
        match self {
            InputKind::Move | InputKind::Up => ListenerScope::Window,
            _ => ListenerScope::Widget,
        }
    }
}

/// A translated input event in screen points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputEvent {
    pub kind: InputKind,
    pub pos: Pos2,
}

impl InputEvent {
    pub fn new(kind: InputKind, pos: Pos2) -> Self {
        Self { kind, pos }
    }

    pub fn pointer_kind(&self) -> PointerKind {
        self.kind.pointer_kind()
    }
}

/// Stateful translator from egui events to `InputEvent`s.
#[derive(Debug, Default, Clone)]
pub struct InputRouter {
    /// Touch currently driving the card
    touch: Option<TouchId>,
    /// Primary button went down inside the widget
    press_inside: bool,
    /// Last known pointer position, for releases egui reports without motion
    last_pointer: Option<Pos2>,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn touch_active(&self) -> bool {
        self.touch.is_some()
    }

    /// Translate one frame's events, keeping only those a listener wants.
    pub fn translate(
        &mut self,
        events: &[Event],
        rect: Rect,
        listeners: &ListenerRegistry,
    ) -> Vec<InputEvent> {
        let mut out = Vec::new();
        for event in events {
            self.translate_one(event, rect, listeners, &mut out);
        }
        out
    }

    fn translate_one(
        &mut self,
        event: &Event,
        rect: Rect,
        listeners: &ListenerRegistry,
        out: &mut Vec<InputEvent>,
    ) {
        let emit = |kind: InputKind, pos: Pos2, out: &mut Vec<InputEvent>| {
            if listeners.is_listening(kind.scope(), kind) {
                out.push(InputEvent::new(kind, pos));
            }
        };

        match event {
            Event::Touch { id, phase, pos, .. } => match phase {
                TouchPhase::Start => {
                    if self.touch.is_none() && rect.contains(*pos) {
                        self.touch = Some(*id);
                        emit(InputKind::TouchStart, *pos, out);
                    }
                }
                TouchPhase::Move => {
                    if self.touch == Some(*id) {
                        emit(InputKind::TouchMove, *pos, out);
                    }
                }
                TouchPhase::End | TouchPhase::Cancel => {
                    if self.touch == Some(*id) {
                        self.touch = None;
                        emit(InputKind::TouchEnd, *pos, out);
                    }
                }
            },
            _ if self.touch.is_some() => {}
            Event::PointerMoved(pos) => {
                self.last_pointer = Some(*pos);
                emit(InputKind::Move, *pos, out);
            }
            Event::PointerButton {
                pos,
                button: PointerButton::Primary,
                pressed,
                ..
            } => {
                self.last_pointer = Some(*pos);
                if *pressed {
                    self.press_inside = rect.contains(*pos);
                    if self.press_inside {
                        emit(InputKind::Down, *pos, out);
                    }
                } else {
                    emit(InputKind::Up, *pos, out);
                    if std::mem::take(&mut self.press_inside) && rect.contains(*pos) {
                        emit(InputKind::Click, *pos, out);
                    }
                }
            }
            Event::PointerGone => {
                // Window lost the pointer mid-drag: treat as a release
                if std::mem::take(&mut self.press_inside) {
                    if let Some(pos) = self.last_pointer {
                        emit(InputKind::Up, pos, out);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Removes zoom gestures aimed at the card from raw input.
///
/// Pinch and ctrl-scroll zoom are dropped while the pointer is over the card
/// or a touch holds it. Touches after the first one to land on the card never
/// reach egui, so no multi-touch zoom or rotation forms there.
#[derive(Debug, Default, Clone)]
pub struct GestureFilter {
    /// First touch that started inside the card
    primary: Option<(TouchDeviceId, TouchId)>,
    /// Touches started while `primary` was down
    blocked: Vec<(TouchDeviceId, TouchId)>,
    pointer: Option<Pos2>,
}

impl GestureFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holding_touch(&self) -> bool {
        self.primary.is_some()
    }

    /// Filter one frame's raw events against the card rect.
    pub fn filter(&mut self, events: &mut Vec<Event>, area: Rect) {
        events.retain(|event| self.keep(event, area));
    }

    fn over(&self, area: Rect) -> bool {
        self.primary.is_some() || self.pointer.is_some_and(|p| area.contains(p))
    }

    fn keep(&mut self, event: &Event, area: Rect) -> bool {
        match event {
            Event::PointerMoved(pos) => {
                self.pointer = Some(*pos);
                true
            }
            Event::PointerGone => {
                self.pointer = None;
                true
            }
            Event::Zoom(_) => !self.over(area),
            Event::MouseWheel { modifiers, .. }
                if modifiers.ctrl || modifiers.command || modifiers.mac_cmd =>
            {
                !self.over(area)
            }
            Event::Touch {
                device_id,
                id,
                phase,
                pos,
                ..
            } => {
                let key = (*device_id, *id);
                match phase {
                    TouchPhase::Start => {
                        if self.primary.is_some() {
                            self.blocked.push(key);
                            false
                        } else {
                            if area.contains(*pos) {
                                self.primary = Some(key);
                            }
                            true
                        }
                    }
                    TouchPhase::Move => !self.blocked.contains(&key),
                    TouchPhase::End | TouchPhase::Cancel => {
                        if self.primary == Some(key) {
                            self.primary = None;
                            true
                        } else if let Some(i) = self.blocked.iter().position(|k| *k == key) {
                            self.blocked.swap_remove(i);
                            false
                        } else {
                            true
                        }
                    }
                }
            }
            _ => true,
        }
    }
}
