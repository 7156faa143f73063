//! Spin model: idle auto-rotation, drag, and momentum settling to a floor.
//!
//! The state is a plain value; every transition takes a state and returns
//! the next one. The card commits the orientation to the scene once per
//! frame.
//!
//! Phases:
//!   Idle:     spinning at exactly `base_speed` around the last drag axis
//!   Dragging: orientation follows the pointer, integration suspended
//!   Settling: speed decays (×decay) or grows (×growth) toward `base_speed`

use glam::{Quat, Vec2, Vec3};

use crate::config::MotionConfig;

/// Input device driving a drag; selects the rotation factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
}

impl PointerKind {
    pub fn rotation_factor(self, motion: &MotionConfig) -> f32 {
        match self {
            PointerKind::Mouse => motion.mouse_factor,
            PointerKind::Touch => motion.touch_factor,
        }
    }
}

/// Pointer bookkeeping between press and release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub kind: PointerKind,
    pub last_pos: Vec2,
    /// Pixel delta of the most recent move
    pub last_delta: Vec2,
}

/// Observable phase of the spin model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Dragging,
    Settling,
}

/// Orientation plus angular velocity of the sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionState {
    pub orientation: Quat,
    /// Axis × radians per frame
    pub velocity: Vec3,
    /// Unit axis idle rotation returns to
    pub axis: Vec3,
    pub drag: Option<DragSession>,
}

impl InteractionState {
    /// Identity orientation spinning about +Y at the floor speed.
    pub fn new(motion: &MotionConfig) -> Self {
        Self {
            orientation: Quat::IDENTITY,
            velocity: Vec3::Y * motion.base_speed,
            axis: Vec3::Y,
            drag: None,
        }
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn phase(&self, motion: &MotionConfig) -> Phase {
        if self.is_dragging() {
            Phase::Dragging
        } else if at_floor(self.speed(), motion.base_speed) {
            Phase::Idle
        } else {
            Phase::Settling
        }
    }
}

/// Relative tolerance under which a speed counts as the floor.
const FLOOR_TOLERANCE: f32 = 1e-5;

fn at_floor(speed: f32, base: f32) -> bool {
    (speed - base).abs() <= base * FLOOR_TOLERANCE
}

/// Drag axis for a screen delta: vertical motion tilts about X, horizontal
/// motion turns about Y.
fn drag_axis(delta: Vec2) -> Option<Vec3> {
    Vec3::new(delta.y, delta.x, 0.0).try_normalize()
}

/// Incremental world-space rotation for a pixel delta: Y turn, then X tilt.
pub fn drag_rotation(delta: Vec2, factor: f32) -> Quat {
    let q_y = Quat::from_rotation_y(delta.x * factor);
    let q_x = Quat::from_rotation_x(delta.y * factor);
    q_y * q_x
}

/// Pointer pressed: start a drag session and suspend auto-rotation.
pub fn begin_drag(state: InteractionState, pos: Vec2, kind: PointerKind) -> InteractionState {
    log::debug!("Drag start ({:?}) at {:?}", kind, pos);
    InteractionState {
        drag: Some(DragSession {
            kind,
            last_pos: pos,
            last_delta: Vec2::ZERO,
        }),
        ..state
    }
}

/// Pointer moved. Rotates the sphere by the delta and records the
/// instantaneous angular velocity. No-op without an active drag.
pub fn apply_drag(state: InteractionState, pos: Vec2, motion: &MotionConfig) -> InteractionState {
    let Some(session) = state.drag else {
        return state;
    };
    let delta = pos - session.last_pos;
    let factor = session.kind.rotation_factor(motion);

    let orientation = (drag_rotation(delta, factor) * state.orientation).normalize();
    let velocity = match drag_axis(delta) {
        Some(axis) => axis * delta.length() * factor,
        None => state.velocity,
    };

    InteractionState {
        orientation,
        velocity,
        drag: Some(DragSession {
            last_pos: pos,
            last_delta: delta,
            ..session
        }),
        ..state
    }
}

/// Pointer released. A non-zero final delta becomes the new idle axis; a
/// release slower than the floor snaps straight to the floor speed.
pub fn end_drag(state: InteractionState, motion: &MotionConfig) -> InteractionState {
    let Some(session) = state.drag else {
        return state;
    };
    let mut next = InteractionState { drag: None, ..state };

    if let Some(axis) = drag_axis(session.last_delta) {
        next.axis = axis;
        if next.speed() <= motion.base_speed {
            next.velocity = axis * motion.base_speed;
        }
        log::debug!(
            "Drag end: axis {:?}, speed {:.5} (floor {})",
            axis,
            next.speed(),
            motion.base_speed
        );
    }
    next
}

/// One frame of free rotation. Integrates the velocity (world space) and
/// moves the speed one step toward the floor. Suspended while dragging.
pub fn step(state: InteractionState, motion: &MotionConfig) -> InteractionState {
    if state.is_dragging() {
        return state;
    }
    let base = motion.base_speed;
    let orientation = (Quat::from_scaled_axis(state.velocity) * state.orientation).normalize();
    let speed = state.velocity.length();
    let floor = state.axis * base;

    let velocity = if speed <= f32::EPSILON || at_floor(speed, base) {
        floor
    } else if speed > base {
        let v = state.velocity * motion.decay;
        if v.length() < base {
            floor
        } else {
            v
        }
    } else {
        let v = state.velocity * motion.growth;
        if v.length() > base {
            floor
        } else {
            v
        }
    };
    log::trace!("Spin speed {:.6}", velocity.length());

    InteractionState {
        orientation,
        velocity,
        ..state
    }
}
