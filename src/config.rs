//! Card configuration.
//!
//! `CardConfig::default()` reproduces the reference look and feel; the
//! `with_*` builders tweak individual knobs.

use crate::error::CardError;
use crate::label::LabelStyle;

/// Camera placement and projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
    /// Distance from the origin along +Z
    pub distance: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_deg: 75.0,
            near: 0.1,
            far: 1000.0,
            distance: 14.0,
        }
    }
}

/// Spin model: auto-rotation floor, momentum decay and drag sensitivity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionConfig {
    /// Idle angular speed in radians per frame
    pub base_speed: f32,
    /// Per-frame multiplier while faster than `base_speed`
    pub decay: f32,
    /// Per-frame multiplier while slower than `base_speed`
    pub growth: f32,
    /// Radians per pixel of mouse drag
    pub mouse_factor: f32,
    /// Radians per pixel of touch drag
    pub touch_factor: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            base_speed: 0.001,
            decay: 0.95,
            growth: 1.05,
            mouse_factor: 0.01,
            touch_factor: 0.004,
        }
    }
}

/// Full configuration of a dynamic card.
#[derive(Debug, Clone, PartialEq)]
pub struct CardConfig {
    /// Number of nodes placed on the sphere
    pub node_count: usize,
    /// Radius of the shell the markers sit on
    pub layout_radius: f32,
    /// Radius of the translucent central sphere
    pub sphere_radius: f32,
    /// Peak alpha of the central sphere overlay
    pub sphere_opacity: f32,
    /// Radius of a marker
    pub marker_radius: f32,
    /// Vertical offset of a label above its marker
    pub label_lift: f32,
    /// Marquee advance per frame, in texture cycles
    pub text_speed: f32,
    pub camera: CameraConfig,
    pub motion: MotionConfig,
    pub label: LabelStyle,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            node_count: 88,
            layout_radius: 5.0,
            sphere_radius: 4.85,
            sphere_opacity: 0.8,
            marker_radius: 0.15,
            label_lift: 0.3,
            text_speed: 0.002,
            camera: CameraConfig::default(),
            motion: MotionConfig::default(),
            label: LabelStyle::default(),
        }
    }
}

impl CardConfig {
    pub fn with_node_count(mut self, n: usize) -> Self {
        self.node_count = n;
        self
    }

    pub fn with_motion(mut self, motion: MotionConfig) -> Self {
        self.motion = motion;
        self
    }

    pub fn with_camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_label_style(mut self, style: LabelStyle) -> Self {
        self.label = style;
        self
    }

    /// Check every value is usable before anything is allocated.
    pub fn validate(&self) -> Result<(), CardError> {
        positive("layout_radius", self.layout_radius)?;
        positive("sphere_radius", self.sphere_radius)?;
        positive("marker_radius", self.marker_radius)?;
        positive("camera.fov_deg", self.camera.fov_deg)?;
        positive("camera.near", self.camera.near)?;
        positive("camera.distance", self.camera.distance)?;
        positive("motion.base_speed", self.motion.base_speed)?;
        positive("motion.mouse_factor", self.motion.mouse_factor)?;
        positive("motion.touch_factor", self.motion.touch_factor)?;
        positive("label.font_size", self.label.font_size)?;
        finite("label_lift", self.label_lift)?;
        finite("text_speed", self.text_speed)?;

        if !(0.0..=1.0).contains(&self.sphere_opacity) {
            return Err(invalid("sphere_opacity", "must lie in [0, 1]"));
        }
        if self.camera.fov_deg >= 180.0 {
            return Err(invalid("camera.fov_deg", "must be below 180"));
        }
        if self.camera.far <= self.camera.near {
            return Err(invalid("camera.far", "must exceed camera.near"));
        }
        if !(self.motion.decay > 0.0 && self.motion.decay < 1.0) {
            return Err(invalid("motion.decay", "must lie in (0, 1)"));
        }
        if !(self.motion.growth > 1.0 && self.motion.growth.is_finite()) {
            return Err(invalid("motion.growth", "must be finite and above 1"));
        }
        if self.label.max_width == 0 {
            return Err(invalid("label.max_width", "must be non-zero"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> CardError {
    CardError::InvalidConfig {
        field,
        reason: reason.to_string(),
    }
}

fn finite(field: &'static str, v: f32) -> Result<(), CardError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, "must be finite"))
    }
}

fn positive(field: &'static str, v: f32) -> Result<(), CardError> {
    finite(field, v)?;
    if v > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be positive"))
    }
}
