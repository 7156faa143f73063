//! Dynamic card: an interactive sphere of labeled nodes for egui.
//!
//! - `layout`:      golden-spiral node placement and random node identity
//! - `label`:       text rasterization and marquee scrolling
//! - `interaction`: spin model (idle rotation, drag, momentum)
//! - `scene`:       camera, projection, hit-testing and paint shapes
//! - `surface`:     host boundary and ordered teardown
//! - `input`:       egui event translation and listener scoping
//! - `card`:        `DynamicCard`, tying the above together
//! - `host`:        `EguiSurface` and the `CardWidget` wrapper

pub mod config;
pub mod error;

pub mod layout;
pub mod label;
pub mod interaction;
pub mod scene;

pub mod surface;
pub mod input;
pub mod card;
pub mod host;

pub use card::{DynamicCard, NodeHit, SelectHandler};
pub use config::{CameraConfig, CardConfig, MotionConfig};
pub use error::{CardError, LabelError};
pub use host::{CardOutput, CardWidget, EguiSurface};
pub use label::{GlyphFont, LabelFont, LabelStyle};
pub use surface::{Surface, SurfaceStats};
