//! Error types for the dynamic card.
//!
//! Every failure in the widget is local: a bad configuration refuses to mount,
//! a failed label only costs that node its text.

use std::fmt;

/// Failure while rasterizing a single label.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelError {
    /// No font was supplied to draw with.
    NoFont,
    /// Font bytes could not be parsed.
    InvalidFont(String),
    /// The raster would exceed the texture size limit.
    TooWide { width: u32, limit: u32 },
}

impl fmt::Display for LabelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelError::NoFont => write!(f, "no font available for label text"),
            LabelError::InvalidFont(msg) => write!(f, "invalid font data: {}", msg),
            LabelError::TooWide { width, limit } => {
                write!(f, "label raster {}px wide exceeds {}px limit", width, limit)
            }
        }
    }
}

impl std::error::Error for LabelError {}

/// Error raised by the card or its host surface.
#[derive(Debug, Clone, PartialEq)]
pub enum CardError {
    /// A configuration value is out of range.
    InvalidConfig { field: &'static str, reason: String },
    /// The mount region has no area.
    EmptyRegion { width: f32, height: f32 },
    /// A label could not be rasterized.
    Label(LabelError),
    /// The host refused a texture upload.
    Texture(String),
}

impl fmt::Display for CardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardError::InvalidConfig { field, reason } => {
                write!(f, "[config] {}: {}", field, reason)
            }
            CardError::EmptyRegion { width, height } => {
                write!(f, "[mount] region is {}x{}", width, height)
            }
            CardError::Label(e) => write!(f, "[label] {}", e),
            CardError::Texture(msg) => write!(f, "[texture] {}", msg),
        }
    }
}

impl std::error::Error for CardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CardError::Label(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LabelError> for CardError {
    fn from(e: LabelError) -> Self {
        CardError::Label(e)
    }
}
