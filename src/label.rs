//! Label texture generation.
//!
//! Text is rasterized into an RGBA image sized for a fixed display window.
//! Text wider than the window gets a padded raster that scrolls (marquee)
//! through a repeat-wrapped texture; text that fits is centered and clamped.

use ab_glyph::{point, Font, FontArc, FontRef, FontVec, GlyphId, PxScale, ScaleFont};
use egui::Color32;
use image::{Rgba, RgbaImage};

use crate::error::LabelError;

/// Horizontal padding appended to a scrolling raster, in pixels.
pub const MARQUEE_PADDING: u32 = 60;
/// Widest raster a label may produce.
pub const MAX_TEXTURE_WIDTH: u32 = 8192;
/// Line height relative to font size.
pub const LINE_HEIGHT: f32 = 1.2;

/// Styling of a label raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelStyle {
    /// Font size in pixels
    pub font_size: f32,
    pub text_color: Color32,
    pub background: Color32,
    /// Width of the visible window in pixels
    pub max_width: u32,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            font_size: 24.0,
            text_color: Color32::WHITE,
            background: Color32::TRANSPARENT,
            max_width: 160,
        }
    }
}

impl LabelStyle {
    /// Same style in device pixels, for crisp text on high-DPI hosts.
    pub fn scaled(self, pixels_per_point: f32) -> Self {
        if !(pixels_per_point.is_finite() && pixels_per_point > 0.0) {
            return self;
        }
        Self {
            font_size: self.font_size * pixels_per_point,
            max_width: ((self.max_width as f32 * pixels_per_point).round() as u32).max(1),
            ..self
        }
    }
}

/// Horizontal texture addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    Clamp,
    Repeat,
}

/// Text shaping and drawing used by the label generator.
pub trait LabelFont: Send + Sync {
    /// Advance width of `text` at `px` font size.
    fn measure(&self, text: &str, px: f32) -> f32;

    /// Draw `text` with its left edge at `x` and vertically centered on `mid_y`.
    fn draw(&self, canvas: &mut RgbaImage, text: &str, px: f32, x: f32, mid_y: f32, color: Color32);
}

/// A rasterized label ready for upload.
#[derive(Debug, Clone)]
pub struct LabelRaster {
    pub image: RgbaImage,
    /// True when the text overflows `max_width` and must scroll
    pub need_marquee: bool,
    /// Sprite height per unit width: text height / max width
    pub hw_ratio: f32,
    pub wrap: WrapMode,
    /// Fraction of the raster visible at once
    pub repeat_x: f32,
}

impl LabelRaster {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Transparent stand-in for a label that failed to rasterize.
    pub fn placeholder(style: &LabelStyle) -> Self {
        Self {
            image: RgbaImage::new(1, 1),
            need_marquee: false,
            hw_ratio: text_height(style) / style.max_width.max(1) as f32,
            wrap: WrapMode::Clamp,
            repeat_x: 1.0,
        }
    }

    pub fn to_color_image(&self) -> egui::ColorImage {
        let size = [self.image.width() as usize, self.image.height() as usize];
        egui::ColorImage::from_rgba_unmultiplied(size, self.image.as_raw())
    }
}

fn text_height(style: &LabelStyle) -> f32 {
    style.font_size * LINE_HEIGHT
}

/// Rasterize `text` into a label texture.
pub fn create_label(
    text: &str,
    style: &LabelStyle,
    font: &dyn LabelFont,
) -> Result<LabelRaster, LabelError> {
    let text_width = font.measure(text, style.font_size).ceil().max(0.0) as u32;
    let height_f = text_height(style);
    let need_marquee = text_width > style.max_width;

    let canvas_width = if need_marquee {
        text_width + MARQUEE_PADDING
    } else {
        style.max_width
    };
    if canvas_width > MAX_TEXTURE_WIDTH {
        return Err(LabelError::TooWide {
            width: canvas_width,
            limit: MAX_TEXTURE_WIDTH,
        });
    }
    let canvas_height = (height_f as u32).max(1);

    let bg = style.background.to_srgba_unmultiplied();
    let mut image = RgbaImage::from_pixel(canvas_width, canvas_height, Rgba(bg));
    let mid_y = canvas_height as f32 / 2.0;

    if need_marquee {
        font.draw(&mut image, text, style.font_size, 0.0, mid_y, style.text_color);
    } else {
        let measured = font.measure(text, style.font_size);
        let x = style.max_width as f32 / 2.0 - measured / 2.0;
        font.draw(&mut image, text, style.font_size, x, mid_y, style.text_color);
    }

    Ok(LabelRaster {
        image,
        need_marquee,
        hw_ratio: height_f / style.max_width as f32,
        wrap: if need_marquee { WrapMode::Repeat } else { WrapMode::Clamp },
        repeat_x: if need_marquee {
            style.max_width as f32 / canvas_width as f32
        } else {
            1.0
        },
    })
}

/// Rasterize every label, in parallel when the `parallel` feature is on.
///
/// Results keep the input order.
pub fn create_labels(
    texts: &[String],
    style: &LabelStyle,
    font: &dyn LabelFont,
) -> Vec<Result<LabelRaster, LabelError>> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        texts
            .par_iter()
            .map(|t| create_label(t, style, font))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        texts.iter().map(|t| create_label(t, style, font)).collect()
    }
}

/// Horizontal scroll state of one label texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marquee {
    /// Current texture offset, in cycles
    pub offset: f32,
    /// Visible fraction of the texture
    pub repeat: f32,
    pub scrolling: bool,
}

impl Marquee {
    pub fn for_raster(raster: &LabelRaster) -> Self {
        Self {
            offset: 0.0,
            repeat: raster.repeat_x,
            scrolling: raster.need_marquee,
        }
    }

    /// Advance one frame. Non-scrolling labels are left untouched.
    pub fn advance(&mut self, speed: f32) {
        if !self.scrolling {
            return;
        }
        self.offset += speed;
        if self.offset > 1.0 {
            self.offset = 0.0;
        }
    }

    /// Horizontal texture coordinates of the visible window.
    pub fn u_range(&self) -> (f32, f32) {
        (self.offset, self.offset + self.repeat)
    }
}

// ── ab_glyph backed font chain ──

/// Font chain rasterized with `ab_glyph`; each char uses the first font that
/// has a glyph for it.
#[derive(Clone)]
pub struct GlyphFont {
    fonts: Vec<FontArc>,
}

impl GlyphFont {
    pub fn new(fonts: Vec<FontArc>) -> Result<Self, LabelError> {
        if fonts.is_empty() {
            return Err(LabelError::NoFont);
        }
        Ok(Self { fonts })
    }

    /// Parse owned font bytes (e.g. a system font file).
    pub fn from_vec(data: Vec<u8>, index: u32) -> Result<FontArc, LabelError> {
        FontVec::try_from_vec_and_index(data, index)
            .map(FontArc::new)
            .map_err(|e| LabelError::InvalidFont(e.to_string()))
    }

    /// Build the chain from an egui font family, so labels match the UI.
    pub fn from_definitions(
        defs: &egui::FontDefinitions,
        family: &egui::FontFamily,
    ) -> Result<Self, LabelError> {
        let names = defs.families.get(family).ok_or(LabelError::NoFont)?;
        let mut fonts = Vec::with_capacity(names.len());
        for name in names {
            let Some(data) = defs.font_data.get(name) else {
                continue;
            };
            let parsed = match &data.font {
                std::borrow::Cow::Borrowed(bytes) => {
                    FontRef::try_from_slice_and_index(*bytes, data.index)
                        .map(FontArc::new)
                        .map_err(|e| LabelError::InvalidFont(e.to_string()))
                }
                std::borrow::Cow::Owned(bytes) => Self::from_vec(bytes.clone(), data.index),
            };
            match parsed {
                Ok(f) => fonts.push(f),
                Err(e) => log::warn!("Skipping font {:?}: {}", name, e),
            }
        }
        Self::new(fonts)
    }

    /// egui's bundled proportional font chain.
    pub fn egui_default() -> Result<Self, LabelError> {
        Self::from_definitions(
            &egui::FontDefinitions::default(),
            &egui::FontFamily::Proportional,
        )
    }

    /// Index of the font drawing `ch`, and its glyph there.
    fn resolve(&self, ch: char) -> (usize, GlyphId) {
        for (slot, font) in self.fonts.iter().enumerate() {
            let id = font.glyph_id(ch);
            if id.0 != 0 {
                return (slot, id);
            }
        }
        (0, self.fonts[0].glyph_id(ch))
    }
}

/// CSS-style pixel size (em) to ab_glyph's height-based scale.
fn em_scale(font: &FontArc, px: f32) -> PxScale {
    let upem = font.units_per_em().unwrap_or(1000.0);
    PxScale::from(px * font.height_unscaled() / upem)
}

impl LabelFont for GlyphFont {
    fn measure(&self, text: &str, px: f32) -> f32 {
        let mut width = 0.0;
        let mut prev: Option<(usize, GlyphId)> = None;
        for ch in text.chars() {
            let (slot, id) = self.resolve(ch);
            let font = &self.fonts[slot];
            let scaled = font.as_scaled(em_scale(font, px));
            if let Some((prev_slot, prev_id)) = prev {
                if prev_slot == slot {
                    width += scaled.kern(prev_id, id);
                }
            }
            width += scaled.h_advance(id);
            prev = Some((slot, id));
        }
        width
    }

    fn draw(&self, canvas: &mut RgbaImage, text: &str, px: f32, x: f32, mid_y: f32, color: Color32) {
        let (cw, ch_px) = (canvas.width() as i32, canvas.height() as i32);
        let mut cursor = x;
        let mut prev: Option<(usize, GlyphId)> = None;
        for ch in text.chars() {
            let (slot, id) = self.resolve(ch);
            let font = &self.fonts[slot];
            let scale = em_scale(font, px);
            let scaled = font.as_scaled(scale);
            if let Some((prev_slot, prev_id)) = prev {
                if prev_slot == slot {
                    cursor += scaled.kern(prev_id, id);
                }
            }
            // Center the ascent/descent box on mid_y
            let baseline = mid_y + (scaled.ascent() + scaled.descent()) / 2.0;
            let glyph = id.with_scale_and_position(scale, point(cursor, baseline));
            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, coverage| {
                    let px_x = bounds.min.x as i32 + gx as i32;
                    let px_y = bounds.min.y as i32 + gy as i32;
                    if px_x >= 0 && px_x < cw && px_y >= 0 && px_y < ch_px {
                        let dst = canvas.get_pixel_mut(px_x as u32, px_y as u32);
                        blend_over(dst, color, coverage);
                    }
                });
            }
            cursor += scaled.h_advance(id);
            prev = Some((slot, id));
        }
    }
}

/// Source-over blend of `color` at `coverage` onto an unmultiplied pixel.
pub(crate) fn blend_over(dst: &mut Rgba<u8>, color: Color32, coverage: f32) {
    let [sr, sg, sb, sa] = color.to_srgba_unmultiplied();
    let src_a = (sa as f32 / 255.0) * coverage.clamp(0.0, 1.0);
    if src_a <= 0.0 {
        return;
    }
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        return;
    }
    let mix = |s: u8, d: u8| -> u8 {
        let v = (s as f32 * src_a + d as f32 * dst_a * (1.0 - src_a)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };
    *dst = Rgba([
        mix(sr, dst[0]),
        mix(sg, dst[1]),
        mix(sb, dst[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ]);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Every char advances 12px at any size and paints a solid cell.
    pub(crate) struct FixedFont;

    impl LabelFont for FixedFont {
        fn measure(&self, text: &str, _px: f32) -> f32 {
            text.chars().count() as f32 * 12.0
        }

        fn draw(&self, canvas: &mut RgbaImage, text: &str, _px: f32, x: f32, mid_y: f32, color: Color32) {
            let w = self.measure(text, 0.0);
            let y0 = (mid_y - 4.0).max(0.0) as u32;
            let y1 = ((mid_y + 4.0) as u32).min(canvas.height());
            let x0 = x.max(0.0) as u32;
            let x1 = ((x + w) as u32).min(canvas.width());
            for py in y0..y1 {
                for px in x0..x1 {
                    blend_over(canvas.get_pixel_mut(px, py), color, 1.0);
                }
            }
        }
    }

    #[test]
    fn test_scaled_style_keeps_ratio() {
        let style = LabelStyle::default();
        let hi = style.scaled(2.0);
        assert_eq!(hi.max_width, 320);
        assert_eq!(hi.font_size, 48.0);
        let a = create_label("PM", &style, &FixedFont).unwrap();
        let b = create_label("PM", &hi, &FixedFont).unwrap();
        assert!((a.hw_ratio - b.hw_ratio).abs() < 1e-6);
        assert_eq!(style.scaled(0.0), style);
    }

    fn inked_columns(raster: &LabelRaster) -> (u32, u32) {
        let mut min = u32::MAX;
        let mut max = 0;
        for (x, _, p) in raster.image.enumerate_pixels() {
            if p[3] > 0 {
                min = min.min(x);
                max = max.max(x);
            }
        }
        (min, max)
    }

    #[test]
    fn test_short_text_fits_window() {
        let style = LabelStyle::default();
        let raster = create_label("PM", &style, &FixedFont).unwrap();
        assert!(!raster.need_marquee);
        assert_eq!(raster.width(), 160);
        assert_eq!(raster.height(), 28);
        assert_eq!(raster.wrap, WrapMode::Clamp);
        assert_eq!(raster.repeat_x, 1.0);
        assert!((raster.hw_ratio - 28.8 / 160.0).abs() < 1e-6);
        // 24px of text centered in 160px
        assert_eq!(inked_columns(&raster), (68, 91));
    }

    #[test]
    fn test_long_text_scrolls() {
        let style = LabelStyle::default();
        let text = "Visionary Product Officer team";
        assert_eq!(text.chars().count(), 30);
        let raster = create_label(text, &style, &FixedFont).unwrap();
        assert!(raster.need_marquee);
        assert_eq!(raster.width(), 360 + MARQUEE_PADDING);
        assert_eq!(raster.wrap, WrapMode::Repeat);
        assert!((raster.repeat_x - 160.0 / 420.0).abs() < 1e-6);
        // Left aligned
        assert_eq!(inked_columns(&raster).0, 0);
    }

    #[test]
    fn test_threshold_is_strict() {
        let style = LabelStyle {
            max_width: 156,
            ..LabelStyle::default()
        };
        let raster = create_label(&"x".repeat(13), &style, &FixedFont).unwrap();
        assert!(!raster.need_marquee);
        let raster = create_label(&"x".repeat(14), &style, &FixedFont).unwrap();
        assert!(raster.need_marquee);
    }

    #[test]
    fn test_background_fill() {
        let style = LabelStyle {
            background: Color32::from_rgb(10, 20, 30),
            ..LabelStyle::default()
        };
        let raster = create_label("", &style, &FixedFont).unwrap();
        assert_eq!(*raster.image.get_pixel(0, 0), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_too_wide_is_rejected() {
        let style = LabelStyle::default();
        let text = "x".repeat(1000);
        match create_label(&text, &style, &FixedFont) {
            Err(LabelError::TooWide { width, .. }) => assert_eq!(width, 12_060),
            other => panic!("Expected TooWide, got {:?}", other.map(|r| r.width())),
        }
    }

    #[test]
    fn test_placeholder_is_transparent() {
        let raster = LabelRaster::placeholder(&LabelStyle::default());
        assert_eq!(raster.width(), 1);
        assert_eq!(raster.image.get_pixel(0, 0)[3], 0);
        assert!(!raster.need_marquee);
    }

    #[test]
    fn test_batch_keeps_order() {
        let texts = vec!["PM".to_string(), "x".repeat(20), "Lean".to_string()];
        let out = create_labels(&texts, &LabelStyle::default(), &FixedFont);
        let flags: Vec<bool> = out.iter().map(|r| r.as_ref().unwrap().need_marquee).collect();
        assert_eq!(flags, vec![false, true, false]);
    }

    #[test]
    fn test_marquee_wraps_to_zero() {
        let mut m = Marquee {
            offset: 0.0,
            repeat: 0.4,
            scrolling: true,
        };
        let mut wrapped = false;
        let mut last = 0.0;
        for _ in 0..1200 {
            m.advance(0.002);
            assert!(m.offset >= 0.0 && m.offset <= 1.0 + 0.002);
            if m.offset < last {
                assert_eq!(m.offset, 0.0);
                wrapped = true;
            }
            last = m.offset;
        }
        assert!(wrapped);
        let (u0, u1) = m.u_range();
        assert!((u1 - u0 - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_static_label_never_moves() {
        let mut m = Marquee {
            offset: 0.0,
            repeat: 1.0,
            scrolling: false,
        };
        for _ in 0..100 {
            m.advance(0.002);
        }
        assert_eq!(m.offset, 0.0);
    }

    #[test]
    fn test_glyph_font_real_metrics() {
        let font = GlyphFont::egui_default().unwrap();
        let style = LabelStyle::default();

        let short = create_label("PM", &style, &font).unwrap();
        assert!(!short.need_marquee);
        assert_eq!(short.width(), 160);
        assert!(short.image.pixels().any(|p| p[3] > 0), "text was drawn");

        let text = "Seasoned Decision Maker of Things";
        let width = font.measure(text, 24.0).ceil() as u32;
        assert!(width > 160);
        let long = create_label(text, &style, &font).unwrap();
        assert!(long.need_marquee);
        assert_eq!(long.width(), width + MARQUEE_PADDING);
        assert!((long.repeat_x - 160.0 / long.width() as f32).abs() < 1e-6);
    }

    #[test]
    fn test_empty_chain_is_an_error() {
        assert!(matches!(GlyphFont::new(Vec::new()), Err(LabelError::NoFont)));
    }

    #[test]
    fn test_blend_over_transparent() {
        let mut px = Rgba([0, 0, 0, 0]);
        blend_over(&mut px, Color32::WHITE, 0.5);
        assert_eq!(px, Rgba([255, 255, 255, 128]));
    }
}
