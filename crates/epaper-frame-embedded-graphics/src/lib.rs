//! embedded-graphics text rasterizer for `epaper-frame` panels.
//!
//! Maps trial pixel sizes onto the built-in ASCII `MonoFont` ladder, draws
//! wrapped lines into the core `Bitmap`, and owns the per-render metrics
//! cache lifecycle.

#![cfg_attr(
    not(test),
    deny(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented
    )
)]

use core::convert::Infallible;
use core::fmt;

use embedded_graphics::{
    mono_font::{
        ascii::{
            FONT_10X20, FONT_4X6, FONT_5X7, FONT_5X8, FONT_6X10, FONT_6X12, FONT_6X9, FONT_7X13,
            FONT_7X14, FONT_9X15, FONT_9X18,
        },
        MonoFont, MonoTextStyle,
    },
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use epaper_frame::{
    select_font_size, Bitmap, EnglishHyphenator, FontFitError, FontId, FontSource, GlyphMetrics,
    MetricsCache, PanelSpec, WrapOptions,
};

/// Font id of the default (and only) monospace family.
pub const DEFAULT_FONT_ID: FontId = 0;

/// Fixed ladder of monospace faces indexed by requested pixel size.
///
/// A requested size collapses onto the tallest built-in face that does not
/// exceed it, so neighbouring trial sizes often share a face and a cache
/// entry.
#[derive(Clone, Copy, Debug, Default)]
pub struct MonoFontLibrary;

impl MonoFontLibrary {
    pub fn new() -> Self {
        Self
    }

    /// Face backing the given trial size.
    pub fn face_for(&self, size_px: u32) -> &'static MonoFont<'static> {
        match size_px {
            0..=6 => &FONT_4X6,
            7 => &FONT_5X7,
            8 => &FONT_5X8,
            9 => &FONT_6X9,
            10 => &FONT_6X10,
            11 | 12 => &FONT_6X12,
            13 => &FONT_7X13,
            14 => &FONT_7X14,
            15..=17 => &FONT_9X15,
            18 | 19 => &FONT_9X18,
            _ => &FONT_10X20,
        }
    }
}

impl FontSource for MonoFontLibrary {
    fn glyph_metrics(&self, _font_id: FontId, size_px: u32) -> GlyphMetrics {
        let face = self.face_for(size_px);
        GlyphMetrics {
            char_width: face.character_size.width + face.character_spacing,
            glyph_height: face.character_size.height,
        }
    }
}

/// `DrawTarget` adapter over the core byte-per-pixel bitmap.
///
/// `BinaryColor::On` is ink: it writes black (0); `Off` writes white.
pub struct BitmapTarget<'a> {
    bitmap: &'a mut Bitmap,
}

impl<'a> BitmapTarget<'a> {
    pub fn new(bitmap: &'a mut Bitmap) -> Self {
        Self { bitmap }
    }
}

impl OriginDimensions for BitmapTarget<'_> {
    fn size(&self) -> Size {
        Size::new(self.bitmap.width(), self.bitmap.height())
    }
}

impl DrawTarget for BitmapTarget<'_> {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 {
                continue;
            }
            let value = match color {
                BinaryColor::On => 0x00,
                BinaryColor::Off => 0xFF,
            };
            self.bitmap.set(point.x as u32, point.y as u32, value);
        }
        Ok(())
    }
}

/// Render error.
#[derive(Debug, PartialEq, Eq)]
pub enum RenderError {
    /// The font-size search exhausted its range.
    Fit(FontFitError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fit(err) => write!(f, "font fit failed: {}", err),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<FontFitError> for RenderError {
    fn from(value: FontFitError) -> Self {
        Self::Fit(value)
    }
}

/// Text-to-bitmap renderer for one panel.
///
/// Owns the metrics cache: it is populated across the size trials of a
/// single `render` call and cleared before the call returns, so no metric
/// state leaks between renders.
pub struct FrameRenderer {
    panel: PanelSpec,
    library: MonoFontLibrary,
    hyphenator: EnglishHyphenator,
    wrap: WrapOptions,
    cache: MetricsCache,
}

impl FrameRenderer {
    /// Renderer for `panel` with English hyphenation.
    pub fn new(panel: PanelSpec) -> Self {
        Self {
            panel,
            library: MonoFontLibrary::new(),
            hyphenator: EnglishHyphenator::default(),
            wrap: WrapOptions::default(),
            cache: MetricsCache::new(),
        }
    }

    /// Override the hyphenation language tag (e.g. `"en_US"`).
    pub fn with_language_tag(mut self, tag: &str) -> Self {
        self.hyphenator = EnglishHyphenator::from_tag(tag);
        self
    }

    /// Override fragment-size limits for hyphenated splits.
    pub fn with_wrap_options(mut self, wrap: WrapOptions) -> Self {
        self.wrap = wrap;
        self
    }

    pub fn panel(&self) -> &PanelSpec {
        &self.panel
    }

    /// Render `text` into a fresh panel-sized bitmap.
    ///
    /// Picks the largest fitting font size, draws the wrapped lines
    /// left-aligned at the side margin with the block vertically centered
    /// (fixed 5 px upward bias), and returns the canvas ready for packing.
    pub fn render(&mut self, text: &str) -> Result<Bitmap, RenderError> {
        let result = self.render_inner(text);
        self.cache.clear();
        result
    }

    fn render_inner(&mut self, text: &str) -> Result<Bitmap, RenderError> {
        let fit = select_font_size(
            text,
            &self.panel,
            &self.library,
            DEFAULT_FONT_ID,
            &self.hyphenator,
            self.wrap,
            &mut self.cache,
        )?;
        log::debug!(
            "font fit: size={}px lines={} max_chars={}",
            fit.size_px,
            fit.lines.len(),
            fit.max_chars
        );

        let mut bitmap = Bitmap::new(self.panel.width, self.panel.height);
        let mut target = BitmapTarget::new(&mut bitmap);
        let style = MonoTextStyle::new(self.library.face_for(fit.size_px), BinaryColor::On);

        let line_height = fit.metrics.line_height() as i32;
        let total_height = fit.lines.len() as i32 * line_height;
        let mut y = (self.panel.height as i32 - total_height) / 2 - 5;
        let x = self.panel.side_margin as i32;

        for line in &fit.lines {
            let drawn = Text::with_baseline(line, Point::new(x, y), style, Baseline::Top)
                .draw(&mut target);
            match drawn {
                Ok(_) => {}
                Err(never) => match never {},
            }
            y += line_height;
        }

        Ok(bitmap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black_pixel_count(bitmap: &Bitmap) -> usize {
        let mut count = 0;
        for y in 0..bitmap.height() {
            for x in 0..bitmap.width() {
                if bitmap.get(x, y) == 0 {
                    count += 1;
                }
            }
        }
        count
    }

    #[test]
    fn ladder_faces_never_shrink_with_size() {
        let library = MonoFontLibrary::new();
        let mut prev = 0;
        for size in 6..=30 {
            let metrics = library.glyph_metrics(DEFAULT_FONT_ID, size);
            assert!(metrics.glyph_height >= prev, "size {size} shrank");
            prev = metrics.glyph_height;
        }
    }

    #[test]
    fn render_puts_ink_on_the_canvas() {
        let mut renderer = FrameRenderer::new(PanelSpec::default());
        let bitmap = renderer.render("hello panel").expect("render");
        assert_eq!(bitmap.width(), 240);
        assert_eq!(bitmap.height(), 416);
        assert!(black_pixel_count(&bitmap) > 0);
    }

    #[test]
    fn margins_stay_white() {
        let mut renderer = FrameRenderer::new(PanelSpec::default());
        let bitmap = renderer.render("margin check").expect("render");
        for y in 0..bitmap.height() {
            for x in 0..15 {
                assert_eq!(bitmap.get(x, y), 0xFF, "ink inside left margin at y={y}");
            }
        }
    }

    #[test]
    fn block_is_roughly_centered() {
        let mut renderer = FrameRenderer::new(PanelSpec::default());
        let bitmap = renderer.render("centered").expect("render");
        let mut first_ink = None;
        let mut last_ink = None;
        for y in 0..bitmap.height() {
            for x in 0..bitmap.width() {
                if bitmap.get(x, y) == 0 {
                    first_ink.get_or_insert(y);
                    last_ink = Some(y);
                }
            }
        }
        let (top, bottom) = (first_ink.expect("ink"), last_ink.expect("ink"));
        // single short line: ink sits near the vertical middle, biased up 5px
        let mid = (top + bottom) / 2;
        let center = bitmap.height() / 2;
        assert!(mid < center, "block should be biased upward");
        assert!(center - mid < 40, "block drifted too far from center");
    }

    #[test]
    fn no_fit_is_reported_not_swallowed() {
        let panel = PanelSpec {
            width: 48,
            height: 8,
            side_margin: 15,
        };
        let mut renderer = FrameRenderer::new(panel);
        let err = renderer
            .render("far too much text for an eight pixel tall panel")
            .expect_err("must not fit");
        assert!(matches!(err, RenderError::Fit(FontFitError::NoFittingFontSize { .. })));
    }

    #[test]
    fn cache_is_cleared_between_renders() {
        let mut renderer = FrameRenderer::new(PanelSpec::default());
        let _ = renderer.render("one").expect("render");
        assert!(renderer.cache.is_empty());
    }
}
