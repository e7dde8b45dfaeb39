//! Font metrics seam, trial cache, and the descending size search.

use std::collections::HashMap;
use std::fmt;

use crate::frame::PanelSpec;
use crate::layout::{wrap_text, Hyphenator, WrapOptions};

/// Backend-local font identifier used for metrics dispatch.
pub type FontId = u8;

/// Extra vertical leading added to the glyph height per line.
pub const LINE_LEADING_PX: u32 = 8;

/// Largest trial size for the descending search.
pub const MAX_FONT_SIZE_PX: u32 = 30;
/// Smallest trial size; below this the search gives up.
pub const MIN_FONT_SIZE_PX: u32 = 6;

/// Backend-provided metrics for one `(font, size)` trial, taken from the
/// bounding box of a reference glyph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlyphMetrics {
    /// Advance width of one character cell in px.
    pub char_width: u32,
    /// Glyph height in px, without leading.
    pub glyph_height: u32,
}

impl GlyphMetrics {
    /// Line advance: glyph height plus fixed leading.
    pub fn line_height(&self) -> u32 {
        self.glyph_height + LINE_LEADING_PX
    }
}

/// Glyph metrics source for a font resource at a requested pixel size.
pub trait FontSource {
    fn glyph_metrics(&self, font_id: FontId, size_px: u32) -> GlyphMetrics;
}

/// Metrics cache scoped to one render.
///
/// Keyed by `(font_id, size_px)` so repeated trials of the same face are
/// measured once. The owner clears it at the end of each render; nothing
/// here is shared across calls.
#[derive(Debug, Default)]
pub struct MetricsCache {
    entries: HashMap<(FontId, u32), GlyphMetrics>,
}

impl MetricsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up metrics, measuring via `source` on a miss.
    pub fn get_or_measure(
        &mut self,
        source: &dyn FontSource,
        font_id: FontId,
        size_px: u32,
    ) -> GlyphMetrics {
        *self
            .entries
            .entry((font_id, size_px))
            .or_insert_with(|| source.glyph_metrics(font_id, size_px))
    }

    /// Number of cached trials.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all cached metrics.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Accepted font trial: the largest size whose wrapped text fits the panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontFit {
    /// Chosen pixel size.
    pub size_px: u32,
    /// Metrics of the chosen trial.
    pub metrics: GlyphMetrics,
    /// Character budget the lines were wrapped against.
    pub max_chars: usize,
    /// Wrapped lines at the chosen size.
    pub lines: Vec<String>,
}

/// Font-size search error.
#[derive(Debug, PartialEq, Eq)]
pub enum FontFitError {
    /// No size in `[min_px, max_px]` produced a line count within the
    /// panel's line budget.
    NoFittingFontSize { min_px: u32, max_px: u32 },
}

impl fmt::Display for FontFitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFittingFontSize { min_px, max_px } => write!(
                f,
                "no font size in [{}, {}] px fits the panel line budget",
                min_px, max_px
            ),
        }
    }
}

impl std::error::Error for FontFitError {}

/// Search descending sizes for the largest fit.
///
/// For each trial size the character budget is
/// `usable_width / char_width` and the line budget
/// `panel.height / line_height`; the first (largest) size whose wrapped
/// line count fits the line budget wins. Trials whose metrics leave no
/// room for even one character or line are skipped. Metrics are reused
/// through `cache`, which the caller owns and clears.
pub fn select_font_size(
    text: &str,
    panel: &PanelSpec,
    source: &dyn FontSource,
    font_id: FontId,
    hyphenator: &dyn Hyphenator,
    opts: WrapOptions,
    cache: &mut MetricsCache,
) -> Result<FontFit, FontFitError> {
    let usable_width = panel.usable_width();

    for size_px in (MIN_FONT_SIZE_PX..=MAX_FONT_SIZE_PX).rev() {
        let metrics = cache.get_or_measure(source, font_id, size_px);
        if metrics.char_width == 0 || metrics.glyph_height == 0 {
            continue;
        }

        let max_chars = (usable_width / metrics.char_width) as usize;
        let max_lines = (panel.height / metrics.line_height()) as usize;
        if max_chars == 0 || max_lines == 0 {
            continue;
        }

        let lines = wrap_text(text, max_chars, hyphenator, opts);
        if lines.len() <= max_lines {
            log::debug!(
                "accepted size {}px: {} lines within budget {}",
                size_px,
                lines.len(),
                max_lines
            );
            return Ok(FontFit {
                size_px,
                metrics,
                max_chars,
                lines,
            });
        }
    }

    log::warn!(
        "no font size in [{}, {}] px fits the panel line budget",
        MIN_FONT_SIZE_PX,
        MAX_FONT_SIZE_PX
    );
    Err(FontFitError::NoFittingFontSize {
        min_px: MIN_FONT_SIZE_PX,
        max_px: MAX_FONT_SIZE_PX,
    })
}
