//! Core text-to-frame pipeline for fixed-resolution e-paper panels.
//!
//! Backend-independent pieces only: hyphenation-aware greedy wrapping, the
//! descending font-size search with an explicitly scoped metrics cache, and
//! deterministic MSB-first 1bpp frame packing. Rasterization lives in
//! `epaper-frame-embedded-graphics`; the serial handshake protocol lives in
//! `epaper-frame-link`.

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

pub mod font_fit;
pub mod frame;
pub mod layout;

pub use font_fit::{
    select_font_size, FontFit, FontFitError, FontId, FontSource, GlyphMetrics, MetricsCache,
    LINE_LEADING_PX, MAX_FONT_SIZE_PX, MIN_FONT_SIZE_PX,
};
pub use frame::{pack_frame, Bitmap, PackError, PanelSpec, FRAME_BYTES, PANEL_HEIGHT, PANEL_WIDTH};
pub use layout::{
    split_word, wrap_text, BreakPositions, EnglishHyphenator, Hyphenator, WrapOptions,
};
