//! Panel geometry, the monochrome canvas, and the 1bpp wire packer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default panel width in px.
pub const PANEL_WIDTH: u32 = 240;
/// Default panel height in px.
pub const PANEL_HEIGHT: u32 = 416;
/// Packed frame length for the default panel (12480).
pub const FRAME_BYTES: usize = (PANEL_WIDTH * PANEL_HEIGHT / 8) as usize;

/// Fixed-resolution panel description.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelSpec {
    /// Panel width in px. Must be a multiple of 8 for packing.
    pub width: u32,
    /// Panel height in px.
    pub height: u32,
    /// Left/right margin in px for text placement.
    pub side_margin: u32,
}

impl Default for PanelSpec {
    fn default() -> Self {
        Self {
            width: PANEL_WIDTH,
            height: PANEL_HEIGHT,
            side_margin: 15,
        }
    }
}

impl PanelSpec {
    /// Horizontal px available for text after both margins.
    pub fn usable_width(&self) -> u32 {
        self.width.saturating_sub(2 * self.side_margin)
    }

    /// Packed frame length in bytes.
    pub fn frame_bytes(&self) -> usize {
        (self.width as usize * self.height as usize) / 8
    }
}

/// Monochrome canvas, one byte per pixel, white = nonzero.
///
/// Created fully white and never resized in place; `resized` returns a
/// stretched copy for pack inputs that do not match the panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Bitmap {
    /// All-white canvas of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0xFF; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel value at `(x, y)`; out-of-bounds reads are white.
    pub fn get(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0xFF;
        }
        self.pixels[(y * self.width + x) as usize]
    }

    /// Set the pixel at `(x, y)`; out-of-bounds writes are ignored.
    pub fn set(&mut self, x: u32, y: u32, value: u8) {
        if x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize] = value;
        }
    }

    /// Nearest-neighbour stretch to a new size, no aspect preservation.
    pub fn resized(&self, width: u32, height: u32) -> Self {
        if width == self.width && height == self.height {
            return self.clone();
        }
        let mut out = Bitmap::new(width, height);
        for y in 0..height {
            let src_y = (y as u64 * self.height as u64 / height.max(1) as u64) as u32;
            for x in 0..width {
                let src_x = (x as u64 * self.width as u64 / width.max(1) as u64) as u32;
                out.set(x, y, self.get(src_x, src_y));
            }
        }
        out
    }
}

/// Frame packing error.
#[derive(Debug, PartialEq, Eq)]
pub enum PackError {
    /// The target width is not a multiple of 8; rows would straddle bytes.
    WidthNotByteAligned { width: u32 },
}

impl fmt::Display for PackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WidthNotByteAligned { width } => {
                write!(f, "panel width {} is not a multiple of 8", width)
            }
        }
    }
}

impl std::error::Error for PackError {}

/// Pack a canvas into the panel driver's 1bpp wire format.
///
/// Row-major, MSB-first: the leftmost pixel of each 8-pixel group lands in
/// bit 7. A pixel is white when its stored value is nonzero; white packs as
/// 1, flipped when `invert` is set. The input is stretched to
/// `(width, height)` first when its size differs. Output length is always
/// exactly `width * height / 8`.
pub fn pack_frame(
    bitmap: &Bitmap,
    width: u32,
    height: u32,
    invert: bool,
) -> Result<Vec<u8>, PackError> {
    if width % 8 != 0 {
        return Err(PackError::WidthNotByteAligned { width });
    }

    let resized;
    let source = if bitmap.width() != width || bitmap.height() != height {
        resized = bitmap.resized(width, height);
        &resized
    } else {
        bitmap
    };

    let mut out = Vec::with_capacity((width as usize * height as usize) / 8);
    for y in 0..height {
        let mut byte = 0u8;
        let mut bits = 0u8;
        for x in 0..width {
            let mut bit = u8::from(source.get(x, y) != 0);
            if invert {
                bit ^= 1;
            }
            byte = (byte << 1) | bit;
            bits += 1;
            if bits == 8 {
                out.push(byte);
                byte = 0;
                bits = 0;
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_panel_frame_bytes() {
        assert_eq!(PanelSpec::default().frame_bytes(), FRAME_BYTES);
        assert_eq!(FRAME_BYTES, 12480);
    }

    #[test]
    fn packed_length_is_fixed_for_any_content() {
        let mut bitmap = Bitmap::new(16, 4);
        bitmap.set(3, 1, 0);
        bitmap.set(12, 2, 0);
        let packed = pack_frame(&bitmap, 16, 4, true).expect("pack");
        assert_eq!(packed.len(), 16 * 4 / 8);

        let blank = Bitmap::new(16, 4);
        assert_eq!(pack_frame(&blank, 16, 4, true).expect("pack").len(), 8);
    }

    #[test]
    fn msb_first_bit_order() {
        let mut bitmap = Bitmap::new(8, 1);
        bitmap.set(0, 0, 0); // leftmost pixel black
        let packed = pack_frame(&bitmap, 8, 1, false).expect("pack");
        // white = 1, so only bit 7 (the first pixel) is clear
        assert_eq!(packed, vec![0b0111_1111]);

        let inverted = pack_frame(&bitmap, 8, 1, true).expect("pack");
        assert_eq!(inverted, vec![0b1000_0000]);
    }

    #[test]
    fn round_trip_reproduces_pixels() {
        let mut bitmap = Bitmap::new(24, 3);
        for (x, y) in [(0, 0), (7, 0), (8, 1), (23, 2), (5, 2)] {
            bitmap.set(x, y, 0);
        }
        let packed = pack_frame(&bitmap, 24, 3, false).expect("pack");
        for y in 0..3u32 {
            for x in 0..24u32 {
                let byte = packed[(y * 3 + x / 8) as usize];
                let bit = (byte >> (7 - (x % 8))) & 1;
                let expected = u8::from(bitmap.get(x, y) != 0);
                assert_eq!(bit, expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn unaligned_width_is_rejected() {
        let bitmap = Bitmap::new(10, 2);
        assert_eq!(
            pack_frame(&bitmap, 10, 2, true),
            Err(PackError::WidthNotByteAligned { width: 10 })
        );
    }

    #[test]
    fn mismatched_canvas_is_stretched() {
        let mut bitmap = Bitmap::new(4, 2);
        bitmap.set(0, 0, 0);
        let packed = pack_frame(&bitmap, 8, 4, false).expect("pack");
        assert_eq!(packed.len(), 4);
        // top-left black pixel stretches to a 2x2 block
        assert_eq!(packed[0] & 0b1100_0000, 0);
        assert_eq!(packed[1] & 0b1100_0000, 0);
    }

    #[test]
    fn out_of_bounds_reads_are_white() {
        let bitmap = Bitmap::new(8, 1);
        assert_eq!(bitmap.get(100, 100), 0xFF);
    }
}
