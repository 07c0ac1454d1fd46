//! Rasterization adapter — wraps `fontdue` behind the bitmap contract the
//! atlas consumes.
//!
//! `fontdue::Font` owns its parsed tables, so unlike the shaping side there
//! is no transient borrowing here: one `Rasterizer` per font, created at
//! construction time and kept inside the font's cache state.

use crate::error::{FontError, TextError};

/// A rasterized glyph: coverage pixels plus placement metrics.
///
/// `pitch` is the byte stride between source rows; a negative pitch marks
/// rows stored bottom-up (a flip flag, not an offset to feed into index
/// arithmetic). `fontdue` always produces tightly packed top-down bitmaps
/// (`pitch == width`), but the atlas blit honors the general contract.
#[derive(Debug, Clone)]
pub struct GlyphBitmap {
    pub width: u32,
    pub rows: u32,
    pub pitch: i32,
    /// Horizontal offset of the leftmost pixel from the glyph origin.
    pub left: i32,
    /// Vertical offset of the top row above the baseline.
    pub top: i32,
    /// Horizontal advance in pixels.
    pub advance: f32,
    /// 8-bit coverage, `rows` rows of `|pitch|` bytes.
    pub data: Vec<u8>,
}

impl GlyphBitmap {
    /// Whitespace and other mark-free glyphs rasterize to nothing.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.rows == 0
    }

    /// The `r`-th row top-down, regardless of storage direction.
    pub fn row(&self, r: u32) -> &[u8] {
        let stride = self.pitch.unsigned_abs() as usize;
        let stored = if self.pitch < 0 { self.rows - 1 - r } else { r };
        let start = stored as usize * stride;
        &self.data[start..start + self.width as usize]
    }
}

/// Per-font rasterizer: glyph bitmaps and the metrics the atlas is sized
/// from.
pub struct Rasterizer {
    font: fontdue::Font,
    pixel_size: f32,
}

impl Rasterizer {
    pub fn new(data: &[u8], face_index: u32, pixel_size: u32) -> Result<Self, FontError> {
        let settings = fontdue::FontSettings {
            collection_index: face_index,
            ..fontdue::FontSettings::default()
        };
        let font = fontdue::Font::from_bytes(data, settings).map_err(|reason| {
            log::warn!("fontdue rejected font data: {reason}");
            FontError::UnsupportedFont
        })?;
        Ok(Self {
            font,
            pixel_size: pixel_size as f32,
        })
    }

    /// Rasterize a glyph by its post-shaping glyph id.
    pub fn glyph_bitmap(&self, glyph_id: u16) -> Result<GlyphBitmap, TextError> {
        if glyph_id >= self.font.glyph_count() {
            return Err(TextError::Rasterization(glyph_id));
        }
        let (metrics, data) = self.font.rasterize_indexed(glyph_id, self.pixel_size);
        Ok(GlyphBitmap {
            width: metrics.width as u32,
            rows: metrics.height as u32,
            pitch: metrics.width as i32,
            left: metrics.xmin,
            // fontdue reports the bottom edge offset; the atlas wants the
            // top edge above the baseline.
            top: metrics.ymin + metrics.height as i32,
            advance: metrics.advance_width,
            data,
        })
    }

    /// Worst-case glyph cell in pixels: the `'M'` advance by the line
    /// height. Used to size the atlas for a requested glyph count.
    pub fn cell_geometry(&self) -> (u32, u32) {
        let height = self
            .font
            .horizontal_line_metrics(self.pixel_size)
            .map(|m| (m.ascent - m.descent).ceil() as u32)
            .unwrap_or(self.pixel_size as u32);
        let (metrics, _) = self.font.rasterize('M', self.pixel_size);
        let width = (metrics.advance_width.ceil() as u32).max(1);
        (width, height.max(1))
    }

    /// Glyph id for a character, `0` (.notdef) when unmapped.
    pub fn glyph_index(&self, ch: char) -> u16 {
        self.font.lookup_glyph_index(ch)
    }
}
