//! Glyph atlas — append-only, shelf-packed cache of rasterized glyphs.
//!
//! Glyphs are placed left-to-right in rows ("shelves"); a glyph that does
//! not fit the remaining width starts a new shelf below the tallest glyph
//! of the current one, with a 1-pixel gutter against bilinear bleed. Once
//! a glyph is placed, its pixels, quad geometry, and UV region are fixed
//! for the lifetime of the atlas: there is no eviction and no overwrite,
//! so meshes built yesterday sample exactly what they sampled then. When
//! nothing more fits, `ensure` fails with `CacheOverflow` and the caller
//! must build a font with a larger minimum cache size.
//!
//! The pixel store is CPU-side (single channel); the owning font mirrors
//! freshly packed sub-rectangles into its GPU texture, one upload per new
//! glyph.

use std::collections::HashMap;

use crate::error::TextError;
use crate::raster::GlyphBitmap;

/// Normalized UV sub-rectangle within the atlas texture.
/// `v_min` is the glyph's top row (textures are y-down).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtlasRegion {
    pub u_min: f32,
    pub v_min: f32,
    pub u_max: f32,
    pub v_max: f32,
}

/// Quad corners in font-pixel space, relative to the glyph origin on the
/// baseline (y up: `top > bottom` for anything above the baseline).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadRect {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

/// Pixel-space sub-rectangle of the atlas, as handed to texture uploads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TexelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Geometry of one cached glyph, computed once at insertion and returned
/// verbatim for every later occurrence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphSlot {
    /// Packed origin and bitmap size in atlas pixels.
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub quad: QuadRect,
    pub region: AtlasRegion,
}

impl GlyphSlot {
    fn from_bitmap(x: u32, y: u32, bitmap: &GlyphBitmap, atlas_w: u32, atlas_h: u32) -> Self {
        let (w, h) = (bitmap.width, bitmap.rows);
        Self {
            x,
            y,
            width: w,
            height: h,
            quad: QuadRect {
                left: bitmap.left as f32,
                bottom: (bitmap.top - h as i32) as f32,
                right: (bitmap.left + w as i32) as f32,
                top: bitmap.top as f32,
            },
            region: AtlasRegion {
                u_min: x as f32 / atlas_w as f32,
                v_min: y as f32 / atlas_h as f32,
                u_max: (x + w) as f32 / atlas_w as f32,
                v_max: (y + h) as f32 / atlas_h as f32,
            },
        }
    }

    /// Slot for glyphs with no pixels (whitespace): zero quad, zero UVs.
    fn empty() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            quad: QuadRect { left: 0.0, bottom: 0.0, right: 0.0, top: 0.0 },
            region: AtlasRegion { u_min: 0.0, v_min: 0.0, u_max: 0.0, v_max: 0.0 },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Shelf-packing cursor. The cursor only moves right and down; placements
/// commit atomically, so a failed placement leaves it untouched.
#[derive(Debug)]
struct ShelfPacker {
    width: u32,
    height: u32,
    x: u32,
    y: u32,
    shelf_height: u32,
}

impl ShelfPacker {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            x: 0,
            y: 0,
            shelf_height: 0,
        }
    }

    /// Find room for a `w × h` rectangle.
    ///
    /// Returns its top-left position, or `None` when the atlas is
    /// exhausted for this size. Placements are separated by a 1-pixel
    /// gutter on both axes so bilinear sampling cannot bleed between
    /// neighbors.
    fn place(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        if w > self.width {
            return None;
        }

        let (mut x, mut y, mut shelf_height) = (self.x, self.y, self.shelf_height);
        if x + w > self.width {
            // Open a new shelf under the tallest glyph of the current one.
            y += shelf_height + 1;
            x = 0;
            shelf_height = 0;
        }
        if y + h > self.height {
            return None;
        }

        self.x = x + w + 1;
        self.y = y;
        self.shelf_height = shelf_height.max(h);
        Some((x, y))
    }
}

/// The glyph cache of one font: pixel store, packing cursor, and the
/// glyph-id → slot index.
pub struct GlyphAtlas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    packer: ShelfPacker,
    slots: HashMap<u16, GlyphSlot>,
}

impl GlyphAtlas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; (width as usize) * (height as usize)],
            packer: ShelfPacker::new(width, height),
            slots: HashMap::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Single-channel pixel store, `width * height` bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Number of cached glyphs (including empty ones).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Look up a previously cached glyph without mutating anything.
    pub fn get(&self, glyph_id: u16) -> Option<GlyphSlot> {
        self.slots.get(&glyph_id).copied()
    }

    /// Iterate all cached slots.
    pub fn slots(&self) -> impl Iterator<Item = (u16, &GlyphSlot)> {
        self.slots.iter().map(|(id, slot)| (*id, slot))
    }

    /// Return the slot for `glyph_id`, rasterizing and packing it on miss.
    ///
    /// On a fresh insertion the returned `TexelRect` names the sub-region
    /// the caller must mirror into the GPU texture — exactly once per
    /// glyph; hits and empty glyphs return `None`. On failure
    /// (`Rasterization`, `CacheOverflow`) no state changes: the cursor,
    /// index, and pixels are exactly as before the call.
    pub fn ensure(
        &mut self,
        glyph_id: u16,
        rasterize: impl FnOnce() -> Result<GlyphBitmap, TextError>,
    ) -> Result<(GlyphSlot, Option<TexelRect>), TextError> {
        if let Some(slot) = self.slots.get(&glyph_id) {
            return Ok((*slot, None));
        }

        let bitmap = rasterize()?;

        if bitmap.is_empty() {
            let slot = GlyphSlot::empty();
            self.slots.insert(glyph_id, slot);
            return Ok((slot, None));
        }

        let (x, y) = self
            .packer
            .place(bitmap.width, bitmap.rows)
            .ok_or(TextError::CacheOverflow {
                width: self.width,
                height: self.height,
            })?;

        self.blit(&bitmap, x, y);
        let slot = GlyphSlot::from_bitmap(x, y, &bitmap, self.width, self.height);
        self.slots.insert(glyph_id, slot);
        log::trace!(
            "cached glyph {glyph_id}: {}x{} at ({x}, {y})",
            bitmap.width,
            bitmap.rows
        );

        Ok((
            slot,
            Some(TexelRect {
                x,
                y,
                width: bitmap.width,
                height: bitmap.rows,
            }),
        ))
    }

    fn blit(&mut self, bitmap: &GlyphBitmap, x: u32, y: u32) {
        for r in 0..bitmap.rows {
            let src = bitmap.row(r);
            let start = ((y + r) * self.width + x) as usize;
            self.pixels[start..start + bitmap.width as usize].copy_from_slice(src);
        }
    }
}

// ===================================================================
// Tests
// ===================================================================
