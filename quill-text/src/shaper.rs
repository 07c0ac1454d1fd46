//! Shaping adapter — maps a UTF-8 string to positioned glyphs via
//! `rustybuzz`.
//!
//! Faces are created transiently per call: `rustybuzz::Face` borrows the
//! font bytes, so storing one next to the owning `Vec<u8>` would
//! self-reference. Construction validates the face once; a parse failure
//! here is defensive only.

/// Fractional bits of the fixed-point pixel metrics in [`ShapedGlyph`].
pub const SUBPIXEL_BITS: u32 = 6;

/// One positioned glyph from the shaping engine.
///
/// Metrics are 26.6 fixed-point pixels: font units scaled by
/// `pixel_size / units_per_em`, with [`SUBPIXEL_BITS`] of sub-pixel
/// precision. Consumers shift right by [`SUBPIXEL_BITS`] for whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapedGlyph {
    /// Glyph id within the face — not a Unicode codepoint; shaping may
    /// merge or substitute characters.
    pub glyph_id: u16,
    pub x_advance: i32,
    pub y_advance: i32,
    pub x_offset: i32,
    pub y_offset: i32,
}

/// Shape `text` left-to-right against the face at `face_index` in `data`.
///
/// Returns one record per output position, in visual order. An unparsable
/// face yields no glyphs (and a warning); `Font` construction has already
/// rejected such data.
pub fn shape(data: &[u8], face_index: u32, pixel_size: u32, text: &str) -> Vec<ShapedGlyph> {
    if text.is_empty() {
        return Vec::new();
    }

    let Some(face) = rustybuzz::Face::from_slice(data, face_index) else {
        log::warn!("shaping face failed to parse, producing no glyphs");
        return Vec::new();
    };

    let mut buffer = rustybuzz::UnicodeBuffer::new();
    buffer.push_str(text);
    buffer.set_direction(rustybuzz::Direction::LeftToRight);

    let glyphs = rustybuzz::shape(&face, &[], buffer);

    let scale = pixel_size as f32 / face.units_per_em() as f32;
    let to_fixed = |units: i32| (units as f32 * scale * 64.0).round() as i32;

    glyphs
        .glyph_infos()
        .iter()
        .zip(glyphs.glyph_positions())
        .map(|(info, pos)| ShapedGlyph {
            glyph_id: info.glyph_id as u16,
            x_advance: to_fixed(pos.x_advance),
            y_advance: to_fixed(pos.y_advance),
            x_offset: to_fixed(pos.x_offset),
            y_offset: to_fixed(pos.y_offset),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_shapes_to_nothing() {
        assert!(shape(&[], 0, 16, "").is_empty());
    }

    #[test]
    fn garbage_face_shapes_to_nothing() {
        assert!(shape(&[0u8; 32], 0, 16, "abc").is_empty());
    }

    #[test]
    fn shape_ascii_word() {
        let Some(path) = crate::testutil::system_font() else {
            return;
        };
        let data = std::fs::read(path).expect("font readable");
        let shaped = shape(&data, 0, 32, "Hello");

        assert_eq!(shaped.len(), 5, "one glyph per ASCII character");
        for glyph in &shaped {
            assert_ne!(glyph.glyph_id, 0, "ASCII must not map to .notdef");
            assert!(glyph.x_advance > 0, "horizontal script advances right");
            assert_eq!(glyph.y_advance, 0);
        }
    }

    #[test]
    fn repeated_characters_shape_identically() {
        let Some(path) = crate::testutil::system_font() else {
            return;
        };
        let data = std::fs::read(path).expect("font readable");
        let shaped = shape(&data, 0, 24, "AA");

        assert_eq!(shaped.len(), 2);
        assert_eq!(shaped[0].glyph_id, shaped[1].glyph_id);
        assert_eq!(shaped[0].x_advance, shaped[1].x_advance);
    }

    #[test]
    fn advances_scale_with_pixel_size() {
        let Some(path) = crate::testutil::system_font() else {
            return;
        };
        let data = std::fs::read(path).expect("font readable");
        let small = shape(&data, 0, 12, "W");
        let large = shape(&data, 0, 48, "W");
        assert!(large[0].x_advance > small[0].x_advance);
    }
}
