//! Text mesh assembly — shaped glyphs plus atlas slots become quad
//! geometry.
//!
//! A mesh is a flat run of glyph quads: 4 vertices and 6 indices per
//! shaped position, whitespace included (degenerate zero-size quads keep
//! the `4 × ordinal` index base exact). The pen starts at the origin and
//! advances in whole pixels after each glyph.

use quill_render::GlyphVertex;

use crate::atlas::GlyphSlot;
use crate::error::TextError;
use crate::shaper::{ShapedGlyph, SUBPIXEL_BITS};

/// `u16` indices bound one mesh to this many glyphs; longer inputs are
/// truncated with a warning.
pub const MAX_GLYPHS_PER_MESH: usize = (u16::MAX as usize + 1) / 4;

/// CPU-side quad geometry for one string, owned by exactly one rendered
/// text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextMesh {
    pub vertices: Vec<GlyphVertex>,
    pub indices: Vec<u16>,
}

impl TextMesh {
    pub fn with_capacity(glyphs: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(glyphs * 4),
            indices: Vec::with_capacity(glyphs * 6),
        }
    }

    pub fn glyph_count(&self) -> usize {
        self.indices.len() / 6
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Append one glyph quad translated by `(dx, dy)`.
    ///
    /// Vertex order is `[BL, BR, TL, TR]`; the two triangles are
    /// `(BL, BR, TL)` and `(BR, TL, TR)`. The glyph's top row of texels
    /// (`v_min`) maps to the quad's top edge.
    fn push_glyph(&mut self, slot: &GlyphSlot, dx: f32, dy: f32) {
        let base = self.vertices.len() as u16;
        let q = &slot.quad;
        let r = &slot.region;

        self.vertices.push(GlyphVertex::new(q.left + dx, q.bottom + dy, r.u_min, r.v_max));
        self.vertices.push(GlyphVertex::new(q.right + dx, q.bottom + dy, r.u_max, r.v_max));
        self.vertices.push(GlyphVertex::new(q.left + dx, q.top + dy, r.u_min, r.v_min));
        self.vertices.push(GlyphVertex::new(q.right + dx, q.top + dy, r.u_max, r.v_min));

        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 1, base + 2, base + 3]);
    }
}

/// Build a mesh from shaped glyphs, resolving each against `slot_for`.
///
/// `Font::render` passes a resolver that caches on miss; `Font::assemble`
/// passes a read-only lookup that fails with `UncachedGlyph`. An empty
/// input produces an empty mesh, not an error.
pub fn assemble(
    shaped: &[ShapedGlyph],
    mut slot_for: impl FnMut(u16) -> Result<GlyphSlot, TextError>,
) -> Result<TextMesh, TextError> {
    let shaped = if shaped.len() > MAX_GLYPHS_PER_MESH {
        log::warn!(
            "text of {} glyphs truncated to {MAX_GLYPHS_PER_MESH} (u16 index space)",
            shaped.len()
        );
        &shaped[..MAX_GLYPHS_PER_MESH]
    } else {
        shaped
    };

    let mut mesh = TextMesh::with_capacity(shaped.len());
    let (mut pen_x, mut pen_y) = (0i32, 0i32);

    for glyph in shaped {
        let slot = slot_for(glyph.glyph_id)?;
        let dx = (pen_x + (glyph.x_offset >> SUBPIXEL_BITS)) as f32;
        let dy = (pen_y + (glyph.y_offset >> SUBPIXEL_BITS)) as f32;
        mesh.push_glyph(&slot, dx, dy);
        pen_x += glyph.x_advance >> SUBPIXEL_BITS;
        pen_y += glyph.y_advance >> SUBPIXEL_BITS;
    }

    Ok(mesh)
}

// ===================================================================
// Tests
// ===================================================================
