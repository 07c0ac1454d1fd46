//! GPU vertex and uniform data types for the text pipeline.
//!
//! All types derive `bytemuck::Pod` + `Zeroable` for zero-copy upload
//! to GPU buffers.

use bytemuck::{Pod, Zeroable};
use wgpu::{BufferAddress, VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};

// ───────────────────────────────────────────────────────────────────
// Glyph vertex
// ───────────────────────────────────────────────────────────────────

/// One corner of a glyph quad.
///
/// `position` is in font-pixel space relative to the text origin (the pen
/// start); `uv` addresses the glyph's sub-rectangle of the atlas texture.
/// Each glyph contributes 4 vertices and 6 indices to its mesh.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GlyphVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

impl GlyphVertex {
    /// Unit quad spanning (0,0)→(1,1), used to blit a whole texture
    /// (the atlas debug draw). UVs flip vertically so texture row 0
    /// lands at the top of the quad under a y-up camera.
    pub const UNIT_QUAD: [GlyphVertex; 4] = [
        GlyphVertex { position: [0.0, 0.0], uv: [0.0, 1.0] }, // bottom-left
        GlyphVertex { position: [1.0, 0.0], uv: [1.0, 1.0] }, // bottom-right
        GlyphVertex { position: [0.0, 1.0], uv: [0.0, 0.0] }, // top-left
        GlyphVertex { position: [1.0, 1.0], uv: [1.0, 0.0] }, // top-right
    ];

    /// Two triangles over a `[BL, BR, TL, TR]` quad.
    pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 1, 2, 3];

    pub fn new(x: f32, y: f32, u: f32, v: f32) -> Self {
        Self {
            position: [x, y],
            uv: [u, v],
        }
    }

    pub fn layout() -> VertexBufferLayout<'static> {
        static ATTRS: &[VertexAttribute] = &[
            // location(0) = position
            VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: VertexFormat::Float32x2,
            },
            // location(1) = uv
            VertexAttribute {
                offset: 8,
                shader_location: 1,
                format: VertexFormat::Float32x2,
            },
        ];
        VertexBufferLayout {
            array_stride: std::mem::size_of::<GlyphVertex>() as BufferAddress,
            step_mode: VertexStepMode::Vertex,
            attributes: ATTRS,
        }
    }
}

// ───────────────────────────────────────────────────────────────────
// Per-draw parameters
// ───────────────────────────────────────────────────────────────────

/// Uniform data owned by each drawable (a rendered text or the atlas
/// debug quad): a 3D offset applied after scaling, a 2D scale applied to
/// vertex positions, and the text color.
///
/// Positioning a text never touches its vertex buffer — only this 48-byte
/// uniform is rewritten.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct DrawParams {
    /// World-space offset of the text origin.
    pub offset: [f32; 3],
    pub _pad0: f32,
    /// Position multiplier; `[1, 1]` for glyph meshes, the target size in
    /// pixels when drawing the unit quad.
    pub scale: [f32; 2],
    pub _pad1: [f32; 2],
    /// RGBA color, each channel in [0.0, 1.0].
    pub color: [f32; 4],
}

impl DrawParams {
    pub fn new(offset: [f32; 3], scale: [f32; 2], color: [f32; 4]) -> Self {
        Self {
            offset,
            _pad0: 0.0,
            scale,
            _pad1: [0.0; 2],
            color,
        }
    }

    /// Untransformed white text at the origin.
    pub fn identity() -> Self {
        Self::new([0.0; 3], [1.0, 1.0], [1.0, 1.0, 1.0, 1.0])
    }
}

// ───────────────────────────────────────────────────────────────────
// Camera uniform
// ───────────────────────────────────────────────────────────────────

/// Camera/viewport uniform sent to the GPU once per frame.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    /// 4×4 orthographic projection matrix (column-major).
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    /// Build an orthographic projection for a viewport of `width × height`
    /// pixels, with optional pan and zoom.
    ///
    /// Maps (0,0) to the bottom-left and (width, height) to the top-right:
    /// y grows upward, matching the baseline-relative glyph geometry where
    /// a quad's top edge has the larger y.
    pub fn orthographic(width: f32, height: f32, pan_x: f32, pan_y: f32, zoom: f32) -> Self {
        // NDC: x ∈ [-1, 1], y ∈ [-1, 1]
        //
        // world_x_visible = [pan_x, pan_x + width/zoom]
        // world_y_visible = [pan_y, pan_y + height/zoom]
        //
        // ndc_x = (world_x - pan_x) * (2 * zoom / width) - 1
        // ndc_y = (world_y - pan_y) * (2 * zoom / height) - 1
        //
        // Column-major 4×4:
        let sx = 2.0 * zoom / width;
        let sy = 2.0 * zoom / height;
        let tx = -pan_x * sx - 1.0;
        let ty = -pan_y * sy - 1.0;

        Self {
            view_proj: [
                [sx, 0.0, 0.0, 0.0],
                [0.0, sy, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [tx, ty, 0.0, 1.0],
            ],
        }
    }

    /// Identity: 1px = 1 unit, no pan, no zoom.
    pub fn identity(width: f32, height: f32) -> Self {
        Self::orthographic(width, height, 0.0, 0.0, 1.0)
    }
}

// ===================================================================
// Tests
// ===================================================================
