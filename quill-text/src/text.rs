//! Rendered text — an immutable mesh on the GPU plus a draw position.
//!
//! Built only by `Font::render` / `Font::assemble`. The vertex and index
//! buffers are uploaded once at construction and never touched again;
//! moving the text rewrites a 48-byte uniform instead. Each drawable keeps
//! a `Font` clone, so the atlas texture it samples stays alive for as long
//! as the drawable does, no matter when the caller drops its own handle.

use quill_render::DrawParams;

use crate::font::Font;
use crate::mesh::TextMesh;

pub struct RenderedText {
    font: Font,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    params: DrawParams,
    params_buffer: wgpu::Buffer,
    params_bind_group: wgpu::BindGroup,
}

impl std::fmt::Debug for RenderedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedText")
            .field("font", &self.font)
            .field("index_count", &self.index_count)
            .finish_non_exhaustive()
    }
}

impl RenderedText {
    pub(crate) fn new(font: Font, mesh: &TextMesh) -> Self {
        let inner = font.inner();
        let device = &inner.ctx.gpu().device;
        let queue = &inner.ctx.gpu().queue;

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("quill_text_vb"),
            size: std::mem::size_of_val(mesh.vertices.as_slice()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let index_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("quill_text_ib"),
            size: std::mem::size_of_val(mesh.indices.as_slice()) as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        if !mesh.is_empty() {
            queue.write_buffer(&vertex_buffer, 0, bytemuck::cast_slice(&mesh.vertices));
            queue.write_buffer(&index_buffer, 0, bytemuck::cast_slice(&mesh.indices));
        }

        let (params_buffer, params_bind_group) =
            inner.ctx.pipeline().create_params_bind_group(device);
        let params = DrawParams::identity();
        queue.write_buffer(&params_buffer, 0, bytemuck::bytes_of(&params));

        Self {
            font,
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            params,
            params_buffer,
            params_bind_group,
        }
    }

    /// Place the text origin in world space. Geometry is untouched; only
    /// the params uniform is rewritten.
    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.params.offset = [x, y, z];
        self.upload_params();
    }

    /// Tint the text. Glyph coverage modulates the alpha channel.
    pub fn set_color(&mut self, color: [f32; 4]) {
        self.params.color = color;
        self.upload_params();
    }

    pub fn position(&self) -> [f32; 3] {
        self.params.offset
    }

    pub fn glyph_count(&self) -> usize {
        (self.index_count / 6) as usize
    }

    /// The font this text was built from (and keeps alive).
    pub fn font(&self) -> &Font {
        &self.font
    }

    /// Record this text into a render pass: one indexed draw of
    /// `6 × glyph_count` indices against the font's atlas. Empty texts
    /// record nothing.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.index_count == 0 {
            return;
        }
        let inner = self.font.inner();
        inner.ctx.pipeline().bind(pass);
        pass.set_bind_group(1, &inner.atlas_bind_group, &[]);
        pass.set_bind_group(2, &self.params_bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }

    fn upload_params(&self) {
        self.font
            .inner()
            .ctx
            .gpu()
            .queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&self.params));
    }
}
