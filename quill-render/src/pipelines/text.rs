//! Text render pipeline — indexed triangle-list rendering of glyph quads.
//!
//! One pipeline instance is shared by every font and rendered text built
//! against the same GPU context. Per-font state (the atlas texture) and
//! per-draw state (offset/scale/color) live in caller-owned bind groups
//! created through this type, so a draw is: `bind()`, set group 1 and 2,
//! set the mesh buffers, `draw_indexed`.

use wgpu::{
    AddressMode, BindGroup, BindGroupDescriptor, BindGroupEntry,
    BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry,
    BindingResource, BindingType, BlendState, Buffer, BufferBindingType,
    BufferDescriptor, BufferUsages, ColorTargetState, ColorWrites, Device,
    FilterMode, FragmentState, FrontFace, IndexFormat, MultisampleState,
    PipelineCompilationOptions, PipelineLayoutDescriptor, PolygonMode,
    PrimitiveState, PrimitiveTopology, Queue, RenderPass, RenderPipeline,
    RenderPipelineDescriptor, Sampler, SamplerBindingType, SamplerDescriptor,
    ShaderModuleDescriptor, ShaderStages, TextureFormat, TextureSampleType,
    TextureView, TextureViewDimension, VertexState,
};

use crate::vertex::{CameraUniform, DrawParams, GlyphVertex};

/// Owns the wgpu pipeline, bind group layouts, sampler, camera buffer,
/// and the shared unit quad used for whole-texture blits.
pub struct TextPipeline {
    pipeline: RenderPipeline,

    // Shared unit quad (atlas debug draw).
    quad_vertex_buffer: Buffer,
    quad_index_buffer: Buffer,

    // Camera.
    camera_buffer: Buffer,
    camera_bind_group: BindGroup,

    // Layouts for caller-created bind groups.
    atlas_bgl: BindGroupLayout,
    params_bgl: BindGroupLayout,

    // Shared by all atlas bind groups: bilinear, clamped. The 1-pixel
    // gutters between packed glyphs exist for this filter mode.
    atlas_sampler: Sampler,
}

impl TextPipeline {
    /// Create the text pipeline and its shared GPU resources.
    pub fn new(device: &Device, surface_format: TextureFormat) -> Self {
        // ── Shader ──────────────────────────────────────────────
        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("quill_text_shader"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!("../shaders/text.wgsl").into(),
            ),
        });

        // ── Camera bind group layout (group 0) ──────────────────
        let camera_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("quill_camera_bgl"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        // ── Atlas bind group layout (group 1) ───────────────────
        let atlas_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("quill_atlas_bgl"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        sample_type: TextureSampleType::Float { filterable: true },
                        view_dimension: TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        // ── Draw-params bind group layout (group 2) ─────────────
        let params_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("quill_params_bgl"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX | ShaderStages::FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        // ── Pipeline layout ─────────────────────────────────────
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("quill_text_pipeline_layout"),
            bind_group_layouts: &[&camera_bgl, &atlas_bgl, &params_bgl],
            push_constant_ranges: &[],
        });

        // ── Render pipeline ─────────────────────────────────────
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("quill_text_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: PipelineCompilationOptions::default(),
                buffers: &[GlyphVertex::layout()],
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: PipelineCompilationOptions::default(),
                targets: &[Some(ColorTargetState {
                    format: surface_format,
                    blend: Some(BlendState::ALPHA_BLENDING),
                    write_mask: ColorWrites::ALL,
                })],
            }),
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // ── Unit quad buffers ───────────────────────────────────
        let quad_vertex_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("quill_unit_quad_vb"),
            size: std::mem::size_of::<[GlyphVertex; 4]>() as u64,
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let quad_index_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("quill_unit_quad_ib"),
            size: std::mem::size_of::<[u16; 6]>() as u64,
            usage: BufferUsages::INDEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // ── Camera uniform buffer ───────────────────────────────
        let camera_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("quill_camera_ub"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("quill_camera_bg"),
            layout: &camera_bgl,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let atlas_sampler = device.create_sampler(&SamplerDescriptor {
            label: Some("quill_atlas_sampler"),
            address_mode_u: AddressMode::ClampToEdge,
            address_mode_v: AddressMode::ClampToEdge,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            ..Default::default()
        });

        Self {
            pipeline,
            quad_vertex_buffer,
            quad_index_buffer,
            camera_buffer,
            camera_bind_group,
            atlas_bgl,
            params_bgl,
            atlas_sampler,
        }
    }

    // ───────────────────── Upload ─────────────────────────────────

    /// Upload the static unit quad geometry. Call once after creation.
    pub fn upload_quad(&self, queue: &Queue) {
        queue.write_buffer(
            &self.quad_vertex_buffer,
            0,
            bytemuck::cast_slice(&GlyphVertex::UNIT_QUAD),
        );
        queue.write_buffer(
            &self.quad_index_buffer,
            0,
            bytemuck::cast_slice(&GlyphVertex::QUAD_INDICES),
        );
    }

    /// Upload the camera uniform.
    pub fn upload_camera(&self, queue: &Queue, camera: &CameraUniform) {
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(camera));
    }

    // ───────────────────── Bind group factories ───────────────────

    /// Bind group for a font's atlas texture (group 1).
    pub fn create_atlas_bind_group(&self, device: &Device, view: &TextureView) -> BindGroup {
        device.create_bind_group(&BindGroupDescriptor {
            label: Some("quill_atlas_bg"),
            layout: &self.atlas_bgl,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: BindingResource::TextureView(view),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: BindingResource::Sampler(&self.atlas_sampler),
                },
            ],
        })
    }

    /// Uniform buffer + bind group for one drawable's parameters (group 2).
    pub fn create_params_bind_group(&self, device: &Device) -> (Buffer, BindGroup) {
        let buffer = device.create_buffer(&BufferDescriptor {
            label: Some("quill_params_ub"),
            size: std::mem::size_of::<DrawParams>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("quill_params_bg"),
            layout: &self.params_bgl,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        (buffer, bind_group)
    }

    // ───────────────────── Draw ───────────────────────────────────

    /// Set the pipeline and the camera bind group (group 0).
    pub fn bind(&self, pass: &mut RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.camera_bind_group, &[]);
    }

    /// Draw the shared unit quad. Groups 1 and 2 must already be set.
    pub fn draw_unit_quad(&self, pass: &mut RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.quad_vertex_buffer.slice(..));
        pass.set_index_buffer(self.quad_index_buffer.slice(..), IndexFormat::Uint16);
        pass.draw_indexed(0..6, 0, 0..1);
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::GpuContext;

    #[test]
    fn pipeline_creation_headless() {
        // Skip when no GPU adapter is available (CI).
        if let Ok(gpu) = pollster::block_on(GpuContext::new_headless()) {
            let pipeline = TextPipeline::new(&gpu.device, gpu.surface_format);
            pipeline.upload_quad(&gpu.queue);
            pipeline.upload_camera(&gpu.queue, &CameraUniform::identity(800.0, 600.0));
        }
    }

    #[test]
    fn params_bind_group_creation() {
        if let Ok(gpu) = pollster::block_on(GpuContext::new_headless()) {
            let pipeline = TextPipeline::new(&gpu.device, gpu.surface_format);
            let (buffer, _bg) = pipeline.create_params_bind_group(&gpu.device);
            assert_eq!(buffer.size(), std::mem::size_of::<DrawParams>() as u64);
            gpu.queue
                .write_buffer(&buffer, 0, bytemuck::bytes_of(&DrawParams::identity()));
        }
    }
}
