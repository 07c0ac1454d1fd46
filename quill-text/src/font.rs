//! Font — one (typeface, pixel size) pair with its glyph cache.
//!
//! A `Font` is a cheap clone handle over shared state: the font bytes,
//! the rasterizer + atlas behind one mutex, and the atlas GPU texture.
//! Every `RenderedText` holds a clone, so the texture it samples cannot
//! be released while the text is alive. The public type wraps a private
//! inner struct; callers never see the rasterizer, shaper, or wgpu
//! plumbing.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use quill_render::DrawParams;

use crate::atlas::{GlyphAtlas, GlyphSlot, TexelRect};
use crate::context::TextContext;
use crate::error::{FontError, TextError};
use crate::mesh;
use crate::raster::Rasterizer;
use crate::shaper::{self, ShapedGlyph};
use crate::text::RenderedText;

/// Upper bound on a computed atlas dimension.
const MAX_ATLAS_DIM: u32 = 8192;

/// Mutable cache state. Rasterizer and atlas mutate together during a
/// cache/render call, so they share one lock.
struct FontState {
    raster: Rasterizer,
    atlas: GlyphAtlas,
}

pub(crate) struct FontInner {
    pub(crate) ctx: TextContext,
    /// Raw font file bytes, borrowed transiently by shaping faces.
    data: Arc<Vec<u8>>,
    face_index: u32,
    pixel_size: u32,
    atlas_width: u32,
    atlas_height: u32,
    state: Mutex<FontState>,
    texture: wgpu::Texture,
    pub(crate) atlas_bind_group: wgpu::BindGroup,
    // Params for the atlas debug quad.
    debug_params: wgpu::Buffer,
    debug_bind_group: wgpu::BindGroup,
}

/// Shareable handle to a loaded font and its glyph cache.
#[derive(Clone)]
pub struct Font {
    inner: Arc<FontInner>,
}

impl std::fmt::Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font")
            .field("pixel_size", &self.inner.pixel_size)
            .field("atlas_width", &self.inner.atlas_width)
            .field("atlas_height", &self.inner.atlas_height)
            .finish_non_exhaustive()
    }
}

impl Font {
    /// Open a font file and prepare its glyph cache.
    ///
    /// The atlas texture is sized from the font's own metrics: a
    /// near-square grid of worst-case glyph cells covering at least
    /// `min_cache_glyphs`, rounded up to power-of-two texels. The rounding
    /// only ever adds space, so the effective capacity is at least what
    /// was asked for. On error no partial font exists.
    pub fn new(
        ctx: &TextContext,
        path: impl AsRef<Path>,
        pixel_size: u32,
        min_cache_glyphs: u32,
    ) -> Result<Self, FontError> {
        let path = path.as_ref();
        if pixel_size == 0 {
            return Err(FontError::InvalidSize(pixel_size));
        }

        let data = std::fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let face_index = 0;

        let raster = Rasterizer::new(&data, face_index, pixel_size)?;
        // Validate the shaping face once so `shape` cannot fail later.
        if rustybuzz::Face::from_slice(&data, face_index).is_none() {
            return Err(FontError::UnsupportedFont);
        }

        let (cell_w, cell_h) = raster.cell_geometry();
        let (atlas_width, atlas_height) =
            atlas_dimensions(cell_w, cell_h, min_cache_glyphs.max(1));

        let device = &ctx.gpu().device;
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("quill_glyph_atlas"),
            size: wgpu::Extent3d {
                width: atlas_width,
                height: atlas_height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let atlas_bind_group = ctx.pipeline().create_atlas_bind_group(device, &view);
        let (debug_params, debug_bind_group) = ctx.pipeline().create_params_bind_group(device);

        log::debug!(
            "font {} at {pixel_size}px: {atlas_width}x{atlas_height} atlas \
             (cell {cell_w}x{cell_h}, requested {min_cache_glyphs} glyphs)",
            path.display()
        );

        Ok(Self {
            inner: Arc::new(FontInner {
                ctx: ctx.clone(),
                data: Arc::new(data),
                face_index,
                pixel_size,
                atlas_width,
                atlas_height,
                state: Mutex::new(FontState {
                    raster,
                    atlas: GlyphAtlas::new(atlas_width, atlas_height),
                }),
                texture,
                atlas_bind_group,
                debug_params,
                debug_bind_group,
            }),
        })
    }

    /// Pre-render every glyph of `text` into the cache.
    pub fn cache(&self, text: &str) -> Result<(), TextError> {
        let shaped = self.shape(text);
        let mut state = self.inner.state.lock();
        for glyph in &shaped {
            self.inner.ensure_slot(&mut state, glyph.glyph_id)?;
        }
        Ok(())
    }

    /// Shape `text` and build a drawable, caching missing glyphs on the
    /// way.
    ///
    /// Meshes are bounded by `u16` index space
    /// ([`mesh::MAX_GLYPHS_PER_MESH`] glyphs); longer inputs are
    /// truncated.
    pub fn render(&self, text: &str) -> Result<RenderedText, TextError> {
        let shaped = self.shape(text);
        let mesh = {
            let mut state = self.inner.state.lock();
            mesh::assemble(&shaped, |id| self.inner.ensure_slot(&mut state, id))?
        };
        Ok(RenderedText::new(self.clone(), &mesh))
    }

    /// Strict variant of [`render`](Self::render): every glyph must
    /// already be cached, and the atlas is never mutated. For contexts
    /// that must not write to the cache (e.g. drawing while another part
    /// of the application owns caching).
    pub fn assemble(&self, text: &str) -> Result<RenderedText, TextError> {
        let shaped = self.shape(text);
        let mesh = {
            let state = self.inner.state.lock();
            mesh::assemble(&shaped, |id| {
                state.atlas.get(id).ok_or(TextError::UncachedGlyph(id))
            })?
        };
        Ok(RenderedText::new(self.clone(), &mesh))
    }

    /// Draw the whole atlas texture as one quad: `scale_*` multiply the
    /// atlas dimensions, `(x, y)` places the bottom-left corner.
    /// Diagnostic aid for inspecting cache utilisation.
    pub fn draw_cache_debug(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        x: f32,
        y: f32,
        scale_x: f32,
        scale_y: f32,
    ) {
        let inner = &*self.inner;
        let params = DrawParams::new(
            [x, y, 0.0],
            [
                scale_x * inner.atlas_width as f32,
                scale_y * inner.atlas_height as f32,
            ],
            [1.0, 1.0, 1.0, 1.0],
        );
        inner
            .ctx
            .gpu()
            .queue
            .write_buffer(&inner.debug_params, 0, bytemuck::bytes_of(&params));

        inner.ctx.pipeline().bind(pass);
        pass.set_bind_group(1, &inner.atlas_bind_group, &[]);
        pass.set_bind_group(2, &inner.debug_bind_group, &[]);
        inner.ctx.pipeline().draw_unit_quad(pass);
    }

    pub fn pixel_size(&self) -> u32 {
        self.inner.pixel_size
    }

    /// Atlas texture dimensions in texels.
    pub fn atlas_size(&self) -> (u32, u32) {
        (self.inner.atlas_width, self.inner.atlas_height)
    }

    /// Number of glyphs currently cached.
    pub fn cached_glyphs(&self) -> usize {
        self.inner.state.lock().atlas.len()
    }

    /// Glyph id for a character, `0` (.notdef) when the font has no
    /// mapping.
    pub fn glyph_index(&self, ch: char) -> u16 {
        self.inner.state.lock().raster.glyph_index(ch)
    }

    fn shape(&self, text: &str) -> Vec<ShapedGlyph> {
        shaper::shape(
            &self.inner.data,
            self.inner.face_index,
            self.inner.pixel_size,
            text,
        )
    }

    pub(crate) fn inner(&self) -> &FontInner {
        &self.inner
    }
}

impl FontInner {
    /// Resolve a slot, packing and mirroring to the GPU texture on miss.
    fn ensure_slot(&self, state: &mut FontState, glyph_id: u16) -> Result<GlyphSlot, TextError> {
        let FontState { raster, atlas } = state;
        let (slot, dirty) = atlas.ensure(glyph_id, || raster.glyph_bitmap(glyph_id))?;
        if let Some(rect) = dirty {
            self.upload_region(atlas, rect);
        }
        Ok(slot)
    }

    /// Mirror one freshly packed sub-rectangle into the atlas texture.
    fn upload_region(&self, atlas: &GlyphAtlas, rect: TexelRect) {
        let offset = (rect.y * atlas.width() + rect.x) as usize;
        self.ctx.gpu().queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: rect.x,
                    y: rect.y,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            &atlas.pixels()[offset..],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(atlas.width()),
                rows_per_image: Some(rect.height),
            },
            wgpu::Extent3d {
                width: rect.width,
                height: rect.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

/// Power-of-two texture dimensions for a near-square grid of
/// `min_glyphs` cells of `cell_w × cell_h` pixels.
fn atlas_dimensions(cell_w: u32, cell_h: u32, min_glyphs: u32) -> (u32, u32) {
    let cols = (f64::from(min_glyphs)).sqrt().ceil() as u32;
    let rows = min_glyphs.div_ceil(cols);
    let width = (cols * cell_w).next_power_of_two().clamp(1, MAX_ATLAS_DIM);
    let height = (rows * cell_h).next_power_of_two().clamp(1, MAX_ATLAS_DIM);
    (width, height)
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use quill_render::GpuContext;
    use std::io::Write;

    /// GPU context + system font, or `None` to skip (CI without either).
    fn test_env() -> Option<(TextContext, std::path::PathBuf)> {
        let gpu = pollster::block_on(GpuContext::new_headless()).ok()?;
        let font = crate::testutil::system_font()?;
        Some((TextContext::new(Arc::new(gpu)), font))
    }

    #[test]
    fn atlas_dimensions_power_of_two_grid() {
        // 100 glyphs of 20x30 cells: 10 columns x 10 rows = 200x300,
        // rounded up to 256x512.
        assert_eq!(atlas_dimensions(20, 30, 100), (256, 512));
        // A single glyph stays small.
        assert_eq!(atlas_dimensions(20, 30, 1), (32, 32));
    }

    #[test]
    fn atlas_dimensions_clamped() {
        let (w, h) = atlas_dimensions(512, 512, 4096);
        assert!(w <= MAX_ATLAS_DIM && h <= MAX_ATLAS_DIM);
    }

    #[test]
    fn missing_file_is_io_error() {
        let Some((ctx, _)) = test_env() else { return };
        let err = Font::new(&ctx, "/no/such/font.ttf", 16, 100).unwrap_err();
        assert!(matches!(err, FontError::Io { .. }));
    }

    #[test]
    fn zero_pixel_size_rejected() {
        let Some((ctx, path)) = test_env() else { return };
        let err = Font::new(&ctx, path, 0, 100).unwrap_err();
        assert!(matches!(err, FontError::InvalidSize(0)));
    }

    #[test]
    fn garbage_file_rejected() {
        let Some((ctx, _)) = test_env() else { return };
        let path = std::env::temp_dir().join("quill_not_a_font.ttf");
        let mut file = std::fs::File::create(&path).expect("temp file");
        file.write_all(b"definitely not a font").expect("write");
        drop(file);

        let err = Font::new(&ctx, &path, 16, 100).unwrap_err();
        assert!(matches!(err, FontError::UnsupportedFont));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn fresh_font_has_empty_cache() {
        let Some((ctx, path)) = test_env() else { return };
        let font = Font::new(&ctx, path, 24, 100).expect("font");

        assert_eq!(font.cached_glyphs(), 0);
        assert_eq!(font.pixel_size(), 24);
        let (w, h) = font.atlas_size();
        assert!(w.is_power_of_two() && h.is_power_of_two());
    }

    #[test]
    fn cache_is_idempotent() {
        let Some((ctx, path)) = test_env() else { return };
        let font = Font::new(&ctx, path, 24, 200).expect("font");

        font.cache("Hello").expect("cache");
        let after_first = font.cached_glyphs();
        assert!(after_first > 0);

        font.cache("Hello").expect("cache again");
        assert_eq!(font.cached_glyphs(), after_first);
    }

    #[test]
    fn render_empty_string_is_empty_drawable() {
        let Some((ctx, path)) = test_env() else { return };
        let font = Font::new(&ctx, path, 24, 100).expect("font");

        let text = font.render("").expect("render");
        assert_eq!(text.glyph_count(), 0);
        assert_eq!(font.cached_glyphs(), 0, "nothing was cached");
    }

    #[test]
    fn render_caches_on_demand() {
        let Some((ctx, path)) = test_env() else { return };
        let font = Font::new(&ctx, path, 24, 200).expect("font");

        let text = font.render("AA").expect("render");
        assert_eq!(text.glyph_count(), 2);
        assert_eq!(font.cached_glyphs(), 1, "one distinct glyph");
    }

    #[test]
    fn assemble_requires_cached_glyphs() {
        let Some((ctx, path)) = test_env() else { return };
        let font = Font::new(&ctx, path, 24, 200).expect("font");

        let err = font.assemble("Hi").unwrap_err();
        assert!(matches!(err, TextError::UncachedGlyph(_)));
        assert_eq!(font.cached_glyphs(), 0, "strict assembly must not cache");

        // An empty string needs no cached glyphs at all.
        let empty = font.assemble("").expect("empty assemble");
        assert_eq!(empty.glyph_count(), 0);

        font.cache("Hi").expect("cache");
        let text = font.assemble("Hi").expect("assemble");
        assert_eq!(text.glyph_count(), 2);
    }

    #[test]
    fn tiny_cache_overflows() {
        let Some((ctx, path)) = test_env() else { return };
        // One-glyph cache: caching the whole alphanumeric set must
        // exhaust it even after power-of-two rounding.
        let font = Font::new(&ctx, path, 64, 1).expect("font");

        let result =
            font.cache("abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789");
        assert!(matches!(result, Err(TextError::CacheOverflow { .. })));

        // The font stays usable for what already fits.
        assert!(font.cached_glyphs() > 0);
    }

    #[test]
    fn rendered_text_outlives_its_font_handle() {
        let Some((ctx, path)) = test_env() else { return };
        let font = Font::new(&ctx, path, 24, 100).expect("font");
        let mut text = font.render("still alive").expect("render");
        let glyphs = text.glyph_count();
        drop(font);

        // The shared inner state is still owned by the drawable.
        text.set_position(10.0, 20.0, 0.0);
        assert_eq!(text.glyph_count(), glyphs);
        assert_eq!(text.position(), [10.0, 20.0, 0.0]);

        // And it still records a draw against the atlas texture.
        draw_offscreen(&ctx, |pass| text.draw(pass));
    }

    #[test]
    fn draw_and_debug_draw_record_passes() {
        let Some((ctx, path)) = test_env() else { return };
        ctx.set_viewport(256.0, 256.0);
        let font = Font::new(&ctx, path, 24, 100).expect("font");
        let text = font.render("draw me").expect("render");

        draw_offscreen(&ctx, |pass| {
            text.draw(pass);
            font.draw_cache_debug(pass, 0.0, 0.0, 0.25, 0.25);
        });
    }

    /// Render into a throwaway offscreen target and submit.
    fn draw_offscreen(ctx: &TextContext, record: impl FnOnce(&mut wgpu::RenderPass<'_>)) {
        let gpu = ctx.gpu();
        let target = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("quill_test_target"),
            size: wgpu::Extent3d {
                width: 256,
                height: 256,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: gpu.surface_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = target.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("quill_test_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("quill_test_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            record(&mut pass);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        gpu.device.poll(wgpu::Maintain::Wait);
    }
}
