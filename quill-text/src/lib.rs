//! # quill-text
//!
//! Text rendering for real-time loops: shape once, rasterize each glyph
//! once, draw any number of times. Built on `rustybuzz` (shaping),
//! `fontdue` (rasterization), and `wgpu` via [`quill-render`](quill_render).
//!
//! ## Architecture
//!
//! ```text
//!  Font::render("...")
//!       │
//!       ▼
//!  shaper::shape()            ◀─── rustybuzz: glyph ids + 26.6 metrics
//!       │
//!       ▼
//!  GlyphAtlas::ensure()       ◀─── fontdue bitmap on miss, shelf-packed
//!       │                         into the per-font R8 texture
//!       ▼
//!  mesh::assemble()           ◀─── pen accumulation → quads + indices
//!       │
//!       ▼
//!  RenderedText               ◀─── immutable GPU buffers + Font clone;
//!                                  set_position() / draw()
//! ```
//!
//! The cache is append-only: a glyph's pixels, quad, and UVs are fixed at
//! insertion, so every mesh ever built stays valid. A full atlas fails
//! with [`TextError::CacheOverflow`] — construct a `Font` with a larger
//! `min_cache_glyphs` instead of evicting.
//!
//! ## Minimal use
//!
//! ```ignore
//! let gpu = Arc::new(pollster::block_on(GpuContext::new_headless())?);
//! let ctx = TextContext::new(gpu);
//! ctx.set_viewport(1280.0, 720.0);
//!
//! let font = Font::new(&ctx, "DejaVuSans.ttf", 32, 256)?;
//! let mut hello = font.render("Hello, world")?;
//! hello.set_position(40.0, 60.0, 0.0);
//! // every frame:
//! hello.draw(&mut pass);
//! ```
//!
//! Caching and assembly are synchronous and serialize on a per-font lock;
//! `set_position`/`draw` touch only GPU-queue state and may run from
//! another thread.

pub mod atlas;
pub mod context;
pub mod error;
pub mod font;
pub mod mesh;
pub mod raster;
pub mod shaper;
pub mod text;

// Re-exports for ergonomic use.
pub use atlas::{AtlasRegion, GlyphAtlas, GlyphSlot, QuadRect, TexelRect};
pub use context::TextContext;
pub use error::{FontError, TextError};
pub use font::Font;
pub use mesh::TextMesh;
pub use raster::{GlyphBitmap, Rasterizer};
pub use shaper::{shape, ShapedGlyph, SUBPIXEL_BITS};
pub use text::RenderedText;

// The GPU layer types callers need alongside this crate.
pub use quill_render::{CameraUniform, GpuContext, GpuError, TextPipeline};

#[cfg(test)]
pub(crate) mod testutil {
    use std::path::{Path, PathBuf};

    /// Locate a parseable system font with Latin coverage, for tests that
    /// need real shaping and rasterization. `None` on bare machines —
    /// those tests skip.
    pub fn system_font() -> Option<PathBuf> {
        let roots = [
            "/usr/share/fonts",
            "/usr/local/share/fonts",
            "/System/Library/Fonts",
            "C:\\Windows\\Fonts",
        ];
        roots.iter().find_map(|root| scan(Path::new(root)))
    }

    fn scan(dir: &Path) -> Option<PathBuf> {
        let entries = std::fs::read_dir(dir).ok()?;
        let mut subdirs = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                subdirs.push(path);
                continue;
            }
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if matches!(ext, "ttf" | "otf") && usable(&path) {
                return Some(path);
            }
        }
        subdirs.iter().find_map(|d| scan(d))
    }

    /// Both adapters must accept the file, and it must map ASCII.
    fn usable(path: &Path) -> bool {
        let Ok(data) = std::fs::read(path) else {
            return false;
        };
        if rustybuzz::Face::from_slice(&data, 0).is_none() {
            return false;
        }
        match fontdue::Font::from_bytes(data.as_slice(), fontdue::FontSettings::default()) {
            Ok(font) => font.lookup_glyph_index('A') != 0,
            Err(_) => false,
        }
    }
}
