//! # quill-render
//!
//! GPU backend for quill, built on `wgpu`.
//!
//! ## Architecture
//!
//! ```text
//!  GpuContext (device + queue, headless or windowed)
//!       │
//!       ▼
//!  TextPipeline                ◀─── WGSL pipeline, bind group layouts,
//!       │                           sampler, shared unit quad
//!       ▼
//!  per-font atlas bind group   ◀─── create_atlas_bind_group()
//!  per-draw params bind group  ◀─── create_params_bind_group()
//!       │
//!       ▼
//!  RenderPass                  ◀─── bind() + draw_indexed from the caller
//! ```
//!
//! ## Crate modules
//!
//! - [`context`] — GPU device/queue/surface initialisation
//! - [`vertex`] — glyph vertex, draw-params, and camera data types
//! - [`pipelines`] — wgpu render pipelines (text)

pub mod context;
pub mod pipelines;
pub mod vertex;

// Re-exports for convenience
pub use context::{GpuContext, GpuError};
pub use pipelines::text::TextPipeline;
pub use vertex::{CameraUniform, DrawParams, GlyphVertex};
