//! The rendering context threaded explicitly through font construction.
//!
//! One `TextContext` per GPU context: it owns the shared text pipeline and
//! camera. Cloning is cheap (two `Arc`s), and every `Font` keeps a clone,
//! so pipeline and device outlive all fonts and rendered texts built from
//! them. There are no process-wide singletons.

use std::sync::Arc;

use quill_render::{CameraUniform, GpuContext, TextPipeline};

#[derive(Clone)]
pub struct TextContext {
    gpu: Arc<GpuContext>,
    pipeline: Arc<TextPipeline>,
}

impl TextContext {
    pub fn new(gpu: Arc<GpuContext>) -> Self {
        let pipeline = Arc::new(TextPipeline::new(&gpu.device, gpu.surface_format));
        pipeline.upload_quad(&gpu.queue);
        Self { gpu, pipeline }
    }

    /// Point the camera at a `width × height` pixel viewport
    /// (origin bottom-left, y up).
    pub fn set_viewport(&self, width: f32, height: f32) {
        self.set_camera(&CameraUniform::identity(width, height));
    }

    /// Install a custom projection (pan/zoom or otherwise).
    pub fn set_camera(&self, camera: &CameraUniform) {
        self.pipeline.upload_camera(&self.gpu.queue, camera);
    }

    pub fn gpu(&self) -> &Arc<GpuContext> {
        &self.gpu
    }

    pub fn pipeline(&self) -> &Arc<TextPipeline> {
        &self.pipeline
    }
}
