//! GPU context — owns `wgpu::Device`, `Queue`, and optional `Surface`.
//!
//! Construction is the only asynchronous corner of the crate (wgpu adapter
//! and device acquisition); everything downstream is synchronous. Two paths:
//!
//! 1. **Headless** (`GpuContext::new_headless`) — no window, no surface.
//!    Used for tests and off-screen rendering.
//!
//! 2. **Windowed** (`GpuContext::new_with_surface`) — takes anything that
//!    converts into a `wgpu::SurfaceTarget`.

use thiserror::Error;
use wgpu::{
    Device, DeviceDescriptor, Instance, InstanceDescriptor, Queue,
    RequestAdapterOptions, Surface, SurfaceConfiguration, TextureFormat,
    TextureUsages,
};

#[derive(Error, Debug)]
pub enum GpuError {
    #[error("no suitable GPU adapter found")]
    NoAdapter,
    #[error("failed to request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface creation failed: {0}")]
    Surface(String),
}

/// GPU state shared by every font and rendered text in a process.
///
/// Created once by the caller and threaded explicitly into construction;
/// there are no hidden globals, so initialisation order and teardown are
/// deterministic.
pub struct GpuContext {
    pub device: Device,
    pub queue: Queue,
    /// Present only when rendering to a window.
    pub surface: Option<Surface<'static>>,
    pub surface_config: Option<SurfaceConfiguration>,
    /// Color target format the text pipeline renders into.
    pub surface_format: TextureFormat,
}

impl GpuContext {
    /// Create a headless context (no window, no surface).
    pub async fn new_headless() -> Result<Self, GpuError> {
        let instance = Instance::new(&InstanceDescriptor::default());

        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("quill_headless"),
                    ..Default::default()
                },
                None,
            )
            .await?;

        log::debug!("headless GPU context ready");

        Ok(Self {
            device,
            queue,
            surface: None,
            surface_config: None,
            // The most universally supported color format.
            surface_format: TextureFormat::Bgra8UnormSrgb,
        })
    }

    /// Create a context with a surface attached to `window`.
    ///
    /// The window handles must remain valid for the lifetime of the
    /// returned context.
    pub async fn new_with_surface<W>(window: W, width: u32, height: u32) -> Result<Self, GpuError>
    where
        W: wgpu::WasmNotSendSync + Into<wgpu::SurfaceTarget<'static>>,
    {
        let instance = Instance::new(&InstanceDescriptor::default());

        let surface = instance
            .create_surface(window)
            .map_err(|e| GpuError::Surface(e.to_string()))?;

        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("quill_windowed"),
                    ..Default::default()
                },
                None,
            )
            .await?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(caps.formats[0]);

        let config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        Ok(Self {
            device,
            queue,
            surface: Some(surface),
            surface_config: Some(config),
            surface_format: format,
        })
    }

    /// Resize the surface. No-op if headless or if either dimension is zero.
    pub fn resize(&mut self, width: u32, height: u32) {
        if let Some(config) = &mut self.surface_config {
            if width == 0 || height == 0 {
                return;
            }
            config.width = width;
            config.height = height;
            if let Some(surface) = &self.surface {
                surface.configure(&self.device, config);
            }
        }
    }

    /// Current surface dimensions, or `(0, 0)` if headless.
    pub fn surface_size(&self) -> (u32, u32) {
        self.surface_config
            .as_ref()
            .map(|c| (c.width, c.height))
            .unwrap_or((0, 0))
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_has_no_surface() {
        // May fail in CI without a GPU — skip gracefully.
        if let Ok(ctx) = pollster::block_on(GpuContext::new_headless()) {
            assert!(ctx.surface.is_none());
            assert!(ctx.surface_config.is_none());
            assert_eq!(ctx.surface_size(), (0, 0));
        }
    }

    #[test]
    fn resize_headless_is_noop() {
        if let Ok(mut ctx) = pollster::block_on(GpuContext::new_headless()) {
            ctx.resize(800, 600);
            assert_eq!(ctx.surface_size(), (0, 0));
        }
    }
}
