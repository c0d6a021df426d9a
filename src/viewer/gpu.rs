use std::sync::Arc;
use winit::window::Window;

use crate::error::ViewerError;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// GPU state for wgpu rendering
pub struct GpuState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,
    /// Samples per pixel for the scene pass; 1 when MSAA is unavailable.
    pub sample_count: u32,
    /// Multisampled color target, present when `sample_count > 1`.
    msaa_view: Option<wgpu::TextureView>,
    depth_view: wgpu::TextureView,
}

impl GpuState {
    /// Create a new GPU state for the given window
    pub async fn new(window: Arc<Window>, requested_samples: u32) -> Result<Self, ViewerError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        let info = adapter.get_info();
        log::info!("Using GPU: {}", info.name);
        log::info!("Backend: {:?}", info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("modelview device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let format_flags = adapter.get_texture_format_features(surface_format).flags;
        let depth_flags = adapter.get_texture_format_features(DEPTH_FORMAT).flags;
        let sample_count = if requested_samples > 1
            && format_flags.sample_count_supported(requested_samples)
            && depth_flags.sample_count_supported(requested_samples)
        {
            requested_samples
        } else {
            if requested_samples > 1 {
                log::warn!(
                    "{}x MSAA not supported for {:?}; rendering without it",
                    requested_samples,
                    surface_format
                );
            }
            1
        };
        log::info!("Surface format {:?}, {}x MSAA", surface_format, sample_count);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let msaa_view = Self::create_msaa_view(&device, &config, sample_count);
        let depth_view = Self::create_depth_view(&device, &config, sample_count);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            sample_count,
            msaa_view,
            depth_view,
        })
    }

    fn create_msaa_view(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        sample_count: u32,
    ) -> Option<wgpu::TextureView> {
        if sample_count <= 1 {
            return None;
        }
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("MSAA Color Texture"),
            size: wgpu::Extent3d {
                width: config.width,
                height: config.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: config.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        Some(texture.create_view(&wgpu::TextureViewDescriptor::default()))
    }

    fn create_depth_view(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        sample_count: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: config.width,
                height: config.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Resize the surface and its attachments
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.reconfigure();
        }
    }

    /// Reapply the current configuration, e.g. after the surface was lost.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
        self.msaa_view = Self::create_msaa_view(&self.device, &self.config, self.sample_count);
        self.depth_view = Self::create_depth_view(&self.device, &self.config, self.sample_count);
    }

    /// Color attachment for the scene pass: the MSAA target resolving into
    /// `frame`, or `frame` itself without MSAA.
    pub fn scene_attachment<'a>(
        &'a self,
        frame: &'a wgpu::TextureView,
        clear: wgpu::Color,
    ) -> wgpu::RenderPassColorAttachment<'a> {
        let (view, resolve_target, store) = match &self.msaa_view {
            Some(msaa) => (msaa, Some(frame), wgpu::StoreOp::Discard),
            None => (frame, None, wgpu::StoreOp::Store),
        };
        wgpu::RenderPassColorAttachment {
            view,
            resolve_target,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear),
                store,
            },
            depth_slice: None,
        }
    }

    pub fn depth_attachment(&self) -> wgpu::RenderPassDepthStencilAttachment<'_> {
        wgpu::RenderPassDepthStencilAttachment {
            view: &self.depth_view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Discard,
            }),
            stencil_ops: None,
        }
    }

    pub fn viewport(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }
}
