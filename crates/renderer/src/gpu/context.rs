use anyhow::anyhow;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;

use crate::error::{RenderError, SetupContext, SetupStage};
use crate::types::{PixelSpec, RendererConfig, VsyncMode};

/// wgpu instance/device/surface wiring plus the depth attachment.
pub(crate) struct GpuContext {
    _instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: PhysicalSize<u32>,
    pub depth: Option<DepthTarget>,
    depth_format: Option<wgpu::TextureFormat>,
}

pub(crate) struct DepthTarget {
    _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl DepthTarget {
    fn new(device: &wgpu::Device, format: wgpu::TextureFormat, size: PhysicalSize<u32>) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth target"),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

impl GpuContext {
    /// `target` must outlive the returned context: the surface holds its raw
    /// handles without tracking the lifetime.
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        config: &RendererConfig,
    ) -> Result<Self, RenderError>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let flags = if config.diagnostics {
            wgpu::InstanceFlags::debugging()
        } else {
            wgpu::InstanceFlags::default()
        };
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags,
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let window_handle = target
            .window_handle()
            .map_err(|err| anyhow!("failed to acquire window handle: {err}"))
            .during(SetupStage::Surface)?;
        let display_handle = target
            .display_handle()
            .map_err(|err| anyhow!("failed to acquire display handle: {err}"))
            .during(SetupStage::Surface)?;

        let surface = unsafe {
            instance.create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
                raw_display_handle: display_handle.as_raw(),
                raw_window_handle: window_handle.as_raw(),
            })
        }
        .during(SetupStage::Surface)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .during(SetupStage::Adapter)?;

        let info = adapter.get_info();
        tracing::info!(
            name = %info.name,
            backend = ?info.backend,
            device_type = ?info.device_type,
            "selected GPU adapter"
        );

        let limits = adapter.limits();
        let max_dimension = limits.max_texture_dimension_2d;
        let width = initial_size.width.max(1);
        let height = initial_size.height.max(1);
        if width > max_dimension || height > max_dimension {
            return Err(RenderError::setup(
                SetupStage::SurfaceConfig,
                anyhow!(
                    "GPU max texture dimension is {max_dimension}, requested surface is {width}x{height}"
                ),
            ));
        }

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("neonzoom device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults().using_resolution(limits),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::default(),
        }))
        .during(SetupStage::Device)?;

        if config.diagnostics {
            device.on_uncaptured_error(Box::new(|error| {
                tracing::error!(%error, "wgpu reported an uncaptured error");
            }));
        }

        let caps = surface.get_capabilities(&adapter);
        let format = choose_color_format(&caps.formats, &config.pixel_spec)
            .ok_or_else(|| anyhow!("surface offers no formats ({:?})", caps.formats))
            .during(SetupStage::SurfaceConfig)?;
        if !config.pixel_spec.accepts(format) {
            tracing::warn!(
                ?format,
                "no surface format satisfies the requested pixel spec; using closest match"
            );
        }
        let present_mode = choose_present_mode(&caps.present_modes, config.vsync)
            .ok_or_else(|| anyhow!("surface offers no present modes"))
            .during(SetupStage::SurfaceConfig)?;
        let alpha_mode = if caps
            .alpha_modes
            .contains(&wgpu::CompositeAlphaMode::Opaque)
        {
            wgpu::CompositeAlphaMode::Opaque
        } else {
            caps.alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto)
        };
        tracing::debug!(?format, ?present_mode, ?alpha_mode, "configuring surface");

        let size = PhysicalSize::new(width, height);
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: config.pixel_spec.frame_latency(),
        };
        surface.configure(&device, &surface_config);

        let depth_format = config.pixel_spec.depth_format();
        let depth = depth_format.map(|format| DepthTarget::new(&device, format, size));

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            config: surface_config,
            size,
            depth,
            depth_format,
        })
    }

    pub(crate) fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub(crate) fn depth_format(&self) -> Option<wgpu::TextureFormat> {
        self.depth_format
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth = self
            .depth_format
            .map(|format| DepthTarget::new(&self.device, format, new_size));
    }

    /// Re-applies the current configuration after a lost or outdated surface.
    pub(crate) fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }
}

/// Picks an 8-bit-per-channel RGBA format without sRGB encoding, so shader
/// output reaches the display unchanged.
pub(crate) fn choose_color_format(
    formats: &[wgpu::TextureFormat],
    spec: &PixelSpec,
) -> Option<wgpu::TextureFormat> {
    const PREFERRED: [wgpu::TextureFormat; 2] = [
        wgpu::TextureFormat::Bgra8Unorm,
        wgpu::TextureFormat::Rgba8Unorm,
    ];

    PREFERRED
        .iter()
        .copied()
        .find(|format| formats.contains(format))
        .or_else(|| {
            formats
                .iter()
                .copied()
                .find(|format| !format.is_srgb() && spec.accepts(*format))
        })
        .or_else(|| formats.iter().copied().find(|format| spec.accepts(*format)))
        .or_else(|| formats.first().copied())
}

/// `Off` prefers `Immediate`, then `Mailbox`, then `Fifo`; `On` prefers `Fifo`.
pub(crate) fn choose_present_mode(
    modes: &[wgpu::PresentMode],
    vsync: VsyncMode,
) -> Option<wgpu::PresentMode> {
    let order: &[wgpu::PresentMode] = match vsync {
        VsyncMode::Off => &[
            wgpu::PresentMode::Immediate,
            wgpu::PresentMode::Mailbox,
            wgpu::PresentMode::Fifo,
        ],
        VsyncMode::On => &[wgpu::PresentMode::Fifo],
    };
    order
        .iter()
        .copied()
        .find(|mode| modes.contains(mode))
        .or_else(|| modes.first().copied())
}

#[cfg(test)]
mod tests {
    use wgpu::{PresentMode, TextureFormat};

    use super::*;

    #[test]
    fn prefers_plain_eight_bit_formats() {
        let spec = PixelSpec::default();
        let formats = [
            TextureFormat::Bgra8UnormSrgb,
            TextureFormat::Rgba16Float,
            TextureFormat::Rgba8Unorm,
        ];
        assert_eq!(
            choose_color_format(&formats, &spec),
            Some(TextureFormat::Rgba8Unorm)
        );
    }

    #[test]
    fn falls_back_to_srgb_when_nothing_else_fits() {
        let spec = PixelSpec::default();
        let formats = [TextureFormat::Bgra8UnormSrgb];
        assert_eq!(
            choose_color_format(&formats, &spec),
            Some(TextureFormat::Bgra8UnormSrgb)
        );
        assert_eq!(choose_color_format(&[], &spec), None);
    }

    #[test]
    fn uncapped_present_mode_preference() {
        let all = [PresentMode::Fifo, PresentMode::Mailbox, PresentMode::Immediate];
        assert_eq!(
            choose_present_mode(&all, VsyncMode::Off),
            Some(PresentMode::Immediate)
        );
        assert_eq!(
            choose_present_mode(&[PresentMode::Fifo, PresentMode::Mailbox], VsyncMode::Off),
            Some(PresentMode::Mailbox)
        );
        assert_eq!(
            choose_present_mode(&all, VsyncMode::On),
            Some(PresentMode::Fifo)
        );
        assert_eq!(
            choose_present_mode(&[PresentMode::FifoRelaxed], VsyncMode::On),
            Some(PresentMode::FifoRelaxed)
        );
        assert_eq!(choose_present_mode(&[], VsyncMode::Off), None);
    }
}
