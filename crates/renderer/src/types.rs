/// Client-area size used when nothing else is requested.
pub const DEFAULT_SURFACE_SIZE: (u32, u32) = (1600, 1080);

/// Presentation pacing for the swapchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VsyncMode {
    /// Present as fast as possible (`Immediate`, then `Mailbox`, then `Fifo`).
    #[default]
    Off,
    /// Wait for vertical blank (`Fifo`).
    On,
}

/// Requested layout of the drawing surface.
///
/// Mirrors a classic pixel-format request: bits of color, alpha and depth plus
/// the number of swapchain buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelSpec {
    pub color_bits: u8,
    pub alpha_bits: u8,
    pub depth_bits: u8,
    pub double_buffered: bool,
}

impl Default for PixelSpec {
    fn default() -> Self {
        Self {
            color_bits: 32,
            alpha_bits: 8,
            depth_bits: 32,
            double_buffered: true,
        }
    }
}

impl PixelSpec {
    /// Depth attachment format satisfying `depth_bits`.
    pub fn depth_format(&self) -> Option<wgpu::TextureFormat> {
        match self.depth_bits {
            0 => None,
            1..=16 => Some(wgpu::TextureFormat::Depth16Unorm),
            17..=24 => Some(wgpu::TextureFormat::Depth24Plus),
            _ => Some(wgpu::TextureFormat::Depth32Float),
        }
    }

    /// Swapchain depth expressed as wgpu's maximum frame latency.
    pub fn frame_latency(&self) -> u32 {
        if self.double_buffered {
            2
        } else {
            1
        }
    }

    /// Whether a surface format carries enough color and alpha bits.
    pub fn accepts(&self, format: wgpu::TextureFormat) -> bool {
        let Some(block_bytes) = format.block_copy_size(None) else {
            return false;
        };
        let has_alpha = format.has_color_aspect() && format.components() == 4;
        block_bytes * 8 >= u32::from(self.color_bits) && (self.alpha_bits == 0 || has_alpha)
    }
}

/// Immutable configuration passed to the renderer at start-up.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Window client size in physical pixels.
    pub surface_size: (u32, u32),
    /// Surface pixel layout.
    pub pixel_spec: PixelSpec,
    /// Presentation pacing.
    pub vsync: VsyncMode,
    /// Attach driver validation and log shader diagnostics before rendering.
    pub diagnostics: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: DEFAULT_SURFACE_SIZE,
            pixel_spec: PixelSpec::default(),
            vsync: VsyncMode::default(),
            diagnostics: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_spec_wants_eight_bit_rgba_and_float_depth() {
        let spec = PixelSpec::default();
        assert!(spec.accepts(wgpu::TextureFormat::Bgra8Unorm));
        assert!(spec.accepts(wgpu::TextureFormat::Rgba8Unorm));
        assert!(!spec.accepts(wgpu::TextureFormat::R8Unorm));
        assert!(!spec.accepts(wgpu::TextureFormat::Rg16Float));
        assert_eq!(spec.depth_format(), Some(wgpu::TextureFormat::Depth32Float));
        assert_eq!(spec.frame_latency(), 2);
    }

    #[test]
    fn default_config_uses_demo_resolution() {
        let config = RendererConfig::default();
        assert_eq!(config.surface_size, (1600, 1080));
        assert_eq!(config.vsync, VsyncMode::Off);
        assert!(!config.diagnostics);
    }
}
