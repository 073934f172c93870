use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};

use crate::compile::UniformLocations;

/// CPU mirror of the `FrameParams` std140 block.
///
/// `vec3 iResolution` occupies the first 12 bytes and `float iTime` packs into
/// the remaining four, so the block is exactly 16 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct FrameUniforms {
    pub i_resolution: [f32; 3],
    pub i_time: f32,
}

impl FrameUniforms {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            i_resolution: [width as f32, height as f32, 1.0],
            i_time: 0.0,
        }
    }

    pub fn set_time(&mut self, seconds: f32) {
        self.i_time = seconds;
    }

    pub fn set_resolution(&mut self, resolution: [f32; 3]) {
        self.i_resolution = resolution;
    }

    pub fn size() -> u64 {
        size_of::<Self>() as u64
    }

    /// Offsets this struct writes to, for comparison with the shader's layout.
    pub fn locations() -> UniformLocations {
        UniformLocations {
            time: offset_of!(FrameUniforms, i_time) as u32,
            resolution: offset_of!(FrameUniforms, i_resolution) as u32,
        }
    }

    /// Fails when the compiled shader expects a different block layout.
    pub fn check_layout(shader: UniformLocations) -> anyhow::Result<()> {
        let ours = Self::locations();
        if shader != ours {
            anyhow::bail!(
                "shader uniform offsets {shader:?} do not match the uploaded block {ours:?}"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_is_sixteen_bytes_with_time_last() {
        assert_eq!(FrameUniforms::size(), 16);
        assert_eq!(
            FrameUniforms::locations(),
            UniformLocations {
                resolution: 0,
                time: 12,
            }
        );
    }

    #[test]
    fn bytes_follow_field_order() {
        let mut uniforms = FrameUniforms::new(1600, 1080);
        uniforms.set_time(2.5);
        let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&uniforms));
        assert_eq!(floats, &[1600.0, 1080.0, 1.0, 2.5]);
    }

    #[test]
    fn mismatched_layout_is_rejected() {
        assert!(FrameUniforms::check_layout(FrameUniforms::locations()).is_ok());
        let shifted = UniformLocations {
            resolution: 16,
            time: 0,
        };
        assert!(FrameUniforms::check_layout(shifted).is_err());
    }
}
