use std::path::Path;

use anyhow::anyhow;
use glam::Vec2;
use image::imageops::flip_vertical_in_place;
use image::{Rgba, RgbaImage};
use tracing::info;

use crate::dispatch::Viewport;
use crate::error::RenderError;
use crate::pattern::Pattern;
use crate::runtime::TimeSource;

/// Renders one frame of the pattern on the CPU.
///
/// Rows are evaluated with a bottom-left origin like `gl_FragCoord` and then
/// flipped so the returned image reads top row first.
pub fn render_still(viewport: Viewport, time: f32) -> RgbaImage {
    let pattern = Pattern::new(time, viewport.resolution());
    let mut image = RgbaImage::from_fn(viewport.width(), viewport.height(), |x, y| {
        let color = pattern.shade(Vec2::new(x as f32 + 0.5, y as f32 + 0.5));
        Rgba(color.to_array().map(to_unorm8))
    });
    flip_vertical_in_place(&mut image);
    image
}

/// Samples `clock` once and writes that frame of the pattern to `path` as PNG.
pub fn export_still<S>(path: &Path, viewport: Viewport, clock: &mut S) -> Result<(), RenderError>
where
    S: TimeSource + ?Sized,
{
    let sample = clock.sample();
    if !sample.seconds.is_finite() {
        return Err(RenderError::export(
            path,
            anyhow!("export time must be finite, got {}", sample.seconds),
        ));
    }

    let image = render_still(viewport, sample.seconds);
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|err| RenderError::export(path, err))?;

    info!(
        path = %path.display(),
        width = viewport.width(),
        height = viewport.height(),
        time = sample.seconds,
        frame = sample.frame_index,
        "exported still"
    );
    Ok(())
}

/// Shader output is unclamped; the framebuffer saturates at the unit range.
fn to_unorm8(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}
