use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "neonzoom",
    author,
    version,
    about = "Fullscreen fractal zoom driven by a single fragment shader"
)]
pub struct Cli {
    /// Window client size (e.g. `1280x720`); defaults to 1600x1080.
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_surface_size)]
    pub size: Option<SurfaceSize>,

    /// Wait for vertical blank instead of presenting as fast as possible.
    #[arg(long)]
    pub vsync: bool,

    /// Enable GPU validation and log the shader compile report.
    #[arg(long)]
    pub diagnostics: bool,

    /// Settings file; defaults to `settings.toml` in the user config directory.
    #[arg(long, value_name = "FILE", env = "NEONZOOM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Render a single PNG frame on the CPU instead of opening a window.
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Shader time of the exported frame, in seconds.
    #[arg(long, value_name = "SECONDS", requires = "export", value_parser = parse_time)]
    pub time: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_surface_size(value: &str) -> Result<SurfaceSize, String> {
    let trimmed = value.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| format!("expected WxH format, e.g. 1600x1080, got '{trimmed}'"))?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width '{}' in size", width.trim()))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height '{}' in size", height.trim()))?;

    if width == 0 || height == 0 {
        return Err("surface dimensions must be greater than zero".to_string());
    }

    Ok(SurfaceSize { width, height })
}

pub fn parse_time(value: &str) -> Result<f32, String> {
    let seconds: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid time '{value}'; expected seconds, e.g. 2.5"))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("time must be a non-negative number of seconds, got {value}"));
    }
    Ok(seconds)
}
