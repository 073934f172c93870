//! Renderer crate for neonzoom, a single-shader fractal zoom demo.
//!
//! The flow from configuration to pixels:
//!
//! ```text
//!   neonzoom CLI
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ prepare_fragment_shader() ──▶ naga parse + validate
//!          │
//!          └─▶ window::run_window ──▶ run_frames() ──┬─▶ WinitPump::drain ─▶ Dispatcher
//!                                                     └─▶ GpuState: iTime, iResolution, draw, present
//! ```
//!
//! The fragment shader is compiled and its uniforms located before any window
//! exists, so a broken shader never opens one. [`export_still`] renders the same
//! pattern on the CPU for headless use.

mod compile;
mod dispatch;
mod error;
mod export;
mod frame;
mod gpu;
mod pattern;
mod runtime;
mod types;
mod window;

pub use compile::{
    prepare_fragment_shader, PreparedShader, UniformLocations, RESOLUTION_UNIFORM, TIME_UNIFORM,
};
pub use dispatch::{
    is_cancel_key, translate, translate_window_event, AppEvent, Dispatcher, RunState, Viewport,
};
pub use error::{RenderError, SetupStage};
pub use export::{export_still, render_still};
pub use frame::{run_frames, EventPump, FrameTarget, LoopReport};
pub use pattern::{Pattern, ZoomStep, ZOOM_STEPS};
pub use runtime::{FixedTimeSource, SystemTimeSource, TimeSample, TimeSource};
pub use types::{PixelSpec, RendererConfig, VsyncMode, DEFAULT_SURFACE_SIZE};

/// High-level entry point that owns the chosen configuration.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Compiles the shader, opens the window and renders until the user quits.
    ///
    /// Setup failures are reported before the first frame; a failed present
    /// ends the loop with [`RenderError::Present`].
    pub fn run(&self) -> Result<LoopReport, RenderError> {
        let shader = prepare_fragment_shader()?;
        if self.config.diagnostics {
            for line in shader.info_log.lines() {
                tracing::debug!(target: "neonzoom::shader", "{line}");
            }
        }

        let report = window::run_window(&self.config, &shader)?;
        tracing::info!(frames = report.frames, "renderer stopped");
        Ok(report)
    }
}
