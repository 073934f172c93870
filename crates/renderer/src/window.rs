use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use tracing::{debug, info};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event_loop::EventLoop;
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowBuilder};

use crate::compile::PreparedShader;
use crate::dispatch::{translate, Dispatcher, Viewport};
use crate::error::{RenderError, SetupContext, SetupStage};
use crate::frame::{run_frames, EventPump, LoopReport};
use crate::gpu::GpuState;
use crate::runtime::SystemTimeSource;
use crate::types::RendererConfig;

/// Drains winit's queue without blocking, once per frame.
pub(crate) struct WinitPump {
    event_loop: EventLoop<()>,
}

impl WinitPump {
    pub(crate) fn new() -> Result<Self, RenderError> {
        let event_loop = EventLoop::new()
            .map_err(|err| anyhow!("failed to create event loop: {err}"))
            .during(SetupStage::EventLoop)?;
        Ok(Self { event_loop })
    }
}

impl EventPump for WinitPump {
    fn drain(&mut self, dispatcher: &mut Dispatcher) {
        let status = self
            .event_loop
            .pump_events(Some(Duration::ZERO), |event, _| {
                dispatcher.handle(translate(&event));
            });
        if let PumpStatus::Exit(code) = status {
            debug!(code, "event loop exited");
            dispatcher.quit();
        }
    }
}

/// Top-left corner that centers `window` on a monitor at `monitor_origin`.
///
/// Windows larger than the monitor are pinned to its origin rather than pushed
/// off-screen.
pub(crate) fn centered_origin(
    monitor_origin: PhysicalPosition<i32>,
    monitor_size: PhysicalSize<u32>,
    window: PhysicalSize<u32>,
) -> PhysicalPosition<i32> {
    let offset = |monitor: u32, window: u32| {
        i32::try_from(monitor.saturating_sub(window) / 2).unwrap_or(i32::MAX)
    };
    PhysicalPosition::new(
        monitor_origin
            .x
            .saturating_add(offset(monitor_size.width, window.width)),
        monitor_origin
            .y
            .saturating_add(offset(monitor_size.height, window.height)),
    )
}

fn build_window(pump: &WinitPump, config: &RendererConfig) -> Result<Arc<Window>, RenderError> {
    let (width, height) = config.surface_size;
    let window = WindowBuilder::new()
        .with_title("")
        .with_inner_size(PhysicalSize::new(width, height))
        .with_visible(false)
        .build(&pump.event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))
        .during(SetupStage::Window)?;

    if let Some(monitor) = window.primary_monitor() {
        let origin = centered_origin(monitor.position(), monitor.size(), window.outer_size());
        debug!(x = origin.x, y = origin.y, "centering window on primary monitor");
        window.set_outer_position(origin);
    }
    window.set_visible(true);
    window.focus_window();

    Ok(Arc::new(window))
}

/// Opens the window and renders until it is closed or Escape is pressed.
pub(crate) fn run_window(
    config: &RendererConfig,
    shader: &PreparedShader,
) -> Result<LoopReport, RenderError> {
    let mut pump = WinitPump::new()?;
    let window = build_window(&pump, config)?;

    let mut gpu = GpuState::new(window.as_ref(), window.inner_size(), shader, config)?;
    let size = gpu.size();
    let viewport = Viewport::new(size.width, size.height)
        .ok_or_else(|| anyhow!("window reported a zero-sized client area"))
        .during(SetupStage::Window)?;
    info!(
        width = viewport.width(),
        height = viewport.height(),
        vsync = ?config.vsync,
        "window ready"
    );

    let mut dispatcher = Dispatcher::new(viewport);
    let mut clock = SystemTimeSource::new();
    let result = run_frames(&mut pump, &mut gpu, &mut clock, &mut dispatcher);

    // The surface must go before the window it was created from.
    drop(gpu);
    drop(window);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_centered_on_monitor() {
        let origin = centered_origin(
            PhysicalPosition::new(0, 0),
            PhysicalSize::new(1920, 1080),
            PhysicalSize::new(1600, 1080),
        );
        assert_eq!(origin, PhysicalPosition::new(160, 0));
    }

    #[test]
    fn secondary_monitor_offset_is_respected() {
        let origin = centered_origin(
            PhysicalPosition::new(-2560, 200),
            PhysicalSize::new(2560, 1440),
            PhysicalSize::new(1600, 1080),
        );
        assert_eq!(origin, PhysicalPosition::new(-2560 + 480, 200 + 180));
    }

    #[test]
    fn oversized_window_pins_to_monitor_origin() {
        let origin = centered_origin(
            PhysicalPosition::new(10, 20),
            PhysicalSize::new(1280, 720),
            PhysicalSize::new(1600, 1080),
        );
        assert_eq!(origin, PhysicalPosition::new(10, 20));
    }
}
