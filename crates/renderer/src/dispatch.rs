//! Window event dispatcher.
//!
//! Platform events are first reduced to [`AppEvent`], then folded into a
//! [`Dispatcher`] which owns the run state and the cached viewport. The frame
//! loop drains events through it once per frame and consults it before drawing.

use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::keyboard::{Key, KeyCode, NamedKey, PhysicalKey};

/// Events the demo cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    CloseRequested,
    Destroyed,
    CancelKey,
    Resized { width: u32, height: u32 },
    /// Suspend or occlusion notice; rendering carries on regardless.
    Suspend,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Quitting,
}

/// Drawable region in physical pixels. Both dimensions are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    width: u32,
    height: u32,
}

impl Viewport {
    /// Returns `None` when either dimension is zero.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Value for the `iResolution` uniform.
    pub fn resolution(&self) -> [f32; 3] {
        [self.width as f32, self.height as f32, 1.0]
    }
}

impl From<Viewport> for PhysicalSize<u32> {
    fn from(viewport: Viewport) -> Self {
        PhysicalSize::new(viewport.width, viewport.height)
    }
}

/// Run flag plus cached viewport, updated one event at a time.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    state: RunState,
    viewport: Viewport,
    pending_resize: Option<Viewport>,
}

impl Dispatcher {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            state: RunState::Running,
            viewport,
            pending_resize: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn handle(&mut self, event: AppEvent) -> RunState {
        if self.state == RunState::Quitting {
            return self.state;
        }

        match event {
            AppEvent::CloseRequested | AppEvent::Destroyed | AppEvent::CancelKey => {
                tracing::debug!(?event, "quit requested");
                self.state = RunState::Quitting;
            }
            AppEvent::Resized { width, height } => match Viewport::new(width, height) {
                Some(viewport) => {
                    if viewport != self.viewport {
                        self.viewport = viewport;
                        self.pending_resize = Some(viewport);
                    }
                }
                None => tracing::trace!(width, height, "ignoring zero-sized resize"),
            },
            AppEvent::Suspend | AppEvent::Other => {}
        }
        self.state
    }

    /// Forces the terminal state, e.g. when the event loop itself exits.
    pub fn quit(&mut self) {
        self.state = RunState::Quitting;
    }

    /// Viewport to apply to the surface, if it changed since the last call.
    pub fn take_resize(&mut self) -> Option<Viewport> {
        self.pending_resize.take()
    }
}

/// Reduces a winit event to an [`AppEvent`].
pub fn translate<T>(event: &Event<T>) -> AppEvent {
    match event {
        Event::WindowEvent { event, .. } => translate_window_event(event),
        Event::Suspended => AppEvent::Suspend,
        Event::LoopExiting => AppEvent::Destroyed,
        _ => AppEvent::Other,
    }
}

pub fn translate_window_event(event: &WindowEvent) -> AppEvent {
    match event {
        WindowEvent::CloseRequested => AppEvent::CloseRequested,
        WindowEvent::Destroyed => AppEvent::Destroyed,
        WindowEvent::Resized(size) => AppEvent::Resized {
            width: size.width,
            height: size.height,
        },
        WindowEvent::Occluded(_) => AppEvent::Suspend,
        WindowEvent::KeyboardInput { event, .. } if is_cancel_key_event(event) => {
            AppEvent::CancelKey
        }
        _ => AppEvent::Other,
    }
}

fn is_cancel_key_event(event: &KeyEvent) -> bool {
    is_cancel_key(&event.logical_key, event.physical_key, event.state)
}

/// Escape, matched either by its logical meaning or by its physical position.
pub fn is_cancel_key(logical: &Key, physical: PhysicalKey, state: ElementState) -> bool {
    state == ElementState::Pressed
        && (matches!(logical, Key::Named(NamedKey::Escape))
            || matches!(logical, Key::Character(text) if text.as_str() == "\u{1b}")
            || physical == PhysicalKey::Code(KeyCode::Escape))
}
