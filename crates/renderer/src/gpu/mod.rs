//! wgpu side of the renderer.
//!
//! - `context` owns the instance, device and surface and rebuilds the
//!   swapchain and depth attachment when the window resizes.
//! - `pipeline` turns the prepared GLSL into the one fullscreen pipeline.
//! - `uniforms` mirrors the `iResolution`/`iTime` block.
//! - `state` glues them together behind [`crate::frame::FrameTarget`].

mod context;
mod pipeline;
mod state;
mod uniforms;

pub(crate) use state::GpuState;
