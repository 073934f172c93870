use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, warn};
use winit::dpi::PhysicalSize;

use crate::compile::{PreparedShader, UniformLocations};
use crate::dispatch::Viewport;
use crate::error::RenderError;
use crate::frame::FrameTarget;
use crate::types::RendererConfig;

use super::context::GpuContext;
use super::pipeline::ShaderPipeline;
use super::uniforms::FrameUniforms;

/// Owns every GPU object the demo needs and renders one frame at a time.
pub(crate) struct GpuState {
    context: GpuContext,
    pipeline: ShaderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniforms: FrameUniforms,
    locations: UniformLocations,
    pending_frame: Option<wgpu::SurfaceTexture>,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        shader: &PreparedShader,
        config: &RendererConfig,
    ) -> Result<Self, RenderError>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, initial_size, config)?;
        let pipeline = ShaderPipeline::new(
            &context.device,
            shader,
            context.surface_format(),
            context.depth_format(),
        )?;

        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame uniform buffer"),
            size: FrameUniforms::size(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("frame uniform bind group"),
                layout: &pipeline.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

        let uniforms = FrameUniforms::new(context.size.width, context.size.height);
        context
            .queue
            .write_buffer(&uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        Ok(Self {
            context,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            uniforms,
            locations: shader.uniforms,
            pending_frame: None,
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    fn write_field(&self, offset: u32, bytes: &[u8]) {
        self.context
            .queue
            .write_buffer(&self.uniform_buffer, u64::from(offset), bytes);
    }

    /// Acquires the next surface texture. `Ok(None)` means this frame is skipped.
    fn acquire(&mut self) -> Result<Option<wgpu::SurfaceTexture>, RenderError> {
        match self.context.surface.get_current_texture() {
            Ok(frame) => Ok(Some(frame)),
            Err(err @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                debug!(error = %err, "surface needs reconfiguring; skipping frame");
                self.context.reconfigure();
                Ok(None)
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("timed out acquiring surface texture; skipping frame");
                Ok(None)
            }
            Err(err) => Err(RenderError::Present(err)),
        }
    }

    fn encode(&self, view: &wgpu::TextureView) -> wgpu::CommandBuffer {
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("frame encoder"),
                });
        {
            let depth_stencil_attachment =
                self.context
                    .depth
                    .as_ref()
                    .map(|depth| wgpu::RenderPassDepthStencilAttachment {
                        view: &depth.view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Discard,
                        }),
                        stencil_ops: None,
                    });
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("fullscreen pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&self.pipeline.pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }
        encoder.finish()
    }
}

impl FrameTarget for GpuState {
    fn resize(&mut self, viewport: Viewport) {
        self.context.resize(viewport.into());
    }

    fn set_time(&mut self, seconds: f32) {
        self.uniforms.set_time(seconds);
        self.write_field(self.locations.time, bytemuck::bytes_of(&self.uniforms.i_time));
    }

    fn set_resolution(&mut self, resolution: [f32; 3]) {
        if self.uniforms.i_resolution == resolution {
            return;
        }
        self.uniforms.set_resolution(resolution);
        self.write_field(
            self.locations.resolution,
            bytemuck::cast_slice(&self.uniforms.i_resolution),
        );
    }

    fn draw(&mut self) -> Result<(), RenderError> {
        let Some(frame) = self.acquire()? else {
            return Ok(());
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let commands = self.encode(&view);
        self.context.queue.submit(std::iter::once(commands));
        self.pending_frame = Some(frame);
        Ok(())
    }

    fn present(&mut self) -> Result<(), RenderError> {
        if let Some(frame) = self.pending_frame.take() {
            frame.present();
        }
        Ok(())
    }
}
