use wgpu::{
    Color, CommandEncoderDescriptor, LoadOp, Operations, RenderPassColorAttachment,
    RenderPassDescriptor, StoreOp, SurfaceError, SurfaceTexture, TextureViewDescriptor,
};

use crate::utils::{create_fullscreen_quad, MeshBuffer};
use crate::view::gpu_init::GpuContext;
use crate::view::shader::ShaderProgram;
use crate::view::uniforms::UniformBlock;

/// GPU objects created once at startup: the quad and the uniform buffer
pub struct RenderResources {
    pub quad: MeshBuffer,
    pub uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl RenderResources {
    pub fn new(device: &wgpu::Device, program: &ShaderProgram, uniforms: &UniformBlock) -> Self {
        let quad = create_fullscreen_quad().upload(device);
        let uniform_buffer = uniforms.create_buffer(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("raymarch_bind_group"),
            layout: program.bind_group_layout(),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            quad,
            uniform_buffer,
            bind_group,
        }
    }

    pub fn sync_uniforms(&self, queue: &wgpu::Queue, uniforms: &mut UniformBlock) {
        uniforms.flush(queue, &self.uniform_buffer);
    }
}

/// Clear the frame to black and draw the quad when the program linked.
/// The caller presents the returned texture.
pub fn draw_frame(
    gpu: &GpuContext,
    program: &ShaderProgram,
    resources: &RenderResources,
) -> Result<SurfaceTexture, SurfaceError> {
    let frame = gpu.surface.get_current_texture()?;
    let view = frame.texture.create_view(&TextureViewDescriptor::default());
    let mut encoder = gpu.device.create_command_encoder(&CommandEncoderDescriptor {
        label: Some("encoder"),
    });

    {
        let mut rp = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("raymarch_pass"),
            color_attachments: &[Some(RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: Operations {
                    load: LoadOp::Clear(Color::BLACK),
                    store: StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if let Some(pipeline) = program.pipeline() {
            rp.set_pipeline(pipeline);
            rp.set_bind_group(0, &resources.bind_group, &[]);
            rp.set_vertex_buffer(0, resources.quad.vertex_buffer.slice(..));
            rp.draw(0..resources.quad.vertex_count, 0..1);
        }
    }

    gpu.queue.submit(std::iter::once(encoder.finish()));
    Ok(frame)
}
