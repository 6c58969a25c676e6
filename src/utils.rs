use wgpu::util::DeviceExt;
use bytemuck::{Pod, Zeroable};

/// Clip-space corner of the full-screen quad
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
}

pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub vertex_count: u32,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
}

impl Mesh {
    pub fn upload(&self, device: &wgpu::Device) -> MeshBuffer {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_vertex_buffer"),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        MeshBuffer {
            vertex_buffer,
            vertex_count: self.vertices.len() as u32,
        }
    }
}

/// Two triangles covering the viewport, drawn as a triangle strip
pub fn create_fullscreen_quad() -> Mesh {
    let vertices = vec![
        Vertex { position: [-1.0, -1.0] },
        Vertex { position: [-1.0, 1.0] },
        Vertex { position: [1.0, -1.0] },
        Vertex { position: [1.0, 1.0] },
    ];
    Mesh { vertices }
}
