use bytemuck::{Pod, Zeroable};
use glam::Vec3;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x4];

    pub fn new(position: Vec3, normal: Vec3, color: [f32; 4]) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            color,
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Non-indexed triangle list. Every three consecutive vertices form one
/// counter-clockwise face.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>) -> Self {
        debug_assert!(
            vertices.len() % 3 == 0,
            "triangle list length {} is not a multiple of 3",
            vertices.len()
        );
        Self { vertices }
    }

    /// Expands an indexed triangle list. When `normals` is `None` each face
    /// gets its geometric normal.
    pub fn from_indexed(
        positions: &[Vec3],
        normals: Option<&[Vec3]>,
        indices: &[u32],
        color: [f32; 4],
    ) -> Self {
        let mut vertices = Vec::with_capacity(indices.len() - indices.len() % 3);
        for tri in indices.chunks_exact(3) {
            let p = [
                positions[tri[0] as usize],
                positions[tri[1] as usize],
                positions[tri[2] as usize],
            ];
            let face_normal = face_normal(p[0], p[1], p[2]);
            for (corner, &index) in tri.iter().enumerate() {
                let normal = normals
                    .map(|n| n[index as usize])
                    .unwrap_or(face_normal);
                vertices.push(Vertex::new(p[corner], normal, color));
            }
        }
        Self { vertices }
    }

    pub fn num_faces(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

pub fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a).normalize_or_zero()
}
