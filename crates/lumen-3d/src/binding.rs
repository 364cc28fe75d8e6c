use std::sync::Arc;

use wgpu::util::{BufferInitDescriptor, DeviceExt};
use wgpu::{Buffer, BufferUsages, Device};

use crate::model::Mesh;

pub struct GeometrySlot {
    /// `None` for meshes without vertices; wgpu rejects empty vertex buffers.
    pub vbuf: Option<Buffer>,
    pub vertex_count: u32,
}

/// GPU vertex buffers for a scene, one slot per object in scene order.
pub struct GeometryBinding {
    slots: Vec<GeometrySlot>,
    meshes: Vec<Arc<Mesh>>,
}

impl GeometryBinding {
    pub fn empty() -> Self {
        Self {
            slots: Vec::new(),
            meshes: Vec::new(),
        }
    }

    pub fn build<'a, I>(device: &Device, meshes: I) -> Self
    where
        I: IntoIterator<Item = &'a Arc<Mesh>>,
    {
        let meshes: Vec<Arc<Mesh>> = meshes.into_iter().cloned().collect();
        let slots = meshes
            .iter()
            .enumerate()
            .map(|(index, mesh)| {
                let vbuf = (!mesh.is_empty()).then(|| {
                    device.create_buffer_init(&BufferInitDescriptor {
                        label: Some(&format!("object_{index}_vertices")),
                        contents: bytemuck::cast_slice(&mesh.vertices),
                        usage: BufferUsages::VERTEX,
                    })
                });
                GeometrySlot {
                    vbuf,
                    vertex_count: mesh.vertex_count() as u32,
                }
            })
            .collect();

        log::debug!("built geometry binding with {} slots", meshes.len());
        Self { slots, meshes }
    }

    /// Whether this binding was built from exactly these meshes, in order.
    pub fn matches<'a, I>(&self, meshes: I) -> bool
    where
        I: IntoIterator<Item = &'a Arc<Mesh>>,
    {
        let mut bound = self.meshes.iter();
        for mesh in meshes {
            match bound.next() {
                Some(b) if Arc::ptr_eq(b, mesh) => {}
                _ => return false,
            }
        }
        bound.next().is_none()
    }

    pub fn slot(&self, index: usize) -> Option<&GeometrySlot> {
        self.slots.get(index)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Default for GeometryBinding {
    fn default() -> Self {
        Self::empty()
    }
}
