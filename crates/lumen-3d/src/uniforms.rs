use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::*;

/// Per-draw uniform block. Layout matches `ObjectUniforms` in `main.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ObjectUniforms {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub smoothness: f32,
    _pad: [f32; 3],
}

impl ObjectUniforms {
    pub fn new(model: Mat4, view: Mat4, projection: Mat4, smooth: bool) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            smoothness: if smooth { 1.0 } else { 0.0 },
            _pad: [0.0; 3],
        }
    }

    pub const SIZE: u64 = std::mem::size_of::<ObjectUniforms>() as u64;
}

/// One uniform buffer holding a block per draw, addressed with dynamic offsets.
pub struct UniformRing {
    buffer: Buffer,
    bind_group: BindGroup,
    stride: u64,
    capacity: usize,
    scratch: Vec<u8>,
}

impl UniformRing {
    pub fn new(device: &Device, layout: &BindGroupLayout, capacity: usize) -> Self {
        let align = device.limits().min_uniform_buffer_offset_alignment as u64;
        let stride = ObjectUniforms::SIZE.div_ceil(align) * align;
        let capacity = capacity.max(1);
        let (buffer, bind_group) = Self::allocate(device, layout, stride, capacity);
        Self {
            buffer,
            bind_group,
            stride,
            capacity,
            scratch: Vec::with_capacity(stride as usize * capacity),
        }
    }

    fn allocate(
        device: &Device,
        layout: &BindGroupLayout,
        stride: u64,
        capacity: usize,
    ) -> (Buffer, BindGroup) {
        let buffer = device.create_buffer(&BufferDescriptor {
            label: Some("object_uniforms"),
            size: stride * capacity as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("object_uniforms_bg"),
            layout,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: BindingResource::Buffer(BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(ObjectUniforms::SIZE),
                }),
            }],
        });
        (buffer, bind_group)
    }

    pub fn bind_group(&self) -> &BindGroup {
        &self.bind_group
    }

    pub fn offset(&self, index: usize) -> u32 {
        (self.stride * index as u64) as u32
    }

    /// Writes one block per entry starting at slot 0, growing the buffer
    /// when there are more entries than slots.
    pub fn upload<I>(&mut self, device: &Device, queue: &Queue, layout: &BindGroupLayout, blocks: I)
    where
        I: IntoIterator<Item = ObjectUniforms>,
    {
        self.scratch.clear();
        let stride = self.stride as usize;
        for block in blocks {
            let start = self.scratch.len();
            self.scratch.extend_from_slice(bytemuck::bytes_of(&block));
            self.scratch.resize(start + stride, 0);
        }

        let count = self.scratch.len() / stride;
        if count == 0 {
            return;
        }
        if count > self.capacity {
            let capacity = count.next_power_of_two();
            log::debug!("growing uniform ring from {} to {} slots", self.capacity, capacity);
            let (buffer, bind_group) = Self::allocate(device, layout, self.stride, capacity);
            self.buffer = buffer;
            self.bind_group = bind_group;
            self.capacity = capacity;
        }
        queue.write_buffer(&self.buffer, 0, &self.scratch);
    }
}
