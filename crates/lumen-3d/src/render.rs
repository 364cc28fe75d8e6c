use anyhow::Result;
use wgpu::*;

use crate::binding::GeometryBinding;
use crate::pipeline::{Layouts, Pipelines, create_bind_group_layouts, create_pipelines};
use crate::readback::Readback;
use crate::target::{COLOR_FORMAT, DepthReadMode, RenderTarget};
use crate::uniforms::{ObjectUniforms, UniformRing};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassKind {
    Depth,
    Color,
}

impl PassKind {
    pub fn label(self) -> &'static str {
        match self {
            PassKind::Depth => "depth_pass",
            PassKind::Color => "color_pass",
        }
    }
}

fn cleared_attachment(view: &TextureView, clear: Color) -> RenderPassColorAttachment<'_> {
    RenderPassColorAttachment {
        view,
        depth_slice: None,
        resolve_target: None,
        ops: Operations {
            load: LoadOp::Clear(clear),
            store: StoreOp::Store,
        },
    }
}

/// One object's draw: geometry slot, uniforms, and `3 * num_faces` vertices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCall {
    pub slot: usize,
    pub uniforms: ObjectUniforms,
    pub vertex_count: u32,
}

pub struct Renderer3D {
    pub layouts: Layouts,
    pub pipelines: Pipelines,
    pub target: RenderTarget,
    pub uniforms: UniformRing,
    pub readback: Readback,
}

impl Renderer3D {
    pub fn new(device: &Device, width: u32, height: u32, depth_read: DepthReadMode) -> Self {
        let layouts = create_bind_group_layouts(device);
        let pipelines = create_pipelines(device, &layouts, COLOR_FORMAT, depth_read);
        let target = RenderTarget::new(device, width, height, depth_read);
        let uniforms = UniformRing::new(device, &layouts.object_bgl, 16);
        let readback = Readback::new(device, width, height);

        Self {
            layouts,
            pipelines,
            target,
            uniforms,
            readback,
        }
    }

    /// Records one pass that clears the target and draws `draws` in order,
    /// followed by the copy of the pass's attachment into the staging buffer.
    pub fn encode(
        &mut self,
        device: &Device,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        kind: PassKind,
        binding: &GeometryBinding,
        draws: &[DrawCall],
    ) {
        self.uniforms.upload(
            device,
            queue,
            &self.layouts.object_bgl,
            draws.iter().map(|d| d.uniforms),
        );

        {
            // The depth values target clears to the depth clear value.
            let color_attachment = match (kind, &self.target.depth_values) {
                (PassKind::Color, _) => Some(cleared_attachment(&self.target.color_view, Color::BLACK)),
                (PassKind::Depth, Some((_, view))) => Some(cleared_attachment(view, Color::RED)),
                (PassKind::Depth, None) => None,
            };
            let color_attachments: &[Option<RenderPassColorAttachment>] =
                if color_attachment.is_some() {
                    std::slice::from_ref(&color_attachment)
                } else {
                    &[]
                };

            let mut r_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some(kind.label()),
                color_attachments,
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &self.target.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            r_pass.set_viewport(
                0.0,
                0.0,
                self.target.width as f32,
                self.target.height as f32,
                0.0,
                1.0,
            );
            r_pass.set_pipeline(match kind {
                PassKind::Depth => &self.pipelines.depth,
                PassKind::Color => &self.pipelines.main,
            });

            for (index, draw) in draws.iter().enumerate() {
                let Some(vbuf) = binding.slot(draw.slot).and_then(|s| s.vbuf.as_ref()) else {
                    continue;
                };
                r_pass.set_bind_group(0, self.uniforms.bind_group(), &[self.uniforms.offset(index)]);
                r_pass.set_vertex_buffer(0, vbuf.slice(..));
                r_pass.draw(0..draw.vertex_count, 0..1);
            }
        }

        match kind {
            PassKind::Depth => self.readback.copy_depth(encoder, &self.target),
            PassKind::Color => self.readback.copy_color(encoder, &self.target),
        }
    }

    pub fn read_depth(&self, device: &Device, out: &mut [f32]) -> Result<()> {
        self.readback.read_depth(device, out)
    }

    pub fn read_rgb(&self, device: &Device, out: &mut [u8]) -> Result<()> {
        self.readback.read_rgb(device, out)
    }
}
