use std::num::NonZeroU64;

use wgpu::*;

use crate::depth::DEPTH_FORMAT;
use crate::model::Vertex;
use crate::target::{DEPTH_VALUES_FORMAT, DepthReadMode};
use crate::uniforms::ObjectUniforms;

const SHADER_SOURCE: &str = include_str!("shaders/main.wgsl");

pub struct Layouts {
    pub object_bgl: BindGroupLayout,
}

pub fn create_bind_group_layouts(device: &Device) -> Layouts {
    let object_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("object_bgl"),
        entries: &[BindGroupLayoutEntry {
            binding: 0,
            visibility: ShaderStages::VERTEX | ShaderStages::FRAGMENT,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: NonZeroU64::new(ObjectUniforms::SIZE),
            },
            count: None,
        }],
    });
    Layouts { object_bgl }
}

/// The two pipelines share one vertex stage, so depth values agree between
/// the depth pass and the color pass. In [`DepthReadMode::ColorTarget`] the
/// depth pipeline also writes fragment depth to an `R32Float` target.
pub struct Pipelines {
    pub depth: RenderPipeline,
    pub main: RenderPipeline,
}

fn primitive_state() -> PrimitiveState {
    PrimitiveState {
        topology: PrimitiveTopology::TriangleList,
        // Clip y is mirrored in the vertex stage, which flips screen-space winding.
        front_face: FrontFace::Cw,
        cull_mode: Some(Face::Back),
        ..Default::default()
    }
}

fn depth_state() -> DepthStencilState {
    DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: CompareFunction::Less,
        stencil: StencilState::default(),
        bias: DepthBiasState::default(),
    }
}

pub fn create_pipelines(
    device: &Device,
    layouts: &Layouts,
    color_format: TextureFormat,
    depth_read: DepthReadMode,
) -> Pipelines {
    let shader = device.create_shader_module(ShaderModuleDescriptor {
        label: Some("main_shader"),
        source: ShaderSource::Wgsl(SHADER_SOURCE.into()),
    });

    let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("object_pipeline_layout"),
        bind_group_layouts: &[&layouts.object_bgl],
        push_constant_ranges: &[],
    });

    let vertex = VertexState {
        module: &shader,
        entry_point: Some("vs_main"),
        compilation_options: PipelineCompilationOptions::default(),
        buffers: &[Vertex::layout()],
    };

    let depth_values_target = [Some(ColorTargetState {
        format: DEPTH_VALUES_FORMAT,
        blend: None,
        write_mask: ColorWrites::RED,
    })];
    let depth_fragment = match depth_read {
        DepthReadMode::CopyAttachment => None,
        DepthReadMode::ColorTarget => Some(FragmentState {
            module: &shader,
            entry_point: Some("fs_depth"),
            compilation_options: PipelineCompilationOptions::default(),
            targets: &depth_values_target,
        }),
    };

    let depth = device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("depth_pipeline"),
        layout: Some(&layout),
        vertex: vertex.clone(),
        fragment: depth_fragment,
        primitive: primitive_state(),
        depth_stencil: Some(depth_state()),
        multisample: MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    let main = device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("main_pipeline"),
        layout: Some(&layout),
        vertex,
        fragment: Some(FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: PipelineCompilationOptions::default(),
            targets: &[Some(ColorTargetState {
                format: color_format,
                blend: Some(BlendState::ALPHA_BLENDING),
                write_mask: ColorWrites::ALL,
            })],
        }),
        primitive: primitive_state(),
        depth_stencil: Some(depth_state()),
        multisample: MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    Pipelines { depth, main }
}
