use wgpu::*;

pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// Depth attachment. `readable` adds `COPY_SRC` so the depth values can be
/// copied out directly, which needs `DEPTH_TEXTURE_AND_BUFFER_COPIES`.
pub fn create_depth(device: &Device, width: u32, height: u32, readable: bool) -> (TextureView, Texture) {
    let mut usage = TextureUsages::RENDER_ATTACHMENT;
    if readable {
        usage |= TextureUsages::COPY_SRC;
    }
    let depth_tex = device.create_texture(&TextureDescriptor {
        label: Some("depth"),
        size: Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage,
        view_formats: &[],
    });
    let depth_view = depth_tex.create_view(&TextureViewDescriptor::default());
    (depth_view, depth_tex)
}
