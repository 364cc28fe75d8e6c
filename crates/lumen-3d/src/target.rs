use wgpu::*;

use crate::depth::create_depth;

/// Plain unorm so readback bytes are the rendered values with no sRGB encode.
pub const COLOR_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;

/// Color format the depth pass writes fragment depth into when the depth
/// attachment itself cannot be copied to a buffer.
pub const DEPTH_VALUES_FORMAT: TextureFormat = TextureFormat::R32Float;

/// How the depth pass gets its values to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepthReadMode {
    /// Copy the `Depth32Float` attachment straight into the staging buffer.
    CopyAttachment,
    /// Write fragment depth into an `R32Float` color target and copy that.
    ColorTarget,
}

impl DepthReadMode {
    /// Picks the direct copy when the adapter supports depth texture copies
    /// (GL and other downlevel backends often do not).
    pub fn for_downlevel(flags: DownlevelFlags) -> Self {
        if flags.contains(DownlevelFlags::DEPTH_TEXTURE_AND_BUFFER_COPIES) {
            DepthReadMode::CopyAttachment
        } else {
            DepthReadMode::ColorTarget
        }
    }
}

fn color_texture(device: &Device, label: &str, format: TextureFormat, size: Extent3d) -> (Texture, TextureView) {
    let texture = device.create_texture(&TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format,
        usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&TextureViewDescriptor::default());
    (texture, view)
}

/// Off-screen color + depth attachments of a fixed size.
pub struct RenderTarget {
    pub color: Texture,
    pub color_view: TextureView,
    pub depth: Texture,
    pub depth_view: TextureView,
    /// Present in [`DepthReadMode::ColorTarget`] only.
    pub depth_values: Option<(Texture, TextureView)>,
    pub depth_read: DepthReadMode,
    pub width: u32,
    pub height: u32,
}

impl RenderTarget {
    pub fn new(device: &Device, width: u32, height: u32, depth_read: DepthReadMode) -> Self {
        let size = Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let (color, color_view) = color_texture(device, "target_color", COLOR_FORMAT, size);
        let (depth_view, depth) =
            create_depth(device, width, height, depth_read == DepthReadMode::CopyAttachment);
        let depth_values = match depth_read {
            DepthReadMode::CopyAttachment => None,
            DepthReadMode::ColorTarget => Some(color_texture(
                device,
                "target_depth_values",
                DEPTH_VALUES_FORMAT,
                size,
            )),
        };

        Self {
            color,
            color_view,
            depth,
            depth_view,
            depth_values,
            depth_read,
            width,
            height,
        }
    }

    pub fn extent(&self) -> Extent3d {
        Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}
