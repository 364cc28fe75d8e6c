use std::sync::mpsc;

use anyhow::{Context, Result, ensure};
use wgpu::*;

use crate::target::RenderTarget;

/// `Rgba8Unorm`, `Depth32Float` and `R32Float` texels are all four bytes.
const BYTES_PER_TEXEL: u32 = 4;

/// Rounds a row size up to wgpu's copy alignment.
pub fn padded_bytes_per_row(unpadded: u32) -> u32 {
    unpadded.div_ceil(COPY_BYTES_PER_ROW_ALIGNMENT) * COPY_BYTES_PER_ROW_ALIGNMENT
}

/// Host-mappable staging buffer sized once for the target.
pub struct Readback {
    buffer: Buffer,
    width: u32,
    height: u32,
    padded_row: u32,
}

impl Readback {
    pub fn new(device: &Device, width: u32, height: u32) -> Self {
        let padded_row = padded_bytes_per_row(width * BYTES_PER_TEXEL);
        let buffer = device.create_buffer(&BufferDescriptor {
            label: Some("readback_staging"),
            size: padded_row as u64 * height as u64,
            usage: BufferUsages::COPY_DST | BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        Self {
            buffer,
            width,
            height,
            padded_row,
        }
    }

    fn copy(&self, encoder: &mut CommandEncoder, texture: &Texture, aspect: TextureAspect, extent: Extent3d) {
        encoder.copy_texture_to_buffer(
            TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: Origin3d::ZERO,
                aspect,
            },
            TexelCopyBufferInfo {
                buffer: &self.buffer,
                layout: TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(self.padded_row),
                    rows_per_image: Some(self.height),
                },
            },
            extent,
        );
    }

    pub fn copy_color(&self, encoder: &mut CommandEncoder, target: &RenderTarget) {
        self.copy(encoder, &target.color, TextureAspect::All, target.extent());
    }

    /// Copies the depth pass's values, from the depth attachment or from the
    /// `R32Float` target depending on the target's [`crate::DepthReadMode`].
    pub fn copy_depth(&self, encoder: &mut CommandEncoder, target: &RenderTarget) {
        match &target.depth_values {
            Some((texture, _)) => self.copy(encoder, texture, TextureAspect::All, target.extent()),
            None => self.copy(encoder, &target.depth, TextureAspect::DepthOnly, target.extent()),
        }
    }

    /// Maps the staging buffer, blocks until the GPU is done and hands each
    /// unpadded row to `sink` in buffer order.
    fn read_rows<F>(&self, device: &Device, mut sink: F) -> Result<()>
    where
        F: FnMut(usize, &[u8]),
    {
        let slice = self.buffer.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device
            .poll(PollType::wait_indefinitely())
            .context("failed to wait for readback")?;
        rx.recv()
            .context("readback callback was dropped")?
            .context("failed to map readback buffer")?;

        {
            let data = slice.get_mapped_range();
            let row_bytes = (self.width * BYTES_PER_TEXEL) as usize;
            for (row, chunk) in data.chunks_exact(self.padded_row as usize).enumerate() {
                sink(row, &chunk[..row_bytes]);
            }
        }
        self.buffer.unmap();
        Ok(())
    }

    /// Reads depth texels into `out` (`width * height` floats, raw row order).
    pub fn read_depth(&self, device: &Device, out: &mut [f32]) -> Result<()> {
        let width = self.width as usize;
        ensure!(
            out.len() == width * self.height as usize,
            "depth buffer holds {} values, expected {}",
            out.len(),
            width * self.height as usize
        );
        self.read_rows(device, |row, bytes| {
            let dst = &mut out[row * width..(row + 1) * width];
            unpack_depth_row(bytes, dst);
        })
    }

    /// Reads color texels into `out` as RGB (`width * height * 3` bytes, raw row order).
    pub fn read_rgb(&self, device: &Device, out: &mut [u8]) -> Result<()> {
        let row_len = self.width as usize * 3;
        ensure!(
            out.len() == row_len * self.height as usize,
            "color buffer holds {} bytes, expected {}",
            out.len(),
            row_len * self.height as usize
        );
        self.read_rows(device, |row, bytes| {
            let dst = &mut out[row * row_len..(row + 1) * row_len];
            unpack_rgb_row(bytes, dst);
        })
    }
}

fn unpack_depth_row(bytes: &[u8], dst: &mut [f32]) {
    for (texel, value) in bytes.chunks_exact(4).zip(dst.iter_mut()) {
        *value = f32::from_ne_bytes([texel[0], texel[1], texel[2], texel[3]]);
    }
}

fn unpack_rgb_row(bytes: &[u8], dst: &mut [u8]) {
    for (rgba, rgb) in bytes.chunks_exact(4).zip(dst.chunks_exact_mut(3)) {
        rgb.copy_from_slice(&rgba[..3]);
    }
}
