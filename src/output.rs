use anyhow::{Context, Result};
use image::{ImageBuffer, Luma, RgbImage};
use std::path::Path;

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    Ok(())
}

pub fn write_color_png(path: &Path, width: u32, height: u32, rgb: Vec<u8>) -> Result<()> {
    ensure_parent(path)?;
    let image = RgbImage::from_raw(width, height, rgb).context("color buffer size mismatch")?;
    image
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Stores depth in [0, 1] scaled to the full 16-bit range.
pub fn write_depth_png(path: &Path, width: u32, height: u32, depth: &[f32]) -> Result<()> {
    ensure_parent(path)?;
    let pixels = depth
        .iter()
        .map(|d| (d.clamp(0.0, 1.0) * u16::MAX as f32).round() as u16)
        .collect();
    let image: ImageBuffer<Luma<u16>, Vec<u16>> =
        ImageBuffer::from_raw(width, height, pixels).context("depth buffer size mismatch")?;
    image
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))
}
