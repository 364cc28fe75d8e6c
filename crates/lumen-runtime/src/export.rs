//! Conversion of raw readback rows (bottom scanline first) into top-down
//! row-major output buffers.

/// `out[h][w] = raw[height - 1 - h][w]` over `width * height` depth values.
pub fn flip_depth(raw: &[f32], width: usize, height: usize, out: &mut [f32]) {
    debug_assert_eq!(raw.len(), width * height);
    debug_assert_eq!(out.len(), width * height);
    for (h, dst) in out.chunks_exact_mut(width).enumerate().take(height) {
        let src = (height - 1 - h) * width;
        dst.copy_from_slice(&raw[src..src + width]);
    }
}

/// Same flip over RGB triples, widening each channel into `T`.
pub fn flip_rgb<T>(raw: &[u8], width: usize, height: usize, out: &mut [T])
where
    T: From<u8> + Copy,
{
    let row = width * 3;
    debug_assert_eq!(raw.len(), row * height);
    debug_assert_eq!(out.len(), row * height);
    for (h, dst) in out.chunks_exact_mut(row).enumerate().take(height) {
        let src = (height - 1 - h) * row;
        for (d, &s) in dst.iter_mut().zip(&raw[src..src + row]) {
            *d = T::from(s);
        }
    }
}
