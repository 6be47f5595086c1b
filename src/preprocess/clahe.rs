//! Contrast-limited adaptive histogram equalization.
//!
//! The image is divided into a square grid of tiles; each tile gets a
//! clipped-histogram equalization mapping, and every output pixel blends the
//! mappings of its four surrounding tiles bilinearly. Clipping caps how much
//! any single intensity can be stretched, which keeps sensor noise in dark
//! iris regions from exploding.

use crate::image::{GrayBuffer, ImageView, ImageViewMut};
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct ClaheOptions {
    /// Contrast limit relative to the uniform histogram level.
    pub clip_limit: f32,
    /// Tiles per axis (`tiles` x `tiles` grid).
    pub tiles: usize,
}

impl Default for ClaheOptions {
    fn default() -> Self {
        Self {
            clip_limit: 2.0,
            tiles: 8,
        }
    }
}

/// Equalize `src` with clip-limited per-tile histograms.
pub fn clahe(src: &GrayBuffer, options: &ClaheOptions) -> GrayBuffer {
    let (w, h) = (src.width(), src.height());
    let tiles = options.tiles.max(1);
    if w == 0 || h == 0 {
        return src.clone();
    }

    let tile_w = w.div_ceil(tiles);
    let tile_h = h.div_ceil(tiles);
    let luts = build_tile_luts(src, tiles, tile_w, tile_h, options.clip_limit);

    let mut out = GrayBuffer::new(w, h);
    for y in 0..h {
        // Fractional tile coordinate of the pixel relative to tile centres.
        let gy = (y as f32 - tile_h as f32 * 0.5) / tile_h as f32;
        let ty0 = gy.floor().max(0.0) as usize;
        let ty1 = (ty0 + 1).min(tiles - 1);
        let fy = (gy - gy.floor()).clamp(0.0, 1.0);
        let fy = if gy < 0.0 { 0.0 } else { fy };

        let src_row = src.row(y);
        let dst_row = out.row_mut(y);
        for (x, dst_px) in dst_row.iter_mut().enumerate() {
            let gx = (x as f32 - tile_w as f32 * 0.5) / tile_w as f32;
            let tx0 = gx.floor().max(0.0) as usize;
            let tx1 = (tx0 + 1).min(tiles - 1);
            let fx = (gx - gx.floor()).clamp(0.0, 1.0);
            let fx = if gx < 0.0 { 0.0 } else { fx };

            let v = src_row[x] as usize;
            let tl = luts[ty0 * tiles + tx0][v] as f32;
            let tr = luts[ty0 * tiles + tx1][v] as f32;
            let bl = luts[ty1 * tiles + tx0][v] as f32;
            let br = luts[ty1 * tiles + tx1][v] as f32;
            let top = tl * (1.0 - fx) + tr * fx;
            let bot = bl * (1.0 - fx) + br * fx;
            *dst_px = (top * (1.0 - fy) + bot * fy).round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

fn build_tile_luts(
    src: &GrayBuffer,
    tiles: usize,
    tile_w: usize,
    tile_h: usize,
    clip_limit: f32,
) -> Vec<[u8; 256]> {
    let (w, h) = (src.width(), src.height());
    let mut luts = Vec::with_capacity(tiles * tiles);
    for ty in 0..tiles {
        let y0 = (ty * tile_h).min(h);
        let y1 = ((ty + 1) * tile_h).min(h);
        for tx in 0..tiles {
            let x0 = (tx * tile_w).min(w);
            let x1 = ((tx + 1) * tile_w).min(w);

            let mut hist = [0u32; 256];
            for y in y0..y1 {
                let row = src.row(y);
                for &px in &row[x0..x1] {
                    hist[px as usize] += 1;
                }
            }
            let area = ((y1 - y0) * (x1 - x0)).max(1) as u32;
            luts.push(equalization_lut(&mut hist, area, clip_limit));
        }
    }
    luts
}

fn equalization_lut(hist: &mut [u32; 256], area: u32, clip_limit: f32) -> [u8; 256] {
    // Clip at `clip_limit` times the uniform level and redistribute the
    // excess evenly over all bins.
    let limit = ((clip_limit * area as f32 / 256.0).max(1.0)) as u32;
    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }
    let bonus = excess / 256;
    let mut residual = (excess % 256) as usize;
    for bin in hist.iter_mut() {
        *bin += bonus;
        if residual > 0 {
            *bin += 1;
            residual -= 1;
        }
    }

    let scale = 255.0 / area as f32;
    let mut lut = [0u8; 256];
    let mut cdf = 0u32;
    for (i, out) in lut.iter_mut().enumerate() {
        cdf += hist[i];
        *out = (cdf as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_dimensions_match_input() {
        let src = GrayBuffer::from_raw(64, 48, vec![100u8; 64 * 48]);
        let out = clahe(&src, &ClaheOptions::default());
        assert_eq!(out.width(), 64);
        assert_eq!(out.height(), 48);
    }

    #[test]
    fn flat_image_stays_nearly_flat() {
        // A constant image maps every pixel through the same CDF step.
        let src = GrayBuffer::from_raw(64, 64, vec![90u8; 64 * 64]);
        let out = clahe(&src, &ClaheOptions::default());
        let first = out.get(0, 0);
        for y in 0..64 {
            for x in 0..64 {
                assert_eq!(out.get(x, y), first);
            }
        }
    }

    #[test]
    fn stretches_low_contrast_ramp() {
        let mut src = GrayBuffer::new(128, 128);
        for y in 0..128 {
            for x in 0..128 {
                // Values squeezed into [100, 131]
                src.set(x, y, (100 + (x / 4)) as u8);
            }
        }
        let out = clahe(&src, &ClaheOptions::default());
        let mut min = 255u8;
        let mut max = 0u8;
        for y in 0..128 {
            for x in 0..128 {
                min = min.min(out.get(x, y));
                max = max.max(out.get(x, y));
            }
        }
        let (in_range, out_range) = (31u8, max.saturating_sub(min));
        assert!(
            out_range > in_range,
            "contrast not stretched: {} <= {}",
            out_range,
            in_range
        );
    }
}
