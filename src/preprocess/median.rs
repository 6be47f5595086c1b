//! Sliding-histogram median filter.
//!
//! The segmenter runs a 7 px median before Hough voting: it flattens iris
//! texture and eyelash clutter while keeping the pupil and limbus edges
//! sharp, unlike a Gaussian which would smear them.

use crate::image::{GrayBuffer, ImageView, ImageViewMut};

/// Median blur with an odd `ksize` square window, border replicate.
pub fn median_blur(src: &GrayBuffer, ksize: usize) -> GrayBuffer {
    assert!(ksize % 2 == 1, "median kernel must be odd");
    let (w, h) = (src.width(), src.height());
    if w == 0 || h == 0 || ksize == 1 {
        return src.clone();
    }
    let r = ksize / 2;
    let padded = replicate_pad(src, r);
    let mut out = GrayBuffer::new(w, h);

    // Huang's algorithm: slide a window histogram along each row, keeping a
    // running count of pixels below the current median.
    let rank = (ksize * ksize) / 2;
    for y in 0..h {
        let mut hist = [0u32; 256];
        for wy in 0..ksize {
            let row = padded.row(y + wy);
            for &px in &row[0..ksize] {
                hist[px as usize] += 1;
            }
        }
        let mut median = 0usize;
        let mut below = 0u32;
        advance_median(&hist, &mut median, &mut below, rank as u32);
        out.set(0, y, median as u8);

        for x in 1..w {
            for wy in 0..ksize {
                let row = padded.row(y + wy);
                let gone = row[x - 1] as usize;
                let came = row[x + ksize - 1] as usize;
                hist[gone] -= 1;
                if gone < median {
                    below -= 1;
                }
                hist[came] += 1;
                if came < median {
                    below += 1;
                }
            }
            advance_median(&hist, &mut median, &mut below, rank as u32);
            out.set(x, y, median as u8);
        }
    }
    out
}

#[inline]
fn advance_median(hist: &[u32; 256], median: &mut usize, below: &mut u32, rank: u32) {
    while *below > rank {
        *median -= 1;
        *below -= hist[*median];
    }
    while *below + hist[*median] <= rank {
        *below += hist[*median];
        *median += 1;
    }
}

fn replicate_pad(src: &GrayBuffer, r: usize) -> GrayBuffer {
    let (w, h) = (src.width(), src.height());
    let mut out = GrayBuffer::new(w + 2 * r, h + 2 * r);
    for y in 0..h + 2 * r {
        let sy = y.saturating_sub(r).min(h - 1);
        let src_row = src.row(sy);
        let dst_row = out.row_mut(y);
        for (x, dst_px) in dst_row.iter_mut().enumerate() {
            let sx = x.saturating_sub(r).min(w - 1);
            *dst_px = src_row[sx];
        }
    }
    out
}
