//! Image preprocessor: canonical resize + contrast normalization.
//!
//! All downstream radii and thresholds are calibrated at a 640 px image
//! width (320 px for the quick-detect preview), so every frame first goes
//! through [`preprocess_frame`]: bilinear resize to the canonical width
//! followed by CLAHE. Color inputs are converted to luma at decode time
//! (`image::io`), the preprocessor itself only sees grayscale.
//!
//! The module also hosts the shared low-level measures used by segmentation
//! and quality scoring: median blur and Laplacian variance.

mod clahe;
mod median;

pub use clahe::{clahe, ClaheOptions};
pub use median::median_blur;

use crate::image::{GrayBuffer, ImageU8, ImageView, ImageViewMut};
use crate::types::Rect;
use serde::Deserialize;

/// Canonical width of the full pipeline.
pub const CANONICAL_WIDTH: usize = 640;
/// Width of the quick-detect preview.
pub const PREVIEW_WIDTH: usize = 320;

#[derive(Clone, Debug, Deserialize)]
pub struct PreprocessOptions {
    pub target_width: usize,
    pub clahe: ClaheOptions,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            target_width: CANONICAL_WIDTH,
            clahe: ClaheOptions::default(),
        }
    }
}

impl PreprocessOptions {
    /// Options for the 320 px quick-detect preview.
    pub fn preview() -> Self {
        Self {
            target_width: PREVIEW_WIDTH,
            ..Self::default()
        }
    }
}

/// Preprocessed frame plus the scale factor that was applied to reach the
/// canonical width.
#[derive(Clone, Debug)]
pub struct Preprocessed {
    pub image: GrayBuffer,
    pub scale: f32,
}

/// Resize to the canonical width and equalize contrast.
///
/// A frame already at the target width skips resampling, which keeps the
/// operation idempotent up to CLAHE's bounded numerical drift.
pub fn preprocess_frame(frame: &GrayBuffer, options: &PreprocessOptions) -> Preprocessed {
    let (resized, scale) = if frame.width() == options.target_width {
        (frame.clone(), 1.0)
    } else {
        resize_to_width(frame, options.target_width)
    };
    let image = clahe(&resized, &options.clahe);
    Preprocessed { image, scale }
}

/// Bilinear resize to `target_width`; height scales proportionally, rounded.
/// Returns the output and the applied scale factor.
pub fn resize_to_width(src: &GrayBuffer, target_width: usize) -> (GrayBuffer, f32) {
    assert!(target_width > 0 && src.width() > 0 && src.height() > 0);
    let scale = target_width as f32 / src.width() as f32;
    let target_height = ((src.height() as f32 * scale).round() as usize).max(1);
    let mut out = GrayBuffer::new(target_width, target_height);

    let x_ratio = src.width() as f32 / target_width as f32;
    let y_ratio = src.height() as f32 / target_height as f32;
    for y in 0..target_height {
        let sy = ((y as f32 + 0.5) * y_ratio - 0.5).max(0.0);
        let y0 = sy.floor() as usize;
        let y1 = (y0 + 1).min(src.height() - 1);
        let fy = sy - y0 as f32;
        let row0 = src.row(y0);
        let row1 = src.row(y1);
        let dst = out.row_mut(y);
        for (x, dst_px) in dst.iter_mut().enumerate() {
            let sx = ((x as f32 + 0.5) * x_ratio - 0.5).max(0.0);
            let x0 = sx.floor() as usize;
            let x1 = (x0 + 1).min(src.width() - 1);
            let fx = sx - x0 as f32;
            let top = row0[x0] as f32 * (1.0 - fx) + row0[x1] as f32 * fx;
            let bot = row1[x0] as f32 * (1.0 - fx) + row1[x1] as f32 * fx;
            *dst_px = (top * (1.0 - fy) + bot * fy).round().clamp(0.0, 255.0) as u8;
        }
    }
    (out, scale)
}

/// Variance of the 3x3 Laplacian response over `roi`.
///
/// The standard focus measure: low variance means few high-frequency
/// structures, i.e. a blurry crop.
pub fn laplacian_variance(image: ImageU8<'_>, roi: Rect) -> f32 {
    let view = image.crop(roi);
    if view.w < 3 || view.h < 3 {
        return 0.0;
    }
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let count = ((view.w - 2) * (view.h - 2)) as f64;
    for y in 1..view.h - 1 {
        for x in 1..view.w - 1 {
            let lap = view.get(x, y - 1) as f32
                + view.get(x - 1, y) as f32
                + view.get(x + 1, y) as f32
                + view.get(x, y + 1) as f32
                - 4.0 * view.get(x, y) as f32;
            sum += lap as f64;
            sum_sq += (lap * lap) as f64;
        }
    }
    let mean = sum / count;
    ((sum_sq / count) - mean * mean).max(0.0) as f32
}
