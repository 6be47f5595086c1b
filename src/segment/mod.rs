//! Eye segmentation: locate the pupil and iris boundaries as two circles.
//!
//! Overview
//! - Median blur flattens iris texture while keeping the pupil and limbus
//!   edges intact.
//! - Two independent circular-Hough passes run over one shared Sobel
//!   gradient field: a pupil pass over small radii and an iris pass over
//!   large radii, each with its own edge threshold and vote gate.
//! - Users are instructed to centre the eye, so each pass keeps the
//!   candidate whose centre is closest to the image centre.
//! - The resulting pair must satisfy the containment and radius-ratio
//!   invariants before it is accepted.
//!
//! The quick-detect variant runs the same structure on a 320 px preview and
//! folds the geometry into a UI-facing [`IrisDetectionStatus`].

mod gradient;
mod hough;

pub use gradient::{sobel_gradients, Grad};
pub use hough::{find_circles, CircleCandidate, HoughCircleOptions};

use crate::error::FrameError;
use crate::image::{GrayBuffer, ImageF32};
use crate::preprocess::{laplacian_variance, median_blur};
use crate::types::{Circle, IrisDetectionStatus, Segmentation};
use log::debug;
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct SegmentOptions {
    pub median_ksize: usize,
    pub pupil: HoughCircleOptions,
    pub iris: HoughCircleOptions,
    /// Minimum acceptable iris radius in pixels of the analysed image.
    pub min_iris_radius: f32,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        // Calibrated at the 640 px canonical width.
        Self {
            median_ksize: 7,
            pupil: HoughCircleOptions {
                acc_ratio: 1.5,
                min_dist: 50.0,
                canny_upper: 100.0,
                acc_threshold: 40,
                r_min: 10.0,
                r_max: 80.0,
            },
            iris: HoughCircleOptions {
                acc_ratio: 1.5,
                min_dist: 100.0,
                canny_upper: 80.0,
                acc_threshold: 35,
                r_min: 60.0,
                r_max: 200.0,
            },
            min_iris_radius: 40.0,
        }
    }
}

impl SegmentOptions {
    /// Parameters for the 320 px quick-detect preview.
    pub fn preview() -> Self {
        Self {
            median_ksize: 7,
            pupil: HoughCircleOptions {
                acc_ratio: 1.5,
                min_dist: 25.0,
                canny_upper: 100.0,
                acc_threshold: 40,
                r_min: 5.0,
                r_max: 40.0,
            },
            iris: HoughCircleOptions {
                acc_ratio: 1.5,
                min_dist: 50.0,
                canny_upper: 80.0,
                acc_threshold: 35,
                r_min: 30.0,
                r_max: 100.0,
            },
            min_iris_radius: 30.0,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct QuickDetectOptions {
    pub segment: SegmentOptions,
    /// Iris radii below this read as "move closer".
    pub too_far_radius: f32,
    /// Iris radii above this read as "move back".
    pub too_close_radius: f32,
    /// Maximum centre offset on either axis, as a fraction of preview width.
    pub center_offset_frac: f32,
    /// Minimum Laplacian variance over the iris bounding box.
    pub min_sharpness: f32,
}

impl Default for QuickDetectOptions {
    fn default() -> Self {
        Self {
            segment: SegmentOptions::preview(),
            too_far_radius: 40.0,
            too_close_radius: 90.0,
            center_offset_frac: 0.3,
            min_sharpness: 30.0,
        }
    }
}

/// Segment a preprocessed eye image into a validated pupil/iris pair.
pub fn segment_eye(image: &GrayBuffer, options: &SegmentOptions) -> Result<Segmentation, FrameError> {
    let blurred = median_blur(image, options.median_ksize);
    let grad = sobel_gradients(&ImageF32::from_gray(&blurred));

    let pupil = best_candidate(&grad, &options.pupil, image.width(), image.height())
        .ok_or(FrameError::SegmentationFailed)?;
    let iris = best_candidate(&grad, &options.iris, image.width(), image.height())
        .ok_or(FrameError::SegmentationFailed)?;

    let segmentation = Segmentation { pupil, iris };
    if iris.radius < options.min_iris_radius || !segmentation.geometry_is_valid() {
        debug!(
            "segment_eye rejected pair: pupil=({:.1},{:.1},r={:.1}) iris=({:.1},{:.1},r={:.1})",
            pupil.center.x, pupil.center.y, pupil.radius, iris.center.x, iris.center.y, iris.radius
        );
        return Err(FrameError::SegmentationFailed);
    }
    debug!(
        "segment_eye ok: pupil r={:.1} iris r={:.1} ratio={:.2}",
        pupil.radius,
        iris.radius,
        segmentation.radius_ratio()
    );
    Ok(segmentation)
}

/// Classify a 320 px preview frame for the live-detection UI.
pub fn quick_detect(preview: &GrayBuffer, options: &QuickDetectOptions) -> IrisDetectionStatus {
    let segmentation = match segment_eye(preview, &options.segment) {
        Ok(seg) => seg,
        Err(_) => return IrisDetectionStatus::NotFound,
    };

    let iris = segmentation.iris;
    if iris.radius < options.too_far_radius {
        return IrisDetectionStatus::TooFar;
    }
    if iris.radius > options.too_close_radius {
        return IrisDetectionStatus::TooClose;
    }

    let width = preview.width() as f32;
    let max_offset = options.center_offset_frac * width;
    let dx = (iris.center.x - width * 0.5).abs();
    let dy = (iris.center.y - preview.height() as f32 * 0.5).abs();
    if dx > max_offset || dy > max_offset {
        return IrisDetectionStatus::NotCentered;
    }

    let roi = iris.bounding_box(preview.width(), preview.height());
    let variance = laplacian_variance(preview.as_view(), roi);
    if variance < options.min_sharpness {
        return IrisDetectionStatus::TooBlurry;
    }

    IrisDetectionStatus::Ready
}

/// Run one Hough pass and keep the candidate closest to the image centre.
fn best_candidate(
    grad: &Grad,
    options: &HoughCircleOptions,
    width: usize,
    height: usize,
) -> Option<Circle> {
    let candidates = find_circles(grad, options);
    let cx = width as f32 * 0.5;
    let cy = height as f32 * 0.5;
    candidates
        .into_iter()
        .map(|c| {
            let d2 = (c.circle.center.x - cx).powi(2) + (c.circle.center.y - cy).powi(2);
            (c, d2)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(c, _)| c.circle)
}
