//! Per-frame quality scoring.
//!
//! Five sub-scores, each mapped to [0, 100], weighted into a composite that
//! drives burst frame selection:
//!
//! | sub-score  | measurement                                        | weight |
//! |------------|----------------------------------------------------|--------|
//! | sharpness  | Laplacian variance over the iris bounding box      | 0.40   |
//! | occlusion  | valid noise-mask cells on the cropped strip        | 0.25   |
//! | specular   | saturated-pixel fraction in the iris bounding box  | 0.15   |
//! | centering  | iris centre offset from the image centre           | 0.10   |
//! | resolution | iris radius                                        | 0.10   |

use crate::encode::{prepare_strip, valid_cell_fraction, NoiseMaskOptions};
use crate::image::{GrayBuffer, ImageView};
use crate::normalize::PolarStrip;
use crate::preprocess::{laplacian_variance, ClaheOptions};
use crate::types::{QualityScore, Segmentation};
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct QualityOptions {
    /// Laplacian variance mapped to sharpness 0 and 100.
    pub sharpness_floor: f32,
    pub sharpness_ceil: f32,
    /// Intensity above which a pixel counts as specular glare.
    pub specular_threshold: u8,
    /// Iris radii mapped to resolution 0 and 100.
    pub resolution_floor: f32,
    pub resolution_ceil: f32,
    /// Strip preparation mirrors the encoder so occlusion sees the same data.
    pub clahe: ClaheOptions,
    pub noise: NoiseMaskOptions,
}

impl Default for QualityOptions {
    fn default() -> Self {
        Self {
            sharpness_floor: 30.0,
            sharpness_ceil: 200.0,
            specular_threshold: 230,
            resolution_floor: 40.0,
            resolution_ceil: 100.0,
            clahe: ClaheOptions::default(),
            noise: NoiseMaskOptions::default(),
        }
    }
}

const WEIGHT_SHARPNESS: f32 = 0.40;
const WEIGHT_OCCLUSION: f32 = 0.25;
const WEIGHT_SPECULAR: f32 = 0.15;
const WEIGHT_CENTERING: f32 = 0.10;
const WEIGHT_RESOLUTION: f32 = 0.10;

/// Score one preprocessed frame with its segmentation and normalized strip.
pub fn score_frame(
    image: &GrayBuffer,
    segmentation: &Segmentation,
    strip: &PolarStrip,
    options: &QualityOptions,
) -> QualityScore {
    let roi = segmentation
        .iris
        .bounding_box(image.width(), image.height());

    let variance = laplacian_variance(image.as_view(), roi);
    let sharpness = linear_score(variance, options.sharpness_floor, options.sharpness_ceil);

    let cropped = prepare_strip(strip, &options.clahe);
    let occlusion = (valid_cell_fraction(&cropped, &options.noise) * 100.0).clamp(0.0, 100.0);

    let specular = specular_score(image, segmentation, options.specular_threshold);

    let width = image.width() as f32;
    let dx = segmentation.iris.center.x - width * 0.5;
    let dy = segmentation.iris.center.y - image.height() as f32 * 0.5;
    let offset = (dx * dx + dy * dy).sqrt();
    let centering = ((1.0 - offset / (0.3 * width)) * 100.0).clamp(0.0, 100.0);

    let resolution = linear_score(
        segmentation.iris.radius,
        options.resolution_floor,
        options.resolution_ceil,
    );

    let composite = WEIGHT_SHARPNESS * sharpness
        + WEIGHT_OCCLUSION * occlusion
        + WEIGHT_SPECULAR * specular
        + WEIGHT_CENTERING * centering
        + WEIGHT_RESOLUTION * resolution;

    QualityScore {
        sharpness,
        occlusion,
        specular,
        centering,
        resolution,
        composite,
    }
}

fn linear_score(value: f32, floor: f32, ceil: f32) -> f32 {
    (((value - floor) / (ceil - floor)) * 100.0).clamp(0.0, 100.0)
}

fn specular_score(image: &GrayBuffer, segmentation: &Segmentation, threshold: u8) -> f32 {
    let roi = segmentation
        .iris
        .bounding_box(image.width(), image.height());
    if roi.w == 0 || roi.h == 0 {
        return 0.0;
    }
    let view = image.as_view().crop(roi);
    let mut bright = 0usize;
    for y in 0..view.h {
        let row = view.row(y);
        bright += row.iter().filter(|&&px| px > threshold).count();
    }
    let fraction = bright as f32 / (view.w * view.h) as f32;
    (((0.15 - fraction) / 0.14) * 100.0).clamp(0.0, 100.0)
}
