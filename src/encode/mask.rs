//! Noise-mask cell statistics.
//!
//! The cropped 256x48 strip is tiled into 8 radial x 32 angular cells of
//! 6x8 px, one per sampling-grid position. A cell whose intensity spread is
//! too flat (eyelid, sclera washout) or whose mean sits near either end of
//! the range (pupil spill, specular glare) carries no usable texture, so
//! its phase bits are masked out across every filter.

use super::template::{GRID_COLS, GRID_ROWS};
use crate::image::{GrayBuffer, ImageView};
use serde::Deserialize;

/// Cell height in strip pixels (radial direction).
pub const CELL_HEIGHT: usize = 6;
/// Cell width in strip pixels (angular direction).
pub const CELL_WIDTH: usize = 8;

#[derive(Clone, Debug, Deserialize)]
pub struct NoiseMaskOptions {
    /// Minimum per-cell standard deviation.
    pub min_std: f32,
    /// Minimum per-cell mean intensity.
    pub min_mean: f32,
    /// Maximum per-cell mean intensity.
    pub max_mean: f32,
}

impl Default for NoiseMaskOptions {
    fn default() -> Self {
        Self {
            min_std: 12.0,
            min_mean: 25.0,
            max_mean: 240.0,
        }
    }
}

/// Per-cell validity over the cropped strip, row-major
/// (`GRID_ROWS` x `GRID_COLS` entries).
pub fn noise_cell_validity(cropped: &GrayBuffer, options: &NoiseMaskOptions) -> Vec<bool> {
    assert_eq!(cropped.width(), GRID_COLS * CELL_WIDTH);
    assert_eq!(cropped.height(), GRID_ROWS * CELL_HEIGHT);

    let mut validity = Vec::with_capacity(GRID_ROWS * GRID_COLS);
    for row in 0..GRID_ROWS {
        for col in 0..GRID_COLS {
            let (mean, std) = cell_stats(cropped, row, col);
            let valid = std >= options.min_std && mean >= options.min_mean && mean <= options.max_mean;
            validity.push(valid);
        }
    }
    validity
}

/// Fraction of valid cells; the occlusion quality sub-score reads this
/// directly as a percentage.
pub fn valid_cell_fraction(cropped: &GrayBuffer, options: &NoiseMaskOptions) -> f32 {
    let validity = noise_cell_validity(cropped, options);
    let valid = validity.iter().filter(|&&v| v).count();
    valid as f32 / validity.len() as f32
}

fn cell_stats(cropped: &GrayBuffer, row: usize, col: usize) -> (f32, f32) {
    let y0 = row * CELL_HEIGHT;
    let x0 = col * CELL_WIDTH;
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for y in y0..y0 + CELL_HEIGHT {
        let row_px = &cropped.row(y)[x0..x0 + CELL_WIDTH];
        for &px in row_px {
            let v = px as f64;
            sum += v;
            sum_sq += v * v;
        }
    }
    let n = (CELL_HEIGHT * CELL_WIDTH) as f64;
    let mean = sum / n;
    let variance = (sum_sq / n - mean * mean).max(0.0);
    (mean as f32, variance.sqrt() as f32)
}
