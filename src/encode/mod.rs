//! IrisCode encoder.
//!
//! Overview
//! - CLAHE re-equalizes the normalized strip, then the top and bottom 8 rows
//!   (the eyelid zone) are cropped away, leaving 256x48.
//! - The crop is padded (circular wrap along the angular axis, replicate
//!   along the radial axis) and cast to double precision.
//! - Each of the 8 Gabor quadrature pairs is evaluated on a 32x8 sampling
//!   grid (angular step 8, radial step 6); the signs of the real and
//!   imaginary responses become the two phase bits of the sample.
//! - The mask drops samples in flat/over- or under-exposed cells (noise
//!   mask, shared across filters) and samples whose response magnitude sits
//!   in the per-filter dead zone where phase is unreliable.
//! - Encoding fails when fewer than 55% of mask bits survive.
//!
//! The encoder is deterministic: the same strip always yields a bitwise
//! identical template.

mod gabor;
mod mask;
mod template;

pub use gabor::{filter_bank, GaborPair, KERNEL_COLS, KERNEL_ROWS};
pub use mask::{noise_cell_validity, valid_cell_fraction, NoiseMaskOptions, CELL_HEIGHT, CELL_WIDTH};
pub use template::{
    bit_index, Template, CODE_BITS, FILTER_COUNT, GRID_COLS, GRID_ROWS, PHASE_BITS, TEMPLATE_LEN,
};

use crate::error::FrameError;
use crate::image::{GrayBuffer, ImageView, ImageViewMut};
use crate::normalize::{PolarStrip, STRIP_HEIGHT, STRIP_WIDTH};
use crate::preprocess::{clahe, ClaheOptions};
use log::debug;
use rayon::prelude::*;
use serde::Deserialize;

/// Rows removed from the top and bottom of the strip before filtering.
pub const EYELID_CROP_ROWS: usize = 8;
/// Height of the cropped strip.
pub const CROPPED_HEIGHT: usize = STRIP_HEIGHT - 2 * EYELID_CROP_ROWS;

/// Angular distance between grid columns, strip pixels.
pub const COL_STEP: usize = STRIP_WIDTH / GRID_COLS;
/// Radial distance between grid rows, strip pixels.
pub const ROW_STEP: usize = CROPPED_HEIGHT / GRID_ROWS;

#[derive(Clone, Debug, Deserialize)]
pub struct EncodeOptions {
    pub clahe: ClaheOptions,
    pub noise: NoiseMaskOptions,
    /// Fraction of the per-filter peak magnitude below which phase is
    /// considered unreliable.
    pub dead_zone_ratio: f32,
    /// Minimum overall mask valid fraction.
    pub min_valid_fraction: f32,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            clahe: ClaheOptions::default(),
            noise: NoiseMaskOptions::default(),
            dead_zone_ratio: 0.12,
            min_valid_fraction: 0.55,
        }
    }
}

/// CLAHE the strip and crop the eyelid zone; shared with the occlusion
/// quality sub-score so both observe identical statistics.
pub fn prepare_strip(strip: &PolarStrip, clahe_options: &ClaheOptions) -> GrayBuffer {
    let equalized = clahe(strip.image(), clahe_options);
    let mut cropped = GrayBuffer::new(STRIP_WIDTH, CROPPED_HEIGHT);
    for y in 0..CROPPED_HEIGHT {
        let src = equalized.row(y + EYELID_CROP_ROWS);
        cropped.row_mut(y).copy_from_slice(src);
    }
    cropped
}

/// Encode a normalized strip into an IrisCode template.
pub fn encode_strip(strip: &PolarStrip, options: &EncodeOptions) -> Result<Template, FrameError> {
    let cropped = prepare_strip(strip, &options.clahe);
    let padded = PaddedStrip::from_cropped(&cropped);
    let bank = filter_bank();

    let blocks: Vec<FilterBlock> = bank
        .par_iter()
        .map(|pair| filter_block(&padded, pair))
        .collect();

    let mut code = vec![false; CODE_BITS];
    let mut mask_bits = vec![true; CODE_BITS];

    for (filter, block) in blocks.iter().enumerate() {
        // Dead zone relative to this filter's strongest response.
        let peak = block
            .magnitudes
            .iter()
            .cloned()
            .fold(0.0f64, f64::max);
        let dead = peak * options.dead_zone_ratio as f64;
        for row in 0..GRID_ROWS {
            for col in 0..GRID_COLS {
                let sample = row * GRID_COLS + col;
                code[bit_index(filter, row, col, 0)] = block.real_sign[sample];
                code[bit_index(filter, row, col, 1)] = block.imag_sign[sample];
                if block.magnitudes[sample] < dead {
                    mask_bits[bit_index(filter, row, col, 0)] = false;
                    mask_bits[bit_index(filter, row, col, 1)] = false;
                }
            }
        }
    }

    // Cells without usable texture are dropped across every filter.
    let validity = noise_cell_validity(&cropped, &options.noise);
    for row in 0..GRID_ROWS {
        for col in 0..GRID_COLS {
            if validity[row * GRID_COLS + col] {
                continue;
            }
            for filter in 0..FILTER_COUNT {
                mask_bits[bit_index(filter, row, col, 0)] = false;
                mask_bits[bit_index(filter, row, col, 1)] = false;
            }
        }
    }

    let template = Template::from_bits(&code, &mask_bits);
    let valid_fraction = template.valid_fraction();
    if valid_fraction < options.min_valid_fraction {
        debug!("encode_strip gated: valid fraction {valid_fraction:.3}");
        return Err(FrameError::EncodingTooNoisy {
            valid_fraction,
            gate: options.min_valid_fraction,
        });
    }
    debug!("encode_strip ok: valid fraction {valid_fraction:.3}");
    Ok(template)
}

/// Double-precision strip with circular angular and replicate radial padding
/// already applied, indexed in cropped coordinates.
struct PaddedStrip {
    data: Vec<f64>,
    width: usize,
}

const PAD_COLS: usize = KERNEL_COLS / 2;
const PAD_ROWS: usize = KERNEL_ROWS / 2;

impl PaddedStrip {
    fn from_cropped(cropped: &GrayBuffer) -> Self {
        let width = STRIP_WIDTH + 2 * PAD_COLS;
        let height = CROPPED_HEIGHT + 2 * PAD_ROWS;
        let mut data = vec![0.0f64; width * height];
        for y in 0..height {
            let src_y = y.saturating_sub(PAD_ROWS).min(CROPPED_HEIGHT - 1);
            let src_row = cropped.row(src_y);
            let dst_row = &mut data[y * width..(y + 1) * width];
            for (x, dst) in dst_row.iter_mut().enumerate() {
                let src_x = (x + STRIP_WIDTH - PAD_COLS) % STRIP_WIDTH;
                *dst = src_row[src_x] as f64;
            }
        }
        Self { data, width }
    }

    /// Correlate one kernel with the window centred on cropped (row, col).
    #[inline]
    fn respond(&self, kernel: &gabor::Kernel, row: usize, col: usize) -> f64 {
        let mut sum = 0.0;
        for (ky, taps) in kernel.iter().enumerate() {
            let base = (row + ky) * self.width + col;
            let window = &self.data[base..base + KERNEL_COLS];
            for (tap, px) in taps.iter().zip(window.iter()) {
                sum += tap * px;
            }
        }
        sum
    }
}

struct FilterBlock {
    real_sign: Vec<bool>,
    imag_sign: Vec<bool>,
    magnitudes: Vec<f64>,
}

fn filter_block(padded: &PaddedStrip, pair: &GaborPair) -> FilterBlock {
    let samples = GRID_ROWS * GRID_COLS;
    let mut real_sign = Vec::with_capacity(samples);
    let mut imag_sign = Vec::with_capacity(samples);
    let mut magnitudes = Vec::with_capacity(samples);
    for row in 0..GRID_ROWS {
        for col in 0..GRID_COLS {
            let re = padded.respond(&pair.real, row * ROW_STEP, col * COL_STEP);
            let im = padded.respond(&pair.imag, row * ROW_STEP, col * COL_STEP);
            real_sign.push(re >= 0.0);
            imag_sign.push(im >= 0.0);
            magnitudes.push((re * re + im * im).sqrt());
        }
    }
    FilterBlock {
        real_sign,
        imag_sign,
        magnitudes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageViewMut;

    fn textured_polar_strip() -> PolarStrip {
        let mut img = GrayBuffer::new(STRIP_WIDTH, STRIP_HEIGHT);
        for y in 0..STRIP_HEIGHT {
            for x in 0..STRIP_WIDTH {
                let v = 130.0
                    + 55.0 * ((x as f32) * 0.35).sin()
                    + 30.0 * ((y as f32) * 0.8 + (x as f32) * 0.1).cos();
                img.set(x, y, v.clamp(0.0, 255.0) as u8);
            }
        }
        PolarStrip::from_image(img)
    }

    #[test]
    fn template_has_canonical_length() {
        let strip = textured_polar_strip();
        let template = encode_strip(&strip, &EncodeOptions::default()).expect("encode");
        assert_eq!(template.len(), TEMPLATE_LEN);
        assert!(template
            .code()
            .iter()
            .chain(template.mask().iter())
            .all(|&v| v == 0.0 || v == 1.0));
    }

    #[test]
    fn encoding_is_deterministic() {
        let strip = textured_polar_strip();
        let options = EncodeOptions::default();
        let a = encode_strip(&strip, &options).expect("encode a");
        let b = encode_strip(&strip, &options).expect("encode b");
        assert_eq!(a.code(), b.code());
        assert_eq!(a.mask(), b.mask());
    }

    #[test]
    fn flat_strip_is_gated() {
        let img = GrayBuffer::from_raw(
            STRIP_WIDTH,
            STRIP_HEIGHT,
            vec![128u8; STRIP_WIDTH * STRIP_HEIGHT],
        );
        let strip = PolarStrip::from_image(img);
        assert!(matches!(
            encode_strip(&strip, &EncodeOptions::default()),
            Err(FrameError::EncodingTooNoisy { .. })
        ));
    }

    #[test]
    fn dark_half_reduces_valid_fraction() {
        let mut img = textured_polar_strip().into_image();
        for y in 0..STRIP_HEIGHT {
            let row = img.row_mut(y);
            for px in row.iter_mut().take(STRIP_WIDTH / 2) {
                *px = 5;
            }
        }
        let strip = PolarStrip::from_image(img);
        match encode_strip(&strip, &EncodeOptions::default()) {
            Ok(template) => {
                assert!(template.valid_fraction() < 0.70);
            }
            Err(FrameError::EncodingTooNoisy { valid_fraction, .. }) => {
                assert!(valid_fraction < 0.55);
            }
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }
}
