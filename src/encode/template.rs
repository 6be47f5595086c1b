//! Binary iris template: bit layout and the float-encoded wire form.

use serde::{Deserialize, Serialize};

/// Gabor filters in the bank.
pub const FILTER_COUNT: usize = 8;
/// Radial sampling-grid rows.
pub const GRID_ROWS: usize = 8;
/// Angular sampling-grid columns.
pub const GRID_COLS: usize = 32;
/// Phase bits per sample (real sign, imaginary sign).
pub const PHASE_BITS: usize = 2;
/// Bits in the code half (and the mask half).
pub const CODE_BITS: usize = FILTER_COUNT * GRID_ROWS * GRID_COLS * PHASE_BITS;
/// Total template length: code half followed by mask half.
pub const TEMPLATE_LEN: usize = 2 * CODE_BITS;

/// Flat bit index for (filter, grid row, grid column, phase bit).
///
/// Filter blocks are outermost, columns vary fastest inside a row, and the
/// (real, imag) phase pair is contiguous. A column shift therefore rotates
/// every filter's response with the same stride arithmetic.
#[inline]
pub fn bit_index(filter: usize, row: usize, col: usize, phase: usize) -> usize {
    ((filter * GRID_ROWS + row) * GRID_COLS + col) * PHASE_BITS + phase
}

/// An IrisCode: 4096 phase bits plus a 4096-bit occlusion mask, encoded as
/// 0.0/1.0 floats for repository compatibility.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Template {
    values: Vec<f32>,
}

impl Template {
    /// Assemble from code and mask bit vectors of [`CODE_BITS`] each.
    pub fn from_bits(code: &[bool], mask: &[bool]) -> Self {
        assert_eq!(code.len(), CODE_BITS);
        assert_eq!(mask.len(), CODE_BITS);
        let mut values = Vec::with_capacity(TEMPLATE_LEN);
        values.extend(code.iter().map(|&b| if b { 1.0 } else { 0.0 }));
        values.extend(mask.iter().map(|&b| if b { 1.0 } else { 0.0 }));
        Self { values }
    }

    /// Wrap a raw float vector (e.g. a repository template). Accepts any
    /// even length of at least 2 so legacy records stay readable.
    pub fn from_values(values: Vec<f32>) -> Result<Self, String> {
        if values.len() < 2 || values.len() % 2 != 0 {
            return Err(format!("invalid template length {}", values.len()));
        }
        Ok(Self { values })
    }

    pub fn from_f64(values: &[f64]) -> Result<Self, String> {
        Self::from_values(values.iter().map(|&v| v as f32).collect())
    }

    pub fn to_f64(&self) -> Vec<f64> {
        self.values.iter().map(|&v| v as f64).collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First half: the phase code.
    pub fn code(&self) -> &[f32] {
        &self.values[..self.values.len() / 2]
    }

    /// Second half: the validity mask (1.0 = usable bit).
    pub fn mask(&self) -> &[f32] {
        &self.values[self.values.len() / 2..]
    }

    /// Fraction of mask bits that are valid.
    pub fn valid_fraction(&self) -> f32 {
        let mask = self.mask();
        if mask.is_empty() {
            return 0.0;
        }
        let set = mask.iter().filter(|&&v| v >= 0.5).count();
        set as f32 / mask.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_constants_are_consistent() {
        assert_eq!(CODE_BITS, 4096);
        assert_eq!(TEMPLATE_LEN, 8192);
        // Each filter contributes exactly 512 bits.
        assert_eq!(CODE_BITS / FILTER_COUNT, 512);
    }

    #[test]
    fn bit_index_orders_filter_row_col_phase() {
        assert_eq!(bit_index(0, 0, 0, 0), 0);
        assert_eq!(bit_index(0, 0, 0, 1), 1);
        assert_eq!(bit_index(0, 0, 1, 0), 2);
        assert_eq!(bit_index(0, 1, 0, 0), GRID_COLS * PHASE_BITS);
        assert_eq!(bit_index(1, 0, 0, 0), GRID_ROWS * GRID_COLS * PHASE_BITS);
        assert_eq!(
            bit_index(FILTER_COUNT - 1, GRID_ROWS - 1, GRID_COLS - 1, PHASE_BITS - 1),
            CODE_BITS - 1
        );
    }

    #[test]
    fn halves_and_valid_fraction() {
        let code = vec![true; CODE_BITS];
        let mut mask = vec![true; CODE_BITS];
        for m in mask.iter_mut().take(CODE_BITS / 4) {
            *m = false;
        }
        let template = Template::from_bits(&code, &mask);
        assert_eq!(template.len(), TEMPLATE_LEN);
        assert!(template.code().iter().all(|&v| v == 1.0));
        assert!((template.valid_fraction() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn rejects_odd_length() {
        assert!(Template::from_values(vec![1.0, 0.0, 1.0]).is_err());
        assert!(Template::from_values(vec![]).is_err());
    }
}
