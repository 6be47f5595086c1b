//! Asymmetric Gabor filter bank.
//!
//! Eight kernels: the cross-product of 4 orientations {0, π/4, π/2, 3π/4}
//! and 2 wavelengths {6, 12} px, each realized as a quadrature pair
//! (ψ = 0 for the real part, ψ = π/2 for the imaginary part). The kernels
//! are 5 rows x 15 columns: narrow radially to avoid eyelid bleed, wide
//! angularly to capture crypts and furrows along the strip.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

pub const KERNEL_ROWS: usize = 5;
pub const KERNEL_COLS: usize = 15;

const ORIENTATIONS: [f64; 4] = [0.0, PI / 4.0, FRAC_PI_2, 3.0 * PI / 4.0];
const WAVELENGTHS: [f64; 2] = [6.0, 12.0];
const ASPECT_RATIO: f64 = 0.5;

pub type Kernel = [[f64; KERNEL_COLS]; KERNEL_ROWS];

/// Quadrature pair of one bank entry.
#[derive(Clone, Debug)]
pub struct GaborPair {
    pub real: Kernel,
    pub imag: Kernel,
}

/// Build the 8-filter bank, orientation-major.
pub fn filter_bank() -> Vec<GaborPair> {
    let mut bank = Vec::with_capacity(ORIENTATIONS.len() * WAVELENGTHS.len());
    for &theta in &ORIENTATIONS {
        for &lambda in &WAVELENGTHS {
            bank.push(GaborPair {
                real: gabor_kernel(theta, lambda, 0.0),
                imag: gabor_kernel(theta, lambda, FRAC_PI_2),
            });
        }
    }
    bank
}

fn gabor_kernel(theta: f64, lambda: f64, psi: f64) -> Kernel {
    let sigma = lambda / 2.0;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let gamma_sq = ASPECT_RATIO * ASPECT_RATIO;
    let (sin_t, cos_t) = theta.sin_cos();

    let half_rows = (KERNEL_ROWS / 2) as i32;
    let half_cols = (KERNEL_COLS / 2) as i32;
    let mut kernel = [[0.0; KERNEL_COLS]; KERNEL_ROWS];
    for (ky, row) in kernel.iter_mut().enumerate() {
        let y = (ky as i32 - half_rows) as f64;
        for (kx, tap) in row.iter_mut().enumerate() {
            let x = (kx as i32 - half_cols) as f64;
            let xp = x * cos_t + y * sin_t;
            let yp = -x * sin_t + y * cos_t;
            let envelope = (-(xp * xp + gamma_sq * yp * yp) / two_sigma_sq).exp();
            *tap = envelope * (TAU * xp / lambda + psi).cos();
        }
    }
    kernel
}
