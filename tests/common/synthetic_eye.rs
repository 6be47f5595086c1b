//! Synthetic eye images for end-to-end tests.
//!
//! Draws a dark pupil disk and a textured iris annulus on a bright sclera.
//! The texture is a sum of seeded angular harmonics, so two eyes with the
//! same seed share an identity while different seeds are strangers, and a
//! rotation offset models head tilt.

use iris_recognizer::image::GrayBuffer;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Clone, Debug)]
pub struct EyeParams {
    pub width: usize,
    pub height: usize,
    pub center: (f32, f32),
    pub pupil_r: f32,
    pub iris_r: f32,
    /// Identity of the iris texture.
    pub texture_seed: u64,
    /// Head-tilt rotation applied to the texture, degrees anticlockwise.
    pub rotation_deg: f32,
    /// Paint the top half of the iris black (eyelid stand-in).
    pub occlude_top: bool,
}

impl Default for EyeParams {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            center: (320.0, 240.0),
            pupil_r: 30.0,
            iris_r: 80.0,
            texture_seed: 7,
            rotation_deg: 0.0,
            occlude_top: false,
        }
    }
}

/// Base angular frequency, amplitude and radial modulation of the texture
/// harmonics. The seed jitters the frequencies and draws the phases, so
/// different seeds decorrelate even under the matcher's shift search.
const HARMONICS: [(u32, f32, f32); 4] = [
    (5, 26.0, 2.0),
    (9, 22.0, 5.0),
    (16, 18.0, 3.0),
    (27, 14.0, 8.0),
];

pub fn synthetic_eye(params: &EyeParams) -> GrayBuffer {
    let (cx, cy) = params.center;
    let rotation = params.rotation_deg.to_radians();
    let harmonics = texture_harmonics(params.texture_seed);

    let mut img = GrayBuffer::new(params.width, params.height);
    for y in 0..params.height {
        for x in 0..params.width {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let d = (dx * dx + dy * dy).sqrt();
            let v = if d <= params.pupil_r {
                18.0
            } else if d <= params.iris_r {
                if params.occlude_top && (y as f32) < cy {
                    0.0
                } else {
                    iris_texture(dy.atan2(dx), d, params, rotation, &harmonics)
                }
            } else {
                // Mild sclera gradient keeps the background from being
                // perfectly flat.
                196.0 + 12.0 * (x as f32 / params.width as f32)
            };
            img.set(x, y, v.clamp(0.0, 255.0) as u8);
        }
    }
    img
}

struct Harmonic {
    freq: f32,
    amp: f32,
    radial: f32,
    phase: f32,
}

fn iris_texture(
    angle: f32,
    d: f32,
    params: &EyeParams,
    rotation: f32,
    harmonics: &[Harmonic],
) -> f32 {
    let span = (params.iris_r - params.pupil_r).max(1.0);
    let t = (d - params.pupil_r) / span;
    let theta = angle - rotation;
    let mut v = 122.0;
    // Every harmonic is a gentle spiral (the radial term slants the crests),
    // so the texture never forms concentric rings that could compete with
    // the pupil and limbus boundaries in the Hough radius histogram.
    for h in harmonics {
        v += h.amp * (h.freq * theta + h.phase + h.radial * t).sin();
    }
    v
}

fn texture_harmonics(seed: u64) -> Vec<Harmonic> {
    let mut rng = StdRng::seed_from_u64(seed);
    HARMONICS
        .iter()
        .map(|&(base_freq, amp, radial)| Harmonic {
            // Integer frequencies keep the texture continuous across the
            // 0/2π wrap.
            freq: (base_freq + rng.gen_range(0..3)) as f32,
            amp,
            radial,
            phase: rng.gen::<f32>() * std::f32::consts::TAU,
        })
        .collect()
}

/// Additive Gaussian pixel noise via the 12-uniform approximation.
pub fn add_gaussian_noise(img: &mut GrayBuffer, sigma: f32, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    for y in 0..img.height() {
        for x in 0..img.width() {
            let n: f32 = (0..12).map(|_| rng.gen::<f32>()).sum::<f32>() - 6.0;
            let v = img.get(x, y) as f32 + n * sigma;
            img.set(x, y, v.clamp(0.0, 255.0) as u8);
        }
    }
}
