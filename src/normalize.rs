//! Daugman rubber-sheet normalization.
//!
//! The annulus between the pupil and iris circles is unwrapped into a fixed
//! 256x64 polar strip: columns sweep the angle 0..2π anticlockwise, rows run
//! from the pupil boundary (row 0) outward to the iris boundary. Sampling
//! interpolates linearly between the two boundary circles, which makes the
//! unwrap tolerant of non-concentric pupil and iris centres; pupil dilation
//! and small off-axis geometry collapse into the same strip coordinates.

use crate::image::{GrayBuffer, ImageViewMut};
use crate::types::Segmentation;
use std::f32::consts::TAU;

/// Angular samples per strip row.
pub const STRIP_WIDTH: usize = 256;
/// Radial samples per strip column.
pub const STRIP_HEIGHT: usize = 64;

/// A normalized 256x64 iris strip (x = angle, y = radius).
#[derive(Clone, Debug)]
pub struct PolarStrip {
    image: GrayBuffer,
}

impl PolarStrip {
    pub fn image(&self) -> &GrayBuffer {
        &self.image
    }

    pub fn into_image(self) -> GrayBuffer {
        self.image
    }

    #[inline]
    pub fn get(&self, theta: usize, r: usize) -> u8 {
        self.image.get(theta, r)
    }

    /// Wrap an existing 256x64 buffer. Panics on any other shape.
    pub fn from_image(image: GrayBuffer) -> Self {
        assert_eq!(image.width(), STRIP_WIDTH, "strip width must be 256");
        assert_eq!(image.height(), STRIP_HEIGHT, "strip height must be 64");
        Self { image }
    }
}

/// Unwrap the iris annulus of `image` into a polar strip.
///
/// Nearest-neighbour sampling with rounding; samples that land outside the
/// image contribute 0.
pub fn unwrap_iris(image: &GrayBuffer, segmentation: &Segmentation) -> PolarStrip {
    let mut strip = GrayBuffer::new(STRIP_WIDTH, STRIP_HEIGHT);
    let pupil = segmentation.pupil;
    let iris = segmentation.iris;
    let (w, h) = (image.width() as i32, image.height() as i32);

    for r in 0..STRIP_HEIGHT {
        let ratio = r as f32 / STRIP_HEIGHT as f32;
        let row = strip.row_mut(r);
        for (theta, out_px) in row.iter_mut().enumerate() {
            let angle = TAU * theta as f32 / STRIP_WIDTH as f32;
            let (sin, cos) = angle.sin_cos();

            let inner_x = pupil.center.x + pupil.radius * cos;
            let inner_y = pupil.center.y + pupil.radius * sin;
            let outer_x = iris.center.x + iris.radius * cos;
            let outer_y = iris.center.y + iris.radius * sin;

            let sx = ((1.0 - ratio) * inner_x + ratio * outer_x).round() as i32;
            let sy = ((1.0 - ratio) * inner_y + ratio * outer_y).round() as i32;

            *out_px = if sx >= 0 && sy >= 0 && sx < w && sy < h {
                image.get(sx as usize, sy as usize)
            } else {
                0
            };
        }
    }
    PolarStrip {
        image: strip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Circle;

    #[test]
    fn strip_has_fixed_dimensions() {
        let image = GrayBuffer::new(640, 480);
        let seg = Segmentation {
            pupil: Circle::new(320.0, 240.0, 30.0),
            iris: Circle::new(320.0, 240.0, 80.0),
        };
        let strip = unwrap_iris(&image, &seg);
        assert_eq!(strip.image().width(), STRIP_WIDTH);
        assert_eq!(strip.image().height(), STRIP_HEIGHT);
    }

    #[test]
    fn radial_rings_become_strip_rows() {
        // Paint concentric rings; after unwrapping each row must be constant.
        let mut image = GrayBuffer::new(640, 480);
        for y in 0..480 {
            for x in 0..640 {
                let d = ((x as f32 - 320.0).powi(2) + (y as f32 - 240.0).powi(2)).sqrt();
                image.set(x, y, (d as u32 % 256) as u8);
            }
        }
        let seg = Segmentation {
            pupil: Circle::new(320.0, 240.0, 30.0),
            iris: Circle::new(320.0, 240.0, 80.0),
        };
        let strip = unwrap_iris(&image, &seg);
        for r in 0..STRIP_HEIGHT {
            let reference = strip.get(0, r) as i32;
            for theta in 0..STRIP_WIDTH {
                let v = strip.get(theta, r) as i32;
                assert!(
                    (v - reference).abs() <= 2,
                    "row {r} not constant: {v} vs {reference}"
                );
            }
        }
    }

    #[test]
    fn row_zero_samples_pupil_boundary() {
        let mut image = GrayBuffer::new(640, 480);
        // Bright ring exactly at the pupil radius
        for y in 0..480 {
            for x in 0..640 {
                let d = ((x as f32 - 320.0).powi(2) + (y as f32 - 240.0).powi(2)).sqrt();
                if (d - 30.0).abs() < 1.5 {
                    image.set(x, y, 255);
                }
            }
        }
        let seg = Segmentation {
            pupil: Circle::new(320.0, 240.0, 30.0),
            iris: Circle::new(320.0, 240.0, 80.0),
        };
        let strip = unwrap_iris(&image, &seg);
        let bright = (0..STRIP_WIDTH).filter(|&t| strip.get(t, 0) == 255).count();
        assert!(bright > STRIP_WIDTH / 2, "only {bright} bright samples");
    }

    #[test]
    fn out_of_image_samples_read_zero() {
        let image = GrayBuffer::from_raw(100, 100, vec![200u8; 100 * 100]);
        // Iris circle pokes far outside the tiny image.
        let seg = Segmentation {
            pupil: Circle::new(50.0, 50.0, 20.0),
            iris: Circle::new(50.0, 50.0, 90.0),
        };
        let strip = unwrap_iris(&image, &seg);
        let zeros = (0..STRIP_WIDTH)
            .filter(|&t| strip.get(t, STRIP_HEIGHT - 1) == 0)
            .count();
        assert!(zeros > 0, "expected out-of-image zeros on the outer row");
    }
}
