use super::traits::{ImageView, ImageViewMut};
use super::u8::GrayBuffer;

/// Owned single-channel float buffer (row-major, `stride == w`).
///
/// Used for gradient fields and other intermediate numeric planes. Pixel
/// values keep the 0..255 scale of the source image so gradient-magnitude
/// thresholds stay in familiar units.
#[derive(Clone, Debug)]
pub struct ImageF32 {
    pub w: usize,
    pub h: usize,
    pub data: Vec<f32>,
}

impl ImageF32 {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            data: vec![0.0; w * h],
        }
    }

    /// Widen an 8-bit image without rescaling.
    pub fn from_gray(gray: &GrayBuffer) -> Self {
        let mut out = Self::new(gray.width(), gray.height());
        for y in 0..gray.height() {
            let src = gray.row(y);
            let dst = out.row_mut(y);
            for (d, &s) in dst.iter_mut().zip(src.iter()) {
                *d = s as f32;
            }
        }
        out
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.w + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.idx(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }
}

impl ImageView for ImageF32 {
    type Pixel = f32;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn stride(&self) -> usize {
        self.w
    }
    #[inline]
    fn row(&self, y: usize) -> &[f32] {
        let start = y * self.w;
        &self.data[start..start + self.w]
    }
    #[inline]
    fn as_slice(&self) -> Option<&[f32]> {
        Some(&self.data)
    }
}

impl ImageViewMut for ImageF32 {
    #[inline]
    fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let start = y * self.w;
        &mut self.data[start..start + self.w]
    }
}
