use super::traits::{ImageView, ImageViewMut};
use crate::types::Rect;

/// Read-only view over an 8-bit grayscale buffer.
///
/// The `stride` is the number of bytes between rows, which lets the view wrap
/// a camera luma plane directly when its rows are padded.
#[derive(Clone, Debug)]
pub struct ImageU8<'a> {
    pub w: usize,
    pub h: usize,
    pub stride: usize, // bytes between rows
    pub data: &'a [u8],
}

impl<'a> ImageU8<'a> {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.stride + x]
    }

    /// Sub-view over `rect`, clamped to the image bounds.
    pub fn crop(&self, rect: Rect) -> ImageU8<'a> {
        let x0 = rect.x.min(self.w);
        let y0 = rect.y.min(self.h);
        let w = rect.w.min(self.w - x0);
        let h = rect.h.min(self.h - y0);
        let start = (y0 * self.stride + x0).min(self.data.len());
        ImageU8 {
            w,
            h,
            stride: self.stride,
            data: &self.data[start..],
        }
    }
}

impl<'a> ImageView for ImageU8<'a> {
    type Pixel = u8;

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
        self.stride
    }
    #[inline]
    fn row(&self, y: usize) -> &[u8] {
        let start = y * self.stride;
        &self.data[start..start + self.w]
    }
    #[inline]
    fn as_slice(&self) -> Option<&[u8]> {
        (self.stride == self.w).then_some(&self.data[..self.w * self.h])
    }
}

/// Owned 8-bit grayscale buffer with tight rows (`stride == width`).
///
/// Camera frames, preprocessed images and normalized strips all live in this
/// type. Each buffer is owned by exactly one pipeline stage at a time.
#[derive(Clone, Debug)]
pub struct GrayBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl GrayBuffer {
    /// Zero-filled buffer of the given dimensions.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width * height],
        }
    }

    /// Wrap an existing tight buffer. Panics if `data` is not `width*height`.
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Self {
        assert_eq!(
            data.len(),
            width * height,
            "buffer length must match dimensions"
        );
        Self {
            width,
            height,
            data,
        }
    }

    /// Adopt a camera luma plane.
    ///
    /// When `stride == width` the plane is taken as-is without copying; a
    /// padded plane is row-copied into a tight buffer.
    pub fn from_luma_plane(width: usize, height: usize, stride: usize, plane: Vec<u8>) -> Self {
        assert!(stride >= width, "stride must cover a full row");
        assert!(plane.len() >= stride * height, "plane too short");
        if stride == width {
            let mut data = plane;
            data.truncate(width * height);
            return Self {
                width,
                height,
                data,
            };
        }
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            let start = y * stride;
            data.extend_from_slice(&plane[start..start + width]);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Image width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: u8) {
        self.data[y * self.width + x] = v;
    }

    /// Borrow as a read-only `ImageU8` view
    pub fn as_view(&self) -> ImageU8<'_> {
        ImageU8 {
            w: self.width,
            h: self.height,
            stride: self.width,
            data: &self.data,
        }
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }
}

impl ImageView for GrayBuffer {
    type Pixel = u8;

    #[inline]
    fn width(&self) -> usize {
        self.width
    }
    #[inline]
    fn height(&self) -> usize {
        self.height
    }
    #[inline]
    fn stride(&self) -> usize {
        self.width
    }
    #[inline]
    fn row(&self, y: usize) -> &[u8] {
        let start = y * self.width;
        &self.data[start..start + self.width]
    }
    #[inline]
    fn as_slice(&self) -> Option<&[u8]> {
        Some(&self.data)
    }
}

impl ImageViewMut for GrayBuffer {
    #[inline]
    fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let start = y * self.width;
        &mut self.data[start..start + self.width]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_plane_is_row_copied() {
        // 3x2 image inside a stride-5 plane
        let mut plane = vec![0u8; 5 * 2];
        plane[0..3].copy_from_slice(&[1, 2, 3]);
        plane[5..8].copy_from_slice(&[4, 5, 6]);
        let buf = GrayBuffer::from_luma_plane(3, 2, 5, plane);
        assert_eq!(buf.as_view().as_slice().unwrap(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn tight_plane_is_adopted() {
        let buf = GrayBuffer::from_luma_plane(2, 2, 2, vec![9, 8, 7, 6]);
        assert_eq!(buf.get(1, 1), 6);
    }

    #[test]
    fn crop_clamps_to_bounds() {
        let buf = GrayBuffer::from_raw(4, 4, (0..16).collect());
        let view = buf.as_view();
        let roi = view.crop(Rect {
            x: 2,
            y: 2,
            w: 10,
            h: 10,
        });
        assert_eq!(roi.w, 2);
        assert_eq!(roi.h, 2);
        assert_eq!(roi.get(0, 0), 10);
    }
}
