/// Read access to a single-channel raster with row granularity.
pub trait ImageView {
    type Pixel: Copy;

    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn stride(&self) -> usize;

    fn row(&self, y: usize) -> &[Self::Pixel];

    /// Contiguous pixels when `stride == width`, the fast path for whole-
    /// image scans.
    fn as_slice(&self) -> Option<&[Self::Pixel]> {
        None
    }
}

/// Mutable row access on top of [`ImageView`].
pub trait ImageViewMut: ImageView {
    fn row_mut(&mut self, y: usize) -> &mut [Self::Pixel];
}
