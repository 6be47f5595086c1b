//! Image module: lightweight owned buffers, read-only views, and utilities.
//!
//! Components
//! - `u8`: read-only `ImageU8<'a>` view plus the owned `GrayBuffer` used for
//!   camera frames and normalized strips.
//! - `f32`: owned `ImageF32` buffer for gradient work (row-major, stride==w).
//! - `traits`: `ImageView`/`ImageViewMut` abstractions with row iterators.
//! - `io`: helpers for loading/saving grayscale images and writing JSON.
//!
//! Design goals
//! - Keep hot loops simple and cache-friendly via row access.
//! - Expose a fast contiguous path (`as_slice`) when `stride == width`.
//! - Make ownership explicit: views borrow camera or buffer memory;
//!   `GrayBuffer` and `ImageF32` own and mutate. Every pipeline transform
//!   either consumes-and-releases its input or returns a new buffer.
pub mod f32;
pub mod io;
pub mod traits;
pub mod u8;

pub use self::f32::ImageF32;
pub use self::io::{load_grayscale_image, save_grayscale_png, write_json_file};
pub use self::traits::{ImageView, ImageViewMut};
pub use self::u8::{GrayBuffer, ImageU8};
