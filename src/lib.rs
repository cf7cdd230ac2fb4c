//! Pixel storage, owning images, borrowed views and strided pixel access.
//!
//! This crate models CPU-side pixel memory:
//!
//! - [`PixelFormat`] — closed catalog of pixel encodings and their sizes
//! - [`PixelStorage`] — row alignment, row length, image height and skip
//! - [`Image`] — owns its bytes
//! - [`ImageView`] / [`MutableImageView`] — borrow a [`SharedBuffer`]
//! - [`Data`] / [`DataMut`] — flat byte access
//! - [`Pixels`] / [`PixelsMut`] — strided, format-aware pixel access with
//!   sRGB and half-float conversion
//!
//! Buffers are reference counted. Every view and accessor holds the
//! buffer it was ultimately built on, so the buffer lives exactly as long
//! as its last user.
//!
//! ```
//! use pixstore::{Buffer, MutableImageView2D, PixelFormat};
//!
//! // 2x4 RGB pixels, rows padded to four-byte alignment
//! let data = Buffer::new_mut(b"rgbRGB  abcABC  defDEF  ijkIJK  ".to_vec());
//! let view = MutableImageView2D::new(PixelFormat::Rgb8Uint, [2, 4], data.clone()).unwrap();
//!
//! let pixels = view.pixels_mut().unwrap();
//! assert_eq!(pixels.size(), [4, 2]);
//! assert_eq!(pixels.stride(), [8, 3]);
//! assert_eq!(pixels.get([1, 0]).unwrap().g(), f64::from(b'b'));
//!
//! pixels.set([1, 0], [f64::from(b'a'), f64::from(b'_'), f64::from(b'c')]).unwrap();
//! assert_eq!(&data.to_vec()[8..14], b"a_cABC");
//! ```

#![forbid(unsafe_code)]

mod buffer;
mod error;
mod format;
mod image;
mod limits;
mod pixels;
mod storage;

pub mod srgb;

pub use buffer::{Buffer, Data, DataMut, SharedBuffer};
pub use error::{Error, Result};
pub use format::{ComponentType, ElementFormat, ElementType, Interpretation, PixelFormat};
pub use image::{
    Image, Image1D, Image2D, Image3D, ImageView, ImageView1D, ImageView2D, ImageView3D,
    MutableImageView, MutableImageView1D, MutableImageView2D, MutableImageView3D,
};
pub use limits::ResourceLimits;
pub use pixels::{MAX_CHANNELS, Pixel, Pixels, PixelsMut};
pub use storage::{DEFAULT_ALIGNMENT, DataProperties, PixelStorage};

// Re-exported for `From` conversions into `Pixel`.
pub use rgb;
