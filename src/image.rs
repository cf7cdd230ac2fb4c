//! Owning images and borrowing image views.
//!
//! - [`Image`] owns its pixel bytes.
//! - [`ImageView`] borrows an external [`SharedBuffer`] read-only.
//! - [`MutableImageView`] borrows a writable [`SharedBuffer`].
//!
//! All three are generic over their dimension count `D` (1, 2 or 3) and
//! carry a [`PixelStorage`], a [`PixelFormat`] and a size. A view derived
//! from another view or from an image holds the original buffer, not the
//! object it was derived from, so the intermediate object can be dropped
//! freely.

use std::rc::Rc;

use log::debug;

use crate::buffer::{Buffer, Data, DataMut, SharedBuffer};
use crate::error::{Error, Result};
use crate::format::PixelFormat;
use crate::limits::ResourceLimits;
use crate::pixels::{Pixels, PixelsMut};
use crate::storage::{DataProperties, PixelStorage, pad_size};

/// One-dimensional owning image.
pub type Image1D = Image<1>;
/// Two-dimensional owning image.
pub type Image2D = Image<2>;
/// Three-dimensional owning image.
pub type Image3D = Image<3>;
/// One-dimensional read-only view.
pub type ImageView1D = ImageView<1>;
/// Two-dimensional read-only view.
pub type ImageView2D = ImageView<2>;
/// Three-dimensional read-only view.
pub type ImageView3D = ImageView<3>;
/// One-dimensional writable view.
pub type MutableImageView1D = MutableImageView<1>;
/// Two-dimensional writable view.
pub type MutableImageView2D = MutableImageView<2>;
/// Three-dimensional writable view.
pub type MutableImageView3D = MutableImageView<3>;

#[inline]
fn assert_dimensions<const D: usize>() {
    const { assert!(D >= 1 && D <= 3, "images have one to three dimensions") }
}

/// Check that `buffer` can back an image of `size`.
fn check_data<const D: usize>(
    storage: &PixelStorage,
    format: PixelFormat,
    size: [u32; D],
    len: usize,
) -> Result<()> {
    let required = storage.required_data_size(format.pixel_size(), pad_size(size))?;
    if len < required {
        return Err(Error::BufferTooSmall {
            required,
            actual: len,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Image (owned)
// ---------------------------------------------------------------------------

/// Image that owns its pixel data.
///
/// An image made with [`new`](Self::new) or
/// [`with_storage`](Self::with_storage) is empty: zero size, no data.
/// Accessors of a non-empty image hold its buffer, so views and accessors
/// stay valid after the image is dropped.
#[derive(Debug)]
pub struct Image<const D: usize> {
    storage: PixelStorage,
    format: PixelFormat,
    size: [u32; D],
    data: Option<SharedBuffer>,
}

impl<const D: usize> Image<D> {
    /// Empty image with default storage.
    pub fn new(format: PixelFormat) -> Self {
        Self::with_storage(PixelStorage::new(), format)
    }

    /// Empty image with explicit storage.
    pub fn with_storage(storage: PixelStorage, format: PixelFormat) -> Self {
        assert_dimensions::<D>();
        Self {
            storage,
            format,
            size: [0; D],
            data: None,
        }
    }

    /// Take ownership of `data` laid out with default storage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferTooSmall`] if `data` cannot hold an image of
    /// `size`.
    pub fn from_vec(format: PixelFormat, size: [u32; D], data: Vec<u8>) -> Result<Self> {
        Self::from_data(PixelStorage::new(), format, size, data)
    }

    /// Take ownership of `data` laid out per `storage`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferTooSmall`] if `data` cannot hold an image of
    /// `size` and [`Error::SizeOverflow`] if that size does not fit in
    /// memory.
    pub fn from_data(
        storage: PixelStorage,
        format: PixelFormat,
        size: [u32; D],
        data: Vec<u8>,
    ) -> Result<Self> {
        assert_dimensions::<D>();
        check_data(&storage, format, size, data.len())?;
        debug!(
            "image {size:?} {format:?} takes ownership of {} bytes",
            data.len()
        );
        Ok(Self {
            storage,
            format,
            size,
            data: (!data.is_empty()).then(|| Buffer::new_mut(data)),
        })
    }

    /// Zero-filled image of exactly the size `storage` requires.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SizeOverflow`] if that size does not fit in memory.
    pub fn zeroed(storage: PixelStorage, format: PixelFormat, size: [u32; D]) -> Result<Self> {
        assert_dimensions::<D>();
        let len = storage.required_data_size(format.pixel_size(), pad_size(size))?;
        debug!("image {size:?} {format:?} allocates {len} bytes");
        Ok(Self {
            storage,
            format,
            size,
            data: (len != 0).then(|| Buffer::zeroed(len)),
        })
    }

    /// [`zeroed`](Self::zeroed), refusing allocations over `limits`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LimitExceeded`] before allocating if the size or the
    /// byte count exceed `limits`, and [`Error::SizeOverflow`] like
    /// [`zeroed`](Self::zeroed).
    pub fn zeroed_with_limits(
        storage: PixelStorage,
        format: PixelFormat,
        size: [u32; D],
        limits: &ResourceLimits,
    ) -> Result<Self> {
        limits.check_size(&size)?;
        let len = storage.required_data_size(format.pixel_size(), pad_size(size))?;
        limits.check_memory(len as u64)?;
        Self::zeroed(storage, format, size)
    }

    /// Storage parameters.
    #[inline]
    pub fn storage(&self) -> PixelStorage {
        self.storage
    }

    /// Pixel format.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Size in pixels.
    #[inline]
    pub fn size(&self) -> [u32; D] {
        self.size
    }

    /// Bytes per pixel.
    #[inline]
    pub fn pixel_size(&self) -> usize {
        self.format.pixel_size()
    }

    /// Offsets and padded sizes of the data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SizeOverflow`] if the layout does not fit in memory.
    pub fn data_properties(&self) -> Result<DataProperties> {
        self.storage
            .data_properties(self.pixel_size(), pad_size(self.size))
    }

    /// Flat byte access. Has no owner if the image is empty.
    pub fn data(&self) -> Data {
        Data::new(self.data.clone())
    }

    /// Writable flat byte access.
    ///
    /// The buffer is shared with every view made by
    /// [`MutableImageView::from_image`], so writes through either are
    /// visible to both.
    pub fn data_mut(&self) -> DataMut {
        DataMut::new(self.data.clone())
    }

    /// Strided pixel access.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] if the format has no decoder
    /// and [`Error::SizeOverflow`] if the layout does not fit in memory.
    pub fn pixels(&self) -> Result<Pixels<D>> {
        Pixels::new(self.data.clone(), &self.storage, self.format, self.size)
    }

    /// Writable strided pixel access.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] if the format has no decoder
    /// and [`Error::SizeOverflow`] if the layout does not fit in memory.
    pub fn pixels_mut(&self) -> Result<PixelsMut<D>> {
        PixelsMut::new(self.data.clone(), &self.storage, self.format, self.size)
    }

    /// Give up the pixel bytes. Copies them if views still hold the buffer.
    pub fn release(self) -> Vec<u8> {
        match self.data {
            None => Vec::new(),
            Some(buffer) => {
                Rc::try_unwrap(buffer).map_or_else(|shared| shared.to_vec(), Buffer::into_vec)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ImageView (borrowed, read-only)
// ---------------------------------------------------------------------------

/// Read-only view over an external buffer.
///
/// ```
/// use std::rc::Rc;
/// use pixstore::{Buffer, ImageView2D, PixelFormat};
///
/// // 2x4 RGB pixels, rows padded to four bytes
/// let data = Buffer::new(b"rgbRGB  abcABC  defDEF  ijkIJK  ".to_vec());
/// let view = ImageView2D::new(PixelFormat::Rgb8Unorm, [2, 4], data.clone()).unwrap();
/// assert_eq!(view.pixel_size(), 3);
/// assert_eq!(Rc::strong_count(&data), 2);
/// drop(view);
/// assert_eq!(Rc::strong_count(&data), 1);
/// ```
#[derive(Clone, Debug)]
pub struct ImageView<const D: usize> {
    storage: PixelStorage,
    format: PixelFormat,
    size: [u32; D],
    data: Option<SharedBuffer>,
}

impl<const D: usize> ImageView<D> {
    /// View `data` with default storage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferTooSmall`] if `data` cannot hold `size`.
    pub fn new(format: PixelFormat, size: [u32; D], data: SharedBuffer) -> Result<Self> {
        Self::with_storage(PixelStorage::new(), format, size, data)
    }

    /// View `data` with explicit storage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferTooSmall`] if `data` cannot hold `size`.
    pub fn with_storage(
        storage: PixelStorage,
        format: PixelFormat,
        size: [u32; D],
        data: SharedBuffer,
    ) -> Result<Self> {
        assert_dimensions::<D>();
        check_data(&storage, format, size, data.len())?;
        debug!("view {size:?} {format:?} binds {:?}", data);
        Ok(Self {
            storage,
            format,
            size,
            data: Some(data),
        })
    }

    /// View of `size` with no data and default storage.
    pub fn empty(format: PixelFormat, size: [u32; D]) -> Self {
        Self::empty_with_storage(PixelStorage::new(), format, size)
    }

    /// View of `size` with no data.
    pub fn empty_with_storage(storage: PixelStorage, format: PixelFormat, size: [u32; D]) -> Self {
        assert_dimensions::<D>();
        Self {
            storage,
            format,
            size,
            data: None,
        }
    }

    /// View the data of `image`. Holds the image's buffer, if any.
    pub fn from_image(image: &Image<D>) -> Self {
        Self {
            storage: image.storage,
            format: image.format,
            size: image.size,
            data: image.data.clone(),
        }
    }

    /// Storage parameters.
    #[inline]
    pub fn storage(&self) -> PixelStorage {
        self.storage
    }

    /// Pixel format.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Size in pixels.
    #[inline]
    pub fn size(&self) -> [u32; D] {
        self.size
    }

    /// Bytes per pixel.
    #[inline]
    pub fn pixel_size(&self) -> usize {
        self.format.pixel_size()
    }

    /// Offsets and padded sizes of the data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SizeOverflow`] if the layout does not fit in memory.
    pub fn data_properties(&self) -> Result<DataProperties> {
        self.storage
            .data_properties(self.pixel_size(), pad_size(self.size))
    }

    /// The buffer this view keeps alive.
    #[inline]
    pub fn owner(&self) -> Option<&SharedBuffer> {
        self.data.as_ref()
    }

    /// Replace the viewed buffer, releasing the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferTooSmall`] if `data` cannot hold the view's
    /// size; the view keeps its current buffer in that case.
    pub fn set_data(&mut self, data: SharedBuffer) -> Result<()> {
        check_data(&self.storage, self.format, self.size, data.len())?;
        debug!("view {:?} rebinds to {:?}", self.size, data);
        self.data = Some(data);
        Ok(())
    }

    /// Flat byte access over the whole buffer.
    pub fn data(&self) -> Data {
        Data::new(self.data.clone())
    }

    /// Strided pixel access.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] if the format has no decoder
    /// and [`Error::SizeOverflow`] if the layout does not fit in memory.
    pub fn pixels(&self) -> Result<Pixels<D>> {
        Pixels::new(self.data.clone(), &self.storage, self.format, self.size)
    }
}

impl<const D: usize> From<&Image<D>> for ImageView<D> {
    fn from(image: &Image<D>) -> Self {
        Self::from_image(image)
    }
}

impl<const D: usize> From<&MutableImageView<D>> for ImageView<D> {
    fn from(view: &MutableImageView<D>) -> Self {
        view.clone().into()
    }
}

impl<const D: usize> From<MutableImageView<D>> for ImageView<D> {
    fn from(view: MutableImageView<D>) -> Self {
        Self {
            storage: view.storage,
            format: view.format,
            size: view.size,
            data: view.data,
        }
    }
}

// ---------------------------------------------------------------------------
// MutableImageView (borrowed, writable)
// ---------------------------------------------------------------------------

/// Writable view over an external buffer.
///
/// Converts into an [`ImageView`] but not the other way around. Several
/// views may write to the same buffer; ordering such writes is up to the
/// caller.
#[derive(Clone, Debug)]
pub struct MutableImageView<const D: usize> {
    storage: PixelStorage,
    format: PixelFormat,
    size: [u32; D],
    data: Option<SharedBuffer>,
}

impl<const D: usize> MutableImageView<D> {
    /// View `data` with default storage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnlyBuffer`] if `data` is not writable and
    /// [`Error::BufferTooSmall`] if it cannot hold `size`.
    pub fn new(format: PixelFormat, size: [u32; D], data: SharedBuffer) -> Result<Self> {
        Self::with_storage(PixelStorage::new(), format, size, data)
    }

    /// View `data` with explicit storage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnlyBuffer`] if `data` is not writable and
    /// [`Error::BufferTooSmall`] if it cannot hold `size`.
    pub fn with_storage(
        storage: PixelStorage,
        format: PixelFormat,
        size: [u32; D],
        data: SharedBuffer,
    ) -> Result<Self> {
        assert_dimensions::<D>();
        if !data.is_writable() {
            return Err(Error::ReadOnlyBuffer);
        }
        check_data(&storage, format, size, data.len())?;
        debug!("mutable view {size:?} {format:?} binds {:?}", data);
        Ok(Self {
            storage,
            format,
            size,
            data: Some(data),
        })
    }

    /// View of `size` with no data and default storage.
    pub fn empty(format: PixelFormat, size: [u32; D]) -> Self {
        Self::empty_with_storage(PixelStorage::new(), format, size)
    }

    /// View of `size` with no data.
    pub fn empty_with_storage(storage: PixelStorage, format: PixelFormat, size: [u32; D]) -> Self {
        assert_dimensions::<D>();
        Self {
            storage,
            format,
            size,
            data: None,
        }
    }

    /// Writable view of the data of `image`.
    pub fn from_image(image: &Image<D>) -> Self {
        Self {
            storage: image.storage,
            format: image.format,
            size: image.size,
            data: image.data.clone(),
        }
    }

    /// Storage parameters.
    #[inline]
    pub fn storage(&self) -> PixelStorage {
        self.storage
    }

    /// Pixel format.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Size in pixels.
    #[inline]
    pub fn size(&self) -> [u32; D] {
        self.size
    }

    /// Bytes per pixel.
    #[inline]
    pub fn pixel_size(&self) -> usize {
        self.format.pixel_size()
    }

    /// Offsets and padded sizes of the data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SizeOverflow`] if the layout does not fit in memory.
    pub fn data_properties(&self) -> Result<DataProperties> {
        self.storage
            .data_properties(self.pixel_size(), pad_size(self.size))
    }

    /// The buffer this view keeps alive.
    #[inline]
    pub fn owner(&self) -> Option<&SharedBuffer> {
        self.data.as_ref()
    }

    /// Replace the viewed buffer, releasing the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnlyBuffer`] or [`Error::BufferTooSmall`]; the
    /// view keeps its current buffer in both cases.
    pub fn set_data(&mut self, data: SharedBuffer) -> Result<()> {
        if !data.is_writable() {
            return Err(Error::ReadOnlyBuffer);
        }
        check_data(&self.storage, self.format, self.size, data.len())?;
        debug!("mutable view {:?} rebinds to {:?}", self.size, data);
        self.data = Some(data);
        Ok(())
    }

    /// Flat read-only byte access.
    pub fn data(&self) -> Data {
        Data::new(self.data.clone())
    }

    /// Flat writable byte access.
    pub fn data_mut(&self) -> DataMut {
        DataMut::new(self.data.clone())
    }

    /// Read-only strided pixel access.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] if the format has no decoder
    /// and [`Error::SizeOverflow`] if the layout does not fit in memory.
    pub fn pixels(&self) -> Result<Pixels<D>> {
        Pixels::new(self.data.clone(), &self.storage, self.format, self.size)
    }

    /// Writable strided pixel access.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] if the format has no decoder
    /// and [`Error::SizeOverflow`] if the layout does not fit in memory.
    pub fn pixels_mut(&self) -> Result<PixelsMut<D>> {
        PixelsMut::new(self.data.clone(), &self.storage, self.format, self.size)
    }
}

impl<const D: usize> From<&Image<D>> for MutableImageView<D> {
    fn from(image: &Image<D>) -> Self {
        Self::from_image(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_image() {
        let storage = PixelStorage::new().with_alignment(1).unwrap();
        let image = Image2D::with_storage(storage, PixelFormat::Rgb8Unorm);
        assert_eq!(image.storage().alignment(), 1);
        assert_eq!(image.size(), [0, 0]);
        assert_eq!(image.format(), PixelFormat::Rgb8Unorm);
        assert!(image.data().owner().is_none());
        assert!(image.data_properties().unwrap().is_empty());
    }

    #[test]
    fn from_data_validates_size() {
        assert_eq!(
            Image2D::from_data(PixelStorage::new(), PixelFormat::R8Uint, [3, 2], vec![0; 7])
                .err(),
            Some(Error::BufferTooSmall {
                required: 8,
                actual: 7
            })
        );
        let image =
            Image2D::from_data(PixelStorage::new(), PixelFormat::R8Uint, [3, 2], vec![7; 8])
                .unwrap();
        assert_eq!(image.data().len(), 8);
        assert_eq!(image.release(), vec![7; 8]);
    }

    #[test]
    fn zeroed_image_is_exactly_sized() {
        let image = Image2D::zeroed(PixelStorage::new(), PixelFormat::Rg32Uint, [3, 17]).unwrap();
        assert_eq!(image.data().len(), 3 * 17 * 8);
        let pixels = image.pixels().unwrap();
        assert_eq!(pixels.size(), [17, 3]);
        assert_eq!(pixels.stride(), [24, 8]);
        assert_eq!(pixels.format(), "2I");
    }

    #[test]
    fn zeroed_with_limits_checks_before_allocating() {
        let limits = ResourceLimits::none().with_max_memory(100);
        let packed = PixelStorage::new().with_alignment(1).unwrap();
        assert!(
            Image2D::zeroed_with_limits(packed, PixelFormat::R8Unorm, [10, 10], &limits).is_ok()
        );
        assert!(matches!(
            Image2D::zeroed_with_limits(packed, PixelFormat::R8Unorm, [10, 11], &limits),
            Err(Error::LimitExceeded { what: "memory", .. })
        ));
    }

    #[test]
    fn image_accessors_hold_the_image_buffer() {
        let image = Image2D::zeroed(PixelStorage::new(), PixelFormat::R32Float, [3, 17]).unwrap();
        let data = image.data();
        let buffer = data.owner().unwrap().clone();
        assert_eq!(Rc::strong_count(&buffer), 3);

        let view = ImageView2D::from(&image);
        assert_eq!(view.size(), [3, 17]);
        assert!(Rc::ptr_eq(view.owner().unwrap(), &buffer));
        assert_eq!(Rc::strong_count(&buffer), 4);
        drop(view);

        let mview = MutableImageView2D::from(&image);
        assert_eq!(mview.size(), [3, 17]);
        assert_eq!(Rc::strong_count(&buffer), 4);

        // the image can go away while views remain usable
        drop(image);
        mview.pixels_mut().unwrap().set([2, 1], 0.5).unwrap();
        assert_eq!(mview.pixels().unwrap().get([2, 1]).unwrap().r(), 0.5);
    }

    #[test]
    fn view_rejects_undersized_buffer() {
        let data = Buffer::new(vec![0u8; 31]);
        assert_eq!(
            ImageView2D::new(PixelFormat::Rgb8Unorm, [2, 4], data.clone()).err(),
            Some(Error::BufferTooSmall {
                required: 32,
                actual: 31
            })
        );
        assert_eq!(Rc::strong_count(&data), 1);
    }

    #[test]
    fn mutable_view_rejects_read_only_buffer() {
        let data = Buffer::new(vec![0u8; 32]);
        assert_eq!(
            MutableImageView2D::new(PixelFormat::Rgb8Unorm, [2, 4], data).err(),
            Some(Error::ReadOnlyBuffer)
        );
    }

    #[test]
    fn failed_set_data_keeps_the_old_buffer() {
        let first = Buffer::new(vec![0u8; 32]);
        let mut view = ImageView2D::new(PixelFormat::Rgb8Unorm, [2, 4], first.clone()).unwrap();
        assert!(view.set_data(Buffer::new(vec![0u8; 16])).is_err());
        assert!(Rc::ptr_eq(view.owner().unwrap(), &first));
        assert_eq!(Rc::strong_count(&first), 2);
    }

    #[test]
    fn one_dimensional_size() {
        let view = MutableImageView1D::empty(PixelFormat::Rg16Uint, [32]);
        assert_eq!(view.size(), [32]);
        assert_eq!(view.pixel_size(), 4);
        assert_eq!(view.data_properties().unwrap().data_size, [128, 1, 1]);
    }

    #[test]
    fn from_vec_uses_default_storage() {
        let image = Image2D::from_vec(PixelFormat::Rgb8Unorm, [2, 2], vec![1; 16]).unwrap();
        assert_eq!(image.storage(), PixelStorage::new());
        assert_eq!(image.pixels().unwrap().stride(), [8, 3]);
        assert_eq!(
            Image2D::from_vec(PixelFormat::Rgb8Unorm, [2, 2], vec![1; 14]).err(),
            Some(Error::BufferTooSmall {
                required: 16,
                actual: 14
            })
        );
    }

    #[test]
    fn oversized_views_fail_instead_of_overflowing() {
        let data = Buffer::new(vec![0u8; 16]);
        assert_eq!(
            ImageView2D::new(PixelFormat::Rgba32Float, [u32::MAX, u32::MAX], data).err(),
            Some(Error::SizeOverflow)
        );
        assert_eq!(
            Image3D::zeroed(PixelStorage::new(), PixelFormat::R8Uint, [u32::MAX; 3]).err(),
            Some(Error::SizeOverflow)
        );
        let empty = ImageView2D::empty(PixelFormat::Rgba32Float, [u32::MAX, u32::MAX]);
        assert_eq!(empty.pixels().err(), Some(Error::SizeOverflow));
    }

    #[test]
    fn image_writes_are_shared_with_mutable_views() {
        let image = Image1D::zeroed(PixelStorage::new(), PixelFormat::R8Uint, [4]).unwrap();
        let view = MutableImageView1D::from_image(&image);
        view.data_mut().set(2, 9).unwrap();
        assert_eq!(image.pixels().unwrap().get([2]).unwrap().r(), 9.0);
        image.pixels_mut().unwrap().set([3], 5.0).unwrap();
        assert_eq!(view.data().to_vec(), vec![0, 0, 9, 5]);
    }
}
