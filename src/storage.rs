//! Pixel storage parameters and the byte layout they imply.
//!
//! [`PixelStorage`] says how rows and slices of an image are laid out in
//! memory. [`PixelStorage::data_properties`] turns it, together with a
//! pixel size and an extent, into the offsets and padded sizes every view
//! and accessor addresses pixels with.

use crate::error::{Error, Result};

/// Row alignment used when none is specified.
pub const DEFAULT_ALIGNMENT: u32 = 4;

/// Memory layout of pixel data.
///
/// Defaults to four-byte row alignment, no row length or image height
/// override and no skip.
///
/// ```
/// use pixstore::PixelStorage;
///
/// let storage = PixelStorage::new()
///     .with_alignment(1)
///     .unwrap()
///     .with_row_length(64)
///     .with_skip([3, 1, 2]);
/// assert_eq!(storage.alignment(), 1);
/// assert_eq!(storage.row_length(), 64);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelStorage {
    alignment: u32,
    row_length: u32,
    image_height: u32,
    skip: [u32; 3],
}

impl Default for PixelStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl PixelStorage {
    /// Default storage.
    pub const fn new() -> Self {
        Self {
            alignment: DEFAULT_ALIGNMENT,
            row_length: 0,
            image_height: 0,
            skip: [0; 3],
        }
    }

    /// Row alignment in bytes.
    #[inline]
    pub const fn alignment(&self) -> u32 {
        self.alignment
    }

    /// Set row alignment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAlignment`] if `alignment` is not a power of
    /// two. The storage is left unchanged in that case.
    pub fn set_alignment(&mut self, alignment: u32) -> Result<()> {
        if !alignment.is_power_of_two() {
            return Err(Error::InvalidAlignment(alignment));
        }
        self.alignment = alignment;
        Ok(())
    }

    /// Builder form of [`set_alignment`](Self::set_alignment).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAlignment`] if `alignment` is not a power of two.
    pub fn with_alignment(mut self, alignment: u32) -> Result<Self> {
        self.set_alignment(alignment)?;
        Ok(self)
    }

    /// Row length in pixels, `0` meaning the image width.
    #[inline]
    pub const fn row_length(&self) -> u32 {
        self.row_length
    }

    /// Set row length in pixels.
    pub fn set_row_length(&mut self, row_length: u32) {
        self.row_length = row_length;
    }

    /// Builder form of [`set_row_length`](Self::set_row_length).
    pub const fn with_row_length(mut self, row_length: u32) -> Self {
        self.row_length = row_length;
        self
    }

    /// Rows per image slice, `0` meaning the image height.
    #[inline]
    pub const fn image_height(&self) -> u32 {
        self.image_height
    }

    /// Set rows per image slice.
    pub fn set_image_height(&mut self, image_height: u32) {
        self.image_height = image_height;
    }

    /// Builder form of [`set_image_height`](Self::set_image_height).
    pub const fn with_image_height(mut self, image_height: u32) -> Self {
        self.image_height = image_height;
        self
    }

    /// Pixels, rows and slices skipped before the first pixel.
    #[inline]
    pub const fn skip(&self) -> [u32; 3] {
        self.skip
    }

    /// Set pixels, rows and slices to skip.
    pub fn set_skip(&mut self, skip: [u32; 3]) {
        self.skip = skip;
    }

    /// Builder form of [`set_skip`](Self::set_skip).
    pub const fn with_skip(mut self, skip: [u32; 3]) -> Self {
        self.skip = skip;
        self
    }

    /// Offsets and padded sizes for an image of `size` pixels.
    ///
    /// `size` is always three-dimensional; lower-dimensional images pad it
    /// with ones. A zero-volume extent yields an all-zero `data_size`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SizeOverflow`] if a byte offset or the bytes of one
    /// slice do not fit in `usize`.
    pub fn data_properties(&self, pixel_size: usize, size: [u32; 3]) -> Result<DataProperties> {
        let width = if self.row_length != 0 {
            self.row_length
        } else {
            size[0]
        };
        let rows = if self.image_height != 0 {
            self.image_height
        } else {
            size[1]
        };
        let row_bytes = (width as usize)
            .checked_mul(pixel_size)
            .and_then(|bytes| bytes.checked_next_multiple_of(self.alignment as usize))
            .ok_or(Error::SizeOverflow)?;
        let slice_bytes = row_bytes
            .checked_mul(rows as usize)
            .ok_or(Error::SizeOverflow)?;
        let data_size = [row_bytes, rows as usize, size[2] as usize];

        let offset = [
            checked_mul(self.skip[0], pixel_size)?,
            checked_mul(self.skip[1], row_bytes)?,
            checked_mul(self.skip[2], slice_bytes)?,
        ];

        let empty = size.iter().any(|&extent| extent == 0);
        Ok(DataProperties {
            offset,
            data_size: if empty { [0; 3] } else { data_size },
        })
    }

    /// Minimum number of bytes a buffer needs to back an image of `size`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SizeOverflow`] if that count does not fit in `usize`.
    pub fn required_data_size(&self, pixel_size: usize, size: [u32; 3]) -> Result<usize> {
        let props = self.data_properties(pixel_size, size)?;
        if props.is_empty() {
            return Ok(0);
        }
        // One slice always fits, `data_properties` checked it.
        let volume = (props.data_size[0] * props.data_size[1])
            .checked_mul(props.data_size[2])
            .ok_or(Error::SizeOverflow)?;
        props
            .offset
            .iter()
            .try_fold(volume, |acc, &offset| acc.checked_add(offset))
            .ok_or(Error::SizeOverflow)
    }
}

/// Byte layout of an image, in storage order (x, y, z).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataProperties {
    /// Byte offset contributed by the skip along each axis.
    pub offset: [usize; 3],
    /// Padded row length in bytes, rows per slice and slice count.
    pub data_size: [usize; 3],
}

impl DataProperties {
    /// Whether the described extent has zero volume.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data_size == [0; 3]
    }

    /// Byte offset of the first pixel, saturating at `usize::MAX`.
    #[inline]
    pub fn offset_sum(&self) -> usize {
        self.offset
            .iter()
            .fold(0usize, |acc, &offset| acc.saturating_add(offset))
    }

    /// Byte strides in storage order for pixels of `pixel_size` bytes.
    ///
    /// Stays well-defined for empty extents: the x stride is always the
    /// pixel size, slower axes collapse to zero.
    pub fn strides(&self, pixel_size: usize) -> [usize; 3] {
        [
            pixel_size,
            self.data_size[0],
            self.data_size[0] * self.data_size[1],
        ]
    }
}

/// Pad a lower-dimensional extent to three dimensions.
pub(crate) fn pad_size<const D: usize>(size: [u32; D]) -> [u32; 3] {
    let mut out = [1; 3];
    out[..D].copy_from_slice(&size);
    out
}

#[inline]
fn checked_mul(count: u32, bytes: usize) -> Result<usize> {
    (count as usize)
        .checked_mul(bytes)
        .ok_or(Error::SizeOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let storage = PixelStorage::new();
        assert_eq!(storage.alignment(), 4);
        assert_eq!(storage.row_length(), 0);
        assert_eq!(storage.image_height(), 0);
        assert_eq!(storage.skip(), [0, 0, 0]);
        assert_eq!(storage, PixelStorage::default());
    }

    #[test]
    fn setters_round_trip() {
        let mut storage = PixelStorage::new();
        storage.set_alignment(1).unwrap();
        storage.set_row_length(64);
        storage.set_image_height(256);
        storage.set_skip([3, 1, 2]);
        assert_eq!(storage.alignment(), 1);
        assert_eq!(storage.row_length(), 64);
        assert_eq!(storage.image_height(), 256);
        assert_eq!(storage.skip(), [3, 1, 2]);
        assert_ne!(storage, PixelStorage::new());
    }

    #[test]
    fn rejects_non_power_of_two_alignment() {
        let mut storage = PixelStorage::new();
        assert_eq!(storage.set_alignment(3), Err(Error::InvalidAlignment(3)));
        assert_eq!(storage.set_alignment(0), Err(Error::InvalidAlignment(0)));
        assert_eq!(storage.alignment(), 4);
        assert!(PixelStorage::new().with_alignment(8).is_ok());
    }

    #[test]
    fn rows_are_padded_to_alignment() {
        // 2 RGB pixels = 6 bytes, padded to 8
        let props = PixelStorage::new().data_properties(3, [2, 4, 1]).unwrap();
        assert_eq!(props.offset, [0, 0, 0]);
        assert_eq!(props.data_size, [8, 4, 1]);
        assert_eq!(props.strides(3), [3, 8, 32]);
    }

    #[test]
    fn alignment_two_keeps_six_byte_rows() {
        let storage = PixelStorage::new().with_alignment(2).unwrap();
        assert_eq!(storage.required_data_size(3, [2, 2, 2]).unwrap(), 24);
    }

    #[test]
    fn row_length_and_image_height_override_extent() {
        let storage = PixelStorage::new()
            .with_row_length(5)
            .with_image_height(7);
        let props = storage.data_properties(2, [3, 4, 2]).unwrap();
        assert_eq!(props.data_size, [12, 7, 2]);
    }

    #[test]
    fn skip_offsets() {
        let storage = PixelStorage::new()
            .with_alignment(1)
            .unwrap()
            .with_skip([3, 1, 2]);
        let props = storage.data_properties(4, [2, 3, 5]).unwrap();
        assert_eq!(props.offset, [12, 8, 48]);
        assert_eq!(props.offset_sum(), 68);
        assert_eq!(storage.required_data_size(4, [2, 3, 5]).unwrap(), 68 + 8 * 3 * 5);
    }

    #[test]
    fn empty_extent_has_degenerate_strides() {
        let props = PixelStorage::new().data_properties(3, [0, 0, 1]).unwrap();
        assert!(props.is_empty());
        assert_eq!(props.strides(3), [3, 0, 0]);
        assert_eq!(PixelStorage::new().required_data_size(3, [0, 0, 1]).unwrap(), 0);
    }

    #[test]
    fn oversized_extents_report_overflow() {
        let storage = PixelStorage::new();
        assert_eq!(
            storage.required_data_size(16, [u32::MAX, u32::MAX, 1]),
            Err(Error::SizeOverflow)
        );
        assert_eq!(
            storage.required_data_size(16, [u32::MAX, u32::MAX, u32::MAX]),
            Err(Error::SizeOverflow)
        );
        let skipped = PixelStorage::new().with_skip([0, 0, u32::MAX]);
        assert_eq!(
            skipped.data_properties(16, [1 << 16, 1 << 16, 1]),
            Err(Error::SizeOverflow)
        );
        assert_eq!(
            storage.required_data_size(4, [u32::MAX, 1, 1]),
            Ok(u32::MAX as usize * 4)
        );
    }

    #[test]
    fn pads_lower_dimensions() {
        assert_eq!(pad_size([32]), [32, 1, 1]);
        assert_eq!(pad_size([2, 4]), [2, 4, 1]);
        assert_eq!(pad_size([2, 2, 2]), [2, 2, 2]);
    }
}
