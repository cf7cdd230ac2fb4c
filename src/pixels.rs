//! Strided, format-aware pixel access.
//!
//! [`Pixels`] presents the buffer behind an image or view as a
//! `D`-dimensional array of [`Pixel`] values. Axes are reported slowest
//! first, the reverse of the storage order used by
//! [`PixelStorage::data_properties`]: a 2D image `W` pixels wide and `H`
//! rows tall has `size() == [H, W]` and `stride() == [row_bytes, pixel_size]`.
//!
//! Channel values are decoded on read and encoded on write:
//!
//! - integer and normalized formats yield raw integer values,
//! - float formats yield their float value, half-floats are expanded to
//!   `f32` and narrowed back on write,
//! - sRGB formats are converted to linear light, except the alpha channel
//!   of four-channel formats which is only unpacked to `[0, 1]`.

use std::fmt;
use std::ops::{Deref, Index, Mul, MulAssign, Range};

use half::f16;
use log::trace;

use crate::buffer::SharedBuffer;
use crate::error::{Error, Result};
use crate::format::{ElementFormat, ElementType, PixelFormat};
use crate::srgb::{linear_to_srgb, srgb_to_linear};
use crate::storage::{PixelStorage, pad_size};

// ---------------------------------------------------------------------------
// Pixel
// ---------------------------------------------------------------------------

/// Most channels a pixel can have.
pub const MAX_CHANNELS: usize = 4;

/// Decoded value of one pixel: one to four channels.
#[derive(Clone, Copy, Default, PartialEq)]
pub struct Pixel {
    channels: [f64; 4],
    len: u8,
}

impl Pixel {
    /// Pixel from up to four channel values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TooManyChannels`] for more than [`MAX_CHANNELS`]
    /// values.
    pub fn new(channels: &[f64]) -> Result<Self> {
        if channels.len() > MAX_CHANNELS {
            return Err(Error::TooManyChannels(channels.len()));
        }
        Ok(Self::from_channels(channels))
    }

    fn from_channels(channels: &[f64]) -> Self {
        let mut out = [0.0; MAX_CHANNELS];
        out[..channels.len()].copy_from_slice(channels);
        Self {
            channels: out,
            len: channels.len() as u8,
        }
    }

    /// Number of channels.
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Whether the pixel has no channels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Channel values.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.channels[..self.len()]
    }

    /// First channel.
    #[inline]
    pub fn r(&self) -> f64 {
        self.channels[0]
    }

    /// Second channel, `0.0` if absent.
    #[inline]
    pub fn g(&self) -> f64 {
        self.channels[1]
    }

    /// Third channel, `0.0` if absent.
    #[inline]
    pub fn b(&self) -> f64 {
        self.channels[2]
    }

    /// Fourth channel, `0.0` if absent.
    #[inline]
    pub fn a(&self) -> f64 {
        self.channels[3]
    }

    /// Apply `f` to every channel.
    pub fn map(mut self, f: impl Fn(f64) -> f64) -> Self {
        for value in &mut self.channels[..self.len as usize] {
            *value = f(*value);
        }
        self
    }

    /// Channel-wise comparison with an absolute tolerance.
    pub fn approx_eq(&self, other: &Pixel, epsilon: f64) -> bool {
        self.len == other.len
            && self
                .as_slice()
                .iter()
                .zip(other.as_slice())
                .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

impl fmt::Debug for Pixel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pixel").field(&self.as_slice()).finish()
    }
}

impl Index<usize> for Pixel {
    type Output = f64;

    fn index(&self, channel: usize) -> &f64 {
        &self.as_slice()[channel]
    }
}

impl Mul<f64> for Pixel {
    type Output = Pixel;

    fn mul(self, rhs: f64) -> Pixel {
        self.map(|v| v * rhs)
    }
}

impl MulAssign<f64> for Pixel {
    fn mul_assign(&mut self, rhs: f64) {
        *self = *self * rhs;
    }
}

impl<const N: usize> From<[f64; N]> for Pixel {
    fn from(channels: [f64; N]) -> Self {
        const { assert!(N <= MAX_CHANNELS, "a pixel has at most four channels") }
        Self::from_channels(&channels)
    }
}

impl From<f64> for Pixel {
    fn from(value: f64) -> Self {
        Self::from_channels(&[value])
    }
}

impl<T: Copy + Into<f64>> From<rgb::Rgb<T>> for Pixel {
    fn from(px: rgb::Rgb<T>) -> Self {
        Self::from_channels(&[px.r.into(), px.g.into(), px.b.into()])
    }
}

impl<T: Copy + Into<f64>> From<rgb::Rgba<T>> for Pixel {
    fn from(px: rgb::Rgba<T>) -> Self {
        Self::from_channels(&[px.r.into(), px.g.into(), px.b.into(), px.a.into()])
    }
}

// ---------------------------------------------------------------------------
// Pixels (read-only)
// ---------------------------------------------------------------------------

/// Read-only strided pixel accessor.
#[derive(Clone)]
pub struct Pixels<const D: usize> {
    owner: Option<SharedBuffer>,
    format: PixelFormat,
    element: ElementFormat,
    offset: usize,
    size: [usize; D],
    stride: [usize; D],
}

impl<const D: usize> Pixels<D> {
    pub(crate) fn new(
        owner: Option<SharedBuffer>,
        storage: &PixelStorage,
        format: PixelFormat,
        size: [u32; D],
    ) -> Result<Self> {
        let element = format.element_format()?;
        let pixel_size = format.pixel_size();
        let props = storage.data_properties(pixel_size, pad_size(size))?;
        let strides = props.strides(pixel_size);

        let mut stride = [0; D];
        stride.copy_from_slice(&strides[..D]);
        Ok(Self {
            owner,
            format,
            element,
            offset: props.offset_sum(),
            size: reverse_axes(size.map(|extent| extent as usize)),
            stride: reverse_axes(stride),
        })
    }

    /// Extent along each axis, slowest first.
    #[inline]
    pub fn size(&self) -> [usize; D] {
        self.size
    }

    /// Byte stride along each axis, slowest first.
    #[inline]
    pub fn stride(&self) -> [usize; D] {
        self.stride
    }

    /// Element layout tag, e.g. `"3B"` or `"2e"`.
    #[inline]
    pub fn format(&self) -> &'static str {
        self.element.tag()
    }

    /// Element layout.
    #[inline]
    pub fn element_format(&self) -> ElementFormat {
        self.element
    }

    /// Pixel format of the underlying data.
    #[inline]
    pub fn pixel_format(&self) -> PixelFormat {
        self.format
    }

    /// The buffer kept alive by this accessor.
    #[inline]
    pub fn owner(&self) -> Option<&SharedBuffer> {
        self.owner.as_ref()
    }

    /// Decoded pixel at `index` (slowest axis first).
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if any coordinate is past its axis,
    /// or [`Error::BufferTooSmall`] if the backing data does not reach the
    /// pixel.
    pub fn get(&self, index: [usize; D]) -> Result<Pixel> {
        let range = self.byte_range(index)?;
        let buffer = self.backing(&range)?;
        let bytes = buffer.bytes();
        Ok(decode(self.format, self.element, &bytes[range]))
    }

    fn byte_range(&self, index: [usize; D]) -> Result<Range<usize>> {
        let mut start = self.offset;
        for axis in 0..D {
            if index[axis] >= self.size[axis] {
                return Err(Error::OutOfBounds {
                    axis,
                    index: index[axis],
                    size: self.size[axis],
                });
            }
            start = index[axis]
                .checked_mul(self.stride[axis])
                .and_then(|step| step.checked_add(start))
                .ok_or(Error::SizeOverflow)?;
        }
        let end = start
            .checked_add(self.format.pixel_size())
            .ok_or(Error::SizeOverflow)?;
        Ok(start..end)
    }

    fn backing(&self, range: &Range<usize>) -> Result<&SharedBuffer> {
        let actual = self.owner.as_ref().map_or(0, |buffer| buffer.len());
        match self.owner.as_ref() {
            Some(buffer) if range.end <= actual => Ok(buffer),
            _ => Err(Error::BufferTooSmall {
                required: range.end,
                actual,
            }),
        }
    }
}

impl<const D: usize> fmt::Debug for Pixels<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pixels({:?}, stride {:?}, {})",
            self.size,
            self.stride,
            self.format()
        )
    }
}

// ---------------------------------------------------------------------------
// PixelsMut (read/write)
// ---------------------------------------------------------------------------

/// Writable strided pixel accessor. Writes land in the shared buffer.
#[derive(Clone)]
pub struct PixelsMut<const D: usize> {
    inner: Pixels<D>,
}

impl<const D: usize> PixelsMut<D> {
    pub(crate) fn new(
        owner: Option<SharedBuffer>,
        storage: &PixelStorage,
        format: PixelFormat,
        size: [u32; D],
    ) -> Result<Self> {
        Ok(Self {
            inner: Pixels::new(owner, storage, format, size)?,
        })
    }

    /// Encode `pixel` and store it at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelCount`] if the channel count differs from the
    /// format, plus the errors of [`Pixels::get`].
    pub fn set(&self, index: [usize; D], pixel: impl Into<Pixel>) -> Result<()> {
        let pixel = pixel.into();
        let expected = self.inner.element.channels as usize;
        if pixel.len() != expected {
            return Err(Error::ChannelCount {
                expected,
                actual: pixel.len(),
            });
        }
        let range = self.inner.byte_range(index)?;
        let buffer = self.inner.backing(&range)?;
        trace!("pixel write at {index:?}, bytes {range:?}");
        buffer.write(|bytes| encode(self.inner.format, self.inner.element, &pixel, &mut bytes[range]))
    }

    /// Read, transform and write back the pixel at `index`.
    ///
    /// ```
    /// use pixstore::{Buffer, MutableImageView2D, PixelFormat};
    ///
    /// let data = Buffer::from_pod_mut(&[1.0f32, 2.0, 3.0, 4.0]);
    /// let view = MutableImageView2D::new(PixelFormat::Rg32Float, [2, 1], data).unwrap();
    /// let pixels = view.pixels_mut().unwrap();
    /// pixels.update([0, 1], |px| px * 0.25).unwrap();
    /// assert_eq!(pixels.get([0, 1]).unwrap().as_slice(), &[0.75, 1.0]);
    /// ```
    ///
    /// # Errors
    ///
    /// Same as [`set`](Self::set).
    pub fn update(&self, index: [usize; D], f: impl FnOnce(Pixel) -> Pixel) -> Result<()> {
        let pixel = self.inner.get(index)?;
        self.set(index, f(pixel))
    }
}

impl<const D: usize> Deref for PixelsMut<D> {
    type Target = Pixels<D>;

    fn deref(&self) -> &Pixels<D> {
        &self.inner
    }
}

impl<const D: usize> fmt::Debug for PixelsMut<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mut{:?}", self.inner)
    }
}

// ---------------------------------------------------------------------------
// Axis order
// ---------------------------------------------------------------------------

/// Storage order (fastest first) to presentation order (slowest first).
pub(crate) fn reverse_axes<T: Copy, const D: usize>(mut axes: [T; D]) -> [T; D] {
    axes.reverse();
    axes
}

// ---------------------------------------------------------------------------
// Channel codecs
// ---------------------------------------------------------------------------

fn decode(format: PixelFormat, element: ElementFormat, bytes: &[u8]) -> Pixel {
    let channels = element.channels as usize;
    let mut out = [0.0f64; 4];
    for (value, chunk) in out
        .iter_mut()
        .zip(bytes.chunks_exact(element.element.byte_size()))
        .take(channels)
    {
        *value = match element.element {
            ElementType::U8 => chunk[0] as f64,
            ElementType::I8 => chunk[0] as i8 as f64,
            ElementType::U16 => parse_u16(chunk) as f64,
            ElementType::I16 => parse_u16(chunk) as i16 as f64,
            ElementType::U32 => parse_u32(chunk) as f64,
            ElementType::I32 => parse_u32(chunk) as i32 as f64,
            ElementType::F16 => f16::from_bits(parse_u16(chunk)).to_f32() as f64,
            ElementType::F32 => f32::from_bits(parse_u32(chunk)) as f64,
        };
    }

    if format.is_srgb() {
        for (c, value) in out[..channels].iter_mut().enumerate() {
            let unpacked = *value as f32 / 255.0;
            *value = if is_alpha(format, c) {
                unpacked as f64
            } else {
                srgb_to_linear(unpacked) as f64
            };
        }
    }

    Pixel {
        channels: out,
        len: element.channels,
    }
}

fn encode(format: PixelFormat, element: ElementFormat, pixel: &Pixel, out: &mut [u8]) {
    let size = element.element.byte_size();
    for (c, (&value, dst)) in pixel
        .as_slice()
        .iter()
        .zip(out.chunks_exact_mut(size))
        .enumerate()
    {
        let value = if format.is_srgb() {
            let linear = (value as f32).clamp(0.0, 1.0);
            let encoded = if is_alpha(format, c) {
                linear
            } else {
                linear_to_srgb(linear)
            };
            (encoded.clamp(0.0, 1.0) * 255.0).round() as f64
        } else {
            value
        };

        // Float-to-int `as` casts saturate at the target range.
        match element.element {
            ElementType::U8 => dst[0] = value.round() as u8,
            ElementType::I8 => dst.copy_from_slice(&(value.round() as i8).to_ne_bytes()),
            ElementType::U16 => dst.copy_from_slice(&(value.round() as u16).to_ne_bytes()),
            ElementType::I16 => dst.copy_from_slice(&(value.round() as i16).to_ne_bytes()),
            ElementType::U32 => dst.copy_from_slice(&(value.round() as u32).to_ne_bytes()),
            ElementType::I32 => dst.copy_from_slice(&(value.round() as i32).to_ne_bytes()),
            ElementType::F16 => dst.copy_from_slice(&f16::from_f64(value).to_bits().to_ne_bytes()),
            ElementType::F32 => dst.copy_from_slice(&(value as f32).to_ne_bytes()),
        }
    }
}

#[inline]
fn is_alpha(format: PixelFormat, channel: usize) -> bool {
    format.has_alpha() && channel == 3
}

#[inline]
fn parse_u16(bytes: &[u8]) -> u16 {
    u16::from_ne_bytes([bytes[0], bytes[1]])
}

#[inline]
fn parse_u32(bytes: &[u8]) -> u32 {
    u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Buffer;

    fn rgb8_rows() -> SharedBuffer {
        Buffer::new_mut(b"rgbRGB  abcABC  defDEF  ijkIJK  ".to_vec())
    }

    #[test]
    fn reverse_axes_is_independent_of_layout() {
        assert_eq!(reverse_axes([1, 2, 3]), [3, 2, 1]);
        assert_eq!(reverse_axes([2, 4]), [4, 2]);
        assert_eq!(reverse_axes([32]), [32]);
    }

    #[test]
    fn presents_rows_slowest_first() {
        let pixels = Pixels::new(
            Some(rgb8_rows()),
            &PixelStorage::new(),
            PixelFormat::Rgb8Uint,
            [2, 4],
        )
        .unwrap();
        assert_eq!(pixels.size(), [4, 2]);
        assert_eq!(pixels.stride(), [8, 3]);
        assert_eq!(pixels.format(), "3B");
        assert_eq!(pixels.get([1, 0]).unwrap().g(), b'b' as f64);
        assert_eq!(pixels.get([2, 1]).unwrap().g(), b'E' as f64);
    }

    #[test]
    fn three_dimensional_strides() {
        let storage = PixelStorage::new().with_alignment(2).unwrap();
        let pixels = Pixels::new(None, &storage, PixelFormat::Rgb8Unorm, [2, 2, 2]).unwrap();
        assert_eq!(pixels.size(), [2, 2, 2]);
        assert_eq!(pixels.stride(), [12, 6, 3]);
    }

    #[test]
    fn skip_moves_the_origin() {
        let storage = PixelStorage::new()
            .with_row_length(2)
            .with_skip([1, 1, 0]);
        let pixels = Pixels::new(Some(rgb8_rows()), &storage, PixelFormat::Rgb8Uint, [1, 3])
            .unwrap();
        // rows are 8 bytes, one row and one pixel in lands on "ABC"
        assert_eq!(pixels.get([0, 0]).unwrap().as_slice(), &[65.0, 66.0, 67.0]);
    }

    #[test]
    fn out_of_bounds_index() {
        let pixels = Pixels::new(
            Some(rgb8_rows()),
            &PixelStorage::new(),
            PixelFormat::Rgb8Uint,
            [2, 4],
        )
        .unwrap();
        assert_eq!(
            pixels.get([4, 0]),
            Err(Error::OutOfBounds {
                axis: 0,
                index: 4,
                size: 4
            })
        );
        assert!(matches!(
            pixels.get([0, 2]),
            Err(Error::OutOfBounds { axis: 1, .. })
        ));
    }

    #[test]
    fn missing_data_is_reported() {
        let pixels = Pixels::new(None, &PixelStorage::new(), PixelFormat::R32Float, [8, 8]).unwrap();
        assert_eq!(
            pixels.get([0, 0]),
            Err(Error::BufferTooSmall {
                required: 4,
                actual: 0
            })
        );
    }

    #[test]
    fn signed_and_wide_integers() {
        let data = Buffer::from_pod_mut(&[-2i16, 300, i16::MIN, 7]);
        let pixels = PixelsMut::new(Some(data), &PixelStorage::new(), PixelFormat::Rg16Sint, [2])
            .unwrap();
        assert_eq!(pixels.format(), "2h");
        assert_eq!(pixels.get([0]).unwrap().as_slice(), &[-2.0, 300.0]);
        assert_eq!(pixels.get([1]).unwrap().as_slice(), &[-32768.0, 7.0]);
        pixels.set([0], [1e9, -1e9]).unwrap();
        assert_eq!(pixels.get([0]).unwrap().as_slice(), &[32767.0, -32768.0]);
    }

    #[test]
    fn half_floats_expand_and_narrow() {
        let data = Buffer::from_pod_mut(&[0x0000u16, 0x3c00, 0x4000, 0x4200]);
        let pixels = PixelsMut::new(
            Some(data.clone()),
            &PixelStorage::new(),
            PixelFormat::Rg16Float,
            [2, 1],
        )
        .unwrap();
        assert_eq!(pixels.get([0, 0]).unwrap().as_slice(), &[0.0, 1.0]);
        pixels.set([0, 0], [0.5, -2.0]).unwrap();
        assert_eq!(data.to_pod_vec::<u16>()[..2], [0x3800, 0xc000]);
    }

    #[test]
    fn rejects_wrong_channel_count() {
        let pixels = PixelsMut::new(
            Some(rgb8_rows()),
            &PixelStorage::new(),
            PixelFormat::Rgb8Uint,
            [2, 4],
        )
        .unwrap();
        assert_eq!(
            pixels.set([0, 0], [1.0, 2.0]),
            Err(Error::ChannelCount {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn writes_to_read_only_data_fail() {
        let data = Buffer::new(b"rgbRGB  ".to_vec());
        let pixels =
            PixelsMut::new(Some(data), &PixelStorage::new(), PixelFormat::Rgb8Uint, [2]).unwrap();
        assert_eq!(pixels.set([0], [0.0, 0.0, 0.0]), Err(Error::ReadOnlyBuffer));
    }

    #[test]
    fn unsupported_formats() {
        assert_eq!(
            Pixels::new(None, &PixelStorage::new(), PixelFormat::Depth32Float, [0, 0]).err(),
            Some(Error::UnsupportedFormat(PixelFormat::Depth32Float))
        );
    }

    #[test]
    fn pixel_arithmetic() {
        let mut px = Pixel::from([1.0, 2.0]);
        px *= 0.5;
        assert_eq!(px.as_slice(), &[0.5, 1.0]);
        assert_eq!(px[1], 1.0);
        assert_eq!(Pixel::from(rgb::Rgb::new(1u8, 2, 3)).as_slice(), &[1.0, 2.0, 3.0]);
        assert!(Pixel::from([0.1, 0.2]).approx_eq(&Pixel::from([0.1000001, 0.2]), 1e-6));
        assert!(!Pixel::from([0.1]).approx_eq(&Pixel::from([0.1, 0.2]), 1e-6));
    }
}
