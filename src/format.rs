//! Pixel format catalog.
//!
//! [`PixelFormat`] is a closed lookup table: every value knows its channel
//! count, component storage type and interpretation, and derived byte size.
//! [`ElementFormat`] describes how the strided pixel accessor sees a single
//! pixel in memory.

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Component descriptors
// ---------------------------------------------------------------------------

/// Storage type of a single channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ComponentType {
    /// 8-bit unsigned integer.
    U8,
    /// 8-bit signed integer.
    I8,
    /// 16-bit unsigned integer.
    U16,
    /// 16-bit signed integer.
    I16,
    /// 32-bit unsigned integer.
    U32,
    /// 32-bit signed integer.
    I32,
    /// IEEE 754 half-precision float.
    F16,
    /// IEEE 754 single-precision float.
    F32,
    /// Packed depth and/or stencil, not addressable per channel.
    DepthStencil,
}

impl ComponentType {
    /// Byte size of a single channel. Zero for packed depth/stencil.
    #[inline]
    pub const fn byte_size(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 | Self::F16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::DepthStencil => 0,
        }
    }
}

/// How stored channel values are interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Interpretation {
    /// Unsigned normalized to `[0, 1]`.
    Unorm,
    /// Signed normalized to `[-1, 1]`.
    Snorm,
    /// Unsigned normalized with the sRGB transfer curve.
    Srgb,
    /// Unnormalized unsigned integer.
    UnsignedInt,
    /// Unnormalized signed integer.
    SignedInt,
    /// Floating point.
    Float,
    /// Depth and/or stencil.
    DepthStencil,
}

// ---------------------------------------------------------------------------
// PixelFormat
// ---------------------------------------------------------------------------

/// Format of pixel data.
///
/// Naming follows `<channels><bits><interpretation>`, so [`Rgb8Unorm`]
/// is three 8-bit unsigned normalized channels.
///
/// [`Rgb8Unorm`]: PixelFormat::Rgb8Unorm
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelFormat {
    /// Red, 8-bit unsigned normalized channel.
    R8Unorm,
    /// Red and green, 8-bit unsigned normalized channels.
    Rg8Unorm,
    /// RGB, 8-bit unsigned normalized channels.
    Rgb8Unorm,
    /// RGBA, 8-bit unsigned normalized channels.
    Rgba8Unorm,
    /// Red, 8-bit signed normalized channel.
    R8Snorm,
    /// Red and green, 8-bit signed normalized channels.
    Rg8Snorm,
    /// RGB, 8-bit signed normalized channels.
    Rgb8Snorm,
    /// RGBA, 8-bit signed normalized channels.
    Rgba8Snorm,
    /// Red, 8-bit sRGB-encoded channel.
    R8Srgb,
    /// Red and green, 8-bit sRGB-encoded channels.
    Rg8Srgb,
    /// RGB, 8-bit sRGB-encoded channels.
    Rgb8Srgb,
    /// RGB, 8-bit sRGB-encoded channels and linear 8-bit alpha.
    Rgba8Srgb,
    /// Red, 8-bit unsigned integer channel.
    R8Uint,
    /// Red and green, 8-bit unsigned integer channels.
    Rg8Uint,
    /// RGB, 8-bit unsigned integer channels.
    Rgb8Uint,
    /// RGBA, 8-bit unsigned integer channels.
    Rgba8Uint,
    /// Red, 8-bit signed integer channel.
    R8Sint,
    /// Red and green, 8-bit signed integer channels.
    Rg8Sint,
    /// RGB, 8-bit signed integer channels.
    Rgb8Sint,
    /// RGBA, 8-bit signed integer channels.
    Rgba8Sint,
    /// Red, 16-bit unsigned normalized channel.
    R16Unorm,
    /// Red and green, 16-bit unsigned normalized channels.
    Rg16Unorm,
    /// RGB, 16-bit unsigned normalized channels.
    Rgb16Unorm,
    /// RGBA, 16-bit unsigned normalized channels.
    Rgba16Unorm,
    /// Red, 16-bit signed normalized channel.
    R16Snorm,
    /// Red and green, 16-bit signed normalized channels.
    Rg16Snorm,
    /// RGB, 16-bit signed normalized channels.
    Rgb16Snorm,
    /// RGBA, 16-bit signed normalized channels.
    Rgba16Snorm,
    /// Red, 16-bit unsigned integer channel.
    R16Uint,
    /// Red and green, 16-bit unsigned integer channels.
    Rg16Uint,
    /// RGB, 16-bit unsigned integer channels.
    Rgb16Uint,
    /// RGBA, 16-bit unsigned integer channels.
    Rgba16Uint,
    /// Red, 16-bit signed integer channel.
    R16Sint,
    /// Red and green, 16-bit signed integer channels.
    Rg16Sint,
    /// RGB, 16-bit signed integer channels.
    Rgb16Sint,
    /// RGBA, 16-bit signed integer channels.
    Rgba16Sint,
    /// Red, 32-bit unsigned integer channel.
    R32Uint,
    /// Red and green, 32-bit unsigned integer channels.
    Rg32Uint,
    /// RGB, 32-bit unsigned integer channels.
    Rgb32Uint,
    /// RGBA, 32-bit unsigned integer channels.
    Rgba32Uint,
    /// Red, 32-bit signed integer channel.
    R32Sint,
    /// Red and green, 32-bit signed integer channels.
    Rg32Sint,
    /// RGB, 32-bit signed integer channels.
    Rgb32Sint,
    /// RGBA, 32-bit signed integer channels.
    Rgba32Sint,
    /// Red, 16-bit float channel.
    R16Float,
    /// Red and green, 16-bit float channels.
    Rg16Float,
    /// RGB, 16-bit float channels.
    Rgb16Float,
    /// RGBA, 16-bit float channels.
    Rgba16Float,
    /// Red, 32-bit float channel.
    R32Float,
    /// Red and green, 32-bit float channels.
    Rg32Float,
    /// RGB, 32-bit float channels.
    Rgb32Float,
    /// RGBA, 32-bit float channels.
    Rgba32Float,
    /// 16-bit unsigned normalized depth.
    Depth16Unorm,
    /// 24-bit depth padded to four bytes.
    Depth24Unorm,
    /// 32-bit float depth.
    Depth32Float,
    /// 8-bit unsigned integer stencil.
    Stencil8Uint,
    /// 16-bit depth and 8-bit stencil, padded to four bytes.
    Depth16UnormStencil8Uint,
    /// 24-bit depth and 8-bit stencil, packed into four bytes.
    Depth24UnormStencil8Uint,
    /// 32-bit float depth and 8-bit stencil, padded to eight bytes.
    Depth32FloatStencil8Uint,
}

impl PixelFormat {
    /// Number of channels. Depth+stencil formats report two.
    pub const fn channel_count(self) -> usize {
        use PixelFormat::*;
        match self {
            R8Unorm | R8Snorm | R8Srgb | R8Uint | R8Sint | R16Unorm | R16Snorm | R16Uint
            | R16Sint | R32Uint | R32Sint | R16Float | R32Float | Depth16Unorm
            | Depth24Unorm | Depth32Float | Stencil8Uint => 1,
            Rg8Unorm | Rg8Snorm | Rg8Srgb | Rg8Uint | Rg8Sint | Rg16Unorm | Rg16Snorm
            | Rg16Uint | Rg16Sint | Rg32Uint | Rg32Sint | Rg16Float | Rg32Float
            | Depth16UnormStencil8Uint | Depth24UnormStencil8Uint
            | Depth32FloatStencil8Uint => 2,
            Rgb8Unorm | Rgb8Snorm | Rgb8Srgb | Rgb8Uint | Rgb8Sint | Rgb16Unorm
            | Rgb16Snorm | Rgb16Uint | Rgb16Sint | Rgb32Uint | Rgb32Sint | Rgb16Float
            | Rgb32Float => 3,
            Rgba8Unorm | Rgba8Snorm | Rgba8Srgb | Rgba8Uint | Rgba8Sint | Rgba16Unorm
            | Rgba16Snorm | Rgba16Uint | Rgba16Sint | Rgba32Uint | Rgba32Sint
            | Rgba16Float | Rgba32Float => 4,
        }
    }

    /// Channel storage type.
    pub const fn component(self) -> ComponentType {
        use PixelFormat::*;
        match self {
            R8Unorm | Rg8Unorm | Rgb8Unorm | Rgba8Unorm | R8Srgb | Rg8Srgb | Rgb8Srgb
            | Rgba8Srgb | R8Uint | Rg8Uint | Rgb8Uint | Rgba8Uint => ComponentType::U8,
            R8Snorm | Rg8Snorm | Rgb8Snorm | Rgba8Snorm | R8Sint | Rg8Sint | Rgb8Sint
            | Rgba8Sint => ComponentType::I8,
            R16Unorm | Rg16Unorm | Rgb16Unorm | Rgba16Unorm | R16Uint | Rg16Uint
            | Rgb16Uint | Rgba16Uint => ComponentType::U16,
            R16Snorm | Rg16Snorm | Rgb16Snorm | Rgba16Snorm | R16Sint | Rg16Sint
            | Rgb16Sint | Rgba16Sint => ComponentType::I16,
            R32Uint | Rg32Uint | Rgb32Uint | Rgba32Uint => ComponentType::U32,
            R32Sint | Rg32Sint | Rgb32Sint | Rgba32Sint => ComponentType::I32,
            R16Float | Rg16Float | Rgb16Float | Rgba16Float => ComponentType::F16,
            R32Float | Rg32Float | Rgb32Float | Rgba32Float => ComponentType::F32,
            Depth16Unorm | Depth24Unorm | Depth32Float | Stencil8Uint
            | Depth16UnormStencil8Uint | Depth24UnormStencil8Uint
            | Depth32FloatStencil8Uint => ComponentType::DepthStencil,
        }
    }

    /// How channel values are interpreted.
    pub const fn interpretation(self) -> Interpretation {
        use PixelFormat::*;
        match self {
            R8Unorm | Rg8Unorm | Rgb8Unorm | Rgba8Unorm | R16Unorm | Rg16Unorm
            | Rgb16Unorm | Rgba16Unorm => Interpretation::Unorm,
            R8Snorm | Rg8Snorm | Rgb8Snorm | Rgba8Snorm | R16Snorm | Rg16Snorm
            | Rgb16Snorm | Rgba16Snorm => Interpretation::Snorm,
            R8Srgb | Rg8Srgb | Rgb8Srgb | Rgba8Srgb => Interpretation::Srgb,
            R8Uint | Rg8Uint | Rgb8Uint | Rgba8Uint | R16Uint | Rg16Uint | Rgb16Uint
            | Rgba16Uint | R32Uint | Rg32Uint | Rgb32Uint | Rgba32Uint => {
                Interpretation::UnsignedInt
            }
            R8Sint | Rg8Sint | Rgb8Sint | Rgba8Sint | R16Sint | Rg16Sint | Rgb16Sint
            | Rgba16Sint | R32Sint | Rg32Sint | Rgb32Sint | Rgba32Sint => {
                Interpretation::SignedInt
            }
            R16Float | Rg16Float | Rgb16Float | Rgba16Float | R32Float | Rg32Float
            | Rgb32Float | Rgba32Float => Interpretation::Float,
            Depth16Unorm | Depth24Unorm | Depth32Float | Stencil8Uint
            | Depth16UnormStencil8Uint | Depth24UnormStencil8Uint
            | Depth32FloatStencil8Uint => Interpretation::DepthStencil,
        }
    }

    /// Bytes per pixel, including padding of packed depth/stencil formats.
    pub const fn pixel_size(self) -> usize {
        match self {
            Self::Stencil8Uint => 1,
            Self::Depth16Unorm => 2,
            Self::Depth24Unorm
            | Self::Depth32Float
            | Self::Depth16UnormStencil8Uint
            | Self::Depth24UnormStencil8Uint => 4,
            Self::Depth32FloatStencil8Uint => 8,
            _ => self.channel_count() * self.component().byte_size(),
        }
    }

    /// Whether channels use the sRGB transfer curve.
    #[inline]
    pub const fn is_srgb(self) -> bool {
        matches!(self.interpretation(), Interpretation::Srgb)
    }

    /// Whether channels are normalized (Unorm, Snorm or sRGB).
    #[inline]
    pub const fn is_normalized(self) -> bool {
        matches!(
            self.interpretation(),
            Interpretation::Unorm | Interpretation::Snorm | Interpretation::Srgb
        )
    }

    /// Whether channels are unnormalized integers.
    #[inline]
    pub const fn is_integral(self) -> bool {
        matches!(
            self.interpretation(),
            Interpretation::UnsignedInt | Interpretation::SignedInt
        )
    }

    /// Whether this is a depth and/or stencil format.
    #[inline]
    pub const fn is_depth_or_stencil(self) -> bool {
        matches!(self.interpretation(), Interpretation::DepthStencil)
    }

    /// Whether the last channel is alpha.
    #[inline]
    pub const fn has_alpha(self) -> bool {
        self.channel_count() == 4 && !self.is_depth_or_stencil()
    }

    /// In-memory element layout seen by the strided pixel accessor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for formats without a channel
    /// decoder (currently all depth/stencil formats).
    pub fn element_format(self) -> Result<ElementFormat> {
        let element = match self.component() {
            ComponentType::U8 => ElementType::U8,
            ComponentType::I8 => ElementType::I8,
            ComponentType::U16 => ElementType::U16,
            ComponentType::I16 => ElementType::I16,
            ComponentType::U32 => ElementType::U32,
            ComponentType::I32 => ElementType::I32,
            ComponentType::F16 => ElementType::F16,
            ComponentType::F32 => ElementType::F32,
            ComponentType::DepthStencil => return Err(Error::UnsupportedFormat(self)),
        };
        Ok(ElementFormat {
            channels: self.channel_count() as u8,
            element,
        })
    }
}

// ---------------------------------------------------------------------------
// ElementFormat
// ---------------------------------------------------------------------------

/// Element type as addressed in memory by the pixel accessor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ElementType {
    U8 = 0,
    I8 = 1,
    U16 = 2,
    I16 = 3,
    U32 = 4,
    I32 = 5,
    /// Half-float; not natively addressable, expanded to `f32` on read.
    F16 = 6,
    F32 = 7,
}

impl ElementType {
    /// Byte size of one element.
    #[inline]
    pub const fn byte_size(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 | Self::F16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
        }
    }
}

// Rows: channel count - 1. Columns: ElementType discriminant.
const TAGS: [[&str; 8]; 4] = [
    ["B", "b", "H", "h", "I", "i", "e", "f"],
    ["2B", "2b", "2H", "2h", "2I", "2i", "2e", "2f"],
    ["3B", "3b", "3H", "3h", "3I", "3i", "3e", "3f"],
    ["4B", "4b", "4H", "4h", "4I", "4i", "4e", "4f"],
];

/// Channel count plus element type of one pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ElementFormat {
    /// Channels per pixel (1..=4).
    pub channels: u8,
    /// Storage type of each channel.
    pub element: ElementType,
}

impl ElementFormat {
    /// Struct-style tag: count prefix (omitted for one channel) followed
    /// by the element letter, e.g. `"3B"`, `"2f"`, `"2e"`.
    pub fn tag(self) -> &'static str {
        TAGS[(self.channels as usize).clamp(1, 4) - 1][self.element as usize]
    }
}
