//! Crate-wide error type.

use thiserror::Error;

use crate::format::PixelFormat;

/// Errors from pixel storage, view construction and pixel access.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    /// Strided access was requested for a format without a decoder.
    ///
    /// Flat byte access through `data()` still works for these formats.
    #[error("access to this pixel format is not implemented yet, sorry")]
    UnsupportedFormat(PixelFormat),

    /// The supplied buffer cannot hold the layout implied by
    /// storage, format and size.
    #[error("data too small, got {actual} but expected at least {required} bytes")]
    BufferTooSmall {
        /// Bytes needed for the described layout.
        required: usize,
        /// Bytes actually supplied.
        actual: usize,
    },

    /// The byte size of a layout does not fit in `usize`.
    #[error("pixel layout size overflows usize")]
    SizeOverflow,

    /// A write hit a buffer whose bytes are still borrowed through
    /// [`Buffer::bytes`](crate::Buffer::bytes).
    #[error("buffer is borrowed and cannot be written")]
    BufferBorrowed,

    /// A read-only buffer was given where a writable one is required.
    #[error("buffer is not writable")]
    ReadOnlyBuffer,

    /// Row alignment is not a power of two.
    #[error("alignment {0} is not a power of two")]
    InvalidAlignment(u32),

    /// A pixel or byte index lies outside the accessed range.
    #[error("index {index} out of range for axis {axis} of size {size}")]
    OutOfBounds {
        /// Axis in presentation order (slowest first).
        axis: usize,
        /// Requested index along that axis.
        index: usize,
        /// Extent of that axis.
        size: usize,
    },

    /// A written pixel has a different channel count than the format.
    #[error("expected {expected} channels, got {actual}")]
    ChannelCount {
        /// Channels in the pixel format.
        expected: usize,
        /// Channels in the written value.
        actual: usize,
    },

    /// A pixel value was built from more channels than any format has.
    #[error("a pixel has at most four channels, got {0}")]
    TooManyChannels(usize),

    /// An allocation would exceed the configured resource limits.
    #[error("{what} limit exceeded: {actual} > {max}")]
    LimitExceeded {
        /// Which limit tripped.
        what: &'static str,
        /// The requested amount.
        actual: u64,
        /// The configured cap.
        max: u64,
    },
}

/// Shorthand for results carrying [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_message_is_fixed() {
        assert_eq!(
            Error::UnsupportedFormat(PixelFormat::Depth32Float).to_string(),
            "access to this pixel format is not implemented yet, sorry"
        );
    }

    #[test]
    fn buffer_too_small_mentions_both_sizes() {
        let msg = Error::BufferTooSmall {
            required: 32,
            actual: 24,
        }
        .to_string();
        assert!(msg.contains("32"));
        assert!(msg.contains("24"));
    }
}
