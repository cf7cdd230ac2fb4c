//! Resource limits for owned image allocation.
//!
//! [`ResourceLimits`] caps what [`Image::zeroed_with_limits`] may
//! allocate. Checks run before any memory is touched.
//!
//! [`Image::zeroed_with_limits`]: crate::Image::zeroed_with_limits

use crate::error::{Error, Result};

/// Caps on image allocation. `None` means no limit for that resource.
///
/// ```
/// use pixstore::ResourceLimits;
///
/// let limits = ResourceLimits::none()
///     .with_max_pixels(100_000_000)
///     .with_max_memory(512 * 1024 * 1024);
/// assert!(limits.has_any());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct ResourceLimits {
    /// Maximum extent along any single axis.
    pub max_extent: Option<u32>,
    /// Maximum total pixels (product of all extents).
    pub max_pixels: Option<u64>,
    /// Maximum buffer size in bytes.
    pub max_memory_bytes: Option<u64>,
}

impl ResourceLimits {
    /// No limits (all fields `None`).
    pub fn none() -> Self {
        Self::default()
    }

    /// Set maximum extent along any axis.
    pub fn with_max_extent(mut self, extent: u32) -> Self {
        self.max_extent = Some(extent);
        self
    }

    /// Set maximum total pixels.
    pub fn with_max_pixels(mut self, max: u64) -> Self {
        self.max_pixels = Some(max);
        self
    }

    /// Set maximum buffer size in bytes.
    pub fn with_max_memory(mut self, bytes: u64) -> Self {
        self.max_memory_bytes = Some(bytes);
        self
    }

    /// Whether any limits are set.
    pub fn has_any(&self) -> bool {
        self.max_extent.is_some() || self.max_pixels.is_some() || self.max_memory_bytes.is_some()
    }

    /// Check an extent against `max_extent` and `max_pixels`.
    pub fn check_size(&self, size: &[u32]) -> Result<()> {
        if let Some(max) = self.max_extent
            && let Some(&extent) = size.iter().find(|&&extent| extent > max)
        {
            return Err(Error::LimitExceeded {
                what: "extent",
                actual: extent as u64,
                max: max as u64,
            });
        }
        if let Some(max) = self.max_pixels {
            let pixels = size.iter().map(|&extent| extent as u64).product::<u64>();
            if pixels > max {
                return Err(Error::LimitExceeded {
                    what: "pixel count",
                    actual: pixels,
                    max,
                });
            }
        }
        Ok(())
    }

    /// Check a buffer size against `max_memory_bytes`.
    pub fn check_memory(&self, bytes: u64) -> Result<()> {
        if let Some(max) = self.max_memory_bytes
            && bytes > max
        {
            return Err(Error::LimitExceeded {
                what: "memory",
                actual: bytes,
                max,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_allows_everything() {
        let limits = ResourceLimits::none();
        assert!(!limits.has_any());
        assert!(limits.check_size(&[u32::MAX, u32::MAX]).is_ok());
        assert!(limits.check_memory(u64::MAX).is_ok());
    }

    #[test]
    fn extent_limit() {
        let limits = ResourceLimits::none().with_max_extent(100);
        assert!(limits.check_size(&[100, 100]).is_ok());
        assert_eq!(
            limits.check_size(&[10, 101]),
            Err(Error::LimitExceeded {
                what: "extent",
                actual: 101,
                max: 100
            })
        );
    }

    #[test]
    fn pixel_limit_uses_product() {
        let limits = ResourceLimits::none().with_max_pixels(64);
        assert!(limits.check_size(&[4, 4, 4]).is_ok());
        assert!(limits.check_size(&[4, 4, 5]).is_err());
    }

    #[test]
    fn memory_limit() {
        let limits = ResourceLimits::none().with_max_memory(1024);
        assert!(limits.check_memory(1024).is_ok());
        assert!(matches!(
            limits.check_memory(1025),
            Err(Error::LimitExceeded { what: "memory", .. })
        ));
    }
}
