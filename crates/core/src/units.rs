//! Conversion between millimeters and English Metric Units (EMU).
//!
//! All public-facing positions and sizes are in millimeters; the PPTX format
//! stores integer EMUs.

use crate::error::{Error, Result};

/// A distance in English Metric Units.
pub type Emu = i64;

/// Number of EMUs in one millimeter.
pub const EMU_PER_MM: i64 = 36_000;

/// Convert millimeters to EMUs.
///
/// Integer millimeter inputs convert exactly. Negative, NaN and infinite
/// inputs are rejected with [`Error::InvalidDimension`].
pub fn to_native(mm: f64) -> Result<Emu> {
    if !mm.is_finite() || mm < 0.0 {
        return Err(Error::InvalidDimension(mm));
    }
    Ok((mm * EMU_PER_MM as f64).round() as Emu)
}

/// Convert EMUs back to millimeters.
pub fn from_native(emu: Emu) -> f64 {
    emu as f64 / EMU_PER_MM as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_millimeters_are_exact() {
        for mm in [0u32, 1, 40, 50, 150, 254, 10_000] {
            assert_eq!(to_native(mm as f64).unwrap(), mm as i64 * EMU_PER_MM);
        }
    }

    #[test]
    fn test_fractional_millimeters_round() {
        assert_eq!(to_native(0.5).unwrap(), 18_000);
        assert_eq!(to_native(12.25).unwrap(), 441_000);
    }

    #[test]
    fn test_negative_rejected() {
        assert!(matches!(to_native(-1.0), Err(Error::InvalidDimension(_))));
        assert!(matches!(to_native(-0.001), Err(Error::InvalidDimension(_))));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(to_native(f64::NAN).is_err());
        assert!(to_native(f64::INFINITY).is_err());
    }

    #[test]
    fn test_from_native() {
        assert_eq!(from_native(1_800_000), 50.0);
    }
}
