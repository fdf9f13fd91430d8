//! 16-byte IEEE binary128 floats.

use bytemuck::{Pod, Zeroable};
use std::fmt;

const MANTISSA_BITS: u32 = 112;
const EXP_MASK: u128 = 0x7fff;
const EXP_BIAS: i32 = 16383;

/// A 16-byte float kept as its raw binary128 bits.
///
/// No native machine float has this width, so values are held exactly and
/// only widened to `f64` for display. Writing one back is never supported.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct WideDecimal {
    bits: u128,
}

impl WideDecimal {
    #[inline]
    pub const fn from_bits(bits: u128) -> Self {
        Self { bits }
    }

    #[inline]
    pub const fn to_bits(self) -> u128 {
        self.bits
    }

    pub fn from_le_bytes(bytes: [u8; 16]) -> Self {
        Self::from_bits(u128::from_le_bytes(bytes))
    }

    pub fn from_be_bytes(bytes: [u8; 16]) -> Self {
        Self::from_bits(u128::from_be_bytes(bytes))
    }

    pub fn to_le_bytes(self) -> [u8; 16] {
        self.bits.to_le_bytes()
    }

    fn sign(self) -> bool {
        self.bits >> 127 != 0
    }

    fn biased_exponent(self) -> u128 {
        (self.bits >> MANTISSA_BITS) & EXP_MASK
    }

    fn mantissa(self) -> u128 {
        self.bits & ((1u128 << MANTISSA_BITS) - 1)
    }

    pub fn is_nan(self) -> bool {
        self.biased_exponent() == EXP_MASK && self.mantissa() != 0
    }

    /// Nearest `f64` (mantissa truncated, out-of-range exponents saturate).
    pub fn to_f64(self) -> f64 {
        let sign = if self.sign() { -1.0 } else { 1.0 };
        let exp = self.biased_exponent();
        let mant = self.mantissa();

        if exp == EXP_MASK {
            return if mant == 0 { sign * f64::INFINITY } else { f64::NAN };
        }
        if exp == 0 {
            // binary128 subnormals are far below the f64 range
            return sign * 0.0;
        }

        let e = exp as i32 - EXP_BIAS;
        if e > 1023 {
            return sign * f64::INFINITY;
        }
        if e < -1074 {
            return sign * 0.0;
        }
        let fraction = (mant >> (MANTISSA_BITS - 52)) as f64 / (1u64 << 52) as f64;
        // split the scale so neither factor overflows before the product
        let half = e / 2;
        sign * (1.0 + fraction) * 2f64.powi(half) * 2f64.powi(e - half)
    }

    /// Exact widening of an `f64`.
    pub fn from_f64(value: f64) -> Self {
        let raw = value.to_bits();
        let sign = (raw >> 63) as u128;
        let exp = ((raw >> 52) & 0x7ff) as i32;
        let mut mant = (raw & ((1u64 << 52) - 1)) as u128;

        let (exp, mant) = if exp == 0x7ff {
            (EXP_MASK, if mant == 0 { 0 } else { 1u128 << (MANTISSA_BITS - 1) })
        } else if exp == 0 && mant == 0 {
            (0, 0)
        } else if exp == 0 {
            // f64 subnormal: normalize into the wider exponent range
            let shift = mant.leading_zeros() - (128 - 52) + 1;
            mant = (mant << shift) & ((1u128 << 52) - 1);
            let e = -1022 - shift as i32;
            ((e + EXP_BIAS) as u128, mant << (MANTISSA_BITS - 52))
        } else {
            ((exp - 1023 + EXP_BIAS) as u128, mant << (MANTISSA_BITS - 52))
        };

        Self::from_bits((sign << 127) | (exp << MANTISSA_BITS) | mant)
    }
}

impl fmt::Debug for WideDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WideDecimal({:#034x})", self.bits)
    }
}

impl fmt::Display for WideDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one() {
        // 1.0 in binary128: biased exponent 0x3fff, zero mantissa
        let one = WideDecimal::from_bits(0x3fff_u128 << 112);
        assert_eq!(one.to_f64(), 1.0);
        assert_eq!(WideDecimal::from_f64(1.0), one);
    }

    #[test]
    fn test_widen_and_narrow() {
        for v in [0.0, -2.5, 3.141592653589793, 1e300, -1e-300, f64::MIN_POSITIVE / 8.0] {
            assert_eq!(WideDecimal::from_f64(v).to_f64(), v, "value {}", v);
        }
    }

    #[test]
    fn test_specials() {
        assert!(WideDecimal::from_f64(f64::NAN).is_nan());
        assert_eq!(WideDecimal::from_f64(f64::INFINITY).to_f64(), f64::INFINITY);
        assert_eq!(WideDecimal::from_f64(f64::NEG_INFINITY).to_f64(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_byte_order() {
        let v = WideDecimal::from_f64(-6.0);
        let le = v.to_le_bytes();
        let mut be = le;
        be.reverse();
        assert_eq!(WideDecimal::from_le_bytes(le), v);
        assert_eq!(WideDecimal::from_be_bytes(be), v);
        assert_eq!(v.to_string(), "-6");
    }
}
