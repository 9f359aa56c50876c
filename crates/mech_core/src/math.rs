//! Fixed-point and integer helpers shared by the calculators.
//!
//! Dice math is integral; fixed-point only appears where geometry needs
//! fractions (hex line interpolation), keeping results platform independent.

use fixed::types::I32F32;

/// Fixed-point number type for fractional board geometry.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Integer division rounding towards positive infinity, for non-negative
/// numerators and positive divisors.
#[must_use]
pub const fn ceil_div(numerator: i32, divisor: i32) -> i32 {
    let quotient = numerator / divisor;
    if numerator % divisor > 0 {
        quotient + 1
    } else {
        quotient
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceil_div() {
        assert_eq!(ceil_div(50, 10), 5);
        assert_eq!(ceil_div(55, 10), 6);
        assert_eq!(ceil_div(1, 10), 1);
        assert_eq!(ceil_div(0, 10), 0);
    }

    #[test]
    fn test_ceil_div_near_max() {
        assert_eq!(ceil_div(i32::MAX, 10), 214_748_365);
        assert_eq!(ceil_div(i32::MAX, 1), i32::MAX);
    }

    #[test]
    fn test_fixed_determinism() {
        let a = Fixed::from_num(1) / Fixed::from_num(3);
        let b = Fixed::from_num(1) / Fixed::from_num(3);
        assert_eq!(a * Fixed::from_num(7), b * Fixed::from_num(7));
    }
}
