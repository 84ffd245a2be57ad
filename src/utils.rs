//! Utilities module.

use crate::bvh::INVALID;

/// Fast floating point minimum.  This function matches the semantics of
///
/// ```no_compile
/// if x < y { x } else { y }
/// ```
///
/// which has efficient instruction sequences on many platforms (1 instruction on x86).  For most
/// values, it matches the semantics of `x.min(y)`; the special cases are:
///
/// ```text
/// min(-0.0, +0.0); +0.0
/// min(+0.0, -0.0): -0.0
/// min( NaN,  1.0):  1.0
/// min( 1.0,  NaN):  NaN
/// ```
///
/// These are the semantics of `minps`, so the scalar and the SIMD bounds reductions agree
/// bit for bit.
#[cfg(any(not(feature = "simd"), test))]
#[inline(always)]
pub fn fast_min(x: f32, y: f32) -> f32 {
    if x < y {
        x
    } else {
        y
    }
}

/// Fast floating point maximum.  This function matches the semantics of
///
/// ```no_compile
/// if x > y { x } else { y }
/// ```
///
/// which has efficient instruction sequences on many platforms (1 instruction on x86).  For most
/// values, it matches the semantics of `x.max(y)`; the special cases are:
///
/// ```text
/// max(-0.0, +0.0); +0.0
/// max(+0.0, -0.0): -0.0
/// max( NaN,  1.0):  1.0
/// max( 1.0,  NaN):  NaN
/// ```
#[cfg(any(not(feature = "simd"), test))]
#[inline(always)]
pub fn fast_max(x: f32, y: f32) -> f32 {
    if x > y {
        x
    } else {
        y
    }
}

/// Narrows a node or triangle index to the 32-bit index space of the GPU buffers.
///
/// The caller has already checked that the triangle count fits, so the only value this
/// must never produce is the [`INVALID`] sentinel.
#[inline(always)]
pub fn to_u32(index: usize) -> u32 {
    debug_assert!(index < INVALID as usize, "index {} overflows u32 node space", index);
    index as u32
}

#[cfg(test)]
mod tests {
    use crate::utils::{fast_max, fast_min, to_u32};

    #[test]
    fn test_fast_min_max_match_std_for_ordinary_values() {
        let values = [-3.5_f32, -0.25, 0.0, 1.0, 7.75, 1e20];
        for &x in &values {
            for &y in &values {
                assert_eq!(fast_min(x, y), x.min(y));
                assert_eq!(fast_max(x, y), x.max(y));
            }
        }
    }

    #[test]
    fn test_fast_min_max_nan_picks_second_operand() {
        assert_eq!(fast_min(f32::NAN, 1.0), 1.0);
        assert!(fast_min(1.0, f32::NAN).is_nan());
        assert_eq!(fast_max(f32::NAN, 1.0), 1.0);
        assert!(fast_max(1.0, f32::NAN).is_nan());
    }

    #[test]
    fn test_to_u32_keeps_value() {
        assert_eq!(to_u32(0), 0);
        assert_eq!(to_u32(123_456), 123_456);
    }
}
