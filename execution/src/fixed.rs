//! Checked fixed-point arithmetic on WAD-scaled (`10^18`) `u128` values.
//!
//! Products are formed at 256 bits so `amount * multiplier` never overflows
//! before the division brings it back into range. Every function returns
//! `None` when the final result does not fit in a `u128`.

use clickfarm_types::factory::WAD;

const LOW_MASK: u128 = u64::MAX as u128;

/// Full 256-bit product of `a * b` as `(high, low)` words.
fn widening_mul(a: u128, b: u128) -> (u128, u128) {
    let (a_hi, a_lo) = (a >> 64, a & LOW_MASK);
    let (b_hi, b_lo) = (b >> 64, b & LOW_MASK);

    let lo_lo = a_lo * b_lo;
    let lo_hi = a_lo * b_hi;
    let hi_lo = a_hi * b_lo;
    let hi_hi = a_hi * b_hi;

    // Each term is below 2^64, so the sum cannot overflow.
    let middle = (lo_lo >> 64) + (lo_hi & LOW_MASK) + (hi_lo & LOW_MASK);
    let low = (lo_lo & LOW_MASK) | (middle << 64);
    let high = hi_hi + (lo_hi >> 64) + (hi_lo >> 64) + (middle >> 64);
    (high, low)
}

/// `floor(a * b / d)`, or `None` if `d == 0` or the quotient exceeds `u128`.
pub fn mul_div(a: u128, b: u128, d: u128) -> Option<u128> {
    if d == 0 {
        return None;
    }
    let (high, low) = widening_mul(a, b);
    if high == 0 {
        return Some(low / d);
    }
    if high >= d {
        return None;
    }

    // Restoring long division of (high, low) by d; the remainder stays below d.
    let mut remainder = high;
    let mut quotient = 0u128;
    for shift in (0..128).rev() {
        let carry = remainder >> 127;
        remainder = (remainder << 1) | ((low >> shift) & 1);
        quotient <<= 1;
        if carry == 1 || remainder >= d {
            remainder = remainder.wrapping_sub(d);
            quotient |= 1;
        }
    }
    Some(quotient)
}

/// `a * b` where `b` is WAD-scaled.
pub fn mul_wad(a: u128, b: u128) -> Option<u128> {
    mul_div(a, b, WAD)
}

/// `a / b` where the result is WAD-scaled.
pub fn div_wad(a: u128, b: u128) -> Option<u128> {
    mul_div(a, WAD, b)
}

/// `base^exp` for a WAD-scaled base, by square-and-multiply.
pub fn pow_wad(base: u128, exp: u64) -> Option<u128> {
    let mut result = WAD;
    let mut base = base;
    let mut exp = exp;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mul_wad(result, base)?;
        }
        exp >>= 1;
        if exp > 0 {
            base = mul_wad(base, base)?;
        }
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mul_div_small() {
        assert_eq!(mul_div(6, 7, 3), Some(14));
        assert_eq!(mul_div(10, 10, 3), Some(33));
        assert_eq!(mul_div(1, 1, 0), None);
        assert_eq!(mul_div(0, u128::MAX, 1), Some(0));
    }

    #[test]
    fn test_mul_div_wide_intermediate() {
        // 1e24 * 1e24 overflows u128 but the quotient fits.
        let million_tokens = 1_000_000 * WAD;
        assert_eq!(mul_wad(million_tokens, million_tokens), Some(1_000_000_000_000 * WAD));
        assert_eq!(mul_div(u128::MAX, u128::MAX, u128::MAX), Some(u128::MAX));
        assert_eq!(mul_div(u128::MAX, 2, 2), Some(u128::MAX));
        assert_eq!(mul_div(u128::MAX, 3, 2), None);
    }

    #[test]
    fn test_div_wad() {
        assert_eq!(div_wad(3 * WAD, 2 * WAD), Some(WAD + WAD / 2));
        assert_eq!(div_wad(1, 0), None);
    }

    #[test]
    fn test_pow_wad() {
        assert_eq!(pow_wad(2 * WAD, 0), Some(WAD));
        assert_eq!(pow_wad(2 * WAD, 10), Some(1024 * WAD));
        let growth = WAD + 15 * WAD / 100;
        // 1.15^2 = 1.3225
        assert_eq!(pow_wad(growth, 2), Some(1_322_500_000_000_000_000));
        assert_eq!(pow_wad(u128::MAX / 2, 3), None);
    }

    proptest! {
        #[test]
        fn test_mul_div_matches_narrow(a in any::<u64>(), b in any::<u64>(), d in 1u64..) {
            let expected = (a as u128) * (b as u128) / (d as u128);
            prop_assert_eq!(mul_div(a as u128, b as u128, d as u128), Some(expected));
        }

        #[test]
        fn test_mul_div_inverts(a in any::<u128>(), d in 1u128..) {
            // (a * d) / d == a whenever the product is formed at full width.
            prop_assert_eq!(mul_div(a, d, d), Some(a));
        }
    }
}
