//! Fixed-point and integer math helpers used by the period translation.
//!
//! Everything in here runs at poll rate on a Cortex-M0+, which has no 64 bit
//! multiply or any divide instruction, so all of it sticks to 32 bit
//! operations.

use crate::{DutyFxP, PhaseFxP};

/// Calculate `a * b / d` without overflowing 32 bits.
///
/// When the product fits it is used directly.  Otherwise `a` is divided
/// first, `(a / d) * b`, and the contribution of the remainder,
/// `(a % d) * b / d`, is added back so that the result stays exact.  If the
/// exact result itself does not fit in a `u32` this saturates to `u32::MAX`.
///
/// # Panics
///
/// Panics if `d` is zero.
///
/// ```
/// use lamb::mul_div;
/// assert_eq!(mul_div(20_000_000, 58_982, 65_536), 17_999_877);
/// assert_eq!(mul_div(1000, 3, 7), 428);
/// ```
pub fn mul_div(a: u32, b: u32, d: u32) -> u32 {
    if b == 0 || a <= u32::MAX / b {
        return a * b / d;
    }
    let quot = a / d;
    let rem = a % d;
    let Some(whole) = quot.checked_mul(b) else {
        return u32::MAX;
    };
    // rem < d, so this only overflows for divisors wider than 16 bits.  The
    // quotient is less than b, so it always fits.
    let part = match rem.checked_mul(b) {
        Some(prod) => prod / d,
        None => ((rem as u64 * b as u64) / d as u64) as u32,
    };
    whole.saturating_add(part)
}

/// Scale `period` by `duty`, returning `period * duty` in the same units
pub fn scale_by_duty(period: u32, duty: DutyFxP) -> u32 {
    const DOMAIN: u32 = 1 << DutyFxP::FRAC_NBITS;
    mul_div(period, duty.to_bits() as u32, DOMAIN)
}

/// Linearly map `x` in `[0, domain]` onto `[from, to]`.  `from` may be
/// larger than `to`, in which case the map is decreasing.
pub fn interpolate(x: u32, domain: u32, from: u32, to: u32) -> u32 {
    let x = x.min(domain);
    if to >= from {
        from + mul_div(to - from, x, domain)
    } else {
        from - mul_div(from - to, x, domain)
    }
}

/// The per-tick phase step needed to sweep the whole scaled resolution in
/// `duration_us`, when one tick lasts `tick_us`.  Never less than the
/// smallest representable step and never more than the full resolution, so
/// the accumulator can neither freeze nor skip more than one bound per tick.
pub fn phase_increment(duration_us: u32, tick_us: u32) -> PhaseFxP {
    let full = crate::SCALED_RESOLUTION.to_bits() as u32;
    let bits = mul_div(full, tick_us, duration_us.max(1));
    PhaseFxP::from_bits(bits.clamp(1, full) as i32)
}
