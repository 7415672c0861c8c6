//! Floating point approximations of `exp` and `ln`, used to build the knob
//! lookup tables at startup when `libm` is not available.
//!
//! These only ever run once, so they favour accuracy over speed: both keep
//! iterating their series until the terms stop contributing to an `f64`.

#[cfg(any(test, doc, not(feature = "libm")))]
mod detail {
    use num_traits::float::FloatCore;

    const LN_2: f64 = core::f64::consts::LN_2;
    const EPSILON: f64 = f64::EPSILON / 4.0;

    /// Approximate e^x.  The argument is reduced to `x = n*ln(2) + r` with
    /// `|r| <= ln(2)/2`, then e^r is summed as a Taylor series and scaled by
    /// 2^n.
    pub fn exp_approx(x: f64) -> f64 {
        let n = FloatCore::round(x / LN_2);
        let r = x - n * LN_2;
        let mut term = 1f64;
        let mut acc = 1f64;
        let mut k = 1f64;
        while FloatCore::abs(term) > EPSILON * acc {
            term *= r / k;
            acc += term;
            k += 1.0;
        }
        acc * FloatCore::powi(2f64, n as i32)
    }

    /// Approximate ln(x) for positive `x`.  The argument is normalized to
    /// `x = m * 2^e` with `m` in `[1, 2)`, and ln(m) is computed as
    /// `2 * atanh((m - 1) / (m + 1))`, which converges quickly on that
    /// interval.  Returns `-inf` for zero and NaN for negative inputs.
    pub fn ln_approx(x: f64) -> f64 {
        if x.is_nan() || x < 0.0 {
            return f64::NAN;
        }
        if x == 0.0 {
            return f64::NEG_INFINITY;
        }
        let mut m = x;
        let mut e = 0i32;
        while m >= 2.0 {
            m /= 2.0;
            e += 1;
        }
        while m < 1.0 {
            m *= 2.0;
            e -= 1;
        }
        let s = (m - 1.0) / (m + 1.0);
        let s2 = s * s;
        let mut power = s;
        let mut acc = 0f64;
        let mut k = 1f64;
        loop {
            let term = power / k;
            acc += term;
            if term <= EPSILON * acc {
                break;
            }
            power *= s2;
            k += 2.0;
        }
        2.0 * acc + (e as f64) * LN_2
    }
}

#[cfg(any(test, doc, not(feature = "libm")))]
pub use detail::*;

/// e^x
pub fn exp(x: f64) -> f64 {
    #[cfg(not(feature = "libm"))]
    let ret = exp_approx(x);
    #[cfg(feature = "libm")]
    let ret = <f64 as num_traits::Float>::exp(x);
    ret
}

/// The natural logarithm of x
pub fn ln(x: f64) -> f64 {
    #[cfg(not(feature = "libm"))]
    let ret = ln_approx(x);
    #[cfg(feature = "libm")]
    let ret = <f64 as num_traits::Float>::ln(x);
    ret
}
