//! Floating scalar contract and back-ends.
//!
//! `f64` is the fast path; `rug::Float` (MPFR) is the arbitrary-precision
//! fallback reduction drivers switch to after a precision failure. The MPFR
//! working precision is process-wide state, queried and swapped through
//! [`FloatScalar::prec`] / [`FloatScalar::set_prec`].

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use rug::float::Special;
use rug::ops::NegAssign;
use rug::Float;

/// Working precision for newly created `rug::Float` values, in bits.
static FLOAT_PREC: AtomicU32 = AtomicU32::new(53);

fn current_prec() -> u32 {
    FLOAT_PREC.load(Ordering::SeqCst)
}

/// Number of mantissa digits used when decomposing a value into an `i64`
/// mantissa and an exponent.
const I64_DIGITS: i64 = 63;

/// Contract a floating-point back-end must satisfy.
///
/// NaN is the invalidation sentinel for cached Gram entries; arithmetic is
/// in-place on `self` and `mul_pow2` must be exact.
pub trait FloatScalar:
    Clone + PartialEq + PartialOrd + fmt::Debug + fmt::Display + Send + 'static
{
    fn zero() -> Self;
    fn nan() -> Self;
    fn from_f64(x: f64) -> Self;
    fn to_f64(&self) -> f64;
    fn set_nan(&mut self);
    fn is_nan(&self) -> bool;
    fn is_finite(&self) -> bool;
    fn is_zero(&self) -> bool;
    /// -1, 0 or 1 (0 for NaN)
    fn signum(&self) -> i32;
    /// `self += rhs`
    fn add_assign_ref(&mut self, rhs: &Self);
    /// `self -= rhs`
    fn sub_assign_ref(&mut self, rhs: &Self);
    /// `self *= rhs`
    fn mul_assign_ref(&mut self, rhs: &Self);
    /// `self /= rhs`
    fn div_assign_ref(&mut self, rhs: &Self);
    /// `self *= x`
    fn mul_assign_f64(&mut self, x: f64);
    /// `self *= 2^e`, exactly; `e` may be negative
    fn mul_pow2(&mut self, e: i64);
    fn neg_assign(&mut self);
    fn abs_assign(&mut self);
    fn sqrt_assign(&mut self);
    /// Natural logarithm
    fn ln_assign(&mut self);
    /// `self := e^self`
    fn exp_assign(&mut self);
    /// Round to the nearest integer value
    fn round_assign(&mut self);
    fn floor_assign(&mut self);
    /// Exponent `e` with `2^(e-1) <= |value| < 2^e`; 0 for zero or
    /// non-finite values
    fn exponent(&self) -> i64;
    /// `(mantissa, expo)` such that `trunc(value * 2^expo_add) ~= mantissa *
    /// 2^expo`, with `expo` the smallest non-negative value for which the
    /// mantissa fits an `i64`. Zero and non-finite values yield `(0, 0)`.
    fn to_i64_exp(&self, expo_add: i64) -> (i64, i64);
    /// Current working precision in bits
    fn prec() -> u32;
    /// Set the working precision, returning the previous value. A no-op for
    /// fixed-width back-ends.
    fn set_prec(prec: u32) -> u32;
}

impl FloatScalar for f64 {
    fn zero() -> Self {
        0.0
    }

    fn nan() -> Self {
        f64::NAN
    }

    fn from_f64(x: f64) -> Self {
        x
    }

    fn to_f64(&self) -> f64 {
        *self
    }

    fn set_nan(&mut self) {
        *self = f64::NAN;
    }

    fn is_nan(&self) -> bool {
        f64::is_nan(*self)
    }

    fn is_finite(&self) -> bool {
        f64::is_finite(*self)
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }

    fn signum(&self) -> i32 {
        if self.is_nan() || *self == 0.0 {
            0
        } else if *self > 0.0 {
            1
        } else {
            -1
        }
    }

    fn add_assign_ref(&mut self, rhs: &Self) {
        *self += *rhs;
    }

    fn sub_assign_ref(&mut self, rhs: &Self) {
        *self -= *rhs;
    }

    fn mul_assign_ref(&mut self, rhs: &Self) {
        *self *= *rhs;
    }

    fn div_assign_ref(&mut self, rhs: &Self) {
        *self /= *rhs;
    }

    fn mul_assign_f64(&mut self, x: f64) {
        *self *= x;
    }

    fn mul_pow2(&mut self, e: i64) {
        *self = libm::ldexp(*self, e as i32);
    }

    fn neg_assign(&mut self) {
        *self = -*self;
    }

    fn abs_assign(&mut self) {
        *self = self.abs();
    }

    fn sqrt_assign(&mut self) {
        *self = f64::sqrt(*self);
    }

    fn ln_assign(&mut self) {
        *self = f64::ln(*self);
    }

    fn exp_assign(&mut self) {
        *self = f64::exp(*self);
    }

    fn round_assign(&mut self) {
        *self = f64::round(*self);
    }

    fn floor_assign(&mut self) {
        *self = f64::floor(*self);
    }

    fn exponent(&self) -> i64 {
        if *self == 0.0 || !self.is_finite() {
            return 0;
        }
        libm::frexp(*self).1 as i64
    }

    fn to_i64_exp(&self, expo_add: i64) -> (i64, i64) {
        if *self == 0.0 || !self.is_finite() {
            return (0, 0);
        }
        let expo = (self.exponent() + expo_add - I64_DIGITS).max(0);
        let scaled = libm::ldexp(*self, (expo_add - expo) as i32);
        (scaled.trunc() as i64, expo)
    }

    fn prec() -> u32 {
        f64::MANTISSA_DIGITS
    }

    fn set_prec(_prec: u32) -> u32 {
        f64::MANTISSA_DIGITS
    }
}

impl FloatScalar for Float {
    fn zero() -> Self {
        Float::with_val(current_prec(), 0)
    }

    fn nan() -> Self {
        Float::with_val(current_prec(), Special::Nan)
    }

    fn from_f64(x: f64) -> Self {
        Float::with_val(current_prec(), x)
    }

    fn to_f64(&self) -> f64 {
        Float::to_f64(self)
    }

    fn set_nan(&mut self) {
        use rug::Assign;
        self.assign(Special::Nan);
    }

    fn is_nan(&self) -> bool {
        Float::is_nan(self)
    }

    fn is_finite(&self) -> bool {
        Float::is_finite(self)
    }

    fn is_zero(&self) -> bool {
        Float::is_zero(self)
    }

    fn signum(&self) -> i32 {
        self.cmp0().map_or(0, |o| o as i32)
    }

    fn add_assign_ref(&mut self, rhs: &Self) {
        *self += rhs;
    }

    fn sub_assign_ref(&mut self, rhs: &Self) {
        *self -= rhs;
    }

    fn mul_assign_ref(&mut self, rhs: &Self) {
        *self *= rhs;
    }

    fn div_assign_ref(&mut self, rhs: &Self) {
        *self /= rhs;
    }

    fn mul_assign_f64(&mut self, x: f64) {
        *self *= x;
    }

    fn mul_pow2(&mut self, e: i64) {
        *self <<= e as i32;
    }

    fn neg_assign(&mut self) {
        NegAssign::neg_assign(self);
    }

    fn abs_assign(&mut self) {
        self.abs_mut();
    }

    fn sqrt_assign(&mut self) {
        self.sqrt_mut();
    }

    fn ln_assign(&mut self) {
        self.ln_mut();
    }

    fn exp_assign(&mut self) {
        self.exp_mut();
    }

    fn round_assign(&mut self) {
        self.round_mut();
    }

    fn floor_assign(&mut self) {
        self.floor_mut();
    }

    fn exponent(&self) -> i64 {
        self.get_exp().map_or(0, |e| e as i64)
    }

    fn to_i64_exp(&self, expo_add: i64) -> (i64, i64) {
        if !Float::is_finite(self) || Float::is_zero(self) {
            return (0, 0);
        }
        let expo = (self.exponent() + expo_add - I64_DIGITS).max(0);
        let mut scaled = self.clone();
        scaled <<= (expo_add - expo) as i32;
        scaled.trunc_mut();
        let m = scaled.to_integer().and_then(|z| z.to_i64()).unwrap_or(0);
        (m, expo)
    }

    fn prec() -> u32 {
        current_prec()
    }

    fn set_prec(prec: u32) -> u32 {
        FLOAT_PREC.swap(prec, Ordering::SeqCst)
    }
}
