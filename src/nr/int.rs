//! Integer scalar contract and back-ends.
//!
//! The engine is generic over a bigint-like scalar: machine words (`i64`)
//! for small lattices, `rug::Integer` when entries outgrow 64 bits.

use std::fmt;

use rug::Integer;

/// Contract an integer back-end must satisfy.
///
/// All arithmetic is in-place on `self`; `mul_pow2` must be exact.
pub trait IntScalar:
    Clone + PartialEq + Eq + PartialOrd + Ord + fmt::Debug + fmt::Display + Send + 'static
{
    fn zero() -> Self;
    fn from_i64(x: i64) -> Self;
    fn is_zero(&self) -> bool;
    /// -1, 0 or 1
    fn signum(&self) -> i32;
    /// `self += rhs`
    fn add_assign_ref(&mut self, rhs: &Self);
    /// `self -= rhs`
    fn sub_assign_ref(&mut self, rhs: &Self);
    /// `self *= rhs`
    fn mul_assign_ref(&mut self, rhs: &Self);
    /// `self *= x`
    fn mul_assign_i64(&mut self, x: i64);
    /// `self *= 2^e`, exactly
    fn mul_pow2(&mut self, e: u32);
    fn neg_assign(&mut self);
    /// Nearest-double approximation
    fn to_f64(&self) -> f64;
    /// `(mantissa, exponent)` with `value ~= mantissa * 2^exponent` and
    /// `0.5 <= |mantissa| < 1` (`(0, 0)` for zero)
    fn to_f64_exp(&self) -> (f64, i64);
}

impl IntScalar for i64 {
    fn zero() -> Self {
        0
    }

    fn from_i64(x: i64) -> Self {
        x
    }

    fn is_zero(&self) -> bool {
        *self == 0
    }

    fn signum(&self) -> i32 {
        i64::signum(*self) as i32
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

    fn mul_assign_i64(&mut self, x: i64) {
        *self *= x;
    }

    fn mul_pow2(&mut self, e: u32) {
        *self <<= e;
    }

    fn neg_assign(&mut self) {
        *self = -*self;
    }

    fn to_f64(&self) -> f64 {
        *self as f64
    }

    fn to_f64_exp(&self) -> (f64, i64) {
        let (m, e) = libm::frexp(*self as f64);
        (m, e as i64)
    }
}

impl IntScalar for Integer {
    fn zero() -> Self {
        Integer::new()
    }

    fn from_i64(x: i64) -> Self {
        Integer::from(x)
    }

    fn is_zero(&self) -> bool {
        self.cmp0() == std::cmp::Ordering::Equal
    }

    fn signum(&self) -> i32 {
        self.cmp0() as i32
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

    fn mul_assign_i64(&mut self, x: i64) {
        *self *= x;
    }

    fn mul_pow2(&mut self, e: u32) {
        *self <<= e;
    }

    fn neg_assign(&mut self) {
        *self *= -1i32;
    }

    fn to_f64(&self) -> f64 {
        Integer::to_f64(self)
    }

    fn to_f64_exp(&self) -> (f64, i64) {
        let (m, e) = Integer::to_f64_exp(self);
        (m, e as i64)
    }
}
