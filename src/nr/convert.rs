//! Conversions between an integer back-end and a floating back-end.
//!
//! A concrete `(Z, F)` pair is usable by the engine when `F` implements
//! [`FloatFromInt<Z>`]. The mantissa/exponent split is what lets huge basis
//! entries live in a fixed-width float image under a shared row exponent.

use rug::{Assign, Float, Integer};

use crate::nr::float::FloatScalar;
use crate::nr::int::IntScalar;

/// Mantissa digits of an `f64`.
const F64_DIGITS: i64 = 53;

/// Conversions a `(Z, F)` back-end pair must provide.
pub trait FloatFromInt<Z: IntScalar>: FloatScalar {
    /// `self := z`, rounded to the current precision
    fn assign_int(&mut self, z: &Z);

    /// `self := mantissa(z)` with `0.5 <= |self| < 1`; returns the exponent
    /// such that `self * 2^expo ~= z`
    fn assign_int_exp(&mut self, z: &Z) -> i64;

    /// `(a, expo)` with `trunc(value * 2^expo_add) ~= a * 2^expo` and `expo`
    /// non-negative; exact when `Z` is an arbitrary-precision integer
    fn to_int_exp(&self, expo_add: i64) -> (Z, i64);

    /// Truncation to an integer
    fn to_int(&self) -> Z;
}

impl FloatFromInt<i64> for f64 {
    fn assign_int(&mut self, z: &i64) {
        *self = *z as f64;
    }

    fn assign_int_exp(&mut self, z: &i64) -> i64 {
        let (m, e) = z.to_f64_exp();
        *self = m;
        e
    }

    fn to_int_exp(&self, expo_add: i64) -> (i64, i64) {
        self.to_i64_exp(expo_add)
    }

    fn to_int(&self) -> i64 {
        self.trunc() as i64
    }
}

impl FloatFromInt<Integer> for f64 {
    fn assign_int(&mut self, z: &Integer) {
        *self = IntScalar::to_f64(z);
    }

    fn assign_int_exp(&mut self, z: &Integer) -> i64 {
        let (m, e) = IntScalar::to_f64_exp(z);
        *self = m;
        e
    }

    fn to_int_exp(&self, expo_add: i64) -> (Integer, i64) {
        if *self == 0.0 || !f64::is_finite(*self) {
            return (Integer::new(), 0);
        }
        let expo = (self.exponent() + expo_add - F64_DIGITS).max(0);
        let scaled = libm::ldexp(*self, (expo_add - expo) as i32);
        let a = Integer::from_f64(scaled.trunc()).unwrap_or_default();
        (a, expo)
    }

    fn to_int(&self) -> Integer {
        Integer::from_f64(self.trunc()).unwrap_or_default()
    }
}

impl FloatFromInt<i64> for Float {
    fn assign_int(&mut self, z: &i64) {
        self.assign(*z);
    }

    fn assign_int_exp(&mut self, z: &i64) -> i64 {
        let (m, e) = z.to_f64_exp();
        self.assign(m);
        e
    }

    fn to_int_exp(&self, expo_add: i64) -> (i64, i64) {
        self.to_i64_exp(expo_add)
    }

    fn to_int(&self) -> i64 {
        self.clone()
            .trunc()
            .to_integer()
            .and_then(|z| z.to_i64())
            .unwrap_or(0)
    }
}

impl FloatFromInt<Integer> for Float {
    fn assign_int(&mut self, z: &Integer) {
        self.assign(z);
    }

    fn assign_int_exp(&mut self, z: &Integer) -> i64 {
        let (m, e) = IntScalar::to_f64_exp(z);
        self.assign(m);
        e
    }

    fn to_int_exp(&self, expo_add: i64) -> (Integer, i64) {
        if !Float::is_finite(self) {
            return (Integer::new(), 0);
        }
        // The integer side is exact, so no exponent needs to be split off.
        let mut scaled = self.clone();
        scaled <<= expo_add as i32;
        scaled.trunc_mut();
        (scaled.to_integer().unwrap_or_default(), 0)
    }

    fn to_int(&self) -> Integer {
        self.clone().trunc().to_integer().unwrap_or_default()
    }
}
