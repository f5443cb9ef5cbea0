//! In-place integer row operations over a column prefix.
//!
//! Every mutator touches only the first `n` entries of its operands; the
//! engine passes its active column count so that trailing zeros of partially
//! discovered rows are never walked.

use crate::nr::int::IntScalar;

/// `dst[k] += src[k]` for `k < n`
pub fn add_prefix<Z: IntScalar>(dst: &mut [Z], src: &[Z], n: usize) {
    for k in 0..n {
        dst[k].add_assign_ref(&src[k]);
    }
}

/// `dst[k] -= src[k]` for `k < n`
pub fn sub_prefix<Z: IntScalar>(dst: &mut [Z], src: &[Z], n: usize) {
    for k in 0..n {
        dst[k].sub_assign_ref(&src[k]);
    }
}

/// `dst[k] += x * src[k]` for `k < n`
pub fn addmul_si<Z: IntScalar>(dst: &mut [Z], src: &[Z], x: i64, n: usize) {
    for k in 0..n {
        let mut t = src[k].clone();
        t.mul_assign_i64(x);
        dst[k].add_assign_ref(&t);
    }
}

/// `dst[k] += (x * 2^e) * src[k]` for `k < n`
pub fn addmul_si_2exp<Z: IntScalar>(dst: &mut [Z], src: &[Z], x: i64, e: u32, n: usize) {
    for k in 0..n {
        let mut t = src[k].clone();
        t.mul_assign_i64(x);
        t.mul_pow2(e);
        dst[k].add_assign_ref(&t);
    }
}

/// `dst[k] += (x * 2^e) * src[k]` for `k < n`, arbitrary-precision scalar
pub fn addmul_2exp<Z: IntScalar>(dst: &mut [Z], src: &[Z], x: &Z, e: u32, n: usize) {
    for k in 0..n {
        let mut t = src[k].clone();
        t.mul_assign_ref(x);
        t.mul_pow2(e);
        dst[k].add_assign_ref(&t);
    }
}

/// Exact inner product of the first `n` entries
pub fn dot_prefix<Z: IntScalar>(a: &[Z], b: &[Z], n: usize) -> Z {
    let mut acc = Z::zero();
    for k in 0..n {
        let mut t = a[k].clone();
        t.mul_assign_ref(&b[k]);
        acc.add_assign_ref(&t);
    }
    acc
}

/// Index one past the last nonzero entry (0 for an all-zero row)
pub fn size_nz<Z: IntScalar>(row: &[Z]) -> usize {
    row.iter().rposition(|v| !v.is_zero()).map_or(0, |p| p + 1)
}
