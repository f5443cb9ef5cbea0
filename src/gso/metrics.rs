//! Derived quality metrics over the GSO tables.
//!
//! Thin readers on top of the engine: they lazily extend the GSO to the
//! rows they touch and fold the per-row exponents into their results.

use crate::core::error::{GsoError, Result};
use crate::gso::engine::GsoEngine;
use crate::nr::{FloatFromInt, FloatScalar, IntScalar};
use crate::utils;

impl<Z: IntScalar, F: FloatFromInt<Z>> GsoEngine<Z, F> {
    /// `sum(log r(i, i))` over `[start_row, end_row)`, the log-determinant
    /// of the projected block
    pub fn get_log_det(&mut self, start_row: usize, end_row: usize) -> Result<F> {
        let end = end_row.min(self.d);
        let mut log_det = F::zero();
        for i in start_row..end {
            let mut h = self.get_r(i, i)?;
            h.ln_assign();
            log_det.add_assign_ref(&h);
        }
        Ok(log_det)
    }

    /// `exp(log_det / (end_row - start_row))`
    pub fn get_root_det(&mut self, start_row: usize, end_row: usize) -> Result<F> {
        let end = end_row.min(self.d);
        if start_row >= end {
            return Err(GsoError::precondition(format!(
                "empty row range [{}, {})",
                start_row, end
            )));
        }
        let h = (end - start_row) as f64;
        let mut root_det = self.get_log_det(start_row, end)?;
        root_det.mul_assign_f64(1.0 / h);
        root_det.exp_assign();
        Ok(root_det)
    }

    /// Least-squares slope of `log r(i, i)` against `i` over
    /// `[start_row, stop_row)`, in natural log
    pub fn get_current_slope(&mut self, start_row: usize, stop_row: usize) -> Result<f64> {
        let stop = stop_row.min(self.d);
        if stop < start_row + 2 {
            return Err(GsoError::precondition(format!(
                "slope needs at least two rows, got [{}, {})",
                start_row, stop
            )));
        }
        let mut x = vec![0.0f64; stop];
        for i in start_row..stop {
            let (f, expo) = self.get_r_exp(i, i)?;
            let mut log_f = f;
            log_f.ln_assign();
            x[i] = log_f.to_f64() + expo as f64 * std::f64::consts::LN_2;
        }
        let n = (stop - start_row) as f64;
        let i_mean = (n - 1.0) * 0.5 + start_row as f64;
        let mut x_mean = 0.0;
        for xi in &x[start_row..stop] {
            x_mean += xi;
        }
        x_mean /= n;
        let mut v1 = 0.0;
        let mut v2 = 0.0;
        for (i, xi) in x.iter().enumerate().take(stop).skip(start_row) {
            v1 += (i as f64 - i_mean) * (xi - x_mean);
            v2 += (i as f64 - i_mean) * (i as f64 - i_mean);
        }
        Ok(v1 / v2)
    }

    /// Slide-reduction potential of `[start_row, end_row)` with the given
    /// block size: `sum((p - i) * log_det(i * block, (i + 1) * block))`,
    /// where `p` is the number of full blocks, decremented by one when the
    /// range is an exact multiple of the block size.
    pub fn get_slide_potential(
        &mut self,
        start_row: usize,
        end_row: usize,
        block_size: usize,
    ) -> Result<F> {
        if block_size == 0 {
            return Err(GsoError::precondition("block_size must be positive"));
        }
        let end = end_row.min(self.d);
        let start = start_row.min(end);
        let width = end - start;
        let mut p = width / block_size;
        if p > 0 && width % block_size == 0 {
            p -= 1;
        }
        let mut potential = F::zero();
        for i in 0..p {
            let mut block_det = self.get_log_det(i * block_size, (i + 1) * block_size)?;
            block_det.mul_assign_f64((p - i) as f64);
            potential.add_assign_ref(&block_det);
        }
        Ok(potential)
    }
}

/// Tighten `max_dist` to the Gaussian-heuristic bound for a block of the
/// given size: `gamma(block/2 + 1)^(2/block) / pi * root_det`, rescaled by
/// `2^-max_dist_expo` and the caller's `gh_factor`. `max_dist` is only
/// written when the bound is smaller.
pub fn gaussian_heuristic<F: FloatScalar>(
    max_dist: &mut F,
    max_dist_expo: i64,
    block_size: usize,
    root_det: &F,
    gh_factor: f64,
) {
    let mut t = utils::gamma(block_size as f64 / 2.0 + 1.0);
    t = t.powf(2.0 / block_size as f64);
    t /= std::f64::consts::PI;
    let mut f = F::from_f64(t);
    f.mul_assign_ref(root_det);
    f.mul_pow2(-max_dist_expo);
    f.mul_assign_f64(gh_factor);
    if f < *max_dist {
        *max_dist = f;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::matrix::Matrix;
    use crate::gso::{BigIntGso, GsoConfig};
    use rug::Integer;
    use std::f64::consts::PI;

    fn diag(values: &[i64]) -> Matrix<Integer> {
        let n = values.len();
        let mut m = Matrix::zeros(n, n);
        for (i, &v) in values.iter().enumerate() {
            m[(i, i)] = Integer::from(v);
        }
        m
    }

    fn int_gram_cfg() -> GsoConfig {
        GsoConfig {
            int_gram: true,
            ..GsoConfig::default()
        }
    }

    #[test]
    fn test_log_det_of_diagonal() {
        let mut gso = BigIntGso::new(diag(&[2, 2]), int_gram_cfg()).unwrap();
        let log_det = gso.get_log_det(0, 2).unwrap();
        assert!((log_det - 16f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_root_det_of_diagonal() {
        let mut gso = BigIntGso::new(diag(&[2, 2]), int_gram_cfg()).unwrap();
        let root_det = gso.get_root_det(0, 2).unwrap();
        assert!((root_det - 4.0).abs() < 1e-12);
        assert!(gso.get_root_det(2, 2).is_err());
    }

    #[test]
    fn test_slope_flat_for_orthonormal() {
        let mut gso = BigIntGso::new(diag(&[1, 1, 1]), int_gram_cfg()).unwrap();
        let slope = gso.get_current_slope(0, 3).unwrap();
        assert!(slope.abs() < 1e-12);
    }

    #[test]
    fn test_slope_of_decaying_profile() {
        // r(0,0) = 16, r(1,1) = 4: slope is -ln 4 per index.
        let mut gso = BigIntGso::new(diag(&[4, 2]), int_gram_cfg()).unwrap();
        let slope = gso.get_current_slope(0, 2).unwrap();
        assert!((slope + 4f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_slope_needs_two_rows() {
        let mut gso = BigIntGso::new(diag(&[1, 1]), int_gram_cfg()).unwrap();
        assert!(gso.get_current_slope(0, 1).is_err());
    }

    #[test]
    fn test_slide_potential_exact_multiple() {
        // Width 4, block 2: p drops from 2 to 1, a single weighted block.
        let mut gso = BigIntGso::new(diag(&[2, 2, 2, 2]), int_gram_cfg()).unwrap();
        let potential = gso.get_slide_potential(0, 4, 2).unwrap();
        assert!((potential - 16f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_gaussian_heuristic_tightens() {
        // block = 2: gamma(2)^1 / pi = 1/pi.
        let root_det = 4.0f64;
        let mut max_dist = 10.0f64;
        gaussian_heuristic(&mut max_dist, 0, 2, &root_det, 1.0);
        assert!((max_dist - 4.0 / PI).abs() < 1e-12);

        // A smaller current bound is kept.
        let mut max_dist = 0.1f64;
        gaussian_heuristic(&mut max_dist, 0, 2, &root_det, 1.0);
        assert_eq!(max_dist, 0.1);
    }

    #[test]
    fn test_gaussian_heuristic_expo_rescale() {
        let root_det = 4.0f64;
        let mut with_expo = f64::INFINITY;
        gaussian_heuristic(&mut with_expo, 3, 2, &root_det, 1.0);
        let mut without = f64::INFINITY;
        gaussian_heuristic(&mut without, 0, 2, &root_det, 1.0);
        assert!((with_expo - without / 8.0).abs() < 1e-15);
    }
}
