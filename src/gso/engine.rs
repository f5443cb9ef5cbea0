//! Engine state, row discovery, and the lazy GSO recursion.

use crate::core::error::{GsoError, Result};
use crate::core::matrix::Matrix;
use crate::core::vector;
use crate::gso::GsoConfig;
use crate::nr::{FloatFromInt, FloatScalar, IntScalar};

/// Incremental GSO engine over a `(Z, F)` back-end pair.
///
/// The basis is owned by the engine; rows become known lazily, and the
/// `mu` / `r` tables are extended column by column on demand. See the module
/// documentation for the representation overview.
#[derive(Debug, Clone)]
pub struct GsoEngine<Z: IntScalar, F: FloatFromInt<Z>> {
    pub(crate) cfg: GsoConfig,
    /// Logical number of basis rows
    pub(crate) d: usize,
    /// Integer basis
    pub(crate) b: Matrix<Z>,
    /// Cumulative unimodular transformation (empty unless enabled)
    pub(crate) u: Matrix<Z>,
    /// Transposed inverse of `u` (empty unless enabled)
    pub(crate) u_inv_t: Matrix<Z>,
    /// Floating image of `b`, column-scaled per row when `row_expo` is on
    pub(crate) bf: Matrix<F>,
    /// Exact integer Gram, lower triangle (when `int_gram`)
    pub(crate) g: Matrix<Z>,
    /// Floating Gram cache, lower triangle, NaN = stale (when `!int_gram`)
    pub(crate) gf: Matrix<F>,
    pub(crate) mu: Matrix<F>,
    pub(crate) r: Matrix<F>,
    /// Shared exponent per row: the true row is `bf[i] * 2^row_expo[i]`
    pub(crate) row_expo: Vec<i64>,
    /// `mu[i, 0..k)` and `r[i, 0..k)` reflect the current basis
    pub(crate) gso_valid_cols: Vec<usize>,
    /// Preallocation hint: nonzero width of each row when first seen
    pub(crate) init_row_size: Vec<usize>,
    pub(crate) tmp_col_expo: Vec<i64>,
    pub(crate) n_known_rows: usize,
    pub(crate) n_source_rows: usize,
    pub(crate) n_known_cols: usize,
    pub(crate) alloc_dim: usize,
    pub(crate) cols_locked: bool,
    pub(crate) row_op_range: Option<(usize, usize)>,
}

fn float_dot<F: FloatScalar>(a: &[F], b: &[F], n: usize) -> F {
    let mut acc = F::zero();
    for k in 0..n {
        let mut t = a[k].clone();
        t.mul_assign_ref(&b[k]);
        acc.add_assign_ref(&t);
    }
    acc
}

impl<Z: IntScalar, F: FloatFromInt<Z>> GsoEngine<Z, F> {
    /// Create an engine owning `b`. When transforms are enabled they start
    /// as identity matrices.
    pub fn new(b: Matrix<Z>, cfg: GsoConfig) -> Result<Self> {
        cfg.validate()?;
        let d = b.rows();
        let u = if cfg.transform {
            Matrix::identity(d)
        } else {
            Matrix::empty()
        };
        let u_inv_t = if cfg.inv_transform {
            Matrix::identity(d)
        } else {
            Matrix::empty()
        };
        Self::with_transforms(b, u, u_inv_t, cfg)
    }

    /// Create an engine with caller-supplied transform matrices, e.g. to
    /// resume tracking an earlier reduction.
    pub fn with_transforms(
        b: Matrix<Z>,
        u: Matrix<Z>,
        u_inv_t: Matrix<Z>,
        cfg: GsoConfig,
    ) -> Result<Self> {
        cfg.validate()?;
        let d = b.rows();
        if cfg.transform && u.rows() != d {
            return Err(GsoError::precondition(format!(
                "transform has {} rows, basis has {}",
                u.rows(),
                d
            )));
        }
        if cfg.inv_transform && u_inv_t.rows() != d {
            return Err(GsoError::precondition(format!(
                "inverse transform has {} rows, basis has {}",
                u_inv_t.rows(),
                d
            )));
        }

        let mut engine = GsoEngine {
            cfg,
            d,
            b,
            u,
            u_inv_t,
            bf: Matrix::empty(),
            g: Matrix::empty(),
            gf: Matrix::empty(),
            mu: Matrix::empty(),
            r: Matrix::empty(),
            row_expo: Vec::new(),
            gso_valid_cols: Vec::new(),
            init_row_size: Vec::new(),
            tmp_col_expo: Vec::new(),
            n_known_rows: 0,
            n_source_rows: 0,
            n_known_cols: 0,
            alloc_dim: 0,
            cols_locked: false,
            row_op_range: None,
        };
        engine.size_increased();
        Ok(engine)
    }

    pub fn d(&self) -> usize {
        self.d
    }

    pub fn b_nrows(&self) -> usize {
        self.b.rows()
    }

    pub fn b_ncols(&self) -> usize {
        self.b.cols()
    }

    pub fn config(&self) -> &GsoConfig {
        &self.cfg
    }

    pub fn basis(&self) -> &Matrix<Z> {
        &self.b
    }

    /// Consume the engine and hand the basis back
    pub fn into_basis(self) -> Matrix<Z> {
        self.b
    }

    pub fn transform(&self) -> Option<&Matrix<Z>> {
        self.cfg.transform.then_some(&self.u)
    }

    pub fn inv_transform(&self) -> Option<&Matrix<Z>> {
        self.cfg.inv_transform.then_some(&self.u_inv_t)
    }

    pub fn n_known_rows(&self) -> usize {
        self.n_known_rows
    }

    pub fn n_known_cols(&self) -> usize {
        self.n_known_cols
    }

    pub fn is_cols_locked(&self) -> bool {
        self.cols_locked
    }

    /// Valid-prefix counter of row `i`
    pub fn valid_cols(&self, i: usize) -> usize {
        self.gso_valid_cols[i]
    }

    /// Shared exponent of row `i` (0 unless `row_expo` is enabled)
    pub fn row_expo(&self, i: usize) -> i64 {
        if self.cfg.row_expo {
            self.row_expo[i]
        } else {
            0
        }
    }

    /// Grow all per-row containers after `d` has increased. Newly covered
    /// rows get their nonzero-width hint and a fresh float image.
    pub(crate) fn size_increased(&mut self) {
        let old_d = self.mu.rows();
        if self.d > self.alloc_dim {
            if self.cfg.int_gram {
                self.g.resize(self.d, self.d, Z::zero());
            } else {
                self.bf.resize(self.d, self.b.cols(), F::zero());
                self.gf.resize(self.d, self.d, F::nan());
            }
            self.mu.resize(self.d, self.d, F::zero());
            self.r.resize(self.d, self.d, F::zero());
            self.gso_valid_cols.resize(self.d, 0);
            self.init_row_size.resize(self.d, 0);
            if self.cfg.row_expo {
                self.row_expo.resize(self.d, 0);
            }
            self.tmp_col_expo.resize(self.b.cols(), 0);
            self.alloc_dim = self.d;
        }
        for i in old_d..self.d {
            self.init_row_size[i] = vector::size_nz(self.b.row(i)).max(1);
            if !self.cfg.int_gram {
                // update_bf might not touch all the zeros of b[i]
                for f in self.bf.row_mut(i) {
                    *f = F::zero();
                }
                self.update_bf(i);
            }
        }
    }

    /// Refresh the float image of row `i` from the integer row. With
    /// `row_expo`, every column is renormalized to the row's maximum
    /// exponent so the largest entry sits in `[0.5, 1)`.
    pub(crate) fn update_bf(&mut self, i: usize) {
        let n = self.n_known_cols.max(self.init_row_size[i]);
        let b_row = self.b.row(i);
        let bf_row = self.bf.row_mut(i);
        if self.cfg.row_expo {
            let mut max_expo = i64::MIN;
            for j in 0..n {
                self.tmp_col_expo[j] = bf_row[j].assign_int_exp(&b_row[j]);
                max_expo = max_expo.max(self.tmp_col_expo[j]);
            }
            for j in 0..n {
                bf_row[j].mul_pow2(self.tmp_col_expo[j] - max_expo);
            }
            self.row_expo[i] = max_expo;
        } else {
            for j in 0..n {
                bf_row[j].assign_int(&b_row[j]);
            }
        }
    }

    /// Mark every cached floating Gram entry of row `i` stale
    pub(crate) fn invalidate_gram_row(&mut self, i: usize) {
        for j in 0..=i {
            self.gf[(i, j)].set_nan();
        }
    }

    /// Truncate the valid prefix of row `i` to at most `new_valid_cols`
    pub(crate) fn invalidate_gso_row(&mut self, i: usize, new_valid_cols: usize) {
        debug_assert!(i < self.n_known_rows && new_valid_cols <= i + 1);
        self.gso_valid_cols[i] = self.gso_valid_cols[i].min(new_valid_cols);
    }

    /// Register the next unseen row: widen the active columns (unless
    /// locked), seed its Gram row, and reset its valid prefix.
    pub(crate) fn discover_row(&mut self) {
        debug_assert!(self.n_known_rows < self.d);
        // Early reduction (cols_locked) is incompatible with the integer
        // Gram: n_known_cols might be too small to compute all of g(i, j).
        debug_assert!(!(self.cols_locked && self.cfg.int_gram));
        let i = self.n_known_rows;

        self.n_known_rows += 1;
        if !self.cols_locked {
            self.n_source_rows = self.n_known_rows;
            self.n_known_cols = self.n_known_cols.max(self.init_row_size[i]);
        }
        if self.cfg.int_gram {
            for j in 0..=i {
                let dot = vector::dot_prefix(self.b.row(i), self.b.row(j), self.n_known_cols);
                self.g[(i, j)] = dot;
            }
        } else {
            self.invalidate_gram_row(i);
        }
        self.gso_valid_cols[i] = 0;
    }

    /// Inner product of rows `i` and `j` (`j <= i`), exact from `g` or from
    /// the floating cache, recomputing the cache entry if it is stale.
    pub(crate) fn get_gram(&mut self, i: usize, j: usize) -> F {
        debug_assert!(j <= i && i < self.n_known_rows);
        if self.cfg.int_gram {
            let mut f = F::zero();
            f.assign_int(&self.g[(i, j)]);
            f
        } else {
            if self.gf[(i, j)].is_nan() {
                let dot = float_dot(self.bf.row(i), self.bf.row(j), self.n_known_cols);
                self.gf[(i, j)] = dot;
            }
            self.gf[(i, j)].clone()
        }
    }

    /// Symmetric Gram accessor: `g(max(a, b), min(a, b))`
    pub(crate) fn sym_g_cloned(&self, a: usize, b: usize) -> Z {
        self.g[(a.max(b), a.min(b))].clone()
    }

    /// Bring `mu[i, 0..=last_j]` and `r[i, 0..=last_j]` up to date, lazily
    /// completing every dependency row on the way.
    ///
    /// Returns `false` when a division by `r(j, j)` yields a non-finite
    /// coefficient; the row's valid prefix then stops at the failing column
    /// and the engine stays usable for other rows.
    pub fn update_gso_row(&mut self, i: usize, last_j: usize) -> bool {
        debug_assert!(i < self.d && last_j < self.d);
        while self.n_known_rows <= i {
            self.discover_row();
        }
        debug_assert!(last_j < self.n_source_rows);

        let mut j = self.gso_valid_cols[i];
        while j <= last_j {
            if j < i && self.gso_valid_cols[j] <= j && !self.update_gso_row(j, j) {
                return false;
            }
            debug_assert!(j == i || self.gso_valid_cols[j] > j);

            let mut t = self.get_gram(i, j);
            for k in 0..j {
                let mut p = self.mu[(j, k)].clone();
                p.mul_assign_ref(&self.r[(i, k)]);
                t.sub_assign_ref(&p);
            }
            self.r[(i, j)] = t.clone();
            if i > j {
                t.div_assign_ref(&self.r[(j, j)]);
                let finite = t.is_finite();
                self.mu[(i, j)] = t;
                if !finite {
                    log::warn!(
                        "non-finite mu({}, {}); widen the float precision and rebuild",
                        i,
                        j
                    );
                    self.gso_valid_cols[i] = j;
                    return false;
                }
            }
            j += 1;
        }

        self.gso_valid_cols[i] = self.gso_valid_cols[i].max(j);
        true
    }

    /// Bring the whole row `i`, including its diagonal, up to date
    pub fn update_gso_row_full(&mut self, i: usize) -> bool {
        self.update_gso_row(i, i)
    }

    /// `mu(i, j)` with the row exponents folded in
    pub fn get_mu(&mut self, i: usize, j: usize) -> Result<F> {
        let (mut f, expo) = self.get_mu_exp(i, j)?;
        f.mul_pow2(expo);
        Ok(f)
    }

    /// `mu(i, j)` in the stored (scaled) domain together with the exponent
    /// `row_expo[i] - row_expo[j]` relating it to the true coefficient
    pub fn get_mu_exp(&mut self, i: usize, j: usize) -> Result<(F, i64)> {
        if j >= i || i >= self.d {
            return Err(GsoError::precondition(format!(
                "mu({}, {}) is outside the strict lower triangle of a {}-row basis",
                i, j, self.d
            )));
        }
        if !self.update_gso_row(i, j) {
            return Err(GsoError::non_finite(i, self.gso_valid_cols[i]));
        }
        let expo = if self.cfg.row_expo {
            self.row_expo[i] - self.row_expo[j]
        } else {
            0
        };
        Ok((self.mu[(i, j)].clone(), expo))
    }

    /// `r(i, j)` with the row exponents folded in; `r(i, i)` is the squared
    /// norm of the i-th Gram-Schmidt vector
    pub fn get_r(&mut self, i: usize, j: usize) -> Result<F> {
        let (mut f, expo) = self.get_r_exp(i, j)?;
        f.mul_pow2(expo);
        Ok(f)
    }

    /// `r(i, j)` in the stored domain together with the exponent
    /// `row_expo[i] + row_expo[j]`
    pub fn get_r_exp(&mut self, i: usize, j: usize) -> Result<(F, i64)> {
        if j > i || i >= self.d {
            return Err(GsoError::precondition(format!(
                "r({}, {}) is outside the lower triangle of a {}-row basis",
                i, j, self.d
            )));
        }
        if !self.update_gso_row(i, j) {
            return Err(GsoError::non_finite(i, self.gso_valid_cols[i]));
        }
        let expo = if self.cfg.row_expo {
            self.row_expo[i] + self.row_expo[j]
        } else {
            0
        };
        Ok((self.r[(i, j)].clone(), expo))
    }

    /// Largest true-domain exponent among `mu(i, 0..n_cols)`. The row must
    /// already be valid through `n_cols`.
    pub fn get_max_mu_exp(&self, i: usize, n_cols: usize) -> i64 {
        debug_assert!(i < self.n_known_rows && self.gso_valid_cols[i] >= n_cols);
        let mut max_expo = i64::MIN;
        for j in 0..n_cols {
            let expo = if self.cfg.row_expo {
                self.row_expo[i] - self.row_expo[j]
            } else {
                0
            };
            max_expo = max_expo.max(self.mu[(i, j)].exponent() + expo);
        }
        max_expo
    }

    /// Maximum diagonal Gram entry over the known rows
    pub fn get_max_gram(&mut self) -> Z {
        if self.cfg.int_gram {
            let mut best = Z::zero();
            for i in 0..self.n_known_rows {
                if self.g[(i, i)] > best {
                    best = self.g[(i, i)].clone();
                }
            }
            best
        } else {
            let mut best = F::zero();
            for i in 0..self.n_known_rows {
                let gii = self.get_gram(i, i);
                if gii > best {
                    best = gii;
                }
            }
            best.to_int()
        }
    }

    /// Maximum `r(i, i)` over the known rows, in the stored domain
    pub fn get_max_bstar(&self) -> F {
        let mut best = F::zero();
        for i in 0..self.n_known_rows {
            if self.r[(i, i)] > best {
                best = self.r[(i, i)].clone();
            }
        }
        best
    }

    /// Freeze the active column count. Rows discovered under the lock do not
    /// widen it; incompatible with the integer Gram.
    pub fn lock_cols(&mut self) -> Result<()> {
        if self.cfg.int_gram {
            return Err(GsoError::config("cols_locked is incompatible with int_gram"));
        }
        self.cols_locked = true;
        Ok(())
    }

    /// Release the column lock and re-expose every source row
    pub fn unlock_cols(&mut self) {
        self.n_known_rows = self.n_source_rows;
        self.cols_locked = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gso::{BigIntGso, WordGso};
    use rug::Integer;

    fn int_matrix(rows: &[&[i64]]) -> Matrix<Integer> {
        Matrix::new(
            rows.iter()
                .map(|r| r.iter().map(|&v| Integer::from(v)).collect())
                .collect(),
        )
        .unwrap()
    }

    fn int_gram_cfg() -> GsoConfig {
        GsoConfig {
            int_gram: true,
            ..GsoConfig::default()
        }
    }

    #[test]
    fn test_orthogonal_basis_diagonal() {
        let mut gso = BigIntGso::new(int_matrix(&[&[2, 0], &[0, 2]]), int_gram_cfg()).unwrap();
        assert!(gso.update_gso_row(1, 1));
        assert_eq!(gso.get_r(0, 0).unwrap(), 4.0);
        assert_eq!(gso.get_r(1, 1).unwrap(), 4.0);
        assert_eq!(gso.get_mu(1, 0).unwrap(), 0.0);
        assert_eq!(gso.valid_cols(0), 1);
        assert_eq!(gso.valid_cols(1), 2);
    }

    #[test]
    fn test_gso_recursion_values() {
        let mut gso = BigIntGso::new(int_matrix(&[&[3, 1], &[1, 3]]), int_gram_cfg()).unwrap();
        assert!(gso.update_gso_row(1, 1));
        assert_eq!(gso.basis()[(0, 0)], Integer::from(3));
        assert_eq!(gso.get_r(0, 0).unwrap(), 10.0);
        assert_eq!(gso.get_mu(1, 0).unwrap(), 0.6);
        assert!((gso.get_r(1, 1).unwrap() - 6.4).abs() < 1e-12);
    }

    #[test]
    fn test_float_gram_path_matches_int_gram() {
        let b = int_matrix(&[&[3, 1], &[1, 3]]);
        let mut float_gso = BigIntGso::new(b, GsoConfig::default()).unwrap();
        assert!(float_gso.update_gso_row(1, 1));
        assert!((float_gso.get_mu(1, 0).unwrap() - 0.6).abs() < 1e-12);
        assert!((float_gso.get_r(1, 1).unwrap() - 6.4).abs() < 1e-12);
    }

    #[test]
    fn test_update_is_idempotent() {
        let mut gso = BigIntGso::new(int_matrix(&[&[3, 1], &[1, 3]]), int_gram_cfg()).unwrap();
        assert!(gso.update_gso_row(1, 1));
        let mu = gso.get_mu(1, 0).unwrap();
        assert!(gso.update_gso_row(1, 1));
        assert_eq!(gso.get_mu(1, 0).unwrap(), mu);
        assert_eq!(gso.valid_cols(1), 2);
    }

    #[test]
    fn test_boundary_first_cell() {
        let mut gso = BigIntGso::new(int_matrix(&[&[2, 0], &[0, 2]]), int_gram_cfg()).unwrap();
        assert!(gso.update_gso_row(0, 0));
        assert_eq!(gso.get_r(0, 0).unwrap(), 4.0);
        assert_eq!(gso.valid_cols(0), 1);
        assert_eq!(gso.n_known_rows(), 1);
    }

    #[test]
    fn test_non_finite_mu_reported() {
        // A zero leading row makes r(0, 0) = 0, so mu(1, 0) cannot be
        // normalized.
        let mut gso = BigIntGso::new(int_matrix(&[&[0, 0], &[1, 1]]), int_gram_cfg()).unwrap();
        assert!(!gso.update_gso_row(1, 1));
        assert_eq!(gso.valid_cols(1), 0);
        assert!(matches!(
            gso.get_mu(1, 0),
            Err(GsoError::NonFinite { row: 1, col: 0 })
        ));
    }

    #[test]
    fn test_row_expo_scaled_image() {
        let big = 1i64 << 60;
        let b = int_matrix(&[&[big, big], &[1, 0]]);
        let cfg = GsoConfig {
            row_expo: true,
            ..GsoConfig::default()
        };
        let mut gso = BigIntGso::new(b, cfg).unwrap();
        assert!(gso.update_gso_row_full(0));
        assert_eq!(gso.row_expo(0), 61);
        // bf * 2^row_expo reproduces the integer row exactly.
        assert_eq!(gso.bf[(0, 0)], 0.5);
        assert_eq!(gso.bf[(0, 1)], 0.5);
        // r(0, 0) in the true domain is 2^121.
        let (r00, expo) = gso.get_r_exp(0, 0).unwrap();
        assert_eq!(r00, 0.5);
        assert_eq!(expo, 122);
    }

    #[test]
    fn test_mu_query_outside_triangle() {
        let mut gso = WordGso::new(
            Matrix::new(vec![vec![1i64, 0], vec![0, 1]]).unwrap(),
            GsoConfig::default(),
        )
        .unwrap();
        assert!(gso.get_mu(0, 0).is_err());
        assert!(gso.get_r(0, 1).is_err());
    }

    #[test]
    fn test_lock_cols_rejected_with_int_gram() {
        let mut gso = BigIntGso::new(int_matrix(&[&[1, 0], &[0, 1]]), int_gram_cfg()).unwrap();
        assert!(matches!(gso.lock_cols(), Err(GsoError::Config(_))));
    }

    #[test]
    fn test_max_queries() {
        let mut gso = BigIntGso::new(int_matrix(&[&[3, 1], &[1, 3]]), int_gram_cfg()).unwrap();
        assert!(gso.update_gso_row(1, 1));
        assert_eq!(gso.get_max_gram(), Integer::from(10));
        assert_eq!(gso.get_max_bstar(), 10.0);
        // mu(1, 0) = 0.6, exponent 0
        assert_eq!(gso.get_max_mu_exp(1, 1), 0);
    }
}
