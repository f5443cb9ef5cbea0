//! In-place row mutators, the bracket protocol, swaps and logical moves.
//!
//! Mutators update the integer basis, mirror the change on the transform
//! matrices and the exact Gram, and rely on the enclosing
//! `row_op_begin` / `row_op_end` bracket to refresh the float image and
//! truncate the valid prefixes once per window.

use crate::core::matrix::Matrix;
use crate::core::vector;
use crate::gso::engine::GsoEngine;
use crate::nr::{FloatFromInt, FloatScalar, IntScalar};

impl<Z: IntScalar, F: FloatFromInt<Z>> GsoEngine<Z, F> {
    /// Open a mutation window over the rows `[first, last)`
    pub fn row_op_begin(&mut self, first: usize, last: usize) {
        debug_assert!(self.row_op_range.is_none(), "nested row_op bracket");
        debug_assert!(first <= last && last <= self.d);
        self.row_op_range = Some((first, last));
    }

    /// Close a mutation window: refresh the float image of every row in the
    /// window, drop its cached Gram entries, and truncate the valid prefix
    /// of every downstream row to `first`.
    pub fn row_op_end(&mut self, first: usize, last: usize) {
        debug_assert_eq!(
            self.row_op_range,
            Some((first, last)),
            "mismatched row_op bracket"
        );
        self.row_op_range = None;
        for i in first..last {
            if !self.cfg.int_gram {
                self.update_bf(i);
                self.invalidate_gram_row(i);
                for k in (i + 1)..self.n_known_rows {
                    self.gf[(k, i)].set_nan();
                }
            }
            if i < self.n_known_rows {
                self.invalidate_gso_row(i, 0);
            }
        }
        for i in last..self.n_known_rows {
            self.invalidate_gso_row(i, first);
        }
    }

    /// `b[i] += b[j]`
    pub fn row_add(&mut self, i: usize, j: usize) {
        debug_assert!(i != j && i < self.d && j < self.n_source_rows);
        let n = self.n_known_cols;
        {
            let (dst, src) = self.b.rows_pair_mut(i, j);
            vector::add_prefix(dst, src, n);
        }
        if self.cfg.transform {
            let w = self.u.cols();
            let (dst, src) = self.u.rows_pair_mut(i, j);
            vector::add_prefix(dst, src, w);
            if self.cfg.inv_transform {
                let w = self.u_inv_t.cols();
                let (dst, src) = self.u_inv_t.rows_pair_mut(j, i);
                vector::sub_prefix(dst, src, w);
            }
        }
        if self.cfg.int_gram {
            // g(i, i) += 2 * g(i, j) + g(j, j)
            let mut t = self.g[(i, j)].clone();
            t.mul_pow2(1);
            t.add_assign_ref(&self.g[(j, j)]);
            self.g[(i, i)].add_assign_ref(&t);

            for k in 0..self.n_known_rows {
                if k == i {
                    continue;
                }
                let t = self.sym_g_cloned(j, k);
                self.g[(k.max(i), k.min(i))].add_assign_ref(&t);
            }
        }
    }

    /// `b[i] -= b[j]`
    pub fn row_sub(&mut self, i: usize, j: usize) {
        debug_assert!(i != j && i < self.d && j < self.n_source_rows);
        let n = self.n_known_cols;
        {
            let (dst, src) = self.b.rows_pair_mut(i, j);
            vector::sub_prefix(dst, src, n);
        }
        if self.cfg.transform {
            let w = self.u.cols();
            let (dst, src) = self.u.rows_pair_mut(i, j);
            vector::sub_prefix(dst, src, w);
            if self.cfg.inv_transform {
                let w = self.u_inv_t.cols();
                let (dst, src) = self.u_inv_t.rows_pair_mut(j, i);
                vector::add_prefix(dst, src, w);
            }
        }
        if self.cfg.int_gram {
            // g(i, i) += g(j, j) - 2 * g(i, j)
            let mut t = self.g[(j, j)].clone();
            let mut twice = self.g[(i, j)].clone();
            twice.mul_pow2(1);
            t.sub_assign_ref(&twice);
            self.g[(i, i)].add_assign_ref(&t);

            for k in 0..self.n_known_rows {
                if k == i {
                    continue;
                }
                let t = self.sym_g_cloned(j, k);
                self.g[(k.max(i), k.min(i))].sub_assign_ref(&t);
            }
        }
    }

    /// `g(i, i) += 2^(e+1) * x * g(i, j) + 2^(2e) * x^2 * g(j, j)` and
    /// `sym_g(i, k) += 2^e * x * sym_g(j, k)` for `k != i`. The diagonal
    /// term must be accumulated before `g(i, j)` itself changes.
    fn gram_addmul_si(&mut self, i: usize, j: usize, x: i64, e: u32) {
        let mut t = self.g[(i, j)].clone();
        t.mul_assign_i64(x);
        t.mul_pow2(e + 1);
        self.g[(i, i)].add_assign_ref(&t);

        let mut t = self.g[(j, j)].clone();
        t.mul_assign_i64(x);
        t.mul_assign_i64(x);
        t.mul_pow2(2 * e);
        self.g[(i, i)].add_assign_ref(&t);

        for k in 0..self.n_known_rows {
            if k == i {
                continue;
            }
            let mut t = self.sym_g_cloned(j, k);
            t.mul_assign_i64(x);
            t.mul_pow2(e);
            self.g[(k.max(i), k.min(i))].add_assign_ref(&t);
        }
    }

    /// Arbitrary-precision variant of [`Self::gram_addmul_si`]
    fn gram_addmul_big(&mut self, i: usize, j: usize, x: &Z, e: u32) {
        let mut t = self.g[(i, j)].clone();
        t.mul_assign_ref(x);
        t.mul_pow2(e + 1);
        self.g[(i, i)].add_assign_ref(&t);

        let mut t = self.g[(j, j)].clone();
        t.mul_assign_ref(x);
        t.mul_assign_ref(x);
        t.mul_pow2(2 * e);
        self.g[(i, i)].add_assign_ref(&t);

        for k in 0..self.n_known_rows {
            if k == i {
                continue;
            }
            let mut t = self.sym_g_cloned(j, k);
            t.mul_assign_ref(x);
            t.mul_pow2(e);
            self.g[(k.max(i), k.min(i))].add_assign_ref(&t);
        }
    }

    /// `b[i] += x * b[j]` for a machine-word scalar
    pub fn row_addmul_si(&mut self, i: usize, j: usize, x: i64) {
        debug_assert!(i != j && i < self.d && j < self.n_source_rows);
        let n = self.n_known_cols;
        {
            let (dst, src) = self.b.rows_pair_mut(i, j);
            vector::addmul_si(dst, src, x, n);
        }
        if self.cfg.transform {
            let w = self.u.cols();
            let (dst, src) = self.u.rows_pair_mut(i, j);
            vector::addmul_si(dst, src, x, w);
            if self.cfg.inv_transform {
                let w = self.u_inv_t.cols();
                let (dst, src) = self.u_inv_t.rows_pair_mut(j, i);
                vector::addmul_si(dst, src, -x, w);
            }
        }
        if self.cfg.int_gram {
            self.gram_addmul_si(i, j, x, 0);
        }
    }

    /// `b[i] += (x * 2^e) * b[j]` for a machine-word scalar
    pub fn row_addmul_si_2exp(&mut self, i: usize, j: usize, x: i64, e: u32) {
        debug_assert!(i != j && i < self.d && j < self.n_source_rows);
        let n = self.n_known_cols;
        {
            let (dst, src) = self.b.rows_pair_mut(i, j);
            vector::addmul_si_2exp(dst, src, x, e, n);
        }
        if self.cfg.transform {
            let w = self.u.cols();
            let (dst, src) = self.u.rows_pair_mut(i, j);
            vector::addmul_si_2exp(dst, src, x, e, w);
            if self.cfg.inv_transform {
                let w = self.u_inv_t.cols();
                let (dst, src) = self.u_inv_t.rows_pair_mut(j, i);
                vector::addmul_si_2exp(dst, src, -x, e, w);
            }
        }
        if self.cfg.int_gram {
            self.gram_addmul_si(i, j, x, e);
        }
    }

    /// `b[i] += (x * 2^e) * b[j]` for an arbitrary-precision scalar
    pub fn row_addmul_2exp(&mut self, i: usize, j: usize, x: &Z, e: u32) {
        debug_assert!(i != j && i < self.d && j < self.n_source_rows);
        let n = self.n_known_cols;
        {
            let (dst, src) = self.b.rows_pair_mut(i, j);
            vector::addmul_2exp(dst, src, x, e, n);
        }
        if self.cfg.transform {
            let w = self.u.cols();
            let (dst, src) = self.u.rows_pair_mut(i, j);
            vector::addmul_2exp(dst, src, x, e, w);
            if self.cfg.inv_transform {
                let mut minus_x = x.clone();
                minus_x.neg_assign();
                let w = self.u_inv_t.cols();
                let (dst, src) = self.u_inv_t.rows_pair_mut(j, i);
                vector::addmul_2exp(dst, src, &minus_x, e, w);
            }
        }
        if self.cfg.int_gram {
            self.gram_addmul_big(i, j, x, e);
        }
    }

    /// `b[i] += x * 2^expo_add * b[j]`, the generic entry point from
    /// reduction drivers. The scalar is decomposed into a mantissa and an
    /// exponent and routed to the cheapest applicable mutator.
    pub fn row_addmul_we(&mut self, i: usize, j: usize, x: &F, expo_add: i64) {
        debug_assert!(i < self.d && j < self.n_source_rows);
        let (lx, expo) = x.to_i64_exp(expo_add);
        if expo == 0 {
            if lx == 1 {
                self.row_add(i, j);
            } else if lx == -1 {
                self.row_sub(i, j);
            } else if lx != 0 {
                self.row_addmul_si(i, j, lx);
            }
        } else if self.cfg.row_op_force_long {
            self.row_addmul_si_2exp(i, j, lx, expo as u32);
        } else {
            let (z, expo) = x.to_int_exp(expo_add);
            self.row_addmul_2exp(i, j, &z, expo as u32);
        }
    }

    /// `b[i] += x * b[j]`
    pub fn row_addmul(&mut self, i: usize, j: usize, x: &F) {
        self.row_addmul_we(i, j, x, 0);
    }

    /// Exchange rows `i < j` of the basis, the transform, and the exact
    /// Gram. Unsupported when the inverse transform is maintained.
    pub fn row_swap(&mut self, i: usize, j: usize) {
        debug_assert!(!self.cfg.inv_transform, "row_swap is unsupported with inv_transform");
        debug_assert!(i < j && j < self.d);
        self.b.swap_rows(i, j);
        if self.cfg.transform {
            self.u.swap_rows(i, j);
        }
        if self.cfg.int_gram {
            for k in 0..i {
                self.g.swap_elems((i, k), (j, k));
            }
            for k in (i + 1)..j {
                self.g.swap_elems((k, i), (j, k));
            }
            for k in (j + 1)..self.n_known_rows {
                self.g.swap_elems((k, i), (k, j));
            }
            self.g.swap_elems((i, i), (j, j));
        }
    }

    /// Logically move row `old` to position `new`, rotating every piece of
    /// row-indexed state and truncating the valid prefixes of the rows the
    /// rotation passes over. Moving a row at or past the known region
    /// retracts it from the engine's view.
    pub fn move_row(&mut self, old: usize, new: usize) {
        debug_assert!(!self.cols_locked);
        debug_assert!(old < self.d && new < self.d);
        use std::cmp::Ordering::*;
        match new.cmp(&old) {
            Less => {
                debug_assert!(old < self.n_known_rows);
                for i in new..self.n_known_rows {
                    self.invalidate_gso_row(i, new);
                }
                self.gso_valid_cols[new..=old].rotate_right(1);
                self.mu.rotate_right(new, old);
                self.r.rotate_right(new, old);
                self.b.rotate_right(new, old);
                if self.cfg.transform {
                    self.u.rotate_right(new, old);
                    if self.cfg.inv_transform {
                        self.u_inv_t.rotate_right(new, old);
                    }
                }
                if self.cfg.int_gram {
                    self.g.rotate_gram_right(new, old, self.n_known_rows);
                } else {
                    self.gf.rotate_gram_right(new, old, self.n_known_rows);
                    self.bf.rotate_right(new, old);
                }
                if self.cfg.row_expo {
                    self.row_expo[new..=old].rotate_right(1);
                }
            }
            Greater => {
                for i in old..self.n_known_rows {
                    self.invalidate_gso_row(i, old);
                }
                self.gso_valid_cols[old..=new].rotate_left(1);
                self.mu.rotate_left(old, new);
                self.r.rotate_left(old, new);
                self.b.rotate_left(old, new);
                if self.cfg.transform {
                    self.u.rotate_left(old, new);
                    if self.cfg.inv_transform {
                        self.u_inv_t.rotate_left(old, new);
                    }
                }
                if self.cfg.int_gram {
                    if old + 1 < self.n_known_rows {
                        self.g.rotate_gram_left(
                            old,
                            new.min(self.n_known_rows - 1),
                            self.n_known_rows,
                        );
                    }
                } else {
                    if old + 1 < self.n_known_rows {
                        self.gf.rotate_gram_left(
                            old,
                            new.min(self.n_known_rows - 1),
                            self.n_known_rows,
                        );
                    }
                    self.bf.rotate_left(old, new);
                }
                if self.cfg.row_expo {
                    self.row_expo[old..=new].rotate_left(1);
                }
                if new >= self.n_known_rows {
                    self.init_row_size[old..=new].rotate_left(1);
                    if old < self.n_known_rows {
                        // The moved row leaves the known region.
                        self.n_known_rows -= 1;
                        self.n_source_rows = self.n_known_rows;
                        self.init_row_size[new] = vector::size_nz(self.b.row(new)).max(1);
                    }
                }
            }
            Equal => {}
        }
    }

    /// Append one zero row
    pub fn create_row(&mut self) {
        self.create_rows(1);
    }

    /// Append `n_new` zero rows to the basis (and transform), growing the
    /// per-row containers
    pub fn create_rows(&mut self, n_new: usize) {
        debug_assert!(!self.cols_locked);
        self.d += n_new;
        self.b.set_rows(self.d, Z::zero());
        if self.cfg.transform {
            self.u.set_rows(self.d, Z::zero());
            if self.cfg.inv_transform {
                self.u_inv_t.set_rows(self.d, Z::zero());
            }
        }
        self.size_increased();
    }

    /// Drop the last `n_removed` rows, retracting the known region if needed
    pub fn remove_last_rows(&mut self, n_removed: usize) {
        debug_assert!(!self.cols_locked && self.d >= n_removed);
        self.d -= n_removed;
        self.n_known_rows = self.n_known_rows.min(self.d);
        self.n_source_rows = self.n_known_rows;
        self.b.set_rows(self.d, Z::zero());
        if self.cfg.transform {
            self.u.set_rows(self.d, Z::zero());
            if self.cfg.inv_transform {
                self.u_inv_t.set_rows(self.d, Z::zero());
            }
        }
    }

    /// Replace the rows starting at `target_base` with `transform * b'`,
    /// where `b'` are the rows starting at `src_base`. The combinations are
    /// accumulated in scratch rows appended past the basis, swapped into
    /// place under a bracket, and the scratch rows removed again.
    ///
    /// Only coherent without the integer Gram (the scratch rows are never
    /// discovered) and without the inverse transform (it row-swaps).
    pub fn apply_transform(&mut self, transform: &Matrix<F>, src_base: usize, target_base: usize) {
        debug_assert!(!self.cfg.int_gram && !self.cfg.inv_transform);
        let t_rows = transform.rows();
        let t_cols = transform.cols();
        let old_d = self.d;
        self.create_rows(t_rows);
        for i in 0..t_rows {
            for j in 0..t_cols {
                self.row_addmul(old_d + i, src_base + j, &transform[(i, j)]);
            }
        }
        self.row_op_begin(target_base, target_base + t_rows);
        for i in 0..t_rows {
            self.row_swap(target_base + i, old_d + i);
        }
        self.row_op_end(target_base, target_base + t_rows);
        self.remove_last_rows(t_rows);
    }
}
