//! End-to-end engine scenarios across back-ends.

use rug::{Float, Integer};

use crate::core::matrix::Matrix;
use crate::gso::{BigFloatGso, BigIntGso, GsoConfig, WordGso};
use crate::nr::FloatScalar;
use crate::utils;

fn int_matrix(rows: &[&[i64]]) -> Matrix<Integer> {
    Matrix::new(
        rows.iter()
            .map(|r| r.iter().map(|&v| Integer::from(v)).collect())
            .collect(),
    )
    .unwrap()
}

fn word_matrix(rows: &[&[i64]]) -> Matrix<i64> {
    Matrix::new(rows.iter().map(|r| r.to_vec()).collect()).unwrap()
}

#[test]
fn test_backends_agree_on_mu() {
    let rows: &[&[i64]] = &[&[7, 2, -3], &[1, 9, 4], &[-2, 5, 11]];

    let mut word = WordGso::new(word_matrix(rows), GsoConfig::default()).unwrap();
    let mut big = BigIntGso::new(int_matrix(rows), GsoConfig::default()).unwrap();
    let mut mpfr = BigFloatGso::new(int_matrix(rows), GsoConfig::default()).unwrap();

    for i in 0..3 {
        assert!(word.update_gso_row_full(i));
        assert!(big.update_gso_row_full(i));
        assert!(mpfr.update_gso_row_full(i));
    }

    for i in 1..3 {
        for j in 0..i {
            let a = word.get_mu(i, j).unwrap();
            let b = big.get_mu(i, j).unwrap();
            let c = mpfr.get_mu(i, j).unwrap().to_f64();
            assert!((a - b).abs() < 1e-9, "mu({}, {}): {} vs {}", i, j, a, b);
            assert!((a - c).abs() < 1e-9, "mu({}, {}): {} vs {}", i, j, a, c);
        }
    }
}

#[test]
fn test_int_and_float_gram_agree_after_mutations() {
    let rows: &[&[i64]] = &[&[5, 1, 0], &[3, 7, 2], &[1, -4, 6]];
    let int_cfg = GsoConfig {
        int_gram: true,
        ..GsoConfig::default()
    };
    let mut exact = BigIntGso::new(int_matrix(rows), int_cfg).unwrap();
    let mut cached = BigIntGso::new(int_matrix(rows), GsoConfig::default()).unwrap();

    for gso in [&mut exact, &mut cached] {
        assert!(gso.update_gso_row_full(2));
        gso.row_op_begin(0, 3);
        gso.row_addmul_si(1, 0, -2);
        gso.row_sub(2, 1);
        gso.row_op_end(0, 3);
        assert!(gso.update_gso_row_full(2));
    }

    for i in 0..3 {
        let a = exact.get_r(i, i).unwrap();
        let b = cached.get_r(i, i).unwrap();
        assert!((a - b).abs() < 1e-9, "r({0}, {0}): {1} vs {2}", i, a, b);
    }
}

/// A miniature LLL driver over the engine API: size-reduce, test the Lovasz
/// condition, swap on failure.
#[test]
fn test_size_reduction_loop_reaches_reduced_basis() {
    let delta = 0.99;
    let b = int_matrix(&[&[1, 1, 1], &[-1, 0, 2], &[3, 5, 6]]);
    let cfg = GsoConfig {
        int_gram: true,
        transform: true,
        ..GsoConfig::default()
    };
    let mut gso = BigIntGso::new(b, cfg).unwrap();
    let n = gso.d();

    let mut k = 1;
    let mut rounds = 0;
    while k < n {
        rounds += 1;
        assert!(rounds < 1000, "reduction failed to terminate");
        // Size-reduce row k from its highest coefficient down; each bracket
        // closes before the next mu is read so the value is fresh.
        for j in (0..k).rev() {
            let mu = gso.get_mu(k, j).unwrap();
            let c = mu.round();
            if c != 0.0 {
                gso.row_op_begin(k, k + 1);
                gso.row_addmul_we(k, j, &-c, 0);
                gso.row_op_end(k, k + 1);
            }
        }
        assert!(gso.update_gso_row_full(k));

        let r_prev = gso.get_r(k - 1, k - 1).unwrap();
        let r_cur = gso.get_r(k, k).unwrap();
        let mu = gso.get_mu(k, k - 1).unwrap();
        if r_cur >= (delta - mu * mu) * r_prev {
            k += 1;
        } else {
            gso.row_op_begin(k - 1, k + 1);
            gso.row_swap(k - 1, k);
            gso.row_op_end(k - 1, k + 1);
            k = k.max(2) - 1;
        }
    }

    // Size-reduction bound holds on the final basis.
    for i in 1..n {
        assert!(gso.update_gso_row_full(i));
        for j in 0..i {
            let mu = gso.get_mu(i, j).unwrap();
            assert!(mu.abs() <= 0.5 + 1e-9, "mu({}, {}) = {}", i, j, mu);
        }
    }
}

#[test]
fn test_force_long_routes_match_bigint_route() {
    let rows: &[&[i64]] = &[&[1, 0], &[0, 1]];
    let x = libm::ldexp(0.75, 72); // 3 * 2^70, exponent 72

    let long_cfg = GsoConfig {
        row_op_force_long: true,
        ..GsoConfig::default()
    };
    let mut forced = BigIntGso::new(int_matrix(rows), long_cfg).unwrap();
    assert!(forced.update_gso_row_full(1));
    forced.row_op_begin(1, 2);
    forced.row_addmul_we(1, 0, &x, 0);
    forced.row_op_end(1, 2);

    let mut exact = BigIntGso::new(int_matrix(rows), GsoConfig::default()).unwrap();
    assert!(exact.update_gso_row_full(1));
    exact.row_op_begin(1, 2);
    exact.row_addmul_we(1, 0, &x, 0);
    exact.row_op_end(1, 2);

    let expected = Integer::from(3) << 70u32;
    assert_eq!(forced.basis()[(1, 0)], expected);
    assert_eq!(exact.basis()[(1, 0)], expected);
}

#[test]
fn test_column_lock_freezes_width() {
    // Row 0 only occupies the first column; row 1 is full width.
    let b = int_matrix(&[&[1, 0, 0], &[2, 3, 4]]);
    let mut gso = BigIntGso::new(b, GsoConfig::default()).unwrap();

    assert!(gso.update_gso_row_full(0));
    assert_eq!(gso.n_known_cols(), 1);

    gso.lock_cols().unwrap();
    // Discovery under the lock must not widen the active columns.
    assert!(gso.update_gso_row(1, 0));
    assert_eq!(gso.n_known_cols(), 1);
    assert_eq!(gso.n_known_rows(), 2);

    gso.unlock_cols();
    assert_eq!(gso.n_known_rows(), 1);
    assert!(!gso.is_cols_locked());

    // After unlocking, rediscovery widens the columns again.
    assert!(gso.update_gso_row_full(1));
    assert_eq!(gso.n_known_cols(), 3);
}

#[test]
fn test_mpfr_backend_honors_precision() {
    let old = <Float as FloatScalar>::set_prec(192);

    let b = int_matrix(&[&[3, 1], &[1, 3]]);
    let mut gso = BigFloatGso::new(b, GsoConfig::default()).unwrap();
    assert!(gso.update_gso_row(1, 1));
    let mu = gso.get_mu(1, 0).unwrap();
    assert_eq!(mu.prec(), 192);
    // mu is 3/5 to 192 bits, far beyond what an f64 comparison could see.
    let err = (mu * 5i32 - 3i32).abs();
    assert!(err < 1e-50);

    <Float as FloatScalar>::set_prec(old);
}

#[test]
fn test_metrics_survive_row_churn() {
    let b = utils::perturbed_identity::<Integer>(4, 2, Some(77)).unwrap();
    let cfg = GsoConfig {
        int_gram: true,
        ..GsoConfig::default()
    };
    let mut gso = BigIntGso::new(b, cfg).unwrap();

    // Unimodular basis: determinant is 1, so the log-det is 0.
    let before = gso.get_log_det(0, 4).unwrap();
    assert!(before.abs() < 1e-6);

    gso.row_op_begin(0, 4);
    gso.row_addmul_si(2, 1, 2);
    gso.row_add(3, 2);
    gso.row_op_end(0, 4);
    gso.move_row(0, 2);

    // Row operations are unimodular: the determinant is untouched.
    let after = gso.get_log_det(0, 4).unwrap();
    assert!(after.abs() < 1e-6, "log_det drifted to {}", after);
}
