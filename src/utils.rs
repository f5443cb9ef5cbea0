//! Basis generators and numeric helpers shared by tests and benchmarks.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::error::Result;
use crate::core::matrix::Matrix;
use crate::nr::int::IntScalar;

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => {
            let mut entropy = rand::rng();
            <StdRng as SeedableRng>::from_rng(&mut entropy)
        }
    }
}

/// Generate a dense random basis with entries in `[-bound, bound]`
pub fn random_basis<Z: IntScalar>(
    rows: usize,
    cols: usize,
    bound: i64,
    seed: Option<u64>,
) -> Result<Matrix<Z>> {
    let mut rng = seeded_rng(seed);
    let data = (0..rows)
        .map(|_| {
            (0..cols)
                .map(|_| Z::from_i64(rng.random_range(-bound..=bound)))
                .collect()
        })
        .collect();
    Matrix::new(data)
}

/// Identity basis with random noise above the diagonal. Unimodular by
/// construction, so always full rank.
pub fn perturbed_identity<Z: IntScalar>(
    n: usize,
    noise: i64,
    seed: Option<u64>,
) -> Result<Matrix<Z>> {
    let mut rng = seeded_rng(seed);
    let data = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    if j == i {
                        Z::from_i64(1)
                    } else if j > i {
                        Z::from_i64(rng.random_range(-noise..=noise))
                    } else {
                        Z::zero()
                    }
                })
                .collect()
        })
        .collect();
    Matrix::new(data)
}

/// Gamma function approximation (Lanczos approximation)
pub fn gamma(mut x: f64) -> f64 {
    let g = 7.0;
    let p = [
        0.99999999999980993,
        676.5203681218851,
        -1259.1392167224028,
        771.32342877765313,
        -176.61502916214059,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];

    if x < 0.5 {
        return std::f64::consts::PI / (x * std::f64::consts::PI).sin() * gamma(1.0 - x);
    }

    x -= 1.0;
    let mut a = p[0];
    for (i, &pi) in p.iter().enumerate().skip(1) {
        a += pi / (x + i as f64);
    }

    let t = x + g + 0.5;
    (2.0 * std::f64::consts::PI).sqrt() * t.powf(x + 0.5) * (-t).exp() * a
}
