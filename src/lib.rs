//! Incremental Gram-Schmidt orthogonalization engine for integer lattices
//!
//! This crate provides the numeric substrate lattice-reduction algorithms
//! (LLL, BKZ) are built on: an engine that owns an integer basis and
//! maintains, lazily, the orthogonalization coefficients `mu(i, j)` and the
//! squared Gram-Schmidt norms `r(i, i)`, together with optional companion
//! data (unimodular transform, exact integer Gram matrix, per-row
//! exponents). Reduction drivers mutate rows in place through the engine;
//! only the invalidated part of the triangular tables is ever recomputed.
//!
//! The engine is generic over a `(Z, F)` back-end pair: machine words and
//! `f64` for speed, `rug::Integer` and `rug::Float` (GMP/MPFR) when entries
//! or precision outgrow the hardware types.
//!
//! # Examples
//!
//! Querying GSO coefficients:
//! ```rust
//! use lattice_gso::{BigIntGso, GsoConfig, Matrix};
//! use rug::Integer;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let b = Matrix::new(vec![
//!     vec![Integer::from(3), Integer::from(1)],
//!     vec![Integer::from(1), Integer::from(3)],
//! ])?;
//! let cfg = GsoConfig {
//!     int_gram: true,
//!     ..GsoConfig::default()
//! };
//! let mut gso = BigIntGso::new(b, cfg)?;
//!
//! assert!(gso.update_gso_row(1, 1));
//! assert!((gso.get_mu(1, 0)? - 0.6).abs() < 1e-12);
//! assert!((gso.get_r(1, 1)? - 6.4).abs() < 1e-12);
//! # Ok(())
//! # }
//! ```
//!
//! Mutating rows the way a size-reduction step would:
//! ```rust
//! use lattice_gso::{BigIntGso, GsoConfig, Matrix};
//! use rug::Integer;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let b = Matrix::new(vec![
//!     vec![Integer::from(2), Integer::from(0)],
//!     vec![Integer::from(4), Integer::from(1)],
//! ])?;
//! let mut gso = BigIntGso::new(b, GsoConfig::default())?;
//! assert!(gso.update_gso_row(1, 1));
//!
//! let mu = gso.get_mu(1, 0)?;
//! gso.row_op_begin(1, 2);
//! gso.row_addmul_we(1, 0, &-mu.round(), 0);
//! gso.row_op_end(1, 2);
//!
//! assert_eq!(gso.basis()[(1, 0)], Integer::from(0));
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod gso;
pub mod nr;
pub mod utils;

pub use crate::core::error::{GsoError, Result};
pub use crate::core::matrix::Matrix;
pub use crate::gso::{
    gaussian_heuristic, BigFloatGso, BigIntGso, GsoConfig, GsoEngine, WordGso,
};
pub use crate::nr::{FloatFromInt, FloatScalar, IntScalar};

#[cfg(test)]
mod tests;
