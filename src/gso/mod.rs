//! Incremental Gram-Schmidt orthogonalization over an integer lattice basis.
//!
//! The engine keeps three coupled representations of the basis: the exact
//! integer rows, a scaled floating image, and a Gram matrix (exact integer
//! or cached floating). Reduction drivers mutate rows through the engine and
//! read `mu(i, j)` / `r(i, j)` back; a per-row valid-prefix counter tracks
//! how much of the triangular tables reflects the current basis, and every
//! mutation invalidates the minimum sufficient suffix.

mod engine;
mod metrics;
mod row_ops;

pub use engine::GsoEngine;
pub use metrics::gaussian_heuristic;

use rug::{Float, Integer};
use serde::{Deserialize, Serialize};

use crate::core::error::{GsoError, Result};

/// Engine over machine-word basis entries with `f64` coefficients
pub type WordGso = GsoEngine<i64, f64>;
/// Engine over arbitrary-precision basis entries with `f64` coefficients
pub type BigIntGso = GsoEngine<Integer, f64>;
/// Engine over arbitrary-precision basis entries with MPFR coefficients
pub type BigFloatGso = GsoEngine<Integer, Float>;

/// Construction flags for [`GsoEngine`].
///
/// Each flag is independent except where `validate` says otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GsoConfig {
    /// Keep an exact integer Gram matrix alongside the basis. Excludes
    /// column locking.
    pub int_gram: bool,
    /// Maintain the floating basis image in a per-row scaled domain with a
    /// shared row exponent. Only meaningful without `int_gram`.
    pub row_expo: bool,
    /// Maintain the cumulative unimodular transformation
    pub transform: bool,
    /// Also maintain the transposed inverse transformation; requires
    /// `transform` and forbids `row_swap`
    pub inv_transform: bool,
    /// Prefer the long-mantissa-plus-exponent path over arbitrary-precision
    /// multiplicands when scaling rows
    pub row_op_force_long: bool,
}

impl GsoConfig {
    pub fn new() -> Self {
        GsoConfig::default()
    }

    /// Check flag compatibility
    pub fn validate(&self) -> Result<()> {
        if self.inv_transform && !self.transform {
            return Err(GsoError::config("inv_transform requires transform"));
        }
        Ok(())
    }
}
