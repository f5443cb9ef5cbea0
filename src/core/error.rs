//! Error types for the GSO engine

use thiserror::Error;

/// Errors surfaced by the engine to its caller (the reduction driver).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GsoError {
    /// Incompatible flag combination at construction or lock time
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Index out of range, operation under an incompatible lock, or a
    /// mismatched row-operation bracket
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// `update_gso_row` divided by a zero or denormal `r(j,j)` and produced
    /// a non-finite coefficient
    #[error("non-finite GSO coefficient at row {row}, column {col}")]
    NonFinite { row: usize, col: usize },
}

impl GsoError {
    /// Create a configuration error with the given message
    pub fn config(msg: impl Into<String>) -> Self {
        GsoError::Config(msg.into())
    }

    /// Create a precondition error with the given message
    pub fn precondition(msg: impl Into<String>) -> Self {
        GsoError::Precondition(msg.into())
    }

    /// Create a non-finite coefficient error
    pub fn non_finite(row: usize, col: usize) -> Self {
        GsoError::NonFinite { row, col }
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, GsoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GsoError::config("inv_transform requires transform");
        assert_eq!(
            format!("{}", err),
            "invalid configuration: inv_transform requires transform"
        );

        let err = GsoError::non_finite(3, 1);
        assert_eq!(
            format!("{}", err),
            "non-finite GSO coefficient at row 3, column 1"
        );
    }
}
