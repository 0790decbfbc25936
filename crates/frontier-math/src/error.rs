//! Error types for mathematical operations.

use thiserror::Error;

/// A specialized Result type for mathematical operations.
pub type MathResult<T> = Result<T, MathError>;

/// Errors that can occur during mathematical operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    /// Matrix dimensions are incompatible.
    #[error("Incompatible matrix dimensions: ({rows1}x{cols1}) and ({rows2}x{cols2})")]
    DimensionMismatch {
        /// Rows in first matrix.
        rows1: usize,
        /// Columns in first matrix.
        cols1: usize,
        /// Rows in second matrix.
        rows2: usize,
        /// Columns in second matrix.
        cols2: usize,
    },

    /// Matrix is not symmetric within tolerance.
    #[error("Matrix is not symmetric: |a[{row},{col}] - a[{col},{row}]| = {gap:.2e}")]
    NotSymmetric {
        /// Row of the worst asymmetric entry.
        row: usize,
        /// Column of the worst asymmetric entry.
        col: usize,
        /// Absolute asymmetry.
        gap: f64,
    },

    /// Matrix has an eigenvalue below the PSD tolerance.
    #[error("Matrix is not positive semidefinite: minimum eigenvalue {min_eigenvalue:.3e}")]
    NotPositiveSemidefinite {
        /// Smallest eigenvalue found.
        min_eigenvalue: f64,
    },

    /// Invalid input parameter.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Description of the invalid input.
        reason: String,
    },

    /// The conic solver rejected the problem data or settings.
    #[error("Solver setup failed: {reason}")]
    SolverSetup {
        /// Message reported by the backend.
        reason: String,
    },
}

impl MathError {
    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Creates a solver setup error.
    #[must_use]
    pub fn solver_setup(reason: impl Into<String>) -> Self {
        Self::SolverSetup {
            reason: reason.into(),
        }
    }

    /// Creates a dimension mismatch error between two shapes.
    #[must_use]
    pub fn dimension_mismatch(lhs: (usize, usize), rhs: (usize, usize)) -> Self {
        Self::DimensionMismatch {
            rows1: lhs.0,
            cols1: lhs.1,
            rows2: rhs.0,
            cols2: rhs.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MathError::dimension_mismatch((3, 3), (2, 2));
        assert!(err.to_string().contains("(3x3) and (2x2)"));

        let err = MathError::NotPositiveSemidefinite {
            min_eigenvalue: -0.5,
        };
        assert!(err.to_string().contains("positive semidefinite"));
    }

    #[test]
    fn test_constructors() {
        assert_eq!(
            MathError::solver_setup("bad cone"),
            MathError::SolverSetup {
                reason: "bad cone".to_string()
            }
        );
        assert!(MathError::invalid_input("nan").to_string().contains("nan"));
    }
}
