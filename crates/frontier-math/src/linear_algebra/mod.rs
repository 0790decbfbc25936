//! Linear algebra utilities.
//!
//! Shape and definiteness checks for covariance-style matrices, plus the
//! few dense operations the portfolio layer needs (quadratic forms and
//! extreme eigenpairs).

use crate::error::{MathError, MathResult};
use nalgebra::{DMatrix, DVector, SymmetricEigen};

/// Default absolute tolerance used for symmetry checks.
pub const SYMMETRY_TOLERANCE: f64 = 1e-8;

/// Default relative tolerance used for PSD checks.
pub const PSD_TOLERANCE: f64 = 1e-8;

/// Builds a dense matrix from row vectors.
///
/// Every row must have the same length.
pub fn from_rows(rows: &[Vec<f64>]) -> MathResult<DMatrix<f64>> {
    let nrows = rows.len();
    let ncols = rows.first().map_or(0, Vec::len);

    if let Some(bad) = rows.iter().find(|r| r.len() != ncols) {
        return Err(MathError::dimension_mismatch((1, ncols), (1, bad.len())));
    }

    Ok(DMatrix::from_fn(nrows, ncols, |i, j| rows[i][j]))
}

/// Checks that a matrix has exactly the given shape.
pub fn check_shape(matrix: &DMatrix<f64>, rows: usize, cols: usize) -> MathResult<()> {
    if matrix.nrows() != rows || matrix.ncols() != cols {
        return Err(MathError::dimension_mismatch(
            (rows, cols),
            (matrix.nrows(), matrix.ncols()),
        ));
    }
    Ok(())
}

/// Checks that all entries are finite.
pub fn check_finite(matrix: &DMatrix<f64>) -> MathResult<()> {
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(MathError::invalid_input("matrix contains NaN or infinite entries"));
    }
    Ok(())
}

/// Checks that a square matrix is symmetric within an absolute tolerance.
///
/// On failure the error reports the most asymmetric entry.
pub fn check_symmetric(matrix: &DMatrix<f64>, tolerance: f64) -> MathResult<()> {
    let n = matrix.nrows();
    check_shape(matrix, n, n)?;

    let mut worst = (0, 0, 0.0_f64);
    for i in 0..n {
        for j in (i + 1)..n {
            let gap = (matrix[(i, j)] - matrix[(j, i)]).abs();
            if gap > worst.2 {
                worst = (i, j, gap);
            }
        }
    }

    let scale = matrix.amax().max(1.0);
    if worst.2 > tolerance * scale {
        return Err(MathError::NotSymmetric {
            row: worst.0,
            col: worst.1,
            gap: worst.2,
        });
    }
    Ok(())
}

/// Returns `(A + Aᵀ) / 2`.
#[must_use]
pub fn symmetrize(matrix: &DMatrix<f64>) -> DMatrix<f64> {
    (matrix + matrix.transpose()) * 0.5
}

/// Smallest eigenvalue of a symmetric matrix and its unit eigenvector.
///
/// Only the lower triangle is read, so the input should already be
/// symmetric.
pub fn min_eigenpair(matrix: &DMatrix<f64>) -> MathResult<(f64, DVector<f64>)> {
    let n = matrix.nrows();
    check_shape(matrix, n, n)?;
    if n == 0 {
        return Err(MathError::invalid_input("eigenpair of an empty matrix"));
    }

    let eigen = SymmetricEigen::new(matrix.clone());
    let mut idx = 0;
    for k in 1..n {
        if eigen.eigenvalues[k] < eigen.eigenvalues[idx] {
            idx = k;
        }
    }

    Ok((
        eigen.eigenvalues[idx],
        eigen.eigenvectors.column(idx).into_owned(),
    ))
}

/// Checks that a symmetric matrix is positive semidefinite.
///
/// The tolerance is relative to the largest absolute entry, so a
/// covariance matrix of daily returns and one of annual returns are held
/// to the same standard. Returns the minimum eigenvalue on success.
pub fn check_positive_semidefinite(matrix: &DMatrix<f64>, tolerance: f64) -> MathResult<f64> {
    let n = matrix.nrows();
    check_shape(matrix, n, n)?;
    if n == 0 {
        return Ok(0.0);
    }

    let (min_eigenvalue, _) = min_eigenpair(&symmetrize(matrix))?;
    let scale = matrix.amax().max(f64::MIN_POSITIVE);
    if min_eigenvalue < -tolerance * scale {
        return Err(MathError::NotPositiveSemidefinite { min_eigenvalue });
    }
    Ok(min_eigenvalue)
}

/// True when every off-diagonal entry is within `tolerance` of zero.
#[must_use]
pub fn is_diagonal(matrix: &DMatrix<f64>, tolerance: f64) -> bool {
    for j in 0..matrix.ncols() {
        for i in 0..matrix.nrows() {
            if i != j && matrix[(i, j)].abs() > tolerance {
                return false;
            }
        }
    }
    true
}

/// Computes the quadratic form `xᵀ A x`.
pub fn quad_form(matrix: &DMatrix<f64>, x: &DVector<f64>) -> MathResult<f64> {
    let n = x.len();
    check_shape(matrix, n, n)?;
    Ok(x.dot(&(matrix * x)))
}
