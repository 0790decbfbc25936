//! Compressed sparse column storage for conic program data.

use crate::error::{MathError, MathResult};

/// A sparse matrix in compressed sparse column (CSC) form.
///
/// Entries within a column are sorted by row and duplicates are merged at
/// construction, which is the layout interior-point backends expect.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    nrows: usize,
    ncols: usize,
    colptr: Vec<usize>,
    rowval: Vec<usize>,
    nzval: Vec<f64>,
}

impl SparseMatrix {
    /// Creates an all-zero matrix with no stored entries.
    #[must_use]
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            colptr: vec![0; ncols + 1],
            rowval: Vec::new(),
            nzval: Vec::new(),
        }
    }

    /// Builds a matrix from `(row, col, value)` triplets.
    ///
    /// Duplicate coordinates are summed; entries that sum to exactly zero
    /// are dropped.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        triplets: &[(usize, usize, f64)],
    ) -> MathResult<Self> {
        if let Some(&(r, c, _)) = triplets.iter().find(|(r, c, _)| *r >= nrows || *c >= ncols) {
            return Err(MathError::invalid_input(format!(
                "entry ({r}, {c}) outside a {nrows}x{ncols} matrix"
            )));
        }
        if triplets.iter().any(|(_, _, v)| !v.is_finite()) {
            return Err(MathError::invalid_input("sparse entry is NaN or infinite"));
        }

        let mut sorted = triplets.to_vec();
        sorted.sort_by(|a, b| (a.1, a.0).cmp(&(b.1, b.0)));

        let mut merged: Vec<(usize, usize, f64)> = Vec::with_capacity(sorted.len());
        for (r, c, v) in sorted {
            match merged.last_mut() {
                Some(last) if last.0 == r && last.1 == c => last.2 += v,
                _ => merged.push((r, c, v)),
            }
        }
        merged.retain(|(_, _, v)| *v != 0.0);

        let mut colptr = vec![0; ncols + 1];
        for &(_, c, _) in &merged {
            colptr[c + 1] += 1;
        }
        for c in 0..ncols {
            colptr[c + 1] += colptr[c];
        }

        Ok(Self {
            nrows,
            ncols,
            colptr,
            rowval: merged.iter().map(|t| t.0).collect(),
            nzval: merged.iter().map(|t| t.2).collect(),
        })
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.nzval.len()
    }

    /// Column pointers (length `ncols + 1`).
    pub fn colptr(&self) -> &[usize] {
        &self.colptr
    }

    /// Row index of each stored entry.
    pub fn rowval(&self) -> &[usize] {
        &self.rowval
    }

    /// Value of each stored entry.
    pub fn nzval(&self) -> &[f64] {
        &self.nzval
    }

    /// Returns a copy with every entry multiplied by `factor`.
    ///
    /// A zero factor yields a matrix with no stored entries.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        if factor == 0.0 {
            return Self::zeros(self.nrows, self.ncols);
        }
        Self {
            nzval: self.nzval.iter().map(|v| v * factor).collect(),
            ..self.clone()
        }
    }

    /// True if no stored entry lies below the diagonal.
    pub fn is_upper_triangular(&self) -> bool {
        (0..self.ncols).all(|c| {
            self.rowval[self.colptr[c]..self.colptr[c + 1]]
                .iter()
                .all(|&r| r <= c)
        })
    }

    /// Computes `A x`.
    pub fn mul_vec(&self, x: &[f64]) -> MathResult<Vec<f64>> {
        if x.len() != self.ncols {
            return Err(MathError::dimension_mismatch(
                (self.nrows, self.ncols),
                (x.len(), 1),
            ));
        }

        let mut out = vec![0.0; self.nrows];
        for (c, xc) in x.iter().enumerate() {
            for k in self.colptr[c]..self.colptr[c + 1] {
                out[self.rowval[k]] += self.nzval[k] * xc;
            }
        }
        Ok(out)
    }
}
