//! Conic program model and its builder.
//!
//! Programs follow the standard conic form
//!
//! ```text
//! minimize    ½ xᵀ P x + qᵀ x
//! subject to  A x + s = b,   s ∈ K
//! ```
//!
//! where `K` is a product of zero, nonnegative and second-order cones and
//! `P` is stored as its upper triangle.

use super::sparse::SparseMatrix;
use crate::error::{MathError, MathResult};
use nalgebra::DMatrix;

/// A cone in the product `K`, with its dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cone {
    /// `s = 0`: equality rows.
    Zero(usize),
    /// `s ≥ 0`: inequality rows `a·x ≤ b`.
    Nonnegative(usize),
    /// `s₀ ≥ ‖s₁..‖₂`.
    SecondOrder(usize),
}

impl Cone {
    /// Number of rows covered by the cone.
    #[must_use]
    pub fn dim(&self) -> usize {
        match *self {
            Cone::Zero(d) | Cone::Nonnegative(d) | Cone::SecondOrder(d) => d,
        }
    }
}

/// Direction of a scalar linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    /// `a·x = b`
    Equal,
    /// `a·x ≤ b`
    LessEqual,
    /// `a·x ≥ b`
    GreaterEqual,
}

/// A scalar linear constraint `a·x (=|≤|≥) b` with sparse coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    /// `(variable index, coefficient)` pairs.
    pub terms: Vec<(usize, f64)>,
    /// Constraint direction.
    pub sense: Sense,
    /// Right-hand side.
    pub rhs: f64,
}

impl LinearConstraint {
    /// `a·x = b`
    #[must_use]
    pub fn equal(terms: Vec<(usize, f64)>, rhs: f64) -> Self {
        Self {
            terms,
            sense: Sense::Equal,
            rhs,
        }
    }

    /// `a·x ≤ b`
    #[must_use]
    pub fn less_equal(terms: Vec<(usize, f64)>, rhs: f64) -> Self {
        Self {
            terms,
            sense: Sense::LessEqual,
            rhs,
        }
    }

    /// `a·x ≥ b`
    #[must_use]
    pub fn greater_equal(terms: Vec<(usize, f64)>, rhs: f64) -> Self {
        Self {
            terms,
            sense: Sense::GreaterEqual,
            rhs,
        }
    }

    /// Evaluates `a·x`.
    pub fn lhs(&self, x: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(i, a)| a * x.get(i).copied().unwrap_or(0.0))
            .sum()
    }

    /// Amount by which `x` violates the constraint (zero when satisfied).
    pub fn violation(&self, x: &[f64]) -> f64 {
        let lhs = self.lhs(x);
        match self.sense {
            Sense::Equal => (lhs - self.rhs).abs(),
            Sense::LessEqual => (lhs - self.rhs).max(0.0),
            Sense::GreaterEqual => (self.rhs - lhs).max(0.0),
        }
    }
}

/// A fully assembled conic program.
#[derive(Debug, Clone)]
pub struct ConicProblem {
    num_vars: usize,
    p: SparseMatrix,
    q: Vec<f64>,
    a: SparseMatrix,
    b: Vec<f64>,
    cones: Vec<Cone>,
}

impl ConicProblem {
    /// Number of decision variables.
    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// Number of constraint rows.
    pub fn num_rows(&self) -> usize {
        self.b.len()
    }

    /// Upper triangle of the quadratic cost.
    pub fn p(&self) -> &SparseMatrix {
        &self.p
    }

    /// Linear cost.
    pub fn q(&self) -> &[f64] {
        &self.q
    }

    /// Constraint matrix.
    pub fn a(&self) -> &SparseMatrix {
        &self.a
    }

    /// Constraint right-hand side.
    pub fn b(&self) -> &[f64] {
        &self.b
    }

    /// Cone sequence matching the rows of `A`.
    pub fn cones(&self) -> &[Cone] {
        &self.cones
    }

    /// Replaces the quadratic cost in place.
    pub fn set_quadratic(&mut self, p: SparseMatrix) -> MathResult<()> {
        check_quadratic(&p, self.num_vars)?;
        self.p = p;
        Ok(())
    }

    /// Replaces the linear cost in place.
    pub fn set_linear(&mut self, q: Vec<f64>) -> MathResult<()> {
        if q.len() != self.num_vars {
            return Err(MathError::dimension_mismatch((self.num_vars, 1), (q.len(), 1)));
        }
        self.q = q;
        Ok(())
    }

    /// Evaluates `½ xᵀ P x + qᵀ x`.
    pub fn objective_value(&self, x: &[f64]) -> MathResult<f64> {
        if x.len() != self.num_vars {
            return Err(MathError::dimension_mismatch((self.num_vars, 1), (x.len(), 1)));
        }

        let mut quad = 0.0;
        let colptr = self.p.colptr();
        for c in 0..self.num_vars {
            for k in colptr[c]..colptr[c + 1] {
                let r = self.p.rowval()[k];
                let v = self.p.nzval()[k];
                // Off-diagonal entries stand for both (r, c) and (c, r).
                quad += if r == c { v * x[r] * x[c] } else { 2.0 * v * x[r] * x[c] };
            }
        }

        let lin: f64 = self.q.iter().zip(x).map(|(qi, xi)| qi * xi).sum();
        Ok(0.5 * quad + lin)
    }
}

fn check_quadratic(p: &SparseMatrix, num_vars: usize) -> MathResult<()> {
    if p.nrows() != num_vars || p.ncols() != num_vars {
        return Err(MathError::dimension_mismatch(
            (num_vars, num_vars),
            (p.nrows(), p.ncols()),
        ));
    }
    if !p.is_upper_triangular() {
        return Err(MathError::invalid_input(
            "quadratic cost must be stored as its upper triangle",
        ));
    }
    Ok(())
}

/// Incremental builder for [`ConicProblem`].
///
/// Scalar constraints are appended in order; consecutive rows of the same
/// kind share one cone.
#[derive(Debug, Clone)]
pub struct ProblemBuilder {
    num_vars: usize,
    p: Vec<(usize, usize, f64)>,
    q: Vec<f64>,
    a: Vec<(usize, usize, f64)>,
    b: Vec<f64>,
    cones: Vec<Cone>,
    stray_linear: Option<usize>,
}

impl ProblemBuilder {
    /// Starts a program over `num_vars` variables with zero cost.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            num_vars,
            p: Vec::new(),
            q: vec![0.0; num_vars],
            a: Vec::new(),
            b: Vec::new(),
            cones: Vec::new(),
            stray_linear: None,
        }
    }

    /// Number of decision variables.
    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// Adds `scale · xᵀ M x` to the objective, with `M` placed on the
    /// variables starting at `offset`.
    ///
    /// `M` is assumed symmetric; only its upper triangle is read.
    #[must_use]
    pub fn quadratic_form(mut self, offset: usize, matrix: &DMatrix<f64>, scale: f64) -> Self {
        self.p.extend(quadratic_form_triplets(offset, matrix, scale));
        self
    }

    /// Adds `scale · Σ dᵢ xᵢ²` to the objective for the variables starting
    /// at `offset`.
    #[must_use]
    pub fn diagonal_form(mut self, offset: usize, diagonal: &[f64], scale: f64) -> Self {
        self.p.extend(diagonal_form_triplets(offset, diagonal, scale));
        self
    }

    /// Sets the linear cost coefficient of variable `index`.
    ///
    /// An index past `num_vars` is reported by [`build`](Self::build).
    #[must_use]
    pub fn linear(mut self, index: usize, coefficient: f64) -> Self {
        match self.q.get_mut(index) {
            Some(q) => *q = coefficient,
            None => {
                self.stray_linear.get_or_insert(index);
            }
        }
        self
    }

    /// Appends a scalar linear constraint.
    #[must_use]
    pub fn constraint(mut self, constraint: LinearConstraint) -> Self {
        let (sign, cone) = match constraint.sense {
            Sense::Equal => (1.0, Cone::Zero(1)),
            Sense::LessEqual => (1.0, Cone::Nonnegative(1)),
            Sense::GreaterEqual => (-1.0, Cone::Nonnegative(1)),
        };

        let row = self.b.len();
        self.a
            .extend(constraint.terms.iter().map(|&(j, v)| (row, j, sign * v)));
        self.b.push(sign * constraint.rhs);
        self.push_cone(cone);
        self
    }

    /// Appends several scalar linear constraints.
    #[must_use]
    pub fn constraints(self, constraints: impl IntoIterator<Item = LinearConstraint>) -> Self {
        constraints.into_iter().fold(self, Self::constraint)
    }

    /// Appends a second-order cone block.
    ///
    /// Each row is `(terms, rhs)` describing `sₖ = rhsₖ − termsₖ·x`; the
    /// first row is the cone's scalar bound.
    #[must_use]
    pub fn second_order(mut self, rows: Vec<(Vec<(usize, f64)>, f64)>) -> Self {
        let dim = rows.len();
        for (terms, rhs) in rows {
            let row = self.b.len();
            self.a.extend(terms.into_iter().map(|(j, v)| (row, j, v)));
            self.b.push(rhs);
        }
        self.cones.push(Cone::SecondOrder(dim));
        self
    }

    fn push_cone(&mut self, cone: Cone) {
        match (self.cones.last_mut(), cone) {
            (Some(Cone::Zero(d)), Cone::Zero(k)) | (Some(Cone::Nonnegative(d)), Cone::Nonnegative(k)) => {
                *d += k;
            }
            _ => self.cones.push(cone),
        }
    }

    /// Assembles the sparse program.
    pub fn build(mut self) -> MathResult<ConicProblem> {
        if let Some(index) = self.stray_linear {
            return Err(MathError::dimension_mismatch((index + 1, 1), (self.num_vars, 1)));
        }
        if self.b.is_empty() {
            // The backend expects at least one cone; 0·x ≤ 1 is always true.
            self.b.push(1.0);
            self.cones.push(Cone::Nonnegative(1));
        }
        if self.b.iter().chain(&self.q).any(|v| !v.is_finite()) {
            return Err(MathError::invalid_input("program data contains NaN or infinite values"));
        }

        let p = SparseMatrix::from_triplets(self.num_vars, self.num_vars, &self.p)?;
        check_quadratic(&p, self.num_vars)?;
        let a = SparseMatrix::from_triplets(self.b.len(), self.num_vars, &self.a)?;

        Ok(ConicProblem {
            num_vars: self.num_vars,
            p,
            q: self.q,
            a,
            b: self.b,
            cones: self.cones,
        })
    }
}

/// Upper-triangular `P` entries for `scale · xᵀ M x` (that is `P = 2·scale·M`).
#[must_use]
pub fn quadratic_form_triplets(
    offset: usize,
    matrix: &DMatrix<f64>,
    scale: f64,
) -> Vec<(usize, usize, f64)> {
    let n = matrix.nrows().min(matrix.ncols());
    let mut out = Vec::with_capacity(n * (n + 1) / 2);
    for j in 0..n {
        for i in 0..=j {
            let v = 2.0 * scale * matrix[(i, j)];
            if v != 0.0 {
                out.push((offset + i, offset + j, v));
            }
        }
    }
    out
}

/// Upper-triangular `P` entries for `scale · Σ dᵢ xᵢ²`.
#[must_use]
pub fn diagonal_form_triplets(offset: usize, diagonal: &[f64], scale: f64) -> Vec<(usize, usize, f64)> {
    diagonal
        .iter()
        .enumerate()
        .filter(|(_, d)| **d != 0.0)
        .map(|(i, d)| (offset + i, offset + i, 2.0 * scale * d))
        .collect()
}
