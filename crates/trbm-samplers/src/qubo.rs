//! Dense QUBO problems over binary variables.
//!
//! ## Energy convention
//!
//! For a symmetric matrix `Q` and `x ∈ {0,1}^n`:
//!
//! ```text
//! E(x) = Σ_i Q_ii x_i + Σ_{i<j} Q_ij x_i x_j
//! ```
//!
//! Each off-diagonal pair is counted once. With this convention the block matrix
//! `-[[diag(a), W], [Wᵀ, diag(b)]]` has exactly the RBM energy
//! `-(a·v + b·h + vᵀWh)`, so annealing it at temperature 1 targets the RBM joint
//! distribution.

use ndarray::{Array2, ArrayView1};
use trbm_core::{Result, TrbmError};

const SYMMETRY_TOL: f32 = 1e-5;

/// A square, symmetric, finite QUBO coefficient matrix stored in `f32`.
#[derive(Debug, Clone, PartialEq)]
pub struct QuboMatrix {
    coeffs: Array2<f32>,
}

impl QuboMatrix {
    pub fn new(coeffs: Array2<f32>) -> Result<Self> {
        let (rows, cols) = coeffs.dim();
        if rows != cols {
            return Err(TrbmError::InvalidProblem(format!(
                "QUBO matrix must be square, got {rows}x{cols}"
            )));
        }
        if let Some(bad) = coeffs.iter().find(|c| !c.is_finite()) {
            return Err(TrbmError::InvalidProblem(format!(
                "QUBO matrix contains non-finite coefficient {bad}"
            )));
        }
        for i in 0..rows {
            for j in (i + 1)..cols {
                let (a, b) = (coeffs[[i, j]], coeffs[[j, i]]);
                if (a - b).abs() > SYMMETRY_TOL * (1.0 + a.abs().max(b.abs())) {
                    return Err(TrbmError::InvalidProblem(format!(
                        "QUBO matrix is not symmetric at ({i}, {j}): {a} vs {b}"
                    )));
                }
            }
        }
        Ok(QuboMatrix { coeffs })
    }

    /// Build a problem from a row-major `f32` buffer.
    pub fn from_row_major(n: usize, values: Vec<f32>) -> Result<Self> {
        let coeffs = Array2::from_shape_vec((n, n), values)
            .map_err(|e| TrbmError::InvalidProblem(e.to_string()))?;
        Self::new(coeffs)
    }

    /// Number of binary variables.
    pub fn dim(&self) -> usize {
        self.coeffs.nrows()
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.coeffs[[i, j]]
    }

    /// The same problem with every coefficient sign-flipped.
    pub fn negated(&self) -> Self {
        QuboMatrix {
            coeffs: self.coeffs.mapv(|c| -c),
        }
    }

    /// Energy of one binary configuration, accumulated in f64.
    pub fn energy(&self, x: ArrayView1<'_, u8>) -> f64 {
        let n = self.dim();
        let mut energy = 0.0f64;
        for i in 0..n {
            if x[i] == 0 {
                continue;
            }
            energy += self.coeffs[[i, i]] as f64;
            for j in (i + 1)..n {
                if x[j] != 0 {
                    energy += self.coeffs[[i, j]] as f64;
                }
            }
        }
        energy
    }

    /// Off-diagonal field `Σ_{j≠i} Q_ij x_j` seen by every variable.
    pub fn local_fields(&self, x: &[u8]) -> Vec<f64> {
        let n = self.dim();
        (0..n)
            .map(|i| {
                (0..n)
                    .filter(|&j| j != i && x[j] != 0)
                    .map(|j| self.coeffs[[i, j]] as f64)
                    .sum()
            })
            .collect()
    }

    /// Energy change from flipping variable `i`, given its current value and local field.
    #[inline]
    pub fn flip_delta(&self, i: usize, x_i: u8, field_i: f64) -> f64 {
        let dx = if x_i == 0 { 1.0 } else { -1.0 };
        dx * (self.coeffs[[i, i]] as f64 + field_i)
    }
}
