//! Deterministic annealers for tests.

use crate::annealer::{AnnealOptions, AnnealRead, AnnealResults, QuboAnnealer};
use crate::qubo::QuboMatrix;
use crate::rng::RngKey;
use ndarray::Array2;
use std::sync::atomic::{AtomicUsize, Ordering};
use trbm_core::{Result, TrbmError};

/// Returns the same state matrix on every call, whatever the problem.
///
/// The matrix is not checked against the options, so a misshapen one can be used to
/// exercise a caller's validation.
#[derive(Debug)]
pub struct FixedAnnealer {
    states: Array2<u8>,
    calls: AtomicUsize,
}

impl FixedAnnealer {
    pub fn new(states: Array2<u8>) -> Self {
        FixedAnnealer {
            states,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl QuboAnnealer for FixedAnnealer {
    fn anneal(
        &self,
        problem: &QuboMatrix,
        options: &AnnealOptions,
        _key: RngKey,
    ) -> Result<AnnealResults> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let energies: Vec<f64> = if self.states.ncols() == problem.dim() {
            self.states
                .outer_iter()
                .map(|row| problem.energy(row))
                .collect()
        } else {
            vec![f64::NAN; self.states.nrows()]
        };
        let best_energy = energies.iter().copied().fold(f64::INFINITY, f64::min);
        let best_state = self
            .states
            .outer_iter()
            .next()
            .map(|row| row.to_vec())
            .unwrap_or_default();

        Ok(AnnealResults {
            reads: vec![AnnealRead {
                states: self.states.clone(),
                energies,
                temps: vec![options.min_temp; self.states.nrows()],
                best_state,
                best_energy,
                num_sweeps: options.num_sweeps,
            }],
        })
    }
}

/// Always fails with the given message.
#[derive(Debug, Clone)]
pub struct FailingAnnealer {
    pub message: String,
}

impl FailingAnnealer {
    pub fn new(message: impl Into<String>) -> Self {
        FailingAnnealer {
            message: message.into(),
        }
    }
}

impl QuboAnnealer for FailingAnnealer {
    fn anneal(
        &self,
        _problem: &QuboMatrix,
        _options: &AnnealOptions,
        _key: RngKey,
    ) -> Result<AnnealResults> {
        Err(TrbmError::Annealer(self.message.clone()))
    }
}

/// Returns a result with no reads at all.
#[derive(Debug, Clone, Default)]
pub struct EmptyAnnealer;

impl QuboAnnealer for EmptyAnnealer {
    fn anneal(
        &self,
        _problem: &QuboMatrix,
        _options: &AnnealOptions,
        _key: RngKey,
    ) -> Result<AnnealResults> {
        Ok(AnnealResults::default())
    }
}
