//! The annealer interface.
//!
//! A [`QuboAnnealer`] takes a [`QuboMatrix`] and an [`AnnealOptions`] bundle and
//! returns one [`AnnealRead`] per restart. [`check_state_matrix`] is shared by
//! annealers and their callers to validate state matrices.

use crate::qubo::QuboMatrix;
use crate::rng::RngKey;
use ndarray::Array2;
use trbm_core::config::{AnnealerConfig, UpdateStrategy};
use trbm_core::{Result, TrbmError};

/// How each read seeds its replicas before the first sweep.
#[derive(Debug, Clone, PartialEq)]
pub enum InitStrategy {
    /// Warm start from an explicit `(num_replicas, n)` binary matrix.
    Explicit(Array2<u8>),
    Zeros,
    Ones,
    /// Independent fair coin per variable.
    Random,
}

/// Options for one annealer invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnealOptions {
    /// Metropolis sweeps per replica.
    pub num_sweeps: usize,
    /// Independent restarts; each yields one [`AnnealRead`].
    pub num_reads: usize,
    /// Width of the temperature ladder.
    pub num_replicas: usize,
    pub update_strategy: UpdateStrategy,
    pub min_temp: f64,
    pub max_temp: f64,
    pub initialize: InitStrategy,
    pub parallel: bool,
    pub verbose: bool,
}

impl AnnealOptions {
    pub fn new(num_sweeps: usize, num_replicas: usize) -> Self {
        let defaults = AnnealerConfig::default();
        AnnealOptions {
            num_sweeps,
            num_reads: 1,
            num_replicas,
            update_strategy: defaults.update_strategy,
            min_temp: defaults.min_temp,
            max_temp: defaults.max_temp,
            initialize: InitStrategy::Random,
            parallel: defaults.parallel,
            verbose: defaults.verbose,
        }
    }

    /// Options built from a model's annealer settings.
    pub fn from_config(config: &AnnealerConfig, num_sweeps: usize, num_replicas: usize) -> Self {
        AnnealOptions {
            num_sweeps,
            num_reads: 1,
            num_replicas,
            update_strategy: config.update_strategy,
            min_temp: config.min_temp,
            max_temp: config.max_temp,
            initialize: InitStrategy::Random,
            parallel: config.parallel,
            verbose: config.verbose,
        }
    }

    pub fn with_reads(mut self, num_reads: usize) -> Self {
        self.num_reads = num_reads;
        self
    }

    pub fn with_initialize(mut self, initialize: InitStrategy) -> Self {
        self.initialize = initialize;
        self
    }

    pub fn with_temperatures(mut self, min_temp: f64, max_temp: f64) -> Self {
        self.min_temp = min_temp;
        self.max_temp = max_temp;
        self
    }

    pub fn with_update_strategy(mut self, update_strategy: UpdateStrategy) -> Self {
        self.update_strategy = update_strategy;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Check the options against a problem of `n_vars` variables.
    pub fn validate(&self, n_vars: usize) -> Result<()> {
        if self.num_sweeps == 0 || self.num_reads == 0 || self.num_replicas == 0 {
            return Err(TrbmError::InvalidConfig(format!(
                "num_sweeps, num_reads and num_replicas must be positive (got {}, {}, {})",
                self.num_sweeps, self.num_reads, self.num_replicas
            )));
        }
        AnnealerConfig {
            min_temp: self.min_temp,
            max_temp: self.max_temp,
            parallel: self.parallel,
            update_strategy: self.update_strategy,
            verbose: self.verbose,
        }
        .validate()?;

        if let InitStrategy::Explicit(states) = &self.initialize {
            check_state_matrix("initial states", states, self.num_replicas, n_vars)?;
        }
        Ok(())
    }
}

/// Outcome of one independent read.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnealRead {
    /// Final replica states, `(num_replicas, n)`, row k at ladder temperature k.
    pub states: Array2<u8>,
    /// Energy of each row of `states`.
    pub energies: Vec<f64>,
    /// Ladder temperatures, coldest first.
    pub temps: Vec<f64>,
    /// Lowest-energy configuration seen at any point during the read.
    pub best_state: Vec<u8>,
    pub best_energy: f64,
    pub num_sweeps: usize,
}

/// Everything an annealer returns; one entry per read.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnnealResults {
    pub reads: Vec<AnnealRead>,
}

impl AnnealResults {
    /// State matrices of every read, in read order.
    pub fn states(&self) -> impl Iterator<Item = &Array2<u8>> {
        self.reads.iter().map(|r| &r.states)
    }

    pub fn first_states(&self) -> Result<&Array2<u8>> {
        self.reads
            .first()
            .map(|r| &r.states)
            .ok_or(TrbmError::EmptyResults)
    }

    /// The read whose best energy is lowest.
    pub fn best_read(&self) -> Option<&AnnealRead> {
        self.reads
            .iter()
            .min_by(|a, b| a.best_energy.total_cmp(&b.best_energy))
    }
}

/// A solver that resamples binary states against a QUBO problem.
///
/// Implementations must return states of shape `(num_replicas, problem.dim())`.
pub trait QuboAnnealer: Send + Sync {
    fn anneal(
        &self,
        problem: &QuboMatrix,
        options: &AnnealOptions,
        key: RngKey,
    ) -> Result<AnnealResults>;
}

impl<A: QuboAnnealer + ?Sized> QuboAnnealer for Box<A> {
    fn anneal(
        &self,
        problem: &QuboMatrix,
        options: &AnnealOptions,
        key: RngKey,
    ) -> Result<AnnealResults> {
        (**self).anneal(problem, options, key)
    }
}

/// Verify a state matrix has the expected shape and only 0/1 entries.
pub fn check_state_matrix(
    what: &'static str,
    states: &Array2<u8>,
    rows: usize,
    cols: usize,
) -> Result<()> {
    let (r, c) = states.dim();
    if (r, c) != (rows, cols) {
        return Err(TrbmError::shape(what, &[rows, cols], &[r, c]));
    }
    if let Some(&bad) = states.iter().find(|&&x| x > 1) {
        return Err(TrbmError::NonBinary {
            what,
            value: bad as f32,
        });
    }
    Ok(())
}
