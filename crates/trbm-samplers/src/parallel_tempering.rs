//! Parallel-tempering Metropolis annealer for QUBO problems.
//!
//! CPU f64 implementation of [`QuboAnnealer`].
//!
//! ## Algorithm
//!
//! 1. Place `num_replicas` replicas on a geometric temperature ladder
//!    (`min_temp` → `max_temp`) and seed them from the initialize strategy
//! 2. For each sweep:
//!    - every replica runs one Metropolis pass at its own temperature, flipping
//!      `x_i` with probability `min(1, exp(-β ΔE))`
//!    - neighbouring replicas try to exchange configurations with probability
//!      `min(1, exp((β_k - β_{k+1}) (E_k - E_{k+1})))`
//! 3. Row k of the returned states is the configuration held at temperature k
//!
//! Replica passes run on the rayon pool when `parallel` is set. Each replica draws from
//! its own key, so the result for a given key does not depend on `parallel`.
//!
//! ## Example
//!
//! ```
//! use ndarray::arr2;
//! use trbm_samplers::annealer::{AnnealOptions, QuboAnnealer};
//! use trbm_samplers::parallel_tempering::ParallelTempering;
//! use trbm_samplers::qubo::QuboMatrix;
//! use trbm_samplers::rng::RngKey;
//!
//! // Two variables that each want to be on, but repel each other
//! let problem = QuboMatrix::new(arr2(&[[-1.0, 3.0], [3.0, -1.0]])).unwrap();
//! let options = AnnealOptions::new(50, 4).with_temperatures(0.1, 2.0);
//!
//! let results = ParallelTempering::new().anneal(&problem, &options, RngKey::new(0)).unwrap();
//! assert_eq!(results.reads[0].best_energy, -1.0);
//! ```

use crate::annealer::{AnnealOptions, AnnealRead, AnnealResults, InitStrategy, QuboAnnealer};
use crate::qubo::QuboMatrix;
use crate::rng::RngKey;
use crate::schedule::TemperatureLadder;
use ndarray::{Array2, ArrayView1};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use trbm_core::config::UpdateStrategy;
use trbm_core::{Result, TrbmError};

/// Parallel-tempering annealer.
#[derive(Debug, Clone, Default)]
pub struct ParallelTempering;

impl ParallelTempering {
    pub fn new() -> Self {
        ParallelTempering
    }

    fn run_read(
        &self,
        problem: &QuboMatrix,
        options: &AnnealOptions,
        ladder: &TemperatureLadder,
        key: RngKey,
        read_idx: usize,
    ) -> Result<AnnealRead> {
        let n = problem.dim();
        let n_replicas = options.num_replicas;
        let betas = ladder.betas();
        let (init_key, run_key) = key.split_two();

        let states = initial_states(&options.initialize, n_replicas, n, init_key);
        let mut replicas: Vec<Replica> = states
            .into_iter()
            .map(|state| Replica::new(problem, state))
            .collect();

        let (mut best_state, mut best_energy) = lowest(&replicas);

        for sweep in 0..options.num_sweeps {
            let keys = run_key.fold_in(sweep as u64).split(n_replicas + 1);
            let strategy = options.update_strategy;

            let accepted: usize = if options.parallel {
                replicas
                    .par_iter_mut()
                    .zip(betas.par_iter())
                    .zip(keys[..n_replicas].par_iter())
                    .map(|((replica, &beta), key)| {
                        replica.sweep(problem, beta, strategy, &mut key.to_rng())
                    })
                    .sum()
            } else {
                replicas
                    .iter_mut()
                    .zip(betas.iter())
                    .zip(keys[..n_replicas].iter())
                    .map(|((replica, &beta), key)| {
                        replica.sweep(problem, beta, strategy, &mut key.to_rng())
                    })
                    .sum()
            };

            let mut swap_rng = keys[n_replicas].to_rng();
            let swaps = exchange_replicas(&mut replicas, &betas, &mut swap_rng);

            let (sweep_state, sweep_energy) = lowest(&replicas);
            if sweep_energy < best_energy {
                best_energy = sweep_energy;
                best_state = sweep_state;
            }

            if options.verbose {
                log::info!(
                    "read {} sweep {}/{}: accepted {} flips, {} swaps, best energy {:.6}",
                    read_idx,
                    sweep + 1,
                    options.num_sweeps,
                    accepted,
                    swaps,
                    best_energy
                );
            } else {
                log::trace!("sweep {sweep}: {accepted} flips, {swaps} swaps");
            }
        }

        let mut flat = Vec::with_capacity(n_replicas * n);
        let mut energies = Vec::with_capacity(n_replicas);
        for replica in &replicas {
            flat.extend_from_slice(&replica.state);
            // Recompute exactly; the running energy accumulates rounding from the updates
            let row = ArrayView1::from(&replica.state[..]);
            energies.push(problem.energy(row));
        }
        let states = Array2::from_shape_vec((n_replicas, n), flat)
            .map_err(|e| TrbmError::Annealer(e.to_string()))?;
        let best_energy = problem.energy(ArrayView1::from(&best_state[..]));

        log::debug!(
            "read {} finished after {} sweeps: best energy {:.6}, coldest replica {:.6}",
            read_idx,
            options.num_sweeps,
            best_energy,
            energies.first().copied().unwrap_or(f64::NAN)
        );

        Ok(AnnealRead {
            states,
            energies,
            temps: ladder.temps().to_vec(),
            best_state,
            best_energy,
            num_sweeps: options.num_sweeps,
        })
    }
}

impl QuboAnnealer for ParallelTempering {
    fn anneal(
        &self,
        problem: &QuboMatrix,
        options: &AnnealOptions,
        key: RngKey,
    ) -> Result<AnnealResults> {
        options.validate(problem.dim())?;
        let (min_temp, max_temp) = (options.min_temp, options.max_temp);
        let ladder = TemperatureLadder::geometric(min_temp, max_temp, options.num_replicas);

        let reads = key
            .split(options.num_reads)
            .into_iter()
            .enumerate()
            .map(|(read_idx, read_key)| {
                self.run_read(problem, options, &ladder, read_key, read_idx)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(AnnealResults { reads })
    }
}

/// One chain of the ladder, with its cached local fields and running energy.
#[derive(Debug, Clone)]
struct Replica {
    state: Vec<u8>,
    fields: Vec<f64>,
    energy: f64,
}

impl Replica {
    fn new(problem: &QuboMatrix, state: Vec<u8>) -> Self {
        let fields = problem.local_fields(&state);
        let energy = problem.energy(ArrayView1::from(&state[..]));
        Replica {
            state,
            fields,
            energy,
        }
    }

    /// One Metropolis pass; returns the number of accepted flips.
    fn sweep(
        &mut self,
        problem: &QuboMatrix,
        beta: f64,
        strategy: UpdateStrategy,
        rng: &mut ChaCha8Rng,
    ) -> usize {
        let n = self.state.len();
        let mut accepted = 0;

        for step in 0..n {
            let i = match strategy {
                UpdateStrategy::Sequential => step,
                UpdateStrategy::Random => rng.gen_range(0..n),
            };

            let delta = problem.flip_delta(i, self.state[i], self.fields[i]);
            if delta <= 0.0 || rng.gen::<f64>() < (-beta * delta).exp() {
                self.flip(problem, i, delta);
                accepted += 1;
            }
        }

        accepted
    }

    fn flip(&mut self, problem: &QuboMatrix, i: usize, delta: f64) {
        let dx = if self.state[i] == 0 { 1.0 } else { -1.0 };
        self.state[i] ^= 1;
        self.energy += delta;
        for (j, field) in self.fields.iter_mut().enumerate() {
            if j != i {
                *field += problem.get(j, i) as f64 * dx;
            }
        }
    }
}

/// Replica-exchange moves between every pair of neighbouring temperatures.
fn exchange_replicas(replicas: &mut [Replica], betas: &[f64], rng: &mut ChaCha8Rng) -> usize {
    let mut swaps = 0;
    for k in 0..replicas.len().saturating_sub(1) {
        let d_beta = betas[k] - betas[k + 1];
        let d_energy = replicas[k].energy - replicas[k + 1].energy;
        let log_accept = d_beta * d_energy;
        if log_accept >= 0.0 || rng.gen::<f64>() < log_accept.exp() {
            replicas.swap(k, k + 1);
            swaps += 1;
        }
    }
    swaps
}

fn lowest(replicas: &[Replica]) -> (Vec<u8>, f64) {
    replicas
        .iter()
        .min_by(|a, b| a.energy.total_cmp(&b.energy))
        .map(|r| (r.state.clone(), r.energy))
        .unwrap_or((Vec::new(), f64::INFINITY))
}

fn initial_states(init: &InitStrategy, rows: usize, cols: usize, key: RngKey) -> Vec<Vec<u8>> {
    match init {
        InitStrategy::Explicit(states) => states.outer_iter().map(|row| row.to_vec()).collect(),
        InitStrategy::Zeros => vec![vec![0; cols]; rows],
        InitStrategy::Ones => vec![vec![1; cols]; rows],
        InitStrategy::Random => {
            let mut rng = key.to_rng();
            (0..rows)
                .map(|_| (0..cols).map(|_| rng.gen::<bool>() as u8).collect())
                .collect()
        }
    }
}
