//! # trbm-samplers
//!
//! Sampling building blocks for annealed Restricted Boltzmann Machines.
//!
//! - **Bernoulli sampling** from logits via [`sample_bernoulli_logits`]
//! - **QUBO problems** via [`QuboMatrix`]
//! - **Annealer interface** via the [`QuboAnnealer`] trait, [`AnnealOptions`] and
//!   [`AnnealResults`]
//! - **Parallel tempering** via [`ParallelTempering`], a CPU Metropolis annealer over a
//!   geometric [`TemperatureLadder`]
//! - **Test doubles** in [`mocks`]
//!
//! ## RNG Key System
//!
//! Deterministic RNG key management (similar to JAX):
//!
//! ```rust
//! use trbm_samplers::RngKey;
//!
//! let key = RngKey::new(42);
//! let (key1, key2) = key.split_two();
//! assert_ne!(key1, key2);
//! ```
//!
//! ## Temperature ladder
//!
//! ```rust
//! use trbm_samplers::TemperatureLadder;
//!
//! let ladder = TemperatureLadder::geometric(1.0, 3.5, 8);
//! assert_eq!(ladder.temps()[0], 1.0);
//! ```

#![recursion_limit = "256"]

pub mod annealer;
pub mod bernoulli;
pub mod mocks;
pub mod parallel_tempering;
pub mod qubo;
pub mod rng;
pub mod schedule;

pub use annealer::*;
pub use bernoulli::*;
pub use parallel_tempering::*;
pub use qubo::*;
pub use rng::*;
pub use schedule::*;
