//! # trbm-models
//!
//! Restricted Boltzmann Machines whose negative phase is drawn by a QUBO annealer.
//!
//! ## Annealed RBM
//!
//! ```rust,ignore
//! use trbm_core::{CpuBackend, RbmConfig};
//! use trbm_models::AnnealedRbm;
//! use trbm_samplers::RngKey;
//!
//! let device = Default::default();
//! let mut rbm = AnnealedRbm::<CpuBackend>::from_config(RbmConfig::new(4, 3), &device)?;
//!
//! // Refresh the model ensemble, then score a data batch
//! rbm.sample_negative_phase(RngKey::new(0))?;
//! let log_prob = rbm.log_prob(batch, RngKey::new(1));
//! ```
//!
//! ## Energy Traits
//!
//! - [`BatchedEBM`]: energies of joint `[v | h]` states
//! - [`QuboModel`]: the model's QUBO reformulation, sharing the same energy
//!
//! ## Training
//!
//! [`RbmParams`] is a burn `Module`. With an autodiff backend, call `backward()` on
//! the negated [`AnnealedRbm::log_prob`], step any burn optimizer on
//! `rbm.params().clone()` and hand the result back through
//! [`AnnealedRbm::set_params`].

#![recursion_limit = "256"]

pub mod ebm;
pub mod rbm;

pub use ebm::*;
pub use rbm::*;
