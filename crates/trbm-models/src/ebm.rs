//! Energy-Based Model (EBM) abstractions.
//!
//! EBMs define energy functions that map states to scalar values.
//! The Boltzmann distribution P(x) ∝ exp(-E(x)) is defined by the energy function.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use trbm_core::Result;
use trbm_samplers::qubo::QuboMatrix;

/// Batched energy over joint binary states.
pub trait BatchedEBM<B: Backend> {
    /// Number of binary variables in one joint state.
    fn n_vars(&self) -> usize;

    /// Compute energy for a batch of joint states.
    ///
    /// # Arguments
    /// * `states` - Batched states `[batch_size, n_vars]`
    ///
    /// # Returns
    /// Energy for each state `[batch_size, 1]`
    fn energy_batched(&self, states: Tensor<B, 2>) -> Tensor<B, 2>;
}

/// Models whose energy can be written as a QUBO over their joint binary state.
///
/// The returned matrix uses the [`QuboMatrix`] energy convention, so
/// `problem.energy(x)` equals [`BatchedEBM::energy_batched`] on the same `x`.
pub trait QuboModel {
    fn to_qubo(&self) -> Result<QuboMatrix>;
}
