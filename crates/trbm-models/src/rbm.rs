//! Restricted Boltzmann Machine with an annealed negative phase.
//!
//! The RBM defines the joint energy over binary visible units `v` and hidden units `h`:
//!
//! E(v, h) = -(v·a + h·b + vᵀ W h)
//!
//! where `a`/`b` are the visible/hidden biases and `W` couples the two layers.
//! Instead of running Gibbs chains for the negative phase, the model is rewritten as a
//! QUBO problem and an ensemble of replicas is resampled by a [`QuboAnnealer`]
//! (parallel tempering by default), warm-started from the previous ensemble.

use crate::ebm::{BatchedEBM, QuboModel};
use burn::module::{Module, Param};
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use ndarray::Array2;
use rand_distr::{Distribution, StandardNormal};
use trbm_core::config::RbmConfig;
use trbm_core::{Result, TrbmError};
use trbm_samplers::annealer::{check_state_matrix, AnnealOptions, InitStrategy, QuboAnnealer};
use trbm_samplers::bernoulli::sample_bernoulli_logits;
use trbm_samplers::parallel_tempering::ParallelTempering;
use trbm_samplers::qubo::QuboMatrix;
use trbm_samplers::rng::RngKey;

/// Trainable RBM parameters.
///
/// A burn [`Module`], so any burn optimizer can step it after a backward pass through
/// [`AnnealedRbm::log_prob`].
#[derive(Module, Debug)]
pub struct RbmParams<B: Backend> {
    /// Coupling weights `[visible_dim, hidden_dim]`.
    pub weight: Param<Tensor<B, 2>>,
    /// Visible biases `[visible_dim, 1]`.
    pub v_bias: Param<Tensor<B, 2>>,
    /// Hidden biases `[hidden_dim, 1]`.
    pub h_bias: Param<Tensor<B, 2>>,
}

impl<B: Backend> RbmParams<B> {
    /// Standard-normal weights drawn from `key`, zero biases.
    pub fn init(visible_dim: usize, hidden_dim: usize, key: RngKey, device: &B::Device) -> Self {
        let mut rng = key.to_rng();
        let weights: Vec<f32> = (0..visible_dim * hidden_dim)
            .map(|_| StandardNormal.sample(&mut rng))
            .collect();

        RbmParams {
            weight: Param::from_tensor(Tensor::from_data(
                TensorData::new(weights, [visible_dim, hidden_dim]),
                device,
            )),
            v_bias: Param::from_tensor(Tensor::zeros([visible_dim, 1], device)),
            h_bias: Param::from_tensor(Tensor::zeros([hidden_dim, 1], device)),
        }
    }

    /// All-zero parameters (every configuration has zero energy).
    pub fn zeros(visible_dim: usize, hidden_dim: usize, device: &B::Device) -> Self {
        RbmParams {
            weight: Param::from_tensor(Tensor::zeros([visible_dim, hidden_dim], device)),
            v_bias: Param::from_tensor(Tensor::zeros([visible_dim, 1], device)),
            h_bias: Param::from_tensor(Tensor::zeros([hidden_dim, 1], device)),
        }
    }

    /// Wrap existing tensors, checking that their shapes agree.
    pub fn from_tensors(
        weight: Tensor<B, 2>,
        v_bias: Tensor<B, 2>,
        h_bias: Tensor<B, 2>,
    ) -> Result<Self> {
        let [visible_dim, hidden_dim] = weight.dims();
        check_bias("v_bias", &v_bias, visible_dim)?;
        check_bias("h_bias", &h_bias, hidden_dim)?;
        Ok(RbmParams {
            weight: Param::from_tensor(weight),
            v_bias: Param::from_tensor(v_bias),
            h_bias: Param::from_tensor(h_bias),
        })
    }

    pub fn visible_dim(&self) -> usize {
        self.weight.val().dims()[0]
    }

    pub fn hidden_dim(&self) -> usize {
        self.weight.val().dims()[1]
    }
}

/// An RBM whose negative phase is resampled by a QUBO annealer.
///
/// Holds the trainable [`RbmParams`] plus an ensemble of `state_size` replicas
/// (`v_state`, `h_state`) approximating the model distribution. Every stochastic
/// method takes an explicit [`RngKey`].
pub struct AnnealedRbm<B: Backend, A: QuboAnnealer = ParallelTempering> {
    params: RbmParams<B>,
    v_state: Tensor<B, 2>,
    h_state: Tensor<B, 2>,
    config: RbmConfig,
    annealer: A,
    device: B::Device,
}

impl<B: Backend> AnnealedRbm<B> {
    /// Build a model that uses the built-in parallel-tempering annealer.
    pub fn from_config(config: RbmConfig, device: &B::Device) -> Result<Self> {
        Self::new(config, ParallelTempering::new(), device)
    }
}

impl<B: Backend, A: QuboAnnealer> AnnealedRbm<B, A> {
    /// Validate `config`, draw weights from `config.seed` and zero the ensemble.
    pub fn new(config: RbmConfig, annealer: A, device: &B::Device) -> Result<Self> {
        config.validate()?;
        let params = RbmParams::init(
            config.visible_dim,
            config.hidden_dim,
            RngKey::new(config.seed),
            device,
        );
        let v_state = Tensor::zeros([config.state_size, config.visible_dim], device);
        let h_state = Tensor::zeros([config.state_size, config.hidden_dim], device);

        log::debug!(
            "initialised annealed RBM: {} visible, {} hidden, {} replicas, {} sweeps",
            config.visible_dim,
            config.hidden_dim,
            config.state_size,
            config.steps
        );

        Ok(AnnealedRbm {
            params,
            v_state,
            h_state,
            config,
            annealer,
            device: device.clone(),
        })
    }

    pub fn config(&self) -> &RbmConfig {
        &self.config
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    pub fn annealer(&self) -> &A {
        &self.annealer
    }

    pub fn params(&self) -> &RbmParams<B> {
        &self.params
    }

    /// Replace the parameters, e.g. with the output of an optimizer step.
    pub fn set_params(&mut self, params: RbmParams<B>) -> Result<()> {
        let expected = [self.config.visible_dim, self.config.hidden_dim];
        let actual = params.weight.val().dims();
        if actual != expected {
            return Err(TrbmError::shape("weight", &expected, &actual));
        }
        check_bias("v_bias", &params.v_bias.val(), self.config.visible_dim)?;
        check_bias("h_bias", &params.h_bias.val(), self.config.hidden_dim)?;
        self.params = params;
        Ok(())
    }

    /// Current visible ensemble `[state_size, visible_dim]`.
    pub fn v_state(&self) -> &Tensor<B, 2> {
        &self.v_state
    }

    /// Current hidden ensemble `[state_size, hidden_dim]`.
    pub fn h_state(&self) -> &Tensor<B, 2> {
        &self.h_state
    }

    /// Overwrite the ensemble with caller-provided binary states.
    pub fn set_states(&mut self, v_state: Tensor<B, 2>, h_state: Tensor<B, 2>) -> Result<()> {
        let s = self.config.state_size;
        let v_expected = [s, self.config.visible_dim];
        if v_state.dims() != v_expected {
            return Err(TrbmError::shape("v_state", &v_expected, &v_state.dims()));
        }
        let h_expected = [s, self.config.hidden_dim];
        if h_state.dims() != h_expected {
            return Err(TrbmError::shape("h_state", &h_expected, &h_state.dims()));
        }
        to_binary("v_state", &tensor_to_vec(v_state.clone())?)?;
        to_binary("h_state", &tensor_to_vec(h_state.clone())?)?;

        self.v_state = v_state;
        self.h_state = h_state;
        Ok(())
    }

    /// Sample `h ~ P(h | v)`: Bernoulli on `v·W + bᵀ`. Returns `[N, hidden_dim]`.
    pub fn visible_to_hidden(&self, v: Tensor<B, 2>, key: RngKey) -> Tensor<B, 2> {
        expect_width("visible input", &v, self.config.visible_dim);
        let logits = v.matmul(self.params.weight.val()) + self.params.h_bias.val().transpose();
        sample_bernoulli_logits(logits, key)
    }

    /// Sample `v ~ P(v | h)`: Bernoulli on `h·Wᵀ + aᵀ`. Returns `[N, visible_dim]`.
    pub fn hidden_to_visible(&self, h: Tensor<B, 2>, key: RngKey) -> Tensor<B, 2> {
        expect_width("hidden input", &h, self.config.hidden_dim);
        let logits = h.matmul(self.params.weight.val().transpose())
            + self.params.v_bias.val().transpose();
        sample_bernoulli_logits(logits, key)
    }

    /// Joint energy `-(v·a + h·b + Σ (vW ⊙ h))` per row, shape `[N, 1]`.
    ///
    /// Deterministic in `v`, `h` and the parameters.
    pub fn pairwise_energy(&self, v: Tensor<B, 2>, h: Tensor<B, 2>) -> Tensor<B, 2> {
        expect_width("visible input", &v, self.config.visible_dim);
        expect_width("hidden input", &h, self.config.hidden_dim);
        let (n_v, n_h) = (v.dims()[0], h.dims()[0]);
        assert_eq!(n_v, n_h, "batch sizes differ ({n_v} vs {n_h})");

        let visible_term = v.clone().matmul(self.params.v_bias.val());
        let hidden_term = h.clone().matmul(self.params.h_bias.val());
        let interaction = (v.matmul(self.params.weight.val()) * h).sum_dim(1);

        (visible_term + hidden_term + interaction).neg()
    }

    /// Single-sample estimate of the energy of `v`: draws `h | v` then evaluates
    /// [`pairwise_energy`](Self::pairwise_energy). Shape `[N, 1]`.
    pub fn energy(&self, v: Tensor<B, 2>, key: RngKey) -> Tensor<B, 2> {
        let h = self.visible_to_hidden(v.clone(), key);
        self.pairwise_energy(v, h)
    }

    /// Batch mean of [`energy`](Self::energy) over the data, shape `[1]`.
    pub fn positive_phase(&self, v: Tensor<B, 2>, key: RngKey) -> Tensor<B, 1> {
        self.energy(v, key).mean()
    }

    /// Mean energy of the current ensemble, shape `[1]`.
    ///
    /// Does not resample; call [`sample_negative_phase`](Self::sample_negative_phase)
    /// first to refresh the ensemble.
    pub fn negative_phase(&self) -> Tensor<B, 1> {
        let (v, h) = (self.v_state.clone(), self.h_state.clone());
        self.pairwise_energy(v, h).mean()
    }

    /// Unnormalised contrastive log-likelihood `-(positive - negative)`, shape `[1]`.
    ///
    /// Not a normalised log-probability; its gradient is the contrastive-divergence
    /// training signal.
    pub fn log_prob(&self, v: Tensor<B, 2>, key: RngKey) -> Tensor<B, 1> {
        let positive = self.positive_phase(v, key);
        let negative = self.negative_phase();
        (positive - negative).neg()
    }

    /// One reconstruction pass `v → h → v'`, shape `[N, visible_dim]`.
    pub fn forward(&self, x: Tensor<B, 2>, key: RngKey) -> Tensor<B, 2> {
        let (key_h, key_v) = key.split_two();
        let h = self.visible_to_hidden(x, key_h);
        self.hidden_to_visible(h, key_v)
    }

    /// Resample the ensemble with the annealer.
    ///
    /// Runs `steps` sweeps on `state_size` replicas against the negated RBM QUBO,
    /// warm-started from the current `(v_state, h_state)`. The annealer output is
    /// validated before anything is written: on error the ensemble is unchanged.
    pub fn sample_negative_phase(&mut self, key: RngKey) -> Result<()> {
        let state_size = self.config.state_size;
        let n_vars = self.config.total_dim();

        let problem = self.to_qubo()?;
        let init = InitStrategy::Explicit(self.ensemble_matrix()?);
        let steps = self.config.steps;
        let options = AnnealOptions::from_config(&self.config.annealer, steps, state_size)
            .with_initialize(init);

        let results = self.annealer.anneal(&problem, &options, key)?;
        let states = results.first_states()?;
        check_state_matrix("annealer states", states, state_size, n_vars)?;

        let (v_state, h_state) = self.split_states(states);
        self.v_state = v_state;
        self.h_state = h_state;

        if let Some(read) = results.reads.first() {
            let mean = read.energies.iter().sum::<f64>() / read.energies.len().max(1) as f64;
            log::debug!(
                "negative phase refreshed: {} replicas, mean energy {:.4}, best {:.4}",
                state_size,
                mean,
                read.best_energy
            );
        }
        Ok(())
    }

    /// Current ensemble as a `[state_size, visible_dim + hidden_dim]` binary matrix.
    pub fn ensemble_matrix(&self) -> Result<Array2<u8>> {
        let joint = Tensor::cat(vec![self.v_state.clone(), self.h_state.clone()], 1);
        let bits = to_binary("sampler state", &tensor_to_vec(joint)?)?;
        Array2::from_shape_vec((self.config.state_size, self.config.total_dim()), bits)
            .map_err(|e| TrbmError::TensorData(e.to_string()))
    }

    fn split_states(&self, states: &Array2<u8>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let (rows, cols) = states.dim();
        let values: Vec<f32> = states.iter().map(|&x| x as f32).collect();
        let joint: Tensor<B, 2> =
            Tensor::from_data(TensorData::new(values, [rows, cols]), &self.device);

        let visible_dim = self.config.visible_dim;
        let v_state = joint.clone().slice([0..rows, 0..visible_dim]);
        let h_state = joint.slice([0..rows, visible_dim..cols]);
        (v_state, h_state)
    }
}

impl<B: Backend, A: QuboAnnealer> QuboModel for AnnealedRbm<B, A> {
    /// Negated block matrix `-[[diag(a), W], [Wᵀ, diag(b)]]`.
    ///
    /// The annealer minimises `E(x)`; with the pair-counted-once convention of
    /// [`QuboMatrix`] the negated matrix reproduces the RBM energy exactly.
    fn to_qubo(&self) -> Result<QuboMatrix> {
        let visible_dim = self.config.visible_dim;
        let hidden_dim = self.config.hidden_dim;
        let n = visible_dim + hidden_dim;

        let weight = tensor_to_vec(self.params.weight.val())?;
        let v_bias = tensor_to_vec(self.params.v_bias.val())?;
        let h_bias = tensor_to_vec(self.params.h_bias.val())?;

        let mut coeffs = Array2::<f32>::zeros((n, n));
        for i in 0..visible_dim {
            coeffs[[i, i]] = v_bias[i];
            for j in 0..hidden_dim {
                let w = weight[i * hidden_dim + j];
                coeffs[[i, visible_dim + j]] = w;
                coeffs[[visible_dim + j, i]] = w;
            }
        }
        for j in 0..hidden_dim {
            coeffs[[visible_dim + j, visible_dim + j]] = h_bias[j];
        }

        Ok(QuboMatrix::new(coeffs)?.negated())
    }
}

impl<B: Backend, A: QuboAnnealer> BatchedEBM<B> for AnnealedRbm<B, A> {
    fn n_vars(&self) -> usize {
        self.config.total_dim()
    }

    fn energy_batched(&self, states: Tensor<B, 2>) -> Tensor<B, 2> {
        let [batch, n] = states.dims();
        assert_eq!(
            n,
            self.n_vars(),
            "State dimension {} does not match model variables {}",
            n,
            self.n_vars()
        );
        let visible_dim = self.config.visible_dim;
        let v = states.clone().slice([0..batch, 0..visible_dim]);
        let h = states.slice([0..batch, visible_dim..n]);
        self.pairwise_energy(v, h)
    }
}

fn check_bias<B: Backend>(what: &'static str, bias: &Tensor<B, 2>, len: usize) -> Result<()> {
    let actual = bias.dims();
    if actual != [len, 1] {
        return Err(TrbmError::shape(what, &[len, 1], &actual));
    }
    Ok(())
}

fn expect_width<B: Backend>(what: &str, tensor: &Tensor<B, 2>, width: usize) {
    let cols = tensor.dims()[1];
    assert_eq!(cols, width, "{what} must have {width} columns, got {cols}");
}

fn tensor_to_vec<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f32>> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| TrbmError::TensorData(format!("{e:?}")))
}

fn to_binary(what: &'static str, values: &[f32]) -> Result<Vec<u8>> {
    values
        .iter()
        .map(|&x| {
            if x == 0.0 {
                Ok(0)
            } else if x == 1.0 {
                Ok(1)
            } else {
                Err(TrbmError::NonBinary { what, value: x })
            }
        })
        .collect()
}
