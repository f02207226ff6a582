//! Tests for the annealed RBM on the NdArray CPU backend.

mod utils;

use burn::module::Param;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use ndarray::{Array2, ArrayView1};
use std::sync::Mutex;
use trbm_core::backend::CpuBackend;
use trbm_core::config::{AnnealerConfig, RbmConfig, UpdateStrategy};
use trbm_core::TrbmError;
use trbm_models::ebm::{BatchedEBM, QuboModel};
use trbm_models::rbm::{AnnealedRbm, RbmParams};
use trbm_samplers::annealer::{AnnealOptions, AnnealResults, InitStrategy, QuboAnnealer};
use trbm_samplers::mocks::{EmptyAnnealer, FailingAnnealer, FixedAnnealer};
use trbm_samplers::qubo::QuboMatrix;
use trbm_samplers::rng::RngKey;
use utils::{generate_all_states_binary, is_binary, matrix, to_vec};

type TestBackend = CpuBackend;
type TestDevice = <TestBackend as Backend>::Device;

fn small_config() -> RbmConfig {
    RbmConfig::new(4, 3)
        .with_state_size(5)
        .with_steps(1)
        .with_seed(17)
}

fn build_rbm(config: RbmConfig) -> AnnealedRbm<TestBackend> {
    let device = Default::default();
    AnnealedRbm::from_config(config, &device).expect("rbm")
}

fn small_rbm() -> AnnealedRbm<TestBackend> {
    build_rbm(small_config())
}

fn rbm_with<A: QuboAnnealer>(config: RbmConfig, annealer: A) -> AnnealedRbm<TestBackend, A> {
    let device = Default::default();
    AnnealedRbm::new(config, annealer, &device).expect("rbm")
}

/// Parameters assembled field by field, skipping the `from_tensors` checks.
fn raw_params(v_len: usize, h_len: usize, device: &TestDevice) -> RbmParams<TestBackend> {
    RbmParams {
        weight: Param::from_tensor(Tensor::zeros([4, 3], device)),
        v_bias: Param::from_tensor(Tensor::zeros([v_len, 1], device)),
        h_bias: Param::from_tensor(Tensor::zeros([h_len, 1], device)),
    }
}

fn mismatched_field(err: TrbmError) -> &'static str {
    match err {
        TrbmError::ShapeMismatch { what, .. } => what,
        other => panic!("expected a shape mismatch, got {other:?}"),
    }
}

/// Checkerboard-ish binary ensemble used to detect unwanted overwrites.
fn pattern_states(device: &TestDevice) -> (Tensor<TestBackend, 2>, Tensor<TestBackend, 2>) {
    let v = matrix::<TestBackend>(
        &[
            &[1.0, 0.0, 1.0, 0.0],
            &[0.0, 1.0, 0.0, 1.0],
            &[1.0, 1.0, 0.0, 0.0],
            &[0.0, 0.0, 1.0, 1.0],
            &[1.0, 1.0, 1.0, 1.0],
        ],
        device,
    );
    let h = matrix::<TestBackend>(
        &[
            &[1.0, 0.0, 0.0],
            &[0.0, 1.0, 0.0],
            &[0.0, 0.0, 1.0],
            &[1.0, 1.0, 0.0],
            &[0.0, 1.0, 1.0],
        ],
        device,
    );
    (v, h)
}

#[test]
fn test_construction_shapes() {
    let rbm = small_rbm();
    let params = rbm.params();

    assert_eq!(params.weight.val().dims(), [4, 3]);
    assert_eq!(params.v_bias.val().dims(), [4, 1]);
    assert_eq!(params.h_bias.val().dims(), [3, 1]);
    assert_eq!(rbm.v_state().dims(), [5, 4]);
    assert_eq!(rbm.h_state().dims(), [5, 3]);

    assert!(to_vec(params.weight.val()).iter().all(|w| w.is_finite()));
    assert!(to_vec(params.v_bias.val()).iter().all(|&b| b == 0.0));
    assert!(to_vec(rbm.v_state().clone()).iter().all(|&x| x == 0.0));
    assert!(to_vec(rbm.h_state().clone()).iter().all(|&x| x == 0.0));
}

#[test]
fn test_seed_controls_weights() {
    let a = small_rbm();
    let b = small_rbm();
    let c = build_rbm(small_config().with_seed(18));

    let wa = to_vec(a.params().weight.val());
    assert_eq!(wa, to_vec(b.params().weight.val()));
    assert_ne!(wa, to_vec(c.params().weight.val()));
}

#[test]
fn test_invalid_config_rejected() {
    let device = Default::default();
    let inverted = AnnealerConfig::default().with_temperatures(2.0, 1.0);
    for config in [
        RbmConfig::new(0, 3),
        RbmConfig::new(4, 0),
        RbmConfig::new(4, 3).with_state_size(0),
        RbmConfig::new(4, 3).with_annealer(inverted),
    ] {
        let result = AnnealedRbm::<TestBackend>::from_config(config, &device);
        assert!(matches!(result, Err(TrbmError::InvalidConfig(_))));
    }
}

#[test]
fn test_small_scenario() {
    let device = Default::default();
    let rbm = small_rbm();
    let v = matrix::<TestBackend>(&[&[1.0, 0.0, 1.0, 0.0]], &device);

    let h = rbm.visible_to_hidden(v.clone(), RngKey::new(0));
    assert_eq!(h.dims(), [1, 3]);
    assert!(is_binary(&to_vec(h)));

    let energy = rbm.energy(v, RngKey::new(1));
    assert_eq!(energy.dims(), [1, 1]);
    assert!(to_vec(energy)[0].is_finite());
}

#[test]
fn test_conditionals_are_binary_with_expected_shapes() {
    let device = Default::default();
    let rbm = small_rbm();
    let v = generate_all_states_binary::<TestBackend>(4, &device);

    let h = rbm.visible_to_hidden(v.clone(), RngKey::new(3));
    assert_eq!(h.dims(), [16, 3]);
    assert!(is_binary(&to_vec(h.clone())));

    let v_back = rbm.hidden_to_visible(h, RngKey::new(4));
    assert_eq!(v_back.dims(), [16, 4]);
    assert!(is_binary(&to_vec(v_back)));

    let recon = rbm.forward(v, RngKey::new(5));
    assert_eq!(recon.dims(), [16, 4]);
    assert!(is_binary(&to_vec(recon)));
}

#[test]
fn test_sampling_is_keyed() {
    let device = Default::default();
    let rbm = small_rbm();
    let v = generate_all_states_binary::<TestBackend>(4, &device);

    let a = to_vec(rbm.forward(v.clone(), RngKey::new(8)));
    let b = to_vec(rbm.forward(v, RngKey::new(8)));
    assert_eq!(a, b);
}

#[test]
fn test_pairwise_energy_deterministic() {
    let device = Default::default();
    let rbm = small_rbm();
    let (v, h) = pattern_states(&device);

    let e1 = rbm.pairwise_energy(v.clone(), h.clone());
    let e2 = rbm.pairwise_energy(v, h);
    assert_eq!(e1.dims(), [5, 1]);
    assert_eq!(to_vec(e1), to_vec(e2));
}

#[test]
fn test_pairwise_energy_hand_computed() {
    let device = Default::default();
    let weight = matrix::<TestBackend>(&[&[1.0, -2.0], &[0.5, 3.0]], &device);
    let v_bias = matrix::<TestBackend>(&[&[0.25], &[-1.0]], &device);
    let h_bias = matrix::<TestBackend>(&[&[2.0], &[0.5]], &device);

    let mut rbm = build_rbm(RbmConfig::new(2, 2).with_state_size(1));
    let params = RbmParams::from_tensors(weight, v_bias, h_bias).unwrap();
    rbm.set_params(params).unwrap();

    // v = [1, 1], h = [0, 1]:
    // v·a = -0.75, h·b = 0.5, vᵀWh = -2.0 + 3.0 = 1.0  =>  E = -(0.75)
    let v = matrix::<TestBackend>(&[&[1.0, 1.0]], &device);
    let h = matrix::<TestBackend>(&[&[0.0, 1.0]], &device);
    let energy = to_vec(rbm.pairwise_energy(v, h))[0];
    assert!((energy + 0.75).abs() < 1e-6, "energy = {energy}");
}

#[test]
fn test_zero_parameters_give_zero_energy() {
    let device = Default::default();
    let mut rbm = small_rbm();
    rbm.set_params(RbmParams::zeros(4, 3, &device)).unwrap();

    let v = generate_all_states_binary::<TestBackend>(4, &device);
    let h8 = generate_all_states_binary::<TestBackend>(3, &device);
    let h = Tensor::cat(vec![h8.clone(), h8], 0);

    let energies = to_vec(rbm.pairwise_energy(v, h));
    assert_eq!(energies.len(), 16);
    assert!(energies.iter().all(|&e| e == 0.0));
}

#[test]
fn test_qubo_matches_rbm_energy() {
    let device = Default::default();
    let mut rbm = small_rbm();
    let v_bias = matrix::<TestBackend>(&[&[0.3], &[-0.7], &[1.1], &[0.0]], &device);
    let h_bias = matrix::<TestBackend>(&[&[-0.4], &[0.9], &[0.2]], &device);
    let weight = rbm.params().weight.val();
    let params = RbmParams::from_tensors(weight, v_bias, h_bias).unwrap();
    rbm.set_params(params).unwrap();

    let problem: QuboMatrix = rbm.to_qubo().unwrap();
    assert_eq!(problem.dim(), 7);

    let joint = generate_all_states_binary::<TestBackend>(7, &device);
    let rbm_energies = to_vec(rbm.energy_batched(joint.clone()));
    let rows = to_vec(joint);

    for (k, row) in rows.chunks(7).enumerate() {
        let bits: Vec<u8> = row.iter().map(|&x| x as u8).collect();
        let qubo_energy = problem.energy(ArrayView1::from(&bits[..]));
        assert!(
            (qubo_energy - rbm_energies[k] as f64).abs() < 1e-4,
            "state {bits:?}: qubo {qubo_energy} vs rbm {}",
            rbm_energies[k]
        );
    }
}

#[test]
fn test_negative_phase_refresh_keeps_shapes() {
    let mut rbm = small_rbm();

    rbm.sample_negative_phase(RngKey::new(100)).unwrap();
    let first_v = to_vec(rbm.v_state().clone());
    assert_eq!(rbm.v_state().dims(), [5, 4]);
    assert_eq!(rbm.h_state().dims(), [5, 3]);
    assert!(is_binary(&first_v));
    assert!(is_binary(&to_vec(rbm.h_state().clone())));

    rbm.sample_negative_phase(RngKey::new(101)).unwrap();
    assert_eq!(rbm.v_state().dims(), [5, 4]);
    assert_eq!(rbm.h_state().dims(), [5, 3]);
    assert!(is_binary(&to_vec(rbm.v_state().clone())));
    assert!(is_binary(&to_vec(rbm.h_state().clone())));
}

#[test]
fn test_negative_phase_moves_off_zero_warm_start() {
    // zero biases: the first flip from the all-zero state costs nothing
    let mut rbm = build_rbm(small_config().with_steps(20));
    let zeros = Array2::<u8>::zeros((5, 7));
    assert_eq!(rbm.ensemble_matrix().unwrap(), zeros);

    rbm.sample_negative_phase(RngKey::new(100)).unwrap();
    let refreshed = rbm.ensemble_matrix().unwrap();
    assert_eq!(refreshed.dim(), (5, 7));
    assert_ne!(refreshed, zeros);
}

#[test]
fn test_negative_phase_without_parallel_replicas() {
    let annealer = AnnealerConfig::default()
        .with_parallel(false)
        .with_update_strategy(UpdateStrategy::Random);
    let mut rbm = build_rbm(small_config().with_annealer(annealer));
    rbm.sample_negative_phase(RngKey::new(4)).unwrap();
    assert!(is_binary(&to_vec(rbm.v_state().clone())));
}

#[test]
fn test_log_prob_is_finite() {
    let device = Default::default();
    let mut rbm = small_rbm();
    let data = generate_all_states_binary::<TestBackend>(4, &device);

    // zero ensemble: negative phase is exactly zero
    assert_eq!(to_vec(rbm.negative_phase()), vec![0.0]);

    rbm.sample_negative_phase(RngKey::new(0)).unwrap();
    let log_prob = rbm.log_prob(data.clone(), RngKey::new(1));
    assert_eq!(log_prob.dims(), [1]);
    assert!(to_vec(log_prob)[0].is_finite());

    let positive = to_vec(rbm.positive_phase(data.clone(), RngKey::new(1)))[0];
    let negative = to_vec(rbm.negative_phase())[0];
    let expected = -(positive - negative);
    let log_prob = to_vec(rbm.log_prob(data, RngKey::new(1)))[0];
    assert!((log_prob - expected).abs() < 1e-5);
}

#[test]
fn test_fixed_annealer_states_are_split_and_committed() {
    let mut joint = Array2::<u8>::zeros((5, 7));
    for r in 0..5 {
        for c in 0..7 {
            joint[[r, c]] = ((r + c) % 2) as u8;
        }
    }
    let mut rbm = rbm_with(small_config(), FixedAnnealer::new(joint.clone()));

    rbm.sample_negative_phase(RngKey::new(0)).unwrap();

    assert_eq!(rbm.annealer().calls(), 1);
    assert_eq!(rbm.ensemble_matrix().unwrap(), joint);
    let v = to_vec(rbm.v_state().clone());
    assert_eq!(&v[..4], &[0.0, 1.0, 0.0, 1.0]);
    let h = to_vec(rbm.h_state().clone());
    assert_eq!(&h[..3], &[0.0, 1.0, 0.0]);
}

#[test]
fn test_failed_refresh_leaves_ensemble_untouched() {
    let device = Default::default();
    let (v, h) = pattern_states(&device);
    let key = RngKey::new(0);

    let mut failing = rbm_with(small_config(), FailingAnnealer::new("solver crashed"));
    failing.set_states(v.clone(), h.clone()).unwrap();
    let before = failing.ensemble_matrix().unwrap();
    let err = failing.sample_negative_phase(key).unwrap_err();
    assert!(matches!(err, TrbmError::Annealer(_)));
    assert_eq!(failing.ensemble_matrix().unwrap(), before);

    let misshapen_states = Array2::ones((5, 6));
    let mut misshapen = rbm_with(small_config(), FixedAnnealer::new(misshapen_states));
    misshapen.set_states(v.clone(), h.clone()).unwrap();
    let err = misshapen.sample_negative_phase(key).unwrap_err();
    assert!(matches!(err, TrbmError::ShapeMismatch { .. }));
    assert_eq!(misshapen.ensemble_matrix().unwrap(), before);

    let mut non_binary_states = Array2::<u8>::zeros((5, 7));
    non_binary_states[[2, 3]] = 7;
    let mut non_binary = rbm_with(small_config(), FixedAnnealer::new(non_binary_states));
    non_binary.set_states(v.clone(), h.clone()).unwrap();
    let err = non_binary.sample_negative_phase(key).unwrap_err();
    assert!(matches!(err, TrbmError::NonBinary { .. }));
    assert_eq!(non_binary.ensemble_matrix().unwrap(), before);

    let mut empty = rbm_with(small_config(), EmptyAnnealer);
    empty.set_states(v, h).unwrap();
    let err = empty.sample_negative_phase(key).unwrap_err();
    assert!(matches!(err, TrbmError::EmptyResults));
    assert_eq!(empty.ensemble_matrix().unwrap(), before);
}

/// Records what the model hands to the annealer, then echoes the warm start back.
struct RecordingAnnealer {
    seen: Mutex<Option<(QuboMatrix, AnnealOptions)>>,
}

impl QuboAnnealer for RecordingAnnealer {
    fn anneal(
        &self,
        problem: &QuboMatrix,
        options: &AnnealOptions,
        _key: RngKey,
    ) -> trbm_core::Result<AnnealResults> {
        *self.seen.lock().unwrap() = Some((problem.clone(), options.clone()));
        let states = match &options.initialize {
            InitStrategy::Explicit(states) => states.clone(),
            _ => panic!("expected a warm start"),
        };
        let echo = FixedAnnealer::new(states);
        echo.anneal(problem, options, RngKey::new(0))
    }
}

#[test]
fn test_annealer_receives_warm_start_and_config() {
    let device = Default::default();
    let annealer = AnnealerConfig::default()
        .with_temperatures(0.5, 4.0)
        .with_parallel(false);
    let config = small_config().with_steps(7).with_annealer(annealer);
    let recorder = RecordingAnnealer {
        seen: Mutex::new(None),
    };
    let mut rbm = rbm_with(config, recorder);
    let (v, h) = pattern_states(&device);
    rbm.set_states(v, h).unwrap();
    let ensemble = rbm.ensemble_matrix().unwrap();

    rbm.sample_negative_phase(RngKey::new(0)).unwrap();

    let seen = rbm.annealer().seen.lock().unwrap().clone();
    let (problem, options) = seen.expect("annealer called");
    assert_eq!(problem, rbm.to_qubo().unwrap());
    assert_eq!(options.num_sweeps, 7);
    assert_eq!(options.num_reads, 1);
    assert_eq!(options.num_replicas, 5);
    assert_eq!(options.update_strategy, UpdateStrategy::Sequential);
    assert_eq!((options.min_temp, options.max_temp), (0.5, 4.0));
    assert!(!options.parallel);
    let warm_start = InitStrategy::Explicit(ensemble.clone());
    assert_eq!(options.initialize, warm_start);

    // echoed back unchanged
    assert_eq!(rbm.ensemble_matrix().unwrap(), ensemble);
}

#[test]
fn test_set_states_and_params_validate() {
    let device = Default::default();
    let mut rbm = small_rbm();

    let too_narrow = Tensor::<TestBackend, 2>::zeros([5, 3], &device);
    let h = Tensor::<TestBackend, 2>::zeros([5, 3], &device);
    let err = rbm.set_states(too_narrow, h.clone()).unwrap_err();
    assert!(matches!(err, TrbmError::ShapeMismatch { .. }));

    let fractional = Tensor::<TestBackend, 2>::full([5, 4], 0.5, &device);
    let err = rbm.set_states(fractional, h).unwrap_err();
    assert!(matches!(err, TrbmError::NonBinary { .. }));

    assert!(rbm.set_params(RbmParams::zeros(3, 3, &device)).is_err());

    let bad_bias = RbmParams::<TestBackend>::from_tensors(
        Tensor::zeros([4, 3], &device),
        Tensor::zeros([3, 1], &device),
        Tensor::zeros([3, 1], &device),
    );
    assert!(bad_bias.is_err());
}

#[test]
fn test_set_params_checks_bias_shapes() {
    let device = Default::default();
    let mut rbm = small_rbm();
    let weight_before = to_vec(rbm.params().weight.val());

    let err = rbm.set_params(raw_params(3, 3, &device)).unwrap_err();
    assert_eq!(mismatched_field(err), "v_bias");
    let err = rbm.set_params(raw_params(4, 4, &device)).unwrap_err();
    assert_eq!(mismatched_field(err), "h_bias");
    assert_eq!(to_vec(rbm.params().weight.val()), weight_before);

    rbm.set_params(raw_params(4, 3, &device)).unwrap();
    let weights = to_vec(rbm.params().weight.val());
    assert!(weights.iter().all(|&w| w == 0.0));
}

#[test]
#[should_panic(expected = "visible input must have 4 columns")]
fn test_wrong_width_panics() {
    let device = Default::default();
    let rbm = small_rbm();
    let v = Tensor::<TestBackend, 2>::zeros([2, 5], &device);
    let _ = rbm.visible_to_hidden(v, RngKey::new(0));
}
