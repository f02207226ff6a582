//! Bernoulli sampling from logits.

use crate::rng::RngKey;
use burn::tensor::activation::sigmoid;
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use rand::Rng;

/// Uniform `[0, 1)` samples drawn from the key's ChaCha8 stream.
///
/// Drawn on the host so the same key gives the same tensor on every backend.
pub fn uniform_tensor<B: Backend>(
    shape: [usize; 2],
    key: RngKey,
    device: &B::Device,
) -> Tensor<B, 2> {
    let mut rng = key.to_rng();
    let n = shape[0] * shape[1];
    let values: Vec<f32> = (0..n).map(|_| rng.gen::<f32>()).collect();
    Tensor::from_data(TensorData::new(values, shape), device)
}

/// Draw one independent Bernoulli sample per logit: `P(x = 1) = sigmoid(logit)`.
///
/// The result is a `{0, 1}` float tensor with the same shape as `logits`. Sampling is
/// not differentiable, so the logits are detached first.
pub fn sample_bernoulli_logits<B: Backend>(logits: Tensor<B, 2>, key: RngKey) -> Tensor<B, 2> {
    let device = logits.device();
    let probs = sigmoid(logits.detach());
    let uniform = uniform_tensor::<B>(probs.dims(), key, &device);

    // u < p is 1 with probability p; p = 0 never fires
    uniform.lower(probs).float()
}
