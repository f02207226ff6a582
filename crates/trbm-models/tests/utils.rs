//! Test utilities for trbm-models

#![allow(dead_code)]

use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};

/// Generate all binary states for num_binary variables.
/// Returns shape [2^num_binary, num_binary], MSB first.
pub fn generate_all_states_binary<B: Backend>(
    num_binary: usize,
    device: &B::Device,
) -> Tensor<B, 2> {
    let n_states = 1usize << num_binary;
    let mut data = Vec::with_capacity(n_states * num_binary);

    for state_idx in 0..n_states {
        for bit_idx in 0..num_binary {
            let bit_pos = num_binary - 1 - bit_idx;
            data.push(((state_idx >> bit_pos) & 1) as f32);
        }
    }

    Tensor::from_data(TensorData::new(data, [n_states, num_binary]), device)
}

/// Build a 2D tensor from literal rows.
pub fn matrix<B: Backend>(rows: &[&[f32]], device: &B::Device) -> Tensor<B, 2> {
    let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);
    let data: Vec<f32> = rows.iter().flat_map(|r| r.iter().copied()).collect();
    Tensor::from_data(TensorData::new(data, [rows.len(), n_cols]), device)
}

pub fn to_vec<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Vec<f32> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .expect("read tensor")
}

pub fn is_binary(values: &[f32]) -> bool {
    values.iter().all(|&x| x == 0.0 || x == 1.0)
}
