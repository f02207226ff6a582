//! # trbm-examples utilities
//!
//! Shared helpers for the demos: the bars-and-stripes toy dataset, conversions
//! between `ndarray` state matrices and burn tensors, small random QUBO problems and
//! a brute-force reference solver.

use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use ndarray::{Array2, ArrayView1};
use rand::Rng;
use trbm_core::{Result, TrbmError};
use trbm_samplers::qubo::QuboMatrix;
use trbm_samplers::rng::RngKey;

/// Every bars-and-stripes pattern on a `side × side` grid, flattened row-major.
///
/// Bars switch on whole columns, stripes whole rows. The empty and full grids are
/// both a bar and a stripe pattern and appear once, giving `2^(side + 1) - 2` rows.
pub fn bars_and_stripes(side: usize) -> Array2<u8> {
    let n_pixels = side * side;
    let mut rows: Vec<Vec<u8>> = Vec::new();

    for mask in 0..(1usize << side) {
        // stripes: row r on when bit r is set
        let stripes: Vec<u8> = (0..n_pixels)
            .map(|p| ((mask >> (p / side)) & 1) as u8)
            .collect();
        rows.push(stripes);

        let is_empty_or_full = mask == 0 || mask == (1 << side) - 1;
        if !is_empty_or_full {
            let bars: Vec<u8> = (0..n_pixels)
                .map(|p| ((mask >> (p % side)) & 1) as u8)
                .collect();
            rows.push(bars);
        }
    }

    let n_rows = rows.len();
    Array2::from_shape_vec((n_rows, n_pixels), rows.concat())
        .unwrap_or_else(|_| Array2::zeros((0, n_pixels)))
}

/// Draw `batch_size` rows of `data` with replacement.
pub fn sample_batch(data: &Array2<u8>, batch_size: usize, key: RngKey) -> Array2<u8> {
    let mut rng = key.to_rng();
    let n_rows = data.nrows();
    let mut batch = Array2::zeros((batch_size, data.ncols()));
    if n_rows == 0 {
        return batch;
    }
    for mut row in batch.outer_iter_mut() {
        row.assign(&data.row(rng.gen_range(0..n_rows)));
    }
    batch
}

/// Binary state matrix as a `{0, 1}` float tensor.
pub fn to_tensor<B: Backend>(states: &Array2<u8>, device: &B::Device) -> Tensor<B, 2> {
    let (rows, cols) = states.dim();
    let values: Vec<f32> = states.iter().map(|&x| x as f32).collect();
    Tensor::from_data(TensorData::new(values, [rows, cols]), device)
}

/// Threshold a tensor at 0.5 back into a binary state matrix.
pub fn to_states<B: Backend>(tensor: Tensor<B, 2>) -> Result<Array2<u8>> {
    let [rows, cols] = tensor.dims();
    let values = tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| TrbmError::TensorData(format!("{e:?}")))?;
    let bits: Vec<u8> = values.iter().map(|&x| u8::from(x > 0.5)).collect();
    Array2::from_shape_vec((rows, cols), bits)
        .map_err(|e| TrbmError::TensorData(e.to_string()))
}

/// Render one flattened grid as text, one line per grid row.
pub fn render_grid(pixels: ArrayView1<'_, u8>, side: usize) -> String {
    let mut out = String::with_capacity(pixels.len() * 2);
    for (i, &p) in pixels.iter().enumerate() {
        out.push(if p == 1 { '█' } else { '·' });
        if (i + 1) % side == 0 && i + 1 < pixels.len() {
            out.push('\n');
        }
    }
    out
}

/// Symmetric random QUBO with couplings in `[-1, 1]`.
///
/// Each off-diagonal pair is present with probability `density`; the diagonal is
/// always filled.
pub fn random_qubo(n: usize, density: f64, key: RngKey) -> Result<QuboMatrix> {
    if !(0.0..=1.0).contains(&density) {
        return Err(TrbmError::InvalidProblem(format!(
            "density must be in [0, 1], got {density}"
        )));
    }
    let mut rng = key.to_rng();
    let mut coeffs = Array2::<f32>::zeros((n, n));
    for i in 0..n {
        coeffs[[i, i]] = rng.gen_range(-1.0..=1.0);
        for j in (i + 1)..n {
            if rng.gen_bool(density) {
                let q = rng.gen_range(-1.0..=1.0);
                coeffs[[i, j]] = q;
                coeffs[[j, i]] = q;
            }
        }
    }
    QuboMatrix::new(coeffs)
}

/// Exhaustive minimum of a small QUBO. Ties keep the lowest-index state.
pub fn brute_force_ground_state(problem: &QuboMatrix) -> Result<(Vec<u8>, f64)> {
    let n = problem.dim();
    if n > 24 {
        return Err(TrbmError::InvalidProblem(format!(
            "brute force limited to 24 variables, got {n}"
        )));
    }

    let mut best = (vec![0u8; n], f64::INFINITY);
    let mut state = vec![0u8; n];
    for mask in 0..(1usize << n) {
        for (i, bit) in state.iter_mut().enumerate() {
            *bit = ((mask >> i) & 1) as u8;
        }
        let energy = problem.energy(ArrayView1::from(&state[..]));
        if energy < best.1 {
            best = (state.clone(), energy);
        }
    }
    Ok(best)
}
