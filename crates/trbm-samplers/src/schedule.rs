//! Temperature ladders for parallel tempering.

use serde::{Deserialize, Serialize};

/// Temperatures of the parallel-tempering replicas, coldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureLadder {
    temps: Vec<f64>,
}

impl TemperatureLadder {
    /// Geometrically spaced temperatures from `min_temp` to `max_temp`.
    ///
    /// A single replica sits at `min_temp`.
    pub fn geometric(min_temp: f64, max_temp: f64, n_replicas: usize) -> Self {
        let temps = match n_replicas {
            0 => Vec::new(),
            1 => vec![min_temp],
            n => {
                let ratio = (max_temp / min_temp).powf(1.0 / (n - 1) as f64);
                (0..n)
                    .map(|k| {
                        if k == n - 1 {
                            max_temp
                        } else {
                            min_temp * ratio.powi(k as i32)
                        }
                    })
                    .collect()
            }
        };
        TemperatureLadder { temps }
    }

    pub fn temps(&self) -> &[f64] {
        &self.temps
    }

    /// Inverse temperatures, same order as [`temps`](Self::temps).
    pub fn betas(&self) -> Vec<f64> {
        self.temps.iter().map(|t| 1.0 / t).collect()
    }

    pub fn len(&self) -> usize {
        self.temps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temps.is_empty()
    }
}
