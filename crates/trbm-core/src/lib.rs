//! # trbm-core
//!
//! Core types shared by the tempered-RBM crates.
//!
//! - [`backend`]: burn backend aliases and device selection
//! - [`config`]: [`RbmConfig`] / [`AnnealerConfig`], loaded from TOML, environment or CLI
//! - [`error`]: [`TrbmError`] and the crate-wide [`Result`] alias
//!
//! ## Configuration
//!
//! ```rust
//! use trbm_core::config::RbmConfig;
//!
//! let config = RbmConfig::new(784, 64).with_state_size(32).with_steps(4);
//! assert!(config.validate().is_ok());
//! ```
//!
//! ## Backends
//!
//! Models are generic over any burn [`Backend`](burn::tensor::backend::Backend).
//! The CPU aliases are always available:
//!
//! ```rust,ignore
//! use trbm_core::backend::{CpuAutodiffBackend, CpuBackend};
//! ```
//!
//! The `gpu` feature adds `WgpuBackend` and `backend::init_gpu_device`.

#![recursion_limit = "256"]

pub mod backend;
pub mod config;
pub mod error;

pub use backend::*;
pub use config::*;
pub use error::*;
