//! Backend aliases and device selection.
//!
//! The models are generic over any burn `Backend`; binaries pick a concrete one from
//! [`DeviceKind`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Plain CPU backend used for tests and the default binaries.
pub type CpuBackend = burn::backend::NdArray<f32>;

/// CPU backend with gradient tracking, for optimizer-driven parameter updates.
pub type CpuAutodiffBackend = burn::backend::Autodiff<CpuBackend>;

#[cfg(feature = "gpu")]
pub type WgpuBackend = burn::backend::Wgpu;

#[cfg(feature = "gpu")]
pub type WgpuAutodiffBackend = burn::backend::Autodiff<WgpuBackend>;

#[cfg(feature = "gpu")]
pub fn init_gpu_device() -> burn::backend::wgpu::WgpuDevice {
    // Default picks the best adapter wgpu can find (Metal, Vulkan, DX12)
    burn::backend::wgpu::WgpuDevice::default()
}

/// Which device family a binary should run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Accelerator when compiled with `gpu`, otherwise CPU.
    #[default]
    Auto,
    Cpu,
    Gpu,
}

impl DeviceKind {
    /// Resolve `Auto` against the features this build was compiled with.
    ///
    /// Asking for `Gpu` without the `gpu` feature falls back to CPU with a warning.
    pub fn resolve(self) -> DeviceKind {
        match self {
            DeviceKind::Auto if gpu_available() => DeviceKind::Gpu,
            DeviceKind::Auto => DeviceKind::Cpu,
            DeviceKind::Gpu if !gpu_available() => {
                log::warn!("GPU requested without the `gpu` feature; using CPU");
                DeviceKind::Cpu
            }
            other => other,
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceKind::Auto => "auto",
            DeviceKind::Cpu => "cpu",
            DeviceKind::Gpu => "gpu",
        };
        f.write_str(name)
    }
}

impl FromStr for DeviceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(DeviceKind::Auto),
            "cpu" => Ok(DeviceKind::Cpu),
            "gpu" | "cuda" | "wgpu" | "metal" => Ok(DeviceKind::Gpu),
            other => Err(format!("unknown device '{other}' (auto|cpu|gpu)")),
        }
    }
}

/// Whether this build carries an accelerator backend.
pub fn gpu_available() -> bool {
    cfg!(feature = "gpu")
}
