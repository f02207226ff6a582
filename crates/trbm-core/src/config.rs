//! Model and annealer configuration.
//!
//! [`RbmConfig`] carries the structural dimensions of the RBM, the size of the
//! negative-phase ensemble and the [`AnnealerConfig`] handed to the QUBO annealer.
//!
//! Configuration can come from:
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`TRBM_CONFIG_FILE`, `TRBM_SEED`)
//! 3. Config file (explicit path, or `~/.config/trbm/config.toml`)
//! 4. Defaults
//!
//! Unknown keys in a config file are rejected rather than ignored.
//!
//! # Example TOML
//!
//! ```toml
//! visible_dim = 16
//! hidden_dim = 8
//! state_size = 64
//! steps = 4
//!
//! [annealer]
//! min_temp = 1.0
//! max_temp = 3.5
//! parallel = true
//! update_strategy = "sequential"
//! ```

use crate::backend::DeviceKind;
use crate::error::{Result, TrbmError};
use clap::{Args, ValueEnum};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Order in which the annealer visits variables within one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStrategy {
    /// Visit every variable once, in index order.
    #[default]
    Sequential,
    /// Visit `n` uniformly drawn variables (with replacement).
    Random,
}

/// Settings forwarded to the QUBO annealer on every negative-phase refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AnnealerConfig {
    /// Lowest temperature of the parallel-tempering ladder.
    pub min_temp: f64,
    /// Highest temperature of the parallel-tempering ladder.
    pub max_temp: f64,
    /// Advance replicas concurrently.
    pub parallel: bool,
    pub update_strategy: UpdateStrategy,
    /// Log per-sweep progress at `info` level.
    pub verbose: bool,
}

impl Default for AnnealerConfig {
    fn default() -> Self {
        AnnealerConfig {
            min_temp: 1.0,
            max_temp: 3.5,
            parallel: true,
            update_strategy: UpdateStrategy::Sequential,
            verbose: false,
        }
    }
}

impl AnnealerConfig {
    pub fn with_temperatures(mut self, min_temp: f64, max_temp: f64) -> Self {
        self.min_temp = min_temp;
        self.max_temp = max_temp;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_update_strategy(mut self, update_strategy: UpdateStrategy) -> Self {
        self.update_strategy = update_strategy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.min_temp.is_finite() || !self.max_temp.is_finite() {
            return Err(TrbmError::InvalidConfig(format!(
                "temperatures must be finite (min_temp={}, max_temp={})",
                self.min_temp, self.max_temp
            )));
        }
        if self.min_temp <= 0.0 {
            return Err(TrbmError::InvalidConfig(format!(
                "min_temp must be positive, got {}",
                self.min_temp
            )));
        }
        if self.max_temp < self.min_temp {
            return Err(TrbmError::InvalidConfig(format!(
                "max_temp ({}) must not be below min_temp ({})",
                self.max_temp, self.min_temp
            )));
        }
        Ok(())
    }
}

fn default_state_size() -> usize {
    100
}
fn default_steps() -> usize {
    1
}

/// Full configuration of an annealed RBM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RbmConfig {
    pub visible_dim: usize,
    pub hidden_dim: usize,
    /// Number of replicas in the negative-phase ensemble.
    #[serde(default = "default_state_size")]
    pub state_size: usize,
    /// Annealer sweeps per negative-phase refresh.
    #[serde(default = "default_steps")]
    pub steps: usize,
    #[serde(default)]
    pub device: DeviceKind,
    /// Seed for weight initialisation and the default key stream.
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub annealer: AnnealerConfig,
}

impl RbmConfig {
    pub fn new(visible_dim: usize, hidden_dim: usize) -> Self {
        RbmConfig {
            visible_dim,
            hidden_dim,
            state_size: default_state_size(),
            steps: default_steps(),
            device: DeviceKind::default(),
            seed: 0,
            annealer: AnnealerConfig::default(),
        }
    }

    pub fn with_state_size(mut self, state_size: usize) -> Self {
        self.state_size = state_size;
        self
    }

    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_device(mut self, device: DeviceKind) -> Self {
        self.device = device;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_annealer(mut self, annealer: AnnealerConfig) -> Self {
        self.annealer = annealer;
        self
    }

    /// Total number of QUBO variables (visible + hidden).
    pub fn total_dim(&self) -> usize {
        self.visible_dim + self.hidden_dim
    }

    /// Reject configurations that would only fail later inside tensor arithmetic.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("visible_dim", self.visible_dim),
            ("hidden_dim", self.hidden_dim),
            ("state_size", self.state_size),
            ("steps", self.steps),
        ] {
            if value == 0 {
                let message = format!("{name} must be positive");
                return Err(TrbmError::InvalidConfig(message));
            }
        }
        self.annealer.validate()
    }

    /// Parse a TOML document. Unknown keys are an error.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: RbmConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        config.validate()?;
        log::debug!("loaded RBM config from {}", path.display());
        Ok(config)
    }

    /// Build a configuration from CLI arguments, falling back to the config file.
    ///
    /// An explicitly named config file must exist; the default location is optional.
    /// Without a config file, `visible_dim` and `hidden_dim` must be given on the CLI.
    pub fn from_args(args: &ConfigArgs) -> Result<Self> {
        Self::resolve(args, None, Self::default_config_path())
    }

    /// Like [`from_args`](Self::from_args), but with fallback dimensions.
    ///
    /// `visible_dim` and `hidden_dim` are only used when neither the CLI nor a
    /// config file supplies the dimensions.
    pub fn from_args_or_dims(
        args: &ConfigArgs,
        visible_dim: usize,
        hidden_dim: usize,
    ) -> Result<Self> {
        let fallback_dims = Some((visible_dim, hidden_dim));
        Self::resolve(args, fallback_dims, Self::default_config_path())
    }

    fn resolve(
        args: &ConfigArgs,
        fallback_dims: Option<(usize, usize)>,
        default_path: Option<PathBuf>,
    ) -> Result<Self> {
        let file_config = match &args.config_file {
            Some(path) => Some(Self::load(path)?),
            None => match default_path {
                Some(path) if path.exists() => Some(Self::load(&path)?),
                _ => None,
            },
        };

        let mut config = match file_config {
            Some(config) => config,
            None => {
                let visible_dim = args.visible_dim.or(fallback_dims.map(|(v, _)| v));
                let hidden_dim = args.hidden_dim.or(fallback_dims.map(|(_, h)| h));
                match (visible_dim, hidden_dim) {
                    (Some(v), Some(h)) => RbmConfig::new(v, h),
                    (None, _) => return Err(missing("visible_dim")),
                    (_, None) => return Err(missing("hidden_dim")),
                }
            }
        };

        if let Some(v) = args.visible_dim {
            config.visible_dim = v;
        }
        if let Some(h) = args.hidden_dim {
            config.hidden_dim = h;
        }
        if let Some(s) = args.state_size {
            config.state_size = s;
        }
        if let Some(steps) = args.steps {
            config.steps = steps;
        }
        if let Some(device) = args.device {
            config.device = device;
        }
        if let Some(seed) = args.seed {
            config.seed = seed;
        }
        if let Some(t) = args.min_temp {
            config.annealer.min_temp = t;
        }
        if let Some(t) = args.max_temp {
            config.annealer.max_temp = t;
        }
        if let Some(parallel) = args.parallel {
            config.annealer.parallel = parallel;
        }
        if let Some(strategy) = args.update_strategy {
            config.annealer.update_strategy = strategy;
        }
        if args.verbose {
            config.annealer.verbose = true;
        }

        config.validate()?;
        Ok(config)
    }

    /// `<config_dir>/trbm/config.toml` on this platform, if it can be determined.
    pub fn default_config_path() -> Option<PathBuf> {
        let dirs = ProjectDirs::from("", "", "trbm")?;
        Some(dirs.config_dir().join("config.toml"))
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let toml_str = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn print_summary(&self) {
        println!("Annealed RBM configuration:");
        println!(
            "  Visible / hidden: {} / {}",
            self.visible_dim, self.hidden_dim
        );
        println!(
            "  Ensemble:         {} replicas, {} sweeps",
            self.state_size, self.steps
        );
        let annealer = &self.annealer;
        println!(
            "  Temperatures:     [{}, {}] ({:?}, parallel={})",
            annealer.min_temp, annealer.max_temp, annealer.update_strategy, annealer.parallel
        );
        println!("  Device / seed:    {} / {}", self.device, self.seed);
    }
}

fn missing(field: &str) -> TrbmError {
    TrbmError::InvalidConfig(format!("{field} is required"))
}

/// CLI arguments for [`RbmConfig`]; flatten into a binary's own parser.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// TOML config file
    #[arg(long, env = "TRBM_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    #[arg(long)]
    pub visible_dim: Option<usize>,

    #[arg(long)]
    pub hidden_dim: Option<usize>,

    /// Number of negative-phase replicas
    #[arg(long)]
    pub state_size: Option<usize>,

    /// Annealer sweeps per refresh
    #[arg(long)]
    pub steps: Option<usize>,

    /// auto, cpu or gpu
    #[arg(long)]
    pub device: Option<DeviceKind>,

    #[arg(long, env = "TRBM_SEED")]
    pub seed: Option<u64>,

    #[arg(long)]
    pub min_temp: Option<f64>,

    #[arg(long)]
    pub max_temp: Option<f64>,

    /// Advance replicas concurrently (true/false)
    #[arg(long)]
    pub parallel: Option<bool>,

    #[arg(long, value_enum)]
    pub update_strategy: Option<UpdateStrategy>,

    /// Log annealer progress every sweep
    #[arg(long)]
    pub verbose: bool,
}
