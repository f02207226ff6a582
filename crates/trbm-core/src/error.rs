//! Error type shared across the workspace.

/// Errors surfaced by configuration, the annealer interface and the RBM model.
#[derive(Debug, thiserror::Error)]
pub enum TrbmError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("{what} must be binary, found value {value}")]
    NonBinary { what: &'static str, value: f32 },

    #[error("invalid QUBO problem: {0}")]
    InvalidProblem(String),

    #[error("annealer failed: {0}")]
    Annealer(String),

    #[error("annealer returned no reads")]
    EmptyResults,

    #[error("could not read tensor data: {0}")]
    TensorData(String),
}

impl TrbmError {
    pub fn shape(what: &'static str, expected: &[usize], actual: &[usize]) -> Self {
        TrbmError::ShapeMismatch {
            what,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TrbmError>;
