/// Result type alias for the experiment core
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the experiment core
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Dot cloud error: {0}")]
    Cloud(#[from] CloudError),

    #[error("Condition error: {0}")]
    Condition(#[from] ConditionError),

    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Rejected dot cloud construction
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CloudError {
    #[error("dot cloud needs at least one dot")]
    NoDots,

    #[error("dot lifespan must be at least one frame")]
    ZeroLifespan,

    #[error("spawn sigma must be finite and non-negative, got ({sigma_x}, {sigma_y})")]
    InvalidSigma { sigma_x: f32, sigma_y: f32 },

    #[error("spawn correlation must be within [-1, 1], got {0}")]
    InvalidCorrelation(f32),
}

/// Problems reading or expanding the condition table
#[derive(Debug, thiserror::Error)]
pub enum ConditionError {
    #[error("unknown condition column: {0}")]
    UnknownColumn(String),

    #[error("condition {index}: {field} must be at least 1")]
    NoDots { index: usize, field: &'static str },

    #[error("condition {index}: {field} = {value} is out of range")]
    OutOfRange {
        index: usize,
        field: &'static str,
        value: f32,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure while persisting a trial record
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Invalid or unreadable configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),
}
