use thiserror::Error;

/// Error types for the fitfunc-rs library.
#[derive(Error, Debug)]
pub enum FitFuncError {
    /// A fitting function was configured with invalid metadata.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// No fitting function is registered under the requested name.
    #[error("Fitting function not found: {0}")]
    NotFound(String),

    /// Error indicating a mismatch between declared and actual dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Invalid input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A model produced a non-finite value where a finite one is required.
    #[error("Function evaluation error: {0}")]
    FunctionEvaluation(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for fitfunc-rs operations.
pub type Result<T> = std::result::Result<T, FitFuncError>;
