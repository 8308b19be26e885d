use thiserror::Error;

/// Errors raised before a problem reaches the optimizer.
///
/// Solver-stage failures are never returned as errors; they are reported in
/// the result's status, unmet demand and error fields.
#[derive(Debug, Error)]
pub enum CutError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("piece id {0} is already in use")]
    DuplicatePiece(u32),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("unknown example '{0}'")]
    UnknownExample(String),

    #[error("failed to read problem: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse problem: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CutError>;
