use thiserror::Error;

/// Failure kinds surfaced during setup, training, or dumping.
///
/// CFR itself is deterministic given its inputs, so nothing is retried;
/// every error aborts the run and is returned to the caller.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("invalid card notation: {0}")]
    InvalidCard(String),

    #[error("invalid board: {0}")]
    InvalidBoard(String),

    #[error("failed to parse range: {0}")]
    InvalidRange(String),

    #[error("duplicated hand in range: {0}")]
    DuplicateHand(String),

    #[error("deck must consist of four suits, got {0}")]
    InvalidDeck(usize),

    #[error("algorithm {0:?} is not supported")]
    UnsupportedAlgorithm(String),

    #[error("abstract deal {deal} out of range ({limit} slots)")]
    DealOutOfRange { deal: usize, limit: usize },

    #[error("NaN regret at action {action}, hand {hand}")]
    NanRegret { action: usize, hand: usize },

    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("suit swap target {0} is absent from the range")]
    MissingSwapTarget(String),

    #[error("invalid tree configuration: {0}")]
    InvalidTreeConfig(String),

    #[error("unsupported configuration: {0}")]
    Unsupported(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, SolverError>;
