use std::path::PathBuf;
use thiserror::Error;

/// Problems with a request body, detected before the model runs.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request has no `data` field")]
    MissingData,

    #[error("Non-numeric value ({found}) at depth {depth}")]
    NonNumeric { depth: usize, found: &'static str },

    #[error("Ragged array at depth {depth}: expected {expected} elements, found {found}")]
    Ragged {
        depth: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Error)]
pub enum ScoreError<E: std::error::Error> {
    #[error("Environment variable {0} is not set")]
    MissingEnv(String),

    #[error("Weights file not found: {}", .0.display())]
    WeightsNotFound(PathBuf),

    #[error("Unrecognized weights file: {}", .0.display())]
    UnrecognizedWeights(PathBuf),

    #[error("Weights do not match the network: {0}")]
    WeightsMismatch(String),

    #[error("Invalid request: {0}")]
    Request(#[from] RequestError),

    #[error("Backend error: {0}")]
    Backend(E),
}

impl<E: std::error::Error> ScoreError<E> {
    /// Whether the error can only be raised while loading the model.
    ///
    /// Backend errors are ambiguous; they count as startup errors only when
    /// raised by `init`, so this returns `false` for them.
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            ScoreError::MissingEnv(_)
                | ScoreError::WeightsNotFound(_)
                | ScoreError::UnrecognizedWeights(_)
                | ScoreError::WeightsMismatch(_)
        )
    }

    /// The first line of the message. Backend errors may carry a captured
    /// backtrace after it.
    pub fn summary(&self) -> String {
        self.to_string().lines().next().unwrap_or_default().to_string()
    }
}
