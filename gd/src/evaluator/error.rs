//! Evaluation error types

use std::time::Duration;
use thiserror::Error;

/// Marker the scoring service puts in errors when the plan's project quota is used up
pub const PROJECT_LIMIT_MARKER: &str = "Project limit exceeded";

/// Errors that can occur while scoring a decomposition
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),
}

impl EvaluationError {
    /// Whether the service refused the run because the project quota is exhausted
    ///
    /// The service only signals this through its message text.
    pub fn is_quota_exceeded(&self) -> bool {
        self.to_string().contains(PROJECT_LIMIT_MARKER)
    }
}
