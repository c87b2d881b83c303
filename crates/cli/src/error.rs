//! Error types for anapadd

use anapad_core::prelude::{AnapadError, PollFailure};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[source] AnapadError),

    #[error("Start failed: {0}")]
    StartFailed(#[source] AnapadError),

    #[error(
        "{} gave up after {} consecutive failures: {}",
        .0.subsystem,
        .0.consecutive_failures,
        .0.last_error
    )]
    SubsystemFailed(PollFailure),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::InvalidConfiguration(_) | CliError::JsonError(_) => 4,
            CliError::StartFailed(_) => 5,
            CliError::SubsystemFailed(_) => 6,
        }
    }
}
