use std::path::PathBuf;
use thiserror::Error;

use crate::context::ContextError;

/// Lifecycle failures of the native scoring session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("scoring model not found at path: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("failed to load scoring model: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("invalid session configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("inference session not initialized")]
    NotInitialized,
}

impl From<candle_core::Error> for SessionError {
    fn from(err: candle_core::Error) -> Self {
        SessionError::ModelLoadFailed {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::ModelLoadFailed {
            reason: err.to_string(),
        }
    }
}

/// Failure while scoring a batch. Any failure fails the whole batch.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("invalid input at batch item {index}: {reason}")]
    InvalidInput { index: usize, reason: String },

    #[error("inference failed at batch item {index}: {reason}")]
    Failed { index: usize, reason: String },

    #[error("inference interrupted: {0}")]
    Interrupted(#[from] ContextError),

    #[error("inference task failed: {reason}")]
    TaskFailed { reason: String },
}
