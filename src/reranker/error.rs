use thiserror::Error;

use crate::context::ContextError;
use crate::inference::{InferenceError, SessionError};
use crate::tokenizer::ConfigLoadError;

/// The remote service could not be reached or did not answer in time.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {endpoint} failed: {reason}")]
    Request { endpoint: String, reason: String },

    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("request interrupted: {0}")]
    Interrupted(#[from] ContextError),

    #[error("failed to build HTTP client: {reason}")]
    ClientBuild { reason: String },

    #[error("request encoding task failed: {reason}")]
    Encode { reason: String },
}

impl TransportError {
    pub(crate) fn from_reqwest(endpoint: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout {
                endpoint: endpoint.to_string(),
            }
        } else {
            TransportError::Request {
                endpoint: endpoint.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

/// The remote service answered, but not with usable scores.
#[derive(Debug, Error)]
pub enum RemoteServiceError {
    #[error("scoring service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("scoring service error: {message}")]
    Service { message: String },

    #[error("malformed scoring response: {reason}")]
    MalformedResponse { reason: String },

    #[error("scoring service returned {actual} scores for {expected} documents")]
    ScoreCountMismatch { expected: usize, actual: usize },
}

/// Failure of a rerank call or of building a reranker.
#[derive(Debug, Error)]
pub enum RerankError {
    #[error("local scoring failed: {0}")]
    Local(InferenceError),

    #[error("remote transport failed: {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    RemoteService(#[from] RemoteServiceError),

    #[error(transparent)]
    Vocabulary(#[from] ConfigLoadError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("reranker not ready: {reason}")]
    NotReady { reason: String },

    #[error("invalid reranker configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl From<InferenceError> for RerankError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::Session(session) => RerankError::Session(session),
            other => RerankError::Local(other),
        }
    }
}

impl From<ContextError> for RerankError {
    fn from(err: ContextError) -> Self {
        RerankError::Local(InferenceError::Interrupted(err))
    }
}

impl RerankError {
    /// The context failure behind this error, if it was a cancellation or
    /// deadline rather than a scoring fault.
    pub fn context_error(&self) -> Option<ContextError> {
        match self {
            RerankError::Local(InferenceError::Interrupted(reason))
            | RerankError::Transport(TransportError::Interrupted(reason)) => Some(*reason),
            _ => None,
        }
    }

    pub fn is_cancellation(&self) -> bool {
        self.context_error().is_some()
    }
}
