//! Error taxonomy for the questioning engine and its collaborators.
//!
//! Provider and store errors are defined in `recque-core` so the engine can
//! classify collaborator failures without string matching. Engine errors
//! always report the pre-failure state intact: no operation partially
//! mutates the stack or skill track and then fails.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when asking a question provider to generate
/// skills or questions.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The provider returned a payload that could not be parsed.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Returns `true` if this error is permanent and should not be retried
    /// with the same inputs.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationFailed(_) | ProviderError::ModelNotFound(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ProviderError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

/// Errors from the session persistence store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No session exists with the given id.
    #[error("session not found: {0}")]
    NotFound(Uuid),

    /// The underlying storage failed.
    #[error("storage I/O error: {0}")]
    Io(String),

    /// A session snapshot could not be (de)serialized.
    #[error("session serialization error: {0}")]
    Serialization(String),
}

/// Errors surfaced by the questioning engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Question or skill generation failed. Safe to retry: the session
    /// state is exactly as it was before the call.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The provider returned a structurally invalid question (too few
    /// options, duplicate options, or an out-of-range correct index).
    /// Not retryable with the same inputs.
    #[error("malformed question from provider: {0}")]
    MalformedQuestion(String),

    /// Session persistence failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The chosen option index is outside the current question's options.
    #[error("invalid answer index {chosen}, question has {options} options")]
    InvalidAnswerIndex { chosen: usize, options: usize },

    /// A stack or track invariant was about to be broken. Always a caller
    /// or programmer error, never silently ignored.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// An operation required a non-empty question stack.
    #[error("question stack is empty")]
    EmptyStack,

    /// The operation is not valid in the engine's current state.
    #[error("operation '{operation}' is invalid in state {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },
}
