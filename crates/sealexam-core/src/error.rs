//! Error types.
//!
//! `SourceError` represents a failure fetching or decoding one bank or
//! blueprint source. It is defined here so the library loader can classify
//! failures per source without string matching. `SessionError` covers
//! invalid moves while administering a session.

use thiserror::Error;

/// Errors that can occur when fetching a question bank or blueprint.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The file or URL does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The server returned an error response.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// Reading a local file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The document is valid JSON but not the expected shape.
    #[error("schema invalid: {0}")]
    Schema(String),
}

impl SourceError {
    /// Returns `true` if retrying the same source cannot succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            SourceError::NotFound(_) | SourceError::InvalidJson(_) | SourceError::Schema(_)
        )
    }
}

/// Errors raised by invalid moves during a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A session cannot start without questions.
    #[error("no questions available for this session")]
    Empty,

    /// The current question must be answered before moving on.
    #[error("choose an answer first")]
    Unanswered,

    /// Answers lock once chosen.
    #[error("question {0} is already answered")]
    AlreadyAnswered(String),

    /// The chosen index is not one of the question's choices.
    #[error("choice {choice} out of range (question has {available} choices)")]
    ChoiceOutOfRange { choice: usize, available: usize },
}
