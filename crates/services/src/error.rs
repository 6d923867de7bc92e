//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{OptionId, QuestionId, QuizSetError, SessionStateError};

/// Errors emitted by question providers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    #[error("question source returned status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("question source returned malformed data: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("question source returned unusable questions: {0}")]
    InvalidQuestions(#[from] QuizSetError),
    #[error("question source unavailable: {0}")]
    Unavailable(String),
}

/// Errors emitted by `QuizController` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("no quiz is loaded")]
    NotLoaded,
    #[error("quiz is not in progress")]
    NotInProgress,
    #[error("option {option} does not belong to question {question}")]
    UnknownOption {
        question: QuestionId,
        option: OptionId,
    },
    #[error(transparent)]
    Session(SessionStateError),
    #[error("answers need a tokio runtime to schedule advancement")]
    NoRuntime,
    #[error("quiz state lock poisoned: {0}")]
    Poisoned(String),
}

impl From<SessionStateError> for QuizError {
    fn from(err: SessionStateError) -> Self {
        match err {
            SessionStateError::UnknownOption { question, option } => {
                Self::UnknownOption { question, option }
            }
            SessionStateError::Completed => Self::NotInProgress,
            other => Self::Session(other),
        }
    }
}

/// Errors emitted while reading `QuizConfig`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid {name} url {raw:?}: {source}")]
    InvalidUrl {
        name: &'static str,
        raw: String,
        source: url::ParseError,
    },
    #[error("invalid advance delay {raw:?}: expected milliseconds")]
    InvalidDelay { raw: String },
    #[error("invalid scoring policy {raw:?}: expected per-submission or first-correct")]
    InvalidScoring { raw: String },
}
