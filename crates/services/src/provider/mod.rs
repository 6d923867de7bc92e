//! Sources of quiz questions.

mod fixed;
mod http;

use async_trait::async_trait;
use quiz_core::model::{Question, QuizSet, QuizSetError};

use crate::error::ProviderError;

pub use fixed::StaticQuestionProvider;
pub use http::{HttpQuestionProvider, QuestionDocument, decode_document};

/// Tagged result of one fetch.
#[derive(Debug)]
pub enum FetchOutcome {
    Loaded(QuizSet),
    Empty,
    Failed(ProviderError),
}

impl FetchOutcome {
    /// Classify a raw provider result. An empty list is `Empty`; a list that
    /// fails validation is `Failed`.
    #[must_use]
    pub fn from_result(result: Result<Vec<Question>, ProviderError>) -> Self {
        match result {
            Ok(questions) => match QuizSet::new(questions) {
                Ok(quiz) => Self::Loaded(quiz),
                Err(QuizSetError::Empty) => Self::Empty,
                Err(err) => Self::Failed(err.into()),
            },
            Err(err) => Self::Failed(err),
        }
    }
}

/// Supplies the ordered question list for a session.
///
/// Implementations report failures through `FetchOutcome::Failed`; they never
/// panic or return errors out of band.
#[async_trait]
pub trait QuestionProvider: Send + Sync {
    async fn fetch(&self) -> FetchOutcome;
}
