use async_trait::async_trait;
use quiz_core::model::Question;

use super::{FetchOutcome, QuestionProvider};
use crate::error::ProviderError;

/// Provider backed by a fixed question list, or a fixed failure.
#[derive(Debug, Clone)]
pub struct StaticQuestionProvider {
    questions: Result<Vec<Question>, String>,
}

impl StaticQuestionProvider {
    #[must_use]
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions: Ok(questions),
        }
    }

    /// A provider whose every fetch fails with `ProviderError::Unavailable`.
    #[must_use]
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            questions: Err(reason.into()),
        }
    }
}

#[async_trait]
impl QuestionProvider for StaticQuestionProvider {
    async fn fetch(&self) -> FetchOutcome {
        let result = self
            .questions
            .clone()
            .map_err(ProviderError::Unavailable);
        FetchOutcome::from_result(result)
    }
}
