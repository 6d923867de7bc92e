use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{OptionId, QuestionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizSetError {
    #[error("quiz set has no questions")]
    Empty,

    #[error("question {question} has no options")]
    NoOptions { question: QuestionId },
}

/// One selectable answer of a question.
///
/// Field names follow the question source's JSON document, where the
/// display text is called `description`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub id: OptionId,
    #[serde(rename = "description")]
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

impl QuizOption {
    #[must_use]
    pub fn new(id: OptionId, text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            id,
            text: text.into(),
            is_correct,
        }
    }
}

/// A question with its ordered options. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    #[serde(rename = "description")]
    prompt: String,
    options: Vec<QuizOption>,
}

impl Question {
    #[must_use]
    pub fn new(id: QuestionId, prompt: impl Into<String>, options: Vec<QuizOption>) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            options,
        }
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[QuizOption] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, id: OptionId) -> Option<&QuizOption> {
        self.options.iter().find(|option| option.id == id)
    }

    /// The first option flagged correct. The source is trusted to flag exactly one.
    #[must_use]
    pub fn correct_option(&self) -> Option<&QuizOption> {
        self.options.iter().find(|option| option.is_correct)
    }
}

/// Ordered, non-empty list of questions for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSet {
    questions: Vec<Question>,
}

impl QuizSet {
    /// Build a quiz set from the provider's questions.
    ///
    /// # Errors
    ///
    /// Returns `QuizSetError::Empty` if `questions` is empty and
    /// `QuizSetError::NoOptions` for a question nobody could answer.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuizSetError> {
        if questions.is_empty() {
            return Err(QuizSetError::Empty);
        }
        if let Some(bare) = questions.iter().find(|q| q.options.is_empty()) {
            return Err(QuizSetError::NoOptions { question: bare.id });
        }
        Ok(Self { questions })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn last_index(&self) -> usize {
        self.questions.len() - 1
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }
}
