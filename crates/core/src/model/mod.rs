mod ids;
mod quiz;
mod session;
mod summary;

pub use ids::{OptionId, QuestionId};
pub use quiz::{Question, QuizOption, QuizSet, QuizSetError};
pub use session::{
    Advance, Generation, PendingAdvance, QuizSession, ScoringPolicy, SessionState,
    SessionStateError, SubmitOutcome,
};
pub use summary::CompletionSummary;
