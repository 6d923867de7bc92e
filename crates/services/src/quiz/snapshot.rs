use quiz_core::model::{Question, QuizOption, QuizSession};

/// Why a session ended up without questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyReason {
    /// The provider answered with zero questions.
    NoQuestions,
    /// The provider failed; carries the rendered error.
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizPhase {
    Loading,
    Empty(EmptyReason),
    InProgress,
    Completed,
}

impl QuizPhase {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty(_))
    }

    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::InProgress)
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Read-only projection of the controller for rendering.
///
/// Carries no formatting; the display layer decides how to show it.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSnapshot {
    pub phase: QuizPhase,
    pub question: Option<Question>,
    pub index: usize,
    pub total: usize,
    pub selected: Option<QuizOption>,
    pub score: u32,
    pub can_go_back: bool,
    pub progress_percent: f64,
}

impl QuizSnapshot {
    #[must_use]
    pub fn without_session(phase: QuizPhase) -> Self {
        Self {
            phase,
            question: None,
            index: 0,
            total: 0,
            selected: None,
            score: 0,
            can_go_back: false,
            progress_percent: 0.0,
        }
    }

    #[must_use]
    pub fn of_session(session: &QuizSession) -> Self {
        let state = session.state();
        let phase = if state.is_completed() {
            QuizPhase::Completed
        } else {
            QuizPhase::InProgress
        };
        Self {
            phase,
            question: Some(session.current_question().clone()),
            index: state.current_index(),
            total: session.quiz().len(),
            selected: state.selected().cloned(),
            score: state.score(),
            can_go_back: session.can_go_back(),
            progress_percent: session.progress_percent(),
        }
    }

    /// True while the current question shows an answer and waits to advance.
    #[must_use]
    pub fn is_answer_locked(&self) -> bool {
        self.selected.is_some()
    }
}
