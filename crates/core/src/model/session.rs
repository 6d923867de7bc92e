use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{CompletionSummary, OptionId, QuestionId, QuizOption, QuizSet};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionStateError {
    #[error("option {option} does not belong to question {question}")]
    UnknownOption {
        question: QuestionId,
        option: OptionId,
    },

    #[error("quiz already completed")]
    Completed,
}

/// How correct answers turn into points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScoringPolicy {
    /// Every correct submission earns a point, including re-answers of a
    /// question revisited through history.
    #[default]
    PerSubmission,
    /// A question earns at most one point per pass.
    FirstCorrectOnly,
}

/// Identifies one incarnation of the session state.
///
/// Bumped whenever the current question changes or the session is reset, so
/// deferred work scheduled earlier can tell it is stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Ticket for the advancement owed after an accepted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingAdvance {
    pub generation: Generation,
    pub index: usize,
}

/// Result of submitting an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted {
        correct: bool,
        /// Whether the answer changed the score.
        scored: bool,
        pending: PendingAdvance,
    },
    /// The current question is locked; nothing changed.
    AlreadyAnswered,
}

/// Result of applying a `PendingAdvance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    NextQuestion { index: usize },
    Completed,
    /// The ticket no longer matches the session; nothing changed.
    Stale,
}

/// Mutable progress through a quiz set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    current_index: usize,
    score: u32,
    selected: Option<QuizOption>,
    history: Vec<usize>,
    completed: bool,
    generation: Generation,
    credited: BTreeSet<usize>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl SessionState {
    fn fresh(generation: Generation, started_at: DateTime<Utc>) -> Self {
        Self {
            current_index: 0,
            score: 0,
            selected: None,
            history: Vec::new(),
            completed: false,
            generation,
            credited: BTreeSet::new(),
            started_at,
            completed_at: None,
        }
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn selected(&self) -> Option<&QuizOption> {
        self.selected.as_ref()
    }

    #[must_use]
    pub fn history(&self) -> &[usize] {
        &self.history
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }
}

/// A quiz set together with the state of one pass through it.
///
/// Every method updates all affected fields in one step; timestamps are passed
/// in by the caller so the services layer owns the clock.
#[derive(Debug, Clone)]
pub struct QuizSession {
    quiz: QuizSet,
    state: SessionState,
    policy: ScoringPolicy,
}

impl QuizSession {
    #[must_use]
    pub fn new(quiz: QuizSet, policy: ScoringPolicy, started_at: DateTime<Utc>) -> Self {
        Self {
            quiz,
            state: SessionState::fresh(Generation::default(), started_at),
            policy,
        }
    }

    /// Continue numbering after a retired session, so its tickets never match
    /// this one.
    #[must_use]
    pub fn starting_after(mut self, retired: Generation) -> Self {
        self.state.generation = retired.next();
        self
    }

    #[must_use]
    pub fn quiz(&self) -> &QuizSet {
        &self.quiz
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn policy(&self) -> ScoringPolicy {
        self.policy
    }

    #[must_use]
    pub fn current_question(&self) -> &crate::model::Question {
        // current_index is kept within bounds by every transition
        &self.quiz.questions()[self.state.current_index]
    }

    #[must_use]
    pub fn can_go_back(&self) -> bool {
        !self.state.history.is_empty()
    }

    /// Percentage of questions started, `100 * current_index / len`.
    ///
    /// The last question reads below 100 until the quiz completes.
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        if self.state.completed {
            return 100.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let pct = 100.0 * self.state.current_index as f64 / self.quiz.len() as f64;
        pct
    }

    /// Record an answer for the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::Completed` once the quiz is completed and
    /// `SessionStateError::UnknownOption` if `option` is not offered by the
    /// current question.
    pub fn submit(&mut self, option: OptionId) -> Result<SubmitOutcome, SessionStateError> {
        if self.state.completed {
            return Err(SessionStateError::Completed);
        }
        if self.state.selected.is_some() {
            return Ok(SubmitOutcome::AlreadyAnswered);
        }

        let question = self.current_question();
        let chosen = question
            .option(option)
            .cloned()
            .ok_or(SessionStateError::UnknownOption {
                question: question.id(),
                option,
            })?;

        let index = self.state.current_index;
        let correct = chosen.is_correct;
        let scored = correct
            && match self.policy {
                ScoringPolicy::PerSubmission => {
                    self.state.credited.insert(index);
                    true
                }
                ScoringPolicy::FirstCorrectOnly => self.state.credited.insert(index),
            };
        if scored {
            self.state.score = self.state.score.saturating_add(1);
        }
        self.state.selected = Some(chosen);

        Ok(SubmitOutcome::Accepted {
            correct,
            scored,
            pending: PendingAdvance {
                generation: self.state.generation,
                index,
            },
        })
    }

    /// Apply the advancement owed after an accepted answer.
    ///
    /// Returns `Advance::Stale` without touching state if the session moved on
    /// since `pending` was issued.
    pub fn advance(&mut self, pending: PendingAdvance, now: DateTime<Utc>) -> Advance {
        let state = &mut self.state;
        if pending.generation != state.generation
            || pending.index != state.current_index
            || state.selected.is_none()
            || state.completed
        {
            return Advance::Stale;
        }

        if state.current_index == self.quiz.last_index() {
            state.completed = true;
            state.completed_at = Some(now);
            state.generation = state.generation.next();
            return Advance::Completed;
        }

        state.history.push(state.current_index);
        state.current_index += 1;
        state.selected = None;
        state.generation = state.generation.next();
        Advance::NextQuestion {
            index: state.current_index,
        }
    }

    /// Return to the most recently departed question.
    ///
    /// Returns the new current index, or `None` (leaving state untouched) when
    /// history is empty. The score is kept.
    pub fn go_to_previous(&mut self) -> Option<usize> {
        let state = &mut self.state;
        let index = state.history.pop()?;
        state.current_index = index;
        state.selected = None;
        state.completed = false;
        state.completed_at = None;
        state.generation = state.generation.next();
        Some(index)
    }

    /// Restore defaults without touching the quiz set.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        let generation = self.state.generation.next();
        self.state = SessionState::fresh(generation, now);
    }

    /// Summary of the finished pass, if completed.
    #[must_use]
    pub fn summary(&self) -> Option<CompletionSummary> {
        let completed_at = self.state.completed_at.filter(|_| self.state.completed)?;
        Some(CompletionSummary::new(
            self.state.score,
            self.quiz.len(),
            self.state.started_at,
            completed_at,
        ))
    }
}
