use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use quiz_core::model::{
    Advance, CompletionSummary, Generation, OptionId, PendingAdvance, QuizSession,
    ScoringPolicy, SubmitOutcome,
};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::snapshot::{EmptyReason, QuizPhase, QuizSnapshot};
use crate::Clock;
use crate::config::{DEFAULT_ADVANCE_DELAY, QuizConfig};
use crate::error::QuizError;
use crate::provider::{FetchOutcome, QuestionProvider};

/// Knobs for a `QuizController`.
#[derive(Debug, Clone, Copy)]
pub struct ControllerSettings {
    pub clock: Clock,
    pub advance_delay: Duration,
    pub scoring: ScoringPolicy,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            clock: Clock::System,
            advance_delay: DEFAULT_ADVANCE_DELAY,
            scoring: ScoringPolicy::default(),
        }
    }
}

impl From<&QuizConfig> for ControllerSettings {
    fn from(config: &QuizConfig) -> Self {
        Self {
            clock: Clock::System,
            advance_delay: config.advance_delay,
            scoring: config.scoring,
        }
    }
}

impl ControllerSettings {
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}

enum Stage {
    Loading,
    Empty(EmptyReason),
    Ready(QuizSession),
}

struct ControllerState {
    stage: Stage,
    /// Bumped by every `start`, so a slow fetch cannot overwrite a newer one.
    start_epoch: u64,
    /// Last generation of the session a `start` replaced; the next session
    /// numbers past it.
    retired: Generation,
    pending: Option<JoinHandle<()>>,
}

impl ControllerState {
    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    fn snapshot(&self) -> QuizSnapshot {
        match &self.stage {
            Stage::Loading => QuizSnapshot::without_session(QuizPhase::Loading),
            Stage::Empty(reason) => {
                QuizSnapshot::without_session(QuizPhase::Empty(reason.clone()))
            }
            Stage::Ready(session) => QuizSnapshot::of_session(session),
        }
    }
}

struct Inner {
    provider: Arc<dyn QuestionProvider>,
    settings: ControllerSettings,
    state: Mutex<ControllerState>,
    snapshots: watch::Sender<QuizSnapshot>,
}

/// Owns the quiz session and drives it through
/// `Loading → {Empty | InProgress} → Completed`.
///
/// Cloning is cheap; clones share the same session.
#[derive(Clone)]
pub struct QuizController {
    inner: Arc<Inner>,
}

impl QuizController {
    #[must_use]
    pub fn new(provider: Arc<dyn QuestionProvider>, settings: ControllerSettings) -> Self {
        let (snapshots, _) = watch::channel(QuizSnapshot::without_session(QuizPhase::Loading));
        Self {
            inner: Arc::new(Inner {
                provider,
                settings,
                state: Mutex::new(ControllerState {
                    stage: Stage::Loading,
                    start_epoch: 0,
                    retired: Generation::default(),
                    pending: None,
                }),
                snapshots,
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ControllerState>, QuizError> {
        self.inner
            .state
            .lock()
            .map_err(|e| QuizError::Poisoned(e.to_string()))
    }

    fn publish(&self, state: &ControllerState) {
        self.inner.snapshots.send_replace(state.snapshot());
    }

    /// Fetch the quiz set and enter `InProgress`, or `Empty` when the provider
    /// has nothing to offer. Returns the resulting phase.
    ///
    /// Any pending advancement from an earlier session is cancelled.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Poisoned` if the state lock is poisoned.
    pub async fn start(&self) -> Result<QuizPhase, QuizError> {
        let epoch = {
            let mut state = self.lock()?;
            state.cancel_pending();
            if let Stage::Ready(session) = &state.stage {
                let retired = session.state().generation();
                state.retired = retired;
            }
            state.stage = Stage::Loading;
            state.start_epoch += 1;
            self.publish(&state);
            state.start_epoch
        };

        tracing::info!("loading quiz questions");
        let outcome = self.inner.provider.fetch().await;

        let mut state = self.lock()?;
        if state.start_epoch != epoch {
            tracing::debug!(epoch, "discarding superseded fetch result");
            return Ok(state.snapshot().phase);
        }

        let retired = state.retired;
        state.stage = match outcome {
            FetchOutcome::Loaded(quiz) => {
                tracing::info!(questions = quiz.len(), "quiz loaded");
                let now = self.inner.settings.clock.now();
                Stage::Ready(
                    QuizSession::new(quiz, self.inner.settings.scoring, now)
                        .starting_after(retired),
                )
            }
            FetchOutcome::Empty => {
                tracing::warn!("question source returned no questions");
                Stage::Empty(EmptyReason::NoQuestions)
            }
            FetchOutcome::Failed(err) => {
                tracing::warn!(error = %err, "failed to load quiz questions");
                Stage::Empty(EmptyReason::Unavailable(err.to_string()))
            }
        };
        self.publish(&state);
        Ok(state.snapshot().phase)
    }

    /// Answer the current question.
    ///
    /// A correct answer scores immediately. The move to the next question (or
    /// to `Completed` after the last one) happens after the advance delay.
    /// Repeated calls before that are ignored with
    /// `SubmitOutcome::AlreadyAnswered`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotInProgress` outside `InProgress`,
    /// `QuizError::UnknownOption` for an option the current question lacks, and
    /// `QuizError::NoRuntime` when called outside a tokio runtime (the session
    /// is left untouched).
    pub fn submit_answer(&self, option: OptionId) -> Result<SubmitOutcome, QuizError> {
        let runtime = Handle::try_current().map_err(|_| QuizError::NoRuntime)?;
        let mut state = self.lock()?;
        let Stage::Ready(session) = &mut state.stage else {
            return Err(QuizError::NotInProgress);
        };

        let outcome = session.submit(option)?;
        match &outcome {
            SubmitOutcome::Accepted {
                correct,
                scored,
                pending,
            } => {
                tracing::debug!(
                    index = pending.index,
                    generation = pending.generation.value(),
                    option = %option,
                    correct,
                    scored,
                    "answer recorded"
                );
                let handle = self.schedule_advance(&runtime, *pending);
                state.cancel_pending();
                state.pending = Some(handle);
                self.publish(&state);
            }
            SubmitOutcome::AlreadyAnswered => {
                tracing::debug!(option = %option, "ignoring answer for locked question");
            }
        }
        Ok(outcome)
    }

    fn schedule_advance(&self, runtime: &Handle, pending: PendingAdvance) -> JoinHandle<()> {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let delay = self.inner.settings.advance_delay;
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                QuizController { inner }.apply_advance(pending);
            }
        })
    }

    fn apply_advance(&self, pending: PendingAdvance) {
        let Ok(mut state) = self.lock() else {
            tracing::warn!("quiz state lock poisoned; dropping advancement");
            return;
        };
        let now = self.inner.settings.clock.now();
        let Stage::Ready(session) = &mut state.stage else {
            tracing::debug!("no session for scheduled advancement");
            return;
        };

        match session.advance(pending, now) {
            Advance::Stale => {
                tracing::debug!(
                    index = pending.index,
                    generation = pending.generation.value(),
                    "discarding stale advancement"
                );
                return;
            }
            Advance::NextQuestion { index } => {
                tracing::debug!(index, "advanced to next question");
            }
            Advance::Completed => {
                tracing::info!(
                    score = session.state().score(),
                    total = session.quiz().len(),
                    "quiz completed"
                );
            }
        }
        state.pending = None;
        self.publish(&state);
    }

    /// Step back to the most recently departed question.
    ///
    /// Returns the new index, or `None` when there is no history (in any phase).
    /// Leaving `Completed` this way re-enters `InProgress`; the score is kept.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Poisoned` if the state lock is poisoned.
    pub fn go_to_previous_question(&self) -> Result<Option<usize>, QuizError> {
        let mut state = self.lock()?;
        let Stage::Ready(session) = &mut state.stage else {
            return Ok(None);
        };
        let Some(index) = session.go_to_previous() else {
            return Ok(None);
        };
        tracing::debug!(index, "returned to previous question");
        state.cancel_pending();
        self.publish(&state);
        Ok(Some(index))
    }

    /// Start the loaded quiz over without refetching it.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotLoaded` while loading or when no quiz was loaded.
    pub fn reset(&self) -> Result<(), QuizError> {
        let mut state = self.lock()?;
        let now = self.inner.settings.clock.now();
        let Stage::Ready(session) = &mut state.stage else {
            return Err(QuizError::NotLoaded);
        };
        session.reset(now);
        tracing::info!("quiz reset");
        state.cancel_pending();
        self.publish(&state);
        Ok(())
    }

    /// Current view of the session.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Poisoned` if the state lock is poisoned.
    pub fn snapshot(&self) -> Result<QuizSnapshot, QuizError> {
        Ok(self.lock()?.snapshot())
    }

    /// Receive a fresh snapshot after every transition, including the timed ones.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<QuizSnapshot> {
        self.inner.snapshots.subscribe()
    }

    /// Summary of the finished pass, once `Completed`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Poisoned` if the state lock is poisoned.
    pub fn summary(&self) -> Result<Option<CompletionSummary>, QuizError> {
        let state = self.lock()?;
        Ok(match &state.stage {
            Stage::Ready(session) => session.summary(),
            Stage::Loading | Stage::Empty(_) => None,
        })
    }

    #[must_use]
    pub fn advance_delay(&self) -> Duration {
        self.inner.settings.advance_delay
    }
}

impl fmt::Debug for QuizController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizController")
            .field("settings", &self.inner.settings)
            .field("phase", &self.inner.snapshots.borrow().phase)
            .finish_non_exhaustive()
    }
}
