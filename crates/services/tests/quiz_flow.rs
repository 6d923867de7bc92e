use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use quiz_core::model::{OptionId, Question, QuestionId, QuizOption, ScoringPolicy, SubmitOutcome};
use quiz_core::time::fixed_now;
use services::{
    Clock, ControllerSettings, EmptyReason, FetchOutcome, QuestionProvider, QuizController,
    QuizError, QuizPhase, StaticQuestionProvider,
};

const A: OptionId = OptionId::new(1);
const B: OptionId = OptionId::new(2);
const C: OptionId = OptionId::new(3);

/// Question `id` whose correct option is `correct`.
fn question(id: u64, correct: OptionId) -> Question {
    let options = [A, B, C]
        .into_iter()
        .map(|option| QuizOption::new(option, format!("option {option}"), option == correct))
        .collect();
    Question::new(QuestionId::new(id), format!("Question {id}"), options)
}

fn settings() -> ControllerSettings {
    ControllerSettings::default().with_clock(Clock::Fixed(fixed_now()))
}

async fn started(questions: Vec<Question>) -> QuizController {
    let quiz = QuizController::new(Arc::new(StaticQuestionProvider::new(questions)), settings());
    let phase = quiz.start().await.unwrap();
    assert_eq!(phase, QuizPhase::InProgress);
    quiz
}

/// Let the pending advancement fire (time is paused, so this is instant).
async fn settle(quiz: &QuizController) {
    tokio::time::sleep(quiz.advance_delay() + Duration::from_millis(10)).await;
}

struct CountingProvider {
    calls: AtomicUsize,
    questions: Vec<Question>,
}

#[async_trait]
impl QuestionProvider for CountingProvider {
    async fn fetch(&self) -> FetchOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        FetchOutcome::from_result(Ok(self.questions.clone()))
    }
}

/// First fetch is slow and returns three questions; later fetches return two
/// immediately.
struct SlowFirstProvider {
    calls: AtomicUsize,
}

#[async_trait]
impl QuestionProvider for SlowFirstProvider {
    async fn fetch(&self) -> FetchOutcome {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_secs(5)).await;
            FetchOutcome::from_result(Ok(vec![question(1, A), question(2, B), question(3, C)]))
        } else {
            FetchOutcome::from_result(Ok(vec![question(1, A), question(2, B)]))
        }
    }
}

#[tokio::test(start_paused = true)]
async fn all_correct_answers_reach_completed_with_full_score() {
    let answers = [A, C, B, B, A];
    let questions = answers
        .iter()
        .enumerate()
        .map(|(i, correct)| question(i as u64 + 1, *correct))
        .collect();
    let quiz = started(questions).await;

    for correct in answers {
        let outcome = quiz.submit_answer(correct).unwrap();
        assert!(matches!(outcome, SubmitOutcome::Accepted { correct: true, .. }));
        settle(&quiz).await;
    }

    let snapshot = quiz.snapshot().unwrap();
    assert_eq!(snapshot.phase, QuizPhase::Completed);
    assert_eq!(snapshot.score, 5);
    assert_eq!(snapshot.index, 4);
    assert!((snapshot.progress_percent - 100.0).abs() < f64::EPSILON);
}

#[tokio::test(start_paused = true)]
async fn two_question_scenario() {
    let quiz = started(vec![question(1, A), question(2, B)]).await;

    quiz.submit_answer(A).unwrap();
    let snapshot = quiz.snapshot().unwrap();
    assert_eq!(snapshot.score, 1);
    assert_eq!(snapshot.index, 0);
    assert_eq!(snapshot.selected.as_ref().map(|o| o.id), Some(A));

    settle(&quiz).await;
    let snapshot = quiz.snapshot().unwrap();
    assert_eq!(snapshot.index, 1);
    assert!(snapshot.can_go_back);
    assert!(snapshot.selected.is_none());
    assert!((snapshot.progress_percent - 50.0).abs() < f64::EPSILON);

    quiz.submit_answer(C).unwrap();
    assert_eq!(quiz.snapshot().unwrap().score, 1);
    assert_eq!(quiz.snapshot().unwrap().phase, QuizPhase::InProgress);

    settle(&quiz).await;
    let snapshot = quiz.snapshot().unwrap();
    assert_eq!(snapshot.phase, QuizPhase::Completed);
    assert_eq!(snapshot.score, 1);
    assert_eq!(quiz.summary().unwrap().unwrap().total(), 2);
}

#[tokio::test(start_paused = true)]
async fn rapid_double_submit_counts_once() {
    let quiz = started(vec![question(1, A), question(2, A), question(3, A)]).await;

    assert!(matches!(
        quiz.submit_answer(A).unwrap(),
        SubmitOutcome::Accepted { .. }
    ));
    assert_eq!(quiz.submit_answer(A).unwrap(), SubmitOutcome::AlreadyAnswered);
    assert_eq!(quiz.submit_answer(B).unwrap(), SubmitOutcome::AlreadyAnswered);

    settle(&quiz).await;
    settle(&quiz).await;
    let snapshot = quiz.snapshot().unwrap();
    assert_eq!(snapshot.score, 1);
    assert_eq!(snapshot.index, 1);
}

#[tokio::test(start_paused = true)]
async fn previous_from_completed_reenters_in_progress() {
    let quiz = started(vec![question(1, A), question(2, B)]).await;
    quiz.submit_answer(A).unwrap();
    settle(&quiz).await;
    quiz.submit_answer(B).unwrap();
    settle(&quiz).await;
    assert_eq!(quiz.snapshot().unwrap().phase, QuizPhase::Completed);

    assert_eq!(quiz.go_to_previous_question().unwrap(), Some(0));
    let snapshot = quiz.snapshot().unwrap();
    assert_eq!(snapshot.phase, QuizPhase::InProgress);
    assert_eq!(snapshot.index, 0);
    assert!(snapshot.selected.is_none());
    assert!(!snapshot.can_go_back);
    assert_eq!(snapshot.score, 2);
    assert!(quiz.summary().unwrap().is_none());

    assert_eq!(quiz.go_to_previous_question().unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn previous_is_noop_without_history() {
    let quiz = started(vec![question(1, A), question(2, B)]).await;
    let before = quiz.snapshot().unwrap();
    assert_eq!(quiz.go_to_previous_question().unwrap(), None);
    assert_eq!(quiz.snapshot().unwrap(), before);

    quiz.submit_answer(A).unwrap();
    let locked = quiz.snapshot().unwrap();
    assert_eq!(quiz.go_to_previous_question().unwrap(), None);
    assert_eq!(quiz.snapshot().unwrap(), locked);
}

#[tokio::test(start_paused = true)]
async fn reset_restores_defaults_from_any_phase() {
    let quiz = started(vec![question(1, A), question(2, B)]).await;
    quiz.submit_answer(A).unwrap();
    settle(&quiz).await;
    quiz.submit_answer(B).unwrap();
    settle(&quiz).await;
    assert_eq!(quiz.snapshot().unwrap().phase, QuizPhase::Completed);

    quiz.reset().unwrap();
    let snapshot = quiz.snapshot().unwrap();
    assert_eq!(snapshot.phase, QuizPhase::InProgress);
    assert_eq!(snapshot.score, 0);
    assert_eq!(snapshot.index, 0);
    assert!(!snapshot.can_go_back);
    assert!(snapshot.selected.is_none());
    assert_eq!(snapshot.total, 2);
}

#[tokio::test(start_paused = true)]
async fn reset_during_delay_discards_pending_advance() {
    let quiz = started(vec![question(1, A), question(2, B), question(3, C)]).await;
    quiz.submit_answer(A).unwrap();
    settle(&quiz).await;
    quiz.submit_answer(B).unwrap();

    quiz.reset().unwrap();
    settle(&quiz).await;
    settle(&quiz).await;

    let snapshot = quiz.snapshot().unwrap();
    assert_eq!(snapshot.index, 0);
    assert_eq!(snapshot.score, 0);
    assert!(!snapshot.can_go_back);
    assert!(snapshot.selected.is_none());
}

#[tokio::test(start_paused = true)]
async fn going_back_during_delay_discards_pending_advance() {
    let quiz = started(vec![question(1, A), question(2, B), question(3, C)]).await;
    quiz.submit_answer(A).unwrap();
    settle(&quiz).await;
    quiz.submit_answer(B).unwrap();

    assert_eq!(quiz.go_to_previous_question().unwrap(), Some(0));
    settle(&quiz).await;

    let snapshot = quiz.snapshot().unwrap();
    assert_eq!(snapshot.index, 0);
    assert!(snapshot.selected.is_none());
    assert_eq!(snapshot.score, 2);
}

#[tokio::test(start_paused = true)]
async fn first_correct_only_prevents_rescoring_revisited_question() {
    let provider = StaticQuestionProvider::new(vec![question(1, A), question(2, B)]);
    let settings = ControllerSettings {
        scoring: ScoringPolicy::FirstCorrectOnly,
        ..settings()
    };
    let quiz = QuizController::new(Arc::new(provider), settings);
    quiz.start().await.unwrap();

    quiz.submit_answer(A).unwrap();
    settle(&quiz).await;
    quiz.go_to_previous_question().unwrap();
    quiz.submit_answer(A).unwrap();
    settle(&quiz).await;

    let snapshot = quiz.snapshot().unwrap();
    assert_eq!(snapshot.score, 1);
    assert_eq!(snapshot.index, 1);
}

#[tokio::test]
async fn empty_provider_leads_to_empty_phase() {
    let quiz = QuizController::new(Arc::new(StaticQuestionProvider::new(Vec::new())), settings());
    let phase = quiz.start().await.unwrap();
    assert_eq!(phase, QuizPhase::Empty(EmptyReason::NoQuestions));
    assert!(matches!(quiz.submit_answer(A), Err(QuizError::NotInProgress)));
    assert!(matches!(quiz.reset(), Err(QuizError::NotLoaded)));
    assert_eq!(quiz.go_to_previous_question().unwrap(), None);
}

#[tokio::test]
async fn failing_provider_is_reported_as_unavailable() {
    let quiz = QuizController::new(
        Arc::new(StaticQuestionProvider::failing("connection refused")),
        settings(),
    );
    let phase = quiz.start().await.unwrap();
    match phase {
        QuizPhase::Empty(EmptyReason::Unavailable(message)) => {
            assert!(message.contains("connection refused"));
        }
        other => panic!("expected unavailable, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn provider_is_called_once_per_start_and_not_on_reset() {
    let provider = Arc::new(CountingProvider {
        calls: AtomicUsize::new(0),
        questions: vec![question(1, A)],
    });
    let quiz = QuizController::new(provider.clone(), settings());
    quiz.start().await.unwrap();
    quiz.submit_answer(A).unwrap();
    settle(&quiz).await;
    quiz.reset().unwrap();
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_timed_transitions() {
    let quiz = started(vec![question(1, A), question(2, B)]).await;
    let mut updates = quiz.subscribe();
    updates.borrow_and_update();

    quiz.submit_answer(A).unwrap();
    updates.changed().await.unwrap();
    assert!(updates.borrow_and_update().is_answer_locked());

    updates.changed().await.unwrap();
    let snapshot = updates.borrow_and_update().clone();
    assert_eq!(snapshot.index, 1);
    assert!(!snapshot.is_answer_locked());
}

#[tokio::test(start_paused = true)]
async fn restart_during_delay_discards_pending_advance() {
    let quiz = started(vec![question(1, A), question(2, B), question(3, C)]).await;
    quiz.submit_answer(A).unwrap();

    assert_eq!(quiz.start().await.unwrap(), QuizPhase::InProgress);
    settle(&quiz).await;
    settle(&quiz).await;

    let snapshot = quiz.snapshot().unwrap();
    assert_eq!(snapshot.index, 0);
    assert_eq!(snapshot.score, 0);
    assert!(snapshot.selected.is_none());
    assert!(!snapshot.can_go_back);
}

#[tokio::test(start_paused = true)]
async fn superseded_fetch_result_is_discarded() {
    let provider = Arc::new(SlowFirstProvider {
        calls: AtomicUsize::new(0),
    });
    let quiz = QuizController::new(provider.clone(), settings());

    let first = tokio::spawn({
        let quiz = quiz.clone();
        async move { quiz.start().await }
    });
    while provider.calls.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }

    assert_eq!(quiz.start().await.unwrap(), QuizPhase::InProgress);
    assert_eq!(first.await.unwrap().unwrap(), QuizPhase::InProgress);

    let snapshot = quiz.snapshot().unwrap();
    assert_eq!(snapshot.phase, QuizPhase::InProgress);
    assert_eq!(snapshot.total, 2);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn question_without_options_never_starts() {
    let bare = Question::new(QuestionId::new(1), "Q1", Vec::new());
    let quiz = QuizController::new(
        Arc::new(StaticQuestionProvider::new(vec![question(2, A), bare])),
        settings(),
    );

    match quiz.start().await.unwrap() {
        QuizPhase::Empty(EmptyReason::Unavailable(message)) => {
            assert!(message.contains("no options"));
        }
        other => panic!("expected unavailable, got {other:?}"),
    }
    assert!(matches!(quiz.submit_answer(A), Err(QuizError::NotInProgress)));
}
