use std::fmt::Write as _;

use quiz_core::model::{CompletionSummary, OptionId};
use services::{EmptyReason, QuizPhase, QuizSnapshot};

const BAR_WIDTH: usize = 20;

/// One line of user input, mapped to a controller operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// 1-based option number as shown on screen.
    Choose(usize),
    Previous,
    Reset,
    Quit,
}

impl Input {
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "b" | "back" | "p" | "prev" => Some(Self::Previous),
            "r" | "reset" => Some(Self::Reset),
            "q" | "quit" | "exit" => Some(Self::Quit),
            other => other
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .map(Self::Choose),
        }
    }
}

/// Resolve an on-screen option number to the option id of the current question.
#[must_use]
pub fn option_for(snapshot: &QuizSnapshot, number: usize) -> Option<OptionId> {
    let question = snapshot.question.as_ref()?;
    question
        .options()
        .get(number.checked_sub(1)?)
        .map(|option| option.id)
}

fn progress_bar(percent: f64) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

/// Render a snapshot as plain text.
#[must_use]
pub fn render(snapshot: &QuizSnapshot, summary: Option<&CompletionSummary>) -> String {
    let mut out = String::new();
    match &snapshot.phase {
        QuizPhase::Loading => out.push_str("Loading quiz...\n"),
        QuizPhase::Empty(EmptyReason::NoQuestions) => {
            out.push_str("No questions available.\n");
        }
        QuizPhase::Empty(EmptyReason::Unavailable(reason)) => {
            let _ = writeln!(out, "Unable to load quiz: {reason}");
        }
        QuizPhase::InProgress => render_question(&mut out, snapshot),
        QuizPhase::Completed => render_completion(&mut out, snapshot, summary),
    }
    out
}

fn render_header(out: &mut String, snapshot: &QuizSnapshot) {
    let _ = writeln!(out, "Quiz Challenge                      score: {}", snapshot.score);
    let _ = writeln!(out, "{}", progress_bar(snapshot.progress_percent));
}

fn render_question(out: &mut String, snapshot: &QuizSnapshot) {
    render_header(out, snapshot);
    let Some(question) = &snapshot.question else {
        return;
    };
    let _ = writeln!(out, "Question {} of {}", snapshot.index + 1, snapshot.total);
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", question.prompt());

    let selected = snapshot.selected.as_ref().map(|option| option.id);
    for (i, option) in question.options().iter().enumerate() {
        let marker = match selected {
            Some(_) if option.is_correct => "✓",
            Some(id) if id == option.id => "✗",
            _ => " ",
        };
        let _ = writeln!(out, " {marker} {}) {}", i + 1, option.text);
    }

    let _ = writeln!(out);
    if snapshot.is_answer_locked() {
        out.push_str("...\n");
    } else if snapshot.can_go_back {
        out.push_str("[1-9] answer  [b] previous question  [r] reset  [q] quit\n");
    } else {
        out.push_str("[1-9] answer  [r] reset  [q] quit\n");
    }
}

fn render_completion(
    out: &mut String,
    snapshot: &QuizSnapshot,
    summary: Option<&CompletionSummary>,
) {
    render_header(out, snapshot);
    out.push_str("Quiz Completed!\n");
    let _ = writeln!(
        out,
        "You scored {} out of {}",
        snapshot.score, snapshot.total
    );
    if let Some(summary) = summary {
        let _ = writeln!(out, "Time taken: {}s", summary.elapsed().num_seconds());
    }
    let _ = writeln!(out);
    if snapshot.can_go_back {
        out.push_str("[r] try again  [b] review previous question  [q] quit\n");
    } else {
        out.push_str("[r] try again  [q] quit\n");
    }
}
