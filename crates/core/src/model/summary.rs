use chrono::{DateTime, Duration, Utc};

/// Outcome of a completed pass through a quiz set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSummary {
    score: u32,
    total: usize,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

impl CompletionSummary {
    #[must_use]
    pub fn new(
        score: u32,
        total: usize,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            score,
            total,
            started_at,
            completed_at,
        }
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Wall time between start (or last reset) and completion, never negative.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        (self.completed_at - self.started_at).max(Duration::zero())
    }
}
