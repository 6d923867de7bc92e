mod controller;
mod snapshot;

pub use controller::{ControllerSettings, QuizController};
pub use snapshot::{EmptyReason, QuizPhase, QuizSnapshot};
