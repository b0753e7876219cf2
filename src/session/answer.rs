use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::tier::DifficultyTier;

/// One recorded answer. Appended to the session history and never changed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerEvent {
    pub question_index: usize,
    pub selected: String,
    pub is_correct: bool,
    pub score_change: i32,
    pub difficulty_at_time: DifficultyTier,
    pub timestamp: DateTime<Utc>,
}

impl AnswerEvent {
    pub fn new(
        question_index: usize,
        selected: &str,
        is_correct: bool,
        difficulty_at_time: DifficultyTier,
    ) -> Self {
        Self {
            question_index,
            selected: selected.to_string(),
            is_correct,
            score_change: if is_correct { 1 } else { -1 },
            difficulty_at_time,
            timestamp: Utc::now(),
        }
    }
}
