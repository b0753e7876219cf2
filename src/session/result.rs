use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::scoring;
use crate::engine::state::SessionState;
use crate::engine::tier::DifficultyTier;
use crate::session::answer::AnswerEvent;

/// Frozen outcome of a test attempt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    pub total_questions: u32,
    pub planned_questions: usize,
    pub correct_count: u32,
    pub wrong_count: u32,
    pub total_score: i32,
    pub final_tier: DifficultyTier,
    pub max_tier_reached: DifficultyTier,
    pub tier_progression: Vec<DifficultyTier>,
    pub success_rate: f64,
    pub average_score: f64,
    #[serde(default)]
    pub ended_early: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(default)]
    pub history: Vec<AnswerEvent>,
}

impl TestSummary {
    pub fn from_session(
        state: &SessionState,
        history: &[AnswerEvent],
        planned_questions: usize,
        session_token: Option<&str>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let answered = state.answered_count();
        Self {
            session_token: session_token.map(str::to_string),
            total_questions: answered,
            planned_questions,
            correct_count: state.correct_count,
            wrong_count: state.wrong_count,
            total_score: state.total_score,
            final_tier: state.current_tier,
            max_tier_reached: state.max_tier_reached,
            tier_progression: state.tier_progression.clone(),
            success_rate: scoring::success_rate(state.correct_count, answered),
            average_score: scoring::average_score(state.total_score, answered),
            ended_early: (answered as usize) < planned_questions,
            started_at,
            finished_at: Utc::now(),
            history: history.to_vec(),
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    pub fn performance_label(&self) -> &'static str {
        scoring::performance_label(self.success_rate)
    }
}
