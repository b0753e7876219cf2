use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::engine::state::{PROMOTION_STREAK, SessionState, TierChange};
use crate::engine::tier::DifficultyTier;
use crate::error::ControllerError;
use crate::generator::{ContentSource, Question};
use crate::session::answer::AnswerEvent;
use crate::session::result::TestSummary;
use crate::session::token::SessionToken;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestConfig {
    pub question_count: usize,
    pub starting_tier: DifficultyTier,
    /// Informational; enforced by the caller's countdown.
    pub time_limit_minutes: u32,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            question_count: 12,
            starting_tier: DifficultyTier::Easy,
            time_limit_minutes: 45,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    InProgress,
    Completed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnswerOutcome {
    pub event: AnswerEvent,
    pub change: TierChange,
    /// Index of the freshly issued question, or `None` when this answer
    /// completed the session.
    pub next_question: Option<usize>,
}

/// Drives one adaptive test attempt against a content source.
pub struct DifficultyController<S> {
    source: S,
    config: TestConfig,
    token: Option<SessionToken>,
    state: SessionState,
    questions: Vec<Question>,
    history: Vec<AnswerEvent>,
    status: SessionStatus,
    started_at: DateTime<Utc>,
    summary: Option<TestSummary>,
}

impl<S: ContentSource> DifficultyController<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            config: TestConfig::default(),
            token: None,
            state: SessionState::default(),
            questions: Vec::new(),
            history: Vec::new(),
            status: SessionStatus::Idle,
            started_at: Utc::now(),
            summary: None,
        }
    }

    /// Resets the session and requests the first question at the starting
    /// tier.
    ///
    /// If the source has nothing to offer the session is still started; the
    /// caller may retry with [`Self::request_next_question`].
    pub fn start(
        &mut self,
        config: TestConfig,
        token: Option<SessionToken>,
    ) -> Result<&Question, ControllerError> {
        if config.question_count == 0 {
            return Err(ControllerError::InvalidConfig(
                "question count must be positive",
            ));
        }

        info!(
            count = config.question_count,
            start = %config.starting_tier,
            session = token.as_ref().map(SessionToken::as_str).unwrap_or("-"),
            "starting adaptive test"
        );

        self.state = SessionState::new(config.starting_tier);
        self.config = config;
        self.token = token;
        self.questions.clear();
        self.history.clear();
        self.status = SessionStatus::InProgress;
        self.started_at = Utc::now();
        self.summary = None;

        let index = self.fetch_next()?;
        Ok(&self.questions[index])
    }

    /// Records the chosen option text for an issued question.
    ///
    /// Score and tier changes are committed before the next question is
    /// requested, so a `ContentUnavailable` error here means the answer
    /// counted but no follow-up question was issued.
    pub fn record_answer(
        &mut self,
        question_index: usize,
        selected: &str,
    ) -> Result<AnswerOutcome, ControllerError> {
        self.check_answerable(question_index)?;

        let is_correct = self.questions[question_index].is_correct(selected);
        let (next_state, change) = self.state.apply(is_correct);
        let event = AnswerEvent::new(question_index, selected, is_correct, self.state.current_tier);

        self.state = next_state;
        self.history.push(event.clone());

        debug!(
            question = question_index,
            correct = is_correct,
            score = self.state.total_score,
            "answer recorded"
        );
        match change {
            TierChange::Promoted { from, to } => info!(
                %from,
                %to,
                "difficulty increased after {PROMOTION_STREAK} consecutive correct answers"
            ),
            TierChange::Demoted { from, to } => {
                info!(%from, %to, "difficulty decreased after wrong answer")
            }
            TierChange::Held(tier) => debug!(
                %tier,
                streak = self.state.consecutive_correct,
                "difficulty unchanged"
            ),
        }

        if self.state.answered_count() as usize >= self.config.question_count {
            self.status = SessionStatus::Completed;
            info!(
                answered = self.state.answered_count(),
                "planned question count reached"
            );
            return Ok(AnswerOutcome {
                event,
                change,
                next_question: None,
            });
        }

        let next = self.fetch_next()?;
        Ok(AnswerOutcome {
            event,
            change,
            next_question: Some(next),
        })
    }

    /// Answers by option position; the option text decides correctness.
    pub fn record_choice(
        &mut self,
        question_index: usize,
        option: usize,
    ) -> Result<AnswerOutcome, ControllerError> {
        self.check_answerable(question_index)?;
        let selected = self.questions[question_index]
            .options()
            .get(option)
            .cloned()
            .ok_or(ControllerError::InvalidOptionIndex {
                index: question_index,
                option,
            })?;
        self.record_answer(question_index, &selected)
    }

    /// Returns the unanswered question if one is outstanding, otherwise asks
    /// the source for a new one at the current tier.
    pub fn request_next_question(&mut self) -> Result<usize, ControllerError> {
        match self.status {
            SessionStatus::Idle => return Err(ControllerError::NotStarted),
            SessionStatus::Completed => return Err(ControllerError::SessionCompleted),
            SessionStatus::InProgress => {}
        }
        if let Some(pending) = self.pending_question() {
            return Ok(pending);
        }
        self.fetch_next()
    }

    /// Ends the session and returns its summary. Later calls return the
    /// same summary.
    pub fn finish(&mut self) -> &TestSummary {
        let summary = match self.summary.take() {
            Some(summary) => summary,
            None => {
                self.status = SessionStatus::Completed;
                let summary = TestSummary::from_session(
                    &self.state,
                    &self.history,
                    self.config.question_count,
                    self.token.as_ref().map(SessionToken::as_str),
                    self.started_at,
                );
                info!(
                    answered = summary.total_questions,
                    score = summary.total_score,
                    final_tier = %summary.final_tier,
                    max_tier = %summary.max_tier_reached,
                    ended_early = summary.ended_early,
                    "test finished"
                );
                summary
            }
        };
        self.summary.insert(summary)
    }

    fn check_answerable(&self, question_index: usize) -> Result<(), ControllerError> {
        match self.status {
            SessionStatus::Idle => return Err(ControllerError::NotStarted),
            SessionStatus::Completed => return Err(ControllerError::SessionCompleted),
            SessionStatus::InProgress => {}
        }
        if question_index >= self.questions.len() {
            return Err(ControllerError::InvalidAnswerIndex {
                index: question_index,
                issued: self.questions.len(),
            });
        }
        if self.is_answered(question_index) {
            return Err(ControllerError::AlreadyAnswered(question_index));
        }
        Ok(())
    }

    fn fetch_next(&mut self) -> Result<usize, ControllerError> {
        let tier = self.state.current_tier;
        match self.source.request_question(tier, self.token.as_ref()) {
            Ok(question) => {
                self.questions.push(question);
                let index = self.questions.len() - 1;
                debug!(%tier, index, "issued question");
                Ok(index)
            }
            Err(source) => {
                warn!(%tier, error = %source, "content source could not supply a question");
                Err(ControllerError::ContentUnavailable { tier, source })
            }
        }
    }
}

impl<S> DifficultyController<S> {
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn current_tier(&self) -> DifficultyTier {
        self.state.current_tier
    }

    pub fn total_score(&self) -> i32 {
        self.state.total_score
    }

    pub fn tier_progression(&self) -> &[DifficultyTier] {
        &self.state.tier_progression
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn history(&self) -> &[AnswerEvent] {
        &self.history
    }

    pub fn answer_for(&self, question_index: usize) -> Option<&AnswerEvent> {
        self.history
            .iter()
            .find(|e| e.question_index == question_index)
    }

    pub fn is_answered(&self, question_index: usize) -> bool {
        self.answer_for(question_index).is_some()
    }

    pub fn pending_question(&self) -> Option<usize> {
        let last = self.questions.len().checked_sub(1)?;
        (!self.is_answered(last)).then_some(last)
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::error::ContentError;
    use crate::generator::{Mcq, McqMetadata};

    const RIGHT: &str = "right";
    const WRONG: &str = "wrong";

    /// Hands out one question per request and records the requested tiers.
    #[derive(Default)]
    struct ScriptedSource {
        requested: Vec<DifficultyTier>,
        failures: VecDeque<bool>,
    }

    impl ScriptedSource {
        fn failing_on(pattern: &[bool]) -> Self {
            Self {
                requested: Vec::new(),
                failures: pattern.iter().copied().collect(),
            }
        }
    }

    impl ContentSource for ScriptedSource {
        fn request_question(
            &mut self,
            tier: DifficultyTier,
            _token: Option<&SessionToken>,
        ) -> Result<Question, ContentError> {
            self.requested.push(tier);
            if self.failures.pop_front().unwrap_or(false) {
                return Err(ContentError::NoProblems(tier));
            }
            let mcq = Mcq {
                question: format!("{tier} question"),
                options: vec![WRONG.to_string(), RIGHT.to_string()],
                correct_answer: RIGHT.to_string(),
                explanation: String::new(),
                metadata: McqMetadata::default(),
            };
            Ok(Question::new("Scripted", tier, mcq).unwrap())
        }
    }

    fn started(count: usize) -> DifficultyController<ScriptedSource> {
        let mut ctl = DifficultyController::new(ScriptedSource::default());
        let config = TestConfig {
            question_count: count,
            ..TestConfig::default()
        };
        ctl.start(config, None).unwrap();
        ctl
    }

    fn answer(ctl: &mut DifficultyController<ScriptedSource>, correct: bool) -> AnswerOutcome {
        let index = ctl.pending_question().unwrap();
        ctl.record_answer(index, if correct { RIGHT } else { WRONG })
            .unwrap()
    }

    #[test]
    fn test_start_requests_first_question_at_starting_tier() {
        let mut ctl = DifficultyController::new(ScriptedSource::default());
        let config = TestConfig {
            question_count: 5,
            starting_tier: DifficultyTier::Hard,
            time_limit_minutes: 10,
        };
        let first = ctl.start(config, None).unwrap();
        assert_eq!(first.tier, DifficultyTier::Hard);
        assert_eq!(ctl.status(), SessionStatus::InProgress);
        assert_eq!(ctl.state().max_tier_reached, DifficultyTier::Hard);
        assert_eq!(ctl.tier_progression(), &[DifficultyTier::Hard]);
    }

    #[test]
    fn test_start_rejects_zero_questions() {
        let mut ctl = DifficultyController::new(ScriptedSource::default());
        let config = TestConfig {
            question_count: 0,
            ..TestConfig::default()
        };
        assert!(matches!(
            ctl.start(config, None),
            Err(ControllerError::InvalidConfig(_))
        ));
        assert_eq!(ctl.status(), SessionStatus::Idle);
    }

    #[test]
    fn test_next_question_requested_at_new_tier() {
        let mut ctl = started(10);
        answer(&mut ctl, true);
        let outcome = answer(&mut ctl, true);
        assert_eq!(
            outcome.change,
            TierChange::Promoted {
                from: DifficultyTier::Easy,
                to: DifficultyTier::Medium
            }
        );
        let next = outcome.next_question.unwrap();
        assert_eq!(ctl.question(next).unwrap().tier, DifficultyTier::Medium);
        assert_eq!(
            ctl.source().requested,
            vec![DifficultyTier::Easy, DifficultyTier::Easy, DifficultyTier::Medium]
        );
    }

    #[test]
    fn test_answer_event_records_tier_before_transition() {
        let mut ctl = started(10);
        answer(&mut ctl, true);
        let outcome = answer(&mut ctl, true);
        assert_eq!(outcome.event.difficulty_at_time, DifficultyTier::Easy);
        assert_eq!(outcome.event.score_change, 1);
    }

    #[test]
    fn test_invalid_index_rejected_without_mutation() {
        let mut ctl = started(10);
        let before = ctl.state().clone();
        let err = ctl.record_answer(3, RIGHT).unwrap_err();
        assert!(matches!(
            err,
            ControllerError::InvalidAnswerIndex { index: 3, issued: 1 }
        ));
        assert_eq!(ctl.state(), &before);
        assert!(ctl.history().is_empty());
    }

    #[test]
    fn test_reanswer_rejected_without_mutation() {
        let mut ctl = started(10);
        ctl.record_answer(0, RIGHT).unwrap();
        let before = ctl.state().clone();
        let err = ctl.record_answer(0, WRONG).unwrap_err();
        assert!(matches!(err, ControllerError::AlreadyAnswered(0)));
        assert_eq!(ctl.state(), &before);
        assert_eq!(ctl.history().len(), 1);
        assert_eq!(ctl.answer_for(0).unwrap().selected, RIGHT);
    }

    #[test]
    fn test_record_choice_uses_option_text() {
        let mut ctl = started(10);
        let outcome = ctl.record_choice(0, 1).unwrap();
        assert!(outcome.event.is_correct);
        assert!(matches!(
            ctl.record_choice(1, 9),
            Err(ControllerError::InvalidOptionIndex { index: 1, option: 9 })
        ));
    }

    #[test]
    fn test_reaching_question_count_completes_without_fetch() {
        let mut ctl = started(2);
        answer(&mut ctl, true);
        let outcome = answer(&mut ctl, false);
        assert_eq!(outcome.next_question, None);
        assert!(ctl.is_completed());
        assert_eq!(ctl.source().requested.len(), 2);
        assert!(matches!(
            ctl.record_answer(1, RIGHT),
            Err(ControllerError::SessionCompleted)
        ));
    }

    #[test]
    fn test_fetch_failure_keeps_committed_answer_and_allows_retry() {
        let mut ctl = DifficultyController::new(ScriptedSource::failing_on(&[false, true]));
        ctl.start(TestConfig::default(), None).unwrap();

        let err = ctl.record_answer(0, WRONG).unwrap_err();
        assert!(matches!(
            err,
            ControllerError::ContentUnavailable {
                tier: DifficultyTier::Easy,
                ..
            }
        ));
        assert_eq!(ctl.state().wrong_count, 1);
        assert_eq!(ctl.state().total_score, -1);
        assert_eq!(ctl.current_tier(), DifficultyTier::Easy);
        assert_eq!(ctl.questions().len(), 1);
        assert_eq!(ctl.pending_question(), None);

        let index = ctl.request_next_question().unwrap();
        assert_eq!(index, 1);
        // Outstanding question is handed back instead of fetching again.
        assert_eq!(ctl.request_next_question().unwrap(), 1);
        assert_eq!(ctl.source().requested.len(), 3);
    }

    #[test]
    fn test_start_failure_surfaces_content_unavailable() {
        let mut ctl = DifficultyController::new(ScriptedSource::failing_on(&[true]));
        let err = ctl.start(TestConfig::default(), None).unwrap_err();
        assert!(matches!(err, ControllerError::ContentUnavailable { .. }));
        assert!(ctl.questions().is_empty());
        assert_eq!(ctl.request_next_question().unwrap(), 0);
    }

    #[test]
    fn test_finish_is_idempotent() {
        let mut ctl = started(10);
        answer(&mut ctl, true);
        let first = ctl.finish().clone();
        assert!(first.ended_early);
        assert_eq!(first.total_questions, 1);
        let second = ctl.finish().clone();
        assert_eq!(first, second);
        assert!(matches!(
            ctl.record_answer(1, RIGHT),
            Err(ControllerError::SessionCompleted)
        ));
    }

    #[test]
    fn test_finish_with_no_answers() {
        let mut ctl = started(10);
        let summary = ctl.finish();
        assert_eq!(summary.total_questions, 0);
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.average_score, 0.0);
    }

    #[test]
    fn test_answer_before_start_rejected() {
        let mut ctl = DifficultyController::new(ScriptedSource::default());
        assert!(matches!(
            ctl.record_answer(0, RIGHT),
            Err(ControllerError::NotStarted)
        ));
        assert!(matches!(
            ctl.request_next_question(),
            Err(ControllerError::NotStarted)
        ));
    }

    #[test]
    fn test_restart_resets_session() {
        let mut ctl = started(10);
        answer(&mut ctl, true);
        answer(&mut ctl, true);
        ctl.finish();
        ctl.start(TestConfig::default(), Some(SessionToken::from_string("session_2_x")))
            .unwrap();
        assert_eq!(ctl.status(), SessionStatus::InProgress);
        assert_eq!(ctl.current_tier(), DifficultyTier::Easy);
        assert_eq!(ctl.total_score(), 0);
        assert!(ctl.history().is_empty());
        assert_eq!(ctl.questions().len(), 1);
        assert_eq!(ctl.token().unwrap().as_str(), "session_2_x");
    }
}
