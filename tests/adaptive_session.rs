use rand::SeedableRng;
use rand::rngs::SmallRng;
use tempfile::TempDir;

use prepai::engine::controller::{DifficultyController, SessionStatus, TestConfig};
use prepai::engine::state::TierChange;
use prepai::engine::tier::DifficultyTier;
use prepai::error::{ContentError, ControllerError};
use prepai::generator::bank_source::BankContentSource;
use prepai::generator::problem_bank::ProblemBank;
use prepai::generator::templates::TemplateMcqGenerator;
use prepai::generator::{ContentSource, Mcq, McqMetadata, Question};
use prepai::session::token::SessionToken;
use prepai::store::json_store::JsonStore;

/// Two-option questions where the second option is always right. Remembers
/// the tokens it was handed.
#[derive(Default)]
struct EchoSource {
    tokens: Vec<Option<String>>,
    unavailable: Vec<DifficultyTier>,
}

impl ContentSource for EchoSource {
    fn request_question(
        &mut self,
        tier: DifficultyTier,
        token: Option<&SessionToken>,
    ) -> Result<Question, ContentError> {
        self.tokens.push(token.map(|t| t.as_str().to_string()));
        if self.unavailable.contains(&tier) {
            return Err(ContentError::NoProblems(tier));
        }
        let mcq = Mcq {
            question: format!("Pick the right one ({tier})"),
            options: vec!["no".to_string(), "yes".to_string()],
            correct_answer: "yes".to_string(),
            explanation: String::new(),
            metadata: McqMetadata::default(),
        };
        Question::new("Echo", tier, mcq)
    }
}

fn controller(count: usize, start: DifficultyTier) -> DifficultyController<EchoSource> {
    let mut ctl = DifficultyController::new(EchoSource::default());
    ctl.start(
        TestConfig {
            question_count: count,
            starting_tier: start,
            time_limit_minutes: 45,
        },
        Some(SessionToken::from_string("session_1700000000000_abc123xyz")),
    )
    .unwrap();
    ctl
}

fn answer(ctl: &mut DifficultyController<EchoSource>, correct: bool) -> TierChange {
    let index = ctl.pending_question().unwrap();
    ctl.record_answer(index, if correct { "yes" } else { "no" })
        .unwrap()
        .change
}

#[test]
fn two_correct_answers_promote_easy_to_medium() {
    let mut ctl = controller(12, DifficultyTier::Easy);
    answer(&mut ctl, true);
    answer(&mut ctl, true);
    let state = ctl.state();
    assert_eq!(state.current_tier, DifficultyTier::Medium);
    assert_eq!(state.consecutive_correct, 0);
    assert_eq!(state.max_tier_reached, DifficultyTier::Medium);
    assert_eq!(state.total_score, 2);
}

#[test]
fn wrong_answer_demotes_medium_to_easy() {
    let mut ctl = controller(12, DifficultyTier::Easy);
    answer(&mut ctl, true);
    answer(&mut ctl, true);
    let change = answer(&mut ctl, false);
    assert_eq!(
        change,
        TierChange::Demoted {
            from: DifficultyTier::Medium,
            to: DifficultyTier::Easy
        }
    );
    assert_eq!(ctl.state().total_score, 1);
    assert_eq!(ctl.state().wrong_count, 1);
    assert_eq!(ctl.state().max_tier_reached, DifficultyTier::Medium);
}

#[test]
fn finish_without_answers_reports_zero_rates() {
    let mut ctl = controller(12, DifficultyTier::Easy);
    let summary = ctl.finish();
    assert_eq!(summary.success_rate, 0.0);
    assert_eq!(summary.average_score, 0.0);
    assert_eq!(summary.total_questions, 0);
}

#[test]
fn right_then_wrong_at_easy_stays_easy() {
    let mut ctl = controller(12, DifficultyTier::Easy);
    answer(&mut ctl, true);
    assert_eq!(answer(&mut ctl, false), TierChange::Held(DifficultyTier::Easy));
    assert_eq!(ctl.current_tier(), DifficultyTier::Easy);
    assert_eq!(ctl.total_score(), 0);
    assert_eq!(ctl.state().consecutive_correct, 0);
}

#[test]
fn expert_is_a_ceiling_and_streak_keeps_counting() {
    let mut ctl = controller(12, DifficultyTier::Hard);
    answer(&mut ctl, true);
    answer(&mut ctl, true);
    assert_eq!(ctl.current_tier(), DifficultyTier::Expert);
    answer(&mut ctl, true);
    assert_eq!(answer(&mut ctl, true), TierChange::Held(DifficultyTier::Expert));
    assert_eq!(ctl.state().consecutive_correct, 2);
    answer(&mut ctl, true);
    assert_eq!(ctl.state().consecutive_correct, 3);
    assert_eq!(ctl.state().max_tier_reached, DifficultyTier::Expert);
}

#[test]
fn token_is_passed_through_to_every_request() {
    let mut ctl = controller(4, DifficultyTier::Easy);
    answer(&mut ctl, true);
    answer(&mut ctl, false);
    let tokens = &ctl.source().tokens;
    assert_eq!(tokens.len(), 3);
    assert!(
        tokens
            .iter()
            .all(|t| t.as_deref() == Some("session_1700000000000_abc123xyz"))
    );
}

#[test]
fn tier_committed_before_failed_fetch() {
    let mut ctl = controller(12, DifficultyTier::Easy);
    ctl.source_mut().unavailable.push(DifficultyTier::Medium);
    answer(&mut ctl, true);

    let err = ctl.record_answer(1, "yes").unwrap_err();
    assert!(matches!(
        err,
        ControllerError::ContentUnavailable {
            tier: DifficultyTier::Medium,
            ..
        }
    ));
    assert_eq!(ctl.current_tier(), DifficultyTier::Medium);
    assert_eq!(ctl.total_score(), 2);

    ctl.source_mut().unavailable.clear();
    let index = ctl.request_next_question().unwrap();
    assert_eq!(ctl.question(index).unwrap().tier, DifficultyTier::Medium);
}

#[test]
fn bundled_bank_run_tracks_tiers_and_persists_summary() {
    let source = BankContentSource::with_rng(
        ProblemBank::bundled(),
        TemplateMcqGenerator::deterministic(),
        SmallRng::seed_from_u64(42),
    );
    let mut ctl = DifficultyController::new(source);
    ctl.start(
        TestConfig {
            question_count: 5,
            ..TestConfig::default()
        },
        Some(SessionToken::generate()),
    )
    .unwrap();

    // right, right, wrong, right, right
    for correct in [true, true, false, true, true] {
        let index = ctl.pending_question().unwrap();
        let question = ctl.question(index).unwrap();
        assert_eq!(question.tier, ctl.current_tier());
        let option = question
            .options()
            .iter()
            .position(|o| (o == question.correct_answer()) == correct)
            .unwrap();
        ctl.record_choice(index, option).unwrap();
    }

    assert_eq!(ctl.status(), SessionStatus::Completed);
    assert_eq!(ctl.current_tier(), DifficultyTier::Medium);
    assert_eq!(
        ctl.tier_progression(),
        &[
            DifficultyTier::Easy,
            DifficultyTier::Medium,
            DifficultyTier::Easy,
            DifficultyTier::Medium,
        ]
    );

    let summary = ctl.finish().clone();
    assert_eq!(summary.total_score, 3);
    assert_eq!(summary.correct_count, 4);
    assert!((summary.success_rate - 80.0).abs() < 1e-9);
    assert!((summary.average_score - 0.6).abs() < 1e-9);
    assert!(!summary.ended_early);
    assert_eq!(summary.history.len(), 5);

    let dir = TempDir::new().unwrap();
    let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
    store.append_result(&summary).unwrap();
    let history = store.load_history();
    assert_eq!(history.results, vec![summary]);
}
