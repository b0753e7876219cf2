use std::cmp::Ordering;
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::{Config, GeneratorKind};
use crate::engine::controller::{AnswerOutcome, DifficultyController};
use crate::engine::state::TierChange;
use crate::error::ControllerError;
use crate::generator::bank_source::BankContentSource;
use crate::generator::problem_bank::ProblemBank;
use crate::generator::templates::TemplateMcqGenerator;
use crate::generator::{ContentSource, McqGenerator, Question};
use crate::session::answer::AnswerEvent;
use crate::session::cursor::QuestionCursor;
use crate::session::result::TestSummary;
use crate::session::token::SessionToken;
use crate::store::json_store::JsonStore;

pub type BoxedSource = Box<dyn ContentSource>;

/// One test attempt plus the pieces around it: configuration, navigation
/// and result history.
pub struct App {
    pub config: Config,
    pub controller: DifficultyController<BoxedSource>,
    pub cursor: QuestionCursor,
    store: Option<JsonStore>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let source = build_source(&config)?;
        let store = if config.save_history {
            match JsonStore::new() {
                Ok(store) => Some(store),
                Err(e) => {
                    warn!(error = %e, "test history disabled");
                    None
                }
            }
        } else {
            None
        };
        Ok(Self::with_parts(config, source, store))
    }

    pub fn with_parts(config: Config, source: BoxedSource, store: Option<JsonStore>) -> Self {
        let cursor = QuestionCursor::new(config.question_count);
        Self {
            config,
            controller: DifficultyController::new(source),
            cursor,
            store,
        }
    }

    /// Starts a fresh attempt with a new session token.
    pub fn start(&mut self) -> Result<&Question, ControllerError> {
        self.cursor = QuestionCursor::new(self.config.question_count);
        let token = SessionToken::generate();
        self.controller.start(self.config.test_config(), Some(token))
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.controller.question(self.cursor.index)
    }

    /// Answers the question under the cursor by option position and moves
    /// the cursor onto the freshly issued question.
    pub fn submit(&mut self, option: usize) -> Result<AnswerOutcome, ControllerError> {
        let result = self.controller.record_choice(self.cursor.index, option);
        // The answer may have been committed even when the follow-up fetch failed.
        if let Ok(AnswerOutcome {
            next_question: Some(_),
            ..
        }) = &result
        {
            self.cursor.jump_to_latest(self.controller.questions().len());
        }
        result
    }

    /// Retries fetching after a content failure and moves onto the question.
    pub fn retry_next(&mut self) -> Result<&Question, ControllerError> {
        let index = self.controller.request_next_question()?;
        self.cursor.jump_to_latest(index + 1);
        Ok(&self.controller.questions()[index])
    }

    /// The most recent answer and the tier move it caused. Covers answers
    /// whose follow-up fetch failed, which return no [`AnswerOutcome`].
    pub fn last_answer(&self) -> Option<(&AnswerEvent, TierChange)> {
        let event = self.controller.history().last()?;
        let from = event.difficulty_at_time;
        let to = self.controller.current_tier();
        let change = match to.cmp(&from) {
            Ordering::Greater => TierChange::Promoted { from, to },
            Ordering::Less => TierChange::Demoted { from, to },
            Ordering::Equal => TierChange::Held(to),
        };
        Some((event, change))
    }

    pub fn previous(&mut self) -> bool {
        self.cursor.previous()
    }

    pub fn next(&mut self) -> bool {
        self.cursor.next(self.controller.questions().len())
    }

    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        let limit = self.config.time_limit_minutes as i64 * 60;
        let elapsed = (now - self.controller.started_at()).num_seconds();
        (limit - elapsed).max(0)
    }

    pub fn is_time_up(&self, now: DateTime<Utc>) -> bool {
        self.remaining_secs(now) == 0
    }

    /// Freezes the attempt and appends it to the history once. A failed
    /// history write is logged; the summary is returned regardless.
    pub fn finish(&mut self) -> TestSummary {
        let already_finished = self.controller.is_completed();
        let summary = self.controller.finish().clone();
        if let Some(store) = &self.store {
            let recorded = store
                .load_history()
                .results
                .iter()
                .any(|r| r.session_token == summary.session_token && r.started_at == summary.started_at);
            if !recorded {
                match store.append_result(&summary) {
                    Ok(()) => info!(already_finished, "saved test result"),
                    Err(e) => warn!(error = %e, "could not save test result to history"),
                }
            }
        }
        summary
    }

    pub fn history(&self) -> Vec<TestSummary> {
        self.store
            .as_ref()
            .map(|s| s.load_history().results)
            .unwrap_or_default()
    }
}

pub fn load_bank(path: Option<&str>) -> Result<ProblemBank> {
    match path {
        Some(p) => ProblemBank::from_path(Path::new(p)),
        None => Ok(ProblemBank::bundled()),
    }
}

pub fn build_source(config: &Config) -> Result<BoxedSource> {
    let bank = load_bank(config.problem_bank_path.as_deref())?;
    info!(problems = bank.len(), generator = ?config.generator, "loaded problem bank");
    match config.generator {
        GeneratorKind::Template => Ok(boxed(BankContentSource::new(
            bank,
            TemplateMcqGenerator::new(),
        ))),
        #[cfg(feature = "network")]
        GeneratorKind::Ollama => Ok(boxed(BankContentSource::new(
            bank,
            crate::generator::ollama::OllamaMcqGenerator::new(
                &config.ollama_url,
                &config.ollama_model,
                config.ollama_timeout_secs,
            ),
        ))),
        #[cfg(not(feature = "network"))]
        GeneratorKind::Ollama => anyhow::bail!("built without network support; use the template generator"),
    }
}

fn boxed<G: McqGenerator + 'static>(source: BankContentSource<G>) -> BoxedSource {
    info!(generator = source.generator_name(), "question generator ready");
    Box::new(source)
}

/// `MM:SS`
pub fn format_clock(secs: i64) -> String {
    let secs = secs.max(0);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
