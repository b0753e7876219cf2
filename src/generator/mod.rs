pub mod bank_source;
#[cfg(feature = "network")]
pub mod ollama;
pub mod problem_bank;
pub mod templates;

use serde::{Deserialize, Serialize};

use crate::engine::tier::DifficultyTier;
use crate::error::ContentError;
use crate::generator::problem_bank::Problem;
use crate::session::token::SessionToken;

/// A multiple-choice question as produced by a generator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mcq {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
    #[serde(default)]
    pub metadata: McqMetadata,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct McqMetadata {
    pub generator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_seed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_size: Option<usize>,
}

/// A question issued to a test taker, tagged with the tier it was requested at.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub problem_title: String,
    pub tier: DifficultyTier,
    pub mcq: Mcq,
}

impl Question {
    /// Builds a question, rejecting MCQs whose correct answer is not one of
    /// the options.
    pub fn new(problem_title: &str, tier: DifficultyTier, mcq: Mcq) -> Result<Self, ContentError> {
        if mcq.options.is_empty() {
            return Err(ContentError::NoOptions {
                title: problem_title.to_string(),
            });
        }
        if !mcq.options.iter().any(|o| *o == mcq.correct_answer) {
            return Err(ContentError::MissingCorrectOption {
                title: problem_title.to_string(),
            });
        }
        Ok(Self {
            problem_title: problem_title.to_string(),
            tier,
            mcq,
        })
    }

    pub fn text(&self) -> &str {
        &self.mcq.question
    }

    pub fn options(&self) -> &[String] {
        &self.mcq.options
    }

    pub fn correct_answer(&self) -> &str {
        &self.mcq.correct_answer
    }

    pub fn explanation(&self) -> &str {
        &self.mcq.explanation
    }

    /// Correctness is decided by option text, never by position.
    pub fn is_correct(&self, selected: &str) -> bool {
        selected == self.mcq.correct_answer
    }
}

/// Supplies the next question for a tier.
///
/// The token lets a source vary its selection per test attempt; it has no
/// effect on the controller.
pub trait ContentSource {
    fn request_question(
        &mut self,
        tier: DifficultyTier,
        token: Option<&SessionToken>,
    ) -> Result<Question, ContentError>;
}

/// Turns a problem into a multiple-choice question.
pub trait McqGenerator {
    fn name(&self) -> &'static str;

    fn generate(&mut self, problem: &Problem, token: Option<&SessionToken>) -> Mcq;
}

impl<S: ContentSource + ?Sized> ContentSource for Box<S> {
    fn request_question(
        &mut self,
        tier: DifficultyTier,
        token: Option<&SessionToken>,
    ) -> Result<Question, ContentError> {
        (**self).request_question(tier, token)
    }
}

impl<G: McqGenerator + ?Sized> McqGenerator for Box<G> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn generate(&mut self, problem: &Problem, token: Option<&SessionToken>) -> Mcq {
        (**self).generate(problem, token)
    }
}
