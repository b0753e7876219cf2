use thiserror::Error;

use crate::engine::tier::DifficultyTier;

/// Errors returned by a content source when it cannot hand out a question.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentError {
    #[error("no problems available for {0} difficulty")]
    NoProblems(DifficultyTier),
    #[error("question for \"{title}\" has no option matching its correct answer")]
    MissingCorrectOption { title: String },
    #[error("question for \"{title}\" has no options")]
    NoOptions { title: String },
}

/// Errors returned by the difficulty controller.
///
/// Every variant leaves the session state consistent; rejections happen
/// before any mutation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ControllerError {
    #[error("content unavailable for {tier} difficulty: {source}")]
    ContentUnavailable {
        tier: DifficultyTier,
        #[source]
        source: ContentError,
    },
    #[error("question {index} was never issued ({issued} issued so far)")]
    InvalidAnswerIndex { index: usize, issued: usize },
    #[error("question {0} has already been answered")]
    AlreadyAnswered(usize),
    #[error("option {option} is out of range for question {index}")]
    InvalidOptionIndex { index: usize, option: usize },
    #[error("test session has already completed")]
    SessionCompleted,
    #[error("test session has not been started")]
    NotStarted,
    #[error("invalid test configuration: {0}")]
    InvalidConfig(&'static str),
}
