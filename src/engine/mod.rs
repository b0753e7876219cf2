pub mod controller;
pub mod scoring;
pub mod state;
pub mod tier;

pub use controller::{AnswerOutcome, DifficultyController, SessionStatus, TestConfig};
pub use state::{SessionState, TierChange};
pub use tier::DifficultyTier;
