use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Question difficulty, ordered from easiest to hardest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DifficultyTier {
    #[default]
    Easy,
    Medium,
    Hard,
    Expert,
}

pub const ALL_TIERS: &[DifficultyTier] = &[
    DifficultyTier::Easy,
    DifficultyTier::Medium,
    DifficultyTier::Hard,
    DifficultyTier::Expert,
];

impl DifficultyTier {
    pub fn as_str(self) -> &'static str {
        match self {
            DifficultyTier::Easy => "Easy",
            DifficultyTier::Medium => "Medium",
            DifficultyTier::Hard => "Hard",
            DifficultyTier::Expert => "Expert",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Successor tier, clamped at Expert.
    pub fn next(self) -> Self {
        ALL_TIERS
            .get(self.index() + 1)
            .copied()
            .unwrap_or(self)
    }

    /// Predecessor tier, clamped at Easy.
    pub fn previous(self) -> Self {
        match self.index() {
            0 => self,
            i => ALL_TIERS[i - 1],
        }
    }

    pub fn is_top(self) -> bool {
        self == DifficultyTier::Expert
    }

    pub fn is_bottom(self) -> bool {
        self == DifficultyTier::Easy
    }

    /// Maps a numeric problem rating onto a tier.
    pub fn from_rating(rating: Option<u32>) -> Self {
        match rating {
            None => DifficultyTier::Easy,
            Some(r) if r <= 800 => DifficultyTier::Easy,
            Some(r) if r <= 1200 => DifficultyTier::Medium,
            Some(r) if r <= 1900 => DifficultyTier::Hard,
            Some(_) => DifficultyTier::Expert,
        }
    }
}

impl fmt::Display for DifficultyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown difficulty tier: {0}")]
pub struct ParseTierError(pub String);

impl FromStr for DifficultyTier {
    type Err = ParseTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(DifficultyTier::Easy),
            "medium" => Ok(DifficultyTier::Medium),
            "hard" => Ok(DifficultyTier::Hard),
            "expert" => Ok(DifficultyTier::Expert),
            _ => Err(ParseTierError(s.to_string())),
        }
    }
}
