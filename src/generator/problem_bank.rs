use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rand::Rng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::engine::tier::{ALL_TIERS, DifficultyTier};

const BUNDLED_PROBLEMS: &str = include_str!("../../assets/problems.json");

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "difficulty_category")]
    pub difficulty: Option<DifficultyTier>,
    #[serde(default)]
    pub rating: Option<u32>,
}

impl Problem {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }

    /// Explicit category wins; otherwise derived from the numeric rating.
    pub fn tier(&self) -> DifficultyTier {
        self.difficulty
            .unwrap_or_else(|| DifficultyTier::from_rating(self.rating))
    }
}

/// Problems grouped by difficulty tier.
#[derive(Clone, Debug, Default)]
pub struct ProblemBank {
    by_tier: BTreeMap<DifficultyTier, Vec<Problem>>,
}

impl ProblemBank {
    pub fn new(problems: Vec<Problem>) -> Self {
        let mut by_tier: BTreeMap<DifficultyTier, Vec<Problem>> = BTreeMap::new();
        for problem in problems {
            by_tier.entry(problem.tier()).or_default().push(problem);
        }
        Self { by_tier }
    }

    pub fn bundled() -> Self {
        // The bundled asset is covered by tests; an unreadable copy yields an empty bank.
        Self::from_json(BUNDLED_PROBLEMS).unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let problems: Vec<Problem> =
            serde_json::from_str(json).context("problem bank is not a JSON array of problems")?;
        Ok(Self::new(problems))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading problem bank {}", path.display()))?;
        Self::from_json(&content)
    }

    pub fn problems(&self, tier: DifficultyTier) -> &[Problem] {
        self.by_tier.get(&tier).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn pick(&self, tier: DifficultyTier, rng: &mut SmallRng) -> Option<&Problem> {
        let problems = self.problems(tier);
        if problems.is_empty() {
            return None;
        }
        Some(&problems[rng.gen_range(0..problems.len())])
    }

    pub fn len(&self) -> usize {
        self.by_tier.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Problem count per tier, every tier included.
    pub fn counts(&self) -> Vec<(DifficultyTier, usize)> {
        ALL_TIERS
            .iter()
            .map(|&tier| (tier, self.problems(tier).len()))
            .collect()
    }
}
