use serde::{Deserialize, Serialize};

use crate::engine::tier::DifficultyTier;

/// Consecutive correct answers needed to move up one tier.
pub const PROMOTION_STREAK: u32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TierChange {
    Promoted {
        from: DifficultyTier,
        to: DifficultyTier,
    },
    Demoted {
        from: DifficultyTier,
        to: DifficultyTier,
    },
    Held(DifficultyTier),
}

impl TierChange {
    pub fn tier(self) -> DifficultyTier {
        match self {
            TierChange::Promoted { to, .. } | TierChange::Demoted { to, .. } => to,
            TierChange::Held(tier) => tier,
        }
    }
}

/// Adaptive difficulty state for one test attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub current_tier: DifficultyTier,
    pub consecutive_correct: u32,
    pub max_tier_reached: DifficultyTier,
    pub total_score: i32,
    pub correct_count: u32,
    pub wrong_count: u32,
    pub tier_progression: Vec<DifficultyTier>,
}

impl SessionState {
    pub fn new(starting_tier: DifficultyTier) -> Self {
        Self {
            current_tier: starting_tier,
            consecutive_correct: 0,
            max_tier_reached: starting_tier,
            total_score: 0,
            correct_count: 0,
            wrong_count: 0,
            tier_progression: vec![starting_tier],
        }
    }

    pub fn answered_count(&self) -> u32 {
        self.correct_count + self.wrong_count
    }

    /// Applies one answer and returns the resulting state.
    ///
    /// A correct answer extends the streak; reaching [`PROMOTION_STREAK`]
    /// below the top tier moves up a tier and clears it. At the top tier
    /// the streak keeps counting. A wrong
    /// answer clears the streak and moves down a tier unless already at
    /// the bottom. `self` is left untouched.
    pub fn apply(&self, is_correct: bool) -> (SessionState, TierChange) {
        let mut next = self.clone();
        let from = self.current_tier;
        let mut change = TierChange::Held(from);

        if is_correct {
            next.total_score += 1;
            next.correct_count += 1;
            next.consecutive_correct += 1;

            if next.consecutive_correct >= PROMOTION_STREAK && !from.is_top() {
                let to = from.next();
                next.consecutive_correct = 0;
                next.current_tier = to;
                next.max_tier_reached = next.max_tier_reached.max(to);
                next.tier_progression.push(to);
                change = TierChange::Promoted { from, to };
            }
        } else {
            next.total_score -= 1;
            next.wrong_count += 1;
            next.consecutive_correct = 0;

            if !from.is_bottom() {
                let to = from.previous();
                next.current_tier = to;
                next.tier_progression.push(to);
                change = TierChange::Demoted { from, to };
            }
        }

        (next, change)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(DifficultyTier::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tier::ALL_TIERS;

    fn run(start: DifficultyTier, answers: &[bool]) -> SessionState {
        answers
            .iter()
            .fold(SessionState::new(start), |state, &ok| state.apply(ok).0)
    }

    #[test]
    fn test_two_correct_promotes_easy_to_medium() {
        let state = run(DifficultyTier::Easy, &[true, true]);
        assert_eq!(state.current_tier, DifficultyTier::Medium);
        assert_eq!(state.consecutive_correct, 0);
        assert_eq!(state.max_tier_reached, DifficultyTier::Medium);
        assert_eq!(state.total_score, 2);
        assert_eq!(
            state.tier_progression,
            vec![DifficultyTier::Easy, DifficultyTier::Medium]
        );
    }

    #[test]
    fn test_wrong_demotes_medium_to_easy() {
        let state = run(DifficultyTier::Easy, &[true, true, false]);
        assert_eq!(state.current_tier, DifficultyTier::Easy);
        assert_eq!(state.total_score, 1);
        assert_eq!(state.wrong_count, 1);
        assert_eq!(state.max_tier_reached, DifficultyTier::Medium);
    }

    #[test]
    fn test_correct_then_wrong_stays_at_easy() {
        let state = run(DifficultyTier::Easy, &[true, false]);
        assert_eq!(state.current_tier, DifficultyTier::Easy);
        assert_eq!(state.total_score, 0);
        assert_eq!(state.consecutive_correct, 0);
        assert_eq!(state.tier_progression, vec![DifficultyTier::Easy]);
    }

    #[test]
    fn test_easy_is_floor_for_repeated_wrong() {
        let state = run(DifficultyTier::Easy, &[false; 5]);
        assert_eq!(state.current_tier, DifficultyTier::Easy);
        assert_eq!(state.total_score, -5);
        assert_eq!(state.tier_progression.len(), 1);
    }

    #[test]
    fn test_expert_is_ceiling_and_streak_keeps_counting() {
        let (state, change) = run(DifficultyTier::Expert, &[true]).apply(true);
        assert_eq!(change, TierChange::Held(DifficultyTier::Expert));
        assert_eq!(state.current_tier, DifficultyTier::Expert);
        assert_eq!(state.consecutive_correct, 2);

        let state = run(DifficultyTier::Expert, &[true; 3]);
        assert_eq!(state.consecutive_correct, 3);

        let state = run(DifficultyTier::Expert, &[true; 7]);
        assert_eq!(state.current_tier, DifficultyTier::Expert);
        assert_eq!(state.consecutive_correct, 7);
        assert_eq!(state.tier_progression, vec![DifficultyTier::Expert]);
    }

    #[test]
    fn test_streak_carried_at_expert_cleared_by_wrong_answer() {
        let state = run(DifficultyTier::Hard, &[true, true, true, true, true]);
        assert_eq!(state.current_tier, DifficultyTier::Expert);
        assert_eq!(state.consecutive_correct, 3);
        let (next, change) = state.apply(false);
        assert_eq!(
            change,
            TierChange::Demoted {
                from: DifficultyTier::Expert,
                to: DifficultyTier::Hard
            }
        );
        assert_eq!(next.consecutive_correct, 0);
    }

    #[test]
    fn test_single_wrong_demotes_exactly_once_from_every_non_bottom_tier() {
        for &tier in &ALL_TIERS[1..] {
            let mut state = SessionState::new(tier);
            state.consecutive_correct = 1;
            let (next, change) = state.apply(false);
            assert_eq!(change, TierChange::Demoted { from: tier, to: tier.previous() });
            assert_eq!(next.consecutive_correct, 0);
            assert_eq!(next.tier_progression.len(), 2);
        }
    }

    #[test]
    fn test_two_correct_promotes_exactly_once_from_every_non_top_tier() {
        for &tier in &ALL_TIERS[..3] {
            let (once, first) = SessionState::new(tier).apply(true);
            assert_eq!(first, TierChange::Held(tier));
            let (twice, second) = once.apply(true);
            assert_eq!(second, TierChange::Promoted { from: tier, to: tier.next() });
            assert_eq!(twice.consecutive_correct, 0);
        }
    }

    #[test]
    fn test_max_tier_monotonic_and_score_balance_over_mixed_sequences() {
        // Deterministic pseudo-random answer streams.
        for seed in 0u32..64 {
            let mut state = SessionState::new(ALL_TIERS[(seed % 4) as usize]);
            let mut x = seed.wrapping_mul(2654435761).wrapping_add(1);
            for _ in 0..40 {
                x ^= x << 13;
                x ^= x >> 17;
                x ^= x << 5;
                let before = state.max_tier_reached;
                state = state.apply(x % 3 != 0).0;
                assert!(state.max_tier_reached >= before);
                assert!(state.max_tier_reached >= state.current_tier);
                assert_eq!(
                    state.total_score,
                    state.correct_count as i32 - state.wrong_count as i32
                );
            }
        }
    }

    #[test]
    fn test_apply_leaves_input_untouched() {
        let state = SessionState::new(DifficultyTier::Hard);
        let snapshot = state.clone();
        let _ = state.apply(false);
        assert_eq!(state, snapshot);
    }
}
