use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::engine::tier::DifficultyTier;
use crate::error::ContentError;
use crate::generator::problem_bank::ProblemBank;
use crate::generator::{ContentSource, McqGenerator, Question};
use crate::session::token::SessionToken;

/// Picks a random problem of the requested tier and turns it into a question.
pub struct BankContentSource<G> {
    bank: ProblemBank,
    generator: G,
    rng: SmallRng,
}

impl<G: McqGenerator> BankContentSource<G> {
    pub fn new(bank: ProblemBank, generator: G) -> Self {
        Self {
            bank,
            generator,
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_rng(bank: ProblemBank, generator: G, rng: SmallRng) -> Self {
        Self {
            bank,
            generator,
            rng,
        }
    }

    pub fn bank(&self) -> &ProblemBank {
        &self.bank
    }

    pub fn generator_name(&self) -> &'static str {
        self.generator.name()
    }
}

impl<G: McqGenerator> ContentSource for BankContentSource<G> {
    fn request_question(
        &mut self,
        tier: DifficultyTier,
        token: Option<&SessionToken>,
    ) -> Result<Question, ContentError> {
        let problem = self
            .bank
            .pick(tier, &mut self.rng)
            .ok_or(ContentError::NoProblems(tier))?;
        let mcq = self.generator.generate(problem, token);
        Question::new(problem.title(), tier, mcq)
    }
}
