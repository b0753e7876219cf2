use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::engine::tier::DifficultyTier;
use crate::generator::problem_bank::Problem;
use crate::generator::{Mcq, McqGenerator, McqMetadata};
use crate::session::token::SessionToken;

pub const GENERATOR_NAME: &str = "template";

/// Question template. `{title}` and `{difficulty}` are substituted at
/// generation time.
#[derive(Clone, Copy, Debug)]
pub struct Template {
    pub kind: &'static str,
    pub variant: &'static str,
    pub question: &'static str,
    pub options: [&'static str; 4],
    pub correct: &'static str,
    pub explanation: &'static str,
}

const CHANDU: &[Template] = &[
    Template {
        kind: "scheduling",
        variant: "A",
        question: "\"{title}\": Chandu has M events (1 ≤ M ≤ 10000), each with a start time, an end time and a priority. He wants the largest total priority of events that do not overlap. Which approach fits?",
        options: [
            "Weighted Activity Selection (DP)",
            "Sort by priority only",
            "Greedy by start time",
            "Random selection",
        ],
        correct: "Weighted Activity Selection (DP)",
        explanation: "Priorities make plain greedy selection wrong. Sort by end time and run a DP over the best compatible prefix.",
    },
    Template {
        kind: "matching",
        variant: "B",
        question: "In \"{title}\", Chandu pairs up 2N people (1 ≤ N ≤ 1000) using pairwise compatibility scores and wants the largest total. What is required?",
        options: [
            "Maximum Weight Perfect Matching",
            "Simple pairing by index",
            "Sort by individual scores",
            "Random pairing",
        ],
        correct: "Maximum Weight Perfect Matching",
        explanation: "This is a perfect matching in a weighted graph. The Hungarian algorithm or min-cost max-flow solves it.",
    },
    Template {
        kind: "greedy",
        variant: "C",
        question: "\"{title}\": Chandu plans T dates (1 ≤ T ≤ 50), each with a start and an end minute. He wants as many non-overlapping dates as possible. What is the greedy rule?",
        options: [
            "Sort by end time, select greedily",
            "Sort by start time",
            "Sort by duration",
            "Select randomly",
        ],
        correct: "Sort by end time, select greedily",
        explanation: "Classic activity selection: always take the compatible activity that finishes first.",
    },
    Template {
        kind: "knapsack",
        variant: "D",
        question: "In \"{title}\", Chandu has N gifts with values V[i] and weights W[i] and a bag of capacity C. He wants the most value. Which problem is this?",
        options: [
            "0/1 Knapsack Problem",
            "Fractional Knapsack",
            "Subset Sum",
            "Coin Change",
        ],
        correct: "0/1 Knapsack Problem",
        explanation: "Gifts cannot be split, so this is 0/1 knapsack with dp[item][capacity].",
    },
    Template {
        kind: "binary_search",
        variant: "E",
        question: "\"{title}\": Chandu splits N valued items among K friends and wants the largest share to be as small as possible. Which technique?",
        options: [
            "Binary search on answer",
            "Dynamic programming",
            "Greedy assignment",
            "Sort items only",
        ],
        correct: "Binary search on answer",
        explanation: "Binary search the maximum load and check feasibility greedily for each candidate.",
    },
];

const APPU: &[Template] = &[
    Template {
        kind: "grid_optimization",
        variant: "A",
        question: "\"{title}\": Appu's farm is an R×C grid (1 ≤ R,C ≤ 300) of values between -1000 and 1000. He may harvest any rectangle. Which technique finds the best one?",
        options: [
            "2D Kadane Algorithm",
            "Check every possible rectangle",
            "Greedy largest values first",
            "Dynamic programming on rows",
        ],
        correct: "2D Kadane Algorithm",
        explanation: "Fix a pair of rows and run 1D Kadane over the column sums, giving O(R²C).",
    },
    Template {
        kind: "optimization",
        variant: "B",
        question: "In \"{title}\", each of Appu's N fields gives profit P[i] for investment I[i], and his budget is B. He wants the most profit. This is?",
        options: [
            "0/1 Knapsack Problem",
            "Fractional Knapsack",
            "Simple sorting",
            "Greedy by profit",
        ],
        correct: "0/1 Knapsack Problem",
        explanation: "A field is either fully funded or not, so this is 0/1 knapsack over the budget.",
    },
    Template {
        kind: "path_counting",
        variant: "C",
        question: "\"{title}\": Appu walks from (0,0) to (R-1,C-1) on a grid with obstacles, moving only right or down. How do you count the paths?",
        options: [
            "Dynamic Programming paths[i][j]",
            "BFS to count paths",
            "DFS with backtracking",
            "Mathematical formula only",
        ],
        correct: "Dynamic Programming paths[i][j]",
        explanation: "paths[i][j] = paths[i-1][j] + paths[i][j-1] for free cells and 0 for obstacles.",
    },
    Template {
        kind: "greedy_watering",
        variant: "D",
        question: "In \"{title}\", Appu waters N plants in a line with a can of capacity C. What gives the fewest refills?",
        options: [
            "Greedy: water until can is empty",
            "Dynamic programming on segments",
            "Binary search on trips",
            "Sort plants by water needed",
        ],
        correct: "Greedy: water until can is empty",
        explanation: "Walk the row in order and refill only when the next plant cannot be watered.",
    },
    Template {
        kind: "profit_optimization",
        variant: "E",
        question: "\"{title}\": Appu picks at most K of N plots, each with yield Y[i] and cost C[i], to maximise yield minus cost. What approach?",
        options: [
            "Sort by (yield - cost), pick top K",
            "Dynamic programming with K constraint",
            "Greedy by yield only",
            "Try all combinations",
        ],
        correct: "Sort by (yield - cost), pick top K",
        explanation: "Each plot contributes independently, so take the K largest positive differences.",
    },
];

const OPTIMIZATION: &[Template] = &[
    Template {
        kind: "optimization_strategy",
        variant: "A",
        question: "\"{title}\": This looks like an optimization problem. What is usually the first step?",
        options: [
            "Identify if it's greedy or DP",
            "Start coding immediately",
            "Use brute force always",
            "Apply sorting first",
        ],
        correct: "Identify if it's greedy or DP",
        explanation: "Optimization problems are usually either greedy, where local choices are safe, or DP over subproblems.",
    },
    Template {
        kind: "complexity_analysis",
        variant: "B",
        question: "In \"{title}\" the constraints allow N ≤ 10⁵. What time complexity should you aim for?",
        options: [
            "O(N) or O(N log N)",
            "O(N²) is acceptable",
            "O(N³) works fine",
            "Complexity doesn't matter",
        ],
        correct: "O(N) or O(N log N)",
        explanation: "O(N²) at N = 10⁵ is 10¹⁰ operations, far over a typical time limit.",
    },
];

const NUMBERS: &[Template] = &[
    Template {
        kind: "number_theory",
        variant: "A",
        question: "\"{title}\": This is a number or digit manipulation problem. Which concept usually matters?",
        options: [
            "Modular arithmetic and digit extraction",
            "Only basic addition",
            "String processing mainly",
            "Graph algorithms",
        ],
        correct: "Modular arithmetic and digit extraction",
        explanation: "Digit problems peel digits with % and /, and large results are kept modulo a prime.",
    },
    Template {
        kind: "large_numbers",
        variant: "B",
        question: "In \"{title}\", values go up to 10¹⁸. What needs the most care?",
        options: [
            "Integer overflow and precision",
            "Only memory usage",
            "Just time complexity",
            "Variable naming",
        ],
        correct: "Integer overflow and precision",
        explanation: "Products of such values overflow 64-bit integers; use wider types or modular arithmetic.",
    },
];

const EXPERT: &[Template] = &[
    Template {
        kind: "expert_mathematical",
        variant: "A",
        question: "\"{title}\" (Expert): Expert problems often hinge on a mathematical insight. What is the key approach?",
        options: [
            "Deep mathematical analysis and proof techniques",
            "Trial and error with optimizations",
            "Using complex data structures only",
            "Implementing multiple algorithms",
        ],
        correct: "Deep mathematical analysis and proof techniques",
        explanation: "Expert problems reward proving why a construction is optimal before coding it.",
    },
    Template {
        kind: "expert_elegance",
        variant: "B",
        question: "\"{title}\" (Expert): What distinguishes expert-level solutions?",
        options: [
            "Elegant algorithms with mathematical insights",
            "Complex implementation with many edge cases",
            "Using the latest language features",
            "Longest possible code with all optimizations",
        ],
        correct: "Elegant algorithms with mathematical insights",
        explanation: "Tight limits demand optimal complexity, which usually comes from understanding the structure.",
    },
    Template {
        kind: "expert_synthesis",
        variant: "C",
        question: "In \"{title}\" (Expert): What matters most when several ideas must be combined?",
        options: [
            "Combining algorithms with mathematical theory",
            "Fast implementation speed",
            "Memorizing solution templates",
            "Using advanced IDEs",
        ],
        correct: "Combining algorithms with mathematical theory",
        explanation: "Expert problems test synthesis of algorithmic techniques with mathematical reasoning.",
    },
];

const HARD: &[Template] = &[
    Template {
        kind: "hard_complexity",
        variant: "A",
        question: "\"{title}\" (Hard): With N ≤ 10⁵ and a strict time limit, which complexity is usually required?",
        options: [
            "O(N log N) or O(N√N) maximum",
            "O(N²) is generally acceptable",
            "O(N³) with constant optimization",
            "Exponential with heavy pruning",
        ],
        correct: "O(N log N) or O(N√N) maximum",
        explanation: "Anything quadratic at this size exceeds typical limits.",
    },
    Template {
        kind: "hard_recognition",
        variant: "B",
        question: "\"{title}\" (Hard): This likely needs segment trees, DP optimization or graph algorithms. Success depends on?",
        options: [
            "Recognizing which advanced pattern applies",
            "Implementing the first reasonable approach",
            "Using the most complex available algorithm",
            "Trying multiple random strategies",
        ],
        correct: "Recognizing which advanced pattern applies",
        explanation: "Hard problems are mostly about spotting which advanced technique the constraints point to.",
    },
];

const MEDIUM: &[Template] = &[Template {
    kind: "medium_implementation",
    variant: "A",
    question: "\"{title}\" (Medium): Medium problems balance algorithm knowledge with implementation. What is the usual focus?",
    options: [
        "Standard algorithms with careful edge case handling",
        "Advanced mathematical proofs",
        "Complex data structures in all cases",
        "Approximation algorithms",
    ],
    correct: "Standard algorithms with careful edge case handling",
    explanation: "Medium problems check that known algorithms are implemented correctly across edge cases.",
}];

const EASY: &[Template] = &[Template {
    kind: "easy_approach",
    variant: "A",
    question: "\"{title}\" (Easy): With N ≤ 1000, which complexity is usually acceptable?",
    options: [
        "O(N²) implementations are often intended",
        "Must always be O(N log N)",
        "O(N³) is the target complexity",
        "Only O(N) solutions are accepted",
    ],
    correct: "O(N²) implementations are often intended",
    explanation: "Small limits usually intend a straightforward quadratic solution.",
}];

/// Generic pool, used for every problem.
const GENERIC: &[Template] = &[
    Template {
        kind: "systematic_approach",
        variant: "A",
        question: "\"{title}\" ({difficulty}): What is the most systematic way to approach a competitive programming problem?",
        options: [
            "Read constraints, identify pattern, choose algorithm",
            "Guess the solution type",
            "Start with brute force always",
            "Copy similar solutions",
        ],
        correct: "Read constraints, identify pattern, choose algorithm",
        explanation: "Constraints narrow the feasible algorithms, the pattern picks one of them.",
    },
    Template {
        kind: "constraint_analysis",
        variant: "B",
        question: "For \"{title}\" ({difficulty}), what do the constraints primarily tell you?",
        options: [
            "Required time and space complexity",
            "Programming language choice",
            "Variable names to use",
            "Output format",
        ],
        correct: "Required time and space complexity",
        explanation: "Input sizes determine which algorithms fit within the time and memory limits.",
    },
    Template {
        kind: "algorithm_selection",
        variant: "C",
        question: "\"{title}\" ({difficulty}): What should influence your algorithm choice most?",
        options: [
            "Input size and time limits",
            "Personal coding style",
            "Shortest code possible",
            "Most complex algorithm",
        ],
        correct: "Input size and time limits",
        explanation: "An algorithm is only viable if it handles the largest input in time.",
    },
    Template {
        kind: "debugging_timeout",
        variant: "D",
        question: "In \"{title}\" ({difficulty}), the solution times out. What is the most likely issue?",
        options: [
            "Algorithm complexity too high for constraints",
            "Wrong programming language",
            "Too many variables",
            "Incorrect output format",
        ],
        correct: "Algorithm complexity too high for constraints",
        explanation: "Timeouts almost always mean the complexity is too high for the input size.",
    },
    Template {
        kind: "pattern_recognition",
        variant: "E",
        question: "\"{title}\" ({difficulty}): Which fundamental skill does this kind of problem exercise?",
        options: [
            "Pattern recognition and algorithm mapping",
            "Advanced mathematics only",
            "Complex data structures only",
            "Memorizing code templates",
        ],
        correct: "Pattern recognition and algorithm mapping",
        explanation: "Most problems are solved by mapping them onto a known algorithmic pattern.",
    },
    Template {
        kind: "problem_solving",
        variant: "F",
        question: "For \"{title}\" ({difficulty}), what is the best move when the optimal approach is unclear?",
        options: [
            "Analyze examples and edge cases",
            "Implement the first idea",
            "Skip to next problem",
            "Use random approach",
        ],
        correct: "Analyze examples and edge cases",
        explanation: "Working small cases by hand exposes the structure of the problem.",
    },
];

/// Name fragments that make pattern-specific questions take priority over
/// the generic pool.
const PRIORITY_KEYWORDS: &[&str] = &[
    "chandu", "appu", "bracket", "brck", "trip", "tree", "minimum", "maximum",
];

/// Java-style 32-bit string hash over UTF-16 code units.
pub fn hash_code(s: &str) -> i32 {
    s.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(unit as i32)
    })
}

/// Candidate templates for a problem, pattern-specific ones first.
pub fn candidate_pool(problem: &Problem) -> Vec<&'static Template> {
    let name = problem.name.to_lowercase();
    let mut pool: Vec<&'static Template> = Vec::new();

    if name.contains("chandu") {
        pool.extend(CHANDU);
    }
    if name.contains("appu") {
        pool.extend(APPU);
    }
    if name.contains("min") || name.contains("max") {
        pool.extend(OPTIMIZATION);
    }
    if ["integer", "number", "digit"]
        .iter()
        .any(|k| name.contains(k))
    {
        pool.extend(NUMBERS);
    }
    pool.extend(match problem.tier() {
        DifficultyTier::Easy => EASY,
        DifficultyTier::Medium => MEDIUM,
        DifficultyTier::Hard => HARD,
        DifficultyTier::Expert => EXPERT,
    });

    if PRIORITY_KEYWORDS.iter().any(|k| name.contains(k)) {
        return pool;
    }
    pool.extend(GENERIC);
    pool
}

/// Deterministic template lookup keyed on the problem and session token,
/// plus a small random salt.
pub struct TemplateMcqGenerator {
    rng: Option<SmallRng>,
}

impl TemplateMcqGenerator {
    pub fn new() -> Self {
        Self {
            rng: Some(SmallRng::from_entropy()),
        }
    }

    /// No salt: the same problem and token always give the same question.
    pub fn deterministic() -> Self {
        Self { rng: None }
    }

    pub fn selection_seed(&mut self, problem: &Problem, token: Option<&SessionToken>) -> i64 {
        let base = hash_code(&format!("{}{}", problem.name.to_lowercase(), problem.title()));
        let session = token.map(|t| hash_code(t.as_str())).unwrap_or(0);
        let salt = self.rng.as_mut().map(|r| r.gen_range(0..1000)).unwrap_or(0);
        base as i64 + session as i64 + salt
    }
}

impl Default for TemplateMcqGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl McqGenerator for TemplateMcqGenerator {
    fn name(&self) -> &'static str {
        GENERATOR_NAME
    }

    fn generate(&mut self, problem: &Problem, token: Option<&SessionToken>) -> Mcq {
        let pool = candidate_pool(problem);
        let seed = self.selection_seed(problem, token);
        let template = pool[(seed.unsigned_abs() % pool.len() as u64) as usize];
        debug!(
            problem = problem.title(),
            kind = template.kind,
            pool = pool.len(),
            "selected template question"
        );
        render(template, problem, token, seed, pool.len())
    }
}

fn render(
    template: &Template,
    problem: &Problem,
    token: Option<&SessionToken>,
    seed: i64,
    pool_size: usize,
) -> Mcq {
    let fill = |s: &str| {
        s.replace("{title}", problem.title())
            .replace("{difficulty}", problem.tier().as_str())
    };
    Mcq {
        question: fill(template.question),
        options: template.options.iter().map(|o| o.to_string()).collect(),
        correct_answer: template.correct.to_string(),
        explanation: template.explanation.to_string(),
        metadata: McqMetadata {
            generator: GENERATOR_NAME.to_string(),
            kind: Some(template.kind.to_string()),
            variant: Some(template.variant.to_string()),
            model: None,
            session_token: token.map(|t| t.as_str().to_string()),
            selection_seed: Some(seed),
            pool_size: Some(pool_size),
        },
    }
}
