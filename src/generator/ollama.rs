use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::generator::problem_bank::Problem;
use crate::generator::{Mcq, McqGenerator, McqMetadata};
use crate::session::token::SessionToken;

pub const GENERATOR_NAME: &str = "ollama";
pub const FALLBACK_GENERATOR_NAME: &str = "fallback";

static JSON_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    // Greedy: first '{' through last '}'.
    Regex::new(r"(?s)\{.*\}").expect("static regex")
});

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: SamplingOptions,
}

#[derive(Serialize)]
struct SamplingOptions {
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct RawMcq {
    question: String,
    options: Vec<String>,
    correct_answer: String,
    #[serde(default)]
    explanation: Option<String>,
}

/// Asks a local Ollama server for a question, falling back to a fixed
/// rule-based question when the call or the parse fails.
pub struct OllamaMcqGenerator {
    url: String,
    model: String,
    client: Option<reqwest::blocking::Client>,
}

impl OllamaMcqGenerator {
    pub fn new(url: &str, model: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| warn!(error = %e, "could not build HTTP client, using fallback questions"))
            .ok();
        Self {
            url: url.to_string(),
            model: model.to_string(),
            client,
        }
    }

    fn request(&self, problem: &Problem) -> Option<String> {
        let client = self.client.as_ref()?;
        let body = GenerateRequest {
            model: &self.model,
            prompt: build_prompt(problem),
            stream: false,
            options: SamplingOptions {
                temperature: 0.7,
                top_p: 0.9,
            },
        };
        let response = client
            .post(&self.url)
            .json(&body)
            .send()
            .map_err(|e| warn!(error = %e, url = %self.url, "LLM request failed"))
            .ok()?;
        if !response.status().is_success() {
            warn!(status = %response.status(), "LLM request rejected");
            return None;
        }
        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| warn!(error = %e, "LLM response body was not understood"))
            .ok()?;
        Some(parsed.response)
    }
}

impl McqGenerator for OllamaMcqGenerator {
    fn name(&self) -> &'static str {
        GENERATOR_NAME
    }

    fn generate(&mut self, problem: &Problem, token: Option<&SessionToken>) -> Mcq {
        let mut mcq = match self.request(problem) {
            Some(text) => match parse_response(&text, &self.model) {
                Some(mcq) => mcq,
                None => {
                    warn!(problem = problem.title(), "could not parse LLM question, using fallback");
                    fallback_mcq(problem)
                }
            },
            None => fallback_mcq(problem),
        };
        mcq.metadata.session_token = token.map(|t| t.as_str().to_string());
        debug!(problem = problem.title(), generator = %mcq.metadata.generator, "generated question");
        mcq
    }
}

pub fn build_prompt(problem: &Problem) -> String {
    let description: String = if problem.description.is_empty() {
        "No description available".to_string()
    } else {
        problem.description.chars().take(500).collect()
    };
    format!(
        r#"Generate a multiple-choice question for this coding problem:

**Problem:** {title}
**Difficulty:** {difficulty}
**Description:** {description}...

Create a technical MCQ that tests algorithmic understanding. Format your response as JSON:

{{
  "question": "What is the optimal approach for this problem?",
  "options": ["Option A", "Option B", "Option C", "Option D"],
  "correct_answer": "Option A",
  "explanation": "Why this approach is correct and the others are wrong."
}}

Focus on time/space complexity, specific algorithms (DP, Greedy, Graph, etc.),
implementation details and common pitfalls.

Generate a challenging but fair question for {difficulty} level.
"#,
        title = problem.title(),
        difficulty = problem.tier(),
    )
}

/// Pulls the first JSON object out of free-form model output.
///
/// Requires a question, at least one option, and a correct answer that is
/// one of the options.
pub fn parse_response(text: &str, model: &str) -> Option<Mcq> {
    let json = JSON_OBJECT.find(text)?.as_str();
    let raw: RawMcq = serde_json::from_str(json).ok()?;
    if raw.question.trim().is_empty()
        || raw.options.is_empty()
        || !raw.options.contains(&raw.correct_answer)
    {
        return None;
    }
    Some(Mcq {
        question: raw.question,
        options: raw.options,
        correct_answer: raw.correct_answer,
        explanation: raw
            .explanation
            .unwrap_or_else(|| "No explanation provided".to_string()),
        metadata: McqMetadata {
            generator: GENERATOR_NAME.to_string(),
            kind: Some("ai_generated".to_string()),
            model: Some(model.to_string()),
            ..McqMetadata::default()
        },
    })
}

pub fn fallback_mcq(problem: &Problem) -> Mcq {
    let correct = "Time and space complexity given the constraints";
    Mcq {
        question: format!(
            "For \"{}\" ({}), what's the most important consideration when selecting an algorithm?",
            problem.title(),
            problem.tier()
        ),
        options: vec![
            correct.to_string(),
            "Code readability and simplicity".to_string(),
            "Personal preference and familiarity".to_string(),
            "Using the latest programming language features".to_string(),
        ],
        correct_answer: correct.to_string(),
        explanation: "Algorithm selection should prioritise efficiency within the given constraints."
            .to_string(),
        metadata: McqMetadata {
            generator: FALLBACK_GENERATOR_NAME.to_string(),
            kind: Some("fallback".to_string()),
            ..McqMetadata::default()
        },
    }
}
