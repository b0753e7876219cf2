use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use prepai::app::{App, format_clock};
use prepai::config::{Config, GeneratorKind};
use prepai::engine::state::TierChange;
use prepai::engine::tier::DifficultyTier;
use prepai::error::ControllerError;
use prepai::generator::Question;
use prepai::session::result::TestSummary;

#[derive(Parser)]
#[command(name = "prepai", version, about = "Adaptive multiple-choice interview practice")]
struct Cli {
    #[arg(short = 'n', long, help = "Number of questions in the test")]
    count: Option<usize>,

    #[arg(short, long, help = "Starting difficulty (easy, medium, hard, expert)")]
    start: Option<DifficultyTier>,

    #[arg(short, long, help = "Time limit in minutes")]
    time_limit: Option<u32>,

    #[arg(short, long, help = "Path to a JSON problem bank")]
    bank: Option<PathBuf>,

    #[arg(short, long, value_enum, help = "Question generator")]
    generator: Option<GeneratorKind>,

    #[arg(long, help = "Show past test results and exit")]
    history: bool,

    #[arg(long, help = "Write the effective settings to the config file")]
    save_config: bool,

    #[arg(short, long, help = "Enable debug logging")]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mut config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not read config, using defaults");
        Config::default()
    });
    if let Some(count) = cli.count {
        config.question_count = count;
    }
    if let Some(start) = cli.start {
        config.starting_tier = start;
    }
    if let Some(minutes) = cli.time_limit {
        config.time_limit_minutes = minutes;
    }
    if let Some(bank) = cli.bank {
        config.problem_bank_path = Some(bank.to_string_lossy().into_owned());
    }
    if let Some(generator) = cli.generator {
        config.generator = generator;
    }
    config.validate();

    if cli.save_config {
        config.save()?;
        println!("Saved settings to {}", Config::config_path().display());
    }

    let mut app = App::new(config)?;

    if cli.history {
        print_history(&app.history());
        return Ok(());
    }

    let mut input = Input::new();
    println!(
        "Adaptive test: {} questions, starting at {}, {} minute limit.",
        app.config.question_count, app.config.starting_tier, app.config.time_limit_minutes
    );
    println!("Two correct answers in a row raise the difficulty; a wrong answer lowers it.\n");

    run_test(&mut app, &mut input)?;

    let summary = app.finish();
    print_summary(&summary);
    Ok(())
}

struct Input {
    lines: io::Lines<io::StdinLock<'static>>,
}

impl Input {
    fn new() -> Self {
        Self {
            lines: io::stdin().lock().lines(),
        }
    }

    /// `None` on end of input.
    fn prompt(&mut self, message: &str) -> Result<Option<String>> {
        print!("{message}");
        io::stdout().flush()?;
        match self.lines.next() {
            Some(line) => Ok(Some(line?)),
            None => Ok(None),
        }
    }
}

fn run_test(app: &mut App, input: &mut Input) -> Result<()> {
    let started = app.start().map(|_| ());
    if let Err(e) = started {
        println!("Could not load the first question: {e}");
        if !retry_until_available(app, input)? {
            return Ok(());
        }
    }

    while !app.controller.is_completed() {
        let now = Utc::now();
        if app.is_time_up(now) {
            println!("\nTime is up.");
            break;
        }
        let Some(question) = app.current_question() else {
            if !retry_until_available(app, input)? {
                break;
            }
            continue;
        };
        print_question(app, question, app.remaining_secs(now));

        let Some(line) = input.prompt("Answer [number], p/n to move, q to finish: ")? else {
            break;
        };
        match line.trim() {
            "q" => break,
            "p" => {
                if app.cursor.is_first() {
                    println!("Already at the first question.");
                } else {
                    app.previous();
                }
            }
            "n" => {
                if !app.next() {
                    println!("No later question yet.");
                }
            }
            other => match other.parse::<usize>() {
                Ok(choice) if choice >= 1 => {
                    if !submit(app, input, choice - 1)? {
                        break;
                    }
                }
                _ => println!("Enter the number of an option."),
            },
        }
    }
    Ok(())
}

/// Returns `false` when the test taker gave up waiting for content.
fn submit(app: &mut App, input: &mut Input, option: usize) -> Result<bool> {
    let explanation = app
        .current_question()
        .map(|q| (q.correct_answer().to_string(), q.explanation().to_string()));

    match app.submit(option) {
        Ok(outcome) => {
            print_verdict(outcome.event.is_correct, explanation);
            print_tier_change(outcome.change);
            println!();
            Ok(true)
        }
        Err(ControllerError::ContentUnavailable { tier, source }) => {
            if let Some((event, change)) = app.last_answer() {
                print_verdict(event.is_correct, explanation);
                print_tier_change(change);
            }
            println!("No {tier} question is available right now: {source}");
            retry_until_available(app, input)
        }
        Err(e) => {
            println!("{e}");
            Ok(true)
        }
    }
}

fn print_verdict(is_correct: bool, explanation: Option<(String, String)>) {
    if is_correct {
        println!("Correct! (+1)");
    } else {
        println!("Wrong (-1).");
    }
    if let Some((answer, why)) = explanation {
        if !is_correct {
            println!("Correct answer: {answer}");
        }
        println!("{why}");
    }
}

fn retry_until_available(app: &mut App, input: &mut Input) -> Result<bool> {
    loop {
        let Some(line) = input.prompt("[r]etry or [q]uit? ")? else {
            return Ok(false);
        };
        match line.trim() {
            "q" => return Ok(false),
            "r" | "" => match app.retry_next() {
                Ok(_) => return Ok(true),
                Err(e @ (ControllerError::SessionCompleted | ControllerError::NotStarted)) => {
                    println!("{e}");
                    return Ok(false);
                }
                Err(e) => println!("Still unavailable: {e}"),
            },
            _ => {}
        }
    }
}

fn print_question(app: &App, question: &Question, remaining_secs: i64) {
    let index = app.cursor.index;
    println!(
        "Question {}/{} ({:.0}%)  [{}]  Score: {}  Time left: {}",
        index + 1,
        app.config.question_count,
        app.cursor.progress(),
        question.tier,
        app.controller.total_score(),
        format_clock(remaining_secs)
    );
    if app.cursor.is_last() {
        println!("Final question.");
    }
    println!("({})", question.problem_title);
    println!("{}", question.text());
    for (i, option) in question.options().iter().enumerate() {
        println!("  {}) {option}", i + 1);
    }
    if let Some(event) = app.controller.answer_for(index) {
        let verdict = if event.is_correct { "correct" } else { "wrong" };
        println!("You answered: {} ({verdict})", event.selected);
    }
}

fn print_tier_change(change: TierChange) {
    match change {
        TierChange::Promoted { .. } => println!("Difficulty increased to {}.", change.tier()),
        TierChange::Demoted { .. } => println!("Difficulty decreased to {}.", change.tier()),
        TierChange::Held(_) => {}
    }
}

fn print_summary(summary: &TestSummary) {
    println!("\n=== Test complete ===");
    if summary.ended_early {
        println!(
            "Ended early after {} of {} questions.",
            summary.total_questions, summary.planned_questions
        );
    }
    println!(
        "Correct: {}  Wrong: {}  Score: {}",
        summary.correct_count, summary.wrong_count, summary.total_score
    );
    println!(
        "Success rate: {:.1}%  Average score: {:.2}  ({})",
        summary.success_rate,
        summary.average_score,
        summary.performance_label()
    );
    println!(
        "Final difficulty: {}  Highest reached: {}",
        summary.final_tier, summary.max_tier_reached
    );
    let path: Vec<&str> = summary.tier_progression.iter().map(|t| t.as_str()).collect();
    println!("Difficulty path: {}", path.join(" -> "));
    println!("Time taken: {}", format_clock(summary.elapsed_secs() as i64));
}

fn print_history(results: &[TestSummary]) {
    if results.is_empty() {
        println!("No tests taken yet.");
        return;
    }
    println!(
        "{:<17} {:>9} {:>6} {:>8}  {:<7} {:<7}",
        "Date", "Answered", "Score", "Success", "Final", "Peak"
    );
    for r in results {
        println!(
            "{:<17} {:>9} {:>6} {:>7.1}%  {:<7} {:<7}",
            r.finished_at.format("%Y-%m-%d %H:%M"),
            format!("{}/{}", r.total_questions, r.planned_questions),
            r.total_score,
            r.success_rate,
            r.final_tier.as_str(),
            r.max_tier_reached.as_str()
        );
    }
}
