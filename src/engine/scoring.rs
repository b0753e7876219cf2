/// Percentage of correct answers; zero answered counts as zero percent.
pub fn success_rate(correct: u32, answered: u32) -> f64 {
    correct as f64 / answered.max(1) as f64 * 100.0
}

/// Mean score change per answered question.
pub fn average_score(total_score: i32, answered: u32) -> f64 {
    total_score as f64 / answered.max(1) as f64
}

pub fn performance_label(success_rate: f64) -> &'static str {
    if success_rate >= 80.0 {
        "Excellent"
    } else if success_rate >= 60.0 {
        "Good"
    } else if success_rate >= 40.0 {
        "Fair"
    } else {
        "Needs practice"
    }
}
