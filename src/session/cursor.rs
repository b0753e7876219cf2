/// Position of the test taker within the issued questions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuestionCursor {
    pub index: usize,
    pub planned: usize,
}

impl QuestionCursor {
    pub fn new(planned: usize) -> Self {
        Self { index: 0, planned }
    }

    /// Moves forward when another issued question exists. Returns whether the
    /// cursor moved.
    pub fn next(&mut self, issued: usize) -> bool {
        if self.index + 1 < issued {
            self.index += 1;
            true
        } else {
            false
        }
    }

    pub fn previous(&mut self) -> bool {
        if self.index > 0 {
            self.index -= 1;
            true
        } else {
            false
        }
    }

    /// Points at the most recently issued question.
    pub fn jump_to_latest(&mut self, issued: usize) {
        self.index = issued.saturating_sub(1);
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.planned
    }

    pub fn progress(&self) -> f64 {
        if self.planned == 0 {
            return 0.0;
        }
        ((self.index + 1) as f64 / self.planned as f64 * 100.0).clamp(0.0, 100.0)
    }
}
