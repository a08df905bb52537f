use crate::layout::OptionButton;
use stroop_core::{BlockKind, Stimulus, TrialResult, evaluate};

/// A trial between onset and response.
#[derive(Debug, Clone)]
pub struct Trial {
    pub id: usize,
    pub stimulus: Stimulus,
    pub options: Vec<OptionButton>,
    /// Timer nanoseconds when the trial frame was presented.
    pub onset: u64,
}

impl Trial {
    /// Scores the trial for the option matched at timer time `at`.
    pub fn finish(&self, block: BlockKind, response: &OptionButton, at: u64) -> TrialResult {
        let reaction_ns = at.saturating_sub(self.onset);
        TrialResult {
            block,
            target: self.stimulus.target().to_string(),
            response: response.name.clone(),
            correct: evaluate(self.stimulus.target(), &response.name),
            reaction_time: reaction_ns as f64 / 1e9,
        }
    }
}
