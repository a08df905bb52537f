use crate::block::BlockKind;
use serde::{Deserialize, Serialize};

/// Block runner states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockPhase {
    Instructing,
    Presenting,
    AwaitingResponse,
    Recording,
    BlockComplete,
}

/// Recorded result per trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub block: BlockKind,
    /// Palette key the subject was expected to select.
    pub target: String,
    /// Palette key the subject selected.
    pub response: String,
    pub correct: bool,
    /// Seconds from stimulus onset to the matching click.
    pub reaction_time: f64,
}

impl TrialResult {
    pub fn reaction_ms(&self) -> f64 {
        self.reaction_time * 1_000.0
    }
}
