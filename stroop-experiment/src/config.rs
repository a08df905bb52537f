use crate::layout::LayoutKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use stroop_core::{BlockKind, ExperimentError, Locale, Palette};

/// How the instruction screen is dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionMode {
    /// Shown for `instruction_ms`, then the block starts.
    #[default]
    Timed,
    /// Shown until the subject clicks the "?" button.
    Click,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Requested trial budget, split across the two framings.
    pub trials: usize,
    /// Leading trials dropped from the first block of each framing.
    pub warmup_discards: usize,
    pub instruction_ms: u64,
    pub inter_trial_ms: u64,
    pub instruction_mode: InstructionMode,
    pub layout: LayoutKind,
    pub language: String,
    /// Cap on trials added after incorrect answers, per block. `None` is unbounded.
    pub max_extra_trials: Option<usize>,
    pub seed: Option<u64>,
    pub palette: Palette,
    /// Displayed words for palette keys, layered over the language's own table.
    pub color_words: HashMap<String, String>,
    pub stimulus_font_px: f32,
    pub instruction_font_px: f32,
    pub button_font_px: f32,
    pub button_size: (f32, f32),
    pub swatch_size: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            trials: 10,
            warmup_discards: 1,
            instruction_ms: 2000,
            inter_trial_ms: 500,
            instruction_mode: InstructionMode::Timed,
            layout: LayoutKind::Row,
            language: "en".to_string(),
            max_extra_trials: None,
            seed: None,
            palette: Palette::default(),
            color_words: HashMap::new(),
            stimulus_font_px: 74.0,
            instruction_font_px: 48.0,
            button_font_px: 28.0,
            button_size: (150.0, 60.0),
            swatch_size: 200.0,
        }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self, ExperimentError> {
        serde_json::from_str(json).map_err(|e| ExperimentError::InvalidConfig(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, ExperimentError> {
        serde_json::to_string_pretty(self).map_err(|e| ExperimentError::Serialization {
            what: "session config",
            message: e.to_string(),
        })
    }

    /// Checks the configuration and resolves its language.
    pub fn validate(&self) -> Result<Locale, ExperimentError> {
        if self.palette.len() < 2 {
            return Err(ExperimentError::PaletteTooSmall {
                required: 2,
                actual: self.palette.len(),
            });
        }
        if self.trials == 0 {
            return Err(ExperimentError::InvalidConfig(
                "trial budget must be at least 1".to_string(),
            ));
        }
        let (w, h) = self.button_size;
        if !(w > 0.0 && h > 0.0) {
            return Err(ExperimentError::InvalidConfig(format!(
                "button size must be positive, got {w}x{h}"
            )));
        }
        let locale = self
            .color_words
            .iter()
            .fold(Locale::resolve(&self.language)?, |locale, (key, word)| {
                locale.with_color_word(key.clone(), word.clone())
            });
        locale.check_palette(&self.palette)?;
        Ok(locale)
    }

    /// Minimum trials for `kind` before any incorrect-answer extension.
    pub fn block_trials(&self, kind: BlockKind) -> usize {
        let half = self.trials / 2;
        if kind.starts_framing() {
            half + self.warmup_discards
        } else {
            half
        }
    }

    pub fn instruction_duration(&self) -> Duration {
        Duration::from_millis(self.instruction_ms)
    }

    pub fn inter_trial_interval(&self) -> Duration {
        Duration::from_millis(self.inter_trial_ms)
    }
}
