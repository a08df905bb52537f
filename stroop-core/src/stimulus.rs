use crate::block::Framing;
use crate::color::{Palette, Rgb};
use crate::error::ExperimentError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Congruency {
    Standard,
    Incongruent,
}

/// How the response buttons are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionStyle {
    /// Buttons filled with their color, name in white.
    ColorFilled,
    /// Light gray buttons carrying the color word in black.
    TextLabeled,
}

/// Stimulus and answer policy of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StimulusPolicy {
    /// Color word in neutral ink; the answer is the word.
    StandardText,
    /// Color word in a different ink; the answer is the ink.
    IncongruentText,
    /// Plain colored rectangle; the answer is its color.
    StandardSwatch,
    /// Colored rectangle carrying a different color word; the answer is the rectangle's color.
    IncongruentSwatch,
}

impl StimulusPolicy {
    pub fn congruency(self) -> Congruency {
        match self {
            StimulusPolicy::StandardText | StimulusPolicy::StandardSwatch => Congruency::Standard,
            StimulusPolicy::IncongruentText | StimulusPolicy::IncongruentSwatch => {
                Congruency::Incongruent
            }
        }
    }

    pub fn framing(self) -> Framing {
        match self {
            StimulusPolicy::StandardText | StimulusPolicy::IncongruentText => Framing::Text,
            StimulusPolicy::StandardSwatch | StimulusPolicy::IncongruentSwatch => Framing::Swatch,
        }
    }

    pub fn option_style(self) -> OptionStyle {
        match self.framing() {
            Framing::Text => OptionStyle::ColorFilled,
            Framing::Swatch => OptionStyle::TextLabeled,
        }
    }
}

/// One trial's stimulus. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stimulus {
    policy: StimulusPolicy,
    label: Option<String>,
    ink: Option<Rgb>,
    congruent: bool,
    target: String,
}

impl Stimulus {
    /// Standard trial around palette entry `index`.
    pub fn standard(
        policy: StimulusPolicy,
        palette: &Palette,
        index: usize,
    ) -> Result<Self, ExperimentError> {
        if policy.congruency() != Congruency::Standard {
            return Err(ExperimentError::InvalidStimulus(format!(
                "{policy:?} does not produce standard trials"
            )));
        }
        let swatch = palette.get(index).ok_or_else(|| {
            ExperimentError::InvalidStimulus(format!("palette has no entry {index}"))
        })?;

        let (label, ink) = match policy.framing() {
            Framing::Text => (Some(swatch.name.clone()), None),
            Framing::Swatch => (None, Some(swatch.rgb)),
        };

        Ok(Self {
            policy,
            label,
            ink,
            congruent: true,
            target: swatch.name.clone(),
        })
    }

    /// Incongruent trial: the word names `nominal`, the ink is `ink`, and the ink is the answer.
    pub fn incongruent(
        policy: StimulusPolicy,
        palette: &Palette,
        nominal: usize,
        ink: usize,
    ) -> Result<Self, ExperimentError> {
        if policy.congruency() != Congruency::Incongruent {
            return Err(ExperimentError::InvalidStimulus(format!(
                "{policy:?} does not produce incongruent trials"
            )));
        }
        if nominal == ink {
            return Err(ExperimentError::InvalidStimulus(
                "incongruent label and ink must differ".to_string(),
            ));
        }
        let (word, shown) = match (palette.get(nominal), palette.get(ink)) {
            (Some(word), Some(shown)) => (word, shown),
            _ => {
                return Err(ExperimentError::InvalidStimulus(format!(
                    "palette has no entry {nominal} or {ink}"
                )));
            }
        };

        Ok(Self {
            policy,
            label: Some(word.name.clone()),
            ink: Some(shown.rgb),
            congruent: false,
            target: shown.name.clone(),
        })
    }

    pub fn policy(&self) -> StimulusPolicy {
        self.policy
    }

    /// Palette key of the written word, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Displayed color; `None` means neutral ink.
    pub fn ink(&self) -> Option<Rgb> {
        self.ink
    }

    pub fn is_congruent(&self) -> bool {
        self.congruent
    }

    /// Palette key the subject is expected to select.
    pub fn target(&self) -> &str {
        &self.target
    }
}
