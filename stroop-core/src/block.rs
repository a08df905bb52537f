use crate::stimulus::StimulusPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task framing shared by a congruent and an incongruent block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    /// A written color word, answered with color-filled buttons.
    Text,
    /// A colored rectangle, answered with text-labeled buttons.
    Swatch,
}

impl Framing {
    pub const ALL: [Framing; 2] = [Framing::Text, Framing::Swatch];

    pub fn congruent_block(self) -> BlockKind {
        match self {
            Framing::Text => BlockKind::TextCongruent,
            Framing::Swatch => BlockKind::SwatchCongruent,
        }
    }

    pub fn incongruent_block(self) -> BlockKind {
        match self {
            Framing::Text => BlockKind::TextIncongruent,
            Framing::Swatch => BlockKind::SwatchIncongruent,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Framing::Text => "text",
            Framing::Swatch => "swatch",
        }
    }
}

/// The four blocks of a session, in running order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    TextCongruent,
    TextIncongruent,
    SwatchCongruent,
    SwatchIncongruent,
}

impl Default for BlockKind {
    fn default() -> Self {
        BlockKind::TextCongruent
    }
}

impl BlockKind {
    pub const ALL: [BlockKind; 4] = [
        BlockKind::TextCongruent,
        BlockKind::TextIncongruent,
        BlockKind::SwatchCongruent,
        BlockKind::SwatchIncongruent,
    ];

    pub fn next(&self) -> Option<Self> {
        use BlockKind::*;
        Some(match self {
            TextCongruent => TextIncongruent,
            TextIncongruent => SwatchCongruent,
            SwatchCongruent => SwatchIncongruent,
            SwatchIncongruent => return None,
        })
    }

    pub fn policy(&self) -> StimulusPolicy {
        match self {
            BlockKind::TextCongruent => StimulusPolicy::StandardText,
            BlockKind::TextIncongruent => StimulusPolicy::IncongruentText,
            BlockKind::SwatchCongruent => StimulusPolicy::StandardSwatch,
            BlockKind::SwatchIncongruent => StimulusPolicy::IncongruentSwatch,
        }
    }

    pub fn framing(&self) -> Framing {
        self.policy().framing()
    }

    /// First block of a framing; its leading trials absorb the task switch.
    pub fn starts_framing(&self) -> bool {
        matches!(self, BlockKind::TextCongruent | BlockKind::SwatchCongruent)
    }

    /// Label used in the trial log's `trial_type` column.
    pub fn label(&self) -> &'static str {
        match self {
            BlockKind::TextCongruent => "text_congruent",
            BlockKind::TextIncongruent => "text_incongruent",
            BlockKind::SwatchCongruent => "swatch_congruent",
            BlockKind::SwatchIncongruent => "swatch_incongruent",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        BlockKind::ALL.into_iter().find(|kind| kind.label() == label)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_run_in_fixed_order() {
        let mut order = vec![BlockKind::default()];
        while let Some(next) = order.last().and_then(|k| k.next()) {
            order.push(next);
        }
        assert_eq!(order, BlockKind::ALL.to_vec());
    }

    #[test]
    fn labels_round_trip() {
        for kind in BlockKind::ALL {
            assert_eq!(BlockKind::from_label(kind.label()), Some(kind));
        }
        assert_eq!(BlockKind::from_label("First Set"), None);
    }

    #[test]
    fn framing_pairs() {
        for framing in Framing::ALL {
            assert!(framing.congruent_block().starts_framing());
            assert!(!framing.incongruent_block().starts_framing());
            assert_eq!(framing.incongruent_block().framing(), framing);
        }
    }
}
