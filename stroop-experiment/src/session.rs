use crate::config::SessionConfig;
use crate::generator::StimulusSource;
use crate::io::{InputSource, Screen};
use crate::runner::{Apparatus, BlockOutcome, BlockRunner, BlockSpec};
use serde::{Deserialize, Serialize};
use stroop_core::{BlockKind, ExperimentError, Locale, TrialResult};
use stroop_timing::Timer;
use tracing::{debug, info};

/// Bookkeeping for one finished block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub kind: BlockKind,
    pub presentations: usize,
    pub extra_trials: usize,
    /// Leading results dropped as warm-up.
    pub discarded: usize,
    pub kept: usize,
}

/// All kept trial results of a session, in block order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionResultSet {
    trials: Vec<TrialResult>,
    blocks: Vec<BlockRecord>,
}

impl SessionResultSet {
    fn push(&mut self, outcome: BlockOutcome, discard: usize) {
        let discarded = discard.min(outcome.results.len());
        let kept = outcome.results.len() - discarded;
        self.blocks.push(BlockRecord {
            kind: outcome.kind,
            presentations: outcome.presentations,
            extra_trials: outcome.extra_trials,
            discarded,
            kept,
        });
        self.trials
            .extend(outcome.results.into_iter().skip(discarded));
    }

    pub fn trials(&self) -> &[TrialResult] {
        &self.trials
    }

    pub fn blocks(&self) -> &[BlockRecord] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn into_trials(self) -> Vec<TrialResult> {
        self.trials
    }
}

/// Runs the four blocks in order against one apparatus.
pub struct Session<S, I, T, G> {
    config: SessionConfig,
    locale: Locale,
    apparatus: Apparatus<S, I, T, G>,
}

impl<S, I, T, G> Session<S, I, T, G>
where
    S: Screen,
    I: InputSource,
    T: Timer,
    G: StimulusSource,
{
    /// Validates `config` and resolves its language.
    pub fn new(
        config: SessionConfig,
        apparatus: Apparatus<S, I, T, G>,
    ) -> Result<Self, ExperimentError> {
        let locale = config.validate()?;
        info!(
            language = locale.tag(),
            trials = config.trials,
            colors = config.palette.len(),
            mode = ?config.instruction_mode,
            layout = ?config.layout,
            "session configured"
        );
        Ok(Self {
            config,
            locale,
            apparatus,
        })
    }

    pub fn block_specs(&self) -> Vec<BlockSpec> {
        std::iter::successors(Some(BlockKind::default()), |kind| kind.next())
            .map(|kind| BlockSpec::new(kind, &self.config, &self.locale))
            .collect()
    }

    /// Runs every block. Cancellation, or any collaborator failure, returns the
    /// error and nothing of what was collected.
    pub fn run(&mut self) -> Result<SessionResultSet, ExperimentError> {
        let mut results = SessionResultSet::default();
        for spec in self.block_specs() {
            let kind = spec.kind;
            let outcome = BlockRunner::new(spec, &self.config, &self.locale).run(&mut self.apparatus)?;
            let discard = if kind.starts_framing() {
                self.config.warmup_discards
            } else {
                0
            };
            debug!(block = %kind, discard, "warm-up discard");
            results.push(outcome, discard);
        }
        info!(
            trials = results.len(),
            blocks = results.blocks().len(),
            "session complete"
        );
        Ok(results)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn apparatus(&self) -> &Apparatus<S, I, T, G> {
        &self.apparatus
    }

    pub fn into_apparatus(self) -> Apparatus<S, I, T, G> {
        self.apparatus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::RandomStimuli;
    use crate::scripted::{RecordingScreen, ScriptedInput};
    use stroop_core::{Palette, Rgb, Swatch};
    use stroop_timing::ManualTimer;

    fn session(config: SessionConfig) -> Result<Session<RecordingScreen, ScriptedInput<ManualTimer>, ManualTimer, RandomStimuli<rand::rngs::StdRng>>, ExperimentError> {
        let timer = ManualTimer::new();
        let apparatus = Apparatus::new(
            RecordingScreen::new((800.0, 600.0)),
            ScriptedInput::new(timer.clone()),
            timer,
            RandomStimuli::seeded(Some(1)),
        );
        Session::new(config, apparatus)
    }

    #[test]
    fn specs_follow_block_order() {
        let session = session(SessionConfig::default()).unwrap();
        let specs = session.block_specs();
        let kinds: Vec<_> = specs.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, BlockKind::ALL.to_vec());
        let mins: Vec<_> = specs.iter().map(|s| s.min_trials).collect();
        assert_eq!(mins, vec![6, 5, 6, 5]);
        assert_eq!(specs[1].instructions, session.locale().instruction(BlockKind::TextIncongruent));
    }

    #[test]
    fn invalid_config_is_rejected_before_running() {
        let config = SessionConfig {
            palette: Palette::new(vec![Swatch::new("RED", Rgb(255, 0, 0))]).unwrap(),
            ..SessionConfig::default()
        };
        assert!(matches!(
            session(config),
            Err(ExperimentError::PaletteTooSmall { .. })
        ));
    }

    #[test]
    fn discard_is_clamped_to_block_length() {
        let mut set = SessionResultSet::default();
        set.push(
            BlockOutcome {
                kind: BlockKind::TextCongruent,
                results: Vec::new(),
                presentations: 0,
                extra_trials: 0,
            },
            3,
        );
        assert_eq!(set.blocks()[0].discarded, 0);
        assert!(set.is_empty());
    }

    #[test]
    fn closed_input_aborts_the_session() {
        let mut session = session(SessionConfig {
            instruction_mode: crate::config::InstructionMode::Click,
            ..SessionConfig::default()
        })
        .unwrap();
        assert!(matches!(session.run(), Err(ExperimentError::InputClosed)));
    }
}
