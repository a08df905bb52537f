use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use stroop_core::{Congruency, ExperimentError, Palette, Stimulus, StimulusPolicy};

/// Supplies the stimulus for each trial.
pub trait StimulusSource {
    fn next_stimulus(
        &mut self,
        policy: StimulusPolicy,
        palette: &Palette,
    ) -> Result<Stimulus, ExperimentError>;
}

/// Uniform random stimuli.
#[derive(Debug, Clone)]
pub struct RandomStimuli<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomStimuli<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomStimuli<StdRng> {
    /// Reproducible when `seed` is set, otherwise seeded from the thread RNG.
    pub fn seeded(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Self::new(rng)
    }
}

impl<R: Rng> StimulusSource for RandomStimuli<R> {
    fn next_stimulus(
        &mut self,
        policy: StimulusPolicy,
        palette: &Palette,
    ) -> Result<Stimulus, ExperimentError> {
        draw_stimulus(policy, palette, &mut self.rng)
    }
}

/// Draws one stimulus.
///
/// Standard: one uniform draw is both word and answer. Incongruent: the word is
/// uniform, the ink is uniform over the other colors, and the ink is the answer.
pub fn draw_stimulus<R: Rng>(
    policy: StimulusPolicy,
    palette: &Palette,
    rng: &mut R,
) -> Result<Stimulus, ExperimentError> {
    let n = palette.len();
    if n < 2 {
        return Err(ExperimentError::PaletteTooSmall {
            required: 2,
            actual: n,
        });
    }

    match policy.congruency() {
        Congruency::Standard => Stimulus::standard(policy, palette, rng.random_range(0..n)),
        Congruency::Incongruent => {
            let nominal = rng.random_range(0..n);
            let mut ink = rng.random_range(0..n - 1);
            if ink >= nominal {
                ink += 1;
            }
            Stimulus::incongruent(policy, palette, nominal, ink)
        }
    }
}

/// Pre-built stimuli served in order, for replays and tests.
#[derive(Debug, Clone, Default)]
pub struct FixedStimuli {
    queue: VecDeque<Stimulus>,
}

impl FixedStimuli {
    pub fn new(stimuli: impl IntoIterator<Item = Stimulus>) -> Self {
        Self {
            queue: stimuli.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl StimulusSource for FixedStimuli {
    fn next_stimulus(
        &mut self,
        policy: StimulusPolicy,
        _palette: &Palette,
    ) -> Result<Stimulus, ExperimentError> {
        let stimulus = self.queue.pop_front().ok_or_else(|| {
            ExperimentError::InvalidStimulus("fixed stimulus list exhausted".to_string())
        })?;
        if stimulus.policy() != policy {
            return Err(ExperimentError::InvalidStimulus(format!(
                "expected a {policy:?} stimulus, got {:?}",
                stimulus.policy()
            )));
        }
        Ok(stimulus)
    }
}
