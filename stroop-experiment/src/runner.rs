use crate::compose::{continue_button, instruction_frame, trial_frame};
use crate::config::{InstructionMode, SessionConfig};
use crate::generator::StimulusSource;
use crate::io::{InputEvent, InputSource, Polled, Screen};
use crate::layout::{OptionButton, arrange, hit_test};
use crate::trial::Trial;
use std::time::Duration;
use stroop_core::{
    BlockKind, BlockPhase, ExperimentError, Frame, Locale, OptionStyle, StimulusPolicy,
    TrialResult,
};
use stroop_timing::Timer;
use tracing::{debug, info, trace};

/// Everything a block talks to besides its configuration.
pub struct Apparatus<S, I, T, G> {
    pub screen: S,
    pub input: I,
    pub timer: T,
    pub stimuli: G,
}

impl<S, I, T, G> Apparatus<S, I, T, G> {
    pub fn new(screen: S, input: I, timer: T, stimuli: G) -> Self {
        Self {
            screen,
            input,
            timer,
            stimuli,
        }
    }
}

/// What a block shows and how it is answered. Fixed for the block's duration.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSpec {
    pub kind: BlockKind,
    pub instructions: String,
    pub min_trials: usize,
    pub policy: StimulusPolicy,
    pub option_style: OptionStyle,
}

impl BlockSpec {
    pub fn new(kind: BlockKind, config: &SessionConfig, locale: &Locale) -> Self {
        let policy = kind.policy();
        Self {
            kind,
            instructions: locale.instruction(kind).to_string(),
            min_trials: config.block_trials(kind),
            policy,
            option_style: policy.option_style(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockOutcome {
    pub kind: BlockKind,
    pub results: Vec<TrialResult>,
    /// Stimulus frames shown; equals `results.len()` for a finished block.
    pub presentations: usize,
    /// Trials added after incorrect answers.
    pub extra_trials: usize,
}

/// Drives one block through
/// `Instructing -> Presenting -> AwaitingResponse -> Recording -> (Presenting | BlockComplete)`.
pub struct BlockRunner<'a> {
    spec: BlockSpec,
    config: &'a SessionConfig,
    locale: &'a Locale,
    phase: BlockPhase,
    target_trials: usize,
    extra_trials: usize,
    completed: usize,
    presentations: usize,
    current: Option<Trial>,
    choice: Option<(OptionButton, u64)>,
    results: Vec<TrialResult>,
}

impl<'a> BlockRunner<'a> {
    pub fn new(spec: BlockSpec, config: &'a SessionConfig, locale: &'a Locale) -> Self {
        let target_trials = spec.min_trials;
        Self {
            spec,
            config,
            locale,
            phase: BlockPhase::Instructing,
            target_trials,
            extra_trials: 0,
            completed: 0,
            presentations: 0,
            current: None,
            choice: None,
            results: Vec::new(),
        }
    }

    /// Runs the block to completion. Any error, cancellation included, drops the
    /// results collected so far.
    pub fn run<S, I, T, G>(
        mut self,
        apparatus: &mut Apparatus<S, I, T, G>,
    ) -> Result<BlockOutcome, ExperimentError>
    where
        S: Screen,
        I: InputSource,
        T: Timer,
        G: StimulusSource,
    {
        info!(
            block = %self.spec.kind,
            min_trials = self.spec.min_trials,
            "block started"
        );
        while self.phase != BlockPhase::BlockComplete {
            self.step(apparatus)?;
        }
        info!(
            block = %self.spec.kind,
            results = self.results.len(),
            extra_trials = self.extra_trials,
            "block complete"
        );
        Ok(BlockOutcome {
            kind: self.spec.kind,
            results: self.results,
            presentations: self.presentations,
            extra_trials: self.extra_trials,
        })
    }

    /// Performs the work of the current phase and moves to the next one.
    pub fn step<S, I, T, G>(
        &mut self,
        apparatus: &mut Apparatus<S, I, T, G>,
    ) -> Result<BlockPhase, ExperimentError>
    where
        S: Screen,
        I: InputSource,
        T: Timer,
        G: StimulusSource,
    {
        let next = match self.phase {
            BlockPhase::Instructing => {
                self.instruct(apparatus)?;
                if self.target_trials == 0 {
                    BlockPhase::BlockComplete
                } else {
                    BlockPhase::Presenting
                }
            }
            BlockPhase::Presenting => {
                self.present(apparatus)?;
                BlockPhase::AwaitingResponse
            }
            BlockPhase::AwaitingResponse => match self.current.as_ref() {
                Some(trial) => {
                    let option = wait_for(&mut apparatus.input, |x, y| {
                        hit_test(&trial.options, x, y).cloned()
                    })?;
                    self.choice = Some((option, apparatus.timer.now()));
                    BlockPhase::Recording
                }
                None => BlockPhase::Presenting,
            },
            BlockPhase::Recording => {
                self.record(apparatus)?;
                if self.completed < self.target_trials {
                    BlockPhase::Presenting
                } else {
                    BlockPhase::BlockComplete
                }
            }
            BlockPhase::BlockComplete => BlockPhase::BlockComplete,
        };
        trace!(block = %self.spec.kind, from = ?self.phase, to = ?next, "phase transition");
        self.phase = next;
        Ok(next)
    }

    fn instruct<S, I, T, G>(
        &mut self,
        apparatus: &mut Apparatus<S, I, T, G>,
    ) -> Result<(), ExperimentError>
    where
        S: Screen,
        I: InputSource,
        T: Timer,
    {
        let surface = apparatus.screen.size();
        match self.config.instruction_mode {
            InstructionMode::Timed => {
                let frame =
                    instruction_frame(&self.spec.instructions, self.config, self.locale, surface, None);
                apparatus.screen.present(frame)?;
                pause(
                    &mut apparatus.input,
                    &apparatus.timer,
                    self.config.instruction_duration(),
                )
            }
            InstructionMode::Click => {
                let button = continue_button(surface);
                let frame = instruction_frame(
                    &self.spec.instructions,
                    self.config,
                    self.locale,
                    surface,
                    Some(button),
                );
                apparatus.screen.present(frame)?;
                wait_for(&mut apparatus.input, |x, y| button.contains(x, y).then_some(()))
            }
        }
    }

    fn present<S, I, T, G>(
        &mut self,
        apparatus: &mut Apparatus<S, I, T, G>,
    ) -> Result<(), ExperimentError>
    where
        S: Screen,
        T: Timer,
        G: StimulusSource,
    {
        let surface = apparatus.screen.size();
        let stimulus = apparatus
            .stimuli
            .next_stimulus(self.spec.policy, &self.config.palette)?;
        let options = arrange(
            self.config.layout,
            &self.config.palette,
            surface,
            self.config.button_size,
        );
        let frame = trial_frame(
            &stimulus,
            &options,
            self.spec.option_style,
            self.config,
            self.locale,
            surface,
        );
        apparatus.screen.present(frame)?;

        let onset = apparatus.timer.now();
        let id = self.presentations;
        self.presentations += 1;
        debug!(
            block = %self.spec.kind,
            trial = id,
            target = stimulus.target(),
            label = ?stimulus.label(),
            onset_ns = onset,
            "trial presented"
        );
        self.current = Some(Trial {
            id,
            stimulus,
            options,
            onset,
        });
        Ok(())
    }

    fn record<S, I, T, G>(
        &mut self,
        apparatus: &mut Apparatus<S, I, T, G>,
    ) -> Result<(), ExperimentError>
    where
        S: Screen,
        I: InputSource,
        T: Timer,
    {
        let (Some(trial), Some((option, at))) = (self.current.take(), self.choice.take()) else {
            return Ok(());
        };
        let result = trial.finish(self.spec.kind, &option, at);
        debug!(
            block = %self.spec.kind,
            trial = trial.id,
            target = %result.target,
            response = %result.response,
            correct = result.correct,
            rt_ms = result.reaction_ms(),
            "response recorded"
        );
        if !result.correct {
            self.extend();
        }
        self.results.push(result);
        self.completed += 1;

        apparatus.screen.present(Frame::blank())?;
        pause(
            &mut apparatus.input,
            &apparatus.timer,
            self.config.inter_trial_interval(),
        )
    }

    /// One more trial for an incorrect answer, unless the configured cap is reached.
    fn extend(&mut self) {
        if let Some(cap) = self.config.max_extra_trials {
            if self.extra_trials >= cap {
                debug!(block = %self.spec.kind, cap, "extra trial cap reached");
                return;
            }
        }
        self.extra_trials += 1;
        self.target_trials += 1;
    }

    pub fn phase(&self) -> BlockPhase {
        self.phase
    }

    pub fn spec(&self) -> &BlockSpec {
        &self.spec
    }

    /// Current target, including extensions.
    pub fn target_trials(&self) -> usize {
        self.target_trials
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn presentations(&self) -> usize {
        self.presentations
    }

    pub fn current_trial(&self) -> Option<&Trial> {
        self.current.as_ref()
    }

    pub fn results(&self) -> &[TrialResult] {
        &self.results
    }
}

/// Waits out `duration`, returning early only on cancellation.
pub fn pause<I, T>(input: &mut I, timer: &T, duration: Duration) -> Result<(), ExperimentError>
where
    I: InputSource,
    T: Timer,
{
    let start = timer.now();
    loop {
        let elapsed = timer.elapsed(start);
        if elapsed >= duration {
            return Ok(());
        }
        match input.next_event_timeout(duration - elapsed) {
            Polled::Event(event) if event.is_cancel() => return Err(ExperimentError::Cancelled),
            Polled::Event(event) => trace!(?event, "input ignored during pause"),
            Polled::TimedOut => {
                let elapsed = timer.elapsed(start);
                if elapsed < duration {
                    timer.sleep(duration - elapsed);
                }
                return Ok(());
            }
            Polled::Closed => return Err(ExperimentError::InputClosed),
        }
    }
}

/// Blocks until a pointer activation that `hit` accepts. No timeout.
pub fn wait_for<I, F, R>(input: &mut I, mut hit: F) -> Result<R, ExperimentError>
where
    I: InputSource,
    F: FnMut(f32, f32) -> Option<R>,
{
    loop {
        match input.next_event() {
            None => return Err(ExperimentError::InputClosed),
            Some(InputEvent::Quit | InputEvent::Escape) => return Err(ExperimentError::Cancelled),
            Some(InputEvent::Pointer { x, y }) => match hit(x, y) {
                Some(found) => return Ok(found),
                None => trace!(x, y, "activation outside any target ignored"),
            },
        }
    }
}
