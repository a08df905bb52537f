//! In-memory collaborators for headless runs: a screen that keeps every frame and
//! an input stream that replays a fixed list of events on a shared clock.

use crate::io::{InputEvent, InputSource, Polled, Screen};
use std::collections::VecDeque;
use std::time::Duration;
use stroop_core::{ExperimentError, Frame};
use stroop_timing::Timer;

/// Replays events, advancing `timer` by each event's delay before delivering it.
#[derive(Debug, Clone)]
pub struct ScriptedInput<T: Timer> {
    events: VecDeque<(Duration, InputEvent)>,
    timer: T,
}

impl<T: Timer> ScriptedInput<T> {
    pub fn new(timer: T) -> Self {
        Self {
            events: VecDeque::new(),
            timer,
        }
    }

    pub fn then(mut self, delay: Duration, event: InputEvent) -> Self {
        self.push(delay, event);
        self
    }

    pub fn click(self, delay: Duration, at: (f32, f32)) -> Self {
        self.then(delay, InputEvent::Pointer { x: at.0, y: at.1 })
    }

    pub fn push(&mut self, delay: Duration, event: InputEvent) {
        self.events.push_back((delay, event));
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl<T: Timer> InputSource for ScriptedInput<T> {
    fn next_event(&mut self) -> Option<InputEvent> {
        let (delay, event) = self.events.pop_front()?;
        self.timer.sleep(delay);
        Some(event)
    }

    /// Only a cancellation due within `timeout` is delivered; clicks stay queued for
    /// the next response window.
    fn next_event_timeout(&mut self, timeout: Duration) -> Polled {
        match self.events.front() {
            Some((delay, event)) if event.is_cancel() && *delay <= timeout => {
                let (delay, event) = (*delay, *event);
                self.events.pop_front();
                self.timer.sleep(delay);
                Polled::Event(event)
            }
            _ => Polled::TimedOut,
        }
    }
}

/// Keeps every presented frame.
#[derive(Debug, Clone)]
pub struct RecordingScreen {
    size: (f32, f32),
    frames: Vec<Frame>,
}

impl RecordingScreen {
    pub fn new(size: (f32, f32)) -> Self {
        Self {
            size,
            frames: Vec::new(),
        }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }
}

impl Screen for RecordingScreen {
    fn size(&self) -> (f32, f32) {
        self.size
    }

    fn present(&mut self, frame: Frame) -> Result<(), ExperimentError> {
        self.frames.push(frame);
        Ok(())
    }
}
