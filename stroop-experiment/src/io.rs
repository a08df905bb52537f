//! Seams to the outside world: the screen the session draws on and the event
//! stream the subject drives it with.

use std::time::Duration;
use stroop_core::{ExperimentError, Frame};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Window closed or process asked to stop.
    Quit,
    Escape,
    /// Primary button pressed at surface coordinates.
    Pointer { x: f32, y: f32 },
}

impl InputEvent {
    pub fn is_cancel(&self) -> bool {
        matches!(self, InputEvent::Quit | InputEvent::Escape)
    }
}

/// Result of a bounded wait on the input stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Polled {
    Event(InputEvent),
    TimedOut,
    Closed,
}

/// Event stream from the subject. Not restartable.
pub trait InputSource {
    /// Blocks until the next event; `None` once the stream has ended.
    fn next_event(&mut self) -> Option<InputEvent>;

    /// Waits at most `timeout` for an event. Sources may return `TimedOut` early;
    /// callers account for the remaining time on their own clock.
    fn next_event_timeout(&mut self, timeout: Duration) -> Polled;
}

/// Display surface. Frames are complete screens; the session never reads pixels back.
pub trait Screen {
    /// Current drawable size in pixels.
    fn size(&self) -> (f32, f32);
    fn present(&mut self, frame: Frame) -> Result<(), ExperimentError>;
}

impl<S: Screen + ?Sized> Screen for &mut S {
    fn size(&self) -> (f32, f32) {
        (**self).size()
    }

    fn present(&mut self, frame: Frame) -> Result<(), ExperimentError> {
        (**self).present(frame)
    }
}

impl<I: InputSource + ?Sized> InputSource for &mut I {
    fn next_event(&mut self) -> Option<InputEvent> {
        (**self).next_event()
    }

    fn next_event_timeout(&mut self, timeout: Duration) -> Polled {
        (**self).next_event_timeout(timeout)
    }
}
