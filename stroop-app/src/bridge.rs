//! Message-passing ends of the session's screen and input, for a session
//! running off the window thread.

use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stroop_core::{ExperimentError, Frame};
use stroop_experiment::{InputEvent, InputSource, Polled, Screen, SessionResultSet};
use winit::event_loop::EventLoopProxy;

#[derive(Debug)]
pub enum AppEvent {
    Frame(Frame),
    Finished(Result<SessionResultSet, ExperimentError>),
}

/// Window size shared between the event loop and the session thread.
#[derive(Debug, Clone, Default)]
pub struct SharedSize(Arc<Mutex<(f32, f32)>>);

impl SharedSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self(Arc::new(Mutex::new((width as f32, height as f32))))
    }

    pub fn set(&self, width: u32, height: u32) {
        let mut size = self.0.lock().unwrap_or_else(|e| e.into_inner());
        *size = (width as f32, height as f32);
    }

    pub fn get(&self) -> (f32, f32) {
        *self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Hands frames to the event loop, which paints the latest one.
pub struct WindowScreen {
    proxy: EventLoopProxy<AppEvent>,
    size: SharedSize,
}

impl WindowScreen {
    pub fn new(proxy: EventLoopProxy<AppEvent>, size: SharedSize) -> Self {
        Self { proxy, size }
    }
}

impl Screen for WindowScreen {
    fn size(&self) -> (f32, f32) {
        self.size.get()
    }

    fn present(&mut self, frame: Frame) -> Result<(), ExperimentError> {
        self.proxy
            .send_event(AppEvent::Frame(frame))
            .map_err(|_| ExperimentError::Display("window event loop has closed".to_string()))
    }
}

/// Input forwarded from the window thread.
pub struct ChannelInput {
    rx: Receiver<InputEvent>,
}

impl ChannelInput {
    pub fn new(rx: Receiver<InputEvent>) -> Self {
        Self { rx }
    }
}

impl InputSource for ChannelInput {
    fn next_event(&mut self) -> Option<InputEvent> {
        self.rx.recv().ok()
    }

    fn next_event_timeout(&mut self, timeout: Duration) -> Polled {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Polled::Event(event),
            Err(RecvTimeoutError::Timeout) => Polled::TimedOut,
            Err(RecvTimeoutError::Disconnected) => Polled::Closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn events_arrive_in_order_then_close() {
        let (tx, rx) = unbounded();
        let mut input = ChannelInput::new(rx);
        tx.send(InputEvent::Pointer { x: 1.0, y: 2.0 }).unwrap();
        tx.send(InputEvent::Escape).unwrap();
        drop(tx);

        assert_eq!(input.next_event(), Some(InputEvent::Pointer { x: 1.0, y: 2.0 }));
        assert_eq!(
            input.next_event_timeout(Duration::from_millis(10)),
            Polled::Event(InputEvent::Escape)
        );
        assert_eq!(input.next_event(), None);
        assert_eq!(input.next_event_timeout(Duration::from_millis(10)), Polled::Closed);
    }

    #[test]
    fn quiet_channel_times_out() {
        let (_tx, rx) = unbounded::<InputEvent>();
        let mut input = ChannelInput::new(rx);
        assert_eq!(input.next_event_timeout(Duration::from_millis(5)), Polled::TimedOut);
    }

    #[test]
    fn size_updates_are_shared() {
        let size = SharedSize::new(800, 600);
        let seen_by_session = size.clone();
        size.set(1920, 1080);
        assert_eq!(seen_by_session.get(), (1920.0, 1080.0));
    }
}
