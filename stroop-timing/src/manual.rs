use crate::timer::{CalibrationStats, Timer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Clock that only moves when told to. Clones share the same time.
///
/// `sleep` advances the clock instead of blocking, so scripted sessions run instantly
/// with exact, reproducible reaction times.
#[derive(Debug, Clone, Default)]
pub struct ManualTimer {
    now_ns: Arc<AtomicU64>,
    frames: Arc<Mutex<Vec<Duration>>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, d: Duration) {
        self.now_ns.fetch_add(d.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Timer for ManualTimer {
    fn now(&self) -> u64 {
        self.now_ns.load(Ordering::SeqCst)
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }

    fn record_frame(&mut self, d: Duration) {
        if let Ok(mut frames) = self.frames.lock() {
            frames.push(d);
        }
    }

    fn calibration_stats(&self) -> CalibrationStats {
        match self.frames.lock() {
            Ok(frames) => CalibrationStats::from_frames(&frames),
            Err(_) => CalibrationStats::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_clock() {
        let timer = ManualTimer::new();
        let other = timer.clone();
        let t0 = timer.now();
        other.advance(Duration::from_millis(250));
        timer.sleep(Duration::from_millis(250));
        assert_eq!(timer.elapsed(t0), Duration::from_millis(500));
    }
}
