//! Frame-rate cap.

pub const DEFAULT_FPS: f64 = 30.0;

/// Decides which animation ticks are drawn.
///
/// A tick sooner than one interval after the last drawn frame is skipped.
/// After drawing, the reference time is moved back by the overshoot so the
/// cadence does not drift.
#[derive(Debug, Clone)]
pub struct FrameClock {
    interval_ms: f64,
    last_ms: f64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_FPS)
    }
}

impl FrameClock {
    pub fn new(fps: f64) -> Self {
        Self {
            interval_ms: 1000.0 / fps,
            last_ms: 0.0,
        }
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    pub fn last_ms(&self) -> f64 {
        self.last_ms
    }

    /// Returns `true` when the tick at `time_ms` should be drawn.
    pub fn tick(&mut self, time_ms: f64) -> bool {
        let elapsed = time_ms - self.last_ms;
        if elapsed < self.interval_ms {
            return false;
        }
        self.last_ms = time_ms - (elapsed % self.interval_ms);
        true
    }

    pub fn reset(&mut self) {
        self.last_ms = 0.0;
    }
}
