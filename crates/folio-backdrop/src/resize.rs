//! Trailing-edge debounce of resize requests.

use std::time::{Duration, Instant};

pub const DEFAULT_RESIZE_DELAY: Duration = Duration::from_millis(150);

/// Keeps only the last size of a burst and releases it once no other request
/// arrived for `delay`.
#[derive(Debug, Clone)]
pub struct ResizeDebouncer {
    delay: Duration,
    pending: Option<PendingResize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingResize {
    width: u32,
    height: u32,
    due: Instant,
}

impl Default for ResizeDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_RESIZE_DELAY)
    }
}

impl ResizeDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record a size; restarts the delay.
    pub fn request(&mut self, width: u32, height: u32, now: Instant) {
        self.pending = Some(PendingResize {
            width,
            height,
            due: now + self.delay,
        });
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The size to apply, once its delay has passed.
    pub fn poll(&mut self, now: Instant) -> Option<(u32, u32)> {
        match self.pending {
            Some(p) if p.due <= now => {
                self.pending = None;
                Some((p.width, p.height))
            }
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_applies_last_size_only() {
        let start = Instant::now();
        let mut debouncer = ResizeDebouncer::default();

        debouncer.request(800, 600, start);
        debouncer.request(1024, 768, start + Duration::from_millis(100));
        assert_eq!(debouncer.poll(start + Duration::from_millis(200)), None);

        debouncer.request(1280, 720, start + Duration::from_millis(200));
        assert_eq!(debouncer.poll(start + Duration::from_millis(349)), None);
        assert_eq!(
            debouncer.poll(start + Duration::from_millis(350)),
            Some((1280, 720))
        );
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.poll(start + Duration::from_secs(1)), None);
    }

    #[test]
    fn test_cancel_drops_pending_size() {
        let start = Instant::now();
        let mut debouncer = ResizeDebouncer::default();
        debouncer.request(10, 10, start);
        debouncer.cancel();
        assert_eq!(debouncer.poll(start + Duration::from_secs(1)), None);
    }
}
