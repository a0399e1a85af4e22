use std::time::{Duration, Instant};

/// Fixed-rate frame scheduler.
///
/// Deadlines advance in whole intervals from the previous one, so short
/// wake-up jitter does not accumulate. When the loop falls more than one
/// interval behind, the schedule restarts from `now` instead of bursting.
#[derive(Debug, Clone)]
pub struct FramePacer {
    interval: Duration,
    next: Option<Instant>,
}

impl FramePacer {
    /// `fps` is clamped to at least 1.
    pub fn new(fps: u32) -> Self {
        Self {
            interval: Duration::from_secs(1) / fps.max(1),
            next: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns `true` when a frame is due at `now` and schedules the next one.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next {
            Some(next) if now < next => false,
            Some(next) => {
                let following = next + self.interval;
                self.next = Some(if following <= now { now + self.interval } else { following });
                true
            }
            None => {
                self.next = Some(now + self.interval);
                true
            }
        }
    }

    /// Instant the event loop should sleep until.
    pub fn deadline(&self, now: Instant) -> Instant {
        self.next.unwrap_or(now)
    }
}
