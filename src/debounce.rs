use std::time::{Duration, Instant};

pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(200);

/// Trailing-edge debounce. Each `schedule` pushes the deadline out by the
/// full window; the action runs once the caller's clock passes it.
///
/// The caller supplies `Instant`s and pumps `fire`, so there is no timer
/// thread to coordinate with and tests can step time directly.
#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Returns true exactly once per elapsed deadline.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_WINDOW)
    }
}
