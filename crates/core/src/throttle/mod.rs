use std::time::Duration;

/// Fixed-interval throttle with a leading run and one trailing run.
///
/// The wrapped action never runs more than once per interval. Calls that
/// land inside an open window are coalesced into a single trailing run that
/// [`Throttle::poll`] releases once the window closes.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last_run: Option<Duration>,
    pending: bool,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
            pending: false,
        }
    }

    /// Returns true when the action should run now.
    pub fn call(&mut self, now: Duration) -> bool {
        if self.window_open(now) {
            self.pending = true;
            return false;
        }
        self.run(now);
        true
    }

    /// Releases a deferred call once its window has elapsed.
    pub fn poll(&mut self, now: Duration) -> bool {
        if !self.pending || self.window_open(now) {
            return false;
        }
        self.run(now);
        true
    }

    pub fn has_pending(&self) -> bool {
        self.pending
    }

    /// Drops any deferred call.
    pub fn cancel(&mut self) {
        self.pending = false;
    }

    fn window_open(&self, now: Duration) -> bool {
        self.last_run
            .map(|last| now.saturating_sub(last) < self.interval)
            .unwrap_or(false)
    }

    fn run(&mut self, now: Duration) {
        self.last_run = Some(now);
        self.pending = false;
    }
}
