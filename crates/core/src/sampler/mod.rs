use std::time::Duration;

use glam::Vec2;

/// Linear interpolation between `a` and `b`.
pub fn lerp(a: Vec2, b: Vec2, n: f32) -> Vec2 {
    a * (1.0 - n) + b * n
}

/// Tracks raw pointer samples and derives a smoothed position plus a
/// velocity estimate from them.
#[derive(Debug, Clone)]
pub struct PointerSampler {
    lerp_factor: f32,
    raw: Vec2,
    previous: Vec2,
    last_sample_at: Option<Duration>,
    smoothed: Option<Vec2>,
    /// Pixels per millisecond.
    velocity: Vec2,
}

impl PointerSampler {
    pub fn new(lerp_factor: f32) -> Self {
        Self {
            lerp_factor,
            raw: Vec2::ZERO,
            previous: Vec2::ZERO,
            last_sample_at: None,
            smoothed: None,
            velocity: Vec2::ZERO,
        }
    }

    /// Stores a new raw sample taken at `at`.
    ///
    /// The velocity is only refreshed when time has actually advanced since
    /// the previous sample; duplicate timestamps keep the last estimate.
    pub fn record(&mut self, position: Vec2, at: Duration) {
        self.previous = self.raw;
        self.raw = position;

        if let Some(last) = self.last_sample_at {
            let elapsed_ms = at.saturating_sub(last).as_secs_f32() * 1_000.0;
            if elapsed_ms > 0.0 {
                self.velocity = (self.raw - self.previous) / elapsed_ms;
            }
        }
        self.last_sample_at = Some(at);
    }

    /// One smoothing step. Runs every frame whether or not new input arrived.
    pub fn tick(&mut self) {
        let current = self.smoothed.unwrap_or(self.raw);
        self.smoothed = Some(lerp(current, self.raw, self.lerp_factor));
    }

    pub fn raw(&self) -> Vec2 {
        self.raw
    }

    pub fn previous(&self) -> Vec2 {
        self.previous
    }

    /// Smoothed position; before the first tick this is the raw position.
    pub fn smoothed(&self) -> Vec2 {
        self.smoothed.unwrap_or(self.raw)
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }
}
