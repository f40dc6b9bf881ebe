use std::time::Duration;

use glam::Vec2;

use crate::Ease;

/// Values a [`Tween`] can animate.
pub trait Interpolate: Copy {
    fn interpolate(self, to: Self, t: f32) -> Self;
}

impl Interpolate for f32 {
    fn interpolate(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

impl Interpolate for Vec2 {
    fn interpolate(self, to: Self, t: f32) -> Self {
        self.lerp(to, t)
    }
}

/// Where a tween is relative to a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TweenPhase {
    /// Still inside the start delay.
    Waiting,
    /// Running, with linear progress in `[0, 1)`.
    Running(f32),
    Complete,
}

/// Single-property animation anchored at an absolute start time.
#[derive(Debug, Clone, Copy)]
pub struct Tween<T> {
    from: T,
    to: T,
    started_at: Duration,
    delay: Duration,
    duration: Duration,
    ease: Ease,
}

impl<T: Interpolate> Tween<T> {
    pub fn new(from: T, to: T, started_at: Duration, duration: Duration, ease: Ease) -> Self {
        Self {
            from,
            to,
            started_at,
            delay: Duration::ZERO,
            duration,
            ease,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn phase(&self, now: Duration) -> TweenPhase {
        let begin = self.started_at + self.delay;
        if now < begin {
            return TweenPhase::Waiting;
        }
        let elapsed = now - begin;
        if elapsed >= self.duration {
            return TweenPhase::Complete;
        }
        TweenPhase::Running(elapsed.as_secs_f32() / self.duration.as_secs_f32())
    }

    /// Animated value at `now`, holding `from` during the delay and `to`
    /// after completion.
    pub fn value_at(&self, now: Duration) -> T {
        match self.phase(now) {
            TweenPhase::Waiting => self.from,
            TweenPhase::Running(t) => self.from.interpolate(self.to, self.ease.apply(t)),
            TweenPhase::Complete => self.to,
        }
    }
}
