use std::{f32::consts::TAU, path::Path, time::Duration};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{AssetSource, Result, TrailController, TrailError};

/// Fixed-step clock used to replay traces deterministically.
#[derive(Debug, Default, Clone)]
pub struct FrameClock {
    now: Duration,
    frame: u64,
}

impl FrameClock {
    pub fn advance(&mut self, delta: Duration) -> Duration {
        self.now += delta;
        self.frame += 1;
        self.now
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }
}

/// One recorded pointer event in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    pub at_ms: u64,
    pub x: f32,
    pub y: f32,
}

impl PointerSample {
    pub fn new(at_ms: u64, x: f32, y: f32) -> Self {
        Self { at_ms, x, y }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn at(&self) -> Duration {
        Duration::from_millis(self.at_ms)
    }
}

/// Ordered pointer recording.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PointerTrace {
    pub samples: Vec<PointerSample>,
}

impl PointerTrace {
    pub fn new(mut samples: Vec<PointerSample>) -> Self {
        samples.sort_by_key(|sample| sample.at_ms);
        Self { samples }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let trace: Self = serde_json::from_str(&text)?;
        if trace.samples.is_empty() {
            return Err(TrailError::msg("pointer trace contains no samples"));
        }
        Ok(Self::new(trace.samples))
    }

    pub fn write_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Pointer circling `center` once per second, sampled every `step_ms`.
    pub fn orbit(center: Vec2, radius: f32, duration_ms: u64, step_ms: u64) -> Self {
        let step_ms = step_ms.max(1);
        let samples = (0..=duration_ms / step_ms)
            .map(|i| {
                let at_ms = i * step_ms;
                let angle = at_ms as f32 / 1_000.0 * TAU;
                let point = center + Vec2::new(angle.cos(), angle.sin()) * radius;
                PointerSample::new(at_ms, point.x, point.y)
            })
            .collect();
        Self { samples }
    }

    /// Back-and-forth horizontal sweep between `from` and `to`, one leg per
    /// second.
    pub fn sweep(from: Vec2, to: Vec2, duration_ms: u64, step_ms: u64) -> Self {
        let step_ms = step_ms.max(1);
        let samples = (0..=duration_ms / step_ms)
            .map(|i| {
                let at_ms = i * step_ms;
                let leg = at_ms as f32 / 1_000.0;
                let t = if leg.floor() as u64 % 2 == 0 {
                    leg.fract()
                } else {
                    1.0 - leg.fract()
                };
                let point = from.lerp(to, t);
                PointerSample::new(at_ms, point.x, point.y)
            })
            .collect();
        Self { samples }
    }

    pub fn duration(&self) -> Duration {
        self.samples
            .last()
            .map(PointerSample::at)
            .unwrap_or(Duration::ZERO)
    }
}

/// Releases trace samples as the clock passes their timestamps.
#[derive(Debug)]
pub struct TraceCursor<'a> {
    samples: &'a [PointerSample],
    next: usize,
}

impl<'a> TraceCursor<'a> {
    pub fn new(trace: &'a PointerTrace) -> Self {
        Self {
            samples: &trace.samples,
            next: 0,
        }
    }

    /// Samples with timestamps at or before `now` that have not been
    /// released yet.
    pub fn due(&mut self, now: Duration) -> &'a [PointerSample] {
        let start = self.next;
        while self
            .samples
            .get(self.next)
            .map(|sample| sample.at() <= now)
            .unwrap_or(false)
        {
            self.next += 1;
        }
        &self.samples[start..self.next]
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.samples.len()
    }
}

/// Feeds a trace through `controller` at a fixed frame interval.
///
/// The visitor runs after every frame. Once the trace is exhausted and the
/// throttle window after the last sample has closed, the controller is torn
/// down. Frames continue for `tail` so the last elements can fade out.
pub fn replay<S, F>(
    controller: &mut TrailController<S>,
    trace: &PointerTrace,
    frame_interval: Duration,
    tail: Duration,
    mut visit: F,
) -> Result<u64>
where
    S: AssetSource,
    F: FnMut(&TrailController<S>, &FrameClock) -> Result<()>,
{
    if frame_interval.is_zero() {
        return Err(TrailError::InvalidConfig("frame interval must be non-zero"));
    }

    let mut clock = FrameClock::default();
    let mut cursor = TraceCursor::new(trace);
    let end = trace.duration() + tail;
    // A trailing throttled spawn can still be pending one interval after
    // the last sample.
    let settle_at = trace.duration() + controller.config().throttle_interval();

    while clock.now() <= end {
        for sample in cursor.due(clock.now()) {
            controller.pointer_moved(sample.position(), sample.at());
        }
        controller.frame(clock.now());
        if cursor.is_finished() && clock.now() >= settle_at {
            controller.teardown();
        }
        visit(controller, &clock)?;
        clock.advance(frame_interval);
    }

    tracing::info!(frames = clock.frame(), "replay finished");
    Ok(clock.frame())
}
