use glam::Vec2;
use serde::{Deserialize, Serialize};

/// How distance from the last spawn is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateMetric {
    /// Either axis moved further than the threshold.
    AxisAligned,
    /// Straight-line distance is greater than the threshold.
    Euclidean,
}

/// Returns true when `current` is far enough from `last` to spawn.
pub fn exceeds(current: Vec2, last: Vec2, threshold: f32, metric: GateMetric) -> bool {
    let delta = current - last;
    match metric {
        GateMetric::AxisAligned => delta.x.abs() > threshold || delta.y.abs() > threshold,
        GateMetric::Euclidean => delta.length() > threshold,
    }
}

/// Outcome of a successful gate check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnTicket {
    pub position: Vec2,
    /// Monotonic spawn counter value consumed by this spawn.
    pub sequence: u64,
    pub asset_index: usize,
}

/// Distance gate that rate-limits element creation.
#[derive(Debug, Clone)]
pub struct SpawnGate {
    threshold: f32,
    metric: GateMetric,
    asset_count: usize,
    last_spawn: Vec2,
    counter: u64,
}

impl SpawnGate {
    pub fn new(threshold: f32, metric: GateMetric, asset_count: usize) -> Self {
        Self {
            threshold,
            metric,
            asset_count: asset_count.max(1),
            last_spawn: Vec2::ZERO,
            counter: 0,
        }
    }

    /// Checks `current` against the last spawn position and, on success,
    /// moves the anchor and advances the asset counter.
    pub fn check(&mut self, current: Vec2) -> Option<SpawnTicket> {
        if !exceeds(current, self.last_spawn, self.threshold, self.metric) {
            return None;
        }

        let ticket = SpawnTicket {
            position: current,
            sequence: self.counter,
            asset_index: (self.counter % self.asset_count as u64) as usize,
        };
        self.last_spawn = current;
        self.counter += 1;
        Some(ticket)
    }

    pub fn last_spawn(&self) -> Vec2 {
        self.last_spawn
    }

    pub fn spawn_count(&self) -> u64 {
        self.counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_exclusive() {
        let gate = |x: f32| exceeds(Vec2::new(x, 0.0), Vec2::ZERO, 80.0, GateMetric::AxisAligned);
        assert!(!gate(80.0));
        assert!(gate(80.5));
        assert!(gate(-81.0));
    }

    #[test]
    fn metrics_disagree_on_diagonals() {
        let diagonal = Vec2::new(60.0, 60.0);
        assert!(!exceeds(diagonal, Vec2::ZERO, 80.0, GateMetric::AxisAligned));
        assert!(exceeds(diagonal, Vec2::ZERO, 80.0, GateMetric::Euclidean));
    }

    #[test]
    fn gate_moves_anchor_only_on_spawn() {
        let mut gate = SpawnGate::new(80.0, GateMetric::AxisAligned, 8);

        let first = gate.check(Vec2::new(100.0, 0.0)).unwrap();
        assert_eq!(first.asset_index, 0);
        assert_eq!(gate.last_spawn(), Vec2::new(100.0, 0.0));

        assert!(gate.check(Vec2::new(130.0, 0.0)).is_none());
        assert_eq!(gate.last_spawn(), Vec2::new(100.0, 0.0));
        assert_eq!(gate.spawn_count(), 1);
    }

    #[test]
    fn asset_index_cycles_through_eight() {
        let mut gate = SpawnGate::new(80.0, GateMetric::AxisAligned, 8);
        let indices: Vec<usize> = (1..=17)
            .filter_map(|step| gate.check(Vec2::new(step as f32 * 100.0, 0.0)))
            .map(|ticket| ticket.asset_index)
            .collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5, 6, 7, 0, 1, 2, 3, 4, 5, 6, 7, 0]);
    }
}
