use std::time::Duration;

use cursor_trail_core::{
    gate, GateMetric, PointerSampler, SwatchSource, TrailConfig, TrailController,
};
use glam::Vec2;
use rand::{rngs::StdRng, Rng, SeedableRng};

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn random_walk(rng: &mut StdRng, steps: usize, max_step: f32) -> Vec<Vec2> {
    let mut position = Vec2::new(640.0, 360.0);
    (0..steps)
        .map(|_| {
            position += Vec2::new(
                rng.gen_range(-max_step..=max_step),
                rng.gen_range(-max_step..=max_step),
            );
            position
        })
        .collect()
}

#[test]
fn attached_count_never_exceeds_cap() {
    let mut rng = StdRng::seed_from_u64(7);
    let latencies: Vec<Duration> = (0..13).map(|_| ms(rng.gen_range(0..120))).collect();

    for cap in [1, 12, 20] {
        let config = TrailConfig {
            max_elements: cap,
            pointer_offset: Vec2::ZERO,
            ..TrailConfig::motion()
        };
        let source = SwatchSource::new(2).with_latencies(latencies.clone());
        let mut trail = TrailController::new(config, 8, source).unwrap();

        let mut last_seen = None;
        for (step, point) in random_walk(&mut rng, 3_000, 60.0).into_iter().enumerate() {
            let at = ms(step as u64 * 4);
            trail.pointer_moved(point, at);
            if step % 4 == 0 {
                trail.frame(at);
                assert!(trail.display().len() <= cap);
                if trail.display().len() == cap {
                    last_seen = trail.display().iter().next();
                }
            }
        }

        assert!(trail.stats().evicted > 0, "cap {cap} never filled");
        assert!(last_seen.is_some());
        assert_eq!(trail.stats().peak_attached, cap);
    }
}

#[test]
fn spawns_exactly_when_gate_is_exceeded() {
    let mut rng = StdRng::seed_from_u64(42);
    let config = TrailConfig {
        pointer_offset: Vec2::ZERO,
        throttle_interval_ms: 0,
        ..TrailConfig::classic()
    };
    let mut trail = TrailController::new(config.clone(), 8, SwatchSource::new(2)).unwrap();

    let mut anchor = Vec2::ZERO;
    for (step, point) in random_walk(&mut rng, 2_000, 40.0).into_iter().enumerate() {
        let before = trail.stats().spawned;
        trail.pointer_moved(point, ms(step as u64));
        let spawned = trail.stats().spawned > before;

        let expected = gate::exceeds(point, anchor, config.spawn_threshold, GateMetric::AxisAligned);
        assert_eq!(spawned, expected, "step {step} at {point:?} from {anchor:?}");
        if expected {
            anchor = point;
        }
    }
}

#[test]
fn asset_indices_cycle_through_eight() {
    let config = TrailConfig {
        pointer_offset: Vec2::ZERO,
        ..TrailConfig::classic()
    };
    let mut trail = TrailController::new(config, 8, SwatchSource::new(2)).unwrap();

    let mut indices = Vec::new();
    for step in 1..=24u64 {
        let at = ms(step * 20);
        trail.pointer_moved(Vec2::new(step as f32 * 90.0, 0.0), at);
        trail.frame(at);
        if let Some(sprite) = trail.sprites().last() {
            indices.push(sprite.asset_index);
        }
    }

    let expected: Vec<usize> = (0..24).map(|i| i % 8).collect();
    assert_eq!(indices, expected);
}

#[test]
fn smoothing_converges_from_random_starts() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..50 {
        let start = Vec2::new(rng.gen_range(-1e3..1e3), rng.gen_range(-1e3..1e3));
        let target = Vec2::new(rng.gen_range(-1e3..1e3), rng.gen_range(-1e3..1e3));

        let mut sampler = PointerSampler::new(0.1);
        sampler.record(start, ms(0));
        sampler.tick();
        sampler.record(target, ms(16));

        for _ in 0..200 {
            sampler.tick();
        }
        assert!(sampler.smoothed().distance(target) < 0.05);
    }
}
