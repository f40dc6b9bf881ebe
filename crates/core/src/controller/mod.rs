//! Trail controller.
//!
//! [`TrailController`] owns every piece of trail state: the pointer sampler,
//! the throttled spawn gate, the display child list and the live elements.
//! A host drives it with two calls: [`TrailController::pointer_moved`] for
//! every raw pointer event and [`TrailController::frame`] once per display
//! refresh.

use std::{collections::HashMap, sync::Arc, time::Duration};

use glam::Vec2;
use image::RgbaImage;
use serde::Serialize;

use crate::{
    AssetSource, Display, ElementId, ElementState, ElementTiming, LoadTicket, PointerSampler,
    RemovalCause, Result, SpawnGate, SpawnTicket, Throttle, TrailConfig, TrailElement,
    TrailError, TrailVariant,
};

/// Running counters exposed for diagnostics and the CLI summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrailStats {
    pub spawned: u64,
    pub attached: u64,
    pub evicted: u64,
    pub faded: u64,
    pub failed_loads: u64,
    pub peak_attached: usize,
}

/// Drawable snapshot of one attached element.
#[derive(Debug, Clone)]
pub struct Sprite {
    pub id: ElementId,
    pub asset_index: usize,
    pub position: Vec2,
    pub opacity: f32,
    pub state: ElementState,
    pub texture: Arc<RgbaImage>,
}

pub struct TrailController<S> {
    config: TrailConfig,
    timing: ElementTiming,
    sampler: PointerSampler,
    throttle: Throttle,
    gate: SpawnGate,
    display: Display,
    elements: HashMap<ElementId, TrailElement>,
    loading: HashMap<LoadTicket, ElementId>,
    source: S,
    next_id: u64,
    active: bool,
    now: Duration,
    stats: TrailStats,
}

impl<S: AssetSource> TrailController<S> {
    pub fn new(config: TrailConfig, asset_count: usize, source: S) -> Result<Self> {
        config.validate()?;
        if asset_count == 0 {
            return Err(TrailError::InvalidConfig("asset count must be at least 1"));
        }
        tracing::info!(
            variant = ?config.variant,
            max_elements = config.max_elements,
            asset_count,
            "trail controller created"
        );

        Ok(Self {
            timing: ElementTiming::from(&config),
            sampler: PointerSampler::new(config.lerp_factor),
            throttle: Throttle::new(config.throttle_interval()),
            gate: SpawnGate::new(config.spawn_threshold, config.gate_metric, asset_count),
            display: Display::new(),
            elements: HashMap::new(),
            loading: HashMap::new(),
            source,
            next_id: 0,
            active: true,
            now: Duration::ZERO,
            stats: TrailStats::default(),
            config,
        })
    }

    /// Raw pointer event in client coordinates.
    pub fn pointer_moved(&mut self, client: Vec2, at: Duration) {
        if !self.active {
            return;
        }
        self.sampler.record(client + self.config.pointer_offset, at);
        if self.throttle.call(at) {
            self.try_spawn(at);
        }
    }

    /// One display refresh.
    pub fn frame(&mut self, now: Duration) {
        self.now = now;
        if self.active {
            self.sampler.tick();
            if self.throttle.poll(now) {
                self.try_spawn(now);
            }
        }
        self.collect_loads(now);
        self.advance_elements(now);
        tracing::trace!(?now, attached = self.display.len(), "frame");
    }

    /// Stops pointer sampling and the smoothing loop. Loads and animations
    /// already in flight keep completing on later frames.
    pub fn teardown(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.throttle.cancel();
        tracing::info!(
            attached = self.display.len(),
            in_flight = self.loading.len(),
            "trail controller torn down"
        );
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Attached elements in attach order, as of the last frame.
    pub fn sprites(&self) -> Vec<Sprite> {
        self.display
            .iter()
            .filter_map(|id| self.elements.get(&id))
            .filter_map(|element| {
                Some(Sprite {
                    id: element.id(),
                    asset_index: element.asset_index(),
                    position: element.position(self.now),
                    opacity: element.opacity(self.now),
                    state: element.state(),
                    texture: element.texture()?.clone(),
                })
            })
            .collect()
    }

    pub fn stats(&self) -> TrailStats {
        self.stats
    }

    pub fn config(&self) -> &TrailConfig {
        &self.config
    }

    pub fn sampler(&self) -> &PointerSampler {
        &self.sampler
    }

    pub fn gate(&self) -> &SpawnGate {
        &self.gate
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    pub fn element(&self, id: ElementId) -> Option<&TrailElement> {
        self.elements.get(&id)
    }

    /// Number of spawned elements still waiting on their asset.
    pub fn in_flight(&self) -> usize {
        self.loading.len()
    }

    fn try_spawn(&mut self, at: Duration) {
        let Some(ticket) = self.gate.check(self.sampler.raw()) else {
            return;
        };

        let target = self.target_for(&ticket);
        let id = ElementId(self.next_id);
        self.next_id += 1;

        let load = LoadTicket(id.0);
        self.elements.insert(id, TrailElement::new(id, &ticket, target));
        self.loading.insert(load, id);
        self.source.request(load, ticket.asset_index, at);
        self.stats.spawned += 1;

        tracing::debug!(
            %id,
            asset = ticket.asset_index,
            x = target.x,
            y = target.y,
            "spawned trail element"
        );
    }

    fn target_for(&self, ticket: &SpawnTicket) -> Vec2 {
        match self.config.variant {
            TrailVariant::Smoothed => ticket.position,
            TrailVariant::MotionAware => {
                ticket.position + self.sampler.velocity() * self.config.look_ahead
            }
        }
    }

    fn collect_loads(&mut self, now: Duration) {
        for outcome in self.source.poll(now) {
            let Some(id) = self.loading.remove(&outcome.ticket) else {
                continue;
            };
            match outcome.result {
                Ok(texture) => self.attach(id, texture, now),
                Err(err) => {
                    if let Some(mut element) = self.elements.remove(&id) {
                        element.fail_load();
                    }
                    self.stats.failed_loads += 1;
                    tracing::debug!(%id, error = %err, "asset load failed, dropping element");
                }
            }
        }
    }

    fn attach(&mut self, id: ElementId, texture: Arc<RgbaImage>, now: Duration) {
        let start = self.sampler.smoothed();
        let Some(element) = self.elements.get_mut(&id) else {
            return;
        };
        if element.attach(start, now, &self.timing, texture).is_none() {
            return;
        }

        while self.display.len() >= self.config.max_elements {
            let Some(oldest) = self.display.pop_oldest() else {
                break;
            };
            if let Some(mut evicted) = self.elements.remove(&oldest) {
                if evicted.evict().is_some() {
                    self.stats.evicted += 1;
                    tracing::debug!(id = %oldest, "evicted oldest trail element");
                }
            }
        }

        self.display.append(id);
        self.stats.attached += 1;
        self.stats.peak_attached = self.stats.peak_attached.max(self.display.len());
        tracing::debug!(%id, attached = self.display.len(), "attached trail element");
    }

    fn advance_elements(&mut self, now: Duration) {
        let attached: Vec<ElementId> = self.display.iter().collect();
        for id in attached {
            let Some(element) = self.elements.get_mut(&id) else {
                continue;
            };
            let Some(transition) = element.advance(now) else {
                continue;
            };
            if transition.to == ElementState::Removed(RemovalCause::Faded) {
                self.elements.remove(&id);
                if self.display.remove(id) {
                    self.stats.faded += 1;
                    tracing::debug!(%id, "trail element faded out");
                }
            }
        }
    }
}

impl<S> std::fmt::Debug for TrailController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrailController")
            .field("config", &self.config)
            .field("active", &self.active)
            .field("attached", &self.display.len())
            .field("loading", &self.loading.len())
            .field("stats", &self.stats)
            .finish()
    }
}
