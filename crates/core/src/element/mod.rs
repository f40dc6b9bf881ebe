//! Per-element lifecycle.
//!
//! Every trail image walks through `Loading → Entering → Visible →
//! FadingOut → Removed`. Transitions are driven by the controller feeding in
//! load completions, frame times and evictions. Once an element is
//! `Removed` every further event is ignored, which is what lets a late fade
//! completion race safely against the population cap.

use std::{fmt, sync::Arc, time::Duration};

use glam::Vec2;
use image::RgbaImage;

use crate::{Ease, SpawnTicket, TrailConfig, Tween, TweenPhase};

/// Identifier handed out by the controller, unique for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalCause {
    Faded,
    Evicted,
    LoadFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
    Loading,
    Entering,
    Visible,
    FadingOut,
    Removed(RemovalCause),
}

impl ElementState {
    pub fn is_attached(self) -> bool {
        matches!(
            self,
            ElementState::Entering | ElementState::Visible | ElementState::FadingOut
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: ElementState,
    pub to: ElementState,
}

/// Durations and curves shared by every element of a trail.
#[derive(Debug, Clone, Copy)]
pub struct ElementTiming {
    pub enter_duration: Duration,
    pub fade_delay: Duration,
    pub fade_duration: Duration,
    pub enter_ease: Ease,
    pub fade_ease: Ease,
}

impl From<&TrailConfig> for ElementTiming {
    fn from(config: &TrailConfig) -> Self {
        Self {
            enter_duration: config.enter_duration(),
            fade_delay: config.fade_delay(),
            fade_duration: config.fade_duration(),
            enter_ease: Ease::Power4Out,
            fade_ease: Ease::Power4Out,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Motion {
    enter: Tween<Vec2>,
    fade: Tween<f32>,
}

pub struct TrailElement {
    id: ElementId,
    asset_index: usize,
    sequence: u64,
    target: Vec2,
    state: ElementState,
    motion: Option<Motion>,
    texture: Option<Arc<RgbaImage>>,
}

impl TrailElement {
    /// Creates an element waiting for its asset.
    pub fn new(id: ElementId, ticket: &SpawnTicket, target: Vec2) -> Self {
        Self {
            id,
            asset_index: ticket.asset_index,
            sequence: ticket.sequence,
            target,
            state: ElementState::Loading,
            motion: None,
            texture: None,
        }
    }

    /// Asset arrived: start the enter tween from `start` and schedule the
    /// fade relative to the same instant.
    pub fn attach(
        &mut self,
        start: Vec2,
        now: Duration,
        timing: &ElementTiming,
        texture: Arc<RgbaImage>,
    ) -> Option<Transition> {
        if self.state != ElementState::Loading {
            return None;
        }

        let enter = Tween::new(start, self.target, now, timing.enter_duration, timing.enter_ease);
        let fade = Tween::new(1.0, 0.0, now, timing.fade_duration, timing.fade_ease)
            .with_delay(timing.fade_delay);
        self.motion = Some(Motion { enter, fade });
        self.texture = Some(texture);

        let from = self.state;
        self.state = ElementState::Entering;
        Some(Transition {
            from,
            to: self.state,
        })
    }

    /// Moves the state forward to match `now`. Returns the transition taken,
    /// if any.
    pub fn advance(&mut self, now: Duration) -> Option<Transition> {
        let motion = match (self.state.is_attached(), self.motion) {
            (true, Some(motion)) => motion,
            _ => return None,
        };

        let next = match motion.fade.phase(now) {
            TweenPhase::Complete => ElementState::Removed(RemovalCause::Faded),
            TweenPhase::Running(_) => ElementState::FadingOut,
            TweenPhase::Waiting => match motion.enter.phase(now) {
                TweenPhase::Complete => ElementState::Visible,
                _ => ElementState::Entering,
            },
        };
        self.move_to(next)
    }

    /// Forced removal. A no-op for elements that are already gone.
    pub fn evict(&mut self) -> Option<Transition> {
        if matches!(self.state, ElementState::Removed(_)) {
            return None;
        }
        self.move_to(ElementState::Removed(RemovalCause::Evicted))
    }

    pub fn fail_load(&mut self) -> Option<Transition> {
        if self.state != ElementState::Loading {
            return None;
        }
        self.move_to(ElementState::Removed(RemovalCause::LoadFailed))
    }

    fn move_to(&mut self, next: ElementState) -> Option<Transition> {
        if next == self.state {
            return None;
        }
        let from = self.state;
        self.state = next;
        if matches!(next, ElementState::Removed(_)) {
            self.texture = None;
        }
        Some(Transition { from, to: next })
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn asset_index(&self) -> usize {
        self.asset_index
    }

    pub fn target(&self) -> Vec2 {
        self.target
    }

    pub fn state(&self) -> ElementState {
        self.state
    }

    pub fn texture(&self) -> Option<&Arc<RgbaImage>> {
        self.texture.as_ref()
    }

    /// Current on-screen position; the target while still loading.
    pub fn position(&self, now: Duration) -> Vec2 {
        self.motion
            .map(|motion| motion.enter.value_at(now))
            .unwrap_or(self.target)
    }

    pub fn opacity(&self, now: Duration) -> f32 {
        match (self.state, self.motion) {
            (ElementState::Removed(_), _) | (_, None) => 0.0,
            (_, Some(motion)) => motion.fade.value_at(now),
        }
    }
}

impl fmt::Debug for TrailElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrailElement")
            .field("id", &self.id)
            .field("asset_index", &self.asset_index)
            .field("sequence", &self.sequence)
            .field("target", &self.target)
            .field("state", &self.state)
            .field("has_texture", &self.texture.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn timing() -> ElementTiming {
        ElementTiming::from(&TrailConfig::classic())
    }

    fn texture() -> Arc<RgbaImage> {
        Arc::new(RgbaImage::new(2, 2))
    }

    fn element() -> TrailElement {
        let ticket = SpawnTicket {
            position: Vec2::new(100.0, 0.0),
            sequence: 0,
            asset_index: 0,
        };
        TrailElement::new(ElementId(1), &ticket, ticket.position)
    }

    #[test]
    fn walks_through_every_state_with_slow_fade() {
        let mut timing = timing();
        timing.fade_delay = ms(3_000);
        let mut element = element();

        element.attach(Vec2::ZERO, ms(0), &timing, texture()).unwrap();
        assert_eq!(element.state(), ElementState::Entering);
        assert!(element.advance(ms(1_000)).is_none());

        let visible = element.advance(ms(2_000)).unwrap();
        assert_eq!(visible.to, ElementState::Visible);
        assert_eq!(element.position(ms(2_000)), Vec2::new(100.0, 0.0));

        assert_eq!(element.advance(ms(3_100)).unwrap().to, ElementState::FadingOut);
        let faded = element.advance(ms(3_500)).unwrap();
        assert_eq!(faded.to, ElementState::Removed(RemovalCause::Faded));
        assert!(element.texture().is_none());
    }

    #[test]
    fn default_timing_fades_while_still_entering() {
        let mut element = element();
        element.attach(Vec2::ZERO, ms(0), &timing(), texture()).unwrap();

        assert_eq!(element.advance(ms(1_200)).unwrap().to, ElementState::FadingOut);
        let position = element.position(ms(1_200));
        assert!(position.x > 0.0 && position.x < 100.0);
        assert!(element.opacity(ms(1_200)) < 1.0);

        assert_eq!(
            element.advance(ms(1_500)).unwrap().to,
            ElementState::Removed(RemovalCause::Faded)
        );
    }

    #[test]
    fn fade_after_eviction_is_ignored() {
        let mut element = element();
        element.attach(Vec2::ZERO, ms(0), &timing(), texture()).unwrap();

        let evicted = element.evict().unwrap();
        assert_eq!(evicted.from, ElementState::Entering);
        assert!(element.advance(ms(10_000)).is_none());
        assert!(element.evict().is_none());
        assert_eq!(element.state(), ElementState::Removed(RemovalCause::Evicted));
        assert_eq!(element.opacity(ms(10)), 0.0);
    }

    #[test]
    fn loading_elements_ignore_time_and_late_attach_after_failure() {
        let mut element = element();
        assert!(element.advance(ms(5_000)).is_none());
        element.fail_load().unwrap();
        assert!(element.attach(Vec2::ZERO, ms(0), &timing(), texture()).is_none());
        assert_eq!(element.state(), ElementState::Removed(RemovalCause::LoadFailed));
    }
}
