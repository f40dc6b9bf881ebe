//! Core library for the Cursor Trail pointer effect.
//!
//! As the pointer moves, the trail spawns short-lived images that glide from
//! a smoothed cursor position to the point that triggered them, fade out and
//! detach. Everything here is headless and deterministic. Time is passed in
//! explicitly, and hosts supply pointer samples, frame ticks and an
//! [`AssetSource`] for images.

pub mod assets;
pub mod config;
pub mod controller;
pub mod display;
pub mod easing;
pub mod element;
pub mod error;
pub mod gate;
pub mod record;
pub mod render;
pub mod sampler;
pub mod throttle;
pub mod timeline;
pub mod tween;

pub use assets::{
    open_source, AssetCatalog, AssetSource, ImageFileSource, LoadOutcome, LoadTicket, SwatchSource,
};
pub use config::{AppConfig, AssetConfig, RenderConfig, TrailConfig, TrailVariant};
pub use controller::{Sprite, TrailController, TrailStats};
pub use display::Display;
pub use easing::Ease;
pub use element::{ElementId, ElementState, ElementTiming, RemovalCause, TrailElement, Transition};
pub use error::{Result, TrailError};
pub use glam::Vec2;
pub use gate::{GateMetric, SpawnGate, SpawnTicket};
pub use record::{FrameRecorder, RecordingSettings};
pub use render::Compositor;
pub use sampler::PointerSampler;
pub use throttle::Throttle;
pub use timeline::{replay, FrameClock, PointerSample, PointerTrace, TraceCursor};
pub use tween::{Interpolate, Tween, TweenPhase};
