use std::{path::Path, time::Duration};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{GateMetric, Result, TrailError};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub trail: TrailConfig,
    pub assets: AssetConfig,
    pub render: RenderConfig,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing sections fall back to their
    /// defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.trail.validate()?;
        config.assets.validate()?;
        Ok(config)
    }
}

/// Which target each new element animates towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailVariant {
    /// Elements settle on the pointer position that triggered them.
    Smoothed,
    /// Elements overshoot along the pointer velocity.
    MotionAware,
}

/// Tuning knobs for the trail controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailConfig {
    pub variant: TrailVariant,
    /// Maximum number of elements attached to the display at once.
    pub max_elements: usize,
    /// Distance the pointer must travel from the last spawn before a new
    /// element is created.
    pub spawn_threshold: f32,
    pub gate_metric: GateMetric,
    pub throttle_interval_ms: u64,
    /// Blend factor for the per-frame smoothing step.
    pub lerp_factor: f32,
    /// Added to every raw pointer sample so images sit off-centre from the
    /// cursor.
    pub pointer_offset: Vec2,
    /// Velocity multiplier (px per px/ms) for the motion-aware target.
    pub look_ahead: f32,
    pub enter_duration_ms: u64,
    pub fade_delay_ms: u64,
    pub fade_duration_ms: u64,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self::classic()
    }
}

impl TrailConfig {
    /// Smoothed trail capped at twelve elements.
    pub fn classic() -> Self {
        Self {
            variant: TrailVariant::Smoothed,
            max_elements: 12,
            spawn_threshold: 80.0,
            gate_metric: GateMetric::AxisAligned,
            throttle_interval_ms: 10,
            lerp_factor: 0.1,
            pointer_offset: Vec2::new(-100.0, -150.0),
            look_ahead: 16.0,
            enter_duration_ms: 2_000,
            fade_delay_ms: 1_000,
            fade_duration_ms: 500,
        }
    }

    /// Velocity-extrapolated trail capped at twenty elements.
    pub fn motion() -> Self {
        Self {
            variant: TrailVariant::MotionAware,
            max_elements: 20,
            ..Self::classic()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_elements == 0 {
            return Err(TrailError::InvalidConfig("max_elements must be at least 1"));
        }
        if !(self.spawn_threshold > 0.0) {
            return Err(TrailError::InvalidConfig("spawn_threshold must be positive"));
        }
        if !(self.lerp_factor > 0.0 && self.lerp_factor <= 1.0) {
            return Err(TrailError::InvalidConfig("lerp_factor must lie in (0, 1]"));
        }
        if !self.look_ahead.is_finite() {
            return Err(TrailError::InvalidConfig("look_ahead must be finite"));
        }
        Ok(())
    }

    pub fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.throttle_interval_ms)
    }

    pub fn enter_duration(&self) -> Duration {
        Duration::from_millis(self.enter_duration_ms)
    }

    pub fn fade_delay(&self) -> Duration {
        Duration::from_millis(self.fade_delay_ms)
    }

    pub fn fade_duration(&self) -> Duration {
        Duration::from_millis(self.fade_duration_ms)
    }
}

/// Where trail images come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub dir: String,
    pub count: usize,
    pub extension: String,
}

impl AssetConfig {
    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(TrailError::InvalidConfig("asset count must be at least 1"));
        }
        if self.extension.trim().is_empty() {
            return Err(TrailError::InvalidConfig("asset extension must not be empty"));
        }
        Ok(())
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            dir: "assets/img".to_string(),
            count: 8,
            extension: "jpeg".to_string(),
        }
    }
}

/// Output surface used by the compositor and recorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub background: [u8; 4],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 60,
            background: [18, 18, 18, 255],
        }
    }
}

impl RenderConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }
}
