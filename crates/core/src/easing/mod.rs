use serde::{Deserialize, Serialize};

/// Easing curves used by trail tweens.
///
/// `Power4*` follows the usual animation-library naming where "power N" is
/// a polynomial of degree N + 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    Linear,
    Power4In,
    #[default]
    Power4Out,
    Power4InOut,
}

impl Ease {
    /// Maps linear progress in `[0, 1]` to eased progress. Inputs outside
    /// the range are clamped.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::Power4In => t.powi(5),
            Ease::Power4Out => 1.0 - (1.0 - t).powi(5),
            Ease::Power4InOut => {
                if t < 0.5 {
                    16.0 * t.powi(5)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(5) / 2.0
                }
            }
        }
    }
}
