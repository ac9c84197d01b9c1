use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A normalized 2D control vector for one logical input channel.
///
/// Conventionally in `[-1, 1]` on both axes; nothing clamps it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pad {
    pub x: f32,
    pub y: f32,
}

impl Pad {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

impl From<Vec2> for Pad {
    fn from(v: Vec2) -> Self {
        Self::new(v.x, v.y)
    }
}

/// Which of the two pads a sample is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PadSide {
    /// Translation intent.
    Left,
    /// Rotation / vertical intent.
    Right,
}

/// Per-axis multipliers for one pad.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisScale {
    pub x: f32,
    pub y: f32,
}

impl AxisScale {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Per-pad sensitivity. Configuration only; the core never mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sensitivity {
    pub left: AxisScale,
    pub right: AxisScale,
}

impl Sensitivity {
    pub const ZERO: Self = Self {
        left: AxisScale::new(0.0, 0.0),
        right: AxisScale::new(0.0, 0.0),
    };
}

impl Default for Sensitivity {
    fn default() -> Self {
        Self {
            left: AxisScale::new(1.0 / 5.0, 1.0 / 5.0),
            right: AxisScale::new(1.0 / 100.0, 1.0 / 10.0),
        }
    }
}
