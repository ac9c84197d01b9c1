use rigspace_common::{Pad, PadSide};
use serde::{Deserialize, Serialize};

use crate::pads::{PadState, SourceKind};

/// Axis magnitudes at or below this are treated as zero.
pub const DEFAULT_DEADZONE: f32 = 0.1;

/// `x` if `|x| > min`, else exactly `0.0`. NaN reads as zero.
pub fn deadzone(x: f32, min: f32) -> f32 {
    if x.abs() > min { x } else { 0.0 }
}

/// Axis state of one physical gamepad at the start of a frame.
///
/// Axes follow the standard gamepad layout: 0/1 left stick, 2/3 right stick,
/// +y pointing down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamepadSnapshot {
    pub index: usize,
    pub id: String,
    pub axes: Vec<f32>,
}

impl GamepadSnapshot {
    pub fn new(index: usize, id: impl Into<String>, axes: Vec<f32>) -> Self {
        Self {
            index,
            id: id.into(),
            axes,
        }
    }

    pub fn axis(&self, i: usize) -> f32 {
        self.axes.get(i).copied().unwrap_or(0.0)
    }
}

/// Anything that can hand out per-frame gamepad snapshots by index.
pub trait GamepadPoll {
    fn gamepad(&self, index: usize) -> Option<&GamepadSnapshot>;
}

impl GamepadPoll for [GamepadSnapshot] {
    fn gamepad(&self, index: usize) -> Option<&GamepadSnapshot> {
        self.iter().find(|gp| gp.index == index)
    }
}

impl GamepadPoll for Vec<GamepadSnapshot> {
    fn gamepad(&self, index: usize) -> Option<&GamepadSnapshot> {
        self.as_slice().gamepad(index)
    }
}

/// A platform with no gamepads at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGamepads;

impl GamepadPoll for NoGamepads {
    fn gamepad(&self, _index: usize) -> Option<&GamepadSnapshot> {
        None
    }
}

/// Physical gamepad source.
///
/// Exists only while the aggregator has its connect listener registered.
/// Tracks the index of the most recently connected pad and polls it each
/// frame.
#[derive(Debug, Clone)]
pub struct PhysicalGamepad {
    index: Option<usize>,
    deadzone: f32,
}

impl PhysicalGamepad {
    pub fn new(deadzone: f32) -> Self {
        Self {
            index: None,
            deadzone,
        }
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn on_connected(&mut self, index: usize, id: &str, axis_count: usize) {
        tracing::info!(index, id, axis_count, "gamepad connected");
        self.index = Some(index);
    }

    /// Returns true if the disconnected pad was the registered one.
    pub fn on_disconnected(&mut self, index: usize) -> bool {
        if self.index == Some(index) {
            tracing::info!(index, "gamepad disconnected");
            self.index = None;
            true
        } else {
            tracing::debug!(index, "ignoring disconnect of unregistered gamepad");
            false
        }
    }

    /// Write both pads from the registered gamepad. Returns false when there
    /// is nothing to poll.
    pub fn poll(&self, platform: &dyn GamepadPoll, pads: &mut PadState) -> bool {
        let Some(index) = self.index else {
            return false;
        };
        let Some(gp) = platform.gamepad(index) else {
            return false;
        };

        let dz = |i| deadzone(gp.axis(i), self.deadzone);
        pads.write(PadSide::Left, Pad::new(dz(0), dz(1)), SourceKind::Gamepad);
        pads.write(PadSide::Right, Pad::new(dz(2), dz(3)), SourceKind::Gamepad);
        true
    }

    pub(crate) fn release(&mut self) {
        self.index = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadzone_zeroes_small_inputs() {
        for i in 0..=100 {
            let x = i as f32 / 1000.0;
            assert_eq!(deadzone(x, DEFAULT_DEADZONE), 0.0);
            assert_eq!(deadzone(-x, DEFAULT_DEADZONE), 0.0);
        }
        assert_eq!(deadzone(0.1, DEFAULT_DEADZONE), 0.0);
        assert_eq!(deadzone(f32::NAN, DEFAULT_DEADZONE), 0.0);
    }

    #[test]
    fn deadzone_passes_large_inputs_unchanged() {
        assert_eq!(deadzone(0.11, DEFAULT_DEADZONE), 0.11);
        assert_eq!(deadzone(-0.75, DEFAULT_DEADZONE), -0.75);
        assert_eq!(deadzone(1.0, DEFAULT_DEADZONE), 1.0);
    }

    #[test]
    fn unregistered_gamepad_contributes_nothing() {
        let source = PhysicalGamepad::new(DEFAULT_DEADZONE);
        let platform = vec![GamepadSnapshot::new(0, "pad", vec![1.0, 1.0, 1.0, 1.0])];
        let mut pads = PadState::new();
        assert!(!source.poll(&platform, &mut pads));
        assert_eq!(pads, PadState::new());
    }

    #[test]
    fn polls_axes_into_pads() {
        let mut source = PhysicalGamepad::new(DEFAULT_DEADZONE);
        source.on_connected(1, "pad", 4);
        let platform = vec![
            GamepadSnapshot::new(0, "other", vec![0.9; 4]),
            GamepadSnapshot::new(1, "pad", vec![0.5, 0.05, -0.3, 1.0]),
        ];
        let mut pads = PadState::new();
        assert!(source.poll(&platform, &mut pads));
        assert_eq!(pads.left(), Pad::new(0.5, 0.0));
        assert_eq!(pads.right(), Pad::new(-0.3, 1.0));
    }

    #[test]
    fn missing_axes_read_as_zero() {
        let mut source = PhysicalGamepad::new(DEFAULT_DEADZONE);
        source.on_connected(0, "two-axis", 2);
        let platform = vec![GamepadSnapshot::new(0, "two-axis", vec![0.4, -0.4])];
        let mut pads = PadState::new();
        source.poll(&platform, &mut pads);
        assert_eq!(pads.left(), Pad::new(0.4, -0.4));
        assert_eq!(pads.right(), Pad::ZERO);
    }

    #[test]
    fn registered_index_without_snapshot_is_skipped() {
        let mut source = PhysicalGamepad::new(DEFAULT_DEADZONE);
        source.on_connected(3, "pad", 4);
        let mut pads = PadState::new();
        assert!(!source.poll(&NoGamepads, &mut pads));
    }

    #[test]
    fn disconnect_of_other_index_is_ignored() {
        let mut source = PhysicalGamepad::new(DEFAULT_DEADZONE);
        source.on_connected(0, "pad", 4);
        assert!(!source.on_disconnected(1));
        assert_eq!(source.index(), Some(0));
        assert!(source.on_disconnected(0));
        assert_eq!(source.index(), None);
    }
}
