use rigspace_common::{Pad, PadSide};
use serde::{Deserialize, Serialize};

use crate::pads::{PadState, SourceKind};

/// Thumbstick axes on an XR controller's gamepad surface.
const THUMBSTICK_X: usize = 2;
const THUMBSTICK_Y: usize = 3;

/// Gamepad surface of one XR input source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XrGamepad {
    pub axes: Vec<f32>,
}

impl XrGamepad {
    fn axis(&self, i: usize) -> f32 {
        match self.axes.get(i) {
            Some(v) if v.is_finite() => *v,
            _ => 0.0,
        }
    }
}

/// A tracked controller as seen in one XR frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XrController {
    pub gamepad: Option<XrGamepad>,
}

impl XrController {
    pub fn with_axes(axes: Vec<f32>) -> Self {
        Self {
            gamepad: Some(XrGamepad { axes }),
        }
    }

    fn thumbstick(&self) -> Pad {
        match &self.gamepad {
            Some(gp) => Pad::new(gp.axis(THUMBSTICK_X), gp.axis(THUMBSTICK_Y)),
            None => Pad::ZERO,
        }
    }
}

/// Input available while the session is presenting. Absent controllers are
/// `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XrFrame {
    pub left: Option<XrController>,
    pub right: Option<XrController>,
}

/// XR controller pair source. Stateless: everything comes from the frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct XrControllers;

impl XrControllers {
    /// Copy each present controller's thumbstick straight into its pad.
    /// No deadzone. Returns the number of pads written.
    pub fn poll(&self, frame: Option<&XrFrame>, pads: &mut PadState) -> usize {
        let Some(frame) = frame else {
            return 0;
        };

        let mut written = 0;
        for (side, controller) in [(PadSide::Left, &frame.left), (PadSide::Right, &frame.right)] {
            if let Some(controller) = controller {
                pads.write(side, controller.thumbstick(), SourceKind::XrController);
                written += 1;
            }
        }
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_frame_no_contribution() {
        let mut pads = PadState::new();
        pads.write(PadSide::Left, Pad::new(0.5, 0.5), SourceKind::Gamepad);
        assert_eq!(XrControllers.poll(None, &mut pads), 0);
        assert_eq!(pads.left(), Pad::new(0.5, 0.5));
    }

    #[test]
    fn thumbsticks_map_without_deadzone() {
        let frame = XrFrame {
            left: Some(XrController::with_axes(vec![0.0, 0.0, 0.05, -0.02])),
            right: Some(XrController::with_axes(vec![0.9, 0.9, -1.0, 0.3])),
        };
        let mut pads = PadState::new();
        assert_eq!(XrControllers.poll(Some(&frame), &mut pads), 2);
        assert_eq!(pads.left(), Pad::new(0.05, -0.02));
        assert_eq!(pads.right(), Pad::new(-1.0, 0.3));
    }

    #[test]
    fn missing_gamepad_or_axes_default_to_zero() {
        let frame = XrFrame {
            left: Some(XrController { gamepad: None }),
            right: Some(XrController::with_axes(vec![0.0, 0.0, f32::NAN])),
        };
        let mut pads = PadState::new();
        pads.write(PadSide::Left, Pad::new(1.0, 1.0), SourceKind::VirtualJoystick);
        XrControllers.poll(Some(&frame), &mut pads);
        assert_eq!(pads.left(), Pad::ZERO);
        assert_eq!(pads.right(), Pad::ZERO);
        assert_eq!(
            pads.channel(PadSide::Left).last_writer(),
            Some(SourceKind::XrController)
        );
    }

    #[test]
    fn absent_controller_leaves_its_pad_alone() {
        let frame = XrFrame {
            left: None,
            right: Some(XrController::with_axes(vec![0.0, 0.0, 0.2, 0.2])),
        };
        let mut pads = PadState::new();
        pads.write(PadSide::Left, Pad::new(0.7, 0.0), SourceKind::Gamepad);
        assert_eq!(XrControllers.poll(Some(&frame), &mut pads), 1);
        assert_eq!(pads.left(), Pad::new(0.7, 0.0));
    }
}
