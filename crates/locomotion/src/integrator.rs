use glam::{Quat, Vec3};
use rigspace_common::{PlayerRig, Sensitivity};
use rigspace_input::PadSnapshot;
use serde::{Deserialize, Serialize};

/// Whether pad displacement is per frame or per second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeScaling {
    /// Fixed step per frame; speed follows the frame rate.
    #[default]
    PerFrame,
    /// Step multiplied by the frame delta.
    PerSecond,
}

/// Applies the pads to the player rig once per frame.
///
/// `left` moves the rig in its yaw frame; `right.x` turns it and `right.y`
/// lowers or raises it. No clamping.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LocomotionIntegrator {
    pub sensitivity: Sensitivity,
    pub scaling: TimeScaling,
}

impl LocomotionIntegrator {
    pub fn new(sensitivity: Sensitivity, scaling: TimeScaling) -> Self {
        Self {
            sensitivity,
            scaling,
        }
    }

    pub fn integrate(&self, rig: &mut PlayerRig, pads: &PadSnapshot, dt: f32) {
        let scale = match self.scaling {
            TimeScaling::PerFrame => 1.0,
            TimeScaling::PerSecond => dt,
        };
        let sens = &self.sensitivity;

        let local = Vec3::new(
            pads.left.x * sens.left.x,
            0.0,
            pads.left.y * sens.left.y,
        );
        rig.position += Quat::from_rotation_y(rig.yaw) * local * scale;

        rig.yaw -= pads.right.x * sens.right.x * scale;
        rig.position.y -= pads.right.y * sens.right.y * scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigspace_common::Pad;
    use std::f32::consts::FRAC_PI_2;

    fn pads(left: (f32, f32), right: (f32, f32)) -> PadSnapshot {
        PadSnapshot {
            left: Pad::new(left.0, left.1),
            right: Pad::new(right.0, right.1),
        }
    }

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn left_pad_strafes_at_yaw_zero() {
        let integ = LocomotionIntegrator::default();
        let mut rig = PlayerRig::default();
        integ.integrate(&mut rig, &pads((1.0, 0.0), (0.0, 0.0)), 1.0 / 60.0);
        assert!(approx(rig.position, Vec3::new(0.2, 0.0, 0.0)));
        assert_eq!(rig.yaw, 0.0);
    }

    #[test]
    fn translation_follows_yaw() {
        let integ = LocomotionIntegrator::default();
        let mut rig = PlayerRig::new(Vec3::ZERO, FRAC_PI_2);
        integ.integrate(&mut rig, &pads((1.0, 0.0), (0.0, 0.0)), 1.0 / 60.0);
        // +X rotated a quarter turn about +Y lands on -Z.
        assert!(approx(rig.position, Vec3::new(0.0, 0.0, -0.2)));
    }

    #[test]
    fn right_pad_turns_and_lifts() {
        let integ = LocomotionIntegrator::default();
        let mut rig = PlayerRig::new(Vec3::new(0.0, 4.0, 0.0), 0.0);
        integ.integrate(&mut rig, &pads((0.0, 0.0), (1.0, -1.0)), 1.0 / 60.0);
        assert!((rig.yaw + 0.01).abs() < 1e-6);
        assert!((rig.position.y - 4.1).abs() < 1e-5);
    }

    #[test]
    fn zero_sensitivity_is_a_no_op() {
        let integ = LocomotionIntegrator::new(Sensitivity::ZERO, TimeScaling::PerFrame);
        let start = PlayerRig::new(Vec3::new(7.0, 4.0, 21.0), 0.3);
        let mut rig = start;
        integ.integrate(&mut rig, &pads((1.0, -1.0), (0.5, 0.5)), 1.0 / 60.0);
        assert_eq!(rig, start);
    }

    #[test]
    fn per_second_scales_by_delta() {
        let integ = LocomotionIntegrator::new(Sensitivity::default(), TimeScaling::PerSecond);
        let mut rig = PlayerRig::default();
        integ.integrate(&mut rig, &pads((1.0, 0.0), (2.0, 0.0)), 0.5);
        assert!(approx(rig.position, Vec3::new(0.1, 0.0, 0.0)));
        assert!((rig.yaw + 0.01).abs() < 1e-6);
    }

    #[test]
    fn no_clamping_over_many_frames() {
        let integ = LocomotionIntegrator::default();
        let mut rig = PlayerRig::default();
        for _ in 0..1000 {
            integ.integrate(&mut rig, &pads((0.0, 1.0), (0.0, 0.0)), 1.0 / 60.0);
        }
        assert!((rig.position.z - 200.0).abs() < 1e-2);
    }

    #[test]
    fn scaling_reads_from_yaml() {
        let s: TimeScaling = serde_yaml::from_str("per_second").unwrap();
        assert_eq!(s, TimeScaling::PerSecond);
    }
}
