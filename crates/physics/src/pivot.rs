use glam::{Quat, Vec3};
use rigspace_common::Pose;
use serde::{Deserialize, Serialize};

use crate::body::RigidBodyHandle;

/// Below this rotation-axis length the orientation error is treated as zero.
const ROTATION_EPSILON: f32 = 1e-6;

/// Turns a pose error into velocity commands.
pub trait VelocityLaw {
    /// `error` is target position minus body position.
    fn linear(&self, error: Vec3) -> Vec3;
    /// `error` is the shortest-arc rotation to the target as axis * angle.
    fn angular(&self, error: Vec3) -> Vec3;
}

/// P-only law: velocity proportional to the live error.
///
/// No integral term, so a sustained external push leaves a steady-state
/// offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Proportional {
    pub linvel_strength: f32,
    pub angvel_strength: f32,
}

impl Default for Proportional {
    fn default() -> Self {
        Self {
            linvel_strength: 20.0,
            angvel_strength: 20.0,
        }
    }
}

impl VelocityLaw for Proportional {
    fn linear(&self, error: Vec3) -> Vec3 {
        error * self.linvel_strength
    }

    fn angular(&self, error: Vec3) -> Vec3 {
        error * self.angvel_strength
    }
}

/// Shortest-arc rotation from `current` to `target`, as axis * angle.
/// The angle is in `[0, pi]`.
pub fn rotation_error(target: Quat, current: Quat) -> Vec3 {
    let mut diff = (target * current.inverse()).normalize();
    if diff.w < 0.0 {
        diff = -diff;
    }
    let axis = Vec3::new(diff.x, diff.y, diff.z);
    let s = axis.length();
    if s < ROTATION_EPSILON {
        return Vec3::ZERO;
    }
    let angle = 2.0 * s.atan2(diff.w);
    axis / s * angle
}

/// One frame's output of the pivot controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PivotCommand {
    pub linvel: Vec3,
    pub angvel: Vec3,
    /// Target minus body position, for debug arrows.
    pub position_error: Vec3,
    pub rotation_error: Vec3,
}

/// Drives a body toward a target pose by setting its velocities each frame.
#[derive(Debug, Clone, Default)]
pub struct PivotVelocityController<L = Proportional> {
    law: L,
}

impl<L: VelocityLaw> PivotVelocityController<L> {
    pub fn new(law: L) -> Self {
        Self { law }
    }

    pub fn law(&self) -> &L {
        &self.law
    }

    /// The velocities that move `current` toward `target`.
    pub fn command(&self, target: &Pose, current: &Pose) -> PivotCommand {
        let position_error = target.position - current.position;
        let rotation_error = rotation_error(target.orientation, current.orientation);
        PivotCommand {
            linvel: self.law.linear(position_error),
            angvel: self.law.angular(rotation_error),
            position_error,
            rotation_error,
        }
    }

    /// Issue this frame's command to `body`. Without a target or a body
    /// nothing happens.
    pub fn drive(
        &self,
        target: Option<&Pose>,
        body: Option<&mut dyn RigidBodyHandle>,
    ) -> Option<PivotCommand> {
        let (target, body) = (target?, body?);
        let cmd = self.command(target, &body.pose());
        body.set_linvel(cmd.linvel, true);
        body.set_angvel(cmd.angvel, true);
        Some(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    /// Body that records commands and integrates nothing.
    #[derive(Debug, Default)]
    struct RecordingBody {
        pub pose: Pose,
        pub linvel: Vec3,
        pub angvel: Vec3,
        pub impulses: Vec<Vec3>,
        pub torque_impulses: Vec<Vec3>,
    }

    impl RigidBodyHandle for RecordingBody {
        fn translation(&self) -> Vec3 {
            self.pose.position
        }
        fn rotation(&self) -> Quat {
            self.pose.orientation
        }
        fn linvel(&self) -> Vec3 {
            self.linvel
        }
        fn angvel(&self) -> Vec3 {
            self.angvel
        }
        fn set_linvel(&mut self, v: Vec3, _wake: bool) {
            self.linvel = v;
        }
        fn set_angvel(&mut self, v: Vec3, _wake: bool) {
            self.angvel = v;
        }
        fn apply_impulse(&mut self, impulse: Vec3, _wake: bool) {
            self.impulses.push(impulse);
        }
        fn apply_torque_impulse(&mut self, impulse: Vec3, _wake: bool) {
            self.torque_impulses.push(impulse);
        }
    }

    #[test]
    fn identical_poses_give_zero_velocity() {
        let pivot = PivotVelocityController::<Proportional>::default();
        let pose = Pose::new(Vec3::new(1.0, -2.0, 0.5), Quat::from_rotation_x(0.3));
        let mut body = RecordingBody {
            pose,
            linvel: Vec3::ONE,
            angvel: Vec3::ONE,
            ..Default::default()
        };
        let cmd = pivot.drive(Some(&pose), Some(&mut body)).unwrap();
        assert_eq!(cmd.linvel, Vec3::ZERO);
        assert_eq!(cmd.angvel, Vec3::ZERO);
        assert_eq!(body.linvel, Vec3::ZERO);
        assert_eq!(body.angvel, Vec3::ZERO);
    }

    #[test]
    fn linear_command_scales_position_error() {
        let pivot = PivotVelocityController::<Proportional>::default();
        let target = Pose::from_position(Vec3::new(1.0, 0.0, 0.0));
        let cmd = pivot.command(&target, &Pose::IDENTITY);
        assert_eq!(cmd.linvel, Vec3::new(20.0, 0.0, 0.0));
        assert_eq!(cmd.position_error, Vec3::X);
    }

    #[test]
    fn angular_command_points_along_rotation_axis() {
        let pivot = PivotVelocityController::new(Proportional {
            linvel_strength: 1.0,
            angvel_strength: 2.0,
        });
        let target = Pose::new(Vec3::ZERO, Quat::from_rotation_y(0.5));
        let cmd = pivot.command(&target, &Pose::IDENTITY);
        assert!((cmd.angvel - Vec3::Y * 1.0).length() < 1e-5);
    }

    #[test]
    fn angular_norm_is_monotonic_in_error_angle() {
        let pivot = PivotVelocityController::<Proportional>::default();
        let axes = [
            Vec3::X,
            Vec3::Y,
            Vec3::Z,
            Vec3::new(1.0, 1.0, 0.0).normalize(),
            Vec3::new(-0.3, 0.8, 0.5).normalize(),
        ];
        let bases = [Quat::IDENTITY, Quat::from_euler(glam::EulerRot::XYZ, 0.4, -1.1, 2.0)];

        for base in bases {
            let mut norms_by_axis = Vec::new();
            for axis in axes {
                let mut last = -1.0;
                let mut norms = Vec::new();
                for i in 0..=64 {
                    let angle = PI * i as f32 / 64.0;
                    let target = Pose::new(Vec3::ZERO, Quat::from_axis_angle(axis, angle) * base);
                    let norm = pivot
                        .command(&target, &Pose::new(Vec3::ZERO, base))
                        .angvel
                        .length();
                    assert!(norm + 1e-3 >= last, "norm fell at {angle} around {axis}");
                    last = norm;
                    norms.push(norm);
                }
                norms_by_axis.push(norms);
            }
            // Same magnitude whichever axis the error is about.
            for norms in &norms_by_axis[1..] {
                for (a, b) in norms.iter().zip(&norms_by_axis[0]) {
                    assert!((a - b).abs() < 1e-2);
                }
            }
        }
    }

    #[test]
    fn rotation_error_takes_the_short_way() {
        let err = rotation_error(Quat::from_rotation_z(1.5 * PI), Quat::IDENTITY);
        assert!((err.length() - 0.5 * PI).abs() < 1e-4);
        assert!(err.z < 0.0);
    }

    #[test]
    fn missing_target_or_body_is_a_no_op() {
        let pivot = PivotVelocityController::<Proportional>::default();
        let mut body = RecordingBody::default();
        assert!(pivot.drive(None, Some(&mut body)).is_none());
        assert_eq!(body.linvel, Vec3::ZERO);
        assert!(pivot.drive(Some(&Pose::IDENTITY), None).is_none());
    }

    #[test]
    fn repeated_drive_converges() {
        // Integrate the commanded velocity by hand to check the loop closes.
        let pivot = PivotVelocityController::<Proportional>::default();
        let target = Pose::new(Vec3::new(2.0, 1.0, -1.0), Quat::from_rotation_y(1.0));
        let mut body = RecordingBody::default();
        let dt = 1.0 / 60.0;
        for _ in 0..30 {
            let cmd = pivot.drive(Some(&target), Some(&mut body)).unwrap();
            body.pose.position += cmd.linvel * dt;
            let w = cmd.angvel * dt;
            if w.length() > 0.0 {
                body.pose.orientation =
                    (Quat::from_scaled_axis(w) * body.pose.orientation).normalize();
            }
        }
        assert!((body.pose.position - target.position).length() < 1e-3);
        assert!(rotation_error(target.orientation, body.pose.orientation).length() < 1e-3);
    }
}
