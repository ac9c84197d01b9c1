use glam::{Affine3A, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position and orientation in some frame, no scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Spatial transform: position, rotation, scale.
///
/// Used as the local frame of grouped objects (the rope lives in one).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Map a point expressed in this frame into world space.
    pub fn local_to_world(&self, local: Vec3) -> Vec3 {
        self.to_affine().transform_point3(local)
    }

    /// Map a world-space point into this frame.
    pub fn world_to_local(&self, world: Vec3) -> Vec3 {
        self.to_affine().inverse().transform_point3(world)
    }

    /// Map a pose expressed in this frame into world space. Scale only
    /// affects the position.
    pub fn pose_to_world(&self, local: Pose) -> Pose {
        Pose {
            position: self.local_to_world(local.position),
            orientation: (self.rotation * local.orientation).normalize(),
        }
    }
}

/// The player rig: where the camera (or XR reference space) sits, and which
/// way it faces about +Y.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerRig {
    pub position: Vec3,
    /// Rotation about +Y in radians.
    pub yaw: f32,
}

impl PlayerRig {
    pub fn new(position: Vec3, yaw: f32) -> Self {
        Self { position, yaw }
    }

    pub fn orientation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw)
    }
}
