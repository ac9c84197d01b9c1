use glam::{Quat, Vec3};
use rigspace_common::Pose;
use serde::{Deserialize, Serialize};

/// Index of a body inside a [`PhysicsWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub usize);

/// Index of a joint inside a [`PhysicsWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JointId(pub usize);

/// Errors from physics world operations.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PhysicsError {
    #[error("body {0:?} does not exist")]
    UnknownBody(BodyId),
    #[error("cannot join body {0:?} to itself")]
    SelfJoint(BodyId),
}

/// Command/query surface of one simulated body.
///
/// The physics world owns the body; callers only read its pose and issue
/// velocity or impulse commands.
pub trait RigidBodyHandle {
    fn translation(&self) -> Vec3;
    fn rotation(&self) -> Quat;
    fn linvel(&self) -> Vec3;
    fn angvel(&self) -> Vec3;
    fn set_linvel(&mut self, v: Vec3, wake: bool);
    fn set_angvel(&mut self, v: Vec3, wake: bool);
    fn apply_impulse(&mut self, impulse: Vec3, wake: bool);
    fn apply_torque_impulse(&mut self, impulse: Vec3, wake: bool);

    fn pose(&self) -> Pose {
        Pose::new(self.translation(), self.rotation())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyKind {
    Dynamic,
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    Ball { radius: f32 },
    Cuboid { half_extents: Vec3 },
}

/// Contact material of a collider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            restitution: 0.0,
            friction: 0.5,
            density: 1.0,
        }
    }
}

/// Everything needed to create one body with a single collider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub shape: Shape,
    pub pose: Pose,
    pub material: Material,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl BodyDesc {
    pub fn dynamic(shape: Shape, pose: Pose) -> Self {
        Self {
            kind: BodyKind::Dynamic,
            shape,
            pose,
            material: Material::default(),
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }

    pub fn fixed(shape: Shape, pose: Pose) -> Self {
        Self {
            kind: BodyKind::Fixed,
            ..Self::dynamic(shape, pose)
        }
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }
}

/// The physics engine as seen by the core: body and joint creation, body
/// access, ray queries and stepping.
pub trait PhysicsWorld {
    fn create_body(&mut self, desc: &BodyDesc) -> BodyId;

    fn remove_body(&mut self, id: BodyId) -> bool;

    /// Ball-and-socket joint between `a` and `b`, anchored at body-local
    /// points.
    fn create_spherical_joint(
        &mut self,
        a: BodyId,
        b: BodyId,
        anchor_a: Vec3,
        anchor_b: Vec3,
    ) -> Result<JointId, PhysicsError>;

    /// The two bodies a joint connects, in creation order.
    fn joint_bodies(&self, id: JointId) -> Option<(BodyId, BodyId)>;

    fn joint_count(&self) -> usize;

    fn body(&self, id: BodyId) -> Option<&dyn RigidBodyHandle>;

    fn body_mut(&mut self, id: BodyId) -> Option<&mut dyn RigidBodyHandle>;

    /// Distance to the first collider hit along `dir`, ignoring `exclude`.
    fn cast_ray(&self, origin: Vec3, dir: Vec3, max_toi: f32, exclude: Option<BodyId>)
    -> Option<f32>;

    fn step(&mut self, dt: f32);
}
