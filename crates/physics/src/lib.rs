//! Rigid-body side of the rig: the physics seam, its rapier backend, the
//! pivot velocity controller and the jointed rope.
//!
//! # Invariants
//! - Bodies are owned by the physics world; callers only issue commands.
//! - A chain of N segments has exactly N-1 joints, joined in index order.
//! - An absent target or body turns the pivot drive into a no-op.

pub mod body;
pub mod chain;
pub mod curve;
pub mod pivot;
pub mod rapier_world;

pub use body::{BodyDesc, BodyId, BodyKind, JointId, Material, PhysicsError, PhysicsWorld, RigidBodyHandle, Shape};
pub use chain::{ChainConfig, ChainError, JointChain};
pub use curve::sample_centripetal;
pub use pivot::{PivotCommand, PivotVelocityController, Proportional, VelocityLaw, rotation_error};
pub use rapier_world::RapierWorld;

pub fn crate_info() -> &'static str {
    "rigspace-physics v0.1.0"
}
