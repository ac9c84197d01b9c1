use glam::Vec3;
use rigspace_common::{Pose, Transform};
use serde::{Deserialize, Serialize};

use crate::body::{BodyDesc, BodyId, JointId, Material, PhysicsError, PhysicsWorld, Shape};
use crate::pivot::{PivotCommand, PivotVelocityController, VelocityLaw};

/// Errors raised while building a joint chain.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ChainError {
    #[error("invalid chain geometry: {0}")]
    InvalidGeometry(String),
    #[error(transparent)]
    Physics(#[from] PhysicsError),
}

/// Geometry and material of a rope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub segments: usize,
    /// Ball collider radius of each segment.
    pub radius: f32,
    /// Gap added to the radius on each side of a segment.
    pub offset: f32,
    /// Frame the chain is laid out in; segments run along its +X. Must be
    /// unscaled: colliders and joint anchors are sized in world units.
    pub frame: Transform,
    pub material: Material,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            segments: 8,
            radius: 0.25,
            offset: 0.5,
            frame: Transform::default(),
            material: Material::default(),
        }
    }
}

impl ChainConfig {
    pub fn half_span(&self) -> f32 {
        self.radius + self.offset
    }

    fn validate(&self) -> Result<(), ChainError> {
        if self.segments == 0 {
            return Err(ChainError::InvalidGeometry(
                "a chain needs at least one segment".into(),
            ));
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(ChainError::InvalidGeometry(format!(
                "segment radius must be positive, got {}",
                self.radius
            )));
        }
        if !self.offset.is_finite() || self.half_span() <= 0.0 {
            return Err(ChainError::InvalidGeometry(format!(
                "segment offset {} leaves no span",
                self.offset
            )));
        }
        if !self.frame.scale.abs_diff_eq(Vec3::ONE, 1e-6) {
            return Err(ChainError::InvalidGeometry(format!(
                "chain frame must be unscaled, got scale {}",
                self.frame.scale
            )));
        }
        Ok(())
    }
}

/// Segments linked pairwise by spherical joints. Segment 0 is the driven
/// end; the rest follow through the joints.
///
/// # Invariants
///
/// - `joints.len() == segments.len() - 1`.
/// - Joint `i` links segment `i` to segment `i + 1`; joints are created once,
///   in index order.
#[derive(Debug, Clone)]
pub struct JointChain {
    segments: Vec<BodyId>,
    joints: Vec<JointId>,
    half_span: f32,
    frame: Transform,
}

impl JointChain {
    pub fn build(world: &mut dyn PhysicsWorld, config: &ChainConfig) -> Result<Self, ChainError> {
        config.validate()?;
        let half_span = config.half_span();

        let segments: Vec<BodyId> = (0..config.segments)
            .map(|i| {
                let local = Vec3::X * (2.0 * half_span * i as f32);
                let pose = config.frame.pose_to_world(Pose::from_position(local));
                world.create_body(
                    &BodyDesc::dynamic(
                        Shape::Ball {
                            radius: config.radius,
                        },
                        pose,
                    )
                    .with_material(config.material),
                )
            })
            .collect();

        let mut joints = Vec::with_capacity(segments.len().saturating_sub(1));
        for pair in segments.windows(2) {
            let joint = world.create_spherical_joint(
                pair[0],
                pair[1],
                Vec3::new(half_span, 0.0, 0.0),
                Vec3::new(-half_span, 0.0, 0.0),
            )?;
            joints.push(joint);
        }

        tracing::debug!(
            segments = segments.len(),
            joints = joints.len(),
            half_span,
            "joint chain built"
        );
        Ok(Self {
            segments,
            joints,
            half_span,
            frame: config.frame,
        })
    }

    pub fn segments(&self) -> &[BodyId] {
        &self.segments
    }

    pub fn joints(&self) -> &[JointId] {
        &self.joints
    }

    pub fn half_span(&self) -> f32 {
        self.half_span
    }

    pub fn frame(&self) -> &Transform {
        &self.frame
    }

    pub fn head(&self) -> BodyId {
        self.segments[0]
    }

    /// Drive segment 0 toward `target`, given in the chain frame.
    pub fn drive_head<L: VelocityLaw>(
        &self,
        world: &mut dyn PhysicsWorld,
        controller: &PivotVelocityController<L>,
        target: Option<&Pose>,
    ) -> Option<PivotCommand> {
        let target = self.frame.pose_to_world(*target?);
        controller.drive(Some(&target), world.body_mut(self.head()))
    }

    /// Segment positions in the chain frame, in index order. A missing
    /// segment reads as the world origin.
    pub fn curve_points(&self, world: &dyn PhysicsWorld) -> Vec<Vec3> {
        self.segments
            .iter()
            .map(|&id| {
                let p = world.body(id).map_or(Vec3::ZERO, |b| b.translation());
                self.frame.world_to_local(p)
            })
            .collect()
    }
}
