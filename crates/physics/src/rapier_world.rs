//! `PhysicsWorld` backed by rapier3d.
//!
//! nalgebra types never leave this module; everything public speaks glam.

use std::collections::HashMap;

use glam::{Quat, Vec3};
use rapier3d::prelude::*;

use crate::body::{BodyDesc, BodyId, BodyKind, JointId, PhysicsError, PhysicsWorld, RigidBodyHandle, Shape};

type RapierBodyHandle = rapier3d::prelude::RigidBodyHandle;

fn to_na(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

fn from_na(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

impl RigidBodyHandle for RigidBody {
    fn translation(&self) -> Vec3 {
        from_na(RigidBody::translation(self))
    }

    fn rotation(&self) -> Quat {
        let q = RigidBody::rotation(self).coords;
        Quat::from_xyzw(q.x, q.y, q.z, q.w)
    }

    fn linvel(&self) -> Vec3 {
        from_na(RigidBody::linvel(self))
    }

    fn angvel(&self) -> Vec3 {
        from_na(RigidBody::angvel(self))
    }

    fn set_linvel(&mut self, v: Vec3, wake: bool) {
        RigidBody::set_linvel(self, to_na(v), wake);
    }

    fn set_angvel(&mut self, v: Vec3, wake: bool) {
        RigidBody::set_angvel(self, to_na(v), wake);
    }

    fn apply_impulse(&mut self, impulse: Vec3, wake: bool) {
        RigidBody::apply_impulse(self, to_na(impulse), wake);
    }

    fn apply_torque_impulse(&mut self, impulse: Vec3, wake: bool) {
        RigidBody::apply_torque_impulse(self, to_na(impulse), wake);
    }
}

/// A self-contained rapier simulation.
pub struct RapierWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    // Slot per BodyId; `None` once removed.
    bodies: Vec<Option<RapierBodyHandle>>,
    body_ids: HashMap<RapierBodyHandle, BodyId>,
    joints: Vec<ImpulseJointHandle>,
}

impl RapierWorld {
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity: to_na(gravity),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            bodies: Vec::new(),
            body_ids: HashMap::new(),
            joints: Vec::new(),
        }
    }

    pub fn gravity(&self) -> Vec3 {
        from_na(&self.gravity)
    }

    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    fn handle(&self, id: BodyId) -> Option<RapierBodyHandle> {
        self.bodies.get(id.0).copied().flatten()
    }
}

impl Default for RapierWorld {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, -9.81, 0.0))
    }
}

impl PhysicsWorld for RapierWorld {
    fn create_body(&mut self, desc: &BodyDesc) -> BodyId {
        let builder = match desc.kind {
            BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
            BodyKind::Fixed => RigidBodyBuilder::fixed(),
        };
        let body = builder
            .position(Isometry::new(
                to_na(desc.pose.position),
                to_na(desc.pose.orientation.to_scaled_axis()),
            ))
            .linear_damping(desc.linear_damping)
            .angular_damping(desc.angular_damping)
            .build();
        let handle = self.rigid_body_set.insert(body);

        let collider = match desc.shape {
            Shape::Ball { radius } => ColliderBuilder::ball(radius),
            Shape::Cuboid { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
        }
        .restitution(desc.material.restitution)
        .friction(desc.material.friction)
        .density(desc.material.density)
        .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);

        let id = BodyId(self.bodies.len());
        self.bodies.push(Some(handle));
        self.body_ids.insert(handle, id);
        tracing::trace!(?id, kind = ?desc.kind, shape = ?desc.shape, "body created");
        id
    }

    fn remove_body(&mut self, id: BodyId) -> bool {
        let Some(handle) = self.bodies.get_mut(id.0).and_then(Option::take) else {
            return false;
        };
        self.body_ids.remove(&handle);
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
        tracing::trace!(?id, "body removed");
        true
    }

    fn create_spherical_joint(
        &mut self,
        a: BodyId,
        b: BodyId,
        anchor_a: Vec3,
        anchor_b: Vec3,
    ) -> Result<JointId, PhysicsError> {
        if a == b {
            return Err(PhysicsError::SelfJoint(a));
        }
        let ha = self.handle(a).ok_or(PhysicsError::UnknownBody(a))?;
        let hb = self.handle(b).ok_or(PhysicsError::UnknownBody(b))?;

        let joint = SphericalJointBuilder::new()
            .local_anchor1(point![anchor_a.x, anchor_a.y, anchor_a.z])
            .local_anchor2(point![anchor_b.x, anchor_b.y, anchor_b.z]);
        let handle = self.impulse_joint_set.insert(ha, hb, joint, true);

        let id = JointId(self.joints.len());
        self.joints.push(handle);
        tracing::trace!(?id, ?a, ?b, "spherical joint created");
        Ok(id)
    }

    fn joint_bodies(&self, id: JointId) -> Option<(BodyId, BodyId)> {
        let handle = *self.joints.get(id.0)?;
        let joint = self.impulse_joint_set.get(handle)?;
        let a = *self.body_ids.get(&joint.body1)?;
        let b = *self.body_ids.get(&joint.body2)?;
        Some((a, b))
    }

    fn joint_count(&self) -> usize {
        self.impulse_joint_set.len()
    }

    fn body(&self, id: BodyId) -> Option<&dyn RigidBodyHandle> {
        let handle = self.handle(id)?;
        self.rigid_body_set
            .get(handle)
            .map(|b| b as &dyn RigidBodyHandle)
    }

    fn body_mut(&mut self, id: BodyId) -> Option<&mut dyn RigidBodyHandle> {
        let handle = self.handle(id)?;
        self.rigid_body_set
            .get_mut(handle)
            .map(|b| b as &mut dyn RigidBodyHandle)
    }

    fn cast_ray(
        &self,
        origin: Vec3,
        dir: Vec3,
        max_toi: f32,
        exclude: Option<BodyId>,
    ) -> Option<f32> {
        let ray = Ray::new(point![origin.x, origin.y, origin.z], to_na(dir));
        let mut filter = QueryFilter::default();
        if let Some(handle) = exclude.and_then(|id| self.handle(id)) {
            filter = filter.exclude_rigid_body(handle);
        }
        self.query_pipeline
            .cast_ray(
                &self.rigid_body_set,
                &self.collider_set,
                &ray,
                max_toi,
                true,
                filter,
            )
            .map(|(_, toi)| toi)
    }

    fn step(&mut self, dt: f32) {
        let _span = tracing::trace_span!("physics_step", dt).entered();
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigspace_common::Pose;

    fn ball_at(world: &mut RapierWorld, p: Vec3) -> BodyId {
        world.create_body(&BodyDesc::dynamic(
            Shape::Ball { radius: 0.25 },
            Pose::from_position(p),
        ))
    }

    #[test]
    fn created_body_reports_its_pose() {
        let mut world = RapierWorld::default();
        let rot = Quat::from_rotation_z(0.5);
        let id = world.create_body(&BodyDesc::dynamic(
            Shape::Ball { radius: 1.0 },
            Pose::new(Vec3::new(1.0, 2.0, 3.0), rot),
        ));
        let body = world.body(id).unwrap();
        assert!((body.translation() - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-6);
        assert!((body.rotation().dot(rot).abs() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn gravity_pulls_dynamic_bodies() {
        let mut world = RapierWorld::new(Vec3::new(0.0, -60.0, 0.0));
        let id = ball_at(&mut world, Vec3::new(0.0, 10.0, 0.0));
        for _ in 0..10 {
            world.step(1.0 / 60.0);
        }
        assert!(world.body(id).unwrap().translation().y < 10.0);
    }

    #[test]
    fn set_linvel_moves_body() {
        let mut world = RapierWorld::new(Vec3::ZERO);
        let id = ball_at(&mut world, Vec3::ZERO);
        world.body_mut(id).unwrap().set_linvel(Vec3::X * 6.0, true);
        world.step(0.5);
        let body = world.body(id).unwrap();
        assert!((body.translation().x - 3.0).abs() < 1e-3);
        assert!((body.linvel() - Vec3::X * 6.0).length() < 1e-3);
    }

    #[test]
    fn joints_record_their_bodies() {
        let mut world = RapierWorld::default();
        let a = ball_at(&mut world, Vec3::ZERO);
        let b = ball_at(&mut world, Vec3::X);
        let j = world
            .create_spherical_joint(a, b, Vec3::X * 0.5, Vec3::NEG_X * 0.5)
            .unwrap();
        assert_eq!(world.joint_bodies(j), Some((a, b)));
        assert_eq!(world.joint_count(), 1);
    }

    #[test]
    fn joint_to_unknown_or_same_body_fails() {
        let mut world = RapierWorld::default();
        let a = ball_at(&mut world, Vec3::ZERO);
        assert_eq!(
            world.create_spherical_joint(a, BodyId(7), Vec3::ZERO, Vec3::ZERO),
            Err(PhysicsError::UnknownBody(BodyId(7)))
        );
        assert_eq!(
            world.create_spherical_joint(a, a, Vec3::ZERO, Vec3::ZERO),
            Err(PhysicsError::SelfJoint(a))
        );
    }

    #[test]
    fn removed_body_is_absent() {
        let mut world = RapierWorld::default();
        let a = ball_at(&mut world, Vec3::ZERO);
        assert!(world.remove_body(a));
        assert!(!world.remove_body(a));
        assert!(world.body(a).is_none());
        assert!(world.body_mut(a).is_none());
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn ray_hits_fixed_ground() {
        let mut world = RapierWorld::default();
        world.create_body(&BodyDesc::fixed(
            Shape::Cuboid {
                half_extents: Vec3::new(50.0, 0.05, 50.0),
            },
            Pose::from_position(Vec3::new(0.0, -0.05, 0.0)),
        ));
        // The query pipeline is refreshed by stepping.
        world.step(1.0 / 60.0);
        let toi = world.cast_ray(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Y, 10.0, None);
        assert!((toi.unwrap() - 1.0).abs() < 1e-3);
        assert!(world.cast_ray(Vec3::new(0.0, 1.0, 0.0), Vec3::Y, 10.0, None).is_none());
    }
}
