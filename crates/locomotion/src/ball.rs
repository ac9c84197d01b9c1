use glam::{Quat, Vec3};
use rigspace_common::Pose;
use rigspace_input::KeyboardState;
use rigspace_physics::{BodyDesc, BodyId, Material, PhysicsWorld, Shape};
use serde::{Deserialize, Serialize};

/// Extra drop below the ball's bottom where the ground ray starts.
const GROUND_RAY_SKIN: f32 = 0.05;
const GROUND_RAY_MAX: f32 = 10.0;
/// Ground closer than this below the ray origin counts as standing on it.
const GROUNDED_DISTANCE: f32 = 0.15;
/// Rounding left over from a straight up or down camera.
const MIN_HORIZONTAL_SQ: f32 = 1e-8;

/// Ball body and how hard the keys push it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallConfig {
    pub radius: f32,
    pub material: Material,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub impulse_strength: f32,
    pub torque_strength: f32,
    pub jump_strength: f32,
    /// Defaults to `(0, radius, 5)`.
    pub spawn: Option<Vec3>,
}

impl Default for BallConfig {
    fn default() -> Self {
        Self {
            radius: 1.0,
            material: Material {
                restitution: 0.2,
                friction: 1.0,
                ..Material::default()
            },
            linear_damping: 0.5,
            angular_damping: 0.5,
            impulse_strength: 50.0,
            torque_strength: 30.0,
            jump_strength: 90.0,
            spawn: None,
        }
    }
}

impl BallConfig {
    pub fn spawn_position(&self) -> Vec3 {
        self.spawn.unwrap_or(Vec3::new(0.0, self.radius, 5.0))
    }

    pub fn body_desc(&self) -> BodyDesc {
        BodyDesc::dynamic(
            Shape::Ball {
                radius: self.radius,
            },
            Pose::from_position(self.spawn_position()),
        )
        .with_material(self.material)
        .with_damping(self.linear_damping, self.angular_damping)
    }
}

/// What the controller applied this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BallUpdate {
    pub impulse: Vec3,
    pub torque: Vec3,
    pub jumped: bool,
}

/// Rolls a ball with the movement keys, relative to the camera heading.
#[derive(Debug, Clone)]
pub struct BallController {
    config: BallConfig,
    body: BodyId,
}

impl BallController {
    /// Create the ball body in `world`.
    pub fn spawn(world: &mut dyn PhysicsWorld, config: BallConfig) -> Self {
        let body = world.create_body(&config.body_desc());
        tracing::debug!(?body, spawn = ?config.spawn_position(), "ball spawned");
        Self { config, body }
    }

    pub fn body(&self) -> BodyId {
        self.body
    }

    pub fn config(&self) -> &BallConfig {
        &self.config
    }

    /// Whether ground lies just under the ball.
    pub fn is_grounded(&self, world: &dyn PhysicsWorld) -> bool {
        let Some(body) = world.body(self.body) else {
            return false;
        };
        let origin = body.translation() - Vec3::Y * (self.config.radius + GROUND_RAY_SKIN);
        world
            .cast_ray(origin, Vec3::NEG_Y, GROUND_RAY_MAX, Some(self.body))
            .is_some_and(|toi| toi < GROUNDED_DISTANCE)
    }

    /// Push the ball for one frame. `jump_pressed` is the rising edge of the
    /// jump key. A missing body makes this a no-op.
    pub fn update(
        &self,
        world: &mut dyn PhysicsWorld,
        keys: KeyboardState,
        jump_pressed: bool,
        camera: Quat,
        dt: f32,
    ) -> BallUpdate {
        let mut out = BallUpdate::default();
        if world.body(self.body).is_none() {
            return out;
        }

        // Per axis the later key overrides: backward beats forward and
        // leftward beats rightward.
        let mut impulse = Vec3::ZERO;
        let mut torque = Vec3::ZERO;
        if keys.forward {
            impulse.z = -1.0;
            torque.x = -1.0;
        }
        if keys.backward {
            impulse.z = 1.0;
            torque.x = 1.0;
        }
        if keys.rightward {
            impulse.x = 1.0;
            torque.z = -1.0;
        }
        if keys.leftward {
            impulse.x = -1.0;
            torque.z = 1.0;
        }

        let jumped = jump_pressed && self.is_grounded(world);
        let Some(body) = world.body_mut(self.body) else {
            return out;
        };
        if let Some(v) = camera_relative(impulse, camera) {
            out.impulse = v * self.config.impulse_strength * dt;
            body.apply_impulse(out.impulse, true);
        }
        if let Some(v) = camera_relative(torque, camera) {
            out.torque = v * self.config.torque_strength * dt;
            body.apply_torque_impulse(out.torque, true);
        }
        if jumped {
            body.apply_impulse(Vec3::Y * self.config.jump_strength, true);
            out.jumped = true;
            tracing::debug!("ball jumped");
        }
        out
    }
}

/// Rotate into the camera heading, drop the vertical part and normalize.
/// `None` when nothing horizontal is left.
fn camera_relative(v: Vec3, camera: Quat) -> Option<Vec3> {
    if v == Vec3::ZERO {
        return None;
    }
    let mut v = camera * v;
    v.y = 0.0;
    if v.length_squared() < MIN_HORIZONTAL_SQ {
        return None;
    }
    v.try_normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigspace_physics::RapierWorld;
    use std::f32::consts::FRAC_PI_2;

    fn ground(world: &mut RapierWorld) {
        world.create_body(&BodyDesc::fixed(
            Shape::Cuboid {
                half_extents: Vec3::new(50.0, 0.5, 50.0),
            },
            Pose::from_position(Vec3::new(0.0, -0.5, 0.0)),
        ));
    }

    fn settle(world: &mut RapierWorld, frames: usize) {
        for _ in 0..frames {
            world.step(1.0 / 60.0);
        }
    }

    #[test]
    fn defaults() {
        let cfg = BallConfig::default();
        assert_eq!(cfg.radius, 1.0);
        assert_eq!(cfg.material.restitution, 0.2);
        assert_eq!(cfg.material.friction, 1.0);
        assert_eq!(cfg.jump_strength, 90.0);
        assert_eq!(cfg.spawn_position(), Vec3::new(0.0, 1.0, 5.0));
    }

    #[test]
    fn forward_impulse_is_horizontal_and_scaled_by_dt() {
        let mut world = RapierWorld::new(Vec3::ZERO);
        let ball = BallController::spawn(&mut world, BallConfig::default());
        settle(&mut world, 1);

        let keys = KeyboardState {
            forward: true,
            ..Default::default()
        };
        let dt = 1.0 / 60.0;
        // Camera pitched down still pushes along the ground.
        let camera = Quat::from_rotation_x(-0.5);
        let out = ball.update(&mut world, keys, false, camera, dt);
        assert!((out.impulse - Vec3::new(0.0, 0.0, -50.0 * dt)).length() < 1e-5);
        assert!((out.torque - Vec3::new(-30.0 * dt, 0.0, 0.0)).length() < 1e-5);
        assert!(world.body(ball.body()).unwrap().linvel().z < 0.0);
    }

    #[test]
    fn impulse_follows_camera_heading() {
        let mut world = RapierWorld::new(Vec3::ZERO);
        let ball = BallController::spawn(&mut world, BallConfig::default());
        let keys = KeyboardState {
            forward: true,
            ..Default::default()
        };
        let out = ball.update(&mut world, keys, false, Quat::from_rotation_y(FRAC_PI_2), 1.0);
        // Facing -Z turned a quarter about +Y faces -X.
        assert!((out.impulse - Vec3::new(-50.0, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn opposite_keys_let_backward_and_leftward_win() {
        let mut world = RapierWorld::new(Vec3::ZERO);
        let ball = BallController::spawn(&mut world, BallConfig::default());
        let all = KeyboardState {
            forward: true,
            backward: true,
            leftward: true,
            rightward: true,
            ..Default::default()
        };
        let out = ball.update(&mut world, all, false, Quat::IDENTITY, 1.0);
        let diagonal = Vec3::new(-1.0, 0.0, 1.0).normalize();
        assert!((out.impulse - diagonal * 50.0).length() < 1e-4);
        assert!((out.torque - Vec3::new(1.0, 0.0, 1.0).normalize() * 30.0).length() < 1e-4);
    }

    #[test]
    fn vertical_camera_applies_nothing() {
        let mut world = RapierWorld::new(Vec3::ZERO);
        let ball = BallController::spawn(&mut world, BallConfig::default());
        let forward = KeyboardState {
            forward: true,
            ..Default::default()
        };
        let straight_down = Quat::from_rotation_x(-FRAC_PI_2);
        let out = ball.update(&mut world, forward, false, straight_down, 1.0);
        assert_eq!(out.impulse, Vec3::ZERO);
    }

    #[test]
    fn jumps_only_when_grounded() {
        let mut world = RapierWorld::new(Vec3::new(0.0, -60.0, 0.0));
        ground(&mut world);
        let ball = BallController::spawn(&mut world, BallConfig::default());
        settle(&mut world, 30);
        assert!(ball.is_grounded(&world));

        let out = ball.update(&mut world, KeyboardState::default(), true, Quat::IDENTITY, 1.0 / 60.0);
        assert!(out.jumped);
        assert!(world.body(ball.body()).unwrap().linvel().y > 5.0);

        settle(&mut world, 10);
        assert!(!ball.is_grounded(&world));
        let out = ball.update(&mut world, KeyboardState::default(), true, Quat::IDENTITY, 1.0 / 60.0);
        assert!(!out.jumped);
    }

    #[test]
    fn jump_needs_the_rising_edge() {
        let mut world = RapierWorld::new(Vec3::new(0.0, -60.0, 0.0));
        ground(&mut world);
        let ball = BallController::spawn(&mut world, BallConfig::default());
        settle(&mut world, 30);
        let held = KeyboardState {
            jump: true,
            ..Default::default()
        };
        let out = ball.update(&mut world, held, false, Quat::IDENTITY, 1.0 / 60.0);
        assert!(!out.jumped);
    }

    #[test]
    fn missing_body_is_a_no_op() {
        let mut world = RapierWorld::new(Vec3::ZERO);
        let ball = BallController::spawn(&mut world, BallConfig::default());
        world.remove_body(ball.body());
        let keys = KeyboardState {
            forward: true,
            ..Default::default()
        };
        assert_eq!(
            ball.update(&mut world, keys, true, Quat::IDENTITY, 1.0),
            BallUpdate::default()
        );
        assert!(!ball.is_grounded(&world));
    }
}
