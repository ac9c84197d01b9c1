use glam::{Quat, Vec3};
use rigspace_common::{PlayerRig, Pose, Transform};
use rigspace_input::{
    Action, GamepadPoll, InputAggregator, InputError, InputEvent, KeyboardControls, NoGamepads,
    PadSnapshot, SurfaceSize, XrFrame,
};
use rigspace_locomotion::{BallController, BallUpdate, LocomotionIntegrator};
use rigspace_physics::{
    BodyDesc, ChainError, JointChain, PhysicsWorld, PivotCommand, PivotVelocityController,
    Proportional, RapierWorld, Shape,
};
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, SceneConfig};

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("building rope: {0}")]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Input(#[from] InputError),
}

/// A record of something notable the simulation did.
///
/// Frame-level state (pads, curve, the tick itself) is not logged; only
/// transitions are, so a quiet frame adds nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FrameEvent {
    /// XR presentation started or stopped.
    PresentingChanged { presenting: bool },
    /// The player rig was moved back to a fixed position.
    PlayerReset { position: Vec3 },
    /// A mapped key went down.
    ActionPressed { action: Action },
    /// The ball left the ground.
    Jumped { tick: u64 },
    /// The rope's pivot target was replaced.
    PivotTargetChanged { target: Option<Pose> },
}

/// Per-frame inputs that are polled rather than delivered as events.
pub struct FrameInput<'a> {
    pub gamepads: &'a dyn GamepadPoll,
    /// Present only while an XR session is delivering frames.
    pub xr_frame: Option<&'a XrFrame>,
    /// Seconds since the previous frame; the configured timestep when `None`.
    pub dt: Option<f32>,
    /// Camera orientation for ball control; the rig's yaw when `None`.
    pub camera: Option<Quat>,
}

impl Default for FrameInput<'_> {
    fn default() -> Self {
        Self {
            gamepads: &NoGamepads,
            xr_frame: None,
            dt: None,
            camera: None,
        }
    }
}

/// What the renderer gets after each frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameOutput {
    pub tick: u64,
    pub dt: f32,
    pub player: PlayerRig,
    pub pads: PadSnapshot,
    /// Rope frame, for placing `rope_points` in the world.
    pub rope_frame: Option<Transform>,
    /// Rope segment positions in the rope frame, head first.
    pub rope_points: Vec<Vec3>,
    pub pivot: Option<PivotCommand>,
    pub ball: Option<Pose>,
    pub ball_update: Option<BallUpdate>,
}

/// The frame scheduler: input, then locomotion, then rigid bodies.
///
/// Each [`Simulation::step`] runs, in order: polled input sampling, the
/// locomotion integrator, the ball controller, the pivot drive on the rope
/// head, the physics step, and curve reconstruction. Input events delivered
/// between frames are applied immediately.
pub struct Simulation {
    config: SceneConfig,
    tick: u64,
    presenting: bool,
    player: PlayerRig,
    input: InputAggregator,
    keyboard: KeyboardControls,
    locomotion: LocomotionIntegrator,
    world: Box<dyn PhysicsWorld>,
    pivot: PivotVelocityController<Proportional>,
    pivot_target: Option<Pose>,
    rope: Option<JointChain>,
    ball: Option<BallController>,
    /// Append-only log of notable transitions.
    event_log: Vec<FrameEvent>,
}

impl Simulation {
    /// Build the scene on a rapier world.
    pub fn new(config: SceneConfig) -> Result<Self, SimulationError> {
        let world = Box::new(RapierWorld::new(config.gravity));
        Self::with_world(config, world)
    }

    /// Build the scene on any physics backend.
    pub fn with_world(
        config: SceneConfig,
        mut world: Box<dyn PhysicsWorld>,
    ) -> Result<Self, SimulationError> {
        config.validate()?;

        if let Some(ground) = config.ground {
            let center = Vec3::new(0.0, ground.top - ground.half_extents.y, 0.0);
            world.create_body(&BodyDesc::fixed(
                Shape::Cuboid {
                    half_extents: ground.half_extents,
                },
                Pose::from_position(center),
            ));
        }
        let rope = config
            .rope
            .as_ref()
            .map(|rope| JointChain::build(world.as_mut(), rope))
            .transpose()?;
        let ball = config
            .ball
            .map(|ball| BallController::spawn(world.as_mut(), ball));

        tracing::info!(
            rope_segments = rope.as_ref().map_or(0, |r| r.segments().len()),
            ball = ball.is_some(),
            spawn = ?config.spawn,
            "simulation built"
        );

        Ok(Self {
            tick: 0,
            presenting: false,
            player: PlayerRig::new(config.spawn, 0.0),
            input: InputAggregator::new(config.input),
            keyboard: KeyboardControls::new(config.keymap.clone()),
            locomotion: LocomotionIntegrator::new(config.sensitivity, config.scaling),
            world,
            pivot: PivotVelocityController::new(config.pivot),
            pivot_target: config.pivot_target,
            rope,
            ball,
            event_log: Vec::new(),
            config,
        })
    }

    /// Scene this simulation was built from.
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Frames stepped so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Current player rig; the camera follows it.
    pub fn player(&self) -> &PlayerRig {
        &self.player
    }

    /// Whether an XR session is presenting.
    pub fn is_presenting(&self) -> bool {
        self.presenting
    }

    /// Input sources and the pads they write.
    pub fn input(&self) -> &InputAggregator {
        &self.input
    }

    /// Mutable input access, for enabling or disabling sources.
    pub fn input_mut(&mut self) -> &mut InputAggregator {
        &mut self.input
    }

    /// The physics backend holding ground, rope and ball.
    pub fn world(&self) -> &dyn PhysicsWorld {
        self.world.as_ref()
    }

    /// The rope, if the scene has one.
    pub fn rope(&self) -> Option<&JointChain> {
        self.rope.as_ref()
    }

    /// The ball, if the scene has one.
    pub fn ball(&self) -> Option<&BallController> {
        self.ball.as_ref()
    }

    /// Where the rope head is being driven, in the rope frame.
    pub fn pivot_target(&self) -> Option<&Pose> {
        self.pivot_target.as_ref()
    }

    /// Read-only access to the event log. The log only grows on
    /// transitions; hosts that run for long should still drain it.
    pub fn events(&self) -> &[FrameEvent] {
        &self.event_log
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<FrameEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Deliver an input event. It takes effect immediately.
    pub fn handle_input_event(&mut self, event: &InputEvent) {
        tracing::trace!(?event, "input event");
        self.input.handle_event(event);
    }

    /// A key went down, by `KeyboardEvent.code` name. Unmapped keys have
    /// no effect.
    pub fn key_down(&mut self, code: &str) {
        self.keyboard.key_down(code);
    }

    /// A key was released.
    pub fn key_up(&mut self, code: &str) {
        self.keyboard.key_up(code);
    }

    /// The joystick surface appeared or changed size. Creates the joystick
    /// manager when the scene enables joysticks.
    pub fn set_surface(&mut self, surface: SurfaceSize) -> Result<(), SimulationError> {
        if !self.config.input.joysticks {
            return Ok(());
        }
        if self.input.joysticks_enabled() {
            self.input.surface_resized(surface)?;
        } else {
            self.input
                .enable_joysticks(self.config.input.joystick, surface)?;
        }
        Ok(())
    }

    /// The joystick surface went away: tear down the sticks and zero the
    /// pads they drove.
    pub fn remove_surface(&mut self) {
        self.input.surface_removed();
    }

    /// Enter or leave XR presentation. Either transition puts the player rig
    /// back at the origin.
    pub fn set_presenting(&mut self, presenting: bool) {
        if presenting == self.presenting {
            return;
        }
        self.presenting = presenting;
        self.player.position = Vec3::ZERO;
        tracing::info!(presenting, "xr presentation changed");
        self.event_log
            .push(FrameEvent::PresentingChanged { presenting });
        self.event_log.push(FrameEvent::PlayerReset {
            position: Vec3::ZERO,
        });
    }

    /// Replace the rope's pivot target, given in the rope frame. `None`
    /// leaves the head to the joints and gravity.
    pub fn set_pivot_target(&mut self, target: Option<Pose>) {
        self.pivot_target = target;
        self.event_log
            .push(FrameEvent::PivotTargetChanged { target });
    }

    /// Run one frame.
    pub fn step(&mut self, frame: FrameInput<'_>) -> FrameOutput {
        let dt = frame.dt.unwrap_or(self.config.timestep);
        let _span = tracing::info_span!("frame", tick = self.tick + 1).entered();

        let pads = self.input.sample(frame.gamepads, frame.xr_frame);
        self.locomotion.integrate(&mut self.player, &pads, dt);

        let pressed = self.keyboard.take_pressed();
        for &action in Action::ALL.iter().filter(|a| pressed.contains(*a)) {
            self.event_log.push(FrameEvent::ActionPressed { action });
        }

        let ball_update = self.ball.as_ref().map(|ball| {
            let camera = frame.camera.unwrap_or_else(|| self.player.orientation());
            ball.update(
                self.world.as_mut(),
                self.keyboard.snapshot(),
                pressed.contains(&Action::Jump),
                camera,
                dt,
            )
        });

        let pivot = self.rope.as_ref().and_then(|rope| {
            rope.drive_head(self.world.as_mut(), &self.pivot, self.pivot_target.as_ref())
        });

        self.world.step(dt);

        let rope_points = self
            .rope
            .as_ref()
            .map(|rope| rope.curve_points(self.world.as_ref()))
            .unwrap_or_default();
        let ball = self
            .ball
            .as_ref()
            .and_then(|ball| self.world.body(ball.body()))
            .map(|body| body.pose());

        self.tick += 1;
        if ball_update.is_some_and(|u| u.jumped) {
            self.event_log.push(FrameEvent::Jumped { tick: self.tick });
        }
        tracing::trace!(player = ?self.player, ?pads, "frame done");

        FrameOutput {
            tick: self.tick,
            dt,
            player: self.player,
            pads,
            rope_frame: self.rope.as_ref().map(|rope| *rope.frame()),
            rope_points,
            pivot,
            ball,
            ball_update,
        }
    }

    /// Release every input source.
    pub fn shutdown(&mut self) {
        self.input.shutdown();
        self.keyboard.release_all();
        tracing::debug!(tick = self.tick, "simulation shut down");
    }
}
