use rigspace_common::PadSide;
use serde::{Deserialize, Serialize};

use crate::gamepad::{DEFAULT_DEADZONE, GamepadPoll, PhysicalGamepad};
use crate::joystick::{InputError, JoystickManager, JoystickMove, JoystickOptions, SurfaceSize, TouchId};
use crate::pads::{PadSnapshot, PadState, SourceKind};
use crate::xr::{XrControllers, XrFrame};

/// A discrete input event, delivered as it happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    GamepadConnected {
        index: usize,
        id: String,
        axis_count: usize,
    },
    GamepadDisconnected {
        index: usize,
    },
    JoystickMove(JoystickMove),
    JoystickEnd {
        id: TouchId,
    },
}

/// Aggregator settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub deadzone: f32,
    pub gamepad: bool,
    pub xr: bool,
    /// Create the virtual joystick manager when a surface is known.
    pub joysticks: bool,
    pub joystick: JoystickOptions,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            deadzone: DEFAULT_DEADZONE,
            gamepad: true,
            xr: true,
            joysticks: false,
            joystick: JoystickOptions::default(),
        }
    }
}

/// Merges every device source into the two shared pads.
///
/// Events are applied the moment they are delivered. Polled sources are read
/// in [`InputAggregator::sample`], gamepad first then XR, and overwrite
/// whatever was there. There is no priority between sources: the last writer
/// of a pad wins.
///
/// Optional sources are held as `Option`s: enabling constructs them,
/// disabling takes and tears them down, so no listener outlives its source.
#[derive(Debug)]
pub struct InputAggregator {
    pads: PadState,
    deadzone: f32,
    gamepad: Option<PhysicalGamepad>,
    xr: Option<XrControllers>,
    joysticks: Option<JoystickManager>,
    joystick_options: JoystickOptions,
}

impl Default for InputAggregator {
    fn default() -> Self {
        Self::new(InputConfig::default())
    }
}

impl InputAggregator {
    /// Build an aggregator with the gamepad and XR sources enabled per
    /// config. Joysticks need a surface; see
    /// [`InputAggregator::enable_joysticks`].
    pub fn new(config: InputConfig) -> Self {
        let mut agg = Self {
            pads: PadState::new(),
            deadzone: config.deadzone,
            gamepad: None,
            xr: None,
            joysticks: None,
            joystick_options: config.joystick,
        };
        if config.gamepad {
            agg.enable_gamepad();
        }
        if config.xr {
            agg.enable_xr();
        }
        agg
    }

    /// The shared pads every source writes to.
    pub fn pads(&self) -> &PadState {
        &self.pads
    }

    /// Register the gamepad connect/disconnect listener.
    pub fn enable_gamepad(&mut self) {
        if self.gamepad.is_none() {
            tracing::debug!("gamepad listener registered");
            self.gamepad = Some(PhysicalGamepad::new(self.deadzone));
        }
    }

    /// Remove the gamepad listener and forget the connected index.
    pub fn disable_gamepad(&mut self) {
        if let Some(mut gp) = self.gamepad.take() {
            gp.release();
            tracing::debug!("gamepad listener removed");
        }
    }

    /// Index of the connected gamepad, if the listener has one.
    pub fn gamepad_index(&self) -> Option<usize> {
        self.gamepad.as_ref().and_then(PhysicalGamepad::index)
    }

    /// Start polling XR controllers on frames that carry an XR frame.
    pub fn enable_xr(&mut self) {
        self.xr.get_or_insert(XrControllers);
    }

    /// Stop polling XR controllers.
    pub fn disable_xr(&mut self) {
        self.xr = None;
    }

    /// Create the joystick manager on `surface`. An existing manager is torn
    /// down first.
    pub fn enable_joysticks(
        &mut self,
        options: JoystickOptions,
        surface: SurfaceSize,
    ) -> Result<(), InputError> {
        self.disable_joysticks();
        let manager = JoystickManager::create(options, surface)?;
        self.joystick_options = options;
        self.joysticks = Some(manager);
        Ok(())
    }

    /// Destroy the joystick manager if there is one. Idempotent.
    pub fn disable_joysticks(&mut self) {
        if let Some(mut manager) = self.joysticks.take() {
            manager.destroy(&mut self.pads);
        }
    }

    /// Whether a joystick manager is live.
    pub fn joysticks_enabled(&self) -> bool {
        self.joysticks.is_some()
    }

    /// The hosting surface changed size: recreate the manager against the
    /// new size, keeping its options.
    pub fn surface_resized(&mut self, surface: SurfaceSize) -> Result<(), InputError> {
        if self.joysticks.is_none() {
            return Ok(());
        }
        self.enable_joysticks(self.joystick_options, surface)
    }

    /// The hosting surface went away.
    pub fn surface_removed(&mut self) {
        self.disable_joysticks();
    }

    /// Deliver one event. Events for disabled sources are dropped.
    pub fn handle_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::GamepadConnected {
                index,
                id,
                axis_count,
            } => {
                if let Some(gp) = self.gamepad.as_mut() {
                    gp.on_connected(*index, id, *axis_count);
                }
            }
            InputEvent::GamepadDisconnected { index } => {
                let was_registered = self
                    .gamepad
                    .as_mut()
                    .is_some_and(|gp| gp.on_disconnected(*index));
                if was_registered {
                    let cleared = self.pads.clear_written_by(SourceKind::Gamepad);
                    if !cleared.is_empty() {
                        tracing::debug!(?cleared, "cleared pads driven by disconnected gamepad");
                    }
                }
            }
            InputEvent::JoystickMove(ev) => {
                if let Some(manager) = self.joysticks.as_mut() {
                    manager.on_move(ev, &mut self.pads);
                }
            }
            InputEvent::JoystickEnd { id } => {
                if let Some(manager) = self.joysticks.as_mut() {
                    manager.on_end(*id, &mut self.pads);
                }
            }
        }
    }

    /// Poll the continuous sources and return this frame's pad values.
    pub fn sample(&mut self, gamepads: &dyn GamepadPoll, xr_frame: Option<&XrFrame>) -> PadSnapshot {
        let _span = tracing::trace_span!("input_sample").entered();

        if let Some(gp) = &self.gamepad {
            gp.poll(gamepads, &mut self.pads);
        }
        if let Some(xr) = &self.xr {
            xr.poll(xr_frame, &mut self.pads);
        }

        let snap = self.pads.snapshot();
        tracing::trace!(
            left_writer = ?self.pads.channel(PadSide::Left).last_writer(),
            right_writer = ?self.pads.channel(PadSide::Right).last_writer(),
            ?snap,
            "pads sampled"
        );
        snap
    }

    /// Tear down every source.
    pub fn shutdown(&mut self) {
        self.disable_joysticks();
        self.disable_gamepad();
        self.disable_xr();
    }
}

impl Drop for InputAggregator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
