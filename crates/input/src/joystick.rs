use std::collections::BTreeMap;

use glam::Vec2;
use rigspace_common::{Pad, PadSide};
use serde::{Deserialize, Serialize};

use crate::pads::{PadState, SourceKind};

/// Errors from input source setup.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum InputError {
    #[error("joystick surface has no area: {width}x{height}")]
    InvalidSurface { width: f32, height: f32 },
    #[error("invalid joystick options: {0}")]
    InvalidOptions(String),
    #[error("gamepad backend unavailable: {0}")]
    Backend(String),
}

/// Where joysticks appear on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JoystickMode {
    /// A stick spawns wherever a touch starts.
    Dynamic,
    /// A single stick sits at a fixed centre, in surface pixels.
    Static { x: f32, y: f32 },
}

/// One stick per pad.
const MAX_STICKS: usize = 2;

/// Creation parameters for the on-screen joystick manager.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoystickOptions {
    pub mode: JoystickMode,
    pub multitouch: bool,
    /// At most two: side assignment compares a stick against one other.
    pub max_joysticks: usize,
    /// Stick diameter in surface pixels.
    pub size: f32,
    /// Samples reporting more force than this are discarded.
    pub max_force: f32,
}

impl Default for JoystickOptions {
    fn default() -> Self {
        Self {
            mode: JoystickMode::Dynamic,
            multitouch: true,
            max_joysticks: 2,
            size: 100.0,
            max_force: 4.0,
        }
    }
}

impl JoystickOptions {
    fn validate(&self) -> Result<(), InputError> {
        if !(1..=MAX_STICKS).contains(&self.max_joysticks) {
            return Err(InputError::InvalidOptions(format!(
                "max_joysticks must be 1 or 2, got {}",
                self.max_joysticks
            )));
        }
        if !(self.size.is_finite() && self.size > 0.0) {
            return Err(InputError::InvalidOptions(format!(
                "size must be positive, got {}",
                self.size
            )));
        }
        if !(self.max_force.is_finite() && self.max_force > 0.0) {
            return Err(InputError::InvalidOptions(format!(
                "max_force must be positive, got {}",
                self.max_force
            )));
        }
        Ok(())
    }

    /// How many sticks may be active at once.
    fn capacity(&self) -> usize {
        if self.multitouch { self.max_joysticks } else { 1 }
    }
}

/// Size of the surface hosting the joysticks, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: f32,
    pub height: f32,
}

impl SurfaceSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

pub type TouchId = u32;

/// A `move` event from one stick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JoystickMove {
    pub id: TouchId,
    /// Touch position in surface pixels.
    pub position: Vec2,
    /// Unit-ish stick deflection, +y up.
    pub vector: Vec2,
    /// Deflection distance relative to the stick size.
    pub force: f32,
}

#[derive(Debug, Clone, Copy)]
struct ActiveStick {
    position: Vec2,
    side: Option<PadSide>,
}

/// Manager for on-screen joysticks.
///
/// Lives between `create` and `destroy`. Each active touch drives one pad,
/// chosen by where the touch sits relative to the surface midpoint (one
/// touch) or to the other touch (two touches).
#[derive(Debug)]
pub struct JoystickManager {
    options: JoystickOptions,
    surface: SurfaceSize,
    active: BTreeMap<TouchId, ActiveStick>,
    destroyed: bool,
}

impl JoystickManager {
    /// Validate `options` against `surface` and start with no active sticks.
    pub fn create(options: JoystickOptions, surface: SurfaceSize) -> Result<Self, InputError> {
        if !(surface.width > 0.0 && surface.height > 0.0) {
            return Err(InputError::InvalidSurface {
                width: surface.width,
                height: surface.height,
            });
        }
        options.validate()?;
        tracing::debug!(?options, ?surface, "joystick manager created");
        Ok(Self {
            options,
            surface,
            active: BTreeMap::new(),
            destroyed: false,
        })
    }

    /// Options the manager was created with.
    pub fn options(&self) -> &JoystickOptions {
        &self.options
    }

    /// Surface the sticks were created on.
    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }

    /// True once [`Self::destroy`] has run; later events are ignored.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Touch ids currently holding a stick, ascending.
    pub fn active_ids(&self) -> Vec<TouchId> {
        self.active.keys().copied().collect()
    }

    /// Route a move sample to a pad. Returns the pad written, if any.
    pub fn on_move(&mut self, ev: &JoystickMove, pads: &mut PadState) -> Option<PadSide> {
        if self.destroyed {
            return None;
        }
        if !ev.vector.is_finite() || !ev.force.is_finite() || ev.force > self.options.max_force
        {
            tracing::trace!(id = ev.id, force = ev.force, "discarding joystick sample");
            return None;
        }
        if !self.active.contains_key(&ev.id) && self.active.len() >= self.options.capacity() {
            tracing::trace!(id = ev.id, "no free joystick slot");
            return None;
        }

        let position = match self.options.mode {
            JoystickMode::Dynamic => ev.position,
            JoystickMode::Static { x, y } => Vec2::new(x, y),
        };
        self.active
            .entry(ev.id)
            .and_modify(|s| s.position = position)
            .or_insert(ActiveStick {
                position,
                side: None,
            });

        let side = self.side_for(ev.id, position);
        let previous = self.active.get_mut(&ev.id).and_then(|s| s.side.replace(side));
        // A stick that crossed over releases the pad it left, unless another
        // stick has taken it.
        if let Some(previous) = previous.filter(|p| *p != side && !self.side_taken(ev.id, *p)) {
            pads.write(previous, Pad::ZERO, SourceKind::VirtualJoystick);
        }
        pads.write(
            side,
            Pad::new(ev.vector.x, -ev.vector.y),
            SourceKind::VirtualJoystick,
        );
        Some(side)
    }

    fn side_taken(&self, id: TouchId, side: PadSide) -> bool {
        self.active
            .iter()
            .any(|(other_id, stick)| *other_id != id && stick.side == Some(side))
    }

    fn side_for(&self, id: TouchId, position: Vec2) -> PadSide {
        let other = self
            .active
            .iter()
            .find(|(other_id, _)| **other_id != id)
            .map(|(_, stick)| stick.position);

        let pivot_x = match other {
            Some(other) => other.x,
            None => self.surface.width / 2.0,
        };
        if position.x < pivot_x {
            PadSide::Left
        } else {
            PadSide::Right
        }
    }

    /// Release a stick and zero the pad it was driving.
    pub fn on_end(&mut self, id: TouchId, pads: &mut PadState) -> Option<PadSide> {
        if self.destroyed {
            return None;
        }
        let side = self.active.remove(&id)?.side?;
        pads.write(side, Pad::ZERO, SourceKind::VirtualJoystick);
        Some(side)
    }

    /// Tear down every stick. Pads last written by a joystick are zeroed.
    /// Safe to call repeatedly; only the first call does anything.
    pub fn destroy(&mut self, pads: &mut PadState) -> bool {
        if self.destroyed {
            return false;
        }
        self.destroyed = true;
        self.active.clear();
        let cleared = pads.clear_written_by(SourceKind::VirtualJoystick);
        tracing::debug!(?cleared, "joystick manager destroyed");
        true
    }
}
