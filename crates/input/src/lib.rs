//! Input sources merged into two shared control pads.
//!
//! # Invariants
//! - Sources are never prioritized: the last writer of a pad wins.
//! - Event sources apply on delivery; polled sources overwrite at sampling.
//! - Disabling a source releases it; doing so twice is a no-op.

pub mod action;
pub mod aggregator;
pub mod gamepad;
#[cfg(feature = "gilrs")]
pub mod gilrs_backend;
pub mod joystick;
pub mod pads;
pub mod xr;

pub use action::{Action, KeyMap, KeyboardControls, KeyboardState};
pub use aggregator::{InputAggregator, InputConfig, InputEvent};
pub use gamepad::{DEFAULT_DEADZONE, GamepadPoll, GamepadSnapshot, NoGamepads, PhysicalGamepad, deadzone};
#[cfg(feature = "gilrs")]
pub use gilrs_backend::GilrsBackend;
pub use joystick::{
    InputError, JoystickManager, JoystickMode, JoystickMove, JoystickOptions, SurfaceSize, TouchId,
};
pub use pads::{PadChannel, PadSnapshot, PadState, SourceKind};
pub use xr::{XrController, XrControllers, XrFrame, XrGamepad};

pub fn crate_info() -> &'static str {
    "rigspace-input v0.1.0"
}
