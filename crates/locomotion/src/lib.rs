//! Player locomotion from the shared pads, and the keyboard-rolled ball.
//!
//! # Invariants
//! - The integrator is the only writer of the player rig.
//! - Sensitivities are read, never changed.

pub mod ball;
pub mod integrator;

pub use ball::{BallConfig, BallController, BallUpdate};
pub use integrator::{LocomotionIntegrator, TimeScaling};

pub fn crate_info() -> &'static str {
    "rigspace-locomotion v0.1.0"
}
