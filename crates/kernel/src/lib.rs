//! Rigspace kernel: scene configuration and the per-frame scheduler that
//! turns device input into player motion and rope/ball physics.
//!
//! # Invariants
//! - One frame runs input, locomotion, ball, pivot drive, physics step and
//!   curve reconstruction, in that order.
//! - The simulation is the only writer of the player rig.
//! - Every XR presenting transition puts the rig back at the origin.

pub mod config;
pub mod simulation;

pub use config::{ConfigError, GroundConfig, SceneConfig};
pub use simulation::{FrameEvent, FrameInput, FrameOutput, Simulation, SimulationError};

pub fn crate_info() -> &'static str {
    "rigspace-kernel v0.1.0"
}
