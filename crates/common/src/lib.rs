//! Shared value types: control pads, sensitivities, poses and the player rig.
//!
//! # Invariants
//! - Plain `Copy` data only; no type here owns an external resource.

mod pad;
mod types;

pub use pad::{AxisScale, Pad, PadSide, Sensitivity};
pub use types::{PlayerRig, Pose, Transform};

pub fn crate_info() -> &'static str {
    "rigspace-common v0.1.0"
}
