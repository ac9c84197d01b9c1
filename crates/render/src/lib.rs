//! Rendering Adapter: renderer-agnostic interface over simulation frames.
//!
//! # Invariants
//! - Renderers read frame output; they never mutate the simulation.
//! - Rope points arrive in the rope frame and are placed in the world here.

mod renderer;

pub use renderer::{DebugTextRenderer, RenderView, Renderer, rope_polyline};

pub fn crate_info() -> &'static str {
    "rigspace-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
