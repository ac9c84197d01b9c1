use glam::{Quat, Vec3};
use rigspace_common::PlayerRig;
use rigspace_kernel::FrameOutput;
use rigspace_physics::sample_centripetal;

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Field of view in degrees.
    pub fov_degrees: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(7.0, 4.0, 21.0),
            target: Vec3::ZERO,
            fov_degrees: 50.0,
        }
    }
}

impl RenderView {
    /// The view of a camera carried by the player, facing along the rig's
    /// yaw.
    pub fn from_player(player: &PlayerRig) -> Self {
        let forward = Quat::from_rotation_y(player.yaw) * Vec3::NEG_Z;
        Self {
            eye: player.position,
            target: player.position + forward,
            ..Self::default()
        }
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads one frame's output and a view, then produces output.
/// It never feeds anything back into the simulation.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given frame output and view.
    fn render(&self, frame: &FrameOutput, view: &RenderView) -> Self::Output;
}

/// Smooth world-space polyline through the rope points of `frame`.
///
/// Empty when the frame has no rope.
pub fn rope_polyline(frame: &FrameOutput, per_span: usize) -> Vec<Vec3> {
    let Some(rope_frame) = frame.rope_frame else {
        return Vec::new();
    };
    sample_centripetal(&frame.rope_points, per_span)
        .into_iter()
        .map(|p| rope_frame.local_to_world(p))
        .collect()
}

/// Text renderer for the CLI, logs and tests.
#[derive(Debug)]
pub struct DebugTextRenderer {
    /// Curve samples per rope span.
    pub per_span: usize,
}

impl Default for DebugTextRenderer {
    fn default() -> Self {
        Self { per_span: 8 }
    }
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, frame: &FrameOutput, view: &RenderView) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "=== Frame (tick={}, dt={:.4}) ===\n",
            frame.tick, frame.dt
        ));
        let p = frame.player.position;
        out.push_str(&format!(
            "Player: pos=({:.2}, {:.2}, {:.2}) yaw={:.3}\n",
            p.x, p.y, p.z, frame.player.yaw
        ));
        out.push_str(&format!(
            "Pads: left=({:.2}, {:.2}) right=({:.2}, {:.2})\n",
            frame.pads.left.x, frame.pads.left.y, frame.pads.right.x, frame.pads.right.y
        ));
        out.push_str(&format!(
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}\n",
            view.eye.x,
            view.eye.y,
            view.eye.z,
            view.target.x,
            view.target.y,
            view.target.z,
            view.fov_degrees
        ));

        if let Some(ball) = frame.ball {
            let b = ball.position;
            out.push_str(&format!("Ball: pos=({:.2}, {:.2}, {:.2})\n", b.x, b.y, b.z));
        }

        if frame.rope_frame.is_some() {
            let line = rope_polyline(frame, self.per_span);
            out.push_str(&format!(
                "Rope: {} segments, {} curve points\n",
                frame.rope_points.len(),
                line.len()
            ));
            for (i, p) in frame.rope_points.iter().enumerate() {
                out.push_str(&format!("  [{i}] local=({:.2}, {:.2}, {:.2})\n", p.x, p.y, p.z));
            }
            if let Some(cmd) = frame.pivot {
                let e = cmd.position_error;
                out.push_str(&format!(
                    "  pivot error=({:.3}, {:.3}, {:.3}) angle={:.3}\n",
                    e.x,
                    e.y,
                    e.z,
                    cmd.rotation_error.length()
                ));
            }
        }

        tracing::trace!(tick = frame.tick, bytes = out.len(), "frame rendered as text");
        out
    }
}
