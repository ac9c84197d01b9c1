//! Centripetal Catmull-Rom sampling for rope rendering.

use glam::Vec3;

/// Coincident points closer than this get a fallback parameter step.
const MIN_KNOT_STEP: f32 = 1e-4;

/// Cubic `c0 + c1 t + c2 t^2 + c3 t^3` for one span.
#[derive(Debug, Clone, Copy)]
struct Cubic {
    c0: Vec3,
    c1: Vec3,
    c2: Vec3,
    c3: Vec3,
}

impl Cubic {
    /// Hermite form: endpoints `p1`, `p2` with tangents `t1`, `t2`.
    fn hermite(p1: Vec3, p2: Vec3, t1: Vec3, t2: Vec3) -> Self {
        Self {
            c0: p1,
            c1: t1,
            c2: -3.0 * p1 + 3.0 * p2 - 2.0 * t1 - t2,
            c3: 2.0 * p1 - 2.0 * p2 + t1 + t2,
        }
    }

    /// Catmull-Rom span from `p1` to `p2` with centripetal knot spacing.
    fn centripetal(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3) -> Self {
        let mut dt0 = p0.distance(p1).sqrt();
        let mut dt1 = p1.distance(p2).sqrt();
        let mut dt2 = p2.distance(p3).sqrt();
        if dt1 < MIN_KNOT_STEP {
            dt1 = 1.0;
        }
        if dt0 < MIN_KNOT_STEP {
            dt0 = dt1;
        }
        if dt2 < MIN_KNOT_STEP {
            dt2 = dt1;
        }

        let t1 = (p1 - p0) / dt0 - (p2 - p0) / (dt0 + dt1) + (p2 - p1) / dt1;
        let t2 = (p2 - p1) / dt1 - (p3 - p1) / (dt1 + dt2) + (p3 - p2) / dt2;
        Self::hermite(p1, p2, t1 * dt1, t2 * dt1)
    }

    fn at(&self, t: f32) -> Vec3 {
        let t2 = t * t;
        self.c0 + self.c1 * t + self.c2 * t2 + self.c3 * t2 * t
    }
}

/// Sample an open centripetal Catmull-Rom curve through `points`.
///
/// Returns `(n - 1) * per_span + 1` points for `n >= 2`; the control points
/// appear at every `per_span`-th index. End tangents use mirrored phantom
/// points.
pub fn sample_centripetal(points: &[Vec3], per_span: usize) -> Vec<Vec3> {
    let n = points.len();
    if n < 2 {
        return points.to_vec();
    }
    let per_span = per_span.max(1);

    let mut out = Vec::with_capacity((n - 1) * per_span + 1);
    for i in 0..n - 1 {
        let p1 = points[i];
        let p2 = points[i + 1];
        let p0 = if i > 0 { points[i - 1] } else { 2.0 * p1 - p2 };
        let p3 = if i + 2 < n {
            points[i + 2]
        } else {
            2.0 * p2 - p1
        };
        let span = Cubic::centripetal(p0, p1, p2, p3);
        for k in 0..per_span {
            out.push(span.at(k as f32 / per_span as f32));
        }
    }
    out.push(points[n - 1]);
    out
}
