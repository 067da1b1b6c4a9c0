use super::TOLERANCE;

/// Returns the minimum distance from point `(px, py)` to the line segment
/// from `(ax, ay)` to `(bx, by)`.
#[must_use]
pub fn point_to_segment_dist(px: f64, py: f64, ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    let (cx, cy, _) = closest_on_segment(px, py, ax, ay, bx, by);
    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

/// Projects `(px, py)` onto the segment `(ax, ay)`–`(bx, by)`.
///
/// Returns the closest point and its clamped parameter `t` in `[0, 1]`.
#[must_use]
pub fn closest_on_segment(px: f64, py: f64, ax: f64, ay: f64, bx: f64, by: f64) -> (f64, f64, f64) {
    let dx = bx - ax;
    let dy = by - ay;
    let len_sq = dx * dx + dy * dy;

    if len_sq < TOLERANCE {
        // Degenerate segment (zero length).
        return (ax, ay, 0.0);
    }

    let t = ((px - ax) * dx + (py - ay) * dy) / len_sq;
    let t = t.clamp(0.0, 1.0);
    (ax + t * dx, ay + t * dy, t)
}
