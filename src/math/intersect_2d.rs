use super::{Point2, Vector2, TOLERANCE};

/// 2D cross product (z component of the 3D cross product).
#[must_use]
pub fn cross_2d(a: &Vector2, b: &Vector2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Parametric 2D line-line intersection.
///
/// Given lines `p1 + t * d1` and `p2 + u * d2`, returns `(t, u)` if not parallel.
#[must_use]
pub fn line_line_intersect_2d(
    p1: &Point2,
    d1: &Vector2,
    p2: &Point2,
    d2: &Vector2,
) -> Option<(f64, f64)> {
    let cross = cross_2d(d1, d2);
    if cross.abs() < TOLERANCE {
        return None;
    }
    let d = p2 - p1;
    let t = cross_2d(&d, d2) / cross;
    let u = cross_2d(&d, d1) / cross;
    Some((t, u))
}

/// Bounded segment-segment intersection in 2D.
///
/// Returns `(intersection_point, t, u)` where `t` and `u` are in `[0, 1]`.
#[must_use]
pub fn segment_segment_intersect_2d(
    a0: &Point2,
    a1: &Point2,
    b0: &Point2,
    b1: &Point2,
) -> Option<(Point2, f64, f64)> {
    let da = a1 - a0;
    let db = b1 - b0;
    let (t, u) = line_line_intersect_2d(a0, &da, b0, &db)?;

    // Use a small epsilon to include endpoints.
    let eps = TOLERANCE;
    if t >= -eps && t <= 1.0 + eps && u >= -eps && u <= 1.0 + eps {
        let t_clamped = t.clamp(0.0, 1.0);
        Some((a0 + da * t_clamped, t_clamped, u.clamp(0.0, 1.0)))
    } else {
        None
    }
}

/// Returns `true` when the open segments `a0–a1` and `b0–b1` cross at a
/// single interior point of both.
///
/// Touching at an endpoint and collinear overlap are not crossings.
#[must_use]
pub fn segments_cross_properly(a0: &Point2, a1: &Point2, b0: &Point2, b1: &Point2) -> bool {
    let da = a1 - a0;
    let db = b1 - b0;
    let d1 = cross_2d(&da, &(b0 - a0));
    let d2 = cross_2d(&da, &(b1 - a0));
    let d3 = cross_2d(&db, &(a0 - b0));
    let d4 = cross_2d(&db, &(a1 - b0));
    let scale = da.norm() * db.norm() * 1e-9;
    ((d1 > scale && d2 < -scale) || (d1 < -scale && d2 > scale))
        && ((d3 > scale && d4 < -scale) || (d3 < -scale && d4 > scale))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_segments_intersect_at_center() {
        let (p, t, u) = segment_segment_intersect_2d(
            &Point2::new(0.0, 0.0),
            &Point2::new(2.0, 2.0),
            &Point2::new(0.0, 2.0),
            &Point2::new(2.0, 0.0),
        )
        .unwrap_or_else(|| panic!("segments should intersect"));
        assert!((p.x - 1.0).abs() < 1e-12 && (p.y - 1.0).abs() < 1e-12);
        assert!((t - 0.5).abs() < 1e-12 && (u - 0.5).abs() < 1e-12);
    }

    #[test]
    fn parallel_segments_do_not_intersect() {
        assert!(segment_segment_intersect_2d(
            &Point2::new(0.0, 0.0),
            &Point2::new(1.0, 0.0),
            &Point2::new(0.0, 1.0),
            &Point2::new(1.0, 1.0),
        )
        .is_none());
    }

    #[test]
    fn touching_is_not_a_proper_crossing() {
        let a0 = Point2::new(0.0, 0.0);
        let a1 = Point2::new(2.0, 0.0);
        assert!(!segments_cross_properly(&a0, &a1, &Point2::new(1.0, 0.0), &Point2::new(1.0, 1.0)));
        assert!(segments_cross_properly(&a0, &a1, &Point2::new(1.0, -1.0), &Point2::new(1.0, 1.0)));
    }
}
