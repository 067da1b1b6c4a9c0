use super::Coord;
use crate::geometry::Point;

/// Computes twice the signed area of a closed ring (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise. Accumulated in
/// `i128` so large scaled coordinates cannot overflow.
#[must_use]
pub fn signed_area2_i128(points: &[Point]) -> i128 {
    let n = points.len();
    if n < 3 {
        return 0;
    }
    let mut sum: i128 = 0;
    for i in 0..n {
        let j = (i + 1) % n;
        let (a, b) = (points[i], points[j]);
        sum += i128::from(a.x) * i128::from(b.y) - i128::from(b.x) * i128::from(a.y);
    }
    sum
}

/// Signed area of a closed ring in scaled units squared.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn signed_area_2d(points: &[Point]) -> f64 {
    signed_area2_i128(points) as f64 * 0.5
}

/// Even-odd point-in-ring test. Points on the boundary count as inside.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn ring_contains(points: &[Point], p: Point) -> bool {
    let (x, y) = (p.x, p.y);
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    for i in 0..n {
        let (ax, ay) = (points[i].x, points[i].y);
        let (bx, by) = (points[(i + 1) % n].x, points[(i + 1) % n].y);
        if on_segment(ax, ay, bx, by, x, y) {
            return true;
        }
        if (ay > y) != (by > y) {
            let t = (y - ay) as f64 / (by - ay) as f64;
            let cx = ax as f64 + t * (bx - ax) as f64;
            if (x as f64) < cx {
                inside = !inside;
            }
        }
    }
    inside
}

fn on_segment(ax: Coord, ay: Coord, bx: Coord, by: Coord, x: Coord, y: Coord) -> bool {
    let cross = i128::from(bx - ax) * i128::from(y - ay) - i128::from(by - ay) * i128::from(x - ax);
    if cross != 0 {
        return false;
    }
    x >= ax.min(bx) && x <= ax.max(bx) && y >= ay.min(by) && y <= ay.max(by)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(Coord, Coord)]) -> Vec<Point> {
        raw.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    fn square() -> Vec<Point> {
        pts(&[(0, 0), (10, 0), (10, 10), (0, 10)])
    }

    #[test]
    fn signed_area_ccw_square() {
        assert!((signed_area_2d(&square()) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn signed_area_cw_square() {
        let mut ring = square();
        ring.reverse();
        assert!((signed_area_2d(&ring) + 100.0).abs() < 1e-9);
    }

    #[test]
    fn signed_area_degenerate() {
        assert_eq!(signed_area2_i128(&pts(&[(0, 0), (1, 1)])), 0);
    }

    #[test]
    fn containment_inside_outside_boundary() {
        let ring = square();
        assert!(ring_contains(&ring, Point::new(5, 5)));
        assert!(!ring_contains(&ring, Point::new(15, 5)));
        assert!(ring_contains(&ring, Point::new(10, 5)));
    }
}
