use serde::{Deserialize, Serialize};

use super::{BoundingBox, Line, Point, Polyline};
use crate::math::polygon_2d::{ring_contains, signed_area2_i128, signed_area_2d};
use crate::math::{Point2, Vector2};

/// A closed ring of scaled points. The closing edge is implicit.
///
/// Counter-clockwise rings are contours, clockwise rings are holes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polygon {
    pub points: Vec<Point>,
}

impl Polygon {
    #[must_use]
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Axis-aligned rectangle from millimetre corners, counter-clockwise.
    #[must_use]
    pub fn rectangle_mm(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self::new(vec![
            Point::new_scale(x0, y0),
            Point::new_scale(x1, y0),
            Point::new_scale(x1, y1),
            Point::new_scale(x0, y1),
        ])
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.points.len() >= 3
    }

    /// Signed area in scaled units squared (positive when counter-clockwise).
    #[must_use]
    pub fn area(&self) -> f64 {
        signed_area_2d(&self.points)
    }

    #[must_use]
    pub fn is_counter_clockwise(&self) -> bool {
        signed_area2_i128(&self.points) > 0
    }

    /// Reverses the ring if it is clockwise. Returns `true` if it was reversed.
    pub fn make_counter_clockwise(&mut self) -> bool {
        if self.is_counter_clockwise() {
            false
        } else {
            self.points.reverse();
            true
        }
    }

    /// Reverses the ring if it is counter-clockwise. Returns `true` if it was reversed.
    pub fn make_clockwise(&mut self) -> bool {
        if self.is_counter_clockwise() {
            self.points.reverse();
            true
        } else {
            false
        }
    }

    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    #[must_use]
    pub fn first_point(&self) -> Point {
        self.points.first().copied().unwrap_or_default()
    }

    /// Boundary-inclusive containment test.
    #[must_use]
    pub fn contains(&self, p: &Point) -> bool {
        ring_contains(&self.points, *p)
    }

    /// Edges of the ring including the closing edge.
    #[must_use]
    pub fn lines(&self) -> Vec<Line> {
        let n = self.points.len();
        if n < 2 {
            return Vec::new();
        }
        (0..n)
            .map(|i| Line::new(self.points[i], self.points[(i + 1) % n]))
            .collect()
    }

    /// Perimeter length including the closing edge.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.lines().iter().map(Line::length).sum()
    }

    /// Opens the ring at vertex `index`; the result starts and ends there.
    #[must_use]
    pub fn split_at_index(&self, index: usize) -> Polyline {
        let n = self.points.len();
        if n == 0 {
            return Polyline::default();
        }
        let index = index % n;
        let mut points = Vec::with_capacity(n + 1);
        points.extend_from_slice(&self.points[index..]);
        points.extend_from_slice(&self.points[..=index]);
        Polyline::new(points)
    }

    #[must_use]
    pub fn split_at_first_point(&self) -> Polyline {
        self.split_at_index(0)
    }

    /// Area centroid, falling back to the vertex average for degenerate rings.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn centroid(&self) -> Point {
        let n = self.points.len();
        if n == 0 {
            return Point::default();
        }
        let area2 = signed_area2_i128(&self.points) as f64;
        if area2.abs() < 1.0 {
            let sum = self
                .points
                .iter()
                .fold(Vector2::zeros(), |acc, p| acc + p.to_vector());
            return Point::from_f64(&Point2::from(sum / n as f64));
        }
        let origin = self.points[0].to_f64();
        let (mut cx, mut cy) = (0.0, 0.0);
        for i in 0..n {
            let a = self.points[i].to_f64() - origin;
            let b = self.points[(i + 1) % n].to_f64() - origin;
            let cross = a.x * b.y - b.x * a.y;
            cx += (a.x + b.x) * cross;
            cy += (a.y + b.y) * cross;
        }
        Point::from_f64(&Point2::new(
            origin.x + cx / (3.0 * area2),
            origin.y + cy / (3.0 * area2),
        ))
    }

    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }

    /// Closest point on the ring to `p` and the index of the edge it lies on.
    #[must_use]
    pub fn project(&self, p: &Point) -> Option<(Point, usize)> {
        self.lines()
            .iter()
            .enumerate()
            .map(|(i, l)| (l.projection(p), i))
            .min_by(|(a, _), (b, _)| p.distance_to_sq(a).total_cmp(&p.distance_to_sq(b)))
    }
}

impl From<Vec<Point>> for Polygon {
    fn from(points: Vec<Point>) -> Self {
        Self::new(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Polygon {
        Polygon::new(vec![
            Point::new(0, 0),
            Point::new(100, 0),
            Point::new(100, 100),
            Point::new(0, 100),
        ])
    }

    #[test]
    fn orientation_round_trip() {
        let mut sq = square();
        assert!(sq.is_counter_clockwise());
        assert!(sq.make_clockwise());
        assert!(!sq.is_counter_clockwise());
        assert!(!sq.make_clockwise());
        assert!(sq.make_counter_clockwise());
    }

    #[test]
    fn split_at_index_closes_the_ring() {
        let pl = square().split_at_index(2);
        assert_eq!(pl.points.len(), 5);
        assert_eq!(pl.first_point(), Point::new(100, 100));
        assert_eq!(pl.last_point(), Point::new(100, 100));
        assert!((pl.length() - 400.0).abs() < 1e-9);
    }

    #[test]
    fn centroid_of_square() {
        assert_eq!(square().centroid(), Point::new(50, 50));
    }

    #[test]
    fn project_onto_closing_edge() {
        let (p, idx) = square()
            .project(&Point::new(-10, 40))
            .unwrap_or_else(|| panic!("empty"));
        assert_eq!(p, Point::new(0, 40));
        assert_eq!(idx, 3);
    }
}
