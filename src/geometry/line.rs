use super::Point;
use crate::math::intersect_2d::segment_segment_intersect_2d;
use crate::math::{Point2, Vector2};

/// A directed segment between two scaled points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub a: Point,
    pub b: Point,
}

impl Line {
    #[must_use]
    pub const fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.a.distance_to(&self.b)
    }

    #[must_use]
    pub fn midpoint(&self) -> Point {
        Point::new((self.a.x + self.b.x) / 2, (self.a.y + self.b.y) / 2)
    }

    /// Direction vector `b - a` in floating point.
    #[must_use]
    pub fn vector(&self) -> Vector2 {
        (self.b - self.a).to_vector()
    }

    #[must_use]
    pub fn reversed(&self) -> Line {
        Line::new(self.b, self.a)
    }

    #[must_use]
    pub fn distance_to(&self, p: &Point) -> f64 {
        p.distance_to_segment(&self.a, &self.b)
    }

    /// Closest point on the segment to `p`.
    #[must_use]
    pub fn projection(&self, p: &Point) -> Point {
        p.projection_onto_segment(&self.a, &self.b)
    }

    /// Point at `distance` from `a` along the segment direction (not clamped).
    #[must_use]
    pub fn point_at(&self, distance: f64) -> Point {
        let len = self.length();
        if len <= 0.0 {
            return self.a;
        }
        let p = self.a.to_f64() + self.vector() * (distance / len);
        Point::from_f64(&p)
    }

    /// Intersection point of two bounded segments.
    #[must_use]
    pub fn intersection(&self, other: &Line) -> Option<Point> {
        segment_segment_intersect_2d(
            &self.a.to_f64(),
            &self.b.to_f64(),
            &other.a.to_f64(),
            &other.b.to_f64(),
        )
        .map(|(p, _, _)| Point::from_f64(&p))
    }

    /// Dot product of the two direction vectors.
    #[must_use]
    pub fn dot(&self, other: &Line) -> f64 {
        self.vector().dot(&other.vector())
    }

    #[must_use]
    pub fn a_f64(&self) -> Point2 {
        self.a.to_f64()
    }

    #[must_use]
    pub fn b_f64(&self) -> Point2 {
        self.b.to_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_at_walks_along_direction() {
        let l = Line::new(Point::new(0, 0), Point::new(0, 100));
        assert_eq!(l.point_at(25.0), Point::new(0, 25));
        assert_eq!(l.point_at(150.0), Point::new(0, 150));
    }

    #[test]
    fn crossing_lines_intersect() {
        let l1 = Line::new(Point::new(0, 0), Point::new(100, 100));
        let l2 = Line::new(Point::new(0, 100), Point::new(100, 0));
        assert_eq!(l1.intersection(&l2), Some(Point::new(50, 50)));
        let l3 = Line::new(Point::new(200, 0), Point::new(300, 0));
        assert_eq!(l1.intersection(&l3), None);
    }
}
