use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::math::distance_2d::{closest_on_segment, point_to_segment_dist};
use crate::math::{Coord, Point2, Vector2, SCALED_EPSILON};

/// A 2D point in scaled integer coordinates.
///
/// Ordering is lexicographic on `(x, y)`, which is the key used to
/// deduplicate navigation mesh vertices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
}

impl Point {
    #[must_use]
    pub const fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    /// Creates a point from millimetre coordinates.
    #[must_use]
    pub fn new_scale(x_mm: f64, y_mm: f64) -> Self {
        Self::new(crate::math::scale(x_mm), crate::math::scale(y_mm))
    }

    /// Rounds a floating-point position back onto the integer grid.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_f64(p: &Point2) -> Self {
        Self::new(p.x.round() as Coord, p.y.round() as Coord)
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_f64(self) -> Point2 {
        Point2::new(self.x as f64, self.y as f64)
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_vector(self) -> Vector2 {
        Vector2::new(self.x as f64, self.y as f64)
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn distance_to_sq(&self, other: &Point) -> f64 {
        let dx = (other.x - self.x) as f64;
        let dy = (other.y - self.y) as f64;
        dx * dx + dy * dy
    }

    #[must_use]
    pub fn distance_to(&self, other: &Point) -> f64 {
        self.distance_to_sq(other).sqrt()
    }

    /// Both coordinates within [`SCALED_EPSILON`].
    #[must_use]
    pub fn coincides_with_epsilon(&self, other: &Point) -> bool {
        (self.x - other.x).abs() < SCALED_EPSILON && (self.y - other.y).abs() < SCALED_EPSILON
    }

    /// Cross product of `(a - self)` and `(b - self)`.
    ///
    /// Positive when `self → a → b` turns counter-clockwise.
    #[must_use]
    pub fn ccw(&self, a: &Point, b: &Point) -> i128 {
        i128::from(a.x - self.x) * i128::from(b.y - self.y)
            - i128::from(a.y - self.y) * i128::from(b.x - self.x)
    }

    /// Index of the point in `points` closest to `self`.
    #[must_use]
    pub fn nearest_point_index(&self, points: &[Point]) -> Option<usize> {
        points
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| self.distance_to_sq(a).total_cmp(&self.distance_to_sq(b)))
            .map(|(i, _)| i)
    }

    /// Index of the point minimising `|self p| + |p dest|`.
    #[must_use]
    pub fn nearest_waypoint_index(&self, points: &[Point], dest: &Point) -> Option<usize> {
        points
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                let da = self.distance_to(a) + a.distance_to(dest);
                let db = self.distance_to(b) + b.distance_to(dest);
                da.total_cmp(&db)
            })
            .map(|(i, _)| i)
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn distance_to_segment(&self, a: &Point, b: &Point) -> f64 {
        point_to_segment_dist(
            self.x as f64,
            self.y as f64,
            a.x as f64,
            a.y as f64,
            b.x as f64,
            b.y as f64,
        )
    }

    /// Closest point to `self` on the segment `a`–`b`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn projection_onto_segment(&self, a: &Point, b: &Point) -> Point {
        let (x, y, _) = closest_on_segment(
            self.x as f64,
            self.y as f64,
            a.x as f64,
            a.y as f64,
            b.x as f64,
            b.y as f64,
        );
        Point::from_f64(&Point2::new(x, y))
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}
