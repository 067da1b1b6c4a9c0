use super::{Point, Polygon};
use crate::math::Coord;

/// Axis-aligned bounding box. `defined` is `false` for an empty box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
    pub defined: bool,
}

impl BoundingBox {
    #[must_use]
    pub fn from_points(points: &[Point]) -> Self {
        let mut bb = Self::default();
        for p in points {
            bb.merge_point(p);
        }
        bb
    }

    pub fn merge_point(&mut self, p: &Point) {
        if self.defined {
            self.min = Point::new(self.min.x.min(p.x), self.min.y.min(p.y));
            self.max = Point::new(self.max.x.max(p.x), self.max.y.max(p.y));
        } else {
            self.min = *p;
            self.max = *p;
            self.defined = true;
        }
    }

    pub fn merge(&mut self, other: &BoundingBox) {
        if other.defined {
            self.merge_point(&other.min);
            self.merge_point(&other.max);
        }
    }

    #[must_use]
    pub fn offset(&self, delta: Coord) -> BoundingBox {
        if !self.defined {
            return *self;
        }
        BoundingBox {
            min: Point::new(self.min.x - delta, self.min.y - delta),
            max: Point::new(self.max.x + delta, self.max.y + delta),
            defined: true,
        }
    }

    /// Counter-clockwise rectangle over the box.
    #[must_use]
    pub fn polygon(&self) -> Polygon {
        Polygon::new(vec![
            self.min,
            Point::new(self.max.x, self.min.y),
            self.max,
            Point::new(self.min.x, self.max.y),
        ])
    }

    #[must_use]
    pub fn contains(&self, p: &Point) -> bool {
        self.defined && p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_and_offset() {
        let mut bb = BoundingBox::from_points(&[Point::new(0, 0), Point::new(10, 5)]);
        bb.merge(&BoundingBox::from_points(&[Point::new(-5, 20)]));
        assert_eq!(bb.min, Point::new(-5, 0));
        assert_eq!(bb.max, Point::new(10, 20));
        let grown = bb.offset(2);
        assert!(grown.contains(&Point::new(-7, -2)));
        assert!(grown.polygon().is_counter_clockwise());
    }

    #[test]
    fn empty_box_contains_nothing() {
        let bb = BoundingBox::default();
        assert!(!bb.contains(&Point::new(0, 0)));
    }
}
