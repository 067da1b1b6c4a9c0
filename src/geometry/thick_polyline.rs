use super::{Line, Point, Polyline};
use crate::math::CoordF;

/// A segment with a width at each end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThickLine {
    pub a: Point,
    pub b: Point,
    pub a_width: CoordF,
    pub b_width: CoordF,
}

impl ThickLine {
    #[must_use]
    pub fn length(&self) -> f64 {
        self.a.distance_to(&self.b)
    }

    #[must_use]
    pub fn line(&self) -> Line {
        Line::new(self.a, self.b)
    }
}

/// A polyline with a scaled width per point.
///
/// `endpoints` marks whether the start/end is a true dead end rather than a
/// junction awaiting concatenation with another thick polyline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThickPolyline {
    pub points: Vec<Point>,
    pub width: Vec<CoordF>,
    pub endpoints: (bool, bool),
}

impl ThickPolyline {
    /// Pairs points with widths. Extra entries on either side are dropped.
    #[must_use]
    pub fn new(mut points: Vec<Point>, mut width: Vec<CoordF>, endpoints: (bool, bool)) -> Self {
        let n = points.len().min(width.len());
        points.truncate(n);
        width.truncate(n);
        Self {
            points,
            width,
            endpoints,
        }
    }

    /// A constant-width thick polyline over `polyline`.
    #[must_use]
    pub fn constant(polyline: &Polyline, width: CoordF) -> Self {
        Self::new(
            polyline.points.clone(),
            vec![width; polyline.points.len()],
            (true, true),
        )
    }

    #[must_use]
    pub fn first_point(&self) -> Point {
        self.points.first().copied().unwrap_or_default()
    }

    #[must_use]
    pub fn last_point(&self) -> Point {
        self.points.last().copied().unwrap_or_default()
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance_to(&w[1])).sum()
    }

    /// First and last point coincide.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.points.len() > 2 && self.first_point() == self.last_point()
    }

    pub fn reverse(&mut self) {
        self.points.reverse();
        self.width.reverse();
        self.endpoints = (self.endpoints.1, self.endpoints.0);
    }

    #[must_use]
    pub fn thicklines(&self) -> Vec<ThickLine> {
        self.points
            .windows(2)
            .zip(self.width.windows(2))
            .map(|(p, w)| ThickLine {
                a: p[0],
                b: p[1],
                a_width: w[0],
                b_width: w[1],
            })
            .collect()
    }

    #[must_use]
    pub fn to_polyline(&self) -> Polyline {
        Polyline::new(self.points.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_stay_paired_with_points() {
        let tp = ThickPolyline::new(
            vec![Point::new(0, 0), Point::new(10, 0), Point::new(20, 0)],
            vec![1.0, 2.0],
            (true, false),
        );
        assert_eq!(tp.points.len(), tp.width.len());
        assert_eq!(tp.thicklines().len(), 1);
    }

    #[test]
    fn reverse_swaps_endpoint_flags() {
        let mut tp = ThickPolyline::new(
            vec![Point::new(0, 0), Point::new(10, 0)],
            vec![1.0, 3.0],
            (true, false),
        );
        tp.reverse();
        assert_eq!(tp.endpoints, (false, true));
        assert_eq!(tp.width, vec![3.0, 1.0]);
        assert_eq!(tp.first_point(), Point::new(10, 0));
    }
}
