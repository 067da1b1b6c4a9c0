use serde::{Deserialize, Serialize};

use super::{BoundingBox, Line, Point, Polygon};
use crate::math::intersect_2d::segments_cross_properly;
use crate::math::SCALED_EPSILON;

/// A region with holes: one counter-clockwise contour plus clockwise holes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExPolygon {
    pub contour: Polygon,
    pub holes: Vec<Polygon>,
}

impl ExPolygon {
    /// Builds a region, normalising ring orientation.
    #[must_use]
    pub fn new(mut contour: Polygon, mut holes: Vec<Polygon>) -> Self {
        contour.make_counter_clockwise();
        for hole in &mut holes {
            hole.make_clockwise();
        }
        Self { contour, holes }
    }

    /// Net area (contour minus holes), always non-negative for a valid region.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.contour.area().abs() - self.holes.iter().map(|h| h.area().abs()).sum::<f64>()
    }

    /// Inside the contour and not strictly inside any hole.
    #[must_use]
    pub fn contains(&self, p: &Point) -> bool {
        if !self.contour.contains(p) {
            return false;
        }
        !self
            .holes
            .iter()
            .any(|h| h.contains(p) && h.lines().iter().all(|l| l.distance_to(p) > 0.5))
    }

    /// All boundary edges, contour first.
    #[must_use]
    pub fn lines(&self) -> Vec<Line> {
        let mut lines = self.contour.lines();
        for hole in &self.holes {
            lines.extend(hole.lines());
        }
        lines
    }

    /// Contour followed by holes as a flat ring list.
    #[must_use]
    pub fn to_polygons(&self) -> Vec<Polygon> {
        let mut out = Vec::with_capacity(1 + self.holes.len());
        out.push(self.contour.clone());
        out.extend(self.holes.iter().cloned());
        out
    }

    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        self.contour.bounding_box()
    }

    /// `true` when the segment `a`–`b` stays inside the region.
    ///
    /// Endpoints may touch the boundary and the segment may run along it,
    /// but it may not cross it. The segment is split wherever it touches a
    /// boundary vertex and every piece must have its midpoint inside.
    #[must_use]
    pub fn contains_segment(&self, a: &Point, b: &Point) -> bool {
        if !self.contains(a) || !self.contains(b) {
            return false;
        }
        if a == b {
            return true;
        }
        let (fa, fb) = (a.to_f64(), b.to_f64());
        let lines = self.lines();
        if lines
            .iter()
            .any(|l| segments_cross_properly(&fa, &fb, &l.a_f64(), &l.b_f64()))
        {
            return false;
        }

        let dir = fb - fa;
        let len_sq = dir.norm_squared();
        #[allow(clippy::cast_precision_loss)]
        let eps = SCALED_EPSILON as f64;
        let mut cuts = vec![0.0, 1.0];
        cuts.extend(
            lines
                .iter()
                .map(|l| l.a)
                .filter(|v| v.distance_to_segment(a, b) <= eps)
                .map(|v| (v.to_f64() - fa).dot(&dir) / len_sq)
                .filter(|t| *t > 0.0 && *t < 1.0),
        );
        cuts.sort_by(f64::total_cmp);
        cuts.windows(2).filter(|w| w[1] > w[0]).all(|w| {
            let mid = fa + dir * ((w[0] + w[1]) / 2.0);
            self.contains(&Point::from_f64(&mid))
        })
    }
}

/// Flattens regions into a ring list (contours and holes).
#[must_use]
pub fn to_polygons(expolygons: &[ExPolygon]) -> Vec<Polygon> {
    expolygons.iter().flat_map(ExPolygon::to_polygons).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framed() -> ExPolygon {
        ExPolygon::new(
            Polygon::rectangle_mm(0.0, 0.0, 10.0, 10.0),
            vec![Polygon::rectangle_mm(4.0, 4.0, 6.0, 6.0)],
        )
    }

    #[test]
    fn holes_are_clockwise_after_new() {
        let ex = framed();
        assert!(ex.contour.is_counter_clockwise());
        assert!(!ex.holes[0].is_counter_clockwise());
    }

    #[test]
    fn hole_excludes_points() {
        let ex = framed();
        assert!(ex.contains(&Point::new_scale(1.0, 1.0)));
        assert!(!ex.contains(&Point::new_scale(5.0, 5.0)));
        assert!(ex.contains(&Point::new_scale(4.0, 5.0)));
        let expected = 100.0e12 - 4.0e12;
        assert!((ex.area() - expected).abs() < 1.0);
    }

    #[test]
    fn segment_through_hole_is_not_contained() {
        let ex = framed();
        assert!(ex.contains_segment(&Point::new_scale(1.0, 1.0), &Point::new_scale(9.0, 1.0)));
        assert!(!ex.contains_segment(&Point::new_scale(1.0, 5.0), &Point::new_scale(9.0, 5.0)));
    }

    fn comb() -> ExPolygon {
        // Prongs over x 0..3, 5..8 and 10..13, notches down to y = 3.
        let points = [
            (0.0, 0.0),
            (13.0, 0.0),
            (13.0, 10.0),
            (10.0, 10.0),
            (10.0, 3.0),
            (8.0, 3.0),
            (8.0, 10.0),
            (5.0, 10.0),
            (5.0, 3.0),
            (3.0, 3.0),
            (3.0, 10.0),
            (0.0, 10.0),
        ];
        ExPolygon::new(
            Polygon::new(points.iter().map(|&(x, y)| Point::new_scale(x, y)).collect()),
            Vec::new(),
        )
    }

    #[test]
    fn segment_touching_only_vertices_across_notches_is_not_contained() {
        let ex = comb();
        // Midpoint (6.5, 10) lies on the middle prong's top edge.
        assert!(!ex.contains_segment(&Point::new_scale(0.0, 10.0), &Point::new_scale(13.0, 10.0)));
        assert!(!ex.contains_segment(&Point::new_scale(3.0, 10.0), &Point::new_scale(10.0, 10.0)));
    }

    #[test]
    fn segment_along_an_edge_is_contained() {
        let ex = comb();
        assert!(ex.contains_segment(&Point::new_scale(5.0, 10.0), &Point::new_scale(8.0, 10.0)));
        assert!(ex.contains_segment(&Point::new_scale(0.0, 1.0), &Point::new_scale(13.0, 1.0)));
        assert!(ex.contains_segment(&Point::new_scale(0.0, 3.0), &Point::new_scale(13.0, 3.0)));
    }
}
