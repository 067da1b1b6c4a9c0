//! Polygon boolean operations, offsetting and polyline clipping.
//!
//! Thin layer over `geo-clipper`. Coordinates are passed through in scaled
//! units with a clipper factor of 1, so the integer grid of the caller is the
//! integer grid of Clipper.
//!
//! Flat `Vec<Polygon>` results follow the orientation convention (contours
//! counter-clockwise, holes clockwise); `_ex` variants group holes under their
//! contour.

use geo::{Coord as GeoCoord, LineString, MultiLineString, MultiPolygon, Polygon as GeoPolygon};
use geo_clipper::{Clipper, ClipperOpen, EndType, JoinType};

use crate::geometry::{to_polygons, ExPolygon, Point, Polygon, Polyline};
use crate::math::{scale, CoordF};

/// Miter limit used for all mitered offsets.
const MITER_LIMIT: f64 = 3.0;

/// Corner style for offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetJoin {
    #[default]
    Miter,
    Round,
    Square,
}

impl From<OffsetJoin> for JoinType {
    #[allow(clippy::cast_precision_loss)]
    fn from(join: OffsetJoin) -> Self {
        match join {
            OffsetJoin::Miter => JoinType::Miter(MITER_LIMIT),
            // Arc tolerance in scaled units.
            OffsetJoin::Round => JoinType::Round(scale(0.005) as f64),
            OffsetJoin::Square => JoinType::Square,
        }
    }
}

// ── conversions ──

#[allow(clippy::cast_precision_loss)]
fn ring_to_geo(points: &[Point]) -> LineString<f64> {
    let mut coords: Vec<GeoCoord<f64>> = points
        .iter()
        .map(|p| GeoCoord {
            x: p.x as f64,
            y: p.y as f64,
        })
        .collect();
    if let Some(&first) = coords.first() {
        coords.push(first);
    }
    LineString::new(coords)
}

#[allow(clippy::cast_precision_loss)]
fn polyline_to_geo(polyline: &Polyline) -> LineString<f64> {
    LineString::new(
        polyline
            .points
            .iter()
            .map(|p| GeoCoord {
                x: p.x as f64,
                y: p.y as f64,
            })
            .collect(),
    )
}

#[allow(clippy::cast_possible_truncation)]
fn geo_to_points(ls: &LineString<f64>) -> Vec<Point> {
    ls.coords()
        .map(|c| Point::new(c.x.round() as i64, c.y.round() as i64))
        .collect()
}

fn geo_to_ring(ls: &LineString<f64>) -> Polygon {
    let mut points = geo_to_points(ls);
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    Polygon::new(points)
}

fn expolygon_to_geo(ex: &ExPolygon) -> GeoPolygon<f64> {
    GeoPolygon::new(
        ring_to_geo(&ex.contour.points),
        ex.holes.iter().map(|h| ring_to_geo(&h.points)).collect(),
    )
}

fn expolygons_to_geo(expolygons: &[ExPolygon]) -> MultiPolygon<f64> {
    MultiPolygon::new(expolygons.iter().map(expolygon_to_geo).collect())
}

fn geo_to_expolygons(multi: &MultiPolygon<f64>) -> Vec<ExPolygon> {
    multi
        .0
        .iter()
        .filter_map(|poly| {
            let contour = geo_to_ring(poly.exterior());
            if !contour.is_valid() {
                return None;
            }
            let holes = poly
                .interiors()
                .iter()
                .map(geo_to_ring)
                .filter(Polygon::is_valid)
                .collect();
            Some(ExPolygon::new(contour, holes))
        })
        .collect()
}

fn geo_to_polylines(multi: &MultiLineString<f64>) -> Vec<Polyline> {
    multi
        .0
        .iter()
        .map(|ls| Polyline::new(geo_to_points(ls)))
        .filter(Polyline::is_valid)
        .collect()
}

/// Groups a flat ring list into regions.
///
/// Counter-clockwise rings become contours; each clockwise ring is attached to
/// the smallest contour containing its first point. Holes without a contour
/// are dropped.
#[must_use]
pub fn group_rings(polygons: &[Polygon]) -> Vec<ExPolygon> {
    let mut contours: Vec<ExPolygon> = polygons
        .iter()
        .filter(|p| p.is_valid() && p.is_counter_clockwise())
        .map(|p| ExPolygon::new(p.clone(), Vec::new()))
        .collect();
    contours.sort_by(|a, b| a.contour.area().total_cmp(&b.contour.area()));
    for hole in polygons.iter().filter(|p| p.is_valid() && !p.is_counter_clockwise()) {
        let probe = hole.first_point();
        if let Some(parent) = contours.iter_mut().find(|c| c.contour.contains(&probe)) {
            let mut hole = hole.clone();
            hole.make_clockwise();
            parent.holes.push(hole);
        }
    }
    contours
}

// ── offsetting ──

/// Offsets regions by `delta` (positive grows) with the given corner style.
#[must_use]
pub fn offset_expolygons_join(expolygons: &[ExPolygon], delta: CoordF, join: OffsetJoin) -> Vec<ExPolygon> {
    if expolygons.is_empty() {
        return Vec::new();
    }
    let result = expolygons_to_geo(expolygons).offset(delta, join.into(), EndType::ClosedPolygon, 1.0);
    geo_to_expolygons(&result)
}

/// Offsets regions by `delta` with mitered corners.
#[must_use]
pub fn offset_expolygons(expolygons: &[ExPolygon], delta: CoordF) -> Vec<ExPolygon> {
    offset_expolygons_join(expolygons, delta, OffsetJoin::Miter)
}

/// Offsets a ring list by `delta`, keeping hole structure.
#[must_use]
pub fn offset_ex(polygons: &[Polygon], delta: CoordF) -> Vec<ExPolygon> {
    offset_expolygons(&group_rings(polygons), delta)
}

/// Offsets a ring list by `delta`.
#[must_use]
pub fn offset(polygons: &[Polygon], delta: CoordF) -> Vec<Polygon> {
    to_polygons(&offset_ex(polygons, delta))
}

/// Offsets by `delta1` then by `delta2`.
///
/// Contract-then-expand removes features narrower than `2 * |delta1|`.
#[must_use]
pub fn offset2_ex(polygons: &[Polygon], delta1: CoordF, delta2: CoordF) -> Vec<ExPolygon> {
    offset_expolygons(&offset_ex(polygons, delta1), delta2)
}

#[must_use]
pub fn offset2(polygons: &[Polygon], delta1: CoordF, delta2: CoordF) -> Vec<Polygon> {
    to_polygons(&offset2_ex(polygons, delta1, delta2))
}

/// Grows open polylines into their footprint (square caps).
#[must_use]
pub fn offset_polylines(polylines: &[Polyline], delta: CoordF) -> Vec<Polygon> {
    let lines: Vec<LineString<f64>> = polylines
        .iter()
        .filter(|p| !p.points.is_empty())
        .map(polyline_to_geo)
        .collect();
    if lines.is_empty() || delta <= 0.0 {
        return Vec::new();
    }
    let result = MultiLineString::new(lines).offset(
        delta,
        JoinType::Miter(MITER_LIMIT),
        EndType::OpenSquare,
        1.0,
    );
    to_polygons(&geo_to_expolygons(&result))
}

// ── boolean operations ──

/// Merges overlapping regions.
#[must_use]
pub fn union_ex(polygons: &[Polygon]) -> Vec<ExPolygon> {
    let subject = expolygons_to_geo(&group_rings(polygons));
    if subject.0.is_empty() {
        return Vec::new();
    }
    geo_to_expolygons(&subject.union(&MultiPolygon::new(Vec::new()), 1.0))
}

#[must_use]
pub fn union(polygons: &[Polygon]) -> Vec<Polygon> {
    to_polygons(&union_ex(polygons))
}

/// `subject − clip`, keeping hole structure.
#[must_use]
pub fn diff_ex(subject: &[Polygon], clip: &[Polygon]) -> Vec<ExPolygon> {
    let subject = expolygons_to_geo(&group_rings(subject));
    if subject.0.is_empty() {
        return Vec::new();
    }
    let clip = expolygons_to_geo(&group_rings(clip));
    geo_to_expolygons(&subject.difference(&clip, 1.0))
}

#[must_use]
pub fn diff(subject: &[Polygon], clip: &[Polygon]) -> Vec<Polygon> {
    to_polygons(&diff_ex(subject, clip))
}

/// `subject ∩ clip`, keeping hole structure.
#[must_use]
pub fn intersection_ex(subject: &[Polygon], clip: &[Polygon]) -> Vec<ExPolygon> {
    let subject = expolygons_to_geo(&group_rings(subject));
    let clip = expolygons_to_geo(&group_rings(clip));
    if subject.0.is_empty() || clip.0.is_empty() {
        return Vec::new();
    }
    geo_to_expolygons(&subject.intersection(&clip, 1.0))
}

#[must_use]
pub fn intersection(subject: &[Polygon], clip: &[Polygon]) -> Vec<Polygon> {
    to_polygons(&intersection_ex(subject, clip))
}

/// Parts of the open polylines that lie inside `clip`.
#[must_use]
pub fn intersection_pl(polylines: &[Polyline], clip: &[Polygon]) -> Vec<Polyline> {
    let clip = expolygons_to_geo(&group_rings(clip));
    if polylines.is_empty() || clip.0.is_empty() {
        return Vec::new();
    }
    let subject = MultiLineString::new(polylines.iter().map(polyline_to_geo).collect());
    geo_to_polylines(&ClipperOpen::intersection(&subject, &clip, 1.0))
}

/// Parts of the open polylines that lie outside `clip`.
#[must_use]
pub fn diff_pl(polylines: &[Polyline], clip: &[Polygon]) -> Vec<Polyline> {
    let clip = expolygons_to_geo(&group_rings(clip));
    if clip.0.is_empty() {
        return polylines.iter().filter(|p| p.is_valid()).cloned().collect();
    }
    let subject = MultiLineString::new(polylines.iter().map(polyline_to_geo).collect());
    geo_to_polylines(&ClipperOpen::difference(&subject, &clip, 1.0))
}

// ── simplification ──

/// Douglas-Peucker simplification of each ring followed by a union to drop
/// any self-intersection the reduction introduced.
#[must_use]
pub fn simplify_polygons(polygons: &[Polygon], tolerance: CoordF) -> Vec<Polygon> {
    use geo::Simplify;

    let simplified: Vec<Polygon> = polygons
        .iter()
        .map(|p| {
            let ccw = p.is_counter_clockwise();
            let mut ring = geo_to_ring(&ring_to_geo(&p.points).simplify(&tolerance));
            if ccw {
                ring.make_counter_clockwise();
            } else {
                ring.make_clockwise();
            }
            ring
        })
        .filter(Polygon::is_valid)
        .collect();
    union(&simplified)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::scale_f;

    fn square_mm(x0: f64, y0: f64, size: f64) -> Polygon {
        Polygon::rectangle_mm(x0, y0, x0 + size, y0 + size)
    }

    fn total_area(polys: &[Polygon]) -> f64 {
        polys.iter().map(Polygon::area).sum()
    }

    #[test]
    fn inward_offset_shrinks_square() {
        let out = offset(&[square_mm(0.0, 0.0, 10.0)], -scale_f(1.0));
        assert_eq!(out.len(), 1);
        assert!(out[0].is_counter_clockwise());
        let expected = scale_f(8.0) * scale_f(8.0);
        assert!((total_area(&out) - expected).abs() / expected < 1e-6);
    }

    #[test]
    fn offset_past_half_width_is_empty() {
        assert!(offset(&[square_mm(0.0, 0.0, 2.0)], -scale_f(1.5)).is_empty());
    }

    #[test]
    fn offset2_removes_narrow_neck() {
        // Two 4mm squares joined by a 0.4mm bridge.
        let a = square_mm(0.0, 0.0, 4.0);
        let b = square_mm(6.0, 0.0, 4.0);
        let neck = Polygon::rectangle_mm(4.0, 1.8, 6.0, 2.2);
        let joined = union(&[a, b, neck]);
        assert_eq!(joined.len(), 1);
        let opened = offset2(&joined, -scale_f(0.5), scale_f(0.5));
        assert_eq!(opened.len(), 2);
    }

    #[test]
    fn diff_keeps_hole_structure() {
        let out = diff_ex(&[square_mm(0.0, 0.0, 10.0)], &[square_mm(4.0, 4.0, 2.0)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].holes.len(), 1);
        assert!(!out[0].holes[0].is_counter_clockwise());
    }

    #[test]
    fn group_rings_attaches_holes() {
        let mut hole = square_mm(4.0, 4.0, 2.0);
        hole.make_clockwise();
        let grouped = group_rings(&[hole, square_mm(0.0, 0.0, 10.0)]);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].holes.len(), 1);
    }

    #[test]
    fn polyline_clipping_splits_inside_and_outside() {
        let line = Polyline::new(vec![Point::new_scale(-5.0, 5.0), Point::new_scale(15.0, 5.0)]);
        let clip = [square_mm(0.0, 0.0, 10.0)];
        let inside = intersection_pl(std::slice::from_ref(&line), &clip);
        let outside = diff_pl(std::slice::from_ref(&line), &clip);
        assert_eq!(inside.len(), 1);
        assert_eq!(outside.len(), 2);
        assert!((inside[0].length() - scale_f(10.0)).abs() < 2.0);
    }

    #[test]
    fn polyline_footprint_has_expected_area() {
        let line = Polyline::new(vec![Point::new_scale(0.0, 0.0), Point::new_scale(10.0, 0.0)]);
        let grown = offset_polylines(&[line], scale_f(0.5));
        // Square caps extend the 10mm segment by 0.5mm at each end.
        let expected = scale_f(11.0) * scale_f(1.0);
        assert!((total_area(&grown) - expected).abs() / expected < 1e-3);
    }

    #[test]
    fn simplify_drops_collinear_vertices() {
        let mut ring = square_mm(0.0, 0.0, 10.0);
        ring.points.insert(1, Point::new_scale(5.0, 0.0));
        let out = simplify_polygons(&[ring], scale_f(0.01));
        assert_eq!(out.len(), 1);
        assert!(out[0].points.len() <= 4);
    }
}
