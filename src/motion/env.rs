use crate::clipper::{diff_ex, group_rings, intersection_pl, offset, offset_expolygons, simplify_polygons};
use crate::geometry::{to_polygons, BoundingBox, ExPolygon, Point, Polygon, Polyline};
use crate::math::{scale, scale_f, CoordF};

use super::graph::VisibilityGraph;
use super::MotionPlannerConfig;

/// Region a route may run through, with its visibility graph.
#[derive(Debug, Clone)]
pub(super) struct Environment {
    regions: Vec<ExPolygon>,
    graph: VisibilityGraph,
}

impl Environment {
    fn new(regions: Vec<ExPolygon>, tolerance: CoordF) -> Self {
        let regions = if tolerance > 0.0 {
            group_rings(&simplify_polygons(&to_polygons(&regions), tolerance))
        } else {
            regions
        };
        let graph = VisibilityGraph::build(&regions);
        Self { regions, graph }
    }

    /// The island shrunk by the inner margin.
    pub fn inside(island: &ExPolygon, config: &MotionPlannerConfig) -> Self {
        let regions = offset_expolygons(std::slice::from_ref(island), -scale_f(config.inner_margin_mm));
        Self::new(regions, scale_f(config.simplify_tolerance_mm))
    }

    /// Space around every island, kept an outer margin away from them and
    /// framed by their bounding box grown by twice that margin.
    pub fn around(islands: &[ExPolygon], config: &MotionPlannerConfig) -> Self {
        let contours: Vec<Polygon> = islands.iter().map(|i| i.contour.clone()).collect();
        let grown = offset(&contours, scale_f(config.outer_margin_mm));
        let regions = diff_ex(&[frame(islands, config)], &grown);
        Self::new(regions, scale_f(config.simplify_tolerance_mm))
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    pub fn contains(&self, p: &Point) -> bool {
        self.regions.iter().any(|r| r.contains(p))
    }

    pub fn sees(&self, a: &Point, b: &Point) -> bool {
        self.regions.iter().any(|r| r.contains_segment(a, b))
    }

    /// `p` itself when inside, else the graph node that best lies on the way
    /// to `dest`.
    ///
    /// A node is skipped when the move to it would leave `guard` more than
    /// once, unless no node passes that test.
    pub fn entry_point(&self, p: &Point, dest: &Point, guard: &[ExPolygon]) -> Option<Point> {
        if self.contains(p) {
            return Some(*p);
        }
        let guard = to_polygons(guard);
        let mut candidates = self.graph.nodes().to_vec();
        let mut fallback = None;
        while let Some(idx) = p.nearest_waypoint_index(&candidates, dest) {
            let candidate = candidates.swap_remove(idx);
            if guard.is_empty() {
                return Some(candidate);
            }
            let pieces = intersection_pl(&[Polyline::new(vec![*p, candidate])], &guard);
            if pieces.len() <= 1 {
                return Some(candidate);
            }
            fallback.get_or_insert(candidate);
        }
        fallback
    }

    /// Graph route between two points inside the environment, cut down to
    /// the corners that cannot see past each other.
    pub fn route(&self, from: Point, to: Point) -> Option<Vec<Point>> {
        let route = self.graph.shortest_path(from, to, |a, b| self.sees(a, b))?;
        Some(self.simplify_by_visibility(route))
    }

    fn simplify_by_visibility(&self, route: Vec<Point>) -> Vec<Point> {
        let Some(&first) = route.first() else {
            return route;
        };
        let mut out = vec![first];
        let mut current = 0;
        while current + 1 < route.len() {
            let next = (current + 2..route.len())
                .rev()
                .find(|&j| self.sees(&route[current], &route[j]))
                .unwrap_or(current + 1);
            out.push(route[next]);
            current = next;
        }
        out
    }
}

/// Bounding box of all islands grown by twice the outer margin.
fn frame(islands: &[ExPolygon], config: &MotionPlannerConfig) -> Polygon {
    let mut bb = BoundingBox::default();
    for island in islands {
        bb.merge(&island.bounding_box());
    }
    bb.offset(2 * scale(config.outer_margin_mm)).polygon()
}

/// The frame with every island cut out, for guarding moves that start
/// outside all islands.
pub(super) fn outer_island(islands: &[ExPolygon], config: &MotionPlannerConfig) -> Vec<ExPolygon> {
    let contours: Vec<Polygon> = islands.iter().map(|i| i.contour.clone()).collect();
    diff_ex(&[frame(islands, config)], &contours)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn inner_environment_keeps_off_the_walls() {
        let island = ExPolygon::new(Polygon::rectangle_mm(0.0, 0.0, 10.0, 10.0), Vec::new());
        let env = Environment::inside(&island, &MotionPlannerConfig::default());
        assert!(env.contains(&Point::new_scale(5.0, 5.0)));
        assert!(!env.contains(&Point::new_scale(0.5, 5.0)));
        assert_eq!(env.graph.nodes().len(), 4);
    }

    #[test]
    fn outer_environment_has_a_hole_per_island() {
        let islands = vec![
            ExPolygon::new(Polygon::rectangle_mm(0.0, 0.0, 10.0, 10.0), Vec::new()),
            ExPolygon::new(Polygon::rectangle_mm(20.0, 0.0, 30.0, 10.0), Vec::new()),
        ];
        let env = Environment::around(&islands, &MotionPlannerConfig::default());
        assert_eq!(env.regions.len(), 1);
        assert_eq!(env.regions[0].holes.len(), 2);
        assert!(env.contains(&Point::new_scale(15.0, 5.0)));
        assert!(!env.contains(&Point::new_scale(11.0, 5.0)));
        assert!(!env.contains(&Point::new_scale(5.0, 5.0)));
    }

    #[test]
    fn entry_point_prefers_nodes_on_the_way() {
        let island = ExPolygon::new(Polygon::rectangle_mm(0.0, 0.0, 10.0, 10.0), Vec::new());
        let env = Environment::inside(&island, &MotionPlannerConfig::default());
        let p = Point::new_scale(0.5, 0.5);
        assert_eq!(
            env.entry_point(&p, &Point::new_scale(9.0, 5.0), std::slice::from_ref(&island)),
            Some(Point::new_scale(1.0, 1.0))
        );
        let inside = Point::new_scale(5.0, 5.0);
        assert_eq!(env.entry_point(&inside, &p, &[]), Some(inside));
    }

    #[test]
    fn route_skips_corners_in_plain_sight() {
        let island = ExPolygon::new(Polygon::rectangle_mm(0.0, 0.0, 10.0, 10.0), Vec::new());
        let env = Environment::inside(&island, &MotionPlannerConfig::default());
        let from = Point::new_scale(2.0, 2.0);
        let to = Point::new_scale(8.0, 8.0);
        assert_eq!(env.route(from, to).unwrap(), vec![from, to]);
    }
}
