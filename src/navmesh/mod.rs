//! Triangulated navigation mesh over a layer's travel space.
//!
//! Input polygons are triangulated into a mesh of counter-clockwise
//! triangles. Each triangle carries a region class that acts as a cost
//! multiplier during search. Paths are found with A* over triangles and then
//! pulled tight through the shared edges with a funnel pass.

mod build;
mod fill;
mod funnel;
mod search;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, NavMeshError, Result};
use crate::geometry::{Line, Point, Polygon, Polyline};

/// Region class of a triangle no polygon has claimed.
pub const UNCLASSIFIED: i32 = -1;

/// Triangulation and search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavMeshConfig {
    /// Smallest interior angle the refinement pass tries to reach, in degrees.
    pub min_angle_deg: f64,
    /// Extra vertices the refinement may add, per input point.
    pub refine_budget_factor: usize,
    /// Whether unclassified triangles can be crossed (at unit cost).
    pub unclassified_traversable: bool,
}

impl Default for NavMeshConfig {
    fn default() -> Self {
        Self {
            min_angle_deg: 30.0,
            refine_budget_factor: 20,
            unclassified_traversable: true,
        }
    }
}

impl NavMeshConfig {
    #[must_use]
    pub fn with_min_angle_deg(mut self, degrees: f64) -> Self {
        self.min_angle_deg = degrees;
        self
    }

    #[must_use]
    pub fn with_refine_budget_factor(mut self, factor: usize) -> Self {
        self.refine_budget_factor = factor;
        self
    }

    #[must_use]
    pub fn with_unclassified_traversable(mut self, traversable: bool) -> Self {
        self.unclassified_traversable = traversable;
        self
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the angle is outside `0..=34`.
    /// Refinement above roughly 34 degrees may not terminate.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=34.0).contains(&self.min_angle_deg) {
            return Err(ConfigError::Invalid {
                parameter: "min_angle_deg",
                reason: format!("{} is outside 0..=34", self.min_angle_deg),
            }
            .into());
        }
        Ok(())
    }
}

/// One triangle of the mesh.
///
/// Side `i` runs from `vertices[i]` to `vertices[(i + 1) % 3]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavPolygon {
    pub vertices: [usize; 3],
    /// Triangle across each side, if any.
    pub neighbors: [Option<usize>; 3],
    /// Whether each side lies on an input polygon.
    pub constrained: [bool; 3],
    pub class: i32,
}

impl NavPolygon {
    /// Side index whose neighbor is `other`.
    #[must_use]
    pub fn side_towards(&self, other: usize) -> Option<usize> {
        self.neighbors.iter().position(|&n| n == Some(other))
    }
}

/// An input polygon with the classes of the regions on either side.
#[derive(Debug, Clone)]
struct ClassedPolygon {
    polygon: Polygon,
    left: i32,
    right: i32,
}

/// Navigation mesh built from classed polygons.
///
/// The first polygon added bounds the mesh. Later polygons only add
/// constraint edges and region classes inside it.
#[derive(Debug, Clone, Default)]
pub struct NavMesh {
    config: NavMeshConfig,
    input: Vec<ClassedPolygon>,
    vertices: Vec<Point>,
    polygons: Vec<NavPolygon>,
    /// Triangles touching each vertex.
    incident: Vec<Vec<usize>>,
    triangulated: bool,
}

impl NavMesh {
    #[must_use]
    pub fn new(config: NavMeshConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn config(&self) -> &NavMeshConfig {
        &self.config
    }

    /// Queues a polygon for the next [`triangulate`](Self::triangulate).
    ///
    /// `left_class` is given to the region left of the polygon's first edge,
    /// `right_class` to the region on its right. Pass [`UNCLASSIFIED`] to
    /// leave a side alone.
    pub fn add_polygon(&mut self, polygon: Polygon, left_class: i32, right_class: i32) {
        self.input.push(ClassedPolygon {
            polygon,
            left: left_class,
            right: right_class,
        });
    }

    /// Mesh vertices, deduplicated.
    #[must_use]
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Mesh triangles.
    #[must_use]
    pub fn polygons(&self) -> &[NavPolygon] {
        &self.polygons
    }

    #[must_use]
    pub fn is_triangulated(&self) -> bool {
        self.triangulated
    }

    /// Every triangle side once, for drawing the mesh.
    #[must_use]
    pub fn edge_lines(&self) -> Vec<Line> {
        let mut lines = Vec::new();
        for (idx, poly) in self.polygons.iter().enumerate() {
            for side in 0..3 {
                // Shared sides are drawn by the lower-numbered triangle.
                if poly.neighbors[side].is_some_and(|n| n < idx) {
                    continue;
                }
                lines.push(self.side_line(idx, side));
            }
        }
        lines
    }

    /// Mesh vertex closest to `point`.
    #[must_use]
    pub fn vertex_nearest(&self, point: &Point) -> Option<Point> {
        point.nearest_point_index(&self.vertices).map(|i| self.vertices[i])
    }

    /// Triangle containing `point`, boundary included.
    ///
    /// Walks from triangle 0 towards the point. When the walk leaves the
    /// mesh through a boundary side or runs too long, every triangle is
    /// tested in turn.
    #[must_use]
    pub fn find_poly(&self, point: &Point) -> Option<usize> {
        if self.polygons.is_empty() {
            return None;
        }
        let mut current = 0;
        for _ in 0..self.polygons.len() {
            match self.outside_side(current, point) {
                None => return Some(current),
                Some(side) => match self.polygons[current].neighbors[side] {
                    Some(next) => current = next,
                    None => break,
                },
            }
        }
        (0..self.polygons.len()).find(|&i| self.outside_side(i, point).is_none())
    }

    /// Shortest travel path between two points, or `None` when either
    /// point is off the mesh or no route exists.
    ///
    /// # Errors
    ///
    /// Returns [`NavMeshError::NotTriangulated`] before
    /// [`triangulate`](Self::triangulate) has run.
    pub fn path(&self, from: &Point, to: &Point) -> Result<Option<Polyline>> {
        let Some(polys) = self.path_dijkstra(from, to)? else {
            debug!(?from, ?to, "no path through the navigation mesh");
            return Ok(None);
        };
        let path = self.path_straight(from, to, &polys)?;
        debug!(triangles = polys.len(), points = path.points.len(), "navigation path found");
        Ok(Some(path))
    }

    fn ensure_triangulated(&self) -> Result<()> {
        if self.triangulated {
            Ok(())
        } else {
            Err(NavMeshError::NotTriangulated.into())
        }
    }

    fn side_line(&self, poly: usize, side: usize) -> Line {
        let v = &self.polygons[poly].vertices;
        Line::new(self.vertices[v[side]], self.vertices[v[(side + 1) % 3]])
    }

    /// First side of `poly` that has `point` strictly on its outer side.
    fn outside_side(&self, poly: usize, point: &Point) -> Option<usize> {
        (0..3).find(|&side| {
            let line = self.side_line(poly, side);
            line.a.ccw(&line.b, point) < 0
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::scale_f;

    pub(super) fn square_mesh() -> NavMesh {
        let mut mesh = NavMesh::new(NavMeshConfig::default());
        mesh.add_polygon(Polygon::rectangle_mm(0.0, 0.0, 10.0, 10.0), 1, UNCLASSIFIED);
        mesh.triangulate().unwrap();
        mesh
    }

    /// A U whose notch spans x 3..7 above y = 3.
    pub(super) fn u_mesh() -> NavMesh {
        let points = [
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (7.0, 10.0),
            (7.0, 3.0),
            (3.0, 3.0),
            (3.0, 10.0),
            (0.0, 10.0),
        ];
        let outline = Polygon::new(points.iter().map(|&(x, y)| Point::new_scale(x, y)).collect());
        let mut mesh = NavMesh::new(NavMeshConfig::default());
        mesh.add_polygon(outline, 1, UNCLASSIFIED);
        mesh.triangulate().unwrap();
        mesh
    }

    #[test]
    fn find_poly_inside_and_outside() {
        let mesh = square_mesh();
        let inside = Point::new_scale(5.0, 5.0);
        let idx = mesh.find_poly(&inside).unwrap();
        assert!(mesh.outside_side(idx, &inside).is_none());
        assert!(mesh.find_poly(&Point::new_scale(20.0, 20.0)).is_none());
    }

    #[test]
    fn find_poly_across_a_concave_boundary() {
        let mesh = u_mesh();
        assert!(mesh.find_poly(&Point::new_scale(8.5, 9.0)).is_some());
        assert!(mesh.find_poly(&Point::new_scale(1.5, 9.0)).is_some());
        assert!(mesh.find_poly(&Point::new_scale(5.0, 6.0)).is_none());
    }

    #[test]
    fn convex_region_gives_a_straight_path() {
        let mesh = square_mesh();
        let from = Point::new_scale(1.0, 1.0);
        let to = Point::new_scale(9.0, 9.0);
        let path = mesh.path(&from, &to).unwrap().unwrap();
        assert_eq!(path.points, vec![from, to]);
    }

    #[test]
    fn path_wraps_around_the_notch() {
        let mesh = u_mesh();
        let from = Point::new_scale(1.5, 9.0);
        let to = Point::new_scale(8.5, 9.0);
        let path = mesh.path(&from, &to).unwrap().unwrap();
        assert_eq!(path.first_point(), from);
        assert_eq!(path.last_point(), to);
        assert!(path.points.contains(&Point::new_scale(3.0, 3.0)));
        assert!(path.points.contains(&Point::new_scale(7.0, 3.0)));
        assert!((path.length() - scale_f(16.37)).abs() < scale_f(0.05));
    }

    #[test]
    fn points_off_the_mesh_have_no_path() {
        let mesh = square_mesh();
        let path = mesh.path(&Point::new_scale(1.0, 1.0), &Point::new_scale(30.0, 1.0)).unwrap();
        assert!(path.is_none());
    }

    #[test]
    fn queries_before_triangulation_fail() {
        let mut mesh = NavMesh::new(NavMeshConfig::default());
        mesh.add_polygon(Polygon::rectangle_mm(0.0, 0.0, 10.0, 10.0), 1, UNCLASSIFIED);
        let err = mesh.path(&Point::new_scale(1.0, 1.0), &Point::new_scale(2.0, 2.0));
        assert!(matches!(
            err,
            Err(crate::error::LayerpathError::NavMesh(NavMeshError::NotTriangulated))
        ));
    }

    #[test]
    fn edge_lines_cover_each_side_once() {
        let mesh = square_mesh();
        let shared = mesh
            .polygons()
            .iter()
            .flat_map(|p| p.neighbors.iter())
            .filter(|n| n.is_some())
            .count();
        assert_eq!(mesh.edge_lines().len(), mesh.polygons().len() * 3 - shared / 2);
    }

    #[test]
    fn vertex_nearest_snaps_to_a_corner() {
        let mesh = square_mesh();
        assert_eq!(
            mesh.vertex_nearest(&Point::new_scale(-0.1, 10.2)),
            Some(Point::new_scale(0.0, 10.0))
        );
    }

    #[test]
    fn config_round_trips_through_json() {
        let cfg = NavMeshConfig::default().with_unclassified_traversable(false);
        let json = serde_json::to_string(&cfg).unwrap();
        let back: NavMeshConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
        assert!(NavMeshConfig::default().with_min_angle_deg(45.0).validate().is_err());
    }
}
