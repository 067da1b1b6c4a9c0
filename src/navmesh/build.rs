use std::collections::BTreeMap;

use spade::{AngleLimit, RefinementParameters, Triangulation};
use tracing::{debug, trace, warn};

use crate::error::{NavMeshError, Result};
use crate::geometry::Point;
use crate::triangulation::{constraint_depths, from_spade, insert_constraint_ring, Cdt};

use super::{NavMesh, NavPolygon, UNCLASSIFIED};

impl NavMesh {
    /// Triangulates the queued polygons and classifies the triangles.
    ///
    /// Any previous mesh is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`NavMeshError::TooFewPoints`] when the outer polygon has
    /// fewer than three points and [`NavMeshError::Triangulation`] when a
    /// point cannot be triangulated or no triangle lies inside the outer
    /// polygon. An invalid configuration is reported as a config error.
    pub fn triangulate(&mut self) -> Result<()> {
        self.config.validate()?;
        let outer_points = self.input.first().map_or(0, |c| c.polygon.points.len());
        if outer_points < 3 {
            return Err(NavMeshError::TooFewPoints(outer_points).into());
        }

        // Step 1: constrained triangulation of every polygon's edges.
        let mut cdt = Cdt::new();
        for classed in &self.input {
            insert_constraint_ring(&mut cdt, &classed.polygon.points)
                .map_err(|e| NavMeshError::Triangulation(e.to_string()))?;
        }

        // Step 2: angle-bounded refinement with a vertex budget.
        let input_points: usize = self.input.iter().map(|c| c.polygon.points.len()).sum();
        let refined = cdt.refine(
            RefinementParameters::<f64>::new()
                .with_angle_limit(AngleLimit::from_deg(self.config.min_angle_deg))
                .with_max_additional_vertices(input_points * self.config.refine_budget_factor)
                .exclude_outer_faces(true),
        );
        if !refined.refinement_complete {
            warn!(input_points, "mesh refinement stopped at its vertex budget");
        }

        // Step 3: keep the triangles inside the outer polygon.
        self.vertices.clear();
        self.polygons.clear();
        self.incident.clear();
        self.triangulated = false;

        let depths = constraint_depths(&cdt);
        let mut index: BTreeMap<Point, usize> = BTreeMap::new();
        for face in cdt.inner_faces() {
            if depths.get(&face.fix().index()).copied().unwrap_or(0) == 0 {
                continue;
            }
            let handles = face.vertices();
            let points = handles.map(|v| from_spade(v.position()));
            let constrained = [0, 1, 2].map(|i| {
                cdt.get_edge_from_neighbors(handles[i].fix(), handles[(i + 1) % 3].fix())
                    .is_some_and(|edge| cdt.is_constraint_edge(edge.as_undirected().fix()))
            });
            self.push_triangle(&mut index, points, constrained);
        }
        if self.polygons.is_empty() {
            return Err(NavMeshError::Triangulation("no triangle lies inside the outer polygon".into()).into());
        }
        self.triangulated = true;
        debug!(
            vertices = self.vertices.len(),
            triangles = self.polygons.len(),
            "navigation mesh triangulated"
        );

        // Step 4: region classes.
        self.classify();
        Ok(())
    }

    fn vertex_id(&mut self, index: &mut BTreeMap<Point, usize>, p: Point) -> usize {
        if let Some(&id) = index.get(&p) {
            return id;
        }
        let id = self.vertices.len();
        self.vertices.push(p);
        self.incident.push(Vec::new());
        index.insert(p, id);
        id
    }

    /// Adds one triangle in counter-clockwise order and links it to the
    /// triangles already sharing its sides.
    fn push_triangle(&mut self, index: &mut BTreeMap<Point, usize>, mut points: [Point; 3], mut constrained: [bool; 3]) {
        let turn = points[0].ccw(&points[1], &points[2]);
        if turn == 0 {
            trace!(?points, "triangle collapsed on the integer grid");
            return;
        }
        if turn < 0 {
            points.swap(1, 2);
            constrained = [constrained[2], constrained[1], constrained[0]];
        }
        let vertices = points.map(|p| self.vertex_id(index, p));

        let id = self.polygons.len();
        let mut neighbors = [None; 3];
        for (side, slot) in neighbors.iter_mut().enumerate() {
            let (a, b) = (vertices[side], vertices[(side + 1) % 3]);
            // The neighbor runs the shared side the other way.
            for &other in &self.incident[b] {
                let theirs = &mut self.polygons[other];
                let Some(j) = (0..3).find(|&j| theirs.vertices[j] == b && theirs.vertices[(j + 1) % 3] == a) else {
                    continue;
                };
                theirs.neighbors[j] = Some(id);
                *slot = Some(other);
                break;
            }
        }

        self.polygons.push(NavPolygon {
            vertices,
            neighbors,
            constrained,
            class: UNCLASSIFIED,
        });
        for v in vertices {
            self.incident[v].push(id);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::LayerpathError;
    use crate::geometry::Polygon;
    use crate::navmesh::tests::{square_mesh, u_mesh};
    use crate::navmesh::NavMeshConfig;

    fn check_adjacency(mesh: &NavMesh) {
        let polys = mesh.polygons();
        for (idx, poly) in polys.iter().enumerate() {
            let [a, b, c] = poly.vertices.map(|v| mesh.vertices()[v]);
            assert!(a.ccw(&b, &c) > 0, "triangle {idx} is not counter-clockwise");
            for side in 0..3 {
                let (va, vb) = (poly.vertices[side], poly.vertices[(side + 1) % 3]);
                match poly.neighbors[side] {
                    Some(n) => {
                        let j = polys[n].side_towards(idx).unwrap();
                        assert_eq!(polys[n].vertices[j], vb);
                        assert_eq!(polys[n].vertices[(j + 1) % 3], va);
                    }
                    None => {
                        let shared = polys.iter().enumerate().any(|(o, other)| {
                            o != idx
                                && (0..3).any(|j| {
                                    let pair = (other.vertices[j], other.vertices[(j + 1) % 3]);
                                    pair == (vb, va) || pair == (va, vb)
                                })
                        });
                        assert!(!shared, "triangle {idx} side {side} has an unlinked twin");
                        assert!(poly.constrained[side], "open side {side} of {idx} is not a boundary");
                    }
                }
            }
        }
    }

    #[test]
    fn adjacency_is_symmetric() {
        check_adjacency(&square_mesh());
        check_adjacency(&u_mesh());
    }

    #[test]
    fn notch_of_a_concave_outline_is_not_meshed() {
        let mesh = u_mesh();
        let notch = Polygon::rectangle_mm(3.0, 3.0, 7.0, 10.0);
        for poly in mesh.polygons() {
            let [a, b, c] = poly.vertices.map(|v| mesh.vertices()[v]);
            let center = Point::new((a.x + b.x + c.x) / 3, (a.y + b.y + c.y) / 3);
            assert!(!notch.contains(&center));
        }
    }

    #[test]
    fn refinement_adds_vertices() {
        let mesh = square_mesh();
        assert!(mesh.vertices().len() >= 4);
        assert!(mesh.polygons().len() >= 2);
        for v in [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)] {
            assert!(mesh.vertices().contains(&Point::new_scale(v.0, v.1)));
        }
    }

    #[test]
    fn missing_outer_polygon_is_rejected() {
        let mut mesh = NavMesh::new(NavMeshConfig::default());
        assert!(matches!(
            mesh.triangulate(),
            Err(LayerpathError::NavMesh(NavMeshError::TooFewPoints(0)))
        ));
        mesh.add_polygon(
            Polygon::new(vec![Point::new(0, 0), Point::new(10, 0)]),
            1,
            UNCLASSIFIED,
        );
        assert!(matches!(
            mesh.triangulate(),
            Err(LayerpathError::NavMesh(NavMeshError::TooFewPoints(2)))
        ));
        assert!(!mesh.is_triangulated());
    }
}
