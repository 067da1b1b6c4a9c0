use tracing::{trace, warn};

use crate::geometry::{Line, Point};
use crate::math::SCALED_EPSILON;

use super::{NavMesh, UNCLASSIFIED};

impl NavMesh {
    /// Resets every class and floods each classed polygon side in input order.
    ///
    /// A later polygon overrides the classes set by an earlier one.
    pub(super) fn classify(&mut self) {
        for poly in &mut self.polygons {
            poly.class = UNCLASSIFIED;
        }
        let mut seeds: Vec<(Point, Point, i32)> = Vec::new();
        for classed in &self.input {
            let [a, b, ..] = classed.polygon.points.as_slice() else {
                continue;
            };
            if classed.left != UNCLASSIFIED {
                seeds.push((*a, *b, classed.left));
            }
            if classed.right != UNCLASSIFIED {
                seeds.push((*b, *a, classed.right));
            }
        }
        for (a, b, class) in seeds {
            match self.poly_find_left(&a, &b) {
                Some(start) => self.flood_fill(start, class),
                None => warn!(?a, ?b, class, "no triangle beside a classed polygon edge"),
            }
        }
    }

    /// Triangle with a side leaving `a` along the direction of `b`, which
    /// is the triangle on the left of `a → b`.
    ///
    /// Refinement may have split the edge, so the side only needs to be
    /// collinear with `a → b`, not to end at `b`.
    #[must_use]
    pub fn poly_find_left(&self, a: &Point, b: &Point) -> Option<usize> {
        let va = self.vertices.iter().position(|v| v == a)?;
        let edge = Line::new(*a, *b);
        let len = edge.length();
        if len <= 0.0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let tolerance = SCALED_EPSILON as f64;
        self.incident[va].iter().copied().find(|&t| {
            let poly = &self.polygons[t];
            (0..3).any(|side| {
                if poly.vertices[side] != va {
                    return false;
                }
                let q = self.vertices[poly.vertices[(side + 1) % 3]];
                #[allow(clippy::cast_precision_loss)]
                let offset = a.ccw(b, &q).abs() as f64 / len;
                offset <= tolerance && edge.dot(&Line::new(*a, q)) > 0.0
            })
        })
    }

    /// Spreads `class` from `start` without crossing constrained sides.
    fn flood_fill(&mut self, start: usize, class: i32) {
        let mut stack = vec![start];
        let mut filled = 0_usize;
        while let Some(idx) = stack.pop() {
            if self.polygons[idx].class == class {
                continue;
            }
            self.polygons[idx].class = class;
            filled += 1;
            let poly = &self.polygons[idx];
            for side in 0..3 {
                if poly.constrained[side] {
                    continue;
                }
                if let Some(n) = poly.neighbors[side] {
                    if self.polygons[n].class != class {
                        stack.push(n);
                    }
                }
            }
        }
        trace!(class, filled, "region flood-filled");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::Polygon;
    use crate::navmesh::NavMeshConfig;

    fn banded_mesh(inner_right: i32) -> NavMesh {
        let mut mesh = NavMesh::new(NavMeshConfig::default());
        mesh.add_polygon(Polygon::rectangle_mm(0.0, 0.0, 20.0, 20.0), 1, UNCLASSIFIED);
        mesh.add_polygon(Polygon::rectangle_mm(5.0, 5.0, 15.0, 15.0), 5, inner_right);
        mesh.triangulate().unwrap();
        mesh
    }

    fn centroid(mesh: &NavMesh, idx: usize) -> Point {
        let [a, b, c] = mesh.polygons()[idx].vertices.map(|v| mesh.vertices()[v]);
        Point::new((a.x + b.x + c.x) / 3, (a.y + b.y + c.y) / 3)
    }

    #[test]
    fn classes_stop_at_constraints() {
        let mesh = banded_mesh(UNCLASSIFIED);
        let inner = Polygon::rectangle_mm(5.0, 5.0, 15.0, 15.0);
        for idx in 0..mesh.polygons().len() {
            let expected = if inner.contains(&centroid(&mesh, idx)) { 5 } else { 1 };
            assert_eq!(mesh.polygons()[idx].class, expected);
        }
    }

    #[test]
    fn right_class_overrides_the_band() {
        let mesh = banded_mesh(2);
        let band = mesh.find_poly(&Point::new_scale(2.0, 10.0)).unwrap();
        let core = mesh.find_poly(&Point::new_scale(10.0, 10.0)).unwrap();
        assert_eq!(mesh.polygons()[band].class, 2);
        assert_eq!(mesh.polygons()[core].class, 5);
    }

    #[test]
    fn left_of_an_edge_is_inside_a_ccw_ring() {
        let mesh = banded_mesh(UNCLASSIFIED);
        let a = Point::new_scale(5.0, 5.0);
        let b = Point::new_scale(15.0, 5.0);
        let inside = mesh.poly_find_left(&a, &b).unwrap();
        let outside = mesh.poly_find_left(&b, &a).unwrap();
        assert_eq!(mesh.polygons()[inside].class, 5);
        assert_eq!(mesh.polygons()[outside].class, 1);
        assert!(mesh.poly_find_left(&Point::new_scale(7.0, 7.0), &b).is_none());
    }
}
