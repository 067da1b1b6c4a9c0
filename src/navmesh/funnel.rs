use tracing::trace;

use crate::error::{NavMeshError, Result};
use crate::geometry::{Point, Polyline};

use super::NavMesh;

impl NavMesh {
    /// Shared side of two neighboring triangles as `(left, right)`, seen
    /// when moving from `from` into `to`.
    ///
    /// # Errors
    ///
    /// Returns [`NavMeshError::NotNeighbors`] when the triangles share no
    /// side.
    pub fn poly_get_portal(&self, from: usize, to: usize) -> Result<(Point, Point)> {
        let side = self
            .polygons
            .get(from)
            .and_then(|p| p.side_towards(to))
            .ok_or(NavMeshError::NotNeighbors { from, to })?;
        let line = self.side_line(from, side);
        // `from` is counter-clockwise, so its side runs right to left for
        // someone leaving through it.
        Ok((line.b, line.a))
    }

    /// Pulls a triangle path tight into a polyline from `from` to `to`.
    ///
    /// Funnel algorithm over the shared sides of `polys`. Each time a side
    /// of the funnel is committed as a corner, the scan restarts just after
    /// the portal that corner came from.
    ///
    /// # Errors
    ///
    /// Returns [`NavMeshError::NotNeighbors`] when two consecutive triangles
    /// are not adjacent.
    pub fn path_straight(&self, from: &Point, to: &Point, polys: &[usize]) -> Result<Polyline> {
        let mut portals = Vec::with_capacity(polys.len() + 1);
        portals.push((*from, *from));
        for pair in polys.windows(2) {
            portals.push(self.poly_get_portal(pair[0], pair[1])?);
        }
        portals.push((*to, *to));

        let mut points = vec![*from];
        let (mut apex, mut left, mut right) = (*from, *from, *from);
        let (mut apex_idx, mut left_idx, mut right_idx) = (0, 0, 0);
        let mut i = 1;
        while i < portals.len() {
            let (new_left, new_right) = portals[i];

            // Narrow the right side.
            if apex.ccw(&right, &new_right) >= 0 {
                if apex == right || apex.ccw(&left, &new_right) < 0 {
                    right = new_right;
                    right_idx = i;
                } else {
                    trace!(?left, "funnel corner on the left");
                    push_distinct(&mut points, left);
                    apex = left;
                    apex_idx = left_idx;
                    (left, right) = (apex, apex);
                    (left_idx, right_idx) = (apex_idx, apex_idx);
                    i = apex_idx + 1;
                    continue;
                }
            }

            // Narrow the left side.
            if apex.ccw(&left, &new_left) <= 0 {
                if apex == left || apex.ccw(&right, &new_left) > 0 {
                    left = new_left;
                    left_idx = i;
                } else {
                    trace!(?right, "funnel corner on the right");
                    push_distinct(&mut points, right);
                    apex = right;
                    apex_idx = right_idx;
                    (left, right) = (apex, apex);
                    (left_idx, right_idx) = (apex_idx, apex_idx);
                    i = apex_idx + 1;
                    continue;
                }
            }
            i += 1;
        }
        push_distinct(&mut points, *to);
        Ok(Polyline::new(points))
    }
}

fn push_distinct(points: &mut Vec<Point>, p: Point) {
    if points.last() != Some(&p) {
        points.push(p);
    }
}
