//! Shared constrained Delaunay helpers over `spade`.

use std::collections::{HashMap, VecDeque};

use spade::handles::{FixedFaceHandle, FixedVertexHandle, InnerTag};
use spade::{ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation};
use tracing::warn;

use crate::error::{GeometryError, Result};
use crate::geometry::Point;

pub(crate) type Cdt = ConstrainedDelaunayTriangulation<SpadePoint2<f64>>;

#[allow(clippy::cast_precision_loss)]
pub(crate) fn to_spade(p: &Point) -> SpadePoint2<f64> {
    SpadePoint2::new(p.x as f64, p.y as f64)
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn from_spade(p: SpadePoint2<f64>) -> Point {
    Point::new(p.x.round() as i64, p.y.round() as i64)
}

/// Inserts a closed ring and constrains its edges.
///
/// Edges that would cross an existing constraint are skipped. Returns the
/// number of skipped edges.
pub(crate) fn insert_constraint_ring(cdt: &mut Cdt, points: &[Point]) -> Result<usize> {
    let mut handles: Vec<FixedVertexHandle> = Vec::with_capacity(points.len());
    for p in points {
        let h = cdt.insert(to_spade(p)).map_err(|e: InsertionError| {
            GeometryError::Degenerate(format!("CDT insert: {e}"))
        })?;
        if handles.last() != Some(&h) {
            handles.push(h);
        }
    }
    if handles.len() > 1 && handles.first() == handles.last() {
        handles.pop();
    }
    if handles.len() < 2 {
        return Ok(0);
    }

    let mut skipped = 0;
    for i in 0..handles.len() {
        let from = handles[i];
        let to = handles[(i + 1) % handles.len()];
        if from == to {
            continue;
        }
        if cdt.can_add_constraint(from, to) {
            cdt.add_constraint(from, to);
        } else {
            skipped += 1;
        }
    }
    if skipped > 0 {
        warn!(skipped, "constraint edges crossing existing constraints were skipped");
    }
    Ok(skipped)
}

/// Number of constraint edges crossed to reach each inner face from the
/// convex hull, keyed by face index.
///
/// Odd depth means inside an odd number of rings (inside a region with holes);
/// depth 0 means outside every ring.
pub(crate) fn constraint_depths(cdt: &Cdt) -> HashMap<usize, u32> {
    let mut depth_map: HashMap<usize, u32> = HashMap::new();
    let mut queue: VecDeque<(FixedFaceHandle<InnerTag>, u32)> = VecDeque::new();

    let outer_fix = cdt.outer_face().fix();

    // Seed: inner faces adjacent to the outer face.
    for edge in cdt.directed_edges() {
        if edge.face().fix() != outer_fix {
            continue;
        }
        if let Some(inner) = edge.rev().face().as_inner() {
            let idx = inner.fix().index();
            if depth_map.contains_key(&idx) {
                continue;
            }
            let depth = u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
            depth_map.insert(idx, depth);
            queue.push_back((inner.fix(), depth));
        }
    }

    // BFS flood-fill
    while let Some((face_fix, depth)) = queue.pop_front() {
        let face = cdt.face(face_fix);
        for edge in face.adjacent_edges() {
            let Some(neighbor) = edge.rev().face().as_inner() else {
                continue;
            };
            let n_idx = neighbor.fix().index();
            if depth_map.contains_key(&n_idx) {
                continue;
            }
            let new_depth = if cdt.is_constraint_edge(edge.as_undirected().fix()) {
                depth + 1
            } else {
                depth
            };
            depth_map.insert(n_idx, new_depth);
            queue.push_back((neighbor.fix(), new_depth));
        }
    }

    depth_map
}
