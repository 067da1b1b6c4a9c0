use std::cmp::Ordering;
use std::collections::BTreeSet;

use tracing::trace;

use crate::error::Result;
use crate::geometry::Point;

use super::{NavMesh, UNCLASSIFIED};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Color {
    #[default]
    Unseen,
    Open,
    Closed,
}

/// Per-triangle search state, fresh for every query.
#[derive(Debug, Clone, Copy, Default)]
struct SearchNode {
    color: Color,
    cost: f64,
    total: f64,
    parent: Option<usize>,
    /// Where the path enters the triangle.
    entry: Point,
}

/// Open-set key ordered by total cost, then triangle index.
#[derive(Debug, Clone, Copy)]
struct OpenKey {
    total: f64,
    poly: usize,
}

impl PartialEq for OpenKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenKey {}

impl PartialOrd for OpenKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.total.total_cmp(&other.total).then(self.poly.cmp(&other.poly))
    }
}

impl NavMesh {
    /// Cost multiplier of a triangle. Classes up to 1 cost the distance.
    fn class_weight(&self, poly: usize) -> f64 {
        f64::from(self.polygons[poly].class.max(1))
    }

    fn passable(&self, poly: usize) -> bool {
        self.config.unclassified_traversable || self.polygons[poly].class != UNCLASSIFIED
    }

    /// Triangles from the one holding `from` to the one holding `to`.
    ///
    /// A* over triangles. Moving through a triangle costs the distance
    /// from its entry point to the midpoint of the exit side, times the
    /// triangle's class. The heuristic is the straight distance to `to`.
    /// Returns `None` when either point is off the mesh or the goal cannot
    /// be reached.
    ///
    /// # Errors
    ///
    /// Returns [`NavMeshError::NotTriangulated`](crate::error::NavMeshError::NotTriangulated)
    /// before the mesh is built.
    pub fn path_dijkstra(&self, from: &Point, to: &Point) -> Result<Option<Vec<usize>>> {
        self.ensure_triangulated()?;
        let (Some(start), Some(goal)) = (self.find_poly(from), self.find_poly(to)) else {
            return Ok(None);
        };

        let mut nodes = vec![SearchNode::default(); self.polygons.len()];
        let mut open = BTreeSet::new();
        nodes[start] = SearchNode {
            color: Color::Open,
            cost: 0.0,
            total: from.distance_to(to),
            parent: None,
            entry: *from,
        };
        open.insert(OpenKey {
            total: nodes[start].total,
            poly: start,
        });

        let mut expanded = 0_usize;
        while let Some(OpenKey { poly: current, .. }) = open.pop_first() {
            if current == goal {
                trace!(expanded, "triangle search reached the goal");
                return Ok(Some(Self::unwind(&nodes, goal)));
            }
            nodes[current].color = Color::Closed;
            expanded += 1;

            let here = nodes[current];
            let weight = self.class_weight(current);
            for side in 0..3 {
                let Some(next) = self.polygons[current].neighbors[side] else {
                    continue;
                };
                if nodes[next].color == Color::Closed || (next != goal && !self.passable(next)) {
                    continue;
                }
                let mid = self.side_line(current, side).midpoint();
                let mut cost = here.cost + here.entry.distance_to(&mid) * weight;
                let heuristic = if next == goal {
                    cost += mid.distance_to(to) * self.class_weight(next);
                    0.0
                } else {
                    mid.distance_to(to)
                };

                let seen = nodes[next];
                if seen.color == Color::Open {
                    if cost >= seen.cost {
                        continue;
                    }
                    open.remove(&OpenKey {
                        total: seen.total,
                        poly: next,
                    });
                }
                nodes[next] = SearchNode {
                    color: Color::Open,
                    cost,
                    total: cost + heuristic,
                    parent: Some(current),
                    entry: mid,
                };
                open.insert(OpenKey {
                    total: cost + heuristic,
                    poly: next,
                });
            }
        }
        trace!(expanded, "triangle search exhausted");
        Ok(None)
    }

    fn unwind(nodes: &[SearchNode], goal: usize) -> Vec<usize> {
        let mut path = vec![goal];
        let mut current = goal;
        while let Some(parent) = nodes[current].parent {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }
}
