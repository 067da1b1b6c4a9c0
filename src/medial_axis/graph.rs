use std::collections::{HashMap, HashSet};

use crate::geometry::{Point, ThickPolyline};
use crate::math::CoordF;

/// Identity of an axis node: a chord (undirected triangulation edge) or a
/// triangle centroid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) enum NodeKey {
    Chord(usize),
    Face(usize),
}

/// Undirected graph of axis nodes with a width per node.
#[derive(Debug, Default)]
pub(super) struct AxisGraph {
    index: HashMap<NodeKey, usize>,
    points: Vec<Point>,
    widths: Vec<CoordF>,
    adjacency: Vec<Vec<usize>>,
    removed: Vec<bool>,
}

impl AxisGraph {
    /// Returns the node for `key`, creating it on first use.
    pub(super) fn node(&mut self, key: NodeKey, point: Point, width: CoordF) -> usize {
        if let Some(&i) = self.index.get(&key) {
            return i;
        }
        let i = self.points.len();
        self.index.insert(key, i);
        self.points.push(point);
        self.widths.push(width);
        self.adjacency.push(Vec::new());
        self.removed.push(false);
        i
    }

    pub(super) fn connect(&mut self, a: usize, b: usize) {
        if a == b || self.adjacency[a].contains(&b) {
            return;
        }
        self.adjacency[a].push(b);
        self.adjacency[b].push(a);
    }

    pub(super) fn len(&self) -> usize {
        self.points.len()
    }

    /// Removes nodes whose width falls outside `[min, max]`.
    pub(super) fn retain_width(&mut self, min: CoordF, max: CoordF) {
        for (removed, w) in self.removed.iter_mut().zip(&self.widths) {
            *removed = *w < min || *w > max;
        }
    }

    fn active_neighbors(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency[i].iter().copied().filter(|&j| !self.removed[j])
    }

    fn degree(&self, i: usize) -> usize {
        self.active_neighbors(i).count()
    }

    fn thick_polyline(&self, nodes: &[usize], endpoints: (bool, bool)) -> ThickPolyline {
        ThickPolyline::new(
            nodes.iter().map(|&i| self.points[i]).collect(),
            nodes.iter().map(|&i| self.widths[i]).collect(),
            endpoints,
        )
    }

    /// Chains the remaining nodes into polylines broken at junctions and dead
    /// ends. Pure cycles become closed polylines.
    pub(super) fn chain(&self) -> Vec<ThickPolyline> {
        let key = |a: usize, b: usize| (a.min(b), a.max(b));
        let mut visited: HashSet<(usize, usize)> = HashSet::new();
        let mut out = Vec::new();

        for start in 0..self.len() {
            if self.removed[start] || matches!(self.degree(start), 0 | 2) {
                continue;
            }
            let firsts: Vec<usize> = self.active_neighbors(start).collect();
            for first in firsts {
                if !visited.insert(key(start, first)) {
                    continue;
                }
                let mut nodes = vec![start];
                let (mut prev, mut cur) = (start, first);
                loop {
                    nodes.push(cur);
                    if self.degree(cur) != 2 {
                        break;
                    }
                    let Some(next) = self
                        .active_neighbors(cur)
                        .find(|&n| n != prev && !visited.contains(&key(cur, n)))
                    else {
                        break;
                    };
                    visited.insert(key(cur, next));
                    prev = cur;
                    cur = next;
                }
                let endpoints = (self.degree(start) == 1, self.degree(cur) == 1);
                out.push(self.thick_polyline(&nodes, endpoints));
            }
        }

        for start in 0..self.len() {
            if self.removed[start] || self.degree(start) != 2 {
                continue;
            }
            let Some(first) = self
                .active_neighbors(start)
                .find(|&n| !visited.contains(&key(start, n)))
            else {
                continue;
            };
            visited.insert(key(start, first));
            let mut nodes = vec![start];
            let mut cur = first;
            while cur != start {
                nodes.push(cur);
                let Some(next) = self
                    .active_neighbors(cur)
                    .find(|&n| !visited.contains(&key(cur, n)))
                else {
                    break;
                };
                visited.insert(key(cur, next));
                cur = next;
            }
            if cur == start {
                nodes.push(start);
            }
            out.push(self.thick_polyline(&nodes, (false, false)));
        }
        out
    }
}
