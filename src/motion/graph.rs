use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::trace;

use crate::geometry::{ExPolygon, Point};

/// Boundary vertices of a travel region and the straight moves between them.
#[derive(Debug, Clone, Default)]
pub(super) struct VisibilityGraph {
    nodes: Vec<Point>,
    edges: Vec<Vec<(usize, f64)>>,
}

/// Heap entry; the cheapest entry pops first.
#[derive(Debug, Clone, Copy)]
struct Frontier {
    cost: f64,
    node: usize,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other.cost.total_cmp(&self.cost).then_with(|| other.node.cmp(&self.node))
    }
}

impl VisibilityGraph {
    /// Links consecutive ring vertices and every pair that sees each other
    /// through one of `regions`.
    pub fn build(regions: &[ExPolygon]) -> Self {
        let mut graph = Self::default();
        for ring in regions.iter().flat_map(ExPolygon::to_polygons) {
            let base = graph.nodes.len();
            let n = ring.points.len();
            graph.nodes.extend(ring.points.iter().copied());
            graph.edges.resize(graph.nodes.len(), Vec::new());
            if n < 2 {
                continue;
            }
            for k in 0..n {
                graph.link(base + k, base + (k + 1) % n);
            }
        }

        let count = graph.nodes.len();
        for i in 0..count {
            for j in i + 1..count {
                if graph.linked(i, j) {
                    continue;
                }
                let (a, b) = (graph.nodes[i], graph.nodes[j]);
                if regions.iter().any(|r| r.contains_segment(&a, &b)) {
                    graph.link(i, j);
                }
            }
        }
        trace!(
            nodes = count,
            edges = graph.edges.iter().map(Vec::len).sum::<usize>() / 2,
            "visibility graph built"
        );
        graph
    }

    pub fn nodes(&self) -> &[Point] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn link(&mut self, a: usize, b: usize) {
        if a == b || self.linked(a, b) {
            return;
        }
        let w = self.nodes[a].distance_to(&self.nodes[b]);
        self.edges[a].push((b, w));
        self.edges[b].push((a, w));
    }

    fn linked(&self, a: usize, b: usize) -> bool {
        self.edges[a].iter().any(|&(n, _)| n == b)
    }

    /// Shortest route from `from` to `to`, both joined to the graph nodes
    /// they can see.
    ///
    /// Returns the visited points, endpoints included, or `None` when `to`
    /// cannot be reached.
    pub fn shortest_path(&self, from: Point, to: Point, sees: impl Fn(&Point, &Point) -> bool) -> Option<Vec<Point>> {
        let n = self.nodes.len();
        let (src, dst) = (n, n + 1);
        let mut edges = self.edges.clone();
        edges.push(Vec::new());
        edges.push(Vec::new());
        for (i, p) in self.nodes.iter().enumerate() {
            if sees(&from, p) {
                edges[src].push((i, from.distance_to(p)));
            }
            if sees(p, &to) {
                edges[i].push((dst, p.distance_to(&to)));
            }
        }
        if sees(&from, &to) {
            edges[src].push((dst, from.distance_to(&to)));
        }

        let mut dist = vec![f64::INFINITY; n + 2];
        let mut prev: Vec<Option<usize>> = vec![None; n + 2];
        let mut heap = BinaryHeap::new();
        dist[src] = 0.0;
        heap.push(Frontier { cost: 0.0, node: src });
        while let Some(Frontier { cost, node }) = heap.pop() {
            if node == dst {
                break;
            }
            if cost > dist[node] {
                continue;
            }
            for &(next, w) in &edges[node] {
                let candidate = cost + w;
                if candidate < dist[next] {
                    dist[next] = candidate;
                    prev[next] = Some(node);
                    heap.push(Frontier {
                        cost: candidate,
                        node: next,
                    });
                }
            }
        }
        if dist[dst].is_infinite() {
            return None;
        }

        let point = |i: usize| match i {
            i if i == src => from,
            i if i == dst => to,
            i => self.nodes[i],
        };
        let mut route = vec![to];
        let mut current = dst;
        while let Some(p) = prev[current] {
            route.push(point(p));
            current = p;
        }
        route.reverse();
        Some(route)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::Polygon;

    fn l_region() -> ExPolygon {
        let points = [(0.0, 0.0), (10.0, 0.0), (10.0, 2.0), (2.0, 2.0), (2.0, 10.0), (0.0, 10.0)];
        ExPolygon::new(
            Polygon::new(points.iter().map(|&(x, y)| Point::new_scale(x, y)).collect()),
            Vec::new(),
        )
    }

    #[test]
    fn ring_neighbors_are_linked() {
        let region = l_region();
        let graph = VisibilityGraph::build(std::slice::from_ref(&region));
        assert_eq!(graph.nodes().len(), 6);
        for k in 0..6 {
            assert!(graph.linked(k, (k + 1) % 6));
        }
        // The reflex corner sees everything, the far tips do not see each other.
        let tip_x = graph.nodes().iter().position(|p| *p == Point::new_scale(10.0, 2.0)).unwrap();
        let tip_y = graph.nodes().iter().position(|p| *p == Point::new_scale(2.0, 10.0)).unwrap();
        assert!(!graph.linked(tip_x, tip_y));
    }

    #[test]
    fn route_bends_at_the_reflex_corner() {
        let region = l_region();
        let graph = VisibilityGraph::build(std::slice::from_ref(&region));
        let from = Point::new_scale(9.0, 1.0);
        let to = Point::new_scale(1.0, 9.0);
        let route = graph
            .shortest_path(from, to, |a, b| region.contains_segment(a, b))
            .unwrap();
        assert_eq!(route, vec![from, Point::new_scale(2.0, 2.0), to]);
    }

    #[test]
    fn unreachable_goal_has_no_route() {
        let region = l_region();
        let graph = VisibilityGraph::build(std::slice::from_ref(&region));
        let route = graph.shortest_path(
            Point::new_scale(9.0, 1.0),
            Point::new_scale(50.0, 50.0),
            |a, b| region.contains_segment(a, b),
        );
        assert!(route.is_none());
    }

    #[test]
    fn corners_on_one_line_across_notches_are_not_linked() {
        let points = [
            (0.0, 0.0),
            (8.0, 0.0),
            (8.0, 10.0),
            (5.0, 10.0),
            (5.0, 3.0),
            (3.0, 3.0),
            (3.0, 10.0),
            (0.0, 10.0),
        ];
        let region = ExPolygon::new(
            Polygon::new(points.iter().map(|&(x, y)| Point::new_scale(x, y)).collect()),
            Vec::new(),
        );
        let graph = VisibilityGraph::build(std::slice::from_ref(&region));
        let at = |x: f64, y: f64| graph.nodes().iter().position(|p| *p == Point::new_scale(x, y)).unwrap();
        assert!(!graph.linked(at(0.0, 10.0), at(8.0, 10.0)));
        assert!(!graph.linked(at(3.0, 10.0), at(5.0, 10.0)));
        assert!(graph.linked(at(3.0, 3.0), at(5.0, 3.0)));
    }
}
