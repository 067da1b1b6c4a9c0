//! Medial axis extraction for narrow regions.
//!
//! # Algorithm
//!
//! The region boundary is resampled and triangulated with its rings as
//! constraints. Inside a narrow region every triangle spans the region from
//! one side to the other, so the unconstrained ("chord") edges cross the
//! region and their length is the local width. Joining chord midpoints
//! through each triangle yields the chordal axis:
//!
//! - two chords: straight segment between the midpoints
//! - three chords: a junction at the centroid
//! - one chord: a dead end at the centroid
//!
//! The resulting graph is filtered by width, chained into
//! [`ThickPolyline`]s and the dead ends are extended into the anchoring bounds.

mod graph;

use spade::Triangulation;
use tracing::{debug, trace};

use crate::error::Result;
use crate::geometry::{ExPolygon, Line, Point, Polygon, ThickPolyline};
use crate::math::{CoordF, SCALED_RESOLUTION};
use crate::triangulation::{constraint_depths, insert_constraint_ring, Cdt};

use graph::{AxisGraph, NodeKey};

/// Extracts the width-annotated skeleton of a region.
pub struct MedialAxis<'a> {
    region: &'a ExPolygon,
    bounds: &'a ExPolygon,
    max_width: CoordF,
    min_width: CoordF,
}

impl<'a> MedialAxis<'a> {
    /// Creates a new extraction.
    ///
    /// Parts of the axis wider than `max_width` or narrower than `min_width`
    /// are discarded. Dead ends may grow into `bounds`.
    #[must_use]
    pub fn new(region: &'a ExPolygon, bounds: &'a ExPolygon, max_width: CoordF, min_width: CoordF) -> Self {
        Self {
            region,
            bounds,
            max_width,
            min_width,
        }
    }

    /// Executes the extraction.
    ///
    /// # Errors
    ///
    /// Returns an error if the triangulator rejects a boundary point.
    #[allow(clippy::cast_precision_loss)]
    pub fn execute(&self) -> Result<Vec<ThickPolyline>> {
        if !self.region.contour.is_valid() || self.max_width <= 0.0 {
            return Ok(Vec::new());
        }
        let step = self.min_width.max(SCALED_RESOLUTION as f64);

        // Step 1: triangulate the resampled rings.
        let mut cdt = Cdt::new();
        for ring in self.region.to_polygons() {
            insert_constraint_ring(&mut cdt, &resample(&ring, step))?;
        }
        let depths = constraint_depths(&cdt);
        let is_interior = |idx: usize| depths.get(&idx).is_some_and(|d| d % 2 == 1);

        // Step 2: chordal axis graph.
        let mut graph = AxisGraph::default();
        for face in cdt.inner_faces() {
            if !is_interior(face.fix().index()) {
                continue;
            }
            let chords: Vec<(NodeKey, Line)> = face
                .adjacent_edges()
                .iter()
                .filter(|edge| {
                    !cdt.is_constraint_edge(edge.as_undirected().fix())
                        && edge
                            .rev()
                            .face()
                            .as_inner()
                            .is_some_and(|n| is_interior(n.fix().index()))
                })
                .map(|edge| {
                    let line = Line::new(
                        crate::triangulation::from_spade(edge.from().position()),
                        crate::triangulation::from_spade(edge.to().position()),
                    );
                    (NodeKey::Chord(edge.as_undirected().fix().index()), line)
                })
                .collect();

            let centroid = {
                let [a, b, c] = face.vertices().map(|v| crate::triangulation::from_spade(v.position()));
                Polygon::new(vec![a, b, c]).centroid()
            };
            let face_key = NodeKey::Face(face.fix().index());
            match chords.as_slice() {
                [(ka, la), (kb, lb)] => {
                    let a = graph.node(*ka, la.midpoint(), la.length());
                    let b = graph.node(*kb, lb.midpoint(), lb.length());
                    graph.connect(a, b);
                }
                [(ka, la), (kb, lb), (kc, lc)] => {
                    let width = (la.length() + lb.length() + lc.length()) / 3.0;
                    let center = graph.node(face_key, centroid, width);
                    for (k, l) in [(ka, la), (kb, lb), (kc, lc)] {
                        let n = graph.node(*k, l.midpoint(), l.length());
                        graph.connect(n, center);
                    }
                }
                [(ka, la)] => {
                    let n = graph.node(*ka, la.midpoint(), la.length());
                    let end = graph.node(face_key, centroid, la.length());
                    graph.connect(n, end);
                }
                _ => {}
            }
        }
        trace!(nodes = graph.len(), "medial axis graph built");

        // Step 3: filter by width and chain.
        graph.retain_width(self.min_width, self.max_width);
        let mut polylines = graph.chain();

        // Step 4: drop short spurs, join pairs left at junctions, then drop
        // whatever is still too short to print.
        let total = polylines.len();
        polylines.retain(|tp| {
            let spur = tp.endpoints.0 != tp.endpoints.1;
            !(total > 1 && spur && tp.length() < self.max_width)
        });
        concatenate_at_junctions(&mut polylines);
        mark_orphan_ends(&mut polylines);
        polylines.retain(|tp| tp.is_closed() || tp.length() >= self.max_width);

        // Step 5: anchor dead ends into the bounds.
        for tp in &mut polylines {
            if !tp.is_closed() {
                self.extend_dead_ends(tp);
            }
        }
        polylines.retain(|tp| tp.points.len() >= 2 && tp.length() >= self.min_width);

        debug!(count = polylines.len(), "medial axis extracted");
        Ok(polylines)
    }

    fn extend_dead_ends(&self, tp: &mut ThickPolyline) {
        if tp.endpoints.1 {
            self.extend_end(tp);
        }
        if tp.endpoints.0 {
            tp.reverse();
            self.extend_end(tp);
            tp.reverse();
        }
    }

    fn extend_end(&self, tp: &mut ThickPolyline) {
        let n = tp.points.len();
        if n < 2 {
            return;
        }
        let seg = Line::new(tp.points[n - 2], tp.points[n - 1]);
        let len = seg.length();
        if len <= 0.0 {
            return;
        }
        let mut reach = self.max_width / 2.0;
        for _ in 0..4 {
            let candidate = seg.point_at(len + reach);
            if self.bounds.contains(&candidate) {
                tp.points.push(candidate);
                let w = tp.width.last().copied().unwrap_or_default();
                tp.width.push(w);
                return;
            }
            reach /= 2.0;
        }
    }
}

/// Splits ring edges so none is longer than `step`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn resample(ring: &Polygon, step: f64) -> Vec<Point> {
    let mut out = Vec::with_capacity(ring.points.len());
    for line in ring.lines() {
        out.push(line.a);
        let len = line.length();
        let pieces = (len / step).ceil() as usize;
        for k in 1..pieces {
            out.push(line.point_at(len * k as f64 / pieces as f64));
        }
    }
    out
}

/// Flags open ends that no other polyline touches as dead ends.
fn mark_orphan_ends(polylines: &mut [ThickPolyline]) {
    let ends: Vec<(Point, Point)> = polylines
        .iter()
        .map(|tp| (tp.first_point(), tp.last_point()))
        .collect();
    let shared = |me: usize, p: Point| {
        ends.iter()
            .enumerate()
            .any(|(k, &(a, b))| k != me && (a == p || b == p))
    };
    for (i, tp) in polylines.iter_mut().enumerate() {
        if tp.is_closed() {
            continue;
        }
        if !tp.endpoints.0 && !shared(i, tp.first_point()) {
            tp.endpoints.0 = true;
        }
        if !tp.endpoints.1 && !shared(i, tp.last_point()) {
            tp.endpoints.1 = true;
        }
    }
}

/// Joins polylines whose non-dead ends meet where exactly two of them remain.
fn concatenate_at_junctions(polylines: &mut Vec<ThickPolyline>) {
    loop {
        let mut joined = false;
        'search: for i in 0..polylines.len() {
            for j in (i + 1)..polylines.len() {
                let (a, b) = (&polylines[i], &polylines[j]);
                if a.is_closed() || b.is_closed() {
                    continue;
                }
                let shared = [
                    (a.last_point(), !a.endpoints.1, false),
                    (a.first_point(), !a.endpoints.0, true),
                ]
                .into_iter()
                .find_map(|(pa, open_a, reverse_a)| {
                    [(b.first_point(), !b.endpoints.0, false), (b.last_point(), !b.endpoints.1, true)]
                        .into_iter()
                        .find(|(pb, open_b, _)| open_a && *open_b && *pb == pa)
                        .map(|(pb, _, reverse_b)| (pb, reverse_a, reverse_b))
                });
                let Some((meeting, reverse_a, reverse_b)) = shared else {
                    continue;
                };
                let others = polylines
                    .iter()
                    .enumerate()
                    .filter(|(k, p)| {
                        *k != i && *k != j && (p.first_point() == meeting || p.last_point() == meeting)
                    })
                    .count();
                if others > 0 {
                    continue;
                }
                let mut b = polylines.remove(j);
                let a = &mut polylines[i];
                if reverse_a {
                    a.reverse();
                }
                if reverse_b {
                    b.reverse();
                }
                a.points.extend(b.points.into_iter().skip(1));
                a.width.extend(b.width.into_iter().skip(1));
                a.endpoints.1 = b.endpoints.1;
                joined = true;
                break 'search;
            }
        }
        if !joined {
            break;
        }
    }
}
