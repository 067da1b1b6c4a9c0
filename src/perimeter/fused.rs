//! Fused traversal: each external contour and everything nested inside it
//! printed as one continuous loop.
//!
//! The outer loop is cut where it comes closest to a pending child, the
//! child loop is opened at the matching point and spliced in between two
//! short connectors. Spliced children become part of the outer loop, so
//! deeper loops attach to whichever printed loop is nearest.

use tracing::{debug, trace};

use crate::extrusion::{ExtrusionEntityCollection, ExtrusionLoop, ExtrusionLoopRole, ExtrusionPath, ExtrusionRole};
use crate::geometry::{Line, Point, Polygon, Polyline};
use crate::math::intersect_2d::segments_cross_properly;
use crate::math::{scale_f, SCALED_EPSILON, SCALED_RESOLUTION};

use super::config::SeamPosition;
use super::extrude::LoopExtruder;
use super::loops::{LoopForest, LoopId, PerimeterLoop};

/// Where the outer loop hands over to a child.
#[derive(Debug, Clone, Copy)]
struct Junction {
    /// Index into the pending list.
    child: usize,
    /// Index of the outer path that gets cut.
    outer_path: usize,
    outer_best: Point,
    child_best: Point,
    distance: f64,
}

/// One fused loop per root of `forest`.
pub(super) fn traverse_and_join(extruder: &LoopExtruder<'_>, forest: &LoopForest) -> ExtrusionEntityCollection {
    let mut out = ExtrusionEntityCollection::new();
    for &root in forest.roots() {
        let Some(lp) = forest.get(root) else {
            continue;
        };
        let mut joined = join_loops(extruder, forest, root, forest.descendants(root), lp.polygon.first_point());
        if joined.paths.is_empty() {
            continue;
        }
        close_loop(&mut joined);
        out.append(joined);
    }
    out
}

fn close_loop(joined: &mut ExtrusionLoop) {
    let Some(first) = joined.paths.first().and_then(|p| p.polyline.points.first().copied()) else {
        return;
    };
    if let Some(last) = joined.paths.last_mut() {
        if last.polyline.points.last() != Some(&first) {
            last.polyline.points.push(first);
        }
    }
}

/// Opens `root` at `entry` and splices every loop of `pending` into it.
pub(super) fn join_loops(
    extruder: &LoopExtruder<'_>,
    forest: &LoopForest,
    root: LoopId,
    mut pending: Vec<LoopId>,
    entry: Point,
) -> ExtrusionLoop {
    let mut joined = extrude_and_cut_loop(extruder, forest, root, entry, None);
    if joined.paths.is_empty() {
        return joined;
    }

    while !pending.is_empty() {
        let Some(junction) = nearest_junction(extruder, forest, &pending, &joined) else {
            debug!(remaining = pending.len(), "no junction left for nested loops");
            break;
        };
        // Removed even when the splice fails so the search always shrinks.
        let child = pending.remove(junction.child);
        if !splice_child(extruder, forest, &mut joined, child, &junction) {
            trace!(distance = junction.distance, "nested loop could not be spliced");
        }
    }
    joined
}

/// Opens the loop `id` at `entry` and turns it into extrusion paths.
///
/// Loops with fewer than three points give an empty loop; loops shorter than
/// two nozzle diameters collapse to a single point at their centroid. With a
/// `direction`, the loop is oriented so it leaves the entry point away from
/// the connector that led there.
pub(super) fn extrude_and_cut_loop(
    extruder: &LoopExtruder<'_>,
    forest: &LoopForest,
    id: LoopId,
    entry: Point,
    direction: Option<Line>,
) -> ExtrusionLoop {
    let Some(lp) = forest.get(id) else {
        return ExtrusionLoop::new(ExtrusionLoopRole::Default);
    };
    let external = lp.is_external();
    let mut out = ExtrusionLoop {
        paths: Vec::new(),
        role: LoopExtruder::loop_role(forest, id),
        is_hole: !lp.is_contour,
    };

    if lp.polygon.points.len() < 3 {
        return out;
    }
    if lp.polygon.length() < 2.0 * scale_f(extruder.flows.nozzle_diameter()) {
        let point = Polyline::new(vec![lp.polygon.centroid()]);
        out.paths.push(extruder.plain_path(point, external));
        return out;
    }

    let opened = open_at(&lp.polygon, entry);
    let mut paths = extruder.loop_paths(&opened, external);

    let reverse = direction
        .filter(|d| d.length() > 0.0)
        .is_some_and(|d| leaves_towards(&paths, &d));
    if reverse {
        paths.reverse();
    }
    let start = opened.first_point();
    let first = paths
        .iter()
        .position(|p| {
            let end = if reverse { p.last_point() } else { p.first_point() };
            end.coincides_with_epsilon(&start)
        })
        .unwrap_or(0);
    paths.rotate_left(first);
    if reverse {
        for path in &mut paths {
            path.reverse();
        }
    }
    out.paths = paths;
    out
}

/// Whether the loop, walked as given, starts off in the same direction as
/// the connector and would fold back over it.
fn leaves_towards(paths: &[ExtrusionPath], direction: &Line) -> bool {
    let mut probe = Polyline::new(paths.iter().flat_map(|p| p.polyline.points.iter().copied()).collect());
    #[allow(clippy::cast_precision_loss)]
    let res = SCALED_RESOLUTION as f64;
    probe.clip_start(res);
    probe.clip_end(res);
    match (probe.points.first(), probe.points.last()) {
        (Some(&first), Some(&last)) => direction.dot(&Line::new(last, first)) > 0.0,
        _ => false,
    }
}

/// Opens `polygon` at `entry`, inserting it as a vertex when it lies on an edge.
fn open_at(polygon: &Polygon, entry: Point) -> Polyline {
    let nearest = entry.nearest_point_index(&polygon.points).unwrap_or(0);
    if polygon.points[nearest].distance_to(&entry) <= eps() {
        return polygon.split_at_index(nearest);
    }
    let Some(before) = polygon.lines().iter().position(|l| l.distance_to(&entry) < eps()) else {
        debug!("entry point is off the loop, opening at the nearest vertex");
        return polygon.split_at_index(nearest);
    };
    let mut opened = polygon.split_at_index(before);
    opened.points[0] = entry;
    opened.points.push(entry);
    opened
}

#[allow(clippy::cast_precision_loss)]
fn eps() -> f64 {
    SCALED_EPSILON as f64
}

/// Finds the closest connection between `outer` and one of `pending`.
///
/// Three passes, each kept only when it lands within `max_dist`: outer
/// vertices to child vertices, outer interior vertices projected onto the
/// children, then child vertices projected onto the outer paths.
#[allow(clippy::cast_precision_loss)]
fn nearest_junction(
    extruder: &LoopExtruder<'_>,
    forest: &LoopForest,
    pending: &[LoopId],
    outer: &ExtrusionLoop,
) -> Option<Junction> {
    let dist_cut = extruder.flows.perimeter.scaled_width() as f64;
    let max_dist = dist_cut * 1.42;
    let seam = extruder.config.seam_position;

    let usable: Vec<usize> = outer
        .paths
        .iter()
        .enumerate()
        .filter(|(_, p)| p.role != ExtrusionRole::None && p.length() >= dist_cut + SCALED_RESOLUTION as f64)
        .map(|(i, _)| i)
        .collect();
    let children: Vec<(usize, &PerimeterLoop)> = pending
        .iter()
        .enumerate()
        .filter_map(|(i, &id)| forest.get(id).map(|lp| (i, lp)))
        .collect();

    let mut best: Option<Junction> = None;

    // Step 1: vertex to vertex.
    for &(ci, child) in &children {
        for &pi in &usable {
            let path = &outer.paths[pi];
            let slack = if (path.role == ExtrusionRole::ExternalPerimeter || child.is_external())
                && seam != SeamPosition::Random
            {
                dist_cut / 20.0
            } else {
                eps()
            };
            for &p in &path.polyline.points {
                let Some(ni) = p.nearest_point_index(&child.polygon.points) else {
                    continue;
                };
                let np = child.polygon.points[ni];
                let dist = p.distance_to(&np);
                let better = match &best {
                    None => true,
                    Some(b) if seam == SeamPosition::Rear => match (dist <= max_dist, b.distance <= max_dist) {
                        (true, false) => true,
                        (false, true) => false,
                        (true, true) => p.y > b.outer_best.y || (p.y == b.outer_best.y && dist + slack < b.distance),
                        (false, false) => dist + slack < b.distance,
                    },
                    Some(b) => dist + slack < b.distance,
                };
                if better {
                    best = Some(Junction {
                        child: ci,
                        outer_path: pi,
                        outer_best: p,
                        child_best: np,
                        distance: dist,
                    });
                }
            }
        }
    }
    if best.is_some_and(|b| b.distance <= max_dist) {
        return best;
    }

    // Step 2: outer interior vertices projected onto each child. The last
    // vertex is left alone, it is where the loop goes back out.
    for &(ci, child) in &children {
        for &pi in &usable {
            let points = &outer.paths[pi].polyline.points;
            for &p in points.iter().take(points.len().saturating_sub(1)).skip(1) {
                let Some((np, _)) = child.polygon.project(&p) else {
                    continue;
                };
                let dist = p.distance_to(&np);
                if dist > 0.0 && dist + eps() / 2.0 < best.map_or(f64::INFINITY, |b| b.distance) {
                    best = Some(Junction {
                        child: ci,
                        outer_path: pi,
                        outer_best: p,
                        child_best: np,
                        distance: dist,
                    });
                }
            }
        }
    }
    if best.is_some_and(|b| b.distance <= max_dist) {
        return best;
    }

    // Step 3: child vertices projected onto the outer paths.
    for &(ci, child) in &children {
        for &pi in &usable {
            let polyline = &outer.paths[pi].polyline;
            for &p in &child.polygon.points {
                let Some((np, _)) = polyline.project(&p) else {
                    continue;
                };
                let dist = p.distance_to(&np);
                if dist > 0.0 && dist + eps() / 2.0 < best.map_or(f64::INFINITY, |b| b.distance) {
                    best = Some(Junction {
                        child: ci,
                        outer_path: pi,
                        outer_best: np,
                        child_best: p,
                        distance: dist,
                    });
                }
            }
        }
    }
    best
}

/// Splits `polyline` at `at`, which must be a vertex or lie on a segment.
/// Both halves contain `at`.
fn cut_polyline(polyline: &Polyline, at: Point) -> Option<(Polyline, Polyline)> {
    let points = &polyline.points;
    let nearest = at.nearest_point_index(points)?;
    if points[nearest].coincides_with_epsilon(&at) {
        return Some((
            Polyline::new(points[..=nearest].to_vec()),
            Polyline::new(points[nearest..].to_vec()),
        ));
    }
    let before = polyline.lines().iter().position(|l| l.distance_to(&at) < eps())?;
    let mut head = points[..=before].to_vec();
    head.push(at);
    let mut tail = vec![at];
    tail.extend_from_slice(&points[before + 1..]);
    Some((Polyline::new(head), Polyline::new(tail)))
}

/// Trim lengths for the end of `a` and the start of `b`; whatever one side
/// is too short for moves to the other.
fn trim_pair(len_a: f64, len_b: f64, half_a: f64, half_b: f64) -> (f64, f64) {
    let (mut t1, mut t2) = (half_a, half_b);
    if len_a < t1 {
        t2 = t1 + t2 - len_a;
    }
    if len_b < t1 {
        t1 = t1 + t2 - len_b;
    }
    (t1, t2)
}

/// Distance between the centre lines of two touching paths.
fn path_spacing(path: &ExtrusionPath) -> f64 {
    scale_f(path.width - path.height * (1.0 - 0.25 * std::f64::consts::PI))
}

/// Paths from `a` to `b` joining two loops.
///
/// Long hops extrude a stub at each end with a fly-over in between; short
/// ones extrude all along, thinned when longer than `max_width`.
fn connector(template: &ExtrusionPath, a: Point, b: Point, max_width: f64, fill_density: f64) -> Vec<ExtrusionPath> {
    if a.coincides_with_epsilon(&b) {
        return Vec::new();
    }
    let dist = a.distance_to(&b);
    let extruded = |from: Point, to: Point, mult: f64| ExtrusionPath {
        polyline: Polyline::new(vec![from, to]),
        role: ExtrusionRole::Perimeter,
        mm3_per_mm: template.mm3_per_mm * mult,
        width: template.width * mult,
        height: template.height,
    };

    if dist > max_width * 1.5 && fill_density > 0.0 {
        let line = Line::new(a, b);
        let stub_a = line.point_at(max_width / 2.0);
        let stub_b = line.reversed().point_at(max_width / 2.0);
        let mut fly = ExtrusionPath::new(ExtrusionRole::None, 0.0, template.width, template.height);
        fly.polyline = Polyline::new(vec![stub_a, stub_b]);
        return vec![extruded(a, stub_a, 1.0), fly, extruded(stub_b, b, 1.0)];
    }
    let mult = if dist > max_width && fill_density > 0.0 {
        max_width / dist
    } else {
        1.0
    };
    vec![extruded(a, b, mult)]
}

/// Cuts the outer path of `junction` and splices the child loop into it.
///
/// Leaves `joined` untouched and returns `false` when the cut point is not on
/// the path or the child yields no extrusion.
#[allow(clippy::cast_precision_loss)]
fn splice_child(
    extruder: &LoopExtruder<'_>,
    forest: &LoopForest,
    joined: &mut ExtrusionLoop,
    child: LoopId,
    junction: &Junction,
) -> bool {
    let k = junction.outer_path;
    let Some(outer) = joined.paths.get(k) else {
        return false;
    };
    let Some((head, tail)) = cut_polyline(&outer.polyline, junction.outer_best) else {
        return false;
    };
    let mut outer_start = outer.with_polyline(head);
    let mut outer_end = outer.with_polyline(tail);

    // Step 1: open the child away from the section being removed.
    let res = SCALED_RESOLUTION as f64;
    let mut probe_a = outer_start.polyline.clone();
    probe_a.clip_end(res);
    let mut probe_b = outer_end.polyline.clone();
    probe_b.clip_start(res);
    let deleted = Line::new(probe_a.last_point(), probe_b.first_point());
    let mut inner = extrude_and_cut_loop(extruder, forest, child, junction.child_best, Some(deleted)).paths;
    if inner.is_empty() {
        return false;
    }

    // Step 2: trim both sides so the connectors do not overlap the loops.
    let inner_spacing = if forest.get(child).is_some_and(PerimeterLoop::is_external) {
        extruder.flows.external_perimeter.scaled_spacing()
    } else {
        extruder.flows.perimeter.scaled_spacing()
    } as f64;
    let last = inner.len() - 1;
    let start_single = outer_start.polyline.points.len() == 1;
    let end_single = outer_end.polyline.points.len() == 1;
    if start_single && end_single {
        // Nothing to trim.
    } else if start_single {
        outer_end.clip_start(path_spacing(&outer_end));
        let len = inner[last].polyline.length();
        inner[last].clip_end(inner_spacing.min(len / 2.0));
    } else if end_single {
        outer_start.clip_end(path_spacing(&outer_start));
        let len = inner[0].polyline.length();
        inner[0].clip_start(inner_spacing.min(len / 2.0));
    } else {
        let (t1, t2) = trim_pair(
            outer_start.polyline.length(),
            outer_end.polyline.length(),
            path_spacing(&outer_start) / 2.0,
            path_spacing(&outer_end) / 2.0,
        );
        outer_start.clip_end(t1);
        outer_end.clip_start(t2);

        let (t1, t2) = trim_pair(
            inner[0].polyline.length(),
            inner[last].polyline.length(),
            inner_spacing / 2.0,
            inner_spacing / 2.0,
        );
        inner[0].clip_start(t1);
        inner[last].clip_end(t2);
    }

    // Step 3: walk the child the other way if the connectors would cross.
    let going_in = (outer_start.last_point(), inner[0].first_point());
    let going_out = (inner[last].last_point(), outer_end.first_point());
    if segments_cross_properly(
        &going_in.0.to_f64(),
        &going_in.1.to_f64(),
        &going_out.0.to_f64(),
        &going_out.1.to_f64(),
    ) {
        inner.reverse();
        for path in &mut inner {
            path.reverse();
        }
    }

    // Step 4: connect.
    let max_width = extruder.flows.perimeter.scaled_width() as f64;
    let density = extruder.config.fill_density;
    let begin = connector(
        &outer_start,
        outer_start.last_point(),
        inner[0].first_point(),
        max_width,
        density,
    );
    let end = connector(
        &outer_end,
        inner[last].last_point(),
        outer_end.first_point(),
        max_width,
        density,
    );

    let mut spliced = Vec::with_capacity(inner.len() + begin.len() + end.len() + 2);
    spliced.push(outer_start);
    spliced.extend(begin);
    spliced.extend(inner);
    spliced.extend(end);
    spliced.push(outer_end);
    joined.paths.splice(k..=k, spliced);
    true
}
