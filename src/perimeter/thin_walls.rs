//! Splicing thin walls into the perimeter loops they touch.

use tracing::trace;

use crate::extrusion::{ExtrusionEntity, ExtrusionEntityCollection, ExtrusionLoop, ExtrusionPath, ExtrusionRole};
use crate::flow::Flow;
use crate::geometry::{Line, Polyline, ThickPolyline};

use super::variable_width::variable_width;

/// Share of the flow given to the outgoing pass over a merged wall.
const WALL_SHARE: f64 = 0.9;
/// Share of the flow given to the way back.
const RETURN_SHARE: f64 = 0.1;

/// Nearest perimeter segment to one end of a thin wall.
struct Anchor {
    lp: usize,
    path: usize,
    line: usize,
    segment: Line,
    dist_sq: f64,
    from_start: bool,
}

/// Merges each thin wall into the loop segment nearest one of its ends.
///
/// A wall within the external perimeter width of a segment is printed as a
/// detour from that segment: out along the wall at most of the flow, then
/// back at the rest. Closed walls are inserted as they are. Walls with no
/// segment in reach are appended to `extrusions` as separate paths.
pub(super) fn merge_thin_walls(extrusions: &mut ExtrusionEntityCollection, walls: Vec<ThickPolyline>, flow: &Flow) {
    #[allow(clippy::cast_precision_loss)]
    let reach = flow.scaled_width() as f64;
    let mut unanchored = Vec::new();
    {
        let mut loops = loops_mut(extrusions);
        for mut wall in walls {
            let Some(anchor) = find_anchor(&loops, &wall, reach * reach) else {
                unanchored.push(wall);
                continue;
            };
            if !anchor.from_start {
                wall.reverse();
            }
            let point = anchor.segment.projection(&wall.first_point());
            let target = &mut *loops[anchor.lp];
            let path = &mut target.paths[anchor.path];

            let mut after = vec![point];
            after.extend(path.polyline.points.drain(anchor.line + 1..));
            path.polyline.points.push(point);
            let after = path.with_polyline(Polyline::new(after));

            let detour = detour_paths(variable_width(&[wall], ExtrusionRole::ThinWall, flow));
            trace!(paths = detour.len(), "thin wall merged into a loop");
            let at = anchor.path + 1;
            target.paths.splice(at..at, detour.into_iter().chain(std::iter::once(after)));
        }
    }
    extrusions.extend(variable_width(&unanchored, ExtrusionRole::ThinWall, flow));
}

/// Every loop in the collection, nested ones included, in print order.
fn loops_mut(coll: &mut ExtrusionEntityCollection) -> Vec<&mut ExtrusionLoop> {
    let mut out = Vec::new();
    let mut stack: Vec<&mut ExtrusionEntity> = coll.entities.iter_mut().rev().collect();
    while let Some(entity) = stack.pop() {
        match entity {
            ExtrusionEntity::Loop(lp) => out.push(lp),
            ExtrusionEntity::Collection(c) => stack.extend(c.entities.iter_mut().rev()),
            ExtrusionEntity::Path(_) => {}
        }
    }
    out
}

fn find_anchor(loops: &[&mut ExtrusionLoop], wall: &ThickPolyline, max_sq: f64) -> Option<Anchor> {
    let ends = [(wall.first_point(), true), (wall.last_point(), false)];
    let mut best: Option<Anchor> = None;
    for (li, lp) in loops.iter().enumerate() {
        for (pi, path) in lp.paths.iter().enumerate() {
            if path.role == ExtrusionRole::ThinWall {
                continue;
            }
            for (idx, segment) in path.polyline.lines().into_iter().enumerate() {
                for &(end, from_start) in &ends {
                    let d = segment.distance_to(&end);
                    let dist_sq = d * d;
                    if dist_sq < best.as_ref().map_or(max_sq, |b| b.dist_sq) {
                        best = Some(Anchor {
                            lp: li,
                            path: pi,
                            line: idx,
                            segment,
                            dist_sq,
                            from_start,
                        });
                    }
                }
            }
        }
    }
    best
}

/// Outgoing and return paths for one wall, or the wall itself when closed.
fn detour_paths(entities: Vec<ExtrusionEntity>) -> Vec<ExtrusionPath> {
    if let [ExtrusionEntity::Loop(lp)] = entities.as_slice() {
        return lp.paths.clone();
    }
    let forward: Vec<ExtrusionPath> = entities
        .into_iter()
        .flat_map(|e| match e {
            ExtrusionEntity::Path(p) => vec![p],
            ExtrusionEntity::Loop(l) => l.paths,
            ExtrusionEntity::Collection(_) => Vec::new(),
        })
        .collect();
    let back: Vec<ExtrusionPath> = forward
        .iter()
        .rev()
        .map(|p| {
            let mut p = with_share(p.clone(), RETURN_SHARE);
            p.reverse();
            p
        })
        .collect();
    forward
        .into_iter()
        .map(|p| with_share(p, WALL_SHARE))
        .chain(back)
        .collect()
}

fn with_share(mut path: ExtrusionPath, share: f64) -> ExtrusionPath {
    path.mm3_per_mm *= share;
    path.width *= share;
    path
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::extrusion::ExtrusionLoopRole;
    use crate::geometry::{Point, Polygon};
    use crate::math::scale_f;

    fn square_loop(flow: &Flow) -> ExtrusionLoop {
        let path = ExtrusionPath::from_flow(
            Polygon::rectangle_mm(0.0, 0.0, 10.0, 10.0).split_at_first_point(),
            ExtrusionRole::ExternalPerimeter,
            flow,
        );
        ExtrusionLoop::from_path(path, ExtrusionLoopRole::Default)
    }

    fn wall(a: (f64, f64), b: (f64, f64)) -> ThickPolyline {
        ThickPolyline::new(
            vec![Point::new_scale(a.0, a.1), Point::new_scale(b.0, b.1)],
            vec![scale_f(0.3); 2],
            (true, true),
        )
    }

    #[test]
    fn wall_touching_a_loop_is_spliced_in() {
        let flow = Flow::new(0.45, 0.2, 0.4, false).unwrap();
        let mut coll = ExtrusionEntityCollection::new();
        coll.append(square_loop(&flow));
        merge_thin_walls(&mut coll, vec![wall((5.0, -0.1), (5.0, -3.0))], &flow);

        assert_eq!(coll.len(), 1);
        let ExtrusionEntity::Loop(lp) = &coll.entities[0] else {
            panic!("expected a loop");
        };
        assert_eq!(lp.paths[0].last_point(), Point::new_scale(5.0, 0.0));
        let walls: Vec<&ExtrusionPath> = lp.paths.iter().filter(|p| p.role == ExtrusionRole::ThinWall).collect();
        assert_eq!(walls.len(), 2);
        assert!((walls[0].width - 0.27).abs() < 1e-9);
        assert!((walls[1].width - 0.03).abs() < 1e-9);
        assert_eq!(walls[0].last_point(), walls[1].first_point());
        assert_eq!(lp.paths.last().unwrap().first_point(), Point::new_scale(5.0, 0.0));
    }

    #[test]
    fn far_wall_stays_separate() {
        let flow = Flow::new(0.45, 0.2, 0.4, false).unwrap();
        let mut coll = ExtrusionEntityCollection::new();
        coll.append(square_loop(&flow));
        merge_thin_walls(&mut coll, vec![wall((20.0, 20.0), (25.0, 20.0))], &flow);
        assert_eq!(coll.len(), 2);
        let ExtrusionEntity::Loop(lp) = &coll.entities[0] else {
            panic!("expected a loop");
        };
        assert_eq!(lp.paths.len(), 1);
    }

    #[test]
    fn far_end_is_reversed_to_start_at_the_loop() {
        let flow = Flow::new(0.45, 0.2, 0.4, false).unwrap();
        let mut coll = ExtrusionEntityCollection::new();
        coll.append(square_loop(&flow));
        merge_thin_walls(&mut coll, vec![wall((5.0, -3.0), (5.0, -0.1))], &flow);
        let ExtrusionEntity::Loop(lp) = &coll.entities[0] else {
            panic!("expected a loop");
        };
        let out = lp.paths.iter().find(|p| p.role == ExtrusionRole::ThinWall).unwrap();
        assert_eq!(out.first_point(), Point::new_scale(5.0, -0.1));
    }
}
