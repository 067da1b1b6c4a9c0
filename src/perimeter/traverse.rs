//! Standard loop traversal: one extrusion loop per perimeter.

use crate::extrusion::{chain_order, ExtrusionEntity, ExtrusionEntityCollection, ExtrusionLoop};
use crate::geometry::Point;

use super::extrude::LoopExtruder;
use super::loops::{LoopForest, LoopId};

enum Task {
    /// Order and expand the loops of one nesting level.
    Level(Vec<LoopId>, Vec<ExtrusionEntity>),
    Emit(ExtrusionEntity),
}

/// Sequences every loop of the forest.
///
/// Within a level, loops and `thin_walls` are chained nearest-neighbour from
/// the origin. Internal loops and holes with children come first, then the
/// external loops, then thin walls. A contour is printed after its children,
/// a hole before them. Contours run counter-clockwise, holes clockwise.
pub(super) fn traverse_loops(
    extruder: &LoopExtruder<'_>,
    forest: &LoopForest,
    thin_walls: Vec<ExtrusionEntity>,
) -> ExtrusionEntityCollection {
    let mut out = ExtrusionEntityCollection::new();
    let mut tasks = vec![Task::Level(forest.roots().to_vec(), thin_walls)];

    while let Some(task) = tasks.pop() {
        let (ids, walls) = match task {
            Task::Emit(entity) => {
                out.append(entity);
                continue;
            }
            Task::Level(ids, walls) => (ids, walls),
        };

        let level: Vec<(LoopId, &super::loops::PerimeterLoop)> =
            ids.iter().filter_map(|&id| forest.get(id).map(|lp| (id, lp))).collect();
        let loop_count = level.len();

        let mut entities: Vec<ExtrusionEntity> = level
            .iter()
            .map(|&(id, lp)| {
                let external = lp.is_external();
                let polyline = lp.polygon.split_at_first_point();
                ExtrusionEntity::Loop(ExtrusionLoop {
                    paths: extruder.loop_paths(&polyline, external),
                    role: LoopExtruder::loop_role(forest, id),
                    is_hole: !lp.is_contour,
                })
            })
            .collect();
        entities.extend(walls);

        let mut chain = chain_order(&entities, Point::default());
        chain.sort_by_key(|&(i, _)| match level.get(i) {
            Some((_, lp)) if !lp.is_external() || (!lp.is_contour && !lp.children.is_empty()) => 0,
            Some(_) => 1,
            None => 2,
        });

        let mut slots: Vec<Option<ExtrusionEntity>> = entities.into_iter().map(Some).collect();
        let mut ordered: Vec<Task> = Vec::with_capacity(chain.len() * 2);
        for (i, reversed) in chain {
            let Some(mut entity) = slots[i].take() else {
                continue;
            };
            if i >= loop_count {
                if reversed {
                    entity.reverse();
                }
                if let ExtrusionEntity::Loop(lp) = &mut entity {
                    lp.make_counter_clockwise();
                }
                ordered.push(Task::Emit(entity));
                continue;
            }

            let (_, lp) = level[i];
            let children = Task::Level(lp.children.clone(), Vec::new());
            if let ExtrusionEntity::Loop(el) = &mut entity {
                if lp.is_contour {
                    el.make_counter_clockwise();
                } else {
                    el.make_clockwise();
                }
            }
            if lp.is_contour {
                ordered.push(children);
                ordered.push(Task::Emit(entity));
            } else {
                ordered.push(Task::Emit(entity));
                ordered.push(children);
            }
        }
        tasks.extend(ordered.into_iter().rev());
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::extrusion::{ExtrusionLoopRole, ExtrusionPath, ExtrusionRole};
    use crate::geometry::{Polygon, Polyline};
    use crate::perimeter::config::{PerimeterConfig, PerimeterFlows};

    fn ring(x0: f64, y0: f64, x1: f64, y1: f64, ccw: bool) -> Polygon {
        let mut p = Polygon::rectangle_mm(x0, y0, x1, y1);
        if !ccw {
            p.make_clockwise();
        }
        p
    }

    fn loops_of(coll: &ExtrusionEntityCollection) -> Vec<&ExtrusionLoop> {
        coll.entities
            .iter()
            .filter_map(|e| match e {
                ExtrusionEntity::Loop(l) => Some(l),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn contour_children_precede_it_and_holes_follow() {
        let contours = vec![vec![ring(0.0, 0.0, 20.0, 20.0, true)], vec![ring(1.0, 1.0, 19.0, 19.0, true)]];
        let holes = vec![vec![ring(8.0, 8.0, 12.0, 12.0, false)], vec![ring(7.0, 7.0, 13.0, 13.0, false)]];
        let forest = LoopForest::nest(&contours, &holes);
        let config = PerimeterConfig::default();
        let flows = PerimeterFlows::uniform(0.45, 0.2, 0.4).unwrap();
        let extruder = LoopExtruder {
            config: &config,
            flows: &flows,
            support: None,
        };
        let out = traverse_loops(&extruder, &forest, Vec::new());
        let loops = loops_of(&out);
        assert_eq!(loops.len(), 4);
        // The external contour is last; the first hole loop precedes the deeper one.
        let last = loops.last().unwrap();
        assert!(!last.is_hole);
        assert_eq!(last.paths[0].role, ExtrusionRole::ExternalPerimeter);
        let hole_positions: Vec<usize> = loops
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is_hole)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(hole_positions.len(), 2);
        for l in &loops {
            assert_eq!(l.is_counter_clockwise(), !l.is_hole);
        }
        let inner_contour = loops.iter().find(|l| !l.is_hole && l.paths[0].role == ExtrusionRole::Perimeter).unwrap();
        assert_eq!(inner_contour.role, ExtrusionLoopRole::ContourInternal);
    }

    #[test]
    fn thin_walls_come_after_loops() {
        let forest = LoopForest::nest(&[vec![ring(0.0, 0.0, 10.0, 10.0, true)]], &[]);
        let config = PerimeterConfig::default();
        let flows = PerimeterFlows::uniform(0.45, 0.2, 0.4).unwrap();
        let extruder = LoopExtruder {
            config: &config,
            flows: &flows,
            support: None,
        };
        let wall = ExtrusionPath::from_flow(
            Polyline::new(vec![Point::new_scale(0.0, 0.0), Point::new_scale(-3.0, 0.0)]),
            ExtrusionRole::ThinWall,
            &flows.external_perimeter,
        );
        let out = traverse_loops(&extruder, &forest, vec![wall.into()]);
        assert_eq!(out.len(), 2);
        assert!(out.entities[0].is_loop());
        assert!(!out.entities[1].is_loop());
    }
}
