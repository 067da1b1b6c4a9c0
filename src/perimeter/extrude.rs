use crate::clipper::{diff_pl, intersection_pl};
use crate::extrusion::{chain_order, ExtrusionEntity, ExtrusionLoopRole, ExtrusionPath, ExtrusionRole};
use crate::flow::Flow;
use crate::geometry::{Point, Polygon, Polyline};

use super::config::{PerimeterConfig, PerimeterFlows};
use super::loops::{LoopForest, LoopId, PerimeterLoop};

/// Turns loop polygons into extrusion paths for one region.
pub(super) struct LoopExtruder<'a> {
    pub config: &'a PerimeterConfig,
    pub flows: &'a PerimeterFlows,
    /// Lower layer grown by half a nozzle. Set only when overhangs are split.
    pub support: Option<Vec<Polygon>>,
}

impl LoopExtruder<'_> {
    pub fn flow(&self, external: bool) -> &Flow {
        if external {
            &self.flows.external_perimeter
        } else {
            &self.flows.perimeter
        }
    }

    pub fn role(lp: &PerimeterLoop) -> ExtrusionRole {
        if lp.is_external() {
            ExtrusionRole::ExternalPerimeter
        } else {
            ExtrusionRole::Perimeter
        }
    }

    pub fn loop_role(forest: &LoopForest, id: LoopId) -> ExtrusionLoopRole {
        if forest.is_internal_contour(id) {
            ExtrusionLoopRole::ContourInternal
        } else {
            ExtrusionLoopRole::Default
        }
    }

    /// A single path along `polyline` with the perimeter flow.
    pub fn plain_path(&self, polyline: Polyline, external: bool) -> ExtrusionPath {
        let role = if external {
            ExtrusionRole::ExternalPerimeter
        } else {
            ExtrusionRole::Perimeter
        };
        ExtrusionPath::from_flow(polyline, role, self.flow(external))
    }

    /// Paths for an opened loop, split into supported and overhanging parts
    /// when a lower layer is known.
    pub fn loop_paths(&self, polyline: &Polyline, external: bool) -> Vec<ExtrusionPath> {
        match &self.support {
            Some(support) => self.split_overhangs(polyline, external, support),
            None => vec![self.plain_path(polyline.clone(), external)],
        }
    }

    fn split_overhangs(&self, polyline: &Polyline, external: bool, support: &[Polygon]) -> Vec<ExtrusionPath> {
        let input = std::slice::from_ref(polyline);
        let mut pieces: Vec<ExtrusionEntity> = Vec::new();
        for supported in intersection_pl(input, support) {
            pieces.push(self.plain_path(supported, external).into());
        }
        for unsupported in diff_pl(input, support) {
            let path = ExtrusionPath::from_flow(unsupported, ExtrusionRole::OverhangPerimeter, &self.flows.overhang);
            pieces.push(path.into());
        }
        chain_paths(&pieces, polyline.first_point())
    }
}

/// Orders path pieces head to tail from `start`, reversing them as needed.
fn chain_paths(pieces: &[ExtrusionEntity], start: Point) -> Vec<ExtrusionPath> {
    chain_order(pieces, start)
        .into_iter()
        .filter_map(|(i, reversed)| match &pieces[i] {
            ExtrusionEntity::Path(path) => {
                let mut path = path.clone();
                if reversed {
                    path.reverse();
                }
                Some(path)
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::scale_f;

    #[test]
    fn loop_over_a_ledge_is_split() {
        let config = PerimeterConfig::default().with_layer_id(1);
        let flows = PerimeterFlows::uniform(0.45, 0.2, 0.4).unwrap();
        // Lower layer only covers the left half.
        let support = crate::clipper::offset(&[Polygon::rectangle_mm(0.0, 0.0, 5.0, 10.0)], scale_f(0.2));
        let extruder = LoopExtruder {
            config: &config,
            flows: &flows,
            support: Some(support),
        };
        let ring = Polygon::rectangle_mm(1.0, 1.0, 9.0, 9.0);
        let paths = extruder.loop_paths(&ring.split_at_first_point(), true);
        assert!(paths.iter().any(|p| p.role == ExtrusionRole::OverhangPerimeter));
        assert!(paths.iter().any(|p| p.role == ExtrusionRole::ExternalPerimeter));
        let total: f64 = paths.iter().map(ExtrusionPath::length).sum();
        assert!((total - ring.length()).abs() < scale_f(0.01));
        let overhang = paths.iter().find(|p| p.role == ExtrusionRole::OverhangPerimeter).unwrap();
        assert!(overhang.polyline.points.iter().all(|p| p.x >= crate::math::scale(5.0)));
        assert!(overhang.width > 0.39);
    }

    #[test]
    fn without_support_one_path() {
        let config = PerimeterConfig::default();
        let flows = PerimeterFlows::uniform(0.45, 0.2, 0.4).unwrap();
        let extruder = LoopExtruder {
            config: &config,
            flows: &flows,
            support: None,
        };
        let ring = Polygon::rectangle_mm(1.0, 1.0, 9.0, 9.0);
        let paths = extruder.loop_paths(&ring.split_at_first_point(), false);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].role, ExtrusionRole::Perimeter);
    }
}
