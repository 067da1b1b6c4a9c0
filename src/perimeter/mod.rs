//! Perimeter generation for one layer region.
//!
//! Each slice is inset repeatedly to produce nested loops. Loops are
//! organised into a [`LoopForest`] and sequenced either one loop at a time
//! or fused into one continuous loop per external contour. Regions too thin
//! for a loop become variable-width thin walls; the slivers left between
//! loops become gap fill. What remains inside the innermost loop is
//! returned as the infill boundary.

mod config;
mod extrude;
mod fused;
mod loops;
mod thin_walls;
mod traverse;
mod variable_width;

pub use config::{PerimeterConfig, PerimeterFlows, SeamPosition};
pub use loops::{LoopForest, LoopId, PerimeterLoop};
pub use variable_width::variable_width;

use tracing::{debug, trace};

use crate::clipper::{
    diff, diff_ex, intersection, offset, offset2, offset2_ex, offset_expolygons, simplify_polygons, union_ex,
};
use crate::error::Result;
use crate::extrusion::{ExtrusionEntity, ExtrusionEntityCollection, ExtrusionRole};
use crate::geometry::{to_polygons, ExPolygon, Polygon, ThickPolyline};
use crate::math::{scale_f, CoordF, INSET_OVERLAP_TOLERANCE, SCALED_RESOLUTION};
use crate::medial_axis::MedialAxis;

use extrude::LoopExtruder;

/// Everything generated for a region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerimeterOutput {
    /// One collection per slice, in print order.
    pub loops: ExtrusionEntityCollection,
    pub gap_fill: ExtrusionEntityCollection,
    /// Area left for infill inside the innermost loops.
    pub fill_surfaces: Vec<ExPolygon>,
}

/// Generates perimeters, thin walls and gap fill for the slices of a region.
pub struct PerimeterGenerator<'a> {
    slices: &'a [ExPolygon],
    /// Loops added on top of `perimeters`, one entry per slice.
    extra_perimeters: &'a [u32],
    lower_slices: Option<&'a [ExPolygon]>,
    config: &'a PerimeterConfig,
    flows: &'a PerimeterFlows,
}

/// Scaled widths and spacings shared by every slice.
#[allow(clippy::struct_field_names)]
struct Spacings {
    perimeter_width: CoordF,
    perimeter_spacing: CoordF,
    ext_width: CoordF,
    ext_spacing: CoordF,
    /// External to first internal loop.
    ext_spacing2: CoordF,
    min_spacing: CoordF,
    ext_min_spacing: CoordF,
    infill_spacing: CoordF,
}

impl Spacings {
    #[allow(clippy::cast_precision_loss)]
    fn new(flows: &PerimeterFlows) -> Self {
        let perimeter_spacing = flows.perimeter.scaled_spacing() as f64;
        let ext_spacing = flows.external_perimeter.scaled_spacing() as f64;
        Self {
            perimeter_width: flows.perimeter.scaled_width() as f64,
            perimeter_spacing,
            ext_width: flows.external_perimeter.scaled_width() as f64,
            ext_spacing,
            ext_spacing2: flows.external_perimeter.scaled_spacing_to(&flows.perimeter) as f64,
            min_spacing: perimeter_spacing * (1.0 - INSET_OVERLAP_TOLERANCE),
            ext_min_spacing: ext_spacing * (1.0 - INSET_OVERLAP_TOLERANCE),
            infill_spacing: flows.solid_infill.scaled_spacing() as f64,
        }
    }
}

/// Loops and leftovers of one slice.
struct SliceShells {
    contours: Vec<Vec<Polygon>>,
    holes: Vec<Vec<Polygon>>,
    thin_walls: Vec<ThickPolyline>,
    gaps: Vec<Polygon>,
    /// Innermost loop outline.
    last: Vec<Polygon>,
    /// Number of loops actually generated, minus one.
    loop_number: i64,
}

impl<'a> PerimeterGenerator<'a> {
    /// Creates a new generator over `slices`.
    #[must_use]
    pub fn new(slices: &'a [ExPolygon], config: &'a PerimeterConfig, flows: &'a PerimeterFlows) -> Self {
        Self {
            slices,
            extra_perimeters: &[],
            lower_slices: None,
            config,
            flows,
        }
    }

    /// Extra loops per slice, matched by index. Missing entries add none.
    #[must_use]
    pub fn with_extra_perimeters(mut self, extra: &'a [u32]) -> Self {
        self.extra_perimeters = extra;
        self
    }

    /// Slices of the layer below, used to detect overhanging loops.
    #[must_use]
    pub fn with_lower_slices(mut self, lower: &'a [ExPolygon]) -> Self {
        self.lower_slices = Some(lower);
        self
    }

    /// Executes the generation.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or flows are invalid, or if the
    /// medial axis cannot be extracted for a thin region.
    pub fn execute(&self) -> Result<PerimeterOutput> {
        self.config.validate()?;
        self.flows.validate()?;
        let spacings = Spacings::new(self.flows);

        let support = match self.lower_slices {
            Some(lower) if self.config.overhangs && self.config.layer_id > 0 => Some(offset(
                &to_polygons(lower),
                scale_f(self.flows.nozzle_diameter() / 2.0),
            )),
            _ => None,
        };
        let extruder = LoopExtruder {
            config: self.config,
            flows: self.flows,
            support,
        };

        let mut out = PerimeterOutput::default();
        for (index, slice) in self.slices.iter().enumerate() {
            let extra = self.extra_perimeters.get(index).copied().unwrap_or(0);
            let SliceShells {
                contours,
                holes,
                thin_walls,
                gaps,
                mut last,
                loop_number,
            } = self.shells(slice, extra, &spacings)?;

            // Step 1: sequence the loops.
            let forest = LoopForest::nest(&contours, &holes);
            let mut entities = self.traverse(&extruder, &forest, thin_walls);
            if self.config.external_perimeters_first {
                entities.reverse();
            }
            debug!(
                loops = forest.len(),
                entities = entities.len(),
                "perimeters generated for slice"
            );
            if !entities.is_empty() {
                out.loops.append(entities);
            }

            // Step 2: fill the gaps between loops.
            let gap_fill = self.gap_fill(&gaps, &spacings)?;
            if !gap_fill.is_empty() {
                let grown: Vec<Polygon> = gap_fill.iter().flat_map(ExtrusionEntity::grow).collect();
                last = diff(&last, &grown);
                trace!(paths = gap_fill.len(), "gap fill generated");
                out.gap_fill.extend(gap_fill);
            }

            // Step 3: infill boundary.
            let inset = match loop_number {
                n if n < 0 => 0.0,
                0 => spacings.ext_spacing2 / 2.0,
                _ => spacings.perimeter_spacing / 2.0,
            };
            let min_infill_spacing = spacings.infill_spacing * (1.0 - INSET_OVERLAP_TOLERANCE);
            #[allow(clippy::cast_precision_loss)]
            let simplified = simplify_polygons(&last, SCALED_RESOLUTION as f64);
            out.fill_surfaces.extend(offset2_ex(
                &simplified,
                -inset - min_infill_spacing / 2.0,
                min_infill_spacing / 2.0,
            ));
        }
        Ok(out)
    }

    /// Loops wanted for a slice with `extra` additional perimeters.
    #[allow(clippy::cast_possible_truncation)]
    fn loop_count(&self, extra: u32) -> i64 {
        let loops = i64::from(self.config.perimeters) + i64::from(extra);
        if self.config.min_shell_thickness <= 0.0 {
            return loops;
        }
        let ext_width = self.flows.external_perimeter.width;
        let width = self.flows.perimeter.width;
        let min_loops = 1 + ((self.config.min_shell_thickness - ext_width) / width).ceil() as i64;
        loops.max(min_loops)
    }

    /// Whether part of `last` hangs over nothing on the layer below.
    ///
    /// Unsupported slivers narrower than one loop do not count.
    fn has_overhang(&self, last: &[Polygon], sp: &Spacings) -> bool {
        if !self.config.extra_perimeters || last.is_empty() {
            return false;
        }
        let Some(lower) = self.lower_slices.filter(|l| !l.is_empty()) else {
            return false;
        };
        let unsupported = diff(last, &to_polygons(lower));
        let half = sp.perimeter_spacing / 2.0;
        !offset2(&unsupported, -half, half).is_empty()
    }

    /// Insets one slice into loops grouped by depth.
    #[allow(clippy::cast_precision_loss)]
    fn shells(&self, slice: &ExPolygon, extra: u32, sp: &Spacings) -> Result<SliceShells> {
        let mut shells = SliceShells {
            contours: Vec::new(),
            holes: Vec::new(),
            thin_walls: Vec::new(),
            gaps: Vec::new(),
            last: simplify_polygons(&slice.to_polygons(), SCALED_RESOLUTION as f64),
            loop_number: self.loop_count(extra) - 1,
        };
        if shells.loop_number < 0 {
            return Ok(shells);
        }
        let mut overhang_loop = self.has_overhang(&shells.last, sp);

        let mut i: i64 = 0;
        loop {
            if overhang_loop && i == shells.loop_number + 1 {
                trace!(loops = i + 1, "extra loop for overhang");
                shells.loop_number += 1;
                overhang_loop = false;
            }
            let offsets = if i == 0 {
                self.external_offsets(&shells.last, sp, &mut shells.thin_walls)?
            } else {
                let distance = if i == 1 {
                    sp.ext_spacing2
                } else {
                    sp.perimeter_spacing
                };
                let offsets = if self.config.thin_walls {
                    offset2(
                        &shells.last,
                        -(distance + sp.min_spacing / 2.0 - 1.0),
                        sp.min_spacing / 2.0 - 1.0,
                    )
                } else {
                    offset(&shells.last, -distance)
                };
                if self.config.gap_fill && (i <= shells.loop_number || offsets.is_empty()) {
                    shells.gaps.extend(diff(
                        &offset(&shells.last, -distance / 2.0),
                        &offset(&offsets, distance / 2.0 + 10.0),
                    ));
                }
                offsets
            };

            if offsets.is_empty() {
                shells.loop_number = i - 1;
                shells.last.clear();
                break;
            }
            if i > shells.loop_number {
                break;
            }

            let (contours, holes): (Vec<Polygon>, Vec<Polygon>) =
                offsets.iter().cloned().partition(Polygon::is_counter_clockwise);
            shells.contours.push(contours);
            shells.holes.push(holes);
            shells.last = offsets;
            i += 1;
        }
        Ok(shells)
    }

    /// Outline of the external loop, collecting thin walls on the way.
    #[allow(clippy::cast_precision_loss)]
    fn external_offsets(
        &self,
        last: &[Polygon],
        sp: &Spacings,
        thin_walls: &mut Vec<ThickPolyline>,
    ) -> Result<Vec<Polygon>> {
        if !self.config.thin_walls {
            return Ok(offset(last, -sp.ext_width / 2.0));
        }
        let offsets = offset2(
            last,
            -(sp.ext_width / 2.0 + sp.ext_min_spacing / 2.0 - 1.0),
            sp.ext_min_spacing / 2.0 - 1.0,
        );

        // Nothing in the search region is narrower than `min_width`.
        let min_width = scale_f(self.flows.nozzle_diameter() / 3.0);
        let no_thin_zone = offset(&offsets, sp.ext_width / 2.0);
        let thin_zones = offset2_ex(&diff(last, &no_thin_zone), -min_width / 2.0, min_width / 2.0);
        for thin in &thin_zones {
            if thin.area() <= min_width * (sp.ext_width + sp.ext_spacing) {
                continue;
            }
            let grown = offset_expolygons(std::slice::from_ref(thin), sp.ext_width / 2.0);
            let anchor = intersection(&to_polygons(&grown), &no_thin_zone);
            let mut bound_input = thin.to_polygons();
            bound_input.extend(anchor);
            let bounds = union_ex(&bound_input);
            let probe = thin.contour.first_point();
            let bound = bounds.iter().find(|b| b.contains(&probe)).unwrap_or(thin);
            let found = MedialAxis::new(thin, bound, sp.ext_width + sp.ext_spacing2, min_width).execute()?;
            trace!(polylines = found.len(), "thin wall extracted");
            thin_walls.extend(found);
        }
        Ok(offsets)
    }

    fn traverse(
        &self,
        extruder: &LoopExtruder<'_>,
        forest: &LoopForest,
        thin_walls: Vec<ThickPolyline>,
    ) -> ExtrusionEntityCollection {
        let ext_flow = &self.flows.external_perimeter;
        if self.config.perimeter_loop {
            let mut entities = fused::traverse_and_join(extruder, forest);
            entities.extend(variable_width(&thin_walls, ExtrusionRole::ThinWall, ext_flow));
            entities
        } else if self.config.thin_walls_merge {
            let mut entities = traverse::traverse_loops(extruder, forest, Vec::new());
            thin_walls::merge_thin_walls(&mut entities, thin_walls, ext_flow);
            entities
        } else {
            let walls = variable_width(&thin_walls, ExtrusionRole::ThinWall, ext_flow);
            traverse::traverse_loops(extruder, forest, walls)
        }
    }

    fn gap_fill(&self, gaps: &[Polygon], sp: &Spacings) -> Result<Vec<ExtrusionEntity>> {
        if !self.config.gap_fill || gaps.is_empty() {
            return Ok(Vec::new());
        }
        let min = 0.2 * sp.perimeter_width * (1.0 - INSET_OVERLAP_TOLERANCE);
        let max = 2.0 * sp.perimeter_spacing;
        let gaps_ex = diff_ex(
            &offset2(gaps, -min / 2.0, min / 2.0),
            &offset2(gaps, -max / 2.0, max / 2.0),
        );
        let mut polylines = Vec::new();
        for gap in &gaps_ex {
            polylines.extend(MedialAxis::new(gap, gap, max, min).execute()?);
        }
        Ok(variable_width(&polylines, ExtrusionRole::GapFill, &self.flows.solid_infill))
    }
}
