use crate::clipper::offset_polylines;
use crate::flow::Flow;
use crate::geometry::{Point, Polygon, Polyline};
use crate::math::scale_f;

use super::ExtrusionRole;

/// An open extruded polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtrusionPath {
    pub polyline: Polyline,
    pub role: ExtrusionRole,
    /// Volume per millimetre of travel.
    pub mm3_per_mm: f64,
    /// Nominal width (mm).
    pub width: f64,
    /// Layer height (mm).
    pub height: f64,
}

impl ExtrusionPath {
    #[must_use]
    pub fn new(role: ExtrusionRole, mm3_per_mm: f64, width: f64, height: f64) -> Self {
        Self {
            polyline: Polyline::default(),
            role,
            mm3_per_mm,
            width,
            height,
        }
    }

    /// Path over `polyline` carrying `flow`.
    #[must_use]
    pub fn from_flow(polyline: Polyline, role: ExtrusionRole, flow: &Flow) -> Self {
        Self {
            polyline,
            role,
            mm3_per_mm: flow.mm3_per_mm(),
            width: flow.width,
            height: flow.height,
        }
    }

    /// Same attributes over a different polyline.
    #[must_use]
    pub fn with_polyline(&self, polyline: Polyline) -> Self {
        Self {
            polyline,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn first_point(&self) -> Point {
        self.polyline.first_point()
    }

    #[must_use]
    pub fn last_point(&self) -> Point {
        self.polyline.last_point()
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.polyline.length()
    }

    pub fn reverse(&mut self) {
        self.polyline.reverse();
    }

    pub fn clip_end(&mut self, distance: f64) {
        self.polyline.clip_end(distance);
    }

    pub fn clip_start(&mut self, distance: f64) {
        self.polyline.clip_start(distance);
    }

    /// Footprint of the extrusion.
    #[must_use]
    pub fn grow(&self) -> Vec<Polygon> {
        offset_polylines(std::slice::from_ref(&self.polyline), scale_f(self.width) / 2.0)
    }
}
