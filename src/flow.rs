//! Extrusion flow descriptor.
//!
//! A non-bridge extrusion has a rounded-rectangle cross-section (a
//! `width × height` rectangle whose short sides are semicircles), so adjacent
//! lines overlap by `height · (1 − π/4)`. A bridge extrusion is a free-hanging
//! round thread of diameter `width`.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{FlowError, Result};
use crate::math::{scale, Coord};

/// Extra gap between neighbouring bridge threads (mm).
pub const BRIDGE_EXTRA_SPACING: f64 = 0.05;

/// Width, height and nozzle of one extrusion, all in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub width: f64,
    pub height: f64,
    pub nozzle_diameter: f64,
    pub bridge: bool,
}

impl Flow {
    /// Creates a flow.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::InvalidDimension`] if any dimension is not positive.
    pub fn new(width: f64, height: f64, nozzle_diameter: f64, bridge: bool) -> Result<Self> {
        for (parameter, value) in [
            ("width", width),
            ("height", height),
            ("nozzle_diameter", nozzle_diameter),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(FlowError::InvalidDimension { parameter, value }.into());
            }
        }
        Ok(Self {
            width,
            height,
            nozzle_diameter,
            bridge,
        })
    }

    /// Same flow with a different width. Used for variable-width extrusions.
    #[must_use]
    pub fn with_width(&self, width: f64) -> Self {
        Self { width, ..*self }
    }

    /// Centre-to-centre distance between two neighbouring lines of this flow.
    #[must_use]
    pub fn spacing(&self) -> f64 {
        if self.bridge {
            self.width + BRIDGE_EXTRA_SPACING
        } else {
            self.width - self.height * (1.0 - 0.25 * PI)
        }
    }

    /// Centre-to-centre distance between a line of this flow and a line of `other`.
    #[must_use]
    pub fn spacing_to(&self, other: &Flow) -> f64 {
        if self.bridge {
            self.width / 2.0 + other.width / 2.0 + BRIDGE_EXTRA_SPACING
        } else {
            self.spacing() / 2.0 + other.spacing() / 2.0
        }
    }

    /// Volume extruded per millimetre of travel.
    #[must_use]
    pub fn mm3_per_mm(&self) -> f64 {
        if self.bridge {
            self.width * self.width * 0.25 * PI
        } else {
            self.width * self.height + self.height * self.height / 4.0 * (PI - 4.0)
        }
    }

    #[must_use]
    pub fn scaled_width(&self) -> Coord {
        scale(self.width)
    }

    #[must_use]
    pub fn scaled_spacing(&self) -> Coord {
        scale(self.spacing())
    }

    #[must_use]
    pub fn scaled_spacing_to(&self, other: &Flow) -> Coord {
        scale(self.spacing_to(other))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn rounded_rectangle_spacing() {
        let flow = Flow::new(0.45, 0.2, 0.4, false).unwrap();
        assert_relative_eq!(flow.spacing(), 0.45 - 0.2 * (1.0 - PI / 4.0), epsilon = 1e-12);
        assert_relative_eq!(
            flow.mm3_per_mm(),
            0.2 * (0.45 - 0.2 * (1.0 - PI / 4.0)),
            epsilon = 1e-12
        );
    }

    #[test]
    fn bridge_is_round_thread() {
        let flow = Flow::new(0.4, 0.4, 0.4, true).unwrap();
        assert_relative_eq!(flow.spacing(), 0.45, epsilon = 1e-12);
        assert_relative_eq!(flow.mm3_per_mm(), 0.04 * PI, epsilon = 1e-12);
        let other = Flow::new(0.5, 0.2, 0.4, false).unwrap();
        assert_relative_eq!(flow.spacing_to(&other), 0.2 + 0.25 + 0.05, epsilon = 1e-12);
    }

    #[test]
    fn spacing_between_flows_is_mean() {
        let ext = Flow::new(0.45, 0.2, 0.4, false).unwrap();
        let perim = Flow::new(0.5, 0.2, 0.4, false).unwrap();
        assert_relative_eq!(
            ext.spacing_to(&perim),
            (ext.spacing() + perim.spacing()) / 2.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn rejects_non_positive_dimensions() {
        assert!(Flow::new(0.0, 0.2, 0.4, false).is_err());
        assert!(Flow::new(0.4, -0.2, 0.4, false).is_err());
        assert!(Flow::new(0.4, 0.2, f64::NAN, false).is_err());
    }
}
