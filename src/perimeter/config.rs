use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::flow::Flow;

/// Where fused loops prefer to place their junctions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeamPosition {
    #[default]
    Nearest,
    /// Prefer the rearmost (largest y) connection.
    Rear,
    Aligned,
    Random,
}

/// Perimeter generation settings for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerimeterConfig {
    /// Number of perimeter loops.
    pub perimeters: u32,
    /// Minimum wall thickness in millimetres, raising the loop count when
    /// `perimeters` falls short. Zero disables it.
    pub min_shell_thickness: f64,
    /// Add one loop to slices that overhang the layer below.
    pub extra_perimeters: bool,
    /// Detect and fill walls too thin for a full loop.
    pub thin_walls: bool,
    /// Fill the gaps left between loops.
    pub gap_fill: bool,
    /// Split loops into supported and overhanging parts.
    pub overhangs: bool,
    /// Print the outermost loop before the inner ones.
    pub external_perimeters_first: bool,
    /// Fuse each contour and its descendants into one continuous loop.
    pub perimeter_loop: bool,
    pub seam_position: SeamPosition,
    /// Splice thin walls into the perimeter loops instead of printing them separately.
    pub thin_walls_merge: bool,
    /// Infill density in percent. Fused connectors only extrude when positive.
    pub fill_density: f64,
    /// Index of the layer, 0 being the first.
    pub layer_id: usize,
}

impl Default for PerimeterConfig {
    fn default() -> Self {
        Self {
            perimeters: 3,
            min_shell_thickness: 0.0,
            extra_perimeters: true,
            thin_walls: true,
            gap_fill: true,
            overhangs: true,
            external_perimeters_first: false,
            perimeter_loop: false,
            seam_position: SeamPosition::Nearest,
            thin_walls_merge: false,
            fill_density: 20.0,
            layer_id: 0,
        }
    }
}

impl PerimeterConfig {
    #[must_use]
    pub fn with_perimeters(mut self, perimeters: u32) -> Self {
        self.perimeters = perimeters;
        self
    }

    #[must_use]
    pub fn with_min_shell_thickness(mut self, thickness_mm: f64) -> Self {
        self.min_shell_thickness = thickness_mm;
        self
    }

    #[must_use]
    pub fn with_extra_perimeters(mut self, enabled: bool) -> Self {
        self.extra_perimeters = enabled;
        self
    }

    #[must_use]
    pub fn with_thin_walls(mut self, enabled: bool) -> Self {
        self.thin_walls = enabled;
        self
    }

    #[must_use]
    pub fn with_gap_fill(mut self, enabled: bool) -> Self {
        self.gap_fill = enabled;
        self
    }

    #[must_use]
    pub fn with_overhangs(mut self, enabled: bool) -> Self {
        self.overhangs = enabled;
        self
    }

    #[must_use]
    pub fn with_external_perimeters_first(mut self, enabled: bool) -> Self {
        self.external_perimeters_first = enabled;
        self
    }

    #[must_use]
    pub fn with_perimeter_loop(mut self, enabled: bool, seam: SeamPosition) -> Self {
        self.perimeter_loop = enabled;
        self.seam_position = seam;
        self
    }

    #[must_use]
    pub fn with_thin_walls_merge(mut self, enabled: bool) -> Self {
        self.thin_walls_merge = enabled;
        self
    }

    #[must_use]
    pub fn with_fill_density(mut self, percent: f64) -> Self {
        self.fill_density = percent;
        self
    }

    #[must_use]
    pub fn with_layer_id(mut self, layer_id: usize) -> Self {
        self.layer_id = layer_id;
        self
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a density outside `0..=100` or a
    /// negative shell thickness.
    pub fn validate(&self) -> Result<()> {
        if self.min_shell_thickness < 0.0 {
            return Err(ConfigError::Invalid {
                parameter: "min_shell_thickness",
                reason: format!("{} is negative", self.min_shell_thickness),
            }
            .into());
        }
        if !(0.0..=100.0).contains(&self.fill_density) {
            return Err(ConfigError::Invalid {
                parameter: "fill_density",
                reason: format!("{} is outside 0..=100", self.fill_density),
            }
            .into());
        }
        Ok(())
    }
}

/// Flows used by one region's perimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerimeterFlows {
    pub perimeter: Flow,
    pub external_perimeter: Flow,
    /// Bridge flow for unsupported loop sections.
    pub overhang: Flow,
    /// Flow for gap fill and infill spacing.
    pub solid_infill: Flow,
}

impl PerimeterFlows {
    /// Flows derived from one extrusion width and a layer height.
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is not positive.
    pub fn uniform(width: f64, layer_height: f64, nozzle_diameter: f64) -> Result<Self> {
        let flow = Flow::new(width, layer_height, nozzle_diameter, false)?;
        Ok(Self {
            perimeter: flow,
            external_perimeter: flow,
            overhang: Flow::new(nozzle_diameter, nozzle_diameter, nozzle_diameter, true)?,
            solid_infill: flow,
        })
    }

    /// Checks that every flow has the same nozzle.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if nozzles differ.
    pub fn validate(&self) -> Result<()> {
        let nozzle = self.perimeter.nozzle_diameter;
        let same = [self.external_perimeter, self.overhang, self.solid_infill]
            .iter()
            .all(|f| (f.nozzle_diameter - nozzle).abs() < 1e-9);
        if !same {
            return Err(ConfigError::Invalid {
                parameter: "flows",
                reason: "all flows must share one nozzle diameter".into(),
            }
            .into());
        }
        Ok(())
    }

    #[must_use]
    pub fn layer_height(&self) -> f64 {
        self.perimeter.height
    }

    #[must_use]
    pub fn nozzle_diameter(&self) -> f64 {
        self.perimeter.nozzle_diameter
    }
}
