pub mod distance_2d;
pub mod intersect_2d;
pub mod polygon_2d;

/// Fixed-point layer coordinate. One unit is [`SCALING_FACTOR`] millimetres.
pub type Coord = i64;

/// Floating-point layer coordinate in scaled units.
pub type CoordF = f64;

/// 2D floating-point point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 2D floating-point vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// Millimetres per scaled unit.
pub const SCALING_FACTOR: f64 = 1e-6;

/// Distance below which two scaled points are considered coincident.
pub const SCALED_EPSILON: Coord = 100;

/// Shortest segment (scaled) that still carries geometric meaning.
pub const SCALED_RESOLUTION: Coord = 12_500;

/// Volumetric flow (mm³/mm) below which a path is dropped.
pub const EPSILON: f64 = 1e-4;

/// Fraction of a spacing removed before offsetting, to absorb rounding.
pub const INSET_OVERLAP_TOLERANCE: f64 = 0.05;

/// Global tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Converts millimetres to scaled units.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn scale(mm: f64) -> Coord {
    (mm / SCALING_FACTOR).round() as Coord
}

/// Converts millimetres to scaled units without rounding.
#[must_use]
pub fn scale_f(mm: f64) -> CoordF {
    mm / SCALING_FACTOR
}

/// Converts scaled units to millimetres.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn unscale(value: Coord) -> f64 {
    value as f64 * SCALING_FACTOR
}

/// Converts scaled floating-point units to millimetres.
#[must_use]
pub fn unscale_f(value: CoordF) -> f64 {
    value * SCALING_FACTOR
}
