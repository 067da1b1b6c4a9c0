pub mod clipper;
pub mod error;
pub mod extrusion;
pub mod flow;
pub mod geometry;
pub mod math;
pub mod medial_axis;
pub mod motion;
pub mod navmesh;
pub mod perimeter;
mod triangulation;

pub use error::{LayerpathError, Result};
