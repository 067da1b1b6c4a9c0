pub mod bounding_box;
pub mod expolygon;
pub mod line;
pub mod point;
pub mod polygon;
pub mod polyline;
pub mod thick_polyline;

pub use bounding_box::BoundingBox;
pub use expolygon::{to_polygons, ExPolygon};
pub use line::Line;
pub use point::Point;
pub use polygon::Polygon;
pub use polyline::Polyline;
pub use thick_polyline::{ThickLine, ThickPolyline};
