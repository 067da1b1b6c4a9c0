use crate::clipper::union;
use crate::geometry::{Point, Polygon};

use super::{ExtrusionLoopRole, ExtrusionPath};

/// A closed chain of extrusion paths.
///
/// Each path starts where the previous one ends and the last path ends at the
/// first path's start.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtrusionLoop {
    pub paths: Vec<ExtrusionPath>,
    pub role: ExtrusionLoopRole,
    pub is_hole: bool,
}

impl ExtrusionLoop {
    #[must_use]
    pub fn new(role: ExtrusionLoopRole) -> Self {
        Self {
            paths: Vec::new(),
            role,
            is_hole: false,
        }
    }

    /// Loop made of a single path.
    #[must_use]
    pub fn from_path(path: ExtrusionPath, role: ExtrusionLoopRole) -> Self {
        Self {
            paths: vec![path],
            role,
            is_hole: false,
        }
    }

    /// The ring traced by the loop (closing point not repeated).
    #[must_use]
    pub fn polygon(&self) -> Polygon {
        let mut points = Vec::new();
        for path in &self.paths {
            let pts = &path.polyline.points;
            if let Some((_, head)) = pts.split_last() {
                points.extend_from_slice(head);
            }
        }
        Polygon::new(points)
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.paths.iter().map(ExtrusionPath::length).sum()
    }

    #[must_use]
    pub fn first_point(&self) -> Point {
        self.paths.first().map(ExtrusionPath::first_point).unwrap_or_default()
    }

    #[must_use]
    pub fn last_point(&self) -> Point {
        self.paths.last().map(ExtrusionPath::last_point).unwrap_or_default()
    }

    #[must_use]
    pub fn is_counter_clockwise(&self) -> bool {
        self.polygon().is_counter_clockwise()
    }

    /// Returns `true` if the loop was reversed.
    pub fn make_counter_clockwise(&mut self) -> bool {
        let reverse = !self.is_counter_clockwise();
        if reverse {
            self.reverse();
        }
        reverse
    }

    /// Returns `true` if the loop was reversed.
    pub fn make_clockwise(&mut self) -> bool {
        let reverse = self.is_counter_clockwise();
        if reverse {
            self.reverse();
        }
        reverse
    }

    pub fn reverse(&mut self) {
        for path in &mut self.paths {
            path.reverse();
        }
        self.paths.reverse();
    }

    /// Paths chain head-to-tail and the chain closes.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        if self.paths.is_empty() {
            return false;
        }
        let chained = self
            .paths
            .windows(2)
            .all(|w| w[0].last_point().coincides_with_epsilon(&w[1].first_point()));
        chained && self.last_point().coincides_with_epsilon(&self.first_point())
    }

    /// Union of the footprints of all paths.
    #[must_use]
    pub fn grow(&self) -> Vec<Polygon> {
        let footprints: Vec<Polygon> = self.paths.iter().flat_map(ExtrusionPath::grow).collect();
        union(&footprints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extrusion::ExtrusionRole;
    use crate::geometry::Polyline;

    fn square_loop() -> ExtrusionLoop {
        let ring = Polygon::rectangle_mm(0.0, 0.0, 10.0, 10.0);
        let mut path = ExtrusionPath::new(ExtrusionRole::Perimeter, 0.1, 0.45, 0.2);
        path.polyline = ring.split_at_first_point();
        ExtrusionLoop::from_path(path, ExtrusionLoopRole::Default)
    }

    #[test]
    fn polygon_drops_closing_point() {
        let lp = square_loop();
        assert_eq!(lp.polygon().points.len(), 4);
        assert!(lp.is_closed());
    }

    #[test]
    fn orientation_changes_reverse_all_paths() {
        let mut lp = square_loop();
        assert!(!lp.make_counter_clockwise());
        assert!(lp.make_clockwise());
        assert!(!lp.is_counter_clockwise());
        assert!(lp.is_closed());
    }

    #[test]
    fn split_chain_stays_closed() {
        let ring = Polygon::rectangle_mm(0.0, 0.0, 10.0, 10.0);
        let pl = ring.split_at_first_point();
        let (a, b) = pl.points.split_at(3);
        let mut first = ExtrusionPath::new(ExtrusionRole::Perimeter, 0.1, 0.45, 0.2);
        first.polyline = Polyline::new(a.to_vec());
        let mut second = first.clone();
        let mut tail = vec![a[2]];
        tail.extend_from_slice(b);
        second.polyline = Polyline::new(tail);
        let lp = ExtrusionLoop {
            paths: vec![first, second],
            role: ExtrusionLoopRole::Default,
            is_hole: false,
        };
        assert!(lp.is_closed());
        assert_eq!(lp.polygon().points.len(), 4);
        assert!((lp.length() - crate::math::scale_f(40.0)).abs() < 1.0);
    }
}
