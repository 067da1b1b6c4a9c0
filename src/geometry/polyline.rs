use serde::{Deserialize, Serialize};

use super::{Line, Point};

/// An open sequence of scaled points.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polyline {
    pub points: Vec<Point>,
}

impl Polyline {
    #[must_use]
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// First point, or the origin for an empty polyline.
    #[must_use]
    pub fn first_point(&self) -> Point {
        self.points.first().copied().unwrap_or_default()
    }

    /// Last point, or the origin for an empty polyline.
    #[must_use]
    pub fn last_point(&self) -> Point {
        self.points.last().copied().unwrap_or_default()
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.points.len() >= 2
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance_to(&w[1])).sum()
    }

    #[must_use]
    pub fn lines(&self) -> Vec<Line> {
        self.points.windows(2).map(|w| Line::new(w[0], w[1])).collect()
    }

    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    pub fn append(&mut self, other: &Polyline) {
        self.points.extend_from_slice(&other.points);
    }

    /// Removes `distance` of length from the end.
    ///
    /// A distance at least as long as the polyline leaves only the first
    /// point.
    pub fn clip_end(&mut self, mut distance: f64) {
        if distance > 0.0 && distance >= self.length() {
            self.points.truncate(1);
            return;
        }
        while distance > 0.0 {
            let Some(last) = self.points.pop() else {
                break;
            };
            let Some(&prev) = self.points.last() else {
                break;
            };
            let seg = last.distance_to(&prev);
            if seg <= distance {
                distance -= seg;
                continue;
            }
            self.points.push(Line::new(last, prev).point_at(distance));
            distance = 0.0;
        }
    }

    /// Removes `distance` of length from the start, keeping at least the
    /// last point.
    pub fn clip_start(&mut self, distance: f64) {
        self.reverse();
        self.clip_end(distance);
        self.reverse();
    }

    /// Extends the end by `distance` along the direction of the last segment.
    pub fn extend_end(&mut self, distance: f64) {
        let n = self.points.len();
        if n < 2 {
            return;
        }
        let seg = Line::new(self.points[n - 2], self.points[n - 1]);
        let len = seg.length();
        self.points[n - 1] = seg.point_at(len + distance);
    }

    /// Closest point on the polyline to `p` and the index of the segment it lies on.
    #[must_use]
    pub fn project(&self, p: &Point) -> Option<(Point, usize)> {
        if self.points.len() == 1 {
            return Some((self.points[0], 0));
        }
        self.lines()
            .iter()
            .enumerate()
            .map(|(i, l)| (l.projection(p), i))
            .min_by(|(a, _), (b, _)| p.distance_to_sq(a).total_cmp(&p.distance_to_sq(b)))
    }

    /// Drops consecutive points closer than `tolerance`.
    pub fn remove_duplicate_points(&mut self, tolerance: f64) {
        let mut kept: Vec<Point> = Vec::with_capacity(self.points.len());
        for &p in &self.points {
            if kept.last().is_some_and(|q| q.distance_to(&p) <= tolerance) {
                continue;
            }
            kept.push(p);
        }
        self.points = kept;
    }
}

impl From<Vec<Point>> for Polyline {
    fn from(points: Vec<Point>) -> Self {
        Self::new(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ell() -> Polyline {
        Polyline::new(vec![Point::new(0, 0), Point::new(100, 0), Point::new(100, 100)])
    }

    #[test]
    fn length_sums_segments() {
        assert!((ell().length() - 200.0).abs() < 1e-9);
    }

    #[test]
    fn clip_end_within_last_segment() {
        let mut pl = ell();
        pl.clip_end(30.0);
        assert_eq!(pl.last_point(), Point::new(100, 70));
        assert!((pl.length() - 170.0).abs() < 1e-9);
    }

    #[test]
    fn clip_end_across_segments() {
        let mut pl = ell();
        pl.clip_end(150.0);
        assert_eq!(pl.points, vec![Point::new(0, 0), Point::new(50, 0)]);
    }

    #[test]
    fn clip_start_and_overlong_clip() {
        let mut pl = ell();
        pl.clip_start(40.0);
        assert_eq!(pl.first_point(), Point::new(40, 0));
        pl.clip_end(1000.0);
        assert!(!pl.is_valid());
        assert_eq!(pl.points, vec![Point::new(40, 0)]);
    }

    #[test]
    fn clip_shorter_polyline_than_cut_keeps_one_point() {
        let mut head = Polyline::new(vec![Point::new(0, 0), Point::new(8, 0)]);
        head.clip_end(12_500.0);
        assert_eq!(head.points, vec![Point::new(0, 0)]);
        assert_eq!(head.last_point(), Point::new(0, 0));

        let mut tail = Polyline::new(vec![Point::new(0, 0), Point::new(8, 0)]);
        tail.clip_start(12_500.0);
        assert_eq!(tail.points, vec![Point::new(8, 0)]);

        let mut exact = ell();
        exact.clip_start(200.0);
        assert_eq!(exact.points, vec![Point::new(100, 100)]);
    }

    #[test]
    fn project_picks_nearest_segment() {
        let (p, idx) = ell().project(&Point::new(120, 60)).unwrap_or_else(|| panic!("empty"));
        assert_eq!(p, Point::new(100, 60));
        assert_eq!(idx, 1);
    }
}
