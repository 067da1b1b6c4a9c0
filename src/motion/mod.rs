//! Travel moves that keep clear of printed islands.
//!
//! A move is a straight segment whenever that does not cross an island it
//! neither starts nor ends in. Otherwise it is routed through a visibility
//! graph over either the shared island (shrunk by a margin) or the space
//! around all islands (kept a margin away from them). Graphs are built on
//! first use and kept for the life of the planner.

mod env;
mod graph;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::geometry::{ExPolygon, Line, Point, Polyline};

use env::{outer_island, Environment};

/// Margins used when building travel environments, in millimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionPlannerConfig {
    /// How far routes inside an island stay from its boundary.
    pub inner_margin_mm: f64,
    /// How far routes between islands stay from them.
    pub outer_margin_mm: f64,
    /// Douglas-Peucker tolerance applied to environment boundaries.
    pub simplify_tolerance_mm: f64,
}

impl Default for MotionPlannerConfig {
    fn default() -> Self {
        Self {
            inner_margin_mm: 1.0,
            outer_margin_mm: 2.0,
            simplify_tolerance_mm: 0.1,
        }
    }
}

impl MotionPlannerConfig {
    #[must_use]
    pub fn with_margins(mut self, inner_mm: f64, outer_mm: f64) -> Self {
        self.inner_margin_mm = inner_mm;
        self.outer_margin_mm = outer_mm;
        self
    }

    #[must_use]
    pub fn with_simplify_tolerance(mut self, tolerance_mm: f64) -> Self {
        self.simplify_tolerance_mm = tolerance_mm;
        self
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a margin that is not positive or
    /// a negative tolerance.
    pub fn validate(&self) -> Result<()> {
        for (parameter, value) in [
            ("inner_margin_mm", self.inner_margin_mm),
            ("outer_margin_mm", self.outer_margin_mm),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::Invalid {
                    parameter,
                    reason: format!("{value} must be positive"),
                }
                .into());
            }
        }
        if self.simplify_tolerance_mm < 0.0 {
            return Err(ConfigError::Invalid {
                parameter: "simplify_tolerance_mm",
                reason: format!("{} is negative", self.simplify_tolerance_mm),
            }
            .into());
        }
        Ok(())
    }
}

/// Space outside every island.
#[derive(Debug, Clone)]
struct Outside {
    /// Frame minus the islands, guarding moves that start between islands.
    guard: Vec<ExPolygon>,
    env: Environment,
}

/// Plans travel moves over one layer's islands.
#[derive(Debug, Clone)]
pub struct MotionPlanner {
    config: MotionPlannerConfig,
    islands: Vec<ExPolygon>,
    inside: Vec<Option<Environment>>,
    outside: Option<Outside>,
}

impl MotionPlanner {
    #[must_use]
    pub fn new(islands: Vec<ExPolygon>) -> Self {
        let inside = vec![None; islands.len()];
        Self {
            config: MotionPlannerConfig::default(),
            islands,
            inside,
            outside: None,
        }
    }

    /// Replaces the margins, dropping any environment built so far.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `config` fails
    /// [`MotionPlannerConfig::validate`].
    pub fn with_config(mut self, config: MotionPlannerConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        self.inside = vec![None; self.islands.len()];
        self.outside = None;
        Ok(self)
    }

    #[must_use]
    pub fn islands(&self) -> &[ExPolygon] {
        &self.islands
    }

    /// Travel path from `from` to `to`.
    ///
    /// Falls back to the direct segment when the relevant environment is
    /// empty or has no route.
    pub fn shortest_path(&mut self, from: &Point, to: &Point) -> Polyline {
        let direct = Polyline::new(vec![*from, *to]);
        if self.islands.is_empty() {
            return direct;
        }

        // Step 1: locate the endpoints.
        let from_island = self.island_containing(from);
        let to_island = self.island_containing(to);

        // Step 2: same island, or nothing in the way.
        if let (Some(a), Some(b)) = (from_island, to_island) {
            if a == b {
                if self.islands[a].contains_segment(from, to) {
                    return direct;
                }
                return self.route_inside(a, from, to).unwrap_or(direct);
            }
        }
        if !self.crosses_obstacle(from, to, [from_island, to_island]) {
            return direct;
        }

        // Step 3: go around the islands.
        self.route_outside(from, to, from_island, to_island).unwrap_or(direct)
    }

    fn island_containing(&self, p: &Point) -> Option<usize> {
        self.islands.iter().position(|island| island.contains(p))
    }

    /// Whether the segment crosses an island it should not.
    ///
    /// The islands in `ends` may be left or entered once. Any other island
    /// may not be touched at all.
    fn crosses_obstacle(&self, from: &Point, to: &Point, ends: [Option<usize>; 2]) -> bool {
        let segment = Line::new(*from, *to);
        self.islands.iter().enumerate().any(|(i, island)| {
            if ends.contains(&Some(i)) {
                inside_runs(island, &segment) > 1
            } else {
                island.lines().iter().any(|edge| edge.intersection(&segment).is_some())
            }
        })
    }

    fn route_inside(&mut self, island: usize, from: &Point, to: &Point) -> Option<Polyline> {
        if self.inside[island].is_none() {
            debug!(island, "building island travel environment");
            self.inside[island] = Some(Environment::inside(&self.islands[island], &self.config));
        }
        let env = self.inside[island].as_ref()?;
        let guard = std::slice::from_ref(&self.islands[island]);
        connect(env, from, to, guard, guard)
    }

    fn route_outside(
        &mut self,
        from: &Point,
        to: &Point,
        from_island: Option<usize>,
        to_island: Option<usize>,
    ) -> Option<Polyline> {
        if self.outside.is_none() {
            debug!(islands = self.islands.len(), "building outer travel environment");
            self.outside = Some(Outside {
                guard: outer_island(&self.islands, &self.config),
                env: Environment::around(&self.islands, &self.config),
            });
        }
        let outside = self.outside.as_ref()?;
        let guard_of = |island: Option<usize>| match island {
            Some(i) => std::slice::from_ref(&self.islands[i]),
            None => outside.guard.as_slice(),
        };
        connect(&outside.env, from, to, guard_of(from_island), guard_of(to_island))
    }
}

/// Number of separate stretches of `segment` that lie inside `island`.
fn inside_runs(island: &ExPolygon, segment: &Line) -> usize {
    let len = segment.length();
    if len < 1.0 {
        return usize::from(island.contains(&segment.a));
    }
    let mut cuts: Vec<f64> = island
        .lines()
        .iter()
        .filter_map(|edge| edge.intersection(segment))
        .map(|p| segment.a.distance_to(&p))
        .collect();
    cuts.push(0.0);
    cuts.push(len);
    cuts.sort_by(f64::total_cmp);

    let mut runs = 0;
    let mut inside = false;
    for w in cuts.windows(2) {
        if w[1] - w[0] < 1.0 {
            continue;
        }
        let now = island.contains(&segment.point_at((w[0] + w[1]) / 2.0));
        if now && !inside {
            runs += 1;
        }
        inside = now;
    }
    runs
}

/// Joins both endpoints to `env` and routes between the joins.
fn connect(env: &Environment, from: &Point, to: &Point, from_guard: &[ExPolygon], to_guard: &[ExPolygon]) -> Option<Polyline> {
    if env.is_empty() {
        debug!("travel environment is empty, moving straight");
        return None;
    }
    let start = env.entry_point(from, to, from_guard)?;
    let end = env.entry_point(to, from, to_guard)?;
    let Some(route) = env.route(start, end) else {
        debug!(?from, ?to, "no travel route, moving straight");
        return None;
    };

    let mut points = Vec::with_capacity(route.len() + 2);
    if start != *from {
        points.push(*from);
    }
    points.extend(route);
    if end != *to {
        points.push(*to);
    }
    let mut path = Polyline::new(points);
    path.remove_duplicate_points(0.0);
    debug!(points = path.points.len(), "travel route planned");
    Some(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::LayerpathError;
    use crate::geometry::Polygon;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> ExPolygon {
        ExPolygon::new(Polygon::rectangle_mm(x0, y0, x1, y1), Vec::new())
    }

    fn u_island() -> ExPolygon {
        let points = [
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (7.0, 10.0),
            (7.0, 3.0),
            (3.0, 3.0),
            (3.0, 10.0),
            (0.0, 10.0),
        ];
        ExPolygon::new(
            Polygon::new(points.iter().map(|&(x, y)| Point::new_scale(x, y)).collect()),
            Vec::new(),
        )
    }

    #[test]
    fn no_islands_moves_straight() {
        let mut planner = MotionPlanner::new(Vec::new());
        let (a, b) = (Point::new_scale(0.0, 0.0), Point::new_scale(5.0, 5.0));
        assert_eq!(planner.shortest_path(&a, &b).points, vec![a, b]);
    }

    #[test]
    fn distant_islands_with_a_clear_line_move_straight() {
        let mut planner = MotionPlanner::new(vec![rect(0.0, 0.0, 10.0, 10.0), rect(60.0, 0.0, 70.0, 10.0)]);
        let (a, b) = (Point::new_scale(5.0, 5.0), Point::new_scale(65.0, 5.0));
        assert_eq!(planner.shortest_path(&a, &b).points, vec![a, b]);
        assert!(planner.outside.is_none());
        assert!(planner.inside.iter().all(Option::is_none));
    }

    #[test]
    fn obstacle_between_islands_is_avoided() {
        let obstacle = rect(20.0, -5.0, 30.0, 15.0);
        let mut planner = MotionPlanner::new(vec![
            rect(0.0, 0.0, 10.0, 10.0),
            obstacle.clone(),
            rect(40.0, 0.0, 50.0, 10.0),
        ]);
        let (a, b) = (Point::new_scale(5.0, 5.0), Point::new_scale(45.0, 5.0));
        let path = planner.shortest_path(&a, &b);
        assert_eq!(path.first_point(), a);
        assert_eq!(path.last_point(), b);
        assert!(path.points.len() >= 4);
        assert!(path.length() > a.distance_to(&b));
        for line in path.lines() {
            assert!(obstacle.lines().iter().all(|edge| edge.intersection(&line).is_none()));
        }
        assert!(planner.outside.is_some());
    }

    #[test]
    fn concave_island_is_routed_inside() {
        let island = u_island();
        let mut planner = MotionPlanner::new(vec![island.clone()]);
        let (a, b) = (Point::new_scale(1.5, 9.0), Point::new_scale(8.5, 9.0));
        let path = planner.shortest_path(&a, &b);
        assert_eq!(path.first_point(), a);
        assert_eq!(path.last_point(), b);
        assert!(path.points.len() >= 4);
        for line in path.lines() {
            assert!(island.contains_segment(&line.a, &line.b));
        }
        assert!(planner.inside[0].is_some());
        assert!(planner.outside.is_none());
    }

    #[test]
    fn straight_move_within_an_island() {
        let mut planner = MotionPlanner::new(vec![u_island()]);
        let (a, b) = (Point::new_scale(1.0, 1.0), Point::new_scale(9.0, 1.0));
        assert_eq!(planner.shortest_path(&a, &b).points, vec![a, b]);
        assert!(planner.inside[0].is_none());
    }

    #[test]
    fn config_validation() {
        assert!(MotionPlannerConfig::default().validate().is_ok());
        assert!(MotionPlannerConfig::default().with_margins(0.0, 2.0).validate().is_err());
        assert!(MotionPlannerConfig::default().with_simplify_tolerance(-1.0).validate().is_err());
    }

    #[test]
    fn invalid_config_is_rejected_by_the_planner() {
        let planner = MotionPlanner::new(vec![u_island()]);
        let negative = MotionPlannerConfig::default().with_margins(-1.0, 2.0);
        assert!(matches!(
            planner.clone().with_config(negative),
            Err(LayerpathError::Config(ConfigError::Invalid {
                parameter: "inner_margin_mm",
                ..
            }))
        ));
        let planner = planner.with_config(MotionPlannerConfig::default().with_margins(0.5, 1.0)).unwrap();
        assert!((planner.config.inner_margin_mm - 0.5).abs() < 1e-12);
    }

    #[test]
    fn leaving_a_concave_island_across_its_own_arm_is_routed() {
        let u = u_island();
        let mut planner = MotionPlanner::new(vec![u.clone(), rect(20.0, 0.0, 30.0, 10.0)]);
        let (a, b) = (Point::new_scale(1.5, 9.0), Point::new_scale(25.0, 9.0));
        let path = planner.shortest_path(&a, &b);
        assert_ne!(path.points, vec![a, b]);
        assert_eq!(path.first_point(), a);
        assert_eq!(path.last_point(), b);
        let right_arm = Line::new(Point::new_scale(10.0, 0.0), Point::new_scale(10.0, 10.0));
        for line in path.lines() {
            assert!(line.intersection(&right_arm).is_none());
        }
        assert!(planner.outside.is_some());
    }

    #[test]
    fn leaving_one_island_and_entering_another_moves_straight() {
        let mut planner = MotionPlanner::new(vec![u_island(), rect(20.0, 0.0, 30.0, 10.0)]);
        let (a, b) = (Point::new_scale(1.5, 1.0), Point::new_scale(25.0, 5.0));
        assert_eq!(planner.shortest_path(&a, &b).points, vec![a, b]);
        assert!(planner.outside.is_none());
    }

    #[test]
    fn comb_island_is_not_crossed_over_its_notches() {
        let points = [
            (0.0, 0.0),
            (13.0, 0.0),
            (13.0, 10.0),
            (10.0, 10.0),
            (10.0, 3.0),
            (8.0, 3.0),
            (8.0, 10.0),
            (5.0, 10.0),
            (5.0, 3.0),
            (3.0, 3.0),
            (3.0, 10.0),
            (0.0, 10.0),
        ];
        let comb = ExPolygon::new(
            Polygon::new(points.iter().map(|&(x, y)| Point::new_scale(x, y)).collect()),
            Vec::new(),
        );
        let mut planner = MotionPlanner::new(vec![comb.clone()]);
        let (a, b) = (Point::new_scale(1.5, 9.5), Point::new_scale(11.5, 9.5));
        let path = planner.shortest_path(&a, &b);
        assert_eq!(path.first_point(), a);
        assert_eq!(path.last_point(), b);
        for line in path.lines() {
            assert!(comb.contains_segment(&line.a, &line.b));
        }
        assert!(path.points.iter().any(|p| p.y < Point::new_scale(0.0, 5.0).y));
    }
}
