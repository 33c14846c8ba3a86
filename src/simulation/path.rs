use super::{Approach, Point, TurnIntent, Vec2};
use std::collections::HashMap;

/// Floor for path lengths so progress conversion never divides by zero.
pub const MIN_PATH_LENGTH: f32 = 1e-3;
pub const DEFAULT_LENGTH_SAMPLES: usize = 10;
/// Progress step used to sample the tangent for headings.
pub const HEADING_EPSILON: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Straight,
    Turn,
}

/// A travel path: a straight segment, or a cubic Bézier when both control
/// points are present.
///
/// A turn may carry straight lead-in and lead-out legs: the car runs
/// `start -> entry` in a line, curves from `entry` to `exit`, then runs
/// `exit -> end` in a line. Progress `t` is spread over the legs by length,
/// and over the curve by sampled arc length, so a constant speed covers
/// about the same distance per tick everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Path {
    pub start: Point,
    pub end: Point,
    pub control1: Option<Point>,
    pub control2: Option<Point>,
    /// Where the curve begins; equal to `start` without a lead-in.
    pub entry: Point,
    /// Where the curve ends; equal to `end` without a lead-out.
    pub exit: Point,
}

impl Path {
    pub fn straight(start: Point, end: Point) -> Self {
        Self {
            start,
            end,
            control1: None,
            control2: None,
            entry: start,
            exit: end,
        }
    }

    pub fn curve(start: Point, control1: Point, control2: Point, end: Point) -> Self {
        Self::turn(start, start, control1, control2, end, end)
    }

    /// Straight to `entry`, Bézier to `exit`, straight to `end`.
    pub fn turn(start: Point, entry: Point, control1: Point, control2: Point, exit: Point, end: Point) -> Self {
        Self {
            start,
            end,
            control1: Some(control1),
            control2: Some(control2),
            entry,
            exit,
        }
    }

    pub fn kind(&self) -> PathKind {
        match (self.control1, self.control2) {
            (Some(_), Some(_)) => PathKind::Turn,
            _ => PathKind::Straight,
        }
    }

    /// Point on the curved leg alone, `u` in [0, 1].
    fn bezier_at(&self, c1: Point, c2: Point, u: f32) -> Point {
        let v = 1.0 - u;
        let b0 = v * v * v;
        let b1 = 3.0 * v * v * u;
        let b2 = 3.0 * v * u * u;
        let b3 = u * u * u;
        Point::from(self.entry.coords * b0 + c1.coords * b1 + c2.coords * b2 + self.exit.coords * b3)
    }

    fn bezier_length(&self, c1: Point, c2: Point, samples: usize) -> f32 {
        let samples = samples.max(1);
        let mut length = 0.0;
        let mut last = self.entry;
        for i in 1..=samples {
            let point = self.bezier_at(c1, c2, i as f32 / samples as f32);
            length += (point - last).magnitude();
            last = point;
        }
        length
    }

    /// Curve parameter lying `distance` along the curved leg, read off the
    /// sampled polyline so equal distances map to equal travel.
    fn bezier_param_at(&self, c1: Point, c2: Point, distance: f32, samples: usize) -> f32 {
        let samples = samples.max(1);
        let mut walked = 0.0;
        let mut last = self.entry;
        for i in 1..=samples {
            let point = self.bezier_at(c1, c2, i as f32 / samples as f32);
            let step = (point - last).magnitude();
            if step > 0.0 && walked + step >= distance {
                let within = ((distance - walked) / step).clamp(0.0, 1.0);
                return ((i - 1) as f32 + within) / samples as f32;
            }
            walked += step;
            last = point;
        }
        1.0
    }

    /// Lengths of the lead-in, curve and lead-out legs.
    fn leg_lengths(&self, c1: Point, c2: Point, samples: usize) -> [f32; 3] {
        [
            (self.entry - self.start).magnitude(),
            self.bezier_length(c1, c2, samples),
            (self.end - self.exit).magnitude(),
        ]
    }

    pub fn position_at(&self, t: f32) -> Point {
        let (Some(c1), Some(c2)) = (self.control1, self.control2) else {
            return self.start + (self.end - self.start) * t;
        };

        let [lead_in, curve, lead_out] = self.leg_lengths(c1, c2, DEFAULT_LENGTH_SAMPLES);
        let total = lead_in + curve + lead_out;
        if total <= MIN_PATH_LENGTH {
            return self.start;
        }

        let along = t.clamp(0.0, 1.0) * total;
        if along < lead_in {
            self.start + (self.entry - self.start) * (along / lead_in)
        } else if along <= lead_in + curve && curve > 0.0 {
            let u = self.bezier_param_at(c1, c2, along - lead_in, DEFAULT_LENGTH_SAMPLES);
            self.bezier_at(c1, c2, u)
        } else if lead_out > 0.0 {
            let past = (along - lead_in - curve).max(0.0);
            self.exit + (self.end - self.exit) * (past / lead_out).min(1.0)
        } else {
            self.end
        }
    }

    /// Sum of the leg lengths, with the curve as a polyline over `samples`
    /// uniform steps.
    pub fn estimate_length_with(&self, samples: usize) -> f32 {
        let length = match (self.control1, self.control2) {
            (Some(c1), Some(c2)) => self.leg_lengths(c1, c2, samples).iter().sum(),
            _ => (self.end - self.start).magnitude(),
        };
        length.max(MIN_PATH_LENGTH)
    }

    pub fn estimate_length(&self) -> f32 {
        self.estimate_length_with(DEFAULT_LENGTH_SAMPLES)
    }

    /// Direction of travel at `t`, recomputed from the tangent each call.
    pub fn direction_at(&self, t: f32) -> Option<Vec2> {
        let t = t.clamp(0.0, 1.0);
        let here = self.position_at(t);
        let ahead = self.position_at((t + HEADING_EPSILON).min(1.0)) - here;
        if ahead.magnitude_squared() > f32::EPSILON {
            return Some(ahead);
        }

        // At the very end of the path the forward sample collapses.
        let behind = here - self.position_at((t - HEADING_EPSILON).max(0.0));
        if behind.magnitude_squared() > f32::EPSILON {
            Some(behind)
        } else {
            None
        }
    }

    /// Heading in radians at `t`; zero for degenerate paths.
    pub fn heading_at(&self, t: f32) -> f32 {
        self.direction_at(t).map(|d| d.y.atan2(d.x)).unwrap_or(0.0)
    }
}

/// Identity of a registered route; cars on the same key share a lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub approach: Approach,
    pub intent: TurnIntent,
}

/// Fixed mapping from (approach, turn intent) to a path.
#[derive(Debug, Clone, Default)]
pub struct PathRegistry {
    paths: HashMap<RouteKey, Path>,
}

impl PathRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, approach: Approach, intent: TurnIntent, path: Path) {
        self.paths.insert(RouteKey { approach, intent }, path);
    }

    pub fn get(&self, approach: Approach, intent: TurnIntent) -> Option<&Path> {
        self.paths.get(&RouteKey { approach, intent })
    }

    /// Resolves a route, falling back to the straight-through lane when the
    /// turn is not registered.
    pub fn resolve(&self, approach: Approach, intent: TurnIntent) -> Option<(RouteKey, Path)> {
        if let Some(path) = self.get(approach, intent) {
            return Some((RouteKey { approach, intent }, *path));
        }

        if intent != TurnIntent::Straight {
            log::debug!("No {:?} path registered for {}, using straight lane", intent, approach);
        }

        let fallback = RouteKey { approach, intent: TurnIntent::Straight };
        match self.paths.get(&fallback) {
            Some(path) => Some((fallback, *path)),
            None => {
                log::warn!("No straight path registered for {}", approach);
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RouteKey, &Path)> {
        self.paths.iter()
    }
}
