use super::{Approach, LightState, Path, PathRegistry, Point, SignalController, TrafficWorld, TurnIntent};
use crate::config::IntersectionConfig;

/// Side length of a light's clickable square.
pub const LIGHT_SIZE: f32 = 20.0;

/// A single four-way crossing centred on the canvas.
///
/// Owns the signal controller and the path registry. Lanes run through the
/// centre offset by half a lane width, one lane per direction of travel,
/// each on the right-hand side of its road.
#[derive(Debug, Clone)]
pub struct Intersection {
    pub width: f32,
    pub height: f32,
    pub center: Point,
    pub road_width: f32,
    pub lane_width: f32,
    pub turn_paths: bool,
    pub signals: SignalController,
    paths: PathRegistry,
}

impl Intersection {
    pub fn new(config: &IntersectionConfig) -> Self {
        let geometry = &config.geometry;
        let mut intersection = Self {
            width: geometry.width,
            height: geometry.height,
            center: Point::new(geometry.width / 2.0, geometry.height / 2.0),
            road_width: geometry.road_width,
            lane_width: geometry.road_width / 2.0,
            turn_paths: geometry.turn_paths,
            signals: SignalController::new(&config.signals),
            paths: PathRegistry::new(),
        };
        intersection.build_paths();
        intersection
    }

    /// Recentres on a new canvas size and rebuilds every lane.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        self.center = Point::new(width / 2.0, height / 2.0);
        self.build_paths();
        log::debug!("Intersection resized to {}x{}", width, height);
    }

    pub fn reset(&mut self) {
        self.signals.reset();
    }

    pub fn tick(&mut self, dt: f32) {
        self.signals.tick(dt);
    }

    pub fn toggle_light(&mut self, approach: Approach) -> LightState {
        self.signals.toggle(approach)
    }

    pub fn paths(&self) -> &PathRegistry {
        &self.paths
    }

    /// Centre of the light controlling `approach`.
    pub fn light_position(&self, approach: Approach) -> Point {
        let offset = self.road_width;
        match approach {
            Approach::North => Point::new(self.center.x, self.center.y - offset),
            Approach::East => Point::new(self.center.x + offset, self.center.y),
            Approach::South => Point::new(self.center.x, self.center.y + offset),
            Approach::West => Point::new(self.center.x - offset, self.center.y),
        }
    }

    /// Which light, if any, covers the given canvas point.
    pub fn light_at(&self, point: Point) -> Option<Approach> {
        let half = LIGHT_SIZE / 2.0;
        Approach::ALL.into_iter().find(|approach| {
            let light = self.light_position(*approach);
            (point.x - light.x).abs() <= half && (point.y - light.y).abs() <= half
        })
    }

    fn build_paths(&mut self) {
        let mut paths = PathRegistry::new();
        for approach in Approach::ALL {
            paths.register(approach, TurnIntent::Straight, self.straight_lane(approach));
            if self.turn_paths {
                for intent in [TurnIntent::Right, TurnIntent::Left] {
                    paths.register(approach, intent, self.turn_lane(approach, intent));
                }
            }
        }
        self.paths = paths;
    }

    // Lane centre lines, named by direction of travel.
    fn southbound_x(&self) -> f32 {
        self.center.x - self.lane_width / 2.0
    }

    fn northbound_x(&self) -> f32 {
        self.center.x + self.lane_width / 2.0
    }

    fn westbound_y(&self) -> f32 {
        self.center.y - self.lane_width / 2.0
    }

    fn eastbound_y(&self) -> f32 {
        self.center.y + self.lane_width / 2.0
    }

    fn lane_start(&self, approach: Approach) -> Point {
        match approach {
            Approach::North => Point::new(self.southbound_x(), 0.0),
            Approach::South => Point::new(self.northbound_x(), self.height),
            Approach::East => Point::new(self.width, self.westbound_y()),
            Approach::West => Point::new(0.0, self.eastbound_y()),
        }
    }

    /// Canvas edge where the lane leaving towards `heading` ends.
    fn lane_end(&self, heading: Approach) -> Point {
        match heading {
            Approach::North => Point::new(self.northbound_x(), 0.0),
            Approach::South => Point::new(self.southbound_x(), self.height),
            Approach::East => Point::new(self.width, self.eastbound_y()),
            Approach::West => Point::new(0.0, self.westbound_y()),
        }
    }

    fn straight_lane(&self, approach: Approach) -> Path {
        Path::straight(self.lane_start(approach), self.lane_end(approach.opposite()))
    }

    /// Where the lane entering from `approach` crosses its stop line.
    fn stop_line_point(&self, approach: Approach) -> Point {
        let half = self.road_width / 2.0;
        let start = self.lane_start(approach);
        match approach {
            Approach::North => Point::new(start.x, self.center.y - half),
            Approach::South => Point::new(start.x, self.center.y + half),
            Approach::East => Point::new(self.center.x + half, start.y),
            Approach::West => Point::new(self.center.x - half, start.y),
        }
    }

    /// Where the lane leaving towards `heading` crosses the box edge.
    fn box_exit_point(&self, heading: Approach) -> Point {
        let half = self.road_width / 2.0;
        let end = self.lane_end(heading);
        match heading {
            Approach::North => Point::new(end.x, self.center.y - half),
            Approach::South => Point::new(end.x, self.center.y + half),
            Approach::East => Point::new(self.center.x + half, end.y),
            Approach::West => Point::new(self.center.x - half, end.y),
        }
    }

    /// Runs the entry lane up to the stop line, curves inside the box only,
    /// and leaves along the exit lane.
    fn turn_lane(&self, approach: Approach, intent: TurnIntent) -> Path {
        let heading = exit_heading(approach, intent);
        let entry = self.stop_line_point(approach);
        let exit = self.box_exit_point(heading);

        // Both control points sit where the entry lane meets the exit lane,
        // so the curve leaves along one and arrives along the other.
        let corner = if approach.is_north_south() {
            Point::new(entry.x, exit.y)
        } else {
            Point::new(exit.x, entry.y)
        };

        Path::turn(self.lane_start(approach), entry, corner, corner, exit, self.lane_end(heading))
    }
}

/// Compass direction a car leaves towards after turning.
pub fn exit_heading(approach: Approach, intent: TurnIntent) -> Approach {
    match (approach, intent) {
        (_, TurnIntent::Straight) => approach.opposite(),
        (Approach::North, TurnIntent::Right) => Approach::West,
        (Approach::North, TurnIntent::Left) => Approach::East,
        (Approach::East, TurnIntent::Right) => Approach::North,
        (Approach::East, TurnIntent::Left) => Approach::South,
        (Approach::South, TurnIntent::Right) => Approach::East,
        (Approach::South, TurnIntent::Left) => Approach::West,
        (Approach::West, TurnIntent::Right) => Approach::South,
        (Approach::West, TurnIntent::Left) => Approach::North,
    }
}

impl Default for Intersection {
    fn default() -> Self {
        Self::new(&IntersectionConfig::default())
    }
}

impl TrafficWorld for Intersection {
    fn light_state(&self, approach: Approach) -> LightState {
        self.signals.state(approach)
    }

    fn road_width(&self) -> f32 {
        self.road_width
    }

    fn center(&self) -> Point {
        self.center
    }

    fn routes(&self) -> &PathRegistry {
        &self.paths
    }
}
