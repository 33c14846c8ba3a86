use super::{Approach, CarId, Path, Point, RouteKey, TrafficEvents, TrafficWorld};
use crate::config::TrafficConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarState {
    Traveling,
    StoppedAtLight,
    Completed,
    Collided,
}

impl CarState {
    pub fn is_terminal(self) -> bool {
        matches!(self, CarState::Completed | CarState::Collided)
    }
}

/// Stopping, following and wait-reporting rules shared by every car.
#[derive(Debug, Clone)]
pub struct DrivingRules {
    pub look_ahead: f32,
    pub min_following_gap: f32,
    pub oncoming_clearance: f32,
    pub acceleration: f32,
    pub report_interval_ms: f32,
    pub critical_wait_ms: f32,
}

impl From<&TrafficConfig> for DrivingRules {
    fn from(config: &TrafficConfig) -> Self {
        Self {
            look_ahead: config.stopping.look_ahead,
            min_following_gap: config.stopping.min_following_gap,
            oncoming_clearance: config.stopping.oncoming_clearance,
            acceleration: config.cars.acceleration,
            report_interval_ms: config.waiting.report_interval_ms,
            critical_wait_ms: config.waiting.critical_wait_ms,
        }
    }
}

impl Default for DrivingRules {
    fn default() -> Self {
        Self::from(&TrafficConfig::default())
    }
}

/// The nearest car ahead in the same lane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leader {
    pub gap: f32,
    pub speed: f32,
}

#[derive(Debug, Clone)]
pub struct Car {
    pub id: CarId,
    pub approach: Approach,
    pub route: Option<RouteKey>,
    pub path: Option<Path>,
    pub position: Point,
    /// Length along the heading.
    pub width: f32,
    pub height: f32,
    pub color: String,
    pub max_speed: f32,
    pub current_speed: f32,
    pub state: CarState,
    /// Set by the manager while oncoming traffic has right of way over this
    /// car's turn.
    pub giving_way: bool,
    /// Progress along `path`, never decreasing, clamped to 1.
    pub t: f32,
    pub wait_time: f32,
    last_wait_report: f32,
    critical_reported: bool,
    /// Time spent as a wreck, drives removal after the crash effect.
    pub collided_for: f32,
    pub spawned_at: f32,
    pub completed_at: Option<f32>,
}

impl Car {
    pub fn new(id: CarId, approach: Approach, position: Point, width: f32, height: f32, speed: f32) -> Self {
        Self {
            id,
            approach,
            route: None,
            path: None,
            position,
            width,
            height,
            color: String::from("#e74c3c"),
            max_speed: speed,
            current_speed: speed,
            state: CarState::Traveling,
            giving_way: false,
            t: 0.0,
            wait_time: 0.0,
            last_wait_report: 0.0,
            critical_reported: false,
            collided_for: 0.0,
            spawned_at: 0.0,
            completed_at: None,
        }
    }

    /// Pool filler, overwritten by [`Car::reset`] before use.
    pub fn placeholder() -> Self {
        Self::new(CarId(0), Approach::North, Point::new(-1.0, -1.0), 20.0, 10.0, 0.0)
    }

    /// Reinitialises a pooled car in place.
    pub fn reset(&mut self, id: CarId, approach: Approach, position: Point, speed: f32) {
        self.id = id;
        self.approach = approach;
        self.route = None;
        self.path = None;
        self.position = position;
        self.max_speed = speed;
        self.current_speed = speed;
        self.state = CarState::Traveling;
        self.giving_way = false;
        self.t = 0.0;
        self.wait_time = 0.0;
        self.last_wait_report = 0.0;
        self.critical_reported = false;
        self.collided_for = 0.0;
        self.spawned_at = 0.0;
        self.completed_at = None;
    }

    pub fn assign_route(&mut self, route: RouteKey, path: Path) {
        self.route = Some(route);
        self.path = Some(path);
        self.t = 0.0;
        self.position = path.start;
    }

    pub fn is_stopped(&self) -> bool {
        self.state == CarState::StoppedAtLight
    }

    pub fn is_collided(&self) -> bool {
        self.state == CarState::Collided
    }

    pub fn is_completed(&self) -> bool {
        self.state == CarState::Completed
    }

    pub fn mark_collided(&mut self) {
        self.state = CarState::Collided;
        self.current_speed = 0.0;
    }

    /// Radians, from the path tangent at the current progress.
    pub fn heading(&self) -> f32 {
        self.path.map(|p| p.heading_at(self.t)).unwrap_or(0.0)
    }

    /// Corners of the car's rectangle rotated to its heading.
    pub fn corners(&self) -> [Point; 4] {
        let (sin, cos) = self.heading().sin_cos();
        let half_width = self.width / 2.0;
        let half_height = self.height / 2.0;
        let (x, y) = (self.position.x, self.position.y);

        [
            Point::new(x + cos * half_width - sin * half_height, y + sin * half_width + cos * half_height),
            Point::new(x + cos * half_width + sin * half_height, y + sin * half_width - cos * half_height),
            Point::new(x - cos * half_width + sin * half_height, y - sin * half_width - cos * half_height),
            Point::new(x - cos * half_width - sin * half_height, y - sin * half_width + cos * half_height),
        ]
    }

    /// Signed distance to the stop line of this car's approach; positive while
    /// the line is still ahead.
    pub fn distance_to_stop_line<W: TrafficWorld + ?Sized>(&self, world: &W) -> f32 {
        let half = world.road_width() / 2.0;
        let center = world.center();
        match self.approach {
            Approach::North => (center.y - half) - self.position.y,
            Approach::South => self.position.y - (center.y + half),
            Approach::East => self.position.x - (center.x + half),
            Approach::West => (center.x - half) - self.position.x,
        }
    }

    /// Outside the box and no further than `look_ahead` before the stop line.
    pub fn approaching_stop_line<W: TrafficWorld + ?Sized>(&self, world: &W, rules: &DrivingRules) -> bool {
        // Never stop once committed to the crossing.
        if world.in_intersection(self.position) {
            return false;
        }

        let distance = self.distance_to_stop_line(world);
        (0.0..=rules.look_ahead).contains(&distance)
    }

    /// Whether the light for this approach holds the car this tick.
    pub fn held_by_light<W: TrafficWorld + ?Sized>(&self, world: &W, rules: &DrivingRules) -> bool {
        world.light_state(self.approach).requires_stop() && self.approaching_stop_line(world, rules)
    }

    /// Whether the car waits at the stop line for oncoming traffic.
    pub fn held_for_oncoming<W: TrafficWorld + ?Sized>(&self, world: &W, rules: &DrivingRules) -> bool {
        self.giving_way && self.approaching_stop_line(world, rules)
    }

    /// Advances the car by one tick and reports its state afterwards.
    ///
    /// Collided cars only age their wreck timer. A car without a path does
    /// nothing. Speed for the tick is settled before moving, so a car held at
    /// a light or giving way never advances `t`.
    pub fn update<W, E>(
        &mut self,
        dt: f32,
        now: f32,
        world: &W,
        leader: Option<Leader>,
        rules: &DrivingRules,
        events: &mut E,
    ) -> CarState
    where
        W: TrafficWorld + ?Sized,
        E: TrafficEvents + ?Sized,
    {
        match self.state {
            CarState::Collided => {
                self.collided_for += dt;
                return self.state;
            }
            CarState::Completed => return self.state,
            _ => {}
        }

        let Some(path) = self.path else {
            return self.state;
        };

        if self.t >= 1.0 {
            self.state = CarState::Completed;
            self.current_speed = 0.0;
            self.completed_at = Some(now);
            events.on_wait_cleared(self.id);
            return self.state;
        }

        let blocked_ahead = leader
            .map(|l| rules.min_following_gap > 0.0 && l.gap < rules.min_following_gap)
            .unwrap_or(false);
        let queued = blocked_ahead && leader.map(|l| l.speed <= 0.0).unwrap_or(false);

        if self.held_by_light(world, rules) || self.held_for_oncoming(world, rules) || queued {
            self.hold(dt, rules, events);
        } else {
            self.release(dt, rules, events);
            if blocked_ahead {
                if let Some(leader) = leader {
                    self.current_speed = self.current_speed.min(leader.speed);
                }
            }
        }

        if self.current_speed > 0.0 {
            let length = path.estimate_length();
            self.t = (self.t + self.current_speed * dt / length).min(1.0);
            self.position = path.position_at(self.t);
        }

        self.state
    }

    fn hold<E: TrafficEvents + ?Sized>(&mut self, dt: f32, rules: &DrivingRules, events: &mut E) {
        self.state = CarState::StoppedAtLight;
        self.current_speed = 0.0;
        self.wait_time += dt;

        if !self.critical_reported && self.wait_time >= rules.critical_wait_ms {
            self.critical_reported = true;
            self.last_wait_report = self.wait_time;
            events.on_wait_time_update(self.id, self.wait_time);
            events.on_critical_wait(self.id, self.wait_time);
            log::debug!("Car {} reached critical wait of {:.0}ms", self.id, self.wait_time);
        } else if self.wait_time - self.last_wait_report >= rules.report_interval_ms {
            self.last_wait_report = self.wait_time;
            events.on_wait_time_update(self.id, self.wait_time);
        }
    }

    fn release<E: TrafficEvents + ?Sized>(&mut self, dt: f32, rules: &DrivingRules, events: &mut E) {
        if self.state == CarState::StoppedAtLight {
            self.state = CarState::Traveling;
            self.wait_time = 0.0;
            self.last_wait_report = 0.0;
            self.critical_reported = false;
            events.on_wait_cleared(self.id);
        }

        self.current_speed = (self.current_speed + rules.acceleration * dt).min(self.max_speed);
    }

    /// Time from spawn to completion, once completed.
    pub fn trip_time(&self) -> Option<f32> {
        self.completed_at.map(|done| done - self.spawned_at)
    }
}
