use super::{
    collision_pass, exit_heading, Approach, Car, CarId, CarState, DrivingRules, Leader, LightState, Point,
    TrafficEvents, TrafficWorld, TurnIntent, Vec2,
};
use crate::config::{CarParams, PathProbabilities, TrafficConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Shortest spawn interval accepted, in ms.
pub const MIN_SPAWN_RATE_MS: f32 = 1.0;

/// Stretch of road cars queue along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lane {
    /// Entry lane of an approach, through the box. Shared by every turn intent.
    Inbound(Approach),
    /// Lane leaving the box towards a heading.
    Outbound(Approach),
}

impl Lane {
    fn of<W: TrafficWorld + ?Sized>(car: &Car, world: &W) -> Option<Lane> {
        let route = car.route?;
        if world.in_intersection(car.position) || car.distance_to_stop_line(world) >= 0.0 {
            Some(Lane::Inbound(car.approach))
        } else {
            Some(Lane::Outbound(exit_heading(route.approach, route.intent)))
        }
    }

    fn direction(self) -> Vec2 {
        match self {
            Lane::Inbound(approach) => approach.opposite().direction(),
            Lane::Outbound(heading) => heading.direction(),
        }
    }
}

/// Owns the active cars: spawning, per-tick update, collisions and recycling.
pub struct TrafficManager {
    cars: Vec<Car>,
    pool: Vec<Car>,
    pool_size: usize,
    rules: DrivingRules,
    car_params: CarParams,
    path_probabilities: PathProbabilities,
    spawn_rate: f32,
    spawn_elapsed: f32,
    linger_ms: f32,
    next_car_id: usize,
    clock: f32,
    rng: StdRng,
    pub total_spawned: usize,
    pub total_completed: usize,
    pub total_collisions: usize,
}

impl TrafficManager {
    /// `seed` takes precedence over the seed in the config; with neither the
    /// generator is seeded from entropy.
    pub fn new(config: &TrafficConfig, seed: Option<u64>) -> Self {
        let rng = match seed.or(config.random.seed) {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let pool_size = config.spawning.pool_size;
        let pool = (0..pool_size).map(|_| Car::placeholder()).collect();
        log::debug!("Created car pool with {} cars", pool_size);

        Self {
            cars: Vec::new(),
            pool,
            pool_size,
            rules: DrivingRules::from(config),
            car_params: config.cars.clone(),
            path_probabilities: config.spawning.path_probabilities.clone(),
            spawn_rate: config.spawning.spawn_rate_ms.max(MIN_SPAWN_RATE_MS),
            spawn_elapsed: 0.0,
            linger_ms: config.collisions.linger_ms,
            next_car_id: 0,
            clock: 0.0,
            rng,
            total_spawned: 0,
            total_completed: 0,
            total_collisions: 0,
        }
    }

    pub fn update<W, E>(&mut self, dt: f32, world: &W, events: &mut E)
    where
        W: TrafficWorld + ?Sized,
        E: TrafficEvents + ?Sized,
    {
        self.clock += dt;

        self.spawn_elapsed += dt;
        if self.spawn_elapsed >= self.spawn_rate {
            self.spawn_elapsed = 0.0;
            self.spawn_car(world);
        }

        for i in 0..self.cars.len() {
            let leader = self.leader_of(i, world);
            let giving_way = self.must_give_way(i, world);
            self.cars[i].giving_way = giving_way;
            self.cars[i].update(dt, self.clock, world, leader, &self.rules, events);
        }

        let hits = collision_pass(&mut self.cars, events);
        self.total_collisions += hits.len();

        self.drain(events);
    }

    /// Removes finished cars and expired wrecks, keeping the order of the rest.
    fn drain<E: TrafficEvents + ?Sized>(&mut self, events: &mut E) {
        let mut i = 0;
        while i < self.cars.len() {
            let car = &self.cars[i];
            let remove = match car.state {
                CarState::Completed => {
                    let trip = car.trip_time().unwrap_or(0.0);
                    log::debug!("Car {} completed its trip in {:.0}ms", car.id, trip);
                    events.on_completed(car.id, trip);
                    self.total_completed += 1;
                    true
                }
                CarState::Collided => car.collided_for >= self.linger_ms,
                _ => false,
            };

            if remove {
                let car = self.cars.remove(i);
                self.release(car);
            } else {
                i += 1;
            }
        }
    }

    /// Nearest car ahead of `index` in the same lane, whatever its route.
    fn leader_of<W: TrafficWorld + ?Sized>(&self, index: usize, world: &W) -> Option<Leader> {
        let car = &self.cars[index];
        let lane = Lane::of(car, world)?;
        let direction = lane.direction();
        let progress = car.position.coords.dot(&direction);

        self.cars
            .iter()
            .enumerate()
            .filter(|(j, other)| *j != index && !other.is_completed() && Lane::of(other, world) == Some(lane))
            .map(|(j, other)| (j, other, other.position.coords.dot(&direction)))
            .filter(|(j, _, ahead)| *ahead > progress || (*ahead == progress && *j < index))
            .min_by(|a, b| a.2.total_cmp(&b.2))
            .map(|(_, other, _)| Leader {
                gap: (other.position - car.position).magnitude(),
                speed: if other.is_collided() { 0.0 } else { other.current_speed },
            })
    }

    /// Stopped behind a stopped car within the following gap.
    fn is_queued<W: TrafficWorld + ?Sized>(&self, index: usize, world: &W) -> bool {
        self.cars[index].is_stopped()
            && self
                .leader_of(index, world)
                .map(|l| l.gap < self.rules.min_following_gap && l.speed <= 0.0)
                .unwrap_or(false)
    }

    /// A left turn at its stop line waits while oncoming traffic could reach
    /// the box before it clears. Oncoming cars inside the box always count.
    /// Oncoming cars on their entry lane count while their light is green and
    /// they are within `oncoming_clearance` of the stop line, unless they are
    /// queued or are a later left turn. Equal claims go to the lower id.
    fn must_give_way<W: TrafficWorld + ?Sized>(&self, index: usize, world: &W) -> bool {
        let car = &self.cars[index];
        let turning_left = car.route.map(|r| r.intent == TurnIntent::Left).unwrap_or(false);
        if !turning_left || car.is_collided() || !car.approaching_stop_line(world, &self.rules) {
            return false;
        }

        let oncoming = car.approach.opposite();
        let oncoming_green = world.light_state(oncoming) == LightState::Green;

        self.cars.iter().enumerate().any(|(j, other)| {
            if j == index || other.approach != oncoming || other.route.is_none() || other.is_completed() {
                return false;
            }
            if world.in_intersection(other.position) {
                return true;
            }
            if !oncoming_green || other.is_collided() {
                return false;
            }

            let distance = other.distance_to_stop_line(world);
            if !(0.0..=self.rules.oncoming_clearance).contains(&distance) {
                return false;
            }

            let later_left = other.route.map(|r| r.intent == TurnIntent::Left).unwrap_or(false) && other.id > car.id;
            !later_left && !self.is_queued(j, world)
        })
    }

    /// Spawns a car on a random approach with a weighted turn intent.
    pub fn spawn_car<W: TrafficWorld + ?Sized>(&mut self, world: &W) -> Option<CarId> {
        let approach = Approach::ALL[self.rng.gen_range(0..Approach::ALL.len())];
        let sample: f32 = self.rng.gen();
        let intent = self.path_probabilities.for_approach(approach).pick(sample);
        self.spawn(world, approach, intent)
    }

    /// Places a new car at the start of the resolved route. Skipped when the
    /// route has no path or its entry is still occupied.
    pub fn spawn<W: TrafficWorld + ?Sized>(&mut self, world: &W, approach: Approach, intent: TurnIntent) -> Option<CarId> {
        let (route, path) = world.routes().resolve(approach, intent)?;

        if self.entry_blocked(approach, path.start) {
            log::debug!("Spawn skipped on {}, entry occupied", approach);
            return None;
        }

        let speed = if self.car_params.max_speed > self.car_params.min_speed {
            self.rng.gen_range(self.car_params.min_speed..=self.car_params.max_speed)
        } else {
            self.car_params.min_speed
        };

        let id = CarId(self.next_car_id);
        self.next_car_id += 1;

        let mut car = self.acquire(id, approach, path.start, speed);
        if !self.car_params.colors.is_empty() {
            let index = self.rng.gen_range(0..self.car_params.colors.len());
            car.color = self.car_params.colors[index].clone();
        }
        car.spawned_at = self.clock;
        car.assign_route(route, path);

        log::debug!("Spawned car {} from {} taking {:?} path", id, approach, route.intent);
        self.cars.push(car);
        self.total_spawned += 1;
        Some(id)
    }

    /// Every intent of an approach starts on the same entry lane.
    fn entry_blocked(&self, approach: Approach, start: Point) -> bool {
        let gap = self.rules.min_following_gap;
        gap > 0.0
            && self.cars.iter().any(|car| {
                car.approach == approach && !car.is_completed() && (car.position - start).magnitude() < gap
            })
    }

    /// Takes a car from the pool, or builds one when the pool is empty.
    pub fn acquire(&mut self, id: CarId, approach: Approach, position: Point, speed: f32) -> Car {
        let mut car = match self.pool.pop() {
            Some(mut car) => {
                car.reset(id, approach, position, speed);
                car
            }
            None => Car::new(id, approach, position, self.car_params.width, self.car_params.height, speed),
        };
        car.width = self.car_params.width;
        car.height = self.car_params.height;
        car
    }

    /// Returns a car to the pool unless it is already twice its initial size.
    pub fn release(&mut self, car: Car) {
        if self.pool.len() < self.pool_size * 2 {
            self.pool.push(car);
        }
    }

    /// Inserts a car built outside the spawner.
    pub fn add_car(&mut self, car: Car) {
        self.next_car_id = self.next_car_id.max(car.id.0 + 1);
        self.cars.push(car);
    }

    pub fn cars(&self) -> &[Car] {
        &self.cars
    }

    pub fn car(&self, id: CarId) -> Option<&Car> {
        self.cars.iter().find(|car| car.id == id)
    }

    pub fn active_count(&self) -> usize {
        self.cars.len()
    }

    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    pub fn clock(&self) -> f32 {
        self.clock
    }

    /// Longest running wait among the active cars, in ms.
    pub fn longest_wait(&self) -> f32 {
        self.cars.iter().map(|car| car.wait_time).fold(0.0, f32::max)
    }

    pub fn spawn_rate(&self) -> f32 {
        self.spawn_rate
    }

    /// Sets the spawn interval, raised to [`MIN_SPAWN_RATE_MS`] when smaller
    /// or not a number.
    pub fn set_spawn_rate(&mut self, rate_ms: f32) {
        let rate = rate_ms.max(MIN_SPAWN_RATE_MS);
        if rate != rate_ms {
            log::warn!("Spawn rate {}ms out of range, using {}ms", rate_ms, rate);
        }
        self.spawn_rate = rate;
        log::debug!("Spawn rate set to {}ms", rate);
    }

    /// Clears the road and counters. Car ids keep increasing across resets.
    pub fn reset(&mut self) {
        let cars = std::mem::take(&mut self.cars);
        for car in cars {
            self.release(car);
        }
        self.spawn_elapsed = 0.0;
        self.clock = 0.0;
        self.total_spawned = 0;
        self.total_completed = 0;
        self.total_collisions = 0;
    }
}
