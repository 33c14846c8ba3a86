use super::{Grid, GridVehicle, Side, TilePos, VehicleKind};
use crate::simulation::{CarId, TrafficEvents};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnPoint {
    pub tile: TilePos,
    /// Direction of travel into the grid.
    pub heading: Side,
}

/// Spawns vehicles on edge roads and routes them to other edge roads.
pub struct VehicleManager {
    vehicles: Vec<GridVehicle>,
    spawn_points: Vec<SpawnPoint>,
    spawn_timer: f32,
    spawn_interval: f32,
    next_id: usize,
    clock: f32,
    rng: StdRng,
    pub total_spawned: usize,
    pub total_completed: usize,
}

impl VehicleManager {
    pub fn new(spawn_interval_ms: f32, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            vehicles: Vec::new(),
            spawn_points: Vec::new(),
            spawn_timer: 0.0,
            spawn_interval: spawn_interval_ms,
            next_id: 0,
            clock: 0.0,
            rng,
            total_spawned: 0,
            total_completed: 0,
        }
    }

    pub fn reset(&mut self, grid: &Grid) {
        self.vehicles.clear();
        self.spawn_timer = 0.0;
        self.clock = 0.0;
        self.total_spawned = 0;
        self.total_completed = 0;
        self.refresh_spawn_points(grid);
    }

    pub fn set_spawn_rate(&mut self, interval_ms: f32) {
        log::debug!("Setting vehicle spawn interval to {}ms", interval_ms);
        self.spawn_interval = interval_ms;
    }

    pub fn spawn_interval(&self) -> f32 {
        self.spawn_interval
    }

    /// Rescans the grid edges. Any road without a light on the border is an
    /// entry, and every entry doubles as a destination.
    pub fn refresh_spawn_points(&mut self, grid: &Grid) {
        let (width, height) = (grid.width(), grid.height());
        let mut points = Vec::new();

        let mut consider = |tile: TilePos, heading: Side| {
            let valid = grid.road(tile.0, tile.1).map(|road| !road.has_light()).unwrap_or(false);
            if valid {
                points.push(SpawnPoint { tile, heading });
            }
        };

        if width > 0 && height > 0 {
            for x in 0..width {
                consider((x, 0), Side::South);
                consider((x, height - 1), Side::North);
            }
            for y in 0..height {
                consider((0, y), Side::East);
                consider((width - 1, y), Side::West);
            }
        }

        log::debug!("Spawn points initialized: {}", points.len());
        self.spawn_points = points;
    }

    pub fn spawn_points(&self) -> &[SpawnPoint] {
        &self.spawn_points
    }

    /// Spawns one vehicle between two distinct edge tiles. Returns its id, or
    /// `None` when no routable pair was drawn.
    pub fn spawn_vehicle(&mut self, grid: &Grid) -> Option<usize> {
        if self.spawn_points.is_empty() {
            return None;
        }

        let origin = self.spawn_points[self.rng.gen_range(0..self.spawn_points.len())];
        let destinations: Vec<TilePos> = self
            .spawn_points
            .iter()
            .map(|point| point.tile)
            .filter(|tile| *tile != origin.tile)
            .collect();
        if destinations.is_empty() {
            return None;
        }
        let destination = destinations[self.rng.gen_range(0..destinations.len())];

        let route = match grid.find_route(origin.tile, destination) {
            Ok(route) => route,
            Err(err) => {
                log::debug!("Vehicle spawn skipped: {}", err);
                return None;
            }
        };

        let kind = VehicleKind::ALL[self.rng.gen_range(0..VehicleKind::ALL.len())];
        let color = kind.color(&mut self.rng);
        let id = self.next_id;
        self.next_id += 1;

        let mut vehicle = GridVehicle::new(id, kind, origin.tile, origin.heading, color);
        vehicle.spawned_at = self.clock;
        vehicle.set_route(route);

        log::debug!("Spawned {:?} {} from {:?} to {:?}", kind, id, origin.tile, destination);
        self.vehicles.push(vehicle);
        self.total_spawned += 1;
        Some(id)
    }

    pub fn add_vehicle(&mut self, vehicle: GridVehicle) {
        self.next_id = self.next_id.max(vehicle.id + 1);
        self.vehicles.push(vehicle);
    }

    pub fn update<E: TrafficEvents + ?Sized>(&mut self, dt: f32, grid: &mut Grid, events: &mut E) {
        self.clock += dt;
        grid.clear_congestion();

        if !self.spawn_points.is_empty() {
            self.spawn_timer += dt;
            if self.spawn_timer >= self.spawn_interval {
                self.spawn_timer = 0.0;
                self.spawn_vehicle(grid);
            }
        }

        let clock = self.clock;
        let mut finished = Vec::new();
        self.vehicles.retain_mut(|vehicle| {
            if vehicle.update(dt, grid) {
                finished.push((vehicle.id, clock - vehicle.spawned_at));
                false
            } else {
                true
            }
        });

        for (id, trip) in finished {
            self.total_completed += 1;
            events.on_completed(CarId(id), trip);
        }
    }

    pub fn vehicles(&self) -> &[GridVehicle] {
        &self.vehicles
    }

    pub fn waiting_count(&self) -> usize {
        self.vehicles.iter().filter(|vehicle| vehicle.waiting).count()
    }
}
