use super::{Grid, Side, TilePos};
use crate::simulation::{LightState, Point};
use rand::Rng;

/// Base speeds are given per frame of a 60 Hz loop.
pub const REFERENCE_TICK_MS: f32 = 1000.0 / 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleKind {
    Car,
    Truck,
    Bus,
}

impl VehicleKind {
    pub const ALL: [VehicleKind; 3] = [VehicleKind::Car, VehicleKind::Truck, VehicleKind::Bus];

    /// Tiles per reference tick.
    pub fn base_speed(self) -> f32 {
        match self {
            VehicleKind::Car => 0.1,
            VehicleKind::Truck => 0.07,
            VehicleKind::Bus => 0.05,
        }
    }

    /// Drawn width and height in pixels.
    pub fn size(self) -> (f32, f32) {
        match self {
            VehicleKind::Car => (20.0, 10.0),
            VehicleKind::Truck => (30.0, 12.0),
            VehicleKind::Bus => (35.0, 14.0),
        }
    }

    pub fn color<R: Rng>(self, rng: &mut R) -> String {
        match self {
            VehicleKind::Car => format!("#{:06x}", rng.gen_range(0..0x100_0000u32)),
            VehicleKind::Truck => "#8B4513".to_string(),
            VehicleKind::Bus => "#FFD700".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GridVehicle {
    pub id: usize,
    pub kind: VehicleKind,
    /// In tile units; waypoints sit on whole tile coordinates.
    pub position: Point,
    pub heading: Side,
    pub speed: f32,
    pub width: f32,
    pub height: f32,
    pub color: String,
    pub waiting: bool,
    pub wait_time: f32,
    route: Vec<TilePos>,
    next: usize,
    pub spawned_at: f32,
}

fn tile_point((x, y): TilePos) -> Point {
    Point::new(x as f32, y as f32)
}

impl GridVehicle {
    pub fn new(id: usize, kind: VehicleKind, start: TilePos, heading: Side, color: String) -> Self {
        let (width, height) = kind.size();
        Self {
            id,
            kind,
            position: tile_point(start),
            heading,
            speed: kind.base_speed(),
            width,
            height,
            color,
            waiting: false,
            wait_time: 0.0,
            route: Vec::new(),
            next: 0,
            spawned_at: 0.0,
        }
    }

    pub fn set_route(&mut self, route: Vec<TilePos>) {
        self.route = route;
        self.next = 0;
    }

    pub fn route(&self) -> &[TilePos] {
        &self.route
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.route.len()
    }

    /// Tile the vehicle is closest to.
    pub fn tile(&self) -> TilePos {
        (self.position.x.round().max(0.0) as usize, self.position.y.round().max(0.0) as usize)
    }

    /// Moves along the route. Returns true once the last waypoint is reached.
    ///
    /// A vehicle standing on a waypoint does not pull into a red intersection
    /// tile; it waits there, flags its tile congested and re-checks next tick.
    pub fn update(&mut self, dt: f32, grid: &mut Grid) -> bool {
        let Some(&target) = self.route.get(self.next) else {
            return true;
        };

        if self.next > 0 && self.position == tile_point(self.route[self.next - 1]) {
            let red = grid.light_at(target.0, target.1) == Some(LightState::Red);
            if red {
                self.waiting = true;
                self.wait_time += dt;
                let (x, y) = self.tile();
                grid.mark_congested(x, y);
                return false;
            }
        }
        self.waiting = false;
        self.wait_time = 0.0;

        let step = self.speed * dt / REFERENCE_TICK_MS;
        let goal = tile_point(target);
        let delta = goal - self.position;
        let distance = delta.magnitude();

        if distance <= step {
            self.position = goal;
            self.next += 1;
            return self.is_finished();
        }

        let movement = delta / distance * step;
        self.position += movement;
        self.heading = if movement.x.abs() > movement.y.abs() {
            if movement.x > 0.0 { Side::East } else { Side::West }
        } else if movement.y > 0.0 {
            Side::South
        } else {
            Side::North
        };

        false
    }
}
