use super::{Approach, Car, CarId, Intersection, LightState, Point, TrafficManager};

/// Colour band for a car's wait label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitLevel {
    Normal,
    Warning,
    Critical,
}

impl WaitLevel {
    pub fn from_seconds(seconds: u32) -> Self {
        if seconds >= 20 {
            WaitLevel::Critical
        } else if seconds >= 10 {
            WaitLevel::Warning
        } else {
            WaitLevel::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CarSnapshot {
    pub id: CarId,
    pub position: Point,
    /// Radians.
    pub rotation: f32,
    pub width: f32,
    pub height: f32,
    pub color: String,
    pub collided: bool,
    /// Whole seconds waited, present while the car has a running wait.
    pub wait_seconds: Option<u32>,
    pub wait_level: WaitLevel,
}

impl CarSnapshot {
    /// Cars that have not been given a path yet are not drawn.
    pub fn from_car(car: &Car) -> Option<Self> {
        car.path?;

        let wait_seconds = (car.wait_time > 0.0).then(|| (car.wait_time / 1000.0).floor() as u32);
        Some(Self {
            id: car.id,
            position: car.position,
            rotation: car.heading(),
            width: car.width,
            height: car.height,
            color: car.color.clone(),
            collided: car.is_collided(),
            wait_seconds,
            wait_level: WaitLevel::from_seconds(wait_seconds.unwrap_or(0)),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSnapshot {
    pub approach: Approach,
    pub position: Point,
    pub state: LightState,
    /// Change flash in [0, 1]; zero once the effect has faded.
    pub glow: f32,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, Default)]
pub struct FrameSnapshot {
    pub cars: Vec<CarSnapshot>,
    pub lights: Vec<LightSnapshot>,
}

impl FrameSnapshot {
    pub fn capture(intersection: &Intersection, manager: &TrafficManager) -> Self {
        let cars = manager.cars().iter().filter_map(CarSnapshot::from_car).collect();
        let lights = Approach::ALL
            .into_iter()
            .map(|approach| LightSnapshot {
                approach,
                position: intersection.light_position(approach),
                state: intersection.signals.state(approach),
                glow: intersection.signals.glow(approach),
            })
            .collect();

        Self { cars, lights }
    }

    pub fn light(&self, approach: Approach) -> Option<&LightSnapshot> {
        self.lights.iter().find(|light| light.approach == approach)
    }
}
