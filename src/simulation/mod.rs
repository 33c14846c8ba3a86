use nalgebra::{Vector2, Point2};
use instant::Instant;
use std::time::Duration;
use std::fmt;

pub mod signal;
pub mod path;
pub mod car;
pub mod collision;
pub mod events;
pub mod intersection;
pub mod manager;
pub mod session;
pub mod render;

pub use signal::*;
pub use path::*;
pub use car::*;
pub use collision::*;
pub use events::*;
pub use intersection::*;
pub use manager::*;
pub use session::*;
pub use render::*;

pub type Vec2 = Vector2<f32>;
pub type Point = Point2<f32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CarId(pub usize);

impl fmt::Display for CarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Compass direction a car enters the crossing from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Approach {
    North,
    East,
    South,
    West,
}

impl Approach {
    pub const ALL: [Approach; 4] = [Approach::North, Approach::East, Approach::South, Approach::West];

    pub fn index(self) -> usize {
        match self {
            Approach::North => 0,
            Approach::East => 1,
            Approach::South => 2,
            Approach::West => 3,
        }
    }

    pub fn is_north_south(self) -> bool {
        matches!(self, Approach::North | Approach::South)
    }

    /// The two approaches sharing this approach's axis.
    pub fn axis(self) -> [Approach; 2] {
        if self.is_north_south() {
            [Approach::North, Approach::South]
        } else {
            [Approach::East, Approach::West]
        }
    }

    pub fn perpendicular(self) -> [Approach; 2] {
        if self.is_north_south() {
            [Approach::East, Approach::West]
        } else {
            [Approach::North, Approach::South]
        }
    }

    /// Unit vector pointing towards this compass direction on the canvas.
    pub fn direction(self) -> Vec2 {
        match self {
            Approach::North => Vec2::new(0.0, -1.0),
            Approach::East => Vec2::new(1.0, 0.0),
            Approach::South => Vec2::new(0.0, 1.0),
            Approach::West => Vec2::new(-1.0, 0.0),
        }
    }

    pub fn opposite(self) -> Approach {
        match self {
            Approach::North => Approach::South,
            Approach::East => Approach::West,
            Approach::South => Approach::North,
            Approach::West => Approach::East,
        }
    }
}

impl fmt::Display for Approach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Approach::North => "north",
            Approach::East => "east",
            Approach::South => "south",
            Approach::West => "west",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnIntent {
    Straight,
    Right,
    Left,
}

/// Accumulates frame time and hands out whole simulation steps.
#[derive(Debug, Clone)]
pub struct FixedStep {
    pub step_ms: f32,
    accumulator: f32,
    max_steps_per_frame: u32,
}

impl FixedStep {
    pub fn new(step_ms: f32) -> Self {
        Self {
            step_ms,
            accumulator: 0.0,
            max_steps_per_frame: 240,
        }
    }

    pub fn with_max_steps(mut self, max_steps_per_frame: u32) -> Self {
        self.max_steps_per_frame = max_steps_per_frame.max(1);
        self
    }

    /// Adds `frame_ms` of elapsed time and returns how many fixed steps to run.
    /// Time beyond the per-frame cap is dropped rather than carried over.
    pub fn advance(&mut self, frame_ms: f32) -> u32 {
        self.accumulator += frame_ms.max(0.0);

        let mut steps = 0;
        while self.accumulator >= self.step_ms {
            self.accumulator -= self.step_ms;
            steps += 1;
            if steps == self.max_steps_per_frame {
                self.accumulator = 0.0;
                break;
            }
        }
        steps
    }

    pub fn pending_ms(&self) -> f32 {
        self.accumulator
    }
}

impl Default for FixedStep {
    fn default() -> Self {
        Self::new(1000.0 / 60.0)
    }
}

#[derive(Debug, Clone)]
pub struct PerformanceMetrics {
    pub frame_time: Duration,
    pub simulation_time: Duration,
    pub steps: u32,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            frame_time: Duration::ZERO,
            simulation_time: Duration::ZERO,
            steps: 0,
        }
    }
}

#[derive(Debug)]
pub struct PerformanceTracker {
    samples: Vec<PerformanceMetrics>,
    max_samples: usize,
    current_frame_start: Option<Instant>,
    current_sim_start: Option<Instant>,
    pending: PerformanceMetrics,
}

impl PerformanceTracker {
    pub fn new(max_samples: usize) -> Self {
        Self {
            samples: Vec::with_capacity(max_samples),
            max_samples: max_samples.max(1),
            current_frame_start: None,
            current_sim_start: None,
            pending: PerformanceMetrics::default(),
        }
    }

    pub fn start_frame(&mut self) {
        self.current_frame_start = Some(Instant::now());
        self.pending = PerformanceMetrics::default();
    }

    pub fn start_simulation(&mut self) {
        self.current_sim_start = Some(Instant::now());
    }

    pub fn end_simulation(&mut self, steps: u32) {
        if let Some(start) = self.current_sim_start.take() {
            self.pending.simulation_time = start.elapsed();
            self.pending.steps = steps;
        }
    }

    pub fn end_frame(&mut self) {
        if let Some(start) = self.current_frame_start.take() {
            let mut metrics = std::mem::take(&mut self.pending);
            metrics.frame_time = start.elapsed();

            if self.samples.len() >= self.max_samples {
                self.samples.remove(0);
            }
            self.samples.push(metrics);
        }
    }

    pub fn average_frame_time(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }

        let total: Duration = self.samples.iter().map(|s| s.frame_time).sum();
        total / self.samples.len() as u32
    }

    pub fn average_simulation_time(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }

        let total: Duration = self.samples.iter().map(|s| s.simulation_time).sum();
        total / self.samples.len() as u32
    }

    pub fn fps(&self) -> f32 {
        let avg_frame_time = self.average_frame_time();
        if avg_frame_time.is_zero() {
            return 0.0;
        }
        1.0 / avg_frame_time.as_secs_f32()
    }
}
