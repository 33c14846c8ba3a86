use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};
use super::Validate;
use crate::simulation::{Approach, TurnIntent};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct TrafficConfig {
    #[serde(default)]
    pub spawning: SpawnParams,
    #[serde(default)]
    pub cars: CarParams,
    #[serde(default)]
    pub stopping: StopParams,
    #[serde(default)]
    pub waiting: WaitParams,
    #[serde(default)]
    pub collisions: CollisionParams,
    #[serde(default)]
    pub random: RandomConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpawnParams {
    /// Milliseconds between spawns.
    pub spawn_rate_ms: f32,
    pub pool_size: usize,
    #[serde(default)]
    pub path_probabilities: PathProbabilities,
}

impl Default for SpawnParams {
    fn default() -> Self {
        Self {
            spawn_rate_ms: 3000.0,
            pool_size: 50,
            path_probabilities: PathProbabilities::default(),
        }
    }
}

/// Turn-intent weights for one approach, in straight/right/left order.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct TurnWeights {
    pub straight: f32,
    pub right: f32,
    pub left: f32,
}

impl Default for TurnWeights {
    fn default() -> Self {
        Self {
            straight: 0.5,
            right: 0.3,
            left: 0.2,
        }
    }
}

impl TurnWeights {
    pub fn total(&self) -> f32 {
        self.straight + self.right + self.left
    }

    /// Maps a uniform sample in `[0, 1)` onto an intent.
    pub fn pick(&self, sample: f32) -> TurnIntent {
        let scaled = sample * self.total();
        if scaled < self.straight {
            TurnIntent::Straight
        } else if scaled < self.straight + self.right {
            TurnIntent::Right
        } else {
            TurnIntent::Left
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct PathProbabilities {
    #[serde(default)]
    pub north: TurnWeights,
    #[serde(default)]
    pub east: TurnWeights,
    #[serde(default)]
    pub south: TurnWeights,
    #[serde(default)]
    pub west: TurnWeights,
}

impl PathProbabilities {
    pub fn for_approach(&self, approach: Approach) -> &TurnWeights {
        match approach {
            Approach::North => &self.north,
            Approach::East => &self.east,
            Approach::South => &self.south,
            Approach::West => &self.west,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CarParams {
    /// Length along the heading, in pixels.
    pub width: f32,
    /// Extent across the heading, in pixels.
    pub height: f32,
    /// Cruise speed range in px/ms; each car draws uniformly from it.
    pub min_speed: f32,
    pub max_speed: f32,
    /// Speed regained per ms after a stop, px/ms².
    pub acceleration: f32,
    pub colors: Vec<String>,
}

impl Default for CarParams {
    fn default() -> Self {
        Self {
            width: 20.0,
            height: 10.0,
            min_speed: 0.07,
            max_speed: 0.1,
            acceleration: 0.0006,
            colors: [
                "#e74c3c", "#3498db", "#2ecc71", "#f39c12",
                "#9b59b6", "#1abc9c", "#34495e", "#7f8c8d",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StopParams {
    /// Distance before the stop line inside which a red or yellow light holds a car.
    pub look_ahead: f32,
    /// Closest a car may approach the car ahead in its lane. Zero disables queueing.
    pub min_following_gap: f32,
    /// A left turn waits while an oncoming car on green is this close to its
    /// own stop line.
    #[serde(default = "default_oncoming_clearance")]
    pub oncoming_clearance: f32,
}

fn default_oncoming_clearance() -> f32 {
    250.0
}

impl Default for StopParams {
    fn default() -> Self {
        Self {
            look_ahead: 50.0,
            min_following_gap: 28.0,
            oncoming_clearance: default_oncoming_clearance(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WaitParams {
    pub report_interval_ms: f32,
    pub critical_wait_ms: f32,
}

impl Default for WaitParams {
    fn default() -> Self {
        Self {
            report_interval_ms: 500.0,
            critical_wait_ms: 30_000.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CollisionParams {
    /// How long a wreck stays on the road before the manager reclaims it.
    pub linger_ms: f32,
}

impl Default for CollisionParams {
    fn default() -> Self {
        Self { linger_ms: 1000.0 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RandomConfig {
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PerformanceConfig {
    pub timing_samples: u32,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self { timing_samples: 60 }
    }
}

impl Validate for TrafficConfig {
    fn validate(&self) -> Result<()> {
        let spawning = &self.spawning;
        if spawning.spawn_rate_ms <= 0.0 {
            return Err(anyhow!("Spawn rate must be positive"));
        }

        for approach in Approach::ALL {
            let weights = spawning.path_probabilities.for_approach(approach);
            if weights.straight < 0.0 || weights.right < 0.0 || weights.left < 0.0 {
                return Err(anyhow!("Path probabilities for '{}' must be non-negative", approach));
            }
            if weights.total() <= 0.0 {
                return Err(anyhow!("Path probabilities for '{}' must not all be zero", approach));
            }
        }

        let cars = &self.cars;
        if cars.width <= 0.0 || cars.height <= 0.0 {
            return Err(anyhow!("Car dimensions must be positive"));
        }

        if cars.min_speed <= 0.0 || cars.max_speed < cars.min_speed {
            return Err(anyhow!(
                "Car speed range must be positive and ordered, got {}..{}",
                cars.min_speed, cars.max_speed
            ));
        }

        if cars.acceleration <= 0.0 {
            return Err(anyhow!("Car acceleration must be positive"));
        }

        if cars.colors.is_empty() {
            return Err(anyhow!("At least one car color must be defined"));
        }

        let stopping = &self.stopping;
        if stopping.look_ahead <= 0.0 {
            return Err(anyhow!("Stop-line look-ahead must be positive"));
        }

        if stopping.min_following_gap < 0.0 {
            return Err(anyhow!("Following gap must be non-negative"));
        }

        if stopping.oncoming_clearance < 0.0 {
            return Err(anyhow!("Oncoming clearance must be non-negative"));
        }

        let waiting = &self.waiting;
        if waiting.report_interval_ms <= 0.0 {
            return Err(anyhow!("Wait report interval must be positive"));
        }

        if waiting.critical_wait_ms <= waiting.report_interval_ms {
            return Err(anyhow!("Critical wait must be longer than the report interval"));
        }

        if self.collisions.linger_ms < 0.0 {
            return Err(anyhow!("Collision linger time must be non-negative"));
        }

        if self.performance.timing_samples == 0 {
            return Err(anyhow!("Timing samples must be greater than zero"));
        }

        Ok(())
    }
}
