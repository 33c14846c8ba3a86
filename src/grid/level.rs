use super::{Grid, VehicleManager};
use crate::config::{LevelDefinition, LevelsConfig};
use crate::simulation::{CarId, TrafficEvents};
use anyhow::{anyhow, Result};

pub const BASE_COMPLETION_POINTS: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelOutcome {
    InProgress,
    Won,
    Lost,
}

/// Progress through the grid levels: flow, congestion and score.
#[derive(Debug, Clone)]
pub struct LevelManager {
    levels: LevelsConfig,
    current: Option<LevelDefinition>,
    /// Time spent in the current level, ms.
    pub elapsed: f32,
    /// Vehicles completed per minute.
    pub flow_rate: f32,
    /// Percentage of road tiles holding a waiting vehicle.
    pub congestion: f32,
    pub vehicles_managed: u32,
    pub score: i64,
}

impl LevelManager {
    pub fn new(levels: LevelsConfig) -> Self {
        Self {
            levels,
            current: None,
            elapsed: 0.0,
            flow_rate: 0.0,
            congestion: 0.0,
            vehicles_managed: 0,
            score: 0,
        }
    }

    pub fn levels(&self) -> &LevelsConfig {
        &self.levels
    }

    pub fn current(&self) -> Option<&LevelDefinition> {
        self.current.as_ref()
    }

    /// Rebuilds the grid from the level's layout and points the vehicle
    /// manager at it.
    pub fn load_level(&mut self, number: u32, grid: &mut Grid, vehicles: &mut VehicleManager) -> Result<&LevelDefinition> {
        let level = self
            .levels
            .level(number)
            .cloned()
            .ok_or_else(|| anyhow!("Level {} is not defined", number))?;
        log::info!("Loading level {}: {}", level.number, level.name);

        grid.reset(level.grid_size);
        for placement in &level.initial_roads {
            grid.place_road(placement.x, placement.y, placement.kind)?;
        }

        vehicles.set_spawn_rate(level.spawn_rate_ms);
        vehicles.reset(grid);

        self.elapsed = 0.0;
        self.flow_rate = 0.0;
        self.congestion = 0.0;
        self.vehicles_managed = 0;
        self.score = 0;

        Ok(self.current.insert(level))
    }

    /// Number of the level after the current one, if defined.
    pub fn next_level(&self) -> Option<u32> {
        let current = self.current.as_ref()?.number;
        self.levels
            .levels
            .iter()
            .map(|level| level.number)
            .filter(|number| *number > current)
            .min()
    }

    pub fn update(&mut self, dt: f32, grid: &Grid) -> LevelOutcome {
        let Some(level) = self.current.as_ref() else {
            return LevelOutcome::InProgress;
        };

        self.elapsed += dt;
        let minutes = self.elapsed / 60_000.0;
        self.flow_rate = if minutes > 0.0 { self.vehicles_managed as f32 / minutes } else { 0.0 };

        let roads = grid.count_roads();
        self.congestion = if roads > 0 {
            grid.count_congested() as f32 / roads as f32 * 100.0
        } else {
            0.0
        };

        if self.elapsed / 1000.0 >= level.time_limit_s {
            log::info!("Level {} time limit reached", level.number);
            return LevelOutcome::Lost;
        }

        let win = &level.win_conditions;
        if self.score >= win.min_score && self.flow_rate >= win.min_flow_rate && self.congestion <= win.max_congestion {
            log::info!("Level {} complete", level.number);
            return LevelOutcome::Won;
        }

        LevelOutcome::InProgress
    }

    /// Points for one completed vehicle, weighted by flow against the target
    /// and reduced by congestion.
    pub fn completion_points(&self) -> i64 {
        let Some(level) = self.current.as_ref() else {
            return 0;
        };
        let flow_multiplier = self.flow_rate / level.win_conditions.min_flow_rate;
        let congestion_penalty = 1.0 - self.congestion / 100.0;
        (BASE_COMPLETION_POINTS * flow_multiplier * congestion_penalty).round() as i64
    }
}

impl TrafficEvents for LevelManager {
    fn on_completed(&mut self, _vehicle: CarId, _trip_ms: f32) {
        self.vehicles_managed += 1;
        self.score += self.completion_points();
    }
}
