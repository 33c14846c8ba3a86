use super::Scenario;
use crate::config::LevelsConfig;
use crate::grid::{Grid, LevelManager, LevelOutcome, VehicleManager};
use crate::simulation::FixedStep;
use anyhow::Result;

const DEFAULT_SPAWN_INTERVAL_MS: f32 = 3000.0;

/// The tile-grid game: a level layout, its vehicles and level progress.
pub struct GridSimulation {
    pub grid: Grid,
    pub vehicles: VehicleManager,
    pub levels: LevelManager,
    pub outcome: LevelOutcome,
    timestep: FixedStep,
}

impl GridSimulation {
    pub fn new(levels: LevelsConfig, level: u32, seed: Option<u64>) -> Result<Self> {
        let mut simulation = Self {
            grid: Grid::new(0, 0),
            vehicles: VehicleManager::new(DEFAULT_SPAWN_INTERVAL_MS, seed),
            levels: LevelManager::new(levels),
            outcome: LevelOutcome::InProgress,
            timestep: FixedStep::default(),
        };
        simulation.load_level(level)?;
        Ok(simulation)
    }

    pub fn load_level(&mut self, number: u32) -> Result<()> {
        self.levels.load_level(number, &mut self.grid, &mut self.vehicles)?;
        self.outcome = LevelOutcome::InProgress;
        Ok(())
    }
}

impl Scenario for GridSimulation {
    fn step(&mut self, dt: f32) -> Result<()> {
        if self.outcome != LevelOutcome::InProgress {
            return Ok(());
        }

        self.vehicles.update(dt, &mut self.grid, &mut self.levels);
        self.outcome = self.levels.update(dt, &self.grid);

        if self.outcome == LevelOutcome::Won {
            if let Some(next) = self.levels.next_level() {
                self.load_level(next)?;
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "grid"
    }

    fn active_vehicles(&self) -> usize {
        self.vehicles.vehicles().len()
    }

    fn completed(&self) -> usize {
        self.vehicles.total_completed
    }

    fn is_over(&self) -> bool {
        self.outcome != LevelOutcome::InProgress
    }

    /// Flips every intersection light.
    fn cycle_lights(&mut self) {
        for (x, y) in self.grid.intersections() {
            if let Err(err) = self.grid.toggle_light(x, y) {
                log::warn!("Could not toggle light at ({}, {}): {}", x, y, err);
            }
        }
    }

    fn timestep(&mut self) -> &mut FixedStep {
        &mut self.timestep
    }
}
