use serde::{Deserialize, Serialize};
use anyhow::{Context, Result, anyhow};
use super::Validate;
use crate::grid::RoadKind;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LevelsConfig {
    pub levels: Vec<LevelDefinition>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LevelDefinition {
    pub number: u32,
    pub name: String,
    pub description: String,
    pub target_score: i64,
    /// Seconds of play before the level is lost.
    pub time_limit_s: f32,
    pub grid_size: GridSize,
    pub spawn_rate_ms: f32,
    pub initial_roads: Vec<RoadPlacement>,
    pub win_conditions: WinConditions,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct GridSize {
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct RoadPlacement {
    pub x: usize,
    pub y: usize,
    pub kind: RoadKind,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WinConditions {
    pub min_score: i64,
    /// Percentage of road tiles allowed to hold a waiting vehicle.
    pub max_congestion: f32,
    /// Vehicles per minute.
    pub min_flow_rate: f32,
}

impl LevelsConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path))?;
        let levels: LevelsConfig = toml::from_str(&content)?;
        levels.validate()?;
        Ok(levels)
    }

    pub fn level(&self, number: u32) -> Option<&LevelDefinition> {
        self.levels.iter().find(|l| l.number == number)
    }
}

fn road(x: usize, y: usize, kind: RoadKind) -> RoadPlacement {
    RoadPlacement { x, y, kind }
}

impl Default for LevelsConfig {
    fn default() -> Self {
        use RoadKind::*;

        let levels = vec![
            LevelDefinition {
                number: 1,
                name: "Learning the Basics".to_string(),
                description: "Get started with simple traffic management".to_string(),
                target_score: 1000,
                time_limit_s: 180.0,
                grid_size: GridSize { width: 8, height: 8 },
                spawn_rate_ms: 5000.0,
                initial_roads: vec![
                    road(3, 3, Intersection),
                    road(2, 3, StraightHorizontal),
                    road(4, 3, StraightHorizontal),
                    road(3, 2, StraightVertical),
                    road(3, 4, StraightVertical),
                ],
                win_conditions: WinConditions { min_score: 1000, max_congestion: 50.0, min_flow_rate: 10.0 },
            },
            LevelDefinition {
                number: 2,
                name: "Rush Hour".to_string(),
                description: "Handle increased traffic with multiple intersections".to_string(),
                target_score: 2500,
                time_limit_s: 300.0,
                grid_size: GridSize { width: 10, height: 10 },
                spawn_rate_ms: 3000.0,
                initial_roads: vec![
                    road(3, 3, Intersection),
                    road(6, 6, Intersection),
                    road(3, 6, Intersection),
                    road(6, 3, Intersection),
                    road(4, 3, StraightHorizontal),
                    road(5, 3, StraightHorizontal),
                    road(4, 6, StraightHorizontal),
                    road(5, 6, StraightHorizontal),
                    road(3, 4, StraightVertical),
                    road(3, 5, StraightVertical),
                    road(6, 4, StraightVertical),
                    road(6, 5, StraightVertical),
                ],
                win_conditions: WinConditions { min_score: 2500, max_congestion: 40.0, min_flow_rate: 15.0 },
            },
            LevelDefinition {
                number: 3,
                name: "City Center".to_string(),
                description: "Master complex traffic patterns in a busy city center".to_string(),
                target_score: 5000,
                time_limit_s: 420.0,
                grid_size: GridSize { width: 12, height: 12 },
                spawn_rate_ms: 2000.0,
                initial_roads: vec![
                    road(6, 6, Intersection),
                    road(4, 4, Intersection),
                    road(8, 4, Intersection),
                    road(4, 8, Intersection),
                    road(8, 8, Intersection),
                    road(5, 4, StraightHorizontal),
                    road(7, 4, StraightHorizontal),
                    road(5, 8, StraightHorizontal),
                    road(7, 8, StraightHorizontal),
                    road(4, 5, StraightVertical),
                    road(4, 7, StraightVertical),
                    road(8, 5, StraightVertical),
                    road(8, 7, StraightVertical),
                    road(5, 6, StraightHorizontal),
                    road(7, 6, StraightHorizontal),
                    road(6, 5, StraightVertical),
                    road(6, 7, StraightVertical),
                ],
                win_conditions: WinConditions { min_score: 5000, max_congestion: 30.0, min_flow_rate: 20.0 },
            },
        ];

        Self { levels }
    }
}

impl Validate for LevelsConfig {
    fn validate(&self) -> Result<()> {
        if self.levels.is_empty() {
            return Err(anyhow!("At least one level must be defined"));
        }

        for level in &self.levels {
            let size = level.grid_size;
            if size.width == 0 || size.height == 0 {
                return Err(anyhow!("Grid for level {} cannot be empty", level.number));
            }

            if level.spawn_rate_ms <= 0.0 {
                return Err(anyhow!("Spawn rate for level {} must be positive", level.number));
            }

            if level.time_limit_s <= 0.0 {
                return Err(anyhow!("Time limit for level {} must be positive", level.number));
            }

            for placement in &level.initial_roads {
                if placement.x >= size.width || placement.y >= size.height {
                    return Err(anyhow!(
                        "Road at ({}, {}) is out of grid bounds for level {}",
                        placement.x, placement.y, level.number
                    ));
                }
            }

            let win = &level.win_conditions;
            if win.max_congestion < 0.0 || win.max_congestion > 100.0 {
                return Err(anyhow!("Max congestion for level {} must be in range [0, 100]", level.number));
            }

            if win.min_flow_rate <= 0.0 {
                return Err(anyhow!("Min flow rate for level {} must be positive", level.number));
            }
        }

        let mut numbers: Vec<u32> = self.levels.iter().map(|l| l.number).collect();
        numbers.sort_unstable();
        numbers.dedup();
        if numbers.len() != self.levels.len() {
            return Err(anyhow!("Level numbers must be unique"));
        }

        Ok(())
    }
}
