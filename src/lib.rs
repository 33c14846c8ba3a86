pub mod config;
pub mod simulation;
pub mod grid;
pub mod scenario;

pub use simulation::{
    Approach, Car, CarId, Difficulty, GameSession, Intersection, LightState, Path, Point, SignalController,
    TrafficEvents, TrafficManager, TrafficWorld, TurnIntent, Vec2,
};
pub use config::{IntersectionConfig, LevelsConfig, SimulationConfig, TrafficConfig, Validate};
pub use scenario::{CrossingSimulation, GridSimulation, Scenario, ScenarioRunner};
