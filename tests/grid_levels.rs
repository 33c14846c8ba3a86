use anyhow::Result;
use signal_sim::config::{GridSize, LevelsConfig};
use signal_sim::grid::{
    Grid, GridError, GridVehicle, LevelManager, LevelOutcome, RoadKind, Side, VehicleKind, VehicleManager,
    REFERENCE_TICK_MS,
};
use signal_sim::scenario::{GridSimulation, Scenario, ScenarioRunner};
use signal_sim::simulation::{CarId, EventLog, LightState, TrafficEvents};

/// A single row of road with a light in the middle.
fn row_with_light() -> Result<Grid> {
    let mut grid = Grid::new(5, 1);
    for x in [0, 1, 3, 4] {
        grid.place_road(x, 0, RoadKind::StraightHorizontal)?;
    }
    grid.place_road(2, 0, RoadKind::Intersection)?;
    Ok(grid)
}

#[test]
fn test_place_remove_and_toggle() -> Result<()> {
    let mut grid = Grid::new(4, 4);

    grid.place_road(1, 1, RoadKind::Intersection)?;
    grid.place_road(2, 1, RoadKind::StraightHorizontal)?;
    assert_eq!(grid.count_roads(), 2);
    assert_eq!(grid.light_at(1, 1), Some(LightState::Red));
    assert_eq!(grid.intersections(), vec![(1, 1)]);

    assert_eq!(grid.toggle_light(1, 1)?, LightState::Green);
    assert_eq!(grid.toggle_light(1, 1)?, LightState::Red);

    assert_eq!(grid.toggle_light(2, 1), Err(GridError::NotAnIntersection { x: 2, y: 1 }));
    assert_eq!(grid.toggle_light(3, 3), Err(GridError::NoRoad { x: 3, y: 3 }));
    assert_eq!(
        grid.place_road(4, 0, RoadKind::StraightVertical),
        Err(GridError::OutOfBounds { x: 4, y: 0, width: 4, height: 4 })
    );

    // Replacing a piece drops its light
    grid.place_road(1, 1, RoadKind::StraightVertical)?;
    assert_eq!(grid.light_at(1, 1), None);

    let removed = grid.remove_road(2, 1)?;
    assert_eq!(removed.kind, RoadKind::StraightHorizontal);
    assert_eq!(grid.remove_road(2, 1), Err(GridError::NoRoad { x: 2, y: 1 }));
    assert_eq!(grid.count_roads(), 1);
    Ok(())
}

#[test]
fn test_road_kinds_cycle() {
    let mut kind = RoadKind::StraightHorizontal;
    for _ in 0..RoadKind::ALL.len() {
        kind = kind.cycled();
    }
    assert_eq!(kind, RoadKind::StraightHorizontal);
    assert_eq!(RoadKind::CurveSouthWest.display_name(), "Curve South-West");
    assert!(RoadKind::CurveSouthWest.connections().contains(Side::West));
    assert!(!RoadKind::CurveSouthWest.connections().contains(Side::North));
}

/// Routes follow road connections around corners
#[test]
fn test_route_around_corner() -> Result<()> {
    let mut grid = Grid::new(3, 3);
    grid.place_road(0, 0, RoadKind::StraightHorizontal)?;
    grid.place_road(1, 0, RoadKind::CurveSouthWest)?;
    grid.place_road(1, 1, RoadKind::StraightVertical)?;
    grid.place_road(1, 2, RoadKind::StraightVertical)?;

    let route = grid.find_route((0, 0), (1, 2))?;
    assert_eq!(route, vec![(0, 0), (1, 0), (1, 1), (1, 2)]);
    Ok(())
}

/// Adjacent pieces only connect when both open onto the shared edge
#[test]
fn test_route_requires_matching_connections() -> Result<()> {
    let mut grid = Grid::new(3, 1);
    grid.place_road(0, 0, RoadKind::StraightHorizontal)?;
    grid.place_road(1, 0, RoadKind::StraightVertical)?;
    grid.place_road(2, 0, RoadKind::StraightHorizontal)?;

    assert!(grid.neighbors((0, 0)).is_empty());
    assert_eq!(grid.find_route((0, 0), (2, 0)), Err(GridError::NoPath { from: (0, 0), to: (2, 0) }));
    assert_eq!(grid.find_route((0, 0), (2, 5)), Err(GridError::OutOfBounds { x: 2, y: 5, width: 3, height: 1 }));

    grid.place_road(1, 0, RoadKind::Intersection)?;
    assert_eq!(grid.find_route((0, 0), (2, 0))?.len(), 3);
    Ok(())
}

/// A vehicle waits before a red intersection, marks congestion and goes on green
#[test]
fn test_vehicle_waits_at_red() -> Result<()> {
    let mut grid = row_with_light()?;
    let mut vehicles = VehicleManager::new(1.0e9, Some(2));
    vehicles.reset(&grid);

    let mut vehicle = GridVehicle::new(0, VehicleKind::Car, (0, 0), Side::East, "#ffffff".to_string());
    vehicle.set_route(grid.find_route((0, 0), (4, 0))?);
    vehicles.add_vehicle(vehicle);
    let mut events = EventLog::new();

    for _ in 0..60 {
        vehicles.update(REFERENCE_TICK_MS, &mut grid, &mut events);
    }

    let waiting = &vehicles.vehicles()[0];
    assert!(waiting.waiting);
    assert_eq!(waiting.tile(), (1, 0));
    assert!(waiting.wait_time > 0.0);
    assert_eq!(vehicles.waiting_count(), 1);
    assert_eq!(grid.count_congested(), 1);

    grid.toggle_light(2, 0)?;
    for _ in 0..60 {
        vehicles.update(REFERENCE_TICK_MS, &mut grid, &mut events);
    }

    assert!(vehicles.vehicles().is_empty());
    assert_eq!(vehicles.total_completed, 1);
    assert_eq!(events.completions(), 1);
    assert_eq!(grid.count_congested(), 0);
    Ok(())
}

/// Movement scales with elapsed time against the 60 Hz reference tick
#[test]
fn test_vehicle_speed_scales_with_dt() -> Result<()> {
    let mut grid = Grid::new(3, 1);
    for x in 0..3 {
        grid.place_road(x, 0, RoadKind::StraightHorizontal)?;
    }

    let mut vehicle = GridVehicle::new(0, VehicleKind::Bus, (0, 0), Side::East, "#FFD700".to_string());
    vehicle.set_route(grid.find_route((0, 0), (2, 0))?);
    vehicle.update(REFERENCE_TICK_MS, &mut grid);
    vehicle.update(REFERENCE_TICK_MS * 2.0, &mut grid);

    assert!((vehicle.position.x - 0.1).abs() < 1e-5);
    assert_eq!(vehicle.heading, Side::East);
    Ok(())
}

/// Only light-free roads on the border become spawn points
#[test]
fn test_spawn_points_on_edges() -> Result<()> {
    let levels = LevelsConfig::load_from_file("levels.toml")?;
    let mut grid = Grid::new(0, 0);
    let mut vehicles = VehicleManager::new(1000.0, Some(3));
    let mut manager = LevelManager::new(levels);

    manager.load_level(4, &mut grid, &mut vehicles)?;
    let mut points: Vec<_> = vehicles.spawn_points().iter().map(|p| (p.tile, p.heading)).collect();
    points.sort_by_key(|(tile, _)| *tile);
    assert_eq!(
        points,
        vec![((0, 3), Side::East), ((3, 0), Side::South), ((3, 6), Side::North), ((6, 3), Side::West)]
    );

    let id = vehicles.spawn_vehicle(&grid).expect("routable spawn");
    let vehicle = &vehicles.vehicles()[0];
    assert_eq!(vehicle.id, id);
    assert!(vehicle.route().len() >= 2);
    assert_ne!(vehicle.route().first(), vehicle.route().last());

    manager.load_level(1, &mut grid, &mut vehicles)?;
    assert!(vehicles.spawn_points().is_empty());
    assert!(vehicles.spawn_vehicle(&grid).is_none());
    Ok(())
}

#[test]
fn test_load_level() -> Result<()> {
    let mut grid = Grid::new(0, 0);
    let mut vehicles = VehicleManager::new(1000.0, Some(4));
    let mut manager = LevelManager::new(LevelsConfig::default());

    let level = manager.load_level(2, &mut grid, &mut vehicles)?;
    assert_eq!(level.name, "Rush Hour");
    assert_eq!((grid.width(), grid.height()), (10, 10));
    assert_eq!(grid.count_roads(), 12);
    assert_eq!(grid.intersections().len(), 4);
    assert_eq!(vehicles.spawn_interval(), 3000.0);
    assert_eq!(manager.next_level(), Some(3));

    assert!(manager.load_level(9, &mut grid, &mut vehicles).is_err());

    grid.reset(GridSize { width: 2, height: 2 });
    assert_eq!(grid.count_roads(), 0);
    Ok(())
}

/// Running out of time loses the level
#[test]
fn test_level_lost_on_time() -> Result<()> {
    let mut grid = Grid::new(0, 0);
    let mut vehicles = VehicleManager::new(1000.0, Some(5));
    let mut manager = LevelManager::new(LevelsConfig::default());
    manager.load_level(1, &mut grid, &mut vehicles)?;

    assert_eq!(manager.update(179_000.0, &grid), LevelOutcome::InProgress);
    assert_eq!(manager.update(1_000.0, &grid), LevelOutcome::Lost);
    Ok(())
}

/// Meeting score, flow and congestion targets wins the level
#[test]
fn test_level_won_and_scoring() -> Result<()> {
    let levels = LevelsConfig::load_from_file("levels.toml")?;
    let mut grid = Grid::new(0, 0);
    let mut vehicles = VehicleManager::new(1000.0, Some(6));
    let mut manager = LevelManager::new(levels);
    manager.load_level(4, &mut grid, &mut vehicles)?;

    // Flow at twice the target with no congestion doubles the base points
    manager.flow_rate = 10.0;
    assert_eq!(manager.completion_points(), 20);

    manager.on_completed(CarId(0), 1000.0);
    assert_eq!(manager.vehicles_managed, 1);
    assert_eq!(manager.score, 20);

    manager.score = 300;
    manager.vehicles_managed = 10;
    assert_eq!(manager.update(60_000.0, &grid), LevelOutcome::Won);
    assert!((manager.flow_rate - 10.0).abs() < 1e-4);
    assert_eq!(manager.congestion, 0.0);
    assert_eq!(manager.next_level(), None);
    Ok(())
}

/// The grid game runs headless with the light autopilot
#[test]
fn test_grid_simulation_run() -> Result<()> {
    let levels = LevelsConfig::load_from_file("levels.toml")?;
    let mut simulation = GridSimulation::new(levels, 4, Some(12))?;

    for frame in 0..3600 {
        if frame % 180 == 0 {
            simulation.cycle_lights();
        }
        simulation.frame(1000.0 / 60.0)?;
    }

    assert!(simulation.vehicles.total_spawned > 0);
    assert!(simulation.levels.elapsed > 0.0);
    println!(
        "✓ Grid run: {} spawned, {} completed, outcome {:?}",
        simulation.vehicles.total_spawned, simulation.vehicles.total_completed, simulation.outcome
    );
    Ok(())
}

#[test]
fn test_runner_rejects_unknown_level() {
    assert!(ScenarioRunner::new_grid(LevelsConfig::default(), 42, None).is_err());
}
