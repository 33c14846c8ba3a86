use anyhow::Result;
use signal_sim::config::SimulationConfig;
use signal_sim::scenario::{CrossingSimulation, Scenario};
use signal_sim::simulation::{
    Approach, CarId, Difficulty, FixedStep, GameOverReason, GameSession, GameState, LightState, SoundCue,
    TrafficEvents, WaitLevel,
};

fn playing_session() -> GameSession {
    let mut session = GameSession::new(Difficulty::Easy, Some(5));
    session.start();
    session
}

/// Starting a game resets the score and queues the start cue
#[test]
fn test_start() {
    let mut session = GameSession::new(Difficulty::Hard, Some(1));
    assert_eq!(session.state, GameState::Menu);

    session.score = 99;
    session.start();

    assert_eq!(session.state, GameState::Playing);
    assert_eq!(session.score, 0);
    assert_eq!(session.drain_sounds(), vec![(SoundCue::GameStart, 1.0)]);
}

/// Completions add points and accidents take them away
#[test]
fn test_scoring() {
    let mut session = playing_session();

    session.on_completed(CarId(0), 5000.0);
    session.on_completed(CarId(1), 5000.0);
    assert_eq!(session.score, 20);
    assert_eq!(session.completed, 2);

    session.on_accident(CarId(2), CarId(3));
    assert_eq!(session.score, -30);
    assert_eq!(session.accidents, 1);
    assert!(session.is_playing());
}

/// The third accident ends the game
#[test]
fn test_game_over_on_accidents() {
    let mut session = playing_session();
    session.drain_sounds();

    for i in 0..3 {
        session.on_accident(CarId(i * 2), CarId(i * 2 + 1));
    }

    assert_eq!(session.state, GameState::GameOver);
    assert_eq!(session.over_reason, Some(GameOverReason::TooManyAccidents));
    assert_eq!(session.drain_sounds(), vec![(SoundCue::GameOver, 1.0)]);

    // Nothing scores once the game is over
    session.on_accident(CarId(10), CarId(11));
    session.on_completed(CarId(12), 1000.0);
    assert_eq!(session.accidents, 3);
    assert_eq!(session.score, -150);
}

/// The horn sounds at 25s and 28s and the game ends at 30s
#[test]
fn test_wait_thresholds() {
    let mut session = playing_session();
    session.drain_sounds();

    session.on_wait_time_update(CarId(0), 25_000.0);
    assert_eq!(session.drain_sounds(), vec![(SoundCue::CarHorn, 0.5)]);

    session.on_wait_time_update(CarId(0), 26_000.0);
    assert!(session.drain_sounds().is_empty());

    session.on_wait_time_update(CarId(0), 28_000.0);
    assert_eq!(session.drain_sounds(), vec![(SoundCue::CarHorn, 0.5)]);
    assert!(session.is_playing());

    session.on_critical_wait(CarId(0), 30_000.0);
    assert_eq!(session.state, GameState::GameOver);
    assert_eq!(session.over_reason, Some(GameOverReason::WaitTooLong));
    assert_eq!(session.longest_wait, 30_000.0);
}

/// Shorter waits never lower the longest wait
#[test]
fn test_longest_wait_only_grows() {
    let mut session = playing_session();

    session.on_wait_time_update(CarId(0), 4_000.0);
    session.on_wait_time_update(CarId(1), 1_000.0);

    assert_eq!(session.longest_wait, 4_000.0);
}

/// Paused time and paused events do not count
#[test]
fn test_pause() {
    let mut session = playing_session();
    session.tick(1000.0);

    session.toggle_pause();
    assert_eq!(session.state, GameState::Paused);
    session.tick(1000.0);
    session.on_completed(CarId(0), 1.0);
    assert_eq!(session.game_time, 1000.0);
    assert_eq!(session.score, 0);

    session.toggle_pause();
    assert!(session.is_playing());

    session.quit_to_menu();
    assert_eq!(session.state, GameState::Menu);
}

#[test]
fn test_flow_rate() {
    let mut session = playing_session();
    assert_eq!(session.flow_rate(), 0.0);

    session.tick(60_000.0);
    for i in 0..7 {
        session.on_completed(CarId(i), 1000.0);
    }
    assert!((session.flow_rate() - 7.0).abs() < 1e-4);

    session.tick(30_000.0);
    assert!((session.flow_rate() - 4.7).abs() < 1e-4);
}

/// Muting drops sound requests instead of queueing them
#[test]
fn test_mute() {
    let mut session = playing_session();
    session.drain_sounds();

    assert!(session.toggle_mute());
    session.play_sound(SoundCue::ButtonClick, 1.0);
    assert!(session.drain_sounds().is_empty());

    session.set_muted(false);
    session.play_sound(SoundCue::ButtonClick, 1.0);
    assert_eq!(session.drain_sounds().len(), 1);
}

#[test]
fn test_difficulty_parse() -> Result<()> {
    assert_eq!("easy".parse::<Difficulty>()?, Difficulty::Easy);
    assert_eq!("Medium".parse::<Difficulty>()?, Difficulty::Medium);
    assert_eq!("HARD".parse::<Difficulty>()?, Difficulty::Hard);
    assert!("brutal".parse::<Difficulty>().is_err());

    assert_eq!(Difficulty::Easy.spawn_rate_ms(), 3000.0);
    assert_eq!(Difficulty::Medium.spawn_rate_ms(), 2000.0);
    assert_eq!(Difficulty::Hard.spawn_rate_ms(), 1000.0);
    assert_eq!(Difficulty::Hard.to_string(), "hard");
    Ok(())
}

#[test]
fn test_wait_levels() {
    assert_eq!(WaitLevel::from_seconds(0), WaitLevel::Normal);
    assert_eq!(WaitLevel::from_seconds(9), WaitLevel::Normal);
    assert_eq!(WaitLevel::from_seconds(10), WaitLevel::Warning);
    assert_eq!(WaitLevel::from_seconds(19), WaitLevel::Warning);
    assert_eq!(WaitLevel::from_seconds(20), WaitLevel::Critical);
}

/// Frame time is split into whole steps and the remainder carried over
#[test]
fn test_fixed_step() {
    let mut timestep = FixedStep::new(10.0);

    assert_eq!(timestep.advance(35.0), 3);
    assert!((timestep.pending_ms() - 5.0).abs() < 1e-4);
    assert_eq!(timestep.advance(5.0), 1);

    let mut capped = FixedStep::new(10.0).with_max_steps(4);
    assert_eq!(capped.advance(1000.0), 4);
    assert_eq!(capped.pending_ms(), 0.0);
}

/// Toggling through the crossing game queues the light cue
#[test]
fn test_crossing_toggle_and_click() -> Result<()> {
    let config = SimulationConfig::default();
    let mut game = CrossingSimulation::new(&config, Difficulty::Medium, Some(8));
    assert_eq!(game.traffic.spawn_rate(), 2000.0);
    game.session.drain_sounds();

    assert_eq!(game.toggle_light(Approach::North), LightState::Green);
    assert_eq!(game.session.drain_sounds(), vec![(SoundCue::TrafficLightChange, 1.0)]);

    let south_light = game.intersection.light_position(Approach::South);
    assert_eq!(game.click(south_light), Some(Approach::South));
    assert_eq!(game.intersection.signals.state(Approach::South), LightState::Green);

    let snapshot = game.snapshot();
    assert_eq!(snapshot.lights.len(), 4);
    assert_eq!(snapshot.light(Approach::South).map(|l| l.state), Some(LightState::Green));
    assert!(snapshot.light(Approach::South).map(|l| l.glow).unwrap_or(0.0) > 0.9);
    Ok(())
}

/// A headless run with the light autopilot keeps the game going and moving
#[test]
fn test_crossing_headless_run() -> Result<()> {
    let config = SimulationConfig::default();
    let mut game = CrossingSimulation::new(&config, Difficulty::Easy, Some(21));

    let frame_ms = 1000.0 / 60.0;
    let mut total_steps = 0;
    for frame in 0..3600 {
        if frame % 300 == 0 {
            game.cycle_lights();
        }
        total_steps += game.frame(frame_ms)?;
        assert!(game.intersection.signals.is_consistent());
    }

    assert!(total_steps >= 3590, "only {} steps ran", total_steps);
    assert!(game.traffic.total_spawned > 0);
    assert!(game.session.game_time > 0.0);

    let snapshot = game.snapshot();
    assert_eq!(snapshot.cars.len(), game.traffic.active_count());

    println!(
        "✓ Headless run: score {}, {} completed, {} accidents",
        game.session.score, game.session.completed, game.session.accidents
    );
    Ok(())
}
