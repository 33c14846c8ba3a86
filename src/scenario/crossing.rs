use super::Scenario;
use crate::config::SimulationConfig;
use crate::simulation::{
    Approach, Difficulty, FixedStep, FrameSnapshot, GameSession, Intersection, LightState, Point, SoundCue,
    TrafficEvents, TrafficManager,
};
use anyhow::Result;

/// The single signalised crossing game: lights, cars and the score session.
pub struct CrossingSimulation {
    pub intersection: Intersection,
    pub traffic: TrafficManager,
    pub session: GameSession,
    timestep: FixedStep,
}

impl CrossingSimulation {
    pub fn new(config: &SimulationConfig, difficulty: Difficulty, seed: Option<u64>) -> Self {
        let seed = seed.or(config.traffic.random.seed);
        let mut simulation = Self {
            intersection: Intersection::new(&config.intersection),
            traffic: TrafficManager::new(&config.traffic, seed),
            session: GameSession::new(difficulty, seed.map(|s| s.wrapping_add(1))),
            timestep: FixedStep::default(),
        };
        simulation.restart();
        simulation
    }

    /// Starts a fresh game at the session's difficulty.
    pub fn restart(&mut self) {
        self.intersection.reset();
        self.traffic.reset();
        self.traffic.set_spawn_rate(self.session.difficulty.spawn_rate_ms());
        self.session.start();
    }

    pub fn toggle_light(&mut self, approach: Approach) -> LightState {
        self.session.play_sound(SoundCue::TrafficLightChange, 1.0);
        self.intersection.toggle_light(approach)
    }

    /// Toggles the light under a click, if any.
    pub fn click(&mut self, point: Point) -> Option<Approach> {
        let approach = self.intersection.light_at(point)?;
        self.toggle_light(approach);
        Some(approach)
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot::capture(&self.intersection, &self.traffic)
    }
}

impl Scenario for CrossingSimulation {
    fn step(&mut self, dt: f32) -> Result<()> {
        if !self.session.is_playing() {
            return Ok(());
        }

        self.intersection.tick(dt);
        self.session.tick(dt);
        self.traffic.update(dt, &self.intersection, &mut self.session);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "crossing"
    }

    fn active_vehicles(&self) -> usize {
        self.traffic.active_count()
    }

    fn completed(&self) -> usize {
        self.traffic.total_completed
    }

    fn is_over(&self) -> bool {
        !self.session.is_playing()
    }

    /// Sends the axis holding green through yellow. When that yellow runs
    /// out the controller releases the other axis, so the box clears before
    /// cross traffic gets its green.
    fn cycle_lights(&mut self) {
        let signals = &self.intersection.signals;
        if Approach::ALL.iter().any(|a| signals.state(*a) == LightState::Yellow) {
            return;
        }

        let greens: Vec<Approach> = Approach::ALL
            .into_iter()
            .filter(|a| signals.state(*a) == LightState::Green)
            .collect();
        let targets = if greens.is_empty() { vec![Approach::North, Approach::South] } else { greens };

        for approach in targets {
            self.toggle_light(approach);
        }
    }

    fn timestep(&mut self) -> &mut FixedStep {
        &mut self.timestep
    }
}
