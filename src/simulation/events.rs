//! Seams between the simulation core and the game around it.
//!
//! The core reads light state and crossing geometry through [`TrafficWorld`]
//! and reports what happened through [`TrafficEvents`]. Every event method
//! defaults to a no-op so collaborators only implement what they display.

use super::{Approach, CarId, LightState, PathRegistry, Point};

/// Queries the core makes against the crossing.
pub trait TrafficWorld {
    fn light_state(&self, approach: Approach) -> LightState;
    fn road_width(&self) -> f32;
    fn center(&self) -> Point;

    /// Paths new cars are placed on.
    fn routes(&self) -> &PathRegistry;

    /// Inside the square where the two roads overlap.
    fn in_intersection(&self, position: Point) -> bool {
        let half = self.road_width() / 2.0;
        let center = self.center();
        (position.x - center.x).abs() <= half && (position.y - center.y).abs() <= half
    }
}

/// Audio cues the core may ask the sound layer to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    TrafficLightChange,
    CarHorn,
    CarCrash,
    GameStart,
    GameOver,
    CarPass,
    ButtonClick,
}

impl SoundCue {
    pub fn name(self) -> &'static str {
        match self {
            SoundCue::TrafficLightChange => "trafficLightChange",
            SoundCue::CarHorn => "carHorn",
            SoundCue::CarCrash => "carCrash",
            SoundCue::GameStart => "gameStart",
            SoundCue::GameOver => "gameOver",
            SoundCue::CarPass => "carPass",
            SoundCue::ButtonClick => "buttonClick",
        }
    }
}

/// Outward notifications. Fire-and-forget.
pub trait TrafficEvents {
    fn on_accident(&mut self, _first: CarId, _second: CarId) {}

    /// Running wait of a car held at a light, throttled by the car.
    fn on_wait_time_update(&mut self, _car: CarId, _wait_ms: f32) {}

    /// The car is moving again (or finished) and no longer waiting.
    fn on_wait_cleared(&mut self, _car: CarId) {}

    /// Fired once per wait episode when the critical threshold is reached.
    fn on_critical_wait(&mut self, _car: CarId, _wait_ms: f32) {}

    fn on_completed(&mut self, _car: CarId, _trip_ms: f32) {}

    fn play_sound(&mut self, _cue: SoundCue, _volume: f32) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEvents;

impl TrafficEvents for NullEvents {}

#[derive(Debug, Clone, PartialEq)]
pub enum TrafficEvent {
    Accident(CarId, CarId),
    WaitTime(CarId, f32),
    WaitCleared(CarId),
    CriticalWait(CarId, f32),
    Completed(CarId, f32),
    Sound(SoundCue, f32),
}

/// Records events in arrival order.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    pub events: Vec<TrafficEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accidents(&self) -> usize {
        self.events.iter().filter(|e| matches!(e, TrafficEvent::Accident(..))).count()
    }

    pub fn completions(&self) -> usize {
        self.events.iter().filter(|e| matches!(e, TrafficEvent::Completed(..))).count()
    }

    pub fn critical_waits(&self, car: CarId) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, TrafficEvent::CriticalWait(id, _) if *id == car))
            .count()
    }

    pub fn wait_reports(&self, car: CarId) -> Vec<f32> {
        self.events
            .iter()
            .filter_map(|e| match e {
                TrafficEvent::WaitTime(id, ms) if *id == car => Some(*ms),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl TrafficEvents for EventLog {
    fn on_accident(&mut self, first: CarId, second: CarId) {
        self.events.push(TrafficEvent::Accident(first, second));
    }

    fn on_wait_time_update(&mut self, car: CarId, wait_ms: f32) {
        self.events.push(TrafficEvent::WaitTime(car, wait_ms));
    }

    fn on_wait_cleared(&mut self, car: CarId) {
        self.events.push(TrafficEvent::WaitCleared(car));
    }

    fn on_critical_wait(&mut self, car: CarId, wait_ms: f32) {
        self.events.push(TrafficEvent::CriticalWait(car, wait_ms));
    }

    fn on_completed(&mut self, car: CarId, trip_ms: f32) {
        self.events.push(TrafficEvent::Completed(car, trip_ms));
    }

    fn play_sound(&mut self, cue: SoundCue, volume: f32) {
        self.events.push(TrafficEvent::Sound(cue, volume));
    }
}
