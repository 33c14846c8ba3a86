use super::{CarId, SoundCue, TrafficEvents};
use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::str::FromStr;

pub const COMPLETION_POINTS: i64 = 10;
pub const ACCIDENT_PENALTY: i64 = 50;
pub const MAX_ACCIDENTS: u32 = 3;
pub const MAX_WAIT_MS: f32 = 30_000.0;
/// Whole seconds of longest wait at which a warning horn sounds.
pub const HORN_SECONDS: [u32; 2] = [25, 28];
pub const CAR_PASS_CHANCE: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Menu,
    Playing,
    Paused,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn spawn_rate_ms(self) -> f32 {
        match self {
            Difficulty::Easy => 3000.0,
            Difficulty::Medium => 2000.0,
            Difficulty::Hard => 1000.0,
        }
    }
}

impl FromStr for Difficulty {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(anyhow!("Unknown difficulty '{}', expected easy, medium or hard", other)),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverReason {
    TooManyAccidents,
    WaitTooLong,
}

impl fmt::Display for GameOverReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameOverReason::TooManyAccidents => write!(f, "Too many accidents! ({})", MAX_ACCIDENTS),
            GameOverReason::WaitTooLong => write!(f, "A car was waiting for more than {} seconds!", MAX_WAIT_MS / 1000.0),
        }
    }
}

/// Score, lifecycle and audio queue of one play-through of the crossing game.
///
/// Receives the core's notifications directly. Scoring only reacts while the
/// session is playing, so notifications raised in the tick that ended the
/// game are ignored.
#[derive(Debug)]
pub struct GameSession {
    pub state: GameState,
    pub difficulty: Difficulty,
    pub score: i64,
    pub accidents: u32,
    pub completed: u32,
    /// Longest wait reported this game, ms.
    pub longest_wait: f32,
    /// Time spent playing, ms. Paused time does not count.
    pub game_time: f32,
    pub over_reason: Option<GameOverReason>,
    muted: bool,
    sounds: Vec<(SoundCue, f32)>,
    rng: StdRng,
}

impl GameSession {
    pub fn new(difficulty: Difficulty, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            state: GameState::Menu,
            difficulty,
            score: 0,
            accidents: 0,
            completed: 0,
            longest_wait: 0.0,
            game_time: 0.0,
            over_reason: None,
            muted: false,
            sounds: Vec::new(),
            rng,
        }
    }

    pub fn start(&mut self) {
        self.state = GameState::Playing;
        self.score = 0;
        self.accidents = 0;
        self.completed = 0;
        self.longest_wait = 0.0;
        self.game_time = 0.0;
        self.over_reason = None;
        self.play_sound(SoundCue::GameStart, 1.0);
        log::info!("Game started with {} difficulty", self.difficulty);
    }

    pub fn is_playing(&self) -> bool {
        self.state == GameState::Playing
    }

    pub fn pause(&mut self) {
        if self.state == GameState::Playing {
            self.state = GameState::Paused;
            log::info!("Game paused");
        }
    }

    pub fn resume(&mut self) {
        if self.state == GameState::Paused {
            self.state = GameState::Playing;
            log::info!("Game resumed");
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.state {
            GameState::Playing => self.pause(),
            GameState::Paused => self.resume(),
            _ => {}
        }
    }

    pub fn quit_to_menu(&mut self) {
        self.state = GameState::Menu;
        log::info!("Quit to menu");
    }

    pub fn tick(&mut self, dt: f32) {
        if self.is_playing() {
            self.game_time += dt;
        }
    }

    pub fn game_over(&mut self, reason: GameOverReason) {
        if self.state == GameState::GameOver {
            return;
        }
        self.state = GameState::GameOver;
        self.over_reason = Some(reason);
        self.play_sound(SoundCue::GameOver, 1.0);
        log::info!("Game over: {}", reason);
    }

    pub fn add_score(&mut self, points: i64) {
        self.score += points;
    }

    /// Completed cars per minute of play, to one decimal.
    pub fn flow_rate(&self) -> f32 {
        if self.game_time <= 0.0 {
            return 0.0;
        }
        let rate = self.completed as f32 / (self.game_time / 60_000.0);
        (rate * 10.0).round() / 10.0
    }

    fn update_max_wait(&mut self, wait_ms: f32) {
        if wait_ms <= self.longest_wait {
            return;
        }

        let previous = (self.longest_wait / 1000.0).round() as u32;
        let seconds = (wait_ms / 1000.0).round() as u32;
        self.longest_wait = wait_ms;

        if HORN_SECONDS.iter().any(|&h| previous < h && seconds >= h) {
            self.play_sound(SoundCue::CarHorn, 0.5);
        }

        if wait_ms >= MAX_WAIT_MS {
            self.game_over(GameOverReason::WaitTooLong);
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    /// Sound requests since the last drain, in order.
    pub fn drain_sounds(&mut self) -> Vec<(SoundCue, f32)> {
        std::mem::take(&mut self.sounds)
    }
}

impl TrafficEvents for GameSession {
    fn on_accident(&mut self, first: CarId, second: CarId) {
        if !self.is_playing() {
            return;
        }
        self.accidents += 1;
        self.add_score(-ACCIDENT_PENALTY);
        log::info!("Accident between cars {} and {} ({} total)", first, second, self.accidents);

        if self.accidents >= MAX_ACCIDENTS {
            self.game_over(GameOverReason::TooManyAccidents);
        }
    }

    fn on_wait_time_update(&mut self, _car: CarId, wait_ms: f32) {
        if self.is_playing() {
            self.update_max_wait(wait_ms);
        }
    }

    fn on_critical_wait(&mut self, _car: CarId, wait_ms: f32) {
        if self.is_playing() {
            self.update_max_wait(wait_ms);
        }
    }

    fn on_completed(&mut self, _car: CarId, _trip_ms: f32) {
        if !self.is_playing() {
            return;
        }
        self.completed += 1;
        self.add_score(COMPLETION_POINTS);

        if self.rng.gen_bool(CAR_PASS_CHANCE) {
            self.play_sound(SoundCue::CarPass, 0.3);
        }
    }

    fn play_sound(&mut self, cue: SoundCue, volume: f32) {
        if !self.muted {
            self.sounds.push((cue, volume));
        }
    }
}
