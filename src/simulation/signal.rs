use super::Approach;
use crate::config::SignalTiming;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightState {
    Red,
    Yellow,
    Green,
}

impl LightState {
    /// Next state when the player clicks the light.
    pub fn toggled(self) -> LightState {
        match self {
            LightState::Red => LightState::Green,
            LightState::Green => LightState::Yellow,
            LightState::Yellow => LightState::Red,
        }
    }

    pub fn requires_stop(self) -> bool {
        matches!(self, LightState::Red | LightState::Yellow)
    }
}

/// One approach's light.
#[derive(Debug, Clone)]
pub struct Signal {
    pub state: LightState,
    /// Controller clock reading at the last transition.
    pub changed_at: f32,
    /// Time since the last transition while the change effect is showing.
    pub effect_elapsed: f32,
    pub has_effect: bool,
}

impl Signal {
    fn new(state: LightState) -> Self {
        Self {
            state,
            changed_at: 0.0,
            effect_elapsed: 0.0,
            has_effect: false,
        }
    }
}

/// Per-approach light state with perpendicular-axis exclusivity.
///
/// Time only moves through [`SignalController::tick`], so yellow expiry is a
/// pure function of accumulated simulation time.
#[derive(Debug, Clone)]
pub struct SignalController {
    signals: [Signal; 4],
    now: f32,
    yellow_duration: f32,
    effect_duration: f32,
}

impl SignalController {
    pub fn new(timing: &SignalTiming) -> Self {
        Self {
            signals: Self::initial_signals(),
            now: 0.0,
            yellow_duration: timing.yellow_duration_ms,
            effect_duration: timing.effect_duration_ms,
        }
    }

    fn initial_signals() -> [Signal; 4] {
        [
            Signal::new(LightState::Red),
            Signal::new(LightState::Green),
            Signal::new(LightState::Red),
            Signal::new(LightState::Green),
        ]
    }

    pub fn reset(&mut self) {
        self.signals = Self::initial_signals();
        self.now = 0.0;
    }

    pub fn state(&self, approach: Approach) -> LightState {
        self.signals[approach.index()].state
    }

    pub fn signal(&self, approach: Approach) -> &Signal {
        &self.signals[approach.index()]
    }

    pub fn now(&self) -> f32 {
        self.now
    }

    /// Forces a state, then rebalances the other axis the same way a toggle
    /// does. For scenarios that start from a specific light layout.
    pub fn set_state(&mut self, approach: Approach, state: LightState) {
        self.transition(approach, state);
        log::info!("Traffic light {} set to {:?}", approach, state);

        self.update_perpendicular(approach);
    }

    /// Cycles red -> green -> yellow -> red and rebalances the other axis.
    pub fn toggle(&mut self, approach: Approach) -> LightState {
        let next = self.state(approach).toggled();
        self.transition(approach, next);
        log::info!("Traffic light {} changed to {:?}", approach, next);

        self.update_perpendicular(approach);
        next
    }

    fn transition(&mut self, approach: Approach, state: LightState) {
        let now = self.now;
        let signal = &mut self.signals[approach.index()];
        signal.state = state;
        signal.changed_at = now;
        signal.effect_elapsed = 0.0;
        signal.has_effect = true;
    }

    /// A green on this axis pushes the other axis's greens to yellow; an
    /// all-red axis releases the other axis's reds to green.
    pub fn update_perpendicular(&mut self, approach: Approach) {
        let axis = approach.axis();
        let any_green = axis.iter().any(|a| self.state(*a) == LightState::Green);
        let all_red = axis.iter().all(|a| self.state(*a) == LightState::Red);

        for other in approach.perpendicular() {
            let state = self.state(other);
            if any_green && state == LightState::Green {
                self.transition(other, LightState::Yellow);
                log::debug!("Traffic light {} forced to yellow", other);
            } else if all_red && state == LightState::Red {
                self.transition(other, LightState::Green);
                log::debug!("Traffic light {} released to green", other);
            }
        }
    }

    pub fn tick(&mut self, dt: f32) {
        self.now += dt;

        for approach in Approach::ALL {
            let signal = &mut self.signals[approach.index()];

            if signal.has_effect {
                signal.effect_elapsed += dt;
                if signal.effect_elapsed > self.effect_duration {
                    signal.has_effect = false;
                }
            }

            if signal.state == LightState::Yellow && self.now - signal.changed_at > self.yellow_duration {
                self.transition(approach, LightState::Red);
                log::info!("Traffic light {} automatically changed to red", approach);
                self.update_perpendicular(approach);
            }
        }
    }

    /// Strength of the change flash in [0, 1], fading over the effect duration.
    pub fn glow(&self, approach: Approach) -> f32 {
        let signal = self.signal(approach);
        if !signal.has_effect || self.effect_duration <= 0.0 {
            return 0.0;
        }
        (1.0 - signal.effect_elapsed / self.effect_duration).clamp(0.0, 1.0)
    }

    /// True while no light on one axis is green together with a light on the other.
    pub fn is_consistent(&self) -> bool {
        let ns_green = [Approach::North, Approach::South]
            .iter()
            .any(|a| self.state(*a) == LightState::Green);
        let ew_green = [Approach::East, Approach::West]
            .iter()
            .any(|a| self.state(*a) == LightState::Green);
        !(ns_green && ew_green)
    }
}

impl Default for SignalController {
    fn default() -> Self {
        Self::new(&SignalTiming::default())
    }
}
