//! Phase state machine
//!
//! Drives the READY -> RESERVE -> EXECUTE -> RESERVE ... cycle, or a single
//! REALTIME phase. Transitions are returned to the caller, which must apply
//! them before any same-tick obstacle or collision work so dependent resets
//! (reservation clear, speed snapshot) happen exactly once per transition.

use serde::{Deserialize, Serialize};

use crate::consts::{EXECUTE_DURATION, READY_DURATION};
use crate::settings::{GameMode, Settings};

/// Named interval of a run with its own timer and semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    /// Not running; entered only via reset
    #[default]
    Idle,
    /// Short countdown before the first reserve window
    Ready,
    /// Player records a lane/action trace
    Reserve,
    /// The recorded trace replays at doubled speed
    Execute,
    /// Direct control, no cycle
    Realtime,
}

/// Countdown-driven phase machine
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PhaseMachine {
    pub phase: Phase,
    /// Remaining time in the current phase (seconds)
    pub timer: f32,
    /// Time spent in the current phase (seconds)
    pub elapsed: f32,
    /// Full length of the current phase (seconds)
    pub duration: f32,
}

impl PhaseMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the first phase of a run. Returns the phase entered.
    pub fn start(&mut self, settings: &Settings) -> Phase {
        if settings.mode == GameMode::Realtime {
            self.set_phase(Phase::Realtime, settings)
        } else {
            self.set_phase(Phase::Ready, settings)
        }
    }

    /// Back to idle with zeroed timers
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advance the countdown. Returns the new phase if a transition fired;
    /// the caller must react to it before running the rest of its tick.
    pub fn update(&mut self, dt: f32, settings: &Settings) -> Option<Phase> {
        if matches!(self.phase, Phase::Idle | Phase::Realtime) {
            return None;
        }

        self.timer -= dt;
        self.elapsed += dt;

        if self.timer <= 0.0 {
            Some(self.advance(settings))
        } else {
            None
        }
    }

    /// Progress through the current phase, 0..1 (0 for untimed phases)
    pub fn progress(&self) -> f32 {
        if self.duration == 0.0 {
            return 0.0;
        }
        (self.elapsed / self.duration).min(1.0)
    }

    fn advance(&mut self, settings: &Settings) -> Phase {
        let next = match self.phase {
            Phase::Ready => Phase::Reserve,
            Phase::Reserve => Phase::Execute,
            // EXECUTE always returns to RESERVE for the rest of the run
            Phase::Execute => Phase::Reserve,
            Phase::Idle | Phase::Realtime => return self.phase,
        };
        self.set_phase(next, settings)
    }

    fn set_phase(&mut self, phase: Phase, settings: &Settings) -> Phase {
        self.phase = phase;
        self.elapsed = 0.0;
        self.duration = match phase {
            Phase::Ready => READY_DURATION,
            Phase::Reserve => settings.reserve_time,
            Phase::Execute => EXECUTE_DURATION,
            Phase::Idle | Phase::Realtime => 0.0,
        };
        self.timer = self.duration;
        phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_until_transition(pm: &mut PhaseMachine, settings: &Settings, dt: f32) -> Phase {
        for _ in 0..10_000 {
            if let Some(next) = pm.update(dt, settings) {
                return next;
            }
        }
        panic!("no transition fired");
    }

    #[test]
    fn test_start_selects_mode() {
        let settings = Settings::default();
        let mut pm = PhaseMachine::new();
        assert_eq!(pm.start(&settings), Phase::Ready);
        assert_eq!(pm.duration, READY_DURATION);
        assert_eq!(pm.timer, READY_DURATION);

        let realtime = Settings {
            mode: GameMode::Realtime,
            ..Settings::default()
        };
        let mut pm = PhaseMachine::new();
        assert_eq!(pm.start(&realtime), Phase::Realtime);
        assert_eq!(pm.duration, 0.0);
    }

    #[test]
    fn test_cycle_ready_reserve_execute_reserve() {
        let settings = Settings::default();
        let mut pm = PhaseMachine::new();
        pm.start(&settings);

        assert_eq!(run_until_transition(&mut pm, &settings, 0.05), Phase::Reserve);
        assert_eq!(pm.duration, settings.reserve_time);
        assert_eq!(run_until_transition(&mut pm, &settings, 0.05), Phase::Execute);
        assert_eq!(pm.duration, EXECUTE_DURATION);
        assert_eq!(run_until_transition(&mut pm, &settings, 0.05), Phase::Reserve);
        assert_eq!(run_until_transition(&mut pm, &settings, 0.05), Phase::Execute);
    }

    #[test]
    fn test_transition_resets_timers() {
        let settings = Settings::default();
        let mut pm = PhaseMachine::new();
        pm.start(&settings);
        run_until_transition(&mut pm, &settings, 0.05);

        assert_eq!(pm.phase, Phase::Reserve);
        assert_eq!(pm.elapsed, 0.0);
        assert_eq!(pm.timer, pm.duration);
    }

    #[test]
    fn test_idle_and_realtime_never_advance() {
        let settings = Settings {
            mode: GameMode::Realtime,
            ..Settings::default()
        };
        let mut pm = PhaseMachine::new();
        assert_eq!(pm.update(1.0, &settings), None);
        assert_eq!(pm.phase, Phase::Idle);

        pm.start(&settings);
        for _ in 0..100 {
            assert_eq!(pm.update(1.0, &settings), None);
        }
        assert_eq!(pm.phase, Phase::Realtime);
    }

    #[test]
    fn test_progress_clamps_and_guards_zero_duration() {
        let settings = Settings::default();
        let mut pm = PhaseMachine::new();
        // Untimed phase: progress defined as 0
        assert_eq!(pm.progress(), 0.0);

        pm.start(&settings);
        pm.update(0.5, &settings);
        assert!((pm.progress() - 0.5).abs() < 1e-6);
        // elapsed can exceed duration on the transition tick; progress clamps
        pm.elapsed = pm.duration * 2.0;
        assert_eq!(pm.progress(), 1.0);
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let settings = Settings::default();
        let mut pm = PhaseMachine::new();
        pm.start(&settings);
        pm.update(0.3, &settings);
        pm.reset();
        assert_eq!(pm, PhaseMachine::default());
    }
}
